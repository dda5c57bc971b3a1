use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::TaskError;

/// Format of the `datetime` field on the wire (an HTML `datetime-local` value).
pub const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M";
const DATETIME_SECONDS_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Top-level grouping by presence of an alert time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AlertGroup {
    Alert,
    #[default]
    NoAlert,
}

impl AlertGroup {
    pub fn of(datetime: Option<NaiveDateTime>) -> Self {
        if datetime.is_some() {
            Self::Alert
        } else {
            Self::NoAlert
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub title: String,
    #[serde(default, with = "datetime_field")]
    pub datetime: Option<NaiveDateTime>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub starred: bool,
    /// Informational hint; display buckets are derived from the other fields.
    #[serde(default)]
    pub category: AlertGroup,
    #[serde(default)]
    pub created_at: u64,
}

impl Task {
    /// Build the stored record for `fields` under a store-assigned id and ordering key.
    pub fn from_new(id: String, created_at: u64, fields: NewTask) -> Self {
        Self {
            id,
            title: fields.title,
            datetime: fields.datetime,
            completed: fields.completed,
            starred: fields.starred,
            category: AlertGroup::of(fields.datetime),
            created_at,
        }
    }

    pub fn has_alert(&self) -> bool {
        self.datetime.is_some()
    }

    pub fn alert_date(&self) -> Option<NaiveDate> {
        self.datetime.map(|dt| dt.date())
    }

    /// Merge the fields present in `patch`, leaving the rest untouched.
    pub fn apply(&mut self, patch: TaskPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(datetime) = patch.datetime {
            self.datetime = datetime;
            self.category = AlertGroup::of(datetime);
        }
        if let Some(completed) = patch.completed {
            self.completed = completed;
        }
        if let Some(starred) = patch.starred {
            self.starred = starred;
        }
    }
}

/// Caller-supplied fields for a new task. Ids, ordering keys and the
/// category hint sent by clients are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    #[serde(default)]
    pub title: String,
    #[serde(default, with = "datetime_field")]
    pub datetime: Option<NaiveDateTime>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub starred: bool,
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn validated(mut self) -> Result<Self, TaskError> {
        self.title = validate_title(&self.title)?;
        Ok(self)
    }
}

/// Partial update. `datetime: Some(None)` clears the alert.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "datetime_patch")]
    pub datetime: Option<Option<NaiveDateTime>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starred: Option<bool>,
}

impl TaskPatch {
    pub fn completed(completed: bool) -> Self {
        Self {
            completed: Some(completed),
            ..Self::default()
        }
    }

    pub fn starred(starred: bool) -> Self {
        Self {
            starred: Some(starred),
            ..Self::default()
        }
    }

    pub fn validated(mut self) -> Result<Self, TaskError> {
        if let Some(title) = &self.title {
            self.title = Some(validate_title(title)?);
        }
        Ok(self)
    }
}

/// Trim a title, rejecting one that is empty afterwards.
pub fn validate_title(title: &str) -> Result<String, TaskError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(TaskError::title_required());
    }
    Ok(title.to_string())
}

/// Parse a `datetime-local` value. Empty input means "no alert".
pub fn parse_datetime(s: &str) -> Result<Option<NaiveDateTime>, chrono::ParseError> {
    let s = s.trim();
    if s.is_empty() {
        return Ok(None);
    }
    NaiveDateTime::parse_from_str(s, DATETIME_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(s, DATETIME_SECONDS_FORMAT))
        .map(Some)
}

pub fn format_datetime(dt: &NaiveDateTime) -> String {
    if dt.second() == 0 && dt.nanosecond() == 0 {
        dt.format(DATETIME_FORMAT).to_string()
    } else {
        dt.format("%Y-%m-%dT%H:%M:%S").to_string()
    }
}

mod datetime_field {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<NaiveDateTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(dt) => serializer.serialize_str(&super::format_datetime(dt)),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDateTime>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) => super::parse_datetime(&raw).map_err(serde::de::Error::custom),
            None => Ok(None),
        }
    }
}

mod datetime_patch {
    use chrono::NaiveDateTime;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<Option<NaiveDateTime>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(inner) => super::datetime_field::serialize(inner, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Option<NaiveDateTime>>, D::Error> {
        super::datetime_field::deserialize(deserializer).map(Some)
    }
}
