use chrono::NaiveDateTime;
use serde::Serialize;

use super::task::Task;

/// The six derived groupings a task can be filtered by. Buckets overlap:
/// a starred task with an alert counts as both `Important` and `Scheduled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    Today,
    Scheduled,
    Important,
    /// Reserved; never populated.
    Place,
    NoAlert,
    Completed,
}

impl Bucket {
    pub const ALL: [Bucket; 6] = [
        Self::Today,
        Self::Scheduled,
        Self::Important,
        Self::Place,
        Self::NoAlert,
        Self::Completed,
    ];

    pub fn as_key(&self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::Scheduled => "scheduled",
            Self::Important => "important",
            Self::Place => "place",
            Self::NoAlert => "noAlert",
            Self::Completed => "completed",
        }
    }

    pub fn from_key(s: &str) -> Option<Self> {
        match s {
            "today" => Some(Self::Today),
            "scheduled" => Some(Self::Scheduled),
            "important" => Some(Self::Important),
            "place" => Some(Self::Place),
            "noAlert" => Some(Self::NoAlert),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Today => "Today",
            Self::Scheduled => "Scheduled",
            Self::Important => "Important",
            Self::Place => "Place",
            Self::NoAlert => "No alert",
            Self::Completed => "Completed",
        }
    }

    /// Whether `task` belongs in this bucket as seen at local time `now`.
    pub fn contains(&self, task: &Task, now: NaiveDateTime) -> bool {
        match self {
            Self::Today => task.alert_date() == Some(now.date()),
            Self::Scheduled => task.has_alert() && !task.completed,
            Self::Important => task.starred,
            Self::Place => false,
            Self::NoAlert => !task.has_alert() && !task.completed,
            Self::Completed => task.completed,
        }
    }
}

/// Per-bucket task counts over a whole list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketCounts {
    pub today: usize,
    pub scheduled: usize,
    pub important: usize,
    pub place: usize,
    pub no_alert: usize,
    pub completed: usize,
}

impl BucketCounts {
    pub fn tally(tasks: &[Task], now: NaiveDateTime) -> Self {
        let mut counts = Self::default();
        for task in tasks {
            for bucket in Bucket::ALL {
                if bucket.contains(task, now) {
                    *counts.slot_mut(bucket) += 1;
                }
            }
        }
        counts
    }

    pub fn get(&self, bucket: Bucket) -> usize {
        match bucket {
            Bucket::Today => self.today,
            Bucket::Scheduled => self.scheduled,
            Bucket::Important => self.important,
            Bucket::Place => self.place,
            Bucket::NoAlert => self.no_alert,
            Bucket::Completed => self.completed,
        }
    }

    fn slot_mut(&mut self, bucket: Bucket) -> &mut usize {
        match bucket {
            Bucket::Today => &mut self.today,
            Bucket::Scheduled => &mut self.scheduled,
            Bucket::Important => &mut self.important,
            Bucket::Place => &mut self.place,
            Bucket::NoAlert => &mut self.no_alert,
            Bucket::Completed => &mut self.completed,
        }
    }
}
