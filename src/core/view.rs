use chrono::NaiveDateTime;

use super::category::Bucket;
use super::task::Task;

/// The selected bucket filter, or none for the default two-section view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActiveCategory(Option<Bucket>);

impl ActiveCategory {
    pub fn get(&self) -> Option<Bucket> {
        self.0
    }

    /// Selecting the active bucket again clears the filter.
    pub fn toggle(&mut self, bucket: Bucket) {
        self.0 = if self.0 == Some(bucket) { None } else { Some(bucket) };
    }

    pub fn clear(&mut self) {
        self.0 = None;
    }
}

impl From<Option<Bucket>> for ActiveCategory {
    fn from(bucket: Option<Bucket>) -> Self {
        Self(bucket)
    }
}

/// What gets displayed for a task list and filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskView {
    Grouped {
        alert: Vec<Task>,
        no_alert: Vec<Task>,
    },
    Filtered {
        bucket: Bucket,
        tasks: Vec<Task>,
    },
}

impl TaskView {
    pub fn build(tasks: &[Task], active: ActiveCategory, now: NaiveDateTime) -> Self {
        match active.get() {
            None => Self::build_grouped(tasks),
            Some(bucket) => Self::build_filtered(tasks, bucket, now),
        }
    }

    fn build_grouped(tasks: &[Task]) -> Self {
        let (mut alert, mut no_alert): (Vec<Task>, Vec<Task>) =
            tasks.iter().cloned().partition(Task::has_alert);
        sort_by_creation(&mut alert);
        sort_by_creation(&mut no_alert);
        Self::Grouped { alert, no_alert }
    }

    fn build_filtered(tasks: &[Task], bucket: Bucket, now: NaiveDateTime) -> Self {
        let mut tasks: Vec<Task> = tasks
            .iter()
            .filter(|t| bucket.contains(t, now))
            .cloned()
            .collect();
        sort_by_creation(&mut tasks);
        Self::Filtered { bucket, tasks }
    }

    /// Heading of the first section.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Grouped { .. } => "alert",
            Self::Filtered { bucket, .. } => bucket.label(),
        }
    }

    /// Every displayed task, in display order.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        let (first, second): (&[Task], &[Task]) = match self {
            Self::Grouped { alert, no_alert } => (alert.as_slice(), no_alert.as_slice()),
            Self::Filtered { tasks, .. } => (tasks.as_slice(), &[][..]),
        };
        first.iter().chain(second.iter())
    }

    pub fn total_count(&self) -> usize {
        match self {
            Self::Grouped { alert, no_alert } => alert.len() + no_alert.len(),
            Self::Filtered { tasks, .. } => tasks.len(),
        }
    }
}

/// Ascending `createdAt`; ties keep their incoming order.
pub fn sort_by_creation(tasks: &mut [Task]) {
    tasks.sort_by_key(|t| t.created_at);
}
