//! Plain-text rendering of a [`Snapshot`] for the terminal client.

use std::fmt::Write;

use chrono::NaiveDateTime;

use crate::core::category::{Bucket, BucketCounts};
use crate::core::task::Task;
use crate::core::view::TaskView;
use crate::sync::{Snapshot, SyncStatus};

/// `Sat, Jan 4, 10:00 AM`
pub fn format_alert(dt: &NaiveDateTime) -> String {
    dt.format("%a, %b %-d, %-I:%M %p").to_string()
}

/// One line per bucket card, the active one marked.
pub fn render_counts(counts: &BucketCounts, active: Option<Bucket>) -> String {
    let mut out = String::new();
    for bucket in Bucket::ALL {
        let marker = if active == Some(bucket) { '>' } else { ' ' };
        let _ = writeln!(
            out,
            "{} {:<10} {:>3}  [{}]",
            marker,
            bucket.label(),
            counts.get(bucket),
            bucket.as_key()
        );
    }
    out
}

pub fn render_task(task: &Task) -> String {
    let check = if task.completed { 'x' } else { ' ' };
    let star = if task.starred { '*' } else { ' ' };
    let mut line = format!("[{}] {} {:>4}  {}", check, star, task.id, task.title);
    if let Some(dt) = &task.datetime {
        let _ = write!(line, "  ({})", format_alert(dt));
    }
    line
}

pub fn render_view(view: &TaskView) -> String {
    let mut out = String::new();
    match view {
        TaskView::Grouped { alert, no_alert } => {
            render_section(&mut out, view.title(), alert);
            out.push('\n');
            render_section(&mut out, Bucket::NoAlert.label(), no_alert);
        }
        TaskView::Filtered { tasks, .. } => {
            render_section(&mut out, view.title(), tasks);
        }
    }
    out
}

pub fn render_snapshot(snapshot: &Snapshot) -> String {
    let mut out = render_counts(&snapshot.counts, snapshot.active.get());
    out.push('\n');
    out.push_str(&render_view(&snapshot.view));
    match &snapshot.status {
        SyncStatus::Error(e) => {
            let _ = writeln!(out, "\nLast action failed: {}", e);
        }
        SyncStatus::LastSynced(at) => {
            let _ = writeln!(out, "\nSynced at {}", at);
        }
        SyncStatus::Idle | SyncStatus::Syncing => {}
    }
    out
}

fn render_section(out: &mut String, title: &str, tasks: &[Task]) {
    let _ = writeln!(out, "{}", title);
    if tasks.is_empty() {
        out.push_str("  (nothing here)\n");
    }
    for task in tasks {
        let _ = writeln!(out, "  {}", render_task(task));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::task::{NewTask, parse_datetime};
    use crate::core::view::ActiveCategory;

    fn task(id: u64, title: &str, datetime: &str, completed: bool, starred: bool) -> Task {
        let fields = NewTask {
            title: title.to_string(),
            datetime: parse_datetime(datetime).unwrap(),
            completed,
            starred,
        };
        Task::from_new(id.to_string(), id, fields)
    }

    #[test]
    fn formats_alert_like_a_locale_string() {
        let dt = parse_datetime("2025-01-04T10:00").unwrap().unwrap();
        assert_eq!(format_alert(&dt), "Sat, Jan 4, 10:00 AM");
        let dt = parse_datetime("2025-01-02T23:05").unwrap().unwrap();
        assert_eq!(format_alert(&dt), "Thu, Jan 2, 11:05 PM");
    }

    #[test]
    fn task_line_shows_state_and_alert() {
        let t = task(1, "ChatGPT ans", "2025-01-04T10:00", false, true);
        assert_eq!(render_task(&t), "[ ] *    1  ChatGPT ans  (Sat, Jan 4, 10:00 AM)");
        let t = task(5, "Plan", "", true, false);
        assert_eq!(render_task(&t), "[x]      5  Plan");
    }

    #[test]
    fn grouped_view_has_both_sections() {
        let tasks = vec![
            task(1, "With alert", "2025-01-04T10:00", false, false),
            task(2, "Without", "", false, false),
        ];
        let now = parse_datetime("2025-01-04T12:00").unwrap().unwrap();
        let view = TaskView::build(&tasks, ActiveCategory::default(), now);
        let text = render_view(&view);
        assert!(text.starts_with("alert\n"));
        assert!(text.contains("No alert\n"));
        assert!(text.find("With alert").unwrap() < text.find("Without").unwrap());
    }

    #[test]
    fn empty_filter_says_so() {
        let now = parse_datetime("2025-01-04T12:00").unwrap().unwrap();
        let view = TaskView::build(&[], Some(Bucket::Place).into(), now);
        assert_eq!(render_view(&view), "Place\n  (nothing here)\n");
    }

    #[test]
    fn counts_mark_active_card() {
        let counts = BucketCounts {
            important: 2,
            ..BucketCounts::default()
        };
        let text = render_counts(&counts, Some(Bucket::Important));
        assert!(text.contains("> Important    2  [important]"));
        assert_eq!(text.lines().count(), 6);
    }
}
