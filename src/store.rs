use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use tokio::sync::Mutex;

use crate::core::task::{NewTask, Task, TaskPatch};
use crate::error::TaskError;

/// Authoritative in-memory task list. Records live in an id-keyed arena and
/// are only reachable through the store operations; one lock serializes
/// writers so every merge lands whole.
pub struct TaskStore {
    arena: Mutex<Arena>,
}

struct Arena {
    tasks: BTreeMap<u64, Task>,
    /// Next id and `createdAt`; never handed out twice.
    next: u64,
}

impl Arena {
    fn allocate(&mut self) -> u64 {
        let n = self.next;
        self.next += 1;
        n
    }
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskStore {
    pub fn new() -> Self {
        Self {
            arena: Mutex::new(Arena {
                tasks: BTreeMap::new(),
                next: 1,
            }),
        }
    }

    /// A store holding the six demo tasks, counting on from 7.
    pub fn seeded() -> Self {
        let seeds = [
            ("ChatGPT ans", seed_at(2025, 1, 4, 10), false, true),
            ("Comp prjct", seed_at(2025, 1, 2, 11), false, true),
            ("Schedule posts", seed_at(2025, 1, 3, 11), false, false),
            ("Comp Surah baqrah tafsir", None, false, false),
            ("Plan next week content", None, true, false),
            ("Plan feb month", None, false, false),
        ];

        let mut arena = Arena {
            tasks: BTreeMap::new(),
            next: 1,
        };
        for (title, datetime, completed, starred) in seeds {
            let n = arena.allocate();
            let fields = NewTask {
                title: title.to_string(),
                datetime,
                completed,
                starred,
            };
            arena.tasks.insert(n, Task::from_new(n.to_string(), n, fields));
        }

        Self {
            arena: Mutex::new(arena),
        }
    }

    pub async fn list(&self) -> Vec<Task> {
        self.arena.lock().await.tasks.values().cloned().collect()
    }

    pub async fn get(&self, id: &str) -> Option<Task> {
        let key = parse_id(id)?;
        self.arena.lock().await.tasks.get(&key).cloned()
    }

    pub async fn len(&self) -> usize {
        self.arena.lock().await.tasks.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn create(&self, fields: NewTask) -> Result<Task, TaskError> {
        let fields = fields.validated()?;
        let mut arena = self.arena.lock().await;
        let n = arena.allocate();
        let task = Task::from_new(n.to_string(), n, fields);
        arena.tasks.insert(n, task.clone());
        log::info!("Created task {}: {}", task.id, task.title);
        Ok(task)
    }

    pub async fn update(&self, id: &str, patch: TaskPatch) -> Result<Task, TaskError> {
        let key = parse_id(id).ok_or_else(|| TaskError::NotFound(id.to_string()))?;
        let mut arena = self.arena.lock().await;
        let task = arena
            .tasks
            .get_mut(&key)
            .ok_or_else(|| TaskError::NotFound(id.to_string()))?;
        task.apply(patch.validated()?);
        log::debug!("Updated task {}", task.id);
        Ok(task.clone())
    }

    /// Remove a task. Returns whether anything was removed; an unknown id is not an error.
    pub async fn delete(&self, id: &str) -> bool {
        let Some(key) = parse_id(id) else {
            return false;
        };
        let removed = self.arena.lock().await.tasks.remove(&key).is_some();
        if removed {
            log::info!("Deleted task {}", id);
        } else {
            log::debug!("Delete of unknown task {} ignored", id);
        }
        removed
    }
}

/// Arena key for an id this store handed out. Only the exact decimal form
/// matches, so `"01"`, `"+1"` or `" 1"` name no task.
fn parse_id(id: &str) -> Option<u64> {
    let key: u64 = id.parse().ok()?;
    (key.to_string() == id).then_some(key)
}

fn seed_at(year: i32, month: u32, day: u32, hour: u32) -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, 0, 0)
}
