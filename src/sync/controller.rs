use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDateTime;
use tokio::sync::Mutex;

use super::TaskApi;
use crate::core::category::{Bucket, BucketCounts};
use crate::core::task::{NewTask, Task, TaskPatch, validate_title};
use crate::core::view::{ActiveCategory, TaskView};
use crate::error::TaskError;

/// Where outstanding actions are in their send/reload round trip. Variants
/// are ordered by progress, so the least advanced action sorts first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum SyncPhase {
    Sending,
    Refreshing,
    #[default]
    Idle,
}

/// Outcome of the last action, for display.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SyncStatus {
    #[default]
    Idle,
    Syncing,
    Error(String),
    LastSynced(String), // formatted timestamp
}

/// Everything a renderer needs for one redraw.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub counts: BucketCounts,
    pub view: TaskView,
    pub active: ActiveCategory,
    pub status: SyncStatus,
}

enum Mutation {
    Create(NewTask),
    Update(String, TaskPatch),
    Delete(String),
}

#[derive(Default)]
struct ViewState {
    tasks: Vec<Task>,
    active: ActiveCategory,
    /// Phase of every action that has not finished, keyed by ticket.
    actions: BTreeMap<u64, SyncPhase>,
    next_ticket: u64,
    status: SyncStatus,
    /// Ids with a mutation that has not completed its round trip.
    in_flight: HashSet<String>,
    /// Generation of the reload currently shown; older reloads are dropped.
    shown_generation: u64,
    issued_generation: u64,
}

impl ViewState {
    fn begin(&mut self, phase: SyncPhase) -> u64 {
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.actions.insert(ticket, phase);
        self.status = SyncStatus::Syncing;
        ticket
    }

    fn phase(&self) -> SyncPhase {
        self.actions.values().copied().min().unwrap_or_default()
    }
}

/// Drives every change through the store and redraws only from a full reload.
///
/// The cached list is never edited locally: an action sends its mutation,
/// then replaces the cache with whatever the store returns. If either step
/// fails the cache is left as it was.
pub struct SyncController<A> {
    api: A,
    state: Mutex<ViewState>,
}

impl<A: TaskApi> SyncController<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            state: Mutex::new(ViewState::default()),
        }
    }

    /// Initial (or manual) reload without a mutation.
    pub async fn load(&self) -> Result<(), TaskError> {
        let ticket = self.state.lock().await.begin(SyncPhase::Refreshing);
        let result = self.refresh(ticket).await;
        self.finish(ticket, None, &result).await;
        result
    }

    pub async fn add(
        &self,
        title: &str,
        datetime: Option<NaiveDateTime>,
        starred: bool,
    ) -> Result<(), TaskError> {
        let fields = NewTask {
            title: validate_title(title)?,
            datetime,
            completed: false,
            starred,
        };
        self.perform(None, Mutation::Create(fields)).await
    }

    /// Replace title, alert time and star of an existing task.
    pub async fn edit(
        &self,
        id: &str,
        title: &str,
        datetime: Option<NaiveDateTime>,
        starred: bool,
    ) -> Result<(), TaskError> {
        let patch = TaskPatch {
            title: Some(validate_title(title)?),
            datetime: Some(datetime),
            starred: Some(starred),
            ..TaskPatch::default()
        };
        self.perform(Some(id), Mutation::Update(id.to_string(), patch))
            .await
    }

    pub async fn toggle_complete(&self, id: &str) -> Result<(), TaskError> {
        let current = self.cached(id).await?;
        let patch = TaskPatch::completed(!current.completed);
        self.perform(Some(id), Mutation::Update(id.to_string(), patch))
            .await
    }

    pub async fn toggle_star(&self, id: &str) -> Result<(), TaskError> {
        let current = self.cached(id).await?;
        let patch = TaskPatch::starred(!current.starred);
        self.perform(Some(id), Mutation::Update(id.to_string(), patch))
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<(), TaskError> {
        self.perform(Some(id), Mutation::Delete(id.to_string()))
            .await
    }

    /// Select a category card; selecting the active one again clears the filter.
    pub async fn select(&self, bucket: Bucket) {
        self.state.lock().await.active.toggle(bucket);
    }

    pub async fn clear_selection(&self) {
        self.state.lock().await.active.clear();
    }

    pub async fn tasks(&self) -> Vec<Task> {
        self.state.lock().await.tasks.clone()
    }

    pub async fn task(&self, id: &str) -> Option<Task> {
        self.state
            .lock()
            .await
            .tasks
            .iter()
            .find(|t| t.id == id)
            .cloned()
    }

    /// Phase of the least advanced outstanding action, or `Idle` when none is.
    pub async fn phase(&self) -> SyncPhase {
        self.state.lock().await.phase()
    }

    pub async fn status(&self) -> SyncStatus {
        self.state.lock().await.status.clone()
    }

    pub async fn snapshot(&self, now: NaiveDateTime) -> Snapshot {
        let state = self.state.lock().await;
        Snapshot {
            counts: BucketCounts::tally(&state.tasks, now),
            view: TaskView::build(&state.tasks, state.active, now),
            active: state.active,
            status: state.status.clone(),
        }
    }

    async fn cached(&self, id: &str) -> Result<Task, TaskError> {
        self.task(id)
            .await
            .ok_or_else(|| TaskError::NotFound(id.to_string()))
    }

    async fn perform(&self, target: Option<&str>, mutation: Mutation) -> Result<(), TaskError> {
        let ticket = {
            let mut state = self.state.lock().await;
            if let Some(id) = target {
                if !state.in_flight.insert(id.to_string()) {
                    log::warn!("Ignoring change to task {}: previous change still in flight", id);
                    return Err(TaskError::InFlight(id.to_string()));
                }
            }
            state.begin(SyncPhase::Sending)
        };

        let result = match self.send(mutation).await {
            Ok(()) => self.refresh(ticket).await,
            Err(e) => Err(e),
        };
        self.finish(ticket, target, &result).await;
        result
    }

    async fn send(&self, mutation: Mutation) -> Result<(), TaskError> {
        match mutation {
            Mutation::Create(fields) => {
                let task = self.api.create(fields).await?;
                log::info!("Created task {}", task.id);
            }
            Mutation::Update(id, patch) => {
                self.api.update(&id, patch).await?;
                log::info!("Updated task {}", id);
            }
            Mutation::Delete(id) => match self.api.delete(&id).await {
                Ok(()) => log::info!("Deleted task {}", id),
                Err(TaskError::NotFound(_)) => log::debug!("Task {} was already gone", id),
                Err(e) => return Err(e),
            },
        }
        Ok(())
    }

    async fn refresh(&self, ticket: u64) -> Result<(), TaskError> {
        let generation = {
            let mut state = self.state.lock().await;
            state.actions.insert(ticket, SyncPhase::Refreshing);
            state.issued_generation += 1;
            state.issued_generation
        };

        let tasks = self.api.list().await?;

        let mut state = self.state.lock().await;
        if generation < state.shown_generation {
            log::debug!("Discarding stale reload {} (showing {})", generation, state.shown_generation);
            return Ok(());
        }
        log::debug!("Reloaded {} tasks", tasks.len());
        state.tasks = tasks;
        state.shown_generation = generation;
        Ok(())
    }

    async fn finish(&self, ticket: u64, target: Option<&str>, result: &Result<(), TaskError>) {
        let mut state = self.state.lock().await;
        if let Some(id) = target {
            state.in_flight.remove(id);
        }
        state.actions.remove(&ticket);
        state.status = match result {
            Ok(()) if !state.actions.is_empty() => SyncStatus::Syncing,
            Ok(()) => {
                let now = chrono::Local::now().format("%H:%M").to_string();
                SyncStatus::LastSynced(now)
            }
            Err(e) => {
                log::error!("Task sync failed: {}", e);
                SyncStatus::Error(e.to_string())
            }
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::TaskStore;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tokio::sync::Notify;

    fn now() -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }

    /// Store wrapper that can fail on demand, count calls and hold updates open.
    #[derive(Default)]
    struct TestApi {
        store: TaskStore,
        fail_writes: AtomicBool,
        fail_reads: AtomicBool,
        writes: AtomicUsize,
        hold_updates: AtomicBool,
        entered: Notify,
        release: Notify,
        /// Holds the next `list` open after it has read the store.
        hold_next_list: AtomicBool,
        list_entered: Notify,
        list_release: Notify,
    }

    impl TestApi {
        fn seeded() -> Self {
            Self {
                store: TaskStore::seeded(),
                ..Self::default()
            }
        }

        fn check_write(&self) -> Result<(), TaskError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(TaskError::Network("connection refused".into()));
            }
            Ok(())
        }
    }

    impl TaskApi for TestApi {
        async fn list(&self) -> Result<Vec<Task>, TaskError> {
            if self.fail_reads.load(Ordering::SeqCst) {
                return Err(TaskError::Network("connection reset".into()));
            }
            let tasks = self.store.list().await;
            if self.hold_next_list.swap(false, Ordering::SeqCst) {
                self.list_entered.notify_one();
                self.list_release.notified().await;
            }
            Ok(tasks)
        }

        async fn create(&self, fields: NewTask) -> Result<Task, TaskError> {
            self.check_write()?;
            self.store.create(fields).await
        }

        async fn update(&self, id: &str, patch: TaskPatch) -> Result<Task, TaskError> {
            self.check_write()?;
            if self.hold_updates.load(Ordering::SeqCst) {
                self.entered.notify_one();
                self.release.notified().await;
            }
            self.store.update(id, patch).await
        }

        async fn delete(&self, id: &str) -> Result<(), TaskError> {
            self.check_write()?;
            self.store.delete(id).await;
            Ok(())
        }
    }

    async fn loaded() -> SyncController<Arc<TestApi>> {
        let controller = SyncController::new(Arc::new(TestApi::seeded()));
        controller.load().await.unwrap();
        controller
    }

    #[tokio::test]
    async fn load_fills_cache_and_counts() {
        let controller = loaded().await;
        let snapshot = controller.snapshot(now()).await;
        assert_eq!(snapshot.view.total_count(), 6);
        assert_eq!(snapshot.counts.important, 2);
        assert_eq!(snapshot.counts.scheduled, 3);
        assert_eq!(snapshot.counts.no_alert, 2);
        assert_eq!(snapshot.counts.completed, 1);
        assert_eq!(snapshot.counts.place, 0);
        assert!(matches!(snapshot.status, SyncStatus::LastSynced(_)));
        assert_eq!(controller.phase().await, SyncPhase::Idle);
    }

    #[tokio::test]
    async fn display_follows_store_after_each_action() {
        let controller = loaded().await;

        controller.toggle_complete("4").await.unwrap();
        assert!(controller.task("4").await.unwrap().completed);

        controller.toggle_star("4").await.unwrap();
        assert!(controller.task("4").await.unwrap().starred);

        controller.add("Fresh", None, false).await.unwrap();
        assert_eq!(controller.tasks().await.len(), 7);

        controller.edit("7", "Renamed", None, true).await.unwrap();
        let edited = controller.task("7").await.unwrap();
        assert_eq!(edited.title, "Renamed");
        assert!(edited.starred);

        controller.delete("7").await.unwrap();
        assert!(controller.task("7").await.is_none());
        assert_eq!(controller.tasks().await, controller.api.store.list().await);
    }

    #[tokio::test]
    async fn empty_title_never_reaches_store() {
        let controller = loaded().await;
        assert_eq!(
            controller.add("   ", None, true).await,
            Err(TaskError::title_required())
        );
        assert_eq!(
            controller.edit("1", "", None, true).await,
            Err(TaskError::title_required())
        );
        assert_eq!(controller.api.writes.load(Ordering::SeqCst), 0);
        assert_eq!(controller.api.store.len().await, 6);
    }

    #[tokio::test]
    async fn failed_send_keeps_previous_view() {
        let controller = loaded().await;
        let before = controller.tasks().await;

        controller.api.fail_writes.store(true, Ordering::SeqCst);
        let result = controller.toggle_complete("1").await;
        assert!(matches!(result, Err(TaskError::Network(_))));
        assert_eq!(controller.tasks().await, before);
        assert!(matches!(controller.status().await, SyncStatus::Error(_)));
        assert_eq!(controller.phase().await, SyncPhase::Idle);

        // The failure does not wedge the task.
        controller.api.fail_writes.store(false, Ordering::SeqCst);
        controller.toggle_complete("1").await.unwrap();
        assert!(controller.task("1").await.unwrap().completed);
    }

    #[tokio::test]
    async fn failed_reload_keeps_previous_view() {
        let controller = loaded().await;
        let before = controller.tasks().await;

        controller.api.fail_reads.store(true, Ordering::SeqCst);
        assert!(controller.toggle_star("3").await.is_err());
        // The store applied the change but the display has not seen it.
        assert!(controller.api.store.get("3").await.unwrap().starred);
        assert_eq!(controller.tasks().await, before);

        controller.api.fail_reads.store(false, Ordering::SeqCst);
        controller.load().await.unwrap();
        assert!(controller.task("3").await.unwrap().starred);
    }

    #[tokio::test]
    async fn toggling_unknown_task_sends_nothing() {
        let controller = loaded().await;
        assert_eq!(
            controller.toggle_complete("99").await,
            Err(TaskError::NotFound("99".to_string()))
        );
        assert_eq!(controller.api.writes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn deleting_twice_is_fine() {
        let controller = loaded().await;
        controller.delete("2").await.unwrap();
        controller.delete("2").await.unwrap();
        assert_eq!(controller.tasks().await.len(), 5);
    }

    #[tokio::test]
    async fn second_change_to_in_flight_task_is_rejected() {
        let controller = Arc::new(loaded().await);
        controller.api.hold_updates.store(true, Ordering::SeqCst);

        let first = {
            let controller = Arc::clone(&controller);
            tokio::spawn(async move { controller.toggle_star("6").await })
        };
        controller.api.entered.notified().await;
        assert_eq!(controller.phase().await, SyncPhase::Sending);

        assert_eq!(
            controller.toggle_star("6").await,
            Err(TaskError::InFlight("6".to_string()))
        );
        assert_eq!(controller.api.writes.load(Ordering::SeqCst), 1);

        controller.api.hold_updates.store(false, Ordering::SeqCst);
        controller.api.release.notify_one();
        first.await.unwrap().unwrap();
        assert!(controller.task("6").await.unwrap().starred);
    }

    #[tokio::test]
    async fn stale_reload_does_not_overwrite_newer_one() {
        let controller = Arc::new(loaded().await);
        controller.api.hold_next_list.store(true, Ordering::SeqCst);

        let slow = {
            let controller = Arc::clone(&controller);
            tokio::spawn(async move { controller.toggle_star("6").await })
        };
        // The slow reload has read the store: 6 starred, 4 not.
        controller.api.list_entered.notified().await;

        controller.toggle_star("4").await.unwrap();
        assert!(controller.task("4").await.unwrap().starred);
        assert!(controller.task("6").await.unwrap().starred);

        controller.api.list_release.notify_one();
        slow.await.unwrap().unwrap();
        assert!(controller.task("4").await.unwrap().starred);
        assert!(controller.task("6").await.unwrap().starred);
        assert_eq!(controller.tasks().await, controller.api.store.list().await);
    }

    #[tokio::test]
    async fn phase_waits_for_every_outstanding_action() {
        let controller = Arc::new(loaded().await);
        controller.api.hold_updates.store(true, Ordering::SeqCst);

        let held = {
            let controller = Arc::clone(&controller);
            tokio::spawn(async move { controller.toggle_star("6").await })
        };
        controller.api.entered.notified().await;

        controller.delete("5").await.unwrap();
        assert_eq!(controller.phase().await, SyncPhase::Sending);
        assert_eq!(controller.status().await, SyncStatus::Syncing);

        controller.api.hold_updates.store(false, Ordering::SeqCst);
        controller.api.release.notify_one();
        held.await.unwrap().unwrap();
        assert_eq!(controller.phase().await, SyncPhase::Idle);
        assert!(matches!(controller.status().await, SyncStatus::LastSynced(_)));
    }

    #[tokio::test]
    async fn selection_filters_snapshot() {
        let controller = loaded().await;
        controller.select(Bucket::Important).await;
        let snapshot = controller.snapshot(now()).await;
        let ids: Vec<&str> = snapshot.view.tasks().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert_eq!(snapshot.active.get(), Some(Bucket::Important));

        controller.select(Bucket::Place).await;
        assert_eq!(controller.snapshot(now()).await.view.total_count(), 0);

        controller.select(Bucket::Place).await;
        assert_eq!(controller.snapshot(now()).await.active.get(), None);

        controller.select(Bucket::Completed).await;
        controller.clear_selection().await;
        assert_eq!(controller.snapshot(now()).await.active.get(), None);
    }
}
