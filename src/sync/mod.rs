pub mod client;
pub mod controller;

use std::future::Future;
use std::sync::Arc;

use crate::core::task::{NewTask, Task, TaskPatch};
use crate::error::TaskError;
use crate::store::TaskStore;

pub use client::TaskClient;
pub use controller::{Snapshot, SyncController, SyncPhase, SyncStatus};

/// The four task operations, whether the store is in-process or behind HTTP.
pub trait TaskApi: Send + Sync {
    fn list(&self) -> impl Future<Output = Result<Vec<Task>, TaskError>> + Send;

    fn create(&self, fields: NewTask) -> impl Future<Output = Result<Task, TaskError>> + Send;

    fn update(
        &self,
        id: &str,
        patch: TaskPatch,
    ) -> impl Future<Output = Result<Task, TaskError>> + Send;

    /// Deleting an unknown id succeeds.
    fn delete(&self, id: &str) -> impl Future<Output = Result<(), TaskError>> + Send;
}

impl TaskApi for TaskStore {
    async fn list(&self) -> Result<Vec<Task>, TaskError> {
        Ok(TaskStore::list(self).await)
    }

    async fn create(&self, fields: NewTask) -> Result<Task, TaskError> {
        TaskStore::create(self, fields).await
    }

    async fn update(&self, id: &str, patch: TaskPatch) -> Result<Task, TaskError> {
        TaskStore::update(self, id, patch).await
    }

    async fn delete(&self, id: &str) -> Result<(), TaskError> {
        TaskStore::delete(self, id).await;
        Ok(())
    }
}

impl<T: TaskApi> TaskApi for Arc<T> {
    fn list(&self) -> impl Future<Output = Result<Vec<Task>, TaskError>> + Send {
        (**self).list()
    }

    fn create(&self, fields: NewTask) -> impl Future<Output = Result<Task, TaskError>> + Send {
        (**self).create(fields)
    }

    fn update(
        &self,
        id: &str,
        patch: TaskPatch,
    ) -> impl Future<Output = Result<Task, TaskError>> + Send {
        (**self).update(id, patch)
    }

    fn delete(&self, id: &str) -> impl Future<Output = Result<(), TaskError>> + Send {
        (**self).delete(id)
    }
}
