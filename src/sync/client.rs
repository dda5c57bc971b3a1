use reqwest::{Client, Response, StatusCode};

use super::TaskApi;
use crate::core::task::{NewTask, Task, TaskPatch};
use crate::error::TaskError;
use crate::server::TASKS_PATH;
use crate::server::error::ErrorBody;

/// HTTP client for a remote task store.
#[derive(Clone)]
pub struct TaskClient {
    base_url: String,
    http: Client,
}

impl TaskClient {
    pub fn new(base_url: &str) -> Result<Self, TaskError> {
        let http = Client::builder()
            .build()
            .map_err(|e| TaskError::Network(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn tasks_url(&self) -> String {
        format!("{}{}", self.base_url, TASKS_PATH)
    }

    fn task_url(&self, id: &str) -> String {
        format!("{}/{}", self.tasks_url(), id)
    }

    pub async fn list(&self) -> Result<Vec<Task>, TaskError> {
        let resp = self
            .http
            .get(self.tasks_url())
            .send()
            .await
            .map_err(|e| TaskError::Network(format!("GET tasks failed: {}", e)))?;
        let resp = check_status(resp, None).await?;
        Ok(resp.json().await?)
    }

    pub async fn create(&self, fields: &NewTask) -> Result<Task, TaskError> {
        let resp = self
            .http
            .post(self.tasks_url())
            .json(fields)
            .send()
            .await
            .map_err(|e| TaskError::Network(format!("POST task failed: {}", e)))?;
        let resp = check_status(resp, None).await?;
        Ok(resp.json().await?)
    }

    pub async fn update(&self, id: &str, patch: &TaskPatch) -> Result<Task, TaskError> {
        let resp = self
            .http
            .put(self.task_url(id))
            .json(patch)
            .send()
            .await
            .map_err(|e| TaskError::Network(format!("PUT task {} failed: {}", id, e)))?;
        let resp = check_status(resp, Some(id)).await?;
        Ok(resp.json().await?)
    }

    pub async fn delete(&self, id: &str) -> Result<(), TaskError> {
        let resp = self
            .http
            .delete(self.task_url(id))
            .send()
            .await
            .map_err(|e| TaskError::Network(format!("DELETE task {} failed: {}", id, e)))?;
        match check_status(resp, Some(id)).await {
            Ok(_) | Err(TaskError::NotFound(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

/// Map a non-success status onto the error taxonomy.
async fn check_status(resp: Response, id: Option<&str>) -> Result<Response, TaskError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let text = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|body| body.error)
        .unwrap_or(text);

    match status {
        StatusCode::NOT_FOUND => Err(TaskError::NotFound(id.unwrap_or_default().to_string())),
        StatusCode::BAD_REQUEST => Err(TaskError::Validation(message)),
        StatusCode::CONFLICT => Err(TaskError::InFlight(id.unwrap_or_default().to_string())),
        s => Err(TaskError::Network(format!("Server returned {}: {}", s, message))),
    }
}

impl TaskApi for TaskClient {
    async fn list(&self) -> Result<Vec<Task>, TaskError> {
        TaskClient::list(self).await
    }

    async fn create(&self, fields: NewTask) -> Result<Task, TaskError> {
        TaskClient::create(self, &fields).await
    }

    async fn update(&self, id: &str, patch: TaskPatch) -> Result<Task, TaskError> {
        TaskClient::update(self, id, &patch).await
    }

    async fn delete(&self, id: &str) -> Result<(), TaskError> {
        TaskClient::delete(self, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::TaskStore;
    use std::sync::Arc;

    async fn spawn_server(store: Arc<TaskStore>) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(crate::server::serve(listener, store));
        format!("http://127.0.0.1:{}/", port)
    }

    #[tokio::test]
    async fn crud_over_http() {
        let store = Arc::new(TaskStore::seeded());
        let client = TaskClient::new(&spawn_server(Arc::clone(&store)).await).unwrap();
        assert!(!client.base_url().ends_with('/'));

        let tasks = client.list().await.unwrap();
        assert_eq!(tasks, TaskStore::list(&store).await);

        let mut fields = NewTask::new("Over the wire");
        fields.datetime = crate::core::task::parse_datetime("2025-03-01T09:15").unwrap();
        let created = client.create(&fields).await.unwrap();
        assert_eq!(created.id, "7");
        assert_eq!(created.datetime, fields.datetime);

        let patch = TaskPatch {
            datetime: Some(None),
            starred: Some(true),
            ..TaskPatch::default()
        };
        let updated = client.update(&created.id, &patch).await.unwrap();
        assert!(updated.starred);
        assert!(!updated.has_alert());
        assert_eq!(store.get("7").await.unwrap(), updated);

        client.delete("7").await.unwrap();
        client.delete("7").await.unwrap();
        assert_eq!(store.len().await, 6);
    }

    #[tokio::test]
    async fn maps_error_statuses() {
        let store = Arc::new(TaskStore::seeded());
        let client = TaskClient::new(&spawn_server(store).await).unwrap();

        assert_eq!(
            client.update("99", &TaskPatch::completed(true)).await,
            Err(TaskError::NotFound("99".to_string()))
        );
        assert_eq!(
            client.create(&NewTask::new(" ")).await,
            Err(TaskError::title_required())
        );
    }

    #[tokio::test]
    async fn unreachable_server_is_network_failure() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let client = TaskClient::new(&format!("http://127.0.0.1:{}", port)).unwrap();
        assert!(matches!(client.list().await, Err(TaskError::Network(_))));
    }
}
