pub mod error;
pub mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::http::HeaderValue;
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
};
use axum::middleware;
use axum::response::Response;
use axum::routing::{get, put};
use tokio::net::TcpListener;

use crate::store::TaskStore;

/// Base path of the task collection.
pub const TASKS_PATH: &str = "/api/tasks";

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<TaskStore>,
}

impl AppState {
    pub fn new(store: Arc<TaskStore>) -> Self {
        Self { store }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            TASKS_PATH,
            get(handlers::list_tasks)
                .post(handlers::create_task)
                .options(handlers::preflight),
        )
        .route(
            "/api/tasks/{id}",
            put(handlers::update_task)
                .delete(handlers::delete_task)
                .options(handlers::preflight),
        )
        .layer(middleware::map_response(allow_any_origin))
        .with_state(state)
}

/// Serve the API on an already-bound listener until the process exits.
pub async fn serve(listener: TcpListener, store: Arc<TaskStore>) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        log::info!("Serving tasks on http://{}{}", addr, TASKS_PATH);
    }
    axum::serve(listener, router(AppState::new(store))).await
}

async fn allow_any_origin(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, PUT, DELETE, OPTIONS"),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("content-type"),
    );
    response
}
