pub mod config;
pub mod core;
pub mod error;
pub mod logging;
pub mod render;
pub mod server;
pub mod store;
pub mod sync;
