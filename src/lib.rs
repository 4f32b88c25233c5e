// Library root for the Happy Thoughts API

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod store;

// Re-export commonly used types
pub use db::Database;
pub use error::{ApiError, ApiResult};
pub use models::{CreateThoughtRequest, Thought};
pub use store::{MemoryStore, SharedStore, ThoughtStore};
