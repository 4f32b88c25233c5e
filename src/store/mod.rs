// Persistence seam
// Handlers only see `ThoughtStore`; PostgreSQL and the in-memory store both implement it.

pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{NewThought, Thought};

pub use memory::MemoryStore;

/// Number of thoughts returned by a listing
pub const THOUGHTS_PAGE_SIZE: usize = 20;

/// Shared store handle injected into the router state
pub type SharedStore = Arc<dyn ThoughtStore>;

#[async_trait]
pub trait ThoughtStore: Send + Sync {
    /// Newest thoughts first, at most `limit` of them
    async fn list_recent(&self, limit: usize) -> Result<Vec<Thought>, ApiError>;

    /// Persist a validated thought, assigning its id and creation time
    async fn insert(&self, thought: NewThought) -> Result<Thought, ApiError>;

    /// Add one heart in a single atomic step and return the updated thought,
    /// or `None` when no thought has this id.
    async fn increment_hearts(&self, id: Uuid) -> Result<Option<Thought>, ApiError>;

    /// Liveness probe
    async fn ping(&self) -> Result<(), ApiError>;
}
