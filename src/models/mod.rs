// Models module

pub mod thought;

// Re-export commonly used types
pub use thought::{CreateThoughtRequest, LikeResponse, NewThought, Thought, ValidationErrors};
