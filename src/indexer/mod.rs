//! Event ingestion: the polling loop, its seams, and the projection writes.

pub mod engine;
pub mod error;
pub mod handlers;
pub mod traits;

pub use engine::Indexer;
pub use error::IndexError;
pub use traits::{EventSource, ProjectionStore};
