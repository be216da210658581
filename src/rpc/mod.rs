mod client;
mod types;

pub use client::{with_retry, RetryConfig, RpcError, SuiClient, SuiClientConfig};
pub use types::{EventFilter, EventId, EventPage, ObjectContent, ObjectData, ObjectResponse, SuiEvent};
