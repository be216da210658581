//! Seams between the ingestion loop and the outside world. The binary wires
//! in [`SuiClient`] and [`DbPool`]; tests substitute scripted
//! implementations.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::db::{DbError, DbOperation, DbPool};
use crate::rpc::{EventFilter, EventId, EventPage, RpcError, SuiClient};

/// Source of chain events and object state.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Fetch one page of events matching `filter`, strictly after `cursor`,
    /// oldest first.
    async fn query_events(
        &self,
        filter: &EventFilter,
        cursor: Option<&EventId>,
        limit: Option<usize>,
    ) -> Result<EventPage, RpcError>;

    /// Current Move fields of an object, or `None` when unavailable.
    async fn object_fields(&self, object_id: &str) -> Result<Option<Map<String, Value>>, RpcError>;
}

/// Sink for projected rows.
#[async_trait]
pub trait ProjectionStore: Send + Sync {
    /// Apply one write and return the number of rows it touched.
    async fn apply(&self, operation: DbOperation) -> Result<u64, DbError>;
}

#[async_trait]
impl EventSource for SuiClient {
    async fn query_events(
        &self,
        filter: &EventFilter,
        cursor: Option<&EventId>,
        limit: Option<usize>,
    ) -> Result<EventPage, RpcError> {
        SuiClient::query_events(self, filter, cursor, limit).await
    }

    async fn object_fields(&self, object_id: &str) -> Result<Option<Map<String, Value>>, RpcError> {
        SuiClient::object_fields(self, object_id).await
    }
}

#[async_trait]
impl ProjectionStore for DbPool {
    async fn apply(&self, operation: DbOperation) -> Result<u64, DbError> {
        self.execute(operation).await
    }
}
