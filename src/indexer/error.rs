use thiserror::Error;

use crate::db::DbError;
use crate::events::EventDecodeError;
use crate::rpc::RpcError;

/// Error surfaced by one ingestion iteration.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),

    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Decode error: {0}")]
    Decode(#[from] EventDecodeError),
}
