use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Position of an event in the chain's event stream: the digest of the
/// transaction that emitted it plus the event's index within that
/// transaction. Doubles as the paging cursor for `suix_queryEvents`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventId {
    pub tx_digest: String,
    pub event_seq: String,
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.tx_digest, self.event_seq)
    }
}

/// Server-side event filter for `suix_queryEvents`. Serializes to the
/// externally tagged form the node expects, e.g.
/// `{"MoveEventType": "0x2::auction::AuctionCreated"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum EventFilter {
    MoveEventType(String),
}

impl fmt::Display for EventFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventFilter::MoveEventType(event_type) => write!(f, "{}", event_type),
        }
    }
}

/// A single event as returned by the node. Only the fields the indexer
/// consumes are decoded; the rest of the payload is ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuiEvent {
    pub id: EventId,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub parsed_json: Value,
}

/// One page of `suix_queryEvents` results.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPage {
    pub data: Vec<SuiEvent>,
    pub next_cursor: Option<EventId>,
    pub has_next_page: bool,
}

/// `sui_getObject` response envelope. `data` is absent when the object does
/// not exist; `error` then carries the node's explanation.
#[derive(Debug, Clone, Deserialize)]
pub struct ObjectResponse {
    #[serde(default)]
    pub data: Option<ObjectData>,
    #[serde(default)]
    pub error: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectData {
    #[serde(default)]
    pub content: Option<ObjectContent>,
}

/// Parsed content of an object. `fields` is only populated for Move
/// objects, never for packages.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectContent {
    pub data_type: String,
    #[serde(default)]
    pub fields: Map<String, Value>,
}
