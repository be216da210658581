use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::rpc::SuiEvent;

#[derive(Debug, Error)]
pub enum EventDecodeError {
    #[error("malformed {event_type} payload in event {position}: {source}")]
    MalformedPayload {
        event_type: String,
        position: String,
        #[source]
        source: serde_json::Error,
    },
}

/// `AuctionCreated` event emitted when a seller lists an item.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AuctionCreated {
    pub auction_id: String,
    pub seller: String,
    pub image_url: String,
    #[serde(deserialize_with = "u64_from_string_or_number")]
    pub end_time: u64,
}

impl AuctionCreated {
    pub fn decode(event: &SuiEvent) -> Result<Self, EventDecodeError> {
        decode_payload(event)
    }
}

/// `BidPlaced` event emitted for every accepted bid.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BidPlaced {
    pub auction_id: String,
    pub bidder: String,
    #[serde(deserialize_with = "u64_from_string_or_number")]
    pub amount: u64,
}

impl BidPlaced {
    pub fn decode(event: &SuiEvent) -> Result<Self, EventDecodeError> {
        decode_payload(event)
    }
}

fn decode_payload<T: DeserializeOwned>(event: &SuiEvent) -> Result<T, EventDecodeError> {
    serde_json::from_value(event.parsed_json.clone()).map_err(|source| {
        EventDecodeError::MalformedPayload {
            event_type: event.event_type.clone(),
            position: event.id.to_string(),
            source,
        }
    })
}

/// Move `u64` fields arrive as JSON strings in `parsedJson`; plain numbers
/// are tolerated as well.
fn u64_from_string_or_number<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s
            .parse::<u64>()
            .map_err(|_| serde::de::Error::custom(format!("invalid u64 string {:?}", s))),
    }
}

/// Read a `u64` out of Move object fields, treating a missing, null, or
/// unparseable value as zero.
pub fn u64_field_or_zero(fields: &Map<String, Value>, name: &str) -> u64 {
    match fields.get(name) {
        Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
        Some(Value::String(s)) => s.parse().unwrap_or(0),
        _ => 0,
    }
}
