//! Construction of projection writes from decoded events.

use crate::db::{DbOperation, DbValue};
use crate::events::{AuctionCreated, BidPlaced};

/// Table holding the auction read model.
pub const AUCTIONS_TABLE: &str = "auctions";

/// The auction contract does not emit listing metadata, so every projected
/// row starts with placeholder name and description.
pub const PLACEHOLDER_NAME: &str = "Velax Item";
pub const PLACEHOLDER_DESCRIPTION: &str = "No description";

/// Upsert for a newly observed auction. `current_bid` comes from the live
/// object state and seeds both `highest_bid` and `starting_price`.
///
/// `highest_bidder` is inserted as NULL and excluded from the conflict
/// update; a replayed creation leaves any recorded bidder in place.
pub fn auction_created_op(event: &AuctionCreated, current_bid: u64) -> DbOperation {
    DbOperation::Upsert {
        table: AUCTIONS_TABLE.to_string(),
        columns: vec![
            "auction_id".to_string(),
            "seller".to_string(),
            "image_url".to_string(),
            "end_time".to_string(),
            "highest_bid".to_string(),
            "starting_price".to_string(),
            "highest_bidder".to_string(),
            "is_active".to_string(),
            "name".to_string(),
            "description".to_string(),
        ],
        values: vec![
            DbValue::Text(event.auction_id.clone()),
            DbValue::Text(event.seller.clone()),
            DbValue::Text(event.image_url.clone()),
            DbValue::Uint64(event.end_time),
            DbValue::Uint64(current_bid),
            DbValue::Uint64(current_bid),
            DbValue::Null,
            DbValue::Bool(true),
            DbValue::Text(PLACEHOLDER_NAME.to_string()),
            DbValue::Text(PLACEHOLDER_DESCRIPTION.to_string()),
        ],
        conflict_columns: vec!["auction_id".to_string()],
        update_columns: vec![
            "seller".to_string(),
            "image_url".to_string(),
            "end_time".to_string(),
            "highest_bid".to_string(),
            "starting_price".to_string(),
            "is_active".to_string(),
            "name".to_string(),
            "description".to_string(),
        ],
    }
}

/// Update for an accepted bid. Touches only the bid columns; the zero-rows
/// case (bid observed before its auction row exists) is left to the caller.
pub fn bid_placed_op(event: &BidPlaced) -> DbOperation {
    DbOperation::Update {
        table: AUCTIONS_TABLE.to_string(),
        set_columns: vec![
            ("highest_bid".to_string(), DbValue::Uint64(event.amount)),
            ("highest_bidder".to_string(), DbValue::Text(event.bidder.clone())),
        ],
        key_column: "auction_id".to_string(),
        key_value: DbValue::Text(event.auction_id.clone()),
    }
}
