//! Indexer for the Velax auction contract on Sui.
//!
//! Polls a fullnode for `AuctionCreated` and `BidPlaced` events and projects
//! them into an `auctions` table in Postgres, which serves as a denormalized
//! read model for the marketplace UI. The chain stays the source of truth;
//! every projection write is idempotent so replayed events are harmless.
//!
//! ```text
//! fullnode ──suix_queryEvents──► Indexer ──DbOperation──► Postgres
//!                                   │
//!                                   └──sui_getObject──► live object state
//! ```

pub mod config;
pub mod db;
pub mod events;
pub mod indexer;
pub mod rpc;
