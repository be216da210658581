//! The ingestion loop.
//!
//! A single sequential task: each iteration drains new `AuctionCreated`
//! events, then new `BidPlaced` events, applying one store write per event
//! and advancing the matching in-memory cursor only after that write
//! succeeds. Any error aborts the iteration; the next one re-fetches from
//! the last applied position, so a failure can replay events but never skip
//! them. Cursors are not persisted, which makes delivery at-least-once
//! across restarts and puts the burden of safety on idempotent writes.

use std::time::Duration;

use crate::config::IndexerConfig;
use crate::events::{u64_field_or_zero, AuctionCreated, BidPlaced};
use crate::rpc::{EventFilter, EventId};

use super::error::IndexError;
use super::handlers::{auction_created_op, bid_placed_op};
use super::traits::{EventSource, ProjectionStore};

/// Move module and event names emitted by the auction package.
const AUCTION_MODULE: &str = "auction";
const AUCTION_CREATED_EVENT: &str = "AuctionCreated";
const BID_PLACED_EVENT: &str = "BidPlaced";

/// Object field holding the current highest bid.
const HIGHEST_BID_FIELD: &str = "highest_bid";

pub struct Indexer<S, P> {
    source: S,
    store: P,
    created_filter: EventFilter,
    bid_filter: EventFilter,
    page_size: Option<usize>,
    poll_interval: Duration,
    retry_interval: Duration,
    created_cursor: Option<EventId>,
    bid_cursor: Option<EventId>,
}

impl<S: EventSource, P: ProjectionStore> Indexer<S, P> {
    pub fn new(source: S, store: P, config: &IndexerConfig) -> Self {
        Self {
            source,
            store,
            created_filter: move_event_filter(&config.package_id, AUCTION_CREATED_EVENT),
            bid_filter: move_event_filter(&config.package_id, BID_PLACED_EVENT),
            page_size: config.page_size,
            poll_interval: config.poll_interval,
            retry_interval: config.retry_interval,
            created_cursor: None,
            bid_cursor: None,
        }
    }

    /// Poll forever. Successful iterations are spaced by the poll interval,
    /// failed ones by the longer recovery interval.
    pub async fn run(&mut self) {
        tracing::info!(
            "Ingestion loop started (poll interval {:?}, recovery interval {:?})",
            self.poll_interval,
            self.retry_interval
        );
        loop {
            match self.run_iteration().await {
                Ok(()) => tokio::time::sleep(self.poll_interval).await,
                Err(e) => {
                    tracing::error!(
                        "Ingestion iteration failed: {}. Retrying in {:?}",
                        e,
                        self.retry_interval
                    );
                    tokio::time::sleep(self.retry_interval).await;
                }
            }
        }
    }

    /// One full pass: all new creation events, then all new bid events.
    pub async fn run_iteration(&mut self) -> Result<(), IndexError> {
        self.ingest_created_events().await?;
        self.ingest_bid_events().await?;
        Ok(())
    }

    async fn ingest_created_events(&mut self) -> Result<(), IndexError> {
        loop {
            let page = self
                .source
                .query_events(&self.created_filter, self.created_cursor.as_ref(), self.page_size)
                .await?;

            for event in &page.data {
                let created = AuctionCreated::decode(event)?;
                let current_bid = self.current_bid(&created.auction_id).await?;
                self.store
                    .apply(auction_created_op(&created, current_bid))
                    .await
                    .map_err(|e| {
                        tracing::error!(
                            "Failed to project auction {} at {}: {}",
                            created.auction_id,
                            event.id,
                            e
                        );
                        e
                    })?;
                tracing::info!(
                    "Indexed auction {} (seller {}, current bid {})",
                    created.auction_id,
                    created.seller,
                    current_bid
                );
                self.created_cursor = Some(event.id.clone());
            }

            if page.data.is_empty() || !page.has_next_page {
                break;
            }
        }
        Ok(())
    }

    async fn ingest_bid_events(&mut self) -> Result<(), IndexError> {
        loop {
            let page = self
                .source
                .query_events(&self.bid_filter, self.bid_cursor.as_ref(), self.page_size)
                .await?;

            for event in &page.data {
                let bid = BidPlaced::decode(event)?;
                let rows = self
                    .store
                    .apply(bid_placed_op(&bid))
                    .await
                    .map_err(|e| {
                        tracing::error!(
                            "Failed to project bid on {} at {}: {}",
                            bid.auction_id,
                            event.id,
                            e
                        );
                        e
                    })?;
                if rows == 0 {
                    // Bid events can be observed before the creation event
                    // of their auction; the row simply does not exist yet.
                    tracing::debug!(
                        "No auction row for bid on {} by {}",
                        bid.auction_id,
                        bid.bidder
                    );
                } else {
                    tracing::info!(
                        "Bid by {} on auction {}: {}",
                        bid.bidder,
                        bid.auction_id,
                        bid.amount
                    );
                }
                self.bid_cursor = Some(event.id.clone());
            }

            if page.data.is_empty() || !page.has_next_page {
                break;
            }
        }
        Ok(())
    }

    /// Live `highest_bid` of the auction object, or zero when the object or
    /// the field is unavailable.
    async fn current_bid(&self, auction_id: &str) -> Result<u64, IndexError> {
        let fields = self.source.object_fields(auction_id).await?;
        Ok(fields
            .as_ref()
            .map(|f| u64_field_or_zero(f, HIGHEST_BID_FIELD))
            .unwrap_or(0))
    }

    /// Position of the last applied creation event.
    pub fn created_cursor(&self) -> Option<&EventId> {
        self.created_cursor.as_ref()
    }

    /// Position of the last applied bid event.
    pub fn bid_cursor(&self) -> Option<&EventId> {
        self.bid_cursor.as_ref()
    }
}

fn move_event_filter(package_id: &str, event_name: &str) -> EventFilter {
    EventFilter::MoveEventType(format!("{}::{}::{}", package_id, AUCTION_MODULE, event_name))
}
