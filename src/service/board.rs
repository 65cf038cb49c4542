//! Board view
//!
//! Holds the rows the presentation layer shows, and keeps them current by
//! following the event log: a new load replaces them, a clock tick only
//! recomputes countdowns.
use super::{LogFollowerService, ServiceId};
use crate::{
    active_bids::{ActiveBid, Standing},
    auction::{Amount, ProductId},
    event::Event,
};
use anyhow::Result;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

pub const BOARD_SERVICE_ID: &str = "board-view";

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Board {
    bids: Vec<ActiveBid>,
    loaded_at: Option<DateTime<Utc>>,
    last_error: Option<String>,
}

/// A bid as the presentation layer renders it
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BidRow {
    pub product_id: ProductId,
    pub product_name: String,
    pub product_image: Option<String>,
    pub bid_amount: Amount,
    pub displayed_high: Amount,
    pub status: String,
    pub rank: Option<String>,
    pub standing: Standing,
    pub minimum_next_bid: Amount,
}

impl From<&ActiveBid> for BidRow {
    fn from(bid: &ActiveBid) -> Self {
        BidRow {
            product_id: bid.product_id.clone(),
            product_name: bid.product_name.clone(),
            product_image: bid.product_image.clone(),
            bid_amount: bid.bid_amount,
            displayed_high: bid.displayed_high(),
            status: bid.status(),
            rank: bid.rank.and_then(|rank| rank.label()),
            standing: bid.standing(),
            minimum_next_bid: bid.minimum_next_bid(),
        }
    }
}

impl Board {
    pub fn apply(&mut self, event: Event) {
        match event {
            Event::BidsLoaded { bids, at } => {
                self.bids = bids;
                self.loaded_at = Some(at);
                self.last_error = None;
            }
            Event::Tick(now) => {
                for bid in &mut self.bids {
                    bid.recompute_time_left(now);
                }
            }
            Event::RefreshFailed { reason } => self.last_error = Some(reason),
            Event::SessionEnded => *self = Board::default(),
            #[cfg(test)]
            Event::Test => {}
        }
    }

    pub fn bids(&self) -> &[ActiveBid] {
        &self.bids
    }

    pub fn rows(&self) -> Vec<BidRow> {
        self.bids.iter().map(BidRow::from).collect()
    }

    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.loaded_at
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}

pub type SharedBoard = Arc<RwLock<Board>>;

pub struct BoardView {
    board: SharedBoard,
}

impl BoardView {
    pub fn new(board: SharedBoard) -> Self {
        Self { board }
    }
}

impl LogFollowerService for BoardView {
    fn service_id(&self) -> ServiceId {
        BOARD_SERVICE_ID.to_owned()
    }

    fn handle_event(&mut self, event: Event) -> Result<()> {
        match &event {
            Event::BidsLoaded { bids, .. } => info!(count = bids.len(), "board updated"),
            Event::Tick(now) => debug!(%now, "recomputing countdowns"),
            _ => debug!(?event, "event"),
        }
        self.board.write().apply(event);
        Ok(())
    }
}
