//! Rank Calculator
//!
//! Given a listing's bidder list and the signed-in user, works out where
//! the user stands. Pure: no I/O, no state, safe to call from anywhere.
use crate::auction::{ordinal_suffix, Amount, BidderEntry, UserIdRef};
use serde::Serialize;
use std::cmp::Ordering;

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankResult {
    /// 1-based; `None` when the user has not bid on the listing
    pub rank: Option<usize>,
    pub is_leading: bool,
    pub total_bidders: usize,
    pub highest_bid: Amount,
}

impl RankResult {
    /// Badge text, e.g. `2nd / 5`
    pub fn label(&self) -> Option<String> {
        self.rank
            .map(|rank| format!("{}{} / {}", rank, ordinal_suffix(rank), self.total_bidders))
    }
}

/// Highest amount first; equal amounts fall back to user id order so the
/// result does not depend on the order the server listed bidders in.
fn by_standing(a: &BidderEntry, b: &BidderEntry) -> Ordering {
    b.bid_amount
        .total_cmp(&a.bid_amount)
        .then_with(|| a.user_id.cmp(&b.user_id))
}

pub fn compute_rank(bidders: &[BidderEntry], user_id: UserIdRef) -> RankResult {
    let mut sorted: Vec<&BidderEntry> = bidders.iter().collect();
    sorted.sort_by(|a, b| by_standing(a, b));

    let rank = sorted
        .iter()
        .position(|entry| entry.user_id == user_id)
        .map(|i| i + 1);

    RankResult {
        rank,
        is_leading: rank == Some(1),
        total_bidders: bidders.len(),
        highest_bid: sorted.first().map(|entry| entry.bid_amount).unwrap_or(0.0),
    }
}
