//! Active bids
//!
//! Loads the signed-in user's bids and decorates each one with where the
//! user stands on that listing and how long it has left.
use crate::{
    api::{parse_expiry, ApiError, MarketplaceApi},
    auction::{next_valid_bid, Amount, MyBid, ProductId},
    countdown::{compute_remaining, CountdownResult},
    ranking::{compute_rank, RankResult},
    session::Credentials,
};
use chrono::{DateTime, Utc};
use futures::future::{abortable, join_all, AbortHandle, Aborted};
use serde::Serialize;
use std::future::Future;
use tracing::{debug, warn};

/// One row of the active bids board
#[derive(Clone, Debug, PartialEq)]
pub struct ActiveBid {
    pub bid_id: ProductId,
    pub product_id: ProductId,
    pub product_name: String,
    pub product_category: Option<String>,
    pub product_image: Option<String>,
    pub bid_amount: Amount,
    pub starting_price: Amount,
    /// `None` when the listing had no expiry or it did not parse
    pub expires_at: Option<DateTime<Utc>>,
    pub time_left: CountdownResult,
    /// `None` until (or unless) the listing's bidder list was fetched
    pub rank: Option<RankResult>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub enum Standing {
    Leading,
    Outbid,
    Unknown,
}

impl ActiveBid {
    fn from_my_bid(bid: MyBid, now: DateTime<Utc>) -> Self {
        let expires_at = bid
            .product
            .bid_expire
            .as_deref()
            .and_then(|raw| match parse_expiry(raw) {
                Ok(t) => Some(t),
                Err(e) => {
                    warn!(product = %bid.product_id, raw, error = %e, "unparseable expiry");
                    None
                }
            });

        Self {
            bid_id: bid.product_id.clone(),
            product_image: bid.product.cover_image().map(str::to_owned),
            product_id: bid.product_id,
            product_name: bid.product.name,
            product_category: bid.product.category,
            bid_amount: bid.bid_amount,
            starting_price: bid.product.price,
            expires_at,
            time_left: expires_at
                .map(|expiry| compute_remaining(expiry, now))
                .unwrap_or(CountdownResult::Expired),
            rank: None,
        }
    }

    /// Countdowns go stale on their own; call this on every tick
    pub fn recompute_time_left(&mut self, now: DateTime<Utc>) {
        if let Some(expiry) = self.expires_at {
            self.time_left = compute_remaining(expiry, now);
        }
    }

    /// Highest bid if anyone has bid, the starting price otherwise
    pub fn displayed_high(&self) -> Amount {
        match self.rank {
            Some(RankResult { highest_bid, .. }) if highest_bid != 0.0 => highest_bid,
            _ => self.starting_price,
        }
    }

    pub fn minimum_next_bid(&self) -> Amount {
        next_valid_bid(self.displayed_high())
    }

    pub fn status(&self) -> String {
        if self.time_left.is_expired() {
            "Ended".to_owned()
        } else {
            format!("Ends in: {}", self.time_left)
        }
    }

    pub fn standing(&self) -> Standing {
        match self.rank {
            Some(RankResult { rank: Some(_), is_leading: true, .. }) => Standing::Leading,
            Some(RankResult { rank: Some(_), .. }) => Standing::Outbid,
            _ => Standing::Unknown,
        }
    }
}

/// Fetch the user's bids and rank each of them
///
/// Only a failure of the bid list itself is an error. Bidder lists are
/// fetched concurrently, and a listing whose fetch fails is returned with
/// `rank: None` next to the others.
pub async fn load_active_bids<A>(
    api: &A,
    credentials: &Credentials,
    now: DateTime<Utc>,
) -> Result<Vec<ActiveBid>, ApiError>
where
    A: MarketplaceApi + ?Sized,
{
    let my_bids = api.my_bids(&credentials.token).await?;
    let mut bids: Vec<ActiveBid> = my_bids
        .into_iter()
        .map(|bid| ActiveBid::from_my_bid(bid, now))
        .collect();
    debug!(count = bids.len(), "fetched bids");

    let ranks = join_all(bids.iter().map(|bid| async move {
        match api
            .product_bidders(&credentials.token, &bid.product_id)
            .await
        {
            Ok(bidders) => Some(compute_rank(&bidders, &credentials.user_id)),
            Err(e) => {
                warn!(product = %bid.product_id, error = %e, "failed to fetch bidders");
                None
            }
        }
    }))
    .await;

    for (bid, rank) in bids.iter_mut().zip(ranks) {
        bid.rank = rank;
    }
    Ok(bids)
}

/// An in-flight load that can be abandoned
///
/// Dropping the fetch or calling [`ActiveBidsFetch::cancel`] stops the
/// load at its next await point; [`ActiveBidsFetch::run`] then yields
/// `None` and nothing downstream sees partial results.
pub struct ActiveBidsFetch<F> {
    fut: futures::future::Abortable<F>,
    handle: AbortHandle,
}

#[derive(Clone, Debug)]
pub struct CancelHandle(AbortHandle);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.abort();
    }
}

impl<F> ActiveBidsFetch<F>
where
    F: Future<Output = Result<Vec<ActiveBid>, ApiError>>,
{
    pub fn new(fut: F) -> Self {
        let (fut, handle) = abortable(fut);
        Self { fut, handle }
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle(self.handle.clone())
    }

    pub fn cancel(&self) {
        self.handle.abort();
    }

    pub async fn run(self) -> Option<Result<Vec<ActiveBid>, ApiError>> {
        match self.fut.await {
            Ok(res) => Some(res),
            Err(Aborted) => {
                debug!("active bids fetch cancelled");
                None
            }
        }
    }
}
