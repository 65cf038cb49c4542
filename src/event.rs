use crate::active_bids::ActiveBid;
use chrono::{DateTime, Utc};

// Every service publishes into and reads from the same log, so this
// type knows about all of them. Keep variants coarse.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// A fresh board came back from the backend
    BidsLoaded {
        bids: Vec<ActiveBid>,
        at: DateTime<Utc>,
    },
    /// The bid list could not be fetched; previous board stays
    RefreshFailed { reason: String },
    /// Wall clock moved; countdowns need recomputing
    Tick(DateTime<Utc>),
    /// User signed out, drop everything
    SessionEnded,
    #[cfg(test)]
    Test,
}
