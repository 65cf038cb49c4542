//! Periodic reload of the active bids board from the backend
use super::{LoopService, StopSignal};
use crate::{
    active_bids::{load_active_bids, ActiveBidsFetch},
    event::Event,
    event_log,
    session::{Session, SessionError, SharedSession},
};
use anyhow::Result;
use chrono::Utc;
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};
use tokio::runtime::Handle;
use tracing::{debug, warn};

/// Idle granularity, so stop and trigger requests are noticed promptly
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Lets anyone ask for an out-of-schedule refresh
#[derive(Clone, Debug, Default)]
pub struct RefreshTrigger(Arc<AtomicBool>);

impl RefreshTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub(crate) fn take(&self) -> bool {
        self.0.swap(false, Ordering::SeqCst)
    }
}

pub struct BidRefresher {
    runtime: Handle,
    session: SharedSession,
    event_writer: event_log::SharedWriter,
    trigger: RefreshTrigger,
    stop: StopSignal,
    interval: Duration,
    next_refresh: Instant,
}

impl BidRefresher {
    pub fn new(
        runtime: Handle,
        session: SharedSession,
        event_writer: event_log::SharedWriter,
        trigger: RefreshTrigger,
        stop: StopSignal,
        interval: Duration,
    ) -> Self {
        Self {
            runtime,
            session,
            event_writer,
            trigger,
            stop,
            interval,
            // first iteration loads right away
            next_refresh: Instant::now(),
        }
    }

    /// Load the board for whoever is signed in right now
    ///
    /// Returns the session epoch the load started in along with its
    /// outcome. `None` means there is nothing to publish: either nobody is
    /// signed in, or the load was abandoned because we are shutting down
    /// or the session changed underneath it.
    async fn load(&self) -> Option<(u64, Event)> {
        let (api, credentials, epoch) = {
            let session = self.session.lock().await;
            let epoch = session.epoch().clone();
            match session.credentials() {
                Ok(credentials) => (session.api().clone(), credentials, epoch),
                Err(SessionError::NotAuthenticated) => {
                    debug!("not signed in, skipping refresh");
                    return None;
                }
                Err(e) => {
                    return Some((
                        epoch.current(),
                        Event::RefreshFailed {
                            reason: e.to_string(),
                        },
                    ))
                }
            }
        };
        let started_in = epoch.current();

        let now = Utc::now();
        let fetch = ActiveBidsFetch::new(async move {
            load_active_bids(&*api, &credentials, now).await
        });
        let cancel = fetch.cancel_handle();
        let stop = self.stop.clone();
        let watchdog = tokio::spawn(async move {
            while !stop.is_set() && epoch.current() == started_in {
                tokio::time::sleep(POLL_INTERVAL).await;
            }
            cancel.cancel();
        });

        let outcome = fetch.run().await;
        watchdog.abort();

        let event = match outcome? {
            Ok(bids) => Event::BidsLoaded { bids, at: now },
            Err(e) => {
                warn!(error = %e, "failed to load active bids");
                Event::RefreshFailed {
                    reason: e.to_string(),
                }
            }
        };
        Some((started_in, event))
    }

    /// One load, turned into the event that describes its outcome
    ///
    /// `None` when nobody is signed in, or the load was abandoned.
    pub fn refresh(&self) -> Option<Event> {
        self.runtime.block_on(async {
            let (started_in, event) = self.load().await?;
            let session = self.session.lock().await;
            is_current(&session, started_in).then_some(event)
        })
    }

    /// Load and publish
    ///
    /// The write happens with the session locked, so a logout either lands
    /// before the check (and the result is dropped) or its `SessionEnded`
    /// lands after the result on the log.
    fn publish(&self) -> Result<()> {
        self.runtime.block_on(async {
            let Some((started_in, event)) = self.load().await else {
                return Ok(());
            };
            let session = self.session.lock().await;
            if is_current(&session, started_in) {
                self.event_writer.write(&[event])?;
            }
            Ok::<_, anyhow::Error>(())
        })
    }
}

fn is_current(session: &Session, started_in: u64) -> bool {
    let current = session.epoch().current() == started_in;
    if !current {
        debug!("session changed during refresh, dropping result");
    }
    current
}

impl LoopService for BidRefresher {
    fn run_iteration(&mut self) -> Result<()> {
        let now = Instant::now();
        if !self.trigger.take() && now < self.next_refresh {
            std::thread::sleep(POLL_INTERVAL.min(self.next_refresh - now));
            return Ok(());
        }

        self.publish()?;
        self.next_refresh = Instant::now() + self.interval;
        Ok(())
    }
}
