pub mod board;
pub mod refresher;
pub mod ticker;
pub mod ui;

pub use self::{board::*, refresher::*, ticker::*, ui::*};
use crate::{
    event::Event,
    event_log::{self, WithOffset},
};
use anyhow::{bail, format_err, Result};
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};
use tracing::{debug, error};

pub type ServiceId = String;
pub type ServiceIdRef<'a> = &'a str;

/// How long a follower blocks on an empty log before re-checking stop flags
const LOG_POLL_TIMEOUT: Duration = Duration::from_secs(1);

/// A service that handles events on the log
pub trait LogFollowerService: Send + Sync {
    /// Labels the follower in logs
    fn service_id(&self) -> ServiceId;

    fn handle_event(&mut self, event: Event) -> Result<()>;
}

/// A service that is a loop that does something
pub trait LoopService: Send + Sync {
    fn run_iteration(&mut self) -> Result<()>;
}

/// Read-only view of the global stop flag
#[derive(Clone, Debug, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Service execution control instance
///
/// Every service is a loop on its own thread. A stop request, an error
/// or a panic in any of them winds the whole set down.
#[derive(Clone, Default)]
pub struct ServiceControl {
    stop_all: Arc<AtomicBool>,
}

impl ServiceControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop_all(&self) {
        self.stop_all.store(true, Ordering::SeqCst);
    }

    pub fn stop_signal(&self) -> StopSignal {
        StopSignal(self.stop_all.clone())
    }

    pub fn spawn_log_follower(
        &self,
        mut service: impl LogFollowerService + 'static,
        event_reader: event_log::SharedReader,
    ) -> JoinHandle {
        self.spawn_event_loop(
            &service.service_id(),
            event_reader,
            move |event| service.handle_event(event),
        )
    }

    pub fn spawn_loop(&self, mut service: impl LoopService + 'static) -> JoinHandle {
        self.spawn_loop_raw(move || service.run_iteration())
    }

    /// Start a new service as a loop, with a certain body
    ///
    /// This will take care of checking termination condition and
    /// handling any errors returned by `f`
    fn spawn_loop_raw<F>(&self, mut f: F) -> JoinHandle
    where
        F: FnMut() -> Result<()> + Send + Sync + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));

        JoinHandle::new(
            stop.clone(),
            thread::spawn({
                let stop_all = self.stop_all.clone();
                move || match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                    while !stop.load(Ordering::SeqCst) && !stop_all.load(Ordering::SeqCst) {
                        if let Err(e) = f() {
                            stop_all.store(true, Ordering::SeqCst);
                            return Err(e);
                        }
                    }
                    Ok(())
                })) {
                    Err(_e) => {
                        stop_all.store(true, Ordering::SeqCst);
                        bail!("service panicked");
                    }
                    Ok(res) => res,
                }
            }),
        )
    }

    fn spawn_event_loop<F>(
        &self,
        service_id: ServiceIdRef,
        event_reader: event_log::SharedReader,
        mut f: F,
    ) -> JoinHandle
    where
        F: FnMut(Event) -> Result<()> + Send + Sync + 'static,
    {
        let service_id = service_id.to_owned();

        let mut progress = match event_reader.get_start_offset() {
            // Fail from inside a thread, same as any later error would
            Err(e) => {
                return JoinHandle::new(
                    Arc::new(AtomicBool::new(false)),
                    thread::spawn(move || Err(e)),
                )
            }
            Ok(o) => o,
        };

        self.spawn_loop_raw(move || {
            let WithOffset {
                offset: new_offset,
                data: events,
            } = event_reader.read(progress, 1, Some(LOG_POLL_TIMEOUT))?;

            for event in events {
                debug!(service = %service_id, offset = event.offset, "handling event");
                f(event.details)?;
            }
            progress = new_offset;
            Ok(())
        })
    }
}

/// Simple thread join wrapper that joins the thread on drop
pub struct JoinHandle {
    stop: Arc<AtomicBool>,
    thread: Option<thread::JoinHandle<Result<()>>>,
}

impl JoinHandle {
    fn new(stop: Arc<AtomicBool>, handle: thread::JoinHandle<Result<()>>) -> Self {
        JoinHandle {
            stop,
            thread: Some(handle),
        }
    }

    fn join_mut(&mut self) -> Result<()> {
        if let Some(h) = self.thread.take() {
            h.join().map_err(|e| format_err!("join failed: {:?}", e))?
        } else {
            Ok(())
        }
    }

    pub fn join(mut self) -> Result<()> {
        self.join_mut()
    }

    /// Ask just this service to stop, leaving the others running
    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }
}

impl Drop for JoinHandle {
    fn drop(&mut self) {
        self.stop();
        if let Err(e) = self.join_mut() {
            error!(error = %e, "service terminated with error");
        }
    }
}
