use super::LoopService;
use crate::{event::Event, event_log};
use anyhow::Result;
use chrono::Utc;
use std::time::{Duration, Instant};

/// Publishes `Event::Tick` on a fixed cadence so countdowns stay live
/// between (much rarer) network refreshes.
pub struct ClockTicker {
    event_writer: event_log::SharedWriter,
    interval: Duration,
    next_tick: Instant,
}

impl ClockTicker {
    pub fn new(event_writer: event_log::SharedWriter, interval: Duration) -> Self {
        Self {
            event_writer,
            interval,
            next_tick: Instant::now() + interval,
        }
    }
}

impl LoopService for ClockTicker {
    fn run_iteration(&mut self) -> Result<()> {
        let now = Instant::now();
        if now < self.next_tick {
            // don't hog the cpu, but keep noticing stop requests
            std::thread::sleep(Duration::from_millis(100).min(self.next_tick - now));
            return Ok(());
        }

        self.event_writer.write(&[Event::Tick(Utc::now())])?;
        self.next_tick = now + self.interval;
        Ok(())
    }
}
