use crate::{
    event::Event,
    event_log::{InMemoryLog, Reader},
    service::{ClockTicker, LoopService},
};
use anyhow::Result;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};

const INTERVAL: Duration = Duration::from_millis(300);

fn run_until_len(ticker: &mut ClockTicker, log: &InMemoryLog, len: usize) -> Result<()> {
    let deadline = Instant::now() + Duration::from_secs(5);
    while log.len() < len {
        assert!(Instant::now() < deadline, "no tick within 5s");
        ticker.run_iteration()?;
    }
    Ok(())
}

#[test]
fn ticks_on_schedule_and_not_before() -> Result<()> {
    let log = Arc::new(InMemoryLog::new());
    let started = Instant::now();
    let mut ticker = ClockTicker::new(log.clone(), INTERVAL);

    ticker.run_iteration()?;
    assert!(log.is_empty());

    run_until_len(&mut ticker, &log, 1)?;
    assert!(started.elapsed() >= INTERVAL);
    let first_tick = Instant::now();

    // right after a tick the next one is a whole interval away
    ticker.run_iteration()?;
    assert_eq!(log.len(), 1);

    run_until_len(&mut ticker, &log, 2)?;
    assert!(first_tick.elapsed() >= INTERVAL - Duration::from_millis(50));

    let read = log.read(0, 10, Some(Duration::from_secs(0)))?;
    assert!(read
        .data
        .iter()
        .all(|e| matches!(e.details, Event::Tick(_))));
    Ok(())
}
