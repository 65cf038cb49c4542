use crate::{
    api::InMemoryMarketplace,
    auction::{BidderEntry, MyBid, Product, User},
    event::Event,
    event_log::{self, Reader, SharedWriter, Writer},
    service::{BidRefresher, Board, LoopService, RefreshTrigger, ServiceControl},
    session::{InMemoryTokenStore, Session, SharedSession},
};
use anyhow::Result;
use std::{
    sync::Arc,
    thread,
    time::{Duration, Instant},
};
use tokio::runtime::Runtime;

fn backend() -> Arc<InMemoryMarketplace> {
    let api = Arc::new(InMemoryMarketplace::new());
    api.add_user(
        "tok",
        User {
            id: "me".to_owned(),
            ..Default::default()
        },
    );
    api.set_my_bids(
        "tok",
        vec![MyBid {
            product_id: "p1".to_owned(),
            bid_amount: 500.0,
            product: Product {
                id: "p1".to_owned(),
                price: 100.0,
                bid_expire: Some("2099-01-01T00:00:00Z".to_owned()),
                ..Default::default()
            },
        }],
    );
    api.set_bidders("p1", vec![BidderEntry::new("me", 500.0)]);
    api
}

fn session(runtime: &Runtime, api: Arc<InMemoryMarketplace>, token: Option<&str>) -> SharedSession {
    let store = Arc::new(match token {
        Some(token) => InMemoryTokenStore::with_token(token),
        None => InMemoryTokenStore::new(),
    });
    let mut session = Session::new(api, store);
    runtime.block_on(session.initialize());
    session.into_shared()
}

fn refresher(
    runtime: &Runtime,
    session: SharedSession,
    writer: SharedWriter,
    svc_ctr: &ServiceControl,
    trigger: RefreshTrigger,
) -> BidRefresher {
    BidRefresher::new(
        runtime.handle().clone(),
        session,
        writer,
        trigger,
        svc_ctr.stop_signal(),
        Duration::from_secs(3600),
    )
}

#[test]
fn publishes_a_loaded_board() -> Result<()> {
    let runtime = Runtime::new()?;
    let (writer, reader) = event_log::new_in_memory_shared();
    let svc_ctr = ServiceControl::new();
    let session = session(&runtime, backend(), Some("tok"));

    let mut refresher = refresher(&runtime, session, writer, &svc_ctr, RefreshTrigger::new());
    // first iteration is due immediately
    refresher.run_iteration()?;

    let read = reader.read(0, 10, Some(Duration::from_secs(0)))?;
    assert_eq!(read.data.len(), 1);
    match &read.data[0].details {
        Event::BidsLoaded { bids, .. } => {
            assert_eq!(bids.len(), 1);
            assert_eq!(bids[0].rank.map(|r| r.is_leading), Some(true));
        }
        other => panic!("unexpected event {:?}", other),
    }

    // not due again for an hour, so nothing more is written
    refresher.run_iteration()?;
    assert!(reader.read(1, 10, Some(Duration::from_secs(0)))?.data.is_empty());
    Ok(())
}

#[test]
fn trigger_forces_an_early_refresh() -> Result<()> {
    let runtime = Runtime::new()?;
    let (writer, reader) = event_log::new_in_memory_shared();
    let svc_ctr = ServiceControl::new();
    let session = session(&runtime, backend(), Some("tok"));
    let trigger = RefreshTrigger::new();

    let mut refresher = refresher(&runtime, session, writer, &svc_ctr, trigger.clone());
    refresher.run_iteration()?;
    trigger.request();
    refresher.run_iteration()?;

    assert_eq!(reader.read(0, 10, Some(Duration::from_secs(0)))?.data.len(), 2);
    Ok(())
}

#[test]
fn signed_out_publishes_nothing() -> Result<()> {
    let runtime = Runtime::new()?;
    let (writer, _reader) = event_log::new_in_memory_shared();
    let svc_ctr = ServiceControl::new();
    let session = session(&runtime, backend(), None);

    let refresher = refresher(&runtime, session, writer, &svc_ctr, RefreshTrigger::new());
    assert_eq!(refresher.refresh(), None);
    Ok(())
}

#[test]
fn bid_list_failure_becomes_refresh_failed() -> Result<()> {
    let runtime = Runtime::new()?;
    let (writer, _reader) = event_log::new_in_memory_shared();
    let svc_ctr = ServiceControl::new();
    let api = backend();
    let session = session(&runtime, api.clone(), Some("tok"));
    api.fail_my_bids(true);

    let refresher = refresher(&runtime, session, writer, &svc_ctr, RefreshTrigger::new());
    assert!(matches!(
        refresher.refresh(),
        Some(Event::RefreshFailed { .. })
    ));
    Ok(())
}

#[test]
fn shutdown_abandons_an_in_flight_load() -> Result<()> {
    let runtime = Runtime::new()?;
    let (writer, _reader) = event_log::new_in_memory_shared();
    let svc_ctr = ServiceControl::new();
    let api = backend();
    let session = session(&runtime, api.clone(), Some("tok"));
    api.set_latency(Duration::from_secs(60));

    let refresher = refresher(&runtime, session, writer, &svc_ctr, RefreshTrigger::new());
    let started = Instant::now();
    svc_ctr.stop_all();

    assert_eq!(refresher.refresh(), None);
    assert!(started.elapsed() < Duration::from_secs(10));
    Ok(())
}

#[test]
fn logout_during_a_load_discards_its_result() -> Result<()> {
    let runtime = Runtime::new()?;
    let (writer, _reader) = event_log::new_in_memory_shared();
    let svc_ctr = ServiceControl::new();
    let api = backend();
    let session = session(&runtime, api.clone(), Some("tok"));
    api.set_latency(Duration::from_millis(300));

    let mut board = Board::default();
    board.apply(Event::BidsLoaded {
        bids: vec![],
        at: chrono::Utc::now(),
    });

    let refresher = refresher(&runtime, session.clone(), writer, &svc_ctr, RefreshTrigger::new());
    let load = thread::spawn(move || refresher.refresh());

    thread::sleep(Duration::from_millis(100));
    runtime.block_on(session.lock()).logout()?;
    board.apply(Event::SessionEnded);

    let outcome = load.join().expect("refresher thread");
    assert_eq!(outcome, None);
    if let Some(event) = outcome {
        board.apply(event);
    }
    assert!(board.bids().is_empty());
    assert_eq!(board, Board::default());
    Ok(())
}

#[test]
fn logout_cancels_the_running_fetch_and_nothing_is_published() -> Result<()> {
    let runtime = Runtime::new()?;
    let (writer, reader) = event_log::new_in_memory_shared();
    let svc_ctr = ServiceControl::new();
    let api = backend();
    let session = session(&runtime, api.clone(), Some("tok"));
    api.set_latency(Duration::from_secs(60));

    let mut refresher = refresher(
        &runtime,
        session.clone(),
        writer.clone(),
        &svc_ctr,
        RefreshTrigger::new(),
    );
    let started = Instant::now();
    let load = thread::spawn(move || refresher.run_iteration());

    thread::sleep(Duration::from_millis(100));
    runtime.block_on(async {
        let mut session = session.lock().await;
        session.logout()?;
        writer.write(&[Event::SessionEnded])
    })?;

    load.join().expect("refresher thread")?;
    assert!(started.elapsed() < Duration::from_secs(10));

    let read = reader.read(0, 10, Some(Duration::from_secs(0)))?;
    assert_eq!(
        read.data.into_iter().map(|e| e.details).collect::<Vec<_>>(),
        vec![Event::SessionEnded]
    );
    Ok(())
}
