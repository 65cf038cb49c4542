use crate::{
    active_bids::{ActiveBid, Standing},
    countdown::{compute_remaining, CountdownResult},
    event::Event,
    event_log::{self, Writer},
    ranking::RankResult,
    service::{
        Board, BoardView, LogFollowerService, ServiceControl, SharedBoard, BOARD_SERVICE_ID,
    },
};
use anyhow::Result;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::{sync::Arc, thread, time::Duration as StdDuration};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

fn bid(id: &str, expires_in: Duration, rank: Option<RankResult>) -> ActiveBid {
    let expires_at = now() + expires_in;
    ActiveBid {
        bid_id: id.to_owned(),
        product_id: id.to_owned(),
        product_name: format!("product {}", id),
        product_category: None,
        product_image: None,
        bid_amount: 20_000.0,
        starting_price: 15_000.0,
        expires_at: Some(expires_at),
        time_left: compute_remaining(expires_at, now()),
        rank,
    }
}

fn second_of_four() -> RankResult {
    RankResult {
        rank: Some(2),
        is_leading: false,
        total_bidders: 4,
        highest_bid: 30_000.0,
    }
}

#[test]
fn load_replaces_the_board() {
    let mut board = Board::default();
    board.apply(Event::BidsLoaded {
        bids: vec![bid("a", Duration::hours(1), None)],
        at: now(),
    });
    board.apply(Event::BidsLoaded {
        bids: vec![
            bid("b", Duration::hours(1), None),
            bid("c", Duration::hours(2), None),
        ],
        at: now(),
    });

    assert_eq!(
        board
            .bids()
            .iter()
            .map(|b| b.product_id.as_str())
            .collect::<Vec<_>>(),
        vec!["b", "c"]
    );
    assert_eq!(board.loaded_at(), Some(now()));
}

#[test]
fn tick_only_touches_countdowns() {
    let mut board = Board::default();
    board.apply(Event::BidsLoaded {
        bids: vec![bid("a", Duration::minutes(90), Some(second_of_four()))],
        at: now(),
    });

    board.apply(Event::Tick(now() + Duration::minutes(60)));
    let a = &board.bids()[0];
    assert_eq!(
        a.time_left,
        CountdownResult::Remaining {
            days: 0,
            hours: 0,
            minutes: 30
        }
    );
    assert_eq!(a.rank, Some(second_of_four()));

    board.apply(Event::Tick(now() + Duration::minutes(91)));
    assert!(board.bids()[0].time_left.is_expired());
}

#[test]
fn failure_keeps_rows_and_records_reason() {
    let mut board = Board::default();
    board.apply(Event::BidsLoaded {
        bids: vec![bid("a", Duration::hours(1), None)],
        at: now(),
    });
    board.apply(Event::RefreshFailed {
        reason: "offline".to_owned(),
    });

    assert_eq!(board.bids().len(), 1);
    assert_eq!(board.last_error(), Some("offline"));

    board.apply(Event::BidsLoaded {
        bids: vec![],
        at: now(),
    });
    assert_eq!(board.last_error(), None);
}

#[test]
fn session_end_clears_everything() {
    let mut board = Board::default();
    board.apply(Event::BidsLoaded {
        bids: vec![bid("a", Duration::hours(1), None)],
        at: now(),
    });
    board.apply(Event::SessionEnded);
    assert_eq!(board, Board::default());
}

#[test]
fn rows_render_for_presentation() {
    let mut board = Board::default();
    board.apply(Event::BidsLoaded {
        bids: vec![
            bid("a", Duration::days(3) + Duration::hours(2), Some(second_of_four())),
            bid("b", Duration::hours(1), None),
        ],
        at: now(),
    });

    let rows = board.rows();
    assert_eq!(rows[0].status, "Ends in: 3d 2h");
    assert_eq!(rows[0].rank.as_deref(), Some("2nd / 4"));
    assert_eq!(rows[0].standing, Standing::Outbid);
    assert_eq!(rows[0].displayed_high, 30_000.0);
    assert_eq!(rows[0].minimum_next_bid, 40_000.0);

    assert_eq!(rows[1].rank, None);
    assert_eq!(rows[1].displayed_high, 15_000.0);
    assert_eq!(rows[1].standing, Standing::Unknown);
}

#[test]
fn board_view_follows_the_log() -> Result<()> {
    let (event_writer, event_reader) = event_log::new_in_memory_shared();
    let board: SharedBoard = Arc::default();
    let svc_ctr = ServiceControl::new();

    let handle = svc_ctr.spawn_log_follower(BoardView::new(board.clone()), event_reader);

    event_writer.write(&[Event::BidsLoaded {
        bids: vec![bid("a", Duration::hours(1), None)],
        at: now(),
    }])?;

    let deadline = std::time::Instant::now() + StdDuration::from_secs(5);
    while board.read().bids().is_empty() && std::time::Instant::now() < deadline {
        thread::sleep(StdDuration::from_millis(10));
    }
    assert_eq!(board.read().bids().len(), 1);

    svc_ctr.stop_all();
    handle.join()?;
    Ok(())
}

#[test]
fn board_view_handles_events_directly() -> Result<()> {
    let board: SharedBoard = Arc::default();
    let mut view = BoardView::new(board.clone());

    view.handle_event(Event::BidsLoaded {
        bids: vec![bid("a", Duration::hours(1), None)],
        at: now(),
    })?;
    view.handle_event(Event::SessionEnded)?;

    assert!(board.read().bids().is_empty());
    assert_eq!(view.service_id(), BOARD_SERVICE_ID);
    Ok(())
}
