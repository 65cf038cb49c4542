use crate::{
    auction::{ordinal_suffix, BidderEntry},
    ranking::{compute_rank, RankResult},
};

fn sample() -> Vec<BidderEntry> {
    vec![
        BidderEntry::new("A", 100.0),
        BidderEntry::new("B", 200.0),
        BidderEntry::new("C", 150.0),
    ]
}

#[test]
fn empty_list_is_the_zero_case() {
    assert_eq!(
        compute_rank(&[], "anyone"),
        RankResult {
            rank: None,
            is_leading: false,
            total_bidders: 0,
            highest_bid: 0.0,
        }
    );
}

#[test]
fn ranks_by_amount_descending() {
    let bidders = sample();

    assert_eq!(compute_rank(&bidders, "B").rank, Some(1));
    assert_eq!(compute_rank(&bidders, "C").rank, Some(2));
    assert_eq!(compute_rank(&bidders, "A").rank, Some(3));

    let b = compute_rank(&bidders, "B");
    assert!(b.is_leading);
    assert_eq!(b.highest_bid, 200.0);
    assert_eq!(b.total_bidders, 3);

    assert!(!compute_rank(&bidders, "C").is_leading);
}

#[test]
fn absent_user_has_no_rank_but_sees_totals() {
    let res = compute_rank(&sample(), "Z");
    assert_eq!(res.rank, None);
    assert!(!res.is_leading);
    assert_eq!(res.total_bidders, 3);
    assert_eq!(res.highest_bid, 200.0);
}

#[test]
fn rank_is_always_within_bounds() {
    let bidders: Vec<_> = (0..25)
        .map(|i| BidderEntry::new(format!("u{}", i), f64::from((i * 37) % 11)))
        .collect();

    for entry in &bidders {
        let rank = compute_rank(&bidders, &entry.user_id)
            .rank
            .expect("present user is ranked");
        assert!((1..=bidders.len()).contains(&rank));
    }
}

#[test]
fn ties_break_on_user_id_regardless_of_input_order() {
    let forward = vec![
        BidderEntry::new("bob", 500.0),
        BidderEntry::new("alice", 500.0),
        BidderEntry::new("carol", 100.0),
    ];
    let mut backward = forward.clone();
    backward.reverse();

    for bidders in [&forward, &backward] {
        assert_eq!(compute_rank(bidders, "alice").rank, Some(1));
        assert_eq!(compute_rank(bidders, "bob").rank, Some(2));
        assert_eq!(compute_rank(bidders, "carol").rank, Some(3));
    }
}

#[test]
fn negative_amounts_are_ranked_as_is() {
    let bidders = vec![BidderEntry::new("x", -5.0), BidderEntry::new("y", 0.0)];
    let res = compute_rank(&bidders, "x");
    assert_eq!(res.rank, Some(2));
    assert_eq!(res.highest_bid, 0.0);
}

#[test]
fn input_is_left_untouched_and_result_repeats() {
    let bidders = sample();
    let before = bidders.clone();

    assert_eq!(compute_rank(&bidders, "C"), compute_rank(&bidders, "C"));
    assert_eq!(bidders, before);
}

#[test]
fn labels_use_english_ordinals() {
    let label = |rank: usize, total_bidders: usize| {
        RankResult {
            rank: Some(rank),
            is_leading: rank == 1,
            total_bidders,
            highest_bid: 0.0,
        }
        .label()
    };

    assert_eq!(label(1, 3).as_deref(), Some("1st / 3"));
    assert_eq!(label(2, 5).as_deref(), Some("2nd / 5"));
    assert_eq!(label(3, 5).as_deref(), Some("3rd / 5"));
    assert_eq!(label(4, 5).as_deref(), Some("4th / 5"));
    assert_eq!(compute_rank(&[], "a").label(), None);

    for (n, suffix) in [
        (11, "th"),
        (12, "th"),
        (13, "th"),
        (21, "st"),
        (22, "nd"),
        (23, "rd"),
        (101, "st"),
        (111, "th"),
        (112, "th"),
    ] {
        assert_eq!(ordinal_suffix(n), suffix, "suffix for {}", n);
    }
}
