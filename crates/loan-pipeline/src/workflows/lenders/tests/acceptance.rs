use std::sync::Arc;

use super::common::*;
use crate::workflows::leads::domain::{LeadEvent, LeadId};
use crate::workflows::lenders::acceptance::{AcceptanceDesk, RecommendationSet, SelectionError};
use crate::workflows::lenders::domain::{AcceptanceMode, LenderId};

#[test]
fn accepting_top_pick_records_ai_mode() {
    let (desk, store, events) = desk();
    let set = recommendation_set(85);

    let record = desk
        .accept_top_pick(&set, &LenderId::new("credila"), &counselor())
        .expect("top pick accepted");

    assert_eq!(record.mode, AcceptanceMode::Ai);
    assert_eq!(record.accepted_at, now());
    assert!(!record.needs_human_review);
    assert_eq!(store.records(), vec![record]);
    assert!(matches!(
        events.events().as_slice(),
        [LeadEvent::LenderAccepted {
            mode: AcceptanceMode::Ai,
            ..
        }]
    ));
}

#[test]
fn accepting_an_alternative_records_override_mode() {
    let (desk, store, _) = desk();
    let set = recommendation_set(85);

    let record = desk
        .accept_alternative(&set, &LenderId::new("auxilo"), &counselor())
        .expect("alternative accepted");

    assert_eq!(record.mode, AcceptanceMode::AiOverride);
    assert_eq!(store.records().len(), 1);
}

#[test]
fn low_confidence_flags_review_but_still_accepts() {
    let (desk, store, _) = desk();
    let set = recommendation_set(60);
    assert!(set.needs_human_review());

    let record = desk
        .accept_top_pick(&set, &LenderId::new("credila"), &counselor())
        .expect("review flag is advisory");

    assert!(record.needs_human_review);
    assert_eq!(store.records().len(), 1);
}

#[test]
fn defer_writes_nothing() {
    let (desk, store, events) = desk();
    let set = recommendation_set(55);

    desk.defer(&set, &counselor());

    assert!(store.records().is_empty());
    assert!(events.events().is_empty());
}

#[test]
fn grouping_and_review_flag_never_write_records() {
    let (_, store, _) = desk();
    let set = recommendation_set(40);
    let _ = set.top_pick();
    let _ = set.needs_human_review();
    assert!(store.records().is_empty());
}

#[test]
fn accept_top_pick_rejects_a_different_lender() {
    let (desk, store, _) = desk();
    let set = recommendation_set(85);

    let error = desk
        .accept_top_pick(&set, &LenderId::new("avanse"), &counselor())
        .expect_err("avanse is not the top pick");
    assert_eq!(error, SelectionError::NotTopPick(LenderId::new("avanse")));
    assert_eq!(error.code(), "not_top_pick");
    assert!(store.records().is_empty());
}

#[test]
fn accept_alternative_rejects_top_pick_and_unknown_lenders() {
    let (desk, store, _) = desk();
    let set = recommendation_set(85);

    assert_eq!(
        desk.accept_alternative(&set, &LenderId::new("credila"), &counselor()),
        Err(SelectionError::AlternativeIsTopPick(LenderId::new("credila")))
    );
    assert_eq!(
        desk.accept_alternative(&set, &LenderId::new("sbi"), &counselor()),
        Err(SelectionError::UnknownLender(LenderId::new("sbi")))
    );
    assert!(store.records().is_empty());
}

#[test]
fn empty_set_has_no_top_pick_to_accept() {
    let (desk, _, _) = desk();
    let set = RecommendationSet::new(LeadId::new("lead-9"), Vec::new(), 90);
    assert_eq!(
        desk.accept_top_pick(&set, &LenderId::new("credila"), &counselor()),
        Err(SelectionError::NoTopPick)
    );
}

#[test]
fn store_failure_surfaces_and_emits_no_event() {
    let events = Arc::new(MemoryEvents::default());
    let desk = AcceptanceDesk::with_clock(
        Arc::new(OfflineAcceptanceStore),
        events.clone(),
        Arc::new(FixedClock(now())),
    );
    let set = recommendation_set(85);

    let error = desk
        .accept_top_pick(&set, &LenderId::new("credila"), &counselor())
        .expect_err("store offline");
    assert_eq!(error.code(), "acceptance_store_unavailable");
    assert!(events.events().is_empty());
}
