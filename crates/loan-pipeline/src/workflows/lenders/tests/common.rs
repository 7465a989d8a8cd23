use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeZone, Utc};

use crate::workflows::leads::domain::{Actor, ActorRole, LeadEvent, LeadId};
use crate::workflows::leads::repository::{EventError, EventPublisher};
use crate::workflows::leads::service::Clock;
use crate::workflows::lenders::acceptance::{
    AcceptanceDesk, AcceptanceStore, AcceptanceStoreError, RecommendationSet,
};
use crate::workflows::lenders::domain::{
    AcceptanceRecord, LenderEvaluation, LenderGroup, LenderId, ProbabilityBand,
};

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 10, 11, 30, 0).unwrap()
}

pub(super) struct FixedClock(pub(super) DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

pub(super) fn evaluation(id: &str, fit_score: u8, risk_flags: &[&str]) -> LenderEvaluation {
    LenderEvaluation {
        lender_id: LenderId::new(id),
        lender_name: format!("{id} Finance"),
        fit_score,
        probability_band: match fit_score {
            80..=100 => ProbabilityBand::High,
            60..=79 => ProbabilityBand::Medium,
            _ => ProbabilityBand::Low,
        },
        risk_flags: risk_flags.iter().map(|flag| flag.to_string()).collect(),
        group: None,
        justification: String::new(),
    }
}

pub(super) fn tagged(id: &str, fit_score: u8, group: LenderGroup) -> LenderEvaluation {
    LenderEvaluation {
        group: Some(group),
        ..evaluation(id, fit_score, &[])
    }
}

pub(super) fn recommendation_set(confidence: u8) -> RecommendationSet {
    RecommendationSet::new(
        LeadId::new("lead-42"),
        vec![
            evaluation("credila", 88, &[]),
            evaluation("avanse", 74, &["low_income"]),
            evaluation("auxilo", 55, &[]),
            evaluation("hdfc", 30, &[]),
        ],
        confidence,
    )
}

pub(super) fn counselor() -> Actor {
    Actor::new("counselor-7", ActorRole::Counselor)
}

#[derive(Default)]
pub(super) struct MemoryAcceptanceStore {
    records: Mutex<Vec<AcceptanceRecord>>,
}

impl MemoryAcceptanceStore {
    pub(super) fn records(&self) -> Vec<AcceptanceRecord> {
        self.records.lock().expect("store mutex poisoned").clone()
    }
}

impl AcceptanceStore for MemoryAcceptanceStore {
    fn record(&self, record: AcceptanceRecord) -> Result<(), AcceptanceStoreError> {
        self.records
            .lock()
            .expect("store mutex poisoned")
            .push(record);
        Ok(())
    }
}

pub(super) struct OfflineAcceptanceStore;

impl AcceptanceStore for OfflineAcceptanceStore {
    fn record(&self, _record: AcceptanceRecord) -> Result<(), AcceptanceStoreError> {
        Err(AcceptanceStoreError::Unavailable("database offline".to_string()))
    }
}

#[derive(Default)]
pub(super) struct MemoryEvents {
    events: Mutex<Vec<LeadEvent>>,
}

impl MemoryEvents {
    pub(super) fn events(&self) -> Vec<LeadEvent> {
        self.events.lock().expect("event mutex poisoned").clone()
    }
}

impl EventPublisher for MemoryEvents {
    fn publish(&self, event: LeadEvent) -> Result<(), EventError> {
        self.events
            .lock()
            .expect("event mutex poisoned")
            .push(event);
        Ok(())
    }
}

pub(super) fn desk() -> (
    AcceptanceDesk<MemoryAcceptanceStore, MemoryEvents>,
    Arc<MemoryAcceptanceStore>,
    Arc<MemoryEvents>,
) {
    let store = Arc::new(MemoryAcceptanceStore::default());
    let events = Arc::new(MemoryEvents::default());
    let desk = AcceptanceDesk::with_clock(store.clone(), events.clone(), Arc::new(FixedClock(now())));
    (desk, store, events)
}
