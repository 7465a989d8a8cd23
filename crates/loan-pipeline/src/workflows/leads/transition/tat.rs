use super::super::domain::LeadStatus;
use super::super::registry::StatusRegistry;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Fraction of the expected TAT after which a lead is flagged as at risk.
pub const WARNING_FRACTION: f64 = 0.75;

/// Time spent in the current status versus the registry's expectation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TatStatus {
    pub status: LeadStatus,
    pub hours_in_stage: f64,
    pub expected_hours: u32,
    pub is_warning: bool,
    pub is_breached: bool,
}

impl TatStatus {
    /// Hours left before breach; negative once breached, `None` when untracked.
    pub fn hours_remaining(&self) -> Option<f64> {
        (self.expected_hours > 0).then(|| self.expected_hours as f64 - self.hours_in_stage)
    }
}

pub fn compute(status: LeadStatus, stage_started_at: DateTime<Utc>, now: DateTime<Utc>) -> TatStatus {
    let hours_in_stage = hours_between(stage_started_at, now);
    let expected_hours = StatusRegistry::entry(status).expected_tat_hours;
    let expected = expected_hours as f64;

    TatStatus {
        status,
        hours_in_stage,
        expected_hours,
        is_warning: expected_hours > 0 && hours_in_stage > WARNING_FRACTION * expected,
        is_breached: expected_hours > 0 && hours_in_stage > expected,
    }
}

/// Clock skew can put `start` after `end`; that reads as zero hours.
fn hours_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    let seconds = (end - start).num_seconds().max(0);
    seconds as f64 / 3600.0
}
