//! Human-in-the-loop acceptance of lender recommendations.
//!
//! The engine never picks a lender on anyone's behalf. [`AcceptanceDesk`] only
//! writes an [`AcceptanceRecord`] from an explicit human choice, and its two
//! `accept_*` methods are the only callers of [`AcceptanceStore::record`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::domain::{AcceptanceMode, AcceptanceRecord, LenderEvaluation, LenderId};
use super::grouping::{LenderGroups, LenderRecommendationGrouper};
use crate::workflows::leads::domain::{Actor, LeadEvent, LeadId};
use crate::workflows::leads::repository::EventPublisher;
use crate::workflows::leads::service::{Clock, SystemClock};

/// Confidence below this surfaces a review flag. It never blocks acceptance.
pub const REVIEW_CONFIDENCE_THRESHOLD: u8 = 70;

/// Grouped recommendations for one lead, as shown to the counselor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationSet {
    pub lead_id: LeadId,
    pub groups: LenderGroups,
    pub confidence: u8,
}

impl RecommendationSet {
    pub fn new(lead_id: LeadId, evaluations: Vec<LenderEvaluation>, confidence: u8) -> Self {
        Self {
            lead_id,
            groups: LenderRecommendationGrouper::classify(evaluations),
            confidence: confidence.min(100),
        }
    }

    pub fn needs_human_review(&self) -> bool {
        self.confidence < REVIEW_CONFIDENCE_THRESHOLD
    }

    pub fn top_pick(&self) -> Option<&LenderEvaluation> {
        self.groups.top_pick()
    }
}

/// Persistence port for accepted lenders.
pub trait AcceptanceStore: Send + Sync {
    fn record(&self, record: AcceptanceRecord) -> Result<(), AcceptanceStoreError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AcceptanceStoreError {
    #[error("acceptance store unavailable: {0}")]
    Unavailable(String),
}

/// Reasons an explicit acceptance was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    #[error("recommendation set has no top pick")]
    NoTopPick,
    #[error("lender {0} is not the top pick; accept it as an alternative")]
    NotTopPick(LenderId),
    #[error("lender {0} is the top pick; accept it directly")]
    AlternativeIsTopPick(LenderId),
    #[error("lender {0} is not part of this recommendation set")]
    UnknownLender(LenderId),
    #[error(transparent)]
    Store(#[from] AcceptanceStoreError),
}

impl SelectionError {
    pub fn code(&self) -> &'static str {
        match self {
            SelectionError::NoTopPick => "no_top_pick",
            SelectionError::NotTopPick(_) => "not_top_pick",
            SelectionError::AlternativeIsTopPick(_) => "alternative_is_top_pick",
            SelectionError::UnknownLender(_) => "unknown_lender",
            SelectionError::Store(_) => "acceptance_store_unavailable",
        }
    }
}

pub struct AcceptanceDesk<S, E> {
    store: Arc<S>,
    events: Arc<E>,
    clock: Arc<dyn Clock>,
}

impl<S, E> AcceptanceDesk<S, E>
where
    S: AcceptanceStore + 'static,
    E: EventPublisher + 'static,
{
    pub fn new(store: Arc<S>, events: Arc<E>) -> Self {
        Self::with_clock(store, events, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<S>, events: Arc<E>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            events,
            clock,
        }
    }

    /// Accept the system's top pick. The caller names the lender it saw so a
    /// stale screen cannot accept something else.
    pub fn accept_top_pick(
        &self,
        set: &RecommendationSet,
        lender_id: &LenderId,
        actor: &Actor,
    ) -> Result<AcceptanceRecord, SelectionError> {
        let top = set.top_pick().ok_or(SelectionError::NoTopPick)?;
        if &top.lender_id != lender_id {
            return Err(SelectionError::NotTopPick(lender_id.clone()));
        }
        self.record(set, lender_id, AcceptanceMode::Ai, actor)
    }

    /// Accept a lender other than the top pick, overriding the recommendation.
    pub fn accept_alternative(
        &self,
        set: &RecommendationSet,
        lender_id: &LenderId,
        actor: &Actor,
    ) -> Result<AcceptanceRecord, SelectionError> {
        if set.groups.find(lender_id).is_none() {
            return Err(SelectionError::UnknownLender(lender_id.clone()));
        }
        if set.top_pick().map(|top| &top.lender_id) == Some(lender_id) {
            return Err(SelectionError::AlternativeIsTopPick(lender_id.clone()));
        }
        self.record(set, lender_id, AcceptanceMode::AiOverride, actor)
    }

    /// Leave the lead unassigned. Nothing is written.
    pub fn defer(&self, set: &RecommendationSet, actor: &Actor) {
        info!(
            lead_id = %set.lead_id,
            deferred_by = %actor.id,
            needs_human_review = set.needs_human_review(),
            "lender selection deferred"
        );
    }

    fn record(
        &self,
        set: &RecommendationSet,
        lender_id: &LenderId,
        mode: AcceptanceMode,
        actor: &Actor,
    ) -> Result<AcceptanceRecord, SelectionError> {
        let now = self.clock.now();
        let record = AcceptanceRecord {
            lead_id: set.lead_id.clone(),
            lender_id: lender_id.clone(),
            mode,
            accepted_by: actor.id.clone(),
            accepted_at: now,
            needs_human_review: set.needs_human_review(),
        };

        self.store.record(record.clone())?;
        info!(
            lead_id = %record.lead_id,
            lender_id = %record.lender_id,
            ?mode,
            needs_human_review = record.needs_human_review,
            "lender accepted"
        );

        let event = LeadEvent::LenderAccepted {
            lead_id: record.lead_id.clone(),
            lender_id: record.lender_id.clone(),
            mode,
            accepted_by: record.accepted_by.clone(),
            at: now,
        };
        if let Err(error) = self.events.publish(event) {
            warn!(lead_id = %record.lead_id, %error, "acceptance event not dispatched");
        }

        Ok(record)
    }
}
