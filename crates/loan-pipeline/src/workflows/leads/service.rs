use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::completion::{CompletionEvaluator, CompletionResult};
use super::domain::{Actor, Lead, LeadEvent, LeadId, StatusHistoryEntry, StatusTransitionRequest};
use super::report::PipelineReport;
use super::repository::{
    EventPublisher, LeadRepository, LeadStatusView, RepositoryError, StatusHistoryRepository,
};
use super::transition::{StatusTransitionValidator, TatStatus};
use crate::error::EngineError;

/// Time source, injected so TAT and stage resets are reproducible.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Result of an accepted transition, as returned to UI callers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusTransitionResult {
    pub lead: LeadStatusView,
    pub history: StatusHistoryEntry,
    pub tat: TatStatus,
}

/// Service composing the lead store, history, validator and event dispatch.
pub struct LeadLifecycleService<R, H, E> {
    leads: Arc<R>,
    history: Arc<H>,
    events: Arc<E>,
    clock: Arc<dyn Clock>,
    validator: StatusTransitionValidator,
}

impl<R, H, E> LeadLifecycleService<R, H, E>
where
    R: LeadRepository + 'static,
    H: StatusHistoryRepository + 'static,
    E: EventPublisher + 'static,
{
    pub fn new(leads: Arc<R>, history: Arc<H>, events: Arc<E>) -> Self {
        Self::with_clock(leads, history, events, Arc::new(SystemClock))
    }

    pub fn with_clock(leads: Arc<R>, history: Arc<H>, events: Arc<E>, clock: Arc<dyn Clock>) -> Self {
        Self {
            leads,
            history,
            events,
            clock,
            validator: StatusTransitionValidator,
        }
    }

    /// Validate and apply a transition against the freshest stored state.
    ///
    /// The repository rejects the write when another actor got there first; the
    /// caller receives [`EngineError::StaleState`] and must re-validate.
    pub fn transition(
        &self,
        request: StatusTransitionRequest,
        actor: &Actor,
    ) -> Result<StatusTransitionResult, EngineError> {
        let lead = self.fetch(&request.lead_id)?;
        let now = self.clock.now();

        let change = self
            .validator
            .validate(&request, actor, &lead.stage(), now)
            .map_err(|error| {
                debug!(lead_id = %lead.id, code = error.code(), "transition rejected");
                EngineError::from(error)
            })?;

        let updated = self
            .leads
            .apply_transition(&lead.id, &change, lead.version)
            .map_err(|error| match error {
                RepositoryError::Stale { expected, found } => {
                    warn!(lead_id = %lead.id, expected, found, "concurrent transition lost the race");
                    EngineError::StaleState {
                        lead_id: lead.id.clone(),
                    }
                }
                other => repository_error(&lead.id, other),
            })?;

        info!(
            lead_id = %updated.id,
            from = change.history.old_status.code(),
            to = change.history.new_status.code(),
            changed_by = %actor.id,
            "lead transition applied"
        );

        let event = LeadEvent::StatusChanged {
            lead_id: updated.id.clone(),
            from: change.history.old_status,
            to: change.history.new_status,
            documents_status: updated.documents_status,
            changed_by: actor.id.clone(),
            at: now,
        };
        if let Err(error) = self.events.publish(event) {
            warn!(lead_id = %updated.id, %error, "transition event not dispatched");
        }

        Ok(StatusTransitionResult {
            lead: LeadStatusView::from_lead(&updated),
            tat: self.validator.tat(&updated.stage(), now),
            history: change.history,
        })
    }

    pub fn completion(&self, lead_id: &LeadId) -> Result<CompletionResult, EngineError> {
        let lead = self.fetch(lead_id)?;
        Ok(CompletionEvaluator::evaluate(&lead))
    }

    pub fn tat(&self, lead_id: &LeadId) -> Result<TatStatus, EngineError> {
        let lead = self.fetch(lead_id)?;
        Ok(self.validator.tat(&lead.stage(), self.clock.now()))
    }

    pub fn history(&self, lead_id: &LeadId) -> Result<Vec<StatusHistoryEntry>, EngineError> {
        self.history
            .for_lead(lead_id)
            .map_err(|error| repository_error(lead_id, error))
    }

    pub fn report(&self, limit: usize) -> Result<PipelineReport, EngineError> {
        let leads = self
            .leads
            .list(limit)
            .map_err(|error| match error {
                RepositoryError::Corrupt(drift) => EngineError::Configuration(drift),
                other => EngineError::Repository(other.to_string()),
            })?;
        Ok(PipelineReport::build(&leads, self.clock.now()))
    }

    pub fn get(&self, lead_id: &LeadId) -> Result<Lead, EngineError> {
        self.fetch(lead_id)
    }

    fn fetch(&self, lead_id: &LeadId) -> Result<Lead, EngineError> {
        self.leads
            .get(lead_id)
            .map_err(|error| repository_error(lead_id, error))?
            .ok_or_else(|| EngineError::NotFound(lead_id.clone()))
    }
}

fn repository_error(lead_id: &LeadId, error: RepositoryError) -> EngineError {
    match error {
        RepositoryError::NotFound => EngineError::NotFound(lead_id.clone()),
        RepositoryError::Stale { .. } => EngineError::StaleState {
            lead_id: lead_id.clone(),
        },
        RepositoryError::Unavailable(reason) => EngineError::Repository(reason),
        RepositoryError::Corrupt(drift) => EngineError::Configuration(drift),
    }
}
