use serde::{Deserialize, Serialize};

use super::domain::{AppliedTransition, Lead, LeadEvent, LeadId, StatusHistoryEntry};
use crate::error::ConfigurationError;

/// Storage abstraction over the transactional lead store.
pub trait LeadRepository: Send + Sync {
    fn get(&self, lead_id: &LeadId) -> Result<Option<Lead>, RepositoryError>;

    /// Write status, documents status, stage start and the history entry in one
    /// transaction, but only if the stored version still equals `expected_version`.
    /// Returns the updated lead with its version bumped.
    fn apply_transition(
        &self,
        lead_id: &LeadId,
        change: &AppliedTransition,
        expected_version: u64,
    ) -> Result<Lead, RepositoryError>;

    fn list(&self, limit: usize) -> Result<Vec<Lead>, RepositoryError>;
}

/// Append-only audit trail of accepted transitions.
pub trait StatusHistoryRepository: Send + Sync {
    fn append(&self, entry: StatusHistoryEntry) -> Result<(), RepositoryError>;
    fn for_lead(&self, lead_id: &LeadId) -> Result<Vec<StatusHistoryEntry>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,
    #[error("stored version {found} does not match expected {expected}")]
    Stale { expected: u64, found: u64 },
    #[error("repository unavailable: {0}")]
    Unavailable(String),
    #[error("stored lead cannot be read: {0}")]
    Corrupt(#[from] ConfigurationError),
}

/// Outbound hook to the notification dispatcher (push, e-mail, in-app).
pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: LeadEvent) -> Result<(), EventError>;
}

#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("event transport unavailable: {0}")]
    Transport(String),
}

/// Sanitized representation of a lead's position in the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadStatusView {
    pub lead_id: LeadId,
    pub status: String,
    pub status_label: String,
    pub phase: String,
    pub documents_status: String,
    pub version: u64,
}

impl LeadStatusView {
    pub fn from_lead(lead: &Lead) -> Self {
        let entry = super::registry::StatusRegistry::entry(lead.status);
        Self {
            lead_id: lead.id.clone(),
            status: lead.status.code().to_string(),
            status_label: entry.label.to_string(),
            phase: entry.phase.label().to_string(),
            documents_status: lead.documents_status.label().to_string(),
            version: lead.version,
        }
    }
}
