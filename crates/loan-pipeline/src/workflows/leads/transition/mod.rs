mod rules;
pub mod tat;

pub use tat::TatStatus;

use super::domain::{
    Actor, ActorRole, AppliedTransition, LeadStage, LeadStatus, StatusHistoryEntry,
    StatusTransitionRequest,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Status specific data that must accompany certain transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CompanionField {
    LanNumber,
    PdCallScheduledAt,
    PropertyVerificationOutcome,
    SanctionAmount,
    SanctionDate,
    ProcessingFeeAmount,
    ProcessingFeeReference,
}

impl CompanionField {
    /// Field name as it appears in `additionalData`.
    pub const fn key(self) -> &'static str {
        match self {
            Self::LanNumber => "lanNumber",
            Self::PdCallScheduledAt => "pdCallScheduledAt",
            Self::PropertyVerificationOutcome => "propertyVerificationOutcome",
            Self::SanctionAmount => "sanctionAmount",
            Self::SanctionDate => "sanctionDate",
            Self::ProcessingFeeAmount => "processingFeeAmount",
            Self::ProcessingFeeReference => "processingFeeReference",
        }
    }
}

impl std::fmt::Display for CompanionField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// User-correctable reasons a transition request was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("neither status nor documents status differs from the current values")]
    NoChangeRequested,
    #[error("notes must be between {min} and {max} characters (found {len})")]
    NotesOutOfBounds { len: usize, min: usize, max: usize },
    #[error("{0} is required for this status")]
    MissingConditionalField(CompanionField),
    #[error("{} may not move a lead from {} to {}", .role.label(), .from.code(), .to.code())]
    IllegalTransitionForRole {
        role: ActorRole,
        from: LeadStatus,
        to: LeadStatus,
    },
}

impl ValidationError {
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::NoChangeRequested => "no_change_requested",
            ValidationError::NotesOutOfBounds { .. } => "notes_out_of_bounds",
            ValidationError::MissingConditionalField(_) => "missing_conditional_field",
            ValidationError::IllegalTransitionForRole { .. } => "illegal_transition_for_role",
        }
    }

    pub fn field(&self) -> Option<&'static str> {
        match self {
            ValidationError::NotesOutOfBounds { .. } => Some("notes"),
            ValidationError::MissingConditionalField(field) => Some(field.key()),
            ValidationError::IllegalTransitionForRole { .. } => Some("status"),
            ValidationError::NoChangeRequested => None,
        }
    }
}

/// Decides whether a requested change is legal and packages the applied change.
///
/// Validation is all-or-nothing: the returned [`AppliedTransition`] carries the new
/// status, documents status, stage start and history entry as one unit, and an error
/// means none of it may be written.
#[derive(Debug, Default, Clone, Copy)]
pub struct StatusTransitionValidator;

impl StatusTransitionValidator {
    pub fn validate(
        &self,
        request: &StatusTransitionRequest,
        actor: &Actor,
        current: &LeadStage,
        now: DateTime<Utc>,
    ) -> Result<AppliedTransition, ValidationError> {
        let target_status = request.status.filter(|status| *status != current.status);
        let target_documents = request
            .documents_status
            .filter(|documents| *documents != current.documents_status);

        if target_status.is_none() && target_documents.is_none() {
            return Err(ValidationError::NoChangeRequested);
        }

        if actor.is_admin() {
            rules::check_admin_notes(&request.notes)?;
        } else if let Some(to) = target_status {
            if !rules::is_reachable(current.status, to) {
                return Err(ValidationError::IllegalTransitionForRole {
                    role: actor.role,
                    from: current.status,
                    to,
                });
            }
        }

        if let Some(to) = target_status {
            rules::check_companion_fields(to, &request.additional_data)?;
        }

        let status = target_status.unwrap_or(current.status);
        let documents_status = target_documents.unwrap_or(current.documents_status);
        let status_changed = target_status.is_some();

        Ok(AppliedTransition {
            status,
            documents_status,
            stage_started_at: if status_changed {
                now
            } else {
                current.stage_started_at
            },
            status_changed,
            history: StatusHistoryEntry {
                lead_id: request.lead_id.clone(),
                old_status: current.status,
                new_status: status,
                old_documents_status: current.documents_status,
                new_documents_status: documents_status,
                reason_code: request.reason_code.clone(),
                notes: request.notes.trim().to_string(),
                changed_by: actor.id.clone(),
                changed_at: now,
                additional_data: request.additional_data.clone(),
            },
        })
    }

    /// Read-only TAT view of the current stage; never a transition precondition.
    pub fn tat(&self, current: &LeadStage, now: DateTime<Utc>) -> TatStatus {
        tat::compute(current.status, current.stage_started_at, now)
    }
}
