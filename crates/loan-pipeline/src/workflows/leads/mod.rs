//! Lead lifecycle: status registry, completeness, transition rules, TAT and the
//! service/router that compose them over injected storage.

pub mod completion;
pub mod domain;
pub mod intake;
pub mod registry;
pub mod report;
pub mod repository;
pub mod router;
pub mod service;
pub mod session;
pub mod transition;

#[cfg(test)]
mod tests;

pub use completion::{CompletionEvaluator, CompletionField, CompletionResult, FieldDescriptor};
pub use domain::{
    Actor, ActorRole, AppliedTransition, CoApplicant, DocumentsStatus, Lead, LeadEvent, LeadId,
    LeadStage, LeadStatus, Phase, StatusHistoryEntry, StatusTransitionRequest, StudentProfile,
    StudyPlan, TransitionData, VerificationOutcome,
};
pub use intake::{reduce, DraftKey, IntakeAction, IntakeDraft, IntakeError, IntakeStep};
pub use registry::{StatusEntry, StatusRegistry};
pub use report::PipelineReport;
pub use repository::{
    EventError, EventPublisher, LeadRepository, LeadStatusView, RepositoryError,
    StatusHistoryRepository,
};
pub use router::lead_router;
pub use service::{Clock, LeadLifecycleService, StatusTransitionResult, SystemClock};
pub use session::{HeaderSession, SessionError, SessionProvider};
pub use transition::{CompanionField, StatusTransitionValidator, TatStatus, ValidationError};
