use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::registry::StatusRegistry;
use crate::error::ConfigurationError;
use crate::workflows::lenders::domain::{AcceptanceMode, LenderId};

/// Identifier wrapper for leads.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LeadId(pub String);

impl LeadId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LeadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Coarse pipeline stage. Only the non-terminal phases are ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    PreLogin,
    WithLender,
    Sanction,
    Disbursement,
    Terminal,
}

impl Phase {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::PreLogin,
            Self::WithLender,
            Self::Sanction,
            Self::Disbursement,
            Self::Terminal,
        ]
    }

    /// Position in the forward ordering; `None` for the terminal phase.
    pub const fn rank(self) -> Option<u8> {
        match self {
            Self::PreLogin => Some(0),
            Self::WithLender => Some(1),
            Self::Sanction => Some(2),
            Self::Disbursement => Some(3),
            Self::Terminal => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::PreLogin => "Pre-Login",
            Self::WithLender => "With Lender",
            Self::Sanction => "Sanction",
            Self::Disbursement => "Disbursement",
            Self::Terminal => "Closed",
        }
    }
}

/// Every status a lead may hold, including pre-migration names that are no longer offered.
///
/// Decoding goes through [`StatusRegistry::resolve`], so stored legacy casings
/// still load and a value with no registry entry surfaces as
/// [`ConfigurationError::UnknownStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum LeadStatus {
    NewLead,
    Contacted,
    DocumentsPending,
    DocumentsReceived,
    LoginReady,
    LoggedWithLender,
    PdCallScheduled,
    PdCallCompleted,
    PropertyVerification,
    CreditReview,
    Sanctioned,
    ProcessingFeePaid,
    DisbursementRequested,
    Disbursed,
    Rejected,
    Withdrawn,
    NotInterested,
    // Legacy values kept resolvable for leads persisted before the status migration.
    InProgress,
    LoginDone,
    Approved,
}

impl TryFrom<String> for LeadStatus {
    type Error = ConfigurationError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        StatusRegistry::resolve(&raw)
    }
}

impl LeadStatus {
    pub const ALL: [LeadStatus; 20] = [
        LeadStatus::NewLead,
        LeadStatus::Contacted,
        LeadStatus::DocumentsPending,
        LeadStatus::DocumentsReceived,
        LeadStatus::LoginReady,
        LeadStatus::LoggedWithLender,
        LeadStatus::PdCallScheduled,
        LeadStatus::PdCallCompleted,
        LeadStatus::PropertyVerification,
        LeadStatus::CreditReview,
        LeadStatus::Sanctioned,
        LeadStatus::ProcessingFeePaid,
        LeadStatus::DisbursementRequested,
        LeadStatus::Disbursed,
        LeadStatus::Rejected,
        LeadStatus::Withdrawn,
        LeadStatus::NotInterested,
        LeadStatus::InProgress,
        LeadStatus::LoginDone,
        LeadStatus::Approved,
    ];

    /// Persisted wire name.
    pub const fn code(self) -> &'static str {
        match self {
            LeadStatus::NewLead => "new_lead",
            LeadStatus::Contacted => "contacted",
            LeadStatus::DocumentsPending => "documents_pending",
            LeadStatus::DocumentsReceived => "documents_received",
            LeadStatus::LoginReady => "login_ready",
            LeadStatus::LoggedWithLender => "logged_with_lender",
            LeadStatus::PdCallScheduled => "pd_call_scheduled",
            LeadStatus::PdCallCompleted => "pd_call_completed",
            LeadStatus::PropertyVerification => "property_verification",
            LeadStatus::CreditReview => "credit_review",
            LeadStatus::Sanctioned => "sanctioned",
            LeadStatus::ProcessingFeePaid => "processing_fee_paid",
            LeadStatus::DisbursementRequested => "disbursement_requested",
            LeadStatus::Disbursed => "disbursed",
            LeadStatus::Rejected => "rejected",
            LeadStatus::Withdrawn => "withdrawn",
            LeadStatus::NotInterested => "not_interested",
            LeadStatus::InProgress => "in_progress",
            LeadStatus::LoginDone => "login_done",
            LeadStatus::Approved => "approved",
        }
    }
}

/// Aggregate state of the lead's document bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentsStatus {
    NotUploaded,
    PartiallyUploaded,
    Uploaded,
    UnderVerification,
    Verified,
    Rejected,
}

impl DocumentsStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::NotUploaded => "Not Uploaded",
            Self::PartiallyUploaded => "Partially Uploaded",
            Self::Uploaded => "Uploaded",
            Self::UnderVerification => "Under Verification",
            Self::Verified => "Verified",
            Self::Rejected => "Rejected",
        }
    }
}

/// Applicant's own details as captured during intake.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentProfile {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub pin_code: Option<String>,
    pub city: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyPlan {
    pub study_destination: Option<String>,
    pub university_id: Option<String>,
    pub university_name: Option<String>,
    pub course_name: Option<String>,
    pub intake_month: Option<u8>,
    pub intake_year: Option<u16>,
    pub admission_status: Option<String>,
}

/// Co-borrower attached to a lead. Intake creates a placeholder row before the
/// applicant fills anything in, so presence alone does not mean a co-applicant exists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoApplicant {
    pub id: Option<String>,
    pub name: Option<String>,
    pub relationship: Option<String>,
    pub phone: Option<String>,
    pub monthly_salary: Option<u64>,
    pub pin_code: Option<String>,
    pub occupation: Option<String>,
    pub email: Option<String>,
}

/// Lead snapshot as read from the lead repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: LeadId,
    pub status: LeadStatus,
    pub documents_status: DocumentsStatus,
    pub stage_started_at: DateTime<Utc>,
    /// Optimistic concurrency token, bumped by the repository on every accepted write.
    pub version: u64,
    pub loan_amount: Option<u64>,
    #[serde(default)]
    pub student: StudentProfile,
    #[serde(default)]
    pub study: StudyPlan,
    #[serde(default)]
    pub co_applicant: Option<CoApplicant>,
}

impl Lead {
    pub fn stage(&self) -> LeadStage {
        LeadStage {
            status: self.status,
            documents_status: self.documents_status,
            stage_started_at: self.stage_started_at,
        }
    }
}

/// The slice of a lead the transition validator reasons about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadStage {
    pub status: LeadStatus,
    pub documents_status: DocumentsStatus,
    pub stage_started_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    Admin,
    Manager,
    Counselor,
    Partner,
}

impl ActorRole {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Manager => "manager",
            Self::Counselor => "counselor",
            Self::Partner => "partner",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => Some(Self::Admin),
            "manager" => Some(Self::Manager),
            "counselor" | "counsellor" => Some(Self::Counselor),
            "partner" => Some(Self::Partner),
            _ => None,
        }
    }
}

/// Authenticated user performing an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub role: ActorRole,
}

impl Actor {
    pub fn new(id: impl Into<String>, role: ActorRole) -> Self {
        Self {
            id: id.into(),
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == ActorRole::Admin
    }
}

/// Outcome recorded against a property verification visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationOutcome {
    Positive,
    Negative,
    Referred,
}

/// Status specific companion data supplied with a transition request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransitionData {
    pub lan_number: Option<String>,
    pub sanction_amount: Option<u64>,
    pub sanction_date: Option<NaiveDate>,
    pub pd_call_scheduled_at: Option<DateTime<Utc>>,
    pub processing_fee_amount: Option<u64>,
    pub processing_fee_reference: Option<String>,
    pub property_verification_outcome: Option<VerificationOutcome>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusTransitionRequest {
    pub lead_id: LeadId,
    #[serde(default)]
    pub status: Option<LeadStatus>,
    #[serde(default)]
    pub documents_status: Option<DocumentsStatus>,
    #[serde(default)]
    pub reason_code: Option<String>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub additional_data: TransitionData,
}

/// Append-only audit row describing one accepted transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusHistoryEntry {
    pub lead_id: LeadId,
    pub old_status: LeadStatus,
    pub new_status: LeadStatus,
    pub old_documents_status: DocumentsStatus,
    pub new_documents_status: DocumentsStatus,
    pub reason_code: Option<String>,
    pub notes: String,
    pub changed_by: String,
    pub changed_at: DateTime<Utc>,
    pub additional_data: TransitionData,
}

/// Fully validated change, applied by the repository as one atomic unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedTransition {
    pub status: LeadStatus,
    pub documents_status: DocumentsStatus,
    pub stage_started_at: DateTime<Utc>,
    pub status_changed: bool,
    pub history: StatusHistoryEntry,
}

/// Domain events handed to the notification dispatcher; delivery is not our concern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LeadEvent {
    StatusChanged {
        lead_id: LeadId,
        from: LeadStatus,
        to: LeadStatus,
        documents_status: DocumentsStatus,
        changed_by: String,
        at: DateTime<Utc>,
    },
    LenderAccepted {
        lead_id: LeadId,
        lender_id: LenderId,
        mode: AcceptanceMode,
        accepted_by: String,
        at: DateTime<Utc>,
    },
}
