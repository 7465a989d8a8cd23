//! Multi-step lead intake as an explicit state object driven by a pure reducer.
//!
//! A draft is scoped by the applicant's identity so partial progress can be
//! stored and resumed without any ambient form state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::completion::{is_filled, CompletionField, FieldValue};
use super::domain::{
    CoApplicant, DocumentsStatus, Lead, LeadId, LeadStatus, StudentProfile, StudyPlan,
};

/// Scoping key for persisted drafts: the applicant's normalized phone number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DraftKey(pub String);

impl DraftKey {
    pub fn for_phone(phone: &str) -> Self {
        let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
        Self(digits)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntakeStep {
    Student,
    Study,
    CoApplicant,
    Review,
}

impl IntakeStep {
    fn previous(self) -> Option<Self> {
        match self {
            Self::Student => None,
            Self::Study => Some(Self::Student),
            Self::CoApplicant => Some(Self::Study),
            Self::Review => Some(Self::CoApplicant),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntakeDraft {
    pub key: DraftKey,
    pub step: IntakeStep,
    pub student: Option<StudentProfile>,
    pub study: Option<StudyPlan>,
    pub co_applicant: Option<CoApplicant>,
    pub loan_amount: Option<u64>,
    pub submitted: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum IntakeAction {
    SaveStudent(StudentProfile),
    SaveStudy {
        study: StudyPlan,
        loan_amount: u64,
    },
    SaveCoApplicant(CoApplicant),
    SkipCoApplicant,
    Back,
    Submit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntakeError {
    #[error("action is not valid on the {0:?} step")]
    WrongStep(IntakeStep),
    #[error("{0} is required before continuing")]
    MissingField(&'static str),
    #[error("draft has already been submitted")]
    AlreadySubmitted,
}

impl IntakeDraft {
    pub fn new(key: DraftKey) -> Self {
        Self {
            key,
            step: IntakeStep::Student,
            student: None,
            study: None,
            co_applicant: None,
            loan_amount: None,
            submitted: false,
        }
    }

    /// Lead snapshot for a submitted draft. The lead starts at the first status.
    pub fn into_lead(self, id: LeadId, now: DateTime<Utc>) -> Result<Lead, IntakeError> {
        if !self.submitted {
            return Err(IntakeError::WrongStep(self.step));
        }

        Ok(Lead {
            id,
            status: LeadStatus::NewLead,
            documents_status: DocumentsStatus::NotUploaded,
            stage_started_at: now,
            version: 0,
            loan_amount: self.loan_amount,
            student: self.student.unwrap_or_default(),
            study: self.study.unwrap_or_default(),
            co_applicant: self.co_applicant,
        })
    }
}

/// Apply one user action. Each step validates its own data before advancing.
pub fn reduce(draft: IntakeDraft, action: IntakeAction) -> Result<IntakeDraft, IntakeError> {
    if draft.submitted {
        return Err(IntakeError::AlreadySubmitted);
    }

    let step = draft.step;
    match (step, action) {
        (_, IntakeAction::Back) => Ok(IntakeDraft {
            step: step.previous().unwrap_or(step),
            ..draft
        }),
        (IntakeStep::Student, IntakeAction::SaveStudent(student)) => {
            require(CompletionField::FullName, student.full_name.as_deref())?;
            require(CompletionField::Phone, student.phone.as_deref())?;
            require(CompletionField::Email, student.email.as_deref())?;
            Ok(IntakeDraft {
                step: IntakeStep::Study,
                student: Some(student),
                ..draft
            })
        }
        (IntakeStep::Study, IntakeAction::SaveStudy { study, loan_amount }) => {
            require(CompletionField::StudyDestination, study.study_destination.as_deref())?;
            require(CompletionField::CourseName, study.course_name.as_deref())?;
            if loan_amount == 0 {
                return Err(IntakeError::MissingField(
                    CompletionField::LoanAmount.descriptor().key,
                ));
            }
            Ok(IntakeDraft {
                step: IntakeStep::CoApplicant,
                study: Some(study),
                loan_amount: Some(loan_amount),
                ..draft
            })
        }
        (IntakeStep::CoApplicant, IntakeAction::SaveCoApplicant(co_applicant)) => {
            require(CompletionField::CoApplicantName, co_applicant.name.as_deref())?;
            require(
                CompletionField::CoApplicantRelationship,
                co_applicant.relationship.as_deref(),
            )?;
            Ok(IntakeDraft {
                step: IntakeStep::Review,
                co_applicant: Some(co_applicant),
                ..draft
            })
        }
        (IntakeStep::CoApplicant, IntakeAction::SkipCoApplicant) => Ok(IntakeDraft {
            step: IntakeStep::Review,
            co_applicant: None,
            ..draft
        }),
        (IntakeStep::Review, IntakeAction::Submit) => Ok(IntakeDraft {
            submitted: true,
            ..draft
        }),
        (step, _) => Err(IntakeError::WrongStep(step)),
    }
}

fn require(field: CompletionField, value: Option<&str>) -> Result<(), IntakeError> {
    let value = value.map(FieldValue::Text).unwrap_or(FieldValue::Absent);
    if is_filled(field, value) {
        Ok(())
    } else {
        Err(IntakeError::MissingField(field.descriptor().key))
    }
}
