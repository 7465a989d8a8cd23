use std::sync::Arc;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileId(pub String);

impl FileId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }
}

impl std::fmt::Display for FileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Passport,
    AadhaarCard,
    PanCard,
    AdmissionLetter,
    AcademicTranscript,
    BankStatement,
    SalarySlip,
    IncomeTaxReturn,
    PropertyDocument,
    Other,
}

impl DocumentType {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Passport => "Passport",
            Self::AadhaarCard => "Aadhaar Card",
            Self::PanCard => "PAN Card",
            Self::AdmissionLetter => "Admission Letter",
            Self::AcademicTranscript => "Academic Transcript",
            Self::BankStatement => "Bank Statement",
            Self::SalarySlip => "Salary Slip",
            Self::IncomeTaxReturn => "Income Tax Return",
            Self::PropertyDocument => "Property Document",
            Self::Other => "Other",
        }
    }
}

/// Suggestion returned by the AI classifier. Never authoritative on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub detected_type: DocumentType,
    pub detected_type_label: String,
    pub confidence: u8,
    #[serde(default)]
    pub quality_assessment: Option<String>,
    #[serde(default)]
    pub red_flags: Vec<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Suggestions below this confidence are flagged for a closer look.
pub const ATTENTION_CONFIDENCE: u8 = 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManualTypeReason {
    /// The classifier answered but had nothing to suggest.
    NoClassification,
    ClassifierUnavailable(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SlotState {
    Queued,
    Classifying,
    Suggested {
        classification: Classification,
        needs_attention: bool,
    },
    ManualTypeRequired {
        reason: ManualTypeReason,
    },
    Confirmed {
        document_type: DocumentType,
    },
    Removed,
}

impl SlotState {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Classifying => "classifying",
            Self::Suggested { .. } => "suggested",
            Self::ManualTypeRequired { .. } => "manual_type_required",
            Self::Confirmed { .. } => "confirmed",
            Self::Removed => "removed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot {action} a document that is {from}")]
pub struct SlotError {
    pub from: &'static str,
    pub action: &'static str,
}

/// One uploaded file and its independent classification state.
#[derive(Debug, Clone)]
pub struct DocumentSlot {
    pub file_id: FileId,
    pub file_name: String,
    pub expected_type: Option<DocumentType>,
    state: SlotState,
    preview: Option<Arc<[u8]>>,
}

impl DocumentSlot {
    pub fn queued(
        file_id: FileId,
        file_name: impl Into<String>,
        expected_type: Option<DocumentType>,
        content: impl Into<Arc<[u8]>>,
    ) -> Self {
        Self {
            file_id,
            file_name: file_name.into(),
            expected_type,
            state: SlotState::Queued,
            preview: Some(content.into()),
        }
    }

    pub fn state(&self) -> &SlotState {
        &self.state
    }

    pub fn content(&self) -> Option<Arc<[u8]>> {
        self.preview.clone()
    }

    pub fn start_classifying(&mut self) -> Result<(), SlotError> {
        match self.state {
            SlotState::Queued => {
                self.state = SlotState::Classifying;
                Ok(())
            }
            _ => Err(self.refuse("classify")),
        }
    }

    /// Record the classifier's answer. `None` means it had no suggestion.
    pub fn record_suggestion(&mut self, classification: Option<Classification>) -> Result<(), SlotError> {
        if self.state != SlotState::Classifying {
            return Err(self.refuse("record a suggestion for"));
        }

        self.state = match classification {
            Some(classification) => {
                let mismatched = self
                    .expected_type
                    .is_some_and(|expected| expected != classification.detected_type);
                let needs_attention =
                    mismatched || classification.confidence < ATTENTION_CONFIDENCE;
                SlotState::Suggested {
                    classification,
                    needs_attention,
                }
            }
            None => SlotState::ManualTypeRequired {
                reason: ManualTypeReason::NoClassification,
            },
        };
        Ok(())
    }

    pub fn require_manual_type(&mut self, reason: ManualTypeReason) -> Result<(), SlotError> {
        match self.state {
            SlotState::Queued | SlotState::Classifying => {
                self.state = SlotState::ManualTypeRequired { reason };
                Ok(())
            }
            _ => Err(self.refuse("fall back to manual typing for")),
        }
    }

    /// Human confirmation, either accepting the suggestion or picking a type by hand.
    pub fn confirm(&mut self, document_type: DocumentType) -> Result<(), SlotError> {
        match self.state {
            SlotState::Suggested { .. } | SlotState::ManualTypeRequired { .. } => {
                self.state = SlotState::Confirmed { document_type };
                Ok(())
            }
            _ => Err(self.refuse("confirm")),
        }
    }

    /// Abandon the file. The preview is released; nothing else needs cleaning up.
    pub fn remove(&mut self) -> Result<(), SlotError> {
        match self.state {
            SlotState::Confirmed { .. } | SlotState::Removed => Err(self.refuse("remove")),
            _ => {
                self.state = SlotState::Removed;
                self.preview = None;
                Ok(())
            }
        }
    }

    fn refuse(&self, action: &'static str) -> SlotError {
        SlotError {
            from: self.state.name(),
            action,
        }
    }
}
