use super::domain::{LeadStatus, Phase};
use crate::error::ConfigurationError;
use serde::Serialize;

/// Static metadata for one status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusEntry {
    pub status: LeadStatus,
    pub phase: Phase,
    /// Total order across the non-terminal phases; `None` for terminal statuses.
    pub step: Option<u8>,
    /// Zero means the stage is not TAT tracked.
    pub expected_tat_hours: u32,
    pub label: &'static str,
    pub icon: &'static str,
    /// Pre-migration value: never offered in listings, still resolvable for stored leads.
    pub legacy: bool,
}

impl StatusEntry {
    pub fn is_terminal(&self) -> bool {
        self.phase == Phase::Terminal
    }
}

/// Read-only lookup from status to phase, step and expected turnaround time.
pub struct StatusRegistry;

impl StatusRegistry {
    pub const fn entry(status: LeadStatus) -> StatusEntry {
        use LeadStatus::*;
        use Phase::*;

        let (phase, step, expected_tat_hours, label, icon, legacy) = match status {
            NewLead => (PreLogin, Some(1), 24, "New Lead", "sparkles", false),
            Contacted => (PreLogin, Some(2), 24, "Contacted", "phone", false),
            DocumentsPending => (PreLogin, Some(3), 72, "Documents Pending", "file-clock", false),
            DocumentsReceived => (PreLogin, Some(4), 48, "Documents Received", "file-check", false),
            LoginReady => (PreLogin, Some(5), 24, "Ready for Login", "send", false),
            LoggedWithLender => (WithLender, Some(6), 48, "Logged with Lender", "building", false),
            PdCallScheduled => (WithLender, Some(7), 48, "PD Call Scheduled", "calendar", false),
            PdCallCompleted => (WithLender, Some(8), 24, "PD Call Completed", "calendar-check", false),
            PropertyVerification => (WithLender, Some(9), 72, "Property Verification", "home", false),
            CreditReview => (Sanction, Some(10), 72, "Credit Review", "scale", false),
            Sanctioned => (Sanction, Some(11), 48, "Sanctioned", "badge-check", false),
            ProcessingFeePaid => (Sanction, Some(12), 48, "Processing Fee Paid", "receipt", false),
            DisbursementRequested => (Disbursement, Some(13), 72, "Disbursement Requested", "banknote", false),
            Disbursed => (Disbursement, Some(14), 0, "Disbursed", "circle-check", false),
            Rejected => (Terminal, None, 0, "Rejected", "circle-x", false),
            Withdrawn => (Terminal, None, 0, "Withdrawn", "undo", false),
            NotInterested => (Terminal, None, 0, "Not Interested", "thumbs-down", false),
            InProgress => (PreLogin, Some(2), 24, "In Progress", "loader", true),
            LoginDone => (WithLender, Some(6), 48, "Login Done", "building", true),
            Approved => (Terminal, None, 0, "Approved", "circle-check", true),
        };

        StatusEntry {
            status,
            phase,
            step,
            expected_tat_hours,
            label,
            icon,
            legacy,
        }
    }

    /// Statuses offered to users, in pipeline order followed by the terminal ones.
    pub fn listed() -> Vec<StatusEntry> {
        LeadStatus::ALL
            .into_iter()
            .map(Self::entry)
            .filter(|entry| !entry.legacy)
            .collect()
    }

    /// Canonical status holding the given step, if any.
    pub fn canonical_at_step(step: u8) -> Option<LeadStatus> {
        LeadStatus::ALL
            .into_iter()
            .map(Self::entry)
            .find(|entry| !entry.legacy && entry.step == Some(step))
            .map(|entry| entry.status)
    }

    /// Resolve a persisted status value. An unknown value means the stored data
    /// has drifted from this build and nothing downstream can reason about it.
    pub fn resolve(raw: &str) -> Result<LeadStatus, ConfigurationError> {
        let needle = raw.trim();
        LeadStatus::ALL
            .into_iter()
            .find(|status| status.code().eq_ignore_ascii_case(needle))
            .ok_or_else(|| {
                tracing::error!(status = needle, "persisted lead status has no registry entry");
                ConfigurationError::UnknownStatus(needle.to_string())
            })
    }
}
