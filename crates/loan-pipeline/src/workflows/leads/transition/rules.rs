use super::super::domain::{LeadStatus, TransitionData};
use super::super::registry::StatusRegistry;
use super::{CompanionField, ValidationError};

pub(crate) const NOTES_MIN_CHARS: usize = 10;
pub(crate) const NOTES_MAX_CHARS: usize = 150;

/// Admin notes are measured in characters after trimming.
pub(crate) fn check_admin_notes(notes: &str) -> Result<(), ValidationError> {
    let len = notes.trim().chars().count();
    if (NOTES_MIN_CHARS..=NOTES_MAX_CHARS).contains(&len) {
        Ok(())
    } else {
        Err(ValidationError::NotesOutOfBounds {
            len,
            min: NOTES_MIN_CHARS,
            max: NOTES_MAX_CHARS,
        })
    }
}

/// Whether a non-admin may move a lead from `from` to `to`.
///
/// Open leads may advance exactly one canonical step or be closed into any
/// terminal status. Closed leads only move through an admin.
pub(crate) fn is_reachable(from: LeadStatus, to: LeadStatus) -> bool {
    let current = StatusRegistry::entry(from);
    let target = StatusRegistry::entry(to);

    if target.legacy {
        return false;
    }

    match (current.step, target.step) {
        (None, _) => false,
        (Some(_), None) => true,
        (Some(from_step), Some(_)) => from_step
            .checked_add(1)
            .and_then(StatusRegistry::canonical_at_step)
            == Some(to),
    }
}

/// Companion data a target status demands, checked in declaration order.
pub(crate) fn check_companion_fields(
    target: LeadStatus,
    data: &TransitionData,
) -> Result<(), ValidationError> {
    let missing = match target {
        LeadStatus::LoggedWithLender => {
            first_missing(&[(CompanionField::LanNumber, non_blank(&data.lan_number))])
        }
        LeadStatus::PdCallScheduled => first_missing(&[(
            CompanionField::PdCallScheduledAt,
            data.pd_call_scheduled_at.is_some(),
        )]),
        LeadStatus::PropertyVerification => first_missing(&[(
            CompanionField::PropertyVerificationOutcome,
            data.property_verification_outcome.is_some(),
        )]),
        LeadStatus::Sanctioned => first_missing(&[
            (CompanionField::SanctionAmount, positive(data.sanction_amount)),
            (CompanionField::SanctionDate, data.sanction_date.is_some()),
        ]),
        LeadStatus::ProcessingFeePaid => first_missing(&[
            (
                CompanionField::ProcessingFeeAmount,
                positive(data.processing_fee_amount),
            ),
            (
                CompanionField::ProcessingFeeReference,
                non_blank(&data.processing_fee_reference),
            ),
        ]),
        _ => None,
    };

    match missing {
        Some(field) => Err(ValidationError::MissingConditionalField(field)),
        None => Ok(()),
    }
}

fn first_missing(checks: &[(CompanionField, bool)]) -> Option<CompanionField> {
    checks
        .iter()
        .find(|(_, satisfied)| !satisfied)
        .map(|(field, _)| *field)
}

fn non_blank(value: &Option<String>) -> bool {
    value
        .as_deref()
        .map(|text| !text.trim().is_empty())
        .unwrap_or(false)
}

fn positive(value: Option<u64>) -> bool {
    value.map(|amount| amount > 0).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn notes_bounds_are_inclusive_and_trimmed() {
        assert!(check_admin_notes("0123456789").is_ok());
        assert!(check_admin_notes(&"x".repeat(150)).is_ok());
        assert!(check_admin_notes(&"x".repeat(151)).is_err());
        assert!(check_admin_notes("   short    ").is_err());
    }

    #[test]
    fn notes_are_counted_in_characters_not_bytes() {
        assert!(check_admin_notes(&"é".repeat(150)).is_ok());
        assert!(check_admin_notes(&"é".repeat(9)).is_err());
    }

    #[test]
    fn reachability_allows_next_step_and_closing() {
        assert!(is_reachable(LeadStatus::NewLead, LeadStatus::Contacted));
        assert!(is_reachable(LeadStatus::LoginReady, LeadStatus::LoggedWithLender));
        assert!(is_reachable(LeadStatus::Sanctioned, LeadStatus::Withdrawn));
        assert!(!is_reachable(LeadStatus::NewLead, LeadStatus::DocumentsPending));
        assert!(!is_reachable(LeadStatus::Sanctioned, LeadStatus::CreditReview));
        assert!(!is_reachable(LeadStatus::Rejected, LeadStatus::NewLead));
    }

    #[test]
    fn legacy_current_status_advances_from_its_step() {
        assert!(is_reachable(LeadStatus::LoginDone, LeadStatus::PdCallScheduled));
        assert!(is_reachable(LeadStatus::InProgress, LeadStatus::DocumentsPending));
        assert!(!is_reachable(LeadStatus::Contacted, LeadStatus::LoginDone));
    }

    #[test]
    fn sanction_reports_amount_before_date() {
        let data = TransitionData::default();
        assert_eq!(
            check_companion_fields(LeadStatus::Sanctioned, &data),
            Err(ValidationError::MissingConditionalField(
                CompanionField::SanctionAmount
            ))
        );

        let data = TransitionData {
            sanction_amount: Some(1_500_000),
            ..TransitionData::default()
        };
        assert_eq!(
            check_companion_fields(LeadStatus::Sanctioned, &data),
            Err(ValidationError::MissingConditionalField(
                CompanionField::SanctionDate
            ))
        );

        let data = TransitionData {
            sanction_amount: Some(1_500_000),
            sanction_date: NaiveDate::from_ymd_opt(2025, 3, 14),
            ..TransitionData::default()
        };
        assert!(check_companion_fields(LeadStatus::Sanctioned, &data).is_ok());
    }

    #[test]
    fn zero_sanction_amount_is_missing() {
        let data = TransitionData {
            sanction_amount: Some(0),
            sanction_date: NaiveDate::from_ymd_opt(2025, 3, 14),
            ..TransitionData::default()
        };
        assert_eq!(
            check_companion_fields(LeadStatus::Sanctioned, &data),
            Err(ValidationError::MissingConditionalField(
                CompanionField::SanctionAmount
            ))
        );
    }

    #[test]
    fn statuses_without_companions_pass() {
        assert!(check_companion_fields(LeadStatus::Contacted, &TransitionData::default()).is_ok());
    }
}
