//! Completeness evaluation shared by the "complete this lead" gate and list views.

use super::domain::{CoApplicant, Lead};
use serde::Serialize;

/// Form section a field belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldSection {
    Student,
    Study,
    CoApplicant,
    Lead,
}

/// Closed registry of every field the completeness check knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CompletionField {
    FullName,
    Email,
    Phone,
    PinCode,
    DateOfBirth,
    City,
    StudyDestination,
    CourseName,
    IntakeMonth,
    IntakeYear,
    UniversityName,
    AdmissionStatus,
    LoanAmount,
    CoApplicantName,
    CoApplicantRelationship,
    CoApplicantPhone,
    CoApplicantMonthlySalary,
    CoApplicantPinCode,
    CoApplicantOccupation,
    CoApplicantEmail,
}

/// Serializable description of a field, as returned to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    pub key: &'static str,
    pub path: &'static str,
    pub display_name: &'static str,
    pub section: FieldSection,
    pub is_required: bool,
    pub is_conditionally_required: bool,
}

impl CompletionField {
    pub const ALL: [CompletionField; 20] = [
        CompletionField::FullName,
        CompletionField::Email,
        CompletionField::Phone,
        CompletionField::PinCode,
        CompletionField::DateOfBirth,
        CompletionField::City,
        CompletionField::StudyDestination,
        CompletionField::CourseName,
        CompletionField::IntakeMonth,
        CompletionField::IntakeYear,
        CompletionField::UniversityName,
        CompletionField::AdmissionStatus,
        CompletionField::LoanAmount,
        CompletionField::CoApplicantName,
        CompletionField::CoApplicantRelationship,
        CompletionField::CoApplicantPhone,
        CompletionField::CoApplicantMonthlySalary,
        CompletionField::CoApplicantPinCode,
        CompletionField::CoApplicantOccupation,
        CompletionField::CoApplicantEmail,
    ];

    pub const fn descriptor(self) -> FieldDescriptor {
        use CompletionField::*;
        use FieldSection as S;

        // (key, path, display name, section, required, conditionally required)
        let (key, path, display_name, section, is_required, is_conditionally_required) =
            match self {
                FullName => ("fullName", "student.fullName", "Full name", S::Student, true, false),
                Email => ("email", "student.email", "Email", S::Student, true, false),
                Phone => ("phone", "student.phone", "Phone number", S::Student, true, false),
                PinCode => ("pinCode", "student.pinCode", "PIN code", S::Student, true, false),
                DateOfBirth => ("dateOfBirth", "student.dateOfBirth", "Date of birth", S::Student, false, false),
                City => ("city", "student.city", "City", S::Student, false, false),
                StudyDestination => ("studyDestination", "study.studyDestination", "Study destination", S::Study, true, false),
                CourseName => ("courseName", "study.courseName", "Course", S::Study, true, false),
                IntakeMonth => ("intakeMonth", "study.intakeMonth", "Intake month", S::Study, true, false),
                IntakeYear => ("intakeYear", "study.intakeYear", "Intake year", S::Study, true, false),
                UniversityName => ("universityName", "study.universityName", "University", S::Study, false, false),
                AdmissionStatus => ("admissionStatus", "study.admissionStatus", "Admission status", S::Study, false, false),
                LoanAmount => ("loanAmount", "loanAmount", "Loan amount", S::Lead, true, false),
                CoApplicantName => ("coApplicantName", "coApplicant.name", "Co-applicant name", S::CoApplicant, true, true),
                CoApplicantRelationship => ("coApplicantRelationship", "coApplicant.relationship", "Relationship", S::CoApplicant, true, true),
                CoApplicantPhone => ("coApplicantPhone", "coApplicant.phone", "Co-applicant phone", S::CoApplicant, true, true),
                CoApplicantMonthlySalary => ("coApplicantMonthlySalary", "coApplicant.monthlySalary", "Monthly salary", S::CoApplicant, true, true),
                CoApplicantPinCode => ("coApplicantPinCode", "coApplicant.pinCode", "Co-applicant PIN code", S::CoApplicant, true, true),
                CoApplicantOccupation => ("coApplicantOccupation", "coApplicant.occupation", "Occupation", S::CoApplicant, false, false),
                CoApplicantEmail => ("coApplicantEmail", "coApplicant.email", "Co-applicant email", S::CoApplicant, false, false),
            };

        FieldDescriptor {
            key,
            path,
            display_name,
            section,
            is_required,
            is_conditionally_required,
        }
    }

    pub const fn section(self) -> FieldSection {
        self.descriptor().section
    }

    pub const fn is_required(self) -> bool {
        self.descriptor().is_required
    }

    /// Read the field out of a lead snapshot.
    pub fn value(self, lead: &Lead) -> FieldValue<'_> {
        use CompletionField::*;

        let co = lead.co_applicant.as_ref();
        match self {
            FullName => FieldValue::text(lead.student.full_name.as_deref()),
            Email => FieldValue::text(lead.student.email.as_deref()),
            Phone => FieldValue::text(lead.student.phone.as_deref()),
            PinCode => FieldValue::text(lead.student.pin_code.as_deref()),
            DateOfBirth => match lead.student.date_of_birth {
                Some(_) => FieldValue::Present,
                None => FieldValue::Absent,
            },
            City => FieldValue::text(lead.student.city.as_deref()),
            StudyDestination => FieldValue::text(lead.study.study_destination.as_deref()),
            CourseName => FieldValue::text(lead.study.course_name.as_deref()),
            IntakeMonth => FieldValue::number(lead.study.intake_month.map(u64::from)),
            IntakeYear => FieldValue::number(lead.study.intake_year.map(u64::from)),
            UniversityName => FieldValue::text(lead.study.university_name.as_deref()),
            AdmissionStatus => FieldValue::text(lead.study.admission_status.as_deref()),
            LoanAmount => FieldValue::number(lead.loan_amount),
            CoApplicantName => FieldValue::text(co.and_then(|c| c.name.as_deref())),
            CoApplicantRelationship => FieldValue::text(co.and_then(|c| c.relationship.as_deref())),
            CoApplicantPhone => FieldValue::text(co.and_then(|c| c.phone.as_deref())),
            CoApplicantMonthlySalary => FieldValue::number(co.and_then(|c| c.monthly_salary)),
            CoApplicantPinCode => FieldValue::text(co.and_then(|c| c.pin_code.as_deref())),
            CoApplicantOccupation => FieldValue::text(co.and_then(|c| c.occupation.as_deref())),
            CoApplicantEmail => FieldValue::text(co.and_then(|c| c.email.as_deref())),
        }
    }
}

/// Borrowed view of a field's stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'a> {
    Absent,
    Text(&'a str),
    Number(u64),
    Present,
}

impl<'a> FieldValue<'a> {
    fn text(value: Option<&'a str>) -> Self {
        value.map(FieldValue::Text).unwrap_or(FieldValue::Absent)
    }

    fn number(value: Option<u64>) -> Self {
        value.map(FieldValue::Number).unwrap_or(FieldValue::Absent)
    }
}

/// Placeholder values written by intake that mean "not yet provided".
pub mod sentinel {
    use super::{CompletionField, FieldValue};

    pub const PLACEHOLDER_PIN_CODE: &str = "000000";
    pub const PLACEHOLDER_CO_APPLICANT_NAME: &str = "Co-Applicant";
    pub const PLACEHOLDER_SALARY: u64 = 0;

    /// The only place sentinel literals are compared.
    pub fn is_placeholder(field: CompletionField, value: FieldValue<'_>) -> bool {
        match (field, value) {
            (CompletionField::PinCode | CompletionField::CoApplicantPinCode, FieldValue::Text(pin)) => {
                pin.trim() == PLACEHOLDER_PIN_CODE
            }
            (CompletionField::CoApplicantName, FieldValue::Text(name)) => {
                name.trim() == PLACEHOLDER_CO_APPLICANT_NAME
            }
            (CompletionField::CoApplicantMonthlySalary, FieldValue::Number(salary)) => {
                salary == PLACEHOLDER_SALARY
            }
            _ => false,
        }
    }
}

/// Filled means present, non-blank and not a sentinel placeholder.
pub fn is_filled(field: CompletionField, value: FieldValue<'_>) -> bool {
    let present = match value {
        FieldValue::Absent => false,
        FieldValue::Text(text) => !text.trim().is_empty(),
        FieldValue::Number(_) | FieldValue::Present => true,
    };
    present && !sentinel::is_placeholder(field, value)
}

/// A co-applicant counts only when it has an identifier and at least one real answer.
pub fn is_valid_co_applicant(co_applicant: &CoApplicant) -> bool {
    let has_id = co_applicant
        .id
        .as_deref()
        .map(|id| !id.trim().is_empty())
        .unwrap_or(false);
    if !has_id {
        return false;
    }

    let named = co_applicant
        .name
        .as_deref()
        .map(|name| {
            is_filled(CompletionField::CoApplicantName, FieldValue::Text(name))
        })
        .unwrap_or(false);
    let salaried = co_applicant.monthly_salary.unwrap_or(0) > 0;
    let related = co_applicant
        .relationship
        .as_deref()
        .map(|relationship| !relationship.trim().is_empty())
        .unwrap_or(false);

    named || salaried || related
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionResult {
    pub missing_required: Vec<FieldDescriptor>,
    pub missing_optional: Vec<FieldDescriptor>,
    pub completeness_score: u8,
    pub is_complete: bool,
    pub has_co_applicant: bool,
}

impl CompletionResult {
    pub fn missing_required_keys(&self) -> Vec<&'static str> {
        self.missing_required.iter().map(|field| field.key).collect()
    }
}

/// Pure evaluator over a lead snapshot.
pub struct CompletionEvaluator;

impl CompletionEvaluator {
    pub fn evaluate(lead: &Lead) -> CompletionResult {
        let has_co_applicant = lead
            .co_applicant
            .as_ref()
            .map(is_valid_co_applicant)
            .unwrap_or(false);

        let mut missing_required = Vec::new();
        let mut missing_optional = Vec::new();
        let mut total = 0usize;
        let mut filled = 0usize;

        for field in Self::applicable_fields(has_co_applicant) {
            total += 1;
            if is_filled(field, field.value(lead)) {
                filled += 1;
            } else if field.is_required() {
                missing_required.push(field.descriptor());
            } else {
                missing_optional.push(field.descriptor());
            }
        }

        let completeness_score = if total == 0 {
            100
        } else {
            ((filled as f64 / total as f64) * 100.0).round() as u8
        };

        CompletionResult {
            is_complete: missing_required.is_empty(),
            missing_required,
            missing_optional,
            completeness_score,
            has_co_applicant,
        }
    }

    /// Base student, study and lead fields, plus the co-applicant section only
    /// when a valid co-applicant exists.
    pub fn applicable_fields(has_co_applicant: bool) -> impl Iterator<Item = CompletionField> {
        CompletionField::ALL
            .into_iter()
            .filter(move |field| has_co_applicant || field.section() != FieldSection::CoApplicant)
    }
}
