use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::leads::domain::LeadId;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LenderId(pub String);

impl LenderId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }
}

impl std::fmt::Display for LenderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbabilityBand {
    High,
    Medium,
    Low,
}

/// Display bucket for a lender evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LenderGroup {
    BestFit,
    AlsoConsider,
    PossibleButRisky,
    NotSuitable,
}

/// Human-readable verdict, one per group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Doable,
    DoableWithConditions,
    PossibleButRisky,
    NotSuitable,
}

impl Verdict {
    /// Score-derived fallback for evaluations that arrive without a group tag.
    pub fn from_fit(fit_score: u8, risk_flags: &[String]) -> Self {
        match fit_score {
            score if score >= 80 && risk_flags.is_empty() => Self::Doable,
            score if score >= 70 => Self::DoableWithConditions,
            score if score >= 50 => Self::PossibleButRisky,
            _ => Self::NotSuitable,
        }
    }

    pub const fn group(self) -> LenderGroup {
        match self {
            Self::Doable => LenderGroup::BestFit,
            Self::DoableWithConditions => LenderGroup::AlsoConsider,
            Self::PossibleButRisky => LenderGroup::PossibleButRisky,
            Self::NotSuitable => LenderGroup::NotSuitable,
        }
    }

    pub const fn for_group(group: LenderGroup) -> Self {
        match group {
            LenderGroup::BestFit => Self::Doable,
            LenderGroup::AlsoConsider => Self::DoableWithConditions,
            LenderGroup::PossibleButRisky => Self::PossibleButRisky,
            LenderGroup::NotSuitable => Self::NotSuitable,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Doable => "Doable",
            Self::DoableWithConditions => "Doable with conditions",
            Self::PossibleButRisky => "Possible but risky",
            Self::NotSuitable => "Not suitable",
        }
    }
}

/// One lender scored against one applicant by the upstream BRE.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LenderEvaluation {
    pub lender_id: LenderId,
    pub lender_name: String,
    pub fit_score: u8,
    pub probability_band: ProbabilityBand,
    #[serde(default)]
    pub risk_flags: Vec<String>,
    #[serde(default)]
    pub group: Option<LenderGroup>,
    #[serde(default)]
    pub justification: String,
}

/// Upstream group when tagged, otherwise the score-derived fallback.
pub fn verdict_of(evaluation: &LenderEvaluation) -> Verdict {
    match evaluation.group {
        Some(group) => Verdict::for_group(group),
        None => Verdict::from_fit(evaluation.fit_score, &evaluation.risk_flags),
    }
}

/// Whether an accepted lender was the system's top pick or a human-chosen alternative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcceptanceMode {
    Ai,
    AiOverride,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcceptanceRecord {
    pub lead_id: LeadId,
    pub lender_id: LenderId,
    pub mode: AcceptanceMode,
    pub accepted_by: String,
    pub accepted_at: DateTime<Utc>,
    /// Advisory snapshot of the review flag at acceptance time.
    pub needs_human_review: bool,
}

/// Directory row for an active lending partner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lender {
    pub id: LenderId,
    pub name: String,
    pub countries: Vec<String>,
    pub min_amount: u64,
    pub max_amount: u64,
    pub active: bool,
}

impl Lender {
    pub fn serves(&self, filter: &LenderFilter) -> bool {
        let country_ok = match filter.country.as_deref() {
            Some(country) => self
                .countries
                .iter()
                .any(|served| served.eq_ignore_ascii_case(country.trim())),
            None => true,
        };
        let amount_ok = match filter.amount {
            Some(amount) => amount >= self.min_amount && amount <= self.max_amount,
            None => true,
        };
        self.active && country_ok && amount_ok
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LenderFilter {
    pub country: Option<String>,
    pub amount: Option<u64>,
}
