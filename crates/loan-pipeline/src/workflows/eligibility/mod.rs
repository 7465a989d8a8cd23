//! Quick-check eligibility scoring.
//!
//! [`EligibilityScorer`] turns university standing, co-applicant income and the
//! requested amount into a 0-100 score, a category and indicative loan/rate
//! ranges. Factor weights are fixed here; the score-to-band mapping is the
//! versioned [`EligibilityBands`] configuration.

mod config;
mod rules;

pub use config::{BandsLoadError, EligibilityBands, OfferBand};

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ConfigurationError, EngineError};
use crate::workflows::lenders::directory::LenderDirectory;
use crate::workflows::lenders::domain::LenderFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickCheckInput {
    /// University rank/score on a 0-100 scale, when the directory knows it.
    pub university_score: Option<u8>,
    pub co_applicant_monthly_salary: u64,
    pub requested_amount: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultCategory {
    Eligible,
    Conditional,
    Unlikely,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreFactor {
    University,
    CoApplicantSalary,
    Relationship,
}

/// One factor's contribution, kept for transparent audits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreComponent {
    pub factor: ScoreFactor,
    pub points: u8,
    pub max_points: u8,
    pub band: String,
}

/// Created fresh per check; superseded, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityResult {
    pub score: u8,
    pub result_category: ResultCategory,
    pub breakdown: Vec<ScoreComponent>,
    pub estimated_loan_min: u64,
    pub estimated_loan_max: u64,
    pub estimated_rate_min_bps: u32,
    pub estimated_rate_max_bps: u32,
    pub lender_count: u32,
    pub bands_version: String,
}

/// Pure scorer over a validated band configuration.
#[derive(Debug, Clone)]
pub struct EligibilityScorer {
    bands: EligibilityBands,
}

impl EligibilityScorer {
    pub fn new(bands: EligibilityBands) -> Result<Self, ConfigurationError> {
        Ok(Self {
            bands: bands.validated()?,
        })
    }

    pub fn bands(&self) -> &EligibilityBands {
        &self.bands
    }

    pub fn score(&self, input: &QuickCheckInput, lender_count: u32) -> EligibilityResult {
        let breakdown = vec![
            rules::university_component(input.university_score),
            rules::salary_component(input.co_applicant_monthly_salary),
            rules::relationship_component(),
        ];
        let score = rules::total(&breakdown);

        let result_category = if score >= self.bands.eligible_min_score {
            ResultCategory::Eligible
        } else if score >= self.bands.conditional_min_score {
            ResultCategory::Conditional
        } else {
            ResultCategory::Unlikely
        };

        let (loan_min_pct, loan_max_pct, rate_min_bps, rate_max_bps) =
            match self.bands.band_for(score) {
                Some(band) => (
                    band.loan_min_pct,
                    band.loan_max_pct,
                    band.rate_min_bps,
                    band.rate_max_bps,
                ),
                None => (0, 0, 0, 0),
            };

        EligibilityResult {
            score,
            result_category,
            breakdown,
            estimated_loan_min: fraction_of(input.requested_amount, loan_min_pct),
            estimated_loan_max: fraction_of(input.requested_amount, loan_max_pct),
            estimated_rate_min_bps: rate_min_bps,
            estimated_rate_max_bps: rate_max_bps,
            lender_count,
            bands_version: self.bands.version.clone(),
        }
    }
}

/// Percentages are validated to at most 100, so the result never exceeds `amount`.
fn fraction_of(amount: u64, pct: u8) -> u64 {
    let scaled = u128::from(amount) * u128::from(pct) / 100;
    u64::try_from(scaled).unwrap_or(amount)
}

/// What the university directory knows about an institution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniversityProfile {
    pub rank_or_score: u8,
    pub country: String,
}

pub trait UniversityDirectory: Send + Sync {
    fn lookup(&self, university_id: &str) -> Result<Option<UniversityProfile>, DirectoryError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DirectoryError {
    #[error("directory unavailable: {0}")]
    Unavailable(String),
}

/// Quick-check request as submitted by the intake screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickCheckRequest {
    #[serde(default)]
    pub university_id: Option<String>,
    #[serde(default)]
    pub study_destination: Option<String>,
    pub co_applicant_monthly_salary: u64,
    pub requested_amount: u64,
}

/// Composes the directory lookups with the scorer.
pub struct EligibilityService {
    universities: Arc<dyn UniversityDirectory>,
    lenders: Arc<dyn LenderDirectory>,
    scorer: EligibilityScorer,
}

impl EligibilityService {
    pub fn new(
        universities: Arc<dyn UniversityDirectory>,
        lenders: Arc<dyn LenderDirectory>,
        scorer: EligibilityScorer,
    ) -> Self {
        Self {
            universities,
            lenders,
            scorer,
        }
    }

    pub fn scorer(&self) -> &EligibilityScorer {
        &self.scorer
    }

    /// A missing or unreachable university falls back to the default grade; an
    /// unreachable lender directory fails the check.
    pub fn quick_check(&self, request: &QuickCheckRequest) -> Result<EligibilityResult, EngineError> {
        let university = match request.university_id.as_deref() {
            Some(id) => match self.universities.lookup(id) {
                Ok(profile) => profile,
                Err(error) => {
                    warn!(university_id = id, %error, "university lookup failed; using default grade");
                    None
                }
            },
            None => None,
        };

        let country = request
            .study_destination
            .clone()
            .or_else(|| university.as_ref().map(|profile| profile.country.clone()));
        let filter = LenderFilter {
            country,
            amount: Some(request.requested_amount),
        };
        let lender_count = self
            .lenders
            .count_active(&filter)
            .map_err(|error| EngineError::ExternalService(error.to_string()))?;

        let input = QuickCheckInput {
            university_score: university.map(|profile| profile.rank_or_score),
            co_applicant_monthly_salary: request.co_applicant_monthly_salary,
            requested_amount: request.requested_amount,
        };
        let result = self.scorer.score(&input, lender_count);
        debug!(
            score = result.score,
            category = ?result.result_category,
            lender_count,
            "eligibility quick check scored"
        );
        Ok(result)
    }
}
