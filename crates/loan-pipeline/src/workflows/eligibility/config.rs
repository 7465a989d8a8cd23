use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

/// Offer band keyed on the minimum score that unlocks it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferBand {
    pub min_score: u8,
    pub loan_min_pct: u8,
    pub loan_max_pct: u8,
    pub rate_min_bps: u32,
    pub rate_max_bps: u32,
}

/// Versioned score-to-band mapping injected into the scorer.
///
/// Factor weights are fixed in code; only the category cut-offs and the
/// loan/rate bands are tunable here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityBands {
    pub version: String,
    pub eligible_min_score: u8,
    pub conditional_min_score: u8,
    pub offer_bands: Vec<OfferBand>,
}

impl EligibilityBands {
    pub fn standard() -> Self {
        Self {
            version: "2024-01".to_string(),
            eligible_min_score: 65,
            conditional_min_score: 45,
            offer_bands: vec![
                OfferBand {
                    min_score: 80,
                    loan_min_pct: 90,
                    loan_max_pct: 100,
                    rate_min_bps: 950,
                    rate_max_bps: 1_100,
                },
                OfferBand {
                    min_score: 65,
                    loan_min_pct: 70,
                    loan_max_pct: 90,
                    rate_min_bps: 1_050,
                    rate_max_bps: 1_250,
                },
                OfferBand {
                    min_score: 50,
                    loan_min_pct: 50,
                    loan_max_pct: 70,
                    rate_min_bps: 1_200,
                    rate_max_bps: 1_400,
                },
                OfferBand {
                    min_score: 40,
                    loan_min_pct: 30,
                    loan_max_pct: 50,
                    rate_min_bps: 1_350,
                    rate_max_bps: 1_600,
                },
                // No offer implied; rates stay at the worst case so ceilings never improve downwards.
                OfferBand {
                    min_score: 0,
                    loan_min_pct: 0,
                    loan_max_pct: 0,
                    rate_min_bps: 1_500,
                    rate_max_bps: 1_800,
                },
            ],
        }
    }

    pub fn from_json_str(raw: &str) -> Result<Self, BandsLoadError> {
        let bands: EligibilityBands = serde_json::from_str(raw)?;
        bands.validated().map_err(BandsLoadError::Invalid)
    }

    pub fn from_path(path: &Path) -> Result<Self, BandsLoadError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Sort bands by descending minimum score and check the ordering invariant:
    /// a higher score never gets a smaller loan fraction or a worse rate ceiling.
    pub fn validated(mut self) -> Result<Self, ConfigurationError> {
        let invalid = |reason: String| -> Result<Self, ConfigurationError> {
            Err(ConfigurationError::InvalidBands(reason))
        };

        if self.version.trim().is_empty() {
            return invalid("version must not be blank".to_string());
        }
        if self.eligible_min_score > 100 || self.conditional_min_score > self.eligible_min_score {
            return invalid(format!(
                "category cut-offs must satisfy conditional ({}) <= eligible ({}) <= 100",
                self.conditional_min_score, self.eligible_min_score
            ));
        }

        self.offer_bands.sort_by(|a, b| b.min_score.cmp(&a.min_score));

        match self.offer_bands.last() {
            Some(lowest) if lowest.min_score == 0 => {}
            _ => return invalid("a band with min_score 0 is required".to_string()),
        }

        for band in &self.offer_bands {
            if band.loan_min_pct > band.loan_max_pct || band.loan_max_pct > 100 {
                return invalid(format!(
                    "band {} has loan range {}..{}%",
                    band.min_score, band.loan_min_pct, band.loan_max_pct
                ));
            }
            if band.rate_min_bps > band.rate_max_bps {
                return invalid(format!(
                    "band {} has rate range {}..{} bps",
                    band.min_score, band.rate_min_bps, band.rate_max_bps
                ));
            }
        }

        for pair in self.offer_bands.windows(2) {
            let (higher, lower) = (&pair[0], &pair[1]);
            if higher.min_score == lower.min_score {
                return invalid(format!("duplicate band at score {}", higher.min_score));
            }
            if lower.loan_min_pct > higher.loan_min_pct || lower.loan_max_pct > higher.loan_max_pct
            {
                return invalid(format!(
                    "band {} offers a larger loan fraction than band {}",
                    lower.min_score, higher.min_score
                ));
            }
            if lower.rate_max_bps < higher.rate_max_bps {
                return invalid(format!(
                    "band {} has a better rate ceiling than band {}",
                    lower.min_score, higher.min_score
                ));
            }
        }

        Ok(self)
    }

    /// Band for a score. Bands are validated, so the zero band always matches.
    pub fn band_for(&self, score: u8) -> Option<&OfferBand> {
        self.offer_bands.iter().find(|band| score >= band.min_score)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BandsLoadError {
    #[error("failed to read eligibility bands: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid eligibility bands JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Invalid(#[source] ConfigurationError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_bands_pass_validation() {
        let bands = EligibilityBands::standard()
            .validated()
            .expect("standard bands are valid");
        assert_eq!(bands.version, "2024-01");
        assert_eq!(bands.band_for(90).map(|band| band.min_score), Some(80));
        assert_eq!(bands.band_for(12).map(|band| band.min_score), Some(0));
    }

    #[test]
    fn loan_fraction_growing_downwards_is_rejected() {
        let mut bands = EligibilityBands::standard();
        bands.offer_bands[3].loan_max_pct = 95;

        match bands.validated() {
            Err(ConfigurationError::InvalidBands(reason)) => {
                assert!(reason.contains("larger loan fraction"), "{reason}")
            }
            other => panic!("expected invalid bands, got {other:?}"),
        }
    }

    #[test]
    fn better_rate_ceiling_for_lower_score_is_rejected() {
        let mut bands = EligibilityBands::standard();
        bands.offer_bands[2].rate_max_bps = 1_000;
        assert!(matches!(
            bands.validated(),
            Err(ConfigurationError::InvalidBands(_))
        ));
    }

    #[test]
    fn missing_floor_band_is_rejected() {
        let mut bands = EligibilityBands::standard();
        bands.offer_bands.pop();
        assert!(matches!(
            bands.validated(),
            Err(ConfigurationError::InvalidBands(_))
        ));
    }

    #[test]
    fn unordered_json_is_sorted_on_load() {
        let raw = r#"{
            "version": "2025-03",
            "eligible_min_score": 70,
            "conditional_min_score": 50,
            "offer_bands": [
                {"min_score": 0, "loan_min_pct": 0, "loan_max_pct": 0, "rate_min_bps": 1400, "rate_max_bps": 1700},
                {"min_score": 75, "loan_min_pct": 80, "loan_max_pct": 100, "rate_min_bps": 900, "rate_max_bps": 1050}
            ]
        }"#;

        let bands = EligibilityBands::from_json_str(raw).expect("bands load");
        assert_eq!(bands.offer_bands[0].min_score, 75);
        assert_eq!(bands.version, "2025-03");
    }

    #[test]
    fn malformed_json_reports_parse_error() {
        assert!(matches!(
            EligibilityBands::from_json_str("{\"version\": 3}"),
            Err(BandsLoadError::Json(_))
        ));
    }

    #[test]
    fn invalid_bands_keep_the_configuration_error_as_source() {
        let raw = r#"{
            "version": "broken",
            "eligible_min_score": 70,
            "conditional_min_score": 50,
            "offer_bands": [
                {"min_score": 75, "loan_min_pct": 80, "loan_max_pct": 100, "rate_min_bps": 900, "rate_max_bps": 1050}
            ]
        }"#;

        let error = EligibilityBands::from_json_str(raw).expect_err("no floor band");
        assert!(matches!(
            error,
            BandsLoadError::Invalid(ConfigurationError::InvalidBands(_))
        ));
        assert!(error.to_string().starts_with("eligibility bands rejected:"));
        assert!(std::error::Error::source(&error).is_some());
    }
}
