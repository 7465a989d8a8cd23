//! Lender recommendation grouping, verdicts and the acceptance contract.

pub mod acceptance;
pub mod directory;
pub mod domain;
pub mod grouping;

#[cfg(test)]
mod tests;

pub use acceptance::{
    AcceptanceDesk, AcceptanceStore, AcceptanceStoreError, RecommendationSet, SelectionError,
    REVIEW_CONFIDENCE_THRESHOLD,
};
pub use directory::{CsvLenderDirectory, LenderDirectory, LenderDirectoryError};
pub use domain::{
    verdict_of, AcceptanceMode, AcceptanceRecord, Lender, LenderEvaluation, LenderFilter,
    LenderGroup, LenderId, ProbabilityBand, Verdict,
};
pub use grouping::{LenderGroups, LenderRecommendationGrouper};
