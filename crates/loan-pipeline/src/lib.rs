//! Lead lifecycle and eligibility rules engine for education loan origination.
//!
//! The engine is a library boundary: persistence, notification delivery, the AI
//! document classifier and the lender/university directories are consumed through
//! the traits exported from [`workflows`].

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
