pub mod documents;
pub mod eligibility;
pub mod leads;
pub mod lenders;
