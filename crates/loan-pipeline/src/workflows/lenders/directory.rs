use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Deserializer};

use super::domain::{Lender, LenderFilter, LenderId};

/// Read access to the lending partner directory.
pub trait LenderDirectory: Send + Sync {
    fn list_active(&self, filter: &LenderFilter) -> Result<Vec<Lender>, LenderDirectoryError>;

    fn count_active(&self, filter: &LenderFilter) -> Result<u32, LenderDirectoryError> {
        let lenders = self.list_active(filter)?;
        Ok(u32::try_from(lenders.len()).unwrap_or(u32::MAX))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LenderDirectoryError {
    #[error("failed to read lender export: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid lender CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("lender {lender_id} rejected: {reason}")]
    InvalidRow { lender_id: String, reason: String },
    #[error("lender directory unavailable: {0}")]
    Unavailable(String),
}

/// Directory loaded once from a CRM export.
///
/// Expected columns: `Lender ID, Name, Countries, Min Amount, Max Amount, Active`.
/// Countries are separated by `;` or `|`.
#[derive(Debug, Clone, Default)]
pub struct CsvLenderDirectory {
    lenders: Vec<Lender>,
}

impl CsvLenderDirectory {
    pub fn from_path(path: &Path) -> Result<Self, LenderDirectoryError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, LenderDirectoryError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut lenders = Vec::new();

        for record in csv_reader.deserialize::<LenderRow>() {
            let row = record?;
            if row.min_amount > row.max_amount {
                return Err(LenderDirectoryError::InvalidRow {
                    lender_id: row.lender_id,
                    reason: format!(
                        "minimum amount {} exceeds maximum {}",
                        row.min_amount, row.max_amount
                    ),
                });
            }

            lenders.push(Lender {
                id: LenderId(row.lender_id),
                name: row.name,
                countries: split_countries(&row.countries),
                min_amount: row.min_amount,
                max_amount: row.max_amount,
                active: row.active,
            });
        }

        Ok(Self { lenders })
    }

    pub fn len(&self) -> usize {
        self.lenders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lenders.is_empty()
    }
}

impl LenderDirectory for CsvLenderDirectory {
    fn list_active(&self, filter: &LenderFilter) -> Result<Vec<Lender>, LenderDirectoryError> {
        Ok(self
            .lenders
            .iter()
            .filter(|lender| lender.serves(filter))
            .cloned()
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct LenderRow {
    #[serde(rename = "Lender ID")]
    lender_id: String,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Countries", default)]
    countries: String,
    #[serde(rename = "Min Amount")]
    min_amount: u64,
    #[serde(rename = "Max Amount")]
    max_amount: u64,
    #[serde(rename = "Active", deserialize_with = "yes_no")]
    active: bool,
}

fn split_countries(raw: &str) -> Vec<String> {
    raw.split(|c| c == ';' || c == '|')
        .map(str::trim)
        .filter(|country| !country.is_empty())
        .map(str::to_string)
        .collect()
}

fn yes_no<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "yes" | "y" | "true" | "1" | "active" => Ok(true),
        "no" | "n" | "false" | "0" | "inactive" | "" => Ok(false),
        other => Err(serde::de::Error::custom(format!(
            "unrecognised Active value '{other}'"
        ))),
    }
}
