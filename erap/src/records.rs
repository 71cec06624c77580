//! Payment rows from the weekly CSV drop.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// One ZIP code's aggregate payments.
///
/// `zip5` and `Count_` stay text so leading zeros and blank counts survive
/// the trip to the feature layer unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub zip5: String,
    #[serde(rename = "Count_")]
    pub count: String,
    #[serde(rename = "Amount")]
    pub amount: f64,
    #[serde(rename = "Updated")]
    pub updated: String,
}

pub fn read_payments(path: &Path) -> Result<Vec<PaymentRecord>> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    parse_payments(file).with_context(|| format!("read payments from {}", path.display()))
}

/// Parse payment rows from any CSV source with a header line.
///
/// Extra columns are ignored; a missing column or an unparsable amount fails
/// with the 1-based data row number.
pub fn parse_payments(source: impl Read) -> Result<Vec<PaymentRecord>> {
    let mut reader = csv::Reader::from_reader(source);
    let mut records = Vec::new();
    for (index, row) in reader.deserialize().enumerate() {
        let record: PaymentRecord = row.with_context(|| format!("parse row {}", index + 1))?;
        records.push(record);
    }
    Ok(records)
}
