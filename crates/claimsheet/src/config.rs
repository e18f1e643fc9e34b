//! Preprocessing configuration
//!
//! Thresholds, sheet layout and the header vocabulary used to locate columns.
//! Every field has a default matching the claims tool, so a partial config
//! file only needs to name what differs.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Thresholds and layout for one preprocessing run
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct PreprocessConfig {
    /// 0-based index of the sheet to process
    pub sheet_index: usize,
    /// 1-based header row
    pub header_row: u32,
    /// First row that may hold data
    pub data_start_row: u32,
    /// Mileage at or above this zeroes the rate
    pub mileage_threshold: i64,
    /// Warranty period in years
    pub warranty_years: f64,
    /// Consecutive blank anchor cells that end the data region
    pub empty_run: u32,
    /// Header keywords for each column finder
    pub keywords: HeaderKeywords,
    /// Labels written beside the SUM rows
    pub labels: SummaryLabels,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            sheet_index: 0,
            header_row: 3,
            data_start_row: 4,
            mileage_threshold: 50_000,
            warranty_years: 2.0,
            empty_run: 30,
            keywords: HeaderKeywords::default(),
            labels: SummaryLabels::default(),
        }
    }
}

impl PreprocessConfig {
    /// Warranty period in whole days (`years * 365`, truncated)
    pub fn warranty_days(&self) -> i64 {
        (self.warranty_years * 365.0).trunc() as i64
    }

    /// Row that receives the SUBTOTAL cells, if there is one above the header
    pub fn subtotal_row(&self) -> Option<u32> {
        self.header_row.checked_sub(1).filter(|r| *r > 0)
    }
}

/// Header vocabulary. Matching ignores case and whitespace.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct HeaderKeywords {
    /// Column whose merged cells are expanded (any)
    pub vehicle: Vec<String>,
    /// Occurrence amount (any)
    pub occurrence: Vec<String>,
    /// Rate column, strict pass (all)
    pub rate_strict: Vec<String>,
    /// Rate column, loose pass (any)
    pub rate_loose: Vec<String>,
    /// Chargeback amount, English pass (all)
    pub chargeback_strict: Vec<String>,
    /// Chargeback amount, single-term pass (any)
    pub chargeback_loose: Vec<String>,
    /// Chargeback amount, split-term pass (all)
    pub chargeback_split: Vec<String>,
    /// Last resort: any header with this term that is not the rate column
    pub chargeback_fallback: String,
    /// Mileage candidates; the right-most match wins
    pub mileage: Vec<String>,
    /// Sale date (any)
    pub sale_date: Vec<String>,
    /// Repair date (any)
    pub repair_date: Vec<String>,
    /// Column deciding whether a row is real data (any)
    pub anchor: Vec<String>,
    /// Groups of terms marking user-editable columns
    pub editable: Vec<Vec<String>>,
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Default for HeaderKeywords {
    fn default() -> Self {
        Self {
            vehicle: words(&["vehicle", "차계"]),
            occurrence: words(&["total cost", "발생", "발생금액", "occurrence"]),
            rate_strict: words(&["liability", "ratio"]),
            rate_loose: words(&["구상율", "rate"]),
            chargeback_strict: words(&["chargeback", "amount"]),
            chargeback_loose: words(&["구상금액"]),
            chargeback_split: words(&["구상", "금액"]),
            chargeback_fallback: "chargeback".to_string(),
            mileage: words(&["주행", "mileage"]),
            sale_date: words(&["sale date", "판매일", "sale"]),
            repair_date: words(&["repair date", "수리일자", "repair"]),
            anchor: words(&["repair date", "수리일자", "repair"]),
            editable: vec![
                words(&["구상", "율"]),
                words(&["chargeback", "rate"]),
                words(&["liability", "ratio"]),
            ],
        }
    }
}

/// Labels placed one column left of the SUM totals
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct SummaryLabels {
    pub occurrence: String,
    pub chargeback: String,
}

impl Default for SummaryLabels {
    fn default() -> Self {
        Self {
            occurrence: "발생금액".to_string(),
            chargeback: "구상금액".to_string(),
        }
    }
}
