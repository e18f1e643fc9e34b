//! Header column discovery
//!
//! Columns are located by keyword rather than position because every
//! company's export orders (and names) its columns differently. Header text
//! and keywords are compared lowercased with all whitespace removed, so
//! `"Sale\nDate"` matches the keyword `"sale date"`.

use std::fmt;

use claimsheet_core::Worksheet;

use crate::config::HeaderKeywords;
use crate::error::PreprocessError;

/// How a keyword list matches a header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Every keyword must be present
    All,
    /// At least one keyword must be present
    Any,
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MatchMode::All => "all",
            MatchMode::Any => "any",
        })
    }
}

/// Lowercase and drop every whitespace character
pub(crate) fn normalize_header(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Does a normalized header satisfy the keywords under `mode`
pub(crate) fn header_matches(header: &str, keywords: &[String], mode: MatchMode) -> bool {
    let mut terms = keywords.iter().map(|k| normalize_header(k));
    match mode {
        MatchMode::All => terms.all(|k| header.contains(&k)),
        MatchMode::Any => terms.any(|k| !k.is_empty() && header.contains(&k)),
    }
}

/// Every column the preprocessing pipeline needs, resolved up front
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnLayout {
    pub vehicle: u16,
    pub occurrence: u16,
    pub rate: u16,
    pub chargeback: u16,
    pub anchor: u16,
    pub mileage: u16,
    pub sale_date: u16,
    pub repair_date: u16,
}

/// Keyword search over one header row
pub struct ColumnLocator<'a> {
    /// Normalized header text by column; blank headers are skipped
    headers: Vec<(u16, String)>,
    keywords: &'a HeaderKeywords,
}

impl<'a> ColumnLocator<'a> {
    /// Snapshot the header row of a sheet
    pub fn new(sheet: &Worksheet, header_row: u32, keywords: &'a HeaderKeywords) -> Self {
        let headers = (1..=sheet.max_col())
            .filter_map(|col| {
                let value = sheet.value_at(header_row, col);
                if value.is_blank() {
                    None
                } else {
                    Some((col, normalize_header(&value.to_string())))
                }
            })
            .collect();

        Self { headers, keywords }
    }

    /// First column, left to right, whose header matches
    pub fn find(&self, keywords: &[String], mode: MatchMode) -> Result<u16, PreprocessError> {
        self.headers
            .iter()
            .find(|(_, header)| header_matches(header, keywords, mode))
            .map(|(col, _)| *col)
            .ok_or_else(|| PreprocessError::ColumnNotFound {
                keywords: keywords.to_vec(),
                mode,
            })
    }

    /// Rate column: a two-term match first, then a looser one
    pub fn rate(&self) -> Result<u16, PreprocessError> {
        self.find(&self.keywords.rate_strict, MatchMode::All)
            .or_else(|_| self.find(&self.keywords.rate_loose, MatchMode::Any))
    }

    /// Chargeback amount column.
    ///
    /// A bare "chargeback"/"구상" would also hit the rate column, so every
    /// pass but the last requires an amount term, and the last excludes
    /// `rate_col`.
    pub fn chargeback(&self, rate_col: u16) -> Result<u16, PreprocessError> {
        let kw = self.keywords;
        self.find(&kw.chargeback_strict, MatchMode::All)
            .or_else(|_| self.find(&kw.chargeback_loose, MatchMode::Any))
            .or_else(|_| self.find(&kw.chargeback_split, MatchMode::All))
            .or_else(|err| {
                let fallback = normalize_header(&kw.chargeback_fallback);
                self.headers
                    .iter()
                    .find(|(col, header)| {
                        *col != rate_col && !fallback.is_empty() && header.contains(&fallback)
                    })
                    .map(|(col, _)| *col)
                    .ok_or(err)
            })
    }

    /// Mileage column. Some exports carry two mileage columns at different
    /// scales; the right-most one is authoritative.
    pub fn mileage(&self) -> Result<u16, PreprocessError> {
        self.headers
            .iter()
            .rev()
            .find(|(_, header)| header_matches(header, &self.keywords.mileage, MatchMode::Any))
            .map(|(col, _)| *col)
            .ok_or_else(|| PreprocessError::ColumnNotFound {
                keywords: self.keywords.mileage.clone(),
                mode: MatchMode::Any,
            })
    }

    /// Resolve every column; fails on the first one missing
    pub fn layout(&self) -> Result<ColumnLayout, PreprocessError> {
        let kw = self.keywords;
        let rate = self.rate()?;
        Ok(ColumnLayout {
            vehicle: self.find(&kw.vehicle, MatchMode::Any)?,
            occurrence: self.find(&kw.occurrence, MatchMode::Any)?,
            rate,
            chargeback: self.chargeback(rate)?,
            anchor: self.find(&kw.anchor, MatchMode::Any)?,
            mileage: self.mileage()?,
            sale_date: self.find(&kw.sale_date, MatchMode::Any)?,
            repair_date: self.find(&kw.repair_date, MatchMode::Any)?,
        })
    }
}
