//! Preprocessing entry point

use claimsheet_core::Workbook;

use crate::columns::{ColumnLayout, ColumnLocator};
use crate::config::PreprocessConfig;
use crate::error::PreprocessError;
use crate::guard::PreprocessGuard;
use crate::normalize::MergedColumnNormalizer;
use crate::region::DataRegionDetector;
use crate::synthesize::{FormulaColumns, FormulaSynthesizer};
use crate::warranty::{ChangedRowSet, WarrantyColumns, WarrantyEvaluator};

/// What one preprocessing run found and changed
#[derive(Debug, Clone, PartialEq)]
pub struct PreprocessReport {
    pub layout: ColumnLayout,
    /// Last row of the detected data region
    pub last_row: u32,
    /// Rows with a non-blank anchor cell, ascending
    pub data_rows: Vec<u32>,
    /// Rows whose rate was zeroed
    pub changed_rows: ChangedRowSet,
}

/// Run the one-shot transform on the configured sheet.
///
/// The marker check, sheet lookup and every column lookup happen before the
/// first write, so an error leaves the workbook untouched. The workbook is
/// marked even when the data region turns out to be empty.
pub fn preprocess(
    workbook: &mut Workbook,
    config: &PreprocessConfig,
) -> Result<PreprocessReport, PreprocessError> {
    if PreprocessGuard::is_preprocessed(workbook) {
        return Err(PreprocessError::AlreadyPreprocessed);
    }

    let sheet = workbook
        .worksheet_mut(config.sheet_index)
        .ok_or(PreprocessError::SheetNotFound(config.sheet_index))?;

    let layout = ColumnLocator::new(sheet, config.header_row, &config.keywords).layout()?;
    log::debug!("column layout on '{}': {:?}", sheet.name(), layout);

    let last_row = DataRegionDetector::new(sheet, layout.anchor)
        .guess_last_row(config.data_start_row, config.empty_run);

    let expanded = MergedColumnNormalizer::new(layout.vehicle, config.data_start_row, last_row)
        .normalize(sheet)?;
    if expanded > 0 {
        log::debug!("expanded {} merged region(s) in column {}", expanded, layout.vehicle);
    }

    let data_rows = DataRegionDetector::new(sheet, layout.anchor)
        .data_rows(config.data_start_row, last_row);
    log::info!(
        "data region rows {}..={}: {} data row(s)",
        config.data_start_row,
        last_row,
        data_rows.len()
    );

    let mut changed_rows = ChangedRowSet::new();
    if !data_rows.is_empty() {
        let merges = sheet.merge_index();
        changed_rows = WarrantyEvaluator::new(config.mileage_threshold, config.warranty_days())
            .evaluate(
                sheet,
                &merges,
                &data_rows,
                WarrantyColumns {
                    mileage: layout.mileage,
                    sale_date: layout.sale_date,
                    repair_date: layout.repair_date,
                    rate: layout.rate,
                },
            )?;
        log::info!("zeroed the rate on {} row(s)", changed_rows.len());

        let synthesizer = FormulaSynthesizer::new(
            FormulaColumns {
                occurrence: layout.occurrence,
                rate: layout.rate,
                chargeback: layout.chargeback,
            },
            &config.labels,
        );
        synthesizer.write_row_formulas(sheet, &data_rows)?;
        synthesizer.write_totals(sheet, &data_rows)?;
        if let Some(row) = config.subtotal_row() {
            synthesizer.write_subtotals(sheet, row, &data_rows)?;
        }
    }

    PreprocessGuard::mark(workbook)?;

    Ok(PreprocessReport {
        layout,
        last_row,
        data_rows,
        changed_rows,
    })
}
