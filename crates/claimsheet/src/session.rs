//! Interactive view backing
//!
//! A [`Session`] is what a grid widget talks to: it owns the workbook, the
//! active sheet's [`GridModel`] and the row filter, and answers display
//! requests by evaluating formulas against the overlay.

use std::path::Path;

use claimsheet_core::{CellRange, Workbook, Worksheet};
use claimsheet_formula::{AllRowsVisible, CellSource, FormulaEvaluator, RowVisibility};

use crate::config::PreprocessConfig;
use crate::display::{format_display, parse_user_input};
use crate::error::{Error, PreprocessError, Result};
use crate::filter::{unique_values, FilteredRows, RowFilter};
use crate::grid::{EditableColumns, GridModel, GridView};
use crate::preprocess::{preprocess, PreprocessReport};
use crate::task::BackgroundTask;
use crate::WorkbookExt;

/// A loaded workbook with one active, editable sheet
#[derive(Debug)]
pub struct Session {
    workbook: Workbook,
    config: PreprocessConfig,
    sheet_index: usize,
    model: GridModel,
    filter: RowFilter,
    visible: FilteredRows,
}

impl Session {
    /// Open the configured sheet
    pub fn new(workbook: Workbook, config: PreprocessConfig) -> Result<Self> {
        let index = config.sheet_index;
        Self::with_sheet(workbook, config, index)
    }

    /// Open a specific sheet
    pub fn with_sheet(workbook: Workbook, config: PreprocessConfig, index: usize) -> Result<Self> {
        let sheet = workbook
            .worksheet(index)
            .ok_or(PreprocessError::SheetNotFound(index))?;
        let model = build_model(sheet, &config);
        Ok(Self {
            workbook,
            config,
            sheet_index: index,
            model,
            filter: RowFilter::new(),
            visible: FilteredRows::default(),
        })
    }

    /// Load a file and open the configured sheet
    pub fn open<P: AsRef<Path>>(path: P, config: PreprocessConfig) -> Result<Self> {
        Self::new(Workbook::open(path)?, config)
    }

    pub fn workbook(&self) -> &Workbook {
        &self.workbook
    }

    pub fn config(&self) -> &PreprocessConfig {
        &self.config
    }

    pub fn sheet_index(&self) -> usize {
        self.sheet_index
    }

    pub fn model(&self) -> &GridModel {
        &self.model
    }

    pub fn set_edit_all(&mut self, edit_all: bool) {
        self.model.set_edit_all(edit_all);
    }

    /// Flush edits into the current sheet and switch to another one.
    /// The new sheet starts with no overlay, history or filter.
    pub fn switch_sheet(&mut self, index: usize) -> Result<()> {
        if self.workbook.worksheet(index).is_none() {
            return Err(PreprocessError::SheetNotFound(index).into());
        }
        self.apply_dirty()?;
        self.sheet_index = index;
        self.filter.clear();
        self.rebuild_model()
    }

    /// Edit a cell from typed text. False when the edit is refused.
    pub fn set_cell(&mut self, row: u32, col: u16, raw: &str) -> bool {
        let value = parse_user_input(raw);
        let accepted = match self.workbook.worksheet(self.sheet_index) {
            Some(sheet) => self.model.set(sheet, row, col, value),
            None => false,
        };
        if accepted {
            self.refresh_filter();
        }
        accepted
    }

    /// Text shown for a cell: formulas evaluated under the active filter
    pub fn display_value(&self, row: u32, col: u16) -> String {
        match self.workbook.worksheet(self.sheet_index) {
            Some(sheet) => render(sheet, &self.model, &self.visible, row, col),
            None => String::new(),
        }
    }

    /// Whether a cell carries an edit not yet saved
    pub fn is_dirty(&self, row: u32, col: u16) -> bool {
        self.model.is_dirty(row, col)
    }

    pub fn undo(&mut self) -> Option<CellRange> {
        let range = self.model.undo();
        if range.is_some() {
            self.refresh_filter();
        }
        range
    }

    pub fn redo(&mut self) -> Option<CellRange> {
        let range = self.model.redo();
        if range.is_some() {
            self.refresh_filter();
        }
        range
    }

    /// Be told which region to repaint after every edit, undo or redo
    pub fn subscribe<F: FnMut(CellRange) + 'static>(&mut self, observer: F) {
        self.model.subscribe(observer);
    }

    /// Copy pending edits into the workbook
    pub fn apply_dirty(&mut self) -> Result<()> {
        let sheet = self
            .workbook
            .worksheet_mut(self.sheet_index)
            .ok_or(PreprocessError::SheetNotFound(self.sheet_index))?;
        self.model.apply_dirty_to_sheet(sheet)?;
        Ok(())
    }

    /// Flush edits and write the workbook
    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.apply_dirty()?;
        self.workbook.save(path)
    }

    /// Flush edits, preprocess, and rebuild the grid over the result
    pub fn preprocess(&mut self) -> Result<PreprocessReport> {
        self.apply_dirty()?;
        let report = preprocess(&mut self.workbook, &self.config)?;
        self.rebuild_model()?;
        Ok(report)
    }

    /// Hand the workbook to a worker thread for preprocessing.
    ///
    /// Edits are flushed first. The session is consumed so nothing can touch
    /// the grid until [`PendingPreprocess::join`] hands back a new one.
    pub fn into_background_preprocess(mut self) -> Result<PendingPreprocess> {
        self.apply_dirty()?;
        let observers = self.model.take_observers();
        let Session {
            workbook,
            config,
            sheet_index,
            ..
        } = self;

        let task = BackgroundTask::spawn("claimsheet-preprocess", move || {
            let mut workbook = workbook;
            let report = preprocess(&mut workbook, &config);
            Ok((workbook, config, report))
        })?;

        Ok(PendingPreprocess {
            task,
            sheet_index,
            observers,
        })
    }

    /// Replace the row filter
    pub fn set_filter(&mut self, filter: RowFilter) {
        self.filter = filter;
        self.refresh_filter();
    }

    pub fn filter(&self) -> &RowFilter {
        &self.filter
    }

    /// Rows the active filter hides
    pub fn filtered_rows(&self) -> &FilteredRows {
        &self.visible
    }

    /// Distinct display values of a column below the header
    pub fn column_values(&self, col: u16) -> Vec<String> {
        let Some(sheet) = self.workbook.worksheet(self.sheet_index) else {
            return Vec::new();
        };
        let (last_row, _) = view_extent(sheet, &self.model);
        let first_row = self.model.header_row() + 1;
        unique_values(
            (first_row..=last_row).map(|row| render(sheet, &self.model, &AllRowsVisible, row, col)),
        )
    }

    fn rebuild_model(&mut self) -> Result<()> {
        let sheet = self
            .workbook
            .worksheet(self.sheet_index)
            .ok_or(PreprocessError::SheetNotFound(self.sheet_index))?;
        let observers = self.model.take_observers();
        self.model = build_model(sheet, &self.config);
        self.model.restore_observers(observers);
        self.refresh_filter();
        Ok(())
    }

    /// Re-evaluate the filter. Cells are rendered with every row visible so
    /// SUBTOTAL cells do not depend on the filter being computed.
    fn refresh_filter(&mut self) {
        if self.filter.is_empty() {
            self.visible = FilteredRows::default();
            return;
        }
        let Some(sheet) = self.workbook.worksheet(self.sheet_index) else {
            return;
        };
        let (last_row, last_col) = view_extent(sheet, &self.model);
        let model = &self.model;
        self.visible = self.filter.apply(model.header_row() + 1, last_row, last_col, |row, col| {
            render(sheet, model, &AllRowsVisible, row, col)
        });
        log::debug!("filter hides {} row(s)", self.visible.hidden_count());
    }
}

fn build_model(sheet: &Worksheet, config: &PreprocessConfig) -> GridModel {
    let editable = EditableColumns::discover(sheet, config.header_row, &config.keywords.editable);
    GridModel::new(sheet, config.header_row, editable)
}

fn view_extent(sheet: &Worksheet, model: &GridModel) -> (u32, u16) {
    GridView::new(sheet, model)
        .extent()
        .unwrap_or((sheet.max_row(), sheet.max_col()))
}

fn render(
    sheet: &Worksheet,
    model: &GridModel,
    visibility: &dyn RowVisibility,
    row: u32,
    col: u16,
) -> String {
    let view = GridView::new(sheet, model);
    let evaluator = FormulaEvaluator::new(&view, visibility);
    let value = evaluator.display(&model.get(sheet, row, col));
    format_display(&value).trim().to_string()
}

/// A preprocessing run in progress on a worker thread
pub struct PendingPreprocess {
    task: BackgroundTask<(
        Workbook,
        PreprocessConfig,
        std::result::Result<PreprocessReport, PreprocessError>,
    )>,
    sheet_index: usize,
    observers: Vec<Box<dyn FnMut(CellRange)>>,
}

impl std::fmt::Debug for PendingPreprocess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingPreprocess")
            .field("task", &self.task.name())
            .field("sheet_index", &self.sheet_index)
            .finish()
    }
}

/// A finished background run: the reattached session and the run's result
#[derive(Debug)]
pub struct PreprocessOutcome {
    pub session: Session,
    pub report: Result<PreprocessReport>,
}

impl PendingPreprocess {
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the worker and reattach a session to its workbook.
    ///
    /// A preprocessing failure still returns the session; only a panicked
    /// worker loses the workbook.
    pub fn join(self) -> Result<PreprocessOutcome> {
        let (workbook, config, report) = self.task.join()?;
        let mut session = Session::with_sheet(workbook, config, self.sheet_index)?;
        session.model.restore_observers(self.observers);
        Ok(PreprocessOutcome {
            session,
            report: report.map_err(Error::from),
        })
    }
}
