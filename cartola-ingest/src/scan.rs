//! Label scanning over a [`Grid`].
//!
//! Statement vintages move labels up and down and push values sideways
//! (merged cells differ between xls and xlsx exports), so nothing here relies
//! on absolute positions except the label column itself.

use tracing::{debug, warn};

use crate::error::ExtractionError;
use crate::grid::{Cell, Grid};

/// Column every statement label lives in.
pub const LABEL_COLUMN: usize = 1;

/// First row (top to bottom) whose trimmed text in `col` starts with `label`.
pub fn find_label_row(grid: &Grid, col: usize, label: &str) -> Option<usize> {
    (0..grid.height()).find(|&row| starts_with(grid.get(row, col), label))
}

/// First column (left to right) in `row` whose trimmed text starts with `prefix`.
pub fn find_header_column(grid: &Grid, row: usize, prefix: &str) -> Option<usize> {
    (0..grid.width()).find(|&col| starts_with(grid.get(row, col), prefix))
}

/// First non-empty column strictly right of `label_col`, else `label_col + 1`.
pub fn first_value_column(grid: &Grid, row: usize, label_col: usize) -> usize {
    (label_col + 1..grid.width())
        .find(|&col| !grid.get(row, col).is_absent())
        .unwrap_or(label_col + 1)
}

fn starts_with(cell: &Cell, prefix: &str) -> bool {
    cell.as_text()
        .is_some_and(|text| text.trim().starts_with(prefix))
}

/// A label whose value sits on the same row, somewhere to its right.
#[derive(Debug, Clone, Copy)]
pub struct InlineLabel {
    pub label: &'static str,
    pub missing: ExtractionError,
}

impl InlineLabel {
    pub const fn new(label: &'static str, missing: ExtractionError) -> Self {
        Self { label, missing }
    }

    pub fn row(&self, grid: &Grid) -> Result<usize, ExtractionError> {
        let row = find_label_row(grid, LABEL_COLUMN, self.label).ok_or(self.missing)?;
        debug!(label = self.label, row, "label found");
        Ok(row)
    }

    pub fn value<'g>(&self, grid: &'g Grid) -> Result<&'g Cell, ExtractionError> {
        let row = self.row(grid)?;
        Ok(grid.get(row, first_value_column(grid, row, LABEL_COLUMN)))
    }

    /// Text of [`InlineLabel::value`]; an empty value resolves to `""`.
    pub fn text(&self, grid: &Grid) -> Result<String, ExtractionError> {
        Ok(self.value(grid)?.as_text().unwrap_or_default())
    }
}

/// A header row whose two values sit on the row right below it.
///
/// The first value is always under the label column. The second is under
/// wherever `secondary` appears in the header row, or under `fallback` when
/// that text is missing.
#[derive(Debug, Clone, Copy)]
pub struct BlockLabel {
    pub label: &'static str,
    pub secondary: &'static str,
    pub fallback: usize,
    pub missing: ExtractionError,
}

impl BlockLabel {
    pub const fn new(
        label: &'static str,
        secondary: &'static str,
        fallback: usize,
        missing: ExtractionError,
    ) -> Self {
        Self {
            label,
            secondary,
            fallback,
            missing,
        }
    }

    pub fn values<'g>(&self, grid: &'g Grid) -> Result<(&'g Cell, &'g Cell), ExtractionError> {
        let header = find_label_row(grid, LABEL_COLUMN, self.label).ok_or(self.missing)?;
        let second = find_header_column(grid, header, self.secondary).unwrap_or_else(|| {
            warn!(
                label = self.secondary,
                header,
                fallback = self.fallback,
                "secondary header not found, using fallback column"
            );
            self.fallback
        });
        debug!(label = self.label, header, second, "block label found");

        let values = header + 1;
        Ok((grid.get(values, LABEL_COLUMN), grid.get(values, second)))
    }
}
