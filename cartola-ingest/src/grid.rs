//! Untyped cell grid produced by the loader.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single spreadsheet cell.
///
/// Numeric cells stay numeric so amount parsing can tell a raw number from a
/// formatted string like `"1.234.567"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cell {
    #[default]
    Absent,
    Text(String),
    Number(Decimal),
}

static ABSENT: Cell = Cell::Absent;

impl Cell {
    /// Text cell; blank or whitespace-only text counts as absent.
    pub fn text(s: impl Into<String>) -> Self {
        let s = s.into();
        if s.trim().is_empty() {
            Cell::Absent
        } else {
            Cell::Text(s)
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Cell::Absent)
    }

    /// String form of the cell. Numbers render without trailing zeros.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Absent => None,
            Cell::Text(s) => Some(s.clone()),
            Cell::Number(n) => Some(n.normalize().to_string()),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::text(s)
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::text(s)
    }
}

impl From<i64> for Cell {
    fn from(n: i64) -> Self {
        Cell::Number(Decimal::from(n))
    }
}

impl From<Decimal> for Cell {
    fn from(n: Decimal) -> Self {
        Cell::Number(n)
    }
}

/// Rows x columns, 0-indexed from the sheet's A1 cell. Reads outside the
/// populated area yield [`Cell::Absent`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    rows: Vec<Vec<Cell>>,
    width: usize,
}

impl Grid {
    /// Build a grid from ragged rows; width is the longest row.
    pub fn from_rows(rows: Vec<Vec<Cell>>) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        Self { rows, width }
    }

    pub(crate) fn with_size(height: usize, width: usize) -> Self {
        Self {
            rows: vec![vec![Cell::Absent; width]; height],
            width,
        }
    }

    pub(crate) fn set(&mut self, row: usize, col: usize, cell: Cell) {
        if let Some(slot) = self.rows.get_mut(row).and_then(|r| r.get_mut(col)) {
            *slot = cell;
        }
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// `(height, width)`
    pub fn dimensions(&self) -> (usize, usize) {
        (self.height(), self.width)
    }

    pub fn get(&self, row: usize, col: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&ABSENT)
    }

    pub fn text(&self, row: usize, col: usize) -> Option<String> {
        self.get(row, col).as_text()
    }

    /// Cells of one row, empty when out of range.
    pub fn row(&self, row: usize) -> &[Cell] {
        self.rows.get(row).map(Vec::as_slice).unwrap_or(&[])
    }
}
