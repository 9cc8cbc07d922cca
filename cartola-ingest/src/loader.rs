//! Spreadsheet loading with content-based format detection.
//!
//! Banks hand out `.xls` files that are really `.xlsx` and vice versa, so the
//! decoder is picked from the first bytes of the file, never from its name.

use calamine::{Data, Range, Reader, Xls, Xlsx};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{Cursor, Read, Seek};
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

use crate::error::FormatError;
use crate::grid::{Cell, Grid};

/// Leading bytes of every ZIP container. Only the first two are checked.
const ZIP_MAGIC: [u8; 2] = *b"PK";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpreadsheetKind {
    /// Office Open XML workbook (zip container)
    Xlsx,
    /// Legacy BIFF workbook in a compound binary file
    Xls,
}

impl fmt::Display for SpreadsheetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpreadsheetKind::Xlsx => f.write_str("xlsx"),
            SpreadsheetKind::Xls => f.write_str("xls"),
        }
    }
}

pub fn sniff_bytes(bytes: &[u8]) -> SpreadsheetKind {
    if bytes.starts_with(&ZIP_MAGIC) {
        SpreadsheetKind::Xlsx
    } else {
        SpreadsheetKind::Xls
    }
}

/// Read only the signature bytes of `path`.
pub fn sniff(path: impl AsRef<Path>) -> Result<SpreadsheetKind, FormatError> {
    let path = path.as_ref();
    let open_err = |source| FormatError::Open {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(open_err)?;
    let mut signature = Vec::with_capacity(ZIP_MAGIC.len());
    file.take(ZIP_MAGIC.len() as u64)
        .read_to_end(&mut signature)
        .map_err(open_err)?;

    Ok(sniff_bytes(&signature))
}

/// Load the first worksheet of a spreadsheet file.
pub fn load(path: impl AsRef<Path>) -> Result<Grid, FormatError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| FormatError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), size = bytes.len(), "loading spreadsheet");
    load_bytes(&bytes)
}

pub fn load_bytes(bytes: &[u8]) -> Result<Grid, FormatError> {
    let kind = sniff_bytes(bytes);
    let decode_err = |message: String| FormatError::Decode { kind, message };

    let range = match kind {
        SpreadsheetKind::Xlsx => {
            let mut workbook: Xlsx<_> =
                Xlsx::new(Cursor::new(bytes)).map_err(|e| decode_err(e.to_string()))?;
            first_sheet(&mut workbook, kind)?
        }
        SpreadsheetKind::Xls => {
            let mut workbook: Xls<_> =
                Xls::new(Cursor::new(bytes)).map_err(|e| decode_err(e.to_string()))?;
            first_sheet(&mut workbook, kind)?
        }
    };

    let grid = to_grid(&range);
    debug!(%kind, rows = grid.height(), cols = grid.width(), "decoded worksheet");
    Ok(grid)
}

fn first_sheet<R, RS>(workbook: &mut R, kind: SpreadsheetKind) -> Result<Range<Data>, FormatError>
where
    R: Reader<RS>,
    R::Error: fmt::Display,
    RS: Read + Seek,
{
    workbook
        .worksheet_range_at(0)
        .ok_or(FormatError::NoWorksheet { kind })?
        .map_err(|e| FormatError::Decode {
            kind,
            message: e.to_string(),
        })
}

/// Place every cell at its absolute sheet position (A1 = (0, 0)).
fn to_grid(range: &Range<Data>) -> Grid {
    let Some((row0, col0)) = range.start() else {
        return Grid::default();
    };
    let (row0, col0) = (row0 as usize, col0 as usize);
    let (height, width) = range.get_size();

    let mut grid = Grid::with_size(row0 + height, col0 + width);
    for (r, row) in range.rows().enumerate() {
        for (c, data) in row.iter().enumerate() {
            grid.set(row0 + r, col0 + c, to_cell(data));
        }
    }
    grid
}

fn to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Absent,
        Data::String(s) => Cell::text(s.as_str()),
        Data::Int(i) => Cell::Number(Decimal::from(*i)),
        Data::Float(f) => float_cell(*f),
        Data::Bool(b) => Cell::Text(b.to_string()),
        // Date-typed cells become DD/MM/YYYY text, the layout the statement prints
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(ts) => Cell::Text(ts.date().format("%d/%m/%Y").to_string()),
            None => float_cell(dt.as_f64()),
        },
        Data::DateTimeIso(s) => s
            .get(..10)
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            .map(|d| Cell::Text(d.format("%d/%m/%Y").to_string()))
            .unwrap_or_else(|| Cell::text(s.as_str())),
        Data::DurationIso(s) => Cell::text(s.as_str()),
        Data::Error(e) => Cell::Text(e.to_string()),
    }
}

/// Convert through the float's shortest text form so `1500.0` becomes
/// exactly `1500` instead of its binary expansion.
fn float_cell(f: f64) -> Cell {
    Decimal::from_str(&f.to_string())
        .or_else(|_| Decimal::try_from(f))
        .map(Cell::Number)
        .unwrap_or_else(|_| Cell::Text(f.to_string()))
}
