//! In-memory `.xlsx` builder for tests.
//!
//! Writes the smallest workbook the decoder accepts: one sheet, inline
//! strings, no styles. Enabled with the `fixtures` feature.

use std::io::{self, Cursor, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::grid::Cell;

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const WORKBOOK: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Cartola" sheetId="1" r:id="rId1"/></sheets></workbook>"#;

const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#;

/// Build an `.xlsx` whose first sheet holds `rows` starting at A1.
pub fn xlsx_bytes(rows: &[Vec<Cell>]) -> io::Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    let parts = [
        ("[Content_Types].xml", CONTENT_TYPES.to_string()),
        ("_rels/.rels", ROOT_RELS.to_string()),
        ("xl/workbook.xml", WORKBOOK.to_string()),
        ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS.to_string()),
        ("xl/worksheets/sheet1.xml", sheet_xml(rows)),
    ];
    for (name, body) in parts {
        zip.start_file(name, options).map_err(io::Error::other)?;
        zip.write_all(body.as_bytes())?;
    }

    Ok(zip.finish().map_err(io::Error::other)?.into_inner())
}

pub fn write_xlsx(path: impl AsRef<Path>, rows: &[Vec<Cell>]) -> io::Result<()> {
    std::fs::write(path, xlsx_bytes(rows)?)
}

fn sheet_xml(rows: &[Vec<Cell>]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
    );

    for (r, row) in rows.iter().enumerate() {
        if row.iter().all(Cell::is_absent) {
            continue;
        }
        xml.push_str(&format!(r#"<row r="{}">"#, r + 1));
        for (c, cell) in row.iter().enumerate() {
            let reference = cell_ref(r, c);
            match cell {
                Cell::Absent => {}
                Cell::Text(s) => xml.push_str(&format!(
                    r#"<c r="{reference}" t="inlineStr"><is><t xml:space="preserve">{}</t></is></c>"#,
                    escape(s)
                )),
                Cell::Number(n) => xml.push_str(&format!(r#"<c r="{reference}"><v>{n}</v></c>"#)),
            }
        }
        xml.push_str("</row>");
    }

    xml.push_str("</sheetData></worksheet>");
    xml
}

/// `(0, 0)` -> `A1`, `(9, 27)` -> `AB10`
fn cell_ref(row: usize, col: usize) -> String {
    let mut letters = Vec::new();
    let mut n = col + 1;
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    format!("{}{}", String::from_utf8_lossy(&letters), row + 1)
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn text_row(values: &[&str]) -> Vec<Cell> {
    values.iter().map(|s| Cell::text(*s)).collect()
}

/// A complete three-transaction checking cartola, newest row first, with the
/// holder value pushed two columns right as in the legacy export.
pub fn sample_statement() -> Vec<Vec<Cell>> {
    vec![
        vec![],
        text_row(&["", "Banco de Chile"]),
        text_row(&["", "Cartola Histórica de Cuenta Corriente"]),
        text_row(&["", "Sr(a):", "", "Test Holder"]),
        text_row(&["", "Rut:", "11.111.111-1"]),
        text_row(&["", "Cuenta N°:", "00-123-45678-90"]),
        text_row(&["", "Moneda:", "Peso Chileno"]),
        text_row(&["", "Saldo Disponible", "", "Saldo Contable"]),
        vec![Cell::Absent, Cell::text("485.000"), Cell::Absent, Cell::from(500_000)],
        text_row(&["", "Movimientos al 15/03/2024"]),
        text_row(&[
            "",
            "Fecha",
            "Descripción",
            "Canal o Sucursal",
            "Cargos (CLP)",
            "Abonos (CLP)",
            "Saldo (CLP)",
        ]),
        vec![
            Cell::Absent,
            Cell::text("05/01/2024"),
            Cell::text("Compra Tienda X"),
            Cell::text("App"),
            Cell::from(15_000),
            Cell::Absent,
            Cell::text("485.000"),
        ],
        text_row(&["", "04/01/2024", "Traspaso De: Ana Rojas", "Internet", "", "200.000", "500.000"]),
        vec![],
        text_row(&["", "02/01/2024", "Pago Cuenta Luz", "Sucursal", "25.000", "", "300.000"]),
        text_row(&["", "Total Cargos", "", "Total Abonos"]),
        text_row(&["", "40.000", "", "200.000"]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_ref() {
        assert_eq!(cell_ref(0, 0), "A1");
        assert_eq!(cell_ref(2, 1), "B3");
        assert_eq!(cell_ref(9, 25), "Z10");
        assert_eq!(cell_ref(9, 27), "AB10");
    }

    #[test]
    fn test_bytes_start_with_zip_magic() {
        let bytes = xlsx_bytes(&sample_statement()).unwrap();
        assert!(bytes.starts_with(b"PK\x03\x04"));
    }
}
