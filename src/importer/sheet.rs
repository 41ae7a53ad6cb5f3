//! Spreadsheet decoding.
//!
//! Expected headers: `CODIGO`, `CLAVE_PROV`, `DESCRIPCION`, `CATEGORIA`,
//! `STOCK`, `MINIMO`. Header matching ignores case and surrounding spaces.
//! Rows without description or category are skipped and reported rather than
//! rejected; malformed numbers reject the whole sheet.

use super::{RawRow, parse_whole_number};
use crate::{
    config::settings::InventoryConfig,
    core::import::{SheetImport, SheetRow},
    entities::Category,
    errors::{Error, Result},
};
use calamine::{Reader, Xlsx};
use std::collections::HashMap;
use std::io::Cursor;
use tracing::{debug, warn};

/// Canonical code column
pub const COL_CODE: &str = "CODIGO";
/// Supplier alias column
pub const COL_SUPPLIER_CODE: &str = "CLAVE_PROV";
/// Description column
pub const COL_DESCRIPTION: &str = "DESCRIPCION";
/// Category column
pub const COL_CATEGORY: &str = "CATEGORIA";
/// Initial stock column
pub const COL_STOCK: &str = "STOCK";
/// Reorder threshold column
pub const COL_MIN_STOCK: &str = "MINIMO";

/// Reads the first worksheet of an `.xlsx` file into header-keyed rows.
///
/// The first used row holds the headers. Completely blank rows are dropped
/// but keep the numbering of the rows after them, so every record carries
/// the row number shown by the spreadsheet.
///
/// # Errors
/// Returns [`Error::Parse`] if the bytes are not a readable workbook or the
/// first sheet has no header row.
pub fn decode_xlsx(bytes: &[u8]) -> Result<Vec<RawRow>> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes.to_vec()))
        .map_err(|e| Error::parse(format!("Not a readable .xlsx file: {e}")))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| Error::parse("Workbook has no worksheets"))?;
    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| Error::parse(format!("Cannot read sheet '{sheet_name}': {e}")))?;

    // Ranges begin at the first used cell, not at sheet row 1.
    let first_row = range.start().map_or(0, |(row, _)| row as usize);
    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .ok_or_else(|| Error::parse(format!("Sheet '{sheet_name}' is empty")))?
        .iter()
        .map(|cell| cell.to_string().trim().to_string())
        .collect();

    let mut records = Vec::new();
    for (index, data_row) in rows.enumerate() {
        let values: HashMap<String, String> = headers
            .iter()
            .zip(data_row.iter())
            .filter(|(header, _)| !header.is_empty())
            .map(|(header, cell)| (header.clone(), cell.to_string().trim().to_string()))
            .collect();

        if values.values().all(String::is_empty) {
            continue;
        }
        records.push(RawRow {
            row_number: first_row + index + 2,
            values,
        });
    }

    debug!("Decoded {} row(s) from sheet '{sheet_name}'", records.len());
    Ok(records)
}

/// Numbers header-keyed rows submitted without positions, as if row 1 held
/// the headers.
#[must_use]
pub fn number_rows(rows: Vec<HashMap<String, String>>) -> Vec<RawRow> {
    rows.into_iter()
        .enumerate()
        .map(|(index, values)| RawRow {
            row_number: index + 2,
            values,
        })
        .collect()
}

fn cell<'a>(row: &'a RawRow, header: &str) -> Option<&'a str> {
    row.values
        .iter()
        .find(|(key, _)| key.trim().eq_ignore_ascii_case(header))
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}

fn count(row: &RawRow, header: &str, blank: i32) -> Result<i32> {
    let Some(raw) = cell(row, header) else {
        return Ok(blank);
    };
    parse_whole_number(raw)
        .and_then(|n| i32::try_from(n).ok())
        .filter(|n| *n >= 0)
        .ok_or_else(|| {
            Error::validation(format!(
                "Row {}: {header} value '{raw}' is not a whole number of units",
                row.row_number
            ))
        })
}

/// Validates raw rows into an import batch.
///
/// # Errors
/// Returns [`Error::Validation`] naming the row of the first unparsable
/// `STOCK` or `MINIMO` value.
pub fn rows_from_records(records: &[RawRow], config: &InventoryConfig) -> Result<SheetImport> {
    let mut sheet = SheetImport::default();

    for record in records {
        let (Some(description), Some(category_label)) =
            (cell(record, COL_DESCRIPTION), cell(record, COL_CATEGORY))
        else {
            debug!("Skipping row {}: missing description or category", record.row_number);
            sheet.skipped_rows.push(record.row_number);
            continue;
        };

        let category = Category::from_label(category_label).unwrap_or_else(|| {
            warn!(
                "Row {}: unknown category '{category_label}', using {}",
                record.row_number, config.default_category
            );
            config.default_category
        });

        sheet.rows.push(SheetRow {
            row_number: record.row_number,
            code: cell(record, COL_CODE).map(str::to_string),
            supplier_code: cell(record, COL_SUPPLIER_CODE).map(str::to_string),
            description: description.to_string(),
            category,
            stock: count(record, COL_STOCK, 0)?,
            min_stock: count(record, COL_MIN_STOCK, config.default_min_stock)?,
        });
    }

    Ok(sheet)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    fn row(row_number: usize, cells: &[(&str, &str)]) -> RawRow {
        RawRow {
            row_number,
            values: cells
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        }
    }

    #[test]
    fn test_rows_are_typed() {
        let records = vec![row(
            2,
            &[
                ("CODIGO", "HER-010"),
                ("CLAVE_PROV", "TRU-55"),
                ("DESCRIPCION", "Pinza de presión"),
                ("CATEGORIA", "herramientas"),
                ("STOCK", "5.0"),
                ("MINIMO", "2"),
            ],
        )];

        let sheet = rows_from_records(&records, &InventoryConfig::default()).unwrap();
        assert!(sheet.skipped_rows.is_empty());
        assert_eq!(
            sheet.rows,
            vec![SheetRow {
                row_number: 2,
                code: Some("HER-010".to_string()),
                supplier_code: Some("TRU-55".to_string()),
                description: "Pinza de presión".to_string(),
                category: Category::Herramienta,
                stock: 5,
                min_stock: 2,
            }]
        );
    }

    #[test]
    fn test_defaults_and_skips() {
        let config = InventoryConfig {
            default_category: Category::Consumible,
            default_min_stock: 4,
        };
        let records = vec![
            row(2, &[("descripcion", "Cinta aislante"), ("categoria", "Refacción")]),
            row(3, &[("DESCRIPCION", "Sin categoría"), ("CATEGORIA", " ")]),
            row(5, &[("CATEGORIA", "EPP"), ("STOCK", "3")]),
        ];

        let sheet = rows_from_records(&records, &config).unwrap();
        assert_eq!(sheet.skipped_rows, vec![3, 5]);
        assert_eq!(sheet.rows.len(), 1);
        let only = &sheet.rows[0];
        assert_eq!(only.category, Category::Consumible);
        assert_eq!(only.stock, 0);
        assert_eq!(only.min_stock, 4);
        assert_eq!(only.code, None);
    }

    #[test]
    fn test_bad_numbers_name_the_row() {
        for bad in ["2.5", "-1", "muchos"] {
            let records = vec![row(
                7,
                &[("DESCRIPCION", "Casco"), ("CATEGORIA", "EPP"), ("STOCK", bad)],
            )];
            match rows_from_records(&records, &InventoryConfig::default()) {
                Err(Error::Validation { message }) => assert!(message.starts_with("Row 7")),
                other => panic!("expected validation error, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_number_rows() {
        let numbered = number_rows(vec![HashMap::new(), HashMap::new()]);
        let numbers: Vec<usize> = numbered.iter().map(|r| r.row_number).collect();
        assert_eq!(numbers, vec![2, 3]);
    }

    #[test]
    fn test_decode_uses_sheet_row_numbers() {
        // Headers on row 3, blank row 5, row 6 without category.
        let bytes = include_bytes!("testdata/inventario.xlsx");
        let records = decode_xlsx(bytes).unwrap();

        let numbers: Vec<usize> = records.iter().map(|r| r.row_number).collect();
        assert_eq!(numbers, vec![4, 6, 7]);
        assert_eq!(records[0].values["CODIGO"], "HER-050");
        assert_eq!(records[0].values["STOCK"], "3");

        let sheet = rows_from_records(&records, &InventoryConfig::default()).unwrap();
        assert_eq!(sheet.skipped_rows, vec![6]);
        let typed: Vec<(usize, i32)> = sheet.rows.iter().map(|r| (r.row_number, r.stock)).collect();
        assert_eq!(typed, vec![(4, 3), (7, 5)]);
        assert_eq!(sheet.rows[1].category, Category::Epp);
    }

    #[test]
    fn test_decode_rejects_non_workbook() {
        let result = decode_xlsx(b"CODIGO,DESCRIPCION\nHER-1,Martillo\n");
        assert!(matches!(result, Err(Error::Parse { .. })));
    }
}
