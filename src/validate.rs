use chrono::NaiveDate;

use crate::detect::DateFormat;
use crate::mapping::{ColumnMapping, Field};
use crate::models::{ImportError, ImportWarning};
use crate::normalize::{parse_amount, parse_date, FieldParseError};
use crate::raw::RawTable;

/// Outcome of checking one row against the mapping. The parsed date and
/// amount ride along so the executor never parses a cell twice.
#[derive(Debug, Clone)]
pub struct RowValidation {
    pub errors: Vec<ImportError>,
    pub warnings: Vec<ImportWarning>,
    pub date: Option<NaiveDate>,
    pub amount: Option<f64>,
}

impl RowValidation {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validate one row. `row` is the 0-based table index, `row_no` the 1-based
/// number shown to the user. Pure: no shared state, safe to run per row in
/// any order.
pub fn validate_row(
    table: &RawTable,
    row: usize,
    row_no: usize,
    mapping: &ColumnMapping,
    format: DateFormat,
    default_category_id: Option<i64>,
) -> RowValidation {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let mut cell_for = |field: Field| -> Option<String> {
        match mapping.get(field) {
            None => {
                errors.push(ImportError {
                    row: row_no,
                    field: field.key().to_string(),
                    raw_value: String::new(),
                    message: "not mapped".to_string(),
                });
                None
            }
            Some(header) => {
                let value = table.cell(row, header).unwrap_or("");
                if value.trim().is_empty() {
                    errors.push(ImportError {
                        row: row_no,
                        field: field.key().to_string(),
                        raw_value: String::new(),
                        message: "empty".to_string(),
                    });
                    None
                } else {
                    Some(value.to_string())
                }
            }
        }
    };

    let date_cell = cell_for(Field::Date);
    let amount_cell = cell_for(Field::Amount);
    let _ = cell_for(Field::Description);

    let date = date_cell.and_then(|raw| {
        parse_field(&raw, row_no, Field::Date, &mut errors, |v| parse_date(v, format))
    });
    let amount = amount_cell.and_then(|raw| {
        parse_field(&raw, row_no, Field::Amount, &mut errors, parse_amount)
    });

    if !mapping.is_mapped(Field::Merchant) && default_category_id.is_none() {
        warnings.push(ImportWarning {
            row: row_no,
            field: Field::Merchant.key().to_string(),
            message: "no merchant column and no default category; transactions will be uncategorized"
                .to_string(),
        });
    }

    RowValidation { errors, warnings, date, amount }
}

fn parse_field<T>(
    raw: &str,
    row_no: usize,
    field: Field,
    errors: &mut Vec<ImportError>,
    parse: impl FnOnce(&str) -> Result<T, FieldParseError>,
) -> Option<T> {
    match parse(raw) {
        Ok(value) => Some(value),
        Err(err) => {
            errors.push(ImportError {
                row: row_no,
                field: field.key().to_string(),
                raw_value: raw.trim().to_string(),
                message: err.to_string(),
            });
            None
        }
    }
}
