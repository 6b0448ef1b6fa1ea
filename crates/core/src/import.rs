//! CSV bulk import.
//!
//! Turns pasted or uploaded CSV text into validated [`BuyerDraft`]s. Import is
//! all-or-nothing: [`prepare_import`] returns drafts only when every row passes,
//! so the caller can insert the whole batch in one transaction.
//!
//! The header row names the columns using the JSON field names (`fullName`,
//! `propertyType`, `budgetMin`, ...). Column order is free and unknown columns are
//! ignored. Cells are trimmed, empty cells read as `null`, and `tags` is a
//! comma-separated list.

use serde::Serialize;

use crate::types::BuyerDraft;
use crate::validation::{FieldIssue, Record, record_from_text_fields, validate_record};

/// Most data rows accepted in one import.
pub const MAX_IMPORT_ROWS: usize = 200;

/// The CSV text itself could not be read.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct CsvError {
    /// 1-based line in the input, when known.
    pub line: Option<u64>,
    pub message: String,
}

impl From<csv::Error> for CsvError {
    fn from(err: csv::Error) -> Self {
        Self {
            line: err.position().map(csv::Position::line),
            message: format!("malformed CSV: {err}"),
        }
    }
}

/// Every issue found in one data row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowError {
    /// 1-based data row number (the header is not counted).
    pub row: usize,
    pub issues: Vec<FieldIssue>,
}

/// Why an import was refused. Nothing is inserted in any of these cases.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ImportError {
    #[error("Max {max} rows allowed")]
    TooManyRows { max: usize, found: usize },

    #[error(transparent)]
    Csv(#[from] CsvError),

    #[error("{} row(s) failed validation", .0.len())]
    InvalidRows(Vec<RowError>),
}

/// Parse CSV text into one record per data row.
///
/// Only lines with no characters at all are skipped. A row of empty cells is
/// kept, so it fails validation and keeps later row numbers aligned.
///
/// # Errors
///
/// Returns [`CsvError`] when the text is not well-formed CSV, including rows with a
/// different number of cells than the header.
pub fn parse_rows(text: &str) -> Result<Vec<Record>, CsvError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        rows.push(record_from_text_fields(headers.iter().zip(record.iter())));
    }
    Ok(rows)
}

/// Validate every row, collecting all failures.
///
/// # Errors
///
/// - [`ImportError::TooManyRows`] for more than [`MAX_IMPORT_ROWS`] rows; no row is
///   validated.
/// - [`ImportError::InvalidRows`] listing every failing row when any row fails.
pub fn validate_rows(rows: &[Record]) -> Result<Vec<BuyerDraft>, ImportError> {
    if rows.len() > MAX_IMPORT_ROWS {
        return Err(ImportError::TooManyRows {
            max: MAX_IMPORT_ROWS,
            found: rows.len(),
        });
    }

    let mut drafts = Vec::with_capacity(rows.len());
    let mut failures = Vec::new();

    for (index, row) in rows.iter().enumerate() {
        match validate_record(row) {
            Ok(draft) => drafts.push(draft),
            Err(errors) => failures.push(RowError {
                row: index + 1,
                issues: errors.issues().to_vec(),
            }),
        }
    }

    if failures.is_empty() {
        Ok(drafts)
    } else {
        Err(ImportError::InvalidRows(failures))
    }
}

/// Parse and validate CSV text, returning drafts ready to insert.
///
/// # Errors
///
/// See [`parse_rows`] and [`validate_rows`].
pub fn prepare_import(text: &str) -> Result<Vec<BuyerDraft>, ImportError> {
    let rows = parse_rows(text)?;
    validate_rows(&rows)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{Bhk, City, PropertyType};

    const HEADER: &str = "fullName,email,phone,city,propertyType,bhk,purpose,budgetMin,budgetMax,timeline,source,notes,tags,status";

    fn row(name: &str) -> String {
        format!(
            "{name},,9876543210,Mohali,Apartment,Two,Buy,4000000,5000000,SixMonths,Referral,,\"hot, nri\",\n"
        )
    }

    fn csv_with(rows: usize) -> String {
        let mut text = format!("{HEADER}\n");
        for i in 0..rows {
            text.push_str(&row(&format!("Buyer {i}")));
        }
        text
    }

    #[test]
    fn test_valid_rows_become_drafts() {
        let drafts = prepare_import(&csv_with(3)).unwrap();
        assert_eq!(drafts.len(), 3);

        let first = &drafts[0];
        assert_eq!(first.full_name, "Buyer 0");
        assert_eq!(first.email, None);
        assert_eq!(first.city, City::Mohali);
        assert_eq!(first.property_type, PropertyType::Apartment);
        assert_eq!(first.bhk, Some(Bhk::Two));
        assert_eq!(first.budget_min, Some(4_000_000));
        assert_eq!(first.tags, vec!["hot", "nri"]);
        assert_eq!(first.status, None);
    }

    #[test]
    fn test_column_order_is_free() {
        let text = "phone,fullName,city,source,timeline,purpose,propertyType\n\
                    9876543210,Kiran,Other,Call,Exploring,Rent,Plot\n";
        let drafts = prepare_import(text).unwrap();
        assert_eq!(drafts[0].full_name, "Kiran");
    }

    #[test]
    fn test_blank_lines_and_bom_are_ignored() {
        let text = format!("\u{feff}{HEADER}\n\n{}\n{}", row("Anil"), row("Bina"));
        let drafts = prepare_import(&text).unwrap();
        assert_eq!(drafts.len(), 2);
    }

    #[test]
    fn test_one_bad_row_fails_the_batch_and_reports_row_numbers() {
        let mut text = csv_with(2);
        text.push_str("X,,123,Mohali,Villa,,Buy,,,SixMonths,Website,,,\n");
        text.push_str(&row("Fine"));
        text.push_str("Dev,,9876543210,Mohali,Plot,,Buy,900,100,SixMonths,Website,,,\n");

        let Err(ImportError::InvalidRows(failures)) = prepare_import(&text) else {
            panic!("expected row failures");
        };

        let rows: Vec<usize> = failures.iter().map(|f| f.row).collect();
        assert_eq!(rows, vec![3, 5]);

        let fields: Vec<&str> = failures[0].issues.iter().map(|i| i.field.as_str()).collect();
        assert!(fields.contains(&"fullName"));
        assert!(fields.contains(&"phone"));
        assert!(fields.contains(&"bhk"));

        assert_eq!(failures[1].issues[0].field, "budgetMax");
    }

    #[test]
    fn test_row_of_empty_cells_fails_at_its_own_row_number() {
        let mut text = csv_with(1);
        text.push_str(",,,,,,,,,,,,,\n");
        text.push_str("X,,123,Mohali,Plot,,Buy,,,SixMonths,Website,,,\n");

        let Err(ImportError::InvalidRows(failures)) = prepare_import(&text) else {
            panic!("expected row failures");
        };
        let rows: Vec<usize> = failures.iter().map(|f| f.row).collect();
        assert_eq!(rows, vec![2, 3]);

        let mut text = csv_with(1);
        text.push_str(",,,,,,,,,,,,,\n");
        assert!(matches!(
            prepare_import(&text),
            Err(ImportError::InvalidRows(ref failures)) if failures[0].row == 2
        ));
    }

    #[test]
    fn test_rows_of_empty_cells_count_toward_the_limit() {
        let mut text = csv_with(MAX_IMPORT_ROWS);
        text.push_str(",,,,,,,,,,,,,\n");
        assert!(matches!(
            prepare_import(&text),
            Err(ImportError::TooManyRows { found: 201, .. })
        ));
    }

    #[test]
    fn test_exactly_max_rows_is_accepted() {
        assert_eq!(prepare_import(&csv_with(MAX_IMPORT_ROWS)).unwrap().len(), 200);
    }

    #[test]
    fn test_more_than_max_rows_is_rejected_outright() {
        let err = prepare_import(&csv_with(MAX_IMPORT_ROWS + 1)).unwrap_err();
        assert_eq!(
            err,
            ImportError::TooManyRows {
                max: 200,
                found: 201
            }
        );
        assert_eq!(err.to_string(), "Max 200 rows allowed");
    }

    #[test]
    fn test_size_check_runs_before_validation() {
        let records = vec![Record::new(); MAX_IMPORT_ROWS + 1];
        assert!(matches!(
            validate_rows(&records),
            Err(ImportError::TooManyRows { .. })
        ));
    }

    #[test]
    fn test_ragged_row_is_malformed() {
        let text = format!("{HEADER}\nonly,three,cells\n");
        let Err(ImportError::Csv(err)) = prepare_import(&text) else {
            panic!("expected CSV error");
        };
        assert!(err.line.is_some());
        assert!(err.message.starts_with("malformed CSV"));
    }

    #[test]
    fn test_header_only_imports_nothing() {
        assert!(prepare_import(HEADER).unwrap().is_empty());
        assert!(prepare_import("").unwrap().is_empty());
    }

    #[test]
    fn test_row_error_serializes() {
        let err = RowError {
            row: 4,
            issues: Vec::new(),
        };
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            serde_json::json!({ "row": 4, "issues": [] })
        );
    }
}
