//! Reading of the tabular reference data (climate normals and hardware configuration).
//!
//! A sheet is a CSV file with a header row. One column selects which table a row belongs
//! to (e.g. the climate region, or the component configuration), another names the row
//! within that table (e.g. the month number). All other columns are numeric values, where a
//! blank cell means that the value is absent.

use csv::ReaderBuilder as CsvReaderBuilder;
use indexmap::IndexMap;
use std::io::Read;
use thiserror::Error;
use tracing::debug;

#[derive(Clone, Debug, Error, PartialEq)]
#[error("No value found in table '{table}' for row '{row_key}' and column '{column}'")]
pub struct ReferenceDataMissing {
    pub table: String,
    pub row_key: String,
    pub column: String,
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum ReferenceDataLookupError {
    #[error(transparent)]
    Missing(#[from] ReferenceDataMissing),
    #[error("Value {value} in table '{table}' for row '{row_key}' and column '{column}' is not a whole number of items")]
    NotACount {
        table: String,
        row_key: String,
        column: String,
        value: f64,
    },
}

#[derive(Debug, Error)]
pub enum ReferenceDataLoadError {
    #[error("Could not read reference data sheet: {0}")]
    Csv(#[from] csv::Error),
    #[error("Reference data sheet has no column named '{0}'")]
    MissingColumn(String),
    #[error("Non-numeric value '{value}' in column '{column}' on line {line}")]
    NonNumericValue {
        value: String,
        column: String,
        line: u64,
    },
}

/// A named table of numeric values, keyed by row and then by column.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    name: String,
    rows: IndexMap<String, IndexMap<String, f64>>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Default::default(),
        }
    }

    pub fn row_keys(&self) -> impl Iterator<Item = &str> {
        self.rows.keys().map(String::as_str)
    }

    pub fn insert(&mut self, row_key: &str, column: &str, value: f64) {
        self.rows
            .entry(row_key.to_string())
            .or_default()
            .insert(column.to_string(), value);
    }

    pub fn lookup_numeric(&self, row_key: &str, column: &str) -> Result<f64, ReferenceDataMissing> {
        self.rows
            .get(row_key)
            .and_then(|row| row.get(column))
            .copied()
            .ok_or_else(|| ReferenceDataMissing {
                table: self.name.clone(),
                row_key: row_key.to_string(),
                column: column.to_string(),
            })
    }

    /// A value that counts items, so must be a non-negative whole number.
    pub fn lookup_count(&self, row_key: &str, column: &str) -> Result<u32, ReferenceDataLookupError> {
        let value = self.lookup_numeric(row_key, column)?;
        if value.is_finite() && value >= 0. && value.fract() == 0. && value <= u32::MAX as f64 {
            Ok(value as u32)
        } else {
            Err(ReferenceDataLookupError::NotACount {
                table: self.name.clone(),
                row_key: row_key.to_string(),
                column: column.to_string(),
                value,
            })
        }
    }
}

/// The tables of one sheet, keyed by the value of the selector column.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TableSet {
    sheet: String,
    tables: IndexMap<String, Table>,
}

impl TableSet {
    pub fn table(&self, selector: &str) -> Result<&Table, ReferenceDataMissing> {
        self.tables.get(selector).ok_or_else(|| ReferenceDataMissing {
            table: self.sheet.clone(),
            row_key: selector.to_string(),
            column: Default::default(),
        })
    }

    pub fn selectors(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }
}

pub fn load_table(
    sheet_name: &str,
    file: impl Read,
    selector_column: &str,
    index_column: &str,
) -> Result<TableSet, ReferenceDataLoadError> {
    let mut reader = CsvReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader.headers()?.clone();
    let column_position = |name: &str| {
        headers
            .iter()
            .position(|header| header == name)
            .ok_or_else(|| ReferenceDataLoadError::MissingColumn(name.to_string()))
    };
    let selector_position = column_position(selector_column)?;
    let index_position = column_position(index_column)?;

    let mut tables: IndexMap<String, Table> = Default::default();

    for result in reader.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        let (Some(selector), Some(row_key)) =
            (record.get(selector_position), record.get(index_position))
        else {
            continue;
        };
        let table = tables
            .entry(selector.to_string())
            .or_insert_with(|| Table::new(format!("{sheet_name}[{selector}]")));

        for (position, (column, value)) in headers.iter().zip(record.iter()).enumerate() {
            if position == selector_position || position == index_position || value.is_empty() {
                continue;
            }
            let value = value
                .parse::<f64>()
                .map_err(|_| ReferenceDataLoadError::NonNumericValue {
                    value: value.to_string(),
                    column: column.to_string(),
                    line,
                })?;
            table.insert(row_key, column, value);
        }
    }

    debug!(
        "Loaded {} table(s) from reference data sheet '{sheet_name}'",
        tables.len()
    );

    Ok(TableSet {
        sheet: sheet_name.to_string(),
        tables,
    })
}
