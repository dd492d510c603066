//! Loading monthly series from whitespace-delimited tables.
//!
//! A table is a text file of numeric rows. Blank lines and lines starting
//! with `#` are skipped. Every row must have the same number of columns, at
//! least [`MIN_COLUMNS`].

pub mod synthetic;

use crate::core::{Period, TimeSeries, MONTHLY};
use crate::error::{ForecastError, Result};
use std::path::Path;
use tracing::info;

/// Minimum number of columns of an input table.
pub const MIN_COLUMNS: usize = 3;

/// Numeric table parsed from text.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    rows: Vec<Vec<f64>>,
    width: usize,
}

impl Table {
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_columns(&self) -> usize {
        self.width
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// Values of one zero-based column.
    pub fn column(&self, index: usize) -> Result<Vec<f64>> {
        if index >= self.width {
            return Err(ForecastError::IndexOutOfBounds {
                index,
                size: self.width,
            });
        }
        Ok(self.rows.iter().map(|row| row[index]).collect())
    }
}

/// Parse a whitespace-delimited numeric table.
///
/// # Errors
/// `ParseError` (with a 1-based line number) for non-numeric or non-finite
/// cells, rows with fewer than [`MIN_COLUMNS`] columns or a column count
/// that differs from the first row; `EmptyData` when no rows remain.
pub fn parse_table(text: &str) -> Result<Table> {
    let mut rows: Vec<Vec<f64>> = Vec::new();
    let mut width = 0;

    for (i, line) in text.lines().enumerate() {
        let line_no = i + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let row = trimmed
            .split_whitespace()
            .map(|cell| match cell.parse::<f64>() {
                Ok(v) if v.is_finite() => Ok(v),
                _ => Err(ForecastError::ParseError {
                    line: line_no,
                    message: format!("'{}' is not a finite number", cell),
                }),
            })
            .collect::<Result<Vec<f64>>>()?;

        if row.len() < MIN_COLUMNS {
            return Err(ForecastError::ParseError {
                line: line_no,
                message: format!(
                    "expected at least {} columns, found {}",
                    MIN_COLUMNS,
                    row.len()
                ),
            });
        }
        if rows.is_empty() {
            width = row.len();
        } else if row.len() != width {
            return Err(ForecastError::ParseError {
                line: line_no,
                message: format!("expected {} columns, found {}", width, row.len()),
            });
        }
        rows.push(row);
    }

    if rows.is_empty() {
        return Err(ForecastError::EmptyData);
    }
    Ok(Table { rows, width })
}

/// Read and parse a table from disk.
pub fn read_table<P: AsRef<Path>>(path: P) -> Result<Table> {
    let text = std::fs::read_to_string(path.as_ref())
        .map_err(|e| ForecastError::Io(format!("{}: {}", path.as_ref().display(), e)))?;
    parse_table(&text)
}

/// Which column of a table forms the series and where it starts.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSource {
    /// Zero-based column index (default: the third column)
    pub column: usize,
    pub start_year: i32,
    /// 1-based start month
    pub start_month: usize,
    /// Required row count, if any
    pub expected_rows: Option<usize>,
}

impl Default for TableSource {
    fn default() -> Self {
        Self {
            column: 2,
            start_year: 2000,
            start_month: 1,
            expected_rows: None,
        }
    }
}

impl TableSource {
    pub fn with_column(mut self, column: usize) -> Self {
        self.column = column;
        self
    }

    pub fn starting(mut self, year: i32, month: usize) -> Self {
        self.start_year = year;
        self.start_month = month;
        self
    }

    pub fn with_expected_rows(mut self, rows: usize) -> Self {
        self.expected_rows = Some(rows);
        self
    }
}

/// Build a monthly series from a parsed table.
pub fn series_from_table(table: &Table, source: &TableSource) -> Result<TimeSeries> {
    if let Some(expected) = source.expected_rows {
        if table.num_rows() != expected {
            return Err(ForecastError::DimensionMismatch {
                expected,
                got: table.num_rows(),
            });
        }
    }
    let values = table.column(source.column)?;
    TimeSeries::new(
        values,
        Period::new(source.start_year, source.start_month),
        MONTHLY,
    )
}

/// Read a table and extract the configured column as a monthly series.
pub fn load_monthly_series<P: AsRef<Path>>(path: P, source: &TableSource) -> Result<TimeSeries> {
    let table = read_table(path.as_ref())?;
    let series = series_from_table(&table, source)?;
    info!(
        path = %path.as_ref().display(),
        rows = table.num_rows(),
        column = source.column,
        start = %series.start(),
        "loaded monthly series"
    );
    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# year month value
1990 1 112.0
1990 2 118.5

1990 3 132.25
";

    #[test]
    fn parses_and_extracts_third_column() {
        let table = parse_table(SAMPLE).unwrap();
        assert_eq!(table.num_rows(), 3);
        assert_eq!(table.num_columns(), 3);
        assert_eq!(table.column(2).unwrap(), vec![112.0, 118.5, 132.25]);
        assert!(matches!(
            table.column(3),
            Err(ForecastError::IndexOutOfBounds { index: 3, size: 3 })
        ));

        let series =
            series_from_table(&table, &TableSource::default().starting(1990, 1)).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.start(), Period::january(1990));
    }

    #[test]
    fn shape_errors_abort() {
        let err = parse_table("1 2 3\n4 5\n").unwrap_err();
        assert_eq!(
            err,
            ForecastError::ParseError {
                line: 2,
                message: "expected at least 3 columns, found 2".to_string()
            }
        );
        assert!(matches!(
            parse_table("1 2 3\n4 5 6 7\n"),
            Err(ForecastError::ParseError { line: 2, .. })
        ));
        assert!(matches!(
            parse_table("1 2 3\n4 x 6\n"),
            Err(ForecastError::ParseError { line: 2, .. })
        ));
        assert!(matches!(
            parse_table("1 2 NaN\n"),
            Err(ForecastError::ParseError { line: 1, .. })
        ));
        assert_eq!(parse_table("# only comments\n\n"), Err(ForecastError::EmptyData));
    }

    #[test]
    fn expected_row_count_is_enforced() {
        let table = parse_table(SAMPLE).unwrap();
        let source = TableSource::default().with_expected_rows(120);
        assert!(matches!(
            series_from_table(&table, &source),
            Err(ForecastError::DimensionMismatch { expected: 120, got: 3 })
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(matches!(
            read_table("/nonexistent/seasonal-forecast/data.txt"),
            Err(ForecastError::Io(_))
        ));
    }
}
