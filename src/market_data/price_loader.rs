// =============================================================================
// CSV Price Loading
// =============================================================================
//
// Reads a daily price CSV into a clean, date-ascending history:
//   - headers are matched case-insensitively; a date column is required and
//     the price column is the first of `price`, `close`, `adj close`;
//   - prices may carry thousands separators ("1,234.56");
//   - dates accept ISO (`2024-01-31`) and US (`01/31/2024`) formats;
//   - rows that fail to parse are dropped, not fatal;
//   - fewer than 3 clean rows is an error, because downstream estimation
//     needs at least two consecutive returns.
//
// The loader also keeps the raw row count so the dashboard can report how
// much of the input survived cleaning.

use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

/// Minimum number of clean rows required to estimate transitions.
pub const MIN_CLEAN_ROWS: usize = 3;

/// Accepted price column headers, in priority order (lowercase).
const PRICE_HEADERS: [&str; 3] = ["price", "close", "adj close"];

/// Accepted date formats, tried in order.
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];

// =============================================================================
// PricePoint / PriceHistory
// =============================================================================

/// One cleaned observation: a date and its closing price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

/// Cleaned, date-ascending price series plus the raw row count it was
/// distilled from.
///
/// Construction enforces the [`MIN_CLEAN_ROWS`] floor, so a held value always
/// has a first and last date and supports return computation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceHistory {
    points: Vec<PricePoint>,
    raw_rows: usize,
}

impl PriceHistory {
    /// Build a history from already-cleaned points. Fails below the
    /// [`MIN_CLEAN_ROWS`] floor.
    pub fn new(points: Vec<PricePoint>, raw_rows: usize) -> Result<Self> {
        if points.len() < MIN_CLEAN_ROWS {
            bail!(
                "not enough clean rows: need at least {MIN_CLEAN_ROWS} dated prices, got {}",
                points.len()
            );
        }
        Ok(Self { points, raw_rows })
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    /// Rows present in the raw CSV before cleaning.
    pub fn raw_rows(&self) -> usize {
        self.raw_rows
    }

    /// Rows that survived cleaning.
    pub fn clean_rows(&self) -> usize {
        self.points.len()
    }

    /// Closing prices in date order.
    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }

    pub fn first_date(&self) -> NaiveDate {
        self.points[0].date
    }

    pub fn last_date(&self) -> NaiveDate {
        self.points[self.points.len() - 1].date
    }
}

// =============================================================================
// Loading
// =============================================================================

/// Load and clean a price history from the CSV file at `path`.
pub fn load_prices(path: impl AsRef<Path>) -> Result<PriceHistory> {
    let path = path.as_ref();

    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open price CSV at {}", path.display()))?;

    let history = read_prices(file)
        .with_context(|| format!("failed to load prices from {}", path.display()))?;

    info!(
        path = %path.display(),
        raw_rows = history.raw_rows(),
        clean_rows = history.clean_rows(),
        first_date = %history.first_date(),
        last_date = %history.last_date(),
        "price history loaded"
    );

    Ok(history)
}

/// Parse and clean a price history from any CSV reader.
pub fn read_prices(reader: impl Read) -> Result<PriceHistory> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

    let headers = rdr.headers().context("failed to read CSV header")?;
    let lower: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();

    let date_idx = lower
        .iter()
        .position(|h| h == "date")
        .context("CSV must contain a 'Date' column")?;

    let price_idx = PRICE_HEADERS
        .iter()
        .find_map(|candidate| lower.iter().position(|h| h == candidate))
        .context("CSV must contain a 'Price' (or 'Close'/'Adj Close') column")?;

    let mut points = Vec::new();
    let mut raw_rows = 0usize;

    for record in rdr.records() {
        let record = record.context("failed to read CSV record")?;
        raw_rows += 1;

        let (Some(date_raw), Some(close_raw)) = (record.get(date_idx), record.get(price_idx))
        else {
            continue;
        };
        let (Some(date), Some(close)) = (parse_date(date_raw), parse_price(close_raw)) else {
            continue;
        };

        points.push(PricePoint { date, close });
    }

    points.sort_by_key(|p| p.date);

    PriceHistory::new(points, raw_rows)
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

/// Parse a price cell, stripping thousands separators. Non-finite values are
/// rejected like any other unparsable cell.
fn parse_price(raw: &str) -> Option<f64> {
    let cleaned = raw.trim().replace(',', "");
    let value: f64 = cleaned.parse().ok()?;
    value.is_finite().then_some(value)
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_basic_load() {
        let csv = "Date,Close\n2024-01-01,100.0\n2024-01-02,101.5\n2024-01-03,99.0\n";
        let history = read_prices(csv.as_bytes()).unwrap();
        assert_eq!(history.clean_rows(), 3);
        assert_eq!(history.raw_rows(), 3);
        assert_eq!(history.first_date(), date("2024-01-01"));
        assert_eq!(history.last_date(), date("2024-01-03"));
        assert_eq!(history.closes(), vec![100.0, 101.5, 99.0]);
    }

    #[test]
    fn test_headers_are_case_insensitive() {
        let csv = "DATE, PRICE \n2024-01-01,1\n2024-01-02,2\n2024-01-03,3\n";
        let history = read_prices(csv.as_bytes()).unwrap();
        assert_eq!(history.clean_rows(), 3);
    }

    #[test]
    fn test_price_column_priority() {
        // 'price' wins over 'close' when both are present.
        let csv = "Date,Close,Price\n2024-01-01,1,10\n2024-01-02,2,20\n2024-01-03,3,30\n";
        let history = read_prices(csv.as_bytes()).unwrap();
        assert_eq!(history.closes(), vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn test_adj_close_accepted() {
        let csv = "Date,Adj Close\n2024-01-01,1\n2024-01-02,2\n2024-01-03,3\n";
        assert!(read_prices(csv.as_bytes()).is_ok());
    }

    #[test]
    fn test_missing_date_column_rejected() {
        let csv = "Timestamp,Close\n2024-01-01,1\n";
        let err = read_prices(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("'Date'"));
    }

    #[test]
    fn test_missing_price_column_rejected() {
        let csv = "Date,Volume\n2024-01-01,1\n";
        let err = read_prices(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("'Price'"));
    }

    #[test]
    fn test_thousands_separators_are_stripped() {
        let csv = "Date,Price\n2024-01-01,\"1,234.56\"\n2024-01-02,\"1,240.00\"\n2024-01-03,\"1,250.25\"\n";
        let history = read_prices(csv.as_bytes()).unwrap();
        assert_eq!(history.closes(), vec![1234.56, 1240.0, 1250.25]);
    }

    #[test]
    fn test_us_date_format_accepted() {
        let csv = "Date,Close\n01/02/2024,1\n01/03/2024,2\n01/04/2024,3\n";
        let history = read_prices(csv.as_bytes()).unwrap();
        assert_eq!(history.first_date(), date("2024-01-02"));
    }

    #[test]
    fn test_bad_rows_are_dropped_but_counted() {
        let csv = "Date,Close\n2024-01-01,100\nnot-a-date,101\n2024-01-03,oops\n2024-01-04,102\n2024-01-05,103\n";
        let history = read_prices(csv.as_bytes()).unwrap();
        assert_eq!(history.raw_rows(), 5);
        assert_eq!(history.clean_rows(), 3);
        assert_eq!(history.closes(), vec![100.0, 102.0, 103.0]);
    }

    #[test]
    fn test_rows_sorted_by_date() {
        let csv = "Date,Close\n2024-01-03,3\n2024-01-01,1\n2024-01-02,2\n";
        let history = read_prices(csv.as_bytes()).unwrap();
        assert_eq!(history.closes(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_too_few_clean_rows_rejected() {
        let csv = "Date,Close\n2024-01-01,100\n2024-01-02,101\n";
        let err = read_prices(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("not enough clean rows"));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(load_prices("does/not/exist.csv").is_err());
    }

    #[test]
    fn test_non_finite_prices_are_dropped() {
        let csv = "Date,Close\n2024-01-01,100\n2024-01-02,inf\n2024-01-03,101\n2024-01-04,NaN\n2024-01-05,102\n";
        let history = read_prices(csv.as_bytes()).unwrap();
        assert_eq!(history.clean_rows(), 3);
    }
}
