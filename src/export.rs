//! CSV export of market snapshots
//!
//! One header row with [`HEADERS`], then one row per record in input order.
//! Column 1 carries the local wall-clock time at which the row was written.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

use crate::error::{ExportError, ExportResult};
use crate::types::{ExportSummary, MarketRecord};

/// Column labels, in output order
pub const HEADERS: [&str; 13] = [
    "Timestamp",
    "ID",
    "Symbol",
    "Name",
    "Current Price",
    "Market Cap",
    "Market Cap Rank",
    "Total Volume",
    "High 24h",
    "Low 24h",
    "Price Change 24h",
    "Price Change % 24h",
    "Last Updated",
];

const ROW_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const FILENAME_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// What to write when a numeric field came back as `null`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingValuePolicy {
    /// Leave the cell empty
    #[default]
    Blank,
    /// Abort the export with [`ExportError::MissingValue`]
    Error,
}

impl FromStr for MissingValuePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "blank" => Ok(MissingValuePolicy::Blank),
            "error" => Ok(MissingValuePolicy::Error),
            _ => Err(format!(
                "Unknown missing value policy: {}. Use 'blank' or 'error'",
                s
            )),
        }
    }
}

impl fmt::Display for MissingValuePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingValuePolicy::Blank => write!(f, "blank"),
            MissingValuePolicy::Error => write!(f, "error"),
        }
    }
}

/// `market_data_<YYYYMMDD>_<HHMMSS>.csv` for the given instant
pub fn generate_filename(now: DateTime<Local>) -> String {
    format!("market_data_{}.csv", now.format(FILENAME_TIMESTAMP_FORMAT))
}

/// Round a market cap rank half away from zero (`7.5 -> 8`, `-2.5 -> -3`).
///
/// Returns `None` when the result does not fit an `i64`.
pub fn round_rank(value: f64) -> Option<i64> {
    let rounded = value.round();
    if rounded.is_finite() && rounded >= i64::MIN as f64 && rounded < i64::MAX as f64 {
        Some(rounded as i64)
    } else {
        None
    }
}

/// Writes market records as a CSV table
#[derive(Debug, Clone, Copy, Default)]
pub struct TableExporter {
    policy: MissingValuePolicy,
}

impl TableExporter {
    pub fn new(policy: MissingValuePolicy) -> Self {
        Self { policy }
    }

    /// Create `market_data_<timestamp>.csv` in `dir` and write every record.
    ///
    /// The file name uses the time at which the export starts. An existing
    /// file with the same name is truncated.
    pub fn export(&self, records: &[MarketRecord], dir: &Path) -> ExportResult<ExportSummary> {
        let path = dir.join(generate_filename(Local::now()));
        debug!("Writing {} records to {}", records.len(), path.display());

        let file = File::create(&path)?;
        let rows = self.write_to(file, records)?;

        info!("Saved {} rows to {}", rows, path.display());
        Ok(ExportSummary { path, rows })
    }

    /// Write header and rows to any writer, returning the number of data rows
    pub fn write_to<W: Write>(&self, writer: W, records: &[MarketRecord]) -> ExportResult<usize> {
        self.write_rows(writer, records, Local::now)
    }

    fn write_rows<W, C>(&self, writer: W, records: &[MarketRecord], mut clock: C) -> ExportResult<usize>
    where
        W: Write,
        C: FnMut() -> DateTime<Local>,
    {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(HEADERS)?;

        for record in records {
            let captured_at = clock().format(ROW_TIMESTAMP_FORMAT).to_string();
            wtr.write_record(self.format_row(record, captured_at)?)?;
        }

        wtr.flush()?;
        Ok(records.len())
    }

    /// Render one record as the 13 output cells
    pub fn format_row(
        &self,
        record: &MarketRecord,
        captured_at: String,
    ) -> ExportResult<[String; 13]> {
        let fixed = |value: Option<f64>, decimals: usize, field: &'static str| {
            self.cell(record, value, field, |v| Ok(format!("{:.*}", decimals, v)))
        };

        let rank = self.cell(record, record.market_cap_rank, HEADERS[6], |value| {
            round_rank(value)
                .map(|r| r.to_string())
                .ok_or_else(|| ExportError::InvalidRank {
                    id: record.id.clone(),
                    value,
                })
        })?;

        Ok([
            captured_at,
            record.id.clone(),
            record.symbol.clone(),
            record.name.clone(),
            fixed(record.current_price, 2, HEADERS[4])?,
            fixed(record.market_cap, 0, HEADERS[5])?,
            rank,
            fixed(record.total_volume, 0, HEADERS[7])?,
            fixed(record.high_24h, 2, HEADERS[8])?,
            fixed(record.low_24h, 2, HEADERS[9])?,
            fixed(record.price_change_24h, 2, HEADERS[10])?,
            fixed(record.price_change_percentage_24h, 2, HEADERS[11])?,
            record.last_updated.clone().unwrap_or_default(),
        ])
    }

    fn cell<F>(
        &self,
        record: &MarketRecord,
        value: Option<f64>,
        field: &'static str,
        render: F,
    ) -> ExportResult<String>
    where
        F: FnOnce(f64) -> ExportResult<String>,
    {
        match (value, self.policy) {
            (Some(v), _) => render(v),
            (None, MissingValuePolicy::Blank) => Ok(String::new()),
            (None, MissingValuePolicy::Error) => Err(ExportError::MissingValue {
                id: record.id.clone(),
                field,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn bitcoin() -> MarketRecord {
        MarketRecord {
            current_price: Some(1234.5),
            market_cap: Some(1317802988326.4),
            market_cap_rank: Some(7.6),
            total_volume: Some(31260929299.7),
            high_24h: Some(68000.0),
            low_24h: Some(66000.126),
            price_change_24h: Some(-123.456),
            price_change_percentage_24h: Some(-0.18),
            last_updated: Some("2024-04-07T16:49:31.736Z".to_string()),
            ..MarketRecord::new("bitcoin", "btc", "Bitcoin")
        }
    }

    fn fixed_clock() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 4, 7, 9, 5, 3).unwrap()
    }

    #[test]
    fn test_headers() {
        assert_eq!(HEADERS.len(), 13);
        assert_eq!(HEADERS[0], "Timestamp");
        assert_eq!(HEADERS[6], "Market Cap Rank");
        assert_eq!(HEADERS[12], "Last Updated");
    }

    #[test]
    fn test_generate_filename() {
        assert_eq!(
            generate_filename(fixed_clock()),
            "market_data_20240407_090503.csv"
        );
    }

    #[test]
    fn test_round_rank() {
        assert_eq!(round_rank(7.6), Some(8));
        assert_eq!(round_rank(7.4), Some(7));
        assert_eq!(round_rank(1.0), Some(1));
        // ties go away from zero
        assert_eq!(round_rank(2.5), Some(3));
        assert_eq!(round_rank(3.5), Some(4));
        assert_eq!(round_rank(0.5), Some(1));
        assert_eq!(round_rank(-2.5), Some(-3));
        assert_eq!(round_rank(f64::NAN), None);
        assert_eq!(round_rank(f64::INFINITY), None);
        assert_eq!(round_rank(1e30), None);
    }

    #[test]
    fn test_format_row() {
        let exporter = TableExporter::default();
        let row = exporter
            .format_row(&bitcoin(), "2024-04-07 09:05:03".to_string())
            .unwrap();

        assert_eq!(
            row,
            [
                "2024-04-07 09:05:03",
                "bitcoin",
                "btc",
                "Bitcoin",
                "1234.50",
                "1317802988326",
                "8",
                "31260929300",
                "68000.00",
                "66000.13",
                "-123.46",
                "-0.18",
                "2024-04-07T16:49:31.736Z",
            ]
            .map(String::from)
        );
    }

    #[test]
    fn test_blank_policy_leaves_cells_empty() {
        let exporter = TableExporter::new(MissingValuePolicy::Blank);
        let record = MarketRecord::new("newcoin", "new", "New Coin");
        let row = exporter.format_row(&record, "ts".to_string()).unwrap();

        assert_eq!(&row[1..4], ["newcoin", "new", "New Coin"]);
        assert!(row[4..].iter().all(|cell| cell.is_empty()));
    }

    #[test]
    fn test_error_policy_names_missing_rank() {
        let exporter = TableExporter::new(MissingValuePolicy::Error);
        let record = MarketRecord {
            market_cap_rank: None,
            ..bitcoin()
        };

        match exporter.format_row(&record, "ts".to_string()) {
            Err(ExportError::MissingValue { id, field }) => {
                assert_eq!(id, "bitcoin");
                assert_eq!(field, "Market Cap Rank");
            }
            other => panic!("expected MissingValue, got {:?}", other),
        }
    }

    #[test]
    fn test_error_policy_names_missing_price() {
        let exporter = TableExporter::new(MissingValuePolicy::Error);
        let record = MarketRecord {
            current_price: None,
            ..bitcoin()
        };

        assert!(matches!(
            exporter.format_row(&record, "ts".to_string()),
            Err(ExportError::MissingValue { field: "Current Price", .. })
        ));
    }

    #[test]
    fn test_unrepresentable_rank_fails_under_any_policy() {
        let record = MarketRecord {
            market_cap_rank: Some(1e300),
            ..bitcoin()
        };
        for policy in [MissingValuePolicy::Blank, MissingValuePolicy::Error] {
            let result = TableExporter::new(policy).format_row(&record, "ts".to_string());
            assert!(matches!(result, Err(ExportError::InvalidRank { .. })));
        }
    }

    #[test]
    fn test_write_rows() {
        let exporter = TableExporter::default();
        let records = vec![
            bitcoin(),
            MarketRecord {
                current_price: Some(3000.0),
                market_cap_rank: Some(2.0),
                ..MarketRecord::new("ethereum", "eth", "Ethereum, \"the\" chain")
            },
        ];

        let mut buf = Vec::new();
        let rows = exporter
            .write_rows(&mut buf, &records, fixed_clock)
            .unwrap();
        assert_eq!(rows, 2);

        let mut reader = csv::Reader::from_reader(buf.as_slice());
        let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(headers, HEADERS);

        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][0], "2024-04-07 09:05:03");
        assert_eq!(&rows[0][1], "bitcoin");
        assert_eq!(&rows[1][1], "ethereum");
        // quoting survives the round trip
        assert_eq!(&rows[1][3], "Ethereum, \"the\" chain");
        assert_eq!(&rows[1][4], "3000.00");
        assert_eq!(&rows[1][6], "2");
        assert_eq!(&rows[1][5], "");
    }

    #[test]
    fn test_timestamp_recomputed_per_row() {
        let exporter = TableExporter::default();
        let records = vec![bitcoin(), bitcoin()];
        let mut ticks = 0;
        let clock = || {
            ticks += 1;
            fixed_clock() + chrono::Duration::seconds(ticks)
        };

        let mut buf = Vec::new();
        exporter.write_rows(&mut buf, &records, clock).unwrap();

        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("2024-04-07 09:05:04,"));
        assert!(lines[2].starts_with("2024-04-07 09:05:05,"));
    }

    #[test]
    fn test_empty_input_writes_header_only() {
        let mut buf = Vec::new();
        let rows = TableExporter::default().write_to(&mut buf, &[]).unwrap();
        assert_eq!(rows, 0);
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(text.starts_with("Timestamp,ID,Symbol,Name,Current Price,"));
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("blank".parse::<MissingValuePolicy>(), Ok(MissingValuePolicy::Blank));
        assert_eq!(" Error ".parse::<MissingValuePolicy>(), Ok(MissingValuePolicy::Error));
        assert!("zero".parse::<MissingValuePolicy>().is_err());
        assert_eq!(MissingValuePolicy::Error.to_string(), "error");
    }
}
