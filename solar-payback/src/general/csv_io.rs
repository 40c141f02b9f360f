use anyhow::{Context, Result, bail};
use chrono::NaiveDateTime;
use pv_model::{HourlySeries, ProjectionSummary};
use serde::Deserialize;
use std::path::Path;

use crate::general::electricity_demand::parse_utc_timestamp;

#[derive(Debug, Deserialize)]
struct SeriesRecord {
    timestamp: String,
    value: f64,
}

/// Parse a timestamp without zone; values with an offset are converted to UTC
pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime> {
    let trimmed = value.trim();
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(timestamp) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(timestamp);
        }
    }
    parse_utc_timestamp(trimmed)
}

/// Load a `timestamp,value` CSV file into an hourly series
pub fn load_series_csv(file_path: &Path) -> Result<HourlySeries> {
    let mut reader = csv::Reader::from_path(file_path)
        .with_context(|| format!("Failed to open file: {}", file_path.display()))?;

    let mut pairs = Vec::new();
    for (line_num, record) in reader.deserialize::<SeriesRecord>().enumerate() {
        let record = record.with_context(|| {
            format!(
                "Failed to read line {} of {}",
                line_num + 2,
                file_path.display()
            )
        })?;
        let timestamp = parse_timestamp(&record.timestamp)
            .with_context(|| format!("Invalid timestamp on line {}", line_num + 2))?;
        pairs.push((timestamp, record.value));
    }

    if pairs.is_empty() {
        bail!("No values found in {}", file_path.display());
    }

    Ok(HourlySeries::from_pairs(pairs))
}

/// Write the yearly ledger of a projection as CSV
pub fn write_ledger_csv(summary: &ProjectionSummary, file_path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(file_path)
        .with_context(|| format!("Failed to create file: {}", file_path.display()))?;

    for row in &summary.years {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pv_model::YearlyResult;

    #[test]
    fn test_load_series_csv() {
        let test_data = "\
timestamp,value
2023-01-01 00:00:00,0.5
2023-01-01T01:00:00,0.75
2023-01-01T03:00:00+01:00,1.0
";
        let temp_file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(&temp_file, test_data).unwrap();

        let series = load_series_csv(temp_file.path()).unwrap();
        assert_eq!(series.values(), &[0.5, 0.75, 1.0]);
        assert_eq!(
            series.timestamps()[2],
            parse_timestamp("2023-01-01 02:00:00").unwrap()
        );
    }

    #[test]
    fn test_load_series_csv_rejects_bad_rows() {
        let temp_file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(&temp_file, "timestamp,value\nnot a date,1.0\n").unwrap();
        assert!(load_series_csv(temp_file.path()).is_err());

        std::fs::write(&temp_file, "timestamp,value\n").unwrap();
        assert!(load_series_csv(temp_file.path()).is_err());
    }

    #[test]
    fn test_write_ledger_csv() {
        let summary = ProjectionSummary {
            years: vec![YearlyResult {
                year: 1,
                production_kwh: 100.0,
                self_consumption_kwh: 60.0,
                exported_kwh: 40.0,
                income: 115.0,
                cumulative_cash_flow: 115.0,
            }],
            total_profit: -885.0,
            payback_years: None,
        };

        let temp_file = tempfile::NamedTempFile::new().unwrap();
        write_ledger_csv(&summary, temp_file.path()).unwrap();

        let written = std::fs::read_to_string(temp_file.path()).unwrap();
        let mut lines = written.lines();
        assert_eq!(
            lines.next(),
            Some("year,production_kwh,self_consumption_kwh,exported_kwh,income,cumulative_cash_flow")
        );
        assert_eq!(lines.next(), Some("1,100.0,60.0,40.0,115.0,115.0"));
    }
}
