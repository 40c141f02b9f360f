use anyhow::{Result, bail};
use chrono::{Datelike, NaiveDateTime};
use pv_model::HourlySeries;
use std::path::Path;
use tracing::{info, warn};

use crate::general::spreadsheet::{cell_as_f64, cell_as_str, read_worksheet};

/// Header of the timestamp column in the spot price export
pub const TIMESTAMP_COLUMN: &str = "Dato/klokkeslett";

/// Parse a spot price interval label such as `2023-01-01 Kl. 00-01`.
///
/// The `Kl.` marker, dashes and whitespace are removed and the trailing end hour
/// is dropped, leaving `YYYYMMDDHH` for the start of the interval.
pub fn parse_price_timestamp(label: &str) -> Option<NaiveDateTime> {
    let cleaned: String = label
        .to_lowercase()
        .replace("kl.", "")
        .chars()
        .filter(|c| *c != '-' && !c.is_whitespace())
        .collect();

    let start = cleaned.get(..cleaned.len().checked_sub(2)?)?;
    NaiveDateTime::parse_from_str(&format!("{start}00"), "%Y%m%d%H%M").ok()
}

/// Reads hourly spot prices (NOK/kWh) for one price area from the first sheet of an Excel export
///
/// # Arguments
/// * `file_path` - workbook with a `Dato/klokkeslett` column and one column per price area
/// * `price_area` - column to read, e.g. `NO1`
/// * `year` - keep only this calendar year when given
pub fn load_spot_prices_xlsx(
    file_path: &Path,
    price_area: &str,
    year: Option<i32>,
) -> Result<HourlySeries> {
    let range = read_worksheet(file_path, None)?;

    let mut rows = range.rows();
    let mut columns = None;
    for row in rows.by_ref() {
        let position = |name: &str| row.iter().position(|cell| cell_as_str(cell) == Some(name));
        if let (Some(timestamp_col), Some(price_col)) =
            (position(TIMESTAMP_COLUMN), position(price_area))
        {
            columns = Some((timestamp_col, price_col));
            break;
        }
    }

    let Some((timestamp_col, price_col)) = columns else {
        bail!(
            "Could not find '{}' and '{}' columns in {}",
            TIMESTAMP_COLUMN,
            price_area,
            file_path.display()
        );
    };

    let mut pairs = Vec::new();
    let mut skipped = 0;
    for row in rows {
        let timestamp = row
            .get(timestamp_col)
            .and_then(cell_as_str)
            .and_then(parse_price_timestamp);
        let price = row.get(price_col).and_then(cell_as_f64);

        match (timestamp, price) {
            (Some(timestamp), Some(price)) => {
                if year.is_none_or(|year| timestamp.year() == year) {
                    pairs.push((timestamp, price));
                }
            }
            _ => skipped += 1,
        }
    }

    if skipped > 0 {
        warn!(skipped, path = %file_path.display(), "skipped unreadable spot price rows");
    }

    let prices = HourlySeries::from_pairs(pairs).sorted().into_owned();
    info!(
        price_area,
        hours = prices.len(),
        average_price = prices.mean().unwrap_or(0.0),
        "loaded spot prices"
    );
    Ok(prices)
}
