use anyhow::{Context, Result, anyhow};
use chrono::{Datelike, Duration, Timelike};
use pv_model::HourlySeries;
use pv_model::general::series::{hours_in_year, year_start};
use std::path::Path;
use tracing::info;

use crate::general::spreadsheet::{cell_as_f64, read_worksheet};

/// Sheet with the typical-day production profile per month
pub const PROFILE_SHEET: &str = "Hourly_profiles";
/// Rows above the first profile row (four preamble rows and a header row)
const PROFILE_FIRST_ROW: u32 = 5;
/// Column of January; the following eleven columns hold the other months
const PROFILE_FIRST_COLUMN: u32 = 1;

/// Production of a typical day for each month: `[month][hour]`
pub type MonthlyDayProfiles = [[f64; 24]; 12];

/// Reads the 24 x 12 typical-day table from a solar atlas report workbook
pub fn load_production_profiles_xlsx(file_path: &Path) -> Result<MonthlyDayProfiles> {
    let range = read_worksheet(file_path, Some(PROFILE_SHEET))?;

    let mut profiles = [[0.0; 24]; 12];
    for (month, profile) in profiles.iter_mut().enumerate() {
        for (hour, value) in profile.iter_mut().enumerate() {
            let row = PROFILE_FIRST_ROW + hour as u32;
            let column = PROFILE_FIRST_COLUMN + month as u32;
            *value = range
                .get_value((row, column))
                .and_then(cell_as_f64)
                .with_context(|| {
                    format!(
                        "Missing production value for month {} hour {} (row {}, column {})",
                        month + 1,
                        hour,
                        row + 1,
                        column + 1
                    )
                })?;
        }
    }

    Ok(profiles)
}

/// Builds an hourly production series for `year` by repeating each month's
/// typical day for every day of that month, scaled so the year sums to `yearly_total` kWh
pub fn expand_day_profiles(
    profiles: &MonthlyDayProfiles,
    year: i32,
    yearly_total: f64,
) -> Result<HourlySeries> {
    let start = year_start(year).ok_or_else(|| anyhow!("Invalid year: {}", year))?;

    let series = HourlySeries::from_pairs((0..hours_in_year(year)).map(|hour| {
        let timestamp = start + Duration::hours(hour as i64);
        let value = profiles[timestamp.month0() as usize][timestamp.hour() as usize];
        (timestamp, value)
    }));

    let production = series
        .normalized_to_total(yearly_total)
        .map_err(|e| anyhow!(e))
        .context("Production profile cannot be scaled")?;

    info!(year, total_kwh = production.sum(), "prepared production profile");
    Ok(production)
}
