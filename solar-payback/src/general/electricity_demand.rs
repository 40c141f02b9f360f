use anyhow::{Context, Result, anyhow, ensure};
use chrono::{DateTime, Datelike, Duration, NaiveDateTime};
use pv_model::general::series::{hours_in_year, year_start};
use pv_model::{HourlySeries, MonthlyConsumption};
use serde::Deserialize;
use std::path::Path;
use tracing::{info, warn};

/// One row of an hourly consumption export (e.g. Elhub "consumption per group")
#[derive(Debug, Deserialize)]
struct ConsumptionRecord {
    #[serde(rename = "START_TIME")]
    start_time: String,
    #[serde(rename = "QUANTITY_KWH")]
    quantity_kwh: f64,
    #[serde(rename = "PRICE_AREA", default)]
    price_area: Option<String>,
    #[serde(rename = "CONSUMPTION_GROUP", default)]
    consumption_group: Option<String>,
}

/// Which rows of a consumption export to keep
#[derive(Debug, Clone, Default)]
pub struct ConsumptionFilter {
    pub price_area: Option<String>,
    pub consumption_group: Option<String>,
}

impl ConsumptionFilter {
    fn accepts(&self, record: &ConsumptionRecord) -> bool {
        matches_column(&self.price_area, &record.price_area)
            && matches_column(&self.consumption_group, &record.consumption_group)
    }
}

/// A filter only applies when the file actually has the column
fn matches_column(wanted: &Option<String>, actual: &Option<String>) -> bool {
    match (wanted, actual) {
        (Some(wanted), Some(actual)) => wanted == actual,
        _ => true,
    }
}

/// Parse a timestamp with UTC offset and return it as naive UTC time
pub fn parse_utc_timestamp(value: &str) -> Result<NaiveDateTime> {
    let trimmed = value.trim();
    DateTime::parse_from_rfc3339(trimmed)
        .or_else(|_| DateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%:z"))
        .or_else(|_| DateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%.f%:z"))
        .map(|timestamp| timestamp.naive_utc())
        .with_context(|| format!("Failed to parse timestamp '{}'", trimmed))
}

/// Loads hourly household consumption from a CSV export
///
/// # Arguments
/// * `file_path` - CSV with `START_TIME` and `QUANTITY_KWH` columns, optionally
///   `PRICE_AREA` and `CONSUMPTION_GROUP`
/// * `filter` - rows to keep when the optional columns are present
///
/// # Returns
/// * Consumption in kWh indexed by naive UTC timestamps, in chronological order
pub fn load_consumption_csv(file_path: &Path, filter: &ConsumptionFilter) -> Result<HourlySeries> {
    let mut reader = csv::Reader::from_path(file_path)
        .with_context(|| format!("Failed to open file: {}", file_path.display()))?;

    let mut pairs = Vec::new();
    for (line_num, record) in reader.deserialize::<ConsumptionRecord>().enumerate() {
        let record =
            record.with_context(|| format!("Failed to read record {}", line_num + 1))?;
        if !filter.accepts(&record) {
            continue;
        }

        let timestamp = parse_utc_timestamp(&record.start_time)
            .with_context(|| format!("Invalid START_TIME in record {}", line_num + 1))?;
        pairs.push((timestamp, record.quantity_kwh));
    }

    if pairs.is_empty() {
        warn!(path = %file_path.display(), "no consumption rows matched the filter");
    }

    Ok(HourlySeries::from_pairs(pairs).sorted().into_owned())
}

/// Restrict consumption to one year and normalize it to the requested yearly total in kWh
pub fn consumption_for_year(consumption: &HourlySeries, year: i32, total: f64) -> Result<HourlySeries> {
    let yearly = consumption.filter_year(year);
    ensure!(!yearly.is_empty(), "No consumption data for year {}", year);

    let normalized = yearly.normalized_to_total(total).map_err(|e| anyhow!(e))?;
    info!(
        year,
        hours = normalized.len(),
        total_kwh = normalized.sum(),
        "prepared consumption profile"
    );
    Ok(normalized)
}

/// Average monthly totals over several years of hourly consumption
pub fn average_monthly_consumption(years: &[HourlySeries]) -> Result<MonthlyConsumption> {
    ensure!(
        !years.is_empty(),
        "At least one year of consumption is needed to build an average"
    );

    let mut sums = [0.0; 12];
    for series in years {
        for (month, total) in series.monthly_totals().iter().enumerate() {
            sums[month] += total;
        }
    }

    let count = years.len() as f64;
    Ok(MonthlyConsumption::from_array(sums.map(|sum| sum / count)))
}

/// Ratio of a household's actual monthly consumption to an average household
pub fn adoption_factor(
    actual: &MonthlyConsumption,
    average: &MonthlyConsumption,
) -> Result<[f64; 12]> {
    let actual = actual.to_array();
    let average = average.to_array();

    let mut factors = [0.0; 12];
    for month in 0..12 {
        ensure!(
            average[month] != 0.0,
            "Average consumption for month {} is zero",
            month + 1
        );
        factors[month] = actual[month] / average[month];
    }
    Ok(factors)
}

/// Spread twelve monthly factors over every hour of `year`.
///
/// Each month's factor is repeated for all of its hours, giving 8760 or 8784
/// values that can be multiplied onto an hourly consumption profile.
pub fn apparent_adoption_factor(factors: &[f64; 12], year: i32) -> Result<HourlySeries> {
    let start = year_start(year).ok_or_else(|| anyhow!("Invalid year: {}", year))?;

    Ok(HourlySeries::from_pairs((0..hours_in_year(year)).map(|hour| {
        let timestamp = start + Duration::hours(hour as i64);
        (timestamp, factors[timestamp.month0() as usize])
    })))
}

/// Generates a scaled hourly load curve based on monthly demand totals
///
/// # Arguments
/// * `monthly_demand` - target consumption per calendar month in kWh
/// * `base_hourly_demand` - hourly profile for one year in kWh
///
/// # Returns
/// * Hourly profile where each month sums to its target. Months without any
///   base consumption stay at zero.
pub fn generate_scaled_load_curve(
    monthly_demand: &MonthlyConsumption,
    base_hourly_demand: &HourlySeries,
) -> Result<HourlySeries> {
    let years: Vec<i32> = base_hourly_demand
        .timestamps()
        .iter()
        .map(|timestamp| timestamp.year())
        .collect();
    ensure!(
        years.windows(2).all(|pair| pair[0] == pair[1]),
        "Base hourly demand must cover a single calendar year"
    );

    let base_monthly = base_hourly_demand.monthly_totals();
    let targets = monthly_demand.to_array();

    let scaling: [f64; 12] = std::array::from_fn(|month| {
        if base_monthly[month] > 0.0 {
            targets[month] / base_monthly[month]
        } else {
            0.0
        }
    });

    Ok(HourlySeries::from_pairs(base_hourly_demand.iter().map(
        |(timestamp, value)| (timestamp, value * scaling[timestamp.month0() as usize]),
    )))
}
