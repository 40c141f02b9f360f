use std::borrow::Cow;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Returns the number of hours in the given calendar year (8760 or 8784)
pub fn hours_in_year(year: i32) -> usize {
    if NaiveDate::from_ymd_opt(year, 2, 29).is_some() {
        8784
    } else {
        8760
    }
}

/// Midnight on January 1st of the given year
pub fn year_start(year: i32) -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(year, 1, 1).and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// An ordered sequence of (timestamp, value) pairs at hourly resolution.
///
/// Timestamps and values are kept in two index-aligned vectors; the economics
/// code works on positions, the timestamps are only used for ordering and
/// calendar grouping.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HourlySeries {
    timestamps: Vec<NaiveDateTime>,
    values: Vec<f64>,
}

impl HourlySeries {
    /// Create a series with one value per hour starting at `start`
    pub fn hourly(start: NaiveDateTime, values: Vec<f64>) -> Self {
        let timestamps = (0..values.len())
            .map(|hour| start + Duration::hours(hour as i64))
            .collect();

        HourlySeries { timestamps, values }
    }

    /// A flat series covering every hour of `year`
    pub fn constant_for_year(year: i32, value: f64) -> Option<Self> {
        let start = year_start(year)?;
        Some(Self::hourly(start, vec![value; hours_in_year(year)]))
    }

    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (NaiveDateTime, f64)>,
    {
        let (timestamps, values) = pairs.into_iter().unzip();
        HourlySeries { timestamps, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.timestamps
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDateTime, f64)> + '_ {
        self.timestamps.iter().copied().zip(self.values.iter().copied())
    }

    pub fn is_sorted(&self) -> bool {
        self.timestamps.windows(2).all(|pair| pair[0] <= pair[1])
    }

    /// Returns the series in chronological order, borrowing when it already is.
    /// Equal timestamps keep their original relative order.
    pub fn sorted(&self) -> Cow<'_, HourlySeries> {
        if self.is_sorted() {
            return Cow::Borrowed(self);
        }

        let mut order: Vec<usize> = (0..self.len()).collect();
        order.sort_by_key(|&index| self.timestamps[index]);

        Cow::Owned(HourlySeries {
            timestamps: order.iter().map(|&index| self.timestamps[index]).collect(),
            values: order.iter().map(|&index| self.values[index]).collect(),
        })
    }

    pub fn sum(&self) -> f64 {
        self.values.iter().sum()
    }

    pub fn mean(&self) -> Option<f64> {
        if self.is_empty() {
            None
        } else {
            Some(self.sum() / self.len() as f64)
        }
    }

    /// Multiply every value by `factor`
    pub fn scaled(&self, factor: f64) -> Self {
        HourlySeries {
            timestamps: self.timestamps.clone(),
            values: self.values.iter().map(|&value| value * factor).collect(),
        }
    }

    /// Rescale the series so that its values sum to `total`
    pub fn normalized_to_total(&self, total: f64) -> Result<Self, String> {
        let current = self.sum();
        if current == 0.0 || !current.is_finite() {
            return Err(format!(
                "Cannot normalize a series whose sum is {} to {}",
                current, total
            ));
        }

        Ok(self.scaled(total / current))
    }

    /// Element-wise product with another series of the same length.
    /// Timestamps are taken from `self`.
    pub fn multiply(&self, other: &HourlySeries) -> Result<Self, String> {
        if self.len() != other.len() {
            return Err(format!(
                "Cannot multiply series of length {} with series of length {}",
                self.len(),
                other.len()
            ));
        }

        Ok(HourlySeries {
            timestamps: self.timestamps.clone(),
            values: self
                .values
                .iter()
                .zip(other.values.iter())
                .map(|(a, b)| a * b)
                .collect(),
        })
    }

    /// Keep only the points that fall into the given calendar year
    pub fn filter_year(&self, year: i32) -> Self {
        Self::from_pairs(self.iter().filter(|(timestamp, _)| timestamp.year() == year))
    }

    /// Sum of values per calendar month (index 0 = January), across all years in the series
    pub fn monthly_totals(&self) -> [f64; 12] {
        let mut totals = [0.0; 12];
        for (timestamp, value) in self.iter() {
            totals[timestamp.month0() as usize] += value;
        }
        totals
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(year: i32, month: u32, day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_hours_in_year() {
        assert_eq!(hours_in_year(2023), 8760);
        assert_eq!(hours_in_year(2024), 8784);
        assert_eq!(hours_in_year(1900), 8760);
        assert_eq!(hours_in_year(2000), 8784);
    }

    #[test]
    fn test_constant_for_year_covers_every_hour() {
        let series = HourlySeries::constant_for_year(2024, 1.0).unwrap();
        assert_eq!(series.len(), 8784);
        assert_eq!(series.timestamps()[0], at(2024, 1, 1, 0));
        assert_eq!(series.timestamps()[8783], at(2024, 12, 31, 23));
        assert!(series.is_sorted());
    }

    #[test]
    fn test_sorted_reorders_by_timestamp() {
        let series = HourlySeries::from_pairs(vec![
            (at(2023, 1, 1, 2), 3.0),
            (at(2023, 1, 1, 0), 1.0),
            (at(2023, 1, 1, 1), 2.0),
        ]);
        assert!(!series.is_sorted());

        let sorted = series.sorted();
        assert!(matches!(sorted, Cow::Owned(_)));
        assert_eq!(sorted.values(), &[1.0, 2.0, 3.0]);
        assert_eq!(sorted.timestamps()[0], at(2023, 1, 1, 0));
    }

    #[test]
    fn test_sorted_borrows_when_already_sorted() {
        let series = HourlySeries::hourly(at(2023, 1, 1, 0), vec![1.0, 2.0]);
        assert!(matches!(series.sorted(), Cow::Borrowed(_)));
    }

    #[test]
    fn test_normalized_to_total() {
        let series = HourlySeries::hourly(at(2023, 1, 1, 0), vec![1.0, 3.0]);
        let normalized = series.normalized_to_total(100.0).unwrap();
        assert_eq!(normalized.values(), &[25.0, 75.0]);

        let zeros = HourlySeries::hourly(at(2023, 1, 1, 0), vec![0.0, 0.0]);
        assert!(zeros.normalized_to_total(100.0).is_err());
    }

    #[test]
    fn test_multiply() {
        let a = HourlySeries::hourly(at(2023, 1, 1, 0), vec![1.0, 2.0, 3.0]);
        let b = HourlySeries::hourly(at(2023, 1, 1, 0), vec![2.0, 0.5, 0.0]);
        assert_eq!(a.multiply(&b).unwrap().values(), &[2.0, 1.0, 0.0]);

        let short = HourlySeries::hourly(at(2023, 1, 1, 0), vec![1.0]);
        assert!(a.multiply(&short).is_err());
    }

    #[test]
    fn test_filter_year_and_monthly_totals() {
        let series = HourlySeries::from_pairs(vec![
            (at(2022, 12, 31, 23), 5.0),
            (at(2023, 1, 1, 0), 1.0),
            (at(2023, 1, 31, 23), 1.0),
            (at(2023, 2, 1, 0), 2.0),
            (at(2023, 12, 31, 23), 4.0),
        ]);

        let year = series.filter_year(2023);
        assert_eq!(year.len(), 4);

        let totals = year.monthly_totals();
        assert_eq!(totals[0], 2.0);
        assert_eq!(totals[1], 2.0);
        assert_eq!(totals[11], 4.0);
        assert_eq!(totals.iter().sum::<f64>(), 8.0);
    }
}
