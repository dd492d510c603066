//! Regularly spaced time series anchored to a calendar period.

use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use std::fmt;

/// Default number of periods per year for monthly data.
pub const MONTHLY: usize = 12;

/// Position of an observation on a regular calendar: a year and a
/// 1-based season within that year (the month for monthly data).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period {
    year: i32,
    season: usize,
}

impl Period {
    /// Create a new period. `season` is 1-based.
    pub fn new(year: i32, season: usize) -> Self {
        Self { year, season }
    }

    /// January of the given year.
    pub fn january(year: i32) -> Self {
        Self::new(year, 1)
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// 1-based season (month) within the year.
    pub fn season(&self) -> usize {
        self.season
    }

    /// Move `steps` periods forward (negative moves backward) on a calendar
    /// with `frequency` periods per year.
    pub fn advance(&self, steps: i64, frequency: usize) -> Self {
        let freq = frequency as i64;
        let index = self.year as i64 * freq + (self.season as i64 - 1) + steps;
        Self {
            year: index.div_euclid(freq) as i32,
            season: index.rem_euclid(freq) as usize + 1,
        }
    }

    /// Signed number of periods from `self` to `other`.
    pub fn periods_until(&self, other: &Period, frequency: usize) -> i64 {
        let freq = frequency as i64;
        (other.year as i64 - self.year as i64) * freq + other.season as i64 - self.season as i64
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.season)
    }
}

/// An immutable, gap-free series of observations at a fixed frequency.
///
/// The time index is implicit: observation `i` sits at `start.advance(i)`.
/// All windowing operations return new series and never mutate `self`.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    values: Vec<f64>,
    start: Period,
    frequency: usize,
}

impl TimeSeries {
    /// Create a series with an explicit start period and frequency.
    pub fn new(values: Vec<f64>, start: Period, frequency: usize) -> Result<Self> {
        if values.is_empty() {
            return Err(ForecastError::EmptyData);
        }
        if frequency == 0 {
            return Err(ForecastError::InvalidParameter(
                "frequency must be positive".to_string(),
            ));
        }
        if start.season == 0 || start.season > frequency {
            return Err(ForecastError::InvalidParameter(format!(
                "start season {} outside 1..={}",
                start.season, frequency
            )));
        }
        if let Some(i) = values.iter().position(|v| !v.is_finite()) {
            return Err(ForecastError::InvalidParameter(format!(
                "non-finite value at position {}",
                i
            )));
        }

        Ok(Self {
            values,
            start,
            frequency,
        })
    }

    /// Create a monthly series starting at the given year and month.
    pub fn monthly(values: Vec<f64>, year: i32, month: usize) -> Result<Self> {
        Self::new(values, Period::new(year, month), MONTHLY)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn start(&self) -> Period {
        self.start
    }

    /// Periods per year.
    pub fn frequency(&self) -> usize {
        self.frequency
    }

    /// Period of the observation at `index`.
    pub fn period_at(&self, index: usize) -> Period {
        self.start.advance(index as i64, self.frequency)
    }

    /// Period of the last observation.
    pub fn end_period(&self) -> Period {
        self.period_at(self.len() - 1)
    }

    /// Period immediately following the last observation.
    pub fn next_period(&self) -> Period {
        self.period_at(self.len())
    }

    /// 1-based season (month) of the observation at `index`.
    pub fn season_of(&self, index: usize) -> usize {
        self.period_at(index).season
    }

    /// First day of each observation's month. Only defined for monthly data.
    pub fn dates(&self) -> Result<Vec<NaiveDate>> {
        if self.frequency != MONTHLY {
            return Err(ForecastError::InvalidParameter(format!(
                "calendar dates need monthly data, frequency is {}",
                self.frequency
            )));
        }
        (0..self.len())
            .map(|i| {
                let p = self.period_at(i);
                NaiveDate::from_ymd_opt(p.year, p.season as u32, 1).ok_or_else(|| {
                    ForecastError::InvalidParameter(format!("period {} is not a valid date", p))
                })
            })
            .collect()
    }

    /// First `n` observations.
    pub fn head(&self, n: usize) -> Result<Self> {
        if n == 0 || n > self.len() {
            return Err(ForecastError::IndexOutOfBounds {
                index: n,
                size: self.len(),
            });
        }
        Self::new(self.values[..n].to_vec(), self.start, self.frequency)
    }

    /// Alias of [`TimeSeries::head`].
    pub fn truncate(&self, n: usize) -> Result<Self> {
        self.head(n)
    }

    /// Last `n` observations.
    pub fn tail(&self, n: usize) -> Result<Self> {
        if n == 0 || n > self.len() {
            return Err(ForecastError::IndexOutOfBounds {
                index: n,
                size: self.len(),
            });
        }
        let skip = self.len() - n;
        Self::new(
            self.values[skip..].to_vec(),
            self.period_at(skip),
            self.frequency,
        )
    }

    /// Split into `(prefix, suffix)` at `index`; both parts must be non-empty.
    pub fn split_at(&self, index: usize) -> Result<(Self, Self)> {
        if index == 0 || index >= self.len() {
            return Err(ForecastError::IndexOutOfBounds {
                index,
                size: self.len(),
            });
        }
        let prefix = self.head(index)?;
        let suffix = self.tail(self.len() - index)?;
        Ok((prefix, suffix))
    }

    /// Append `other`, which must start right after `self` ends.
    pub fn concat(&self, other: &TimeSeries) -> Result<Self> {
        if other.frequency != self.frequency {
            return Err(ForecastError::InvalidParameter(format!(
                "cannot join frequency {} with {}",
                self.frequency, other.frequency
            )));
        }
        if other.start != self.next_period() {
            return Err(ForecastError::InvalidParameter(format!(
                "series ending {} cannot be followed by one starting {}",
                self.end_period(),
                other.start
            )));
        }
        let mut values = self.values.clone();
        values.extend_from_slice(&other.values);
        Self::new(values, self.start, self.frequency)
    }

    /// Same values with the start moved by `steps` periods.
    pub fn offset(&self, steps: i64) -> Self {
        Self {
            values: self.values.clone(),
            start: self.start.advance(steps, self.frequency),
            frequency: self.frequency,
        }
    }

    /// New series with the same calendar but different values.
    pub fn with_values(&self, values: Vec<f64>) -> Result<Self> {
        if values.len() != self.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: self.len(),
                got: values.len(),
            });
        }
        Self::new(values, self.start, self.frequency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(n: usize) -> TimeSeries {
        TimeSeries::monthly((0..n).map(|i| i as f64).collect(), 2001, 1).unwrap()
    }

    #[test]
    fn period_advance_wraps_years() {
        let p = Period::new(2001, 11);
        assert_eq!(p.advance(1, 12), Period::new(2001, 12));
        assert_eq!(p.advance(2, 12), Period::new(2002, 1));
        assert_eq!(p.advance(-11, 12), Period::new(2000, 12));
        assert_eq!(p.advance(26, 12), Period::new(2004, 1));
        assert_eq!(Period::new(2001, 3).periods_until(&Period::new(2002, 2), 12), 11);
        assert_eq!(Period::new(2001, 3).to_string(), "2001-03");
    }

    #[test]
    fn rejects_invalid_construction() {
        assert!(matches!(
            TimeSeries::monthly(vec![], 2001, 1),
            Err(ForecastError::EmptyData)
        ));
        assert!(TimeSeries::monthly(vec![1.0, f64::NAN], 2001, 1).is_err());
        assert!(TimeSeries::monthly(vec![1.0], 2001, 13).is_err());
        assert!(TimeSeries::new(vec![1.0], Period::january(2001), 0).is_err());
    }

    #[test]
    fn calendar_positions() {
        let ts = series(120);
        assert_eq!(ts.start(), Period::january(2001));
        assert_eq!(ts.end_period(), Period::new(2010, 12));
        assert_eq!(ts.next_period(), Period::january(2011));
        assert_eq!(ts.season_of(13), 2);

        let dates = ts.dates().unwrap();
        assert_eq!(dates[0], NaiveDate::from_ymd_opt(2001, 1, 1).unwrap());
        assert_eq!(dates[119], NaiveDate::from_ymd_opt(2010, 12, 1).unwrap());
    }

    #[test]
    fn split_and_concat_round_trip() {
        let ts = series(120);
        let (train, test) = ts.split_at(108).unwrap();
        assert_eq!(train.len(), 108);
        assert_eq!(test.len(), 12);
        assert_eq!(test.start(), Period::january(2010));
        assert_eq!(test.values()[0], 108.0);

        let joined = train.concat(&test).unwrap();
        assert_eq!(joined, ts);

        // Out of order
        assert!(test.concat(&train).is_err());
    }

    #[test]
    fn windowing_is_pure() {
        let ts = series(24);
        let head = ts.head(5).unwrap();
        let tail = ts.tail(5).unwrap();
        assert_eq!(ts.len(), 24);
        assert_eq!(head.values(), &[0.0, 1.0, 2.0, 3.0, 4.0]);
        assert_eq!(tail.start(), Period::new(2002, 8));
        assert_eq!(ts.truncate(5).unwrap(), head);
        assert!(ts.head(0).is_err());
        assert!(ts.tail(25).is_err());
        assert!(ts.split_at(24).is_err());

        let shifted = ts.offset(-12);
        assert_eq!(shifted.start(), Period::january(2000));
        assert_eq!(shifted.values(), ts.values());
    }

    #[test]
    fn dates_require_monthly_frequency() {
        let quarterly = TimeSeries::new(vec![1.0, 2.0], Period::january(2001), 4).unwrap();
        assert!(quarterly.dates().is_err());
        assert_eq!(quarterly.period_at(5), Period::new(2002, 2));
    }
}
