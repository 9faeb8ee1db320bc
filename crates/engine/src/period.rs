//! Reporting period used by the analytics operations.

use chrono::{DateTime, TimeZone, Utc};

use crate::{EngineError, ResultEngine};

/// Either a calendar month (UTC) or the whole history.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Period {
    #[default]
    AllTime,
    Month { month: u32, year: i32 },
}

impl Period {
    /// Build a period from raw query values.
    ///
    /// Both values must be present and numeric to select a month; anything
    /// else falls back to all-time. A numeric month outside `1..=12` is
    /// rejected.
    pub fn from_query(month: Option<&str>, year: Option<&str>) -> ResultEngine<Self> {
        let (Some(month), Some(year)) = (month, year) else {
            return Ok(Self::AllTime);
        };
        let (Ok(month), Ok(year)) = (month.trim().parse::<u32>(), year.trim().parse::<i32>())
        else {
            return Ok(Self::AllTime);
        };
        if !(1..=12).contains(&month) {
            return Err(EngineError::InvalidInput(
                "month must be between 1 and 12".to_string(),
            ));
        }
        Ok(Self::Month { month, year })
    }

    /// Half-open `[start, end)` range, `None` for all-time.
    pub fn range(&self) -> ResultEngine<Option<(DateTime<Utc>, DateTime<Utc>)>> {
        match *self {
            Self::AllTime => Ok(None),
            Self::Month { month, year } => {
                let (next_month, next_year) = if month == 12 {
                    (1, year + 1)
                } else {
                    (month + 1, year)
                };
                let start = first_of_month(year, month)?;
                let end = first_of_month(next_year, next_month)?;
                Ok(Some((start, end)))
            }
        }
    }

    pub fn label(&self) -> String {
        match self {
            Self::AllTime => "all-time".to_string(),
            Self::Month { month, year } => format!("{month}/{year}"),
        }
    }
}

fn first_of_month(year: i32, month: u32) -> ResultEngine<DateTime<Utc>> {
    Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0)
        .single()
        .ok_or_else(|| EngineError::InvalidInput(format!("invalid period {month}/{year}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_or_non_numeric_means_all_time() {
        assert_eq!(Period::from_query(None, None).unwrap(), Period::AllTime);
        assert_eq!(Period::from_query(Some("3"), None).unwrap(), Period::AllTime);
        assert_eq!(
            Period::from_query(Some("march"), Some("2025")).unwrap(),
            Period::AllTime
        );
        assert_eq!(Period::AllTime.label(), "all-time");
        assert_eq!(Period::AllTime.range().unwrap(), None);
    }

    #[test]
    fn month_range_is_half_open() {
        let period = Period::from_query(Some("3"), Some("2025")).unwrap();
        assert_eq!(period.label(), "3/2025");
        let (start, end) = period.range().unwrap().unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 4, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn december_rolls_into_next_year() {
        let period = Period::Month { month: 12, year: 2024 };
        let (_, end) = period.range().unwrap().unwrap();
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn month_out_of_range_is_rejected() {
        assert!(Period::from_query(Some("13"), Some("2025")).is_err());
        assert!(Period::from_query(Some("0"), Some("2025")).is_err());
    }
}
