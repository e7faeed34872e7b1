//! Resolution of date-filter keywords into UTC time intervals

use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, Utc};
use serde::Deserialize;

/// Symbolic date filter accepted by the listing endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFilter {
    Today,
    CurrentWeek,
    LastWeek,
    CurrentMonth,
    LastMonth,
    Upcoming,
    Past,
}

impl FromStr for DateFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "today" => Ok(DateFilter::Today),
            "current-week" => Ok(DateFilter::CurrentWeek),
            "last-week" => Ok(DateFilter::LastWeek),
            "current-month" => Ok(DateFilter::CurrentMonth),
            "last-month" => Ok(DateFilter::LastMonth),
            "upcoming" => Ok(DateFilter::Upcoming),
            "past" => Ok(DateFilter::Past),
            _ => Err(format!("Unknown date filter: {}", s)),
        }
    }
}

/// Day on which a calendar week begins
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekStart {
    #[default]
    Sunday,
    Monday,
}

impl WeekStart {
    fn days_since_start(self, date: NaiveDate) -> i64 {
        let weekday = date.weekday();
        let days = match self {
            WeekStart::Sunday => weekday.num_days_from_sunday(),
            WeekStart::Monday => weekday.num_days_from_monday(),
        };
        i64::from(days)
    }
}

/// Half-open UTC interval `[start, end)`; a missing side is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start.map_or(true, |start| instant >= start)
            && self.end.map_or(true, |end| instant < end)
    }
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.day0()))
}

impl DateFilter {
    /// Interval covered by this filter, evaluated against `now`.
    ///
    /// Only UTC calendar fields are used.
    pub fn resolve(self, now: DateTime<Utc>, week_start: WeekStart) -> DateRange {
        let today = now.date_naive();
        let today_start = midnight(today);

        match self {
            DateFilter::Today => DateRange::between(today_start, today_start + Duration::days(1)),
            DateFilter::CurrentWeek => {
                let start = today_start - Duration::days(week_start.days_since_start(today));
                DateRange::between(start, start + Duration::days(7))
            }
            DateFilter::LastWeek => {
                let start = today_start - Duration::days(week_start.days_since_start(today) + 7);
                DateRange::between(start, start + Duration::days(7))
            }
            DateFilter::CurrentMonth => {
                let first = first_of_month(today);
                DateRange::between(midnight(first), midnight(first + Months::new(1)))
            }
            DateFilter::LastMonth => {
                let first = first_of_month(today);
                DateRange::between(midnight(first - Months::new(1)), midnight(first))
            }
            DateFilter::Upcoming => DateRange {
                start: Some(today_start),
                end: None,
            },
            DateFilter::Past => DateRange {
                start: None,
                end: Some(today_start),
            },
        }
    }
}

/// Resolve an optional raw keyword; unknown or empty keywords impose no bound.
pub fn resolve_keyword(
    keyword: Option<&str>,
    now: DateTime<Utc>,
    week_start: WeekStart,
) -> Option<DateRange> {
    let keyword = keyword.map(str::trim).filter(|k| !k.is_empty())?;
    match keyword.parse::<DateFilter>() {
        Ok(filter) => Some(filter.resolve(now, week_start)),
        Err(_) => {
            tracing::debug!(keyword, "Ignoring unknown date filter");
            None
        }
    }
}
