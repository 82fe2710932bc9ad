//! Inclusive date ranges and parsing the date range chosen in the dashboard's date pickers.

use serde::Deserialize;
use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

use crate::Error;

const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// A closed range of days, `start..=end`.
///
/// The bounds are always ordered so that `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: Date,
    end: Date,
}

impl DateRange {
    /// Create a range covering every day from the earlier of `a` and `b` to the later.
    pub fn new(a: Date, b: Date) -> Self {
        if a <= b {
            Self { start: a, end: b }
        } else {
            Self { start: b, end: a }
        }
    }

    /// The first day in the range.
    pub fn start(&self) -> Date {
        self.start
    }

    /// The last day in the range.
    pub fn end(&self) -> Date {
        self.end
    }

    /// Whether `date` falls within the range, inclusive of both ends.
    pub fn contains(&self, date: Date) -> bool {
        self.start <= date && date <= self.end
    }
}

/// The query parameters for the dashboard's date range, e.g. `?start=2018-01-01&end=2018-01-31`.
///
/// Dates use the `YYYY-MM-DD` format that HTML date inputs submit.
#[derive(Debug, Default, Deserialize)]
pub struct DateRangeQuery {
    /// The first day to include.
    pub start: Option<String>,
    /// The last day to include.
    pub end: Option<String>,
}

impl DateRangeQuery {
    /// Resolve the query into a date range.
    ///
    /// A missing or empty bound falls back to the matching bound of `default`.
    /// If the start date is after the end date, the two are swapped.
    ///
    /// # Errors
    /// Returns [Error::InvalidDate] if either bound is not a valid `YYYY-MM-DD` date.
    pub fn resolve(&self, default: DateRange) -> Result<DateRange, Error> {
        let start = parse_date_param(self.start.as_deref())?.unwrap_or(default.start());
        let end = parse_date_param(self.end.as_deref())?.unwrap_or(default.end());

        Ok(DateRange::new(start, end))
    }
}

fn parse_date_param(text: Option<&str>) -> Result<Option<Date>, Error> {
    match text.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => Date::parse(text, DATE_FORMAT)
            .map(Some)
            .map_err(|error| {
                tracing::debug!("Could not parse date {text:?}: {error}");
                Error::InvalidDate(text.to_owned())
            }),
    }
}

/// Formats `date` as `YYYY-MM-DD` for date inputs and display.
pub fn format_date(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}
