use chrono::prelude::*;
use chrono_tz::Asia::Taipei;
use thiserror::Error;

/// Offset between the ROC (Minguo) calendar year and the Gregorian year.
pub const ROC_EPOCH_OFFSET: i32 = 1911;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DateError {
    #[error("malformed ROC date {input:?}: expected three integer fields separated by {separator:?}")]
    Malformed { input: String, separator: String },
    #[error("ROC date {input:?} is not a valid calendar date")]
    OutOfRange { input: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("year {year} has not started yet (current year is {current})")]
pub struct FutureYearError {
    pub year: i32,
    pub current: i32,
}

/// Converts an ROC date such as `111/01/01` into a Gregorian date.
pub fn roc_to_date(roc_date: &str, separator: &str) -> Result<NaiveDate, DateError> {
    let malformed = || DateError::Malformed {
        input: roc_date.to_string(),
        separator: separator.to_string(),
    };
    let fields = roc_date
        .split(separator)
        .map(|field| field.trim().parse::<i32>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| malformed())?;
    let (roc_year, month, day) = match fields.as_slice() {
        &[y, m, d] => (y, m, d),
        _ => return Err(malformed()),
    };
    let out_of_range = || DateError::OutOfRange {
        input: roc_date.to_string(),
    };
    let month = u32::try_from(month).map_err(|_| out_of_range())?;
    let day = u32::try_from(day).map_err(|_| out_of_range())?;
    let year = roc_year
        .checked_add(ROC_EPOCH_OFFSET)
        .ok_or_else(out_of_range)?;
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(out_of_range)
}

/// Months of `year` that can have data as of `today`.
pub fn months_for_year(year: i32, today: NaiveDate) -> Result<Vec<u32>, FutureYearError> {
    match today.year() {
        current if current < year => Err(FutureYearError { year, current }),
        current if current == year => Ok((1..=today.month()).collect()),
        _ => Ok((1..=12).collect()),
    }
}

/// The current date on the exchange's calendar.
pub fn today() -> NaiveDate {
    Utc::now().with_timezone(&Taipei).date_naive()
}

pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

pub fn last_of_month(date: NaiveDate) -> NaiveDate {
    let (year, month) = match date.month() {
        12 => (date.year() + 1, 1),
        m => (date.year(), m + 1),
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|next| next.pred_opt())
        .unwrap_or(date)
}
