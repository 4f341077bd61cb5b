//! Reshapes per-stock monthly rows into one calendar-indexed table.

use crate::calendar::{first_of_month, last_of_month, roc_to_date, DateError};
use crate::crawler::StockSeries;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use thiserror::Error;

pub const INDEX_LABEL: &str = "date";
const ROC_SEPARATOR: &str = "/";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    #[error("no price rows to build a table from")]
    EmptyInput,
    #[error("{stock_no}: {source}")]
    Date {
        stock_no: String,
        #[source]
        source: DateError,
    },
}

/// Dense dates × stocks table. Missing cells hold an empty string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceTable {
    pub dates: Vec<NaiveDate>,
    pub stock_nos: Vec<String>,
    /// One row per entry of `dates`, one cell per entry of `stock_nos`.
    pub rows: Vec<Vec<String>>,
}

impl PriceTable {
    pub fn index_label(&self) -> &'static str {
        INDEX_LABEL
    }

    #[cfg(test)]
    pub fn get(&self, date: NaiveDate, stock_no: &str) -> Option<&str> {
        let row = self.dates.binary_search(&date).ok()?;
        let col = self.stock_nos.iter().position(|s| s == stock_no)?;
        Some(self.rows[row][col].as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, &[String])> + '_ {
        self.dates
            .iter()
            .copied()
            .zip(self.rows.iter().map(Vec::as_slice))
    }
}

fn by_date(series: &StockSeries) -> Result<BTreeMap<NaiveDate, &str>, TableError> {
    // Later rows for the same date overwrite earlier ones.
    series
        .rows
        .iter()
        .map(|row| {
            roc_to_date(row.date(), ROC_SEPARATOR)
                .map(|date| (date, row.price()))
                .map_err(|source| TableError::Date {
                    stock_no: series.stock_no.clone(),
                    source,
                })
        })
        .collect()
}

/// Every calendar day from the first of the earliest month to the end of the latest month.
fn covered_days(first: NaiveDate, last: NaiveDate) -> Vec<NaiveDate> {
    let end = last_of_month(last);
    let mut days = Vec::new();
    let mut day = Some(first_of_month(first));
    while let Some(d) = day.filter(|d| *d <= end) {
        days.push(d);
        day = d.succ_opt();
    }
    days
}

pub fn build_table(data: &[StockSeries]) -> Result<PriceTable, TableError> {
    let columns = data
        .iter()
        .map(by_date)
        .collect::<Result<Vec<_>, _>>()?;
    let first = columns.iter().filter_map(|c| c.keys().next()).min();
    let last = columns.iter().filter_map(|c| c.keys().next_back()).max();
    let (first, last) = match first.zip(last) {
        Some((first, last)) => (*first, *last),
        None => return Err(TableError::EmptyInput),
    };

    let dates = covered_days(first, last);
    let rows = dates
        .iter()
        .map(|date| {
            columns
                .iter()
                .map(|c| c.get(date).map(|p| p.to_string()).unwrap_or_default())
                .collect()
        })
        .collect();
    Ok(PriceTable {
        dates,
        stock_nos: data.iter().map(|s| s.stock_no.clone()).collect(),
        rows,
    })
}
