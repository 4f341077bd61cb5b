use crate::calendar::months_for_year;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info};

mod errors;
mod twse;
pub use errors::*;
pub use twse::*;

/// One day of a monthly payload: `[ROC date, average price]`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawRow(pub String, pub String);

impl RawRow {
    pub fn date(&self) -> &str {
        &self.0
    }

    pub fn price(&self) -> &str {
        &self.1
    }
}

/// Rows gathered for one stock, in fetch order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockSeries {
    pub stock_no: String,
    pub rows: Vec<RawRow>,
}

/// Series per stock, in the order the stocks were requested.
pub type PriceData = Vec<StockSeries>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Months {
    Explicit(Vec<u32>),
    /// Every month of the year that has started so far.
    Resolve,
}

#[async_trait]
pub trait PriceSource {
    async fn fetch(&self, stock_no: &str, year: i32, month: u32) -> Result<Vec<RawRow>, CrawlError>;
}

/// Fetches every (stock, month) pair one after another, sleeping `pacing` after each call.
///
/// The first failure aborts the whole crawl and nothing gathered so far is returned.
pub async fn crawl_all<S, T>(
    source: &S,
    stock_nos: &[T],
    year: i32,
    months: Months,
    today: NaiveDate,
    pacing: Duration,
) -> Result<PriceData, CrawlError>
where
    S: PriceSource + Sync,
    T: AsRef<str>,
{
    let months = match months {
        Months::Explicit(months) => months,
        Months::Resolve => months_for_year(year, today)?,
    };
    let tickers: Vec<&str> = stock_nos.iter().map(AsRef::as_ref).collect();
    info!("Crawling data for {:?} in {}/{:?}", tickers, year, months);

    let mut all_data: PriceData = Vec::new();
    for stock_no in tickers {
        let idx = match all_data.iter().position(|s| s.stock_no == stock_no) {
            Some(idx) => idx,
            None => {
                all_data.push(StockSeries {
                    stock_no: stock_no.to_string(),
                    rows: Vec::new(),
                });
                all_data.len() - 1
            }
        };
        for &month in &months {
            let rows = source.fetch(stock_no, year, month).await?;
            debug!("{} {}/{:02}: {} rows", stock_no, year, month, rows.len());
            all_data[idx].rows.extend(rows);
            // Also sleeps after the final call.
            sleep(pacing).await;
        }
    }
    Ok(all_data)
}
