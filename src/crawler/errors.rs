use crate::calendar::FutureYearError;
use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("TWSE API failed for {stock_no} {year}/{month:02}: HTTP {status}")]
    Api {
        stock_no: String,
        year: i32,
        month: u32,
        status: StatusCode,
    },
    #[error("TWSE data invalid for {stock_no} {year}/{month:02}: {reason}")]
    Data {
        stock_no: String,
        year: i32,
        month: u32,
        reason: String,
    },
    #[error("request to TWSE failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error(transparent)]
    FutureYear(#[from] FutureYearError),
}
