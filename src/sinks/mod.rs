use reqwest::StatusCode;
use thiserror::Error;

mod csv;
mod gsheet;
pub use self::csv::*;
pub use self::gsheet::*;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to write CSV: {0}")]
    Csv(#[from] ::csv::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("price {price:?} for {stock_no} on {date} is not a number")]
    InvalidPrice {
        stock_no: String,
        date: chrono::NaiveDate,
        price: String,
    },
    #[error("request to Google Sheets failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Google Sheets returned HTTP {status}: {body}")]
    Api { status: StatusCode, body: String },
}
