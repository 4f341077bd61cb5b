use crate::crawler::{CrawlError, PriceSource, RawRow};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

pub const STOCK_DAY_AVG_URL: &str = "https://www.twse.com.tw/rwd/zh/afterTrading/STOCK_DAY_AVG";
const BROWSER_USER_AGENT: &str = "Mozilla/5.0";
const STAT_OK: &str = "OK";

/// Monthly payload of the daily average price endpoint.
#[derive(Debug, Deserialize)]
struct StockDayAvg {
    stat: Option<String>,
    data: Option<Vec<Value>>,
}

/// Client for the TWSE daily average closing price endpoint.
pub struct TwseClient {
    client: Client,
    base_url: String,
}

impl TwseClient {
    pub fn new(timeout: Duration, accept_invalid_certs: bool) -> Result<Self, CrawlError> {
        Self::with_base_url(STOCK_DAY_AVG_URL, timeout, accept_invalid_certs)
    }

    pub fn with_base_url<T: Into<String>>(
        base_url: T,
        timeout: Duration,
        accept_invalid_certs: bool,
    ) -> Result<Self, CrawlError> {
        if accept_invalid_certs {
            warn!("TLS certificate verification is disabled for TWSE requests");
        }
        let client = Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(accept_invalid_certs)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    fn request(&self, stock_no: &str, year: i32, month: u32) -> RequestBuilder {
        let date = query_date(year, month);
        self.client
            .get(&self.base_url)
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, BROWSER_USER_AGENT)
            .query(&[
                ("stockNo", stock_no),
                ("date", date.as_str()),
                ("response", "json"),
            ])
    }
}

#[async_trait]
impl PriceSource for TwseClient {
    #[tracing::instrument(skip(self))]
    async fn fetch(&self, stock_no: &str, year: i32, month: u32) -> Result<Vec<RawRow>, CrawlError> {
        let response = self.request(stock_no, year, month).send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        let rows = parse_response(stock_no, year, month, status, &body)?;
        debug!("Fetched {} rows", rows.len());
        Ok(rows)
    }
}

/// `YYYYMM01` for the month being requested.
pub fn query_date(year: i32, month: u32) -> String {
    format!("{}{:02}01", year, month)
}

/// Validates one monthly response and extracts its daily rows.
///
/// The last element of `data` is a summary trailer appended to every payload and
/// is dropped without inspection.
pub fn parse_response(
    stock_no: &str,
    year: i32,
    month: u32,
    status: StatusCode,
    body: &[u8],
) -> Result<Vec<RawRow>, CrawlError> {
    if status != StatusCode::OK {
        return Err(CrawlError::Api {
            stock_no: stock_no.to_string(),
            year,
            month,
            status,
        });
    }
    let data_error = |reason: String| CrawlError::Data {
        stock_no: stock_no.to_string(),
        year,
        month,
        reason,
    };
    let payload: StockDayAvg =
        serde_json::from_slice(body).map_err(|e| data_error(format!("unreadable payload: {}", e)))?;
    match payload.stat.as_deref() {
        Some(STAT_OK) => {}
        Some(stat) => return Err(data_error(format!("stat is {:?}", stat))),
        None => return Err(data_error("stat is missing".to_string())),
    }
    let mut data = payload
        .data
        .ok_or_else(|| data_error("data is missing".to_string()))?;
    data.pop();
    data.into_iter()
        .map(|row| {
            serde_json::from_value::<RawRow>(row.clone())
                .map_err(|_| data_error(format!("unexpected row {}", row)))
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    fn parse(status: StatusCode, body: &str) -> Result<Vec<RawRow>, CrawlError> {
        parse_response("0050", 2022, 1, status, body.as_bytes())
    }

    #[test]
    fn test_query_date() {
        assert_eq!(query_date(2022, 1), "20220101");
        assert_eq!(query_date(2024, 11), "20241101");
    }

    #[test]
    fn test_request() {
        let client = TwseClient::with_base_url(
            "https://twse.test/rwd/zh/afterTrading/STOCK_DAY_AVG",
            Duration::from_secs(5),
            false,
        )
        .unwrap();
        let request = client.request("0050", 2022, 3).build().unwrap();
        assert_eq!(request.method(), reqwest::Method::GET);
        assert_eq!(request.url().path(), "/rwd/zh/afterTrading/STOCK_DAY_AVG");
        let query: Vec<(String, String)> = request.url().query_pairs().into_owned().collect();
        assert_eq!(
            query,
            vec![
                ("stockNo".to_string(), "0050".to_string()),
                ("date".to_string(), "20220301".to_string()),
                ("response".to_string(), "json".to_string()),
            ]
        );
        assert_eq!(request.headers()[ACCEPT], "application/json");
        assert_eq!(request.headers()[USER_AGENT], "Mozilla/5.0");
    }

    #[test]
    fn test_non_ok_status_is_api_error() {
        let res = parse(StatusCode::SERVICE_UNAVAILABLE, r#"{"stat":"OK","data":[]}"#);
        match res {
            Err(CrawlError::Api { status, month, .. }) => {
                assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
                assert_eq!(month, 1);
            }
            other => panic!("expected API error, got {:?}", other),
        }
        assert!(matches!(
            parse(StatusCode::CREATED, r#"{"stat":"OK","data":[]}"#),
            Err(CrawlError::Api { .. })
        ));
    }

    #[test]
    fn test_bad_stat_is_data_error() {
        assert!(matches!(
            parse(StatusCode::OK, r#"{"stat":"很抱歉，沒有符合條件的資料!"}"#),
            Err(CrawlError::Data { .. })
        ));
        assert!(matches!(
            parse(StatusCode::OK, r#"{"data":[["111/01/03","139.50"],["月平均收盤價","139.50"]]}"#),
            Err(CrawlError::Data { .. })
        ));
        assert!(matches!(
            parse(StatusCode::OK, r#"{"stat":"OK"}"#),
            Err(CrawlError::Data { .. })
        ));
        assert!(matches!(
            parse(StatusCode::OK, "<html>blocked</html>"),
            Err(CrawlError::Data { .. })
        ));
    }

    #[test]
    fn test_trailer_is_dropped() {
        let body = r#"{
            "stat": "OK",
            "date": "20220101",
            "fields": ["日期", "收盤價"],
            "data": [["111/01/03", "145.50"], ["111/01/04", "146.20"], ["月平均收盤價", "145.85"]]
        }"#;
        let rows = parse(StatusCode::OK, body).unwrap();
        assert_eq!(
            rows,
            vec![
                RawRow("111/01/03".to_string(), "145.50".to_string()),
                RawRow("111/01/04".to_string(), "146.20".to_string()),
            ]
        );
    }

    #[test]
    fn test_trailer_shape_is_not_checked() {
        let body = r#"{"stat":"OK","data":[["111/01/03","145.50"],{"note":"summary"}]}"#;
        let rows = parse(StatusCode::OK, body).unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_empty_data() {
        assert!(parse(StatusCode::OK, r#"{"stat":"OK","data":[]}"#)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_malformed_row_is_data_error() {
        let body = r#"{"stat":"OK","data":[["111/01/03"],["月平均收盤價","145.85"]]}"#;
        assert!(matches!(
            parse(StatusCode::OK, body),
            Err(CrawlError::Data { .. })
        ));
    }
}
