use super::SinkError;
use crate::table::PriceTable;
use chrono::NaiveDate;
use reqwest::{Client, Response, Url};
use rust_decimal::prelude::*;
use serde_json::{json, Value};
use tracing::{debug, info};

const SHEETS_API_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const DATE_PATTERN: &str = "mm/dd/yyyy";
const PRICE_PATTERN: &str = "0.00";

/// Day zero of spreadsheet date serial numbers.
pub fn sheet_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1899, 12, 30).expect("1899-12-30 is a valid date")
}

pub fn date_serial(date: NaiveDate) -> i64 {
    (date - sheet_epoch()).num_days()
}

fn price_value(price: &str) -> Option<f64> {
    Decimal::from_str(&price.trim().replace(',', ""))
        .ok()
        .and_then(|d| d.to_f64())
}

/// Header row followed by one row per day, dates as serial numbers and prices as numbers.
pub fn sheet_values(table: &PriceTable) -> Result<Vec<Vec<Value>>, SinkError> {
    let header = std::iter::once(Value::from(""))
        .chain(table.stock_nos.iter().map(|s| Value::from(s.as_str())))
        .collect();
    let mut values = vec![header];
    for (date, cells) in table.iter() {
        let mut row = Vec::with_capacity(cells.len() + 1);
        row.push(Value::from(date_serial(date)));
        for (stock_no, cell) in table.stock_nos.iter().zip(cells) {
            if cell.is_empty() {
                row.push(Value::from(""));
                continue;
            }
            let price = price_value(cell).ok_or_else(|| SinkError::InvalidPrice {
                stock_no: stock_no.clone(),
                date,
                price: cell.clone(),
            })?;
            row.push(Value::from(price));
        }
        values.push(row);
    }
    Ok(values)
}

/// Date format on the first column and fixed decimals on the price columns, below the header.
pub fn format_requests(sheet_id: i64, stock_count: usize) -> Value {
    let repeat_cell = |start_col: usize, end_col: usize, kind: &str, pattern: &str| {
        json!({
            "repeatCell": {
                "range": {
                    "sheetId": sheet_id,
                    "startRowIndex": 1,
                    "startColumnIndex": start_col,
                    "endColumnIndex": end_col,
                },
                "cell": {"userEnteredFormat": {"numberFormat": {"type": kind, "pattern": pattern}}},
                "fields": "userEnteredFormat.numberFormat",
            }
        })
    };
    json!({
        "requests": [
            repeat_cell(0, 1, "DATE", DATE_PATTERN),
            repeat_cell(1, 1 + stock_count, "NUMBER", PRICE_PATTERN),
        ]
    })
}

pub struct SheetsClient {
    client: Client,
    access_token: String,
    base_url: Url,
}

impl SheetsClient {
    pub fn new<T: Into<String>>(access_token: T) -> Self {
        Self {
            client: Client::new(),
            access_token: access_token.into(),
            base_url: Url::parse(SHEETS_API_URL).expect("Sheets API URL is valid"),
        }
    }

    /// `{base}/{segments...}` with every segment percent-encoded.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .expect("Sheets API URL is hierarchical")
            .pop_if_empty()
            .extend(segments);
        url
    }

    fn values_url(&self, spreadsheet_id: &str, range: &str) -> Url {
        self.url(&[spreadsheet_id, "values", range])
    }

    fn batch_update_url(&self, spreadsheet_id: &str) -> Url {
        let segment = format!("{}:batchUpdate", spreadsheet_id);
        self.url(&[segment.as_str()])
    }

    async fn check(response: Response) -> Result<Value, SinkError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SinkError::Api { status, body });
        }
        Ok(response.json().await?)
    }

    #[tracing::instrument(skip(self, values))]
    pub async fn update(
        &self,
        spreadsheet_id: &str,
        sheet_name: &str,
        cells: &str,
        values: Vec<Vec<Value>>,
    ) -> Result<Value, SinkError> {
        let range = format!("{}!{}", sheet_name, cells);
        let url = self.values_url(spreadsheet_id, &range);
        debug!("Writing {} rows", values.len());
        let response = self
            .client
            .put(url)
            .bearer_auth(&self.access_token)
            .query(&[("valueInputOption", "RAW")])
            .json(&json!({ "range": range, "values": values }))
            .send()
            .await?;
        Self::check(response).await
    }

    #[tracing::instrument(skip(self, body))]
    pub async fn batch_update(&self, spreadsheet_id: &str, body: &Value) -> Result<Value, SinkError> {
        let url = self.batch_update_url(spreadsheet_id);
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.access_token)
            .json(body)
            .send()
            .await?;
        Self::check(response).await
    }
}

/// Spreadsheet location the table is written to.
#[derive(Debug, Clone)]
pub struct SheetTarget<'a> {
    pub spreadsheet_id: &'a str,
    pub sheet_name: &'a str,
    pub top_left_cell: &'a str,
    pub sheet_id: i64,
}

pub async fn upload_table(
    client: &SheetsClient,
    target: &SheetTarget<'_>,
    table: &PriceTable,
) -> Result<(), SinkError> {
    let values = sheet_values(table)?;
    client
        .update(
            target.spreadsheet_id,
            target.sheet_name,
            target.top_left_cell,
            values,
        )
        .await?;
    client
        .batch_update(
            target.spreadsheet_id,
            &format_requests(target.sheet_id, table.stock_nos.len()),
        )
        .await?;
    info!(
        "Uploaded {} days to sheet {}",
        table.dates.len(),
        target.sheet_name
    );
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    fn table(second: &str) -> PriceTable {
        let start = NaiveDate::from_ymd_opt(2022, 1, 1).unwrap();
        PriceTable {
            dates: vec![start, start.succ_opt().unwrap()],
            stock_nos: vec!["0050".to_string(), "2330".to_string()],
            rows: vec![
                vec!["145.50".to_string(), "".to_string()],
                vec!["".to_string(), second.to_string()],
            ],
        }
    }

    #[test]
    fn test_date_serial() {
        assert_eq!(date_serial(NaiveDate::from_ymd_opt(1899, 12, 31).unwrap()), 1);
        assert_eq!(date_serial(NaiveDate::from_ymd_opt(2022, 1, 1).unwrap()), 44562);
    }

    #[test]
    fn test_sheet_values() {
        let values = sheet_values(&table("1,085.00")).unwrap();
        assert_eq!(
            values,
            vec![
                vec![json!(""), json!("0050"), json!("2330")],
                vec![json!(44562), json!(145.5), json!("")],
                vec![json!(44563), json!(""), json!(1085.0)],
            ]
        );
    }

    #[test]
    fn test_sheet_values_rejects_non_numeric_price() {
        assert!(matches!(
            sheet_values(&table("--")),
            Err(SinkError::InvalidPrice { .. })
        ));
    }

    #[test]
    fn test_range_is_encoded_into_one_path_segment() {
        let client = SheetsClient::new("token");
        let url = client.values_url("ID", "Prices #2!A1");
        assert_eq!(url.path(), "/v4/spreadsheets/ID/values/Prices%20%232!A1");
        assert_eq!(url.fragment(), None);
        assert_eq!(url.query(), None);

        let url = client.values_url("ID", "a/b?c!B2");
        assert_eq!(url.path(), "/v4/spreadsheets/ID/values/a%2Fb%3Fc!B2");
        assert_eq!(url.query(), None);
    }

    #[test]
    fn test_batch_update_url() {
        let client = SheetsClient::new("token");
        assert_eq!(
            client.batch_update_url("ID").as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/ID:batchUpdate"
        );
    }

    #[test]
    fn test_format_requests() {
        let body = format_requests(0, 2);
        let requests = body["requests"].as_array().unwrap();
        assert_eq!(requests.len(), 2);
        let date = &requests[0]["repeatCell"];
        assert_eq!(date["range"]["startRowIndex"], 1);
        assert_eq!(date["range"]["endColumnIndex"], 1);
        assert_eq!(date["cell"]["userEnteredFormat"]["numberFormat"]["pattern"], "mm/dd/yyyy");
        let price = &requests[1]["repeatCell"];
        assert_eq!(price["range"]["startColumnIndex"], 1);
        assert_eq!(price["range"]["endColumnIndex"], 3);
        assert_eq!(price["cell"]["userEnteredFormat"]["numberFormat"]["type"], "NUMBER");
    }
}
