use anyhow::{Context, Result};
use chrono::Datelike;
use clap::Parser;
use std::path::PathBuf;
use tracing::subscriber::set_global_default;
use tracing::{info, warn};
use tracing_log::LogTracer;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod calendar;
mod cli;
mod crawler;
mod settings;
mod sinks;
mod table;
use cli::Cli;
use crawler::{crawl_all, Months, TwseClient};
use settings::Settings;
use sinks::{save_csv, upload_table, SheetTarget, SheetsClient};
use table::build_table;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenv::dotenv();
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    set_global_default(subscriber)?;
    LogTracer::init()?;
    let settings = Settings::new()?;
    let cli = Cli::parse();

    let today = calendar::today();
    let year = cli.year.unwrap_or_else(|| today.year());
    let months = match cli.months() {
        Some(months) => Months::Explicit(months),
        None => Months::Resolve,
    };
    let client = TwseClient::new(
        settings.crawler.timeout(),
        cli.insecure || settings.crawler.accept_invalid_certs,
    )?;
    let stock_numbers = cli.stock_numbers();
    let data = crawl_all(
        &client,
        &stock_numbers,
        year,
        months,
        today,
        settings.crawler.pacing(),
    )
    .await
    .context("Failed to crawl TWSE prices")?;
    let table = build_table(&data).context("Failed to build price table")?;

    let output = &settings.output;
    let csv_path = match &cli.output {
        Some(path) => Some(path.clone()),
        None if output.csv => Some(PathBuf::from(&output.csv_path)),
        None => None,
    };
    if csv_path.is_none() && !output.gsheet {
        warn!("No output enabled, nothing was written");
    }
    if let Some(path) = csv_path {
        save_csv(&table, &path).context("Failed to write CSV")?;
    }
    if output.gsheet {
        let client = SheetsClient::new(output.gsheet_access_token.as_str());
        let target = SheetTarget {
            spreadsheet_id: &output.gsheet_spreadsheet_id,
            sheet_name: &output.gsheet_sheet_name,
            top_left_cell: &output.gsheet_top_left_cell,
            sheet_id: output.gsheet_sheet_id,
        };
        upload_table(&client, &target, &table)
            .await
            .context("Failed to update Google Sheet")?;
    }
    info!("Done");
    Ok(())
}
