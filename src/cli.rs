use clap::Parser;
use std::path::PathBuf;

/// Crawl TWSE daily average prices and save them as one date-indexed table.
#[derive(Debug, Parser)]
#[command(name = "twse-crawler")]
pub struct Cli {
    /// Stock numbers, separated by commas or spaces (e.g. 0050,006208).
    #[arg(short, long, required = true, num_args = 1.., value_delimiter = ',')]
    pub stock_numbers: Vec<String>,

    /// Year in AD (e.g. 2025). Defaults to the current year.
    #[arg(short, long)]
    pub year: Option<i32>,

    /// Months, separated by commas (e.g. 3,4,5). Defaults to every month of the year so far.
    #[arg(
        short,
        long,
        num_args = 1..,
        value_delimiter = ',',
        value_parser = clap::value_parser!(u32).range(1..=12)
    )]
    pub months: Vec<u32>,

    /// Write the table to this CSV file.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Skip TLS certificate verification for TWSE requests.
    #[arg(long, default_value_t = false)]
    pub insecure: bool,
}

impl Cli {
    pub fn stock_numbers(&self) -> Vec<String> {
        self.stock_numbers
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(From::from)
            .collect()
    }

    /// Explicit months in fetch order, or `None` to derive them from the year.
    pub fn months(&self) -> Option<Vec<u32>> {
        if self.months.is_empty() {
            return None;
        }
        let mut months = self.months.clone();
        months.sort_unstable();
        months.dedup();
        Some(months)
    }
}
