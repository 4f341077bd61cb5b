use super::SinkError;
use crate::table::PriceTable;
use csv::Writer;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Writes `date,<stock...>` followed by one line per day.
pub fn write_csv<W: Write>(table: &PriceTable, out: W) -> Result<(), SinkError> {
    let mut writer = Writer::from_writer(out);
    writer.write_record(
        std::iter::once(table.index_label()).chain(table.stock_nos.iter().map(String::as_str)),
    )?;
    for (date, cells) in table.iter() {
        let date = date.format("%Y-%m-%d").to_string();
        writer.write_record(std::iter::once(date.as_str()).chain(cells.iter().map(String::as_str)))?;
    }
    writer.flush()?;
    Ok(())
}

#[tracing::instrument(skip(table))]
pub fn save_csv(table: &PriceTable, path: &Path) -> Result<(), SinkError> {
    write_csv(table, File::create(path)?)?;
    info!("Wrote {} days to {}", table.dates.len(), path.display());
    Ok(())
}
