//! CSV exports for the raw-data and forecast tabs.

use std::io::Write;

use crate::{
    Error,
    forecast::MonthlySeries,
    format::format_currency,
    loader::REQUIRED_COLUMNS,
    record::{Dataset, month_label},
};

/// Order dates are written day-first, the same format the loader reads.
const EXPORT_DATE_FORMAT: &[time::format_description::BorrowedFormatItem] =
    time::macros::format_description!("[day]/[month]/[year]");

/// Writes `dataset` as CSV with the loader's column set, in record order.
///
/// Dates are written as DD/MM/YYYY and amounts with full precision, so the
/// output parses back through the loader into the same dataset.
pub fn write_filtered_csv<W: Write>(writer: W, dataset: &Dataset) -> Result<(), Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer.write_record(REQUIRED_COLUMNS)?;

    for record in dataset.records() {
        let date = record
            .order_date
            .format(&EXPORT_DATE_FORMAT)
            .map_err(|error| Error::Io(error.to_string()))?;

        csv_writer.write_record([
            date.as_str(),
            &record.region,
            &record.category,
            &record.customer_name,
            &record.product_name,
            &record.order_id,
            &record.sales.to_string(),
        ])?;
    }

    csv_writer.flush()?;

    Ok(())
}

/// Writes a forecast as a two-column CSV: the "YYYY-MM" month label and the
/// projected total as a currency string, e.g. `$1,234.56`.
pub fn write_forecast_csv<W: Write>(writer: W, forecast: &MonthlySeries) -> Result<(), Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer.write_record(["Date", "Forecast"])?;

    for (month, value) in forecast.months().iter().zip(forecast.values()) {
        csv_writer.write_record([month_label(*month), format_currency(*value)])?;
    }

    csv_writer.flush()?;

    Ok(())
}
