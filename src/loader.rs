//! Strict CSV ingestion for the sales dataset, plus the process-wide cache.
//!
//! Loading is all-or-nothing: a missing column, an unreadable file, or a
//! single malformed date or amount fails the entire load. The dashboard
//! either has a complete dataset or none at all.

use std::{
    collections::HashMap,
    fs::File,
    io::Read,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
    time::SystemTime,
};

use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

use crate::{
    Error,
    record::{Dataset, SalesRecord},
};

/// Order dates are day-first, e.g. "17/03/2021".
const ORDER_DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[day]/[month]/[year]");

/// The columns the source file must provide, in the order they are exported.
pub const REQUIRED_COLUMNS: [&str; 7] = [
    "Order Date",
    "Region",
    "Category",
    "Customer Name",
    "Product Name",
    "Order ID",
    "Sales",
];

/// A memoization cache for loaded datasets, keyed by source path.
///
/// The source file is static for a session, so a cache entry stays valid as
/// long as the file's modification time is unchanged. A changed modification
/// time causes a re-read; [DatasetCache::invalidate] evicts explicitly.
/// Concurrent first loads of the same path are acceptable: the result is
/// deterministic, so last writer wins.
#[derive(Debug, Default)]
pub struct DatasetCache {
    entries: Mutex<HashMap<PathBuf, CacheEntry>>,
}

#[derive(Debug)]
struct CacheEntry {
    modified: SystemTime,
    dataset: Arc<Dataset>,
}

impl DatasetCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the dataset at `path`, reusing the cached copy when the file's
    /// modification time is unchanged since the last load.
    pub fn load(&self, path: &Path) -> Result<Arc<Dataset>, Error> {
        let modified = modification_time(path)?;

        {
            let entries = self.entries.lock().map_err(|_| Error::CacheLock)?;

            if let Some(entry) = entries.get(path)
                && entry.modified == modified
            {
                tracing::debug!("dataset cache hit for {}", path.display());
                return Ok(Arc::clone(&entry.dataset));
            }
        }

        tracing::debug!("dataset cache miss for {}, reading file", path.display());
        let dataset = Arc::new(load_dataset(path)?);

        let mut entries = self.entries.lock().map_err(|_| Error::CacheLock)?;
        entries.insert(
            path.to_path_buf(),
            CacheEntry {
                modified,
                dataset: Arc::clone(&dataset),
            },
        );

        Ok(dataset)
    }

    /// Evicts the cache entry for `path`, if any. The next load re-reads the
    /// file unconditionally.
    pub fn invalidate(&self, path: &Path) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(path);
        }
    }
}

fn modification_time(path: &Path) -> Result<SystemTime, Error> {
    let metadata = std::fs::metadata(path).map_err(|error| Error::UnreadableSource {
        path: path.display().to_string(),
        reason: error.to_string(),
    })?;

    metadata.modified().map_err(|error| Error::UnreadableSource {
        path: path.display().to_string(),
        reason: error.to_string(),
    })
}

/// Reads and parses the sales dataset at `path` without caching.
pub fn load_dataset(path: &Path) -> Result<Dataset, Error> {
    let file = File::open(path).map_err(|error| Error::UnreadableSource {
        path: path.display().to_string(),
        reason: error.to_string(),
    })?;

    parse_records(file)
}

/// Parses comma-separated sales data from `reader`.
///
/// The header row must contain every column in [REQUIRED_COLUMNS]; extra
/// columns are ignored. Returns the records in file order.
pub fn parse_records<R: Read>(reader: R) -> Result<Dataset, Error> {
    let mut csv_reader = csv::Reader::from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let columns = find_columns(&headers)?;

    let mut records = Vec::new();

    for (index, result) in csv_reader.records().enumerate() {
        let row = index + 1;
        let record = result?;

        let date_text = &record[columns.order_date];
        let order_date =
            Date::parse(date_text, &ORDER_DATE_FORMAT).map_err(|_| Error::InvalidDate {
                value: date_text.to_owned(),
                row,
            })?;

        let sales_text = &record[columns.sales];
        let sales: f64 = sales_text.parse().map_err(|_| Error::InvalidAmount {
            value: sales_text.to_owned(),
            row,
        })?;

        if !sales.is_finite() {
            return Err(Error::InvalidAmount {
                value: sales_text.to_owned(),
                row,
            });
        }

        if sales < 0.0 {
            return Err(Error::NegativeSales { value: sales, row });
        }

        records.push(SalesRecord::new(
            order_date,
            &record[columns.region],
            &record[columns.category],
            &record[columns.customer_name],
            &record[columns.product_name],
            &record[columns.order_id],
            sales,
        ));
    }

    tracing::debug!("loaded {} sales records", records.len());

    Ok(Dataset::new(records))
}

struct ColumnIndices {
    order_date: usize,
    region: usize,
    category: usize,
    customer_name: usize,
    product_name: usize,
    order_id: usize,
    sales: usize,
}

fn find_columns(headers: &csv::StringRecord) -> Result<ColumnIndices, Error> {
    let find = |name: &str| {
        headers
            .iter()
            .position(|header| header == name)
            .ok_or_else(|| Error::MissingColumn(name.to_owned()))
    };

    Ok(ColumnIndices {
        order_date: find("Order Date")?,
        region: find("Region")?,
        category: find("Category")?,
        customer_name: find("Customer Name")?,
        product_name: find("Product Name")?,
        order_id: find("Order ID")?,
        sales: find("Sales")?,
    })
}
