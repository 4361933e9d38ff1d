//! SuperSales is an analytics core for a sales dashboard.
//!
//! This library loads a tabular sales dataset, filters it by month range,
//! region, and category, and derives the tables the dashboard renders:
//! summary KPIs, monthly trend and category charts, top-product and
//! top-customer rankings, and a seasonal exponential-smoothing forecast.
//!
//! The presentation layer is an external consumer: it receives the finished
//! tables from [pipeline::derive_views] and renders them. Nothing in this
//! crate draws widgets or charts.

#![warn(missing_docs)]

pub mod aggregate;
pub mod export;
pub mod filter;
pub mod forecast;
pub mod format;
pub mod loader;
pub mod pipeline;
pub mod record;

pub use filter::FilterCriteria;
pub use loader::DatasetCache;
pub use pipeline::{DerivedViews, derive_views};
pub use record::{Dataset, SalesRecord};

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The source file could not be opened or read.
    ///
    /// This halts the dashboard load entirely, there is no partial dataset.
    #[error("could not read sales data from \"{path}\": {reason}")]
    UnreadableSource {
        /// The path that was passed to the loader.
        path: String,
        /// The underlying I/O error as a string.
        reason: String,
    },

    /// The source file is missing one of the required columns.
    #[error("the sales data is missing the required column \"{0}\"")]
    MissingColumn(String),

    /// A row's order date did not parse in the expected DD/MM/YYYY format.
    ///
    /// Loading is all-or-nothing: one bad date fails the whole load rather
    /// than silently dropping the row.
    #[error("could not parse \"{value}\" as a DD/MM/YYYY date on row {row}")]
    InvalidDate {
        /// The raw cell contents.
        value: String,
        /// The 1-based data row number (excluding the header).
        row: usize,
    },

    /// A row's sales amount did not parse as a finite number.
    #[error("could not parse \"{value}\" as a sales amount on row {row}")]
    InvalidAmount {
        /// The raw cell contents.
        value: String,
        /// The 1-based data row number (excluding the header).
        row: usize,
    },

    /// A row's sales amount was negative. Sales amounts record revenue and
    /// must be non-negative.
    #[error("negative sales amount {value} on row {row}")]
    NegativeSales {
        /// The parsed amount.
        value: f64,
        /// The 1-based data row number (excluding the header).
        row: usize,
    },

    /// The requested forecast horizon is outside the supported range.
    #[error("forecast horizon must be between 3 and 60 months, got {0}")]
    InvalidHorizon(usize),

    /// The forecast model could not be fitted to the monthly history.
    ///
    /// This blocks the forecast output for the current run; all other
    /// dashboard sections remain available.
    #[error("could not fit the forecast model: {0}")]
    FitFailed(String),

    /// The seasonal decomposition could not be computed.
    ///
    /// Callers should degrade this to a warning and continue forecasting.
    #[error("could not decompose the sales history: {0}")]
    DecompositionFailed(String),

    /// Could not acquire the dataset cache lock.
    #[error("could not acquire the dataset cache lock")]
    CacheLock,

    /// An error occurred while reading or writing CSV data.
    #[error("CSV error: {0}")]
    Csv(String),

    /// An unexpected I/O error.
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<csv::Error> for Error {
    fn from(value: csv::Error) -> Self {
        Error::Csv(value.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Error::Io(value.to_string())
    }
}
