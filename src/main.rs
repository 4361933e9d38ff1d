//! A command-line stand-in for the dashboard's presentation layer.
//!
//! Loads the sales dataset, applies the requested filters, and prints the
//! derived views as text tables or JSON. The same pipeline backs both
//! outputs, so this binary doubles as a smoke test for the library.

use std::{fs::File, path::PathBuf, process::ExitCode};

use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use supersales_rs::{
    DatasetCache, Error, FilterCriteria, derive_views,
    export::{write_filtered_csv, write_forecast_csv},
    filter::search,
    format::format_currency,
    pipeline::{DerivedViews, ForecastSection},
};

/// Sales analytics over a CSV dataset: KPIs, breakdowns, and a monthly
/// forecast.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the sales data CSV.
    data_path: PathBuf,

    /// The earliest month to include, as YYYY-MM. Defaults to the dataset's
    /// first month.
    #[arg(long)]
    min_month: Option<String>,

    /// The latest month to include, as YYYY-MM. Defaults to the dataset's
    /// last month.
    #[arg(long)]
    max_month: Option<String>,

    /// A region to include. Repeatable; defaults to every region.
    #[arg(long)]
    region: Vec<String>,

    /// A category to include. Repeatable; defaults to every category.
    #[arg(long)]
    category: Vec<String>,

    /// How many months ahead to forecast.
    #[arg(long, default_value_t = 12)]
    horizon: usize,

    /// Print the records containing this text instead of the dashboard views.
    #[arg(long)]
    search: Option<String>,

    /// Write the filtered records as CSV to this path.
    #[arg(long)]
    export_filtered: Option<PathBuf>,

    /// Write the forecast table as CSV to this path.
    #[arg(long)]
    export_forecast: Option<PathBuf>,

    /// Print the derived views as JSON instead of text tables.
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    setup_logging();

    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!("{error}");
            ExitCode::FAILURE
        }
    }
}

fn setup_logging() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().pretty())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

fn run(args: &Args) -> Result<(), Error> {
    let cache = DatasetCache::new();
    let dataset = cache.load(&args.data_path)?;

    if let Some(term) = &args.search {
        let matches = search(&dataset, term);
        println!("{} records match \"{term}\":", matches.len());
        for record in matches.records() {
            println!(
                "{}  {}  {}  {}  {}  {}",
                record.month(),
                record.order_id,
                record.region,
                record.category,
                record.customer_name,
                format_currency(record.sales),
            );
        }
        return Ok(());
    }

    let criteria = criteria_from_args(args, &dataset);
    let views = derive_views(&dataset, &criteria, args.horizon);

    if let Some(path) = &args.export_filtered {
        let filtered = supersales_rs::filter::filter(&dataset, &criteria);
        write_filtered_csv(File::create(path)?, &filtered)?;
        tracing::info!("wrote {} filtered records to {}", filtered.len(), path.display());
    }

    if let Some(path) = &args.export_forecast {
        export_forecast(&views, path)?;
    }

    if args.json {
        let json = serde_json::to_string_pretty(&views)
            .map_err(|error| Error::Io(error.to_string()))?;
        println!("{json}");
    } else {
        print_views(&views);
    }

    Ok(())
}

fn criteria_from_args(args: &Args, dataset: &supersales_rs::Dataset) -> FilterCriteria {
    let mut criteria = FilterCriteria::all_of(dataset);

    if let Some(min_month) = &args.min_month {
        criteria.min_month = min_month.clone();
    }

    if let Some(max_month) = &args.max_month {
        criteria.max_month = max_month.clone();
    }

    if !args.region.is_empty() {
        criteria.regions = args.region.iter().cloned().collect();
    }

    if !args.category.is_empty() {
        criteria.categories = args.category.iter().cloned().collect();
    }

    criteria
}

fn export_forecast(views: &DerivedViews, path: &PathBuf) -> Result<(), Error> {
    let ForecastSection::Ready { forecast, .. } = &views.forecast else {
        tracing::warn!("no forecast to export, skipping {}", path.display());
        return Ok(());
    };

    let months = forecast
        .iter()
        .map(|row| parse_month_label(&row.month))
        .collect::<Result<Vec<_>, _>>()?;
    let values = forecast.iter().map(|row| row.sales).collect();

    let series = supersales_rs::forecast::MonthlySeries::from_parts(months, values);
    write_forecast_csv(File::create(path)?, &series)?;
    tracing::info!("wrote a {}-month forecast to {}", forecast.len(), path.display());

    Ok(())
}

fn parse_month_label(label: &str) -> Result<time::Date, Error> {
    let format = time::macros::format_description!("[year]-[month]-[day]");

    time::Date::parse(&format!("{label}-01"), &format).map_err(|_| Error::InvalidDate {
        value: label.to_owned(),
        row: 0,
    })
}

fn print_views(views: &DerivedViews) {
    println!("== Summary ({} records) ==", views.record_count);
    println!("Total sales:         {}", views.kpis.total_sales_display);
    println!("Average order value: {}", views.kpis.average_order_value_display);
    println!(
        "Top customer:        {}",
        views.kpis.top_customer.as_deref().unwrap_or("-")
    );

    println!("\n== Monthly sales ==");
    for row in &views.monthly_trend {
        println!("{}  {}", row.month, format_currency(row.sales));
    }

    println!("\n== Sales by region ==");
    for row in &views.sales_by_region {
        println!("{:<20}  {}", row.key, format_currency(row.sales));
    }

    println!("\n== Sales by category ==");
    for row in &views.sales_by_category {
        println!("{:<20}  {}", row.key, format_currency(row.sales));
    }

    println!("\n== Top products ==");
    for row in &views.top_products {
        println!("{:<40}  {}", row.key, format_currency(row.sales));
    }

    println!("\n== Top customers ==");
    for row in &views.top_customers {
        println!("{:<30}  {}", row.key, format_currency(row.sales));
    }

    println!("\n== Forecast ==");
    match &views.forecast {
        ForecastSection::Ready {
            forecast,
            decomposition_note,
            ..
        } => {
            for row in forecast {
                println!("{}  {}", row.month, format_currency(row.sales));
            }
            if let Some(note) = decomposition_note {
                println!("(decomposition unavailable: {note})");
            }
        }
        ForecastSection::InsufficientData { observed, required } => {
            println!("Not enough history to forecast: {observed} of {required} months.");
        }
        ForecastSection::Failed { message } => {
            println!("Forecast unavailable: {message}");
        }
    }
}
