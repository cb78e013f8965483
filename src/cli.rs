//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use crate::adapters::csv_adapter::{CsvAdapter, DEFAULT_DATA_FILE};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::html_report::HtmlReportAdapter;
use crate::domain::config_validation::{parse_optional_date, validate_dashboard_config};
use crate::domain::dashboard::{DashboardView, DEFAULT_TITLE};
use crate::domain::dataset::PriceDataset;
use crate::domain::error::MandiError;
use crate::domain::forecast::{
    forecast_regions, validate_horizon, ForecastBatch, ForecastOptions, DEFAULT_HORIZON_MONTHS,
    MIN_FORECAST_OBSERVATIONS,
};
use crate::domain::kpi::{format_percent_change, format_price, KpiSummary};
use crate::domain::query::{aggregate_daily_mean, PriceFilter};
use crate::domain::seasonal::{SeasonalForecaster, DEFAULT_ALPHA, DEFAULT_BETA, DEFAULT_GAMMA};
use crate::domain::session::Session;
use crate::ports::config_port::ConfigPort;
use crate::ports::report_port::ReportPort;

const DEFAULT_OUTPUT: &str = "dashboard.html";
const DEFAULT_FORECAST_REGIONS: usize = 2;

#[derive(Parser, Debug)]
#[command(name = "mandimetrics", about = "Pakistan retail food price dashboard")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Where prices and settings come from.
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// WFP price CSV (default: wfp_food_prices_pak.csv)
    #[arg(short, long)]
    pub data: Option<PathBuf>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    #[arg(long)]
    pub commodity: Option<String>,
    /// Repeat to select several provinces (default: all)
    #[arg(long = "province")]
    pub provinces: Vec<String>,
    #[arg(long)]
    pub from: Option<NaiveDate>,
    #[arg(long)]
    pub to: Option<NaiveDate>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ForecastArgs {
    /// Months to predict, 1 to 24
    #[arg(long)]
    pub horizon: Option<usize>,
    /// Repeat to select several provinces (default: first two)
    #[arg(long = "forecast-province")]
    pub forecast_provinces: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List commodities with retail prices
    Commodities {
        #[command(flatten)]
        source: SourceArgs,
    },
    /// List provinces with retail prices
    Provinces {
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Show row count and date range of the dataset
    Info {
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Print headline KPIs and the daily price trend
    Summary {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Predict monthly prices per province
    Forecast {
        #[command(flatten)]
        source: SourceArgs,
        #[arg(long)]
        commodity: Option<String>,
        #[command(flatten)]
        forecast: ForecastArgs,
    },
    /// Write the HTML dashboard
    Report {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        filter: FilterArgs,
        #[command(flatten)]
        forecast: ForecastArgs,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        template: Option<PathBuf>,
        #[arg(long)]
        with_forecast: bool,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Commodities { source } => run_commodities(&source),
        Command::Provinces { source } => run_provinces(&source),
        Command::Info { source } => run_info(&source),
        Command::Summary { source, filter } => run_summary(&source, &filter),
        Command::Forecast {
            source,
            commodity,
            forecast,
        } => run_forecast(&source, commodity.as_deref(), &forecast),
        Command::Report {
            source,
            filter,
            forecast,
            output,
            template,
            with_forecast,
        } => run_report(
            &source,
            &filter,
            &forecast,
            with_forecast,
            output.as_ref(),
            template.as_ref(),
        ),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|err| {
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

/// Config (or an empty one) plus the loaded dataset.
struct Workspace {
    config: FileConfigAdapter,
    dataset: Arc<PriceDataset>,
}

fn open_workspace(source: &SourceArgs) -> Result<Workspace, ExitCode> {
    // Stage 1: Load and validate config
    let config = match &source.config {
        Some(path) => {
            eprintln!("Loading config from {}", path.display());
            load_config(path)?
        }
        None => FileConfigAdapter::empty(),
    };
    if let Err(e) = validate_dashboard_config(&config) {
        eprintln!("error: {e}");
        return Err((&e).into());
    }

    // Stage 2: Load prices
    let data_path = resolve_data_path(source, &config);
    eprintln!("Loading prices from {}", data_path.display());
    let port = CsvAdapter::new(data_path);
    let mut session = Session::new();
    let dataset = match session.dataset(&port) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("error: {e}");
            return Err((&e).into());
        }
    };
    if dataset.is_empty() {
        let err = MandiError::Load {
            path: port.path().display().to_string(),
            reason: "no retail price rows".to_string(),
        };
        eprintln!("error: {err}");
        return Err((&err).into());
    }
    eprintln!(
        "  {} retail rows, {} commodities, {} provinces",
        dataset.len(),
        dataset.commodities().len(),
        dataset.regions().len()
    );

    Ok(Workspace { config, dataset })
}

pub fn resolve_data_path(source: &SourceArgs, config: &dyn ConfigPort) -> PathBuf {
    source
        .data
        .clone()
        .or_else(|| config.get_string("data", "path").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_FILE))
}

fn resolve_commodity(
    dataset: &PriceDataset,
    config: &dyn ConfigPort,
    commodity: Option<&str>,
) -> Result<String, MandiError> {
    let commodity = match commodity {
        Some(c) => c.to_string(),
        None => match config.get_string("filter", "commodity") {
            Some(c) => c.trim().to_string(),
            None => dataset.commodities().first().cloned().unwrap_or_default(),
        },
    };
    if !dataset.has_commodity(&commodity) {
        eprintln!("warning: no retail prices for commodity '{}'", commodity);
    }
    Ok(commodity)
}

/// Flags override the `[filter]` section, which overrides the dataset-wide
/// defaults: first commodity, every province, full date range.
pub fn resolve_filter(
    dataset: &PriceDataset,
    config: &dyn ConfigPort,
    args: &FilterArgs,
) -> Result<PriceFilter, MandiError> {
    let commodity = resolve_commodity(dataset, config, args.commodity.as_deref())?;
    let mut filter = PriceFilter::all_for(dataset, &commodity).ok_or_else(|| MandiError::Load {
        path: "dataset".into(),
        reason: "no retail price rows".into(),
    })?;

    if !args.provinces.is_empty() {
        filter.regions = args.provinces.clone();
    } else {
        let configured = config.get_list("filter", "provinces");
        if !configured.is_empty() {
            filter.regions = configured;
        }
    }

    if let Some(from) = args.from.or(parse_optional_date(config, "filter", "from")?) {
        filter.date_from = from;
    }
    if let Some(to) = args.to.or(parse_optional_date(config, "filter", "to")?) {
        filter.date_to = to;
    }
    if filter.date_from > filter.date_to {
        return Err(MandiError::InvalidDateRange {
            from: filter.date_from,
            to: filter.date_to,
        });
    }
    Ok(filter)
}

pub fn build_forecast_options(
    config: &dyn ConfigPort,
    horizon: Option<usize>,
) -> Result<ForecastOptions, MandiError> {
    let horizon_months = horizon.unwrap_or_else(|| {
        config
            .get_int("forecast", "horizon_months", DEFAULT_HORIZON_MONTHS as i64)
            .max(0) as usize
    });
    validate_horizon(horizon_months)?;

    let min_observations = config
        .get_int("forecast", "min_observations", MIN_FORECAST_OBSERVATIONS as i64)
        .max(1) as usize;
    let defaults = ForecastOptions::default();
    let fit_timeout = Duration::try_from_secs_f64(config.get_double(
        "forecast",
        "fit_timeout_secs",
        defaults.fit_timeout.as_secs_f64(),
    ))
    .map_err(|e| MandiError::ConfigInvalid {
        section: "forecast".into(),
        key: "fit_timeout_secs".into(),
        reason: e.to_string(),
    })?;

    Ok(ForecastOptions {
        horizon_months,
        min_observations,
        fit_timeout,
    })
}

pub fn build_forecaster(config: &dyn ConfigPort) -> Result<SeasonalForecaster, MandiError> {
    SeasonalForecaster::new(
        config.get_double("forecast", "alpha", DEFAULT_ALPHA),
        config.get_double("forecast", "beta", DEFAULT_BETA),
        config.get_double("forecast", "gamma", DEFAULT_GAMMA),
    )
    .map_err(|e| MandiError::ConfigInvalid {
        section: "forecast".into(),
        key: "smoothing".into(),
        reason: e.to_string(),
    })
}

/// Flags, then `[forecast] provinces`, then the first two provinces of the
/// dataset. Blank names are dropped, so an explicit blank selection is empty.
pub fn resolve_forecast_regions(
    dataset: &PriceDataset,
    config: &dyn ConfigPort,
    args: &ForecastArgs,
) -> Vec<String> {
    let non_blank = |names: &[String]| -> Vec<String> {
        names
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    };

    if !args.forecast_provinces.is_empty() {
        return non_blank(&args.forecast_provinces);
    }
    if config.get_string("forecast", "provinces").is_some() {
        return config.get_list("forecast", "provinces");
    }
    dataset
        .regions()
        .iter()
        .take(DEFAULT_FORECAST_REGIONS)
        .cloned()
        .collect()
}

/// Runs the forecast stage. `Ok(None)` when no provinces were selected: that
/// is reported as a warning, not a failure.
fn run_forecast_stage(
    workspace: &Workspace,
    commodity: &str,
    args: &ForecastArgs,
) -> Result<Option<ForecastBatch>, MandiError> {
    let options = build_forecast_options(&workspace.config, args.horizon)?;
    let forecaster = build_forecaster(&workspace.config)?;
    let regions = resolve_forecast_regions(&workspace.dataset, &workspace.config, args);

    eprintln!(
        "Forecasting {} for {} province(s), {} months ahead...",
        commodity,
        regions.len(),
        options.horizon_months
    );
    match forecast_regions(
        &workspace.dataset,
        commodity,
        &regions,
        Arc::new(forecaster),
        &options,
    ) {
        Ok(batch) => {
            for warning in &batch.warnings {
                eprintln!("warning: {warning}");
            }
            Ok(Some(batch))
        }
        Err(MandiError::NoForecastRegions) => {
            eprintln!("warning: {}", MandiError::NoForecastRegions);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

fn run_commodities(source: &SourceArgs) -> ExitCode {
    let workspace = match open_workspace(source) {
        Ok(w) => w,
        Err(code) => return code,
    };
    for commodity in workspace.dataset.commodities() {
        println!("{}", commodity);
    }
    ExitCode::SUCCESS
}

fn run_provinces(source: &SourceArgs) -> ExitCode {
    let workspace = match open_workspace(source) {
        Ok(w) => w,
        Err(code) => return code,
    };
    for region in workspace.dataset.regions() {
        println!("{}", region);
    }
    ExitCode::SUCCESS
}

fn run_info(source: &SourceArgs) -> ExitCode {
    let workspace = match open_workspace(source) {
        Ok(w) => w,
        Err(code) => return code,
    };
    let dataset = &workspace.dataset;
    println!("rows: {}", dataset.len());
    if let Some((first, last)) = dataset.date_range() {
        println!("date range: {} to {}", first, last);
    }
    println!("commodities: {}", dataset.commodities().len());
    println!("provinces: {}", dataset.regions().len());
    ExitCode::SUCCESS
}

fn print_kpis(kpis: &KpiSummary) {
    println!("Commodity:              {}", kpis.commodity);
    println!(
        "Latest date:            {}",
        kpis.latest_date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "N/A".to_string())
    );
    println!(
        "Current Avg Price:      {} ({})",
        format_price(kpis.current_avg_price),
        format_percent_change(kpis.yoy_change_pct)
    );
    println!("Highest Recorded Price: {}", format_price(kpis.highest_price));
    println!("Lowest Recorded Price:  {}", format_price(kpis.lowest_price));
    println!("Data Points Analyzed:   {}", kpis.data_points);
}

fn run_summary(source: &SourceArgs, filter_args: &FilterArgs) -> ExitCode {
    let workspace = match open_workspace(source) {
        Ok(w) => w,
        Err(code) => return code,
    };

    let filter = match resolve_filter(&workspace.dataset, &workspace.config, filter_args) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let subset = match filter.apply(&workspace.dataset) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    if subset.is_empty() {
        eprintln!("warning: no prices match the selected filters");
    }

    let kpis = KpiSummary::compute(&workspace.dataset, &filter.commodity, &subset);
    print_kpis(&kpis);

    println!();
    println!("date,mean_price");
    for point in aggregate_daily_mean(&subset) {
        println!("{},{:.2}", point.date, point.mean_price);
    }
    ExitCode::SUCCESS
}

fn run_forecast(source: &SourceArgs, commodity: Option<&str>, args: &ForecastArgs) -> ExitCode {
    let workspace = match open_workspace(source) {
        Ok(w) => w,
        Err(code) => return code,
    };

    let commodity = match resolve_commodity(&workspace.dataset, &workspace.config, commodity) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let batch = match run_forecast_stage(&workspace, &commodity, args) {
        Ok(Some(batch)) => batch,
        Ok(None) => return ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    println!("series,date,predicted_price");
    for series in &batch.series {
        let label = series.label();
        for point in &series.points {
            println!("{},{},{:.2}", label, point.date, point.value);
        }
    }
    eprintln!(
        "{} of {} province(s) forecast",
        batch.series.len(),
        batch.series.len() + batch.warnings.len()
    );
    ExitCode::SUCCESS
}

fn run_report(
    source: &SourceArgs,
    filter_args: &FilterArgs,
    forecast_args: &ForecastArgs,
    with_forecast: bool,
    output_path: Option<&PathBuf>,
    template_path: Option<&PathBuf>,
) -> ExitCode {
    let workspace = match open_workspace(source) {
        Ok(w) => w,
        Err(code) => return code,
    };
    let config = &workspace.config;

    // Stage 3: Filter and compute panels
    let filter = match resolve_filter(&workspace.dataset, config, filter_args) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let title = config
        .get_string("report", "title")
        .unwrap_or_else(|| DEFAULT_TITLE.to_string());
    let mut view = match DashboardView::build(&workspace.dataset, &filter, &title) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    eprintln!(
        "Building dashboard: {}, {} to {}, {} data points",
        filter.commodity, filter.date_from, filter.date_to, view.kpis.data_points
    );

    // Stage 4: Optional forecast
    if with_forecast || config.get_bool("report", "with_forecast", false) {
        match run_forecast_stage(&workspace, &filter.commodity, forecast_args) {
            Ok(Some(batch)) => view = view.with_forecast(batch),
            Ok(None) => {}
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        }
    }

    // Stage 5: Write report
    let output = output_path
        .cloned()
        .or_else(|| config.get_string("report", "output").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));
    let template = template_path
        .cloned()
        .or_else(|| config.get_string("report", "template").map(PathBuf::from));
    let adapter = match template {
        Some(path) => HtmlReportAdapter::with_template(path),
        None => HtmlReportAdapter::new(),
    };

    match adapter.write(&view, &output.to_string_lossy()) {
        Ok(()) => {
            eprintln!("\nDashboard written to: {}", output.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}
