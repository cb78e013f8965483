//! CLI integration tests for command orchestration.
//!
//! Tests cover:
//! - Each subcommand end to end against a CSV file on disk
//! - Config files on disk overriding defaults, flags overriding config
//! - Exit codes for missing data, bad config and invalid filters
//! - Non-fatal forecast outcomes (empty selection, skipped provinces)

mod common;

use clap::Parser;
use common::*;
use mandimetrics::adapters::file_config_adapter::FileConfigAdapter;
use mandimetrics::cli::{self, Cli};
use mandimetrics::domain::error::MandiError;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tempfile::TempDir;

fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn exit(code: u8) -> String {
    format!("{:?}", ExitCode::from(code))
}

fn run(args: &[&str]) -> String {
    let mut argv = vec!["mandimetrics"];
    argv.extend_from_slice(args);
    format!("{:?}", cli::run(Cli::try_parse_from(argv).unwrap()))
}

/// Three years of monthly Wheat prices in Punjab and Sindh, a handful in
/// Balochistan, plus Rice in Sindh and some wholesale noise.
fn sample_csv(dir: &Path) -> PathBuf {
    let mut rows = Vec::new();
    for i in 0..36u32 {
        let d = date(2021, 1, 15) + chrono::Months::new(i);
        let d = d.format("%Y-%m-%d").to_string();
        let seasonal = if i % 12 == 5 { 15.0 } else { 0.0 };
        rows.push(csv_row(&d, "Punjab", "Lahore", "Wheat", "Retail", 100.0 + i as f64 + seasonal));
        rows.push(csv_row(&d, "Sindh", "Karachi", "Wheat", "Retail", 110.0 + i as f64));
        rows.push(csv_row(&d, "Sindh", "Karachi", "Wheat", "Wholesale", 9000.0));
        if i >= 31 {
            rows.push(csv_row(&d, "Balochistan", "Quetta", "Wheat", "Retail", 130.0));
        }
        if i % 6 == 0 {
            rows.push(csv_row(&d, "Sindh", "Hyderabad", "Rice (basmati)", "Retail", 300.0));
        }
    }
    write_price_csv(dir, &rows)
}

mod listing_commands {
    use super::*;

    #[test]
    fn commodities_provinces_and_info_succeed() {
        let dir = TempDir::new().unwrap();
        let csv = sample_csv(dir.path());
        let csv = csv.to_str().unwrap();

        assert_eq!(run(&["commodities", "--data", csv]), exit(0));
        assert_eq!(run(&["provinces", "--data", csv]), exit(0));
        assert_eq!(run(&["info", "-d", csv]), exit(0));
    }

    #[test]
    fn missing_data_file_exits_with_source_code() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("wfp_food_prices_pak.csv");
        assert_eq!(run(&["info", "--data", missing.to_str().unwrap()]), exit(3));
    }

    #[test]
    fn wholesale_only_file_is_a_load_error() {
        let dir = TempDir::new().unwrap();
        let csv = write_price_csv(
            dir.path(),
            &[csv_row("2024-01-15", "Punjab", "Lahore", "Wheat", "Wholesale", 9000.0)],
        );
        assert_eq!(run(&["commodities", "--data", csv.to_str().unwrap()]), exit(3));
    }
}

mod summary_command {
    use super::*;

    #[test]
    fn summary_with_filters_succeeds() {
        let dir = TempDir::new().unwrap();
        let csv = sample_csv(dir.path());
        let code = run(&[
            "summary",
            "--data",
            csv.to_str().unwrap(),
            "--commodity",
            "Wheat",
            "--province",
            "Punjab",
            "--from",
            "2022-01-01",
            "--to",
            "2022-12-31",
        ]);
        assert_eq!(code, exit(0));
    }

    #[test]
    fn empty_filter_result_is_not_an_error() {
        let dir = TempDir::new().unwrap();
        let csv = sample_csv(dir.path());
        let code = run(&[
            "summary",
            "--data",
            csv.to_str().unwrap(),
            "--province",
            "Gilgit-Baltistan",
        ]);
        assert_eq!(code, exit(0));
    }

    #[test]
    fn reversed_dates_exit_with_query_code() {
        let dir = TempDir::new().unwrap();
        let csv = sample_csv(dir.path());
        let code = run(&[
            "summary",
            "--data",
            csv.to_str().unwrap(),
            "--from",
            "2023-01-01",
            "--to",
            "2021-01-01",
        ]);
        assert_eq!(code, exit(4));
    }

    #[test]
    fn unknown_commodity_renders_empty_dashboard() {
        let dir = TempDir::new().unwrap();
        let csv = sample_csv(dir.path());
        let output = dir.path().join("saffron.html");
        assert_eq!(
            run(&["summary", "--data", csv.to_str().unwrap(), "--commodity", "Saffron"]),
            exit(0)
        );

        let code = run(&[
            "report",
            "--data",
            csv.to_str().unwrap(),
            "--commodity",
            "Saffron",
            "-o",
            output.to_str().unwrap(),
        ]);
        assert_eq!(code, exit(0));
        let html = std::fs::read_to_string(&output).unwrap();
        assert!(html.contains("N/A"));
        assert!(html.contains("No data for the selected filters."));
    }
}

mod config_files {
    use super::*;

    #[test]
    fn config_supplies_data_path_and_filters() {
        let dir = TempDir::new().unwrap();
        let csv = sample_csv(dir.path());
        let ini = write_temp_ini(&format!(
            "[data]\npath = {}\n\n[filter]\ncommodity = Rice (basmati)\nprovinces = Sindh\n",
            csv.display()
        ));
        let config = ini.path().to_str().unwrap();
        assert_eq!(run(&["summary", "--config", config]), exit(0));
    }

    #[test]
    fn invalid_config_exits_with_config_code() {
        let dir = TempDir::new().unwrap();
        let csv = sample_csv(dir.path());
        let ini = write_temp_ini("[forecast]\nhorizon_months = 48\n");
        let code = run(&[
            "forecast",
            "--config",
            ini.path().to_str().unwrap(),
            "--data",
            csv.to_str().unwrap(),
        ]);
        assert_eq!(code, exit(2));
    }

    #[test]
    fn oversized_fit_timeout_exits_with_config_code() {
        let dir = TempDir::new().unwrap();
        let csv = sample_csv(dir.path());
        let ini = write_temp_ini("[forecast]\nfit_timeout_secs = 1e30\n");
        let code = run(&[
            "forecast",
            "--config",
            ini.path().to_str().unwrap(),
            "--data",
            csv.to_str().unwrap(),
        ]);
        assert_eq!(code, exit(2));
    }

    #[test]
    fn missing_config_file_exits_with_config_code() {
        let code = run(&["info", "--config", "/nonexistent/mandimetrics.ini"]);
        assert_eq!(code, exit(2));
    }

    #[test]
    fn filter_resolution_from_config_on_disk() {
        let dir = TempDir::new().unwrap();
        let csv = sample_csv(dir.path());
        let ini = write_temp_ini("[filter]\nprovinces = Punjab, Balochistan\nfrom = 2023-06-01\n");
        let config = FileConfigAdapter::from_file(ini.path()).unwrap();

        let port = mandimetrics::adapters::csv_adapter::CsvAdapter::new(csv);
        let dataset = mandimetrics::domain::session::Session::new()
            .dataset(&port)
            .unwrap();
        let filter = cli::resolve_filter(&dataset, &config, &cli::FilterArgs::default()).unwrap();

        assert_eq!(filter.commodity, "Wheat");
        assert_eq!(filter.regions, vec!["Punjab", "Balochistan"]);
        assert_eq!(filter.date_from, date(2023, 6, 1));
        assert_eq!(filter.date_to, date(2023, 12, 15));
    }

    #[test]
    fn bad_smoothing_parameter_is_config_invalid() {
        let config = FileConfigAdapter::from_string("[forecast]\nalpha = 1.0\n").unwrap();
        let err = cli::build_forecaster(&config).unwrap_err();
        assert!(matches!(err, MandiError::ConfigInvalid { .. }));
    }
}

mod forecast_command {
    use super::*;

    #[test]
    fn forecast_default_provinces_succeeds() {
        let dir = TempDir::new().unwrap();
        let csv = sample_csv(dir.path());
        assert_eq!(run(&["forecast", "--data", csv.to_str().unwrap()]), exit(0));
    }

    #[test]
    fn sparse_province_is_skipped_not_fatal() {
        let dir = TempDir::new().unwrap();
        let csv = sample_csv(dir.path());
        let code = run(&[
            "forecast",
            "--data",
            csv.to_str().unwrap(),
            "--forecast-province",
            "Balochistan",
            "--forecast-province",
            "Punjab",
            "--horizon",
            "6",
        ]);
        assert_eq!(code, exit(0));
    }

    #[test]
    fn blank_selection_warns_and_succeeds() {
        let dir = TempDir::new().unwrap();
        let csv = sample_csv(dir.path());
        let code = run(&[
            "forecast",
            "--data",
            csv.to_str().unwrap(),
            "--forecast-province",
            "",
        ]);
        assert_eq!(code, exit(0));
    }

    #[test]
    fn horizon_out_of_range_exits_with_config_code() {
        let dir = TempDir::new().unwrap();
        let csv = sample_csv(dir.path());
        let code = run(&["forecast", "--data", csv.to_str().unwrap(), "--horizon", "0"]);
        assert_eq!(code, exit(2));
    }
}

mod report_command {
    use super::*;

    #[test]
    fn report_writes_dashboard_with_forecast() {
        let dir = TempDir::new().unwrap();
        let csv = sample_csv(dir.path());
        let output = dir.path().join("reports/dashboard.html");

        let code = run(&[
            "report",
            "--data",
            csv.to_str().unwrap(),
            "--with-forecast",
            "--forecast-province",
            "Punjab",
            "--forecast-province",
            "Balochistan",
            "-o",
            output.to_str().unwrap(),
        ]);
        assert_eq!(code, exit(0));

        let html = std::fs::read_to_string(&output).unwrap();
        assert!(html.contains("MandiMetrics: Pakistan Food Price Intelligence"));
        assert!(html.contains("Average Retail Price: Wheat"));
        assert!(html.contains("Punjab (Predicted)"));
        assert!(html.contains("Not enough data for Balochistan"));
        assert!(!html.contains("{{"));
    }

    #[test]
    fn report_without_forecast_flag_has_no_forecast_section() {
        let dir = TempDir::new().unwrap();
        let csv = sample_csv(dir.path());
        let output = dir.path().join("dashboard.html");

        let code = run(&[
            "report",
            "--data",
            csv.to_str().unwrap(),
            "--commodity",
            "Rice (basmati)",
            "--output",
            output.to_str().unwrap(),
        ]);
        assert_eq!(code, exit(0));

        let html = std::fs::read_to_string(&output).unwrap();
        assert!(html.contains("Rice (basmati)"));
        assert!(!html.contains("Future Price Projection"));
    }

    #[test]
    fn report_uses_config_title_and_template() {
        let dir = TempDir::new().unwrap();
        let csv = sample_csv(dir.path());
        let template = dir.path().join("custom.html");
        std::fs::write(&template, "<h1>{{TITLE}}</h1>\n{{KPI_CARDS}}").unwrap();
        let output = dir.path().join("custom_out.html");
        let ini = write_temp_ini(&format!(
            "[data]\npath = {}\n\n[report]\ntitle = Weekly Mandi Brief\ntemplate = {}\noutput = {}\n",
            csv.display(),
            template.display(),
            output.display()
        ));

        assert_eq!(run(&["report", "--config", ini.path().to_str().unwrap()]), exit(0));
        let html = std::fs::read_to_string(&output).unwrap();
        assert!(html.starts_with("<h1>Weekly Mandi Brief</h1>"));
        assert!(html.contains("Current Avg Price"));
    }

    #[test]
    fn config_enables_forecast_section() {
        let dir = TempDir::new().unwrap();
        let csv = sample_csv(dir.path());
        let output = dir.path().join("configured.html");
        let ini = write_temp_ini(&format!(
            "[data]\npath = {}\n\n[forecast]\nprovinces = Punjab\n\n[report]\nwith_forecast = yes\noutput = {}\n",
            csv.display(),
            output.display()
        ));

        assert_eq!(run(&["report", "--config", ini.path().to_str().unwrap()]), exit(0));
        let html = std::fs::read_to_string(&output).unwrap();
        assert!(html.contains("Future Price Projection"));
        assert!(html.contains("Punjab (Predicted)"));
    }

    #[test]
    fn missing_template_exits_with_report_code() {
        let dir = TempDir::new().unwrap();
        let csv = sample_csv(dir.path());
        let code = run(&[
            "report",
            "--data",
            csv.to_str().unwrap(),
            "--template",
            dir.path().join("nope.html").to_str().unwrap(),
            "-o",
            dir.path().join("out.html").to_str().unwrap(),
        ]);
        assert_eq!(code, exit(1));
    }
}
