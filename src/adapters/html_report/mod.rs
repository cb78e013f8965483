//! HTML dashboard report implementing `ReportPort`.
//!
//! Reads an HTML template (the built-in default or a custom file), resolves
//! every `{{PLACEHOLDER}}` from a `DashboardView` using the helpers in
//! `chart_svg`, and writes a single self-contained `.html` file.

pub mod chart_svg;
pub mod default_template;

use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::dashboard::DashboardView;
use crate::domain::error::MandiError;
use crate::domain::forecast::ForecastBatch;
use crate::domain::kpi::{format_percent_change, format_price, KpiSummary};
use crate::ports::report_port::ReportPort;

pub(crate) fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn chart_or_empty(svg: String, message: &str) -> String {
    if svg.is_empty() {
        format!("<p class=\"empty\">{}</p>", message)
    } else {
        svg
    }
}

fn kpi_card(label: &str, value: &str, delta: Option<(&str, &str)>) -> String {
    let delta = delta
        .map(|(class, text)| format!("\n    <div class=\"delta {}\">{}</div>", class, escape_html(text)))
        .unwrap_or_default();
    format!(
        "  <div class=\"kpi\">\n    <div class=\"label\">{}</div>\n    <div class=\"value\">{}</div>{}\n  </div>\n",
        label,
        escape_html(value),
        delta
    )
}

fn render_kpi_cards(kpis: &KpiSummary) -> String {
    let delta_class = match kpis.yoy_change_pct {
        Some(pct) if pct > 0.0 => "up",
        Some(pct) if pct < 0.0 => "down",
        _ => "flat",
    };
    let delta_text = format_percent_change(kpis.yoy_change_pct);

    let mut out = String::new();
    out.push_str(&kpi_card(
        "Current Avg Price",
        &format_price(kpis.current_avg_price),
        Some((delta_class, &delta_text)),
    ));
    out.push_str(&kpi_card(
        "Highest Recorded Price",
        &format_price(kpis.highest_price),
        None,
    ));
    out.push_str(&kpi_card(
        "Lowest Recorded Price",
        &format_price(kpis.lowest_price),
        None,
    ));
    out.push_str(&kpi_card(
        "Data Points Analyzed",
        &kpis.data_points.to_string(),
        None,
    ));
    out
}

fn render_filter_summary(view: &DashboardView) -> String {
    let regions = if view.filter.regions.is_empty() {
        "none".to_string()
    } else {
        view.filter.regions.join(", ")
    };
    escape_html(&format!(
        "{} | {} to {} | Provinces: {}",
        view.filter.commodity, view.filter.date_from, view.filter.date_to, regions
    ))
}

fn render_forecast_section(batch: &ForecastBatch) -> String {
    let mut out = format!(
        "<h2>Future Price Projection: {}</h2>\n<p>Horizon: {} months</p>\n",
        escape_html(&batch.commodity),
        batch.horizon_months
    );
    out.push_str("<div class=\"chart\">\n");
    out.push_str(&chart_or_empty(
        chart_svg::generate_forecast_svg(batch),
        "No region produced a forecast.",
    ));
    out.push_str("\n</div>\n");

    if !batch.warnings.is_empty() {
        out.push_str("<ul class=\"warnings\">\n");
        for warning in &batch.warnings {
            out.push_str(&format!("  <li>{}</li>\n", escape_html(&warning.to_string())));
        }
        out.push_str("</ul>\n");
    }
    out
}

/// Resolve all `{{PLACEHOLDER}}`s in `template` from the view.
pub fn resolve(template: &str, view: &DashboardView) -> String {
    let forecast = view
        .forecast
        .as_ref()
        .map(render_forecast_section)
        .unwrap_or_default();

    template
        .replace("{{TITLE}}", &escape_html(&view.title))
        .replace("{{COMMODITY}}", &escape_html(&view.filter.commodity))
        .replace("{{FILTER_SUMMARY}}", &render_filter_summary(view))
        .replace("{{KPI_CARDS}}", &render_kpi_cards(&view.kpis))
        .replace(
            "{{TREND_CHART}}",
            &chart_or_empty(
                chart_svg::generate_trend_svg(&view.trend),
                "No data for the selected filters.",
            ),
        )
        .replace(
            "{{MAP_CHART}}",
            &chart_or_empty(
                chart_svg::generate_map_svg(&view.snapshot),
                "No market prices to map.",
            ),
        )
        .replace(
            "{{DISTRIBUTION_CHART}}",
            &chart_or_empty(
                chart_svg::generate_distribution_svg(&view.distributions),
                "No data for the selected filters.",
            ),
        )
        .replace("{{FORECAST_SECTION}}", &forecast)
}

#[derive(Debug, Default)]
pub struct HtmlReportAdapter {
    template_path: Option<PathBuf>,
}

impl HtmlReportAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_template(path: impl Into<PathBuf>) -> Self {
        Self {
            template_path: Some(path.into()),
        }
    }

    fn load_template(&self) -> Result<String, MandiError> {
        match &self.template_path {
            None => Ok(default_template::template().to_string()),
            Some(path) => fs::read_to_string(path).map_err(|e| MandiError::Report {
                reason: format!("cannot read template '{}': {}", path.display(), e),
            }),
        }
    }
}

impl ReportPort for HtmlReportAdapter {
    fn write(&self, view: &DashboardView, output_path: &str) -> Result<(), MandiError> {
        let html = resolve(&self.load_template()?, view);

        let path = Path::new(output_path);
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, html)?;
        tracing::debug!(output = output_path, "dashboard written");
        Ok(())
    }
}
