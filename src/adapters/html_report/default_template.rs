//! Built-in dashboard markup with `{{PLACEHOLDER}}` markers.
//!
//! A custom template may use any subset of these markers:
//! `TITLE`, `COMMODITY`, `FILTER_SUMMARY`, `KPI_CARDS`, `TREND_CHART`,
//! `MAP_CHART`, `DISTRIBUTION_CHART`, `FORECAST_SECTION`.

const TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{{TITLE}}</title>
<style>
  body { font-family: -apple-system, "Segoe UI", Roboto, sans-serif; margin: 2rem; color: #1f2937; }
  h1 { margin-bottom: 0.25rem; }
  .filters { color: #6b7280; margin-bottom: 1.5rem; }
  .kpis { display: grid; grid-template-columns: repeat(4, 1fr); gap: 1rem; margin-bottom: 2rem; }
  .kpi { border: 1px solid #e5e7eb; border-radius: 6px; padding: 0.75rem 1rem; }
  .kpi .label { font-size: 0.8rem; color: #6b7280; }
  .kpi .value { font-size: 1.4rem; font-weight: 600; }
  .kpi .delta { font-size: 0.8rem; }
  .delta.up { color: #b91c1c; }
  .delta.down { color: #15803d; }
  .charts { display: grid; grid-template-columns: 1fr 1fr; gap: 1.5rem; }
  .chart svg { width: 100%; height: auto; }
  .empty { color: #9ca3af; font-style: italic; padding: 2rem 0; }
  .warnings li { color: #92400e; }
</style>
</head>
<body>
<h1>{{TITLE}}</h1>
<div class="filters">{{FILTER_SUMMARY}}</div>

<h2>Market Overview: {{COMMODITY}}</h2>
<div class="kpis">
{{KPI_CARDS}}
</div>

<div class="charts">
  <div class="chart">
    <h3>Average Retail Price: {{COMMODITY}}</h3>
    {{TREND_CHART}}
  </div>
  <div class="chart">
    <h3>Latest Price Intensity by City</h3>
    {{MAP_CHART}}
  </div>
  <div class="chart">
    <h3>Price Distribution by Province</h3>
    {{DISTRIBUTION_CHART}}
  </div>
</div>

{{FORECAST_SECTION}}
</body>
</html>
"#;

pub fn template() -> &'static str {
    TEMPLATE
}
