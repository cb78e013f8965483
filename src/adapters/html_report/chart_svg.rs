//! Inline SVG charts for the HTML dashboard.
//!
//! Every generator returns an empty string when it has nothing to plot; the
//! caller substitutes an empty-state message.

use chrono::NaiveDate;

use super::escape_html;
use crate::domain::dashboard::MapMarker;
use crate::domain::distribution::RegionDistribution;
use crate::domain::forecast::ForecastBatch;
use crate::domain::query::DailyMean;

const CHART_WIDTH: f64 = 600.0;
const CHART_HEIGHT: f64 = 300.0;
const MARGIN_LEFT: f64 = 60.0;
const MARGIN_RIGHT: f64 = 20.0;
const MARGIN_TOP: f64 = 30.0;
const MARGIN_BOTTOM: f64 = 40.0;

const MIN_BUBBLE_RADIUS: f64 = 4.0;
const MAX_BUBBLE_RADIUS: f64 = 14.0;

const SERIES_COLORS: [&str; 8] = [
    "#2563eb", "#dc2626", "#16a34a", "#d97706", "#7c3aed", "#0891b2", "#db2777", "#4b5563",
];

fn plot_width() -> f64 {
    CHART_WIDTH - MARGIN_LEFT - MARGIN_RIGHT
}

fn plot_height() -> f64 {
    CHART_HEIGHT - MARGIN_TOP - MARGIN_BOTTOM
}

/// Linear map from a value range onto the vertical plot area. A flat range
/// is widened so a constant series draws along the bottom.
struct YScale {
    min: f64,
    max: f64,
}

impl YScale {
    fn new(values: impl Iterator<Item = f64>) -> Option<Self> {
        let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
        if !min.is_finite() || !max.is_finite() {
            return None;
        }
        Some(Self { min, max })
    }

    fn range(&self) -> f64 {
        (self.max - self.min).max(1.0)
    }

    fn y(&self, v: f64) -> f64 {
        MARGIN_TOP + plot_height() - ((v - self.min) / self.range()) * plot_height()
    }
}

/// Maps dates onto the horizontal plot area by day offset.
struct DateScale {
    start: NaiveDate,
    span_days: f64,
}

impl DateScale {
    fn new(start: NaiveDate, end: NaiveDate) -> Self {
        let span_days = ((end - start).num_days() as f64).max(1.0);
        Self { start, span_days }
    }

    fn x(&self, date: NaiveDate) -> f64 {
        MARGIN_LEFT + ((date - self.start).num_days() as f64 / self.span_days) * plot_width()
    }
}

fn open_svg(svg: &mut String, y_label: &str) {
    svg.push_str(&format!(
        r##"<svg width="{}" height="{}" viewBox="0 0 {} {}" xmlns="http://www.w3.org/2000/svg">"##,
        CHART_WIDTH, CHART_HEIGHT, CHART_WIDTH, CHART_HEIGHT
    ));
    svg.push_str("\n  <rect width=\"100%\" height=\"100%\" fill=\"white\"/>\n");
    svg.push_str(&format!(
        "  <text x=\"{}\" y=\"15\" text-anchor=\"end\" font-size=\"12\" fill=\"#666\">{}</text>\n",
        CHART_WIDTH,
        escape_html(y_label)
    ));
}

fn push_axes(svg: &mut String) {
    svg.push_str(&format!(
        "  <line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"#ccc\" stroke-width=\"1\"/>\n",
        MARGIN_LEFT,
        MARGIN_TOP,
        MARGIN_LEFT,
        CHART_HEIGHT - MARGIN_BOTTOM
    ));
    svg.push_str(&format!(
        "  <line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"#ccc\" stroke-width=\"1\"/>\n",
        MARGIN_LEFT,
        CHART_HEIGHT - MARGIN_BOTTOM,
        CHART_WIDTH - MARGIN_RIGHT,
        CHART_HEIGHT - MARGIN_BOTTOM
    ));
}

fn push_y_labels(svg: &mut String, scale: &YScale, fmt: impl Fn(f64) -> String) {
    let mid = (scale.max + scale.min) / 2.0;
    for (value, y) in [
        (scale.max, MARGIN_TOP + 5.0),
        (mid, MARGIN_TOP + plot_height() / 2.0),
        (scale.min, CHART_HEIGHT - MARGIN_BOTTOM - 5.0),
    ] {
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" text-anchor=\"end\" font-size=\"10\" fill=\"#666\">{}</text>\n",
            MARGIN_LEFT - 5.0,
            y,
            fmt(value)
        ));
    }
}

fn push_x_label(svg: &mut String, x: f64, label: &str) {
    svg.push_str(&format!(
        "  <text x=\"{:.1}\" y=\"{}\" text-anchor=\"middle\" font-size=\"10\" fill=\"#666\">{}</text>\n",
        x,
        CHART_HEIGHT - MARGIN_BOTTOM / 2.0,
        escape_html(label)
    ));
}

fn push_date_labels(svg: &mut String, start: NaiveDate, mid: NaiveDate, end: NaiveDate) {
    push_x_label(svg, MARGIN_LEFT, &start.to_string());
    push_x_label(svg, MARGIN_LEFT + plot_width() / 2.0, &mid.to_string());
    push_x_label(svg, CHART_WIDTH - MARGIN_RIGHT, &end.to_string());
}

fn price_label(value: f64) -> String {
    format!("{:.0}", value)
}

fn path_data(points: impl Iterator<Item = (f64, f64)>) -> String {
    let mut data = String::new();
    for (i, (x, y)) in points.enumerate() {
        if i == 0 {
            data.push_str(&format!("M {:.1} {:.1}", x, y));
        } else {
            data.push_str(&format!(" L {:.1} {:.1}", x, y));
        }
    }
    data
}

/// Daily mean price line over the filtered date range.
pub fn generate_trend_svg(trend: &[DailyMean]) -> String {
    let (Some(first), Some(last)) = (trend.first(), trend.last()) else {
        return String::new();
    };
    let Some(y_scale) = YScale::new(trend.iter().map(|p| p.mean_price)) else {
        return String::new();
    };
    let x_scale = DateScale::new(first.date, last.date);

    let mut svg = String::new();
    open_svg(&mut svg, "Price (PKR)");
    push_axes(&mut svg);
    push_y_labels(&mut svg, &y_scale, price_label);
    push_date_labels(&mut svg, first.date, trend[trend.len() / 2].date, last.date);
    svg.push_str(&format!(
        "  <path d=\"{}\" fill=\"none\" stroke=\"#2563eb\" stroke-width=\"2\"/>\n",
        path_data(
            trend
                .iter()
                .map(|p| (x_scale.x(p.date), y_scale.y(p.mean_price)))
        )
    ));
    svg.push_str("</svg>");
    svg
}

/// Colour on a yellow to red ramp for `t` in [0, 1].
fn heat_color(t: f64) -> String {
    let t = t.clamp(0.0, 1.0);
    let lerp = |a: f64, b: f64| (a + (b - a) * t).round() as u8;
    format!(
        "#{:02x}{:02x}{:02x}",
        lerp(253.0, 185.0),
        lerp(230.0, 28.0),
        lerp(138.0, 28.0)
    )
}

/// Latest price per market placed by longitude and latitude. Bubble size
/// and colour both scale with price.
pub fn generate_map_svg(markers: &[MapMarker]) -> String {
    if markers.is_empty() {
        return String::new();
    }
    let bounds = |f: fn(&MapMarker) -> f64| {
        markers
            .iter()
            .map(f)
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            })
    };
    let (lon_min, lon_max) = bounds(|m| m.longitude);
    let (lat_min, lat_max) = bounds(|m| m.latitude);
    let (price_min, price_max) = bounds(|m| m.price);
    let lon_span = (lon_max - lon_min).max(1.0);
    let lat_span = (lat_max - lat_min).max(1.0);
    let price_span = price_max - price_min;

    let inset = MAX_BUBBLE_RADIUS;
    let x = |lon: f64| MARGIN_LEFT + inset + ((lon - lon_min) / lon_span) * (plot_width() - 2.0 * inset);
    let y = |lat: f64| {
        MARGIN_TOP + inset + plot_height() - 2.0 * inset
            - ((lat - lat_min) / lat_span) * (plot_height() - 2.0 * inset)
    };

    let mut svg = String::new();
    open_svg(&mut svg, "Latitude / Longitude");
    push_axes(&mut svg);
    push_x_label(&mut svg, MARGIN_LEFT, &format!("{:.1}°E", lon_min));
    push_x_label(&mut svg, CHART_WIDTH - MARGIN_RIGHT, &format!("{:.1}°E", lon_max));
    svg.push_str(&format!(
        "  <text x=\"{}\" y=\"{}\" text-anchor=\"end\" font-size=\"10\" fill=\"#666\">{:.1}°N</text>\n",
        MARGIN_LEFT - 5.0,
        MARGIN_TOP + 5.0,
        lat_max
    ));
    svg.push_str(&format!(
        "  <text x=\"{}\" y=\"{}\" text-anchor=\"end\" font-size=\"10\" fill=\"#666\">{:.1}°N</text>\n",
        MARGIN_LEFT - 5.0,
        CHART_HEIGHT - MARGIN_BOTTOM - 5.0,
        lat_min
    ));

    for marker in markers {
        let t = if price_span > 0.0 {
            (marker.price - price_min) / price_span
        } else {
            0.5
        };
        let radius = MIN_BUBBLE_RADIUS + t * (MAX_BUBBLE_RADIUS - MIN_BUBBLE_RADIUS);
        svg.push_str(&format!(
            "  <circle cx=\"{:.1}\" cy=\"{:.1}\" r=\"{:.1}\" fill=\"{}\" fill-opacity=\"0.8\" stroke=\"#7f1d1d\" stroke-width=\"0.5\"><title>{} ({}): PKR {:.2}</title></circle>\n",
            x(marker.longitude),
            y(marker.latitude),
            radius,
            heat_color(t),
            escape_html(&marker.market),
            escape_html(&marker.region),
            marker.price
        ));
    }
    svg.push_str("</svg>");
    svg
}

/// One box per province: whiskers at min and max, box from the lower to the
/// upper quartile, a bar at the median.
pub fn generate_distribution_svg(distributions: &[RegionDistribution]) -> String {
    if distributions.is_empty() {
        return String::new();
    }
    let Some(y_scale) = YScale::new(
        distributions
            .iter()
            .flat_map(|d| [d.min, d.max]),
    ) else {
        return String::new();
    };

    let slot = plot_width() / distributions.len() as f64;
    let box_width = (slot * 0.5).min(60.0);

    let mut svg = String::new();
    open_svg(&mut svg, "Price (PKR)");
    push_axes(&mut svg);
    push_y_labels(&mut svg, &y_scale, price_label);

    for (i, d) in distributions.iter().enumerate() {
        let color = SERIES_COLORS[i % SERIES_COLORS.len()];
        let cx = MARGIN_LEFT + slot * (i as f64 + 0.5);
        let left = cx - box_width / 2.0;
        let q1 = y_scale.y(d.lower_quartile);
        let q3 = y_scale.y(d.upper_quartile);

        svg.push_str(&format!(
            "  <line x1=\"{cx:.1}\" y1=\"{:.1}\" x2=\"{cx:.1}\" y2=\"{:.1}\" stroke=\"{color}\" stroke-width=\"1\"/>\n",
            y_scale.y(d.max),
            y_scale.y(d.min),
        ));
        svg.push_str(&format!(
            "  <rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" fill=\"{color}\" fill-opacity=\"0.3\" stroke=\"{color}\" stroke-width=\"1.5\"><title>{}: n={}, median PKR {:.2}</title></rect>\n",
            left,
            q3,
            box_width,
            (q1 - q3).max(1.0),
            escape_html(&d.region),
            d.count,
            d.median
        ));
        let median_y = y_scale.y(d.median);
        svg.push_str(&format!(
            "  <line x1=\"{:.1}\" y1=\"{median_y:.1}\" x2=\"{:.1}\" y2=\"{median_y:.1}\" stroke=\"{color}\" stroke-width=\"2\"/>\n",
            left,
            left + box_width,
        ));
        push_x_label(&mut svg, cx, &d.region);
    }
    svg.push_str("</svg>");
    svg
}

/// One predicted line per region on a shared date axis, with a legend.
pub fn generate_forecast_svg(batch: &ForecastBatch) -> String {
    let points = || batch.series.iter().flat_map(|s| s.points.iter());
    let Some(start) = points().map(|p| p.date).min() else {
        return String::new();
    };
    let Some(end) = points().map(|p| p.date).max() else {
        return String::new();
    };
    let Some(y_scale) = YScale::new(points().map(|p| p.value)) else {
        return String::new();
    };
    let x_scale = DateScale::new(start, end);
    let mid = start + (end - start) / 2;

    let mut svg = String::new();
    open_svg(&mut svg, "Price (PKR)");
    push_axes(&mut svg);
    push_y_labels(&mut svg, &y_scale, price_label);
    push_date_labels(&mut svg, start, mid, end);

    for (i, series) in batch.series.iter().enumerate() {
        let color = SERIES_COLORS[i % SERIES_COLORS.len()];
        svg.push_str(&format!(
            "  <path d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"2\"/>\n",
            path_data(
                series
                    .points
                    .iter()
                    .map(|p| (x_scale.x(p.date), y_scale.y(p.value)))
            ),
            color
        ));

        let legend_y = MARGIN_TOP + 4.0 + i as f64 * 14.0;
        let legend_x = MARGIN_LEFT + 10.0;
        svg.push_str(&format!(
            "  <rect x=\"{:.1}\" y=\"{:.1}\" width=\"10\" height=\"10\" fill=\"{}\"/>\n",
            legend_x,
            legend_y - 9.0,
            color
        ));
        svg.push_str(&format!(
            "  <text x=\"{:.1}\" y=\"{:.1}\" font-size=\"10\" fill=\"#333\">{}</text>\n",
            legend_x + 14.0,
            legend_y,
            escape_html(&series.label())
        ));
    }
    svg.push_str("</svg>");
    svg
}
