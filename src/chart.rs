//! Chart backends
//!
//! A backend turns a finished [`StackedChart`] into image bytes. The default
//! [`SvgChart`] writes a self-contained SVG document; output is fully
//! determined by the chart data, so two renders of the same chart produce
//! identical bytes.

use crate::timeseries::StackedChart;
use costpulse_core::error::{CostpulseError, Result};
use costpulse_core::money::format_amount;
use std::fmt::Write;

/// Encoded chart ready for delivery
#[derive(Debug, Clone, PartialEq)]
pub struct ChartImage {
    pub bytes: Vec<u8>,
    /// File name used for uploads and dry-run output
    pub file_name: String,
    pub mime: &'static str,
}

/// Draws a stacked chart
pub trait ChartBackend: Send + Sync {
    fn render(&self, chart: &StackedChart) -> Result<ChartImage>;
}

const GRID_LINES: usize = 5;
const MARGIN_LEFT: f64 = 60.0;
const MARGIN_TOP: f64 = 30.0;
const MARGIN_BOTTOM: f64 = 40.0;
const LEGEND_WIDTH: f64 = 170.0;
const BAR_FILL: f64 = 0.7;

/// SVG backend
#[derive(Debug, Clone)]
pub struct SvgChart {
    pub width: u32,
    pub height: u32,
    pub title: String,
    pub y_label: String,
}

impl Default for SvgChart {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 300,
            title: "AWS Daily Costs (3 months)".to_string(),
            y_label: "Costs (USD)".to_string(),
        }
    }
}

impl ChartBackend for SvgChart {
    fn render(&self, chart: &StackedChart) -> Result<ChartImage> {
        let days = chart.dates.len();
        if let Some(bad) = chart.series.iter().find(|s| s.values.len() != days) {
            return Err(CostpulseError::Chart(format!(
                "series {:?} has {} values for {} days",
                bad.account_name,
                bad.values.len(),
                days
            )));
        }

        let mut svg = String::new();
        self.write_svg(&mut svg, chart)
            .map_err(|e| CostpulseError::Chart(e.to_string()))?;

        Ok(ChartImage {
            bytes: svg.into_bytes(),
            file_name: "timeseries.svg".to_string(),
            mime: "image/svg+xml",
        })
    }
}

impl SvgChart {
    fn write_svg(&self, out: &mut String, chart: &StackedChart) -> std::fmt::Result {
        let width = f64::from(self.width);
        let height = f64::from(self.height);
        let plot_width = (width - MARGIN_LEFT - LEGEND_WIDTH).max(1.0);
        let plot_height = (height - MARGIN_TOP - MARGIN_BOTTOM).max(1.0);
        let plot_bottom = MARGIN_TOP + plot_height;
        let y_max = if chart.y_max > 0.0 { chart.y_max } else { 1.0 };
        let y_of = |value: f64| plot_bottom - value / y_max * plot_height;
        let slot = plot_width / chart.dates.len().max(1) as f64;

        writeln!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="sans-serif" font-size="10">"#,
            w = self.width,
            h = self.height
        )?;
        writeln!(out, "<desc>{}</desc>", chart.period)?;
        writeln!(out, r#"<rect width="100%" height="100%" fill="white"/>"#)?;
        writeln!(
            out,
            r#"<text x="{:.1}" y="18" text-anchor="middle" font-size="14">{}</text>"#,
            MARGIN_LEFT + plot_width / 2.0,
            escape(&self.title)
        )?;
        writeln!(
            out,
            r#"<text transform="translate(14 {:.1}) rotate(-90)" text-anchor="middle">{}</text>"#,
            MARGIN_TOP + plot_height / 2.0,
            escape(&self.y_label)
        )?;

        // Grid and y ticks
        for step in 0..=GRID_LINES {
            let value = chart.y_max * step as f64 / GRID_LINES as f64;
            let y = y_of(value);
            writeln!(
                out,
                r##"<line x1="{MARGIN_LEFT:.1}" y1="{y:.1}" x2="{:.1}" y2="{y:.1}" stroke="#dddddd"/>"##,
                MARGIN_LEFT + plot_width
            )?;
            writeln!(
                out,
                r#"<text x="{:.1}" y="{:.1}" text-anchor="end">{}</text>"#,
                MARGIN_LEFT - 4.0,
                y + 3.0,
                format_amount(value)
            )?;
        }

        // Bars, bottom of the stack first
        for series in &chart.series {
            writeln!(out, r#"<g fill="{}">"#, series.color)?;
            for (i, (value, base)) in series.values.iter().zip(&series.baseline).enumerate() {
                if *value <= 0.0 {
                    continue;
                }
                let x = MARGIN_LEFT + slot * i as f64 + slot * (1.0 - BAR_FILL) / 2.0;
                let top = y_of(base + value);
                writeln!(
                    out,
                    r#"<rect x="{x:.1}" y="{top:.1}" width="{:.1}" height="{:.1}"/>"#,
                    slot * BAR_FILL,
                    y_of(*base) - top
                )?;
            }
            writeln!(out, "</g>")?;
        }

        // X labels
        for (i, label) in chart.labels.iter().enumerate() {
            if label.is_empty() {
                continue;
            }
            writeln!(
                out,
                r#"<text x="{:.1}" y="{:.1}" text-anchor="middle">{}</text>"#,
                MARGIN_LEFT + slot * (i as f64 + 0.5),
                plot_bottom + 14.0,
                label
            )?;
        }

        // Legend lists the top of the stack first
        let legend_x = width - LEGEND_WIDTH + 10.0;
        for (row, series) in chart.series.iter().rev().enumerate() {
            let y = MARGIN_TOP + 14.0 * row as f64;
            writeln!(
                out,
                r#"<rect x="{legend_x:.1}" y="{y:.1}" width="10" height="10" fill="{}"/>"#,
                series.color
            )?;
            writeln!(
                out,
                r#"<text x="{:.1}" y="{:.1}">{}</text>"#,
                legend_x + 14.0,
                y + 9.0,
                escape(&series.account_name)
            )?;
        }

        writeln!(out, "</svg>")
    }
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
