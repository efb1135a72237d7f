//! HTML report adapter implementing ReportPort.
//!
//! Renders an Askama template with the aligned table's head, per-column
//! summaries and inline SVG charts.

use std::fs;
use std::path::Path;

use askama::Template;
use tracing::info;

use crate::adapters::chart_svg;
use crate::domain::align::AlignedTable;
use crate::domain::error::RetvizError;
use crate::domain::render_options::{HistMultiple, RenderOptions};
use crate::domain::stats::{CorrelationMatrix, Summary};
use crate::ports::report_port::{ExploratoryReport, ReportPort};

struct HeadRow {
    date: String,
    values: Vec<String>,
}

struct SummaryRow {
    name: String,
    count: usize,
    cells: Vec<String>,
}

struct Chart {
    title: String,
    svg: String,
}

struct InstrumentRow {
    symbol: String,
    column: String,
}

#[derive(Template)]
#[template(path = "report.html")]
struct ReportTemplate {
    start_date: String,
    end_date: String,
    row_count: usize,
    instruments: Vec<InstrumentRow>,
    columns: Vec<String>,
    head_rows: usize,
    head: Vec<HeadRow>,
    summaries: Vec<SummaryRow>,
    column_histograms: Vec<Chart>,
    combined_histogram: String,
    subset_histogram: Chart,
    box_plot: String,
    pairplot: String,
    heatmap: String,
    options: String,
}

fn fmt_value(v: f64) -> String {
    if v.is_finite() {
        format!("{v:.6}")
    } else {
        "NaN".to_string()
    }
}

fn head_rows(table: &AlignedTable, n: usize) -> Vec<HeadRow> {
    table
        .head(n)
        .rows()
        .map(|(date, values)| HeadRow {
            date: date.format("%Y-%m-%d").to_string(),
            values: values.into_iter().map(fmt_value).collect(),
        })
        .collect()
}

fn summary_rows(table: &AlignedTable) -> Vec<SummaryRow> {
    Summary::for_table(table)
        .into_iter()
        .map(|(name, s)| SummaryRow {
            name,
            count: s.count,
            cells: [s.mean, s.std, s.min, s.q25, s.median, s.q75, s.max]
                .into_iter()
                .map(fmt_value)
                .collect(),
        })
        .collect()
}

fn options_line(options: &RenderOptions) -> String {
    let bins = options
        .bins
        .map_or_else(|| "auto".to_string(), |b| b.to_string());
    let bound = |v: Option<f64>| v.map_or_else(|| "data".to_string(), |v| format!("{v}"));
    format!(
        "bins={bins} multiple={} vmin={} vmax={} annot={} cmap={}",
        options.multiple,
        bound(options.vmin),
        bound(options.vmax),
        options.annot,
        options.cmap
    )
}

fn build_template(
    report: &ExploratoryReport<'_>,
    options: &RenderOptions,
) -> Result<ReportTemplate, RetvizError> {
    let table = report.table;
    let columns = table.columns().to_vec();
    if columns.len() < 2 {
        return Err(RetvizError::TooFewSeries {
            count: columns.len(),
        });
    }

    let mut column_histograms = Vec::with_capacity(columns.len());
    let all = table.column_slices();
    for (name, &values) in columns.iter().zip(&all) {
        let svg = chart_svg::histogram_svg(name, std::slice::from_ref(name), &[values], options)?;
        column_histograms.push(Chart {
            title: name.clone(),
            svg,
        });
    }

    let combined_histogram = chart_svg::histogram_svg("All columns", &columns, &all, options)?;

    let pair = table.select(&[columns[0].as_str(), columns[1].as_str()])?;
    let layered = RenderOptions {
        multiple: HistMultiple::Layer,
        ..options.clone()
    };
    let subset_title = format!("{} vs {}", columns[0], columns[1]);
    let subset_histogram = Chart {
        svg: chart_svg::histogram_svg(
            &subset_title,
            pair.columns(),
            &pair.column_slices(),
            &layered,
        )?,
        title: subset_title,
    };

    let instruments = report
        .instruments
        .iter()
        .map(|inst| InstrumentRow {
            symbol: inst.symbol.clone(),
            column: inst.display_name().to_string(),
        })
        .collect();

    Ok(ReportTemplate {
        start_date: report.start_date.format("%Y-%m-%d").to_string(),
        end_date: report.end_date.format("%Y-%m-%d").to_string(),
        row_count: table.row_count(),
        instruments,
        head_rows: report.head_rows,
        head: head_rows(table, report.head_rows),
        summaries: summary_rows(table),
        column_histograms,
        combined_histogram,
        subset_histogram,
        box_plot: chart_svg::box_plot_svg(table),
        pairplot: chart_svg::pairplot_svg(table, options)?,
        heatmap: chart_svg::heatmap_svg(&CorrelationMatrix::compute(table), options),
        options: options_line(options),
        columns,
    })
}

pub struct HtmlReportAdapter;

impl HtmlReportAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HtmlReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportPort for HtmlReportAdapter {
    fn write(
        &self,
        report: &ExploratoryReport<'_>,
        options: &RenderOptions,
        output_path: &str,
    ) -> Result<(), RetvizError> {
        let html = build_template(report, options)?
            .render()
            .map_err(|e| RetvizError::Io(std::io::Error::other(e.to_string())))?;

        let path = Path::new(output_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, html)?;

        info!(path = output_path, "report written");
        Ok(())
    }
}
