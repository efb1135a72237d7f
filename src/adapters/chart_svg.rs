//! Inline SVG charts for exploratory reports.
//!
//! Every function is pure: data and options in, an `<svg>` element out.

use crate::domain::align::AlignedTable;
use crate::domain::error::RetvizError;
use crate::domain::render_options::{HistMultiple, RenderOptions};
use crate::domain::stats::{BoxSummary, CorrelationMatrix, Histogram};

const WIDTH: f64 = 600.0;
const HEIGHT: f64 = 320.0;
const PAD_LEFT: f64 = 56.0;
const PAD_RIGHT: f64 = 20.0;
const PAD_TOP: f64 = 30.0;
const PAD_BOTTOM: f64 = 40.0;
const PAIR_CELL: f64 = 160.0;
const HEAT_CELL: f64 = 80.0;
const AXIS_COLOR: &str = "#333333";
const GRID_COLOR: &str = "#e5e5e5";

const SERIES_COLORS: &[&str] = &[
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];

pub fn series_color(i: usize) -> &'static str {
    SERIES_COLORS[i % SERIES_COLORS.len()]
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn svg_open(width: f64, height: f64) -> String {
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w:.0}" height="{h:.0}" viewBox="0 0 {w:.0} {h:.0}" font-family="sans-serif" font-size="11">"#,
        w = width,
        h = height
    )
}

fn text(x: f64, y: f64, anchor: &str, content: &str) -> String {
    format!(
        r#"<text x="{x:.1}" y="{y:.1}" text-anchor="{anchor}" fill="{AXIS_COLOR}">{}</text>"#,
        escape(content)
    )
}

fn axes(svg: &mut String, width: f64, height: f64) {
    let (x0, y0) = (PAD_LEFT, height - PAD_BOTTOM);
    svg.push_str(&format!(
        r#"<line x1="{x0:.1}" y1="{y0:.1}" x2="{x1:.1}" y2="{y0:.1}" stroke="{AXIS_COLOR}"/>"#,
        x1 = width - PAD_RIGHT
    ));
    svg.push_str(&format!(
        r#"<line x1="{x0:.1}" y1="{PAD_TOP:.1}" x2="{x0:.1}" y2="{y0:.1}" stroke="{AXIS_COLOR}"/>"#
    ));
}

fn legend(svg: &mut String, labels: &[String], width: f64) {
    for (i, label) in labels.iter().enumerate() {
        let y = PAD_TOP + 4.0 + i as f64 * 16.0;
        let x = width - PAD_RIGHT - 110.0;
        svg.push_str(&format!(
            r#"<rect x="{x:.1}" y="{y:.1}" width="10" height="10" fill="{}" fill-opacity="0.7"/>"#,
            series_color(i)
        ));
        svg.push_str(&text(x + 14.0, y + 9.0, "start", label));
    }
}

/// Histogram of one or more series over shared bins, honouring `bins` and
/// `multiple`.
pub fn histogram_svg(
    title: &str,
    labels: &[String],
    series: &[&[f64]],
    options: &RenderOptions,
) -> Result<String, RetvizError> {
    let hist = Histogram::compute_shared(series, options.bins)?;
    let (width, height) = (WIDTH, HEIGHT);
    let plot_w = width - PAD_LEFT - PAD_RIGHT;
    let plot_h = height - PAD_TOP - PAD_BOTTOM;

    let y_max = match options.multiple {
        HistMultiple::Stack => hist.max_stacked(),
        HistMultiple::Layer | HistMultiple::Dodge => hist.max_count(),
    }
    .max(1) as f64;

    let lo = hist.edges[0];
    let hi = hist.edges[hist.bin_count()];
    let sx = |v: f64| PAD_LEFT + (v - lo) / (hi - lo) * plot_w;
    let bar_h = |count: usize| count as f64 / y_max * plot_h;
    let base_y = height - PAD_BOTTOM;

    let mut svg = svg_open(width, height);
    svg.push_str(&text(width / 2.0, 18.0, "middle", title));

    let n = hist.counts.len();
    for b in 0..hist.bin_count() {
        let x0 = sx(hist.edges[b]);
        let bw = sx(hist.edges[b + 1]) - x0;
        let mut stacked = 0usize;

        for (s, row) in hist.counts.iter().enumerate() {
            let count = row[b];
            if count == 0 {
                continue;
            }
            let (x, w, y, h, opacity) = match options.multiple {
                HistMultiple::Layer => {
                    let opacity = if n > 1 { 0.5 } else { 0.8 };
                    (x0, bw, base_y - bar_h(count), bar_h(count), opacity)
                }
                HistMultiple::Dodge => {
                    let sub = bw / n as f64;
                    (x0 + s as f64 * sub, sub, base_y - bar_h(count), bar_h(count), 0.8)
                }
                HistMultiple::Stack => {
                    let y = base_y - bar_h(stacked + count);
                    stacked += count;
                    (x0, bw, y, bar_h(count), 0.8)
                }
            };
            svg.push_str(&format!(
                r#"<rect x="{x:.2}" y="{y:.2}" width="{w:.2}" height="{h:.2}" fill="{}" fill-opacity="{opacity}" stroke="white" stroke-width="0.5"/>"#,
                series_color(s)
            ));
        }
    }

    axes(&mut svg, width, height);
    svg.push_str(&text(PAD_LEFT - 6.0, PAD_TOP + 4.0, "end", &format!("{}", y_max as usize)));
    svg.push_str(&text(PAD_LEFT - 6.0, base_y, "end", "0"));
    svg.push_str(&text(PAD_LEFT, base_y + 16.0, "middle", &format!("{lo:.3}")));
    svg.push_str(&text(sx((lo + hi) / 2.0), base_y + 16.0, "middle", &format!("{:.3}", (lo + hi) / 2.0)));
    svg.push_str(&text(width - PAD_RIGHT, base_y + 16.0, "middle", &format!("{hi:.3}")));
    if labels.len() > 1 {
        legend(&mut svg, labels, width);
    }

    svg.push_str("</svg>");
    Ok(svg)
}

/// Box-and-whisker plot with one box per table column.
pub fn box_plot_svg(table: &AlignedTable) -> String {
    let boxes: Vec<(usize, &String, BoxSummary)> = table
        .columns()
        .iter()
        .zip(table.column_slices())
        .enumerate()
        .filter_map(|(i, (name, values))| BoxSummary::compute(values).map(|b| (i, name, b)))
        .collect();

    if boxes.is_empty() {
        return "<p>No data available.</p>".to_string();
    }

    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for (_, _, b) in &boxes {
        let low = b.outliers.iter().copied().fold(b.lower_whisker, f64::min);
        let high = b.outliers.iter().copied().fold(b.upper_whisker, f64::max);
        lo = lo.min(low);
        hi = hi.max(high);
    }
    if (hi - lo).abs() < f64::EPSILON {
        lo -= 0.5;
        hi += 0.5;
    }

    let (width, height) = (WIDTH, HEIGHT);
    let plot_h = height - PAD_TOP - PAD_BOTTOM;
    let band = (width - PAD_LEFT - PAD_RIGHT) / boxes.len() as f64;
    let sy = |v: f64| PAD_TOP + (1.0 - (v - lo) / (hi - lo)) * plot_h;

    let mut svg = svg_open(width, height);
    svg.push_str(&text(width / 2.0, 18.0, "middle", "Return Distribution"));

    if lo < 0.0 && hi > 0.0 {
        svg.push_str(&format!(
            r#"<line x1="{PAD_LEFT:.1}" y1="{y:.1}" x2="{x2:.1}" y2="{y:.1}" stroke="{GRID_COLOR}" stroke-dasharray="4 3"/>"#,
            y = sy(0.0),
            x2 = width - PAD_RIGHT
        ));
    }

    for (slot, (i, name, b)) in boxes.iter().enumerate() {
        let cx = PAD_LEFT + band * (slot as f64 + 0.5);
        let half = band * 0.25;
        let color = series_color(*i);

        svg.push_str(&format!(
            r#"<line x1="{cx:.1}" y1="{y1:.1}" x2="{cx:.1}" y2="{y2:.1}" stroke="{AXIS_COLOR}"/>"#,
            y1 = sy(b.upper_whisker),
            y2 = sy(b.q3)
        ));
        svg.push_str(&format!(
            r#"<line x1="{cx:.1}" y1="{y1:.1}" x2="{cx:.1}" y2="{y2:.1}" stroke="{AXIS_COLOR}"/>"#,
            y1 = sy(b.q1),
            y2 = sy(b.lower_whisker)
        ));
        for cap in [b.lower_whisker, b.upper_whisker] {
            svg.push_str(&format!(
                r#"<line x1="{x1:.1}" y1="{y:.1}" x2="{x2:.1}" y2="{y:.1}" stroke="{AXIS_COLOR}"/>"#,
                x1 = cx - half / 2.0,
                x2 = cx + half / 2.0,
                y = sy(cap)
            ));
        }
        svg.push_str(&format!(
            r#"<rect class="box" x="{x:.1}" y="{y:.1}" width="{w:.1}" height="{h:.1}" fill="{color}" fill-opacity="0.7" stroke="{AXIS_COLOR}"/>"#,
            x = cx - half,
            y = sy(b.q3),
            w = half * 2.0,
            h = (sy(b.q1) - sy(b.q3)).max(0.5)
        ));
        svg.push_str(&format!(
            r#"<line x1="{x1:.1}" y1="{y:.1}" x2="{x2:.1}" y2="{y:.1}" stroke="{AXIS_COLOR}" stroke-width="2"/>"#,
            x1 = cx - half,
            x2 = cx + half,
            y = sy(b.median)
        ));
        for &o in &b.outliers {
            svg.push_str(&format!(
                r#"<circle class="outlier" cx="{cx:.1}" cy="{cy:.1}" r="2.5" fill="none" stroke="{AXIS_COLOR}"/>"#,
                cy = sy(o)
            ));
        }
        svg.push_str(&text(cx, height - PAD_BOTTOM + 16.0, "middle", name));
    }

    axes(&mut svg, width, height);
    svg.push_str(&text(PAD_LEFT - 6.0, sy(hi) + 4.0, "end", &format!("{hi:.3}")));
    svg.push_str(&text(PAD_LEFT - 6.0, sy(lo), "end", &format!("{lo:.3}")));
    svg.push_str("</svg>");
    svg
}

fn extent(values: &[f64]) -> (f64, f64) {
    let (lo, hi) = values
        .iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    if !lo.is_finite() || !hi.is_finite() {
        (0.0, 1.0)
    } else if lo == hi {
        (lo - 0.5, hi + 0.5)
    } else {
        (lo, hi)
    }
}

/// Grid of pairwise relationships: histograms on the diagonal, scatter plots
/// everywhere else (row variable on y, column variable on x).
pub fn pairplot_svg(table: &AlignedTable, options: &RenderOptions) -> Result<String, RetvizError> {
    let columns = table.column_slices();
    let n = columns.len();
    let margin = 40.0;
    let inner = PAIR_CELL - 16.0;
    let size = margin + n as f64 * PAIR_CELL;
    let extents: Vec<(f64, f64)> = columns.iter().map(|c| extent(c)).collect();

    let mut svg = svg_open(size, size);

    for row in 0..n {
        for col in 0..n {
            let ox = margin + col as f64 * PAIR_CELL + 8.0;
            let oy = row as f64 * PAIR_CELL + 8.0;
            svg.push_str(&format!(
                r#"<rect x="{ox:.1}" y="{oy:.1}" width="{inner:.1}" height="{inner:.1}" fill="none" stroke="{GRID_COLOR}"/>"#
            ));

            if row == col {
                let hist = Histogram::compute(columns[col], options.bins)?;
                let max = hist.max_count().max(1) as f64;
                let bw = inner / hist.bin_count() as f64;
                for (b, &count) in hist.counts[0].iter().enumerate() {
                    let h = count as f64 / max * inner;
                    svg.push_str(&format!(
                        r#"<rect x="{x:.2}" y="{y:.2}" width="{bw:.2}" height="{h:.2}" fill="{}" fill-opacity="0.8"/>"#,
                        series_color(col),
                        x = ox + b as f64 * bw,
                        y = oy + inner - h
                    ));
                }
            } else {
                let (xl, xh) = extents[col];
                let (yl, yh) = extents[row];
                let xs = columns[col];
                let ys = columns[row];
                for (&x, &y) in xs.iter().zip(ys) {
                    if !x.is_finite() || !y.is_finite() {
                        continue;
                    }
                    svg.push_str(&format!(
                        r#"<circle cx="{cx:.2}" cy="{cy:.2}" r="1.5" fill="{}" fill-opacity="0.6"/>"#,
                        series_color(0),
                        cx = ox + (x - xl) / (xh - xl) * inner,
                        cy = oy + (1.0 - (y - yl) / (yh - yl)) * inner
                    ));
                }
            }
        }
    }

    for (i, name) in table.columns().iter().enumerate() {
        let centre = i as f64 * PAIR_CELL + 8.0 + inner / 2.0;
        svg.push_str(&text(margin + centre, n as f64 * PAIR_CELL + 20.0, "middle", name));
        svg.push_str(&format!(
            r#"<text x="14" y="{centre:.1}" text-anchor="middle" fill="{AXIS_COLOR}" transform="rotate(-90 14 {centre:.1})">{}</text>"#,
            escape(name)
        ));
    }

    svg.push_str("</svg>");
    Ok(svg)
}

/// Correlation heatmap scaled to `vmin..vmax` (data range when unset),
/// coloured with `cmap`, with optional cell annotations.
pub fn heatmap_svg(matrix: &CorrelationMatrix, options: &RenderOptions) -> String {
    let n = matrix.labels.len();
    if n == 0 {
        return "<p>No data available.</p>".to_string();
    }

    let (data_lo, data_hi) = matrix.range().unwrap_or((-1.0, 1.0));
    let vmin = options.vmin.unwrap_or(data_lo);
    let mut vmax = options.vmax.unwrap_or(data_hi);
    if vmax <= vmin {
        vmax = vmin + 1.0;
    }
    let scale = |v: f64| (v - vmin) / (vmax - vmin);

    let left = 70.0;
    let top = 10.0;
    let bar_gap = 20.0;
    let bar_w = 16.0;
    let grid = n as f64 * HEAT_CELL;
    let width = left + grid + bar_gap + bar_w + 50.0;
    let height = top + grid + 30.0;

    let mut svg = svg_open(width, height);
    svg.push_str(&format!(
        r#"<defs><linearGradient id="cmap-{cmap}" x1="0" y1="1" x2="0" y2="0">"#,
        cmap = options.cmap
    ));
    for k in 0..=10 {
        let t = k as f64 / 10.0;
        svg.push_str(&format!(
            r#"<stop offset="{t:.1}" stop-color="{}"/>"#,
            options.cmap.hex(t)
        ));
    }
    svg.push_str("</linearGradient></defs>");

    for i in 0..n {
        for j in 0..n {
            let v = matrix.values[i][j];
            let x = left + j as f64 * HEAT_CELL;
            let y = top + i as f64 * HEAT_CELL;
            let fill = if v.is_finite() {
                options.cmap.hex(scale(v))
            } else {
                "white".to_string()
            };
            svg.push_str(&format!(
                r#"<rect class="cell" x="{x:.1}" y="{y:.1}" width="{HEAT_CELL:.1}" height="{HEAT_CELL:.1}" fill="{fill}"/>"#
            ));
            if options.annot && v.is_finite() {
                let ink = if options.cmap.is_light(scale(v)) {
                    "#222222"
                } else {
                    "#ffffff"
                };
                svg.push_str(&format!(
                    r#"<text class="annot" x="{cx:.1}" y="{cy:.1}" text-anchor="middle" fill="{ink}">{v:.2}</text>"#,
                    cx = x + HEAT_CELL / 2.0,
                    cy = y + HEAT_CELL / 2.0 + 4.0
                ));
            }
        }
    }

    for (i, label) in matrix.labels.iter().enumerate() {
        let c = i as f64 * HEAT_CELL + HEAT_CELL / 2.0;
        svg.push_str(&text(left - 6.0, top + c + 4.0, "end", label));
        svg.push_str(&text(left + c, top + grid + 16.0, "middle", label));
    }

    let bar_x = left + grid + bar_gap;
    svg.push_str(&format!(
        r#"<rect x="{bar_x:.1}" y="{top:.1}" width="{bar_w:.1}" height="{grid:.1}" fill="url(#cmap-{})"/>"#,
        options.cmap
    ));
    svg.push_str(&text(bar_x + bar_w + 4.0, top + 10.0, "start", &format!("{vmax:.2}")));
    svg.push_str(&text(bar_x + bar_w + 4.0, top + grid, "start", &format!("{vmin:.2}")));

    svg.push_str("</svg>");
    svg
}
