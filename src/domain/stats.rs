//! Descriptive statistics behind the exploratory plots.
//!
//! Quantiles use linear interpolation between closest ranks. Non-finite
//! values are ignored everywhere.

use crate::domain::align::AlignedTable;
use crate::domain::error::RetvizError;

const WHISKER_IQR: f64 = 1.5;
const MAX_AUTO_BINS: usize = 200;
/// Upper limit on an explicitly requested bin count.
pub const MAX_BINS: usize = 1000;

fn finite_sorted(values: &[f64]) -> Vec<f64> {
    let mut clean: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    clean.sort_by(|a, b| a.total_cmp(b));
    clean
}

/// Quantile `q` in [0, 1] of an ascending slice. Returns NaN when empty.
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let frac = pos - lo as f64;
    if lo + 1 >= sorted.len() {
        sorted[lo]
    } else {
        sorted[lo] + (sorted[lo + 1] - sorted[lo]) * frac
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation; NaN for fewer than two values.
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

impl Summary {
    pub fn compute(values: &[f64]) -> Option<Self> {
        let sorted = finite_sorted(values);
        let count = sorted.len();
        if count == 0 {
            return None;
        }

        let mean = sorted.iter().sum::<f64>() / count as f64;
        let std = if count > 1 {
            let ss: f64 = sorted.iter().map(|v| (v - mean).powi(2)).sum();
            (ss / (count - 1) as f64).sqrt()
        } else {
            f64::NAN
        };

        Some(Summary {
            count,
            mean,
            std,
            min: sorted[0],
            q25: quantile(&sorted, 0.25),
            median: quantile(&sorted, 0.5),
            q75: quantile(&sorted, 0.75),
            max: sorted[count - 1],
        })
    }

    /// One summary per column, in column order. Columns without finite
    /// values are left out.
    pub fn for_table(table: &AlignedTable) -> Vec<(String, Summary)> {
        table
            .columns()
            .iter()
            .zip(table.column_slices())
            .filter_map(|(name, values)| Summary::compute(values).map(|s| (name.clone(), s)))
            .collect()
    }
}

/// Box-and-whisker statistics: the box spans q1..q3, whiskers reach the most
/// extreme values within 1.5 IQR of the box, everything beyond is an outlier.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxSummary {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub iqr: f64,
    pub lower_whisker: f64,
    pub upper_whisker: f64,
    pub outliers: Vec<f64>,
}

impl BoxSummary {
    pub fn compute(values: &[f64]) -> Option<Self> {
        let sorted = finite_sorted(values);
        if sorted.is_empty() {
            return None;
        }

        let q1 = quantile(&sorted, 0.25);
        let median = quantile(&sorted, 0.5);
        let q3 = quantile(&sorted, 0.75);
        let iqr = q3 - q1;
        let low_fence = q1 - WHISKER_IQR * iqr;
        let high_fence = q3 + WHISKER_IQR * iqr;

        let inside = sorted.iter().filter(|&&v| v >= low_fence && v <= high_fence);
        let lower_whisker = inside.clone().copied().fold(f64::INFINITY, f64::min);
        let upper_whisker = inside.copied().fold(f64::NEG_INFINITY, f64::max);
        let outliers = sorted
            .iter()
            .copied()
            .filter(|&v| v < low_fence || v > high_fence)
            .collect();

        Some(BoxSummary {
            q1,
            median,
            q3,
            iqr,
            lower_whisker,
            upper_whisker,
            outliers,
        })
    }
}

/// Equal-width histogram over one or more series sharing the same bin edges.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    /// `bins + 1` ascending edges. The last bin is closed on the right.
    pub edges: Vec<f64>,
    /// One row of bin counts per input series.
    pub counts: Vec<Vec<usize>>,
}

impl Histogram {
    pub fn compute(values: &[f64], bins: Option<usize>) -> Result<Self, RetvizError> {
        Self::compute_shared(&[values], bins)
    }

    /// Bins every series over the combined data range.
    pub fn compute_shared(series: &[&[f64]], bins: Option<usize>) -> Result<Self, RetvizError> {
        if bins == Some(0) {
            return Err(RetvizError::InvalidOption {
                option: "bins".into(),
                reason: "must be at least 1".into(),
            });
        }
        if let Some(n) = bins.filter(|&n| n > MAX_BINS) {
            return Err(RetvizError::InvalidOption {
                option: "bins".into(),
                reason: format!("{n} exceeds the limit of {MAX_BINS}"),
            });
        }

        let combined: Vec<f64> = finite_sorted(&series.iter().flat_map(|s| s.iter().copied()).collect::<Vec<_>>());
        if combined.is_empty() {
            return Err(RetvizError::InvalidOption {
                option: "values".into(),
                reason: "histogram needs at least one finite value".into(),
            });
        }

        let mut lo = combined[0];
        let mut hi = combined[combined.len() - 1];
        if lo == hi {
            lo -= 0.5;
            hi += 0.5;
        }

        let bins = bins.unwrap_or_else(|| auto_bins(&combined, hi - lo));
        let width = (hi - lo) / bins as f64;
        let edges: Vec<f64> = (0..=bins).map(|i| lo + i as f64 * width).collect();

        let counts = series
            .iter()
            .map(|s| {
                let mut row = vec![0usize; bins];
                for &v in s.iter().filter(|v| v.is_finite()) {
                    let idx = (((v - lo) / width).floor() as usize).min(bins - 1);
                    row[idx] += 1;
                }
                row
            })
            .collect();

        Ok(Histogram { edges, counts })
    }

    pub fn bin_count(&self) -> usize {
        self.edges.len().saturating_sub(1)
    }

    pub fn bin_width(&self) -> f64 {
        match (self.edges.first(), self.edges.last()) {
            (Some(first), Some(last)) if self.bin_count() > 0 => {
                (last - first) / self.bin_count() as f64
            }
            _ => 0.0,
        }
    }

    /// Largest single bin count across all series.
    pub fn max_count(&self) -> usize {
        self.counts
            .iter()
            .flat_map(|row| row.iter().copied())
            .max()
            .unwrap_or(0)
    }

    /// Largest per-bin total when series are stacked.
    pub fn max_stacked(&self) -> usize {
        (0..self.bin_count())
            .map(|b| self.counts.iter().map(|row| row[b]).sum::<usize>())
            .max()
            .unwrap_or(0)
    }
}

/// max(Sturges, Freedman-Diaconis), capped.
fn auto_bins(sorted: &[f64], range: f64) -> usize {
    let n = sorted.len() as f64;
    let sturges = (n.log2().ceil() as usize) + 1;
    let iqr = quantile(sorted, 0.75) - quantile(sorted, 0.25);
    let fd = if iqr > 0.0 {
        let h = 2.0 * iqr / n.cbrt();
        (range / h).ceil() as usize
    } else {
        0
    };
    sturges.max(fd).clamp(1, MAX_AUTO_BINS)
}

/// Pairwise Pearson correlation between table columns.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    pub labels: Vec<String>,
    /// Square, symmetric; NaN where a column has zero variance.
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn compute(table: &AlignedTable) -> Self {
        let columns = table.column_slices();
        let n = columns.len();
        let mut values = vec![vec![f64::NAN; n]; n];

        for i in 0..n {
            for j in i..n {
                let r = if i == j {
                    if variance(columns[i]) > 0.0 {
                        1.0
                    } else {
                        f64::NAN
                    }
                } else {
                    pearson(columns[i], columns[j])
                };
                values[i][j] = r;
                values[j][i] = r;
            }
        }

        CorrelationMatrix {
            labels: table.columns().to_vec(),
            values,
        }
    }

    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.labels.iter().position(|l| l == a)?;
        let j = self.labels.iter().position(|l| l == b)?;
        Some(self.values[i][j])
    }

    /// Finite (min, max) over all cells, if any.
    pub fn range(&self) -> Option<(f64, f64)> {
        let finite = self
            .values
            .iter()
            .flat_map(|row| row.iter().copied())
            .filter(|v| v.is_finite());
        finite.fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64
}

fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len().min(y.len());
    if n < 2 {
        return f64::NAN;
    }
    let (x, y) = (&x[..n], &y[..n]);
    let (mx, my) = (mean(x), mean(y));

    let mut cov = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for k in 0..n {
        let dx = x[k] - mx;
        let dy = y[k] - my;
        cov += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    if sxx == 0.0 || syy == 0.0 {
        return f64::NAN;
    }
    (cov / (sxx.sqrt() * syy.sqrt())).clamp(-1.0, 1.0)
}
