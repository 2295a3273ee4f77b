//! Statistics Calculator Module
//! Handles descriptive statistics and the numeric summaries behind each chart.

use polars::prelude::*;
use rayon::prelude::*;
use serde::Serialize;
use statrs::distribution::{Continuous, Normal};
use statrs::statistics::Statistics;
use std::collections::HashMap;

/// Whisker reach in interquartile ranges (Tukey).
pub const WHISKER_IQR: f64 = 1.5;

/// Descriptive statistics for a single measure.
#[derive(Debug, Clone, Serialize)]
pub struct MeasureStats {
    pub measure: String,
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub std: f64,
    pub variance: f64,
    pub min: f64,
    pub max: f64,
    pub p95: f64,
    pub p05: f64,
}

impl Default for MeasureStats {
    fn default() -> Self {
        Self {
            measure: String::new(),
            count: 0,
            mean: f64::NAN,
            median: f64::NAN,
            std: f64::NAN,
            variance: f64::NAN,
            min: f64::NAN,
            max: f64::NAN,
            p95: f64::NAN,
            p05: f64::NAN,
        }
    }
}

/// Five-number summary with Tukey whiskers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxStats {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub whisker_low: f64,
    pub whisker_high: f64,
    pub outliers: Vec<f64>,
}

/// Equal-width histogram. `edges` has one more entry than `counts`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

impl Histogram {
    pub fn bin_width(&self) -> f64 {
        match (self.edges.first(), self.edges.get(1)) {
            (Some(a), Some(b)) => b - a,
            _ => 0.0,
        }
    }

    pub fn centers(&self) -> Vec<f64> {
        self.edges.windows(2).map(|w| (w[0] + w[1]) / 2.0).collect()
    }
}

/// Handles statistical calculations with multi-threading support.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Compute descriptive statistics for an array of values.
    pub fn compute_descriptive_stats(values: &[f64]) -> MeasureStats {
        let n = values.len();
        if n == 0 {
            return MeasureStats::default();
        }

        let sorted = Self::sorted(values);

        let mean = values.iter().mean();
        let variance = if n > 1 { values.iter().variance() } else { 0.0 };

        MeasureStats {
            measure: String::new(),
            count: n,
            mean,
            median: Self::percentile(&sorted, 50.0),
            std: variance.sqrt(),
            variance,
            min: sorted[0],
            max: sorted[n - 1],
            p95: Self::percentile(&sorted, 95.0),
            p05: Self::percentile(&sorted, 5.0),
        }
    }

    fn sorted(values: &[f64]) -> Vec<f64> {
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        sorted
    }

    /// Percentile `p` (0 to 100) of ascending values, interpolating linearly
    /// between the closest ranks like NumPy's default. `p` is clamped.
    pub fn percentile(sorted_values: &[f64], p: f64) -> f64 {
        let (Some(&first), Some(&last)) = (sorted_values.first(), sorted_values.last()) else {
            return f64::NAN;
        };
        if p <= 0.0 {
            return first;
        }
        if p >= 100.0 {
            return last;
        }

        let rank = p / 100.0 * (sorted_values.len() - 1) as f64;
        let below = rank.floor() as usize;
        let frac = rank - below as f64;
        match sorted_values.get(below + 1) {
            Some(&above) if frac > 0.0 => {
                sorted_values[below] + (above - sorted_values[below]) * frac
            }
            _ => sorted_values[below],
        }
    }

    /// Quartiles, whiskers at the furthest points within 1.5 IQR, and the
    /// points beyond them. Returns `None` for an empty slice.
    pub fn box_stats(values: &[f64]) -> Option<BoxStats> {
        if values.is_empty() {
            return None;
        }
        let sorted = Self::sorted(values);

        let q1 = Self::percentile(&sorted, 25.0);
        let median = Self::percentile(&sorted, 50.0);
        let q3 = Self::percentile(&sorted, 75.0);
        let iqr = q3 - q1;
        let low_fence = q1 - WHISKER_IQR * iqr;
        let high_fence = q3 + WHISKER_IQR * iqr;

        let whisker_low = sorted
            .iter()
            .copied()
            .find(|&v| v >= low_fence)
            .unwrap_or(q1);
        let whisker_high = sorted
            .iter()
            .rev()
            .copied()
            .find(|&v| v <= high_fence)
            .unwrap_or(q3);
        let outliers = sorted
            .iter()
            .copied()
            .filter(|&v| v < low_fence || v > high_fence)
            .collect();

        Some(BoxStats {
            q1,
            median,
            q3,
            whisker_low,
            whisker_high,
            outliers,
        })
    }

    /// Equal-width histogram over `[min, max]`, last bin closed.
    /// A constant column gets the range `[v - 0.5, v + 0.5]`.
    pub fn histogram(values: &[f64], bins: usize) -> Histogram {
        let bins = bins.max(1);
        if values.is_empty() {
            return Histogram {
                edges: Vec::new(),
                counts: Vec::new(),
            };
        }

        let sorted = Self::sorted(values);
        let mut lo = Self::percentile(&sorted, 0.0);
        let mut hi = Self::percentile(&sorted, 100.0);
        if lo == hi {
            lo -= 0.5;
            hi += 0.5;
        }

        let width = (hi - lo) / bins as f64;
        let edges: Vec<f64> = (0..=bins).map(|i| lo + width * i as f64).collect();
        let mut counts = vec![0usize; bins];
        for &v in values {
            let idx = (((v - lo) / width).floor() as usize).min(bins - 1);
            counts[idx] += 1;
        }

        Histogram { edges, counts }
    }

    /// Gaussian kernel density estimate evaluated at `points`, with Scott's
    /// bandwidth. `None` when fewer than two values or zero spread.
    pub fn gaussian_kde(values: &[f64], points: &[f64]) -> Option<Vec<f64>> {
        let n = values.len();
        if n < 2 {
            return None;
        }
        let std = values.iter().std_dev();
        if std.is_nan() || std <= 0.0 {
            return None;
        }

        let bandwidth = std * (n as f64).powf(-0.2);
        let kernel = Normal::new(0.0, 1.0).ok()?;

        Some(
            points
                .iter()
                .map(|&x| {
                    values
                        .iter()
                        .map(|&xi| kernel.pdf((x - xi) / bandwidth))
                        .sum::<f64>()
                        / (n as f64 * bandwidth)
                })
                .collect(),
        )
    }

    /// Pearson correlation. NaN when either side has no spread.
    pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
        if x.len() != y.len() || x.len() < 2 {
            return f64::NAN;
        }
        let sx = x.iter().std_dev();
        let sy = y.iter().std_dev();
        if sx == 0.0 || sy == 0.0 {
            return f64::NAN;
        }
        x.iter().covariance(y.iter()) / (sx * sy)
    }

    /// Symmetric Pearson matrix over the given columns.
    pub fn correlation_matrix(columns: &[Vec<f64>]) -> Vec<Vec<f64>> {
        let k = columns.len();
        let mut matrix = vec![vec![f64::NAN; k]; k];
        for i in 0..k {
            for j in i..k {
                let r = if i == j && columns[i].iter().std_dev() > 0.0 {
                    1.0
                } else {
                    Self::pearson(&columns[i], &columns[j])
                };
                matrix[i][j] = r;
                matrix[j][i] = r;
            }
        }
        matrix
    }

    /// Frequency of each value, most frequent first, ties by value.
    pub fn value_counts<'a>(values: impl IntoIterator<Item = &'a str>) -> Vec<(String, usize)> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for v in values {
            *counts.entry(v).or_default() += 1;
        }
        let mut ordered: Vec<(String, usize)> = counts
            .into_iter()
            .map(|(value, count)| (value.to_string(), count))
            .collect();
        ordered.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ordered
    }

    /// Non-missing values of a column as f64.
    pub fn get_measure_values(df: &DataFrame, measure: &str) -> PolarsResult<Vec<f64>> {
        let series = df
            .column(measure)?
            .as_materialized_series()
            .cast(&DataType::Float64)?;
        Ok(series
            .f64()?
            .into_iter()
            .flatten()
            .filter(|v| !v.is_nan())
            .collect())
    }

    /// Row-aligned values of a column as f64, with NaN where missing.
    pub fn get_row_values(df: &DataFrame, measure: &str) -> PolarsResult<Vec<f64>> {
        let series = df
            .column(measure)?
            .as_materialized_series()
            .cast(&DataType::Float64)?;
        Ok(series
            .f64()?
            .into_iter()
            .map(|v| v.unwrap_or(f64::NAN))
            .collect())
    }

    /// Compute statistics for all measures in parallel, in the given order.
    pub fn compute_all_stats_parallel(
        df: &DataFrame,
        measures: &[String],
    ) -> PolarsResult<Vec<MeasureStats>> {
        measures
            .par_iter()
            .map(|measure| -> PolarsResult<MeasureStats> {
                let values = Self::get_measure_values(df, measure)?;
                let mut stats = Self::compute_descriptive_stats(&values);
                stats.measure = measure.clone();
                Ok(stats)
            })
            .collect()
    }
}
