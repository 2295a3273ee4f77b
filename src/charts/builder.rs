//! Chart Data Builder Module
//! Computes the data behind each chart of the descriptive analysis:
//! histograms, boxplots, scatter plots, count plots, pair plots,
//! correlation heatmap, monthly sales and sales by hour.

use crate::data::{Partition, ORDER_DATE_COLUMN};
use crate::stats::{BoxStats, MeasureStats, StatsCalculator};
use chrono::Datelike;
use log::debug;
use polars::prelude::*;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;

/// Measure summed in the time-based charts.
pub const SALES_COLUMN: &str = "Sales";

/// Hour-of-day column grouped in the hourly chart.
pub const HOUR_COLUMN: &str = "Hour";

/// Default histogram bin count.
pub const DEFAULT_BINS: usize = 30;

/// One value and its frequency in a count plot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCount {
    pub value: String,
    pub count: usize,
}

/// Data for a single chart.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "chart", rename_all = "snake_case")]
pub enum Chart {
    Histogram {
        measure: String,
        edges: Vec<f64>,
        counts: Vec<usize>,
        /// Density curve at the bin centers, scaled to counts
        kde: Option<Vec<f64>>,
    },
    Boxplot {
        measure: String,
        stats: BoxStats,
    },
    Scatter {
        x: String,
        y: String,
        points: Vec<[f64; 2]>,
    },
    CountPlot {
        dimension: String,
        counts: Vec<CategoryCount>,
    },
    PairPlot {
        measures: Vec<String>,
        values: Vec<Vec<f64>>,
    },
    CorrelationHeatmap {
        measures: Vec<String>,
        matrix: Vec<Vec<f64>>,
    },
    TimeSeries {
        measure: String,
        months: Vec<String>,
        totals: Vec<f64>,
    },
    SalesByHour {
        hours: Vec<f64>,
        totals: Vec<f64>,
    },
}

impl Chart {
    pub fn title(&self) -> String {
        match self {
            Chart::Histogram { measure, .. } => format!("Histogram of {measure}"),
            Chart::Boxplot { measure, .. } => format!("Boxplot of {measure}"),
            Chart::Scatter { x, y, .. } => format!("Scatter plot of {x} vs {y}"),
            Chart::CountPlot { dimension, .. } => format!("Count plot of {dimension}"),
            Chart::PairPlot { .. } => "Pair plot".to_string(),
            Chart::CorrelationHeatmap { .. } => "Correlation Heatmap".to_string(),
            Chart::TimeSeries { .. } => "Monthly Sales Time Series".to_string(),
            Chart::SalesByHour { .. } => "Total Sales by Hour".to_string(),
        }
    }
}

/// Everything a renderer needs, in chart order.
#[derive(Debug, Clone, Serialize)]
pub struct ChartReport {
    pub rows: usize,
    pub dimensions: Vec<String>,
    pub measures: Vec<String>,
    pub summaries: Vec<MeasureStats>,
    pub charts: Vec<Chart>,
}

/// Builds chart data from a cleaned table and its partition.
#[derive(Debug, Clone)]
pub struct ChartBuilder {
    bins: usize,
    date_column: String,
}

impl Default for ChartBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ChartBuilder {
    pub fn new() -> Self {
        Self {
            bins: DEFAULT_BINS,
            date_column: ORDER_DATE_COLUMN.to_string(),
        }
    }

    pub fn with_bins(mut self, bins: usize) -> Self {
        self.bins = bins.max(1);
        self
    }

    pub fn with_date_column(mut self, column: impl Into<String>) -> Self {
        self.date_column = column.into();
        self
    }

    /// Build the full report.
    pub fn build(&self, df: &DataFrame, partition: &Partition) -> PolarsResult<ChartReport> {
        let measures = &partition.measures;
        let summaries = StatsCalculator::compute_all_stats_parallel(df, measures)?;

        let per_measure = measures
            .par_iter()
            .map(|measure| self.distribution_charts(df, measure))
            .collect::<PolarsResult<Vec<_>>>()?;
        let (histograms, boxplots): (Vec<Chart>, Vec<Option<Chart>>) =
            per_measure.into_iter().unzip();

        let mut charts = histograms;
        charts.extend(boxplots.into_iter().flatten());
        charts.extend(Self::scatter_charts(df, measures)?);
        for dimension in &partition.dimensions {
            charts.push(Self::count_chart(df, dimension)?);
        }
        if measures.len() > 1 {
            let values = measures
                .iter()
                .map(|m| StatsCalculator::get_row_values(df, m))
                .collect::<PolarsResult<Vec<_>>>()?;
            let matrix = StatsCalculator::correlation_matrix(&values);
            charts.push(Chart::PairPlot {
                measures: measures.clone(),
                values,
            });
            charts.push(Chart::CorrelationHeatmap {
                measures: measures.clone(),
                matrix,
            });
        }
        if let Some(chart) = self.monthly_sales(df, partition)? {
            charts.push(chart);
        }
        if let Some(chart) = Self::sales_by_hour(df, partition)? {
            charts.push(chart);
        }

        debug!("built {} charts", charts.len());
        Ok(ChartReport {
            rows: df.height(),
            dimensions: partition.dimensions.clone(),
            measures: measures.clone(),
            summaries,
            charts,
        })
    }

    fn distribution_charts(
        &self,
        df: &DataFrame,
        measure: &str,
    ) -> PolarsResult<(Chart, Option<Chart>)> {
        let values = StatsCalculator::get_measure_values(df, measure)?;

        let hist = StatsCalculator::histogram(&values, self.bins);
        let scale = values.len() as f64 * hist.bin_width();
        let kde = StatsCalculator::gaussian_kde(&values, &hist.centers())
            .map(|density| density.into_iter().map(|d| d * scale).collect());
        let histogram = Chart::Histogram {
            measure: measure.to_string(),
            edges: hist.edges,
            counts: hist.counts,
            kde,
        };

        let boxplot = StatsCalculator::box_stats(&values).map(|stats| Chart::Boxplot {
            measure: measure.to_string(),
            stats,
        });

        Ok((histogram, boxplot))
    }

    /// One scatter per unordered pair of measures.
    pub fn scatter_charts(df: &DataFrame, measures: &[String]) -> PolarsResult<Vec<Chart>> {
        let mut charts = Vec::new();
        for (i, x) in measures.iter().enumerate() {
            let xs = StatsCalculator::get_row_values(df, x)?;
            for y in &measures[i + 1..] {
                let ys = StatsCalculator::get_row_values(df, y)?;
                let points = xs
                    .iter()
                    .zip(ys.iter())
                    .filter(|(a, b)| a.is_finite() && b.is_finite())
                    .map(|(&a, &b)| [a, b])
                    .collect();
                charts.push(Chart::Scatter {
                    x: x.clone(),
                    y: y.clone(),
                    points,
                });
            }
        }
        Ok(charts)
    }

    /// Value frequencies of a dimension, most frequent first.
    pub fn count_chart(df: &DataFrame, dimension: &str) -> PolarsResult<Chart> {
        let text = df
            .column(dimension)?
            .as_materialized_series()
            .cast(&DataType::String)?;
        let counts = StatsCalculator::value_counts(text.str()?.into_iter().flatten())
            .into_iter()
            .map(|(value, count)| CategoryCount { value, count })
            .collect();

        Ok(Chart::CountPlot {
            dimension: dimension.to_string(),
            counts,
        })
    }

    /// Sales summed per calendar month, gaps filled with zero.
    pub fn monthly_sales(
        &self,
        df: &DataFrame,
        partition: &Partition,
    ) -> PolarsResult<Option<Chart>> {
        if !partition.is_measure(SALES_COLUMN) || !partition.is_dimension(&self.date_column) {
            return Ok(None);
        }
        let dates = df.column(&self.date_column)?;
        if !matches!(dates.dtype(), DataType::Datetime(_, _)) {
            return Ok(None);
        }

        let sales = StatsCalculator::get_row_values(df, SALES_COLUMN)?;
        let mut by_month: BTreeMap<(i32, u32), f64> = BTreeMap::new();
        for (timestamp, amount) in dates
            .as_materialized_series()
            .datetime()?
            .as_datetime_iter()
            .zip(sales)
        {
            if let Some(ts) = timestamp {
                if amount.is_finite() {
                    *by_month.entry((ts.year(), ts.month())).or_default() += amount;
                }
            }
        }

        let (Some(&first), Some(&last)) = (by_month.keys().next(), by_month.keys().next_back())
        else {
            return Ok(None);
        };

        let mut months = Vec::new();
        let mut totals = Vec::new();
        let (mut year, mut month) = first;
        while (year, month) <= last {
            months.push(format!("{year:04}-{month:02}"));
            totals.push(by_month.get(&(year, month)).copied().unwrap_or(0.0));
            if month == 12 {
                year += 1;
                month = 1;
            } else {
                month += 1;
            }
        }

        Ok(Some(Chart::TimeSeries {
            measure: SALES_COLUMN.to_string(),
            months,
            totals,
        }))
    }

    /// Sales summed per distinct hour value, ascending.
    pub fn sales_by_hour(df: &DataFrame, partition: &Partition) -> PolarsResult<Option<Chart>> {
        if !partition.is_measure(SALES_COLUMN) || !partition.is_measure(HOUR_COLUMN) {
            return Ok(None);
        }

        let grouped = df
            .clone()
            .lazy()
            .select([
                col(HOUR_COLUMN).cast(DataType::Float64),
                col(SALES_COLUMN).cast(DataType::Float64),
            ])
            .group_by([col(HOUR_COLUMN)])
            .agg([col(SALES_COLUMN).sum()])
            .collect()?;

        let hours = StatsCalculator::get_row_values(&grouped, HOUR_COLUMN)?;
        let sums = StatsCalculator::get_row_values(&grouped, SALES_COLUMN)?;
        let mut pairs: Vec<(f64, f64)> = hours.into_iter().zip(sums).collect();
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

        let (hours, totals) = pairs.into_iter().unzip();
        Ok(Some(Chart::SalesByHour { hours, totals }))
    }
}
