//! Stats module - Descriptive statistics and chart summaries

mod calculator;

pub use calculator::{BoxStats, Histogram, MeasureStats, StatsCalculator, WHISKER_IQR};
