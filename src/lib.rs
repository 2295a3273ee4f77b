//! Salescope - CSV Sales Data Cleaning & Descriptive Analysis
//!
//! Loads a sales CSV, fills missing values, parses the order date and splits
//! the columns into dimensions (categorical) and measures (numerical). The
//! chart module turns the result into the data behind a standard battery of
//! descriptive charts.

pub mod charts;
pub mod data;
pub mod pipeline;
pub mod stats;

pub use charts::{ChartBuilder, ChartReport, JsonPresenter, Presenter, SummaryPresenter};
pub use data::{DataQualityError, Partition, PreprocessOptions};
pub use pipeline::{Analysis, Pipeline, PipelineError, PipelineOptions};
