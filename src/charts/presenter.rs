//! Presenters consume a cleaned table and its partition.

use crate::charts::ChartBuilder;
use crate::data::Partition;
use log::{info, warn};
use polars::prelude::*;
use std::io::Write;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PresentError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),
}

/// Receives the analysis result. Presenters produce side effects only.
pub trait Presenter {
    fn present(&mut self, df: &DataFrame, partition: &Partition) -> Result<(), PresentError>;
}

/// Prints the identified dimensions and measures.
pub struct SummaryPresenter<W: Write> {
    out: W,
}

impl<W: Write> SummaryPresenter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Presenter for SummaryPresenter<W> {
    fn present(&mut self, df: &DataFrame, partition: &Partition) -> Result<(), PresentError> {
        if partition.is_empty() {
            warn!("no columns left after cleaning");
        }
        info!(
            "{} rows, {} dimensions, {} measures",
            df.height(),
            partition.dimensions.len(),
            partition.measures.len()
        );
        writeln!(
            self.out,
            "Identified dimensions (categorical): {:?}",
            partition.dimensions
        )?;
        writeln!(
            self.out,
            "Identified measures (numerical): {:?}",
            partition.measures
        )?;
        Ok(())
    }
}

/// Writes the chart data report as pretty JSON.
pub struct JsonPresenter<W: Write> {
    builder: ChartBuilder,
    out: W,
}

impl<W: Write> JsonPresenter<W> {
    pub fn new(builder: ChartBuilder, out: W) -> Self {
        Self { builder, out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Presenter for JsonPresenter<W> {
    fn present(&mut self, df: &DataFrame, partition: &Partition) -> Result<(), PresentError> {
        let report = self.builder.build(df, partition)?;
        serde_json::to_writer_pretty(&mut self.out, &report)?;
        writeln!(self.out)?;
        self.out.flush()?;
        info!("wrote {} charts", report.charts.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Classifier;

    #[test]
    fn test_summary_lists_partition() {
        let df = df!("Product" => ["Phone"], "Sales" => [10.0]).unwrap();
        let partition = Classifier::classify(&df);

        let mut presenter = SummaryPresenter::new(Vec::new());
        presenter.present(&df, &partition).unwrap();
        let text = String::from_utf8(presenter.into_inner()).unwrap();

        assert_eq!(
            text,
            "Identified dimensions (categorical): [\"Product\"]\n\
             Identified measures (numerical): [\"Sales\"]\n"
        );
    }

    #[test]
    fn test_summary_of_empty_table() {
        let partition = Partition::default();
        assert!(partition.is_empty());

        let mut presenter = SummaryPresenter::new(Vec::new());
        presenter.present(&DataFrame::empty(), &partition).unwrap();
        let text = String::from_utf8(presenter.into_inner()).unwrap();

        assert_eq!(
            text,
            "Identified dimensions (categorical): []\n\
             Identified measures (numerical): []\n"
        );
    }

    #[test]
    fn test_json_report_is_valid() {
        let df = df!(
            "Product" => ["Phone", "Laptop", "Phone"],
            "Sales" => [10.0, 20.0, 30.0],
            "Quantity" => [1i64, 1, 5],
        )
        .unwrap();
        let partition = Classifier::classify(&df);

        let mut presenter = JsonPresenter::new(ChartBuilder::new().with_bins(3), Vec::new());
        presenter.present(&df, &partition).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&presenter.into_inner()).unwrap();

        assert_eq!(json["rows"], 3);
        assert_eq!(json["measures"], serde_json::json!(["Sales", "Quantity"]));
        assert_eq!(json["charts"][0]["chart"], "histogram");
        assert_eq!(json["summaries"][0]["measure"], "Sales");
        let heatmap = json["charts"]
            .as_array()
            .unwrap()
            .iter()
            .find(|c| c["chart"] == "correlation_heatmap")
            .unwrap();
        assert_eq!(heatmap["matrix"][0][0], 1.0);
    }
}
