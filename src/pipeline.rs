//! Pipeline Module
//! Runs load, preprocess and classify for one CSV file and hands the
//! result to presenters.

use crate::charts::{PresentError, Presenter};
use crate::data::{
    Classifier, DataLoader, LoaderError, Partition, PreprocessOptions, Preprocessor,
    ProcessorError,
};
use log::info;
use polars::prelude::*;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Load(#[from] LoaderError),
    #[error(transparent)]
    Process(#[from] ProcessorError),
}

/// Settings for one pipeline run. The input path is passed to [`Pipeline::run`].
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOptions {
    pub preprocess: PreprocessOptions,
    pub infer_schema_length: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            preprocess: PreprocessOptions::default(),
            infer_schema_length: 10000,
        }
    }
}

impl PipelineOptions {
    pub fn with_drop_columns(mut self, columns: Vec<String>) -> Self {
        self.preprocess.drop_columns = columns;
        self
    }

    pub fn with_date_column(mut self, column: Option<String>) -> Self {
        self.preprocess.date_column = column;
        self
    }

    pub fn with_infer_schema_length(mut self, rows: usize) -> Self {
        self.infer_schema_length = rows;
        self
    }
}

/// Cleaned table and its column partition.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub table: DataFrame,
    pub partition: Partition,
}

impl Analysis {
    /// Hand the result to each presenter in turn. The first failure stops the run.
    pub fn present(&self, presenters: &mut [&mut dyn Presenter]) -> Result<(), PresentError> {
        for presenter in presenters.iter_mut() {
            presenter.present(&self.table, &self.partition)?;
        }
        Ok(())
    }
}

pub struct Pipeline {
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new(options: PipelineOptions) -> Self {
        Self { options }
    }

    /// Load, clean and classify the CSV file at `file_path`.
    pub fn run(&self, file_path: &Path) -> Result<Analysis, PipelineError> {
        let loader = DataLoader::new().with_infer_schema_length(self.options.infer_schema_length);
        let raw = loader.load_csv(file_path)?;
        self.analyze(raw)
    }

    /// Clean and classify an already loaded table.
    pub fn analyze(&self, raw: DataFrame) -> Result<Analysis, PipelineError> {
        let table = Preprocessor::preprocess(raw, &self.options.preprocess)?;
        let partition = Classifier::classify(&table);
        info!(
            "identified {} dimensions and {} measures",
            partition.dimensions.len(),
            partition.measures.len()
        );
        Ok(Analysis { table, partition })
    }
}
