//! Salescope - CSV Sales Data Cleaning & Descriptive Analysis

use anyhow::{Context, Result};
use clap::Parser;
use salescope::charts::{ChartBuilder, JsonPresenter, Presenter, SummaryPresenter, DEFAULT_BINS};
use salescope::data::{ORDER_DATE_COLUMN, PLACEHOLDER_COLUMN};
use salescope::{Pipeline, PipelineOptions};
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(version, about = "Clean a sales CSV and identify its dimensions and measures")]
struct Cli {
    /// CSV file with a header row
    input: PathBuf,

    /// Column to remove when present (repeatable)
    #[arg(long = "drop", value_name = "NAME", default_value = PLACEHOLDER_COLUMN)]
    drop_columns: Vec<String>,

    /// Column parsed as a date
    #[arg(long, value_name = "NAME", default_value = ORDER_DATE_COLUMN)]
    date_column: String,

    /// Skip date parsing
    #[arg(long)]
    no_dates: bool,

    /// Write chart data as JSON to this file
    #[arg(long, value_name = "PATH")]
    json: Option<PathBuf>,

    /// Rows scanned to infer column types
    #[arg(long, value_name = "ROWS", default_value_t = 10000)]
    infer_schema_length: usize,

    /// Histogram bin count
    #[arg(long, default_value_t = DEFAULT_BINS)]
    bins: usize,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let date_column = (!cli.no_dates).then(|| cli.date_column.clone());
    let options = PipelineOptions::default()
        .with_drop_columns(cli.drop_columns.clone())
        .with_date_column(date_column)
        .with_infer_schema_length(cli.infer_schema_length);

    let analysis = Pipeline::new(options)
        .run(&cli.input)
        .with_context(|| format!("analysis of {} failed", cli.input.display()))?;

    let mut json = match &cli.json {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("cannot create {}", path.display()))?;
            let builder = ChartBuilder::new()
                .with_bins(cli.bins)
                .with_date_column(cli.date_column.clone());
            Some(JsonPresenter::new(builder, BufWriter::new(file)))
        }
        None => None,
    };

    let mut summary = SummaryPresenter::new(io::stdout().lock());
    let mut presenters: Vec<&mut dyn Presenter> = vec![&mut summary];
    if let Some(json) = json.as_mut() {
        presenters.push(json);
    }

    analysis
        .present(&mut presenters)
        .context("presenting results failed")?;
    Ok(())
}
