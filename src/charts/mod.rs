//! Charts module - Chart data and presenters

mod builder;
mod presenter;

pub use builder::{
    CategoryCount, Chart, ChartBuilder, ChartReport, DEFAULT_BINS, HOUR_COLUMN, SALES_COLUMN,
};
pub use presenter::{JsonPresenter, PresentError, Presenter, SummaryPresenter};
