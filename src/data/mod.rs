//! Data module - CSV loading, cleaning and column classification

mod classifier;
mod loader;
mod processor;

pub use classifier::{Classifier, ColumnKind, ColumnProfile, Partition};
pub use loader::{DataLoader, LoaderError, MISSING_MARKERS};
pub use processor::{
    mode, parse_datetime, DataQualityError, PreprocessOptions, Preprocessor, ProcessorError,
    ORDER_DATE_COLUMN, PLACEHOLDER_COLUMN,
};
