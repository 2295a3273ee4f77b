//! Column Classifier Module
//! Splits table columns into dimensions (categorical) and measures (numerical).

use polars::prelude::*;
use serde::Serialize;

/// How a column's values are treated, decided once from its dtype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// Integer or floating point values
    Numeric,
    /// Dates, datetimes, times and durations
    Temporal,
    /// Text, booleans and anything else
    Categorical,
}

impl ColumnKind {
    pub fn of(dtype: &DataType) -> Self {
        match dtype {
            DataType::Float32
            | DataType::Float64
            | DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64 => ColumnKind::Numeric,
            DataType::Date | DataType::Datetime(_, _) | DataType::Time | DataType::Duration(_) => {
                ColumnKind::Temporal
            }
            _ => ColumnKind::Categorical,
        }
    }

    /// Measures are the numeric columns; every other kind is a dimension.
    pub fn is_measure(self) -> bool {
        self == ColumnKind::Numeric
    }
}

/// Name and kind of one column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnProfile {
    pub name: String,
    pub kind: ColumnKind,
}

/// Column names split into dimensions and measures, each in table order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Partition {
    pub dimensions: Vec<String>,
    pub measures: Vec<String>,
}

impl Partition {
    pub fn is_measure(&self, column: &str) -> bool {
        self.measures.iter().any(|m| m == column)
    }

    pub fn is_dimension(&self, column: &str) -> bool {
        self.dimensions.iter().any(|d| d == column)
    }

    pub fn len(&self) -> usize {
        self.dimensions.len() + self.measures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Classifies the columns of a cleaned table.
pub struct Classifier;

impl Classifier {
    /// Kind of every column, in table order.
    pub fn column_kinds(df: &DataFrame) -> Vec<ColumnProfile> {
        df.get_columns()
            .iter()
            .map(|col| ColumnProfile {
                name: col.name().to_string(),
                kind: ColumnKind::of(col.dtype()),
            })
            .collect()
    }

    /// Partition the column names into dimensions and measures.
    pub fn classify(df: &DataFrame) -> Partition {
        let mut partition = Partition::default();
        for profile in Self::column_kinds(df) {
            if profile.kind.is_measure() {
                partition.measures.push(profile.name);
            } else {
                partition.dimensions.push(profile.name);
            }
        }
        partition
    }
}
