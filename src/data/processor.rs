//! Data Processor Module
//! Handles data cleaning: placeholder column removal, missing value
//! imputation and order date parsing.

use crate::data::classifier::ColumnKind;
use chrono::{NaiveDate, NaiveDateTime};
use log::{debug, info, warn};
use polars::prelude::*;
use std::collections::BTreeMap;
use thiserror::Error;

/// Index column written by pandas when a frame is saved with its index.
pub const PLACEHOLDER_COLUMN: &str = "Unnamed: 0";

/// Column parsed into datetimes when present.
pub const ORDER_DATE_COLUMN: &str = "Order Date";

/// Share of missing cells above which a column is reported before filling.
pub const HIGH_MISSING_RATIO: f64 = 0.5;

/// Layouts tried in order for date-and-time values.
/// Two-digit years come first so `19` is never read as the year 19.
const DATETIME_FORMATS: [&str; 7] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%y %H:%M",
    "%m/%d/%Y %H:%M",
    "%m/%d/%y %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
];

/// Layouts tried for date-only values, read as midnight.
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%y", "%m/%d/%Y"];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DataQualityError {
    #[error("Column '{column}' has no observed values to impute from")]
    EntirelyMissing { column: String },
    #[error("Column '{column}' row {row}: cannot parse '{value}' as a date")]
    UnparseableDate {
        column: String,
        row: usize,
        value: String,
    },
}

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error(transparent)]
    DataQuality(#[from] DataQualityError),
}

/// Which columns the preprocessor drops and parses.
#[derive(Debug, Clone, PartialEq)]
pub struct PreprocessOptions {
    /// Columns removed when present
    pub drop_columns: Vec<String>,
    /// Column coerced to datetimes when present
    pub date_column: Option<String>,
}

impl Default for PreprocessOptions {
    fn default() -> Self {
        Self {
            drop_columns: vec![PLACEHOLDER_COLUMN.to_string()],
            date_column: Some(ORDER_DATE_COLUMN.to_string()),
        }
    }
}

/// Handles data cleaning operations. Every step takes the table by value
/// and returns the cleaned table.
pub struct Preprocessor;

impl Preprocessor {
    /// Run column removal, imputation and date coercion, in that order.
    pub fn preprocess(
        df: DataFrame,
        options: &PreprocessOptions,
    ) -> Result<DataFrame, ProcessorError> {
        let mut df = df;
        for name in &options.drop_columns {
            df = Self::drop_column(df, name)?;
        }

        df = Self::impute_missing(df)?;

        if let Some(date_column) = &options.date_column {
            df = Self::coerce_datetime(df, date_column)?;
        }

        Ok(df)
    }

    /// Remove a column if it exists. An absent column leaves the table unchanged.
    pub fn drop_column(df: DataFrame, column_name: &str) -> Result<DataFrame, ProcessorError> {
        if df.get_column_index(column_name).is_none() {
            debug!("column '{column_name}' does not exist, nothing to drop");
            return Ok(df);
        }

        let dropped = df.drop(column_name)?;
        info!("column '{column_name}' has been dropped");
        Ok(dropped)
    }

    /// Fill the missing values of every column.
    pub fn impute_missing(df: DataFrame) -> Result<DataFrame, ProcessorError> {
        let columns = df
            .get_columns()
            .iter()
            .map(Self::impute_column)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(DataFrame::new(columns)?)
    }

    /// Fill a single column's missing values according to its kind:
    /// mean for numeric, mean instant for temporal, mode otherwise.
    pub fn impute_column(column: &Column) -> Result<Column, ProcessorError> {
        let series = column.as_materialized_series();
        let kind = ColumnKind::of(series.dtype());

        let missing = match kind {
            ColumnKind::Numeric => float_values(series)?.iter().filter(|v| v.is_none()).count(),
            _ => series.null_count(),
        };
        if missing == 0 {
            return Ok(column.clone());
        }
        if missing == series.len() {
            return Err(DataQualityError::EntirelyMissing {
                column: series.name().to_string(),
            }
            .into());
        }

        let ratio = missing as f64 / series.len() as f64;
        if ratio > HIGH_MISSING_RATIO {
            warn!(
                "column '{}' is {:.0}% missing, filling anyway",
                series.name(),
                ratio * 100.0
            );
        }

        let filled = match kind {
            ColumnKind::Numeric => fill_mean(series)?,
            ColumnKind::Temporal => fill_mean_instant(series)?,
            ColumnKind::Categorical => fill_mode(series)?,
        };
        debug!("filled {missing} missing values in '{}'", series.name());
        Ok(filled)
    }

    /// Parse the named column into datetimes. Absent columns are left alone;
    /// the first value that does not parse aborts the coercion.
    pub fn coerce_datetime(df: DataFrame, column_name: &str) -> Result<DataFrame, ProcessorError> {
        let mut df = df;
        let Some(idx) = df.get_column_index(column_name) else {
            return Ok(df);
        };

        if matches!(df.get_columns()[idx].dtype(), DataType::Datetime(_, _)) {
            return Ok(df);
        }

        let coerced = {
            let series = df.get_columns()[idx].as_materialized_series();
            match series.dtype() {
                DataType::Date => series.cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?,
                _ => {
                    let text = series.cast(&DataType::String)?;
                    let mut parsed = Vec::with_capacity(text.len());
                    for (row, value) in text.str()?.into_iter().enumerate() {
                        let raw = value.unwrap_or_default();
                        let timestamp =
                            parse_datetime(raw).ok_or_else(|| DataQualityError::UnparseableDate {
                                column: column_name.to_string(),
                                row,
                                value: raw.to_string(),
                            })?;
                        parsed.push(timestamp);
                    }
                    DatetimeChunked::from_naive_datetime(
                        series.name().clone(),
                        parsed,
                        TimeUnit::Milliseconds,
                    )
                    .into_series()
                }
            }
        };

        df.with_column(coerced)?;
        info!("column '{column_name}' parsed as datetime");
        Ok(df)
    }
}

/// Parse a date or date-and-time string in one of the accepted layouts.
pub fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// Most frequent value. Ties go to the smallest value in sorted order.
pub fn mode<T: Ord>(values: impl IntoIterator<Item = T>) -> Option<T> {
    let mut counts: BTreeMap<T, usize> = BTreeMap::new();
    for value in values {
        *counts.entry(value).or_default() += 1;
    }

    let mut best: Option<(T, usize)> = None;
    for (value, count) in counts {
        if best.as_ref().map_or(true, |(_, top)| count > *top) {
            best = Some((value, count));
        }
    }
    best.map(|(value, _)| value)
}

/// Values as f64, with NaN read as missing.
fn float_values(series: &Series) -> Result<Vec<Option<f64>>, ProcessorError> {
    let as_f64 = series.cast(&DataType::Float64)?;
    Ok(as_f64
        .f64()?
        .into_iter()
        .map(|v| v.filter(|x| !x.is_nan()))
        .collect())
}

fn fill_mean(series: &Series) -> Result<Column, ProcessorError> {
    let values = float_values(series)?;
    let observed: Vec<f64> = values.iter().flatten().copied().collect();
    let mean = observed.iter().sum::<f64>() / observed.len() as f64;

    let filled: Vec<f64> = values.into_iter().map(|v| v.unwrap_or(mean)).collect();
    Ok(Column::new(series.name().clone(), filled))
}

fn fill_mean_instant(series: &Series) -> Result<Column, ProcessorError> {
    let physical = series.to_physical_repr().cast(&DataType::Int64)?;
    let values: Vec<Option<i64>> = physical.i64()?.into_iter().collect();
    let observed: Vec<f64> = values.iter().flatten().map(|&v| v as f64).collect();
    let mean = (observed.iter().sum::<f64>() / observed.len() as f64).round() as i64;

    let filled: Vec<i64> = values.into_iter().map(|v| v.unwrap_or(mean)).collect();
    let filled = Series::new(series.name().clone(), filled).cast(series.dtype())?;
    Ok(filled.into())
}

fn fill_mode(series: &Series) -> Result<Column, ProcessorError> {
    let name = series.name().clone();

    if series.dtype() == &DataType::Boolean {
        let values: Vec<Option<bool>> = series.bool()?.into_iter().collect();
        let fill = mode(values.iter().flatten().copied()).unwrap_or_default();
        let filled: Vec<bool> = values.into_iter().map(|v| v.unwrap_or(fill)).collect();
        return Ok(Column::new(name, filled));
    }

    let text = series.cast(&DataType::String)?;
    let values: Vec<Option<&str>> = text.str()?.into_iter().collect();
    let fill = mode(values.iter().flatten().copied()).unwrap_or_default();
    let filled: Vec<String> = values
        .into_iter()
        .map(|v| v.unwrap_or(fill).to_string())
        .collect();

    let filled = Series::new(name, filled);
    match series.dtype() {
        DataType::String => Ok(filled.into()),
        // A categorical rebuilds its rev map from the filled strings.
        DataType::Categorical(_, ordering) => {
            Ok(filled.cast(&DataType::Categorical(None, *ordering))?.into())
        }
        dtype => Ok(filled.cast(dtype)?.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f64_values(df: &DataFrame, name: &str) -> Vec<Option<f64>> {
        df.column(name).unwrap().f64().unwrap().into_iter().collect()
    }

    fn str_values(df: &DataFrame, name: &str) -> Vec<Option<String>> {
        df.column(name)
            .unwrap()
            .as_materialized_series()
            .str()
            .unwrap()
            .into_iter()
            .map(|v| v.map(str::to_string))
            .collect()
    }

    fn sales_frame() -> DataFrame {
        df!(
            "Unnamed: 0" => [0i64, 1, 2, 3],
            "Order Date" => [Some("2019-12-30 00:01:00"), Some("2019-12-29 07:03:00"), None, Some("2019-12-29 07:03:00")],
            "Product" => [Some("Phone"), None, Some("Phone"), Some("Laptop")],
            "Sales" => [Some(100.0), Some(200.0), None, Some(300.0)],
            "Hour" => [0i64, 7, 18, 7],
        )
        .unwrap()
    }

    #[test]
    fn test_mean_fill() {
        let df = df!("Quantity" => [Some(1.0), None, Some(3.0)]).unwrap();
        let df = Preprocessor::impute_missing(df).unwrap();
        assert_eq!(f64_values(&df, "Quantity"), vec![Some(1.0), Some(2.0), Some(3.0)]);
    }

    #[test]
    fn test_mean_fill_widens_integers() {
        let df = df!("Quantity" => [Some(1i64), None, Some(4)]).unwrap();
        let df = Preprocessor::impute_missing(df).unwrap();
        assert_eq!(df.column("Quantity").unwrap().dtype(), &DataType::Float64);
        assert_eq!(f64_values(&df, "Quantity"), vec![Some(1.0), Some(2.5), Some(4.0)]);
    }

    #[test]
    fn test_nan_counts_as_missing() {
        let df = df!("Price" => [2.0, f64::NAN, 4.0]).unwrap();
        let df = Preprocessor::impute_missing(df).unwrap();
        assert_eq!(f64_values(&df, "Price"), vec![Some(2.0), Some(3.0), Some(4.0)]);
    }

    #[test]
    fn test_mode_fill() {
        let df = df!("Product" => [Some("A"), Some("A"), None, Some("B")]).unwrap();
        let df = Preprocessor::impute_missing(df).unwrap();
        let expected: Vec<Option<String>> = ["A", "A", "A", "B"]
            .iter()
            .map(|s| Some(s.to_string()))
            .collect();
        assert_eq!(str_values(&df, "Product"), expected);
    }

    #[test]
    fn test_mode_tie_breaks_on_sorted_order() {
        assert_eq!(mode(["B", "A", "B", "A", "C"]), Some("A"));
        assert_eq!(mode([true, false]), Some(false));
        assert_eq!(mode(Vec::<&str>::new()), None);

        let df = df!("City" => [Some("Dallas"), None, Some("Austin")]).unwrap();
        let df = Preprocessor::impute_missing(df).unwrap();
        assert_eq!(str_values(&df, "City")[1].as_deref(), Some("Austin"));
    }

    #[test]
    fn test_boolean_mode_fill() {
        let df = df!("Returned" => [Some(true), None, Some(true), Some(false)]).unwrap();
        let df = Preprocessor::impute_missing(df).unwrap();
        let values: Vec<Option<bool>> = df
            .column("Returned")
            .unwrap()
            .as_materialized_series()
            .bool()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(values, vec![Some(true), Some(true), Some(true), Some(false)]);
    }

    #[test]
    fn test_categorical_mode_fill() {
        let colors = Series::new("Color".into(), [Some("b"), None, Some("a"), Some("b")])
            .cast(&DataType::Categorical(None, CategoricalOrdering::Physical))
            .unwrap();
        let df = DataFrame::new(vec![colors.into()]).unwrap();

        let df = Preprocessor::impute_missing(df).unwrap();
        let column = df.column("Color").unwrap();
        assert!(matches!(column.dtype(), DataType::Categorical(_, _)));
        assert_eq!(column.null_count(), 0);

        let text = column.as_materialized_series().cast(&DataType::String).unwrap();
        let values: Vec<Option<&str>> = text.str().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some("b"), Some("b"), Some("a"), Some("b")]);
    }

    #[test]
    fn test_date_mean_instant_fill() {
        let shipped = Series::new("Shipped".into(), [Some(0i32), None, Some(10)])
            .cast(&DataType::Date)
            .unwrap();
        let df = DataFrame::new(vec![shipped.into()]).unwrap();

        let df = Preprocessor::impute_missing(df).unwrap();
        let column = df.column("Shipped").unwrap().as_materialized_series();
        assert_eq!(column.dtype(), &DataType::Date);

        // Days since the epoch: the gap becomes 1970-01-06.
        let physical = column.to_physical_repr();
        let days: Vec<Option<i32>> = physical.i32().unwrap().into_iter().collect();
        assert_eq!(days, vec![Some(0), Some(5), Some(10)]);
    }

    #[test]
    fn test_datetime_mean_instant_fill() {
        let dtype = DataType::Datetime(TimeUnit::Milliseconds, None);
        let stamps = Series::new("Order Date".into(), [Some(0i64), None, Some(1000)])
            .cast(&dtype)
            .unwrap();
        let df = DataFrame::new(vec![stamps.into()]).unwrap();

        let df = Preprocessor::impute_missing(df).unwrap();
        let column = df.column("Order Date").unwrap().as_materialized_series();
        assert_eq!(column.dtype(), &dtype);

        let physical = column.to_physical_repr();
        let millis: Vec<Option<i64>> = physical.i64().unwrap().into_iter().collect();
        assert_eq!(millis, vec![Some(0), Some(500), Some(1000)]);
    }

    #[test]
    fn test_complete_column_is_untouched() {
        let df = df!("Hour" => [1i32, 2, 3]).unwrap();
        let df = Preprocessor::impute_missing(df).unwrap();
        assert_eq!(df.column("Hour").unwrap().dtype(), &DataType::Int32);
    }

    #[test]
    fn test_entirely_missing_column_fails() {
        let df = df!(
            "Product" => ["Phone", "Laptop"],
            "Discount" => [None::<f64>, None],
        )
        .unwrap();
        let err = Preprocessor::impute_missing(df).unwrap_err();
        assert!(matches!(
            err,
            ProcessorError::DataQuality(DataQualityError::EntirelyMissing { ref column }) if column == "Discount"
        ));
    }

    #[test]
    fn test_entirely_missing_text_column_fails() {
        let df = df!("Notes" => [None::<&str>, None, None]).unwrap();
        assert!(matches!(
            Preprocessor::impute_missing(df),
            Err(ProcessorError::DataQuality(DataQualityError::EntirelyMissing { .. }))
        ));
    }

    #[test]
    fn test_drop_column_is_idempotent() {
        let df = sales_frame();
        let once = Preprocessor::drop_column(df, PLACEHOLDER_COLUMN).unwrap();
        assert!(once.get_column_index(PLACEHOLDER_COLUMN).is_none());
        assert_eq!(once.width(), 4);

        let twice = Preprocessor::drop_column(once.clone(), PLACEHOLDER_COLUMN).unwrap();
        assert!(twice.equals(&once));
    }

    #[test]
    fn test_preprocess_leaves_no_missing_values() {
        let df = Preprocessor::preprocess(sales_frame(), &PreprocessOptions::default()).unwrap();

        assert_eq!(df.width(), 4);
        for column in df.get_columns() {
            assert_eq!(column.null_count(), 0, "column {}", column.name());
        }
        assert!(matches!(
            df.column(ORDER_DATE_COLUMN).unwrap().dtype(),
            DataType::Datetime(_, _)
        ));
        assert_eq!(f64_values(&df, "Sales")[2], Some(200.0));
        assert_eq!(str_values(&df, "Product")[1].as_deref(), Some("Phone"));
    }

    #[test]
    fn test_invalid_order_date_fails() {
        let df = df!(
            "Order Date" => ["2019-04-19 08:46:00", "Order Date", "2019-04-07 22:30:00"],
        )
        .unwrap();
        let err = Preprocessor::preprocess(df, &PreprocessOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            ProcessorError::DataQuality(DataQualityError::UnparseableDate { row: 1, ref value, .. }) if value == "Order Date"
        ));
    }

    #[test]
    fn test_order_date_parsed_in_place() {
        let df = df!(
            "Product" => ["Phone", "Laptop"],
            "Order Date" => ["12/30/19 00:01", "04/07/2019 22:30"],
        )
        .unwrap();
        let df = Preprocessor::coerce_datetime(df, ORDER_DATE_COLUMN).unwrap();

        assert_eq!(df.get_column_index(ORDER_DATE_COLUMN), Some(1));
        let parsed: Vec<Option<NaiveDateTime>> = df
            .column(ORDER_DATE_COLUMN)
            .unwrap()
            .as_materialized_series()
            .datetime()
            .unwrap()
            .as_datetime_iter()
            .collect();
        assert_eq!(parsed[0], parse_datetime("2019-12-30 00:01:00"));
        assert_eq!(parsed[1], parse_datetime("2019-04-07 22:30:00"));
    }

    #[test]
    fn test_missing_date_column_is_noop() {
        let df = df!("Sales" => [1.0, 2.0]).unwrap();
        let out = Preprocessor::coerce_datetime(df.clone(), ORDER_DATE_COLUMN).unwrap();
        assert!(out.equals(&df));
    }

    #[test]
    fn test_parse_datetime_layouts() {
        let expected = NaiveDate::from_ymd_opt(2019, 12, 30)
            .and_then(|d| d.and_hms_opt(0, 1, 0));
        assert_eq!(parse_datetime("2019-12-30 00:01:00"), expected);
        assert_eq!(parse_datetime("2019-12-30T00:01:00"), expected);
        assert_eq!(parse_datetime(" 12/30/19 00:01 "), expected);
        assert_eq!(parse_datetime("12/30/2019 00:01"), expected);
        assert_eq!(
            parse_datetime("2019-12-30"),
            NaiveDate::from_ymd_opt(2019, 12, 30).and_then(|d| d.and_hms_opt(0, 0, 0))
        );
        assert_eq!(parse_datetime("13/45/2019"), None);
        assert_eq!(parse_datetime(""), None);
    }
}
