//! Row-oriented dataset transport.
//!
//! Datasets crossing an orchestrator task boundary are serialized as
//! split-orient JSON: `{"columns": [...], "data": [[row values]]}` with
//! explicit column order and ISO-8601 datetimes. Reading the transport
//! back yields datetimes as ISO strings, as on the wire; downstream
//! consumers re-coerce where they need real timestamps.

use polars::prelude::*;
use serde_json::{Map, Value, json};

use crate::error::{EtlError, Result};
use crate::utils::{datetime_from_ms, iso_format};

/// Serialize a dataset to split-orient JSON.
pub fn to_split_json(df: &DataFrame) -> Result<String> {
    let columns: Vec<String> = df
        .get_column_names()
        .into_iter()
        .map(|name| name.to_string())
        .collect();

    let mut column_values: Vec<Vec<Value>> = Vec::with_capacity(df.width());
    for column in df.get_columns() {
        column_values.push(series_to_values(column.as_materialized_series())?);
    }

    let mut data: Vec<Value> = Vec::with_capacity(df.height());
    for row in 0..df.height() {
        let row_values: Vec<Value> = column_values.iter().map(|col| col[row].clone()).collect();
        data.push(Value::Array(row_values));
    }

    Ok(serde_json::to_string(&json!({
        "columns": columns,
        "data": data,
    }))?)
}

/// Deserialize a split-orient JSON document back into a dataset.
///
/// Column types are inferred per column: all-boolean, all-integer,
/// numeric, otherwise string. Datetimes arrive as ISO strings.
pub fn from_split_json(raw: &str) -> Result<DataFrame> {
    let document: Map<String, Value> = serde_json::from_str(raw)?;

    let columns = document
        .get("columns")
        .and_then(Value::as_array)
        .ok_or_else(|| EtlError::UnsupportedFormat("split JSON without 'columns'".into()))?;
    let data = document
        .get("data")
        .and_then(Value::as_array)
        .ok_or_else(|| EtlError::UnsupportedFormat("split JSON without 'data'".into()))?;

    let names: Vec<String> = columns
        .iter()
        .map(|v| v.as_str().unwrap_or_default().to_string())
        .collect();

    let mut cells: Vec<Vec<&Value>> = vec![Vec::with_capacity(data.len()); names.len()];
    for row in data {
        let row = row
            .as_array()
            .ok_or_else(|| EtlError::UnsupportedFormat("split JSON row is not an array".into()))?;
        if row.len() != names.len() {
            return Err(EtlError::UnsupportedFormat(
                "split JSON row width does not match columns".into(),
            ));
        }
        for (idx, value) in row.iter().enumerate() {
            cells[idx].push(value);
        }
    }

    let series: Vec<Column> = names
        .iter()
        .zip(cells.iter())
        .map(|(name, values)| values_to_series(name, values).into_column())
        .collect();

    Ok(DataFrame::new(series)?)
}

fn series_to_values(series: &Series) -> Result<Vec<Value>> {
    let mut out = Vec::with_capacity(series.len());
    match series.dtype() {
        DataType::Datetime(unit, _) => {
            let unit = *unit;
            let physical = series.cast(&DataType::Int64)?;
            for opt_val in physical.i64()?.into_iter() {
                let value = opt_val
                    .map(|raw| to_millis(raw, unit))
                    .and_then(datetime_from_ms)
                    .map(|dt| Value::String(iso_format(&dt)))
                    .unwrap_or(Value::Null);
                out.push(value);
            }
        }
        DataType::Boolean => {
            for opt_val in series.bool()?.into_iter() {
                out.push(opt_val.map(Value::Bool).unwrap_or(Value::Null));
            }
        }
        DataType::String => {
            for opt_val in series.str()?.into_iter() {
                out.push(
                    opt_val
                        .map(|v| Value::String(v.to_string()))
                        .unwrap_or(Value::Null),
                );
            }
        }
        dtype if dtype.is_integer() => {
            let casted = series.cast(&DataType::Int64)?;
            for opt_val in casted.i64()?.into_iter() {
                out.push(opt_val.map(|v| json!(v)).unwrap_or(Value::Null));
            }
        }
        _ => {
            let casted = series.cast(&DataType::Float64)?;
            for opt_val in casted.f64()?.into_iter() {
                let value = match opt_val {
                    Some(v) if v.is_finite() => json!(v),
                    _ => Value::Null,
                };
                out.push(value);
            }
        }
    }
    Ok(out)
}

fn to_millis(raw: i64, unit: TimeUnit) -> i64 {
    match unit {
        TimeUnit::Milliseconds => raw,
        TimeUnit::Microseconds => raw / 1_000,
        TimeUnit::Nanoseconds => raw / 1_000_000,
    }
}

/// Infer a column's dtype from its JSON values and build the series.
pub(crate) fn values_to_series(name: &str, values: &[&Value]) -> Series {
    let non_null: Vec<&Value> = values.iter().copied().filter(|v| !v.is_null()).collect();

    if !non_null.is_empty() && non_null.iter().all(|v| v.is_boolean()) {
        let column: Vec<Option<bool>> = values.iter().map(|v| v.as_bool()).collect();
        return Series::new(name.into(), column);
    }
    if !non_null.is_empty() && non_null.iter().all(|v| v.is_i64()) {
        let column: Vec<Option<i64>> = values.iter().map(|v| v.as_i64()).collect();
        return Series::new(name.into(), column);
    }
    if !non_null.is_empty() && non_null.iter().all(|v| v.is_number()) {
        let column: Vec<Option<f64>> = values.iter().map(|v| v.as_f64()).collect();
        return Series::new(name.into(), column);
    }

    let column: Vec<Option<String>> = values
        .iter()
        .map(|v| match v {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        })
        .collect();
    Series::new(name.into(), column)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::df;

    #[test]
    fn test_round_trip_preserves_columns_and_rows() {
        let df = df!(
            "id" => &[1i64, 2],
            "price" => &[10.5, 20.0],
            "region" => &[Some("north"), None],
            "in_stock" => &[true, false],
        )
        .unwrap();

        let encoded = to_split_json(&df).unwrap();
        let decoded = from_split_json(&encoded).unwrap();

        assert!(df.equals_missing(&decoded));
    }

    #[test]
    fn test_datetimes_cross_the_boundary_as_iso_strings() {
        let ts = Series::new("Time_stamp".into(), vec![Some(1_710_512_200_000i64)])
            .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
            .unwrap();
        let df = DataFrame::new(vec![ts.into_column()]).unwrap();

        let encoded = to_split_json(&df).unwrap();
        assert!(encoded.contains("2024-03-15T14:16:40.000"));

        let decoded = from_split_json(&encoded).unwrap();
        assert_eq!(decoded.column("Time_stamp").unwrap().dtype(), &DataType::String);
    }

    #[test]
    fn test_column_order_is_explicit() {
        let df = df!(
            "b" => &[1i64],
            "a" => &[2i64],
        )
        .unwrap();

        let encoded = to_split_json(&df).unwrap();
        let decoded = from_split_json(&encoded).unwrap();
        let names: Vec<String> = decoded
            .get_column_names()
            .into_iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn test_rejects_ragged_rows() {
        let raw = r#"{"columns": ["a", "b"], "data": [[1]]}"#;
        assert!(from_split_json(raw).is_err());
    }
}
