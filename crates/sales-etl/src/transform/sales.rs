//! Sales cleaning and transformation.

use polars::prelude::*;
use tracing::{debug, info};

use crate::error::Result;
use crate::schema::{self, CheckFailure};
use crate::transform::{coerce_column, drop_null_rows, map_string_column};
use crate::utils::parse_timestamp_ms;

/// Clean and transform raw sales data.
///
/// Steps, in order: lenient entry gate, column-name normalization,
/// region casing, null-subset drop, duplicate drop, positivity filter,
/// timestamp coercion, total-sales derivation, join-key rename, hard
/// exit gate.
///
/// The null-subset drop runs *before* timestamp coercion, so rows whose
/// timestamp fails to parse become null afterwards and are not
/// re-filtered. They fail the non-nullable `Time_stamp` column at the
/// exit gate instead. This ordering reproduces the source behavior and
/// is covered by tests; do not reorder.
///
/// Returns the cleaned dataset together with any entry-gate violations
/// that were observed (and logged) on the raw input.
pub fn clean_sales(raw: DataFrame) -> Result<(DataFrame, Vec<CheckFailure>)> {
    info!("Initiating transformation of sales data");

    let (mut df, entry_violations) = schema::sales_entry().inspect(raw);

    // Standardize column name separators ("Time stamp" -> "Time_stamp").
    let normalized: Vec<PlSmallStr> = df
        .get_column_names()
        .into_iter()
        .map(|name| name.replace(' ', "_").into())
        .collect();
    df.set_column_names(normalized)?;

    map_string_column(&mut df, "Region", |val| val.trim().to_lowercase())?;

    // Already-clean inputs carry the post-rename join key.
    let product_key = if df.column("proDuct_Id").is_ok() {
        "proDuct_Id"
    } else {
        "product_id"
    };

    let before = df.height();
    df = drop_null_rows(df, &["Region", "Time_stamp", product_key])?;
    df = df.unique::<&str, &str>(None, UniqueKeepStrategy::First, None)?;
    debug!("Dropped {} null/duplicate sales rows", before - df.height());

    coerce_column(&mut df, "Price", &DataType::Float64)?;
    coerce_column(&mut df, "discount", &DataType::Float64)?;
    coerce_column(&mut df, "qty", &DataType::Int64)?;

    let qty_positive = df.column("qty")?.as_materialized_series().gt(0)?;
    let price_positive = df.column("Price")?.as_materialized_series().gt(0.0)?;
    df = df.filter(&(qty_positive & price_positive))?;

    coerce_timestamps(&mut df)?;
    derive_total_sales(&mut df)?;

    if product_key == "proDuct_Id" {
        // Join key must match the products side; renamed here rather than
        // upstream because the raw extract owns its column names.
        df.rename("proDuct_Id", "product_id".into())?;
    }

    info!("Done transformation of sales data");
    let df = schema::sales_outgoing().enforce(df)?;
    Ok((df, entry_violations))
}

/// Parse the string timestamp column to Datetime(ms). Unparsable values
/// become null and deliberately survive to the exit gate.
fn coerce_timestamps(df: &mut DataFrame) -> Result<()> {
    let series = df.column("Time_stamp")?.as_materialized_series().clone();
    if matches!(series.dtype(), DataType::Datetime(_, _)) {
        return Ok(());
    }

    let values = series.str()?;
    let mut parsed: Vec<Option<i64>> = Vec::with_capacity(values.len());
    for opt_val in values.into_iter() {
        parsed.push(opt_val.and_then(parse_timestamp_ms));
    }

    let coerced = Series::new("Time_stamp".into(), parsed)
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?;
    df.replace("Time_stamp", coerced)?;
    Ok(())
}

/// total_sales = Price * (1 - discount/100) * qty
fn derive_total_sales(df: &mut DataFrame) -> Result<()> {
    let price_series = df.column("Price")?.as_materialized_series().clone();
    let discount_series = df.column("discount")?.as_materialized_series().clone();
    let qty_series = df
        .column("qty")?
        .as_materialized_series()
        .cast(&DataType::Float64)?;

    let price = price_series.f64()?;
    let discount = discount_series.f64()?;
    let qty = qty_series.f64()?;

    let mut total: Vec<Option<f64>> = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let value = match (price.get(i), discount.get(i), qty.get(i)) {
            (Some(p), Some(d), Some(q)) => Some(p * (1.0 - d / 100.0) * q),
            _ => None,
        };
        total.push(value);
    }

    df.with_column(Series::new("total_sales".into(), total))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EtlError;
    use polars::df;

    fn raw_sales() -> DataFrame {
        df!(
            "sales id" => &[1i64, 2, 3, 4],
            "proDuct Id" => &[101i64, 101, 102, 103],
            "Region" => &["  North ", "EAST", "south", "west"],
            "qty" => &[2i64, 3, 0, 1],
            "Price" => &[50.0, 20.0, 10.0, -5.0],
            "Time stamp" => &[
                "2024-03-15 14:30:00",
                "2024-03-16 09:00:00",
                "2024-03-17 10:00:00",
                "2024-03-18 11:00:00",
            ],
            "discount" => &[0.0, 10.0, 0.0, 0.0],
            "order_status" => &["Shipped", "Pending", "Shipped", "Returned"],
        )
        .unwrap()
    }

    #[test]
    fn test_clean_sales_happy_path() {
        let (clean, violations) = clean_sales(raw_sales()).unwrap();
        assert!(violations.is_empty());

        // qty=0 and Price<0 rows filtered out
        assert_eq!(clean.height(), 2);

        let regions: Vec<&str> = clean
            .column("Region")
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .flatten()
            .collect();
        assert_eq!(regions, vec!["north", "east"]);

        let totals: Vec<f64> = clean
            .column("total_sales")
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .flatten()
            .collect();
        assert_eq!(totals, vec![100.0, 54.0]);

        assert!(clean.column("product_id").is_ok());
        assert!(clean.column("proDuct_Id").is_err());
    }

    #[test]
    fn test_clean_sales_drops_null_subset_and_duplicates() {
        let raw = df!(
            "sales id" => &[1i64, 1, 2, 3],
            "proDuct Id" => &[Some(101i64), Some(101), None, Some(102)],
            "Region" => &[Some("north"), Some("north"), Some("east"), None],
            "qty" => &[2i64, 2, 1, 1],
            "Price" => &[50.0, 50.0, 10.0, 10.0],
            "Time stamp" => &["2024-03-15 14:30:00", "2024-03-15 14:30:00", "2024-03-16 09:00:00", "2024-03-17 09:00:00"],
            "discount" => &[0.0, 0.0, 0.0, 0.0],
            "order_status" => &["Shipped", "Shipped", "Pending", "Pending"],
        )
        .unwrap();

        let (clean, _) = clean_sales(raw).unwrap();
        // one duplicate, one null product id, one null region
        assert_eq!(clean.height(), 1);
    }

    #[test]
    fn test_unparsable_timestamp_rejected_at_exit_gate() {
        let raw = df!(
            "sales id" => &[1i64],
            "proDuct Id" => &[101i64],
            "Region" => &["north"],
            "qty" => &[2i64],
            "Price" => &[50.0],
            "Time stamp" => &["not a timestamp"],
            "discount" => &[0.0],
            "order_status" => &["Shipped"],
        )
        .unwrap();

        // The row survives the null-subset drop (it ran before parsing),
        // then fails the non-nullable Time_stamp exit column.
        let err = clean_sales(raw).unwrap_err();
        match err {
            EtlError::Schema(violation) => {
                assert!(violation.failures.iter().any(|f| f.column == "Time_stamp"));
            }
            other => panic!("expected schema violation, got {other}"),
        }
    }

    #[test]
    fn test_clean_sales_is_idempotent_on_clean_data() {
        let (once, _) = clean_sales(raw_sales()).unwrap();
        let (twice, _) = clean_sales(once.clone()).unwrap();
        assert!(once.equals(&twice));
    }

    #[test]
    fn test_integer_price_column_is_coerced() {
        let raw = df!(
            "sales id" => &[1i64],
            "proDuct Id" => &[101i64],
            "Region" => &["north"],
            "qty" => &[2i64],
            "Price" => &[50i64],
            "Time stamp" => &["2024-03-15 14:30:00"],
            "discount" => &[0i64],
            "order_status" => &["Shipped"],
        )
        .unwrap();

        let (clean, violations) = clean_sales(raw).unwrap();
        // Entry gate flags the integer Price/discount, then coercion fixes them.
        assert!(!violations.is_empty());
        assert_eq!(clean.column("Price").unwrap().dtype(), &DataType::Float64);
    }
}
