//! Merge and enrichment stage.

use std::collections::HashSet;

use polars::prelude::*;
use tracing::{info, warn};

use crate::error::Result;
use crate::schema;
use crate::types::SalesBucket;
use crate::utils::{datetime_from_ms, hour_of_day, month_name, weekday_name};

/// Inner-join cleaned sales with cleaned products on `product_id`.
///
/// Rows on either side without a matching key are silently excluded;
/// callers needing outer-join semantics must pre/post-process
/// explicitly. Dropped sales rows are counted and logged for
/// observability, never raised.
pub fn merge(sales: &DataFrame, products: &DataFrame) -> Result<DataFrame> {
    info!("Start merging sales with products");

    let lost = count_unmatched_sales(sales, products)?;
    if lost > 0 {
        warn!(
            "Inner join dropped {} sales rows with no matching product_id",
            lost
        );
    }

    let merged = sales
        .clone()
        .lazy()
        .join(
            products.clone().lazy(),
            [col("product_id")],
            [col("product_id")],
            JoinArgs::new(JoinType::Inner),
        )
        .collect()?;

    Ok(merged)
}

/// Count sales rows whose product_id is absent from the products side.
fn count_unmatched_sales(sales: &DataFrame, products: &DataFrame) -> Result<usize> {
    let known: HashSet<i64> = products
        .column("product_id")?
        .as_materialized_series()
        .i64()?
        .into_iter()
        .flatten()
        .collect();

    let unmatched = sales
        .column("product_id")?
        .as_materialized_series()
        .i64()?
        .into_iter()
        .flatten()
        .filter(|id| !known.contains(id))
        .count();

    Ok(unmatched)
}

/// Derive calendar fields and the sales bucket from the merged dataset.
///
/// Adds `month`, `weekday`, `hour` (0-23) and `sales_bucket`. Bucket
/// breakpoints are fixed, not fitted to the data (see
/// [`SalesBucket`]); a non-positive total has no bucket and fails the
/// exit gate.
pub fn enrich(merged: DataFrame) -> Result<DataFrame> {
    info!("Enriching merged data");
    let mut df = merged;

    let ts_ms = df
        .column("Time_stamp")?
        .as_materialized_series()
        .cast(&DataType::Int64)?;
    let ts_ms = ts_ms.i64()?;

    let mut months: Vec<Option<String>> = Vec::with_capacity(df.height());
    let mut weekdays: Vec<Option<String>> = Vec::with_capacity(df.height());
    let mut hours: Vec<Option<i64>> = Vec::with_capacity(df.height());
    for opt_ms in ts_ms.into_iter() {
        match opt_ms.and_then(datetime_from_ms) {
            Some(dt) => {
                months.push(Some(month_name(&dt)));
                weekdays.push(Some(weekday_name(&dt)));
                hours.push(Some(hour_of_day(&dt)));
            }
            None => {
                months.push(None);
                weekdays.push(None);
                hours.push(None);
            }
        }
    }

    let totals = df.column("total_sales")?.as_materialized_series().clone();
    let buckets: Vec<Option<&str>> = totals
        .f64()?
        .into_iter()
        .map(|opt_val| {
            opt_val
                .and_then(SalesBucket::classify)
                .map(|bucket| bucket.label())
        })
        .collect();

    df.with_column(Series::new("month".into(), months))?;
    df.with_column(Series::new("weekday".into(), weekdays))?;
    df.with_column(Series::new("hour".into(), hours))?;
    df.with_column(Series::new("sales_bucket".into(), buckets))?;

    Ok(schema::enriched_outgoing().enforce(df)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::{clean_products, clean_sales};
    use polars::df;

    fn clean_pair() -> (DataFrame, DataFrame) {
        let sales = df!(
            "sales id" => &[1i64, 2, 3],
            "proDuct Id" => &[101i64, 102, 999],
            "Region" => &["north", "east", "south"],
            "qty" => &[2i64, 5, 1],
            "Price" => &[50.0, 120.0, 10.0],
            "Time stamp" => &[
                "2024-03-15 14:30:00",
                "2024-07-04 09:15:00",
                "2024-01-01 00:00:00",
            ],
            "discount" => &[0.0, 0.0, 0.0],
            "order_status" => &["Shipped", "Pending", "Returned"],
        )
        .unwrap();
        let products = df!(
            "product_id" => &[101i64, 102],
            "category" => &["electronics", "toys"],
            "brand" => &["ACME", "GLOBEX"],
            "rating" => &[4.5, 3.8],
            "in_stock" => &[true, false],
            "launch_date" => &[Some("2023-01-15"), None],
        )
        .unwrap();

        let (sales, _) = clean_sales(sales).unwrap();
        let (products, _) = clean_products(products).unwrap();
        (sales, products)
    }

    #[test]
    fn test_merge_is_inner_join() {
        let (sales, products) = clean_pair();
        let merged = merge(&sales, &products).unwrap();

        // product 999 has no match and is dropped
        assert_eq!(merged.height(), 2);

        let known: Vec<i64> = products
            .column("product_id")
            .unwrap()
            .i64()
            .unwrap()
            .into_iter()
            .flatten()
            .collect();
        for id in merged
            .column("product_id")
            .unwrap()
            .i64()
            .unwrap()
            .into_iter()
            .flatten()
        {
            assert!(known.contains(&id));
        }
    }

    #[test]
    fn test_count_unmatched_sales() {
        let (sales, products) = clean_pair();
        assert_eq!(count_unmatched_sales(&sales, &products).unwrap(), 1);
    }

    #[test]
    fn test_enrich_derives_calendar_and_bucket() {
        let (sales, products) = clean_pair();
        let enriched = enrich(merge(&sales, &products).unwrap()).unwrap();

        let months: Vec<&str> = enriched
            .column("month")
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .flatten()
            .collect();
        assert_eq!(months, vec!["March", "July"]);

        let weekdays: Vec<&str> = enriched
            .column("weekday")
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .flatten()
            .collect();
        assert_eq!(weekdays, vec!["Friday", "Thursday"]);

        let hours: Vec<i64> = enriched
            .column("hour")
            .unwrap()
            .i64()
            .unwrap()
            .into_iter()
            .flatten()
            .collect();
        assert_eq!(hours, vec![14, 9]);

        // 100.0 sits on the Low/Mid breakpoint and stays Low; 600.0 is High
        let buckets: Vec<&str> = enriched
            .column("sales_bucket")
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .flatten()
            .collect();
        assert_eq!(buckets, vec!["Low", "High"]);
    }
}
