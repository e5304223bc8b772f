//! Analytical aggregations over the enriched dataset.
//!
//! Five independent, order-insensitive functions, each deriving one
//! analytical table and passing it through its own hard exit gate.
//! Group-by outputs are sorted on their keys so results are
//! deterministic run to run.

use std::collections::{BTreeMap, BTreeSet};

use polars::prelude::*;
use tracing::info;

use crate::error::Result;
use crate::schema;
use crate::utils::{datetime_from_ms, iso_week, quarter_label};

/// Order statuses that always appear as pivot columns, even when the
/// batch contains no such orders.
const CANONICAL_STATUSES: [&str; 3] = ["Pending", "Returned", "Shipped"];

/// Quarterly sales trend by category: sum of total_sales per
/// (calendar quarter, category).
pub fn quarterly_sales_by_category(enriched: &DataFrame) -> Result<DataFrame> {
    info!("Identifying quarterly sales trend by category");

    let mut df = enriched.clone();
    let quarters = timestamp_derived(&df, |dt| quarter_label(&dt))?;
    df.with_column(Series::new("quarter".into(), quarters))?;

    let out = df
        .lazy()
        .group_by([col("quarter"), col("category")])
        .agg([col("total_sales").sum()])
        .sort(["quarter", "category"], SortMultipleOptions::default())
        .collect()?;

    Ok(schema::quarterly_sales_outgoing().enforce(out)?)
}

/// Revenue by region with each region's share of the grand total and a
/// running cumulative share.
///
/// Regions are ordered lexically ascending; the cumulative share
/// depends on row order, so the ordering is part of the contract.
pub fn sales_revenue_by_region(enriched: &DataFrame) -> Result<DataFrame> {
    info!("Calculating sales revenue by region");

    let mut out = enriched
        .clone()
        .lazy()
        .group_by([col("Region")])
        .agg([col("total_sales").sum()])
        .sort(["Region"], SortMultipleOptions::default())
        .collect()?;

    let totals_series = out.column("total_sales")?.as_materialized_series().clone();
    let totals = totals_series.f64()?;
    let grand_total: f64 = totals.into_iter().flatten().sum();

    let mut shares: Vec<f64> = Vec::with_capacity(out.height());
    let mut cumulative: Vec<f64> = Vec::with_capacity(out.height());
    let mut running = 0.0;
    for opt_total in totals.into_iter() {
        let share = if grand_total > 0.0 {
            opt_total.unwrap_or(0.0) / grand_total * 100.0
        } else {
            0.0
        };
        running += share;
        shares.push(share);
        cumulative.push(running);
    }

    out.with_column(Series::new("revenue_share".into(), shares))?;
    out.with_column(Series::new("cumulative_revenue_share".into(), cumulative))?;

    Ok(schema::revenue_by_region_outgoing().enforce(out)?)
}

/// Sales seasonality: total sales and units per (month, category).
pub fn sales_seasonality(enriched: &DataFrame) -> Result<DataFrame> {
    info!("Calculating sales seasonality by month and category");

    let out = enriched
        .clone()
        .lazy()
        .group_by([col("month"), col("category")])
        .agg([
            col("total_sales").sum().alias("monthly_total_sales"),
            col("qty").sum().alias("monthly_total_quantity"),
        ])
        .sort(["month", "category"], SortMultipleOptions::default())
        .collect()?;

    Ok(schema::seasonality_outgoing().enforce(out)?)
}

/// Weekly order counts pivoted by status: one row per ISO week, one
/// column per status, missing combinations filled with 0.
///
/// Weeks are sorted ascending and status columns lexically; the
/// canonical statuses are always present.
pub fn weekly_order_counts_by_status(enriched: &DataFrame) -> Result<DataFrame> {
    info!("Calculating weekly orders by status");

    let weeks = timestamp_derived(enriched, |dt| iso_week(&dt))?;
    let statuses = enriched
        .column("order_status")?
        .as_materialized_series()
        .clone();
    let statuses = statuses.str()?;

    let mut counts: BTreeMap<(i64, String), i64> = BTreeMap::new();
    let mut week_keys: BTreeSet<i64> = BTreeSet::new();
    let mut status_keys: BTreeSet<String> =
        CANONICAL_STATUSES.iter().map(|s| s.to_string()).collect();

    for (opt_week, opt_status) in weeks.iter().zip(statuses.into_iter()) {
        if let (Some(week), Some(status)) = (opt_week, opt_status) {
            *counts.entry((*week, status.to_string())).or_insert(0) += 1;
            week_keys.insert(*week);
            status_keys.insert(status.to_string());
        }
    }

    let ordered_weeks: Vec<i64> = week_keys.into_iter().collect();
    let mut columns: Vec<Column> =
        vec![Series::new("week".into(), ordered_weeks.clone()).into_column()];
    for status in &status_keys {
        let column: Vec<i64> = ordered_weeks
            .iter()
            .map(|week| {
                counts
                    .get(&(*week, status.clone()))
                    .copied()
                    .unwrap_or(0)
            })
            .collect();
        columns.push(Series::new(status.as_str().into(), column).into_column());
    }

    let out = DataFrame::new(columns)?;
    Ok(schema::weekly_status_outgoing().enforce(out)?)
}

/// Average sales and units per sales bucket.
pub fn average_sales_and_units_by_bucket(enriched: &DataFrame) -> Result<DataFrame> {
    info!("Calculating average sales and units by sales bucket");

    let out = enriched
        .clone()
        .lazy()
        .group_by([col("sales_bucket")])
        .agg([
            col("total_sales").mean().alias("average_sales"),
            col("qty").mean().alias("average_quantity"),
        ])
        .sort(["sales_bucket"], SortMultipleOptions::default())
        .collect()?;

    Ok(schema::bucket_averages_outgoing().enforce(out)?)
}

/// Derive a per-row value from the Datetime(ms) timestamp column.
fn timestamp_derived<T>(
    df: &DataFrame,
    f: impl Fn(chrono::NaiveDateTime) -> T,
) -> Result<Vec<Option<T>>> {
    let ts_ms = df
        .column("Time_stamp")?
        .as_materialized_series()
        .cast(&DataType::Int64)?;
    let ts_ms = ts_ms.i64()?;

    Ok(ts_ms
        .into_iter()
        .map(|opt_ms| opt_ms.and_then(datetime_from_ms).map(&f))
        .collect())
}
