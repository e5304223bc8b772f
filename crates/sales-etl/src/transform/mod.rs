//! Transformation stages: per-source cleaning, merge and enrichment.
//!
//! Each stage consumes its input dataset and produces a new one; nothing
//! is mutated in place across stage boundaries. Cleaning functions run a
//! lenient entry gate (violations logged and returned) and a hard exit
//! gate (violations abort the stage).

mod enrich;
mod products;
mod sales;

pub use enrich::{enrich, merge};
pub use products::clean_products;
pub use sales::clean_sales;

use polars::prelude::*;

use crate::error::Result;

/// Rebuild a string column by applying `f` to every non-null value.
pub(crate) fn map_string_column(
    df: &mut DataFrame,
    name: &str,
    f: impl Fn(&str) -> String,
) -> Result<()> {
    let series = df.column(name)?.as_materialized_series().clone();
    let values = series.str()?;

    let mut rebuilt: Vec<Option<String>> = Vec::with_capacity(values.len());
    for opt_val in values.into_iter() {
        rebuilt.push(opt_val.map(&f));
    }

    df.replace(name, Series::new(name.into(), rebuilt))?;
    Ok(())
}

/// Drop rows that are null in any of the given subset columns.
pub(crate) fn drop_null_rows(df: DataFrame, subset: &[&str]) -> Result<DataFrame> {
    let mut mask: Option<BooleanChunked> = None;
    for name in subset {
        let not_null = df.column(name)?.as_materialized_series().is_not_null();
        mask = Some(match mask {
            Some(acc) => acc & not_null,
            None => not_null,
        });
    }
    match mask {
        Some(mask) => Ok(df.filter(&mask)?),
        None => Ok(df),
    }
}

/// Cast a column to the canonical dtype the downstream schema expects.
///
/// Sources disagree on numeric widths (a discount column of whole
/// numbers arrives as integers); the cleaning stages coerce explicitly
/// rather than letting the exit gate reject usable data.
pub(crate) fn coerce_column(df: &mut DataFrame, name: &str, dtype: &DataType) -> Result<()> {
    let series = df.column(name)?.as_materialized_series();
    if series.dtype() != dtype {
        let casted = series.cast(dtype)?;
        df.replace(name, casted)?;
    }
    Ok(())
}
