//! Products cleaning and transformation.

use polars::prelude::*;
use tracing::{debug, info};

use crate::error::Result;
use crate::schema::{self, CheckFailure};
use crate::transform::{coerce_column, drop_null_rows, map_string_column};

/// Clean and transform raw products data.
///
/// Brand goes uppercase, category lowercase; rows null in
/// {product_id, rating} and exact duplicates are dropped. None of the
/// product columns need a separator normalization.
///
/// Returns the cleaned dataset together with any entry-gate violations
/// observed (and logged) on the raw input.
pub fn clean_products(raw: DataFrame) -> Result<(DataFrame, Vec<CheckFailure>)> {
    info!("Initiating transformation of products data");

    let (mut df, entry_violations) = schema::products_entry().inspect(raw);

    map_string_column(&mut df, "brand", |val| val.to_uppercase())?;
    map_string_column(&mut df, "category", |val| val.to_lowercase())?;

    coerce_column(&mut df, "product_id", &DataType::Int64)?;
    coerce_column(&mut df, "rating", &DataType::Float64)?;

    let before = df.height();
    let mut df = drop_null_rows(df, &["product_id", "rating"])?;
    df = df.unique::<&str, &str>(None, UniqueKeepStrategy::First, None)?;
    debug!("Dropped {} null/duplicate product rows", before - df.height());

    info!("Done transformation of products data");
    let df = schema::products_outgoing().enforce(df)?;
    Ok((df, entry_violations))
}
