//! The fixed schema catalog.
//!
//! Schemas are known at design time; there is no dynamic discovery.
//! Entry schemas describe raw source files as extracted, outgoing
//! schemas describe what each transformation must hand downstream.

use super::{ColumnCheck, ColumnType, Schema};

/// Raw sales extract, column names as they arrive from the source.
pub fn sales_entry() -> Schema {
    Schema::new("sales_entry")
        .column("sales id", ColumnType::Int)
        .column("proDuct Id", ColumnType::Int)
        .column("Region", ColumnType::Str)
        .column("qty", ColumnType::Int)
        .column("Price", ColumnType::Float)
        .column("Time stamp", ColumnType::Str)
        .column("discount", ColumnType::Float)
        .column("order_status", ColumnType::Str)
}

/// Cleaned sales, ready for the merge.
pub fn sales_outgoing() -> Schema {
    Schema::new("sales_outgoing")
        .column("sales_id", ColumnType::Int)
        .column("product_id", ColumnType::Int)
        .column("Region", ColumnType::Str)
        .checked_column("qty", ColumnType::Int, ColumnCheck::GreaterThan(0.0))
        .checked_column("Price", ColumnType::Float, ColumnCheck::GreaterThan(0.0))
        .column("Time_stamp", ColumnType::Datetime)
        .column("discount", ColumnType::Float)
        .column("order_status", ColumnType::Str)
        .column("total_sales", ColumnType::Float)
}

/// Raw products extract.
pub fn products_entry() -> Schema {
    Schema::new("products_entry")
        .column("product_id", ColumnType::Int)
        .column("category", ColumnType::Str)
        .column("brand", ColumnType::Str)
        .column("rating", ColumnType::Float)
        .column("in_stock", ColumnType::Bool)
        .nullable_column("launch_date", ColumnType::Str)
}

/// Cleaned products, ready for the merge.
pub fn products_outgoing() -> Schema {
    Schema::new("products_outgoing")
        .column("product_id", ColumnType::Int)
        .checked_column("category", ColumnType::Str, ColumnCheck::Lowercase)
        .checked_column("brand", ColumnType::Str, ColumnCheck::Uppercase)
        .column("rating", ColumnType::Float)
        .column("in_stock", ColumnType::Bool)
        .nullable_column("launch_date", ColumnType::Str)
}

/// Merged and enriched dataset feeding the analytical fan-out.
pub fn enriched_outgoing() -> Schema {
    Schema::new("enriched_outgoing")
        .column("sales_id", ColumnType::Int)
        .column("product_id", ColumnType::Int)
        .column("Region", ColumnType::Str)
        .column("qty", ColumnType::Int)
        .column("Price", ColumnType::Float)
        .column("Time_stamp", ColumnType::Datetime)
        .column("discount", ColumnType::Float)
        .column("order_status", ColumnType::Str)
        .column("total_sales", ColumnType::Float)
        .column("category", ColumnType::Str)
        .column("brand", ColumnType::Str)
        .column("rating", ColumnType::Float)
        .column("in_stock", ColumnType::Bool)
        .nullable_column("launch_date", ColumnType::Str)
        .column("month", ColumnType::Str)
        .column("weekday", ColumnType::Str)
        .column("hour", ColumnType::Int)
        .column("sales_bucket", ColumnType::Str)
}

pub fn quarterly_sales_outgoing() -> Schema {
    Schema::new("quarterly_sales_outgoing")
        .column("quarter", ColumnType::Str)
        .column("category", ColumnType::Str)
        .column("total_sales", ColumnType::Float)
}

pub fn revenue_by_region_outgoing() -> Schema {
    Schema::new("revenue_by_region_outgoing")
        .column("Region", ColumnType::Str)
        .column("total_sales", ColumnType::Float)
        .column("revenue_share", ColumnType::Float)
        .column("cumulative_revenue_share", ColumnType::Float)
}

pub fn seasonality_outgoing() -> Schema {
    Schema::new("seasonality_outgoing")
        .column("month", ColumnType::Str)
        .column("category", ColumnType::Str)
        .column("monthly_total_sales", ColumnType::Float)
        .column("monthly_total_quantity", ColumnType::Int)
}

/// Weekly order counts, one column per canonical order status.
pub fn weekly_status_outgoing() -> Schema {
    Schema::new("weekly_status_outgoing")
        .column("week", ColumnType::Int)
        .column("Pending", ColumnType::Int)
        .column("Returned", ColumnType::Int)
        .column("Shipped", ColumnType::Int)
}

pub fn bucket_averages_outgoing() -> Schema {
    Schema::new("bucket_averages_outgoing")
        .column("sales_bucket", ColumnType::Str)
        .column("average_sales", ColumnType::Float)
        .column("average_quantity", ColumnType::Float)
}
