//! Batch ETL transformation core for retail sales analytics.
//!
//! # Overview
//!
//! This library cleans and merges raw sales and product extracts,
//! derives calendar and bucket fields, computes five analytical tables,
//! and validates every intermediate and final dataset against a fixed
//! schema catalog before anything is loaded:
//!
//! - **Schema gates**: each transformation runs a lenient entry check
//!   (violations logged, data passes through) and a hard exit check
//!   (violations abort the run). See [`schema`].
//! - **Cleaning**: per-source normalization for sales and products.
//!   See [`transform`].
//! - **Merge & enrichment**: inner join on `product_id` plus month,
//!   weekday, hour and sales-bucket derivations.
//! - **Aggregations**: five independent analytical tables over the
//!   enriched dataset. See [`analytics`].
//! - **Driver**: [`Pipeline`] sequences the stages between the
//!   [`io::Extractor`] and [`io::Loader`] boundaries.
//!
//! # Quick start
//!
//! ```rust,ignore
//! use sales_etl::{Pipeline, PipelineConfig};
//! use sales_etl::io::{LocalDirExtractor, LocalDirLoader};
//! use std::sync::Arc;
//!
//! let config = PipelineConfig::from_path("config.json")?;
//! let report = Pipeline::builder()
//!     .config(config)
//!     .extractor(Arc::new(LocalDirExtractor))
//!     .loader(Arc::new(LocalDirLoader::new("output")))
//!     .build()?
//!     .run()?;
//!
//! println!("loaded {} tables", report.loads);
//! ```
//!
//! The transformation functions are plain and composable; tests and
//! external orchestrators can call them directly without standing up a
//! driver:
//!
//! ```rust,ignore
//! use sales_etl::transform::{clean_sales, clean_products, merge, enrich};
//! use sales_etl::analytics::sales_revenue_by_region;
//!
//! let (sales, _) = clean_sales(raw_sales)?;
//! let (products, _) = clean_products(raw_products)?;
//! let enriched = enrich(merge(&sales, &products)?)?;
//! let ranking = sales_revenue_by_region(&enriched)?;
//! ```

pub mod analytics;
pub mod config;
pub mod error;
pub mod io;
pub mod pipeline;
pub mod schema;
pub mod transform;
pub mod transport;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use config::{PipelineConfig, SourceConfig, WarehouseConfig, WarehouseTarget};
pub use error::{EtlError, Result, ResultExt};
pub use pipeline::{Pipeline, PipelineBuilder, RunReport};
pub use schema::{CheckFailure, ColumnCheck, ColumnType, Schema, SchemaViolation};
pub use types::{FileKind, SalesBucket};
