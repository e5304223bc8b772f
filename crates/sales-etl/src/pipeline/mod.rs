//! The pipeline driver.
//!
//! Stateless sequencing of the transformation core between the extract
//! and load boundaries: extract → clean (sales, products) → merge →
//! enrich → five aggregations → nine loads. The driver holds no data
//! between runs; every stage consumes its input and produces a fresh
//! dataset.
//!
//! Stages execute sequentially here. The cleaning pair and the five
//! aggregations are pure and independent, so an external orchestrator
//! is free to fan them out; scheduling is its concern, not the core's.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use polars::prelude::DataFrame;
use serde::Serialize;
use tracing::{debug, info};

use crate::analytics::{
    average_sales_and_units_by_bucket, quarterly_sales_by_category, sales_revenue_by_region,
    sales_seasonality, weekly_order_counts_by_status,
};
use crate::config::PipelineConfig;
use crate::error::{EtlError, Result, ResultExt};
use crate::io::{Extractor, Loader};
use crate::transform::{clean_products, clean_sales, enrich, merge};

/// What a completed run did: row counts per stage and the entry-gate
/// violations that were observed and waved through.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub raw_sales_rows: usize,
    pub raw_products_rows: usize,
    pub clean_sales_rows: usize,
    pub clean_products_rows: usize,
    pub enriched_rows: usize,
    /// Aggregate table name -> row count.
    pub aggregate_rows: BTreeMap<String, usize>,
    /// Rendered entry-gate violations (advisory; the run continued).
    pub entry_violations: Vec<String>,
    pub loads: usize,
    pub duration_ms: u128,
}

/// The batch ETL pipeline.
///
/// Built from a [`PipelineConfig`] and the two boundary collaborators;
/// holds no dataset state of its own.
pub struct Pipeline {
    config: PipelineConfig,
    extractor: Arc<dyn Extractor>,
    loader: Arc<dyn Loader>,
}

// The pipeline must be movable into an orchestrator worker.
static_assertions::assert_impl_all!(Pipeline: Send);

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// Execute one batch run end to end.
    ///
    /// Entry-gate violations are logged and recorded in the report; any
    /// exit-gate violation or boundary error aborts the run. There is no
    /// rollback of loads that already completed — retry policy belongs
    /// to the external orchestrator.
    pub fn run(&self) -> Result<RunReport> {
        let start = Instant::now();
        let mut report = RunReport::default();
        let source = &self.config.source;

        info!("Step 1: extracting source files from {}", source.location);
        let mut sales_files = self
            .extractor
            .extract(&source.location, source.sales_kind)?;
        let mut product_files = self
            .extractor
            .extract(&source.location, source.products_kind)?;
        let raw_sales = take_dataset(&mut sales_files, "sales", &source.location)?;
        let raw_products = take_dataset(&mut product_files, "product", &source.location)?;
        report.raw_sales_rows = raw_sales.height();
        report.raw_products_rows = raw_products.height();

        info!("Step 2: cleaning sales and products");
        let (sales, sales_violations) =
            clean_sales(raw_sales).context("sales cleaning stage")?;
        let (products, product_violations) =
            clean_products(raw_products).context("products cleaning stage")?;
        report.clean_sales_rows = sales.height();
        report.clean_products_rows = products.height();
        report.entry_violations.extend(
            sales_violations
                .iter()
                .chain(product_violations.iter())
                .map(|v| v.to_string()),
        );

        info!("Step 3: merge and enrichment");
        let merged = merge(&sales, &products).context("merge stage")?;
        let enriched = enrich(merged).context("enrichment stage")?;
        report.enriched_rows = enriched.height();

        info!("Step 4: analytical aggregations");
        let trends = quarterly_sales_by_category(&enriched)?;
        let ranking = sales_revenue_by_region(&enriched)?;
        let seasonality = sales_seasonality(&enriched)?;
        let status = weekly_order_counts_by_status(&enriched)?;
        let average = average_sales_and_units_by_bucket(&enriched)?;
        for (name, table) in [
            ("trends", &trends),
            ("ranking", &ranking),
            ("seasonality", &seasonality),
            ("status", &status),
            ("average", &average),
        ] {
            report.aggregate_rows.insert(name.to_string(), table.height());
        }

        info!("Step 5: loading checkpoint datasets and aggregates");
        let targets = &self.config.warehouse.targets;
        // The merged target receives the enriched dataset; the merged
        // checkpoint has been a proxy since the source pipeline.
        let loads: [(&DataFrame, &crate::config::WarehouseTarget); 9] = [
            (&sales, &targets.sales),
            (&products, &targets.products),
            (&enriched, &targets.merged),
            (&enriched, &targets.enriched),
            (&trends, &targets.trends),
            (&ranking, &targets.ranking),
            (&seasonality, &targets.seasonality),
            (&status, &targets.status),
            (&average, &targets.average),
        ];
        for (df, target) in loads {
            let destination = target.qualified(&self.config.warehouse.database);
            self.loader.load(df, &destination)?;
            report.loads += 1;
        }

        report.duration_ms = start.elapsed().as_millis();
        info!(
            "Pipeline run complete: {} loads in {} ms",
            report.loads, report.duration_ms
        );
        Ok(report)
    }
}

/// Pick the extracted file whose name contains `needle`.
fn take_dataset(
    files: &mut BTreeMap<String, DataFrame>,
    needle: &str,
    location: &str,
) -> Result<DataFrame> {
    let not_found = || EtlError::NotFound {
        location: location.to_string(),
        kind: needle.to_string(),
    };
    let key = files
        .keys()
        .find(|name| name.to_lowercase().contains(needle))
        .cloned()
        .ok_or_else(not_found)?;
    debug!("Selected {} for the {} dataset", key, needle);
    files.remove(&key).ok_or_else(not_found)
}

/// Builder for [`Pipeline`].
#[derive(Default)]
pub struct PipelineBuilder {
    config: Option<PipelineConfig>,
    extractor: Option<Arc<dyn Extractor>>,
    loader: Option<Arc<dyn Loader>>,
}

impl PipelineBuilder {
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn extractor(mut self, extractor: Arc<dyn Extractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    pub fn loader(mut self, loader: Arc<dyn Loader>) -> Self {
        self.loader = Some(loader);
        self
    }

    pub fn build(self) -> Result<Pipeline> {
        let config = self
            .config
            .ok_or_else(|| EtlError::InvalidConfig("pipeline config is required".into()))?;
        config.validate()?;
        let extractor = self
            .extractor
            .ok_or_else(|| EtlError::InvalidConfig("an extractor is required".into()))?;
        let loader = self
            .loader
            .ok_or_else(|| EtlError::InvalidConfig("a loader is required".into()))?;

        Ok(Pipeline {
            config,
            extractor,
            loader,
        })
    }
}
