//! Pipeline configuration.
//!
//! A static mapping of source location, destination identifiers and
//! connection identifiers for the external collaborators. Read once at
//! pipeline construction and treated as immutable for the run — no
//! process-wide mutable state.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EtlError, Result};
use crate::types::FileKind;

/// Where the raw source files live and how each source is encoded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Source location handed to the extract boundary (bucket/folder or
    /// local directory, depending on the extractor implementation).
    pub location: String,
    /// File kind of the sales extract.
    #[serde(default = "default_sales_kind")]
    pub sales_kind: FileKind,
    /// File kind of the products extract.
    #[serde(default = "default_products_kind")]
    pub products_kind: FileKind,
    /// Connection identifier for the extract collaborator.
    #[serde(default)]
    pub conn_id: Option<String>,
}

fn default_sales_kind() -> FileKind {
    FileKind::Csv
}

fn default_products_kind() -> FileKind {
    FileKind::Json
}

/// One warehouse destination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarehouseTarget {
    pub schema: String,
    pub table: String,
}

impl WarehouseTarget {
    /// Fully qualified destination identifier.
    pub fn qualified(&self, database: &str) -> String {
        format!("{}.{}.{}", database, self.schema, self.table)
    }
}

/// The nine destinations: four checkpoint datasets plus five aggregates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarehouseTargets {
    pub sales: WarehouseTarget,
    pub products: WarehouseTarget,
    pub merged: WarehouseTarget,
    pub enriched: WarehouseTarget,
    pub trends: WarehouseTarget,
    pub ranking: WarehouseTarget,
    pub seasonality: WarehouseTarget,
    pub status: WarehouseTarget,
    pub average: WarehouseTarget,
}

impl WarehouseTargets {
    fn all(&self) -> [&WarehouseTarget; 9] {
        [
            &self.sales,
            &self.products,
            &self.merged,
            &self.enriched,
            &self.trends,
            &self.ranking,
            &self.seasonality,
            &self.status,
            &self.average,
        ]
    }
}

/// Warehouse side of the configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarehouseConfig {
    /// Connection identifier for the load collaborator.
    pub conn_id: String,
    pub database: String,
    pub targets: WarehouseTargets,
}

/// Complete pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub source: SourceConfig,
    pub warehouse: WarehouseConfig,
}

impl PipelineConfig {
    /// Load and validate a configuration from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let config: PipelineConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every identifier the run will need is present.
    pub fn validate(&self) -> Result<()> {
        if self.source.location.trim().is_empty() {
            return Err(EtlError::InvalidConfig("source.location is empty".into()));
        }
        if self.warehouse.database.trim().is_empty() {
            return Err(EtlError::InvalidConfig("warehouse.database is empty".into()));
        }
        for target in self.warehouse.targets.all() {
            if target.schema.trim().is_empty() || target.table.trim().is_empty() {
                return Err(EtlError::InvalidConfig(
                    "warehouse target with empty schema or table".into(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_json() -> String {
        r#"{
            "source": { "location": "landing/raw" },
            "warehouse": {
                "conn_id": "my_warehouse_conn",
                "database": "analytics",
                "targets": {
                    "sales": { "schema": "staging", "table": "sales_clean" },
                    "products": { "schema": "staging", "table": "products_clean" },
                    "merged": { "schema": "staging", "table": "merged" },
                    "enriched": { "schema": "staging", "table": "enriched" },
                    "trends": { "schema": "marts", "table": "quarterly_sales" },
                    "ranking": { "schema": "marts", "table": "revenue_by_region" },
                    "seasonality": { "schema": "marts", "table": "seasonality" },
                    "status": { "schema": "marts", "table": "weekly_status" },
                    "average": { "schema": "marts", "table": "bucket_averages" }
                }
            }
        }"#
        .to_string()
    }

    #[test]
    fn test_parse_with_defaults() {
        let config: PipelineConfig = serde_json::from_str(&sample_json()).unwrap();
        assert_eq!(config.source.sales_kind, FileKind::Csv);
        assert_eq!(config.source.products_kind, FileKind::Json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_qualified_destination() {
        let config: PipelineConfig = serde_json::from_str(&sample_json()).unwrap();
        assert_eq!(
            config.warehouse.targets.trends.qualified("analytics"),
            "analytics.marts.quarterly_sales"
        );
    }

    #[test]
    fn test_validate_rejects_empty_location() {
        let mut config: PipelineConfig = serde_json::from_str(&sample_json()).unwrap();
        config.source.location = "  ".into();
        assert!(matches!(
            config.validate(),
            Err(EtlError::InvalidConfig(_))
        ));
    }
}
