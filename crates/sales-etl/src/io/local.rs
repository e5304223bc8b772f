//! Filesystem-backed implementations of the boundary traits.
//!
//! These stand in for the object-storage and warehouse collaborators so
//! the pipeline can run end to end locally and in tests. Destinations
//! are written as split-orient JSON files, one per table, overwriting
//! whatever was there before.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{EtlError, Result};
use crate::io::{Extractor, Loader};
use crate::transport::{self, values_to_series};
use crate::types::FileKind;

/// Reads source files of a given kind from a local directory.
#[derive(Debug, Default, Clone)]
pub struct LocalDirExtractor;

impl Extractor for LocalDirExtractor {
    fn extract(&self, location: &str, kind: FileKind) -> Result<BTreeMap<String, DataFrame>> {
        let dir = Path::new(location);
        let mut datasets = BTreeMap::new();

        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            let matches_kind = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case(kind.extension()));
            if !matches_kind {
                continue;
            }

            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default()
                .to_string();
            let df = match kind {
                FileKind::Csv => read_csv(&path)?,
                FileKind::Json => read_json_records(&path)?,
            };
            debug!("Extracted {} rows from {}", df.height(), name);
            datasets.insert(name, df);
        }

        if datasets.is_empty() {
            return Err(EtlError::NotFound {
                location: location.to_string(),
                kind: kind.to_string(),
            });
        }

        info!(
            "Extracted {} {} file(s) from {}",
            datasets.len(),
            kind,
            location
        );
        Ok(datasets)
    }
}

fn read_csv(path: &Path) -> Result<DataFrame> {
    Ok(CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?)
}

/// Read a JSON file holding an array of flat record objects.
///
/// Column order follows the first record's (sorted) keys; per-column
/// types are inferred the same way as for the split transport.
fn read_json_records(path: &Path) -> Result<DataFrame> {
    let raw = fs::read_to_string(path)?;
    let records: Vec<serde_json::Map<String, Value>> = serde_json::from_str(&raw)?;

    let Some(first) = records.first() else {
        return Ok(DataFrame::empty());
    };
    let names: Vec<String> = first.keys().cloned().collect();

    let columns: Vec<Column> = names
        .iter()
        .map(|name| {
            let values: Vec<&Value> = records
                .iter()
                .map(|record| record.get(name).unwrap_or(&Value::Null))
                .collect();
            values_to_series(name, &values).into_column()
        })
        .collect();

    Ok(DataFrame::new(columns)?)
}

/// Writes each destination table as a split-orient JSON file.
#[derive(Debug, Clone)]
pub struct LocalDirLoader {
    out_dir: PathBuf,
}

impl LocalDirLoader {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        LocalDirLoader {
            out_dir: out_dir.into(),
        }
    }
}

impl Loader for LocalDirLoader {
    fn load(&self, df: &DataFrame, destination: &str) -> Result<()> {
        if df.height() == 0 {
            return Err(EtlError::EmptyDataset {
                destination: destination.to_string(),
            });
        }

        fs::create_dir_all(&self.out_dir)?;
        let path = self.out_dir.join(format!("{destination}.json"));
        fs::write(&path, transport::to_split_json(df)?)?;
        info!("Loaded {} rows into {}", df.height(), destination);
        Ok(())
    }
}
