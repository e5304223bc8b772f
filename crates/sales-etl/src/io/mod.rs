//! Boundary contracts for the external extract and load collaborators.
//!
//! The core never talks to object storage or the warehouse directly;
//! it consumes these narrow traits. Connection management, retries and
//! scheduling live with the implementations, outside the core.

mod local;

pub use local::{LocalDirExtractor, LocalDirLoader};

use std::collections::BTreeMap;

use polars::prelude::DataFrame;

use crate::error::Result;
use crate::types::FileKind;

/// Extract boundary: read every matching file under a source location.
///
/// Returns a mapping of file name to dataset. Implementations must fail
/// with [`EtlError::NotFound`](crate::EtlError::NotFound) when zero
/// files match and
/// [`EtlError::UnsupportedFormat`](crate::EtlError::UnsupportedFormat)
/// for a file kind they cannot read.
pub trait Extractor: Send + Sync {
    fn extract(&self, location: &str, kind: FileKind) -> Result<BTreeMap<String, DataFrame>>;
}

/// Load boundary: persist a dataset into a destination table.
///
/// Overwrite semantics: the destination's previous contents are
/// replaced. Implementations must fail with
/// [`EtlError::EmptyDataset`](crate::EtlError::EmptyDataset) for a
/// zero-row dataset.
pub trait Loader: Send + Sync {
    fn load(&self, df: &DataFrame, destination: &str) -> Result<()>;
}
