//! Small shared types used across the pipeline.

use serde::{Deserialize, Serialize};

use crate::error::EtlError;

/// Categorical label derived from a fixed partition of `total_sales`.
///
/// The breakpoints are deliberately constant rather than fitted to the
/// dataset's actual distribution; this is a known limitation carried
/// over from the source analytics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SalesBucket {
    Low,
    Mid,
    High,
}

impl SalesBucket {
    /// Right-closed breakpoints: (0, 100] Low, (100, 500] Mid, (500, inf) High.
    pub const LOW_UPPER: f64 = 100.0;
    pub const MID_UPPER: f64 = 500.0;

    /// Classify a total-sales value. Values at a breakpoint fall into the
    /// lower bucket (100.0 is Low, 500.0 is Mid). Non-positive or NaN
    /// values have no bucket.
    pub fn classify(total_sales: f64) -> Option<SalesBucket> {
        if !total_sales.is_finite() || total_sales <= 0.0 {
            return None;
        }
        if total_sales <= Self::LOW_UPPER {
            Some(SalesBucket::Low)
        } else if total_sales <= Self::MID_UPPER {
            Some(SalesBucket::Mid)
        } else {
            Some(SalesBucket::High)
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SalesBucket::Low => "Low",
            SalesBucket::Mid => "Mid",
            SalesBucket::High => "High",
        }
    }
}

/// Source file format understood by the extract boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Csv,
    Json,
}

impl FileKind {
    pub fn extension(&self) -> &'static str {
        match self {
            FileKind::Csv => "csv",
            FileKind::Json => "json",
        }
    }
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

impl std::str::FromStr for FileKind {
    type Err = EtlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(FileKind::Csv),
            "json" => Ok(FileKind::Json),
            other => Err(EtlError::UnsupportedFormat(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_boundaries() {
        assert_eq!(SalesBucket::classify(100.0), Some(SalesBucket::Low));
        assert_eq!(SalesBucket::classify(100.01), Some(SalesBucket::Mid));
        assert_eq!(SalesBucket::classify(500.0), Some(SalesBucket::Mid));
        assert_eq!(SalesBucket::classify(500.01), Some(SalesBucket::High));
        assert_eq!(SalesBucket::classify(0.5), Some(SalesBucket::Low));
    }

    #[test]
    fn test_bucket_rejects_non_positive() {
        assert_eq!(SalesBucket::classify(0.0), None);
        assert_eq!(SalesBucket::classify(-10.0), None);
        assert_eq!(SalesBucket::classify(f64::NAN), None);
    }

    #[test]
    fn test_file_kind_parsing() {
        assert_eq!("csv".parse::<FileKind>().unwrap(), FileKind::Csv);
        assert_eq!(" JSON ".parse::<FileKind>().unwrap(), FileKind::Json);
        assert!(matches!(
            "parquet".parse::<FileKind>(),
            Err(EtlError::UnsupportedFormat(_))
        ));
    }
}
