//! Schema gates for validating datasets at stage boundaries.
//!
//! A [`Schema`] is an ordered set of column rules (name, type category,
//! nullability, optional value check). It is applied in one of two modes:
//!
//! - [`Schema::enforce`] — exit gate. Any violation is fatal and surfaces
//!   as a [`SchemaViolation`] carrying the failing columns and offending
//!   row indices. Nothing is coerced.
//! - [`Schema::inspect`] — entry gate. Violations are logged and returned
//!   alongside the untouched dataset so the caller can continue with
//!   unvalidated data. This asymmetry is intentional: entry checks are
//!   advisory, exit checks are hard gates.

mod catalog;

pub use catalog::{
    bucket_averages_outgoing, enriched_outgoing, products_entry, products_outgoing,
    quarterly_sales_outgoing, revenue_by_region_outgoing, sales_entry, sales_outgoing,
    seasonality_outgoing, weekly_status_outgoing,
};

use polars::prelude::*;
use thiserror::Error;
use tracing::warn;

/// How many offending row indices a single failure records.
const MAX_FAILURE_ROWS: usize = 10;

/// Expected type category for a column.
///
/// Matching is by category rather than exact width: any integer dtype
/// satisfies `Int`, any float dtype satisfies `Float`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Int,
    Float,
    Str,
    Bool,
    Datetime,
}

impl ColumnType {
    /// Check whether a polars dtype falls into this category.
    pub fn matches(&self, dtype: &DataType) -> bool {
        match self {
            ColumnType::Int => matches!(
                dtype,
                DataType::Int8
                    | DataType::Int16
                    | DataType::Int32
                    | DataType::Int64
                    | DataType::UInt8
                    | DataType::UInt16
                    | DataType::UInt32
                    | DataType::UInt64
            ),
            ColumnType::Float => matches!(dtype, DataType::Float32 | DataType::Float64),
            ColumnType::Str => matches!(dtype, DataType::String),
            ColumnType::Bool => matches!(dtype, DataType::Boolean),
            ColumnType::Datetime => matches!(dtype, DataType::Datetime(_, _) | DataType::Date),
        }
    }

    fn label(&self) -> &'static str {
        match self {
            ColumnType::Int => "integer",
            ColumnType::Float => "float",
            ColumnType::Str => "string",
            ColumnType::Bool => "boolean",
            ColumnType::Datetime => "datetime",
        }
    }
}

/// Per-value predicate applied to every non-null value of a column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColumnCheck {
    /// All values must be strictly greater than the threshold.
    GreaterThan(f64),
    /// String values must contain no uppercase characters.
    Lowercase,
    /// String values must contain no lowercase characters.
    Uppercase,
}

/// A single column rule within a schema.
#[derive(Debug, Clone)]
pub struct ColumnSchema {
    pub name: String,
    pub dtype: ColumnType,
    pub nullable: bool,
    pub check: Option<ColumnCheck>,
}

/// One violated rule: the column, what went wrong, and where.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckFailure {
    pub column: String,
    pub reason: String,
    /// Offending row indices, capped at [`MAX_FAILURE_ROWS`].
    pub rows: Vec<usize>,
}

impl std::fmt::Display for CheckFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.rows.is_empty() {
            write!(f, "column '{}': {}", self.column, self.reason)
        } else {
            write!(
                f,
                "column '{}': {} (rows {:?})",
                self.column, self.reason, self.rows
            )
        }
    }
}

/// Fatal exit-gate failure: a dataset did not satisfy a named schema.
#[derive(Error, Debug, Clone)]
#[error("Dataset failed schema '{schema}': {}", format_failures(.failures))]
pub struct SchemaViolation {
    pub schema: String,
    pub failures: Vec<CheckFailure>,
}

impl SchemaViolation {
    pub fn new(schema: impl Into<String>) -> Self {
        SchemaViolation {
            schema: schema.into(),
            failures: Vec::new(),
        }
    }
}

fn format_failures(failures: &[CheckFailure]) -> String {
    failures
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// An ordered, named set of column rules.
#[derive(Debug, Clone)]
pub struct Schema {
    name: String,
    columns: Vec<ColumnSchema>,
}

impl Schema {
    pub fn new(name: impl Into<String>) -> Self {
        Schema {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add a required, non-nullable column with no value check.
    pub fn column(self, name: &str, dtype: ColumnType) -> Self {
        self.push(name, dtype, false, None)
    }

    /// Add a required column that may contain nulls.
    pub fn nullable_column(self, name: &str, dtype: ColumnType) -> Self {
        self.push(name, dtype, true, None)
    }

    /// Add a required, non-nullable column with a value check.
    pub fn checked_column(self, name: &str, dtype: ColumnType, check: ColumnCheck) -> Self {
        self.push(name, dtype, false, Some(check))
    }

    fn push(
        mut self,
        name: &str,
        dtype: ColumnType,
        nullable: bool,
        check: Option<ColumnCheck>,
    ) -> Self {
        self.columns.push(ColumnSchema {
            name: name.to_string(),
            dtype,
            nullable,
            check,
        });
        self
    }

    /// Hard exit gate: validate and pass the dataset through, or fail.
    ///
    /// Columns not named by the schema are ignored.
    pub fn enforce(&self, df: DataFrame) -> Result<DataFrame, SchemaViolation> {
        let failures = self.collect_failures(&df);
        if failures.is_empty() {
            Ok(df)
        } else {
            Err(SchemaViolation {
                schema: self.name.clone(),
                failures,
            })
        }
    }

    /// Advisory entry gate: log violations and pass the dataset through
    /// unvalidated, returning the violations for the caller to record.
    pub fn inspect(&self, df: DataFrame) -> (DataFrame, Vec<CheckFailure>) {
        let failures = self.collect_failures(&df);
        for failure in &failures {
            warn!("Entry schema '{}' violation: {}", self.name, failure);
        }
        (df, failures)
    }

    fn collect_failures(&self, df: &DataFrame) -> Vec<CheckFailure> {
        let mut failures = Vec::new();

        for rule in &self.columns {
            let column = match df.column(&rule.name) {
                Ok(col) => col,
                Err(_) => {
                    failures.push(CheckFailure {
                        column: rule.name.clone(),
                        reason: "required column is missing".to_string(),
                        rows: Vec::new(),
                    });
                    continue;
                }
            };
            let series = column.as_materialized_series();

            if !rule.dtype.matches(series.dtype()) {
                failures.push(CheckFailure {
                    column: rule.name.clone(),
                    reason: format!(
                        "expected {} dtype, found {}",
                        rule.dtype.label(),
                        series.dtype()
                    ),
                    rows: Vec::new(),
                });
                // Value checks assume the declared dtype.
                continue;
            }

            if !rule.nullable {
                let null_count = series.null_count();
                if null_count > 0 {
                    failures.push(CheckFailure {
                        column: rule.name.clone(),
                        reason: format!("{} null values in non-nullable column", null_count),
                        rows: null_rows(series),
                    });
                }
            }

            if let Some(check) = rule.check
                && let Some(failure) = apply_check(series, &rule.name, check)
            {
                failures.push(failure);
            }
        }

        failures
    }
}

/// Collect the first offending null row indices of a series.
fn null_rows(series: &Series) -> Vec<usize> {
    series
        .is_null()
        .into_iter()
        .enumerate()
        .filter(|(_, is_null)| matches!(is_null, Some(true)))
        .map(|(idx, _)| idx)
        .take(MAX_FAILURE_ROWS)
        .collect()
}

/// Apply a value check to every non-null value of a series.
fn apply_check(series: &Series, column: &str, check: ColumnCheck) -> Option<CheckFailure> {
    match check {
        ColumnCheck::GreaterThan(threshold) => {
            let casted = series.cast(&DataType::Float64).ok()?;
            let values = casted.f64().ok()?;
            let mut rows = Vec::new();
            let mut total = 0usize;
            for (idx, opt_val) in values.into_iter().enumerate() {
                if let Some(val) = opt_val
                    && val <= threshold
                {
                    total += 1;
                    if rows.len() < MAX_FAILURE_ROWS {
                        rows.push(idx);
                    }
                }
            }
            (total > 0).then(|| CheckFailure {
                column: column.to_string(),
                reason: format!("{} values not greater than {}", total, threshold),
                rows,
            })
        }
        ColumnCheck::Lowercase => {
            string_check(series, column, "not lowercase", |val| {
                !val.chars().any(|c| c.is_uppercase())
            })
        }
        ColumnCheck::Uppercase => {
            string_check(series, column, "not uppercase", |val| {
                !val.chars().any(|c| c.is_lowercase())
            })
        }
    }
}

fn string_check(
    series: &Series,
    column: &str,
    label: &str,
    predicate: impl Fn(&str) -> bool,
) -> Option<CheckFailure> {
    let values = series.str().ok()?;
    let mut rows = Vec::new();
    let mut total = 0usize;
    for (idx, opt_val) in values.into_iter().enumerate() {
        if let Some(val) = opt_val
            && !predicate(val)
        {
            total += 1;
            if rows.len() < MAX_FAILURE_ROWS {
                rows.push(idx);
            }
        }
    }
    (total > 0).then(|| CheckFailure {
        column: column.to_string(),
        reason: format!("{} values {}", total, label),
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::df;

    fn demo_schema() -> Schema {
        Schema::new("demo")
            .column("id", ColumnType::Int)
            .checked_column("amount", ColumnType::Float, ColumnCheck::GreaterThan(0.0))
            .checked_column("region", ColumnType::Str, ColumnCheck::Lowercase)
            .nullable_column("note", ColumnType::Str)
    }

    #[test]
    fn test_enforce_accepts_valid_dataset() {
        let df = df!(
            "id" => &[1i64, 2],
            "amount" => &[10.0, 2.5],
            "region" => &["north", "south"],
            "note" => &[Some("ok"), None],
        )
        .unwrap();

        assert!(demo_schema().enforce(df).is_ok());
    }

    #[test]
    fn test_enforce_rejects_missing_column() {
        let df = df!(
            "id" => &[1i64],
            "region" => &["north"],
            "note" => &[Some("ok")],
        )
        .unwrap();

        let err = demo_schema().enforce(df).unwrap_err();
        assert_eq!(err.schema, "demo");
        assert_eq!(err.failures.len(), 1);
        assert_eq!(err.failures[0].column, "amount");
        assert!(err.failures[0].reason.contains("missing"));
    }

    #[test]
    fn test_enforce_rejects_wrong_dtype() {
        let df = df!(
            "id" => &["1", "2"],
            "amount" => &[10.0, 2.5],
            "region" => &["north", "south"],
            "note" => &[Some("ok"), None],
        )
        .unwrap();

        let err = demo_schema().enforce(df).unwrap_err();
        assert!(err.failures[0].reason.contains("expected integer"));
    }

    #[test]
    fn test_enforce_rejects_nulls_with_row_indices() {
        let df = df!(
            "id" => &[Some(1i64), None, Some(3)],
            "amount" => &[10.0, 2.5, 3.0],
            "region" => &["north", "south", "east"],
            "note" => &[None::<&str>, None, None],
        )
        .unwrap();

        let err = demo_schema().enforce(df).unwrap_err();
        let failure = &err.failures[0];
        assert_eq!(failure.column, "id");
        assert_eq!(failure.rows, vec![1]);
    }

    #[test]
    fn test_greater_than_check_reports_offending_rows() {
        let df = df!(
            "id" => &[1i64, 2, 3],
            "amount" => &[10.0, 0.0, -5.0],
            "region" => &["north", "south", "east"],
            "note" => &[None::<&str>, None, None],
        )
        .unwrap();

        let err = demo_schema().enforce(df).unwrap_err();
        let failure = &err.failures[0];
        assert_eq!(failure.column, "amount");
        assert_eq!(failure.rows, vec![1, 2]);
    }

    #[test]
    fn test_case_checks() {
        let df = df!(
            "id" => &[1i64, 2],
            "amount" => &[10.0, 2.5],
            "region" => &["north", "South"],
            "note" => &[None::<&str>, None],
        )
        .unwrap();

        let err = demo_schema().enforce(df).unwrap_err();
        assert_eq!(err.failures[0].column, "region");
        assert_eq!(err.failures[0].rows, vec![1]);
    }

    #[test]
    fn test_inspect_passes_dataset_through() {
        let df = df!(
            "id" => &["not an int"],
            "amount" => &[-1.0],
            "region" => &["NORTH"],
            "note" => &[Some("x")],
        )
        .unwrap();
        let rows = df.height();

        let (passed, failures) = demo_schema().inspect(df);
        assert_eq!(passed.height(), rows);
        assert!(failures.len() >= 2);
    }

    #[test]
    fn test_extra_columns_are_ignored() {
        let df = df!(
            "id" => &[1i64],
            "amount" => &[10.0],
            "region" => &["north"],
            "note" => &[Some("ok")],
            "extra" => &[99i64],
        )
        .unwrap();

        assert!(demo_schema().enforce(df).is_ok());
    }
}
