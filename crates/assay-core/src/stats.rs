//! Column statistics over CSV files (plain or inside a ZIP)

use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::aggregate::parse_amount;
use crate::error::{Error, Result};
use crate::models::Operation;
use crate::table::Table;

/// Numeric view of one column
#[derive(Debug, Clone, Serialize)]
pub struct ColumnSummary {
    pub column: String,
    /// Numeric cells, in row order
    pub values: Vec<f64>,
    /// Cells that were empty or not numeric
    pub excluded: usize,
}

/// Load `path`, resolve `column`, and apply `operation`
pub fn compute(path: &Path, operation: Operation, column: &str) -> Result<f64> {
    let table = Table::load(path)?;
    let summary = numeric_column(&table, column)?;
    let result = apply(operation, &summary.values)?;

    info!(
        source = %table.source,
        column = %summary.column,
        operation = %operation,
        count = summary.values.len(),
        excluded = summary.excluded,
        result,
        "Computed column statistic"
    );
    Ok(result)
}

/// Coerce a column to numbers, dropping cells that do not parse
pub fn numeric_column(table: &Table, column: &str) -> Result<ColumnSummary> {
    let cells = table.column(column)?;
    let total = cells.len();
    let values: Vec<f64> = cells.into_iter().filter_map(parse_amount).collect();

    Ok(ColumnSummary {
        column: column.to_string(),
        excluded: total - values.len(),
        values,
    })
}

/// Apply an operation to a non-empty set of values
pub fn apply(operation: Operation, values: &[f64]) -> Result<f64> {
    if values.is_empty() {
        return Err(Error::Computation(format!(
            "Cannot compute {} of a column with no numeric values",
            operation
        )));
    }

    let result = match operation {
        Operation::Sum => values.iter().sum(),
        Operation::Average => values.iter().sum::<f64>() / values.len() as f64,
        Operation::Median => median(values),
        Operation::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        Operation::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
    };
    Ok(result)
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}
