use crate::analyzer::stats::{self, Summary};
use crate::etl::loader::RawTable;
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Integer,
    Float,
    Boolean,
    Text,
    /// Every cell is missing.
    Empty,
}

impl ColumnType {
    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Float)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnDiagnostics {
    pub name: String,
    pub dtype: ColumnType,
    pub unique_count: usize,
    pub null_count: usize,
    pub summary: Option<Summary>,
}

/// Type and null report for a raw table. Informational only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostics {
    pub row_count: usize,
    pub columns: Vec<ColumnDiagnostics>,
    pub numeric_columns: Vec<String>,
    pub categorical_columns: Vec<String>,
}

impl Diagnostics {
    pub fn column(&self, name: &str) -> Option<&ColumnDiagnostics> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn total_nulls(&self) -> usize {
        self.columns.iter().map(|c| c.null_count).sum()
    }
}

fn infer_type(cells: &[&str]) -> ColumnType {
    if cells.is_empty() {
        ColumnType::Empty
    } else if cells.iter().all(|c| c.trim().parse::<i64>().is_ok()) {
        ColumnType::Integer
    } else if cells.iter().all(|c| c.trim().parse::<f64>().is_ok()) {
        ColumnType::Float
    } else if cells.iter().all(|c| matches!(c.trim().to_ascii_lowercase().as_str(), "true" | "false")) {
        ColumnType::Boolean
    } else {
        ColumnType::Text
    }
}

/// Per-column type, distinct count, numeric summary and null count.
pub fn analyze_columns(table: &RawTable) -> Diagnostics {
    let mut columns = Vec::with_capacity(table.headers().len());

    for (index, name) in table.headers().iter().enumerate() {
        let present: Vec<&str> = table
            .rows()
            .iter()
            .filter_map(|row| row.get(index).and_then(|cell| cell.as_deref()))
            .collect();
        let dtype = infer_type(&present);
        let unique_count = present.iter().collect::<HashSet<_>>().len();
        let summary = if dtype.is_numeric() {
            let values: Vec<f64> = present.iter().filter_map(|c| c.trim().parse().ok()).collect();
            stats::describe(&values)
        } else {
            None
        };

        columns.push(ColumnDiagnostics {
            name: name.clone(),
            dtype,
            unique_count,
            null_count: table.len() - present.len(),
            summary,
        });
    }

    let numeric_columns = columns.iter().filter(|c| c.dtype.is_numeric()).map(|c| c.name.clone()).collect();
    let categorical_columns = columns.iter().filter(|c| !c.dtype.is_numeric()).map(|c| c.name.clone()).collect();

    Diagnostics {
        row_count: table.len(),
        columns,
        numeric_columns,
        categorical_columns,
    }
}

pub fn log_diagnostics(diagnostics: &Diagnostics) {
    info!(
        "Column diagnostics: {} rows, {} numeric columns, {} categorical columns, {} null cells",
        diagnostics.row_count,
        diagnostics.numeric_columns.len(),
        diagnostics.categorical_columns.len(),
        diagnostics.total_nulls()
    );
    for column in &diagnostics.columns {
        debug!(
            "{}: {:?}, {} unique values, {} nulls",
            column.name, column.dtype, column.unique_count, column.null_count
        );
        if let Some(summary) = &column.summary {
            debug!(
                "{}: mean={:.3} std={:?} min={} q1={} median={} q3={} max={}",
                column.name,
                summary.mean,
                summary.std,
                summary.min,
                summary.q1,
                summary.median,
                summary.q3,
                summary.max
            );
        }
    }
}
