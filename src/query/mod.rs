// src/query/mod.rs

use thiserror::Error;

use crate::extract::{Table, TableSet};

/// Request-scoped lookup failures. These map to 4xx responses at the HTTP
/// boundary and are never fatal to the process.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("table '{name}' not found; available tables: {}", .available.join(", "))]
    TableNotFound { name: String, available: Vec<String> },

    #[error("row '{row}' not found in table '{table}'")]
    RowNotFound { table: String, row: String },

    #[error("missing required query parameter '{0}'")]
    MissingParameter(&'static str),
}

/// Owned snapshot of one table's structure. Handing this out never exposes
/// the service's internal state.
#[derive(Debug, Clone, PartialEq)]
pub struct TableDetails {
    pub table_name: String,
    pub row_names: Vec<String>,
    pub column_names: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

/// Read-only query facade over an extracted [`TableSet`].
///
/// Every method is a pure read over the immutable set, so one instance can
/// serve concurrent requests without locking.
pub struct TableQueryService {
    tables: TableSet,
}

impl TableQueryService {
    pub fn new(tables: TableSet) -> Self {
        Self { tables }
    }

    /// Canonical table names in extraction order. Never fails; an empty
    /// set yields an empty list.
    pub fn list_tables(&self) -> Vec<String> {
        self.tables.names()
    }

    /// Structure of the named table. The argument is trimmed and matched
    /// case-insensitively against canonical names.
    pub fn table_details(&self, table_name: &str) -> Result<TableDetails, QueryError> {
        let table = self.lookup(table_name)?;
        Ok(TableDetails {
            table_name: table.name.clone(),
            row_names: table.row_labels.clone(),
            column_names: table.column_labels.clone(),
            values: table.values.clone(),
        })
    }

    /// Sum of the named row's numeric cells. Absent cells contribute
    /// nothing, so a row without a single numeric value sums to zero.
    pub fn row_sum(&self, table_name: &str, row_name: &str) -> Result<f64, QueryError> {
        let table = self.lookup(table_name)?;
        let row = table
            .row_index(row_name)
            .ok_or_else(|| QueryError::RowNotFound {
                table: table.name.clone(),
                row: row_name.trim().to_string(),
            })?;
        Ok(table.values[row].iter().flatten().sum())
    }

    fn lookup(&self, table_name: &str) -> Result<&Table, QueryError> {
        self.tables
            .get(table_name)
            .ok_or_else(|| QueryError::TableNotFound {
                name: table_name.trim().to_string(),
                available: self.tables.names(),
            })
    }
}
