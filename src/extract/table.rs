// src/extract/table.rs

use std::collections::HashMap;

/// Lookup key for table and row names: surrounding whitespace is
/// insignificant and matching is case-insensitive.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// One extracted table: labels plus the numeric matrix.
///
/// `values` is row-major and rectangular, one column per header label.
/// `None` marks a cell with no usable numeric value, which is distinct
/// from an explicit zero.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub name: String,
    pub row_labels: Vec<String>,
    pub column_labels: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl Table {
    /// Index of the first row whose normalized label matches `row_name`.
    pub fn row_index(&self, row_name: &str) -> Option<usize> {
        let wanted = normalize_name(row_name);
        self.row_labels
            .iter()
            .position(|label| normalize_name(label) == wanted)
    }
}

/// Extracted tables in source order, with a normalized-name lookup index.
#[derive(Debug, Default)]
pub struct TableSet {
    tables: Vec<Table>,
    index: HashMap<String, usize>,
}

impl TableSet {
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Canonical table names, in the order their title rows appeared.
    pub fn names(&self) -> Vec<String> {
        self.tables.iter().map(|t| t.name.clone()).collect()
    }

    /// Looks up a table by name after normalization.
    pub fn get(&self, name: &str) -> Option<&Table> {
        self.index
            .get(&normalize_name(name))
            .map(|&idx| &self.tables[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Table> {
        self.tables.iter()
    }

    /// Inserts a table, refusing a second one with the same normalized
    /// name. The rejected table is handed back so the caller can report
    /// the conflict.
    pub(super) fn insert(&mut self, table: Table) -> Result<(), Table> {
        let key = normalize_name(&table.name);
        if self.index.contains_key(&key) {
            return Err(table);
        }
        self.index.insert(key, self.tables.len());
        self.tables.push(table);
        Ok(())
    }
}
