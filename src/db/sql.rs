//! Statement builders over resolved schema names.

use crate::models::Persistent;
use crate::naming::NamingStrategy;

/// Resolved table and column names for one persisted type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Mapping {
    pub table: String,
    /// In `Persistent::PROPERTIES` order, id column first.
    pub columns: Vec<String>,
}

impl Mapping {
    pub fn of<T: Persistent>(naming: &NamingStrategy) -> Self {
        let table = naming.table_name(T::TYPE_NAME);
        let columns = T::PROPERTIES
            .iter()
            .map(|property| naming.column_name(&table, property))
            .collect();
        Self { table, columns }
    }

    pub fn id_column(&self) -> &str {
        &self.columns[0]
    }

    /// `INSERT` over the given columns.
    pub fn insert(&self, columns: &[&str]) -> String {
        let placeholders = vec!["?"; columns.len()].join(", ");
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote(&self.table),
            quote_all(columns),
            placeholders
        )
    }

    /// `UPDATE` of every non-id column, keyed by the id (last parameter).
    pub fn update(&self) -> String {
        let sets = self.columns[1..]
            .iter()
            .map(|c| format!("{} = ?", quote(c)))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "UPDATE {} SET {} WHERE {} = ?",
            quote(&self.table),
            sets,
            quote(self.id_column())
        )
    }

    pub fn delete_where(&self, column: &str) -> String {
        format!("DELETE FROM {} WHERE {} = ?", quote(&self.table), quote(column))
    }

    /// `table.column` list for a `SELECT` using `alias` as table alias.
    pub fn select_list(&self, alias: &str) -> String {
        self.columns
            .iter()
            .map(|c| format!("{}.{}", alias, quote(c)))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

pub(crate) fn quote(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

fn quote_all(columns: &[&str]) -> String {
    columns.iter().map(|c| quote(c)).collect::<Vec<_>>().join(", ")
}
