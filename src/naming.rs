//! Maps domain type and property names to schema table and column names.
//!
//! Each lookup derives a default name first and then checks the matching
//! alias table with that default as key. Lookups never fail: a miss simply
//! returns the default.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// How a domain name becomes a schema name when no alias applies.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DefaultNaming {
    /// Use the domain name unchanged.
    #[default]
    AsIs,
    /// `LegoSet` becomes `lego_set`, `minAge` becomes `min_age`.
    SnakeCase,
}

impl DefaultNaming {
    pub fn apply(&self, name: &str) -> String {
        match self {
            Self::AsIs => name.to_string(),
            Self::SnakeCase => to_snake_case(name),
        }
    }
}

fn to_snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for c in name.chars() {
        if c.is_uppercase() {
            if prev_lower {
                out.push('_');
            }
            out.extend(c.to_lowercase());
            prev_lower = false;
        } else {
            out.push(c);
            prev_lower = c.is_lowercase() || c.is_ascii_digit();
        }
    }
    out
}

/// Alias tables composed with a default derivation.
///
/// Column aliases are keyed `"<resolved table>.<default column>"`, so an alias
/// for a renamed table must use the renamed table name (`Handbuch.id`, not
/// `Manual.id`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamingStrategy {
    default: DefaultNaming,
    tables: BTreeMap<String, String>,
    columns: BTreeMap<String, String>,
    back_references: BTreeMap<String, String>,
}

impl NamingStrategy {
    pub fn new(default: DefaultNaming) -> Self {
        Self {
            default,
            ..Self::default()
        }
    }

    pub fn with_table_alias(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.tables.insert(from.into(), to.into());
        self
    }

    pub fn with_column_alias(
        mut self,
        table: &str,
        column: &str,
        to: impl Into<String>,
    ) -> Self {
        self.columns.insert(format!("{}.{}", table, column), to.into());
        self
    }

    pub fn with_back_reference_alias(
        mut self,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        self.back_references.insert(from.into(), to.into());
        self
    }

    pub fn default_naming(&self) -> DefaultNaming {
        self.default
    }

    /// Schema table for a domain type.
    pub fn table_name(&self, type_name: &str) -> String {
        let default_name = self.default.apply(type_name);
        lookup(&self.tables, default_name)
    }

    /// Schema column for a property of a (resolved) table.
    pub fn column_name(&self, table: &str, property: &str) -> String {
        let default_name = self.default.apply(property);
        match self.columns.get(&format!("{}.{}", table, default_name)) {
            Some(alias) => alias.clone(),
            None => default_name,
        }
    }

    /// Column on a child row that links back to a root of `root_type`.
    ///
    /// Defaults to the root's resolved table name.
    pub fn back_reference_column(&self, root_type: &str) -> String {
        let default_name = self.table_name(root_type);
        lookup(&self.back_references, default_name)
    }
}

fn lookup(aliases: &BTreeMap<String, String>, default_name: String) -> String {
    aliases.get(&default_name).cloned().unwrap_or(default_name)
}

impl From<&crate::config::NamingConfig> for NamingStrategy {
    fn from(config: &crate::config::NamingConfig) -> Self {
        Self {
            default: config.default_naming,
            tables: config.table_aliases.clone(),
            columns: config.column_aliases.clone(),
            back_references: config.back_reference_aliases.clone(),
        }
    }
}
