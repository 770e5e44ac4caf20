//! Domain models.
//!
//! # Aggregates
//!
//! - [`LegoSet`]: aggregate root owning at most one [`Manual`]. Its id is
//!   assigned by the store on first save and never changes afterwards.
//! - [`Manual`]: owned child sharing the root's primary key. It has no
//!   lifecycle of its own; saving the root replaces it, deleting the root
//!   deletes it.
//! - [`Category`]: single-class aggregate with a database-generated id and a
//!   creation timestamp that is set once.

mod category;
mod lego_set;

pub use category::*;
pub use lego_set::*;

use rusqlite::types::Value;

/// Static mapping metadata for a persisted type.
///
/// `PROPERTIES` lists the persistent properties in column order, identifier
/// first. Computed views (such as the [`crate::convert::Period`] ages) are not
/// properties; their plain backing values are.
pub trait Persistent {
    const TYPE_NAME: &'static str;
    const PROPERTIES: &'static [&'static str];

    /// Column values in `PROPERTIES` order.
    fn values(&self) -> Vec<Value>;
}
