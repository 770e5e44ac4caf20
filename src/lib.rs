//! Aggregate persistence over an embedded SQLite database.
//!
//! An aggregate root ([`models::LegoSet`]) owns at most one child
//! ([`models::Manual`]) that shares its primary key. Every save rewrites the
//! child row wholesale. Table and column names pass through a
//! [`naming::NamingStrategy`] before any statement is built, ids for new roots
//! come from an injectable [`ids::IdSequence`], and pre-save hooks run as an
//! explicit ordered list of [`events::PreSave`] interceptors.

pub mod config;
pub mod convert;
pub mod db;
pub mod demo;
pub mod error;
pub mod events;
pub mod ids;
pub mod models;
pub mod naming;

pub use error::{Result, StoreError};
