//! Filter clauses and multi-value column encoding for a music track library.
//!
//! - [`multi_value`] packs ordered lists (artists, genres) into one text column.
//! - [`clause_builder`] builds quote-escaped SQL filter text.
//! - [`clause`] builds the same filters as a typed clause compiled to
//!   parameterized SQL.
//! - [`db_manager`] is the SQLite track store that uses both.

pub mod clause;
pub mod clause_builder;
pub mod cli;
pub mod config;
pub mod config_persistence;
pub mod db_manager;
pub mod multi_value;
pub mod protocol;
