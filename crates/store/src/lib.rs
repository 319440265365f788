//! SQLite-backed durable log of comparison attempts.

pub mod db;

pub use db::{Database, DbError};
