//! # ingot-sql
//!
//! SQL expression building and async execution for the ingot ORM.
//!
//! This crate owns everything at the wire level:
//! - [`SqlValue`] — the closed set of values that cross the driver
//!   boundary, with [`ToSqlValue`] conversions
//! - [`TableInfo`] / [`ColumnDef`] / [`ColumnShape`] — compiled table
//!   definitions, plus SQLite DDL rendering for schema bootstrap
//! - [`Predicate`] / [`Join`] — filter expressions over qualified
//!   column references
//! - [`SelectStatement`] / [`InsertStatement`] / [`UpdateStatement`] /
//!   [`DeleteStatement`] — statement descriptions rendered to
//!   parameterized SQL text
//! - [`Database`] / [`Row`] — the async executor over `sqlx` + SQLite
//!
//! The ORM core (`ingot-orm`) builds statement descriptions from its
//! model graph and hands them here; nothing in this crate knows about
//! models, fields, or validation.

mod error;
mod executor;
mod expr;
mod statement;
mod table;
mod value;

pub use error::{Result, SqlError};
pub use executor::{Database, Row};
pub use expr::{ColumnRef, CompareOp, Join, Predicate};
pub use statement::{DeleteStatement, InsertStatement, SelectStatement, UpdateStatement};
pub use table::{ColumnDef, ColumnShape, TableInfo};
pub use value::{SqlValue, ToSqlValue};
