//! Async ORM over SQLite: declarative model schemas, validated
//! instances, and a composable query interface.
//!
//! A model is declared once as an ordered list of field descriptors
//! and compiled by [`ModelSchema::build`] into an immutable schema
//! shared for the process lifetime. Instances are validated value
//! bags bound to a schema; queries are built immutably from
//! `field__operator` keywords and executed against an async SQLite
//! pool.
//!
//! ```no_run
//! use ingot_orm::{FieldDescriptor, ModelSchema, values};
//! use ingot_sql::Database;
//!
//! # async fn demo() -> ingot_orm::Result<()> {
//! let note = ModelSchema::build(
//!     "Note",
//!     "notes",
//!     vec![
//!         ("id", FieldDescriptor::integer().primary_key()),
//!         ("text", FieldDescriptor::string(200)),
//!         ("done", FieldDescriptor::boolean()),
//!     ],
//! )?;
//!
//! let db = Database::in_memory().await?;
//! db.execute(&note.table.create_sql(), Vec::new()).await?;
//!
//! let created = note
//!     .objects()
//!     .create(&db, values!("text" => "buy milk", "done" => false))
//!     .await?;
//! let open = note.objects().filter("done", false)?.all(&db).await?;
//! # let _ = (created, open);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod fields;
pub mod lookup;
pub mod model;
pub mod queryset;
pub mod row;
pub mod schema;
mod validate;
pub mod value;

pub use error::{FieldError, OrmError, Result, ValidationErrors};
pub use fields::{FieldDescriptor, FieldKind};
pub use lookup::{Lookup, Operator};
pub use model::Instance;
pub use queryset::QuerySet;
pub use schema::{registry, ModelSchema};
pub use value::Value;
