//! Table definitions and SQLite DDL rendering.
//!
//! A `TableInfo` is the compiled, column-level description of one
//! table. The ORM's schema compiler produces one per model; this
//! crate consumes it when rendering statements and can render a
//! `CREATE TABLE` for schema bootstrap.

use std::fmt::Write as _;

/// The shape of a single column, independent of any validation rules.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnShape {
    /// 64-bit integer.
    Integer,
    /// Double-precision float.
    Float,
    /// Bounded text (`max_length` is advisory on SQLite).
    Varchar(usize),
    /// Unbounded text.
    Text,
    /// Boolean, stored as 0/1.
    Boolean,
    /// Date and time, stored as ISO-8601 text.
    DateTime,
    /// Date only.
    Date,
    /// Time only.
    Time,
    /// JSON document, stored as text.
    Json,
    /// Enumeration over a fixed set of string variants.
    Enum(Vec<String>),
    /// Array of strings, stored as a JSON text array.
    StringArray,
}

impl ColumnShape {
    /// Returns the SQLite storage type name.
    #[must_use]
    pub const fn sqlite_name(&self) -> &'static str {
        match self {
            Self::Integer | Self::Boolean => "INTEGER",
            Self::Float => "REAL",
            Self::Varchar(_)
            | Self::Text
            | Self::DateTime
            | Self::Date
            | Self::Time
            | Self::Json
            | Self::Enum(_)
            | Self::StringArray => "TEXT",
        }
    }
}

/// One column of a table definition.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    /// Column name.
    pub name: String,
    /// Storage shape.
    pub shape: ColumnShape,
    /// Whether NULL is allowed. Primary keys are never nullable.
    pub nullable: bool,
    /// Whether a UNIQUE constraint applies.
    pub unique: bool,
    /// Whether an index should be created.
    pub index: bool,
    /// Whether this column is the primary key.
    pub primary_key: bool,
}

impl ColumnDef {
    /// Creates a non-null, non-unique, non-indexed column.
    #[must_use]
    pub const fn new(name: String, shape: ColumnShape) -> Self {
        Self {
            name,
            shape,
            nullable: false,
            unique: false,
            index: false,
            primary_key: false,
        }
    }
}

/// A compiled table definition: ordered columns plus the primary key.
#[derive(Debug, Clone, PartialEq)]
pub struct TableInfo {
    /// SQL table name.
    pub name: String,
    /// Columns in declaration order.
    pub columns: Vec<ColumnDef>,
    /// Name of the primary-key column.
    pub primary_key: String,
}

impl TableInfo {
    /// Returns the column with the given name, if any.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Renders a `CREATE TABLE IF NOT EXISTS` statement for SQLite.
    ///
    /// Integer primary keys become rowid aliases, so the store
    /// assigns identifiers for inserts that omit the key.
    #[must_use]
    pub fn create_sql(&self) -> String {
        let mut parts = Vec::with_capacity(self.columns.len());
        for col in &self.columns {
            let mut part = format!("{} {}", col.name, col.shape.sqlite_name());
            if col.primary_key {
                part.push_str(" PRIMARY KEY");
                if col.shape == ColumnShape::Integer {
                    part.push_str(" AUTOINCREMENT");
                }
            } else if !col.nullable {
                part.push_str(" NOT NULL");
            }
            if col.unique && !col.primary_key {
                part.push_str(" UNIQUE");
            }
            if let ColumnShape::Enum(variants) = &col.shape {
                let quoted: Vec<String> = variants
                    .iter()
                    .map(|v| format!("'{}'", v.replace('\'', "''")))
                    .collect();
                let _ = write!(part, " CHECK ({} IN ({}))", col.name, quoted.join(", "));
            }
            parts.push(part);
        }
        format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            self.name,
            parts.join(", ")
        )
    }

    /// Renders `CREATE INDEX` statements for the indexed columns.
    #[must_use]
    pub fn index_sql(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| c.index && !c.primary_key && !c.unique)
            .map(|c| {
                format!(
                    "CREATE INDEX IF NOT EXISTS idx_{table}_{col} ON {table} ({col})",
                    table = self.name,
                    col = c.name
                )
            })
            .collect()
    }
}
