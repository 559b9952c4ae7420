//! Model instances: validated value bags bound to a schema.
//!
//! An `Instance` only ever holds values that passed its schema's
//! field validation, so anything read back out is already in the
//! field's value space. Persistence operations live here too: each
//! instance knows how to insert, update, reload, and delete itself.

use std::collections::BTreeMap;
use std::sync::Arc;

use ingot_sql::{
    ColumnRef, CompareOp, Database, DeleteStatement, InsertStatement, Predicate,
    SelectStatement, SqlValue, UpdateStatement,
};
use tracing::debug;

use crate::error::{OrmError, Result};
use crate::queryset::QuerySet;
use crate::row;
use crate::schema::ModelSchema;
use crate::validate;
use crate::value::Value;

static NULL: Value = Value::Null;

/// One record of a model: the schema it belongs to plus its field
/// values.
#[derive(Debug, Clone)]
pub struct Instance {
    schema: Arc<ModelSchema>,
    values: BTreeMap<String, Value>,
    pk_only: bool,
}

impl Instance {
    /// Validates the given values and builds an instance.
    ///
    /// The alias `pk` may be used in place of the primary-key field's
    /// declared name. Fields left out are Null, which fails
    /// validation unless the field is nullable or is the primary key.
    pub fn new(schema: &Arc<ModelSchema>, values: Vec<(String, Value)>) -> Result<Self> {
        let values = values
            .into_iter()
            .map(|(name, value)| {
                if name == "pk" {
                    (schema.pk_name.clone(), value)
                } else {
                    (name, value)
                }
            })
            .collect();
        let validated = validate::validate_instance(schema, values)?;
        Ok(Self {
            schema: Arc::clone(schema),
            values: validated,
            pk_only: false,
        })
    }

    /// Builds a key-only placeholder carrying just the primary key.
    ///
    /// Reading any other field returns Null; [`load`](Self::load)
    /// fills the rest in.
    #[must_use]
    pub fn stub(schema: &Arc<ModelSchema>, pk: Value) -> Self {
        let mut values = BTreeMap::new();
        values.insert(schema.pk_name.clone(), pk);
        Self {
            schema: Arc::clone(schema),
            values,
            pk_only: true,
        }
    }

    /// Rebuilds an instance from stored values, re-validating them.
    pub(crate) fn from_stored(
        schema: &Arc<ModelSchema>,
        values: Vec<(String, Value)>,
    ) -> Result<Self> {
        let validated = validate::validate_instance(schema, values)?;
        Ok(Self {
            schema: Arc::clone(schema),
            values: validated,
            pk_only: false,
        })
    }

    /// The schema this instance belongs to.
    #[must_use]
    pub fn schema(&self) -> &Arc<ModelSchema> {
        &self.schema
    }

    /// Whether this is a key-only placeholder.
    #[must_use]
    pub const fn is_stub(&self) -> bool {
        self.pk_only
    }

    /// Returns a field's value. `pk` reads the primary key whatever
    /// its declared name.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        let name = if field == "pk" {
            self.schema.pk_name.as_str()
        } else {
            field
        };
        self.values.get(name)
    }

    /// Returns the primary-key value, Null when not yet assigned.
    #[must_use]
    pub fn pk(&self) -> &Value {
        self.values.get(&self.schema.pk_name).unwrap_or(&NULL)
    }

    /// Validates and sets one field. `pk` writes the primary key.
    pub fn set(&mut self, field: &str, value: impl Into<Value>) -> Result<()> {
        let name = if field == "pk" {
            self.schema.pk_name.clone()
        } else {
            field.to_string()
        };
        let descriptor = self
            .schema
            .field(&name)
            .ok_or_else(|| OrmError::UnknownField {
                model: self.schema.name.clone(),
                field: name.clone(),
            })?;
        let validated = validate::validate_field(&name, descriptor, value.into())
            .map_err(|e| crate::error::ValidationErrors::new(vec![e]))?;
        self.values.insert(name, validated);
        Ok(())
    }

    /// Renders field values as (column, value) pairs in declaration
    /// order.
    #[must_use]
    pub fn to_row(&self) -> Vec<(String, SqlValue)> {
        self.schema
            .fields
            .iter()
            .map(|(name, _)| {
                let value = self.values.get(name).unwrap_or(&NULL);
                (name.clone(), value.to_sql())
            })
            .collect()
    }

    fn pk_predicate(&self) -> Predicate {
        Predicate::Compare {
            column: ColumnRef::new(self.schema.table.name.clone(), self.schema.pk_name.clone()),
            op: CompareOp::Eq,
            value: self.pk().to_sql(),
        }
    }

    /// Inserts this instance as a new row.
    ///
    /// A Null primary key is omitted from the INSERT and replaced
    /// with the store-assigned identifier afterwards.
    pub async fn insert(&mut self, db: &Database) -> Result<()> {
        let store_assigns = self.pk().is_null();
        let columns: Vec<(String, SqlValue)> = self
            .to_row()
            .into_iter()
            .filter(|(name, _)| !(store_assigns && *name == self.schema.pk_name))
            .collect();
        let (sql, params) =
            InsertStatement::single(self.schema.table.name.clone(), columns).to_sql();
        let rowid = db.execute_insert(&sql, params).await?;
        if store_assigns {
            self.values
                .insert(self.schema.pk_name.clone(), Value::Int(rowid));
        }
        debug!(model = %self.schema.name, pk = ?self.pk(), "inserted row");
        Ok(())
    }

    /// Updates this row in place, validating first.
    ///
    /// When `only_columns` is non-empty, the UPDATE is restricted to
    /// those columns plus whatever `new_values` named; otherwise
    /// every non-key column is written. Returns the affected-row
    /// count. `new_values` are applied to the in-memory instance
    /// only after the statement succeeds; a validation or store
    /// failure leaves it unchanged.
    pub async fn update(
        &mut self,
        db: &Database,
        only_columns: &[&str],
        new_values: Vec<(String, Value)>,
    ) -> Result<u64> {
        let mut validated: Vec<(String, Value)> = Vec::with_capacity(new_values.len());
        for (name, value) in new_values {
            let name = if name == "pk" {
                self.schema.pk_name.clone()
            } else {
                name
            };
            let descriptor =
                self.schema
                    .field(&name)
                    .ok_or_else(|| OrmError::UnknownField {
                        model: self.schema.name.clone(),
                        field: name.clone(),
                    })?;
            let value = validate::validate_field(&name, descriptor, value)
                .map_err(|e| crate::error::ValidationErrors::new(vec![e]))?;
            validated.push((name, value));
        }

        let mut staged = self.values.clone();
        for (name, value) in &validated {
            staged.insert(name.clone(), value.clone());
        }

        let assignments: Vec<(String, SqlValue)> = self
            .schema
            .fields
            .iter()
            .filter(|(name, _)| *name != self.schema.pk_name)
            .filter(|(name, _)| {
                only_columns.is_empty()
                    || only_columns.contains(&name.as_str())
                    || validated.iter().any(|(n, _)| n == name)
            })
            .map(|(name, _)| {
                let value = staged.get(name).unwrap_or(&NULL);
                (name.clone(), value.to_sql())
            })
            .collect();
        if assignments.is_empty() {
            return Ok(0);
        }
        let statement = UpdateStatement {
            table: self.schema.table.name.clone(),
            assignments,
            predicates: vec![self.pk_predicate()],
        };
        let (sql, params) = statement.to_sql();
        let affected = db.execute(&sql, params).await?;
        self.values = staged;
        Ok(affected)
    }

    /// Deletes this row by primary key.
    pub async fn delete(&self, db: &Database) -> Result<()> {
        let statement = DeleteStatement {
            table: self.schema.table.name.clone(),
            predicates: vec![self.pk_predicate()],
        };
        let (sql, params) = statement.to_sql();
        db.execute(&sql, params).await?;
        Ok(())
    }

    /// Refreshes every field from the store by primary key.
    ///
    /// Turns a stub into a full instance. Errors with
    /// [`OrmError::NoMatch`] if the row is gone.
    pub async fn load(&mut self, db: &Database) -> Result<()> {
        let mut statement = SelectStatement::new(self.schema.table.name.clone());
        for (name, _) in &self.schema.fields {
            statement
                .columns
                .push(ColumnRef::new(self.schema.table.name.clone(), name.clone()));
        }
        statement.predicates.push(self.pk_predicate());
        statement.limit = Some(1);
        let (sql, params) = statement.to_sql();
        let fetched = db.fetch_one(&sql, params).await?.ok_or(OrmError::NoMatch)?;
        let loaded = row::from_row(&self.schema, &fetched, &[])?;
        self.values = loaded.values;
        self.pk_only = false;
        Ok(())
    }

    /// Updates the row if it exists, inserts it otherwise.
    ///
    /// An instance without a primary key always inserts. With one,
    /// an UPDATE is tried first; zero affected rows falls through to
    /// INSERT.
    pub async fn upsert(&mut self, db: &Database) -> Result<()> {
        if !self.pk().is_null() {
            let affected = self.update(db, &[], Vec::new()).await?;
            if affected > 0 {
                return Ok(());
            }
        }
        self.insert(db).await
    }

    /// A query over this instance's model.
    #[must_use]
    pub fn objects(&self) -> QuerySet {
        QuerySet::new(&self.schema)
    }
}

impl PartialEq for Instance {
    fn eq(&self, other: &Self) -> bool {
        self.schema.name == other.schema.name
            && self.pk_only == other.pk_only
            && self.values == other.values
    }
}
