//! Model schemas: compilation from field descriptors and the
//! process-wide registry.
//!
//! `ModelSchema::build` is the explicit replacement for class-body
//! introspection: it takes the ordered field declarations, derives
//! the table definition exactly once, and registers it so other
//! models and tooling can resolve it by name.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

use ingot_sql::{ColumnDef, TableInfo};
use tracing::debug;

use crate::error::{OrmError, Result};
use crate::fields::{FieldDescriptor, FieldKind};
use crate::queryset::QuerySet;

/// The compiled schema for one model: ordered field descriptors plus
/// the derived table definition. Built once per model, immutable and
/// shared for the process lifetime.
#[derive(Debug)]
pub struct ModelSchema {
    /// Model name; the registry key.
    pub name: String,
    /// Derived table definition. Column order matches declaration
    /// order.
    pub table: TableInfo,
    /// Field descriptors in declaration order.
    pub fields: Vec<(String, FieldDescriptor)>,
    /// Name of the field flagged primary-key.
    pub pk_name: String,
}

impl ModelSchema {
    /// Compiles a model declaration into a schema and registers it.
    ///
    /// Configuration errors here are fatal for the model:
    /// - zero or more than one primary-key field
    /// - a bounded string field without a positive `max_length`
    pub fn build(
        name: &str,
        table_name: &str,
        fields: Vec<(&str, FieldDescriptor)>,
    ) -> Result<Arc<Self>> {
        let mut pk_name: Option<String> = None;
        for (field_name, descriptor) in &fields {
            if descriptor.primary_key {
                if pk_name.is_some() {
                    return Err(OrmError::Config(format!(
                        "model '{name}' declares more than one primary key"
                    )));
                }
                pk_name = Some((*field_name).to_string());
            }
            if let FieldKind::String { max_length, .. } = &descriptor.kind {
                if *max_length == 0 {
                    return Err(OrmError::Config(format!(
                        "string field '{field_name}' on model '{name}' requires max_length > 0"
                    )));
                }
            }
        }
        let pk_name = pk_name.ok_or_else(|| {
            OrmError::Config(format!("model '{name}' declares no primary key"))
        })?;

        let columns = fields
            .iter()
            .map(|(field_name, descriptor)| ColumnDef {
                name: (*field_name).to_string(),
                shape: descriptor.kind.column_shape(),
                // primary keys are never nullable, whatever the flag says
                nullable: descriptor.allow_null && !descriptor.primary_key,
                unique: descriptor.unique,
                index: descriptor.index,
                primary_key: descriptor.primary_key,
            })
            .collect();

        let schema = Arc::new(Self {
            name: name.to_string(),
            table: TableInfo {
                name: table_name.to_string(),
                columns,
                primary_key: pk_name.clone(),
            },
            fields: fields
                .into_iter()
                .map(|(n, d)| (n.to_string(), d))
                .collect(),
            pk_name,
        });
        registry::register(&schema);
        debug!(model = %schema.name, table = %schema.table.name, "registered model schema");
        Ok(schema)
    }

    /// Returns the descriptor for the named field, if declared.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, d)| d)
    }

    /// Resolves a relation segment to the referenced model.
    ///
    /// Errors distinguish an unknown field from a field that exists
    /// but is not a foreign key.
    pub fn related(&self, field: &str) -> Result<Arc<Self>> {
        let descriptor = self.field(field).ok_or_else(|| OrmError::UnknownField {
            model: self.name.clone(),
            field: field.to_string(),
        })?;
        descriptor
            .kind
            .fk_target()
            .map(Arc::clone)
            .ok_or_else(|| OrmError::InvalidRelation {
                model: self.name.clone(),
                field: field.to_string(),
            })
    }

    /// Returns a fresh query builder over this model.
    #[must_use]
    pub fn objects(self: &Arc<Self>) -> QuerySet {
        QuerySet::new(self)
    }
}

/// Process-wide schema namespace.
///
/// Populated at model-declaration time, before any query activity;
/// read-only afterwards. Re-registering a name replaces the entry,
/// which keeps multi-test processes workable.
pub mod registry {
    use super::{Arc, HashMap, ModelSchema, OnceLock, RwLock, TableInfo};

    static REGISTRY: OnceLock<RwLock<HashMap<String, Arc<ModelSchema>>>> = OnceLock::new();

    fn storage() -> &'static RwLock<HashMap<String, Arc<ModelSchema>>> {
        REGISTRY.get_or_init(|| RwLock::new(HashMap::new()))
    }

    pub(super) fn register(schema: &Arc<ModelSchema>) {
        let mut map = storage().write().unwrap_or_else(std::sync::PoisonError::into_inner);
        map.insert(schema.name.clone(), Arc::clone(schema));
    }

    /// Resolves a registered model by name.
    #[must_use]
    pub fn get(name: &str) -> Option<Arc<ModelSchema>> {
        let map = storage().read().unwrap_or_else(std::sync::PoisonError::into_inner);
        map.get(name).cloned()
    }

    /// Returns every registered table definition.
    #[must_use]
    pub fn tables() -> Vec<TableInfo> {
        let map = storage().read().unwrap_or_else(std::sync::PoisonError::into_inner);
        map.values().map(|s| s.table.clone()).collect()
    }
}
