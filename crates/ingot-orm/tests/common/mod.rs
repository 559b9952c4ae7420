#![allow(dead_code)]

use std::sync::Arc;

use ingot_orm::{FieldDescriptor, ModelSchema};
use ingot_sql::Database;

/// Opens a fresh in-memory database and creates the given tables.
pub async fn database_for(schemas: &[&Arc<ModelSchema>]) -> Database {
    let db = Database::in_memory().await.expect("open in-memory db");
    for schema in schemas {
        db.execute(&schema.table.create_sql(), Vec::new())
            .await
            .unwrap_or_else(|e| panic!("create table {}: {e}", schema.table.name));
        for index in schema.table.index_sql() {
            db.execute(&index, Vec::new())
                .await
                .unwrap_or_else(|e| panic!("create index on {}: {e}", schema.table.name));
        }
    }
    db
}

pub fn author_schema() -> Arc<ModelSchema> {
    ModelSchema::build(
        "Author",
        "authors",
        vec![
            ("id", FieldDescriptor::integer().primary_key()),
            ("name", FieldDescriptor::string(100)),
        ],
    )
    .expect("author schema")
}

pub fn book_schema(author: &Arc<ModelSchema>) -> Arc<ModelSchema> {
    ModelSchema::build(
        "Book",
        "books",
        vec![
            ("id", FieldDescriptor::integer().primary_key()),
            ("title", FieldDescriptor::string(200)),
            ("rating", FieldDescriptor::integer().minimum(1).maximum(5)),
            ("author", FieldDescriptor::foreign_key(author)),
        ],
    )
    .expect("book schema")
}
