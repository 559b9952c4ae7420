//! Row decoding: rebuilding validated instances from fetched rows.
//!
//! Every SELECT aliases its columns to `table.column`, so a single
//! row can carry the root model and any eagerly-joined relations
//! side by side. Decoding walks the relation paths first, then fills
//! the root, so a foreign-key slot holds either a full related
//! instance or a key-only stub.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use ingot_sql::{Row, SqlValue};

use crate::error::{OrmError, Result};
use crate::fields::FieldKind;
use crate::lookup::SEPARATOR;
use crate::model::Instance;
use crate::schema::ModelSchema;
use crate::value::{Value, DATETIME_FORMAT, DATE_FORMAT, TIME_FORMAT};
use std::sync::Arc;

/// Decodes one fetched row into an instance of `schema`, eagerly
/// materializing the relation paths in `related` from the same row.
pub fn from_row(schema: &Arc<ModelSchema>, row: &Row, related: &[String]) -> Result<Instance> {
    // Group the requested paths by their first segment, keeping the
    // remainder for the recursive call.
    let mut values: Vec<(String, Value)> = Vec::with_capacity(schema.fields.len());
    for (name, descriptor) in &schema.fields {
        let nested: Vec<String> = related
            .iter()
            .filter_map(|path| match path.split_once(SEPARATOR) {
                Some((head, rest)) if head == name => Some(rest.to_string()),
                _ => None,
            })
            .collect();
        let eager = !nested.is_empty() || related.iter().any(|path| path == name);

        let value = if let (FieldKind::ForeignKey { to }, true) = (&descriptor.kind, eager) {
            Value::from(from_row(to, row, &nested)?)
        } else {
            let alias = format!("{}.{}", schema.table.name, name);
            let raw = row
                .get(&alias)
                .ok_or_else(|| OrmError::Decode {
                    column: alias.clone(),
                    message: String::from("column missing from result row"),
                })?;
            decode_value(&alias, &descriptor.kind, raw)?
        };
        values.push((name.clone(), value));
    }
    Instance::from_stored(schema, values)
}

/// Converts one stored column value back to its field's value space.
fn decode_value(alias: &str, kind: &FieldKind, raw: &SqlValue) -> Result<Value> {
    if raw.is_null() {
        return Ok(Value::Null);
    }
    let fail = |message: String| OrmError::Decode {
        column: alias.to_string(),
        message,
    };
    Ok(match kind {
        FieldKind::String { .. } | FieldKind::Text { .. } | FieldKind::Enum { .. } => match raw {
            SqlValue::Text(s) => Value::String(s.clone()),
            other => return Err(fail(format!("expected text, got {other:?}"))),
        },
        FieldKind::Integer { .. } => match raw {
            SqlValue::Int(i) => Value::Int(*i),
            other => return Err(fail(format!("expected an integer, got {other:?}"))),
        },
        FieldKind::Float { .. } => match raw {
            SqlValue::Float(f) => Value::Float(*f),
            SqlValue::Int(i) => Value::Float(*i as f64),
            other => return Err(fail(format!("expected a float, got {other:?}"))),
        },
        FieldKind::Boolean => match raw {
            SqlValue::Bool(b) => Value::Bool(*b),
            SqlValue::Int(i) => Value::Bool(*i != 0),
            other => return Err(fail(format!("expected a boolean, got {other:?}"))),
        },
        FieldKind::DateTime => match raw {
            SqlValue::Text(s) => NaiveDateTime::parse_from_str(s, DATETIME_FORMAT)
                .map(Value::DateTime)
                .map_err(|e| fail(format!("malformed datetime: {e}")))?,
            other => return Err(fail(format!("expected a datetime, got {other:?}"))),
        },
        FieldKind::Date => match raw {
            SqlValue::Text(s) => NaiveDate::parse_from_str(s, DATE_FORMAT)
                .map(Value::Date)
                .map_err(|e| fail(format!("malformed date: {e}")))?,
            other => return Err(fail(format!("expected a date, got {other:?}"))),
        },
        FieldKind::Time => match raw {
            SqlValue::Text(s) => NaiveTime::parse_from_str(s, TIME_FORMAT)
                .map(Value::Time)
                .map_err(|e| fail(format!("malformed time: {e}")))?,
            other => return Err(fail(format!("expected a time, got {other:?}"))),
        },
        FieldKind::Json => match raw {
            SqlValue::Text(s) => serde_json::from_str(s)
                .map(Value::Json)
                .map_err(|e| fail(format!("malformed JSON content: {e}")))?,
            other => return Err(fail(format!("expected JSON text, got {other:?}"))),
        },
        FieldKind::StringArray => match raw {
            SqlValue::Text(s) => {
                let items: Vec<String> = serde_json::from_str(s)
                    .map_err(|e| fail(format!("malformed JSON content: {e}")))?;
                Value::List(items.into_iter().map(Value::String).collect())
            }
            other => return Err(fail(format!("expected JSON text, got {other:?}"))),
        },
        // Not eagerly loaded: carry the key as a stub instance.
        FieldKind::ForeignKey { to } => {
            let pk_kind = to
                .field(&to.pk_name)
                .map(|d| d.kind.clone())
                .ok_or_else(|| fail(String::from("related model has no primary key field")))?;
            let key = decode_value(alias, &pk_kind, raw)?;
            Value::from(Instance::stub(to, key))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::FieldDescriptor;

    fn text(s: &str) -> SqlValue {
        SqlValue::Text(String::from(s))
    }

    fn note_schema() -> Arc<ModelSchema> {
        ModelSchema::build(
            "RowNote",
            "row_notes",
            vec![
                ("id", FieldDescriptor::integer().primary_key()),
                ("body", FieldDescriptor::string(200)),
                ("done", FieldDescriptor::boolean()),
                ("tags", FieldDescriptor::string_array()),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_decodes_plain_row() {
        let schema = note_schema();
        let row = Row::from_pairs(vec![
            (String::from("row_notes.id"), SqlValue::Int(1)),
            (String::from("row_notes.body"), text("hello")),
            (String::from("row_notes.done"), SqlValue::Int(1)),
            (String::from("row_notes.tags"), text(r#"["a","b"]"#)),
        ]);
        let note = from_row(&schema, &row, &[]).unwrap();
        assert_eq!(note.get("body").and_then(Value::as_str), Some("hello"));
        assert_eq!(note.get("done"), Some(&Value::Bool(true)));
        assert_eq!(
            note.get("tags"),
            Some(&Value::List(vec![
                Value::String(String::from("a")),
                Value::String(String::from("b")),
            ]))
        );
    }

    #[test]
    fn test_missing_column_errors() {
        let schema = note_schema();
        let row = Row::from_pairs(vec![(String::from("row_notes.id"), SqlValue::Int(1))]);
        assert!(matches!(
            from_row(&schema, &row, &[]),
            Err(OrmError::Decode { .. })
        ));
    }

    #[test]
    fn test_unjoined_foreign_key_becomes_stub() {
        let author = ModelSchema::build(
            "RowAuthor",
            "row_authors",
            vec![
                ("id", FieldDescriptor::integer().primary_key()),
                ("name", FieldDescriptor::string(100)),
            ],
        )
        .unwrap();
        let post = ModelSchema::build(
            "RowPost",
            "row_posts",
            vec![
                ("id", FieldDescriptor::integer().primary_key()),
                ("author", FieldDescriptor::foreign_key(&author)),
            ],
        )
        .unwrap();
        let row = Row::from_pairs(vec![
            (String::from("row_posts.id"), SqlValue::Int(3)),
            (String::from("row_posts.author"), SqlValue::Int(9)),
        ]);
        let post_row = from_row(&post, &row, &[]).unwrap();
        let stub = post_row.get("author").and_then(Value::as_model).unwrap();
        assert!(stub.is_stub());
        assert_eq!(stub.pk(), &Value::Int(9));
    }

    #[test]
    fn test_joined_foreign_key_materializes() {
        let author = ModelSchema::build(
            "RowAuthor2",
            "row_authors2",
            vec![
                ("id", FieldDescriptor::integer().primary_key()),
                ("name", FieldDescriptor::string(100)),
            ],
        )
        .unwrap();
        let post = ModelSchema::build(
            "RowPost2",
            "row_posts2",
            vec![
                ("id", FieldDescriptor::integer().primary_key()),
                ("author", FieldDescriptor::foreign_key(&author)),
            ],
        )
        .unwrap();
        let row = Row::from_pairs(vec![
            (String::from("row_posts2.id"), SqlValue::Int(3)),
            (String::from("row_posts2.author"), SqlValue::Int(9)),
            (String::from("row_authors2.id"), SqlValue::Int(9)),
            (String::from("row_authors2.name"), text("Tom")),
        ]);
        let post_row = from_row(&post, &row, &[String::from("author")]).unwrap();
        let loaded = post_row.get("author").and_then(Value::as_model).unwrap();
        assert!(!loaded.is_stub());
        assert_eq!(loaded.get("name").and_then(Value::as_str), Some("Tom"));
    }
}
