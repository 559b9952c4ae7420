//! Filter-keyword parsing.
//!
//! A keyword like `author__profile__name__icontains` is split on
//! `__`: a trailing operator name, a field name before it, and any
//! leading segments forming the join path walked through foreign
//! keys. Parsing resolves the owning table for the final column and
//! normalizes the value, so the result is ready to drop into a
//! statement.

use std::sync::Arc;

use ingot_sql::{ColumnRef, CompareOp, Predicate, SqlValue};

use crate::error::{OrmError, Result};
use crate::fields::FieldKind;
use crate::schema::ModelSchema;
use crate::value::Value;

/// The lookup path separator.
pub const SEPARATOR: &str = "__";

/// Filter operators, named by their keyword suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// Equality (the default when no suffix is given).
    Exact,
    /// Case-insensitive equality.
    IExact,
    /// Substring match. The value is embedded in a LIKE pattern
    /// as-is, so `%` and `_` in it act as wildcards.
    Contains,
    /// Case-insensitive substring match; same wildcard caveat as
    /// [`Contains`](Self::Contains).
    IContains,
    /// Membership in a supplied collection.
    In,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Gte,
    /// Less than.
    Lt,
    /// Less than or equal.
    Lte,
    /// Element membership in an array column.
    Any,
}

impl Operator {
    /// Parses an operator suffix, if the segment names one.
    #[must_use]
    pub fn parse(segment: &str) -> Option<Self> {
        match segment {
            "exact" => Some(Self::Exact),
            "iexact" => Some(Self::IExact),
            "contains" => Some(Self::Contains),
            "icontains" => Some(Self::IContains),
            "in" => Some(Self::In),
            "gt" => Some(Self::Gt),
            "gte" => Some(Self::Gte),
            "lt" => Some(Self::Lt),
            "lte" => Some(Self::Lte),
            "any" => Some(Self::Any),
            _ => None,
        }
    }
}

/// A parsed filter keyword: the relation path it implies plus the
/// ready-to-render predicate.
#[derive(Debug, Clone)]
pub struct Lookup {
    /// Dotted relation path the filter traverses, if any. The query
    /// builder merges it into its join-path set.
    pub join_path: Option<String>,
    /// The predicate for the WHERE clause.
    pub predicate: Predicate,
}

/// Parses one `field__operator` keyword against a model.
///
/// Unknown fields and unresolvable relation segments error here, at
/// query-build time.
pub fn parse(schema: &Arc<ModelSchema>, keyword: &str, value: Value) -> Result<Lookup> {
    let parts: Vec<&str> = keyword.split(SEPARATOR).collect();

    let (op, field_name, related_parts) = match parts.as_slice() {
        [] | [""] => {
            return Err(OrmError::UnknownField {
                model: schema.name.clone(),
                field: keyword.to_string(),
            })
        }
        [single] => (Operator::Exact, *single, &parts[..0]),
        [init @ .., last] => match Operator::parse(last) {
            Some(op) => {
                let [head @ .., field] = init else {
                    return Err(OrmError::UnknownField {
                        model: schema.name.clone(),
                        field: keyword.to_string(),
                    });
                };
                (op, *field, head)
            }
            None => (Operator::Exact, *last, init),
        },
    };

    // Walk the relation segments to the model owning the column.
    let mut target = Arc::clone(schema);
    for part in related_parts {
        target = target.related(part)?;
    }
    // `pk` names the primary key whatever the declared field name is
    let field_name = if field_name == "pk" {
        target.pk_name.as_str()
    } else {
        field_name
    };
    let descriptor = target
        .field(field_name)
        .ok_or_else(|| OrmError::UnknownField {
            model: target.name.clone(),
            field: field_name.to_string(),
        })?;

    if op == Operator::Any && !matches!(descriptor.kind, FieldKind::StringArray) {
        return Err(OrmError::InvalidFilter {
            field: field_name.to_string(),
            message: String::from("'any' applies to array fields"),
        });
    }

    let column = ColumnRef::new(target.table.name.clone(), field_name);

    // A model instance compares by its primary-key value.
    let value = match value {
        Value::Model(instance) => instance.pk().clone(),
        other => other,
    };

    let predicate = build_predicate(field_name, column, op, value)?;

    let join_path = if related_parts.is_empty() {
        None
    } else {
        Some(related_parts.join(SEPARATOR))
    };

    Ok(Lookup {
        join_path,
        predicate,
    })
}

fn build_predicate(
    field: &str,
    column: ColumnRef,
    op: Operator,
    value: Value,
) -> Result<Predicate> {
    let compare = |op: CompareOp, value: Value| Predicate::Compare {
        column: column.clone(),
        op,
        value: value.to_sql(),
    };

    Ok(match op {
        Operator::Exact => compare(CompareOp::Eq, value),
        Operator::Gt => compare(CompareOp::Gt, value),
        Operator::Gte => compare(CompareOp::Gte, value),
        Operator::Lt => compare(CompareOp::Lt, value),
        Operator::Lte => compare(CompareOp::Lte, value),
        Operator::IExact => Predicate::Like {
            column,
            pattern: text_value(field, value)?,
            case_insensitive: true,
        },
        Operator::Contains => Predicate::Like {
            column,
            pattern: format!("%{}%", text_value(field, value)?),
            case_insensitive: false,
        },
        Operator::IContains => Predicate::Like {
            column,
            pattern: format!("%{}%", text_value(field, value)?),
            case_insensitive: true,
        },
        Operator::In => {
            let Value::List(items) = value else {
                return Err(OrmError::InvalidFilter {
                    field: field.to_string(),
                    message: String::from("'in' requires a list of values"),
                });
            };
            let values: Vec<SqlValue> = items
                .into_iter()
                .map(|item| match item {
                    Value::Model(instance) => instance.pk().to_sql(),
                    other => other.to_sql(),
                })
                .collect();
            Predicate::InList { column, values }
        }
        Operator::Any => Predicate::AnyElement {
            column,
            value: value.to_sql(),
        },
    })
}

fn text_value(field: &str, value: Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s),
        _ => Err(OrmError::InvalidFilter {
            field: field.to_string(),
            message: String::from("pattern operators require a string value"),
        }),
    }
}
