//! The validation engine.
//!
//! Validates a set of named values against a model's field
//! descriptors, coercing where documented (JSON string decoding,
//! whitespace stripping, integer-to-float widening) and reporting
//! every violated rule with its field name.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::{FieldError, ValidationErrors};
use crate::fields::{FieldDescriptor, FieldKind};
use crate::schema::ModelSchema;
use crate::value::{Value, DATETIME_FORMAT, DATE_FORMAT, TIME_FORMAT};

/// Validates a full set of construction values against the schema.
///
/// Every declared field is checked; fields not provided are treated
/// as Null. Unknown names are rejected. Errors accumulate across
/// fields so one report covers the whole construction.
pub(crate) fn validate_instance(
    schema: &ModelSchema,
    provided: Vec<(String, Value)>,
) -> Result<BTreeMap<String, Value>, ValidationErrors> {
    let mut incoming: BTreeMap<String, Value> = BTreeMap::new();
    let mut errors = Vec::new();

    for (name, value) in provided {
        if schema.field(&name).is_none() {
            errors.push(FieldError::new(&name, "unknown field"));
        } else {
            incoming.insert(name, value);
        }
    }

    let mut validated = BTreeMap::new();
    for (name, descriptor) in &schema.fields {
        let value = incoming.remove(name).unwrap_or(Value::Null);
        match validate_field(name, descriptor, value) {
            Ok(v) => {
                validated.insert(name.clone(), v);
            }
            Err(e) => errors.push(e),
        }
    }

    if errors.is_empty() {
        Ok(validated)
    } else {
        Err(ValidationErrors::new(errors))
    }
}

/// Validates one value against one descriptor, returning the coerced
/// value.
///
/// Null is accepted for nullable fields and for the primary key
/// (absent before the store assigns an identifier).
pub(crate) fn validate_field(
    name: &str,
    descriptor: &FieldDescriptor,
    value: Value,
) -> Result<Value, FieldError> {
    if value.is_null() {
        if descriptor.allow_null || descriptor.primary_key {
            return Ok(Value::Null);
        }
        return Err(FieldError::new(name, "may not be null"));
    }

    match &descriptor.kind {
        FieldKind::String {
            max_length,
            min_length,
            strip_whitespace,
            pattern,
        } => {
            let Value::String(raw) = value else {
                return Err(FieldError::new(name, "expected a string"));
            };
            let text = if *strip_whitespace {
                raw.trim().to_string()
            } else {
                raw
            };
            let len = text.chars().count();
            if len > *max_length {
                return Err(FieldError::new(
                    name,
                    format!("length must be at most {max_length}"),
                ));
            }
            if let Some(min) = min_length {
                if len < *min {
                    return Err(FieldError::new(
                        name,
                        format!("length must be at least {min}"),
                    ));
                }
            }
            if let Some(re) = pattern {
                if !re.is_match(&text) {
                    return Err(FieldError::new(
                        name,
                        format!("must match pattern '{}'", re.as_str()),
                    ));
                }
            }
            Ok(Value::String(text))
        }
        FieldKind::Text { strip_whitespace } => {
            let Value::String(raw) = value else {
                return Err(FieldError::new(name, "expected a string"));
            };
            Ok(Value::String(if *strip_whitespace {
                raw.trim().to_string()
            } else {
                raw
            }))
        }
        FieldKind::Integer {
            minimum,
            maximum,
            multiple_of,
        } => {
            let Value::Int(n) = value else {
                return Err(FieldError::new(name, "expected an integer"));
            };
            if let Some(min) = minimum {
                if n < *min {
                    return Err(FieldError::new(name, format!("must be at least {min}")));
                }
            }
            if let Some(max) = maximum {
                if n > *max {
                    return Err(FieldError::new(name, format!("must be at most {max}")));
                }
            }
            if let Some(step) = multiple_of {
                if *step != 0 && n % step != 0 {
                    return Err(FieldError::new(
                        name,
                        format!("must be a multiple of {step}"),
                    ));
                }
            }
            Ok(Value::Int(n))
        }
        FieldKind::Float {
            minimum,
            maximum,
            multiple_of,
        } => {
            let f = match value {
                Value::Float(f) => f,
                Value::Int(n) => n as f64,
                _ => return Err(FieldError::new(name, "expected a number")),
            };
            if let Some(min) = minimum {
                if f < *min {
                    return Err(FieldError::new(name, format!("must be at least {min}")));
                }
            }
            if let Some(max) = maximum {
                if f > *max {
                    return Err(FieldError::new(name, format!("must be at most {max}")));
                }
            }
            if let Some(step) = multiple_of {
                if step.abs() > f64::EPSILON && (f % step).abs() > f64::EPSILON {
                    return Err(FieldError::new(
                        name,
                        format!("must be a multiple of {step}"),
                    ));
                }
            }
            Ok(Value::Float(f))
        }
        FieldKind::Boolean => match value {
            Value::Bool(b) => Ok(Value::Bool(b)),
            Value::Int(0) => Ok(Value::Bool(false)),
            Value::Int(1) => Ok(Value::Bool(true)),
            _ => Err(FieldError::new(name, "expected a boolean")),
        },
        FieldKind::DateTime => match value {
            Value::DateTime(dt) => Ok(Value::DateTime(dt)),
            Value::String(s) => NaiveDateTime::parse_from_str(&s, DATETIME_FORMAT)
                .or_else(|_| NaiveDateTime::parse_from_str(&s, "%Y-%m-%dT%H:%M:%S%.f"))
                .map(Value::DateTime)
                .map_err(|_| FieldError::new(name, "malformed datetime")),
            _ => Err(FieldError::new(name, "expected a datetime")),
        },
        FieldKind::Date => match value {
            Value::Date(d) => Ok(Value::Date(d)),
            Value::String(s) => NaiveDate::parse_from_str(&s, DATE_FORMAT)
                .map(Value::Date)
                .map_err(|_| FieldError::new(name, "malformed date")),
            _ => Err(FieldError::new(name, "expected a date")),
        },
        FieldKind::Time => match value {
            Value::Time(t) => Ok(Value::Time(t)),
            Value::String(s) => NaiveTime::parse_from_str(&s, TIME_FORMAT)
                .map(Value::Time)
                .map_err(|_| FieldError::new(name, "malformed time")),
            _ => Err(FieldError::new(name, "expected a time")),
        },
        FieldKind::Json => match value {
            Value::Json(j) => Ok(Value::Json(j)),
            // a string is decoded; failure means malformed content,
            // not a wrong value type
            Value::String(s) => serde_json::from_str(&s)
                .map(Value::Json)
                .map_err(|_| FieldError::new(name, "malformed JSON content")),
            v @ (Value::Bool(_) | Value::Int(_) | Value::Float(_) | Value::List(_)) => {
                Ok(Value::Json(v.to_json()))
            }
            _ => Err(FieldError::new(name, "expected a JSON value")),
        },
        FieldKind::Enum { variants } => {
            let Value::String(s) = value else {
                return Err(FieldError::new(name, "expected an enum variant"));
            };
            if variants.contains(&s) {
                Ok(Value::String(s))
            } else {
                Err(FieldError::new(
                    name,
                    format!("must be one of: {}", variants.join(", ")),
                ))
            }
        }
        FieldKind::ForeignKey { to } => match value {
            Value::Model(instance) => {
                if instance.schema().name == to.name {
                    Ok(Value::Model(instance))
                } else {
                    Err(FieldError::new(
                        name,
                        format!("expected a '{}' instance", to.name),
                    ))
                }
            }
            // a raw key value is accepted; existence is left to the
            // database's own constraint
            v @ (Value::Int(_) | Value::String(_) | Value::Float(_)) => Ok(v),
            _ => Err(FieldError::new(
                name,
                format!("expected a '{}' reference", to.name),
            )),
        },
        FieldKind::StringArray => {
            let Value::List(items) = value else {
                return Err(FieldError::new(name, "expected a list of strings"));
            };
            if items.iter().all(|v| matches!(v, Value::String(_))) {
                Ok(Value::List(items))
            } else {
                Err(FieldError::new(name, "expected a list of strings"))
            }
        }
    }
}
