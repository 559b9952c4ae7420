//! Predicate expressions and WHERE-clause rendering.
//!
//! Predicates reference columns by qualified name so that joined
//! queries stay unambiguous; rendering produces `?` placeholders and
//! the matching parameter list.

use std::fmt;

use crate::value::SqlValue;

/// A table-qualified column reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    /// Owning table name.
    pub table: String,
    /// Column name.
    pub column: String,
}

impl ColumnRef {
    /// Creates a qualified column reference.
    #[must_use]
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
        }
    }

    /// Returns the alias under which this column is selected.
    ///
    /// Fetched rows are keyed by this alias, so lookups survive
    /// identically-named columns across joined tables.
    #[must_use]
    pub fn alias(&self) -> String {
        format!("{}.{}", self.table, self.column)
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table, self.column)
    }
}

/// Comparison operators for `Predicate::Compare`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// Equal (=)
    Eq,
    /// Greater than (>)
    Gt,
    /// Greater than or equal (>=)
    Gte,
    /// Less than (<)
    Lt,
    /// Less than or equal (<=)
    Lte,
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eq => write!(f, "="),
            Self::Gt => write!(f, ">"),
            Self::Gte => write!(f, ">="),
            Self::Lt => write!(f, "<"),
            Self::Lte => write!(f, "<="),
        }
    }
}

/// A filter predicate over one or more columns.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Simple comparison: column op value.
    Compare {
        /// Column to compare.
        column: ColumnRef,
        /// Comparison operator.
        op: CompareOp,
        /// Bound value.
        value: SqlValue,
    },
    /// Membership in a value list.
    InList {
        /// Column to test.
        column: ColumnRef,
        /// Candidate values.
        values: Vec<SqlValue>,
    },
    /// Pattern match. The pattern carries its own wildcards; `%` and
    /// `_` inside it are not escaped, so they keep their LIKE
    /// meaning even when they came from user text.
    ///
    /// SQLite's LIKE is ASCII-case-insensitive, so the flag does not
    /// change the rendering here; it is kept so a case-sensitive
    /// dialect can split the two.
    Like {
        /// Column to match.
        column: ColumnRef,
        /// LIKE pattern, wildcards included.
        pattern: String,
        /// Whether the match is case-insensitive.
        case_insensitive: bool,
    },
    /// Element membership in a JSON-text array column.
    AnyElement {
        /// Array column.
        column: ColumnRef,
        /// Element to look for.
        value: SqlValue,
    },
    /// Conjunction of predicates. A single element passes through
    /// without wrapping.
    And(Vec<Predicate>),
}

impl Predicate {
    /// Renders this predicate to SQL, appending bound parameters.
    #[must_use]
    pub fn to_sql(&self, params: &mut Vec<SqlValue>) -> String {
        match self {
            Self::Compare { column, op, value } => {
                params.push(value.clone());
                format!("{column} {op} ?")
            }
            Self::InList { column, values } => {
                let placeholders: Vec<&str> = values.iter().map(|_| "?").collect();
                params.extend(values.iter().cloned());
                format!("{column} IN ({})", placeholders.join(", "))
            }
            Self::Like {
                column, pattern, ..
            } => {
                params.push(SqlValue::Text(pattern.clone()));
                format!("{column} LIKE ?")
            }
            Self::AnyElement { column, value } => {
                params.push(value.clone());
                format!("EXISTS (SELECT 1 FROM json_each({column}) WHERE json_each.value = ?)")
            }
            Self::And(parts) => match parts.as_slice() {
                [] => String::from("1 = 1"),
                [single] => single.to_sql(params),
                many => {
                    let rendered: Vec<String> =
                        many.iter().map(|p| p.to_sql(params)).collect();
                    rendered.join(" AND ")
                }
            },
        }
    }
}

/// An inner join between the current selection and another table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Join {
    /// Table being joined in.
    pub table: String,
    /// Column on the already-selected side.
    pub left: ColumnRef,
    /// Column on the joined table.
    pub right: ColumnRef,
}

impl Join {
    /// Renders the JOIN clause fragment.
    #[must_use]
    pub fn to_sql(&self) -> String {
        format!("JOIN {} ON {} = {}", self.table, self.left, self.right)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(name: &str) -> ColumnRef {
        ColumnRef::new("users", name)
    }

    #[test]
    fn test_compare() {
        let mut params = Vec::new();
        let sql = Predicate::Compare {
            column: col("name"),
            op: CompareOp::Eq,
            value: SqlValue::Text(String::from("tom")),
        }
        .to_sql(&mut params);
        assert_eq!(sql, "users.name = ?");
        assert_eq!(params, vec![SqlValue::Text(String::from("tom"))]);
    }

    #[test]
    fn test_in_list() {
        let mut params = Vec::new();
        let sql = Predicate::InList {
            column: col("id"),
            values: vec![SqlValue::Int(1), SqlValue::Int(2)],
        }
        .to_sql(&mut params);
        assert_eq!(sql, "users.id IN (?, ?)");
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_like() {
        let mut params = Vec::new();
        let sql = Predicate::Like {
            column: col("name"),
            pattern: String::from("%om%"),
            case_insensitive: true,
        }
        .to_sql(&mut params);
        assert_eq!(sql, "users.name LIKE ?");
        assert_eq!(params, vec![SqlValue::Text(String::from("%om%"))]);
    }

    #[test]
    fn test_any_element() {
        let mut params = Vec::new();
        let sql = Predicate::AnyElement {
            column: col("tags"),
            value: SqlValue::Text(String::from("rust")),
        }
        .to_sql(&mut params);
        assert_eq!(
            sql,
            "EXISTS (SELECT 1 FROM json_each(users.tags) WHERE json_each.value = ?)"
        );
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn test_and_single_passthrough() {
        let mut params = Vec::new();
        let inner = Predicate::Compare {
            column: col("id"),
            op: CompareOp::Gt,
            value: SqlValue::Int(3),
        };
        let sql = Predicate::And(vec![inner]).to_sql(&mut params);
        assert_eq!(sql, "users.id > ?");
    }

    #[test]
    fn test_and_many() {
        let mut params = Vec::new();
        let a = Predicate::Compare {
            column: col("a"),
            op: CompareOp::Eq,
            value: SqlValue::Int(1),
        };
        let b = Predicate::Compare {
            column: col("b"),
            op: CompareOp::Eq,
            value: SqlValue::Int(2),
        };
        let sql = Predicate::And(vec![a, b]).to_sql(&mut params);
        assert_eq!(sql, "users.a = ? AND users.b = ?");
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_join() {
        let join = Join {
            table: String::from("profiles"),
            left: ColumnRef::new("users", "profile"),
            right: ColumnRef::new("profiles", "id"),
        };
        assert_eq!(
            join.to_sql(),
            "JOIN profiles ON users.profile = profiles.id"
        );
    }
}
