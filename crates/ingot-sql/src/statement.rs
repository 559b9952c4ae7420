//! Statement builders.
//!
//! Each builder is a plain description of one statement; `to_sql`
//! renders the SQL text and the ordered parameter list. Nothing here
//! touches a connection.

use std::fmt::Write as _;

use crate::expr::{ColumnRef, Join, Predicate};
use crate::value::SqlValue;

/// A SELECT over a root table plus zero or more inner joins.
#[derive(Debug, Clone)]
pub struct SelectStatement {
    /// Root table.
    pub table: String,
    /// Columns to select, in order. Each is aliased to its qualified
    /// name so fetched rows can be keyed unambiguously.
    pub columns: Vec<ColumnRef>,
    /// Joins, in resolution order.
    pub joins: Vec<Join>,
    /// Predicates, combined with AND.
    pub predicates: Vec<Predicate>,
    /// Optional LIMIT.
    pub limit: Option<i64>,
}

impl SelectStatement {
    /// Creates a SELECT over the given table with no columns yet.
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
            joins: Vec::new(),
            predicates: Vec::new(),
            limit: None,
        }
    }

    fn from_clause(&self) -> String {
        let mut sql = self.table.clone();
        for join in &self.joins {
            sql.push(' ');
            sql.push_str(&join.to_sql());
        }
        sql
    }

    fn where_clause(&self, params: &mut Vec<SqlValue>) -> Option<String> {
        if self.predicates.is_empty() {
            return None;
        }
        Some(Predicate::And(self.predicates.clone()).to_sql(params))
    }

    /// Renders the SELECT and its parameters.
    #[must_use]
    pub fn to_sql(&self) -> (String, Vec<SqlValue>) {
        let mut params = Vec::new();
        let cols: Vec<String> = self
            .columns
            .iter()
            .map(|c| format!("{c} AS \"{}\"", c.alias()))
            .collect();
        let mut sql = format!("SELECT {} FROM {}", cols.join(", "), self.from_clause());
        if let Some(clause) = self.where_clause(&mut params) {
            sql.push_str(" WHERE ");
            sql.push_str(&clause);
        }
        if let Some(limit) = self.limit {
            let _ = write!(sql, " LIMIT {limit}");
        }
        (sql, params)
    }

    /// Renders a COUNT(*) over the same FROM and WHERE clauses.
    #[must_use]
    pub fn to_count_sql(&self) -> (String, Vec<SqlValue>) {
        let mut params = Vec::new();
        let mut sql = format!("SELECT COUNT(*) FROM {}", self.from_clause());
        if let Some(clause) = self.where_clause(&mut params) {
            sql.push_str(" WHERE ");
            sql.push_str(&clause);
        }
        (sql, params)
    }

    /// Renders an EXISTS wrapper over the same FROM and WHERE clauses.
    #[must_use]
    pub fn to_exists_sql(&self) -> (String, Vec<SqlValue>) {
        let mut params = Vec::new();
        let mut sql = format!("SELECT EXISTS (SELECT 1 FROM {}", self.from_clause());
        if let Some(clause) = self.where_clause(&mut params) {
            sql.push_str(" WHERE ");
            sql.push_str(&clause);
        }
        sql.push(')');
        (sql, params)
    }
}

/// A (possibly multi-row) INSERT.
#[derive(Debug, Clone)]
pub struct InsertStatement {
    /// Target table.
    pub table: String,
    /// Columns receiving values.
    pub columns: Vec<String>,
    /// Rows to insert; each must match `columns` in length and order.
    pub rows: Vec<Vec<SqlValue>>,
}

impl InsertStatement {
    /// Creates a single-row INSERT from (column, value) pairs.
    #[must_use]
    pub fn single(table: impl Into<String>, values: Vec<(String, SqlValue)>) -> Self {
        let (columns, row): (Vec<String>, Vec<SqlValue>) = values.into_iter().unzip();
        Self {
            table: table.into(),
            columns,
            rows: vec![row],
        }
    }

    /// Renders the INSERT and its parameters.
    #[must_use]
    pub fn to_sql(&self) -> (String, Vec<SqlValue>) {
        let row_placeholders = format!(
            "({})",
            self.columns.iter().map(|_| "?").collect::<Vec<_>>().join(", ")
        );
        let all_rows: Vec<&str> = self.rows.iter().map(|_| row_placeholders.as_str()).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES {}",
            self.table,
            self.columns.join(", "),
            all_rows.join(", ")
        );
        let params = self.rows.iter().flatten().cloned().collect();
        (sql, params)
    }
}

/// An UPDATE of named columns under a predicate.
#[derive(Debug, Clone)]
pub struct UpdateStatement {
    /// Target table.
    pub table: String,
    /// (column, new value) assignments, in order.
    pub assignments: Vec<(String, SqlValue)>,
    /// Predicates, combined with AND.
    pub predicates: Vec<Predicate>,
}

impl UpdateStatement {
    /// Renders the UPDATE and its parameters.
    #[must_use]
    pub fn to_sql(&self) -> (String, Vec<SqlValue>) {
        let mut params: Vec<SqlValue> =
            self.assignments.iter().map(|(_, v)| v.clone()).collect();
        let sets: Vec<String> = self
            .assignments
            .iter()
            .map(|(col, _)| format!("{col} = ?"))
            .collect();
        let mut sql = format!("UPDATE {} SET {}", self.table, sets.join(", "));
        if !self.predicates.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&Predicate::And(self.predicates.clone()).to_sql(&mut params));
        }
        (sql, params)
    }
}

/// A DELETE under a predicate.
#[derive(Debug, Clone)]
pub struct DeleteStatement {
    /// Target table.
    pub table: String,
    /// Predicates, combined with AND. Empty deletes every row.
    pub predicates: Vec<Predicate>,
}

impl DeleteStatement {
    /// Renders the DELETE and its parameters.
    #[must_use]
    pub fn to_sql(&self) -> (String, Vec<SqlValue>) {
        let mut params = Vec::new();
        let mut sql = format!("DELETE FROM {}", self.table);
        if !self.predicates.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&Predicate::And(self.predicates.clone()).to_sql(&mut params));
        }
        (sql, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::CompareOp;

    fn base_select() -> SelectStatement {
        let mut stmt = SelectStatement::new("users");
        stmt.columns = vec![
            ColumnRef::new("users", "id"),
            ColumnRef::new("users", "name"),
        ];
        stmt
    }

    #[test]
    fn test_plain_select() {
        let (sql, params) = base_select().to_sql();
        assert_eq!(
            sql,
            "SELECT users.id AS \"users.id\", users.name AS \"users.name\" FROM users"
        );
        assert!(params.is_empty());
    }

    #[test]
    fn test_select_with_filter_and_limit() {
        let mut stmt = base_select();
        stmt.predicates.push(Predicate::Compare {
            column: ColumnRef::new("users", "name"),
            op: CompareOp::Eq,
            value: SqlValue::Text(String::from("tom")),
        });
        stmt.limit = Some(2);
        let (sql, params) = stmt.to_sql();
        assert!(sql.ends_with("FROM users WHERE users.name = ? LIMIT 2"));
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn test_select_with_join() {
        let mut stmt = base_select();
        stmt.columns.push(ColumnRef::new("profiles", "id"));
        stmt.joins.push(Join {
            table: String::from("profiles"),
            left: ColumnRef::new("users", "profile"),
            right: ColumnRef::new("profiles", "id"),
        });
        let (sql, _) = stmt.to_sql();
        assert!(sql.contains("FROM users JOIN profiles ON users.profile = profiles.id"));
        assert!(sql.contains("profiles.id AS \"profiles.id\""));
    }

    #[test]
    fn test_count_and_exists() {
        let mut stmt = base_select();
        stmt.predicates.push(Predicate::Compare {
            column: ColumnRef::new("users", "id"),
            op: CompareOp::Gt,
            value: SqlValue::Int(5),
        });
        let (count_sql, count_params) = stmt.to_count_sql();
        assert_eq!(count_sql, "SELECT COUNT(*) FROM users WHERE users.id > ?");
        assert_eq!(count_params.len(), 1);

        let (exists_sql, _) = stmt.to_exists_sql();
        assert_eq!(
            exists_sql,
            "SELECT EXISTS (SELECT 1 FROM users WHERE users.id > ?)"
        );
    }

    #[test]
    fn test_single_insert() {
        let stmt = InsertStatement::single(
            "users",
            vec![
                (String::from("name"), SqlValue::Text(String::from("tom"))),
                (String::from("age"), SqlValue::Int(30)),
            ],
        );
        let (sql, params) = stmt.to_sql();
        assert_eq!(sql, "INSERT INTO users (name, age) VALUES (?, ?)");
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_multi_row_insert() {
        let stmt = InsertStatement {
            table: String::from("users"),
            columns: vec![String::from("name")],
            rows: vec![
                vec![SqlValue::Text(String::from("a"))],
                vec![SqlValue::Text(String::from("b"))],
            ],
        };
        let (sql, params) = stmt.to_sql();
        assert_eq!(sql, "INSERT INTO users (name) VALUES (?), (?)");
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_update() {
        let stmt = UpdateStatement {
            table: String::from("users"),
            assignments: vec![(String::from("name"), SqlValue::Text(String::from("jane")))],
            predicates: vec![Predicate::Compare {
                column: ColumnRef::new("users", "id"),
                op: CompareOp::Eq,
                value: SqlValue::Int(1),
            }],
        };
        let (sql, params) = stmt.to_sql();
        assert_eq!(sql, "UPDATE users SET name = ? WHERE users.id = ?");
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_delete() {
        let stmt = DeleteStatement {
            table: String::from("users"),
            predicates: vec![Predicate::Compare {
                column: ColumnRef::new("users", "id"),
                op: CompareOp::Eq,
                value: SqlValue::Int(1),
            }],
        };
        let (sql, params) = stmt.to_sql();
        assert_eq!(sql, "DELETE FROM users WHERE users.id = ?");
        assert_eq!(params.len(), 1);
    }
}
