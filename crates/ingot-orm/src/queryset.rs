//! Query building and the terminal operations that run queries.
//!
//! A `QuerySet` is an immutable description of one SELECT: every
//! refinement returns a new set, so partially-built queries can be
//! shared and extended independently. SQL is rendered lazily by the
//! terminal operations.

use std::sync::Arc;

use ingot_sql::{
    ColumnRef, Database, DeleteStatement, InsertStatement, Join, Predicate, SelectStatement,
};
use tracing::debug;

use crate::error::{OrmError, Result};
use crate::lookup::{self, SEPARATOR};
use crate::model::Instance;
use crate::row;
use crate::schema::ModelSchema;
use crate::value::Value;

/// An immutable, composable query over one model.
#[derive(Debug, Clone)]
pub struct QuerySet {
    schema: Arc<ModelSchema>,
    predicates: Vec<Predicate>,
    related: Vec<String>,
}

impl QuerySet {
    /// Creates an unfiltered query over the model's table.
    #[must_use]
    pub fn new(schema: &Arc<ModelSchema>) -> Self {
        Self {
            schema: Arc::clone(schema),
            predicates: Vec::new(),
            related: Vec::new(),
        }
    }

    /// Returns the model this query selects.
    #[must_use]
    pub fn schema(&self) -> &Arc<ModelSchema> {
        &self.schema
    }

    /// Adds one `field__operator` condition, returning the refined
    /// query. Conditions accumulate with AND. Filtering through a
    /// relation implies the join and eager-loads the related model.
    pub fn filter(&self, keyword: &str, value: impl Into<Value>) -> Result<Self> {
        let parsed = lookup::parse(&self.schema, keyword, value.into())?;
        let mut next = self.clone();
        next.predicates.push(parsed.predicate);
        if let Some(path) = parsed.join_path {
            next.add_related(path);
        }
        Ok(next)
    }

    /// Adds several conditions at once; equivalent to chaining
    /// [`filter`](Self::filter) over each pair.
    pub fn filter_all(&self, conditions: Vec<(String, Value)>) -> Result<Self> {
        let mut next = self.clone();
        for (keyword, value) in conditions {
            next = next.filter(&keyword, value)?;
        }
        Ok(next)
    }

    /// Requests eager loading of a relation path such as
    /// `"author"` or `"author__profile"`. The path is validated
    /// against the schema graph immediately.
    pub fn select_related(&self, path: &str) -> Result<Self> {
        let mut target = Arc::clone(&self.schema);
        for part in path.split(SEPARATOR) {
            target = target.related(part)?;
        }
        let mut next = self.clone();
        next.add_related(path.to_string());
        Ok(next)
    }

    fn add_related(&mut self, path: String) {
        if !self.related.iter().any(|p| *p == path) {
            self.related.push(path);
        }
    }

    /// Relation paths that will be eagerly loaded.
    #[must_use]
    pub fn related(&self) -> &[String] {
        &self.related
    }

    /// Renders this query as a SELECT statement.
    ///
    /// Every selected column is aliased to `table.column`, so rows
    /// from joined tables with clashing column names stay distinct.
    /// Each table is joined at most once, in first-seen order.
    pub fn build_select(&self) -> Result<SelectStatement> {
        let mut statement = SelectStatement::new(self.schema.table.name.clone());
        statement.predicates.clone_from(&self.predicates);
        push_columns(&mut statement.columns, &self.schema);

        for path in &self.related {
            let mut current = Arc::clone(&self.schema);
            for part in path.split(SEPARATOR) {
                let target = current.related(part)?;
                let joined_before = statement.joins.iter().any(|j| j.table == target.table.name);
                if !joined_before {
                    statement.joins.push(Join {
                        table: target.table.name.clone(),
                        left: ColumnRef::new(current.table.name.clone(), part),
                        right: ColumnRef::new(target.table.name.clone(), target.pk_name.clone()),
                    });
                    push_columns(&mut statement.columns, &target);
                }
                current = target;
            }
        }
        Ok(statement)
    }

    /// Fetches every matching row as validated instances.
    pub async fn all(&self, db: &Database) -> Result<Vec<Instance>> {
        let (sql, params) = self.build_select()?.to_sql();
        let rows = db.fetch_all(&sql, params).await?;
        rows.iter()
            .map(|r| row::from_row(&self.schema, r, &self.related))
            .collect()
    }

    /// [`filter_all`](Self::filter_all) then [`all`](Self::all).
    pub async fn all_where(
        &self,
        db: &Database,
        conditions: Vec<(String, Value)>,
    ) -> Result<Vec<Instance>> {
        self.filter_all(conditions)?.all(db).await
    }

    /// Fetches exactly one matching row.
    ///
    /// Zero matches is [`OrmError::NoMatch`]; more than one is
    /// [`OrmError::MultipleMatches`]. Only two rows are ever pulled
    /// to decide.
    pub async fn get(&self, db: &Database) -> Result<Instance> {
        let mut statement = self.build_select()?;
        statement.limit = Some(2);
        let (sql, params) = statement.to_sql();
        let rows = db.fetch_all(&sql, params).await?;
        match rows.as_slice() {
            [] => Err(OrmError::NoMatch),
            [single] => row::from_row(&self.schema, single, &self.related),
            _ => Err(OrmError::MultipleMatches),
        }
    }

    /// [`filter_all`](Self::filter_all) then [`get`](Self::get).
    pub async fn get_where(
        &self,
        db: &Database,
        conditions: Vec<(String, Value)>,
    ) -> Result<Instance> {
        self.filter_all(conditions)?.get(db).await
    }

    /// Counts matching rows without materializing them.
    pub async fn count(&self, db: &Database) -> Result<i64> {
        let (sql, params) = self.build_select()?.to_count_sql();
        match db.fetch_val(&sql, params).await? {
            ingot_sql::SqlValue::Int(n) => Ok(n),
            other => Err(OrmError::Decode {
                column: String::from("COUNT(*)"),
                message: format!("expected an integer, got {other:?}"),
            }),
        }
    }

    /// Reports whether any row matches.
    pub async fn exists(&self, db: &Database) -> Result<bool> {
        let (sql, params) = self.build_select()?.to_exists_sql();
        match db.fetch_val(&sql, params).await? {
            ingot_sql::SqlValue::Int(n) => Ok(n != 0),
            ingot_sql::SqlValue::Bool(b) => Ok(b),
            other => Err(OrmError::Decode {
                column: String::from("EXISTS"),
                message: format!("expected an integer, got {other:?}"),
            }),
        }
    }

    /// Validates and inserts a new instance, returning it with any
    /// store-assigned primary key filled in.
    pub async fn create(&self, db: &Database, values: Vec<(String, Value)>) -> Result<Instance> {
        let mut instance = Instance::new(&self.schema, values)?;
        instance.insert(db).await?;
        Ok(instance)
    }

    /// Validates and inserts many rows in batches, returning how many
    /// batches were flushed.
    ///
    /// Rows are validated up front; nothing is written if any row
    /// fails. Each batch is one multi-statement flush; a database
    /// failure partway leaves earlier batches committed.
    pub async fn insert_many(
        &self,
        db: &Database,
        rows: Vec<Vec<(String, Value)>>,
        batch_size: usize,
    ) -> Result<usize> {
        let batch_size = batch_size.max(1);
        let instances: Vec<Instance> = rows
            .into_iter()
            .map(|values| Instance::new(&self.schema, values))
            .collect::<Result<_>>()?;
        if instances.is_empty() {
            return Ok(0);
        }

        // All rows share one column list, so one statement covers the
        // whole run. The primary key is omitted when every row leaves
        // it to the store.
        let keep_pk = instances.iter().any(|i| !i.pk().is_null());
        let columns: Vec<String> = self
            .schema
            .fields
            .iter()
            .filter(|(name, _)| keep_pk || *name != self.schema.pk_name)
            .map(|(name, _)| name.clone())
            .collect();
        let (sql, _) = InsertStatement {
            table: self.schema.table.name.clone(),
            columns: columns.clone(),
            rows: vec![vec![ingot_sql::SqlValue::Null; columns.len()]],
        }
        .to_sql();

        let mut batches = 0;
        for chunk in instances.chunks(batch_size) {
            let param_sets: Vec<Vec<ingot_sql::SqlValue>> = chunk
                .iter()
                .map(|instance| {
                    columns
                        .iter()
                        .map(|c| instance.get(c).map_or(ingot_sql::SqlValue::Null, Value::to_sql))
                        .collect()
                })
                .collect();
            db.execute_many(&sql, param_sets).await?;
            batches += 1;
        }
        debug!(model = %self.schema.name, batches, "bulk insert complete");
        Ok(batches)
    }

    /// Deletes every matching row, returning the deleted count.
    ///
    /// A DELETE cannot join, so a query filtered through a relation
    /// errors here rather than at the store.
    pub async fn delete_many(&self, db: &Database) -> Result<u64> {
        if let Some(path) = self.related.first() {
            return Err(OrmError::InvalidFilter {
                field: path.clone(),
                message: String::from("relation filters cannot be used with delete"),
            });
        }
        let statement = DeleteStatement {
            table: self.schema.table.name.clone(),
            predicates: self.predicates.clone(),
        };
        let (sql, params) = statement.to_sql();
        Ok(db.execute(&sql, params).await?)
    }

    /// [`filter_all`](Self::filter_all) then
    /// [`delete_many`](Self::delete_many).
    pub async fn delete_where(
        &self,
        db: &Database,
        conditions: Vec<(String, Value)>,
    ) -> Result<u64> {
        self.filter_all(conditions)?.delete_many(db).await
    }
}

fn push_columns(columns: &mut Vec<ColumnRef>, schema: &Arc<ModelSchema>) {
    for (name, _) in &schema.fields {
        columns.push(ColumnRef::new(schema.table.name.clone(), name.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::FieldDescriptor;

    fn schemas() -> (Arc<ModelSchema>, Arc<ModelSchema>) {
        let author = ModelSchema::build(
            "QsAuthor",
            "qs_authors",
            vec![
                ("id", FieldDescriptor::integer().primary_key()),
                ("name", FieldDescriptor::string(100)),
            ],
        )
        .unwrap();
        let book = ModelSchema::build(
            "QsBook",
            "qs_books",
            vec![
                ("id", FieldDescriptor::integer().primary_key()),
                ("title", FieldDescriptor::string(100)),
                ("author", FieldDescriptor::foreign_key(&author)),
            ],
        )
        .unwrap();
        (author, book)
    }

    #[test]
    fn test_unfiltered_select() {
        let (author, _) = schemas();
        let (sql, params) = QuerySet::new(&author).build_select().unwrap().to_sql();
        assert_eq!(
            sql,
            "SELECT qs_authors.id AS \"qs_authors.id\", \
             qs_authors.name AS \"qs_authors.name\" FROM qs_authors"
        );
        assert!(params.is_empty());
    }

    #[test]
    fn test_filter_is_immutable() {
        let (author, _) = schemas();
        let base = QuerySet::new(&author);
        let narrowed = base.filter("name", "tom").unwrap();
        let (base_sql, _) = base.build_select().unwrap().to_sql();
        let (narrowed_sql, narrowed_params) = narrowed.build_select().unwrap().to_sql();
        assert!(!base_sql.contains("WHERE"));
        assert!(narrowed_sql.ends_with("WHERE qs_authors.name = ?"));
        assert_eq!(
            narrowed_params,
            vec![ingot_sql::SqlValue::Text(String::from("tom"))]
        );
    }

    #[test]
    fn test_relation_filter_implies_join() {
        let (_, book) = schemas();
        let qs = QuerySet::new(&book)
            .filter("author__name", "tom")
            .unwrap();
        let (sql, _) = qs.build_select().unwrap().to_sql();
        assert!(sql.contains("JOIN qs_authors ON qs_books.author = qs_authors.id"));
        assert!(sql.contains("qs_authors.name AS \"qs_authors.name\""));
    }

    #[test]
    fn test_join_deduplicated() {
        let (_, book) = schemas();
        let qs = QuerySet::new(&book)
            .select_related("author")
            .unwrap()
            .filter("author__name", "tom")
            .unwrap();
        let (sql, _) = qs.build_select().unwrap().to_sql();
        assert_eq!(sql.matches("JOIN qs_authors").count(), 1);
    }

    #[test]
    fn test_select_related_rejects_plain_field() {
        let (_, book) = schemas();
        assert!(matches!(
            QuerySet::new(&book).select_related("title"),
            Err(OrmError::InvalidRelation { .. })
        ));
    }

    #[tokio::test]
    async fn test_relation_filtered_delete_is_rejected() {
        let (_, book) = schemas();
        let db = ingot_sql::Database::in_memory().await.unwrap();
        let qs = book.objects().filter("author__name", "tom").unwrap();
        assert!(matches!(
            qs.delete_many(&db).await,
            Err(OrmError::InvalidFilter { .. })
        ));
    }

    #[test]
    fn test_filter_chain_matches_filter_all() {
        let (author, _) = schemas();
        let chained = QuerySet::new(&author)
            .filter("name", "tom")
            .unwrap()
            .filter("id__gt", 3)
            .unwrap();
        let bulk = QuerySet::new(&author)
            .filter_all(vec![
                (String::from("name"), Value::from("tom")),
                (String::from("id__gt"), Value::Int(3)),
            ])
            .unwrap();
        assert_eq!(
            chained.build_select().unwrap().to_sql(),
            bulk.build_select().unwrap().to_sql()
        );
    }
}
