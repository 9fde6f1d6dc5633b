use crate::{
    AsValue, Clauses, ColumnValue, DialectRegistry, Entry, Error, ExecValue, Executor,
    FieldDef, InsertIdSource, Model, ModelCache, OrderBy, Outcome, Preload, PreloadNode,
    QueryError, QueryResult, Record, Replace, Report, ReportIndex, Result, RowLabeled,
    RowsAffected, SearchList, SessionConfig, SqlWriter, TemplateContext, Value, log_statement,
    stream::TryStreamExt,
};
use std::sync::Arc;
use time::{OffsetDateTime, PrimitiveDateTime};

/// Query of `R` records together with the relations to preload on them.
pub struct Find<R> {
    pub search: SearchList,
    pub clauses: Clauses,
    pub preload: Preload<R>,
}

impl<R: Record> Find<R> {
    pub fn new() -> Self {
        Self {
            search: SearchList::new(),
            clauses: Clauses::new(),
            preload: Preload::new(),
        }
    }
    pub fn filter(mut self, search: SearchList) -> Self {
        self.search = search;
        self
    }
    pub fn limit(mut self, limit: u64) -> Self {
        self.clauses.limit = Some(limit);
        self
    }
    pub fn offset(mut self, offset: u64) -> Self {
        self.clauses.offset = Some(offset);
        self
    }
    pub fn order_by(mut self, order_by: OrderBy) -> Self {
        self.clauses.order_by.push(order_by);
        self
    }
    pub fn group_by(mut self, column: impl Into<crate::Column>) -> Self {
        self.clauses.group_by.push(column.into());
        self
    }
    pub fn preload(mut self, relation: impl PreloadNode<R> + 'static) -> Self {
        self.preload = self.preload.with(relation);
        self
    }
}

impl<R: Record> Default for Find<R> {
    fn default() -> Self {
        Self::new()
    }
}

/// Borrowed view of a session used while running one operation.
///
/// Every statement goes through it: the dialect finishes it, the debug sink
/// logs it and the report records it.
pub struct Loader<'a> {
    executor: &'a mut dyn Executor,
    dialect: &'a dyn SqlWriter,
    models: &'a ModelCache,
    config: &'a SessionConfig,
    report: Report,
}

impl<'a> Loader<'a> {
    pub(crate) fn new(
        executor: &'a mut dyn Executor,
        dialect: &'a dyn SqlWriter,
        models: &'a ModelCache,
        config: &'a SessionConfig,
    ) -> Self {
        Self {
            executor,
            dialect,
            models,
            config,
            report: Report::new(),
        }
    }

    pub fn dialect(&self) -> &dyn SqlWriter {
        self.dialect
    }

    pub fn models(&self) -> &ModelCache {
        self.models
    }

    pub fn report(&self) -> &Report {
        &self.report
    }

    pub(crate) fn report_mut(&mut self) -> &mut Report {
        &mut self.report
    }

    pub(crate) fn into_report(self) -> Report {
        self.report
    }

    pub(crate) async fn run(
        &mut self,
        index: &ReportIndex,
        exec: ExecValue,
    ) -> Result<Vec<QueryResult>> {
        let exec = self.dialect.finish(exec);
        let sql = exec.sql().to_string();
        let args = exec.json_args();
        let result: Result<Vec<QueryResult>> = self.executor.run(exec).try_collect().await;
        let error = result.as_ref().err();
        if error.is_some() || self.config.debug {
            log_statement(&sql, &args, error);
        }
        self.report.record(Entry {
            index: index.clone(),
            sql,
            args,
            error: error.map(|e| format!("{:#}", e)),
        });
        result
    }

    pub(crate) async fn fetch(
        &mut self,
        index: &ReportIndex,
        exec: ExecValue,
    ) -> Result<Vec<RowLabeled>> {
        Ok(self
            .run(index, exec)
            .await?
            .into_iter()
            .filter_map(|v| match v {
                QueryResult::Row(row) => Some(row),
                QueryResult::Affected(..) => None,
            })
            .collect())
    }

    pub(crate) async fn execute(
        &mut self,
        index: &ReportIndex,
        exec: ExecValue,
    ) -> Result<RowsAffected> {
        let mut affected = RowsAffected::default();
        affected.extend(self.run(index, exec).await?.into_iter().filter_map(|v| match v {
            QueryResult::Affected(v) => Some(v),
            QueryResult::Row(..) => None,
        }));
        Ok(affected)
    }

    /// Restricts `search` to rows that are not soft deleted.
    pub(crate) fn scope(&self, model: &Model, search: SearchList) -> SearchList {
        match model.soft_delete_field() {
            Some(field) if self.config.soft_delete => {
                search.and(SearchList::is_null(field.column.clone()))
            }
            _ => search,
        }
    }

    /// Rows of `model` matching the scoped search, all columns selected.
    pub(crate) async fn find_rows(
        &mut self,
        index: &ReportIndex,
        model: &Model,
        search: SearchList,
        clauses: &Clauses,
    ) -> Result<Vec<RowLabeled>> {
        let search = self.scope(model, search);
        let exec = self
            .dialect
            .write_find(model, &model.columns())
            .concat(self.dialect.write_condition(&search, clauses)?);
        self.fetch(index, exec).await
    }

    pub(crate) async fn find<R: Record>(
        &mut self,
        index: &ReportIndex,
        search: SearchList,
        clauses: &Clauses,
    ) -> Result<Vec<R>> {
        let model = self.models.get::<R>();
        self.find_rows(index, &model, search, clauses)
            .await?
            .iter()
            .map(R::from_row)
            .collect()
    }

    pub(crate) async fn insert<R: Record>(
        &mut self,
        index: &ReportIndex,
        record: &R,
    ) -> Result<Option<i64>> {
        let model = self.models.get::<R>();
        let values = record_values(&model, record, |f| !(f.auto_increment && is_zero(record, f)))?;
        if values.is_empty() {
            return Err(QueryError::UnsupportedOperation {
                dialect: self.dialect.name(),
                operation: "insert without values",
            }
            .into());
        }
        let exec = self.dialect.write_insert(&model, &values);
        let returns_key = self.dialect.insert_id_source() == InsertIdSource::Returning
            && model.one_primary().is_some_and(|v| v.auto_increment);
        if returns_key {
            let rows = self.fetch(index, exec).await?;
            let Some(value) = rows.first().and_then(|v| v.values().first()) else {
                return Err(Error::msg(format!(
                    "Insert into {} did not return the generated key",
                    model.name()
                )));
            };
            return Ok(Some(i64::try_from_value(value.clone())?));
        }
        Ok(self.execute(index, exec).await?.last_affected_id)
    }
}

fn is_zero<R: Record>(record: &R, field: &FieldDef) -> bool {
    record.value(field.name).is_none_or(|v| v.is_zero())
}

/// Column values of the fields of `record` selected by `filter`.
fn record_values<R: Record>(
    model: &Model,
    record: &R,
    filter: impl Fn(&FieldDef) -> bool,
) -> Result<Vec<ColumnValue>> {
    model
        .fields()
        .iter()
        .filter(|f| filter(*f))
        .map(|f| {
            let value = record.value(f.name).ok_or_else(|| QueryError::UnknownField {
                model: model.name().into(),
                field: f.name.into(),
            })?;
            Ok(ColumnValue::new(f, value))
        })
        .collect()
}

/// Condition matching the primary key of `record`.
fn primary_key_search<R: Record>(model: &Model, record: &R, dialect: &'static str) -> Result<SearchList> {
    let keys = record_values(model, record, |f| f.primary_key)?;
    if keys.is_empty() {
        return Err(QueryError::UnsupportedOperation {
            dialect,
            operation: "identify a record without primary key",
        }
        .into());
    }
    Ok(SearchList::all(
        keys.into_iter().map(|v| Some(SearchList::eq(v.column, v.value))),
    ))
}

/// Deletion time in the representation of the soft delete column.
fn deletion_time(prototype: &Value) -> Value {
    let now = OffsetDateTime::now_utc();
    match prototype {
        Value::Timestamp(..) => PrimitiveDateTime::new(now.date(), now.time()).as_value(),
        Value::Date(..) => now.date().as_value(),
        Value::Int64(..) => now.unix_timestamp().as_value(),
        _ => now.as_value(),
    }
}

/// Typed access to one database through a dialect and an executor.
///
/// ```rust,ignore
/// let registry = quarry::registry();
/// let mut session = Session::connect(&registry, "sqlite://app.db", executor)?;
/// session.create_table::<Author>(true).await?;
/// let id = session.insert(&author).await?;
/// let authors = session
///     .find(Find::<Author>::new().preload(Relation::one_to_many("books", "author_id", Author::set_books)))
///     .await?
///     .into_result()?;
/// ```
pub struct Session<E: Executor> {
    config: SessionConfig,
    dialect: Arc<dyn SqlWriter>,
    models: Arc<ModelCache>,
    executor: E,
}

impl<E: Executor> Session<E> {
    pub fn new(config: SessionConfig, dialect: Arc<dyn SqlWriter>, executor: E) -> Self {
        Self {
            config,
            dialect,
            models: Default::default(),
            executor,
        }
    }

    /// Session whose dialect is chosen by the scheme of `url`.
    pub fn connect(registry: &DialectRegistry, url: &str, executor: E) -> Result<Self> {
        let config = SessionConfig::from_url(url)?;
        let dialect = registry.get(&config.dialect)?;
        Ok(Self::new(config, dialect, executor))
    }

    /// Share the model cache with other sessions.
    pub fn with_models(mut self, models: Arc<ModelCache>) -> Self {
        self.models = models;
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }
    pub fn dialect(&self) -> &dyn SqlWriter {
        &*self.dialect
    }
    pub fn models(&self) -> &Arc<ModelCache> {
        &self.models
    }
    pub fn model<R: Record>(&self) -> Arc<Model> {
        self.models.get::<R>()
    }
    pub fn executor(&self) -> &E {
        &self.executor
    }
    pub fn executor_mut(&mut self) -> &mut E {
        &mut self.executor
    }
    pub fn into_executor(self) -> E {
        self.executor
    }

    fn loader(&mut self) -> Loader<'_> {
        Loader::new(
            &mut self.executor,
            &*self.dialect,
            &self.models,
            &self.config,
        )
    }

    pub async fn create_table<R: Record>(&mut self, if_not_exists: bool) -> Result<()> {
        let model = self.model::<R>();
        let statements = self.dialect.write_create_table(&model, true, if_not_exists);
        let mut loader = self.loader();
        for (i, exec) in statements.into_iter().enumerate() {
            loader.execute(&ReportIndex::new([i]), exec).await?;
        }
        Ok(())
    }

    pub async fn drop_table<R: Record>(&mut self, if_exists: bool) -> Result<()> {
        let model = self.model::<R>();
        let exec = self.dialect.write_drop_table(&model, if_exists);
        self.loader().execute(&ReportIndex::root(), exec).await?;
        Ok(())
    }

    pub async fn has_table<R: Record>(&mut self) -> Result<bool> {
        let model = self.model::<R>();
        let exec = self.dialect.write_has_table(&model);
        let rows = self.loader().fetch(&ReportIndex::root(), exec).await?;
        let count = match rows.first().and_then(|v| v.values().first()) {
            Some(v) => i64::try_from_value(v.clone())?,
            None => 0,
        };
        Ok(count > 0)
    }

    /// Insert one record, returning the generated key when there is one.
    pub async fn insert<R: Record>(&mut self, record: &R) -> Result<Option<i64>> {
        self.loader().insert(&ReportIndex::root(), record).await
    }

    /// Insert every record with its own statement, item `i` is reported at index `i`.
    ///
    /// A failed item is recorded and the batch continues.
    pub async fn insert_many<R: Record>(&mut self, records: &[R]) -> Outcome<Vec<Option<i64>>> {
        let mut loader = self.loader();
        let mut ids = Vec::with_capacity(records.len());
        for (i, record) in records.iter().enumerate() {
            let index = ReportIndex::new([i]);
            match loader.insert(&index, record).await {
                Ok(id) => ids.push(id),
                Err(e) => {
                    loader.report_mut().fail(index, &e);
                    ids.push(None);
                }
            }
        }
        Outcome {
            value: ids,
            report: loader.into_report(),
        }
    }

    /// Insert the record or overwrite the one with the same primary key.
    pub async fn replace<R: Record>(&mut self, record: &R) -> Result<RowsAffected> {
        let model = self.model::<R>();
        let values = record_values(&model, record, |_| true)?;
        let replace = self.dialect.write_replace(&model, &values)?;
        let dialect = self.dialect.name();
        let mut loader = self.loader();
        match replace {
            Replace::Statement(exec) => loader.execute(&ReportIndex::root(), exec).await,
            Replace::UpdateElseInsert { update, insert } => {
                let updated = loader.execute(&ReportIndex::new([0]), update).await?;
                match updated.rows_affected {
                    Some(0) => loader.execute(&ReportIndex::new([1]), insert).await,
                    Some(..) => Ok(updated),
                    None => Err(QueryError::UnsupportedOperation {
                        dialect,
                        operation: "replace without rows affected",
                    }
                    .into()),
                }
            }
        }
    }

    /// Update every non key field of the record, matched by primary key.
    pub async fn update<R: Record>(&mut self, record: &R) -> Result<RowsAffected> {
        let model = self.model::<R>();
        let values = record_values(&model, record, |f| !f.primary_key)?;
        if values.is_empty() {
            return Err(QueryError::UnsupportedOperation {
                dialect: self.dialect.name(),
                operation: "update without assignments",
            }
            .into());
        }
        let search = primary_key_search(&model, record, self.dialect.name())?;
        let exec = self
            .dialect
            .write_update(&model, &values)
            .concat(self.dialect.write_condition(&search, &Clauses::default())?);
        self.loader().execute(&ReportIndex::root(), exec).await
    }

    /// Delete the record, only marking it when the model has a soft delete field.
    pub async fn delete<R: Record>(&mut self, record: &R) -> Result<RowsAffected> {
        let model = self.model::<R>();
        let search = primary_key_search(&model, record, self.dialect.name())?;
        let exec = match model.soft_delete_field() {
            Some(field) if self.config.soft_delete => self
                .dialect
                .write_soft_delete(&model, deletion_time(&field.value))?,
            _ => self.dialect.write_delete(&model),
        };
        let exec = exec.concat(self.dialect.write_condition(&search, &Clauses::default())?);
        self.loader().execute(&ReportIndex::root(), exec).await
    }

    /// Find records, then resolve the requested relations on them.
    ///
    /// Fails only when the root query fails, relation failures are in the report.
    pub async fn find<R: Record>(&mut self, find: Find<R>) -> Result<Outcome<Vec<R>>> {
        let Find {
            search,
            clauses,
            preload,
        } = find;
        let index = ReportIndex::root();
        let mut loader = self.loader();
        let mut records = loader.find::<R>(&index, search, &clauses).await?;
        preload.resolve(&mut loader, &mut records, &index).await;
        Ok(Outcome {
            value: records,
            report: loader.into_report(),
        })
    }

    pub async fn count<R: Record>(&mut self, search: SearchList) -> Result<u64> {
        let model = self.model::<R>();
        let mut loader = self.loader();
        let search = loader.scope(&model, search);
        let exec = loader
            .dialect()
            .write_count(&model)
            .concat(loader.dialect().write_condition(&search, &Clauses::default())?);
        let rows = loader.fetch(&ReportIndex::root(), exec).await?;
        match rows.first().and_then(|v| v.values().first()) {
            Some(v) => u64::try_from_value(v.clone()),
            None => Ok(0),
        }
    }

    /// Render a template skeleton against the model of `R`.
    pub fn template<R: Record>(
        &self,
        skeleton: &ExecValue,
        fragments: impl IntoIterator<Item = (&'static str, ExecValue)>,
    ) -> Result<ExecValue> {
        let model = self.model::<R>();
        let context = fragments
            .into_iter()
            .fold(TemplateContext::new(&model), |context, (name, fragment)| {
                context.with(name, fragment)
            });
        self.dialect.write_template(skeleton, &context)
    }

    /// Run any statement, logged and finished by the dialect.
    pub async fn execute(&mut self, exec: ExecValue) -> Result<RowsAffected> {
        self.loader().execute(&ReportIndex::root(), exec).await
    }

    pub async fn fetch(&mut self, exec: ExecValue) -> Result<Vec<RowLabeled>> {
        self.loader().fetch(&ReportIndex::root(), exec).await
    }

    /// Make `field` of `R` reference the primary key of `T`.
    pub async fn add_foreign_key<R: Record, T: Record>(&mut self, field: &str) -> Result<()> {
        let model = self.model::<R>();
        let related = self.model::<T>();
        let exec = self.dialect.write_add_foreign_key(&model, &related, field)?;
        self.loader().execute(&ReportIndex::root(), exec).await?;
        Ok(())
    }

    pub async fn drop_foreign_key<R: Record>(&mut self, field: &str) -> Result<()> {
        let model = self.model::<R>();
        let exec = self.dialect.write_drop_foreign_key(&model, field)?;
        self.loader().execute(&ReportIndex::root(), exec).await?;
        Ok(())
    }
}
