use crate::{
    Column, ColumnValue, ExecValue, ExprType, FieldDef, IndexDef, Model, QueryError, Result,
    SearchList, TemplateContext, Value, compile, separated_by, template,
};
use std::fmt::Write;
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};

macro_rules! write_integer {
    ($out:ident, $value:expr) => {{
        let mut buffer = itoa::Buffer::new();
        $out.push_str(buffer.format($value));
    }};
}
macro_rules! write_float {
    ($this:ident, $out:ident, $value:expr) => {{
        if $value.is_infinite() {
            $this.write_value_infinity($out, $value.is_sign_negative());
        } else if $value.is_nan() {
            $this.write_value_nan($out);
        } else {
            let mut buffer = ryu::Buffer::new();
            $out.push_str(buffer.format($value));
        }
    }};
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: Column,
    pub order: Order,
}

impl OrderBy {
    pub fn asc(column: impl Into<Column>) -> Self {
        Self {
            column: column.into(),
            order: Order::Asc,
        }
    }
    pub fn desc(column: impl Into<Column>) -> Self {
        Self {
            column: column.into(),
            order: Order::Desc,
        }
    }
}

/// Modifiers appended after the condition of a statement.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Clauses {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub order_by: Vec<OrderBy>,
    pub group_by: Vec<Column>,
}

impl Clauses {
    pub fn new() -> Self {
        Default::default()
    }
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }
    pub fn order_by(mut self, order_by: OrderBy) -> Self {
        self.order_by.push(order_by);
        self
    }
    pub fn group_by(mut self, column: impl Into<Column>) -> Self {
        self.group_by.push(column.into());
        self
    }
}

/// How the key generated by an insert reaches the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertIdSource {
    /// Reported by the driver alongside the affected rows.
    LastInsertId,
    /// Returned as a row by a `RETURNING` clause.
    Returning,
}

/// Upsert by primary key.
#[derive(Debug, Clone, PartialEq)]
pub enum Replace {
    /// Native upsert statement.
    Statement(ExecValue),
    /// Run `update`, then `insert` when the update did not affect any row.
    UpdateElseInsert { update: ExecValue, insert: ExecValue },
}

/// Dialect printer converting models and search lists into statements.
///
/// Every method has an ANSI default, dialects override what differs.
pub trait SqlWriter: Send + Sync {
    fn as_dyn(&self) -> &dyn SqlWriter;

    /// Dialect name, as used in error messages.
    fn name(&self) -> &'static str {
        "generic"
    }

    /// Escape occurrences of `search` char with `replace` while copying into buffer.
    fn write_escaped(&self, out: &mut String, value: &str, search: char, replace: &str) {
        let mut position = 0;
        for (i, c) in value.char_indices() {
            if c == search {
                out.push_str(&value[position..i]);
                out.push_str(replace);
                position = i + c.len_utf8();
            }
        }
        out.push_str(&value[position..]);
    }

    /// Quote identifiers ("name") doubling inner quotes.
    fn write_identifier_quoted(&self, out: &mut String, value: &str) {
        out.push('"');
        self.write_escaped(out, value, '"', "\"\"");
        out.push('"');
    }

    /// SQL keyword of an expression node.
    fn expression_operator(&self, expr: ExprType) -> &'static str {
        match expr {
            ExprType::Equal => "=",
            ExprType::NotEqual => "<>",
            ExprType::Greater => ">",
            ExprType::GreaterEqual => ">=",
            ExprType::Less => "<",
            ExprType::LessEqual => "<=",
            ExprType::Between => "BETWEEN",
            ExprType::NotBetween => "NOT BETWEEN",
            ExprType::In => "IN",
            ExprType::NotIn => "NOT IN",
            ExprType::Like => "LIKE",
            ExprType::NotLike => "NOT LIKE",
            ExprType::Null => "IS NULL",
            ExprType::NotNull => "IS NOT NULL",
            ExprType::And => "AND",
            ExprType::Or => "OR",
            ExprType::Not => "NOT",
            ExprType::Ignore => "",
        }
    }

    /// Compile a search list into a condition fragment.
    fn write_search(&self, search: &SearchList) -> Result<ExecValue> {
        compile(self.as_dyn(), search)
    }

    /// Render the SQL type for a `Value` prototype.
    fn write_column_type(&self, out: &mut String, value: &Value) {
        match value {
            Value::Boolean(..) => out.push_str("BOOLEAN"),
            Value::Int8(..) => out.push_str("SMALLINT"),
            Value::Int16(..) => out.push_str("SMALLINT"),
            Value::Int32(..) => out.push_str("INTEGER"),
            Value::Int64(..) => out.push_str("BIGINT"),
            Value::UInt8(..) => out.push_str("SMALLINT"),
            Value::UInt16(..) => out.push_str("INTEGER"),
            Value::UInt32(..) => out.push_str("BIGINT"),
            Value::UInt64(..) => out.push_str("NUMERIC(20)"),
            Value::Float32(..) => out.push_str("REAL"),
            Value::Float64(..) => out.push_str("DOUBLE PRECISION"),
            Value::Decimal(.., precision, scale) => {
                out.push_str("DECIMAL");
                if (precision, scale) != (&0, &0) {
                    let _ = write!(out, "({},{})", precision, scale);
                }
            }
            Value::Char(..) => out.push_str("CHAR(1)"),
            Value::Varchar(..) => out.push_str("VARCHAR"),
            Value::Blob(..) => out.push_str("BLOB"),
            Value::Date(..) => out.push_str("DATE"),
            Value::Time(..) => out.push_str("TIME"),
            Value::Timestamp(..) => out.push_str("TIMESTAMP"),
            Value::TimestampWithTimezone(..) => out.push_str("TIMESTAMP WITH TIME ZONE"),
            Value::Uuid(..) => out.push_str("UUID"),
            Value::Null => log::error!(
                "Unexpected quarry::Value, variant {:?} does not describe a column type",
                value
            ),
        };
    }

    /// Render a concrete value (including proper quoting / escaping).
    fn write_value(&self, out: &mut String, value: &Value) {
        match value {
            v if v.is_null() => self.write_value_none(out),
            Value::Boolean(Some(v)) => self.write_value_bool(out, *v),
            Value::Int8(Some(v)) => write_integer!(out, *v),
            Value::Int16(Some(v)) => write_integer!(out, *v),
            Value::Int32(Some(v)) => write_integer!(out, *v),
            Value::Int64(Some(v)) => write_integer!(out, *v),
            Value::UInt8(Some(v)) => write_integer!(out, *v),
            Value::UInt16(Some(v)) => write_integer!(out, *v),
            Value::UInt32(Some(v)) => write_integer!(out, *v),
            Value::UInt64(Some(v)) => write_integer!(out, *v),
            Value::Float32(Some(v)) => write_float!(self, out, *v),
            Value::Float64(Some(v)) => write_float!(self, out, *v),
            Value::Decimal(Some(v), ..) => drop(write!(out, "{}", v)),
            Value::Char(Some(v)) => {
                let mut buf = [0u8; 4];
                self.write_value_string(out, v.encode_utf8(&mut buf));
            }
            Value::Varchar(Some(v)) => self.write_value_string(out, v),
            Value::Blob(Some(v)) => self.write_value_blob(out, v.as_ref()),
            Value::Date(Some(v)) => self.write_value_date(out, v, false),
            Value::Time(Some(v)) => self.write_value_time(out, v, false),
            Value::Timestamp(Some(v)) => self.write_value_timestamp(out, v),
            Value::TimestampWithTimezone(Some(v)) => self.write_value_timestamptz(out, v),
            Value::Uuid(Some(v)) => drop(write!(out, "'{}'", v)),
            _ => log::error!("Cannot write {:?}", value),
        };
    }

    fn write_value_none(&self, out: &mut String) {
        out.push_str("NULL");
    }

    fn write_value_bool(&self, out: &mut String, value: bool) {
        out.push_str(["false", "true"][value as usize]);
    }

    fn write_value_infinity(&self, out: &mut String, negative: bool) {
        out.push_str(if negative {
            "CAST('-inf' AS "
        } else {
            "CAST('inf' AS "
        });
        self.write_column_type(out, &Value::Float64(None));
        out.push(')');
    }

    fn write_value_nan(&self, out: &mut String) {
        out.push_str("CAST('NaN' AS ");
        self.write_column_type(out, &Value::Float64(None));
        out.push(')');
    }

    /// Render and escape a string literal using single quotes.
    fn write_value_string(&self, out: &mut String, value: &str) {
        out.push('\'');
        self.write_escaped(out, value, '\'', "''");
        out.push('\'');
    }

    /// Render a blob literal using hex escapes.
    fn write_value_blob(&self, out: &mut String, value: &[u8]) {
        out.push_str("'\\x");
        out.push_str(&hex::encode(value));
        out.push('\'');
    }

    fn write_value_date(&self, out: &mut String, value: &Date, timestamp: bool) {
        let b = if timestamp { "" } else { "'" };
        let _ = write!(
            out,
            "{b}{:04}-{:02}-{:02}{b}",
            value.year(),
            value.month() as u8,
            value.day()
        );
    }

    fn write_value_time(&self, out: &mut String, value: &Time, timestamp: bool) {
        let mut subsecond = value.nanosecond();
        let mut width = 9;
        while width > 1 && subsecond % 10 == 0 {
            subsecond /= 10;
            width -= 1;
        }
        let b = if timestamp { "" } else { "'" };
        let _ = write!(
            out,
            "{b}{:02}:{:02}:{:02}.{:0width$}{b}",
            value.hour(),
            value.minute(),
            value.second(),
            subsecond
        );
    }

    fn write_value_timestamp(&self, out: &mut String, value: &PrimitiveDateTime) {
        out.push('\'');
        self.write_value_date(out, &value.date(), true);
        out.push('T');
        self.write_value_time(out, &value.time(), true);
        out.push('\'');
    }

    fn write_value_timestamptz(&self, out: &mut String, value: &OffsetDateTime) {
        let date_time = value.to_offset(UtcOffset::UTC);
        self.write_value_timestamp(
            out,
            &PrimitiveDateTime::new(date_time.date(), date_time.time()),
        );
    }

    /// Query counting the catalog tables named like the model.
    fn write_has_table(&self, model: &Model) -> ExecValue {
        ExecValue::new(
            "SELECT COUNT(*) FROM information_schema.tables WHERE table_name = ?",
            vec![Value::Varchar(Some(model.name().into()))],
        )
    }

    /// Emit CREATE TABLE followed by its CREATE INDEX and CREATE UNIQUE INDEX statements.
    fn write_create_table(
        &self,
        model: &Model,
        foreign_keys: bool,
        if_not_exists: bool,
    ) -> Vec<ExecValue> {
        let mut out = String::with_capacity(128 + model.fields().len() * 64);
        out.push_str("CREATE TABLE ");
        if if_not_exists {
            out.push_str("IF NOT EXISTS ");
        }
        self.write_identifier_quoted(&mut out, model.name());
        out.push_str(" (\n");
        separated_by(
            &mut out,
            model.fields(),
            |out, v| {
                self.write_create_table_column_fragment(out, model, v);
            },
            ",\n",
        );
        self.write_create_table_primary_key(&mut out, model);
        if foreign_keys {
            for fk in model.foreign_keys() {
                let Some(field) = model.field(fk.field) else {
                    continue;
                };
                out.push_str(",\nFOREIGN KEY (");
                self.write_identifier_quoted(&mut out, field.column_name());
                out.push_str(") REFERENCES ");
                self.write_identifier_quoted(&mut out, &fk.table);
                out.push('(');
                self.write_identifier_quoted(&mut out, fk.column.name());
                out.push(')');
            }
        }
        out.push(')');
        let mut result = vec![ExecValue::from(out)];
        result.extend(
            model
                .indexes()
                .chain(model.unique_indexes())
                .map(|index| self.write_create_index(model, index, if_not_exists)),
        );
        result
    }

    /// Emit single column definition fragment.
    fn write_create_table_column_fragment(
        &self,
        out: &mut String,
        model: &Model,
        field: &FieldDef,
    ) {
        self.write_identifier_quoted(out, field.column_name());
        out.push(' ');
        self.write_create_table_column_type(out, field);
        if !field.nullable && !field.primary_key {
            out.push_str(" NOT NULL");
        }
        if let Some(default) = &field.default {
            out.push_str(" DEFAULT ");
            self.write_value(out, default);
        }
        if field.auto_increment {
            self.write_column_auto_increment(out, model, field);
        }
        if field.unique && !field.primary_key {
            out.push_str(" UNIQUE");
        }
    }

    /// Explicit type of the field or the one inferred from its value prototype.
    fn write_create_table_column_type(&self, out: &mut String, field: &FieldDef) {
        if field.column_type.is_empty() {
            self.write_column_type(out, &field.value);
        } else {
            out.push_str(field.column_type);
        }
    }

    fn write_column_auto_increment(&self, out: &mut String, _model: &Model, _field: &FieldDef) {
        out.push_str(" GENERATED BY DEFAULT AS IDENTITY");
    }

    /// Primary key clause listing every primary column in declaration order.
    fn write_create_table_primary_key(&self, out: &mut String, model: &Model) {
        if model.primary_keys().next().is_none() {
            return;
        }
        out.push_str(",\nPRIMARY KEY (");
        separated_by(
            out,
            model.primary_keys(),
            |out, v| {
                self.write_identifier_quoted(out, v.column_name());
            },
            ", ",
        );
        out.push(')');
    }

    fn write_create_index(&self, model: &Model, index: &IndexDef, if_not_exists: bool) -> ExecValue {
        let mut out = String::with_capacity(64);
        out.push_str(if index.unique {
            "CREATE UNIQUE INDEX "
        } else {
            "CREATE INDEX "
        });
        if if_not_exists {
            out.push_str("IF NOT EXISTS ");
        }
        self.write_identifier_quoted(&mut out, &index.name);
        out.push_str(" ON ");
        self.write_identifier_quoted(&mut out, model.name());
        out.push_str(" (");
        separated_by(
            &mut out,
            index.fields.iter().filter_map(|f| model.field(f)),
            |out, v| {
                self.write_identifier_quoted(out, v.column_name());
            },
            ", ",
        );
        out.push(')');
        out.into()
    }

    fn write_drop_table(&self, model: &Model, if_exists: bool) -> ExecValue {
        let mut out = String::with_capacity(24 + model.name().len());
        out.push_str("DROP TABLE ");
        if if_exists {
            out.push_str("IF EXISTS ");
        }
        self.write_identifier_quoted(&mut out, model.name());
        out.into()
    }

    fn write_count(&self, model: &Model) -> ExecValue {
        let mut out = String::with_capacity(32 + model.name().len());
        out.push_str("SELECT COUNT(*)\nFROM ");
        self.write_identifier_quoted(&mut out, model.name());
        out.into()
    }

    fn write_find(&self, model: &Model, columns: &[Column]) -> ExecValue {
        let mut out = String::with_capacity(32 + columns.len() * 24);
        out.push_str("SELECT ");
        separated_by(
            &mut out,
            columns,
            |out, v| {
                self.write_identifier_quoted(out, v.name());
            },
            ", ",
        );
        out.push_str("\nFROM ");
        self.write_identifier_quoted(&mut out, model.name());
        out.into()
    }

    /// Condition and modifiers, in the order WHERE, GROUP BY, ORDER BY, LIMIT, OFFSET.
    fn write_condition(&self, search: &SearchList, clauses: &Clauses) -> Result<ExecValue> {
        let condition = self.write_search(search)?;
        let mut out = ExecValue::default();
        if !condition.is_empty() {
            out.push("\nWHERE ", []);
            out.push_exec(condition);
        }
        let sql = out.sql_mut();
        if !clauses.group_by.is_empty() {
            sql.push_str("\nGROUP BY ");
            separated_by(
                sql,
                &clauses.group_by,
                |out, v| {
                    self.write_identifier_quoted(out, v.name());
                },
                ", ",
            );
        }
        if !clauses.order_by.is_empty() {
            sql.push_str("\nORDER BY ");
            separated_by(
                sql,
                &clauses.order_by,
                |out, v| {
                    self.write_identifier_quoted(out, v.column.name());
                    out.push_str(match v.order {
                        Order::Asc => " ASC",
                        Order::Desc => " DESC",
                    });
                },
                ", ",
            );
        }
        self.write_limit_offset(sql, clauses.limit, clauses.offset);
        Ok(out)
    }

    fn write_limit_offset(&self, out: &mut String, limit: Option<u64>, offset: Option<u64>) {
        if let Some(limit) = limit {
            out.push_str("\nLIMIT ");
            write_integer!(out, limit);
        }
        if let Some(offset) = offset {
            out.push_str("\nOFFSET ");
            write_integer!(out, offset);
        }
    }

    fn insert_id_source(&self) -> InsertIdSource {
        InsertIdSource::LastInsertId
    }

    /// Emit INSERT of the given columns, with a `RETURNING` clause when the key
    /// comes back as a row.
    fn write_insert(&self, model: &Model, values: &[ColumnValue]) -> ExecValue {
        let mut out = ExecValue::default();
        let sql = out.sql_mut();
        sql.reserve(64 + values.len() * 24);
        sql.push_str("INSERT INTO ");
        self.write_identifier_quoted(sql, model.name());
        sql.push_str(" (");
        separated_by(
            sql,
            values,
            |out, v| {
                self.write_identifier_quoted(out, v.column.name());
            },
            ", ",
        );
        sql.push_str(")\nVALUES (");
        separated_by(sql, values, |out, _| out.push('?'), ", ");
        sql.push(')');
        if self.insert_id_source() == InsertIdSource::Returning {
            self.write_insert_returning(sql, model);
        }
        for v in values {
            out.push_arg(v.value.clone());
        }
        out
    }

    fn write_insert_returning(&self, out: &mut String, model: &Model) {
        if let Some(pk) = model.one_primary().filter(|v| v.auto_increment) {
            out.push_str("\nRETURNING ");
            self.write_identifier_quoted(out, pk.column_name());
        }
    }

    /// Upsert by primary key, emulated as an update followed by an insert.
    fn write_replace(&self, model: &Model, values: &[ColumnValue]) -> Result<Replace> {
        let (keys, rest) = split_primary_key(self.name(), model, values)?;
        // Key only records still need a SET list to detect the existing row
        let assignments = if rest.is_empty() { &keys } else { &rest };
        let update = self.write_update(model, assignments);
        let search = SearchList::all(
            keys.iter()
                .map(|v| Some(SearchList::eq(v.column.clone(), v.value.clone()))),
        );
        let update = update
            .concat(self.write_condition(&search, &Clauses::default())?);
        Ok(Replace::UpdateElseInsert {
            update,
            insert: self.write_insert(model, values),
        })
    }

    fn write_update(&self, model: &Model, values: &[ColumnValue]) -> ExecValue {
        let mut out = ExecValue::default();
        let sql = out.sql_mut();
        sql.push_str("UPDATE ");
        self.write_identifier_quoted(sql, model.name());
        sql.push_str("\nSET ");
        separated_by(
            sql,
            values,
            |out, v| {
                self.write_identifier_quoted(out, v.column.name());
                out.push_str(" = ?");
            },
            ", ",
        );
        for v in values {
            out.push_arg(v.value.clone());
        }
        out
    }

    fn write_delete(&self, model: &Model) -> ExecValue {
        let mut out = String::with_capacity(16 + model.name().len());
        out.push_str("DELETE FROM ");
        self.write_identifier_quoted(&mut out, model.name());
        out.into()
    }

    /// Update setting the soft delete field of the model to `deleted_at`.
    fn write_soft_delete(&self, model: &Model, deleted_at: Value) -> Result<ExecValue> {
        let field = model.soft_delete_field().ok_or_else(|| QueryError::UnknownField {
            model: model.name().into(),
            field: "soft delete".into(),
        })?;
        Ok(self.write_update(model, &[ColumnValue::new(field, deleted_at)]))
    }

    /// Constraint making `field` of `model` reference the primary key of `related`.
    fn write_add_foreign_key(
        &self,
        model: &Model,
        related: &Model,
        field: &str,
    ) -> Result<ExecValue> {
        let field = model.require_field(field)?;
        let target = related.one_primary().ok_or_else(|| QueryError::UnknownField {
            model: related.name().into(),
            field: "primary key".into(),
        })?;
        let mut out = String::with_capacity(96);
        out.push_str("ALTER TABLE ");
        self.write_identifier_quoted(&mut out, model.name());
        out.push_str(" ADD CONSTRAINT ");
        self.write_identifier_quoted(&mut out, &constraint_name(model, field));
        out.push_str(" FOREIGN KEY (");
        self.write_identifier_quoted(&mut out, field.column_name());
        out.push_str(") REFERENCES ");
        self.write_identifier_quoted(&mut out, related.name());
        out.push('(');
        self.write_identifier_quoted(&mut out, target.column_name());
        out.push(')');
        Ok(out.into())
    }

    fn write_drop_foreign_key(&self, model: &Model, field: &str) -> Result<ExecValue> {
        let field = model.require_field(field)?;
        let mut out = String::with_capacity(64);
        out.push_str("ALTER TABLE ");
        self.write_identifier_quoted(&mut out, model.name());
        out.push_str(" DROP CONSTRAINT ");
        self.write_identifier_quoted(&mut out, &constraint_name(model, field));
        Ok(out.into())
    }

    /// Substitute the placeholders of a user skeleton.
    fn write_template(&self, skeleton: &ExecValue, context: &TemplateContext) -> Result<ExecValue> {
        template::render(self.as_dyn(), skeleton, context)
    }

    /// Final assembly of a statement before it is sent.
    fn finish(&self, exec: ExecValue) -> ExecValue {
        exec
    }
}

/// Values of the primary key columns and the remaining ones, failing when the
/// primary key is not among `values`.
pub fn split_primary_key(
    dialect: &'static str,
    model: &Model,
    values: &[ColumnValue],
) -> Result<(Vec<ColumnValue>, Vec<ColumnValue>)> {
    let (keys, rest): (Vec<_>, Vec<_>) = values.iter().cloned().partition(|v| {
        model
            .field_by_column(v.column.name())
            .is_some_and(|f| f.primary_key)
    });
    if keys.is_empty() {
        return Err(QueryError::UnsupportedOperation {
            dialect,
            operation: "replace without primary key values",
        }
        .into());
    }
    Ok((keys, rest))
}

/// Name of the constraint created by [`SqlWriter::write_add_foreign_key`].
pub fn constraint_name(model: &Model, field: &FieldDef) -> String {
    format!("fk_{}_{}", model.name(), field.column_name())
}

/// Fallback generic SQL writer (ANSI conventions).
#[derive(Default, Debug, Clone, Copy)]
pub struct GenericSqlWriter;

impl GenericSqlWriter {
    pub const fn new() -> Self {
        Self
    }
}

impl SqlWriter for GenericSqlWriter {
    fn as_dyn(&self) -> &dyn SqlWriter {
        self
    }
}
