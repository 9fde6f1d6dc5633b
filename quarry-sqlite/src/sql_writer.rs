use quarry_core::{
    ColumnValue, ExecValue, FieldDef, Model, QueryError, Replace, Result, SqlWriter, Value,
    separated_by, split_primary_key,
};
use std::fmt::Write;

#[derive(Default, Debug, Clone, Copy)]
pub struct SQLiteSqlWriter {}

impl SQLiteSqlWriter {
    pub const fn new() -> Self {
        Self {}
    }
}

impl SqlWriter for SQLiteSqlWriter {
    fn as_dyn(&self) -> &dyn SqlWriter {
        self
    }

    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn write_column_type(&self, out: &mut String, value: &Value) {
        match value {
            Value::Boolean(..) => out.push_str("INTEGER"),
            Value::Int8(..) => out.push_str("INTEGER"),
            Value::Int16(..) => out.push_str("INTEGER"),
            Value::Int32(..) => out.push_str("INTEGER"),
            Value::Int64(..) => out.push_str("INTEGER"),
            Value::UInt8(..) => out.push_str("INTEGER"),
            Value::UInt16(..) => out.push_str("INTEGER"),
            Value::UInt32(..) => out.push_str("INTEGER"),
            Value::UInt64(..) => out.push_str("INTEGER"),
            Value::Float32(..) => out.push_str("REAL"),
            Value::Float64(..) => out.push_str("REAL"),
            Value::Decimal(.., precision, scale) => {
                out.push_str("REAL");
                if (precision, scale) != (&0, &0) {
                    let _ = write!(out, "({},{})", precision, scale);
                }
            }
            Value::Char(..) => out.push_str("TEXT"),
            Value::Varchar(..) => out.push_str("TEXT"),
            Value::Blob(..) => out.push_str("BLOB"),
            Value::Date(..) => out.push_str("TEXT"),
            Value::Time(..) => out.push_str("TEXT"),
            Value::Timestamp(..) => out.push_str("TEXT"),
            Value::TimestampWithTimezone(..) => out.push_str("TEXT"),
            Value::Uuid(..) => out.push_str("TEXT"),
            Value::Null => log::error!(
                "Unexpected quarry::Value, variant {:?} does not describe a column type",
                value
            ),
        };
    }

    fn write_value_infinity(&self, out: &mut String, negative: bool) {
        if negative {
            out.push('-');
        }
        out.push_str("1.0e+10000");
    }

    fn write_value_blob(&self, out: &mut String, value: &[u8]) {
        out.push_str("X'");
        out.push_str(&hex::encode_upper(value));
        out.push('\'');
    }

    fn write_has_table(&self, model: &Model) -> ExecValue {
        ExecValue::new(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?",
            vec![Value::Varchar(Some(model.name().into()))],
        )
    }

    // Only a single INTEGER PRIMARY KEY column aliases the rowid
    fn write_column_auto_increment(&self, out: &mut String, model: &Model, field: &FieldDef) {
        if is_rowid_alias(model, field) {
            out.push_str(" PRIMARY KEY AUTOINCREMENT");
        } else {
            log::warn!(
                "SQLite cannot auto increment {}.{}, only a single primary key column can be",
                model.name(),
                field.column_name()
            );
        }
    }

    fn write_create_table_primary_key(&self, out: &mut String, model: &Model) {
        if model
            .one_primary()
            .is_some_and(|v| is_rowid_alias(model, v))
        {
            return;
        }
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

    fn write_limit_offset(&self, out: &mut String, limit: Option<u64>, offset: Option<u64>) {
        match (limit, offset) {
            (Some(limit), _) => {
                let _ = write!(out, "\nLIMIT {}", limit);
            }
            // OFFSET is only accepted after a LIMIT
            (None, Some(..)) => out.push_str("\nLIMIT -1"),
            (None, None) => {}
        }
        if let Some(offset) = offset {
            let _ = write!(out, "\nOFFSET {}", offset);
        }
    }

    fn write_replace(&self, model: &Model, values: &[ColumnValue]) -> Result<Replace> {
        split_primary_key(self.name(), model, values)?;
        let (mut sql, args) = self.write_insert(model, values).into_parts();
        if sql.starts_with("INSERT") {
            sql.replace_range(.."INSERT".len(), "REPLACE");
        }
        Ok(Replace::Statement(ExecValue::new(sql, args)))
    }

    fn write_add_foreign_key(
        &self,
        _model: &Model,
        _related: &Model,
        _field: &str,
    ) -> Result<ExecValue> {
        Err(QueryError::UnsupportedOperation {
            dialect: self.name(),
            operation: "ALTER TABLE ADD CONSTRAINT",
        }
        .into())
    }

    fn write_drop_foreign_key(&self, _model: &Model, _field: &str) -> Result<ExecValue> {
        Err(QueryError::UnsupportedOperation {
            dialect: self.name(),
            operation: "ALTER TABLE DROP CONSTRAINT",
        }
        .into())
    }
}

fn is_rowid_alias(model: &Model, field: &FieldDef) -> bool {
    field.auto_increment
        && model
            .one_primary()
            .is_some_and(|v| v.name == field.name)
}
