use quarry_core::{
    ColumnValue, ExecValue, FieldDef, IndexDef, Model, Replace, Result, SqlWriter, Value,
    constraint_name, separated_by, split_primary_key,
};
use std::fmt::Write;
use time::{OffsetDateTime, UtcOffset};

#[derive(Default, Debug, Clone, Copy)]
pub struct MySQLSqlWriter {}

impl MySQLSqlWriter {
    pub const fn new() -> Self {
        Self {}
    }
}

impl SqlWriter for MySQLSqlWriter {
    fn as_dyn(&self) -> &dyn SqlWriter {
        self
    }

    fn name(&self) -> &'static str {
        "mysql"
    }

    fn write_identifier_quoted(&self, out: &mut String, value: &str) {
        out.push('`');
        self.write_escaped(out, value, '`', "``");
        out.push('`');
    }

    fn write_column_type(&self, out: &mut String, value: &Value) {
        match value {
            Value::Boolean(..) => out.push_str("BOOLEAN"),
            Value::Int8(..) => out.push_str("TINYINT"),
            Value::Int16(..) => out.push_str("SMALLINT"),
            Value::Int32(..) => out.push_str("INTEGER"),
            Value::Int64(..) => out.push_str("BIGINT"),
            Value::UInt8(..) => out.push_str("TINYINT UNSIGNED"),
            Value::UInt16(..) => out.push_str("SMALLINT UNSIGNED"),
            Value::UInt32(..) => out.push_str("INTEGER UNSIGNED"),
            Value::UInt64(..) => out.push_str("BIGINT UNSIGNED"),
            Value::Float32(..) => out.push_str("FLOAT"),
            Value::Float64(..) => out.push_str("DOUBLE"),
            Value::Decimal(.., precision, scale) => {
                out.push_str("DECIMAL");
                if (precision, scale) != (&0, &0) {
                    let _ = write!(out, "({},{})", precision, scale);
                }
            }
            Value::Char(..) => out.push_str("CHAR(1)"),
            // Indexed and unique columns need a bounded length
            Value::Varchar(..) => out.push_str("VARCHAR(255)"),
            Value::Blob(..) => out.push_str("BLOB"),
            Value::Date(..) => out.push_str("DATE"),
            Value::Time(..) => out.push_str("TIME"),
            Value::Timestamp(..) => out.push_str("DATETIME"),
            Value::TimestampWithTimezone(..) => out.push_str("DATETIME"),
            Value::Uuid(..) => out.push_str("CHAR(36)"),
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

    fn write_value_timestamptz(&self, out: &mut String, value: &OffsetDateTime) {
        let date_time = value.to_offset(UtcOffset::UTC);
        out.push('\'');
        self.write_value_date(out, &date_time.date(), true);
        out.push(' ');
        self.write_value_time(out, &date_time.time(), true);
        out.push('\'');
    }

    fn write_has_table(&self, model: &Model) -> ExecValue {
        ExecValue::new(
            "SELECT COUNT(*) FROM information_schema.tables WHERE table_schema = DATABASE() AND table_name = ?",
            vec![Value::Varchar(Some(model.name().into()))],
        )
    }

    fn write_column_auto_increment(&self, out: &mut String, _model: &Model, _field: &FieldDef) {
        out.push_str(" AUTO_INCREMENT");
    }

    // MySQL has no IF NOT EXISTS on indexes
    fn write_create_index(&self, model: &Model, index: &IndexDef, _if_not_exists: bool) -> ExecValue {
        let mut out = String::with_capacity(64);
        out.push_str(if index.unique {
            "CREATE UNIQUE INDEX "
        } else {
            "CREATE INDEX "
        });
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

    fn write_limit_offset(&self, out: &mut String, limit: Option<u64>, offset: Option<u64>) {
        match (limit, offset) {
            (Some(limit), _) => {
                let _ = write!(out, "\nLIMIT {}", limit);
            }
            (None, Some(..)) => {
                let _ = write!(out, "\nLIMIT {}", u64::MAX);
            }
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

    fn write_drop_foreign_key(&self, model: &Model, field: &str) -> Result<ExecValue> {
        let field = model.require_field(field)?;
        let mut out = String::with_capacity(64);
        out.push_str("ALTER TABLE ");
        self.write_identifier_quoted(&mut out, model.name());
        out.push_str(" DROP FOREIGN KEY ");
        self.write_identifier_quoted(&mut out, &constraint_name(model, field));
        Ok(out.into())
    }
}
