use quarry_core::{
    ColumnValue, ExecValue, FieldDef, InsertIdSource, Model, Replace, Result, SqlWriter, Value,
    for_each_placeholder, separated_by, split_primary_key,
};
use std::fmt::Write;

#[derive(Default, Debug, Clone, Copy)]
pub struct PostgresSqlWriter {}

impl PostgresSqlWriter {
    pub const fn new() -> Self {
        Self {}
    }
}

impl SqlWriter for PostgresSqlWriter {
    fn as_dyn(&self) -> &dyn SqlWriter {
        self
    }

    fn name(&self) -> &'static str {
        "postgres"
    }

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
                out.push_str("NUMERIC");
                if (precision, scale) != (&0, &0) {
                    let _ = write!(out, "({},{})", precision, scale);
                }
            }
            Value::Char(..) => out.push_str("CHARACTER(1)"),
            Value::Varchar(..) => out.push_str("TEXT"),
            Value::Blob(..) => out.push_str("BYTEA"),
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

    fn write_has_table(&self, model: &Model) -> ExecValue {
        ExecValue::new(
            "SELECT COUNT(*) FROM pg_catalog.pg_tables WHERE tablename = ?",
            vec![Value::Varchar(Some(model.name().into()))],
        )
    }

    fn write_create_table_column_type(&self, out: &mut String, field: &FieldDef) {
        if !field.auto_increment || !field.column_type.is_empty() {
            if field.column_type.is_empty() {
                self.write_column_type(out, &field.value);
            } else {
                out.push_str(field.column_type);
            }
            return;
        }
        out.push_str(match field.value {
            Value::Int8(..) | Value::Int16(..) | Value::UInt8(..) => "SMALLSERIAL",
            Value::Int32(..) | Value::UInt16(..) => "SERIAL",
            _ => "BIGSERIAL",
        });
    }

    // The serial types already carry the sequence
    fn write_column_auto_increment(&self, out: &mut String, _model: &Model, field: &FieldDef) {
        if !field.column_type.is_empty() {
            out.push_str(" GENERATED BY DEFAULT AS IDENTITY");
        }
    }

    fn insert_id_source(&self) -> InsertIdSource {
        InsertIdSource::Returning
    }

    fn write_replace(&self, model: &Model, values: &[ColumnValue]) -> Result<Replace> {
        let (keys, rest) = split_primary_key(self.name(), model, values)?;
        let mut out = self.write_insert(model, values);
        let sql = out.sql_mut();
        // RETURNING must stay the last clause
        let returning = sql.find("\nRETURNING ").map(|i| sql.split_off(i));
        sql.push_str("\nON CONFLICT (");
        separated_by(
            sql,
            &keys,
            |out, v| {
                self.write_identifier_quoted(out, v.column.name());
            },
            ", ",
        );
        sql.push(')');
        if rest.is_empty() {
            sql.push_str(" DO NOTHING");
        } else {
            sql.push_str(" DO UPDATE SET\n");
            separated_by(
                sql,
                &rest,
                |out, v| {
                    self.write_identifier_quoted(out, v.column.name());
                    out.push_str(" = EXCLUDED.");
                    self.write_identifier_quoted(out, v.column.name());
                },
                ",\n",
            );
        }
        if let Some(returning) = returning {
            sql.push_str(&returning);
        }
        Ok(Replace::Statement(out))
    }

    /// Numbers the placeholders `$1..$n` in argument order.
    fn finish(&self, exec: ExecValue) -> ExecValue {
        let (sql, args) = exec.into_parts();
        let mut out = String::with_capacity(sql.len() + args.len() * 2);
        let mut position = 0;
        let mut n = 0;
        for_each_placeholder(&sql, |i| {
            n += 1;
            out.push_str(&sql[position..i]);
            let _ = write!(out, "${}", n);
            position = i + 1;
        });
        out.push_str(&sql[position..]);
        ExecValue::new(out, args)
    }
}
