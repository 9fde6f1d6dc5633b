use crate::{Value, truncate_long};
use std::fmt::{self, Display};

/// SQL text together with the positional arguments of its `?` placeholders.
///
/// Appending concatenates the text and the arguments in the same order, so the
/// way fragments are grouped never changes the final statement.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct ExecValue {
    sql: String,
    args: Vec<Value>,
}

impl ExecValue {
    pub fn new(sql: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            args,
        }
    }
    pub fn sql(&self) -> &str {
        &self.sql
    }
    pub fn args(&self) -> &[Value] {
        &self.args
    }
    pub fn into_parts(self) -> (String, Vec<Value>) {
        (self.sql, self.args)
    }
    pub fn is_empty(&self) -> bool {
        self.sql.is_empty() && self.args.is_empty()
    }
    pub fn append(mut self, sql: &str, args: impl IntoIterator<Item = Value>) -> Self {
        self.push(sql, args);
        self
    }
    pub fn concat(mut self, other: ExecValue) -> Self {
        self.push_exec(other);
        self
    }
    /// In place version of [`ExecValue::append`], used while building statements.
    pub fn push(&mut self, sql: &str, args: impl IntoIterator<Item = Value>) {
        self.sql.push_str(sql);
        self.args.extend(args);
    }
    pub fn push_exec(&mut self, other: ExecValue) {
        self.sql.push_str(&other.sql);
        self.args.extend(other.args);
    }
    /// Mutable access to the text, arguments are pushed with [`ExecValue::push_arg`].
    pub fn sql_mut(&mut self) -> &mut String {
        &mut self.sql
    }
    pub fn push_arg(&mut self, value: Value) {
        self.args.push(value);
    }
    /// Arguments rendered as a JSON array, as reported to the statement log.
    pub fn json_args(&self) -> serde_json::Value {
        serde_json::Value::Array(self.args.iter().map(Value::to_json).collect())
    }
}

impl From<&str> for ExecValue {
    fn from(value: &str) -> Self {
        Self::new(value, Vec::new())
    }
}

impl From<String> for ExecValue {
    fn from(value: String) -> Self {
        Self::new(value, Vec::new())
    }
}

impl Display for ExecValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", truncate_long!(self.sql), self.json_args())
    }
}
