use crate::{AsValue, Value};
use std::{
    borrow::Cow,
    fmt::{self, Display},
};

/// SQL column name of a record field.
#[derive(Default, Debug, Clone, PartialEq, Eq, Hash)]
pub struct Column(Cow<'static, str>);

impl Column {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for Column {
    fn from(value: &'static str) -> Self {
        Self(Cow::Borrowed(value))
    }
}

impl From<String> for Column {
    fn from(value: String) -> Self {
        Self(Cow::Owned(value))
    }
}

impl From<&FieldDef> for Column {
    fn from(value: &FieldDef) -> Self {
        value.column.clone()
    }
}

impl Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A column paired with the value bound to it.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnValue {
    pub column: Column,
    pub value: Value,
}

impl ColumnValue {
    pub fn new(column: impl Into<Column>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }
}

/// Declarative description of a record field and the column backing it.
#[derive(Debug, Clone)]
pub struct FieldDef {
    /// Rust field name, used by templates (`$FN-<name>`) and relations.
    pub name: &'static str,
    pub column: Column,
    /// Explicit SQL type, empty means infer it from `value`.
    pub column_type: &'static str,
    /// Typed NULL describing the column type.
    pub value: Value,
    pub nullable: bool,
    pub primary_key: bool,
    pub auto_increment: bool,
    pub unique: bool,
    pub default: Option<Value>,
    /// Byte offset of the field inside the record, addressed by `$0x<hex>` tokens.
    pub offset: Option<usize>,
    /// Holds the deletion timestamp, rows with a value in it are considered deleted.
    pub soft_delete: bool,
}

impl FieldDef {
    /// Field whose column has the same name and whose type is taken from `T`.
    pub fn new<T: AsValue>(name: &'static str) -> Self {
        Self {
            name,
            column: name.into(),
            column_type: "",
            value: T::as_empty_value(),
            nullable: false,
            primary_key: false,
            auto_increment: false,
            unique: false,
            default: None,
            offset: None,
            soft_delete: false,
        }
    }
    pub fn column(mut self, column: impl Into<Column>) -> Self {
        self.column = column.into();
        self
    }
    pub fn column_type(mut self, column_type: &'static str) -> Self {
        self.column_type = column_type;
        self
    }
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }
    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }
    /// Marks the soft delete field, it is implicitly nullable.
    pub fn soft_delete(mut self) -> Self {
        self.soft_delete = true;
        self.nullable = true;
        self
    }
    pub fn name(&self) -> &'static str {
        self.name
    }
    pub fn column_name(&self) -> &str {
        self.column.name()
    }
}
