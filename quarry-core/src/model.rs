use crate::{Column, FieldDef, QueryError, Result, RowLabeled, Value};
use std::{
    any::TypeId,
    collections::HashMap,
    sync::{Arc, OnceLock, PoisonError, RwLock},
};

/// Index over one or more fields, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDef {
    pub name: String,
    pub fields: Vec<&'static str>,
    pub unique: bool,
}

/// Field of the model referencing a column of another table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    pub field: &'static str,
    pub table: String,
    pub column: Column,
}

/// Static metadata of a table: fields, indexes and foreign keys.
#[derive(Debug, Clone)]
pub struct Model {
    name: String,
    fields: Vec<FieldDef>,
    indexes: Vec<IndexDef>,
    foreign_keys: Vec<ForeignKey>,
}

impl Model {
    /// Table name.
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }
    pub fn primary_keys(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter().filter(|v| v.primary_key)
    }
    /// The primary key field, only when the model has exactly one.
    pub fn one_primary(&self) -> Option<&FieldDef> {
        let mut keys = self.primary_keys();
        match (keys.next(), keys.next()) {
            (Some(v), None) => Some(v),
            _ => None,
        }
    }
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|v| v.name == name)
    }
    pub fn field_by_offset(&self, offset: usize) -> Option<&FieldDef> {
        self.fields.iter().find(|v| v.offset == Some(offset))
    }
    pub fn field_by_column(&self, column: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|v| v.column.name() == column)
    }
    /// Like [`Model::field`] but failing with [`QueryError::UnknownField`].
    pub fn require_field(&self, name: &str) -> Result<&FieldDef> {
        self.field(name).ok_or_else(|| {
            QueryError::UnknownField {
                model: self.name.clone(),
                field: name.to_string(),
            }
            .into()
        })
    }
    pub fn columns(&self) -> Vec<Column> {
        self.fields.iter().map(Column::from).collect()
    }
    pub fn indexes(&self) -> impl Iterator<Item = &IndexDef> {
        self.indexes.iter().filter(|v| !v.unique)
    }
    pub fn unique_indexes(&self) -> impl Iterator<Item = &IndexDef> {
        self.indexes.iter().filter(|v| v.unique)
    }
    pub fn foreign_keys(&self) -> &[ForeignKey] {
        &self.foreign_keys
    }
    pub fn foreign_key(&self, field: &str) -> Option<&ForeignKey> {
        self.foreign_keys.iter().find(|v| v.field == field)
    }
    pub fn soft_delete_field(&self) -> Option<&FieldDef> {
        self.fields.iter().find(|v| v.soft_delete)
    }
}

/// Collects the declarations of a [`Model`].
///
/// Declarations referencing fields that do not exist are logged and left out.
#[derive(Debug)]
pub struct ModelBuilder {
    model: Model,
}

impl ModelBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            model: Model {
                name: name.into(),
                fields: Vec::new(),
                indexes: Vec::new(),
                foreign_keys: Vec::new(),
            },
        }
    }

    pub fn field(mut self, field: FieldDef) -> Self {
        if self.model.field(field.name).is_some() {
            log::warn!(
                "Model {} declares the field {} twice, the latter is ignored",
                self.model.name,
                field.name
            );
            return self;
        }
        self.model.fields.push(field);
        self
    }

    fn push_index(mut self, name: &str, fields: &[&'static str], unique: bool) -> Self {
        if let Some(missing) = fields.iter().find(|f| self.model.field(f).is_none()) {
            log::warn!(
                "Index {} of model {} references the unknown field {}",
                name,
                self.model.name,
                missing
            );
            return self;
        }
        self.model.indexes.push(IndexDef {
            name: name.into(),
            fields: fields.into(),
            unique,
        });
        self
    }

    pub fn index(self, name: &str, fields: &[&'static str]) -> Self {
        self.push_index(name, fields, false)
    }

    pub fn unique_index(self, name: &str, fields: &[&'static str]) -> Self {
        self.push_index(name, fields, true)
    }

    pub fn foreign_key(
        mut self,
        field: &'static str,
        table: impl Into<String>,
        column: impl Into<Column>,
    ) -> Self {
        if self.model.field(field).is_none() {
            log::warn!(
                "Foreign key of model {} references the unknown field {}",
                self.model.name,
                field
            );
            return self;
        }
        self.model.foreign_keys.push(ForeignKey {
            field,
            table: table.into(),
            column: column.into(),
        });
        self
    }

    pub fn build(self) -> Model {
        if self.model.fields.iter().filter(|v| v.soft_delete).count() > 1 {
            log::warn!(
                "Model {} declares more than one soft delete field, only the first is used",
                self.model.name
            );
        }
        self.model
    }
}

/// Record type mapped onto a table.
pub trait Record: Sized + Send + Sync + 'static {
    /// Metadata of the table, called at most once per [`ModelCache`].
    fn describe() -> Model;
    /// Current value of the field with the given Rust name.
    fn value(&self, field: &str) -> Option<Value>;
    fn from_row(row: &RowLabeled) -> Result<Self>;
}

/// Lazily built models, one per record type.
#[derive(Default, Debug)]
pub struct ModelCache {
    models: RwLock<HashMap<TypeId, Arc<OnceLock<Arc<Model>>>>>,
}

impl ModelCache {
    pub fn new() -> Self {
        Default::default()
    }

    /// Model of `R`, describing it on first use.
    pub fn get<R: Record>(&self) -> Arc<Model> {
        let id = TypeId::of::<R>();
        let cell = self
            .models
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned();
        let cell = match cell {
            Some(cell) => cell,
            None => self
                .models
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .entry(id)
                .or_default()
                .clone(),
        };
        // Initialization runs outside the map lock, only callers of the same type wait
        cell.get_or_init(|| {
            let model = R::describe();
            log::debug!("Described model {}", model.name());
            Arc::new(model)
        })
        .clone()
    }

    pub fn len(&self) -> usize {
        self.models
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|v| v.get().is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
