use crate::{Driver, QueryError, Result, SqlWriter};
use std::{
    collections::BTreeMap,
    fmt::{self, Debug},
    sync::Arc,
};

/// Dialects available to sessions, keyed by name (the URL scheme).
#[derive(Default, Clone)]
pub struct DialectRegistry {
    dialects: BTreeMap<String, Arc<dyn SqlWriter>>,
}

impl DialectRegistry {
    pub fn new() -> Self {
        Default::default()
    }

    /// Register a dialect, replacing any previous one with the same name.
    pub fn register(&mut self, name: impl Into<String>, writer: Arc<dyn SqlWriter>) -> &mut Self {
        let name = name.into();
        if self.dialects.insert(name.clone(), writer).is_some() {
            log::debug!("Dialect {} was registered again", name);
        }
        self
    }

    /// Register the writer of a driver under its name.
    pub fn register_driver<D: Driver>(&mut self, driver: &D) -> &mut Self {
        self.register(D::NAME, Arc::new(driver.sql_writer()))
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn SqlWriter>> {
        self.dialects.get(name).cloned().ok_or_else(|| {
            QueryError::UnknownDialect {
                name: name.to_string(),
            }
            .into()
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.dialects.keys().map(String::as_str)
    }
}

impl Debug for DialectRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}
