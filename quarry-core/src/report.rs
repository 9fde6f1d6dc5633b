use crate::{Error, QueryError, Result, truncate_long};
use std::fmt::{self, Display};

/// Position of a statement: the batch item followed by the preload path.
///
/// The root find is `0`, its relation `i` is `0-i` and the nested relation `j`
/// of the latter is `0-i-j`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReportIndex(Vec<usize>);

impl ReportIndex {
    pub fn new(path: impl Into<Vec<usize>>) -> Self {
        Self(path.into())
    }
    pub fn root() -> Self {
        Self(vec![0])
    }
    pub fn child(&self, position: usize) -> Self {
        let mut path = self.0.clone();
        path.push(position);
        Self(path)
    }
    pub fn path(&self) -> &[usize] {
        &self.0
    }
}

impl Display for ReportIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("-")?;
            }
            write!(f, "{}", v)?;
        }
        Ok(())
    }
}

/// One executed statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub index: ReportIndex,
    pub sql: String,
    pub args: serde_json::Value,
    pub error: Option<String>,
}

/// A batch item or preload level that did not complete.
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    pub index: ReportIndex,
    pub error: String,
}

impl Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.index, self.error)
    }
}

/// Statements executed by an operation, with the levels that failed.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Report {
    entries: Vec<Entry>,
    failures: Vec<Failure>,
}

impl Report {
    pub fn new() -> Self {
        Default::default()
    }
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }
    pub fn entries_at<'s>(&'s self, index: &'s ReportIndex) -> impl Iterator<Item = &'s Entry> {
        self.entries.iter().filter(move |v| v.index == *index)
    }
    pub fn failures(&self) -> &[Failure] {
        &self.failures
    }
    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }
    /// Aggregate of all failures, `None` when everything succeeded.
    pub fn error(&self) -> Option<Error> {
        if self.failures.is_empty() {
            return None;
        }
        Some(
            QueryError::PreloadFailed {
                failures: self.failures.clone(),
            }
            .into(),
        )
    }
    pub(crate) fn record(&mut self, entry: Entry) {
        self.entries.push(entry);
    }
    pub(crate) fn fail(&mut self, index: ReportIndex, error: &Error) {
        log::warn!("Operation {} failed: {:#}", index, error);
        self.failures.push(Failure {
            index,
            error: format!("{:#}", error),
        });
    }
}

/// Value of an operation together with the report of its statements.
#[derive(Debug, Clone)]
pub struct Outcome<T> {
    pub value: T,
    pub report: Report,
}

impl<T> Outcome<T> {
    pub fn is_ok(&self) -> bool {
        self.report.is_ok()
    }
    /// Value when nothing failed, the aggregate error otherwise.
    pub fn into_result(self) -> Result<T> {
        match self.report.error() {
            Some(e) => Err(e),
            None => Ok(self.value),
        }
    }
}

/// Debug sink receiving every executed statement.
pub fn log_statement(sql: &str, args: &serde_json::Value, error: Option<&Error>) {
    match error {
        None => log::debug!("{} {}", truncate_long!(sql), args),
        Some(e) => log::error!("{:#}\nwhile running {} {}", e, truncate_long!(sql), args),
    }
}
