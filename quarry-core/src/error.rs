use crate::Failure;
use std::fmt::{self, Display};

/// Typed failures raised by statement building and execution bookkeeping.
///
/// They travel inside [`crate::Error`], callers can inspect them with
/// `error.downcast_ref::<QueryError>()`.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    #[error("Invalid expression tree at node {position}: {reason}")]
    InvalidExpressionTree {
        position: usize,
        reason: &'static str,
    },
    #[error("Empty IN list for column {column}")]
    EmptyInList { column: String },
    #[error("Node {position} of type {expr} does not carry the expected operand")]
    MismatchedOperand { position: usize, expr: String },
    #[error("Unknown template placeholder `{token}`")]
    UnknownPlaceholder { token: String },
    #[error("Model {model} does not have a field {field}")]
    UnknownField { model: String, field: String },
    #[error("Operation `{operation}` is not supported by {dialect}")]
    UnsupportedOperation {
        dialect: &'static str,
        operation: &'static str,
    },
    #[error("No dialect registered with the name `{name}`")]
    UnknownDialect { name: String },
    #[error("Preload failed at {}", Failures(.failures))]
    PreloadFailed { failures: Vec<Failure> },
}

struct Failures<'a>(&'a [Failure]);

impl Display for Failures<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, failure) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", failure)?;
        }
        Ok(())
    }
}
