use crate::SqlWriter;

/// Entry point of a database backend.
pub trait Driver {
    type SqlWriter: SqlWriter + 'static;

    /// Name of the dialect, also the URL scheme selecting it.
    const NAME: &'static str;

    fn sql_writer(&self) -> Self::SqlWriter;
}
