use crate::{
    ExecValue, QueryResult, Result, RowLabeled, RowsAffected,
    future::{BoxFuture, FutureExt},
    stream::{BoxStream, StreamExt, TryStreamExt},
};

/// Runs finished statements against a database.
///
/// Object safe so that sessions and the preload resolver can work over
/// `&mut dyn Executor`.
pub trait Executor: Send {
    /// General method to send any query and return any result type (either row or count)
    fn run<'s>(&'s mut self, query: ExecValue) -> BoxStream<'s, Result<QueryResult>>;

    /// Execute the query and returns the rows.
    fn fetch<'s>(&'s mut self, query: ExecValue) -> BoxStream<'s, Result<RowLabeled>> {
        self.run(query)
            .filter_map(|v| async move {
                match v {
                    Ok(QueryResult::Row(v)) => Some(Ok(v)),
                    Err(e) => Some(Err(e)),
                    _ => None,
                }
            })
            .boxed()
    }

    /// Execute the query and return the total number of rows affected.
    fn execute<'s>(&'s mut self, query: ExecValue) -> BoxFuture<'s, Result<RowsAffected>> {
        self.run(query)
            .filter_map(|v| async move {
                match v {
                    Ok(QueryResult::Affected(v)) => Some(Ok(v)),
                    Err(e) => Some(Err(e)),
                    _ => None,
                }
            })
            .try_collect()
            .boxed()
    }
}

impl<E: Executor + ?Sized> Executor for &mut E {
    fn run<'s>(&'s mut self, query: ExecValue) -> BoxStream<'s, Result<QueryResult>> {
        (**self).run(query)
    }
}

impl<E: Executor + ?Sized> Executor for Box<E> {
    fn run<'s>(&'s mut self, query: ExecValue) -> BoxStream<'s, Result<QueryResult>> {
        (**self).run(query)
    }
}
