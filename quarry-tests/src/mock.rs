use futures::{StreamExt, stream};
use quarry_core::{
    Error, ExecValue, Executor, QueryResult, Result, RowLabeled, RowNames, RowsAffected, Value,
    stream::BoxStream,
};
use std::collections::VecDeque;

/// Executor replaying scripted results, one per statement, and recording
/// every statement it receives.
///
/// Once the script is exhausted statements yield no result at all.
#[derive(Debug, Default)]
pub struct MockExecutor {
    statements: Vec<ExecValue>,
    responses: VecDeque<Result<Vec<QueryResult>>>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn respond(&mut self, response: Result<Vec<QueryResult>>) -> &mut Self {
        self.responses.push_back(response);
        self
    }

    /// Next statement returns `rows` labeled with `labels`.
    pub fn rows<const N: usize>(
        &mut self,
        labels: [&str; N],
        rows: impl IntoIterator<Item = [Value; N]>,
    ) -> &mut Self {
        let labels: RowNames = labels.iter().map(|v| v.to_string()).collect();
        self.respond(Ok(rows
            .into_iter()
            .map(|v| RowLabeled::new(labels.clone(), v.into()).into())
            .collect()))
    }

    /// Next statement reports `rows` modified rows.
    pub fn affected(&mut self, rows: u64, last_affected_id: Option<i64>) -> &mut Self {
        self.respond(Ok(vec![RowsAffected::new(rows, last_affected_id).into()]))
    }

    /// Next statement fails with `message`.
    pub fn fail(&mut self, message: &str) -> &mut Self {
        self.respond(Err(Error::msg(message.to_string())))
    }

    pub fn statements(&self) -> &[ExecValue] {
        &self.statements
    }

    pub fn sql(&self) -> Vec<&str> {
        self.statements.iter().map(ExecValue::sql).collect()
    }

    pub fn pending(&self) -> usize {
        self.responses.len()
    }
}

impl Executor for MockExecutor {
    fn run<'s>(&'s mut self, query: ExecValue) -> BoxStream<'s, Result<QueryResult>> {
        log::trace!("Mock received {}", query);
        self.statements.push(query);
        match self.responses.pop_front() {
            Some(Ok(results)) => stream::iter(results.into_iter().map(Ok)).boxed(),
            Some(Err(e)) => stream::once(async move { Err::<QueryResult, _>(e) }).boxed(),
            None => stream::empty().boxed(),
        }
    }
}
