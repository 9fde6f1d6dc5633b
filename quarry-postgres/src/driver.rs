use crate::PostgresSqlWriter;
use quarry_core::Driver;

#[derive(Default, Debug)]
pub struct PostgresDriver {}

impl PostgresDriver {
    pub const fn new() -> Self {
        Self {}
    }
}

impl Driver for PostgresDriver {
    type SqlWriter = PostgresSqlWriter;

    const NAME: &'static str = "postgres";
    fn sql_writer(&self) -> PostgresSqlWriter {
        PostgresSqlWriter::new()
    }
}
