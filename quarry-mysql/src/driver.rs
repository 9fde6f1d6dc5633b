use crate::MySQLSqlWriter;
use quarry_core::Driver;

#[derive(Default, Debug)]
pub struct MySQLDriver {}

impl MySQLDriver {
    pub const fn new() -> Self {
        Self {}
    }
}

impl Driver for MySQLDriver {
    type SqlWriter = MySQLSqlWriter;

    const NAME: &'static str = "mysql";
    fn sql_writer(&self) -> MySQLSqlWriter {
        MySQLSqlWriter::new()
    }
}
