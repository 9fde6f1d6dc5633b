#[cfg(test)]
mod tests {
    use indoc::indoc;
    use quarry_core::{
        Clauses, ColumnValue, Driver, FieldDef, ModelBuilder, QueryError, Record, Replace,
        SearchList, Session, SessionConfig, SqlWriter, Value,
    };
    use quarry_sqlite::{SQLiteDriver, SQLiteSqlWriter};
    use quarry_tests::{Book, BookTag, MockExecutor, Tag, init_logs};
    use std::sync::Arc;

    const WRITER: SQLiteSqlWriter = SQLiteSqlWriter::new();

    #[test]
    fn create_table() {
        let model = Book::describe();
        let statements = WRITER.write_create_table(&model, true, false);
        assert_eq!(statements.len(), 3);
        assert_eq!(
            statements[0].sql(),
            indoc! {r#"
                CREATE TABLE "books" (
                "id" INTEGER PRIMARY KEY AUTOINCREMENT,
                "author_id" INTEGER NOT NULL,
                "publisher_id" INTEGER,
                "title" TEXT NOT NULL,
                "price" REAL,
                FOREIGN KEY ("author_id") REFERENCES "authors"("id"))
            "#}
            .trim()
        );
        assert_eq!(
            statements[1].sql(),
            r#"CREATE INDEX "books_author" ON "books" ("author_id")"#
        );
        assert_eq!(
            statements[2].sql(),
            r#"CREATE UNIQUE INDEX "books_title" ON "books" ("author_id", "title")"#
        );
    }

    #[test]
    fn composite_primary_key() {
        let model = BookTag::describe();
        let statements = WRITER.write_create_table(&model, false, true);
        assert_eq!(
            statements[0].sql(),
            indoc! {r#"
                CREATE TABLE IF NOT EXISTS "book_tags" (
                "book_id" INTEGER,
                "tag_id" INTEGER,
                PRIMARY KEY ("book_id", "tag_id"))
            "#}
            .trim()
        );
    }

    #[test]
    fn auto_increment_outside_primary_key() {
        let model = ModelBuilder::new("events")
            .field(FieldDef::new::<i64>("tenant").primary_key())
            .field(FieldDef::new::<i64>("seq").auto_increment())
            .build();
        let statements = WRITER.write_create_table(&model, false, false);
        assert_eq!(
            statements[0].sql(),
            indoc! {r#"
                CREATE TABLE "events" (
                "tenant" INTEGER,
                "seq" INTEGER NOT NULL,
                PRIMARY KEY ("tenant"))
            "#}
            .trim()
        );
    }

    #[test]
    fn auto_increment_in_composite_key() {
        let model = ModelBuilder::new("lines")
            .field(FieldDef::new::<i64>("line").primary_key().auto_increment())
            .field(FieldDef::new::<i64>("order_id").primary_key())
            .build();
        let statements = WRITER.write_create_table(&model, false, false);
        assert_eq!(
            statements[0].sql(),
            indoc! {r#"
                CREATE TABLE "lines" (
                "line" INTEGER,
                "order_id" INTEGER,
                PRIMARY KEY ("line", "order_id"))
            "#}
            .trim()
        );
    }

    #[test]
    fn has_table() {
        let exec = WRITER.write_has_table(&Tag::describe());
        assert_eq!(
            exec.sql(),
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?"
        );
        assert_eq!(exec.args(), [Value::Varchar(Some("tags".into()))]);
    }

    #[test]
    fn limit_offset() {
        let search = SearchList::eq("label", "rust");
        let exec = WRITER
            .write_condition(&search, &Clauses::new().offset(5))
            .unwrap();
        assert_eq!(exec.sql(), "\nWHERE \"label\" = ?\nLIMIT -1\nOFFSET 5");
        let exec = WRITER
            .write_condition(&SearchList::new(), &Clauses::new().limit(10).offset(20))
            .unwrap();
        assert_eq!(exec.sql(), "\nLIMIT 10\nOFFSET 20");
    }

    #[test]
    fn replace() {
        let model = Tag::describe();
        let values = [ColumnValue::new("id", 1i64), ColumnValue::new("label", "rust")];
        let Replace::Statement(exec) = WRITER.write_replace(&model, &values).unwrap() else {
            panic!("SQLite replaces with a single statement");
        };
        assert_eq!(
            exec.sql(),
            indoc! {r#"
                REPLACE INTO "tags" ("id", "label")
                VALUES (?, ?)
            "#}
            .trim()
        );
        assert_eq!(exec.args().len(), 2);
        let error = WRITER
            .write_replace(&model, &[ColumnValue::new("label", "rust")])
            .expect_err("Replace needs the primary key");
        assert!(matches!(
            error.downcast_ref::<QueryError>(),
            Some(QueryError::UnsupportedOperation { dialect: "sqlite", .. })
        ));
    }

    #[test]
    fn literals() {
        let mut out = String::new();
        WRITER.write_value(&mut out, &Value::Float64(Some(f64::NEG_INFINITY)));
        assert_eq!(out, "-1.0e+10000");
        out.clear();
        WRITER.write_value(&mut out, &Value::Blob(Some(vec![0xAB, 0x01, 0xFF].into_boxed_slice())));
        assert_eq!(out, "X'AB01FF'");
        out.clear();
        WRITER.write_value(&mut out, &Value::Varchar(Some("it's".into())));
        assert_eq!(out, "'it''s'");
    }

    #[test]
    fn driver() {
        let driver = SQLiteDriver::new();
        assert_eq!(SQLiteDriver::NAME, "sqlite");
        assert_eq!(driver.sql_writer().name(), "sqlite");
    }

    #[tokio::test]
    async fn foreign_keys_unsupported() {
        init_logs();
        let mut session = Session::new(
            SessionConfig::new("sqlite"),
            Arc::new(SQLiteSqlWriter::new()),
            MockExecutor::new(),
        );
        let error = session
            .drop_foreign_key::<Book>("author_id")
            .await
            .expect_err("SQLite cannot alter constraints");
        assert_eq!(
            *error.downcast_ref::<QueryError>().unwrap(),
            QueryError::UnsupportedOperation {
                dialect: "sqlite",
                operation: "ALTER TABLE DROP CONSTRAINT",
            }
        );
        assert!(session.executor().statements().is_empty());
    }

    #[tokio::test]
    async fn replace_session() {
        init_logs();
        let mut executor = MockExecutor::new();
        executor.affected(1, Some(3));
        let mut session = Session::new(
            SessionConfig::new("sqlite"),
            Arc::new(SQLiteSqlWriter::new()),
            executor,
        );
        let affected = session
            .replace(&Tag {
                id: 3,
                label: "async".into(),
            })
            .await
            .expect("Replace should succeed");
        assert_eq!(affected.rows_affected, Some(1));
        assert_eq!(
            session.executor().sql(),
            ["REPLACE INTO \"tags\" (\"id\", \"label\")\nVALUES (?, ?)"]
        );
    }
}
