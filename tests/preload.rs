#[cfg(test)]
mod tests {
    use indoc::indoc;
    use quarry::{
        Find, GenericSqlWriter, QueryError, Relation, RelationKind, SearchList, Session,
        SessionConfig, Value,
    };
    use quarry_tests::{
        Author, Book, BookTag, Comment, MockExecutor, Profile, Publisher, Tag, init_logs,
        silent_logs,
    };
    use std::sync::Arc;

    const AUTHOR: [&str; 2] = ["id", "name"];
    const BOOK: [&str; 5] = ["id", "author_id", "publisher_id", "title", "price"];

    fn int(v: i64) -> Value {
        Value::Int64(Some(v))
    }

    fn text(v: &str) -> Value {
        Value::Varchar(Some(v.into()))
    }

    fn author(id: i64, name: &str) -> [Value; 2] {
        [int(id), text(name)]
    }

    fn book(id: i64, author_id: i64, publisher_id: Option<i64>) -> [Value; 5] {
        [
            int(id),
            int(author_id),
            Value::Int64(publisher_id),
            text(&format!("Book {}", id)),
            Value::Float64(None),
        ]
    }

    fn session(executor: MockExecutor) -> Session<MockExecutor> {
        Session::new(
            SessionConfig::default(),
            Arc::new(GenericSqlWriter::new()),
            executor,
        )
    }

    fn ids<T>(values: &[T], id: impl Fn(&T) -> i64) -> Vec<i64> {
        values.iter().map(id).collect()
    }

    #[tokio::test]
    async fn one_to_many() {
        init_logs();
        let mut executor = MockExecutor::new();
        executor
            .rows(AUTHOR, [author(1, "Ann"), author(2, "Bob"), author(3, "Cid")])
            .rows(BOOK, [book(10, 1, None), book(11, 1, None), book(12, 2, None)]);
        let mut session = session(executor);
        let relation = Relation::one_to_many("books", "author_id", Author::set_books);
        assert_eq!(relation.kind, RelationKind::OneToMany);
        let outcome = session
            .find(Find::<Author>::new().preload(relation))
            .await
            .unwrap();
        assert!(outcome.is_ok());
        let authors = outcome.value;
        assert_eq!(ids(&authors[0].books, |v| v.id), [10, 11]);
        assert_eq!(ids(&authors[1].books, |v| v.id), [12]);
        assert!(authors[2].books.is_empty());
        assert_eq!(
            session.executor().sql()[1],
            indoc! {r#"
                SELECT "id", "author_id", "publisher_id", "title", "price"
                FROM "books"
                WHERE "author_id" IN (?,?,?)
            "#}
            .trim()
        );
        assert_eq!(
            session.executor().statements()[1].args(),
            [int(1), int(2), int(3)]
        );
        let indexes: Vec<_> = outcome
            .report
            .entries()
            .iter()
            .map(|v| v.index.to_string())
            .collect();
        assert_eq!(indexes, ["0", "0-0"]);
    }

    #[tokio::test]
    async fn many_to_many() {
        init_logs();
        let mut executor = MockExecutor::new();
        executor
            .rows(BOOK, [book(1, 9, None), book(2, 9, None), book(3, 9, None)])
            .rows(
                ["book_id", "tag_id"],
                [[int(1), int(100)], [int(1), int(101)], [int(2), int(100)]],
            )
            .rows(
                ["id", "label"],
                [[int(101), text("async")], [int(100), text("rust")]],
            );
        let mut session = session(executor);
        let books = session
            .find(Find::<Book>::new().preload(Relation::many_to_many::<BookTag>(
                "tags",
                "book_id",
                "tag_id",
                Book::set_tags,
            )))
            .await
            .unwrap()
            .into_result()
            .unwrap();
        assert_eq!(ids(&books[0].tags, |v| v.id), [100, 101]);
        assert_eq!(
            books[1].tags,
            [Tag {
                id: 100,
                label: "rust".into(),
            }]
        );
        assert!(books[2].tags.is_empty());
        let sql = session.executor().sql();
        assert_eq!(
            sql[1],
            "SELECT \"book_id\", \"tag_id\"\nFROM \"book_tags\"\nWHERE \"book_id\" IN (?,?,?)"
        );
        assert_eq!(
            sql[2],
            "SELECT \"id\", \"label\"\nFROM \"tags\"\nWHERE \"id\" IN (?,?)"
        );
        assert_eq!(
            session.executor().statements()[2].args(),
            [int(100), int(101)]
        );
    }

    #[tokio::test]
    async fn many_to_many_without_pairs() {
        init_logs();
        let mut executor = MockExecutor::new();
        executor
            .rows(BOOK, [book(1, 9, None)])
            .rows(["book_id", "tag_id"], Vec::new());
        let mut session = session(executor);
        let books = session
            .find(Find::<Book>::new().preload(Relation::many_to_many::<BookTag>(
                "tags",
                "book_id",
                "tag_id",
                Book::set_tags,
            )))
            .await
            .unwrap()
            .into_result()
            .unwrap();
        assert!(books[0].tags.is_empty());
        assert_eq!(session.executor().statements().len(), 2);
    }

    #[tokio::test]
    async fn many_to_many_failure_names_step() {
        init_logs();
        let tags = || {
            Find::<Book>::new().preload(Relation::many_to_many::<BookTag>(
                "tags",
                "book_id",
                "tag_id",
                Book::set_tags,
            ))
        };
        let mut executor = MockExecutor::new();
        executor
            .rows(BOOK, [book(1, 9, None)])
            .fail("no such table: book_tags");
        let mut join = session(executor);
        let outcome;
        silent_logs! {
            outcome = join.find(tags()).await;
        }
        let outcome = outcome.unwrap();
        let failures = outcome.report.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].index.to_string(), "0-0");
        assert!(
            failures[0].error.contains("join table book_tags"),
            "{}",
            failures[0].error
        );

        let mut executor = MockExecutor::new();
        executor
            .rows(BOOK, [book(1, 9, None)])
            .rows(["book_id", "tag_id"], [[int(1), int(100)]])
            .fail("no such table: tags");
        let mut children = session(executor);
        let outcome;
        silent_logs! {
            outcome = children.find(tags()).await;
        }
        let outcome = outcome.unwrap();
        let failures = outcome.report.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].index.to_string(), "0-0");
        assert!(
            failures[0].error.contains("tags through book_tags"),
            "{}",
            failures[0].error
        );
        assert!(outcome.value[0].tags.is_empty());
        let indexes: Vec<_> = outcome
            .report
            .entries()
            .iter()
            .map(|v| v.index.to_string())
            .collect();
        assert_eq!(indexes, ["0", "0-0", "0-0"]);
    }

    #[tokio::test]
    async fn belongs_to_with_null_key() {
        init_logs();
        let mut executor = MockExecutor::new();
        executor
            .rows(
                BOOK,
                [
                    book(1, 9, Some(7)),
                    book(2, 9, None),
                    book(3, 9, Some(7)),
                    book(4, 9, Some(8)),
                ],
            )
            .rows(["id", "name"], [[int(7), text("Ace")]]);
        let mut session = session(executor);
        let books = session
            .find(Find::<Book>::new().preload(Relation::belongs_to(
                "publisher",
                "publisher_id",
                Book::set_publisher,
            )))
            .await
            .unwrap()
            .into_result()
            .unwrap();
        let ace = Publisher {
            id: 7,
            name: "Ace".into(),
        };
        assert_eq!(books[0].publisher.as_ref(), Some(&ace));
        assert_eq!(books[1].publisher, None);
        assert_eq!(books[2].publisher.as_ref(), Some(&ace));
        assert_eq!(books[3].publisher, None);
        assert_eq!(
            session.executor().sql()[1],
            "SELECT \"id\", \"name\"\nFROM \"publishers\"\nWHERE \"id\" IN (?,?)"
        );
        assert_eq!(session.executor().statements()[1].args(), [int(7), int(8)]);
    }

    #[tokio::test]
    async fn belongs_to_only_null_keys() {
        init_logs();
        let mut executor = MockExecutor::new();
        executor.rows(BOOK, [book(1, 9, None), book(2, 9, None)]);
        let mut session = session(executor);
        let outcome = session
            .find(Find::<Book>::new().preload(Relation::belongs_to(
                "publisher",
                "publisher_id",
                Book::set_publisher,
            )))
            .await
            .unwrap();
        assert!(outcome.is_ok());
        assert!(outcome.value.iter().all(|v| v.publisher.is_none()));
        assert_eq!(session.executor().statements().len(), 1);
    }

    #[tokio::test]
    async fn empty_root_skips_relations() {
        init_logs();
        let mut executor = MockExecutor::new();
        executor.rows(AUTHOR, Vec::new());
        let mut session = session(executor);
        let find = Find::<Author>::new()
            .preload(Relation::one_to_many("books", "author_id", Author::set_books))
            .preload(Relation::one_to_one("profile", "author_id", Author::set_profile));
        assert_eq!(find.preload.containers().collect::<Vec<_>>(), ["books", "profile"]);
        let outcome = session.find(find).await.unwrap();
        assert!(outcome.value.is_empty());
        assert_eq!(session.executor().statements().len(), 1);
    }

    fn nested() -> Find<Author> {
        Find::<Author>::new()
            .preload(Relation::one_to_one("profile", "author_id", Author::set_profile))
            .preload(
                Relation::one_to_many("books", "author_id", Author::set_books)
                    .with(Relation::one_to_many(
                        "comments",
                        "book_id",
                        Book::set_comments,
                    ))
                    .with(Relation::many_to_many::<BookTag>(
                        "tags",
                        "book_id",
                        "tag_id",
                        Book::set_tags,
                    )),
            )
    }

    #[tokio::test]
    async fn nested_report_indexes() {
        init_logs();
        let mut executor = MockExecutor::new();
        executor
            .rows(AUTHOR, [author(1, "Ann"), author(2, "Bob")])
            .rows(
                ["id", "author_id", "bio"],
                [[int(50), int(2), text("Sci-fi")]],
            )
            .rows(BOOK, [book(10, 1, None), book(11, 2, None)])
            .rows(
                ["id", "book_id", "body", "deleted_at"],
                [
                    [int(1), int(11), text("Nice"), Value::TimestampWithTimezone(None)],
                    [int(2), int(11), text("Long"), Value::TimestampWithTimezone(None)],
                ],
            )
            .rows(["book_id", "tag_id"], [[int(10), int(100)]])
            .rows(["id", "label"], [[int(100), text("rust")]]);
        let mut session = session(executor);
        let outcome = session.find(nested()).await.unwrap();
        assert!(outcome.is_ok());
        let authors = outcome.value;
        assert_eq!(authors[0].profile, None);
        assert_eq!(
            authors[1].profile,
            Some(Profile {
                id: 50,
                author_id: 2,
                bio: "Sci-fi".into(),
            })
        );
        assert!(authors[0].books[0].comments.is_empty());
        assert_eq!(ids(&authors[1].books[0].comments, |v| v.id), [1, 2]);
        assert_eq!(ids(&authors[0].books[0].tags, |v| v.id), [100]);
        assert!(authors[1].books[0].tags.is_empty());
        let indexes: Vec<_> = outcome
            .report
            .entries()
            .iter()
            .map(|v| v.index.to_string())
            .collect();
        assert_eq!(indexes, ["0", "0-0", "0-1", "0-1-0", "0-1-1", "0-1-1"]);
        assert_eq!(
            session.executor().sql()[3],
            indoc! {r#"
                SELECT "id", "book_id", "body", "deleted_at"
                FROM "comments"
                WHERE "book_id" IN (?,?) AND "deleted_at" IS NULL
            "#}
            .trim()
        );
    }

    #[tokio::test]
    async fn failed_relation_keeps_siblings() {
        init_logs();
        let mut executor = MockExecutor::new();
        executor
            .rows(AUTHOR, [author(1, "Ann")])
            .fail("no such table: profiles")
            .rows(BOOK, [book(10, 1, None)])
            .fail("no such table: comments")
            .rows(["book_id", "tag_id"], [[int(10), int(100)]])
            .rows(["id", "label"], [[int(100), text("rust")]]);
        let mut session = session(executor);
        let outcome;
        silent_logs! {
            outcome = session.find(nested()).await;
        }
        let outcome = outcome.expect("The root query succeeded");
        assert!(!outcome.is_ok());
        let failures: Vec<_> = outcome
            .report
            .failures()
            .iter()
            .map(|v| v.index.to_string())
            .collect();
        assert_eq!(failures, ["0-0", "0-1-0"]);
        assert!(outcome.report.failures()[0].error.contains("profiles"));
        let authors = &outcome.value;
        assert_eq!(authors[0].profile, None);
        assert_eq!(ids(&authors[0].books, |v| v.id), [10]);
        assert!(authors[0].books[0].comments.is_empty());
        assert_eq!(ids(&authors[0].books[0].tags, |v| v.id), [100]);
        assert_eq!(session.executor().pending(), 0);
        let error = outcome.into_result().expect_err("Two relations failed");
        let message = error.to_string();
        assert!(message.contains("0-0"), "{}", message);
        assert!(matches!(
            error.downcast_ref::<QueryError>(),
            Some(QueryError::PreloadFailed { failures }) if failures.len() == 2
        ));
    }

    #[tokio::test]
    async fn unknown_relation_key() {
        init_logs();
        let mut executor = MockExecutor::new();
        executor.rows(AUTHOR, [author(1, "Ann")]);
        let mut session = session(executor);
        let outcome;
        silent_logs! {
            outcome = session
                .find(Find::<Author>::new().preload(Relation::one_to_many(
                    "books",
                    "writer_id",
                    Author::set_books,
                )))
                .await;
        }
        let outcome = outcome.unwrap();
        assert_eq!(outcome.report.failures().len(), 1);
        assert!(outcome.report.failures()[0].error.contains("writer_id"));
        assert_eq!(session.executor().statements().len(), 1);
    }

    #[tokio::test]
    async fn scoped_root_filter() {
        init_logs();
        let mut executor = MockExecutor::new();
        executor.rows(
            ["id", "book_id", "body", "deleted_at"],
            [[int(1), int(11), text("Nice"), Value::TimestampWithTimezone(None)]],
        );
        let mut session = session(executor);
        let outcome = session
            .find(Find::<Comment>::new().filter(SearchList::gt("id", 0i64)))
            .await
            .unwrap();
        assert_eq!(outcome.value.len(), 1);
        assert!(
            session.executor().sql()[0]
                .ends_with("WHERE \"id\" > ? AND \"deleted_at\" IS NULL")
        );
    }
}
