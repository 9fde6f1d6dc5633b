#[cfg(test)]
mod tests {
    use quarry::{
        ColumnValue, ExprNode, ExprType, Operand, QueryError, SearchList, Value, registry,
    };

    #[test]
    fn bundled_dialects() {
        let registry = registry();
        assert_eq!(
            registry.names().collect::<Vec<_>>(),
            ["generic", "mysql", "postgres", "postgresql", "sqlite"]
        );
        for name in registry.names() {
            let writer = registry.get(name).unwrap();
            let expected = if name == "postgresql" { "postgres" } else { name };
            assert_eq!(writer.name(), expected);
        }
    }

    #[test]
    fn underflow_in_every_dialect() {
        let search = SearchList::from_nodes(vec![
            ExprNode::new(
                ExprType::Equal,
                Some(Operand::Value(ColumnValue::new("a", 1))),
            ),
            ExprNode::combinator(ExprType::Or),
        ]);
        let registry = registry();
        for name in registry.names() {
            let error = registry
                .get(name)
                .unwrap()
                .write_search(&search)
                .expect_err("Or with a single operand must be rejected");
            assert!(
                matches!(
                    error.downcast_ref::<QueryError>(),
                    Some(QueryError::InvalidExpressionTree { position: 1, .. })
                ),
                "Unexpected error from {}: {:#}",
                name,
                error
            );
        }
    }

    #[test]
    fn same_condition_across_dialects() {
        let search = SearchList::all([
            Some(SearchList::eq("name", "Ann")),
            None,
            Some(SearchList::not_in("id", [1i64, 2])),
        ])
        .not();
        let registry = registry();
        let compile = |name: &str| {
            let writer = registry.get(name).unwrap();
            writer.finish(writer.write_search(&search).unwrap())
        };
        let generic = compile("generic");
        assert_eq!(generic.sql(), r#"NOT("name" = ? AND "id" NOT IN (?,?))"#);
        assert_eq!(
            generic.args(),
            [
                Value::Varchar(Some("Ann".into())),
                Value::Int64(Some(1)),
                Value::Int64(Some(2))
            ]
        );
        assert_eq!(
            compile("mysql").sql(),
            "NOT(`name` = ? AND `id` NOT IN (?,?))"
        );
        assert_eq!(
            compile("postgres").sql(),
            r#"NOT("name" = $1 AND "id" NOT IN ($2,$3))"#
        );
        assert_eq!(compile("sqlite").sql(), generic.sql());
    }

    #[test]
    fn create_table_per_dialect() {
        use quarry::Record;
        use quarry_tests::Comment;
        let model = Comment::describe();
        let registry = registry();
        let deleted_at = |name: &str| {
            registry.get(name).unwrap().write_create_table(&model, false, false)[0]
                .sql()
                .lines()
                .nth(4)
                .map(str::to_string)
        };
        assert_eq!(
            deleted_at("generic").as_deref(),
            Some(r#""deleted_at" TIMESTAMP WITH TIME ZONE,"#)
        );
        assert_eq!(deleted_at("sqlite").as_deref(), Some(r#""deleted_at" TEXT)"#));
        assert_eq!(deleted_at("mysql").as_deref(), Some("`deleted_at` DATETIME,"));
        assert_eq!(
            deleted_at("postgres").as_deref(),
            Some(r#""deleted_at" TIMESTAMP WITH TIME ZONE,"#)
        );
    }
}
