use crate::{
    Column, ExecValue, ExprNode, ExprType, Operand, QueryError, Result, SearchList, SqlWriter,
    separated_by,
};

/// Evaluates the postfix `search` list into one condition fragment.
///
/// Leaves push a fragment, `And`/`Or` pop two (the second-to-top is the left
/// operand) and `Not` pops one. `Or` is always parenthesized while `And` relies
/// on the parentheses its operands already carry. An empty list (or a list of
/// only `Ignore` nodes) compiles to an empty fragment.
///
/// ```rust
/// use quarry_core::{GenericSqlWriter, SearchList, compile};
/// let search = SearchList::eq("a", 1).and(SearchList::eq("b", 2).or(SearchList::eq("c", 3)));
/// let exec = compile(&GenericSqlWriter::new(), &search).unwrap();
/// assert_eq!(exec.sql(), r#""a" = ? AND ("b" = ? OR "c" = ?)"#);
/// assert_eq!(exec.args().len(), 3);
/// ```
pub fn compile(writer: &dyn SqlWriter, search: &SearchList) -> Result<ExecValue> {
    let mut stack: Vec<ExecValue> = Vec::with_capacity(search.len());
    for (position, node) in search.nodes().iter().enumerate() {
        match node.expr {
            ExprType::Ignore => {}
            ExprType::And | ExprType::Or => {
                expect_no_operand(position, node)?;
                let (Some(right), Some(left)) = (stack.pop(), stack.pop()) else {
                    return Err(QueryError::InvalidExpressionTree {
                        position,
                        reason: "binary combinator needs two operands",
                    }
                    .into());
                };
                let operator = writer.expression_operator(node.expr);
                let mut result = ExecValue::default();
                if node.expr == ExprType::Or {
                    result.push("(", []);
                }
                result.push_exec(left);
                result.push(&format!(" {} ", operator), []);
                result.push_exec(right);
                if node.expr == ExprType::Or {
                    result.push(")", []);
                }
                stack.push(result);
            }
            ExprType::Not => {
                expect_no_operand(position, node)?;
                let Some(inner) = stack.pop() else {
                    return Err(QueryError::InvalidExpressionTree {
                        position,
                        reason: "NOT needs one operand",
                    }
                    .into());
                };
                let mut result = ExecValue::from(writer.expression_operator(ExprType::Not));
                result.push("(", []);
                result.push_exec(inner);
                result.push(")", []);
                stack.push(result);
            }
            _ => stack.push(compile_leaf(writer, position, node)?),
        }
    }
    if stack.len() > 1 {
        return Err(QueryError::InvalidExpressionTree {
            position: search.len(),
            reason: "more than one fragment left after the last node",
        }
        .into());
    }
    Ok(stack.pop().unwrap_or_default())
}

fn expect_no_operand(position: usize, node: &ExprNode) -> Result<()> {
    if node.operand.is_some() {
        return Err(mismatched(position, node));
    }
    Ok(())
}

fn mismatched(position: usize, node: &ExprNode) -> crate::Error {
    QueryError::MismatchedOperand {
        position,
        expr: node.expr.to_string(),
    }
    .into()
}

fn write_column(writer: &dyn SqlWriter, out: &mut ExecValue, column: &Column) {
    writer.write_identifier_quoted(out.sql_mut(), column.name());
}

fn compile_leaf(writer: &dyn SqlWriter, position: usize, node: &ExprNode) -> Result<ExecValue> {
    let operator = writer.expression_operator(node.expr);
    let mut out = ExecValue::default();
    match (node.expr, &node.operand) {
        (
            ExprType::Equal
            | ExprType::NotEqual
            | ExprType::Greater
            | ExprType::GreaterEqual
            | ExprType::Less
            | ExprType::LessEqual
            | ExprType::Like
            | ExprType::NotLike,
            Some(Operand::Value(v)),
        ) => {
            write_column(writer, &mut out, &v.column);
            out.push(&format!(" {} ?", operator), [v.value.clone()]);
        }
        (ExprType::Between | ExprType::NotBetween, Some(Operand::Range { column, low, high })) => {
            write_column(writer, &mut out, column);
            out.push(
                &format!(" {} ? AND ?", operator),
                [low.clone(), high.clone()],
            );
        }
        (ExprType::In | ExprType::NotIn, Some(Operand::List { column, values })) => {
            if values.is_empty() {
                return Err(QueryError::EmptyInList {
                    column: column.name().to_string(),
                }
                .into());
            }
            write_column(writer, &mut out, column);
            let sql = out.sql_mut();
            sql.push(' ');
            sql.push_str(operator);
            sql.push_str(" (");
            separated_by(sql, values, |sql, _| sql.push('?'), ",");
            sql.push(')');
            for value in values {
                out.push_arg(value.clone());
            }
        }
        (
            ExprType::Null | ExprType::NotNull,
            Some(operand @ (Operand::Column(..) | Operand::Value(..))),
        ) => {
            write_column(writer, &mut out, operand.column());
            out.push(&format!(" {}", operator), []);
        }
        _ => return Err(mismatched(position, node)),
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GenericSqlWriter;

    #[test]
    fn leaf_operators() {
        let writer = GenericSqlWriter::new();
        let cases = [
            (SearchList::eq("x", 1), r#""x" = ?"#),
            (SearchList::ne("x", 1), r#""x" <> ?"#),
            (SearchList::gt("x", 1), r#""x" > ?"#),
            (SearchList::ge("x", 1), r#""x" >= ?"#),
            (SearchList::lt("x", 1), r#""x" < ?"#),
            (SearchList::le("x", 1), r#""x" <= ?"#),
            (SearchList::like("x", "a%"), r#""x" LIKE ?"#),
            (SearchList::not_like("x", "a%"), r#""x" NOT LIKE ?"#),
            (SearchList::between("x", 1, 2), r#""x" BETWEEN ? AND ?"#),
            (SearchList::not_between("x", 1, 2), r#""x" NOT BETWEEN ? AND ?"#),
            (SearchList::is_null("x"), r#""x" IS NULL"#),
            (SearchList::not_null("x"), r#""x" IS NOT NULL"#),
        ];
        for (search, expected) in cases {
            let exec = compile(&writer, &search).expect("Leaf should compile");
            assert_eq!(exec.sql(), expected);
            assert_eq!(
                crate::count_placeholders(exec.sql()),
                exec.args().len(),
                "Placeholders and arguments must match for {}",
                expected
            );
        }
    }

    #[test]
    fn combinator_carrying_operand() {
        let mut nodes = SearchList::eq("a", 1).and(SearchList::eq("b", 2)).nodes().to_vec();
        nodes[2].operand = Some(Operand::Column("c".into()));
        let error = compile(&GenericSqlWriter::new(), &nodes.into())
            .expect_err("And with an operand must be rejected");
        assert!(matches!(
            error.downcast_ref::<QueryError>(),
            Some(QueryError::MismatchedOperand { position: 2, .. })
        ));
    }
}
