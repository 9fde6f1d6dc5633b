use crate::{Column, ColumnValue, Value};
use std::fmt::{self, Display};

/// Node kinds of a [`SearchList`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExprType {
    Equal,
    NotEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
    Between,
    NotBetween,
    In,
    NotIn,
    Like,
    NotLike,
    Null,
    NotNull,
    And,
    Or,
    Not,
    /// No-op, keeps positions aligned when a builder receives an empty side.
    Ignore,
}

impl ExprType {
    pub fn is_leaf(&self) -> bool {
        !self.is_combinator() && *self != ExprType::Ignore
    }
    pub fn is_combinator(&self) -> bool {
        matches!(self, ExprType::And | ExprType::Or | ExprType::Not)
    }
}

impl Display for ExprType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Payload of a leaf node.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// Scalar comparisons and `LIKE`.
    Value(ColumnValue),
    /// `BETWEEN`, lower bound first.
    Range {
        column: Column,
        low: Value,
        high: Value,
    },
    /// `IN`, values in iteration order.
    List { column: Column, values: Vec<Value> },
    /// `IS NULL`.
    Column(Column),
}

impl Operand {
    pub fn column(&self) -> &Column {
        match self {
            Operand::Value(v) => &v.column,
            Operand::Range { column, .. } => column,
            Operand::List { column, .. } => column,
            Operand::Column(column) => column,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExprNode {
    pub expr: ExprType,
    pub operand: Option<Operand>,
}

impl ExprNode {
    pub fn new(expr: ExprType, operand: Option<Operand>) -> Self {
        Self { expr, operand }
    }
    pub fn combinator(expr: ExprType) -> Self {
        Self {
            expr,
            operand: None,
        }
    }
}

/// Boolean condition in postfix order: operands first, then the combinator
/// applied to the most recent results.
///
/// ```rust
/// use quarry_core::SearchList;
/// // "age" > 18 AND ("name" LIKE 'a%' OR "name" IS NULL)
/// let search = SearchList::gt("age", 18)
///     .and(SearchList::like("name", "a%").or(SearchList::is_null("name")));
/// assert_eq!(search.len(), 5);
/// ```
#[derive(Default, Debug, Clone, PartialEq)]
pub struct SearchList {
    nodes: Vec<ExprNode>,
}

impl SearchList {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn from_nodes(nodes: Vec<ExprNode>) -> Self {
        Self { nodes }
    }

    pub fn nodes(&self) -> &[ExprNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether at least one leaf is present, lists made only of `Ignore` nodes have none.
    pub fn has_conditions(&self) -> bool {
        self.nodes.iter().any(|v| v.expr.is_leaf())
    }

    /// Single scalar comparison with an arbitrary operator.
    pub fn condition(expr: ExprType, column: impl Into<Column>, value: impl Into<Value>) -> Self {
        Self::from_nodes(vec![ExprNode::new(
            expr,
            Some(Operand::Value(ColumnValue::new(column, value))),
        )])
    }

    pub fn eq(column: impl Into<Column>, value: impl Into<Value>) -> Self {
        Self::condition(ExprType::Equal, column, value)
    }
    pub fn ne(column: impl Into<Column>, value: impl Into<Value>) -> Self {
        Self::condition(ExprType::NotEqual, column, value)
    }
    pub fn gt(column: impl Into<Column>, value: impl Into<Value>) -> Self {
        Self::condition(ExprType::Greater, column, value)
    }
    pub fn ge(column: impl Into<Column>, value: impl Into<Value>) -> Self {
        Self::condition(ExprType::GreaterEqual, column, value)
    }
    pub fn lt(column: impl Into<Column>, value: impl Into<Value>) -> Self {
        Self::condition(ExprType::Less, column, value)
    }
    pub fn le(column: impl Into<Column>, value: impl Into<Value>) -> Self {
        Self::condition(ExprType::LessEqual, column, value)
    }
    pub fn like(column: impl Into<Column>, pattern: impl Into<Value>) -> Self {
        Self::condition(ExprType::Like, column, pattern)
    }
    pub fn not_like(column: impl Into<Column>, pattern: impl Into<Value>) -> Self {
        Self::condition(ExprType::NotLike, column, pattern)
    }

    fn range(
        expr: ExprType,
        column: impl Into<Column>,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> Self {
        Self::from_nodes(vec![ExprNode::new(
            expr,
            Some(Operand::Range {
                column: column.into(),
                low: low.into(),
                high: high.into(),
            }),
        )])
    }
    pub fn between(
        column: impl Into<Column>,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> Self {
        Self::range(ExprType::Between, column, low, high)
    }
    pub fn not_between(
        column: impl Into<Column>,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> Self {
        Self::range(ExprType::NotBetween, column, low, high)
    }

    fn list<V: Into<Value>>(
        expr: ExprType,
        column: impl Into<Column>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self::from_nodes(vec![ExprNode::new(
            expr,
            Some(Operand::List {
                column: column.into(),
                values: values.into_iter().map(Into::into).collect(),
            }),
        )])
    }
    pub fn in_list<V: Into<Value>>(
        column: impl Into<Column>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self::list(ExprType::In, column, values)
    }
    pub fn not_in<V: Into<Value>>(
        column: impl Into<Column>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self::list(ExprType::NotIn, column, values)
    }

    pub fn is_null(column: impl Into<Column>) -> Self {
        Self::from_nodes(vec![ExprNode::new(
            ExprType::Null,
            Some(Operand::Column(column.into())),
        )])
    }
    pub fn not_null(column: impl Into<Column>) -> Self {
        Self::from_nodes(vec![ExprNode::new(
            ExprType::NotNull,
            Some(Operand::Column(column.into())),
        )])
    }

    fn combine(mut self, mut other: SearchList, expr: ExprType) -> Self {
        let expr = if !self.has_conditions() || !other.has_conditions() {
            ExprType::Ignore
        } else {
            expr
        };
        self.nodes.append(&mut other.nodes);
        self.nodes.push(ExprNode::combinator(expr));
        self
    }

    pub fn and(self, other: SearchList) -> Self {
        self.combine(other, ExprType::And)
    }

    pub fn or(self, other: SearchList) -> Self {
        self.combine(other, ExprType::Or)
    }

    pub fn not(mut self) -> Self {
        if self.has_conditions() {
            self.nodes.push(ExprNode::combinator(ExprType::Not));
        }
        self
    }

    fn fold(parts: impl IntoIterator<Item = Option<SearchList>>, expr: ExprType) -> Self {
        parts.into_iter().fold(SearchList::new(), |result, part| {
            match part {
                Some(part) => result.combine(part, expr),
                None => {
                    let mut result = result;
                    result.nodes.push(ExprNode::combinator(ExprType::Ignore));
                    result
                }
            }
        })
    }

    /// Conjunction of every present part, absent parts leave an `Ignore` node.
    pub fn all(parts: impl IntoIterator<Item = Option<SearchList>>) -> Self {
        Self::fold(parts, ExprType::And)
    }

    /// Disjunction of every present part, absent parts leave an `Ignore` node.
    pub fn any(parts: impl IntoIterator<Item = Option<SearchList>>) -> Self {
        Self::fold(parts, ExprType::Or)
    }
}

impl From<Vec<ExprNode>> for SearchList {
    fn from(value: Vec<ExprNode>) -> Self {
        Self::from_nodes(value)
    }
}
