//! Evaluator: runs a relational algebra AST against named Polars dataframes
//!
//! Relations are sets, so every operator that could produce duplicate rows
//! (projection, union, intersection, difference) drops them, keeping the first
//! occurrence in input order.

use indexmap::IndexMap;
use polars::prelude::*;
use thiserror::Error;

use crate::ast::{Node, NodeKind};
use crate::condition::{
    CmpOp, ConditionError, Literal, Operand, Predicate, parse_attributes, parse_predicate,
};
use crate::parse::RelationRegistry;
use crate::symbols::{Category, Operator};

#[derive(Error, Debug)]
pub enum EvalError {
    #[error("Unknown relation: {0}")]
    UnknownRelation(String),

    #[error("Unknown column '{column}' in {context}")]
    UnknownColumn { column: String, context: String },

    #[error("Incompatible schemas for {op}: {lhs:?} vs {rhs:?}")]
    IncompatibleSchemas {
        op: &'static str,
        lhs: Vec<String>,
        rhs: Vec<String>,
    },

    #[error("{op} is not a {role} operator")]
    MisplacedOperator {
        op: &'static str,
        role: &'static str,
    },

    #[error("Condition error: {0}")]
    Condition(#[from] ConditionError),

    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
}

type Result<T> = std::result::Result<T, EvalError>;

/// Named relations available to an expression
#[derive(Clone, Default)]
pub struct Catalog {
    /// Insertion-ordered so listings are stable
    tables: IndexMap<String, DataFrame>,
}

impl Catalog {
    pub fn new() -> Self {
        Self {
            tables: IndexMap::new(),
        }
    }

    /// Add a relation, builder style
    pub fn with_table(mut self, name: impl Into<String>, df: DataFrame) -> Self {
        self.insert(name, df);
        self
    }

    /// Add or replace a relation
    pub fn insert(&mut self, name: impl Into<String>, df: DataFrame) {
        self.tables.insert(name.into(), df);
    }

    pub fn get(&self, name: &str) -> Option<&DataFrame> {
        self.tables.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl RelationRegistry for Catalog {
    fn contains_relation(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }
}

impl Node {
    /// Build the lazy query plan for this subtree
    pub fn resolve(&self, catalog: &Catalog) -> Result<LazyFrame> {
        resolve(self, catalog)
    }
}

/// Evaluate `node` and collect the result
pub fn eval(node: &Node, catalog: &Catalog) -> Result<DataFrame> {
    Ok(resolve(node, catalog)?.collect()?)
}

pub fn resolve(node: &Node, catalog: &Catalog) -> Result<LazyFrame> {
    if let Some(op) = node.operator() {
        log::debug!("resolving {} node: {}", op.name(), node.source());
    }
    match &node.kind {
        NodeKind::Relation { name } => catalog
            .get(name)
            .map(|df| df.clone().lazy())
            .ok_or_else(|| EvalError::UnknownRelation(name.clone())),
        NodeKind::Unary {
            op,
            operand,
            condition,
        } => {
            let input = resolve(operand, catalog)?;
            eval_unary(*op, input, condition)
        }
        NodeKind::SetOp { op, lhs, rhs } => {
            eval_set_op(*op, resolve(lhs, catalog)?, resolve(rhs, catalog)?)
        }
        NodeKind::Join { op, lhs, rhs } => {
            eval_join(*op, resolve(lhs, catalog)?, resolve(rhs, catalog)?)
        }
        NodeKind::ConditionalJoin {
            op,
            lhs,
            rhs,
            condition,
        } => {
            let joined = eval_join(*op, resolve(lhs, catalog)?, resolve(rhs, catalog)?)?;
            filter(joined, condition)
        }
    }
}

// ============ Operators ============

fn eval_unary(op: Operator, input: LazyFrame, condition: &str) -> Result<LazyFrame> {
    match op {
        Operator::Select => filter(input, condition),
        Operator::Project => {
            let columns = column_names(&input)?;
            let attrs = parse_attributes(condition)?;
            if let Some(missing) = attrs.iter().find(|a| !columns.contains(*a)) {
                return Err(EvalError::UnknownColumn {
                    column: missing.clone(),
                    context: format!("projection {{{condition}}}"),
                });
            }
            let exprs: Vec<Expr> = attrs.iter().map(|a| col(a.as_str())).collect();
            Ok(input
                .select(exprs)
                .unique_stable(None, UniqueKeepStrategy::First))
        }
        _ => Err(misplaced(op, "unary")),
    }
}

fn eval_set_op(op: Operator, lhs: LazyFrame, rhs: LazyFrame) -> Result<LazyFrame> {
    if op.category() != Category::Set {
        return Err(misplaced(op, "set"));
    }
    let lhs_cols = column_names(&lhs)?;
    let rhs_cols = column_names(&rhs)?;
    if !same_columns(&lhs_cols, &rhs_cols) {
        return Err(EvalError::IncompatibleSchemas {
            op: op.name(),
            lhs: lhs_cols,
            rhs: rhs_cols,
        });
    }

    // Line the right side up with the left side's column order
    let keys: Vec<Expr> = lhs_cols.iter().map(|c| col(c.as_str())).collect();
    let rhs = rhs.select(keys.clone());

    let result = match op {
        Operator::Union => polars::prelude::concat([lhs, rhs], UnionArgs::default())?,
        Operator::Intersect => lhs.join(rhs, keys.clone(), keys, JoinArgs::new(JoinType::Semi)),
        Operator::Difference => lhs.join(rhs, keys.clone(), keys, JoinArgs::new(JoinType::Anti)),
        _ => return Err(misplaced(op, "set")),
    };
    Ok(result.unique_stable(None, UniqueKeepStrategy::First))
}

fn eval_join(op: Operator, lhs: LazyFrame, rhs: LazyFrame) -> Result<LazyFrame> {
    match op {
        Operator::NaturalJoin => {
            let lhs_cols = column_names(&lhs)?;
            let rhs_cols = column_names(&rhs)?;
            let common: Vec<Expr> = lhs_cols
                .iter()
                .filter(|c| rhs_cols.contains(*c))
                .map(|c| col(c.as_str()))
                .collect();
            if common.is_empty() {
                // No shared attributes: every pair of rows matches
                Ok(lhs.cross_join(rhs, None))
            } else {
                Ok(lhs.join(rhs, common.clone(), common, JoinArgs::new(JoinType::Inner)))
            }
        }
        Operator::Cartesian | Operator::ThetaJoin => Ok(lhs.cross_join(rhs, None)),
        _ => Err(misplaced(op, "join")),
    }
}

fn filter(input: LazyFrame, condition: &str) -> Result<LazyFrame> {
    let columns = column_names(&input)?;
    let predicate = parse_predicate(condition)?;
    Ok(input.filter(predicate_to_expr(&predicate, &columns)))
}

// ============ Predicates ============

fn predicate_to_expr(predicate: &Predicate, columns: &[String]) -> Expr {
    match predicate {
        Predicate::Compare(lhs, op, rhs) => {
            let l = operand_to_expr(lhs, columns);
            let r = operand_to_expr(rhs, columns);
            match op {
                CmpOp::Eq => l.eq(r),
                CmpOp::Ne => l.neq(r),
                CmpOp::Lt => l.lt(r),
                CmpOp::Le => l.lt_eq(r),
                CmpOp::Gt => l.gt(r),
                CmpOp::Ge => l.gt_eq(r),
            }
        }
        Predicate::And(lhs, rhs) => {
            predicate_to_expr(lhs, columns).and(predicate_to_expr(rhs, columns))
        }
        Predicate::Or(lhs, rhs) => {
            predicate_to_expr(lhs, columns).or(predicate_to_expr(rhs, columns))
        }
        Predicate::Not(inner) => predicate_to_expr(inner, columns).not(),
    }
}

fn operand_to_expr(operand: &Operand, columns: &[String]) -> Expr {
    match operand {
        Operand::Word(w) if columns.iter().any(|c| c == w) => col(w.as_str()),
        Operand::Word(w) => lit(w.clone()),
        Operand::Literal(Literal::String(s)) => lit(s.clone()),
        Operand::Literal(Literal::Int(n)) => lit(*n),
        Operand::Literal(Literal::Float(n)) => lit(*n),
        Operand::Literal(Literal::Bool(b)) => lit(*b),
    }
}

// ============ Helpers ============

/// Nodes assembled by hand can pair an operator with the wrong node kind
fn misplaced(op: Operator, role: &'static str) -> EvalError {
    EvalError::MisplacedOperator {
        op: op.name(),
        role,
    }
}

fn column_names(lf: &LazyFrame) -> Result<Vec<String>> {
    let schema = lf.clone().collect_schema()?;
    Ok(schema.iter().map(|(name, _)| name.to_string()).collect())
}

fn same_columns(lhs: &[String], rhs: &[String]) -> bool {
    lhs.len() == rhs.len() && lhs.iter().all(|c| rhs.contains(c))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse;

    fn catalog() -> Catalog {
        let r = df! {
            "A" => &[1, 2, 3],
            "B" => &["x", "y", "z"],
        }
        .unwrap();
        let s = df! {
            "B" => &["y", "z", "w"],
            "A" => &[2, 3, 4],
        }
        .unwrap();
        Catalog::new().with_table("R", r).with_table("S", s)
    }

    #[test]
    fn catalog_is_a_registry() {
        let catalog = catalog();
        assert!(catalog.contains_relation("R"));
        assert!(!catalog.contains_relation("Q"));
        assert_eq!(catalog.names().collect::<Vec<_>>(), vec!["R", "S"]);
    }

    #[test]
    fn union_aligns_column_order() {
        let node = parse("R ∪ S").unwrap();
        let df = eval(&node, &catalog()).unwrap();
        assert_eq!(df.height(), 4);
        let names: Vec<&str> = df.get_column_names().iter().map(|c| c.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn difference_removes_shared_rows() {
        let node = parse("R − S").unwrap();
        let df = eval(&node, &catalog()).unwrap();
        assert_eq!(df.height(), 1);
        assert_eq!(df.column("A").unwrap().i32().unwrap().get(0), Some(1));
    }

    #[test]
    fn unknown_relation() {
        let node = parse("R ∪ Q").unwrap();
        assert!(matches!(
            eval(&node, &catalog()),
            Err(EvalError::UnknownRelation(name)) if name == "Q"
        ));
    }

    #[test]
    fn misplaced_operator_is_an_error() {
        let node = Node {
            kind: NodeKind::Unary {
                op: Operator::Union,
                operand: Box::new(Node::relation("R")),
                condition: "A".into(),
            },
            source: "∪ {A} R".into(),
        };
        let err = eval(&node, &catalog()).unwrap_err();
        assert!(matches!(
            err,
            EvalError::MisplacedOperator { op: "union", role: "unary" }
        ));
        assert_eq!(err.to_string(), "union is not a unary operator");

        let node = Node {
            kind: NodeKind::Join {
                op: Operator::Difference,
                lhs: Box::new(Node::relation("R")),
                rhs: Box::new(Node::relation("S")),
            },
            source: "R − S".into(),
        };
        assert!(matches!(
            eval(&node, &catalog()),
            Err(EvalError::MisplacedOperator { role: "join", .. })
        ));
    }

    #[test]
    fn projection_checks_columns() {
        let node = parse("π {A, Z} R").unwrap();
        assert!(matches!(
            eval(&node, &catalog()),
            Err(EvalError::UnknownColumn { column, .. }) if column == "Z"
        ));
    }
}
