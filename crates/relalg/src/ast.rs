//! AST for relational algebra expressions
//!
//! Every node owns its children and remembers the slice of input it was
//! parsed from, so the original text can be shown back to the user.

use serde::Serialize;

use crate::parse::ParseErrorKind;
use crate::symbols::{Category, Operator};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub kind: NodeKind,
    /// Input text this node was parsed from. Parenthesized sub-expressions
    /// keep their parentheses.
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
    /// Bare relation name: `R`
    Relation { name: String },

    /// Union, intersection or difference: `R ∪ S`
    SetOp {
        op: Operator,
        lhs: Box<Node>,
        rhs: Box<Node>,
    },

    /// Selection or projection: `σ {A > 3} R`, `π {A, B} R`
    Unary {
        op: Operator,
        operand: Box<Node>,
        condition: String,
    },

    /// Join without a condition: `R ⋈ S`, `R × S`
    Join {
        op: Operator,
        lhs: Box<Node>,
        rhs: Box<Node>,
    },

    /// Join with a theta condition: `R θ {A = F} S`
    ConditionalJoin {
        op: Operator,
        lhs: Box<Node>,
        rhs: Box<Node>,
        condition: String,
    },
}

impl Node {
    pub fn relation(name: impl Into<String>) -> Self {
        let name = name.into();
        Node {
            source: name.clone(),
            kind: NodeKind::Relation { name },
        }
    }

    /// Assemble a composite node from the pieces collected by the parser.
    ///
    /// `op`'s category decides which pieces are required: set operators take
    /// two operands and no condition, unary operators one operand and a
    /// non-empty condition, joins two operands and an optional condition.
    pub fn build(
        op: Operator,
        lhs: Option<Node>,
        rhs: Option<Node>,
        condition: Option<String>,
        source: &str,
    ) -> Result<Node, ParseErrorKind> {
        let condition = condition.filter(|c| !c.is_empty());
        let kind = match op.category() {
            Category::Set => {
                let (Some(lhs), Some(rhs)) = (lhs, rhs) else {
                    return Err(ParseErrorKind::MissingOperand(op));
                };
                if condition.is_some() {
                    return Err(ParseErrorKind::UnexpectedCondition(op));
                }
                NodeKind::SetOp {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                }
            }
            Category::Unary => {
                let Some(operand) = lhs else {
                    return Err(ParseErrorKind::MissingOperand(op));
                };
                let Some(condition) = condition else {
                    return Err(ParseErrorKind::MissingCondition(op));
                };
                NodeKind::Unary {
                    op,
                    operand: Box::new(operand),
                    condition,
                }
            }
            Category::Join => {
                let (Some(lhs), Some(rhs)) = (lhs, rhs) else {
                    return Err(ParseErrorKind::MissingOperand(op));
                };
                match condition {
                    None => NodeKind::Join {
                        op,
                        lhs: Box::new(lhs),
                        rhs: Box::new(rhs),
                    },
                    Some(condition) => NodeKind::ConditionalJoin {
                        op,
                        lhs: Box::new(lhs),
                        rhs: Box::new(rhs),
                        condition,
                    },
                }
            }
        };
        Ok(Node {
            kind,
            source: source.to_string(),
        })
    }

    /// The text this node was parsed from
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn operator(&self) -> Option<Operator> {
        match &self.kind {
            NodeKind::Relation { .. } => None,
            NodeKind::SetOp { op, .. }
            | NodeKind::Unary { op, .. }
            | NodeKind::Join { op, .. }
            | NodeKind::ConditionalJoin { op, .. } => Some(*op),
        }
    }

    pub fn condition(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Unary { condition, .. } | NodeKind::ConditionalJoin { condition, .. } => {
                Some(condition)
            }
            _ => None,
        }
    }

    pub fn children(&self) -> Vec<&Node> {
        match &self.kind {
            NodeKind::Relation { .. } => Vec::new(),
            NodeKind::Unary { operand, .. } => vec![operand.as_ref()],
            NodeKind::SetOp { lhs, rhs, .. }
            | NodeKind::Join { lhs, rhs, .. }
            | NodeKind::ConditionalJoin { lhs, rhs, .. } => vec![lhs.as_ref(), rhs.as_ref()],
        }
    }

    /// Relation names referenced by this subtree, left to right
    pub fn relation_names(&self) -> Vec<&str> {
        match &self.kind {
            NodeKind::Relation { name } => vec![name.as_str()],
            _ => self
                .children()
                .into_iter()
                .flat_map(Node::relation_names)
                .collect(),
        }
    }

    pub fn is_relation(&self) -> bool {
        matches!(self.kind, NodeKind::Relation { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_set_op_requires_both_operands() {
        let err = Node::build(Operator::Union, Some(Node::relation("R")), None, None, "R ∪").unwrap_err();
        assert_eq!(err, ParseErrorKind::MissingOperand(Operator::Union));
    }

    #[test]
    fn build_set_op_rejects_condition() {
        let err = Node::build(
            Operator::Union,
            Some(Node::relation("R")),
            Some(Node::relation("S")),
            Some("A = 1".into()),
            "R ∪ {A = 1} S",
        )
        .unwrap_err();
        assert_eq!(err, ParseErrorKind::UnexpectedCondition(Operator::Union));
    }

    #[test]
    fn build_unary_requires_condition() {
        let err = Node::build(Operator::Select, Some(Node::relation("R")), None, Some(String::new()), "σ R")
            .unwrap_err();
        assert_eq!(err, ParseErrorKind::MissingCondition(Operator::Select));
    }

    #[test]
    fn build_join_picks_variant_by_condition() {
        let plain = Node::build(
            Operator::NaturalJoin,
            Some(Node::relation("U")),
            Some(Node::relation("V")),
            None,
            "U ⋈ V",
        )
        .unwrap();
        assert!(matches!(plain.kind, NodeKind::Join { .. }));
        assert_eq!(plain.source(), "U ⋈ V");

        let theta = Node::build(
            Operator::ThetaJoin,
            Some(Node::relation("R")),
            Some(Node::relation("T")),
            Some("A = F".into()),
            "R θ {A = F} T",
        )
        .unwrap();
        assert_eq!(theta.condition(), Some("A = F"));
        assert_eq!(theta.relation_names(), vec!["R", "T"]);
    }
}
