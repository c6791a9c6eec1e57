//! Pretty printing for relational algebra ASTs
//!
//! `Display` renders the canonical one-line form: symbols instead of aliases,
//! single spaces, and parentheses only where the left-to-right reading would
//! otherwise change. The output parses back to the same tree.
//!
//! [`pretty`] renders an indented operator tree for inspection.

use std::fmt::{self, Display, Write};

use crate::ast::{Node, NodeKind};
use crate::symbols::Operator;

// ============ Display (single-line) ============

impl Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            NodeKind::Relation { name } => write!(f, "{}", name),
            NodeKind::Unary {
                op,
                operand,
                condition,
            } => {
                write!(f, "{} {{{}}} ", op, condition)?;
                write_operand(f, operand)
            }
            // The left operand never needs parentheses: everything left of
            // an operator has already been reduced to one node.
            NodeKind::SetOp { op, lhs, rhs } | NodeKind::Join { op, lhs, rhs } => {
                write!(f, "{} {} ", lhs, op)?;
                write_operand(f, rhs)
            }
            NodeKind::ConditionalJoin {
                op,
                lhs,
                rhs,
                condition,
            } => {
                write!(f, "{} {} {{{}}} ", lhs, op, condition)?;
                write_operand(f, rhs)
            }
        }
    }
}

/// Operands other than bare relations are parenthesized
fn write_operand(f: &mut fmt::Formatter<'_>, node: &Node) -> fmt::Result {
    if node.is_relation() {
        write!(f, "{}", node)
    } else {
        write!(f, "({})", node)
    }
}

// ============ Tree (multi-line) ============

/// Render `node` as an indented tree, one node per line.
///
/// ```text
/// ∩ intersect
///   ∪ union
///     R
///     S
///   T
/// ```
pub fn pretty(node: &Node) -> String {
    let mut out = String::new();
    write_tree(&mut out, node, 0);
    out
}

fn write_tree(out: &mut String, node: &Node, depth: usize) {
    let indent = "  ".repeat(depth);
    match (&node.kind, node.operator()) {
        (NodeKind::Relation { name }, _) => {
            let _ = writeln!(out, "{indent}{name}");
        }
        (_, Some(op)) => {
            let _ = write!(out, "{indent}{} {}", op, op.name());
            if let Some(condition) = node.condition() {
                let _ = write!(out, " {{{condition}}}");
            }
            out.push('\n');
            for child in node.children() {
                write_tree(out, child, depth + 1);
            }
        }
        (_, None) => {}
    }
}
