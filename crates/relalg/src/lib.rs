//! relalg - relational algebra expressions over Polars dataframes
//!
//! Parses textual relational algebra into an AST and evaluates it against
//! named dataframes.
//!
//! ## Quick Start
//!
//! ```ignore
//! use relalg::{Catalog, run};
//!
//! let catalog = Catalog::new()
//!     .with_table("R", r)
//!     .with_table("S", s);
//!
//! let df = run("select_ {A > 2} (R union S)", &catalog)?;
//! ```
//!
//! ## Syntax
//!
//! | Operator     | Symbol | Aliases                | Form               |
//! |--------------|--------|------------------------|--------------------|
//! | selection    | `σ`    | `select_`              | `σ {A > 2} R`      |
//! | projection   | `π`    | `project_`             | `π {A, B} R`       |
//! | union        | `∪`    | `union`                | `R ∪ S`            |
//! | intersection | `∩`    | `intersect`            | `R ∩ S`            |
//! | difference   | `−`    | `difference`, `minus`  | `R − S`            |
//! | natural join | `⋈`    | `join_`                | `R ⋈ S`            |
//! | cartesian    | `×`    | `cross_`, `*`, `X`     | `R × S`            |
//! | theta-join   | `θ`    | `thetajoin_`           | `R θ {A = F} S`    |
//!
//! Operators apply strictly left to right; use parentheses to group.
//! Prefix operators (`σ`, `π`) must start their segment, so write
//! `R ∪ (σ {A > 2} S)`.
//!
//! ## Stages
//!
//! [`symbolize`] rewrites aliases to symbols, [`parse`] builds a [`Node`]
//! tree, [`eval`] runs it. [`run`] chains all three.

mod ast;
pub mod condition;
mod eval;
mod parse;
mod pretty;
mod symbols;

use polars::prelude::DataFrame;
use thiserror::Error;

// ============ Primary Public API ============

pub use ast::{Node, NodeKind};
pub use eval::{Catalog, EvalError, eval, resolve};
pub use parse::{
    DEFAULT_MAX_DEPTH, DEFAULT_MAX_TREE_DEPTH, Mode, ParseContext, ParseError, ParseErrorKind,
    RelationRegistry, parse, parse_with,
};
pub use pretty::pretty;
pub use symbols::{ALIASES, Category, OPERATORS, Operator, is_valid_relation_char, symbolize};

/// Symbolize and parse a query as typed by a user
pub fn parse_query(query: &str, ctx: &ParseContext<'_>) -> Result<Node, ParseError> {
    parse_with(&symbolize(query), ctx)
}

/// Run a one-off query, checking relation names against `catalog`
pub fn run(query: &str, catalog: &Catalog) -> Result<DataFrame, RelalgError> {
    let ctx = ParseContext::new().with_relations(catalog);
    let node = parse_query(query, &ctx)?;
    let result = eval(&node, catalog)?;
    Ok(result)
}

// ============ Errors ============

#[derive(Error, Debug)]
pub enum RelalgError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("Eval error: {0}")]
    Eval(#[from] EvalError),
}
