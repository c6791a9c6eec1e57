//! Parser for condition text
//!
//! The expression parser captures `{...}` blocks verbatim. Their meaning
//! depends on the operator: selections and theta-joins carry a predicate,
//! projections carry a comma-separated attribute list.
//!
//! Predicate grammar, loosest binding first:
//!
//! ```text
//! or         := and (("or" | "||" | "|") and)*
//! and        := not (("and" | "&&" | "&") not)*
//! not        := ("not" | "!") not | "(" or ")" | comparison
//! comparison := operand cmp operand
//! cmp        := "==" | "!=" | "<>" | "<=" | ">=" | "=" | "<" | ">"
//! operand    := float | int | 'text' | "text" | true | false | word
//! ```

use thiserror::Error;
use winnow::ascii::{Caseless, digit1, multispace0};
use winnow::combinator::{alt, delimited, not, opt, preceded, repeat, terminated};
use winnow::prelude::*;
use winnow::token::{one_of, take_till, take_while};

type PResult<T> = winnow::ModalResult<T>;

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Compare(Operand, CmpOp, Operand),
    And(Box<Predicate>, Box<Predicate>),
    Or(Box<Predicate>, Box<Predicate>),
    Not(Box<Predicate>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// Bare word: a column if the relation has one by that name, text otherwise
    Word(String),
    Literal(Literal),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConditionError {
    #[error("invalid condition '{condition}' at offset {offset}")]
    Invalid { condition: String, offset: usize },

    #[error("empty attribute name in '{0}'")]
    EmptyAttribute(String),
}

/// Parse a selection or join predicate
pub fn parse_predicate(condition: &str) -> Result<Predicate, ConditionError> {
    let input = condition.trim();
    let mut stream = input;
    let invalid = |stream: &str| ConditionError::Invalid {
        condition: condition.to_string(),
        offset: input.len().saturating_sub(stream.len()),
    };
    match terminated(or_pred, ws).parse_next(&mut stream) {
        Ok(predicate) if stream.is_empty() => Ok(predicate),
        Ok(_) | Err(_) => Err(invalid(stream)),
    }
}

/// Parse a projection's attribute list: `A, C, E`
pub fn parse_attributes(condition: &str) -> Result<Vec<String>, ConditionError> {
    condition
        .split(',')
        .map(|attr| match attr.trim() {
            "" => Err(ConditionError::EmptyAttribute(condition.to_string())),
            name => Ok(name.to_string()),
        })
        .collect()
}

// ============ Connectives ============

fn or_pred(input: &mut &str) -> PResult<Predicate> {
    let first = and_pred.parse_next(input)?;
    let rest: Vec<Predicate> =
        repeat(0.., preceded((ws, or_kw, ws), and_pred)).parse_next(input)?;
    Ok(rest.into_iter().fold(first, |l, r| {
        Predicate::Or(Box::new(l), Box::new(r))
    }))
}

fn and_pred(input: &mut &str) -> PResult<Predicate> {
    let first = not_pred.parse_next(input)?;
    let rest: Vec<Predicate> =
        repeat(0.., preceded((ws, and_kw, ws), not_pred)).parse_next(input)?;
    Ok(rest.into_iter().fold(first, |l, r| {
        Predicate::And(Box::new(l), Box::new(r))
    }))
}

fn not_pred(input: &mut &str) -> PResult<Predicate> {
    preceded(
        ws,
        alt((
            preceded((not_kw, ws), not_pred).map(|p| Predicate::Not(Box::new(p))),
            delimited(('(', ws), or_pred, (ws, ')')),
            comparison,
        )),
    )
    .parse_next(input)
}

fn or_kw(input: &mut &str) -> PResult<()> {
    alt((keyword("or"), "||".void(), "|".void())).parse_next(input)
}

fn and_kw(input: &mut &str) -> PResult<()> {
    alt((keyword("and"), "&&".void(), "&".void())).parse_next(input)
}

fn not_kw(input: &mut &str) -> PResult<()> {
    alt((keyword("not"), terminated("!", not('=')).void())).parse_next(input)
}

/// Case-insensitive keyword that is not the prefix of a longer word
fn keyword<'a>(kw: &'static str) -> impl FnMut(&mut &'a str) -> PResult<()> {
    move |input: &mut &'a str| {
        terminated(Caseless(kw), not(one_of(is_word_char)))
            .void()
            .parse_next(input)
    }
}

// ============ Comparisons ============

fn comparison(input: &mut &str) -> PResult<Predicate> {
    (operand, ws, cmp_op, ws, operand)
        .map(|(lhs, _, op, _, rhs)| Predicate::Compare(lhs, op, rhs))
        .parse_next(input)
}

fn cmp_op(input: &mut &str) -> PResult<CmpOp> {
    alt((
        "==".value(CmpOp::Eq),
        "!=".value(CmpOp::Ne),
        "<>".value(CmpOp::Ne),
        "<=".value(CmpOp::Le),
        ">=".value(CmpOp::Ge),
        "=".value(CmpOp::Eq),
        "<".value(CmpOp::Lt),
        ">".value(CmpOp::Gt),
    ))
    .parse_next(input)
}

fn operand(input: &mut &str) -> PResult<Operand> {
    alt((
        number.map(Operand::Literal),
        string_lit.map(|s| Operand::Literal(Literal::String(s))),
        keyword("true").value(Operand::Literal(Literal::Bool(true))),
        keyword("false").value(Operand::Literal(Literal::Bool(false))),
        word.map(Operand::Word),
    ))
    .parse_next(input)
}

// ============ Literals ============

fn number(input: &mut &str) -> PResult<Literal> {
    terminated(alt((float_lit, int_lit)), not(one_of(is_word_char))).parse_next(input)
}

fn float_lit(input: &mut &str) -> PResult<Literal> {
    (opt('-'), digit1, '.', digit1)
        .take()
        .try_map(|s: &str| s.parse::<f64>())
        .map(Literal::Float)
        .parse_next(input)
}

fn int_lit(input: &mut &str) -> PResult<Literal> {
    (opt('-'), digit1)
        .take()
        .try_map(|s: &str| s.parse::<i64>())
        .map(Literal::Int)
        .parse_next(input)
}

fn string_lit(input: &mut &str) -> PResult<String> {
    alt((
        delimited('\'', take_till(0.., '\''), '\''),
        delimited('"', take_till(0.., '"'), '"'),
    ))
    .map(|s: &str| s.to_string())
    .parse_next(input)
}

fn word(input: &mut &str) -> PResult<String> {
    take_while(1.., is_word_char)
        .map(|s: &str| s.to_string())
        .parse_next(input)
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

// ============ Whitespace ============

fn ws(input: &mut &str) -> PResult<()> {
    multispace0.void().parse_next(input)
}
