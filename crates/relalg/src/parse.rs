//! Parser for relational algebra expressions
//!
//! A single left-to-right scan over symbolized text (see
//! [`crate::symbols::symbolize`]) driven by a small mode machine. There is no
//! precedence: `R ∪ S ∩ T` is `(R ∪ S) ∩ T`. Parenthesized segments are parsed
//! by a fresh parser one level deeper.
//!
//! Tokens:
//! - whitespace separates tokens and is otherwise ignored
//! - `{...}` is a condition, captured verbatim and attached to the operator
//!   being built
//! - a canonical operator symbol (`σ π ∪ ∩ − ⋈ × θ`)
//! - a relation name (see [`is_valid_relation_char`]) or `(...)`

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::hash::BuildHasher;

use thiserror::Error;

use crate::ast::Node;
use crate::symbols::{Category, Operator, is_valid_relation_char};

/// Nesting limit for parenthesized sub-expressions
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Height limit for the built tree. Operator chains grow the tree without
/// any parentheses, so they are bounded separately.
pub const DEFAULT_MAX_TREE_DEPTH: usize = 1024;

// ============ Errors ============

/// What the parser expects next
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Nothing consumed yet: a prefix operator or an operand
    Start,
    /// An operator was read: a relation or `(`
    ExpectOperand,
    /// A complete left operand exists: a binary operator
    ExpectOperator,
    /// All pieces are present; assemble a node before reading on
    Build,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Mode::Start => "start",
            Mode::ExpectOperand => "expect-operand",
            Mode::ExpectOperator => "expect-operator",
            Mode::Build => "build",
        };
        write!(f, "{}", s)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    #[error("unexpected token")]
    UnexpectedToken,

    #[error("prefix operator after a complete operand")]
    UnexpectedUnaryPlacement,

    #[error("unbalanced parenthesis")]
    UnbalancedParenthesis,

    #[error("empty parenthesized expression")]
    EmptyParenthesizedExpression,

    #[error("expected a relation name")]
    EmptyIdentifier,

    #[error("unknown relation '{0}'")]
    UnknownRelation(String),

    #[error("no operator to build")]
    UnknownOperator,

    #[error("{} is missing an operand", .0.name())]
    MissingOperand(Operator),

    #[error("{} requires a condition", .0.name())]
    MissingCondition(Operator),

    #[error("{} does not take a condition", .0.name())]
    UnexpectedCondition(Operator),

    #[error("unterminated condition, expected '}}'")]
    UnterminatedCondition,

    #[error("no relation built")]
    NoRelationBuilt,

    #[error("unexpected end of input, an operator, condition or operand is unfinished")]
    DanglingState,

    #[error("parentheses nested deeper than {0} levels")]
    MaxNestingExceeded(usize),

    #[error("expression tree deeper than {0} levels")]
    MaxTreeDepthExceeded(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    /// Character index into the text of the (sub-)expression being parsed
    pub position: usize,
    /// Offending character, if the error was raised on one
    pub found: Option<char>,
    pub mode: Mode,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at position {}", self.kind, self.position)?;
        if let Some(c) = self.found {
            write!(f, " (found '{}')", c)?;
        }
        write!(f, " in {} mode", self.mode)
    }
}

impl std::error::Error for ParseError {}

// ============ Relation registries ============

/// Set of relation names the parser may check operands against
pub trait RelationRegistry {
    fn contains_relation(&self, name: &str) -> bool;
}

impl<S: BuildHasher> RelationRegistry for HashSet<String, S> {
    fn contains_relation(&self, name: &str) -> bool {
        self.contains(name)
    }
}

impl<V, S: BuildHasher> RelationRegistry for HashMap<String, V, S> {
    fn contains_relation(&self, name: &str) -> bool {
        self.contains_key(name)
    }
}

impl RelationRegistry for BTreeSet<String> {
    fn contains_relation(&self, name: &str) -> bool {
        self.contains(name)
    }
}

impl<const N: usize> RelationRegistry for [&str; N] {
    fn contains_relation(&self, name: &str) -> bool {
        self.iter().any(|known| *known == name)
    }
}

impl RelationRegistry for Vec<String> {
    fn contains_relation(&self, name: &str) -> bool {
        self.iter().any(|known| known == name)
    }
}

// ============ Context ============

/// Parser configuration, shared by every nested sub-parse
#[derive(Clone, Copy)]
pub struct ParseContext<'r> {
    relations: Option<&'r dyn RelationRegistry>,
    trace: bool,
    max_depth: usize,
    max_tree_depth: usize,
}

impl<'r> ParseContext<'r> {
    pub fn new() -> Self {
        Self {
            relations: None,
            trace: false,
            max_depth: DEFAULT_MAX_DEPTH,
            max_tree_depth: DEFAULT_MAX_TREE_DEPTH,
        }
    }

    /// Reject relation names missing from `relations`
    pub fn with_relations(mut self, relations: &'r dyn RelationRegistry) -> Self {
        self.relations = Some(relations);
        self
    }

    /// Log state transitions and built nodes at trace level
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_max_tree_depth(mut self, max_tree_depth: usize) -> Self {
        self.max_tree_depth = max_tree_depth;
        self
    }

    pub fn trace(&self) -> bool {
        self.trace
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn max_tree_depth(&self) -> usize {
        self.max_tree_depth
    }
}

impl Default for ParseContext<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ParseContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseContext")
            .field("relations", &self.relations.is_some())
            .field("trace", &self.trace)
            .field("max_depth", &self.max_depth)
            .field("max_tree_depth", &self.max_tree_depth)
            .finish()
    }
}

// ============ Entry points ============

/// Parse a symbolized expression without a relation registry
pub fn parse(input: &str) -> Result<Node, ParseError> {
    parse_with(input, &ParseContext::new())
}

/// Parse a symbolized expression with the given configuration
pub fn parse_with(input: &str, ctx: &ParseContext<'_>) -> Result<Node, ParseError> {
    Parser::new(input, ctx, 0).run().map(|(node, _)| node)
}

// ============ Scanner ============

/// Character classes the mode machine dispatches on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Space,
    ConditionOpen,
    Operator(Operator),
    RelationStart,
    ParenOpen,
    Other,
}

impl Token {
    fn classify(c: char) -> Token {
        if c.is_whitespace() {
            Token::Space
        } else if c == '{' {
            Token::ConditionOpen
        } else if c == '(' {
            Token::ParenOpen
        } else if let Some(op) = Operator::from_symbol(c) {
            Token::Operator(op)
        } else if is_valid_relation_char(c) {
            Token::RelationStart
        } else {
            Token::Other
        }
    }
}

struct Parser<'a> {
    text: &'a str,
    ctx: &'a ParseContext<'a>,
    depth: usize,
    /// Byte offset of the next unread character
    pos: usize,
    mode: Mode,
    lhs: Option<Node>,
    rhs: Option<Node>,
    op: Option<Operator>,
    condition: Option<String>,
    /// Heights of the trees held in `lhs` and `rhs`
    lhs_height: usize,
    rhs_height: usize,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str, ctx: &'a ParseContext<'a>, depth: usize) -> Self {
        Self {
            text,
            ctx,
            depth,
            pos: 0,
            mode: Mode::Start,
            lhs: None,
            rhs: None,
            op: None,
            condition: None,
            lhs_height: 0,
            rhs_height: 0,
        }
    }

    /// Parse the whole text, returning the root and its height
    fn run(mut self) -> Result<(Node, usize), ParseError> {
        if self.ctx.trace {
            log::debug!("depth {}: parsing {:?}", self.depth, self.text);
        }

        loop {
            // Build consumes no input, so it runs once more after the last character
            if self.mode == Mode::Build {
                self.build()?;
                continue;
            }
            let Some(c) = self.peek() else { break };
            self.step(c)?;
        }

        self.finish()
    }

    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    /// Dispatch one token on the current mode
    fn step(&mut self, c: char) -> Result<(), ParseError> {
        match (Token::classify(c), self.mode) {
            (Token::Space, _) => {
                self.pos += c.len_utf8();
                Ok(())
            }
            // Legal in any mode; whether the operator takes one is checked at build time
            (Token::ConditionOpen, _) => self.scan_condition(),
            (Token::Operator(op), Mode::Start | Mode::ExpectOperator) => self.accept_operator(op, c),
            (Token::ParenOpen, Mode::Start | Mode::ExpectOperand) => {
                let (node, height) = self.scan_parenthesized()?;
                self.accept_operand(node, height);
                Ok(())
            }
            (Token::RelationStart, Mode::Start | Mode::ExpectOperand) => {
                let node = self.scan_relation()?;
                self.accept_operand(node, 1);
                Ok(())
            }
            _ => Err(self.error(ParseErrorKind::UnexpectedToken, Some(c))),
        }
    }

    fn scan_condition(&mut self) -> Result<(), ParseError> {
        let start = self.pos + '{'.len_utf8();
        let Some(len) = self.text[start..].find('}') else {
            return Err(self.error(ParseErrorKind::UnterminatedCondition, Some('{')));
        };
        let condition = &self.text[start..start + len];
        if self.ctx.trace {
            log::trace!("index {}: found condition {:?}", self.pos, condition);
        }
        self.condition = Some(condition.to_string());
        self.pos = start + len + '}'.len_utf8();
        Ok(())
    }

    fn accept_operator(&mut self, op: Operator, c: char) -> Result<(), ParseError> {
        if op.category() == Category::Unary && self.mode != Mode::Start {
            return Err(self.error(ParseErrorKind::UnexpectedUnaryPlacement, Some(c)));
        }
        if self.ctx.trace {
            log::trace!("index {}: found operator {}", self.pos, op.name());
        }
        self.op = Some(op);
        self.pos += c.len_utf8();
        self.transition(Mode::ExpectOperand);
        Ok(())
    }

    fn scan_parenthesized(&mut self) -> Result<(Node, usize), ParseError> {
        let start = self.pos + '('.len_utf8();
        let mut depth = 1usize;
        let mut end = None;
        for (i, c) in self.text[start..].char_indices() {
            match c {
                '(' => depth += 1,
                ')' => depth -= 1,
                _ => continue,
            }
            if depth == 0 {
                end = Some(start + i);
                break;
            }
        }

        let Some(end) = end else {
            return Err(self.error(ParseErrorKind::UnbalancedParenthesis, Some('(')));
        };
        let inner = &self.text[start..end];
        if inner.is_empty() {
            return Err(self.error(ParseErrorKind::EmptyParenthesizedExpression, Some('(')));
        }
        if self.depth >= self.ctx.max_depth {
            return Err(self.error(
                ParseErrorKind::MaxNestingExceeded(self.ctx.max_depth),
                Some('('),
            ));
        }

        // Errors from the nested parse keep positions relative to `inner`
        let (mut node, height) = Parser::new(inner, self.ctx, self.depth + 1).run()?;
        node.source = format!("({})", node.source);
        self.pos = end + ')'.len_utf8();
        Ok((node, height))
    }

    fn scan_relation(&mut self) -> Result<Node, ParseError> {
        let start = self.pos;
        let len = self.text[start..]
            .char_indices()
            .find(|&(_, c)| !is_valid_relation_char(c))
            .map(|(i, _)| i)
            .unwrap_or(self.text.len() - start);
        let name = &self.text[start..start + len];

        if name.is_empty() {
            return Err(self.error(ParseErrorKind::EmptyIdentifier, self.peek()));
        }
        if let Some(relations) = self.ctx.relations
            && !relations.contains_relation(name)
        {
            return Err(self.error(ParseErrorKind::UnknownRelation(name.to_string()), self.peek()));
        }

        if self.ctx.trace {
            log::trace!("index {}: found relation {}", start, name);
        }
        self.pos = start + len;
        Ok(Node::relation(name))
    }

    /// Place a finished operand. Unary operators take it as their only
    /// operand; binary ones fill `lhs` first and `rhs` second.
    fn accept_operand(&mut self, node: Node, height: usize) {
        let unary = self.op.is_some_and(|op| op.category() == Category::Unary);
        if unary {
            self.lhs = Some(node);
            self.lhs_height = height;
            self.transition(Mode::Build);
        } else if self.lhs.is_none() {
            self.lhs = Some(node);
            self.lhs_height = height;
            self.transition(Mode::ExpectOperator);
        } else {
            self.rhs = Some(node);
            self.rhs_height = height;
            self.transition(Mode::Build);
        }
    }

    fn build(&mut self) -> Result<(), ParseError> {
        let Some(op) = self.op.take() else {
            return Err(self.error(ParseErrorKind::UnknownOperator, None));
        };
        let height = 1 + self.lhs_height.max(self.rhs_height);
        if height > self.ctx.max_tree_depth {
            return Err(self.error(
                ParseErrorKind::MaxTreeDepthExceeded(self.ctx.max_tree_depth),
                None,
            ));
        }
        let text = self.text;
        let node = Node::build(
            op,
            self.lhs.take(),
            self.rhs.take(),
            self.condition.take(),
            &text[..self.pos],
        )
        .map_err(|kind| self.error(kind, None))?;

        if self.ctx.trace {
            log::debug!("index {}: built {} node {:?}", self.pos, op.name(), node.source);
        }
        self.lhs = Some(node);
        self.lhs_height = height;
        self.rhs_height = 0;
        self.transition(Mode::ExpectOperator);
        Ok(())
    }

    fn finish(mut self) -> Result<(Node, usize), ParseError> {
        let Some(root) = self.lhs.take() else {
            return Err(self.error(ParseErrorKind::NoRelationBuilt, None));
        };
        let condition_pending = self.condition.as_deref().is_some_and(|c| !c.is_empty());
        if self.op.is_some() || self.rhs.is_some() || condition_pending {
            return Err(self.error(ParseErrorKind::DanglingState, None));
        }
        if self.ctx.trace {
            log::debug!("depth {}: returning {:?}", self.depth, root.source);
        }
        Ok((root, self.lhs_height))
    }

    fn transition(&mut self, mode: Mode) {
        if self.ctx.trace {
            log::trace!("index {}: {} -> {}", self.pos, self.mode, mode);
        }
        self.mode = mode;
    }

    fn error(&self, kind: ParseErrorKind, found: Option<char>) -> ParseError {
        ParseError {
            kind,
            position: self.text[..self.pos].chars().count(),
            found,
            mode: self.mode,
        }
    }
}

// ============ Sanity Tests ============
// Most testing is done via integration tests in tests/integration.rs
