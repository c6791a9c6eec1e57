//! Operator symbols, their categories, and text normalization
//!
//! The parser only understands canonical single-character symbols. Users
//! usually type aliases (`select_`, `union`, `join_`), so queries go through
//! [`symbolize`] first.

use serde::Serialize;

/// Operand shape an operator requires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Category {
    /// Binary set algebra: both operands share a schema
    Set,
    /// Prefix operator with one operand and a mandatory condition
    Unary,
    /// Binary join, condition optional
    Join,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Operator {
    // Unary
    Select,
    Project,

    // Set
    Union,
    Intersect,
    Difference,

    // Join
    NaturalJoin,
    Cartesian,
    ThetaJoin,
}

/// Alias table, applied in order by [`symbolize`].
///
/// `thetajoin_` must come before `join_`, otherwise the latter would eat the
/// tail of the former. `X` rewrites every capital X in the input, including
/// inside relation names and conditions.
pub const ALIASES: &[(&str, Operator)] = &[
    ("select_", Operator::Select),
    ("project_", Operator::Project),
    ("union", Operator::Union),
    ("intersect", Operator::Intersect),
    ("difference", Operator::Difference),
    ("minus", Operator::Difference),
    ("thetajoin_", Operator::ThetaJoin),
    ("join_", Operator::NaturalJoin),
    ("cross_", Operator::Cartesian),
    ("*", Operator::Cartesian),
    ("X", Operator::Cartesian),
];

pub const OPERATORS: [Operator; 8] = [
    Operator::Select,
    Operator::Project,
    Operator::Union,
    Operator::Intersect,
    Operator::Difference,
    Operator::NaturalJoin,
    Operator::Cartesian,
    Operator::ThetaJoin,
];

/// Characters with structural meaning that never belong to a relation name
const STRUCTURAL: [char; 5] = ['{', '}', '(', ')', ' '];

impl Operator {
    pub const fn symbol(self) -> char {
        match self {
            Operator::Select => 'σ',
            Operator::Project => 'π',
            Operator::Union => '∪',
            Operator::Intersect => '∩',
            Operator::Difference => '−',
            Operator::NaturalJoin => '⋈',
            Operator::Cartesian => '×',
            Operator::ThetaJoin => 'θ',
        }
    }

    pub fn from_symbol(c: char) -> Option<Operator> {
        OPERATORS.into_iter().find(|op| op.symbol() == c)
    }

    pub const fn category(self) -> Category {
        match self {
            Operator::Select | Operator::Project => Category::Unary,
            Operator::Union | Operator::Intersect | Operator::Difference => Category::Set,
            Operator::NaturalJoin | Operator::Cartesian | Operator::ThetaJoin => Category::Join,
        }
    }

    /// Human-readable name, used in traces and tree output
    pub const fn name(self) -> &'static str {
        match self {
            Operator::Select => "select",
            Operator::Project => "project",
            Operator::Union => "union",
            Operator::Intersect => "intersect",
            Operator::Difference => "difference",
            Operator::NaturalJoin => "join",
            Operator::Cartesian => "cross",
            Operator::ThetaJoin => "theta-join",
        }
    }
}

/// Returns true if `c` is one of the canonical operator symbols
pub fn is_operator_symbol(c: char) -> bool {
    Operator::from_symbol(c).is_some()
}

/// Replace every operator alias with its canonical symbol.
///
/// Each alias is replaced as written, then in upper case, in [`ALIASES`]
/// order. Canonical symbols never appear inside an alias, so running this
/// twice is the same as running it once.
pub fn symbolize(line: &str) -> String {
    let mut result = line.to_string();
    for &(alias, op) in ALIASES {
        let mut buf = [0u8; 4];
        let symbol: &str = op.symbol().encode_utf8(&mut buf);
        result = result.replace(alias, symbol);
        result = result.replace(&alias.to_uppercase(), symbol);
    }
    result
}

/// Whether `c` may be part of a relation name
pub fn is_valid_relation_char(c: char) -> bool {
    c.is_alphanumeric() && !STRUCTURAL.contains(&c) && !is_operator_symbol(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbols_round_trip() {
        for op in OPERATORS {
            assert_eq!(Operator::from_symbol(op.symbol()), Some(op));
        }
        assert_eq!(Operator::from_symbol('R'), None);
    }

    #[test]
    fn every_alias_maps_to_a_distinct_non_alias_symbol() {
        for &(alias, op) in ALIASES {
            assert!(!alias.contains(op.symbol()));
            for other in OPERATORS {
                assert!(!alias.contains(other.symbol()), "{alias} contains {other:?}");
            }
        }
    }

    #[test]
    fn symbolize_aliases() {
        assert_eq!(symbolize("select_ {E = apple} R"), "σ {E = apple} R");
        assert_eq!(symbolize("U join_ V"), "U ⋈ V");
        assert_eq!(symbolize("(R union S) intersect T"), "(R ∪ S) ∩ T");
        assert_eq!(symbolize("R UNION S"), "R ∪ S");
        assert_eq!(symbolize("U * V"), "U × V");
        assert_eq!(symbolize("U X V"), "U × V");
    }

    #[test]
    fn symbolize_prefers_longer_join_alias() {
        assert_eq!(symbolize("R thetajoin_ {A = F} T"), "R θ {A = F} T");
    }

    #[test]
    fn symbolize_rewrites_capital_x_inside_names() {
        // Known hazard of the alias table: `X` is an alias for the cartesian product.
        assert_eq!(symbolize("TAX"), "TA×");
    }

    #[test]
    fn symbolize_is_idempotent_on_examples() {
        for line in ["select_ {E = apple} R", "(R union S) minus T", "project_ {A} (U X V)"] {
            let once = symbolize(line);
            assert_eq!(symbolize(&once), once);
        }
    }

    #[test]
    fn relation_chars() {
        assert!(is_valid_relation_char('R'));
        assert!(is_valid_relation_char('7'));
        assert!(is_valid_relation_char('é'));
        assert!(!is_valid_relation_char('_'));
        assert!(!is_valid_relation_char(' '));
        assert!(!is_valid_relation_char('('));
        assert!(!is_valid_relation_char('{'));
        // Greek symbols are alphanumeric but reserved
        assert!(!is_valid_relation_char('σ'));
        assert!(!is_valid_relation_char('π'));
        assert!(!is_valid_relation_char('θ'));
        assert!(!is_valid_relation_char('∪'));
    }
}
