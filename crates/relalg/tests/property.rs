use relalg::{Node, NodeKind, Operator, ParseContext, ParseErrorKind, parse, parse_with, symbolize};
use proptest::prelude::*;

fn arb_name() -> impl Strategy<Value = String> {
    "[A-Za-z0-9]{1,8}"
}

fn arb_condition() -> impl Strategy<Value = String> {
    "[A-Za-z0-9 =<>!,.']{1,16}"
}

fn arb_binary() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("∪"),
        Just("∩"),
        Just("−"),
        Just("⋈"),
        Just("×"),
    ]
}

fn arb_expr(depth: u32) -> BoxedStrategy<String> {
    if depth == 0 {
        return arb_name().boxed();
    }

    let leaf = arb_name();
    let binary = (arb_expr(depth - 1), arb_binary(), arb_expr(depth - 1))
        .prop_map(|(lhs, op, rhs)| format!("({lhs} {op} {rhs})"));
    let theta = (arb_expr(depth - 1), arb_condition(), arb_expr(depth - 1))
        .prop_map(|(lhs, cond, rhs)| format!("({lhs} θ {{{cond}}} {rhs})"));
    let unary = (
        prop_oneof![Just("σ"), Just("π")],
        arb_condition(),
        arb_expr(depth - 1),
    )
        .prop_map(|(op, cond, operand)| format!("({op} {{{cond}}} {operand})"));
    prop_oneof![leaf, binary, theta, unary].boxed()
}

fn depth_of(node: &Node) -> usize {
    1 + node.children().into_iter().map(depth_of).max().unwrap_or(0)
}

proptest! {
    #[test]
    fn relation_names_parse_to_themselves(name in arb_name()) {
        let node = parse(&name).unwrap();
        prop_assert_eq!(node, Node::relation(name));
    }

    #[test]
    fn symbolize_is_idempotent(line in ".{0,40}") {
        let once = symbolize(&line);
        prop_assert_eq!(symbolize(&once), once);
    }

    #[test]
    fn binary_chains_group_left(
        a in arb_name(),
        b in arb_name(),
        c in arb_name(),
        op1 in arb_binary(),
        op2 in arb_binary(),
    ) {
        let node = parse(&format!("{a} {op1} {b} {op2} {c}")).unwrap();
        let children = node.children();
        prop_assert_eq!(children.len(), 2);
        prop_assert_eq!(node.operator().map(|o| o.symbol()), op2.chars().next());
        prop_assert_eq!(children[1], &Node::relation(c));

        let inner = children[0];
        prop_assert_eq!(inner.operator().map(|o| o.symbol()), op1.chars().next());
        let (rel_a, rel_b) = (Node::relation(a), Node::relation(b));
        prop_assert_eq!(inner.children(), vec![&rel_a, &rel_b]);
    }

    #[test]
    fn conditions_are_kept_verbatim(cond in arb_condition(), name in arb_name()) {
        let node = parse(&format!("σ {{{cond}}} {name}")).unwrap();
        let NodeKind::Unary { op, condition, .. } = node.kind else {
            panic!("expected unary node");
        };
        prop_assert_eq!(op, Operator::Select);
        prop_assert_eq!(condition, cond);
    }

    #[test]
    fn nesting_depth_limit(depth in 1usize..20) {
        let input = format!("{}R{}", "(".repeat(depth), ")".repeat(depth));
        let node = parse(&input).unwrap();
        prop_assert_eq!(node.source(), input.as_str());

        let ctx = ParseContext::new().with_max_depth(depth - 1);
        let err = parse_with(&input, &ctx).unwrap_err();
        prop_assert_eq!(err.kind, ParseErrorKind::MaxNestingExceeded(depth - 1));
    }

    #[test]
    fn display_reparses_to_same_tree(expr in arb_expr(3)) {
        let parsed = parse(&expr).unwrap();
        let rendered = parsed.to_string();
        let reparsed = parse(&rendered).unwrap();
        prop_assert_eq!(reparsed.to_string(), rendered);
        prop_assert_eq!(depth_of(&reparsed), depth_of(&parsed));
    }
}
