//! Property tests for the arena and for trees built from generated SQL.

mod common;
use common::*;

use oxide_sql_parser::{Arena, NodeType, Parser};
use proptest::prelude::*;

/// Expressions over a small vocabulary of columns, literals and operators.
fn expr() -> impl Strategy<Value = String> {
    let leaf = prop_oneof![
        prop::sample::select(vec!["a", "b", "t.c", "\"quoted col\""]).prop_map(String::from),
        (0u32..10_000).prop_map(|n| n.to_string()),
        "[a-z ]{0,8}".prop_map(|s| format!("'{s}'")),
        Just(String::from("NULL")),
        Just(String::from("?")),
    ];
    leaf.prop_recursive(6, 48, 4, |inner| {
        prop_oneof![
            (
                inner.clone(),
                prop::sample::select(vec![
                    "+", "-", "*", "/", "=", "<>", "<", ">=", "AND", "OR", "||"
                ]),
                inner.clone()
            )
                .prop_map(|(l, op, r)| format!("{l} {op} {r}")),
            inner.clone().prop_map(|e| format!("({e})")),
            inner.clone().prop_map(|e| format!("NOT {e}")),
            // The space keeps `- -1` from reading as a comment.
            inner.clone().prop_map(|e| format!("- {e}")),
            prop::collection::vec(inner.clone(), 1..4)
                .prop_map(|args| format!("f({})", args.join(", "))),
            (inner.clone(), inner.clone(), inner.clone())
                .prop_map(|(a, b, c)| format!("{a} BETWEEN ({b}) AND ({c})")),
            (inner.clone(), inner).prop_map(|(w, t)| format!("CASE WHEN {w} THEN {t} END")),
        ]
    })
}

fn select() -> impl Strategy<Value = String> {
    (
        prop::collection::vec(expr(), 1..4),
        prop::option::of(expr()),
        prop::option::of(0u32..100),
    )
        .prop_map(|(items, filter, limit)| {
            let mut sql = format!("SELECT {} FROM t", items.join(", "));
            if let Some(filter) = filter {
                sql.push_str(&format!(" WHERE {filter}"));
            }
            if let Some(limit) = limit {
                sql.push_str(&format!(" LIMIT {limit}"));
            }
            sql
        })
}

proptest! {
    #[test]
    fn arena_allocations_are_aligned_and_disjoint(
        requests in prop::collection::vec((0usize..2048, 0u32..7), 1..64)
    ) {
        let mut arena = Arena::new();
        let mut ranges = Vec::new();
        for (size, align_log) in requests {
            let align = 1usize << align_log;
            let slice = arena.allocate(size, align).unwrap();
            let addr = arena.address_of(slice).unwrap();
            prop_assert_eq!(addr % align, 0);
            prop_assert_eq!(slice.len(), size);
            ranges.push((addr, addr + size.max(1)));
        }
        ranges.sort_unstable();
        for pair in ranges.windows(2) {
            prop_assert!(pair[0].1 <= pair[1].0, "overlap: {:?}", pair);
        }
    }

    #[test]
    fn arena_strings_round_trip_until_reset(texts in prop::collection::vec(".{0,64}", 1..32)) {
        let mut arena = Arena::new();
        let slices: Vec<_> = texts.iter().map(|t| arena.alloc_str(t).unwrap()).collect();
        for (slice, text) in slices.iter().zip(&texts) {
            prop_assert_eq!(arena.str(*slice), Some(text.as_str()));
        }
        let blocks = arena.block_count();
        arena.reset();
        prop_assert_eq!(arena.total_used(), 0);
        prop_assert_eq!(arena.block_count(), blocks);
        for slice in slices {
            prop_assert!(arena.str(slice).is_none());
        }
        arena.reset();
        prop_assert_eq!(arena.total_used(), 0);
    }

    #[test]
    fn generated_selects_build_consistent_trees(sql in select()) {
        let mut parser = Parser::new();
        let (shape, count) = {
            let ast = parser.parse(&sql).unwrap();
            assert_tree_invariants(ast);
            prop_assert_eq!(ast.node_type(), NodeType::SelectStmt);

            let mut ids: Vec<u32> = ast.walk().map(|id| ast.node(id).node_id).collect();
            ids.sort_unstable();
            let expected: Vec<u32> = (0..u32::try_from(ids.len()).unwrap()).collect();
            prop_assert_eq!(ids, expected);

            // Every node lies within its parent's span.
            for id in ast.walk() {
                let node = ast.node(id);
                if let Some(parent) = node.parent() {
                    let outer = ast.node(parent).span;
                    prop_assert!(outer.start <= node.span.start && node.span.end <= outer.end);
                }
            }
            (ast.shape(), ast.node_count())
        };
        prop_assert_eq!(parser.node_count(), count);

        parser.reset();
        prop_assert_eq!(parser.node_count(), 0);
        let again = parser.parse(&sql).unwrap();
        prop_assert_eq!(again.shape(), shape);
    }

    #[test]
    fn wildcard_operands_are_rejected(
        e in expr(),
        op in prop::sample::select(vec!["+", "*", "=", "<", "AND", "||"]),
        star in prop::sample::select(vec!["*", "t.*"]),
    ) {
        let mut parser = Parser::new();
        for sql in [
            format!("SELECT {e} {op} {star} FROM t"),
            format!("SELECT a FROM t WHERE {e} {op} {star}"),
            format!("SELECT {star} {op} {e} FROM t"),
            format!("SELECT f({e}, {star})"),
        ] {
            prop_assert!(parser.parse(&sql).is_err(), "accepted: {}", sql);
        }
    }

    #[test]
    fn arbitrary_input_never_panics(input in ".{0,80}") {
        let mut parser = Parser::new();
        let _ = parser.parse(&input);
        let report = parser.parse_all(&input);
        for ast in report.script.statements() {
            assert_tree_invariants(ast);
        }
    }
}
