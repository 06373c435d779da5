//! Tests for expressions: precedence, literals, parameters and the
//! special-syntax forms.

mod common;
use common::*;

use oxide_sql_parser::ast::{BinaryOp, Operator, UnaryOp};
use oxide_sql_parser::{Ast, DataType, NodeId, NodeType, ParserConfig, SemanticFlags};

/// The first select item of a tree.
fn item(ast: Ast<'_, '_>) -> NodeId {
    let list = path(ast, &[NodeType::SelectList]);
    ast.child(list, 0).unwrap()
}

fn binary_op(ast: Ast<'_, '_>, id: NodeId) -> BinaryOp {
    match ast.node(id).operator {
        Some(Operator::Binary(op)) => op,
        other => panic!("expected a binary operator, got {other:?}"),
    }
}

#[test]
fn multiplication_binds_tighter_than_addition() {
    with_ast("SELECT 1 + 2 * 3", |ast| {
        let add = item(ast);
        assert_eq!(binary_op(ast, add), BinaryOp::Add);
        let right = ast.child(add, 1).unwrap();
        assert_eq!(binary_op(ast, right), BinaryOp::Mul);
    });
}

#[test]
fn binary_operators_are_left_associative() {
    with_ast("SELECT 10 - 4 - 3", |ast| {
        let outer = item(ast);
        let left = ast.child(outer, 0).unwrap();
        assert_eq!(binary_op(ast, left), BinaryOp::Sub);
        assert_eq!(ast.text(ast.child(outer, 1).unwrap()), Some("3"));
    });
}

#[test]
fn or_is_looser_than_and_and_not() {
    with_ast("SELECT a OR NOT b AND c", |ast| {
        let or = item(ast);
        assert_eq!(binary_op(ast, or), BinaryOp::Or);
        let and = ast.child(or, 1).unwrap();
        assert_eq!(binary_op(ast, and), BinaryOp::And);
        let not = ast.child(and, 0).unwrap();
        assert_eq!(ast.node(not).node_type, NodeType::UnaryExpr);
        assert_eq!(ast.node(not).operator, Some(Operator::Unary(UnaryOp::Not)));
    });
}

#[test]
fn comparison_levels() {
    // `||` binds tighter than `=`, relational tighter than bitwise.
    with_ast("SELECT a = b || c", |ast| {
        let eq = item(ast);
        assert_eq!(binary_op(ast, eq), BinaryOp::Eq);
        assert_eq!(binary_op(ast, ast.child(eq, 1).unwrap()), BinaryOp::Concat);
    });
    with_ast("SELECT a & b < c", |ast| {
        let and = item(ast);
        assert_eq!(binary_op(ast, and), BinaryOp::BitAnd);
        assert_eq!(binary_op(ast, ast.child(and, 1).unwrap()), BinaryOp::Lt);
    });
}

#[test]
fn equality_spellings() {
    for sql in ["SELECT a == 1", "SELECT a = 1"] {
        with_ast(sql, |ast| assert_eq!(binary_op(ast, item(ast)), BinaryOp::Eq));
    }
    for sql in ["SELECT a != 1", "SELECT a <> 1"] {
        with_ast(sql, |ast| assert_eq!(binary_op(ast, item(ast)), BinaryOp::NotEq));
    }
    let _ = parse_err("SELECT a === 1");
}

#[test]
fn unary_minus_and_bit_not() {
    with_ast("SELECT -a * ~b", |ast| {
        let mul = item(ast);
        assert_eq!(binary_op(ast, mul), BinaryOp::Mul);
        let neg = ast.child(mul, 0).unwrap();
        assert_eq!(ast.node(neg).operator, Some(Operator::Unary(UnaryOp::Neg)));
        let not = ast.child(mul, 1).unwrap();
        assert_eq!(ast.node(not).operator, Some(Operator::Unary(UnaryOp::BitNot)));
    });
}

#[test]
fn literals() {
    with_ast(
        "SELECT 42, 3.5e2, 'it''s', X'CAFE', TRUE, NULL, 0x1F",
        |ast| {
            let list = path(ast, &[NodeType::SelectList]);
            assert_eq!(
                child_types(ast, list),
                vec![
                    NodeType::IntegerLiteral,
                    NodeType::FloatLiteral,
                    NodeType::StringLiteral,
                    NodeType::BlobLiteral,
                    NodeType::BooleanLiteral,
                    NodeType::NullLiteral,
                    NodeType::IntegerLiteral,
                ]
            );
            let texts: Vec<_> = ast
                .children(list)
                .into_iter()
                .map(|c| ast.text(c).unwrap())
                .collect();
            assert_eq!(texts, ["42", "3.5e2", "it's", "CAFE", "TRUE", "NULL", "0x1F"]);
            let boolean = ast.child(list, 4).unwrap();
            assert_eq!(ast.node(boolean).data_type, Some(DataType::Boolean));
        },
    );
}

#[test]
fn parameters() {
    with_ast("SELECT ?, ?2, :name, @var, $1 FROM t", |ast| {
        let list = path(ast, &[NodeType::SelectList]);
        let texts: Vec<_> = ast
            .children(list)
            .into_iter()
            .map(|c| {
                assert_eq!(ast.node(c).node_type, NodeType::Parameter);
                ast.text(c).unwrap()
            })
            .collect();
        assert_eq!(texts, ["?", "?2", ":name", "@var", "$1"]);
    });
}

#[test]
fn cast_expression() {
    with_ast("SELECT CAST(id AS VARCHAR(10)) FROM t", |ast| {
        let cast = item(ast);
        assert_eq!(ast.node(cast).node_type, NodeType::CastExpr);
        assert_eq!(ast.node(cast).data_type, Some(DataType::Varchar(Some(10))));
        assert_eq!(ast.text(cast), Some("VARCHAR(10)"));
        assert_eq!(child_types(ast, cast), vec![NodeType::ColumnRef]);
    });
    with_ast("SELECT CAST(x AS DECIMAL(10, 2))", |ast| {
        assert_eq!(
            ast.node(item(ast)).data_type,
            Some(DataType::Decimal {
                precision: Some(10),
                scale: Some(2)
            })
        );
    });
    with_ast("SELECT CAST(x AS DOUBLE PRECISION)", |ast| {
        assert_eq!(ast.node(item(ast)).data_type, Some(DataType::Double));
    });
}

#[test]
fn double_colon_cast() {
    with_ast("SELECT a::INTEGER", |ast| {
        let cast = item(ast);
        assert_eq!(ast.node(cast).node_type, NodeType::CastExpr);
        assert_eq!(ast.node(cast).data_type, Some(DataType::Integer));
    });
    let _ = parse_err_with(ParserConfig::default().with_extensions(false), "SELECT a::INTEGER");
    let _ = parse_err_with(ParserConfig::default().with_strict_ansi(true), "SELECT a::INTEGER");
}

#[test]
fn extract_expression() {
    with_ast("SELECT EXTRACT(YEAR FROM d) FROM t", |ast| {
        let extract = item(ast);
        assert_eq!(ast.node(extract).node_type, NodeType::ExtractExpr);
        assert_eq!(ast.text(extract), Some("YEAR"));
        assert_eq!(child_types(ast, extract), vec![NodeType::ColumnRef]);
    });
}

#[test]
fn position_and_substring() {
    with_ast("SELECT POSITION('b' IN name) FROM t", |ast| {
        let position = item(ast);
        assert_eq!(ast.node(position).node_type, NodeType::PositionExpr);
        assert_eq!(
            child_types(ast, position),
            vec![NodeType::StringLiteral, NodeType::ColumnRef]
        );
    });
    with_ast("SELECT SUBSTRING(name FROM 2 FOR 3) FROM t", |ast| {
        let substring = item(ast);
        assert_eq!(ast.node(substring).node_type, NodeType::SubstringExpr);
        assert_eq!(ast.node(substring).child_count(), 3);
    });
    with_ast("SELECT SUBSTRING(name, 2) FROM t", |ast| {
        assert_eq!(ast.node(item(ast)).child_count(), 2);
    });
}

#[test]
fn case_expressions() {
    with_ast(
        "SELECT CASE WHEN a > 0 THEN 'pos' WHEN a < 0 THEN 'neg' ELSE 'zero' END FROM t",
        |ast| {
            let case = item(ast);
            assert_eq!(
                child_types(ast, case),
                vec![
                    NodeType::WhenClause,
                    NodeType::WhenClause,
                    NodeType::ElseClause
                ]
            );
        },
    );
    with_ast("SELECT CASE status WHEN 1 THEN 'on' END FROM t", |ast| {
        let case = item(ast);
        assert_eq!(
            child_types(ast, case),
            vec![NodeType::ColumnRef, NodeType::WhenClause]
        );
    });
    let _ = parse_err("SELECT CASE a END");
}

#[test]
fn in_between_like_is() {
    with_ast(
        "SELECT * FROM t WHERE a NOT IN (1, 2) AND b BETWEEN 1 AND 5 \
         AND c LIKE 'x%' ESCAPE '!' AND d IS NOT NULL",
        |ast| {
            let find = |node_type| ast.find(node_type).unwrap();
            let in_expr = find(NodeType::InExpr);
            assert!(ast.node(in_expr).has(SemanticFlags::NEGATED));
            assert_eq!(
                child_types(ast, in_expr),
                vec![NodeType::ColumnRef, NodeType::ExprList]
            );
            assert_eq!(ast.node(find(NodeType::BetweenExpr)).child_count(), 3);
            assert_eq!(ast.node(find(NodeType::LikeExpr)).child_count(), 3);
            assert!(ast.node(find(NodeType::IsExpr)).has(SemanticFlags::NEGATED));
        },
    );
}

#[test]
fn in_subquery_and_scalar_subquery() {
    with_ast(
        "SELECT (SELECT MAX(x) FROM u) FROM t WHERE id IN (SELECT id FROM u)",
        |ast| {
            let scalar = item(ast);
            assert_eq!(ast.node(scalar).node_type, NodeType::SubqueryExpr);
            assert!(ast.node(scalar).has(SemanticFlags::IS_SUBQUERY));
            let in_expr = ast.find(NodeType::InExpr).unwrap();
            assert_eq!(
                child_types(ast, in_expr),
                vec![NodeType::ColumnRef, NodeType::SubqueryExpr]
            );
        },
    );
}

#[test]
fn not_exists() {
    with_ast("SELECT 1 WHERE NOT EXISTS (SELECT 1 FROM t)", |ast| {
        let exists = ast.find(NodeType::ExistsExpr).unwrap();
        assert!(ast.node(exists).has(SemanticFlags::NEGATED));
        assert!(ast.find(NodeType::UnaryExpr).is_none());
    });
}

#[test]
fn row_values_and_parentheses() {
    with_ast("SELECT (a, b) = (1, 2), (a + 1)", |ast| {
        let eq = item(ast);
        assert_eq!(
            child_types(ast, eq),
            vec![NodeType::RowValue, NodeType::RowValue]
        );
        let list = path(ast, &[NodeType::SelectList]);
        let paren = ast.child(list, 1).unwrap();
        assert_eq!(ast.node(paren).node_type, NodeType::ParenExpr);
    });
}

#[test]
fn compact_tree_drops_paren_nodes() {
    let config = ParserConfig::default().with_compact_tree(true);
    with_config(config, "SELECT (a + 1) * 2", |ast| {
        assert!(ast.find(NodeType::ParenExpr).is_none());
        let mul = item(ast);
        let add = ast.child(mul, 0).unwrap();
        assert!(ast.node(add).has(SemanticFlags::PARENTHESIZED));
    });
}

#[test]
fn function_calls() {
    with_ast(
        "SELECT COUNT(*), COUNT(DISTINCT a), COALESCE(a, b, 0), NOW(), LEFT(name, 2) FROM t",
        |ast| {
            let list = path(ast, &[NodeType::SelectList]);
            let calls = ast.children(list);
            assert!(calls
                .iter()
                .all(|&c| ast.node(c).node_type == NodeType::FunctionCall));
            assert!(ast.node(calls[0]).has(SemanticFlags::STAR_ARGS));
            assert!(ast.node(calls[1]).has(SemanticFlags::DISTINCT));
            assert_eq!(ast.node(calls[2]).child_count(), 3);
            assert_eq!(ast.node(calls[3]).child_count(), 0);
            assert_eq!(ast.text(calls[4]), Some("LEFT"));
        },
    );
}

#[test]
fn window_functions() {
    with_ast(
        "SELECT ROW_NUMBER() OVER (PARTITION BY dept ORDER BY salary DESC), \
         SUM(x) OVER w FROM t",
        |ast| {
            let list = path(ast, &[NodeType::SelectList]);
            let first = ast.child(list, 0).unwrap();
            let window = ast.find_child(first, NodeType::WindowSpec).unwrap();
            assert_eq!(
                child_types(ast, window),
                vec![NodeType::PartitionByClause, NodeType::OrderByClause]
            );
            let second = ast.child(list, 1).unwrap();
            let named = ast.find_child(second, NodeType::WindowSpec).unwrap();
            assert_eq!(ast.text(named), Some("w"));
        },
    );
}

#[test]
fn collate_postfix() {
    with_ast("SELECT name COLLATE NOCASE FROM t", |ast| {
        let collate = item(ast);
        assert_eq!(ast.node(collate).node_type, NodeType::CollateExpr);
        assert_eq!(ast.text(collate), Some("NOCASE"));
    });
}

#[test]
fn wildcard_is_not_an_operand() {
    for sql in [
        "SELECT 1 + *",
        "SELECT a FROM t WHERE a = *",
        "SELECT a FROM t ORDER BY *",
        "SELECT a FROM t GROUP BY *",
        "SELECT f(1, *)",
        "SELECT 1 + t.*",
        "SELECT a FROM t WHERE t.* IS NULL",
    ] {
        let err = parse_err(sql);
        assert_eq!(err.found.as_deref(), Some("*"), "{sql}: {err}");
    }
    for sql in ["SELECT * * *", "SELECT * + 1 FROM t", "SELECT t.* || 'x' FROM t"] {
        let err = parse_err(sql);
        assert_eq!(err.expected.as_deref(), Some("end of statement"), "{sql}: {err}");
    }
}

#[test]
fn wildcard_forms_that_are_allowed() {
    with_ast("SELECT *, t.*, s.t.* FROM t", |ast| {
        let list = path(ast, &[NodeType::SelectList]);
        assert_eq!(
            child_types(ast, list),
            [NodeType::Wildcard, NodeType::QualifiedWildcard, NodeType::QualifiedWildcard]
        );
    });
    with_ast("SELECT COUNT(*) FROM t", |ast| {
        let call = item(ast);
        assert!(ast.node(call).has(SemanticFlags::STAR_ARGS));
        assert_eq!(ast.node(call).child_count(), 0);
    });
}
