#![allow(dead_code)]

use oxide_sql_parser::{Ast, NodeId, NodeType, ParseError, Parser, ParserConfig};

/// Routes parser logs to the test output; safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// Parses `sql` with the default configuration and hands the tree to `f`.
pub fn with_ast<R>(sql: &str, f: impl for<'a> FnOnce(Ast<'a, 'a>) -> R) -> R {
    with_config(ParserConfig::default(), sql, f)
}

pub fn with_config<R>(
    config: ParserConfig,
    sql: &str,
    f: impl for<'a> FnOnce(Ast<'a, 'a>) -> R,
) -> R {
    let mut parser = Parser::with_config(config);
    let ast = parser
        .parse(sql)
        .unwrap_or_else(|e| panic!("Failed to parse: {sql}\nError: {e}"));
    assert_tree_invariants(ast);
    f(ast)
}

pub fn parse_err(sql: &str) -> ParseError {
    parse_err_with(ParserConfig::default(), sql)
}

pub fn parse_err_with(config: ParserConfig, sql: &str) -> ParseError {
    Parser::with_config(config)
        .parse(sql)
        .map(|ast| ast.to_string())
        .expect_err(&format!("Expected parse error for: {sql}"))
}

/// The indented outline of the tree.
pub fn outline(sql: &str) -> String {
    with_ast(sql, |ast| ast.to_string())
}

pub fn shape(sql: &str) -> Vec<NodeType> {
    with_ast(sql, |ast| ast.shape())
}

/// Types of the children of `id`, in order.
pub fn child_types(ast: Ast<'_, '_>, id: NodeId) -> Vec<NodeType> {
    ast.children(id)
        .into_iter()
        .map(|c| ast.node(c).node_type)
        .collect()
}

/// The node of type `node_type` reached by following the first matching
/// child at each step from the root.
pub fn path(ast: Ast<'_, '_>, steps: &[NodeType]) -> NodeId {
    let mut id = ast.root();
    for &step in steps {
        id = ast
            .find_child(id, step)
            .unwrap_or_else(|| panic!("no {step:?} under {:?}", ast.node(id).node_type));
    }
    id
}

/// Checks the parent and child-count links of every node.
pub fn assert_tree_invariants(ast: Ast<'_, '_>) {
    assert!(ast.root_node().parent().is_none(), "root has a parent");
    for id in ast.walk() {
        let children = ast.children(id);
        assert_eq!(children.len(), ast.node(id).child_count());
        for child in children {
            assert_eq!(ast.node(child).parent(), Some(id));
        }
    }
}
