//! Node storage, tree editing and read-only tree views.

use core::fmt;

use crate::arena::{Arena, ArenaError, TypedArena};
use crate::lexer::{Location, Span};

use super::{AstNode, NodeId, NodeType, Text};

/// Owns every node and every copied string of one parse.
#[derive(Debug, Default)]
pub struct AstArena {
    nodes: TypedArena<AstNode>,
    strings: Arena,
    next_id: u32,
}

impl AstArena {
    /// Creates an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a detached node with empty text, flags and links.
    ///
    /// # Errors
    ///
    /// Returns [`ArenaError::Exhausted`] when node storage cannot grow.
    pub fn alloc_node(
        &mut self,
        node_type: NodeType,
        location: Location,
        span: Span,
    ) -> Result<NodeId, ArenaError> {
        let id = self
            .nodes
            .alloc(AstNode::new(node_type, self.next_id, location, span))?;
        self.next_id += 1;
        Ok(id)
    }

    /// Copies `text` into arena storage.
    ///
    /// # Errors
    ///
    /// Returns [`ArenaError::Exhausted`] when string storage cannot grow.
    pub fn alloc_text(&mut self, text: &str) -> Result<Text, ArenaError> {
        self.strings.alloc_str(text).map(Text::Arena)
    }

    /// Resolves `text` against the arena strings or `source`.
    #[must_use]
    pub fn resolve<'t>(&'t self, source: &'t str, text: Text) -> Option<&'t str> {
        match text {
            Text::None => None,
            Text::Source(span) => source.get(span.start..span.end),
            Text::Arena(slice) => self.strings.str(slice),
        }
    }

    /// Appends `child` to the children of `parent`.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale, if `child` is already attached
    /// (has a parent or a sibling), or if `child == parent`.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) {
        assert_ne!(parent, child, "a node cannot be its own child");
        let node = self.slot_mut(child);
        assert!(
            node.parent.is_none() && node.next_sibling.is_none(),
            "node {child:?} is already attached"
        );
        node.parent = Some(parent);

        let previous = self.slot(parent).last_child;
        if let Some(previous) = previous {
            self.slot_mut(previous).next_sibling = Some(child);
        }
        let node = self.slot_mut(parent);
        if node.first_child.is_none() {
            node.first_child = Some(child);
        }
        node.last_child = Some(child);
        node.child_count += 1;
    }

    /// Detaches `child` from `parent`.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale or `child` is not a child of
    /// `parent`.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) {
        let mut previous = None;
        let mut cursor = self.slot(parent).first_child;
        while let Some(current) = cursor {
            if current == child {
                break;
            }
            previous = Some(current);
            cursor = self.slot(current).next_sibling;
        }
        assert!(cursor.is_some(), "node {child:?} is not a child of {parent:?}");

        let next = self.slot(child).next_sibling;
        match previous {
            Some(previous) => self.slot_mut(previous).next_sibling = next,
            None => self.slot_mut(parent).first_child = next,
        }
        let node = self.slot_mut(parent);
        if node.last_child == Some(child) {
            node.last_child = previous;
        }
        node.child_count -= 1;

        let node = self.slot_mut(child);
        node.parent = None;
        node.next_sibling = None;
    }

    /// Returns the first child of `parent` with the given type.
    #[must_use]
    pub fn find_child(&self, parent: NodeId, node_type: NodeType) -> Option<NodeId> {
        self.child_iter(parent)
            .find(|id| self.get(*id).is_some_and(|n| n.node_type == node_type))
    }

    /// Materializes the children of `id` in order.
    #[must_use]
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.child_iter(id).collect()
    }

    /// Iterates the children of `id` in order.
    #[must_use]
    pub fn child_iter(&self, id: NodeId) -> ChildIter<'_> {
        ChildIter {
            arena: self,
            next: self.get(id).and_then(|n| n.first_child),
        }
    }

    /// Iterates `root` and all of its descendants in pre-order.
    #[must_use]
    pub fn descendants(&self, root: NodeId) -> Walk<'_> {
        Walk {
            arena: self,
            stack: vec![root],
        }
    }

    /// Returns the `n`th child of `id`.
    #[must_use]
    pub fn child(&self, id: NodeId, n: usize) -> Option<NodeId> {
        self.child_iter(id).nth(n)
    }

    /// Returns the node behind `id`, or `None` if the handle is stale.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&AstNode> {
        self.nodes.get(id)
    }

    /// Returns the node behind `id`.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &AstNode {
        self.slot(id)
    }

    /// Mutable access to the node's payload.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn node_mut(&mut self, id: NodeId) -> &mut AstNode {
        self.slot_mut(id)
    }

    fn slot(&self, id: NodeId) -> &AstNode {
        match self.nodes.get(id) {
            Some(node) => node,
            None => panic!("stale node handle {id:?}"),
        }
    }

    fn slot_mut(&mut self, id: NodeId) -> &mut AstNode {
        match self.nodes.get_mut(id) {
            Some(node) => node,
            None => panic!("stale node handle {id:?}"),
        }
    }

    /// Number of nodes allocated since the last reset.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Bytes occupied by nodes and copied strings.
    #[must_use]
    pub fn memory_used(&self) -> usize {
        self.nodes.total_used() + self.strings.total_used()
    }

    /// Bytes reserved by node and string storage.
    #[must_use]
    pub fn memory_reserved(&self) -> usize {
        self.nodes.total_allocated() + self.strings.total_allocated()
    }

    /// Forgets every node and string, keeping storage for the next parse.
    pub fn reset(&mut self) {
        self.nodes.reset();
        self.strings.reset();
        self.next_id = 0;
    }

    /// Releases all storage.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.strings.clear();
        self.next_id = 0;
    }
}

/// Iterator over the children of a node.
#[derive(Debug, Clone)]
pub struct ChildIter<'a> {
    arena: &'a AstArena,
    next: Option<NodeId>,
}

impl Iterator for ChildIter<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.arena.get(current).and_then(|n| n.next_sibling);
        Some(current)
    }
}

/// Pre-order iterator over a subtree.
#[derive(Debug, Clone)]
pub struct Walk<'a> {
    arena: &'a AstArena,
    stack: Vec<NodeId>,
}

impl Iterator for Walk<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;
        let mark = self.stack.len();
        self.stack.extend(self.arena.child_iter(current));
        self.stack[mark..].reverse();
        Some(current)
    }
}

/// A parsed statement: the root node plus the storage it lives in.
#[derive(Debug, Clone, Copy)]
pub struct Ast<'a, 's> {
    arena: &'a AstArena,
    source: &'s str,
    root: NodeId,
}

impl<'a, 's> Ast<'a, 's> {
    /// Creates a view of the tree rooted at `root`.
    #[must_use]
    pub const fn new(arena: &'a AstArena, source: &'s str, root: NodeId) -> Self {
        Self {
            arena,
            source,
            root,
        }
    }

    #[must_use]
    pub const fn root(&self) -> NodeId {
        self.root
    }

    /// The statement node.
    #[must_use]
    pub fn root_node(&self) -> &'a AstNode {
        self.arena.node(self.root)
    }

    #[must_use]
    pub const fn arena(&self) -> &'a AstArena {
        self.arena
    }

    #[must_use]
    pub const fn source(&self) -> &'s str {
        self.source
    }

    /// Returns the node behind `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not belong to this tree's arena generation.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &'a AstNode {
        self.arena.node(id)
    }

    /// Statement type.
    #[must_use]
    pub fn node_type(&self) -> NodeType {
        self.root_node().node_type
    }

    /// Primary text of `id` (name, literal or keyword payload).
    #[must_use]
    pub fn text(&self, id: NodeId) -> Option<&'a str>
    where
        's: 'a,
    {
        self.arena.resolve(self.source, self.node(id).primary_text)
    }

    /// Table qualifier of a column reference or wildcard.
    #[must_use]
    pub fn qualifier(&self, id: NodeId) -> Option<&'a str>
    where
        's: 'a,
    {
        self.arena.resolve(self.source, self.node(id).qualifier)
    }

    /// Schema part of a qualified name.
    #[must_use]
    pub fn schema(&self, id: NodeId) -> Option<&'a str>
    where
        's: 'a,
    {
        self.arena.resolve(self.source, self.node(id).schema_name)
    }

    /// Catalog part of a qualified name.
    #[must_use]
    pub fn catalog(&self, id: NodeId) -> Option<&'a str>
    where
        's: 'a,
    {
        self.arena.resolve(self.source, self.node(id).catalog_name)
    }

    #[must_use]
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.arena.children(id)
    }

    /// Returns the `n`th child of `id`.
    #[must_use]
    pub fn child(&self, id: NodeId, n: usize) -> Option<NodeId> {
        self.arena.child(id, n)
    }

    /// Returns the first child of `id` with the given type.
    #[must_use]
    pub fn find_child(&self, id: NodeId, node_type: NodeType) -> Option<NodeId> {
        self.arena.find_child(id, node_type)
    }

    /// Every node of the tree in pre-order.
    #[must_use]
    pub fn walk(&self) -> Walk<'a> {
        self.arena.descendants(self.root)
    }

    /// First node of the given type in pre-order.
    #[must_use]
    pub fn find(&self, node_type: NodeType) -> Option<NodeId> {
        self.walk()
            .find(|id| self.node(*id).node_type == node_type)
    }

    /// Node types in pre-order; equal shapes mean structurally equal trees.
    #[must_use]
    pub fn shape(&self) -> Vec<NodeType> {
        self.walk().map(|id| self.node(id).node_type).collect()
    }

    /// Number of nodes in this tree.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.walk().count()
    }

    fn fmt_node(&self, f: &mut fmt::Formatter<'_>, id: NodeId, depth: usize) -> fmt::Result
    where
        's: 'a,
    {
        let node = self.node(id);
        write!(f, "{:indent$}{:?}", "", node.node_type, indent = depth * 2)?;
        if let Some(op) = node.operator {
            write!(f, " {}", op.as_str())?;
        }
        let qualifier = self.qualifier(id);
        match (qualifier, self.text(id)) {
            (Some(q), Some(t)) => write!(f, " {q}.{t}")?,
            (Some(q), None) => write!(f, " {q}")?,
            (None, Some(t)) => write!(f, " {t}")?,
            (None, None) => {}
        }
        if let Some(data_type) = node.data_type {
            write!(f, " [{data_type}]")?;
        }
        if !node.semantic_flags.is_empty() {
            write!(f, " {:?}", node.semantic_flags)?;
        }
        writeln!(f)?;
        for child in self.arena.child_iter(id) {
            self.fmt_node(f, child, depth + 1)?;
        }
        Ok(())
    }
}

impl<'s> fmt::Display for Ast<'_, 's> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let view = Ast::new(self.arena, self.source, self.root);
        view.fmt_node(f, self.root, 0)
    }
}

/// Several statements parsed from one source, sharing one arena.
#[derive(Debug, Clone)]
pub struct Script<'a, 's> {
    arena: &'a AstArena,
    source: &'s str,
    roots: Vec<NodeId>,
}

impl<'a, 's> Script<'a, 's> {
    /// Creates a view over `roots`.
    #[must_use]
    pub const fn new(arena: &'a AstArena, source: &'s str, roots: Vec<NodeId>) -> Self {
        Self {
            arena,
            source,
            roots,
        }
    }

    /// Number of statements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.roots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Returns the `n`th statement.
    #[must_use]
    pub fn get(&self, n: usize) -> Option<Ast<'a, 's>> {
        self.roots
            .get(n)
            .map(|root| Ast::new(self.arena, self.source, *root))
    }

    /// Iterates the statements in source order.
    pub fn statements(&self) -> impl Iterator<Item = Ast<'a, 's>> + '_ {
        self.roots
            .iter()
            .map(|root| Ast::new(self.arena, self.source, *root))
    }

    #[must_use]
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alloc(arena: &mut AstArena, node_type: NodeType) -> NodeId {
        arena
            .alloc_node(node_type, Location::default(), Span::default())
            .unwrap()
    }

    fn check_invariants(arena: &AstArena, root: NodeId) {
        for id in arena.descendants(root) {
            let children = arena.children(id);
            assert_eq!(children.len(), arena.node(id).child_count());
            for child in children {
                assert_eq!(arena.node(child).parent(), Some(id));
            }
        }
    }

    #[test]
    fn test_node_ids_are_sequential() {
        let mut arena = AstArena::new();
        let a = alloc(&mut arena, NodeType::SelectStmt);
        let b = alloc(&mut arena, NodeType::SelectList);
        assert_eq!(arena.node(a).node_id, 0);
        assert_eq!(arena.node(b).node_id, 1);
        arena.reset();
        let c = alloc(&mut arena, NodeType::SelectStmt);
        assert_eq!(arena.node(c).node_id, 0);
        assert!(arena.get(a).is_none());
    }

    #[test]
    fn test_add_children_in_order() {
        let mut arena = AstArena::new();
        let root = alloc(&mut arena, NodeType::SelectStmt);
        let list = alloc(&mut arena, NodeType::SelectList);
        let from = alloc(&mut arena, NodeType::FromClause);
        let filter = alloc(&mut arena, NodeType::WhereClause);
        arena.add_child(root, list);
        arena.add_child(root, from);
        arena.add_child(root, filter);
        assert_eq!(arena.children(root), vec![list, from, filter]);
        assert_eq!(arena.find_child(root, NodeType::FromClause), Some(from));
        assert_eq!(arena.find_child(root, NodeType::HavingClause), None);
        assert_eq!(arena.child(root, 2), Some(filter));
        check_invariants(&arena, root);
    }

    #[test]
    fn test_remove_child_relinks_siblings() {
        let mut arena = AstArena::new();
        let root = alloc(&mut arena, NodeType::ExprList);
        let kids: Vec<_> = (0..3)
            .map(|_| alloc(&mut arena, NodeType::IntegerLiteral))
            .collect();
        for kid in &kids {
            arena.add_child(root, *kid);
        }

        arena.remove_child(root, kids[1]);
        assert_eq!(arena.children(root), vec![kids[0], kids[2]]);
        assert_eq!(arena.node(kids[1]).parent(), None);

        arena.remove_child(root, kids[2]);
        let tail = alloc(&mut arena, NodeType::NullLiteral);
        arena.add_child(root, tail);
        assert_eq!(arena.children(root), vec![kids[0], tail]);

        arena.remove_child(root, kids[0]);
        assert_eq!(arena.children(root), vec![tail]);
        check_invariants(&arena, root);

        // A detached node may be attached again.
        arena.add_child(root, kids[1]);
        assert_eq!(arena.node(root).child_count(), 2);
    }

    #[test]
    #[should_panic(expected = "already attached")]
    fn test_add_attached_child_panics() {
        let mut arena = AstArena::new();
        let a = alloc(&mut arena, NodeType::ExprList);
        let b = alloc(&mut arena, NodeType::ExprList);
        let child = alloc(&mut arena, NodeType::NullLiteral);
        arena.add_child(a, child);
        arena.add_child(b, child);
    }

    #[test]
    #[should_panic(expected = "is not a child of")]
    fn test_remove_foreign_child_panics() {
        let mut arena = AstArena::new();
        let a = alloc(&mut arena, NodeType::ExprList);
        let b = alloc(&mut arena, NodeType::NullLiteral);
        arena.remove_child(a, b);
    }

    #[test]
    fn test_walk_is_preorder() {
        let mut arena = AstArena::new();
        let root = alloc(&mut arena, NodeType::BinaryExpr);
        let left = alloc(&mut arena, NodeType::ColumnRef);
        let right = alloc(&mut arena, NodeType::UnaryExpr);
        let inner = alloc(&mut arena, NodeType::IntegerLiteral);
        arena.add_child(root, left);
        arena.add_child(root, right);
        arena.add_child(right, inner);
        let ast = Ast::new(&arena, "", root);
        assert_eq!(
            ast.shape(),
            vec![
                NodeType::BinaryExpr,
                NodeType::ColumnRef,
                NodeType::UnaryExpr,
                NodeType::IntegerLiteral,
            ]
        );
        assert_eq!(ast.find(NodeType::IntegerLiteral), Some(inner));
    }

    #[test]
    fn test_text_resolution() {
        let source = "SELECT name";
        let mut arena = AstArena::new();
        let col = alloc(&mut arena, NodeType::ColumnRef);
        let copied = arena.alloc_text("other").unwrap();
        arena.node_mut(col).primary_text = Text::Source(Span::new(7, 11));
        arena.node_mut(col).qualifier = copied;
        let ast = Ast::new(&arena, source, col);
        assert_eq!(ast.text(col), Some("name"));
        assert_eq!(ast.qualifier(col), Some("other"));
        assert_eq!(ast.schema(col), None);
        assert_eq!(ast.to_string(), "ColumnRef other.name\n");
    }

    #[test]
    fn test_memory_accounting() {
        let mut arena = AstArena::new();
        assert_eq!(arena.memory_used(), 0);
        alloc(&mut arena, NodeType::SelectStmt);
        assert!(arena.memory_used() > 0);
        let reserved = arena.memory_reserved();
        arena.reset();
        assert_eq!(arena.memory_used(), 0);
        assert_eq!(arena.memory_reserved(), reserved);
        arena.clear();
        assert_eq!(arena.node_count(), 0);
    }
}
