//! Structural checks on a finished statement tree.
//!
//! The validator never mutates the tree. It looks at how clauses depend on
//! each other (HAVING on GROUP BY, joins on their conditions, operand
//! arities of set operations and VALUES lists) and at name uniqueness; it
//! does no type checking.

use crate::ast::{Ast, NodeId, NodeType, SemanticFlags};
use crate::lexer::{Location, Span};
use crate::parser::ParseMode;

/// Functions that aggregate rows when called without an OVER window.
const AGGREGATES: &[&str] = &[
    "COUNT",
    "SUM",
    "AVG",
    "MIN",
    "MAX",
    "TOTAL",
    "GROUP_CONCAT",
    "STRING_AGG",
    "ARRAY_AGG",
    "EVERY",
];

/// The structural rule a statement broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    /// HAVING without GROUP BY.
    HavingWithoutGroupBy,
    /// A join that needs ON or USING has neither.
    JoinWithoutCondition,
    /// Set operation operands select different numbers of columns.
    SetOperationArity,
    /// VALUES rows, or an INSERT source and its column list, disagree in
    /// width.
    ValuesArity,
    /// An aggregate call in WHERE or GROUP BY.
    MisplacedAggregate,
    /// A recursive common table expression is not a compound select.
    RecursiveCte,
    /// Two common table expressions of one WITH share a name.
    DuplicateCte,
    /// Two columns of one CREATE TABLE share a name.
    DuplicateColumn,
}

impl Rule {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::HavingWithoutGroupBy => "having-requires-group-by",
            Self::JoinWithoutCondition => "join-requires-condition",
            Self::SetOperationArity => "set-operation-arity",
            Self::ValuesArity => "values-arity",
            Self::MisplacedAggregate => "misplaced-aggregate",
            Self::RecursiveCte => "recursive-cte",
            Self::DuplicateCte => "duplicate-cte",
            Self::DuplicateColumn => "duplicate-column",
        }
    }
}

/// A broken structural rule, located at the offending node.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} (line {}, column {})", .location.line, .location.column)]
pub struct ValidationError {
    pub rule: Rule,
    pub message: String,
    pub location: Location,
    pub span: Span,
    pub node: NodeId,
}

/// Checks `ast` and returns the first broken rule in pre-order.
///
/// # Errors
///
/// Returns the first [`ValidationError`] found.
pub fn validate<'a, 's: 'a>(ast: &Ast<'a, 's>, mode: ParseMode) -> Result<(), ValidationError> {
    match validate_all(ast, mode).into_iter().next() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Checks `ast` and returns every broken rule in pre-order.
#[must_use]
pub fn validate_all<'a, 's: 'a>(ast: &Ast<'a, 's>, mode: ParseMode) -> Vec<ValidationError> {
    let mut validator = Validator {
        ast,
        mode,
        errors: Vec::new(),
    };
    for id in ast.walk() {
        validator.check(id);
    }
    validator.errors
}

struct Validator<'v, 'a, 's> {
    ast: &'v Ast<'a, 's>,
    mode: ParseMode,
    errors: Vec<ValidationError>,
}

impl<'a, 's: 'a> Validator<'_, 'a, 's> {
    fn check(&mut self, id: NodeId) {
        let node_type = self.ast.node(id).node_type;
        match node_type {
            NodeType::SelectStmt => self.check_having(id),
            NodeType::CompoundSelect => self.check_compound(id),
            NodeType::ValuesStmt | NodeType::ValuesClause => self.check_rows(id),
            NodeType::InsertStmt => self.check_insert(id),
            NodeType::WhereClause | NodeType::GroupByClause => self.check_no_aggregates(id),
            NodeType::WithClause => self.check_with(id),
            NodeType::CreateTableStmt => self.check_columns(id),
            t if t.is_join() => self.check_join(id),
            _ => {}
        }
    }

    fn report(&mut self, rule: Rule, node: NodeId, message: String) {
        let target = self.ast.node(node);
        self.errors.push(ValidationError {
            rule,
            message,
            location: target.location,
            span: target.span,
            node,
        });
    }

    fn name(&self, id: NodeId) -> &'a str {
        self.ast.text(id).unwrap_or_default()
    }

    fn check_having(&mut self, select: NodeId) {
        let Some(having) = self.ast.find_child(select, NodeType::HavingClause) else {
            return;
        };
        if self.ast.find_child(select, NodeType::GroupByClause).is_some() {
            return;
        }
        if self.mode == ParseMode::Permissive {
            // Without GROUP BY the whole result is one group, which only
            // makes sense when nothing outside an aggregate is selected.
            let grouped = self
                .ast
                .find_child(select, NodeType::SelectList)
                .is_some_and(|list| {
                    self.ast
                        .arena()
                        .child_iter(list)
                        .all(|item| self.is_group_constant(item))
                });
            if grouped {
                return;
            }
        }
        self.report(
            Rule::HavingWithoutGroupBy,
            having,
            String::from("HAVING clause requires GROUP BY"),
        );
    }

    /// True if `id` has a single value over a group: aggregates, literals,
    /// parameters, uncorrelated-looking subqueries and expressions over
    /// those.
    fn is_group_constant(&self, id: NodeId) -> bool {
        let node_type = self.ast.node(id).node_type;
        if node_type.is_literal() {
            return true;
        }
        match node_type {
            NodeType::Parameter
            | NodeType::Alias
            | NodeType::SubqueryExpr
            | NodeType::ExistsExpr => true,
            NodeType::ColumnRef | NodeType::Wildcard | NodeType::QualifiedWildcard => false,
            NodeType::FunctionCall if self.is_aggregate(id) => true,
            _ => self
                .ast
                .arena()
                .child_iter(id)
                .all(|child| self.is_group_constant(child)),
        }
    }

    fn is_aggregate(&self, id: NodeId) -> bool {
        self.ast.node(id).node_type == NodeType::FunctionCall
            && self.ast.find_child(id, NodeType::WindowSpec).is_none()
            && AGGREGATES
                .iter()
                .any(|name| name.eq_ignore_ascii_case(self.name(id)))
    }

    fn check_join(&mut self, join: NodeId) {
        let node = self.ast.node(join);
        if node.node_type == NodeType::CrossJoin
            || node.has(SemanticFlags::NATURAL)
            || self.mode == ParseMode::Permissive
        {
            return;
        }
        let has_condition = self
            .ast
            .arena()
            .child_iter(join)
            .any(|c| matches!(self.ast.node(c).node_type, NodeType::OnCondition | NodeType::UsingClause));
        if !has_condition {
            self.report(
                Rule::JoinWithoutCondition,
                join,
                String::from("JOIN requires an ON or USING condition"),
            );
        }
    }

    fn check_compound(&mut self, compound: NodeId) {
        let mut operands = self
            .ast
            .arena()
            .child_iter(compound)
            .filter(|&c| is_query(self.ast.node(c).node_type));
        let (Some(left), Some(right)) = (operands.next(), operands.next()) else {
            return;
        };
        if let (Some(l), Some(r)) = (self.arity(left), self.arity(right)) {
            if l != r {
                let op = self.name(compound);
                self.report(
                    Rule::SetOperationArity,
                    compound,
                    format!("{op} operands select {l} and {r} columns"),
                );
            }
        }
    }

    /// Number of result columns of a query, or `None` when a wildcard
    /// makes it unknown.
    fn arity(&self, query: NodeId) -> Option<usize> {
        let arena = self.ast.arena();
        match self.ast.node(query).node_type {
            NodeType::SelectStmt => {
                let list = self.ast.find_child(query, NodeType::SelectList)?;
                let wildcard = arena.child_iter(list).any(|item| {
                    matches!(
                        self.ast.node(item).node_type,
                        NodeType::Wildcard | NodeType::QualifiedWildcard
                    )
                });
                (!wildcard).then(|| self.ast.node(list).child_count())
            }
            NodeType::ValuesStmt => {
                let row = self.ast.find_child(query, NodeType::ValuesRow)?;
                Some(self.ast.node(row).child_count())
            }
            NodeType::CompoundSelect => arena
                .child_iter(query)
                .find(|&c| is_query(self.ast.node(c).node_type))
                .and_then(|left| self.arity(left)),
            _ => None,
        }
    }

    fn check_rows(&mut self, values: NodeId) {
        let rows = self.ast.children(values);
        let Some((&first, rest)) = rows.split_first() else {
            return;
        };
        let width = self.ast.node(first).child_count();
        for &row in rest {
            let count = self.ast.node(row).child_count();
            if count != width {
                self.report(
                    Rule::ValuesArity,
                    row,
                    format!("VALUES row has {count} values, expected {width}"),
                );
            }
        }
    }

    fn check_insert(&mut self, insert: NodeId) {
        let Some(columns) = self.ast.find_child(insert, NodeType::ColumnList) else {
            return;
        };
        let expected = self.ast.node(columns).child_count();
        for child in self.ast.children(insert) {
            match self.ast.node(child).node_type {
                // Later rows are held to the first by the VALUES check.
                NodeType::ValuesClause => {
                    let Some(row) = self.ast.child(child, 0) else {
                        continue;
                    };
                    let count = self.ast.node(row).child_count();
                    if count != expected {
                        self.report(
                            Rule::ValuesArity,
                            row,
                            format!("INSERT row has {count} values for {expected} columns"),
                        );
                    }
                }
                t if is_query(t) => {
                    if let Some(count) = self.arity(child).filter(|&n| n != expected) {
                        self.report(
                            Rule::ValuesArity,
                            child,
                            format!("INSERT query selects {count} columns for {expected} columns"),
                        );
                    }
                }
                _ => {}
            }
        }
    }

    fn check_no_aggregates(&mut self, clause: NodeId) {
        let arena = self.ast.arena();
        let clause_name = match self.ast.node(clause).node_type {
            NodeType::WhereClause => "WHERE",
            _ => "GROUP BY",
        };
        let mut stack: Vec<NodeId> = arena.child_iter(clause).collect();
        while let Some(id) = stack.pop() {
            let node_type = self.ast.node(id).node_type;
            // Nested query blocks are checked on their own.
            if node_type.is_query_block() {
                continue;
            }
            if self.is_aggregate(id) {
                let name = self.name(id);
                self.report(
                    Rule::MisplacedAggregate,
                    id,
                    format!("aggregate function {name} is not allowed in {clause_name}"),
                );
                continue;
            }
            stack.extend(arena.child_iter(id));
        }
    }

    fn check_with(&mut self, with: NodeId) {
        let recursive = self.ast.node(with).has(SemanticFlags::RECURSIVE);
        let ctes = self.ast.children(with);
        for (i, &cte) in ctes.iter().enumerate() {
            let name = self.name(cte);
            if ctes[..i]
                .iter()
                .any(|&earlier| self.name(earlier).eq_ignore_ascii_case(name))
            {
                self.report(
                    Rule::DuplicateCte,
                    cte,
                    format!("common table expression '{name}' is defined twice"),
                );
            }
            if !recursive {
                continue;
            }
            let Some(body) = self
                .ast
                .arena()
                .child_iter(cte)
                .find(|&c| is_query(self.ast.node(c).node_type))
            else {
                continue;
            };
            let self_referencing = self.ast.arena().descendants(body).any(|id| {
                let node = self.ast.node(id);
                node.node_type == NodeType::TableRef
                    && node.schema_name.is_none()
                    && self.name(id).eq_ignore_ascii_case(name)
            });
            if self_referencing && self.ast.node(body).node_type != NodeType::CompoundSelect {
                self.report(
                    Rule::RecursiveCte,
                    cte,
                    format!(
                        "recursive common table expression '{name}' needs an anchor \
                         and a recursive member joined by a set operator"
                    ),
                );
            }
        }
    }

    fn check_columns(&mut self, table: NodeId) {
        let columns: Vec<NodeId> = self
            .ast
            .arena()
            .child_iter(table)
            .filter(|&c| self.ast.node(c).node_type == NodeType::ColumnDef)
            .collect();
        for (i, &column) in columns.iter().enumerate() {
            let name = self.name(column);
            if columns[..i]
                .iter()
                .any(|&earlier| self.name(earlier).eq_ignore_ascii_case(name))
            {
                self.report(
                    Rule::DuplicateColumn,
                    column,
                    format!("column '{name}' is defined twice"),
                );
            }
        }
    }
}

const fn is_query(node_type: NodeType) -> bool {
    matches!(
        node_type,
        NodeType::SelectStmt | NodeType::CompoundSelect | NodeType::ValuesStmt
    )
}
