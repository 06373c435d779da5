//! The arena node and its discriminants.

use crate::arena::{ArenaSlice, Idx};
use crate::lexer::{Location, Span};

use super::{DataType, ParseContext, SemanticFlags};

/// Handle to a node stored in an [`AstArena`](super::AstArena).
pub type NodeId = Idx<AstNode>;

/// Node discriminants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    // Statements
    SelectStmt,
    CompoundSelect,
    InsertStmt,
    UpdateStmt,
    DeleteStmt,
    CreateTableStmt,
    CreateIndexStmt,
    CreateViewStmt,
    CreateTriggerStmt,
    CreateSchemaStmt,
    DropStmt,
    AlterTableStmt,
    TruncateStmt,
    BeginStmt,
    CommitStmt,
    RollbackStmt,
    SavepointStmt,
    ReleaseStmt,
    ExplainStmt,
    ValuesStmt,
    SetStmt,
    PragmaStmt,
    VacuumStmt,
    AnalyzeStmt,
    AttachStmt,
    DetachStmt,
    ReindexStmt,

    // Clauses
    WithClause,
    CommonTableExpr,
    SelectList,
    /// An aliased result column: the expression, then its `Alias`.
    ResultColumn,
    FromClause,
    WhereClause,
    GroupByClause,
    HavingClause,
    OrderByClause,
    OrderByItem,
    LimitClause,
    OffsetClause,
    InnerJoin,
    LeftJoin,
    RightJoin,
    FullJoin,
    CrossJoin,
    OnCondition,
    UsingClause,
    ColumnList,
    ValuesClause,
    ValuesRow,
    ReturningClause,
    SetClause,
    Assignment,
    ConflictAction,
    WindowSpec,
    PartitionByClause,

    // Schema definitions
    ColumnDef,
    TypeName,
    PrimaryKeyConstraint,
    NotNullConstraint,
    NullConstraint,
    UniqueConstraint,
    CheckConstraint,
    DefaultConstraint,
    ForeignKeyConstraint,
    ReferencesClause,
    CollateConstraint,
    ObjectName,
    IndexedColumn,
    RenameTable,
    RenameColumn,
    AddColumn,
    DropColumn,
    TriggerEvent,
    TriggerBody,

    // Expressions
    BinaryExpr,
    UnaryExpr,
    ParenExpr,
    FunctionCall,
    CastExpr,
    ExtractExpr,
    CaseExpr,
    WhenClause,
    ElseClause,
    ExistsExpr,
    PositionExpr,
    SubstringExpr,
    InExpr,
    BetweenExpr,
    LikeExpr,
    IsExpr,
    CollateExpr,
    SubqueryExpr,
    ExprList,
    RowValue,
    Alias,

    // References
    ColumnRef,
    TableRef,
    DerivedTable,
    Wildcard,
    QualifiedWildcard,
    Identifier,
    Parameter,

    // Literals
    IntegerLiteral,
    FloatLiteral,
    StringLiteral,
    BlobLiteral,
    BooleanLiteral,
    NullLiteral,
}

impl NodeType {
    /// Returns true for nodes that can be the root of a statement.
    #[must_use]
    pub const fn is_statement(&self) -> bool {
        matches!(
            self,
            Self::SelectStmt
                | Self::CompoundSelect
                | Self::InsertStmt
                | Self::UpdateStmt
                | Self::DeleteStmt
                | Self::CreateTableStmt
                | Self::CreateIndexStmt
                | Self::CreateViewStmt
                | Self::CreateTriggerStmt
                | Self::CreateSchemaStmt
                | Self::DropStmt
                | Self::AlterTableStmt
                | Self::TruncateStmt
                | Self::BeginStmt
                | Self::CommitStmt
                | Self::RollbackStmt
                | Self::SavepointStmt
                | Self::ReleaseStmt
                | Self::ExplainStmt
                | Self::ValuesStmt
                | Self::SetStmt
                | Self::PragmaStmt
                | Self::VacuumStmt
                | Self::AnalyzeStmt
                | Self::AttachStmt
                | Self::DetachStmt
                | Self::ReindexStmt
        )
    }

    /// Returns true for the join node types.
    #[must_use]
    pub const fn is_join(&self) -> bool {
        matches!(
            self,
            Self::InnerJoin | Self::LeftJoin | Self::RightJoin | Self::FullJoin | Self::CrossJoin
        )
    }

    /// Returns true for literal values.
    #[must_use]
    pub const fn is_literal(&self) -> bool {
        matches!(
            self,
            Self::IntegerLiteral
                | Self::FloatLiteral
                | Self::StringLiteral
                | Self::BlobLiteral
                | Self::BooleanLiteral
                | Self::NullLiteral
        )
    }

    /// Returns true for nodes that start a new query block: aggregates and
    /// clauses below them belong to a different SELECT.
    #[must_use]
    pub const fn is_query_block(&self) -> bool {
        matches!(
            self,
            Self::SelectStmt | Self::CompoundSelect | Self::SubqueryExpr | Self::DerivedTable
        )
    }
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,

    // Comparison
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Is,

    // Logical
    And,
    Or,

    // String
    Concat,
    Like,
    Glob,

    // Bitwise
    BitAnd,
    BitOr,
    BitXor,
    LeftShift,
    RightShift,
}

impl BinaryOp {
    /// Returns the SQL representation of the operator.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::Eq => "=",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::Is => "IS",
            Self::And => "AND",
            Self::Or => "OR",
            Self::Concat => "||",
            Self::Like => "LIKE",
            Self::Glob => "GLOB",
            Self::BitAnd => "&",
            Self::BitOr => "|",
            Self::BitXor => "^",
            Self::LeftShift => "<<",
            Self::RightShift => ">>",
        }
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// Negation (-)
    Neg,
    /// Identity (+)
    Plus,
    /// Logical NOT
    Not,
    /// Bitwise NOT (~)
    BitNot,
}

impl UnaryOp {
    /// Returns the SQL representation of the operator.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Neg => "-",
            Self::Plus => "+",
            Self::Not => "NOT",
            Self::BitNot => "~",
        }
    }
}

/// Operator carried by a [`NodeType::BinaryExpr`] or [`NodeType::UnaryExpr`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Binary(BinaryOp),
    Unary(UnaryOp),
}

impl Operator {
    /// Returns the SQL representation of the operator.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Binary(op) => op.as_str(),
            Self::Unary(op) => op.as_str(),
        }
    }
}

/// Where a piece of node text lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Text {
    /// No text.
    #[default]
    None,
    /// A byte range of the parsed source.
    Source(Span),
    /// Text copied into the arena (unescaped identifiers and strings).
    Arena(ArenaSlice),
}

impl Text {
    /// Returns true if no text is attached.
    #[must_use]
    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

/// A node of the syntax tree.
///
/// Nodes are plain `Copy` records linked by [`NodeId`] handles: a parent
/// points at its first child and every child at its next sibling. The link
/// fields are private so the tree can only be reshaped through
/// [`AstArena::add_child`](super::AstArena::add_child) and
/// [`AstArena::remove_child`](super::AstArena::remove_child).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AstNode {
    /// What the node is.
    pub node_type: NodeType,
    /// Allocation order within one parse, starting at zero.
    pub node_id: u32,
    /// Name, literal text, or keyword payload.
    pub primary_text: Text,
    /// Schema part of a qualified name.
    pub schema_name: Text,
    /// Catalog part of a qualified name.
    pub catalog_name: Text,
    /// Table qualifier of a column reference or wildcard.
    pub qualifier: Text,
    /// Modifiers.
    pub semantic_flags: SemanticFlags,
    /// Type hint for casts, column definitions and literals.
    pub data_type: Option<DataType>,
    /// Operator of a binary or unary expression.
    pub operator: Option<Operator>,
    /// Innermost production active when the node was allocated.
    pub context: Option<ParseContext>,
    /// Position of the node's first token.
    pub location: Location,
    /// Source range covered by the node.
    pub span: Span,
    pub(super) parent: Option<NodeId>,
    pub(super) first_child: Option<NodeId>,
    pub(super) last_child: Option<NodeId>,
    pub(super) next_sibling: Option<NodeId>,
    pub(super) child_count: u32,
}

impl AstNode {
    pub(super) fn new(node_type: NodeType, node_id: u32, location: Location, span: Span) -> Self {
        Self {
            node_type,
            node_id,
            primary_text: Text::None,
            schema_name: Text::None,
            catalog_name: Text::None,
            qualifier: Text::None,
            semantic_flags: SemanticFlags::empty(),
            data_type: None,
            operator: None,
            context: None,
            location,
            span,
            parent: None,
            first_child: None,
            last_child: None,
            next_sibling: None,
            child_count: 0,
        }
    }

    /// The node this one is attached to, if any.
    #[must_use]
    pub const fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    #[must_use]
    pub const fn first_child(&self) -> Option<NodeId> {
        self.first_child
    }

    #[must_use]
    pub const fn next_sibling(&self) -> Option<NodeId> {
        self.next_sibling
    }

    /// Number of attached children.
    #[must_use]
    pub const fn child_count(&self) -> usize {
        self.child_count as usize
    }

    /// Returns true if every flag in `flags` is set.
    #[must_use]
    pub const fn has(&self, flags: SemanticFlags) -> bool {
        self.semantic_flags.contains(flags)
    }
}
