//! Token types for the SQL lexer.

use super::{Location, Span};

macro_rules! keywords {
    ($($variant:ident => $text:literal),* $(,)?) => {
        /// SQL keywords.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Keyword {
            $(
                #[doc = $text]
                $variant,
            )*
        }

        impl Keyword {
            /// Attempts to parse a keyword from a string (case-insensitive).
            #[must_use]
            #[allow(clippy::should_implement_trait)]
            pub fn from_str(s: &str) -> Option<Self> {
                match s.to_ascii_uppercase().as_str() {
                    $($text => Some(Self::$variant),)*
                    _ => None,
                }
            }

            /// Returns the keyword as a string.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)*
                }
            }
        }
    };
}

keywords! {
    // Data Query Language (DQL)
    Select => "SELECT",
    From => "FROM",
    Where => "WHERE",
    Order => "ORDER",
    By => "BY",
    Group => "GROUP",
    Having => "HAVING",
    Limit => "LIMIT",
    Offset => "OFFSET",
    Distinct => "DISTINCT",
    All => "ALL",

    // Joins
    Join => "JOIN",
    Inner => "INNER",
    Left => "LEFT",
    Right => "RIGHT",
    Full => "FULL",
    Outer => "OUTER",
    Cross => "CROSS",
    Natural => "NATURAL",
    On => "ON",
    Using => "USING",

    // Set operations
    Union => "UNION",
    Intersect => "INTERSECT",
    Except => "EXCEPT",

    // Data Manipulation Language (DML)
    Insert => "INSERT",
    Into => "INTO",
    Values => "VALUES",
    Update => "UPDATE",
    Set => "SET",
    Delete => "DELETE",
    Returning => "RETURNING",
    Replace => "REPLACE",

    // Data Definition Language (DDL)
    Create => "CREATE",
    Drop => "DROP",
    Alter => "ALTER",
    Truncate => "TRUNCATE",
    Table => "TABLE",
    Index => "INDEX",
    View => "VIEW",
    Trigger => "TRIGGER",
    Schema => "SCHEMA",
    Database => "DATABASE",
    Rename => "RENAME",
    To => "TO",
    Add => "ADD",
    Column => "COLUMN",

    // Constraints
    Primary => "PRIMARY",
    Key => "KEY",
    Foreign => "FOREIGN",
    References => "REFERENCES",
    Unique => "UNIQUE",
    Check => "CHECK",
    Default => "DEFAULT",
    Constraint => "CONSTRAINT",
    Cascade => "CASCADE",
    Restrict => "RESTRICT",
    Autoincrement => "AUTOINCREMENT",
    Collate => "COLLATE",
    Without => "WITHOUT",

    // Logical operators
    And => "AND",
    Or => "OR",
    Not => "NOT",
    In => "IN",
    Between => "BETWEEN",
    Like => "LIKE",
    Glob => "GLOB",
    Escape => "ESCAPE",
    Is => "IS",
    Null => "NULL",
    True => "TRUE",
    False => "FALSE",
    Exists => "EXISTS",

    // Ordering
    Asc => "ASC",
    Desc => "DESC",
    Nulls => "NULLS",
    First => "FIRST",
    Last => "LAST",

    // Data types
    Int => "INT",
    Integer => "INTEGER",
    Smallint => "SMALLINT",
    Bigint => "BIGINT",
    Real => "REAL",
    Double => "DOUBLE",
    Float => "FLOAT",
    Decimal => "DECIMAL",
    Numeric => "NUMERIC",
    Char => "CHAR",
    Varchar => "VARCHAR",
    Text => "TEXT",
    Blob => "BLOB",
    Boolean => "BOOLEAN",
    Date => "DATE",
    Time => "TIME",
    Timestamp => "TIMESTAMP",
    Datetime => "DATETIME",

    // SQLite specific
    If => "IF",
    Temporary => "TEMPORARY",
    Temp => "TEMP",
    Conflict => "CONFLICT",
    Abort => "ABORT",
    Rollback => "ROLLBACK",
    Fail => "FAIL",
    Ignore => "IGNORE",

    // Common clauses
    As => "AS",
    Case => "CASE",
    When => "WHEN",
    Then => "THEN",
    Else => "ELSE",
    End => "END",
    Cast => "CAST",
    Extract => "EXTRACT",

    // Transaction
    Begin => "BEGIN",
    Commit => "COMMIT",
    Transaction => "TRANSACTION",
    Start => "START",
    Savepoint => "SAVEPOINT",
    Release => "RELEASE",
    Deferred => "DEFERRED",
    Immediate => "IMMEDIATE",
    Exclusive => "EXCLUSIVE",

    // Common table expressions and windows
    With => "WITH",
    Recursive => "RECURSIVE",
    Over => "OVER",
    Partition => "PARTITION",
    Window => "WINDOW",

    // Triggers
    Before => "BEFORE",
    After => "AFTER",
    Instead => "INSTEAD",
    Of => "OF",
    For => "FOR",
    Each => "EACH",
    Row => "ROW",

    // Utility statements
    Explain => "EXPLAIN",
    Query => "QUERY",
    Plan => "PLAN",
    Pragma => "PRAGMA",
    Vacuum => "VACUUM",
    Analyze => "ANALYZE",
    Attach => "ATTACH",
    Detach => "DETACH",
    Reindex => "REINDEX",
}

impl Keyword {
    /// Returns true for keywords that can never be used as a bare
    /// identifier. Any keyword is accepted after a dot in a qualified name.
    #[must_use]
    pub const fn is_reserved(&self) -> bool {
        matches!(
            self,
            Self::Select
                | Self::From
                | Self::Where
                | Self::Order
                | Self::By
                | Self::Group
                | Self::Having
                | Self::Limit
                | Self::Offset
                | Self::Distinct
                | Self::All
                | Self::Join
                | Self::Inner
                | Self::Left
                | Self::Right
                | Self::Full
                | Self::Outer
                | Self::Cross
                | Self::Natural
                | Self::On
                | Self::Using
                | Self::Union
                | Self::Intersect
                | Self::Except
                | Self::Insert
                | Self::Into
                | Self::Values
                | Self::Update
                | Self::Set
                | Self::Delete
                | Self::Returning
                | Self::Create
                | Self::Drop
                | Self::Alter
                | Self::Table
                | Self::Index
                | Self::Primary
                | Self::Foreign
                | Self::References
                | Self::Unique
                | Self::Check
                | Self::Default
                | Self::Constraint
                | Self::Collate
                | Self::And
                | Self::Or
                | Self::Not
                | Self::In
                | Self::Between
                | Self::Like
                | Self::Glob
                | Self::Escape
                | Self::Is
                | Self::Null
                | Self::True
                | Self::False
                | Self::Exists
                | Self::As
                | Self::Case
                | Self::When
                | Self::Then
                | Self::Else
                | Self::End
                | Self::Cast
                | Self::Extract
                | Self::With
                | Self::Window
        )
    }

    /// Returns true for keywords that begin a statement. Used to find a
    /// resynchronization point after a syntax error.
    #[must_use]
    pub const fn starts_statement(&self) -> bool {
        matches!(
            self,
            Self::Select
                | Self::With
                | Self::Insert
                | Self::Replace
                | Self::Update
                | Self::Delete
                | Self::Create
                | Self::Drop
                | Self::Alter
                | Self::Truncate
                | Self::Begin
                | Self::Start
                | Self::Commit
                | Self::Rollback
                | Self::Savepoint
                | Self::Release
                | Self::Explain
                | Self::Values
                | Self::Set
                | Self::Pragma
                | Self::Vacuum
                | Self::Analyze
                | Self::Attach
                | Self::Detach
                | Self::Reindex
        )
    }
}

/// The kind of token.
///
/// The token text is carried by [`Token::text`]; kinds carry no payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Literals
    /// Integer literal (e.g., 42)
    Integer,
    /// Float literal (e.g., 3.14)
    Float,
    /// String literal (e.g., 'hello'), quotes included in the text
    String,
    /// Blob literal (e.g., X'1234')
    Blob,

    // Identifiers and keywords
    /// Identifier (e.g., `column_name`)
    Identifier,
    /// Quoted identifier (e.g., "column name"), quotes included in the text
    QuotedIdentifier,
    /// SQL keyword
    Keyword(Keyword),
    /// Parameter placeholder (`?`, `?1`, `:name`, `@name`, `$name`)
    Parameter,

    // Operators
    /// +
    Plus,
    /// -
    Minus,
    /// *
    Star,
    /// /
    Slash,
    /// %
    Percent,
    /// = or ==
    Eq,
    /// != or <>
    NotEq,
    /// <
    Lt,
    /// <=
    LtEq,
    /// >
    Gt,
    /// >=
    GtEq,
    /// ||
    Concat,
    /// &
    BitAnd,
    /// |
    BitOr,
    /// ^
    BitXor,
    /// ~
    BitNot,
    /// <<
    LeftShift,
    /// >>
    RightShift,

    // Delimiters
    /// (
    LeftParen,
    /// )
    RightParen,
    /// ,
    Comma,
    /// ;
    Semicolon,
    /// .
    Dot,
    /// ::
    DoubleColon,

    // Special
    /// Invalid/unknown token, with the lexer's diagnosis
    Error(&'static str),
}

/// A token borrowing its text from the source buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'s> {
    /// The kind of token.
    pub kind: TokenKind,
    /// The exact source text of the token.
    pub text: &'s str,
    /// The location in the source code.
    pub span: Span,
    /// 1-based line of the first byte.
    pub line: u32,
    /// 1-based column of the first byte.
    pub column: u32,
}

impl<'s> Token<'s> {
    /// Creates a new token.
    #[must_use]
    pub const fn new(kind: TokenKind, text: &'s str, span: Span, line: u32, column: u32) -> Self {
        Self {
            kind,
            text,
            span,
            line,
            column,
        }
    }

    /// Returns the start position of the token.
    #[must_use]
    pub const fn location(&self) -> Location {
        Location::new(self.line, self.column, self.span.start)
    }

    /// Returns true if this is a keyword.
    #[must_use]
    pub const fn is_keyword(&self) -> bool {
        matches!(self.kind, TokenKind::Keyword(_))
    }

    /// Returns the keyword if this is a keyword token.
    #[must_use]
    pub const fn as_keyword(&self) -> Option<Keyword> {
        match self.kind {
            TokenKind::Keyword(kw) => Some(kw),
            _ => None,
        }
    }
}
