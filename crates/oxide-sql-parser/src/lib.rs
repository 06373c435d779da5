//! # oxide-sql-parser
//!
//! An arena-backed SQL parser.
//!
//! This crate provides:
//! - A region allocator that owns every syntax-tree node and copied string
//! - A hand-written recursive descent parser with Pratt expression parsing,
//!   recursion-depth protection and error recovery for scripts
//! - A structural validator for clause dependencies
//!
//! ## Parsing
//!
//! ```rust
//! use oxide_sql_parser::{NodeType, Parser};
//!
//! let mut parser = Parser::new();
//! let ast = parser
//!     .parse("SELECT u.name, COUNT(*) FROM users u GROUP BY u.name")
//!     .unwrap();
//!
//! assert_eq!(ast.node_type(), NodeType::SelectStmt);
//! let column = ast.find(NodeType::ColumnRef).unwrap();
//! assert_eq!(ast.qualifier(column), Some("u"));
//! assert_eq!(ast.text(column), Some("name"));
//! ```
//!
//! ## Scripts and recovery
//!
//! [`Parser::parse_all`] keeps going after a bad statement and reports
//! every error:
//!
//! ```rust
//! use oxide_sql_parser::Parser;
//!
//! let mut parser = Parser::new();
//! let report = parser.parse_all("SELECT 1; SELECT FROM; DELETE FROM t");
//! assert_eq!(report.script.len(), 2);
//! assert_eq!(report.errors.len(), 1);
//! ```
//!
//! ## Configuration
//!
//! ```rust
//! use oxide_sql_parser::{ErrorKind, ParseMode, Parser, ParserConfig};
//!
//! let sql = "SELECT 1 HAVING COUNT(*) > 0";
//! let err = Parser::new().parse(sql).unwrap_err();
//! assert_eq!(err.kind, ErrorKind::Validation);
//!
//! let config = ParserConfig::default().with_mode(ParseMode::Permissive);
//! assert!(Parser::with_config(config).parse(sql).is_ok());
//! ```

pub mod arena;
pub mod ast;
pub mod lexer;
pub mod parser;
pub mod validator;

pub use arena::{with_thread_arena, Arena, ArenaError};
pub use ast::{Ast, AstArena, AstNode, DataType, NodeId, NodeType, Script, SemanticFlags};
pub use lexer::{Lexer, Token, TokenCursor, TokenKind, TokenSource};
pub use parser::{
    with_thread_parser, ErrorKind, ParseError, ParseMode, Parser, ParserConfig, ScriptReport,
    DEFAULT_STACK_BUDGET,
};
pub use validator::ValidationError;
