//! SQL Parser
//!
//! A hand-written recursive descent parser with Pratt expression parsing.
//! Nodes are allocated in the parser's [`AstArena`]; every parse call
//! rewinds the arena first, so a returned [`Ast`] borrows the parser until
//! the next call.

mod config;
mod ddl;
mod dml;
mod engine;
mod error;
mod expr;
mod guard;
mod pratt;
mod select;
mod utility;

use std::cell::RefCell;

use tracing::debug;

pub use config::{ParseMode, ParserConfig, DEFAULT_STACK_BUDGET};
pub use error::{ErrorKind, ParseError};

use crate::arena::ArenaError;
use crate::ast::{Ast, AstArena, NodeId, Script};
use crate::lexer::{Lexer, TokenCursor, TokenSource};
use crate::validator;

use engine::{is_recoverable, Engine};

/// SQL Parser.
///
/// ```
/// use oxide_sql_parser::{NodeType, Parser};
///
/// let mut parser = Parser::new();
/// let ast = parser.parse("SELECT id FROM users WHERE active").unwrap();
/// assert_eq!(ast.node_type(), NodeType::SelectStmt);
/// assert!(ast.find(NodeType::WhereClause).is_some());
/// ```
#[derive(Debug, Default)]
pub struct Parser {
    arena: AstArena,
    config: ParserConfig,
    max_depth_reached: usize,
}

/// Result of [`Parser::parse_all`]: every statement that parsed and
/// validated, plus one error per statement that did not.
#[derive(Debug)]
pub struct ScriptReport<'a, 's> {
    pub script: Script<'a, 's>,
    pub errors: Vec<ParseError>,
}

impl ScriptReport<'_, '_> {
    /// Returns true if no statement failed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

impl Parser {
    /// Creates a parser with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(config: ParserConfig) -> Self {
        Self {
            arena: AstArena::new(),
            config,
            max_depth_reached: 0,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parses exactly one statement (trailing semicolons are allowed).
    ///
    /// # Errors
    ///
    /// Returns the first syntax error, a depth or memory error, or the
    /// first validation failure.
    pub fn parse<'s>(&mut self, sql: &'s str) -> Result<Ast<'_, 's>, ParseError> {
        let tokens = TokenCursor::new(Lexer::new(sql).tokenize());
        self.parse_tokens(sql, tokens)
    }

    /// Parses one statement from tokens produced by another tokenizer.
    ///
    /// `source` is the text the tokens' spans point into.
    ///
    /// # Errors
    ///
    /// Same as [`parse`](Self::parse).
    pub fn parse_tokens<'s, S: TokenSource<'s>>(
        &mut self,
        source: &'s str,
        tokens: S,
    ) -> Result<Ast<'_, 's>, ParseError> {
        let mode = self.config.mode;
        let ast = self.build(source, tokens)?;
        validator::validate(&ast, mode).map_err(|err| ParseError::from(err).with_source(source))?;
        debug!(
            statement = ?ast.node_type(),
            nodes = ast.arena().node_count(),
            memory = ast.arena().memory_used(),
            "parsed statement"
        );
        Ok(ast)
    }

    /// Parses one statement without running the validator.
    #[cfg(test)]
    pub(crate) fn parse_unvalidated<'s>(&mut self, sql: &'s str) -> Result<Ast<'_, 's>, ParseError> {
        let tokens = TokenCursor::new(Lexer::new(sql).tokenize());
        self.build(sql, tokens)
    }

    fn build<'s, S: TokenSource<'s>>(
        &mut self,
        source: &'s str,
        tokens: S,
    ) -> Result<Ast<'_, 's>, ParseError> {
        self.arena.reset();
        let (result, deepest) = {
            let mut engine = Engine::new(tokens, source, &mut self.arena, &self.config);
            (engine.parse_single(), engine.deepest())
        };
        self.max_depth_reached = deepest;
        let root = result.map_err(|err| err.with_source(source))?;
        Ok(Ast::new(&self.arena, source, root))
    }

    /// Parses a `;`-separated script, stopping at the first error.
    ///
    /// # Errors
    ///
    /// Returns the first error of any kind.
    pub fn parse_script<'s>(&mut self, sql: &'s str) -> Result<Script<'_, 's>, ParseError> {
        self.arena.reset();
        let tokens = TokenCursor::new(Lexer::new(sql).tokenize());
        let mut roots = Vec::new();
        let (outcome, deepest) = {
            let mut engine = Engine::new(tokens, sql, &mut self.arena, &self.config);
            let outcome = loop {
                match engine.parse_next() {
                    Ok(Some(root)) => roots.push(root),
                    Ok(None) => break Ok(()),
                    Err(err) => break Err(err),
                }
            };
            (outcome, engine.deepest())
        };
        self.max_depth_reached = deepest;
        outcome.map_err(|err| err.with_source(sql))?;

        for &root in &roots {
            validator::validate(&Ast::new(&self.arena, sql, root), self.config.mode)
                .map_err(|err| ParseError::from(err).with_source(sql))?;
        }
        debug!(
            statements = roots.len(),
            nodes = self.arena.node_count(),
            "parsed script"
        );
        Ok(Script::new(&self.arena, sql, roots))
    }

    /// Parses a script and keeps going after errors.
    ///
    /// After a syntax or depth error the parser skips to the next statement
    /// boundary and continues, so every independent error is reported.
    /// Statements that fail validation are reported and left out of the
    /// script. An out-of-memory error ends the run.
    pub fn parse_all<'s>(&mut self, sql: &'s str) -> ScriptReport<'_, 's> {
        self.arena.reset();
        let tokens = TokenCursor::new(Lexer::new(sql).tokenize());
        let mut roots: Vec<NodeId> = Vec::new();
        let mut errors = Vec::new();
        self.max_depth_reached = {
            let mut engine = Engine::new(tokens, sql, &mut self.arena, &self.config);
            loop {
                match engine.parse_next() {
                    Ok(Some(root)) => roots.push(root),
                    Ok(None) => break,
                    Err(err) => {
                        let recoverable = is_recoverable(&err);
                        errors.push(err.with_source(sql));
                        if !recoverable {
                            break;
                        }
                        engine.synchronize();
                    }
                }
            }
            engine.deepest()
        };

        let mode = self.config.mode;
        let arena = &self.arena;
        roots.retain(|&root| match validator::validate(&Ast::new(arena, sql, root), mode) {
            Ok(()) => true,
            Err(err) => {
                errors.push(ParseError::from(err).with_source(sql));
                false
            }
        });
        errors.sort_by_key(|err| err.location.offset);
        debug!(
            statements = roots.len(),
            errors = errors.len(),
            "parsed script with recovery"
        );
        ScriptReport {
            script: Script::new(arena, sql, roots),
            errors,
        }
    }

    /// Rewinds the arena, invalidating every tree handed out so far.
    pub fn reset(&mut self) {
        self.arena.reset();
        self.max_depth_reached = 0;
    }

    /// Bytes of arena storage in use.
    #[must_use]
    pub fn memory_used(&self) -> usize {
        self.arena.memory_used()
    }

    /// Nodes allocated by the last parse call.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.arena.node_count()
    }

    /// Deepest recursion level reached by the last parse call.
    #[must_use]
    pub const fn max_depth_reached(&self) -> usize {
        self.max_depth_reached
    }
}

thread_local! {
    static THREAD_PARSER: RefCell<Option<Parser>> = const { RefCell::new(None) };
}

/// Runs `f` with exclusive access to this thread's parser, built with the
/// default configuration on first use.
///
/// # Errors
///
/// Returns [`ArenaError::Busy`] when called from inside another
/// `with_thread_parser` closure on the same thread.
pub fn with_thread_parser<R>(f: impl FnOnce(&mut Parser) -> R) -> Result<R, ArenaError> {
    THREAD_PARSER.with(|cell| {
        let mut slot = cell.try_borrow_mut().map_err(|_| ArenaError::Busy)?;
        let parser = slot.get_or_insert_with(Parser::new);
        Ok(f(parser))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::NodeType;

    #[test]
    fn test_parse_resets_between_calls() {
        let mut parser = Parser::new();
        let first = parser.parse("SELECT a FROM t").unwrap().node_count();
        let second = parser.parse("SELECT a FROM t").unwrap().node_count();
        assert_eq!(first, second);
        assert_eq!(parser.node_count(), second);
    }

    #[test]
    fn test_trailing_input_is_rejected() {
        let mut parser = Parser::new();
        let err = parser.parse("SELECT 1 SELECT 2").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Syntax);
        assert_eq!(err.found.as_deref(), Some("SELECT"));
    }

    #[test]
    fn test_empty_input_is_rejected() {
        let mut parser = Parser::new();
        let err = parser.parse("  ;; ").unwrap_err();
        assert_eq!(err.found.as_deref(), Some("end of input"));
    }

    #[test]
    fn test_error_carries_source_line() {
        let mut parser = Parser::new();
        let err = parser.parse("SELECT *\nFROM WHERE").unwrap_err();
        assert_eq!(err.context.as_deref(), Some("FROM WHERE"));
        assert_eq!(err.location.line, 2);
    }

    #[test]
    fn test_script_stops_at_first_error() {
        let mut parser = Parser::new();
        assert_eq!(parser.parse_script("SELECT 1; SELECT 2;").unwrap().len(), 2);
        assert!(parser.parse_script("SELECT 1; SELECT FROM; SELECT 2").is_err());
    }

    #[test]
    fn test_parse_all_collects_every_error() {
        let mut parser = Parser::new();
        let report = parser.parse_all("SELECT 1; SELECT FROM; SELECT 2; DELETE t; SELECT 3");
        assert_eq!(report.script.len(), 3);
        assert_eq!(report.errors.len(), 2);
        assert!(report.errors[0].location.offset < report.errors[1].location.offset);
    }

    #[test]
    fn test_max_depth_reached_is_tracked() {
        let mut parser = Parser::new();
        parser.parse("SELECT 1").unwrap();
        let shallow = parser.max_depth_reached();
        parser.parse("SELECT ((((1))))").unwrap();
        assert!(parser.max_depth_reached() > shallow);
        parser.reset();
        assert_eq!(parser.max_depth_reached(), 0);
    }

    #[test]
    fn test_thread_parser() {
        let kind = with_thread_parser(|parser| {
            parser.parse("DELETE FROM t").map(|ast| ast.node_type())
        })
        .unwrap()
        .unwrap();
        assert_eq!(kind, NodeType::DeleteStmt);
        let nested = with_thread_parser(|_| with_thread_parser(|_| ())).unwrap();
        assert_eq!(nested, Err(ArenaError::Busy));
    }
}
