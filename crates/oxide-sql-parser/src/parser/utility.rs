//! Transaction control, EXPLAIN, SET and the database-maintenance
//! statements.

use crate::ast::{NodeId, NodeType, SemanticFlags};
use crate::lexer::{Keyword, Token, TokenKind, TokenSource};

use super::engine::Engine;
use super::ParseError;

impl<'s, S: TokenSource<'s>> Engine<'_, 's, S> {
    /// Parses `BEGIN [DEFERRED | IMMEDIATE | EXCLUSIVE] [TRANSACTION]` or
    /// `START TRANSACTION`.
    pub(super) fn parse_begin(&mut self) -> Result<NodeId, ParseError> {
        let Some(token) = self.advance() else {
            return Err(self.unexpected("BEGIN"));
        };
        let begin = self.node(NodeType::BeginStmt, &token)?;
        if token.kind == TokenKind::Keyword(Keyword::Start) {
            self.expect_keyword(Keyword::Transaction)?;
            return Ok(self.finish(begin));
        }
        if let Some(mode) = self.current().filter(|t| {
            matches!(
                t.kind,
                TokenKind::Keyword(Keyword::Deferred | Keyword::Immediate | Keyword::Exclusive)
            )
        }) {
            self.advance();
            let text = self.token_text(&mode)?;
            self.arena.node_mut(begin).primary_text = text;
        }
        self.consume_keyword(Keyword::Transaction);
        Ok(self.finish(begin))
    }

    /// Parses `COMMIT [TRANSACTION]` or `END [TRANSACTION]`.
    pub(super) fn parse_commit(&mut self) -> Result<NodeId, ParseError> {
        let Some(token) = self.advance() else {
            return Err(self.unexpected("COMMIT"));
        };
        let commit = self.node(NodeType::CommitStmt, &token)?;
        self.consume_keyword(Keyword::Transaction);
        Ok(self.finish(commit))
    }

    /// Parses `ROLLBACK [TRANSACTION] [TO [SAVEPOINT] name]`.
    pub(super) fn parse_rollback(&mut self) -> Result<NodeId, ParseError> {
        let token = self.expect_keyword(Keyword::Rollback)?;
        let rollback = self.node(NodeType::RollbackStmt, &token)?;
        self.consume_keyword(Keyword::Transaction);
        if self.consume_keyword(Keyword::To) {
            self.consume_keyword(Keyword::Savepoint);
            let name = self.expect_identifier("savepoint name")?;
            let text = self.token_text(&name)?;
            self.arena.node_mut(rollback).primary_text = text;
        }
        Ok(self.finish(rollback))
    }

    /// Parses `SAVEPOINT name`.
    pub(super) fn parse_savepoint(&mut self) -> Result<NodeId, ParseError> {
        let token = self.expect_keyword(Keyword::Savepoint)?;
        let savepoint = self.node(NodeType::SavepointStmt, &token)?;
        let name = self.expect_identifier("savepoint name")?;
        let text = self.token_text(&name)?;
        self.arena.node_mut(savepoint).primary_text = text;
        Ok(self.finish(savepoint))
    }

    /// Parses `RELEASE [SAVEPOINT] name`.
    pub(super) fn parse_release(&mut self) -> Result<NodeId, ParseError> {
        let token = self.expect_keyword(Keyword::Release)?;
        let release = self.node(NodeType::ReleaseStmt, &token)?;
        self.consume_keyword(Keyword::Savepoint);
        let name = self.expect_identifier("savepoint name")?;
        let text = self.token_text(&name)?;
        self.arena.node_mut(release).primary_text = text;
        Ok(self.finish(release))
    }

    /// Parses `EXPLAIN [QUERY PLAN] statement`.
    pub(super) fn parse_explain(&mut self) -> Result<NodeId, ParseError> {
        let token = self.expect_keyword(Keyword::Explain)?;
        let explain = self.node(NodeType::ExplainStmt, &token)?;
        if self.consume_keyword(Keyword::Query) {
            self.expect_keyword(Keyword::Plan)?;
            self.flag(explain, SemanticFlags::QUERY_PLAN);
        }
        let statement = self.parse_statement()?;
        self.attach(explain, statement);
        Ok(self.finish(explain))
    }

    /// Parses `SET name {= | TO} value, ...`.
    pub(super) fn parse_set(&mut self) -> Result<NodeId, ParseError> {
        let token = self.expect_keyword(Keyword::Set)?;
        let set = self.node(NodeType::SetStmt, &token)?;
        loop {
            let assignment = self.parse_assignment()?;
            self.attach(set, assignment);
            if !self.consume(TokenKind::Comma) {
                break;
            }
        }
        Ok(self.finish(set))
    }

    /// Parses `PRAGMA [schema.]name [= value | (value)]`.
    pub(super) fn parse_pragma(&mut self) -> Result<NodeId, ParseError> {
        let token = self.expect_keyword(Keyword::Pragma)?;
        let pragma = self.node(NodeType::PragmaStmt, &token)?;
        let name = self.parse_object_name(NodeType::ObjectName)?;
        self.attach(pragma, name);

        if self.consume(TokenKind::Eq) {
            let value = self.parse_pragma_value()?;
            self.attach(pragma, value);
        } else if self.consume(TokenKind::LeftParen) {
            let value = self.parse_pragma_value()?;
            self.expect(TokenKind::RightParen, "')'")?;
            self.attach(pragma, value);
        }
        Ok(self.finish(pragma))
    }

    /// A pragma value is a word (`ON`, `FULL`, `wal`) or an expression.
    fn parse_pragma_value(&mut self) -> Result<NodeId, ParseError> {
        match self.current() {
            Some(word) if matches!(word.kind, TokenKind::Identifier | TokenKind::Keyword(_)) => {
                self.advance();
                self.named_node(NodeType::Identifier, &word)
            }
            _ => self.parse_expr(0),
        }
    }

    /// Parses `VACUUM [schema] [INTO file]`.
    pub(super) fn parse_vacuum(&mut self) -> Result<NodeId, ParseError> {
        let token = self.expect_keyword(Keyword::Vacuum)?;
        let vacuum = self.node(NodeType::VacuumStmt, &token)?;
        if self.check_identifier() {
            let schema = self.parse_object_name(NodeType::ObjectName)?;
            self.attach(vacuum, schema);
        }
        if self.consume_keyword(Keyword::Into) {
            let file = self.parse_expr(0)?;
            self.attach(vacuum, file);
        }
        Ok(self.finish(vacuum))
    }

    /// Parses `ATTACH [DATABASE] expr AS name`.
    pub(super) fn parse_attach(&mut self) -> Result<NodeId, ParseError> {
        let token = self.expect_keyword(Keyword::Attach)?;
        let attach = self.node(NodeType::AttachStmt, &token)?;
        self.consume_keyword(Keyword::Database);
        let file = self.parse_expr(0)?;
        self.attach(attach, file);
        self.expect_keyword(Keyword::As)?;
        let name = self.expect_identifier("schema name")?;
        let text = self.token_text(&name)?;
        self.arena.node_mut(attach).primary_text = text;
        Ok(self.finish(attach))
    }

    /// Parses `DETACH [DATABASE] name`.
    pub(super) fn parse_detach(&mut self) -> Result<NodeId, ParseError> {
        let token = self.expect_keyword(Keyword::Detach)?;
        let detach = self.node(NodeType::DetachStmt, &token)?;
        self.consume_keyword(Keyword::Database);
        let name = self.expect_identifier("schema name")?;
        let text = self.token_text(&name)?;
        self.arena.node_mut(detach).primary_text = text;
        Ok(self.finish(detach))
    }

    /// Parses `REINDEX [name]`.
    pub(super) fn parse_reindex(&mut self) -> Result<NodeId, ParseError> {
        let token = self.expect_keyword(Keyword::Reindex)?;
        self.parse_optional_target(NodeType::ReindexStmt, &token)
    }

    /// Parses `ANALYZE [name]`.
    pub(super) fn parse_analyze(&mut self) -> Result<NodeId, ParseError> {
        let token = self.expect_keyword(Keyword::Analyze)?;
        self.parse_optional_target(NodeType::AnalyzeStmt, &token)
    }

    fn parse_optional_target(
        &mut self,
        node_type: NodeType,
        token: &Token<'s>,
    ) -> Result<NodeId, ParseError> {
        let statement = self.node(node_type, token)?;
        if self.check_identifier() {
            let name = self.parse_object_name(NodeType::ObjectName)?;
            self.attach(statement, name);
        }
        Ok(self.finish(statement))
    }
}
