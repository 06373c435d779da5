//! INSERT, UPDATE and DELETE.

use crate::ast::{NodeId, NodeType, ParseContext, SemanticFlags};
use crate::lexer::{Keyword, TokenKind, TokenSource};

use super::engine::Engine;
use super::ParseError;

impl<'s, S: TokenSource<'s>> Engine<'_, 's, S> {
    /// Parses `INSERT [OR action] INTO ...` or `REPLACE INTO ...`.
    pub(super) fn parse_insert(&mut self) -> Result<NodeId, ParseError> {
        let Some(token) = self.advance() else {
            return Err(self.unexpected("INSERT"));
        };
        let insert = self.node(NodeType::InsertStmt, &token)?;
        if token.kind == TokenKind::Keyword(Keyword::Replace) {
            self.flag(insert, SemanticFlags::REPLACE);
        } else if self.check_keyword(Keyword::Or) {
            self.parse_conflict_action(insert)?;
        }
        self.expect_keyword(Keyword::Into)?;

        let table = self.parse_object_name(NodeType::TableRef)?;
        if self.check_keyword(Keyword::As) {
            self.parse_optional_alias(table)?;
        }
        self.attach(insert, table);

        if self.check(TokenKind::LeftParen)
            && !matches!(
                self.peek_kind(1),
                Some(TokenKind::Keyword(Keyword::Select | Keyword::With | Keyword::Values))
            )
        {
            let columns = self.parse_column_list()?;
            self.attach(insert, columns);
        }

        match self.current_kind() {
            Some(TokenKind::Keyword(Keyword::Values)) => {
                let values = self.parse_values(NodeType::ValuesClause)?;
                self.attach(insert, values);
            }
            Some(TokenKind::Keyword(Keyword::Default)) => {
                self.advance();
                self.expect_keyword(Keyword::Values)?;
                self.flag(insert, SemanticFlags::DEFAULT_VALUES);
            }
            Some(TokenKind::Keyword(Keyword::Select | Keyword::With)) => {
                let query = self.parse_query()?;
                self.attach(insert, query);
            }
            Some(TokenKind::LeftParen) => {
                self.advance();
                let query = self.in_context(ParseContext::Subquery, Self::parse_query)?;
                self.expect(TokenKind::RightParen, "')'")?;
                self.attach(insert, query);
            }
            _ => return Err(self.unexpected("VALUES, SELECT or DEFAULT VALUES")),
        }

        self.parse_returning(insert)?;
        Ok(self.finish(insert))
    }

    /// Parses `UPDATE [OR action] table [alias] SET ... [FROM] [WHERE]
    /// [RETURNING]`.
    pub(super) fn parse_update(&mut self) -> Result<NodeId, ParseError> {
        let token = self.expect_keyword(Keyword::Update)?;
        let update = self.node(NodeType::UpdateStmt, &token)?;
        if self.check_keyword(Keyword::Or) {
            self.parse_conflict_action(update)?;
        }

        let table = self.parse_object_name(NodeType::TableRef)?;
        self.parse_optional_alias(table)?;
        self.attach(update, table);

        let set = self.expect_keyword(Keyword::Set)?;
        let clause = self.node(NodeType::SetClause, &set)?;
        loop {
            let assignment = self.parse_assignment()?;
            self.attach(clause, assignment);
            if !self.consume(TokenKind::Comma) {
                break;
            }
        }
        self.finish(clause);
        self.attach(update, clause);

        if let Some(token) = self.current().filter(|t| t.kind == TokenKind::Keyword(Keyword::From)) {
            self.advance();
            let from = self.node(NodeType::FromClause, &token)?;
            self.in_context(ParseContext::FromClause, |p| {
                loop {
                    let item = p.parse_object_name(NodeType::TableRef)?;
                    p.parse_optional_alias(item)?;
                    p.attach(from, item);
                    if !p.consume(TokenKind::Comma) {
                        break;
                    }
                }
                Ok(())
            })?;
            self.finish(from);
            self.attach(update, from);
        }

        if self.check_keyword(Keyword::Where) {
            let clause = self.parse_where()?;
            self.attach(update, clause);
        }

        self.parse_returning(update)?;
        Ok(self.finish(update))
    }

    /// Parses `column = expr` or `(a, b) = expr`.
    pub(super) fn parse_assignment(&mut self) -> Result<NodeId, ParseError> {
        let Some(token) = self.current() else {
            return Err(self.unexpected("column name"));
        };
        let assignment = if token.kind == TokenKind::LeftParen {
            let assignment = self.node(NodeType::Assignment, &token)?;
            let columns = self.parse_column_list()?;
            self.attach(assignment, columns);
            assignment
        } else {
            let name = self.expect_identifier("column name")?;
            self.named_node(NodeType::Assignment, &name)?
        };
        if !self.consume(TokenKind::Eq) && !self.consume_keyword(Keyword::To) {
            return Err(self.unexpected("'='"));
        }
        let value = self.parse_expr(0)?;
        self.attach(assignment, value);
        Ok(self.finish(assignment))
    }

    /// Parses `DELETE FROM table [alias] [WHERE] [RETURNING]`.
    pub(super) fn parse_delete(&mut self) -> Result<NodeId, ParseError> {
        let token = self.expect_keyword(Keyword::Delete)?;
        let delete = self.node(NodeType::DeleteStmt, &token)?;
        self.expect_keyword(Keyword::From)?;

        let table = self.parse_object_name(NodeType::TableRef)?;
        self.parse_optional_alias(table)?;
        self.attach(delete, table);

        if self.check_keyword(Keyword::Where) {
            let clause = self.parse_where()?;
            self.attach(delete, clause);
        }

        self.parse_returning(delete)?;
        Ok(self.finish(delete))
    }

    /// Parses `OR {ROLLBACK | ABORT | REPLACE | FAIL | IGNORE}`.
    fn parse_conflict_action(&mut self, statement: NodeId) -> Result<(), ParseError> {
        let or = self.expect_keyword(Keyword::Or)?;
        match self.current() {
            Some(token)
                if matches!(
                    token.kind,
                    TokenKind::Keyword(
                        Keyword::Rollback
                            | Keyword::Abort
                            | Keyword::Replace
                            | Keyword::Fail
                            | Keyword::Ignore
                    )
                ) =>
            {
                self.advance();
                let action = self.node(NodeType::ConflictAction, &or)?;
                let text = self.token_text(&token)?;
                self.arena.node_mut(action).primary_text = text;
                self.finish(action);
                self.attach(statement, action);
                if token.kind == TokenKind::Keyword(Keyword::Replace) {
                    self.flag(statement, SemanticFlags::REPLACE);
                }
                Ok(())
            }
            _ => Err(self.unexpected("ROLLBACK, ABORT, REPLACE, FAIL or IGNORE")),
        }
    }

    /// Parses an optional `RETURNING items` clause onto `statement`.
    fn parse_returning(&mut self, statement: NodeId) -> Result<(), ParseError> {
        if self.consume_keyword(Keyword::Returning) {
            let returning = self.in_context(ParseContext::SelectList, |p| {
                p.parse_result_columns(NodeType::ReturningClause)
            })?;
            self.attach(statement, returning);
        }
        Ok(())
    }
}
