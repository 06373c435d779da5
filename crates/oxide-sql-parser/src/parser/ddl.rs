//! CREATE, DROP, ALTER TABLE and TRUNCATE.

use crate::ast::{NodeId, NodeType, SemanticFlags};
use crate::lexer::{Keyword, Token, TokenKind, TokenSource};

use super::engine::Engine;
use super::expr::is_type_word;
use super::pratt::PRIMARY_BP;
use super::ParseError;

impl<'s, S: TokenSource<'s>> Engine<'_, 's, S> {
    /// Parses `CREATE [TEMP] [UNIQUE] {TABLE | INDEX | VIEW | TRIGGER |
    /// SCHEMA} ...`.
    pub(super) fn parse_create(&mut self) -> Result<NodeId, ParseError> {
        let create = self.expect_keyword(Keyword::Create)?;
        let temporary =
            self.consume_keyword(Keyword::Temp) || self.consume_keyword(Keyword::Temporary);
        let unique = self.consume_keyword(Keyword::Unique);

        let Some(token) = self.current() else {
            return Err(self.unexpected("TABLE, INDEX, VIEW, TRIGGER or SCHEMA"));
        };
        let (node_type, allows_temp) = match token.kind {
            TokenKind::Keyword(Keyword::Table) => (NodeType::CreateTableStmt, true),
            TokenKind::Keyword(Keyword::Index) => (NodeType::CreateIndexStmt, false),
            TokenKind::Keyword(Keyword::View) => (NodeType::CreateViewStmt, true),
            TokenKind::Keyword(Keyword::Trigger) => (NodeType::CreateTriggerStmt, true),
            TokenKind::Keyword(Keyword::Schema | Keyword::Database) => {
                (NodeType::CreateSchemaStmt, false)
            }
            _ => return Err(self.unexpected("TABLE, INDEX, VIEW, TRIGGER or SCHEMA")),
        };
        if temporary && !allows_temp {
            return Err(Self::error_at(&token, "TEMPORARY is not allowed here"));
        }
        if unique && node_type != NodeType::CreateIndexStmt {
            return Err(Self::error_at(&token, "UNIQUE is only allowed on CREATE INDEX"));
        }
        self.advance();

        let statement = self.node(node_type, &create)?;
        if temporary {
            self.flag(statement, SemanticFlags::TEMPORARY);
        }
        if unique {
            self.flag(statement, SemanticFlags::UNIQUE);
        }
        if self.check_keyword(Keyword::If) {
            self.advance();
            self.expect_keyword(Keyword::Not)?;
            self.expect_keyword(Keyword::Exists)?;
            self.flag(statement, SemanticFlags::IF_NOT_EXISTS);
        }

        match node_type {
            NodeType::CreateTableStmt => self.parse_create_table(statement)?,
            NodeType::CreateIndexStmt => self.parse_create_index(statement)?,
            NodeType::CreateViewStmt => self.parse_create_view(statement)?,
            NodeType::CreateTriggerStmt => self.parse_create_trigger(statement)?,
            _ => {
                let name = self.parse_object_name(NodeType::ObjectName)?;
                self.attach(statement, name);
            }
        }
        Ok(self.finish(statement))
    }

    fn parse_create_table(&mut self, statement: NodeId) -> Result<(), ParseError> {
        let name = self.parse_object_name(NodeType::TableRef)?;
        self.attach(statement, name);

        if self.consume_keyword(Keyword::As) {
            let query = self.parse_query()?;
            self.attach(statement, query);
            return Ok(());
        }

        self.expect(TokenKind::LeftParen, "'(' or AS")?;
        loop {
            let element = if self.starts_table_constraint() {
                self.parse_table_constraint()?
            } else {
                self.parse_column_def()?
            };
            self.attach(statement, element);
            if !self.consume(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RightParen, "')'")?;

        if let Some(without) = self
            .current()
            .filter(|t| t.kind == TokenKind::Keyword(Keyword::Without))
        {
            self.advance();
            match self.current() {
                Some(word) if word.text.eq_ignore_ascii_case("ROWID") => {
                    self.advance();
                    self.flag(statement, SemanticFlags::WITHOUT_ROWID);
                }
                _ => return Err(Self::error_at(&without, "Expected ROWID after WITHOUT")),
            }
        }
        Ok(())
    }

    fn starts_table_constraint(&self) -> bool {
        matches!(
            self.current_kind(),
            Some(TokenKind::Keyword(
                Keyword::Constraint
                    | Keyword::Primary
                    | Keyword::Unique
                    | Keyword::Check
                    | Keyword::Foreign
            ))
        )
    }

    /// Parses `name [type] [constraint ...]`.
    pub(super) fn parse_column_def(&mut self) -> Result<NodeId, ParseError> {
        let name = self.expect_identifier("column name")?;
        let column = self.named_node(NodeType::ColumnDef, &name)?;

        if let Some(start) = self.current().filter(|t| is_type_word(t)) {
            let (text, data_type) = self.parse_type_name()?;
            let type_name = self.node(NodeType::TypeName, &start)?;
            let node = self.arena.node_mut(type_name);
            node.primary_text = text;
            node.data_type = Some(data_type);
            self.finish(type_name);
            self.attach(column, type_name);
            self.arena.node_mut(column).data_type = Some(data_type);
        }

        while let Some(constraint) = self.parse_column_constraint()? {
            self.attach(column, constraint);
        }
        Ok(self.finish(column))
    }

    /// Parses one column constraint, or returns `None` if none follows.
    fn parse_column_constraint(&mut self) -> Result<Option<NodeId>, ParseError> {
        let Some(start) = self.current() else {
            return Ok(None);
        };
        let name = if start.kind == TokenKind::Keyword(Keyword::Constraint) {
            self.advance();
            Some(self.expect_identifier("constraint name")?)
        } else {
            None
        };
        let Some(token) = self.current() else {
            return Err(self.unexpected("constraint"));
        };

        let constraint = match token.kind {
            TokenKind::Keyword(Keyword::Primary) => {
                self.advance();
                self.expect_keyword(Keyword::Key)?;
                let pk = self.node(NodeType::PrimaryKeyConstraint, &start)?;
                if self.consume_keyword(Keyword::Desc) {
                    self.flag(pk, SemanticFlags::DESCENDING);
                } else if self.consume_keyword(Keyword::Asc) {
                    self.flag(pk, SemanticFlags::ASCENDING);
                }
                self.parse_on_conflict(pk)?;
                if self.consume_keyword(Keyword::Autoincrement) {
                    self.flag(pk, SemanticFlags::AUTOINCREMENT);
                }
                pk
            }
            TokenKind::Keyword(Keyword::Not) => {
                self.advance();
                self.expect_keyword(Keyword::Null)?;
                let not_null = self.node(NodeType::NotNullConstraint, &start)?;
                self.parse_on_conflict(not_null)?;
                not_null
            }
            TokenKind::Keyword(Keyword::Null) => {
                self.advance();
                self.node(NodeType::NullConstraint, &start)?
            }
            TokenKind::Keyword(Keyword::Unique) => {
                self.advance();
                let unique = self.node(NodeType::UniqueConstraint, &start)?;
                self.parse_on_conflict(unique)?;
                unique
            }
            TokenKind::Keyword(Keyword::Check) => {
                self.advance();
                let check = self.node(NodeType::CheckConstraint, &start)?;
                self.expect(TokenKind::LeftParen, "'('")?;
                let expr = self.parse_expr(0)?;
                self.expect(TokenKind::RightParen, "')'")?;
                self.attach(check, expr);
                check
            }
            TokenKind::Keyword(Keyword::Default) => {
                self.advance();
                let default = self.node(NodeType::DefaultConstraint, &start)?;
                let expr = self.parse_expr(PRIMARY_BP)?;
                self.attach(default, expr);
                default
            }
            TokenKind::Keyword(Keyword::Collate) => {
                self.advance();
                let collation = self.expect_name_part("collation name")?;
                let collate = self.node(NodeType::CollateConstraint, &start)?;
                let text = self.token_text(&collation)?;
                self.arena.node_mut(collate).primary_text = text;
                collate
            }
            TokenKind::Keyword(Keyword::References) => {
                let references = self.parse_references()?;
                let fk = self.node(NodeType::ForeignKeyConstraint, &start)?;
                self.attach(fk, references);
                fk
            }
            _ if name.is_some() => return Err(self.unexpected("constraint")),
            _ => return Ok(None),
        };

        if let Some(name) = name {
            let text = self.token_text(&name)?;
            self.arena.node_mut(constraint).primary_text = text;
        }
        Ok(Some(self.finish(constraint)))
    }

    /// Parses a table constraint: `[CONSTRAINT name] {PRIMARY KEY (cols) |
    /// UNIQUE (cols) | CHECK (expr) | FOREIGN KEY (cols) REFERENCES ...}`.
    fn parse_table_constraint(&mut self) -> Result<NodeId, ParseError> {
        let Some(start) = self.current() else {
            return Err(self.unexpected("table constraint"));
        };
        let name = if start.kind == TokenKind::Keyword(Keyword::Constraint) {
            self.advance();
            Some(self.expect_identifier("constraint name")?)
        } else {
            None
        };
        let Some(token) = self.advance() else {
            return Err(self.unexpected("table constraint"));
        };

        let constraint = match token.kind {
            TokenKind::Keyword(Keyword::Primary) => {
                self.expect_keyword(Keyword::Key)?;
                let pk = self.node(NodeType::PrimaryKeyConstraint, &start)?;
                let columns = self.parse_column_list()?;
                self.attach(pk, columns);
                self.parse_on_conflict(pk)?;
                pk
            }
            TokenKind::Keyword(Keyword::Unique) => {
                let unique = self.node(NodeType::UniqueConstraint, &start)?;
                let columns = self.parse_column_list()?;
                self.attach(unique, columns);
                self.parse_on_conflict(unique)?;
                unique
            }
            TokenKind::Keyword(Keyword::Check) => {
                let check = self.node(NodeType::CheckConstraint, &start)?;
                self.expect(TokenKind::LeftParen, "'('")?;
                let expr = self.parse_expr(0)?;
                self.expect(TokenKind::RightParen, "')'")?;
                self.attach(check, expr);
                check
            }
            TokenKind::Keyword(Keyword::Foreign) => {
                self.expect_keyword(Keyword::Key)?;
                let fk = self.node(NodeType::ForeignKeyConstraint, &start)?;
                let columns = self.parse_column_list()?;
                self.attach(fk, columns);
                let references = self.parse_references()?;
                self.attach(fk, references);
                fk
            }
            _ => {
                return Err(ParseError::unexpected(
                    "PRIMARY KEY, UNIQUE, CHECK or FOREIGN KEY",
                    &token,
                ))
            }
        };

        if let Some(name) = name {
            let text = self.token_text(&name)?;
            self.arena.node_mut(constraint).primary_text = text;
        }
        Ok(self.finish(constraint))
    }

    /// Parses `REFERENCES table [(cols)] [ON {DELETE | UPDATE} action]...`.
    fn parse_references(&mut self) -> Result<NodeId, ParseError> {
        self.expect_keyword(Keyword::References)?;
        let references = self.parse_object_name(NodeType::ReferencesClause)?;
        if self.check(TokenKind::LeftParen) {
            let columns = self.parse_column_list()?;
            self.attach(references, columns);
        }
        while self.check_keyword(Keyword::On)
            && matches!(
                self.peek_kind(1),
                Some(TokenKind::Keyword(Keyword::Delete | Keyword::Update))
            )
        {
            self.advance();
            self.advance();
            self.parse_referential_action(references)?;
        }
        Ok(self.finish(references))
    }

    /// Parses `CASCADE | RESTRICT | SET NULL | SET DEFAULT | NO ACTION`.
    fn parse_referential_action(&mut self, references: NodeId) -> Result<(), ParseError> {
        match self.current() {
            Some(token) if token.kind == TokenKind::Keyword(Keyword::Cascade) => {
                self.advance();
                self.flag(references, SemanticFlags::CASCADE);
            }
            Some(token) if token.kind == TokenKind::Keyword(Keyword::Restrict) => {
                self.advance();
                self.flag(references, SemanticFlags::RESTRICT);
            }
            Some(token) if token.kind == TokenKind::Keyword(Keyword::Set) => {
                self.advance();
                if !self.consume_keyword(Keyword::Null) && !self.consume_keyword(Keyword::Default) {
                    return Err(self.unexpected("NULL or DEFAULT"));
                }
            }
            Some(token) if token.text.eq_ignore_ascii_case("NO") => {
                self.advance();
                match self.current() {
                    Some(action) if action.text.eq_ignore_ascii_case("ACTION") => {
                        self.advance();
                    }
                    _ => return Err(self.unexpected("ACTION")),
                }
            }
            _ => return Err(self.unexpected("referential action")),
        }
        Ok(())
    }

    /// Parses an optional `ON CONFLICT action` onto `constraint`.
    fn parse_on_conflict(&mut self, constraint: NodeId) -> Result<(), ParseError> {
        if !(self.check_keyword(Keyword::On) && self.check_keyword_at(1, Keyword::Conflict)) {
            return Ok(());
        }
        let on = self.expect_keyword(Keyword::On)?;
        self.advance();
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
                let action = self.node(NodeType::ConflictAction, &on)?;
                let text = self.token_text(&token)?;
                self.arena.node_mut(action).primary_text = text;
                self.finish(action);
                self.attach(constraint, action);
                Ok(())
            }
            _ => Err(self.unexpected("ROLLBACK, ABORT, REPLACE, FAIL or IGNORE")),
        }
    }

    /// Parses `name ON table (indexed-column, ...) [WHERE expr]`.
    fn parse_create_index(&mut self, statement: NodeId) -> Result<(), ParseError> {
        let name = self.parse_object_name(NodeType::ObjectName)?;
        self.attach(statement, name);
        self.expect_keyword(Keyword::On)?;
        let table = self.parse_object_name(NodeType::TableRef)?;
        self.attach(statement, table);

        self.expect(TokenKind::LeftParen, "'('")?;
        loop {
            let expr = self.parse_expr(0)?;
            let column = self.node_from(NodeType::IndexedColumn, expr)?;
            self.attach(column, expr);
            if self.consume_keyword(Keyword::Desc) {
                self.flag(column, SemanticFlags::DESCENDING);
            } else if self.consume_keyword(Keyword::Asc) {
                self.flag(column, SemanticFlags::ASCENDING);
            }
            self.finish(column);
            self.attach(statement, column);
            if !self.consume(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RightParen, "')'")?;

        if self.check_keyword(Keyword::Where) {
            let clause = self.parse_where()?;
            self.attach(statement, clause);
        }
        Ok(())
    }

    /// Parses `name [(cols)] AS query`.
    fn parse_create_view(&mut self, statement: NodeId) -> Result<(), ParseError> {
        let name = self.parse_object_name(NodeType::ObjectName)?;
        self.attach(statement, name);
        if self.check(TokenKind::LeftParen) {
            let columns = self.parse_column_list()?;
            self.attach(statement, columns);
        }
        self.expect_keyword(Keyword::As)?;
        let query = self.parse_query()?;
        self.attach(statement, query);
        Ok(())
    }

    /// Parses `name [BEFORE | AFTER | INSTEAD OF] event ON table
    /// [FOR EACH ROW] [WHEN expr] BEGIN stmt; ... END`.
    fn parse_create_trigger(&mut self, statement: NodeId) -> Result<(), ParseError> {
        let name = self.parse_object_name(NodeType::ObjectName)?;
        self.attach(statement, name);

        if self.consume_keyword(Keyword::Before) {
            self.flag(statement, SemanticFlags::BEFORE);
        } else if self.consume_keyword(Keyword::After) {
            self.flag(statement, SemanticFlags::AFTER);
        } else if self.consume_keyword(Keyword::Instead) {
            self.expect_keyword(Keyword::Of)?;
            self.flag(statement, SemanticFlags::INSTEAD_OF);
        }

        let Some(event) = self.current().filter(|t| {
            matches!(
                t.kind,
                TokenKind::Keyword(Keyword::Delete | Keyword::Insert | Keyword::Update)
            )
        }) else {
            return Err(self.unexpected("DELETE, INSERT or UPDATE"));
        };
        self.advance();
        let trigger_event = self.named_node(NodeType::TriggerEvent, &event)?;
        if event.kind == TokenKind::Keyword(Keyword::Update) && self.consume_keyword(Keyword::Of) {
            let columns = self.parse_bare_column_list(&event)?;
            self.attach(trigger_event, columns);
        }
        self.finish(trigger_event);
        self.attach(statement, trigger_event);

        self.expect_keyword(Keyword::On)?;
        let table = self.parse_object_name(NodeType::TableRef)?;
        self.attach(statement, table);

        if self.consume_keyword(Keyword::For) {
            self.expect_keyword(Keyword::Each)?;
            self.expect_keyword(Keyword::Row)?;
            self.flag(statement, SemanticFlags::FOR_EACH_ROW);
        }

        if let Some(when) = self
            .current()
            .filter(|t| t.kind == TokenKind::Keyword(Keyword::When))
        {
            self.advance();
            let clause = self.node(NodeType::WhenClause, &when)?;
            let expr = self.parse_expr(0)?;
            self.attach(clause, expr);
            self.finish(clause);
            self.attach(statement, clause);
        }

        let begin = self.expect_keyword(Keyword::Begin)?;
        let body = self.node(NodeType::TriggerBody, &begin)?;
        while !self.check_keyword(Keyword::End) {
            if self.at_end() {
                return Err(self.unexpected("END"));
            }
            let inner = self.parse_statement()?;
            self.attach(body, inner);
            self.expect(TokenKind::Semicolon, "';'")?;
        }
        self.advance();
        self.finish(body);
        self.attach(statement, body);
        Ok(())
    }

    /// Parses `a, b, c` without parentheses into a `ColumnList`.
    fn parse_bare_column_list(&mut self, at: &Token<'s>) -> Result<NodeId, ParseError> {
        let list = self.node(NodeType::ColumnList, at)?;
        loop {
            let name = self.expect_identifier("column name")?;
            let column = self.named_node(NodeType::Identifier, &name)?;
            self.attach(list, column);
            if !self.consume(TokenKind::Comma) {
                break;
            }
        }
        Ok(self.finish(list))
    }

    /// Parses `DROP {TABLE | INDEX | VIEW | TRIGGER | SCHEMA} [IF EXISTS]
    /// name, ... [CASCADE | RESTRICT]`.
    pub(super) fn parse_drop(&mut self) -> Result<NodeId, ParseError> {
        let token = self.expect_keyword(Keyword::Drop)?;
        let Some(kind) = self.current().filter(|t| {
            matches!(
                t.kind,
                TokenKind::Keyword(
                    Keyword::Table
                        | Keyword::Index
                        | Keyword::View
                        | Keyword::Trigger
                        | Keyword::Schema
                        | Keyword::Database
                )
            )
        }) else {
            return Err(self.unexpected("TABLE, INDEX, VIEW, TRIGGER or SCHEMA"));
        };
        self.advance();

        let drop = self.node(NodeType::DropStmt, &token)?;
        let text = self.token_text(&kind)?;
        self.arena.node_mut(drop).primary_text = text;

        if self.consume_keyword(Keyword::If) {
            self.expect_keyword(Keyword::Exists)?;
            self.flag(drop, SemanticFlags::IF_EXISTS);
        }
        loop {
            let name = self.parse_object_name(NodeType::ObjectName)?;
            self.attach(drop, name);
            if !self.consume(TokenKind::Comma) {
                break;
            }
        }
        if self.consume_keyword(Keyword::Cascade) {
            self.flag(drop, SemanticFlags::CASCADE);
        } else if self.consume_keyword(Keyword::Restrict) {
            self.flag(drop, SemanticFlags::RESTRICT);
        }
        Ok(self.finish(drop))
    }

    /// Parses `ALTER TABLE name {RENAME TO new | RENAME [COLUMN] a TO b |
    /// ADD [COLUMN] def | DROP [COLUMN] name}`.
    pub(super) fn parse_alter(&mut self) -> Result<NodeId, ParseError> {
        let token = self.expect_keyword(Keyword::Alter)?;
        self.expect_keyword(Keyword::Table)?;
        let alter = self.node(NodeType::AlterTableStmt, &token)?;
        let table = self.parse_object_name(NodeType::TableRef)?;
        self.attach(alter, table);

        let Some(action) = self.advance() else {
            return Err(self.unexpected("RENAME, ADD or DROP"));
        };
        let change = match action.kind {
            TokenKind::Keyword(Keyword::Rename) => {
                if self.consume_keyword(Keyword::To) {
                    let name = self.expect_identifier("table name")?;
                    let rename = self.node(NodeType::RenameTable, &action)?;
                    let text = self.token_text(&name)?;
                    self.arena.node_mut(rename).primary_text = text;
                    rename
                } else {
                    self.consume_keyword(Keyword::Column);
                    let from = self.expect_identifier("column name")?;
                    self.expect_keyword(Keyword::To)?;
                    let to = self.expect_identifier("column name")?;
                    let rename = self.node(NodeType::RenameColumn, &action)?;
                    let old = self.named_node(NodeType::Identifier, &from)?;
                    let new = self.named_node(NodeType::Identifier, &to)?;
                    self.attach(rename, old);
                    self.attach(rename, new);
                    rename
                }
            }
            TokenKind::Keyword(Keyword::Add) => {
                self.consume_keyword(Keyword::Column);
                let add = self.node(NodeType::AddColumn, &action)?;
                let column = self.parse_column_def()?;
                self.attach(add, column);
                add
            }
            TokenKind::Keyword(Keyword::Drop) => {
                self.consume_keyword(Keyword::Column);
                let name = self.expect_identifier("column name")?;
                let drop = self.node(NodeType::DropColumn, &action)?;
                let text = self.token_text(&name)?;
                self.arena.node_mut(drop).primary_text = text;
                drop
            }
            _ => return Err(ParseError::unexpected("RENAME, ADD or DROP", &action)),
        };
        self.finish(change);
        self.attach(alter, change);
        Ok(self.finish(alter))
    }

    /// Parses `TRUNCATE [TABLE] name`.
    pub(super) fn parse_truncate(&mut self) -> Result<NodeId, ParseError> {
        let token = self.expect_keyword(Keyword::Truncate)?;
        self.consume_keyword(Keyword::Table);
        let truncate = self.node(NodeType::TruncateStmt, &token)?;
        let table = self.parse_object_name(NodeType::TableRef)?;
        self.attach(truncate, table);
        Ok(self.finish(truncate))
    }
}
