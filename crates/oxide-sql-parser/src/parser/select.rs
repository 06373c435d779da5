//! SELECT, VALUES, WITH and the clauses they share with DML.

use crate::ast::{NodeId, NodeType, ParseContext, SemanticFlags};
use crate::lexer::{Keyword, Token, TokenKind, TokenSource};

use super::engine::Engine;
use super::ParseError;

impl<'s, S: TokenSource<'s>> Engine<'_, 's, S> {
    /// Parses a query: one or more select cores joined by set operators,
    /// then ORDER BY and LIMIT for the whole query.
    pub(super) fn parse_query(&mut self) -> Result<NodeId, ParseError> {
        let _guard = self.enter()?;
        if self.check_keyword(Keyword::With) {
            let with = self.parse_with()?;
            return self.parse_query_after_with(with);
        }
        self.parse_query_body()
    }

    /// Finishes a query whose WITH clause was already parsed; the clause
    /// becomes the first child of the outermost query node.
    pub(super) fn parse_query_after_with(&mut self, with: NodeId) -> Result<NodeId, ParseError> {
        let query = self.parse_query_body()?;
        self.prepend(query, with);
        Ok(self.finish(query))
    }

    fn parse_query_body(&mut self) -> Result<NodeId, ParseError> {
        let mut left = self.parse_select_core()?;

        while let Some(op) = self.current() {
            let all = match op.kind {
                TokenKind::Keyword(Keyword::Union) => {
                    self.advance();
                    let all = self.consume_keyword(Keyword::All);
                    if !all {
                        self.consume_keyword(Keyword::Distinct);
                    }
                    all
                }
                TokenKind::Keyword(Keyword::Intersect | Keyword::Except) => {
                    self.advance();
                    false
                }
                _ => break,
            };
            let right = self.parse_select_core()?;
            let compound = self.node_from(NodeType::CompoundSelect, left)?;
            let text = self.token_text(&op)?;
            self.arena.node_mut(compound).primary_text = text;
            if all {
                self.flag(compound, SemanticFlags::ALL);
            }
            self.attach(compound, left);
            self.attach(compound, right);
            left = self.finish(compound);
        }

        if self.check_keyword(Keyword::Order) {
            let order_by = self.parse_order_by()?;
            self.attach(left, order_by);
        }
        if self.check_keyword(Keyword::Limit) {
            self.parse_limit(left)?;
        }
        Ok(self.finish(left))
    }

    /// Parses `WITH [RECURSIVE] name [(cols)] AS (query), ...`.
    pub(super) fn parse_with(&mut self) -> Result<NodeId, ParseError> {
        let token = self.expect_keyword(Keyword::With)?;
        let with = self.node(NodeType::WithClause, &token)?;
        if self.consume_keyword(Keyword::Recursive) {
            self.flag(with, SemanticFlags::RECURSIVE);
        }
        loop {
            let name = self.expect_identifier("common table expression name")?;
            let cte = self.named_node(NodeType::CommonTableExpr, &name)?;
            if self.check(TokenKind::LeftParen) {
                let columns = self.parse_column_list()?;
                self.attach(cte, columns);
            }
            self.expect_keyword(Keyword::As)?;
            self.expect(TokenKind::LeftParen, "'('")?;
            let query = self.in_context(ParseContext::Subquery, Self::parse_query)?;
            self.expect(TokenKind::RightParen, "')'")?;
            self.attach(cte, query);
            self.finish(cte);
            self.attach(with, cte);
            if !self.consume(TokenKind::Comma) {
                break;
            }
        }
        Ok(self.finish(with))
    }

    /// Parses `SELECT ...` or `VALUES ...` without set operators.
    fn parse_select_core(&mut self) -> Result<NodeId, ParseError> {
        if self.check_keyword(Keyword::Values) {
            return self.parse_values(NodeType::ValuesStmt);
        }
        let token = self.expect_keyword(Keyword::Select)?;
        let select = self.node(NodeType::SelectStmt, &token)?;

        if self.consume_keyword(Keyword::Distinct) {
            self.flag(select, SemanticFlags::DISTINCT);
        } else if self.consume_keyword(Keyword::All) {
            self.flag(select, SemanticFlags::ALL);
        }

        let list = self.in_context(ParseContext::SelectList, |p| {
            p.parse_result_columns(NodeType::SelectList)
        })?;
        self.attach(select, list);

        if let Some(token) = self.current().filter(|t| t.kind == TokenKind::Keyword(Keyword::From)) {
            self.advance();
            let from = self.node(NodeType::FromClause, &token)?;
            self.in_context(ParseContext::FromClause, |p| {
                loop {
                    let item = p.parse_join_tree()?;
                    p.attach(from, item);
                    if !p.consume(TokenKind::Comma) {
                        break;
                    }
                }
                Ok(())
            })?;
            self.finish(from);
            self.attach(select, from);
        }

        if self.check_keyword(Keyword::Where) {
            let clause = self.parse_where()?;
            self.attach(select, clause);
        }

        if let Some(token) = self.current().filter(|t| t.kind == TokenKind::Keyword(Keyword::Group)) {
            self.advance();
            self.expect_keyword(Keyword::By)?;
            let group_by = self.node(NodeType::GroupByClause, &token)?;
            self.in_context(ParseContext::GroupByClause, |p| {
                loop {
                    let expr = p.parse_expr(0)?;
                    p.attach(group_by, expr);
                    if !p.consume(TokenKind::Comma) {
                        break;
                    }
                }
                Ok(())
            })?;
            self.finish(group_by);
            self.attach(select, group_by);
        }

        if let Some(token) = self.current().filter(|t| t.kind == TokenKind::Keyword(Keyword::Having)) {
            self.advance();
            let having = self.node(NodeType::HavingClause, &token)?;
            let expr = self.in_context(ParseContext::HavingClause, |p| p.parse_expr(0))?;
            self.attach(having, expr);
            self.finish(having);
            self.attach(select, having);
        }

        Ok(self.finish(select))
    }

    /// Parses `VALUES (row), ...` into a node of `node_type` holding
    /// `ValuesRow` children.
    pub(super) fn parse_values(&mut self, node_type: NodeType) -> Result<NodeId, ParseError> {
        let token = self.expect_keyword(Keyword::Values)?;
        let values = self.node(node_type, &token)?;
        loop {
            let open = self.expect(TokenKind::LeftParen, "'('")?;
            let row = self.node(NodeType::ValuesRow, &open)?;
            loop {
                let expr = self.parse_expr(0)?;
                self.attach(row, expr);
                if !self.consume(TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::RightParen, "')'")?;
            self.finish(row);
            self.attach(values, row);
            if !self.consume(TokenKind::Comma) {
                break;
            }
        }
        Ok(self.finish(values))
    }

    /// Parses a comma list of result columns (`expr [AS alias]`, `*`,
    /// `t.*`) into a node of `node_type`.
    pub(super) fn parse_result_columns(&mut self, node_type: NodeType) -> Result<NodeId, ParseError> {
        let Some(first) = self.current() else {
            return Err(self.unexpected("select item"));
        };
        let list = self.node(node_type, &first)?;
        loop {
            let item = self.parse_result_column()?;
            self.attach(list, item);
            if !self.consume(TokenKind::Comma) {
                break;
            }
        }
        Ok(self.finish(list))
    }

    /// Parses `*`, `t.*` or `expr [[AS] alias]`. An aliased expression is
    /// wrapped in a `ResultColumn` so operator nodes keep their operands
    /// as their only children.
    fn parse_result_column(&mut self) -> Result<NodeId, ParseError> {
        if let Some(star) = self.current().filter(|t| t.kind == TokenKind::Star) {
            self.advance();
            return self.node(NodeType::Wildcard, &star);
        }
        if self.at_qualified_wildcard() {
            return self.parse_column_ref(true);
        }

        let expr = self.parse_expr(0)?;
        let Some(name) = self.parse_alias_name()? else {
            return Ok(expr);
        };
        let column = self.node_from(NodeType::ResultColumn, expr)?;
        self.attach(column, expr);
        let alias = self.named_node(NodeType::Alias, &name)?;
        self.attach(column, alias);
        self.flag(column, SemanticFlags::HAS_ALIAS);
        Ok(self.finish(column))
    }

    /// Parses `[AS] alias` and appends an `Alias` child to the table or
    /// derived table `target`.
    pub(super) fn parse_optional_alias(&mut self, target: NodeId) -> Result<(), ParseError> {
        let Some(name) = self.parse_alias_name()? else {
            return Ok(());
        };
        let alias = self.named_node(NodeType::Alias, &name)?;
        self.attach(target, alias);
        self.flag(target, SemanticFlags::HAS_ALIAS);
        self.finish(target);
        Ok(())
    }

    /// Consumes `[AS] name` if present.
    ///
    /// Without `AS` only plain or quoted identifiers count as aliases, so a
    /// following keyword is never swallowed.
    fn parse_alias_name(&mut self) -> Result<Option<Token<'s>>, ParseError> {
        if self.consume_keyword(Keyword::As) {
            return match self.current() {
                Some(token) if token.kind == TokenKind::String => {
                    self.advance();
                    Ok(Some(token))
                }
                _ => self.expect_identifier("alias").map(Some),
            };
        }
        match self.current() {
            Some(token)
                if matches!(token.kind, TokenKind::Identifier | TokenKind::QuotedIdentifier) =>
            {
                self.expect_identifier("alias").map(Some)
            }
            _ => Ok(None),
        }
    }

    /// Parses a FROM item with any joins chained onto it.
    fn parse_join_tree(&mut self) -> Result<NodeId, ParseError> {
        let _guard = self.enter()?;
        let mut left = self.parse_table_primary()?;

        loop {
            let natural = self.consume_keyword(Keyword::Natural);
            let (node_type, outer) = match self.current_kind() {
                Some(TokenKind::Keyword(Keyword::Join)) => (NodeType::InnerJoin, false),
                Some(TokenKind::Keyword(Keyword::Inner)) => {
                    self.advance();
                    (NodeType::InnerJoin, false)
                }
                Some(TokenKind::Keyword(Keyword::Cross)) => {
                    self.advance();
                    (NodeType::CrossJoin, false)
                }
                Some(TokenKind::Keyword(kw @ (Keyword::Left | Keyword::Right | Keyword::Full))) => {
                    self.advance();
                    let outer = self.consume_keyword(Keyword::Outer);
                    let node_type = match kw {
                        Keyword::Left => NodeType::LeftJoin,
                        Keyword::Right => NodeType::RightJoin,
                        _ => NodeType::FullJoin,
                    };
                    (node_type, outer)
                }
                _ if natural => return Err(self.unexpected("JOIN")),
                _ => break,
            };
            self.expect_keyword(Keyword::Join)?;

            let right = self.parse_table_primary()?;
            let join = self.node_from(node_type, left)?;
            if natural {
                self.flag(join, SemanticFlags::NATURAL);
            }
            if outer {
                self.flag(join, SemanticFlags::OUTER);
            }
            self.attach(join, left);
            self.attach(join, right);

            if let Some(token) = self.current().filter(|t| t.kind == TokenKind::Keyword(Keyword::On)) {
                self.advance();
                let on = self.node(NodeType::OnCondition, &token)?;
                let expr = self.in_context(ParseContext::JoinCondition, |p| p.parse_expr(0))?;
                self.attach(on, expr);
                self.finish(on);
                self.attach(join, on);
            } else if let Some(token) =
                self.current().filter(|t| t.kind == TokenKind::Keyword(Keyword::Using))
            {
                self.advance();
                let using = self.node(NodeType::UsingClause, &token)?;
                self.expect(TokenKind::LeftParen, "'('")?;
                loop {
                    let name = self.expect_identifier("column name")?;
                    let column = self.named_node(NodeType::Identifier, &name)?;
                    self.attach(using, column);
                    if !self.consume(TokenKind::Comma) {
                        break;
                    }
                }
                self.expect(TokenKind::RightParen, "')'")?;
                self.finish(using);
                self.attach(join, using);
            }
            left = self.finish(join);
        }
        Ok(left)
    }

    /// Parses a table name, derived table or parenthesized join.
    fn parse_table_primary(&mut self) -> Result<NodeId, ParseError> {
        let Some(token) = self.current() else {
            return Err(self.unexpected("table"));
        };
        if token.kind != TokenKind::LeftParen {
            let table = self.parse_object_name(NodeType::TableRef)?;
            self.parse_optional_alias(table)?;
            return Ok(table);
        }

        self.advance();
        if matches!(
            self.current_kind(),
            Some(TokenKind::Keyword(Keyword::Select | Keyword::With | Keyword::Values))
        ) {
            let derived = self.node(NodeType::DerivedTable, &token)?;
            self.flag(derived, SemanticFlags::IS_SUBQUERY);
            let query = self.in_context(ParseContext::Subquery, Self::parse_query)?;
            self.attach(derived, query);
            self.expect(TokenKind::RightParen, "')'")?;
            self.finish(derived);
            self.parse_optional_alias(derived)?;
            return Ok(derived);
        }

        let inner = self.parse_join_tree()?;
        self.expect(TokenKind::RightParen, "')'")?;
        Ok(inner)
    }

    /// Parses `[catalog.][schema.]name` into a node of `node_type`.
    pub(super) fn parse_object_name(&mut self, node_type: NodeType) -> Result<NodeId, ParseError> {
        let first = self.expect_identifier("name")?;
        let mut parts = vec![first];
        while self.check(TokenKind::Dot) && parts.len() < 3 {
            self.advance();
            parts.push(self.expect_name_part("name")?);
        }
        let id = self.node(node_type, &first)?;
        let mut texts = Vec::with_capacity(parts.len());
        for part in &parts {
            texts.push(self.token_text(part)?);
        }
        let node = self.arena.node_mut(id);
        let mut texts = texts.into_iter().rev();
        if let Some(name) = texts.next() {
            node.primary_text = name;
        }
        if let Some(schema) = texts.next() {
            node.schema_name = schema;
        }
        if let Some(catalog) = texts.next() {
            node.catalog_name = catalog;
        }
        Ok(self.finish(id))
    }

    /// Parses `(name, ...)` into a `ColumnList` of `Identifier` nodes.
    pub(super) fn parse_column_list(&mut self) -> Result<NodeId, ParseError> {
        let open = self.expect(TokenKind::LeftParen, "'('")?;
        let list = self.node(NodeType::ColumnList, &open)?;
        loop {
            let name = self.expect_identifier("column name")?;
            let column = self.named_node(NodeType::Identifier, &name)?;
            if self.consume_keyword(Keyword::Desc) {
                self.flag(column, SemanticFlags::DESCENDING);
            } else if self.consume_keyword(Keyword::Asc) {
                self.flag(column, SemanticFlags::ASCENDING);
            }
            self.attach(list, column);
            if !self.consume(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RightParen, "')'")?;
        Ok(self.finish(list))
    }

    /// Parses `WHERE expr`.
    pub(super) fn parse_where(&mut self) -> Result<NodeId, ParseError> {
        let token = self.expect_keyword(Keyword::Where)?;
        let clause = self.node(NodeType::WhereClause, &token)?;
        let expr = self.in_context(ParseContext::WhereClause, |p| p.parse_expr(0))?;
        self.attach(clause, expr);
        Ok(self.finish(clause))
    }

    /// Parses `ORDER BY expr [ASC|DESC] [NULLS FIRST|LAST], ...`.
    pub(super) fn parse_order_by(&mut self) -> Result<NodeId, ParseError> {
        let token = self.expect_keyword(Keyword::Order)?;
        self.expect_keyword(Keyword::By)?;
        let order_by = self.node(NodeType::OrderByClause, &token)?;
        self.in_context(ParseContext::OrderByClause, |p| {
            loop {
                let expr = p.parse_expr(0)?;
                let item = p.node_from(NodeType::OrderByItem, expr)?;
                p.attach(item, expr);
                if p.consume_keyword(Keyword::Desc) {
                    p.flag(item, SemanticFlags::DESCENDING);
                } else if p.consume_keyword(Keyword::Asc) {
                    p.flag(item, SemanticFlags::ASCENDING);
                }
                if p.consume_keyword(Keyword::Nulls) {
                    if p.consume_keyword(Keyword::First) {
                        p.flag(item, SemanticFlags::NULLS_FIRST);
                    } else {
                        p.expect_keyword(Keyword::Last)?;
                        p.flag(item, SemanticFlags::NULLS_LAST);
                    }
                }
                p.finish(item);
                p.attach(order_by, item);
                if !p.consume(TokenKind::Comma) {
                    break;
                }
            }
            Ok(())
        })?;
        Ok(self.finish(order_by))
    }

    /// Parses `LIMIT n [OFFSET m]` or `LIMIT m, n` and attaches the
    /// clauses to `query`.
    fn parse_limit(&mut self, query: NodeId) -> Result<(), ParseError> {
        let token = self.expect_keyword(Keyword::Limit)?;
        let limit = self.node(NodeType::LimitClause, &token)?;
        let first = self.parse_expr(0)?;

        let offset = if let Some(comma) = self.current().filter(|t| t.kind == TokenKind::Comma) {
            self.advance();
            // `LIMIT offset, count`
            let count = self.parse_expr(0)?;
            self.attach(limit, count);
            let offset = self.node(NodeType::OffsetClause, &comma)?;
            self.attach(offset, first);
            Some(offset)
        } else {
            self.attach(limit, first);
            match self.current().filter(|t| t.kind == TokenKind::Keyword(Keyword::Offset)) {
                Some(token) => {
                    self.advance();
                    let offset = self.node(NodeType::OffsetClause, &token)?;
                    let expr = self.parse_expr(0)?;
                    self.attach(offset, expr);
                    Some(offset)
                }
                None => None,
            }
        };

        self.finish(limit);
        self.attach(query, limit);
        if let Some(offset) = offset {
            self.finish(offset);
            self.attach(query, offset);
        }
        Ok(())
    }
}
