//! Expressions: precedence climbing plus the special-syntax sub-parsers.

use crate::ast::{BinaryOp, DataType, NodeId, NodeType, Operator, ParseContext, SemanticFlags, Text};
use crate::lexer::{Keyword, Span, Token, TokenKind, TokenSource};

use super::engine::{is_identifier_token, Engine};
use super::pratt::{
    infix_binding_power, postfix_binding_power, prefix_binding_power, token_to_binary_op,
    token_to_unary_op, COMPARISON_BP,
};
use super::ParseError;

impl<'s, S: TokenSource<'s>> Engine<'_, 's, S> {
    /// Parses an expression whose operators bind at least as tightly as
    /// `min_bp`.
    pub(super) fn parse_expr(&mut self, min_bp: u8) -> Result<NodeId, ParseError> {
        let _guard = self.enter()?;
        let mut lhs = self.parse_prefix()?;

        while let Some(token) = self.current() {
            if let Some(bp) = postfix_binding_power(token.kind) {
                if bp < min_bp {
                    break;
                }
                lhs = self.parse_postfix(lhs, &token)?;
                continue;
            }

            let Some((l_bp, r_bp)) = infix_binding_power(token.kind, self.peek_kind(1)) else {
                break;
            };
            if l_bp < min_bp {
                break;
            }
            lhs = self.parse_infix(lhs, &token, r_bp)?;
        }

        Ok(lhs)
    }

    /// Parses a prefix operator application or a primary expression.
    fn parse_prefix(&mut self) -> Result<NodeId, ParseError> {
        let Some(token) = self.current() else {
            return Err(self.unexpected("expression"));
        };

        if let Some(bp) = prefix_binding_power(token.kind) {
            self.advance();
            if token.kind == TokenKind::Keyword(Keyword::Not) && self.check_keyword(Keyword::Exists) {
                let exists = self.parse_exists()?;
                self.flag(exists, SemanticFlags::NEGATED);
                return Ok(exists);
            }
            let operand = self.parse_expr(bp)?;
            let unary = self.node(NodeType::UnaryExpr, &token)?;
            self.arena.node_mut(unary).operator = token_to_unary_op(token.kind).map(Operator::Unary);
            self.attach(unary, operand);
            return Ok(self.finish(unary));
        }

        self.parse_primary()
    }

    /// Parses a primary expression.
    fn parse_primary(&mut self) -> Result<NodeId, ParseError> {
        let Some(token) = self.current() else {
            return Err(self.unexpected("expression"));
        };

        let literal = match token.kind {
            TokenKind::Integer => Some(NodeType::IntegerLiteral),
            TokenKind::Float => Some(NodeType::FloatLiteral),
            TokenKind::String => Some(NodeType::StringLiteral),
            TokenKind::Blob => Some(NodeType::BlobLiteral),
            TokenKind::Keyword(Keyword::True | Keyword::False) => Some(NodeType::BooleanLiteral),
            TokenKind::Keyword(Keyword::Null) => Some(NodeType::NullLiteral),
            TokenKind::Parameter => Some(NodeType::Parameter),
            _ => None,
        };
        if let Some(node_type) = literal {
            self.advance();
            let id = self.named_node(node_type, &token)?;
            if node_type == NodeType::BooleanLiteral {
                self.arena.node_mut(id).data_type = Some(DataType::Boolean);
            }
            return Ok(id);
        }

        match token.kind {
            TokenKind::LeftParen => self.parse_parenthesized(),
            TokenKind::Keyword(Keyword::Case) => self.parse_case(),
            TokenKind::Keyword(Keyword::Cast) => self.parse_cast(),
            TokenKind::Keyword(Keyword::Extract) => self.parse_extract(),
            TokenKind::Keyword(Keyword::Exists) => self.parse_exists(),
            TokenKind::Keyword(Keyword::Left | Keyword::Right)
                if self.peek_kind(1) == Some(TokenKind::LeftParen) =>
            {
                self.parse_function_call()
            }
            _ if is_identifier_token(&token) => {
                if self.peek_kind(1) == Some(TokenKind::LeftParen) {
                    if token.kind == TokenKind::Identifier {
                        if token.text.eq_ignore_ascii_case("POSITION") {
                            return self.parse_position();
                        }
                        if token.text.eq_ignore_ascii_case("SUBSTRING") {
                            return self.parse_substring();
                        }
                    }
                    return self.parse_function_call();
                }
                self.parse_column_ref(false)
            }
            _ => Err(self.unexpected("expression")),
        }
    }

    /// Parses `(expr)`, a row value `(a, b)` or a scalar subquery.
    fn parse_parenthesized(&mut self) -> Result<NodeId, ParseError> {
        let _guard = self.enter()?;
        let open = self.expect(TokenKind::LeftParen, "'('")?;

        if matches!(
            self.current_kind(),
            Some(TokenKind::Keyword(Keyword::Select | Keyword::With | Keyword::Values))
        ) {
            let subquery = self.node(NodeType::SubqueryExpr, &open)?;
            self.flag(subquery, SemanticFlags::IS_SUBQUERY);
            let query = self.in_context(ParseContext::Subquery, Self::parse_query)?;
            self.attach(subquery, query);
            self.expect(TokenKind::RightParen, "')'")?;
            return Ok(self.finish(subquery));
        }

        let first = self.parse_expr(0)?;
        if self.check(TokenKind::Comma) {
            let row = self.node(NodeType::RowValue, &open)?;
            self.attach(row, first);
            while self.consume(TokenKind::Comma) {
                let expr = self.parse_expr(0)?;
                self.attach(row, expr);
            }
            self.expect(TokenKind::RightParen, "')'")?;
            return Ok(self.finish(row));
        }
        self.expect(TokenKind::RightParen, "')'")?;

        if self.config.compact_tree {
            self.flag(first, SemanticFlags::PARENTHESIZED);
            return Ok(first);
        }
        let paren = self.node(NodeType::ParenExpr, &open)?;
        self.attach(paren, first);
        Ok(self.finish(paren))
    }

    /// Returns true at `table.*`, `schema.table.*` or
    /// `catalog.schema.table.*`.
    pub(super) fn at_qualified_wildcard(&self) -> bool {
        let mut n = 0;
        while let Some(token) = self.tokens.peek(n) {
            let is_name = is_identifier_token(&token)
                || (n > 0 && matches!(token.kind, TokenKind::Keyword(_)));
            if !is_name || self.peek_kind(n + 1) != Some(TokenKind::Dot) {
                return false;
            }
            if self.peek_kind(n + 2) == Some(TokenKind::Star) {
                return true;
            }
            n += 2;
        }
        false
    }

    /// Parses a column reference `[[[catalog.]schema.]table.]column`, or a
    /// qualified wildcard `table.*` when `allow_wildcard` is set.
    pub(super) fn parse_column_ref(&mut self, allow_wildcard: bool) -> Result<NodeId, ParseError> {
        let first = self.expect_identifier("column name")?;
        let mut parts = vec![first];
        let mut wildcard = false;
        while self.check(TokenKind::Dot) {
            self.advance();
            if self.check(TokenKind::Star) {
                if !allow_wildcard {
                    return Err(self.unexpected("column name"));
                }
                self.advance();
                wildcard = true;
                break;
            }
            if parts.len() == 4 {
                return Err(self.unexpected("end of qualified name"));
            }
            parts.push(self.expect_name_part("column name")?);
        }

        let node_type = if wildcard {
            if parts.len() > 3 {
                return Err(Self::error_at(&first, "Too many qualifiers before '*'"));
            }
            NodeType::QualifiedWildcard
        } else {
            NodeType::ColumnRef
        };
        let mut texts = Vec::with_capacity(parts.len() + 1);
        for part in &parts {
            texts.push(self.token_text(part)?);
        }
        if wildcard {
            // `t.*`: every written part qualifies the star.
            texts.push(Text::None);
        }

        let id = self.node(node_type, &first)?;
        let node = self.arena.node_mut(id);
        let mut texts = texts.into_iter().rev();
        node.primary_text = texts.next().unwrap_or_default();
        node.qualifier = texts.next().unwrap_or_default();
        node.schema_name = texts.next().unwrap_or_default();
        node.catalog_name = texts.next().unwrap_or_default();
        Ok(self.finish(id))
    }

    /// Parses a function call with optional DISTINCT, `*` argument and
    /// OVER window.
    fn parse_function_call(&mut self) -> Result<NodeId, ParseError> {
        let Some(name) = self.advance() else {
            return Err(self.unexpected("function name"));
        };
        let call = self.named_node(NodeType::FunctionCall, &name)?;
        self.expect(TokenKind::LeftParen, "'('")?;

        if self.consume(TokenKind::Star) {
            self.flag(call, SemanticFlags::STAR_ARGS);
        } else if !self.check(TokenKind::RightParen) {
            if self.consume_keyword(Keyword::Distinct) {
                self.flag(call, SemanticFlags::DISTINCT);
            }
            self.in_context(ParseContext::FunctionArg, |p| {
                loop {
                    let arg = p.parse_expr(0)?;
                    p.attach(call, arg);
                    if !p.consume(TokenKind::Comma) {
                        break;
                    }
                }
                Ok(())
            })?;
        }
        self.expect(TokenKind::RightParen, "')'")?;

        if let Some(over) = self.current().filter(|t| t.kind == TokenKind::Keyword(Keyword::Over)) {
            self.advance();
            let window = self.parse_window_spec(&over)?;
            self.attach(call, window);
        }
        Ok(self.finish(call))
    }

    /// Parses the window after OVER: a window name or
    /// `([PARTITION BY exprs] [ORDER BY items])`.
    fn parse_window_spec(&mut self, over: &Token<'s>) -> Result<NodeId, ParseError> {
        if !self.check(TokenKind::LeftParen) {
            let name = self.expect_identifier("window name")?;
            let window = self.node(NodeType::WindowSpec, over)?;
            let text = self.token_text(&name)?;
            self.arena.node_mut(window).primary_text = text;
            return Ok(self.finish(window));
        }

        self.advance();
        let window = self.node(NodeType::WindowSpec, over)?;
        if let Some(token) = self.current().filter(|t| t.kind == TokenKind::Keyword(Keyword::Partition)) {
            self.advance();
            self.expect_keyword(Keyword::By)?;
            let partition = self.node(NodeType::PartitionByClause, &token)?;
            loop {
                let expr = self.parse_expr(0)?;
                self.attach(partition, expr);
                if !self.consume(TokenKind::Comma) {
                    break;
                }
            }
            self.finish(partition);
            self.attach(window, partition);
        }
        if self.check_keyword(Keyword::Order) {
            let order_by = self.parse_order_by()?;
            self.attach(window, order_by);
        }
        self.expect(TokenKind::RightParen, "')'")?;
        Ok(self.finish(window))
    }

    /// Parses `CAST(expr AS type)`.
    fn parse_cast(&mut self) -> Result<NodeId, ParseError> {
        let token = self.expect_keyword(Keyword::Cast)?;
        let cast = self.node(NodeType::CastExpr, &token)?;
        self.expect(TokenKind::LeftParen, "'('")?;
        let expr = self.in_context(ParseContext::FunctionArg, |p| p.parse_expr(0))?;
        self.attach(cast, expr);
        self.expect_keyword(Keyword::As)?;
        let (text, data_type) = self.parse_type_name()?;
        let node = self.arena.node_mut(cast);
        node.primary_text = text;
        node.data_type = Some(data_type);
        self.expect(TokenKind::RightParen, "')'")?;
        Ok(self.finish(cast))
    }

    /// Parses `EXTRACT(unit FROM expr)`.
    fn parse_extract(&mut self) -> Result<NodeId, ParseError> {
        let token = self.expect_keyword(Keyword::Extract)?;
        let extract = self.node(NodeType::ExtractExpr, &token)?;
        self.expect(TokenKind::LeftParen, "'('")?;
        let unit = self.expect_name_part("date/time field")?;
        let text = self.token_text(&unit)?;
        self.arena.node_mut(extract).primary_text = text;
        self.expect_keyword(Keyword::From)?;
        let expr = self.in_context(ParseContext::FunctionArg, |p| p.parse_expr(0))?;
        self.attach(extract, expr);
        self.expect(TokenKind::RightParen, "')'")?;
        Ok(self.finish(extract))
    }

    /// Parses `CASE [operand] WHEN .. THEN .. [ELSE ..] END`.
    fn parse_case(&mut self) -> Result<NodeId, ParseError> {
        let token = self.expect_keyword(Keyword::Case)?;
        let case = self.node(NodeType::CaseExpr, &token)?;
        self.in_context(ParseContext::CaseExpression, |p| {
            if !p.check_keyword(Keyword::When) {
                let operand = p.parse_expr(0)?;
                p.attach(case, operand);
            }

            let mut arms = 0usize;
            while let Some(when) = p.current().filter(|t| t.kind == TokenKind::Keyword(Keyword::When)) {
                p.advance();
                let arm = p.node(NodeType::WhenClause, &when)?;
                let condition = p.parse_expr(0)?;
                p.expect_keyword(Keyword::Then)?;
                let result = p.parse_expr(0)?;
                p.attach(arm, condition);
                p.attach(arm, result);
                p.finish(arm);
                p.attach(case, arm);
                arms += 1;
            }
            if arms == 0 {
                return Err(p.unexpected("WHEN"));
            }

            if let Some(token) = p.current().filter(|t| t.kind == TokenKind::Keyword(Keyword::Else)) {
                p.advance();
                let otherwise = p.node(NodeType::ElseClause, &token)?;
                let result = p.parse_expr(0)?;
                p.attach(otherwise, result);
                p.finish(otherwise);
                p.attach(case, otherwise);
            }
            p.expect_keyword(Keyword::End)?;
            Ok(())
        })?;
        Ok(self.finish(case))
    }

    /// Parses `EXISTS (query)`.
    fn parse_exists(&mut self) -> Result<NodeId, ParseError> {
        let token = self.expect_keyword(Keyword::Exists)?;
        let exists = self.node(NodeType::ExistsExpr, &token)?;
        self.expect(TokenKind::LeftParen, "'('")?;
        let query = self.in_context(ParseContext::Subquery, Self::parse_query)?;
        self.attach(exists, query);
        self.expect(TokenKind::RightParen, "')'")?;
        Ok(self.finish(exists))
    }

    /// Parses `POSITION(needle IN haystack)`.
    fn parse_position(&mut self) -> Result<NodeId, ParseError> {
        let Some(token) = self.advance() else {
            return Err(self.unexpected("POSITION"));
        };
        let position = self.node(NodeType::PositionExpr, &token)?;
        self.expect(TokenKind::LeftParen, "'('")?;
        self.in_context(ParseContext::FunctionArg, |p| {
            // The needle stops before IN.
            let needle = p.parse_expr(COMPARISON_BP)?;
            p.expect_keyword(Keyword::In)?;
            let haystack = p.parse_expr(0)?;
            p.attach(position, needle);
            p.attach(position, haystack);
            Ok(())
        })?;
        self.expect(TokenKind::RightParen, "')'")?;
        Ok(self.finish(position))
    }

    /// Parses `SUBSTRING(s FROM start [FOR len])` or
    /// `SUBSTRING(s, start [, len])`.
    fn parse_substring(&mut self) -> Result<NodeId, ParseError> {
        let Some(token) = self.advance() else {
            return Err(self.unexpected("SUBSTRING"));
        };
        let substring = self.node(NodeType::SubstringExpr, &token)?;
        self.expect(TokenKind::LeftParen, "'('")?;
        self.in_context(ParseContext::FunctionArg, |p| {
            let string = p.parse_expr(0)?;
            p.attach(substring, string);
            let length_follows = if p.consume_keyword(Keyword::From) {
                let start = p.parse_expr(0)?;
                p.attach(substring, start);
                p.consume_keyword(Keyword::For)
            } else {
                p.expect(TokenKind::Comma, "FROM or ','")?;
                let start = p.parse_expr(0)?;
                p.attach(substring, start);
                p.consume(TokenKind::Comma)
            };
            if length_follows {
                let length = p.parse_expr(0)?;
                p.attach(substring, length);
            }
            Ok(())
        })?;
        self.expect(TokenKind::RightParen, "')'")?;
        Ok(self.finish(substring))
    }

    /// Parses an infix operator application; `token` is the operator.
    fn parse_infix(&mut self, lhs: NodeId, token: &Token<'s>, r_bp: u8) -> Result<NodeId, ParseError> {
        self.advance();

        let mut negated = false;
        let mut op = *token;
        if token.kind == TokenKind::Keyword(Keyword::Not) {
            negated = true;
            op = self.advance().ok_or_else(|| self.unexpected("IN, LIKE, GLOB or BETWEEN"))?;
        }

        let node = match op.kind {
            TokenKind::Keyword(Keyword::In) => self.parse_in(lhs)?,
            TokenKind::Keyword(Keyword::Between) => {
                let between = self.node_from(NodeType::BetweenExpr, lhs)?;
                let low = self.parse_expr(r_bp)?;
                self.expect_keyword(Keyword::And)?;
                let high = self.parse_expr(r_bp)?;
                self.attach(between, lhs);
                self.attach(between, low);
                self.attach(between, high);
                between
            }
            TokenKind::Keyword(Keyword::Like | Keyword::Glob) => {
                let like = self.node_from(NodeType::LikeExpr, lhs)?;
                self.arena.node_mut(like).operator = token_to_binary_op(op.kind).map(Operator::Binary);
                let pattern = self.parse_expr(r_bp)?;
                self.attach(like, lhs);
                self.attach(like, pattern);
                if self.consume_keyword(Keyword::Escape) {
                    let escape = self.parse_expr(r_bp)?;
                    self.attach(like, escape);
                }
                like
            }
            TokenKind::Keyword(Keyword::Is) => {
                let is = self.node_from(NodeType::IsExpr, lhs)?;
                self.arena.node_mut(is).operator = Some(Operator::Binary(BinaryOp::Is));
                negated = self.consume_keyword(Keyword::Not);
                let rhs = self.parse_expr(r_bp)?;
                self.attach(is, lhs);
                self.attach(is, rhs);
                is
            }
            kind => {
                self.check_operator_spelling(&op)?;
                let Some(binary) = token_to_binary_op(kind) else {
                    return Err(Self::error_at(&op, "Unknown operator"));
                };
                let rhs = self.parse_expr(r_bp)?;
                let node = self.node_from(NodeType::BinaryExpr, lhs)?;
                self.arena.node_mut(node).operator = Some(Operator::Binary(binary));
                self.attach(node, lhs);
                self.attach(node, rhs);
                node
            }
        };

        if negated {
            self.flag(node, SemanticFlags::NEGATED);
        }
        Ok(self.finish(node))
    }

    /// Parses the list or subquery after `IN`.
    fn parse_in(&mut self, lhs: NodeId) -> Result<NodeId, ParseError> {
        let in_expr = self.node_from(NodeType::InExpr, lhs)?;
        self.attach(in_expr, lhs);
        let open = self.expect(TokenKind::LeftParen, "'('")?;

        if matches!(
            self.current_kind(),
            Some(TokenKind::Keyword(Keyword::Select | Keyword::With | Keyword::Values))
        ) {
            let subquery = self.node(NodeType::SubqueryExpr, &open)?;
            self.flag(subquery, SemanticFlags::IS_SUBQUERY);
            let query = self.in_context(ParseContext::Subquery, Self::parse_query)?;
            self.attach(subquery, query);
            self.expect(TokenKind::RightParen, "')'")?;
            self.finish(subquery);
            self.attach(in_expr, subquery);
            return Ok(in_expr);
        }

        let list = self.node(NodeType::ExprList, &open)?;
        if !self.check(TokenKind::RightParen) {
            loop {
                let expr = self.parse_expr(0)?;
                self.attach(list, expr);
                if !self.consume(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RightParen, "')'")?;
        self.finish(list);
        self.attach(in_expr, list);
        Ok(in_expr)
    }

    /// Parses a postfix operator: `COLLATE name` or `::type`.
    fn parse_postfix(&mut self, lhs: NodeId, token: &Token<'s>) -> Result<NodeId, ParseError> {
        self.advance();
        if token.kind == TokenKind::DoubleColon {
            if self.config.strict_ansi || !self.config.allow_extensions {
                return Err(Self::error_at(
                    token,
                    "'::' casts are not allowed; use CAST(expr AS type)",
                ));
            }
            let cast = self.node_from(NodeType::CastExpr, lhs)?;
            self.attach(cast, lhs);
            let (text, data_type) = self.parse_type_name()?;
            let node = self.arena.node_mut(cast);
            node.primary_text = text;
            node.data_type = Some(data_type);
            return Ok(self.finish(cast));
        }

        let collation = self.expect_name_part("collation name")?;
        let collate = self.node_from(NodeType::CollateExpr, lhs)?;
        let text = self.token_text(&collation)?;
        self.arena.node_mut(collate).primary_text = text;
        self.attach(collate, lhs);
        Ok(self.finish(collate))
    }

    /// Rejects `==` and `!=` in strict ANSI mode.
    fn check_operator_spelling(&self, op: &Token<'s>) -> Result<(), ParseError> {
        if self.config.strict_ansi && (op.text == "==" || op.text == "!=") {
            return Err(Self::error_at(
                op,
                format!("Operator '{}' is not ANSI SQL", op.text),
            ));
        }
        Ok(())
    }

    /// Parses a type name such as `INTEGER`, `VARCHAR(10)`,
    /// `DOUBLE PRECISION` or `DECIMAL(10, 2)`.
    ///
    /// Returns the source text of the whole type and its hint.
    pub(super) fn parse_type_name(&mut self) -> Result<(Text, DataType), ParseError> {
        let Some(first) = self.current().filter(|t| is_type_word(t)) else {
            return Err(self.unexpected("type name"));
        };
        let mut words = String::new();
        let mut end = first.span.end;
        while let Some(word) = self.current().filter(|t| is_type_word(t)) {
            self.advance();
            if !words.is_empty() {
                words.push(' ');
            }
            words.push_str(word.text);
            end = word.span.end;
        }

        let mut params = [None, None];
        if self.consume(TokenKind::LeftParen) {
            for (i, slot) in params.iter_mut().enumerate() {
                if i > 0 && !self.consume(TokenKind::Comma) {
                    break;
                }
                *slot = self.parse_type_param()?;
            }
            end = self.expect(TokenKind::RightParen, "')'")?.span.end;
        }

        let data_type = DataType::from_name(&words, params[0], params[1]);
        Ok((Text::Source(Span::new(first.span.start, end)), data_type))
    }

    /// Parses one signed numeric type parameter; only non-negative integers
    /// produce a value.
    fn parse_type_param(&mut self) -> Result<Option<u32>, ParseError> {
        let negative = self.consume(TokenKind::Minus);
        if !negative {
            self.consume(TokenKind::Plus);
        }
        match self.current() {
            Some(token) if matches!(token.kind, TokenKind::Integer | TokenKind::Float) => {
                self.advance();
                if negative {
                    return Ok(None);
                }
                Ok(token.text.parse().ok())
            }
            _ => Err(self.unexpected("number")),
        }
    }
}

/// Words that can be part of a type name.
pub(super) const fn is_type_word(token: &Token<'_>) -> bool {
    match token.kind {
        TokenKind::Identifier => true,
        TokenKind::Keyword(Keyword::Autoincrement) => false,
        TokenKind::Keyword(kw) => !kw.is_reserved(),
        _ => false,
    }
}
