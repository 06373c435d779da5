//! Parser state, token helpers and statement dispatch.
//!
//! The grammar productions are spread over sibling modules as further
//! `impl Engine` blocks: queries in `select`, DML in `dml`, schema
//! statements in `ddl`, the rest in `utility`, expressions in `expr`.

use tracing::{trace, warn};

use crate::arena::ArenaError;
use crate::ast::{AstArena, NodeId, NodeType, ParseContext, SemanticFlags, Text};
use crate::lexer::{Keyword, Location, Span, Token, TokenKind, TokenSource};

use super::guard::{ContextStack, DepthGuard, DepthTracker, Overflow};
use super::{ErrorKind, ParseError, ParserConfig};

/// One parse run over a token source.
pub(crate) struct Engine<'p, 's, S: TokenSource<'s>> {
    pub(super) tokens: S,
    pub(super) source: &'s str,
    pub(super) arena: &'p mut AstArena,
    pub(super) config: &'p ParserConfig,
    depth: DepthTracker,
    contexts: ContextStack,
    /// End offset of the last consumed token.
    last_end: usize,
}

impl<'p, 's, S: TokenSource<'s>> Engine<'p, 's, S> {
    pub(crate) fn new(
        tokens: S,
        source: &'s str,
        arena: &'p mut AstArena,
        config: &'p ParserConfig,
    ) -> Self {
        Self {
            tokens,
            source,
            arena,
            config,
            depth: DepthTracker::new(config.depth_limit(), config.stack_budget),
            contexts: ContextStack::default(),
            last_end: 0,
        }
    }

    /// Deepest nesting level entered during this run.
    pub(crate) fn deepest(&self) -> usize {
        self.depth.deepest()
    }

    // ===================================================================
    // Token helpers
    // ===================================================================

    pub(super) fn current(&self) -> Option<Token<'s>> {
        self.tokens.current()
    }

    pub(super) fn current_kind(&self) -> Option<TokenKind> {
        self.tokens.current().map(|t| t.kind)
    }

    pub(super) fn peek_kind(&self, n: usize) -> Option<TokenKind> {
        self.tokens.peek(n).map(|t| t.kind)
    }

    pub(super) fn at_end(&self) -> bool {
        self.tokens.at_end()
    }

    /// Consumes the current token.
    pub(super) fn advance(&mut self) -> Option<Token<'s>> {
        let token = self.tokens.advance()?;
        self.last_end = token.span.end;
        Some(token)
    }

    /// Checks if the current token matches the given kind.
    pub(super) fn check(&self, kind: TokenKind) -> bool {
        self.current_kind() == Some(kind)
    }

    pub(super) fn check_keyword(&self, keyword: Keyword) -> bool {
        self.check(TokenKind::Keyword(keyword))
    }

    pub(super) fn check_keyword_at(&self, n: usize, keyword: Keyword) -> bool {
        self.peek_kind(n) == Some(TokenKind::Keyword(keyword))
    }

    /// Consumes the current token if it matches.
    pub(super) fn consume(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(super) fn consume_keyword(&mut self, keyword: Keyword) -> bool {
        self.consume(TokenKind::Keyword(keyword))
    }

    /// Expects the current token to be of the given kind.
    pub(super) fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token<'s>, ParseError> {
        match self.current() {
            Some(token) if token.kind == kind => {
                self.advance();
                Ok(token)
            }
            _ => Err(self.unexpected(what)),
        }
    }

    /// Expects a specific keyword.
    pub(super) fn expect_keyword(&mut self, keyword: Keyword) -> Result<Token<'s>, ParseError> {
        self.expect(TokenKind::Keyword(keyword), keyword.as_str())
    }

    /// Returns true if the current token is a word that reads as an
    /// identifier: a plain or quoted identifier, or a non-reserved keyword.
    pub(super) fn check_identifier(&self) -> bool {
        self.current().is_some_and(|t| is_identifier_token(&t))
    }

    /// Expects an identifier (see [`check_identifier`](Self::check_identifier)).
    pub(super) fn expect_identifier(&mut self, what: &str) -> Result<Token<'s>, ParseError> {
        match self.current() {
            Some(token) if is_identifier_token(&token) => {
                self.check_quote_style(&token)?;
                self.advance();
                Ok(token)
            }
            _ => Err(self.unexpected(what)),
        }
    }

    /// Expects any word after a dot in a qualified name: reserved keywords
    /// are allowed there.
    pub(super) fn expect_name_part(&mut self, what: &str) -> Result<Token<'s>, ParseError> {
        match self.current() {
            Some(token)
                if is_identifier_token(&token) || matches!(token.kind, TokenKind::Keyword(_)) =>
            {
                self.check_quote_style(&token)?;
                self.advance();
                Ok(token)
            }
            _ => Err(self.unexpected(what)),
        }
    }

    fn check_quote_style(&self, token: &Token<'s>) -> Result<(), ParseError> {
        if self.config.strict_ansi
            && token.kind == TokenKind::QuotedIdentifier
            && !token.text.starts_with('"')
        {
            return Err(ParseError::syntax(
                "Only double-quoted identifiers are allowed in strict ANSI mode",
                token.location(),
                token.span,
            ));
        }
        Ok(())
    }

    // ===================================================================
    // Errors
    // ===================================================================

    /// Location just past the last byte of the source.
    pub(super) fn eof_location(&self) -> Location {
        Location::at_offset(self.source, self.source.len())
    }

    /// Builds an "expected X" error at the current token.
    pub(super) fn unexpected(&self, expected: &str) -> ParseError {
        match self.current() {
            Some(token) => ParseError::unexpected(expected, &token),
            None => ParseError::unexpected_eof(expected, self.eof_location()),
        }
    }

    /// Builds an error at `token`.
    pub(super) fn error_at(token: &Token<'s>, message: impl Into<String>) -> ParseError {
        ParseError::syntax(message, token.location(), token.span)
    }

    /// Enters one recursion level.
    pub(super) fn enter(&self) -> Result<DepthGuard, ParseError> {
        self.depth.enter().map_err(|overflow| {
            let (location, span) = self.current().map_or_else(
                || (self.eof_location(), Span::new(self.source.len(), self.source.len())),
                |t| (t.location(), t.span),
            );
            match overflow {
                Overflow::Depth => {
                    trace!(limit = self.depth.limit(), "recursion limit reached");
                    ParseError::depth_exceeded(self.depth.limit(), location, span)
                }
                Overflow::Stack => {
                    let depth = self.depth.current();
                    trace!(
                        depth,
                        used = self.depth.stack_used(),
                        budget = self.depth.stack_budget(),
                        "stack budget exhausted"
                    );
                    ParseError::stack_exhausted(self.depth.stack_budget(), depth, location, span)
                }
            }
        })
    }

    /// Runs `f` with `context` pushed on the context stack.
    pub(super) fn in_context<T>(
        &mut self,
        context: ParseContext,
        f: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        self.contexts.push(context);
        let result = f(self);
        self.contexts.pop();
        result
    }

    // ===================================================================
    // Node construction
    // ===================================================================

    /// Allocates a node starting at `token`.
    pub(super) fn node(&mut self, node_type: NodeType, token: &Token<'s>) -> Result<NodeId, ParseError> {
        self.node_at(node_type, token.location(), token.span)
    }

    /// Allocates a node at an explicit position.
    pub(super) fn node_at(
        &mut self,
        node_type: NodeType,
        location: Location,
        span: Span,
    ) -> Result<NodeId, ParseError> {
        let id = self.arena.alloc_node(node_type, location, span)?;
        self.arena.node_mut(id).context = self.contexts.top();
        Ok(id)
    }

    /// Allocates a node positioned at an existing node (for operators whose
    /// left operand was parsed first).
    pub(super) fn node_from(&mut self, node_type: NodeType, first: NodeId) -> Result<NodeId, ParseError> {
        let start = self.arena.node(first);
        let (location, span) = (start.location, start.span);
        self.node_at(node_type, location, span)
    }

    /// Allocates a node carrying `token` as its primary text.
    pub(super) fn named_node(
        &mut self,
        node_type: NodeType,
        token: &Token<'s>,
    ) -> Result<NodeId, ParseError> {
        let id = self.node(node_type, token)?;
        let text = self.token_text(token)?;
        self.arena.node_mut(id).primary_text = text;
        Ok(id)
    }

    pub(super) fn attach(&mut self, parent: NodeId, child: NodeId) {
        self.arena.add_child(parent, child);
    }

    /// Makes `child` the first child of `parent`.
    pub(super) fn prepend(&mut self, parent: NodeId, child: NodeId) {
        let existing = self.arena.children(parent);
        for id in &existing {
            self.arena.remove_child(parent, *id);
        }
        self.arena.add_child(parent, child);
        for id in existing {
            self.arena.add_child(parent, id);
        }
    }

    pub(super) fn flag(&mut self, id: NodeId, flags: SemanticFlags) {
        self.arena.node_mut(id).semantic_flags |= flags;
    }

    /// Extends the node's span to the end of the last consumed token.
    pub(super) fn finish(&mut self, id: NodeId) -> NodeId {
        let end = self.last_end;
        let node = self.arena.node_mut(id);
        if end > node.span.end {
            node.span.end = end;
        }
        id
    }

    /// Text of a token as stored in a node: quotes are stripped and doubled
    /// quote characters are unescaped into arena storage.
    pub(super) fn token_text(&mut self, token: &Token<'s>) -> Result<Text, ArenaError> {
        let quote = match token.kind {
            TokenKind::String => '\'',
            TokenKind::QuotedIdentifier => match token.text.chars().next() {
                Some('[') => return Ok(Text::Source(token.span.inner(1))),
                Some(q) => q,
                None => return Ok(Text::None),
            },
            TokenKind::Blob => {
                let hex = token.span.inner(1);
                return Ok(Text::Source(Span::new(hex.start + 1, hex.end)));
            }
            _ => return Ok(Text::Source(token.span)),
        };
        let inner = token.span.inner(1);
        let body = &self.source[inner.start..inner.end];
        // The lexer only lets a quote through when it is doubled.
        if body.contains(quote) {
            let pair: String = [quote, quote].iter().collect();
            let unescaped = body.replace(pair.as_str(), &pair[..quote.len_utf8()]);
            self.arena.alloc_text(&unescaped)
        } else {
            Ok(Text::Source(inner))
        }
    }

    // ===================================================================
    // Statements
    // ===================================================================

    /// Parses exactly one statement followed by optional semicolons.
    pub(crate) fn parse_single(&mut self) -> Result<NodeId, ParseError> {
        while self.consume(TokenKind::Semicolon) {}
        if self.at_end() {
            return Err(ParseError::unexpected_eof("statement", self.eof_location()));
        }
        let root = self.parse_statement()?;
        while self.consume(TokenKind::Semicolon) {}
        if !self.at_end() {
            return Err(self.unexpected("end of statement"));
        }
        Ok(root)
    }

    /// Parses the next statement of a script, or returns `None` when only
    /// semicolons remain.
    pub(crate) fn parse_next(&mut self) -> Result<Option<NodeId>, ParseError> {
        while self.consume(TokenKind::Semicolon) {}
        if self.at_end() {
            return Ok(None);
        }
        let root = self.parse_statement()?;
        if !self.at_end() && !self.consume(TokenKind::Semicolon) {
            return Err(self.unexpected("';' or end of input"));
        }
        Ok(Some(root))
    }

    /// Skips to the start of the next statement after an error.
    ///
    /// At least one token is consumed. Scanning stops after a top-level `;`
    /// or before a statement keyword at parenthesis depth zero.
    pub(crate) fn synchronize(&mut self) {
        let open_contexts = self.contexts.len();
        self.contexts.truncate(0);
        let mut paren_depth = 0usize;
        let mut skipped = 0usize;
        while let Some(token) = self.current() {
            if skipped > 0 && paren_depth == 0 {
                if let TokenKind::Keyword(kw) = token.kind {
                    if kw.starts_statement() {
                        break;
                    }
                }
            }
            self.advance();
            skipped += 1;
            match token.kind {
                TokenKind::LeftParen => paren_depth += 1,
                TokenKind::RightParen => paren_depth = paren_depth.saturating_sub(1),
                TokenKind::Semicolon if paren_depth == 0 => break,
                _ => {}
            }
        }
        warn!(skipped, open_contexts, "skipped tokens after a syntax error");
    }

    /// Dispatches on the leading token of a statement.
    pub(super) fn parse_statement(&mut self) -> Result<NodeId, ParseError> {
        let _guard = self.enter()?;
        let Some(token) = self.current() else {
            return Err(self.unexpected("statement"));
        };
        let TokenKind::Keyword(keyword) = token.kind else {
            return Err(self.unexpected("statement"));
        };
        match keyword {
            Keyword::Select | Keyword::Values => self.parse_query(),
            Keyword::With => self.parse_with_statement(),
            Keyword::Insert | Keyword::Replace => self.parse_insert(),
            Keyword::Update => self.parse_update(),
            Keyword::Delete => self.parse_delete(),
            Keyword::Create => self.parse_create(),
            Keyword::Drop => self.parse_drop(),
            Keyword::Alter => self.parse_alter(),
            Keyword::Truncate => self.parse_truncate(),
            Keyword::Begin | Keyword::Start => self.parse_begin(),
            Keyword::Commit | Keyword::End => self.parse_commit(),
            Keyword::Rollback => self.parse_rollback(),
            Keyword::Savepoint => self.parse_savepoint(),
            Keyword::Release => self.parse_release(),
            Keyword::Explain => self.parse_explain(),
            Keyword::Set => self.parse_set(),
            Keyword::Pragma
            | Keyword::Vacuum
            | Keyword::Attach
            | Keyword::Detach
            | Keyword::Reindex => {
                if !self.config.allow_extensions {
                    return Err(Self::error_at(
                        &token,
                        format!("{} is an extension and extensions are disabled", keyword.as_str()),
                    ));
                }
                match keyword {
                    Keyword::Pragma => self.parse_pragma(),
                    Keyword::Vacuum => self.parse_vacuum(),
                    Keyword::Attach => self.parse_attach(),
                    Keyword::Detach => self.parse_detach(),
                    _ => self.parse_reindex(),
                }
            }
            Keyword::Analyze => self.parse_analyze(),
            _ => Err(self.unexpected("statement")),
        }
    }

    /// `WITH ...` followed by a query or a DML statement.
    fn parse_with_statement(&mut self) -> Result<NodeId, ParseError> {
        let with = self.parse_with()?;
        let statement = match self.current_kind() {
            Some(TokenKind::Keyword(Keyword::Insert | Keyword::Replace)) => self.parse_insert()?,
            Some(TokenKind::Keyword(Keyword::Update)) => self.parse_update()?,
            Some(TokenKind::Keyword(Keyword::Delete)) => self.parse_delete()?,
            _ => return self.parse_query_after_with(with),
        };
        self.prepend(statement, with);
        Ok(statement)
    }
}

/// Returns true for tokens usable as a bare identifier.
pub(super) const fn is_identifier_token(token: &Token<'_>) -> bool {
    match token.kind {
        TokenKind::Identifier | TokenKind::QuotedIdentifier => true,
        TokenKind::Keyword(kw) => !kw.is_reserved(),
        _ => false,
    }
}

/// Returns true if parsing can resume after `err` at the next statement.
pub(crate) const fn is_recoverable(err: &ParseError) -> bool {
    matches!(err.kind, ErrorKind::Syntax | ErrorKind::DepthExceeded)
}
