use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::ast::*;
use crate::error::{ErrorKind, ParseError};
use crate::lexer::{Keyword, Lexer, Token};
use crate::options::Options;

mod context;
mod declarations;
mod expressions;
mod modules;
mod patterns;
mod scope;
mod statements;
mod validation;

use context::Context;
use scope::{ScopeFlags, ScopeStack};
use statements::StatementPosition;

pub(crate) type Result<T> = std::result::Result<T, ParseError>;

#[derive(Clone, Copy, Debug)]
struct TokenInfo {
    start: usize,
    end: usize,
    start_pos: Position,
    end_pos: Position,
    newline_before: bool,
    legacy_escape: Option<usize>,
    lone_surrogate: Option<usize>,
}

/// Start of a node under construction.
#[derive(Clone, Copy, Debug)]
struct Marker {
    start: usize,
    pos: Position,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LabelKind {
    Loop,
    Switch,
}

#[derive(Clone, Debug)]
struct Label {
    /// None for the implicit label of an unlabeled loop or switch.
    name: Option<String>,
    kind: Option<LabelKind>,
    statement_start: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PrivateNameKind {
    Getter,
    Setter,
    Other,
}

#[derive(Debug, Default)]
struct PrivateScope {
    declared: FxHashMap<String, (PrivateNameKind, bool)>,
    used: Vec<(String, usize, usize)>,
}

/// Errors an object or array literal defers until it is known whether the
/// literal is an expression or a destructuring pattern.
#[derive(Clone, Copy, Debug, Default)]
struct CoverInfo {
    /// `{a = 1}`: legal only as a pattern.
    shorthand_assign: Option<usize>,
    /// Second `__proto__: v`: legal only as a pattern.
    double_proto: Option<usize>,
}

impl CoverInfo {
    fn first_error_since(&self, start: usize) -> Option<(usize, &'static str)> {
        if let Some(pos) = self.shorthand_assign.filter(|&p| p >= start) {
            return Some((pos, "Shorthand property assignments are valid only in destructuring patterns"));
        }
        if let Some(pos) = self.double_proto.filter(|&p| p >= start) {
            return Some((pos, "Redefinition of __proto__ property"));
        }
        None
    }
}

pub struct Parser<'a> {
    source: &'a str,
    options: Options,
    lexer: Lexer<'a>,
    current: Token,
    info: TokenInfo,
    prev_end: usize,
    prev_end_pos: Position,
    labels: Vec<Label>,
    scopes: ScopeStack,
    private_scopes: Vec<PrivateScope>,
    /// First `yield`/`await` expression seen, for rejecting them in arrow
    /// parameters discovered after the fact.
    yield_pos: Option<usize>,
    await_pos: Option<usize>,
    await_ident_pos: Option<usize>,
    potential_arrow_at: Option<usize>,
    for_await_init: Option<usize>,
    parenthesized: FxHashSet<(usize, usize)>,
    /// Starts of spread elements followed by a comma.
    spread_trailing_comma: FxHashSet<usize>,
    exports: FxHashSet<String>,
    local_exports: Vec<(String, usize, usize)>,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str, options: &Options) -> Result<Self> {
        let mut lexer = Lexer::new(source);
        lexer.set_html_comments(options.web_compat());
        let start = Position { line: 1, column: 0 };
        let mut parser = Self {
            source,
            options: options.clone(),
            lexer,
            current: Token::Eof,
            info: TokenInfo {
                start: 0,
                end: 0,
                start_pos: start,
                end_pos: start,
                newline_before: false,
                legacy_escape: None,
                lone_surrogate: None,
            },
            prev_end: 0,
            prev_end_pos: start,
            labels: Vec::new(),
            scopes: ScopeStack::new(options.source_type == SourceType::Module),
            private_scopes: Vec::new(),
            yield_pos: None,
            await_pos: None,
            await_ident_pos: None,
            potential_arrow_at: None,
            for_await_init: None,
            parenthesized: FxHashSet::default(),
            spread_trailing_comma: FxHashSet::default(),
            exports: FxHashSet::default(),
            local_exports: Vec::new(),
        };
        parser.next()?;
        Ok(parser)
    }

    pub fn parse_program(mut self) -> Result<Program> {
        let ctx = Context::top_level(&self.options);
        debug!(
            source_type = ?self.options.source_type,
            bytes = self.source.len(),
            "parsing program"
        );
        let start = Marker {
            start: 0,
            pos: Position { line: 1, column: 0 },
        };
        self.scopes.enter(ScopeFlags::TOP);
        let mut body = Vec::new();
        let ctx = self.parse_directives(ctx, &mut body)?;
        while !self.is(&Token::Eof) {
            let stmt = if ctx.module() {
                self.parse_module_item(ctx)?
            } else {
                self.parse_statement(ctx, StatementPosition::ListItem)?
            };
            body.push(stmt);
        }
        if ctx.module() {
            self.check_local_exports()?;
        }
        self.scopes.exit();

        let span = Span {
            start: start.start,
            end: self.source.len(),
            loc: self.options.include_locations.then_some(SourceLocation {
                start: start.pos,
                end: self.info.end_pos,
            }),
        };
        debug!(statements = body.len(), strict = ctx.strict(), "parsed program");
        Ok(Program {
            span,
            body,
            source_type: self.options.source_type,
        })
    }

    // -----------------------------------------------------------------------
    // Token cursor
    // -----------------------------------------------------------------------

    fn next(&mut self) -> Result<()> {
        self.prev_end = self.info.end;
        self.prev_end_pos = self.info.end_pos;
        let mut newline = false;
        loop {
            let token = self.lexer.next_token()?;
            if token == Token::LineTerminator {
                newline = true;
                continue;
            }
            self.set_current(token, newline);
            return Ok(());
        }
    }

    fn set_current(&mut self, token: Token, newline_before: bool) {
        let (line, column) = self.lexer.token_start_position();
        let (end_line, end_column) = self.lexer.position();
        self.info = TokenInfo {
            start: self.lexer.token_start(),
            end: self.lexer.offset(),
            start_pos: Position { line, column },
            end_pos: Position {
                line: end_line,
                column: end_column,
            },
            newline_before,
            legacy_escape: self.lexer.legacy_escape(),
            lone_surrogate: self.lexer.lone_surrogate(),
        };
        self.current = token;
    }

    /// The token after the current one, and whether a line break precedes it.
    fn peek(&self) -> Result<(Token, bool)> {
        let mut lexer = self.lexer.clone();
        let mut newline = false;
        loop {
            let token = lexer.next_token()?;
            if token == Token::LineTerminator {
                newline = true;
                continue;
            }
            return Ok((token, newline));
        }
    }

    fn is(&self, token: &Token) -> bool {
        &self.current == token
    }

    fn eat(&mut self, token: &Token) -> Result<bool> {
        if self.is(token) {
            self.next()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn expect(&mut self, token: &Token) -> Result<()> {
        if self.eat(token)? {
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn is_keyword(&self, keyword: Keyword) -> bool {
        self.current == Token::Keyword(keyword)
    }

    fn eat_keyword(&mut self, keyword: Keyword) -> Result<bool> {
        self.eat(&Token::Keyword(keyword))
    }

    fn expect_keyword(&mut self, keyword: Keyword) -> Result<()> {
        self.expect(&Token::Keyword(keyword))
    }

    /// An unescaped contextual word such as `of`, `let` or `async`.
    fn is_contextual(&self, name: &str) -> bool {
        self.current.is_identifier(name)
    }

    fn eat_contextual(&mut self, name: &str) -> Result<bool> {
        if self.is_contextual(name) {
            self.next()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn expect_contextual(&mut self, name: &str) -> Result<()> {
        if self.eat_contextual(name)? {
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn can_insert_semicolon(&self) -> bool {
        self.info.newline_before || matches!(self.current, Token::Eof | Token::RightBrace)
    }

    /// `;`, or an automatically inserted one.
    fn consume_semicolon(&mut self) -> Result<()> {
        if self.eat(&Token::Semicolon)? || self.can_insert_semicolon() {
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    // -----------------------------------------------------------------------
    // Spans
    // -----------------------------------------------------------------------

    fn start(&self) -> Marker {
        Marker {
            start: self.info.start,
            pos: self.info.start_pos,
        }
    }

    fn span_from(&self, marker: Marker) -> Span {
        Span {
            start: marker.start,
            end: self.prev_end,
            loc: self.options.include_locations.then_some(SourceLocation {
                start: marker.pos,
                end: self.prev_end_pos,
            }),
        }
    }

    /// Span covering two existing spans.
    fn join(&self, first: Span, last: Span) -> Span {
        Span {
            start: first.start,
            end: last.end,
            loc: match (first.loc, last.loc) {
                (Some(a), Some(b)) => Some(SourceLocation {
                    start: a.start,
                    end: b.end,
                }),
                _ => None,
            },
        }
    }

    fn current_span(&self) -> Span {
        Span {
            start: self.info.start,
            end: self.info.end,
            loc: self.options.include_locations.then_some(SourceLocation {
                start: self.info.start_pos,
                end: self.info.end_pos,
            }),
        }
    }

    fn raw(&self, start: usize, end: usize) -> String {
        self.source[start..end].to_string()
    }

    fn is_parenthesized(&self, span: Span) -> bool {
        self.parenthesized.contains(&(span.start, span.end))
    }

    // -----------------------------------------------------------------------
    // Errors
    // -----------------------------------------------------------------------

    fn error_at(&self, kind: ErrorKind, message: impl Into<String>, start: usize, end: usize) -> ParseError {
        ParseError::at(kind, message, self.source, start, end)
    }

    fn early(&self, message: impl Into<String>, span: Span) -> ParseError {
        self.error_at(ErrorKind::Early, message, span.start, span.end)
    }

    fn early_at(&self, message: impl Into<String>, pos: usize) -> ParseError {
        self.error_at(ErrorKind::Early, message, pos, pos)
    }

    fn syntax(&self, message: impl Into<String>) -> ParseError {
        self.error_at(ErrorKind::Syntax, message, self.info.start, self.info.end)
    }

    fn syntax_at(&self, message: impl Into<String>, pos: usize) -> ParseError {
        self.error_at(ErrorKind::Syntax, message, pos, pos)
    }

    fn unexpected(&self) -> ParseError {
        let message = match &self.current {
            Token::Eof => "Unexpected end of input".to_string(),
            Token::Identifier(name) | Token::IdentifierWithEscape(name) => {
                format!("Unexpected identifier '{name}'")
            }
            Token::Keyword(kw) => format!("Unexpected keyword '{kw}'"),
            Token::StringLiteral(_) => "Unexpected string".to_string(),
            Token::NumericLiteral(_)
            | Token::LegacyOctalLiteral(_)
            | Token::NonOctalDecimalLiteral(_)
            | Token::BigIntLiteral(_) => "Unexpected number".to_string(),
            Token::NoSubstitutionTemplate(..) | Token::TemplateHead(..) => {
                "Unexpected template string".to_string()
            }
            token => format!("Unexpected token '{token}'"),
        };
        self.syntax(message)
    }

    // -----------------------------------------------------------------------
    // Labels
    // -----------------------------------------------------------------------

    fn push_loop_label(&mut self, kind: LabelKind) {
        self.labels.push(Label {
            name: None,
            kind: Some(kind),
            statement_start: self.info.start,
        });
    }

    fn pop_label(&mut self) {
        self.labels.pop();
    }

    /// Whether `break`/`continue` with an optional label has a target.
    fn has_jump_target(&self, label: Option<&str>, is_break: bool) -> bool {
        self.labels.iter().rev().any(|lab| {
            let name_matches = match label {
                None => true,
                Some(name) => lab.name.as_deref() == Some(name),
            };
            if !name_matches {
                return false;
            }
            match lab.kind {
                Some(LabelKind::Loop) => true,
                Some(LabelKind::Switch) => is_break,
                None => is_break && label.is_some(),
            }
        })
    }

    // -----------------------------------------------------------------------
    // Private names
    // -----------------------------------------------------------------------

    fn declare_private_name(
        &mut self,
        name: &str,
        kind: PrivateNameKind,
        is_static: bool,
        span: Span,
    ) -> Result<()> {
        let Some(scope) = self.private_scopes.last_mut() else {
            return Ok(());
        };
        match scope.declared.get(name).copied() {
            None => {
                scope.declared.insert(name.to_string(), (kind, is_static));
                Ok(())
            }
            Some((prev, prev_static))
                if prev_static == is_static
                    && matches!(
                        (prev, kind),
                        (PrivateNameKind::Getter, PrivateNameKind::Setter)
                            | (PrivateNameKind::Setter, PrivateNameKind::Getter)
                    ) =>
            {
                scope
                    .declared
                    .insert(name.to_string(), (PrivateNameKind::Other, is_static));
                Ok(())
            }
            Some(_) => Err(self.early(format!("Identifier '#{name}' has already been declared"), span)),
        }
    }

    fn use_private_name(&mut self, name: &str, span: Span) -> Result<()> {
        match self.private_scopes.last_mut() {
            Some(scope) => {
                scope.used.push((name.to_string(), span.start, span.end));
                Ok(())
            }
            None => Err(self.early(
                format!("Private field '#{name}' must be declared in an enclosing class"),
                span,
            )),
        }
    }

    fn exit_private_scope(&mut self) -> Result<()> {
        let Some(scope) = self.private_scopes.pop() else {
            return Ok(());
        };
        for (name, start, end) in scope.used {
            if scope.declared.contains_key(&name) {
                continue;
            }
            match self.private_scopes.last_mut() {
                Some(parent) => parent.used.push((name, start, end)),
                None => {
                    return Err(self.error_at(
                        ErrorKind::Early,
                        format!("Private field '#{name}' must be declared in an enclosing class"),
                        start,
                        end,
                    ));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> Program {
        Parser::new(src, &Options::script()).unwrap().parse_program().unwrap()
    }

    fn parse_err(src: &str) -> ParseError {
        match Parser::new(src, &Options::script()).and_then(|p| p.parse_program()) {
            Ok(_) => panic!("expected {src:?} to fail"),
            Err(e) => e,
        }
    }

    #[test]
    fn parse_empty() {
        let prog = parse("");
        assert!(prog.body.is_empty());
        assert_eq!(prog.span.end, 0);
    }

    #[test]
    fn parse_var_declaration() {
        let prog = parse("var x = 42;");
        assert_eq!(prog.body.len(), 1);
        assert!(matches!(&prog.body[0], Statement::Variable(d) if d.kind == VarKind::Var));
    }

    #[test]
    fn program_span_covers_trailing_trivia() {
        let prog = parse("a; // done\n");
        assert_eq!(prog.span.start, 0);
        assert_eq!(prog.span.end, 11);
        assert_eq!(prog.body[0].span().end, 2);
    }

    #[test]
    fn directives_are_marked() {
        let prog = parse("'use strict'; 'other'; x");
        let directives: Vec<_> = prog
            .body
            .iter()
            .map(|s| match s {
                Statement::Expression(e) => e.directive.clone(),
                _ => None,
            })
            .collect();
        assert_eq!(
            directives,
            vec![Some("use strict".to_string()), Some("other".to_string()), None]
        );
    }

    #[test]
    fn parenthesized_string_is_not_a_directive() {
        let prog = parse("('use strict'); with (a) {}");
        assert!(matches!(&prog.body[0], Statement::Expression(e) if e.directive.is_none()));
    }

    #[test]
    fn use_strict_applies_to_later_statements() {
        assert!(parse_err("'use strict'; with (a) {}").is_early());
        assert!(parse_err("'use strict'; 010").is_early());
    }

    #[test]
    fn use_strict_rejects_earlier_octal_directive() {
        let err = parse_err(r"'\07'; 'use strict';");
        assert_eq!(err.kind, ErrorKind::Early);
        assert_eq!(err.start, 1);
    }

    #[test]
    fn locations_are_optional() {
        let prog = parse("x");
        assert!(prog.span.loc.is_none());
        let prog = Parser::new("\n  x", &Options::script().with_locations())
            .unwrap()
            .parse_program()
            .unwrap();
        let loc = prog.body[0].span().loc.unwrap();
        assert_eq!(loc.start, Position { line: 2, column: 2 });
        assert_eq!(loc.end, Position { line: 2, column: 3 });
    }

    #[test]
    fn unexpected_token_messages() {
        assert_eq!(parse_err("a b").message, "Unexpected identifier 'b'");
        assert_eq!(parse_err("(").message, "Unexpected end of input");
        assert_eq!(parse_err("var 1").message, "Unexpected number");
        assert_eq!(parse_err("a b").kind, ErrorKind::Syntax);
    }
}
