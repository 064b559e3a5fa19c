use super::context::Context;
use super::declarations::{ClassForm, FunctionForm};
use super::scope::{BindingKind, ScopeFlags};
use super::{CoverInfo, Label, LabelKind, Marker, Parser, Result};
use crate::ast::*;
use crate::lexer::{Keyword, Token};

/// Where a statement appears. Declarations are only allowed as list items;
/// Annex B admits plain function declarations as `if` and label bodies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum StatementPosition {
    ListItem,
    If,
    Label,
    Nested,
}

impl<'a> Parser<'a> {
    /// Parses the directive prologue into `body` and returns the context for
    /// the rest of the body, made strict by a `"use strict"` directive.
    pub(super) fn parse_directives(&mut self, mut ctx: Context, body: &mut Vec<Statement>) -> Result<Context> {
        let mut legacy_escape: Option<usize> = None;
        while let Token::StringLiteral(_) = self.current {
            let token = self.info;
            let mut stmt = self.parse_statement(ctx, StatementPosition::ListItem)?;
            let is_directive = match &stmt {
                Statement::Expression(expr) => {
                    expr.span.start == token.start
                        && matches!(&expr.expression, Expression::Literal(lit)
                            if lit.span.start == token.start && lit.span.end == token.end)
                }
                _ => false,
            };
            if !is_directive {
                body.push(stmt);
                break;
            }
            let raw = self.raw(token.start + 1, token.end - 1);
            legacy_escape = legacy_escape.or(token.legacy_escape);
            if raw == "use strict" && !ctx.strict() {
                if let Some(pos) = legacy_escape {
                    return Err(self.early_at("Octal escape sequences are not allowed in strict mode", pos));
                }
                ctx = ctx.with(Context::STRICT);
            }
            if let Statement::Expression(expr) = &mut stmt {
                expr.directive = Some(raw);
            }
            body.push(stmt);
        }
        Ok(ctx)
    }

    pub(super) fn parse_statement(&mut self, ctx: Context, position: StatementPosition) -> Result<Statement> {
        let ctx = ctx.without(Context::DISALLOW_IN | Context::IN_PARAMETERS);
        let start = self.start();
        match &self.current {
            Token::LeftBrace => Ok(Statement::Block(self.parse_block(ctx, true)?)),
            Token::Semicolon => {
                self.next()?;
                Ok(Statement::Empty(EmptyStatement {
                    span: self.span_from(start),
                }))
            }
            Token::Keyword(keyword) => match *keyword {
                Keyword::Var => self.parse_variable_statement(ctx, start, VarKind::Var),
                Keyword::Const => {
                    if position != StatementPosition::ListItem {
                        return Err(self.syntax("Lexical declaration cannot appear in a single-statement context"));
                    }
                    self.parse_variable_statement(ctx, start, VarKind::Const)
                }
                Keyword::Function => self.parse_function_statement(ctx, start, position, false),
                Keyword::Class => {
                    if position != StatementPosition::ListItem {
                        return Err(self.unexpected());
                    }
                    let class = self.parse_class(ctx, start, ClassForm::Declaration)?;
                    Ok(Statement::Class(Box::new(class)))
                }
                Keyword::If => self.parse_if(ctx, start),
                Keyword::For => self.parse_for(ctx, start),
                Keyword::While => self.parse_while(ctx, start),
                Keyword::Do => self.parse_do_while(ctx, start),
                Keyword::Return => self.parse_return(ctx, start),
                Keyword::Break => self.parse_jump(ctx, start, true),
                Keyword::Continue => self.parse_jump(ctx, start, false),
                Keyword::Throw => self.parse_throw(ctx, start),
                Keyword::Try => self.parse_try(ctx, start),
                Keyword::Switch => self.parse_switch(ctx, start),
                Keyword::With => self.parse_with(ctx, start),
                Keyword::Debugger => {
                    self.next()?;
                    self.consume_semicolon()?;
                    Ok(Statement::Debugger(DebuggerStatement {
                        span: self.span_from(start),
                    }))
                }
                Keyword::Import | Keyword::Export => {
                    let is_import_expression = *keyword == Keyword::Import
                        && matches!(self.peek()?.0, Token::LeftParen | Token::Dot);
                    if is_import_expression {
                        return self.parse_expression_statement(ctx, start, position);
                    }
                    let message = if ctx.module() {
                        "'import' and 'export' may only appear at the top level"
                    } else {
                        "Cannot use import or export statements outside a module"
                    };
                    Err(self.syntax(message))
                }
                _ => self.parse_expression_statement(ctx, start, position),
            },
            Token::Identifier(name) if name == "let" => {
                if self.is_let_declaration(position)? {
                    if position != StatementPosition::ListItem {
                        return Err(self.syntax("Lexical declaration cannot appear in a single-statement context"));
                    }
                    return self.parse_variable_statement(ctx, start, VarKind::Let);
                }
                self.parse_expression_statement(ctx, start, position)
            }
            Token::Identifier(name) if name == "async" => {
                let (next, newline) = self.peek()?;
                if next == Token::Keyword(Keyword::Function) && !newline {
                    self.next()?;
                    return self.parse_function_statement(ctx, start, position, true);
                }
                self.parse_expression_statement(ctx, start, position)
            }
            _ => self.parse_expression_statement(ctx, start, position),
        }
    }

    /// `let` starts a declaration here rather than naming a variable.
    fn is_let_declaration(&self, position: StatementPosition) -> Result<bool> {
        if !self.is_contextual("let") {
            return Ok(false);
        }
        let (next, _) = self.peek()?;
        Ok(match next {
            Token::LeftBracket => true,
            _ if position != StatementPosition::ListItem => false,
            Token::LeftBrace
            | Token::Identifier(_)
            | Token::IdentifierWithEscape(_)
            | Token::BooleanLiteral(_)
            | Token::NullLiteral => true,
            Token::Keyword(Keyword::In | Keyword::Instanceof) => false,
            Token::Keyword(_) => true,
            _ => false,
        })
    }

    pub(super) fn parse_block(&mut self, ctx: Context, new_scope: bool) -> Result<BlockStatement> {
        let start = self.start();
        self.expect(&Token::LeftBrace)?;
        if new_scope {
            self.scopes.enter(ScopeFlags::empty());
        }
        let mut body = Vec::new();
        while !self.is(&Token::RightBrace) {
            if self.is(&Token::Eof) {
                return Err(self.unexpected());
            }
            body.push(self.parse_statement(ctx, StatementPosition::ListItem)?);
        }
        self.next()?;
        if new_scope {
            self.scopes.exit();
        }
        Ok(BlockStatement {
            span: self.span_from(start),
            body,
        })
    }

    fn parse_expression_statement(
        &mut self,
        ctx: Context,
        start: Marker,
        position: StatementPosition,
    ) -> Result<Statement> {
        let starts_with_identifier =
            matches!(self.current, Token::Identifier(_) | Token::IdentifierWithEscape(_));
        let first = self.current_span();
        let expression = self.parse_expression(ctx)?;
        match expression {
            Expression::Identifier(label)
                if starts_with_identifier
                    && label.span.start == first.start
                    && label.span.end == first.end
                    && self.is(&Token::Colon) =>
            {
                self.parse_labeled(ctx, start, label, position)
            }
            expression => {
                self.consume_semicolon()?;
                Ok(Statement::Expression(ExpressionStatement {
                    span: self.span_from(start),
                    expression,
                    directive: None,
                }))
            }
        }
    }

    fn parse_labeled(
        &mut self,
        ctx: Context,
        start: Marker,
        label: Identifier,
        position: StatementPosition,
    ) -> Result<Statement> {
        self.next()?; // :
        if self.labels.iter().any(|l| l.name.as_deref() == Some(label.name.as_str())) {
            return Err(self.early(format!("Label '{}' has already been declared", label.name), label.span));
        }
        let kind = match &self.current {
            Token::Keyword(Keyword::For | Keyword::While | Keyword::Do) => Some(LabelKind::Loop),
            Token::Keyword(Keyword::Switch) => Some(LabelKind::Switch),
            _ => None,
        };
        let body_start = self.info.start;
        for existing in self.labels.iter_mut().rev() {
            if existing.statement_start != start.start {
                break;
            }
            existing.statement_start = body_start;
            existing.kind = kind;
        }
        self.labels.push(Label {
            name: Some(label.name.clone()),
            kind,
            statement_start: body_start,
        });
        let body_position = match position {
            StatementPosition::ListItem | StatementPosition::Label => StatementPosition::Label,
            StatementPosition::If | StatementPosition::Nested => StatementPosition::Nested,
        };
        let body = self.parse_statement(ctx, body_position)?;
        self.pop_label();
        Ok(Statement::Labeled(Box::new(LabeledStatement {
            span: self.span_from(start),
            label,
            body,
        })))
    }

    fn parse_variable_statement(&mut self, ctx: Context, start: Marker, kind: VarKind) -> Result<Statement> {
        let mut decl = self.parse_variable_declaration(ctx, kind, false)?;
        self.consume_semicolon()?;
        decl.span = self.span_from(start);
        Ok(Statement::Variable(decl))
    }

    /// `var`/`let`/`const` and its declarators, without the semicolon.
    /// In a for-statement head a missing initializer is checked by the caller.
    pub(super) fn parse_variable_declaration(
        &mut self,
        ctx: Context,
        kind: VarKind,
        in_for_head: bool,
    ) -> Result<VariableDeclaration> {
        let start = self.start();
        self.next()?;
        let binding = if kind == VarKind::Var {
            BindingKind::Var
        } else {
            BindingKind::Lexical
        };
        let mut declarations = Vec::new();
        loop {
            let decl_start = self.start();
            let id = self.parse_binding_target(ctx)?;
            if binding == BindingKind::Lexical {
                self.check_lexical_pattern(&id)?;
            }
            let binding = if binding == BindingKind::Var && in_for_head && self.is_contextual("of") {
                BindingKind::ForOfVar
            } else {
                binding
            };
            self.declare_pattern(&id, binding)?;
            let init = if self.eat(&Token::Assign)? {
                Some(self.parse_assignment(ctx, None)?)
            } else {
                let in_for_in_of =
                    in_for_head && (self.is_keyword(Keyword::In) || self.is_contextual("of"));
                if !in_for_in_of {
                    if kind == VarKind::Const {
                        return Err(self.early("Missing initializer in const declaration", id.span()));
                    }
                    if !matches!(id, Pattern::Identifier(_)) {
                        return Err(self.early("Missing initializer in destructuring declaration", id.span()));
                    }
                }
                None
            };
            declarations.push(VariableDeclarator {
                span: self.span_from(decl_start),
                id,
                init,
            });
            if !self.eat(&Token::Comma)? {
                break;
            }
        }
        Ok(VariableDeclaration {
            span: self.span_from(start),
            declarations,
            kind,
        })
    }

    fn parse_function_statement(
        &mut self,
        ctx: Context,
        start: Marker,
        position: StatementPosition,
        is_async: bool,
    ) -> Result<Statement> {
        let single_statement = position != StatementPosition::ListItem;
        if single_statement {
            let annex_b = matches!(position, StatementPosition::If | StatementPosition::Label)
                && ctx.sloppy_web()
                && !is_async;
            if !annex_b {
                let message = if is_async {
                    "Async functions can only be declared at the top level or inside a block"
                } else if ctx.strict() {
                    "In strict mode code, functions can only be declared at top level or inside a block"
                } else {
                    "Function declarations are not allowed in this statement position"
                };
                return Err(self.syntax(message));
            }
        }
        // `if (x) function f() {}` behaves as if the declaration were in a block.
        let wrap_scope = position == StatementPosition::If;
        if wrap_scope {
            self.scopes.enter(ScopeFlags::empty());
        }
        let function = self.parse_function(ctx, start, is_async, FunctionForm::Declaration { single_statement })?;
        if wrap_scope {
            self.scopes.exit();
        }
        Ok(Statement::Function(Box::new(function)))
    }

    fn parse_paren_expression(&mut self, ctx: Context) -> Result<Expression> {
        self.expect(&Token::LeftParen)?;
        let expr = self.parse_expression(ctx)?;
        self.expect(&Token::RightParen)?;
        Ok(expr)
    }

    fn parse_if(&mut self, ctx: Context, start: Marker) -> Result<Statement> {
        self.next()?;
        let test = self.parse_paren_expression(ctx)?;
        let consequent = self.parse_statement(ctx, StatementPosition::If)?;
        let alternate = if self.eat_keyword(Keyword::Else)? {
            Some(self.parse_statement(ctx, StatementPosition::If)?)
        } else {
            None
        };
        Ok(Statement::If(Box::new(IfStatement {
            span: self.span_from(start),
            test,
            consequent,
            alternate,
        })))
    }

    fn parse_loop_body(&mut self, ctx: Context) -> Result<Statement> {
        self.push_loop_label(LabelKind::Loop);
        let body = self.parse_statement(ctx, StatementPosition::Nested);
        self.pop_label();
        body
    }

    fn parse_while(&mut self, ctx: Context, start: Marker) -> Result<Statement> {
        self.next()?;
        let test = self.parse_paren_expression(ctx)?;
        let body = self.parse_loop_body(ctx)?;
        Ok(Statement::While(Box::new(WhileStatement {
            span: self.span_from(start),
            test,
            body,
        })))
    }

    fn parse_do_while(&mut self, ctx: Context, start: Marker) -> Result<Statement> {
        self.next()?;
        let body = self.parse_loop_body(ctx)?;
        self.expect_keyword(Keyword::While)?;
        let test = self.parse_paren_expression(ctx)?;
        // A semicolon is always inserted after `do ... while (x)`.
        self.eat(&Token::Semicolon)?;
        Ok(Statement::DoWhile(Box::new(DoWhileStatement {
            span: self.span_from(start),
            body,
            test,
        })))
    }

    fn parse_for(&mut self, ctx: Context, start: Marker) -> Result<Statement> {
        self.next()?;
        let is_await = if self.is_contextual("await") && ctx.contains(Context::IN_ASYNC) {
            self.next()?;
            true
        } else {
            false
        };
        self.expect(&Token::LeftParen)?;
        self.scopes.enter(ScopeFlags::empty());
        let head_ctx = ctx.with(Context::DISALLOW_IN);

        if self.is(&Token::Semicolon) {
            if is_await {
                return Err(self.unexpected());
            }
            return self.parse_for_rest(ctx, start, None);
        }

        let starts_with_let = self.is_contextual("let");
        let declaration_kind = match &self.current {
            Token::Keyword(Keyword::Var) => Some(VarKind::Var),
            Token::Keyword(Keyword::Const) => Some(VarKind::Const),
            _ if self.is_let_declaration(StatementPosition::ListItem)? => Some(VarKind::Let),
            _ => None,
        };
        if let Some(kind) = declaration_kind {
            let decl = self.parse_variable_declaration(head_ctx, kind, true)?;
            let is_of = self.is_contextual("of");
            if self.is_keyword(Keyword::In) || is_of {
                if is_await && !is_of {
                    return Err(self.unexpected());
                }
                let loop_name = if is_of { "for-of" } else { "for-in" };
                if decl.declarations.len() != 1 {
                    return Err(self.early(
                        format!("Invalid left-hand side in {loop_name} loop: Must have a single binding"),
                        decl.span,
                    ));
                }
                let declarator = &decl.declarations[0];
                if declarator.init.is_some() {
                    let annex_b = !is_of
                        && kind == VarKind::Var
                        && ctx.sloppy_web()
                        && matches!(declarator.id, Pattern::Identifier(_));
                    if !annex_b {
                        return Err(self.early(
                            format!("{loop_name} loop variable declaration may not have an initializer"),
                            declarator.span,
                        ));
                    }
                }
                return self.parse_for_in_of(ctx, start, ForLeft::Variable(decl), is_of, is_await);
            }
            if is_await {
                return Err(self.unexpected());
            }
            return self.parse_for_rest(ctx, start, Some(ForInit::Variable(decl)));
        }

        let init_start = self.info.start;
        let starts_with_async = self.is_contextual("async");
        if is_await {
            self.for_await_init = Some(init_start);
        }
        let mut cover = CoverInfo::default();
        let init = self.parse_expression_with_cover(head_ctx, &mut cover)?;
        self.for_await_init = None;
        let is_of = self.is_contextual("of");
        if self.is_keyword(Keyword::In) || is_of {
            if is_await && !is_of {
                return Err(self.unexpected());
            }
            if starts_with_let && is_of {
                return Err(self.early("The left-hand side of a for-of loop may not start with 'let'", init.span()));
            }
            let plain_async = matches!(&init, Expression::Identifier(id)
                if id.name == "async" && id.span.start == init_start && !self.is_parenthesized(id.span));
            if is_of && !is_await && starts_with_async && plain_async {
                return Err(self.syntax("The left-hand side of a for-of loop may not be 'async'"));
            }
            let loop_name = if is_of { "for-of" } else { "for-in" };
            let target = self.to_assignment_target(ctx, init, loop_name)?;
            return self.parse_for_in_of(ctx, start, ForLeft::Pattern(target), is_of, is_await);
        }
        if let Some((pos, message)) = cover.first_error_since(0) {
            return Err(self.early_at(message, pos));
        }
        if is_await {
            return Err(self.unexpected());
        }
        self.parse_for_rest(ctx, start, Some(ForInit::Expression(init)))
    }

    fn parse_for_rest(&mut self, ctx: Context, start: Marker, init: Option<ForInit>) -> Result<Statement> {
        self.expect(&Token::Semicolon)?;
        let test = if self.is(&Token::Semicolon) {
            None
        } else {
            Some(self.parse_expression(ctx)?)
        };
        self.expect(&Token::Semicolon)?;
        let update = if self.is(&Token::RightParen) {
            None
        } else {
            Some(self.parse_expression(ctx)?)
        };
        self.expect(&Token::RightParen)?;
        let body = self.parse_loop_body(ctx)?;
        self.scopes.exit();
        Ok(Statement::For(Box::new(ForStatement {
            span: self.span_from(start),
            init,
            test,
            update,
            body,
        })))
    }

    fn parse_for_in_of(
        &mut self,
        ctx: Context,
        start: Marker,
        left: ForLeft,
        is_of: bool,
        is_await: bool,
    ) -> Result<Statement> {
        self.next()?; // in / of
        let right = if is_of {
            self.parse_assignment(ctx, None)?
        } else {
            self.parse_expression(ctx)?
        };
        self.expect(&Token::RightParen)?;
        let body = self.parse_loop_body(ctx)?;
        self.scopes.exit();
        let span = self.span_from(start);
        Ok(if is_of {
            Statement::ForOf(Box::new(ForOfStatement {
                span,
                is_await,
                left,
                right,
                body,
            }))
        } else {
            Statement::ForIn(Box::new(ForInStatement { span, left, right, body }))
        })
    }

    fn parse_return(&mut self, ctx: Context, start: Marker) -> Result<Statement> {
        if !ctx.can_return() {
            return Err(self.syntax("Illegal return statement"));
        }
        self.next()?;
        let argument = if self.eat(&Token::Semicolon)? || self.can_insert_semicolon() {
            None
        } else {
            let argument = self.parse_expression(ctx)?;
            self.consume_semicolon()?;
            Some(argument)
        };
        Ok(Statement::Return(ReturnStatement {
            span: self.span_from(start),
            argument,
        }))
    }

    fn parse_jump(&mut self, ctx: Context, start: Marker, is_break: bool) -> Result<Statement> {
        self.next()?;
        let label = if !self.can_insert_semicolon()
            && matches!(self.current, Token::Identifier(_) | Token::IdentifierWithEscape(_))
        {
            Some(self.parse_identifier_reference(ctx)?)
        } else {
            None
        };
        self.consume_semicolon()?;
        let span = self.span_from(start);
        let label_name = label.as_ref().map(|l| l.name.as_str());
        if !self.has_jump_target(label_name, is_break) {
            let message = match label_name {
                Some(name) if !self.labels.iter().any(|l| l.name.as_deref() == Some(name)) => {
                    format!("Undefined label '{name}'")
                }
                _ if is_break => "Illegal break statement".to_string(),
                _ => "Illegal continue statement".to_string(),
            };
            return Err(self.early(message, span));
        }
        Ok(if is_break {
            Statement::Break(BreakStatement { span, label })
        } else {
            Statement::Continue(ContinueStatement { span, label })
        })
    }

    fn parse_throw(&mut self, ctx: Context, start: Marker) -> Result<Statement> {
        self.next()?;
        if self.info.newline_before {
            return Err(self.syntax("Illegal newline after throw"));
        }
        let argument = self.parse_expression(ctx)?;
        self.consume_semicolon()?;
        Ok(Statement::Throw(ThrowStatement {
            span: self.span_from(start),
            argument,
        }))
    }

    fn parse_try(&mut self, ctx: Context, start: Marker) -> Result<Statement> {
        self.next()?;
        let block = self.parse_block(ctx, true)?;
        let handler = if self.is_keyword(Keyword::Catch) {
            let catch_start = self.start();
            self.next()?;
            let (param, body) = if self.eat(&Token::LeftParen)? {
                let param = self.parse_binding_target(ctx)?;
                let simple = matches!(param, Pattern::Identifier(_));
                // Only the web-compatibility grammar lets `var` redeclare it.
                self.scopes.enter(if simple && ctx.contains(Context::WEB_COMPAT) {
                    ScopeFlags::SIMPLE_CATCH
                } else {
                    ScopeFlags::empty()
                });
                let kind = if simple {
                    BindingKind::SimpleCatch
                } else {
                    BindingKind::Lexical
                };
                self.declare_pattern(&param, kind)?;
                self.expect(&Token::RightParen)?;
                let body = self.parse_block(ctx, false)?;
                self.scopes.exit();
                (Some(param), body)
            } else {
                (None, self.parse_block(ctx, true)?)
            };
            Some(CatchClause {
                span: self.span_from(catch_start),
                param,
                body,
            })
        } else {
            None
        };
        let finalizer = if self.eat_keyword(Keyword::Finally)? {
            Some(self.parse_block(ctx, true)?)
        } else {
            None
        };
        if handler.is_none() && finalizer.is_none() {
            return Err(self.syntax("Missing catch or finally after try"));
        }
        Ok(Statement::Try(Box::new(TryStatement {
            span: self.span_from(start),
            block,
            handler,
            finalizer,
        })))
    }

    fn parse_switch(&mut self, ctx: Context, start: Marker) -> Result<Statement> {
        self.next()?;
        let discriminant = self.parse_paren_expression(ctx)?;
        self.expect(&Token::LeftBrace)?;
        self.scopes.enter(ScopeFlags::empty());
        self.push_loop_label(LabelKind::Switch);
        let mut cases: Vec<SwitchCase> = Vec::new();
        let mut seen_default = false;
        while !self.is(&Token::RightBrace) {
            let case_start = self.start();
            let test = if self.eat_keyword(Keyword::Case)? {
                Some(self.parse_expression(ctx)?)
            } else if self.is_keyword(Keyword::Default) {
                if seen_default {
                    return Err(self.syntax("More than one default clause in switch statement"));
                }
                seen_default = true;
                self.next()?;
                None
            } else {
                return Err(self.unexpected());
            };
            self.expect(&Token::Colon)?;
            let mut consequent = Vec::new();
            while !matches!(
                self.current,
                Token::Keyword(Keyword::Case | Keyword::Default) | Token::RightBrace | Token::Eof
            ) {
                consequent.push(self.parse_statement(ctx, StatementPosition::ListItem)?);
            }
            cases.push(SwitchCase {
                span: self.span_from(case_start),
                test,
                consequent,
            });
        }
        self.next()?;
        self.pop_label();
        self.scopes.exit();
        Ok(Statement::Switch(SwitchStatement {
            span: self.span_from(start),
            discriminant,
            cases,
        }))
    }

    fn parse_with(&mut self, ctx: Context, start: Marker) -> Result<Statement> {
        if ctx.strict() {
            return Err(self.early("Strict mode code may not include a with statement", self.current_span()));
        }
        self.next()?;
        let object = self.parse_paren_expression(ctx)?;
        let body = self.parse_statement(ctx, StatementPosition::Nested)?;
        Ok(Statement::With(Box::new(WithStatement {
            span: self.span_from(start),
            object,
            body,
        })))
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::*;
    use crate::error::{ErrorKind, ParseError};
    use crate::options::Options;
    use crate::parser::Parser;

    fn parse(src: &str) -> Program {
        Parser::new(src, &Options::script()).unwrap().parse_program().unwrap()
    }

    fn parse_with(src: &str, options: &Options) -> Result<Program, ParseError> {
        Parser::new(src, options)?.parse_program()
    }

    fn parse_err(src: &str) -> ParseError {
        parse_with(src, &Options::script()).expect_err(src)
    }

    #[test]
    fn parse_if_statement() {
        let prog = parse("if (true) { x; } else { y; }");
        assert!(matches!(&prog.body[0], Statement::If(s) if s.alternate.is_some()));
    }

    #[test]
    fn parse_for_loop() {
        let prog = parse("for (var i = 0; i < 10; i++) { x; }");
        assert!(matches!(&prog.body[0], Statement::For(f) if matches!(f.init, Some(ForInit::Variable(_)))));
    }

    #[test]
    fn for_in_and_of_heads() {
        let prog = parse("for (a.b in c); for ([x, y] of z); for (let [k, v] of m);");
        assert!(matches!(&prog.body[0], Statement::ForIn(f) if matches!(f.left, ForLeft::Pattern(Pattern::Member(_)))));
        assert!(matches!(&prog.body[1], Statement::ForOf(f) if matches!(f.left, ForLeft::Pattern(Pattern::Array(_)))));
        assert!(matches!(&prog.body[2], Statement::ForOf(f) if matches!(f.left, ForLeft::Variable(_))));
    }

    #[test]
    fn for_head_restrictions() {
        assert!(parse_err("for (let x = 1 of y);").is_early());
        assert!(parse_err("for (let x, y of z);").is_early());
        assert!(parse_err("for (let.x of y);").is_early());
        assert_eq!(parse_err("for (async of x);").kind, ErrorKind::Syntax);
        assert!(parse_err("for (a = 1 in b);").is_early());
        // Annex B initializer.
        parse("for (var i = 0 in {});");
        assert!(parse_with("'use strict'; for (var i = 0 in {});", &Options::script()).is_err());
        parse("for (async of => {};;) break;");
        parse("for (let in x);");
    }

    #[test]
    fn for_await_requires_async_context() {
        assert!(parse_err("for await (x of y);").kind == ErrorKind::Syntax);
        parse("async function f() { for await (x of y); }");
        assert!(parse_with("async function f() { for await (x in y); }", &Options::script()).is_err());
    }

    #[test]
    fn parse_try_catch() {
        let prog = parse("try { x; } catch (e) { y; } finally { z; }");
        assert!(matches!(&prog.body[0], Statement::Try(t) if t.handler.is_some() && t.finalizer.is_some()));
        let prog = parse("try {} catch {}");
        assert!(matches!(&prog.body[0], Statement::Try(t) if t.handler.as_ref().is_some_and(|h| h.param.is_none())));
        assert_eq!(parse_err("try {}").message, "Missing catch or finally after try");
    }

    #[test]
    fn catch_parameter_scoping() {
        parse("try {} catch (e) { var e; }");
        assert!(parse_err("try {} catch (e) { let e; }").is_early());
        assert!(parse_err("try {} catch ([e]) { var e; }").is_early());
        parse("try {} catch (e) { for (var e in {}); }");
        parse("try {} catch (e) { for (var e;;) break; }");
        assert!(parse_err("try {} catch (e) { for (var e of []); }").is_early());
        assert!(parse_err("try {} catch (e) { { for (var e of []); } }").is_early());
    }

    #[test]
    fn catch_parameter_redeclaration_needs_web_compatibility() {
        let strict_web = Options {
            force_strict_mode: true,
            ..Options::script()
        };
        assert!(parse_with("try {} catch (e) { var e; }", &strict_web).is_ok());

        let legacy_off = Options {
            disable_legacy_web_compatibility: true,
            ..Options::script()
        };
        let err = parse_with("try {} catch (e) { var e; }", &legacy_off).unwrap_err();
        assert!(err.is_early());
        assert!(parse_with("try {} catch (e) { var f; }", &legacy_off).is_ok());
        assert!(parse_with("try {} catch (e) { var e; }", &Options::module()).is_err());
    }

    #[test]
    fn labels_and_jumps() {
        parse("a: b: while (1) { continue a; }");
        parse("a: { break a; }");
        parse("switch (x) { case 1: break; default: }");
        assert_eq!(parse_err("a: { continue a; }").kind, ErrorKind::Early);
        assert_eq!(parse_err("break;").message, "Illegal break statement");
        assert_eq!(parse_err("while (1) break b;").message, "Undefined label 'b'");
        assert!(parse_err("a: a: ;").is_early());
        assert!(parse_err("function f() { while (1) { (function () { break; })(); } }").is_early());
    }

    #[test]
    fn asi_restricted_productions() {
        let prog = parse("function f() { return\n1 }");
        let Statement::Function(f) = &prog.body[0] else { panic!() };
        assert!(matches!(&f.body.body[0], Statement::Return(r) if r.argument.is_none()));
        assert_eq!(f.body.body.len(), 2);
        assert!(parse_err("throw\n1").kind == ErrorKind::Syntax);
        parse("do ; while (0) x");
    }

    #[test]
    fn return_outside_function() {
        assert_eq!(parse_err("return 1").message, "Illegal return statement");
        let options = Options {
            treat_top_level_return_as_valid: true,
            ..Options::script()
        };
        assert!(parse_with("return 1", &options).is_ok());
    }

    #[test]
    fn function_declarations_in_statement_position() {
        parse("if (x) function f() {} else function g() {}");
        parse("l: function f() {}");
        let strict = Options {
            force_strict_mode: true,
            ..Options::script()
        };
        assert_eq!(
            parse_with("if (x) function f() {}", &strict).unwrap_err().kind,
            ErrorKind::Syntax
        );
        assert!(parse_err("while (x) function f() {}").kind == ErrorKind::Syntax);
        assert!(parse_err("if (x) function* g() {}").kind == ErrorKind::Syntax);
        assert!(parse_err("if (x) async function g() {}").kind == ErrorKind::Syntax);
        let no_web = Options {
            disable_legacy_web_compatibility: true,
            ..Options::script()
        };
        assert!(parse_with("if (x) function f() {}", &no_web).is_err());
    }

    #[test]
    fn let_as_identifier_and_declaration() {
        let prog = parse("let = 1; let\nx = 2;");
        assert!(matches!(&prog.body[0], Statement::Expression(_)));
        assert!(matches!(&prog.body[1], Statement::Variable(d) if d.kind == VarKind::Let));
        assert!(parse_err("if (x) let [a] = b;").kind == ErrorKind::Syntax);
        assert!(parse_err("let let = 1;").is_early());
        assert!(parse_err("const a;").is_early());
        assert!(parse_err("let [a];").is_early());
    }

    #[test]
    fn redeclarations() {
        assert!(parse_err("let a; var a;").is_early());
        assert!(parse_err("let a; let a;").is_early());
        assert!(parse_err("{ function f() {} let f; }").is_early());
        parse("var a; var a; function a() {}");
        parse("{ function f() {} function f() {} }");
        parse("let a; { let a; }");
    }

    #[test]
    fn with_is_rejected_in_strict_code() {
        parse("with (a) b;");
        assert!(parse_err("'use strict'; with (a) b;").is_early());
    }

    #[test]
    fn switch_allows_one_default() {
        assert_eq!(
            parse_err("switch (x) { default: default: }").message,
            "More than one default clause in switch statement"
        );
        assert!(parse_err("switch (x) { case 1: let a; case 2: let a; }").is_early());
    }
}
