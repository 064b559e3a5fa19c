use std::mem;

use tracing::trace;

use super::context::{Context, FunctionFlags};
use super::expressions::starts_property_key;
use super::scope::{BindingKind, ScopeFlags};
use super::statements::StatementPosition;
use super::validation::{has_use_strict_directive, is_simple_parameter_list};
use super::{Marker, Parser, PrivateNameKind, PrivateScope, Result};
use crate::ast::*;
use crate::lexer::{Keyword, Token};

/// Where a `function` keyword appears.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum FunctionForm {
    /// `single_statement`: the body of an `if` or label rather than a list.
    Declaration { single_statement: bool },
    /// `export default function`, where the name is optional.
    DefaultExport,
    Expression,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum ClassForm {
    Declaration,
    DefaultExport,
    Expression,
}

/// Which duplicate-parameter rule applies to a parameter list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ParamRules {
    /// Plain functions: duplicates allowed in sloppy code with a simple list.
    Plain,
    /// Methods and arrows: never duplicates.
    Unique,
}

/// State saved across a function boundary.
struct FunctionState {
    labels: Vec<super::Label>,
    yield_pos: Option<usize>,
    await_pos: Option<usize>,
    await_ident_pos: Option<usize>,
}

impl<'a> Parser<'a> {
    fn enter_function_state(&mut self) -> FunctionState {
        FunctionState {
            labels: mem::take(&mut self.labels),
            yield_pos: self.yield_pos.take(),
            await_pos: self.await_pos.take(),
            await_ident_pos: self.await_ident_pos.take(),
        }
    }

    fn exit_function_state(&mut self, state: FunctionState) {
        self.labels = state.labels;
        self.yield_pos = state.yield_pos;
        self.await_pos = state.await_pos;
        self.await_ident_pos = state.await_ident_pos;
    }

    /// `function` declarations and expressions. `start` is before any
    /// `async`, which the caller has already consumed.
    pub(super) fn parse_function(
        &mut self,
        ctx: Context,
        start: Marker,
        is_async: bool,
        form: FunctionForm,
    ) -> Result<Function> {
        self.expect_keyword(Keyword::Function)?;
        let generator = self.eat(&Token::Star)?;
        if generator && form == (FunctionForm::Declaration { single_statement: true }) {
            return Err(self.syntax("Generators can only be declared at the top level or inside a block"));
        }

        let has_name = matches!(self.current, Token::Identifier(_) | Token::IdentifierWithEscape(_));
        let id = match form {
            FunctionForm::Declaration { .. } => Some(self.parse_binding_identifier(ctx)?),
            FunctionForm::DefaultExport if has_name => Some(self.parse_binding_identifier(ctx)?),
            FunctionForm::Expression if has_name => {
                // The name of a function expression follows the function's own rules.
                let mut own = ctx.without(Context::IN_ASYNC | Context::IN_GENERATOR);
                own.set(Context::IN_ASYNC, is_async);
                own.set(Context::IN_GENERATOR, generator);
                Some(self.parse_binding_identifier(own)?)
            }
            _ => None,
        };
        if form != FunctionForm::Expression {
            if let Some(id) = &id {
                let kind = self.function_binding_kind(ctx, !is_async && !generator);
                self.declare_name(id, kind)?;
            }
        }
        trace!(
            name = id.as_ref().map(|id| id.name.as_str()),
            is_async,
            generator,
            "function"
        );

        let flags = FunctionFlags {
            is_async,
            is_generator: generator,
            super_property: false,
            super_call: false,
        };
        let (params, body) = self.parse_function_rest(ctx, flags, ParamRules::Plain, id.as_ref())?;
        let ty = if form == FunctionForm::Expression {
            FunctionType::FunctionExpression
        } else {
            FunctionType::FunctionDeclaration
        };
        Ok(Function {
            ty,
            span: self.span_from(start),
            id,
            params,
            body,
            generator,
            is_async,
        })
    }

    /// The parameter list and body of an object or class method. `start` is
    /// at the opening parenthesis.
    pub(super) fn parse_method(
        &mut self,
        ctx: Context,
        start: Marker,
        is_async: bool,
        generator: bool,
        kind: MethodKind,
        super_call: bool,
    ) -> Result<Function> {
        let flags = FunctionFlags {
            is_async,
            is_generator: generator,
            super_property: true,
            super_call,
        };
        let (params, body) = self.parse_function_rest(ctx, flags, ParamRules::Unique, None)?;
        match kind {
            MethodKind::Get if !params.is_empty() => {
                return Err(self.early("Getter must not have any formal parameters", params[0].span()));
            }
            MethodKind::Set if params.len() != 1 => {
                return Err(self.early("Setter must have exactly one formal parameter", body.span));
            }
            MethodKind::Set if matches!(params[0], Pattern::Rest(_)) => {
                return Err(self.early("Setter function argument must not be a rest parameter", params[0].span()));
            }
            _ => {}
        }
        Ok(Function {
            ty: FunctionType::FunctionExpression,
            span: self.span_from(start),
            id: None,
            params,
            body,
            generator,
            is_async,
        })
    }

    fn parse_function_rest(
        &mut self,
        ctx: Context,
        flags: FunctionFlags,
        rules: ParamRules,
        name: Option<&Identifier>,
    ) -> Result<(Vec<Pattern>, BlockStatement)> {
        let fn_ctx = ctx.function(flags);
        let state = self.enter_function_state();
        self.scopes.enter(ScopeFlags::FUNCTION);

        let params = self.parse_formal_params(fn_ctx.with(Context::IN_PARAMETERS))?;

        let body_start = self.start();
        self.expect(&Token::LeftBrace)?;
        let mut body = Vec::new();
        let body_ctx = self.parse_directives(fn_ctx, &mut body)?;
        self.check_function_params(&params, body_ctx, &body, rules, body_start)?;
        if body_ctx.strict() && !fn_ctx.strict() {
            if let Some(id) = name {
                self.check_strict_binding(&id.name, id.span)?;
            }
        }
        for param in &params {
            self.declare_pattern(param, BindingKind::Var)?;
        }
        while !self.is(&Token::RightBrace) {
            if self.is(&Token::Eof) {
                return Err(self.unexpected());
            }
            body.push(self.parse_statement(body_ctx, StatementPosition::ListItem)?);
        }
        self.next()?; // }

        self.scopes.exit();
        self.exit_function_state(state);
        Ok((
            params,
            BlockStatement {
                span: self.span_from(body_start),
                body,
            },
        ))
    }

    /// Parameter rules that need the directive prologue: `"use strict"`
    /// beside a non-simple list is an error, and strict binding rules apply.
    fn check_function_params(
        &self,
        params: &[Pattern],
        body: Context,
        prologue: &[Statement],
        rules: ParamRules,
        body_start: Marker,
    ) -> Result<()> {
        let simple = is_simple_parameter_list(params);
        if !simple && has_use_strict_directive(prologue) {
            return Err(self.early_at(
                "Illegal 'use strict' directive in function with non-simple parameter list",
                body_start.start,
            ));
        }
        let allow_duplicates = rules == ParamRules::Plain && simple && !body.strict();
        self.validate_params(params, body.strict(), allow_duplicates)
    }

    fn parse_formal_params(&mut self, ctx: Context) -> Result<Vec<Pattern>> {
        self.expect(&Token::LeftParen)?;
        let mut params = Vec::new();
        while !self.is(&Token::RightParen) {
            if self.is(&Token::Ellipsis) {
                params.push(self.parse_binding_rest(ctx, &Token::RightParen)?);
                break;
            }
            params.push(self.parse_binding_element(ctx)?);
            if !self.is(&Token::RightParen) {
                self.expect(&Token::Comma)?;
            }
        }
        self.expect(&Token::RightParen)?;
        Ok(params)
    }

    /// The `=>` and body of an arrow whose parameters are already parsed.
    pub(super) fn parse_arrow(
        &mut self,
        ctx: Context,
        start: Marker,
        params: Vec<Pattern>,
        is_async: bool,
    ) -> Result<Expression> {
        trace!(start = start.start, is_async, params = params.len(), "arrow function");
        self.expect(&Token::Arrow)?;
        let arrow_ctx = ctx.arrow(is_async);
        let state = self.enter_function_state();
        self.scopes.enter(ScopeFlags::FUNCTION | ScopeFlags::ARROW);

        let (body, expression) = if self.is(&Token::LeftBrace) {
            let body_start = self.start();
            self.next()?;
            let mut stmts = Vec::new();
            let body_ctx = self.parse_directives(arrow_ctx.without(Context::DISALLOW_IN), &mut stmts)?;
            self.check_function_params(&params, body_ctx, &stmts, ParamRules::Unique, body_start)?;
            for param in &params {
                self.declare_pattern(param, BindingKind::Var)?;
            }
            while !self.is(&Token::RightBrace) {
                if self.is(&Token::Eof) {
                    return Err(self.unexpected());
                }
                stmts.push(self.parse_statement(body_ctx, StatementPosition::ListItem)?);
            }
            self.next()?; // }
            let block = BlockStatement {
                span: self.span_from(body_start),
                body: stmts,
            };
            (ArrowBody::Block(block), false)
        } else {
            self.validate_params(&params, arrow_ctx.strict(), false)?;
            for param in &params {
                self.declare_pattern(param, BindingKind::Var)?;
            }
            (ArrowBody::Expression(self.parse_assignment(arrow_ctx, None)?), true)
        };

        self.scopes.exit();
        self.exit_function_state(state);
        Ok(Expression::Arrow(Box::new(ArrowFunctionExpression {
            span: self.span_from(start),
            params,
            body,
            expression,
            generator: false,
            is_async,
        })))
    }

    // -----------------------------------------------------------------------
    // Classes
    // -----------------------------------------------------------------------

    pub(super) fn parse_class(&mut self, ctx: Context, start: Marker, form: ClassForm) -> Result<Class> {
        let ctx = ctx.with(Context::STRICT);
        self.expect_keyword(Keyword::Class)?;
        let id = if matches!(self.current, Token::Identifier(_) | Token::IdentifierWithEscape(_)) {
            Some(self.parse_binding_identifier(ctx)?)
        } else if form == ClassForm::Declaration {
            return Err(self.unexpected());
        } else {
            None
        };
        if form != ClassForm::Expression {
            if let Some(id) = &id {
                self.declare_name(id, BindingKind::Lexical)?;
            }
        }
        trace!(name = id.as_ref().map(|id| id.name.as_str()), "class");

        let super_class = if self.eat_keyword(Keyword::Extends)? {
            Some(self.parse_left_hand_side(ctx, None)?)
        } else {
            None
        };
        let body = self.parse_class_body(ctx, super_class.is_some())?;
        let ty = if form == ClassForm::Expression {
            ClassType::ClassExpression
        } else {
            ClassType::ClassDeclaration
        };
        Ok(Class {
            ty,
            span: self.span_from(start),
            id,
            super_class,
            body,
        })
    }

    fn parse_class_body(&mut self, ctx: Context, derived: bool) -> Result<ClassBody> {
        let start = self.start();
        self.expect(&Token::LeftBrace)?;
        self.private_scopes.push(PrivateScope::default());
        let mut body = Vec::new();
        let mut has_constructor = false;
        while !self.is(&Token::RightBrace) {
            if self.eat(&Token::Semicolon)? {
                continue;
            }
            body.push(self.parse_class_element(ctx, derived, &mut has_constructor)?);
        }
        self.next()?; // }
        self.exit_private_scope()?;
        Ok(ClassBody {
            span: self.span_from(start),
            body,
        })
    }

    fn parse_class_element(
        &mut self,
        ctx: Context,
        derived: bool,
        has_constructor: &mut bool,
    ) -> Result<ClassElement> {
        let start = self.start();
        let mut is_static = false;
        let mut is_async = false;
        let mut generator = false;
        let mut kind = MethodKind::Method;

        if self.is_contextual("static") {
            let (next, _) = self.peek()?;
            if next == Token::LeftBrace {
                self.next()?; // static
                return self.parse_static_block(ctx, start);
            }
            if starts_property_key(&next) || next == Token::Star {
                self.next()?;
                is_static = true;
            }
        }
        if self.is_contextual("async") {
            let (next, newline) = self.peek()?;
            if !newline && (starts_property_key(&next) || next == Token::Star) {
                self.next()?;
                is_async = true;
            }
        }
        if self.eat(&Token::Star)? {
            generator = true;
        }
        if !is_async && !generator && (self.is_contextual("get") || self.is_contextual("set")) {
            let (next, _) = self.peek()?;
            if starts_property_key(&next) {
                kind = if self.is_contextual("get") {
                    MethodKind::Get
                } else {
                    MethodKind::Set
                };
                self.next()?;
            }
        }

        let key_span = self.current_span();
        let (key, computed, private_name) = if let Token::PrivateName(name) = &self.current {
            let name = name.clone();
            self.require_next(ctx, "Private names")?;
            if name == "constructor" {
                return Err(self.early("Classes may not have a private field named '#constructor'", key_span));
            }
            self.next()?;
            let key = Expression::PrivateName(PrivateIdentifier { span: key_span, name: name.clone() });
            (key, false, Some(name))
        } else {
            let (key, computed) = self.parse_property_key(ctx)?;
            (key, computed, None)
        };
        let static_name = if computed {
            None
        } else {
            match &key {
                Expression::Identifier(id) => Some(id.name.clone()),
                Expression::Literal(lit) => lit.string_value().map(str::to_string),
                _ => None,
            }
        };

        let is_method = self.is(&Token::LeftParen) || kind != MethodKind::Method || generator || is_async;
        if is_method {
            let is_constructor = !is_static && private_name.is_none() && static_name.as_deref() == Some("constructor");
            if is_constructor {
                if kind != MethodKind::Method {
                    return Err(self.early("Class constructor may not be an accessor", key.span()));
                }
                if generator {
                    return Err(self.early("Class constructor may not be a generator", key.span()));
                }
                if is_async {
                    return Err(self.early("Class constructor may not be an async method", key.span()));
                }
                if *has_constructor {
                    return Err(self.early("A class may only have one constructor", key.span()));
                }
                *has_constructor = true;
                kind = MethodKind::Constructor;
            }
            if is_static && static_name.as_deref() == Some("prototype") {
                return Err(self.early("Classes may not have a static property named 'prototype'", key.span()));
            }
            if let Some(name) = &private_name {
                let private_kind = match kind {
                    MethodKind::Get => PrivateNameKind::Getter,
                    MethodKind::Set => PrivateNameKind::Setter,
                    _ => PrivateNameKind::Other,
                };
                self.declare_private_name(name, private_kind, is_static, key_span)?;
            }
            let value_start = self.start();
            let value = self.parse_method(ctx, value_start, is_async, generator, kind, is_constructor && derived)?;
            return Ok(ClassElement::Method(MethodDefinition {
                span: self.span_from(start),
                is_static,
                computed,
                key,
                kind,
                value: Box::new(value),
            }));
        }

        self.require_next(ctx, "Class fields")?;
        if static_name.as_deref() == Some("constructor") && private_name.is_none() {
            return Err(self.early("Classes may not have a field named 'constructor'", key.span()));
        }
        if is_static && static_name.as_deref() == Some("prototype") {
            return Err(self.early("Classes may not have a static property named 'prototype'", key.span()));
        }
        if let Some(name) = &private_name {
            self.declare_private_name(name, PrivateNameKind::Other, is_static, key_span)?;
        }
        let value = if self.eat(&Token::Assign)? {
            let state = self.enter_function_state();
            self.scopes.enter(ScopeFlags::FUNCTION);
            let value = self.parse_assignment(ctx.field_initializer(), None)?;
            self.scopes.exit();
            self.exit_function_state(state);
            Some(value)
        } else {
            None
        };
        self.consume_semicolon()?;
        Ok(ClassElement::Property(PropertyDefinition {
            span: self.span_from(start),
            is_static,
            computed,
            key,
            value,
        }))
    }

    /// `static { ... }`, with the current token at `{`.
    fn parse_static_block(&mut self, ctx: Context, start: Marker) -> Result<ClassElement> {
        self.require_next(ctx, "Class static blocks")?;
        self.expect(&Token::LeftBrace)?;
        let block_ctx = ctx.static_block();
        let state = self.enter_function_state();
        self.scopes.enter(ScopeFlags::STATIC_BLOCK);
        let mut body = Vec::new();
        while !self.is(&Token::RightBrace) {
            if self.is(&Token::Eof) {
                return Err(self.unexpected());
            }
            body.push(self.parse_statement(block_ctx, StatementPosition::ListItem)?);
        }
        self.next()?; // }
        self.scopes.exit();
        self.exit_function_state(state);
        Ok(ClassElement::StaticBlock(StaticBlock {
            span: self.span_from(start),
            body,
        }))
    }
}
