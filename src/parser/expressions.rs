use tracing::trace;

use super::context::Context;
use super::declarations::{ClassForm, FunctionForm};
use super::{CoverInfo, Marker, Parser, Result};
use crate::ast::*;
use crate::error::ErrorKind;
use crate::lexer::{Keyword, Token};

/// Short-circuit state of one link in a member/call chain. A `?.` arms the
/// link it introduces; every later link inherits it. It never resets inside
/// a chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ShortCircuit {
    None,
    Armed,
    Inherited,
}

impl ShortCircuit {
    fn link(self, optional: bool) -> ShortCircuit {
        match (optional, self) {
            (true, _) => ShortCircuit::Armed,
            (false, ShortCircuit::None) => ShortCircuit::None,
            (false, _) => ShortCircuit::Inherited,
        }
    }

    fn in_chain(self) -> bool {
        self != ShortCircuit::None
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BinaryOperator {
    Binary(BinaryOp),
    Logical(LogicalOp),
}

fn assignment_operator(token: &Token) -> Option<AssignOp> {
    Some(match token {
        Token::Assign => AssignOp::Assign,
        Token::PlusAssign => AssignOp::AddAssign,
        Token::MinusAssign => AssignOp::SubAssign,
        Token::StarAssign => AssignOp::MulAssign,
        Token::SlashAssign => AssignOp::DivAssign,
        Token::PercentAssign => AssignOp::ModAssign,
        Token::ExponentAssign => AssignOp::ExpAssign,
        Token::LeftShiftAssign => AssignOp::LShiftAssign,
        Token::RightShiftAssign => AssignOp::RShiftAssign,
        Token::UnsignedRightShiftAssign => AssignOp::URShiftAssign,
        Token::AmpersandAssign => AssignOp::BitAndAssign,
        Token::PipeAssign => AssignOp::BitOrAssign,
        Token::CaretAssign => AssignOp::BitXorAssign,
        Token::LogicalAndAssign => AssignOp::LogicalAndAssign,
        Token::LogicalOrAssign => AssignOp::LogicalOrAssign,
        Token::NullishAssign => AssignOp::NullishAssign,
        _ => return None,
    })
}

/// Whether `token` can begin an AssignmentExpression.
fn starts_expression(token: &Token) -> bool {
    match token {
        Token::Identifier(_)
        | Token::IdentifierWithEscape(_)
        | Token::PrivateName(_)
        | Token::NumericLiteral(_)
        | Token::LegacyOctalLiteral(_)
        | Token::NonOctalDecimalLiteral(_)
        | Token::BigIntLiteral(_)
        | Token::StringLiteral(_)
        | Token::BooleanLiteral(_)
        | Token::NullLiteral
        | Token::NoSubstitutionTemplate(..)
        | Token::TemplateHead(..)
        | Token::LeftParen
        | Token::LeftBracket
        | Token::LeftBrace
        | Token::Plus
        | Token::Minus
        | Token::Bang
        | Token::Tilde
        | Token::Increment
        | Token::Decrement
        | Token::Slash
        | Token::SlashAssign => true,
        Token::Keyword(kw) => matches!(
            kw,
            Keyword::This
                | Keyword::Function
                | Keyword::Class
                | Keyword::New
                | Keyword::Super
                | Keyword::Typeof
                | Keyword::Void
                | Keyword::Delete
                | Keyword::Import
        ),
        _ => false,
    }
}

/// Tokens after which `get`, `set`, `async` or `static` is a modifier rather
/// than the property name itself.
pub(super) fn starts_property_key(token: &Token) -> bool {
    matches!(
        token,
        Token::Identifier(_)
            | Token::IdentifierWithEscape(_)
            | Token::Keyword(_)
            | Token::BooleanLiteral(_)
            | Token::NullLiteral
            | Token::StringLiteral(_)
            | Token::NumericLiteral(_)
            | Token::LegacyOctalLiteral(_)
            | Token::NonOctalDecimalLiteral(_)
            | Token::BigIntLiteral(_)
            | Token::LeftBracket
            | Token::PrivateName(_)
    )
}

fn is_private_member(expr: &Expression) -> bool {
    match expr {
        Expression::Member(member) => matches!(member.property, Expression::PrivateName(_)),
        Expression::Chain(chain) => is_private_member(&chain.expression),
        _ => false,
    }
}

impl<'a> Parser<'a> {
    pub(super) fn parse_expression(&mut self, ctx: Context) -> Result<Expression> {
        let mut cover = CoverInfo::default();
        let expr = self.parse_expression_with_cover(ctx, &mut cover)?;
        if let Some((pos, message)) = cover.first_error_since(0) {
            return Err(self.early_at(message, pos));
        }
        Ok(expr)
    }

    /// Expression with cover errors left in `cover` for the caller.
    pub(super) fn parse_expression_with_cover(&mut self, ctx: Context, cover: &mut CoverInfo) -> Result<Expression> {
        let start = self.start();
        let first = self.parse_assignment(ctx, Some(&mut *cover))?;
        if !self.is(&Token::Comma) {
            return Ok(first);
        }
        let mut expressions = vec![first];
        while self.eat(&Token::Comma)? {
            expressions.push(self.parse_assignment(ctx, Some(&mut *cover))?);
        }
        Ok(Expression::Sequence(SequenceExpression {
            span: self.span_from(start),
            expressions,
        }))
    }

    /// AssignmentExpression. With `cover` set, deferred object-literal errors
    /// are recorded there instead of raised.
    pub(super) fn parse_assignment(&mut self, ctx: Context, cover: Option<&mut CoverInfo>) -> Result<Expression> {
        if self.is_contextual("yield") && ctx.contains(Context::IN_GENERATOR) {
            if ctx.contains(Context::IN_PARAMETERS) {
                return Err(self.early("Yield expression not allowed in formal parameter", self.current_span()));
            }
            return self.parse_yield(ctx);
        }

        let mut own = CoverInfo::default();
        let owns_cover = cover.is_none();
        let cover = cover.unwrap_or(&mut own);

        let start = self.start();
        if matches!(
            self.current,
            Token::LeftParen | Token::Identifier(_) | Token::IdentifierWithEscape(_)
        ) {
            self.potential_arrow_at = Some(start.start);
        }
        let left = self.parse_conditional(ctx, Some(&mut *cover))?;

        let Some(operator) = assignment_operator(&self.current) else {
            if owns_cover {
                if let Some((pos, message)) = cover.first_error_since(0) {
                    return Err(self.early_at(message, pos));
                }
            }
            return Ok(left);
        };
        let target = if operator == AssignOp::Assign {
            let pattern = self.to_assignment_pattern(ctx, left)?;
            if cover.shorthand_assign.is_some_and(|p| p >= start.start) {
                cover.shorthand_assign = None;
            }
            if cover.double_proto.is_some_and(|p| p >= start.start) {
                cover.double_proto = None;
            }
            if !matches!(pattern, Pattern::Identifier(_) | Pattern::Member(_)) {
                trace!(start = start.start, "object or array literal reinterpreted as pattern");
            }
            pattern
        } else {
            self.simple_assignment_target(ctx, left)?
        };
        if owns_cover {
            if let Some((pos, message)) = cover.first_error_since(0) {
                return Err(self.early_at(message, pos));
            }
        }
        self.next()?;
        let right = self.parse_assignment(ctx, None)?;
        Ok(Expression::Assign(Box::new(AssignmentExpression {
            span: self.span_from(start),
            operator,
            left: target,
            right,
        })))
    }

    /// Identifier or member target of a compound assignment.
    fn simple_assignment_target(&mut self, ctx: Context, expr: Expression) -> Result<Pattern> {
        self.check_simple_target(ctx, &expr, "Invalid left-hand side in assignment")?;
        match expr {
            Expression::Identifier(id) => Ok(Pattern::Identifier(id)),
            Expression::Member(member) => Ok(Pattern::Member(member)),
            other => Err(self.early("Invalid left-hand side in assignment", other.span())),
        }
    }

    fn check_simple_target(&self, ctx: Context, expr: &Expression, message: &str) -> Result<()> {
        match expr {
            Expression::Identifier(id) => {
                if ctx.strict() && (id.name == "eval" || id.name == "arguments") {
                    return Err(self.early(format!("Assigning to '{}' in strict mode", id.name), id.span));
                }
                Ok(())
            }
            Expression::Member(_) => Ok(()),
            other => Err(self.early(message, other.span())),
        }
    }

    fn parse_yield(&mut self, ctx: Context) -> Result<Expression> {
        let start = self.start();
        self.yield_pos.get_or_insert(start.start);
        self.next()?;
        let (delegate, argument) = if self.info.newline_before {
            (false, None)
        } else if self.eat(&Token::Star)? {
            (true, Some(self.parse_assignment(ctx, None)?))
        } else if starts_expression(&self.current) {
            (false, Some(self.parse_assignment(ctx, None)?))
        } else {
            (false, None)
        };
        Ok(Expression::Yield(Box::new(YieldExpression {
            span: self.span_from(start),
            delegate,
            argument,
        })))
    }

    /// An arrow function that was not itself parenthesized.
    fn is_bare_arrow(&self, expr: &Expression, start: Marker) -> bool {
        matches!(expr, Expression::Arrow(arrow) if arrow.span.start == start.start)
    }

    fn reject_pending_cover(&self, cover: Option<&CoverInfo>, start: Marker) -> Result<()> {
        if let Some(cover) = cover {
            if let Some((pos, message)) = cover.first_error_since(start.start) {
                return Err(self.early_at(message, pos));
            }
        }
        Ok(())
    }

    fn parse_conditional(&mut self, ctx: Context, mut cover: Option<&mut CoverInfo>) -> Result<Expression> {
        let start = self.start();
        let test = self.parse_binary_expression(ctx, cover.as_deref_mut())?;
        if !self.is(&Token::Question) || self.is_bare_arrow(&test, start) {
            return Ok(test);
        }
        self.reject_pending_cover(cover.as_deref(), start)?;
        self.next()?;
        let consequent = self.parse_assignment(ctx.without(Context::DISALLOW_IN), None)?;
        self.expect(&Token::Colon)?;
        let alternate = self.parse_assignment(ctx, None)?;
        Ok(Expression::Conditional(Box::new(ConditionalExpression {
            span: self.span_from(start),
            test,
            consequent,
            alternate,
        })))
    }

    fn binary_operator(&self, ctx: Context) -> Option<(BinaryOperator, u8)> {
        use BinaryOperator::{Binary, Logical};
        Some(match self.current {
            Token::NullishCoalescing => (Logical(LogicalOp::NullishCoalescing), 1),
            Token::LogicalOr => (Logical(LogicalOp::Or), 1),
            Token::LogicalAnd => (Logical(LogicalOp::And), 2),
            Token::Pipe => (Binary(BinaryOp::BitOr), 3),
            Token::Caret => (Binary(BinaryOp::BitXor), 4),
            Token::Ampersand => (Binary(BinaryOp::BitAnd), 5),
            Token::Equal => (Binary(BinaryOp::Eq), 6),
            Token::NotEqual => (Binary(BinaryOp::NotEq), 6),
            Token::StrictEqual => (Binary(BinaryOp::StrictEq), 6),
            Token::StrictNotEqual => (Binary(BinaryOp::StrictNotEq), 6),
            Token::LessThan => (Binary(BinaryOp::Lt), 7),
            Token::GreaterThan => (Binary(BinaryOp::Gt), 7),
            Token::LessThanEqual => (Binary(BinaryOp::LtEq), 7),
            Token::GreaterThanEqual => (Binary(BinaryOp::GtEq), 7),
            Token::Keyword(Keyword::Instanceof) => (Binary(BinaryOp::Instanceof), 7),
            Token::Keyword(Keyword::In) if !ctx.contains(Context::DISALLOW_IN) => (Binary(BinaryOp::In), 7),
            Token::LeftShift => (Binary(BinaryOp::LShift), 8),
            Token::RightShift => (Binary(BinaryOp::RShift), 8),
            Token::UnsignedRightShift => (Binary(BinaryOp::URShift), 8),
            Token::Plus => (Binary(BinaryOp::Add), 9),
            Token::Minus => (Binary(BinaryOp::Sub), 9),
            Token::Star => (Binary(BinaryOp::Mul), 10),
            Token::Slash => (Binary(BinaryOp::Div), 10),
            Token::Percent => (Binary(BinaryOp::Mod), 10),
            _ => return None,
        })
    }

    fn parse_binary_expression(&mut self, ctx: Context, mut cover: Option<&mut CoverInfo>) -> Result<Expression> {
        let start = self.start();
        let left = if matches!(self.current, Token::PrivateName(_)) {
            self.parse_private_in_operand(ctx)?
        } else {
            self.parse_unary(ctx, cover.as_deref_mut())?
        };
        if self.is_bare_arrow(&left, start) {
            return Ok(left);
        }
        if self.binary_operator(ctx).is_some() {
            self.reject_pending_cover(cover.as_deref(), start)?;
        }
        self.parse_binary(ctx, start, left, 0)
    }

    /// Precedence climbing over the operators stronger than `min_precedence`.
    fn parse_binary(
        &mut self,
        ctx: Context,
        left_start: Marker,
        mut left: Expression,
        min_precedence: u8,
    ) -> Result<Expression> {
        loop {
            let Some((operator, precedence)) = self.binary_operator(ctx) else {
                return Ok(left);
            };
            if precedence <= min_precedence {
                return Ok(left);
            }
            let coalesce = operator == BinaryOperator::Logical(LogicalOp::NullishCoalescing);
            let logical = matches!(operator, BinaryOperator::Logical(LogicalOp::And | LogicalOp::Or));
            if matches!(left, Expression::PrivateName(_)) && operator != BinaryOperator::Binary(BinaryOp::In) {
                return Err(self.unexpected());
            }
            self.next()?;
            let right_start = self.start();
            let right = if matches!(self.current, Token::PrivateName(_)) {
                self.parse_private_in_operand(ctx)?
            } else {
                self.parse_unary(ctx, None)?
            };
            let right = self.parse_binary(ctx, right_start, right, if coalesce { 2 } else { precedence })?;
            if let Expression::PrivateName(name) = &right {
                return Err(self.syntax_at(
                    "Private identifier can only be left side of binary expression",
                    name.span.start,
                ));
            }
            let span = self.span_from(left_start);
            left = match operator {
                BinaryOperator::Binary(operator) => Expression::Binary(Box::new(BinaryExpression {
                    span,
                    left,
                    operator,
                    right,
                })),
                BinaryOperator::Logical(operator) => Expression::Logical(Box::new(LogicalExpression {
                    span,
                    left,
                    operator,
                    right,
                })),
            };
            let mixes = (logical && self.is(&Token::NullishCoalescing))
                || (coalesce && matches!(self.current, Token::LogicalOr | Token::LogicalAnd));
            if mixes {
                return Err(self.syntax(
                    "Logical expressions and coalesce expressions cannot be mixed. Wrap either by parentheses",
                ));
            }
        }
    }

    /// `#x` as the left operand of `in`.
    fn parse_private_in_operand(&mut self, ctx: Context) -> Result<Expression> {
        let Token::PrivateName(name) = &self.current else {
            return Err(self.unexpected());
        };
        let name = name.clone();
        self.require_next(ctx, "Private names")?;
        let span = self.current_span();
        self.next()?;
        if !self.is_keyword(Keyword::In) {
            return Err(self.unexpected());
        }
        self.use_private_name(&name, span)?;
        Ok(Expression::PrivateName(PrivateIdentifier { span, name }))
    }

    pub(super) fn parse_unary(&mut self, ctx: Context, cover: Option<&mut CoverInfo>) -> Result<Expression> {
        self.parse_maybe_unary(ctx, cover, false, false)
    }

    /// `saw_unary`: an enclosing unary operator forbids a following `**`.
    /// `in_update`: the operand of a prefix `++`/`--`, which leaves `**` to it.
    fn parse_maybe_unary(
        &mut self,
        ctx: Context,
        cover: Option<&mut CoverInfo>,
        mut saw_unary: bool,
        in_update: bool,
    ) -> Result<Expression> {
        let start = self.start();
        let unary = match self.current {
            Token::Minus => Some(UnaryOp::Minus),
            Token::Plus => Some(UnaryOp::Plus),
            Token::Bang => Some(UnaryOp::Not),
            Token::Tilde => Some(UnaryOp::BitNot),
            Token::Keyword(Keyword::Typeof) => Some(UnaryOp::Typeof),
            Token::Keyword(Keyword::Void) => Some(UnaryOp::Void),
            Token::Keyword(Keyword::Delete) => Some(UnaryOp::Delete),
            _ => None,
        };
        let expr = if self.is_contextual("await") && ctx.contains(Context::IN_ASYNC) {
            saw_unary = true;
            self.parse_await(ctx)?
        } else if let Some(operator) = unary {
            self.next()?;
            let argument = self.parse_maybe_unary(ctx, None, true, false)?;
            if operator == UnaryOp::Delete {
                if ctx.strict() && matches!(argument, Expression::Identifier(_)) {
                    return Err(self.early("Delete of an unqualified identifier in strict mode", argument.span()));
                }
                if is_private_member(&argument) {
                    return Err(self.early("Private fields can not be deleted", argument.span()));
                }
            }
            saw_unary = true;
            Expression::Unary(Box::new(UnaryExpression {
                span: self.span_from(start),
                operator,
                prefix: true,
                argument,
            }))
        } else if matches!(self.current, Token::Increment | Token::Decrement) {
            let operator = if self.is(&Token::Increment) {
                UpdateOp::Increment
            } else {
                UpdateOp::Decrement
            };
            self.next()?;
            let argument = self.parse_maybe_unary(ctx, None, true, true)?;
            self.check_simple_target(ctx, &argument, "Invalid left-hand side expression in prefix operation")?;
            Expression::Update(Box::new(UpdateExpression {
                span: self.span_from(start),
                operator,
                prefix: true,
                argument,
            }))
        } else {
            let mut expr = self.parse_left_hand_side(ctx, cover)?;
            while matches!(self.current, Token::Increment | Token::Decrement) && !self.info.newline_before {
                if self.is_bare_arrow(&expr, start) {
                    break;
                }
                self.check_simple_target(ctx, &expr, "Invalid left-hand side expression in postfix operation")?;
                let operator = if self.is(&Token::Increment) {
                    UpdateOp::Increment
                } else {
                    UpdateOp::Decrement
                };
                self.next()?;
                expr = Expression::Update(Box::new(UpdateExpression {
                    span: self.span_from(start),
                    operator,
                    prefix: false,
                    argument: expr,
                }));
            }
            expr
        };

        if !in_update && self.is(&Token::Exponent) && !self.is_bare_arrow(&expr, start) {
            if saw_unary {
                return Err(self.syntax(
                    "Unary operator used immediately before exponentiation expression. Parenthesis must be used to disambiguate operator precedence",
                ));
            }
            self.next()?;
            let right = self.parse_maybe_unary(ctx, None, false, false)?;
            return Ok(Expression::Binary(Box::new(BinaryExpression {
                span: self.span_from(start),
                left: expr,
                operator: BinaryOp::Exp,
                right,
            })));
        }
        Ok(expr)
    }

    fn parse_await(&mut self, ctx: Context) -> Result<Expression> {
        let start = self.start();
        if ctx.contains(Context::IN_PARAMETERS) {
            return Err(self.early("Await expression not allowed in formal parameter", self.current_span()));
        }
        self.await_pos.get_or_insert(start.start);
        self.next()?;
        let argument = self.parse_maybe_unary(ctx, None, true, false)?;
        Ok(Expression::Await(Box::new(AwaitExpression {
            span: self.span_from(start),
            argument,
        })))
    }

    pub(super) fn parse_left_hand_side(&mut self, ctx: Context, mut cover: Option<&mut CoverInfo>) -> Result<Expression> {
        let start = self.start();
        let base = self.parse_primary(ctx, cover.as_deref_mut())?;
        if self.is_bare_arrow(&base, start) {
            return Ok(base);
        }
        if matches!(
            self.current,
            Token::Dot
                | Token::LeftBracket
                | Token::LeftParen
                | Token::OptionalChain
                | Token::NoSubstitutionTemplate(..)
                | Token::TemplateHead(..)
        ) {
            self.reject_pending_cover(cover.as_deref(), start)?;
        }
        self.parse_subscripts(ctx, start, base, false)
    }

    /// Member accesses, calls and tagged templates applied to `base`.
    /// `no_calls` stops at the first `(` (the callee of `new`).
    fn parse_subscripts(
        &mut self,
        ctx: Context,
        start: Marker,
        base: Expression,
        no_calls: bool,
    ) -> Result<Expression> {
        let maybe_async_arrow = matches!(&base, Expression::Identifier(id)
            if id.name == "async"
                && id.span.end - id.span.start == 5
                && id.span.end == self.prev_end
                && self.potential_arrow_at == Some(id.span.start))
            && !self.info.newline_before;

        let mut expr = base;
        let mut state = ShortCircuit::None;
        loop {
            let optional = self.is(&Token::OptionalChain);
            if optional {
                if no_calls {
                    return Err(self.syntax("Invalid optional chain from new expression"));
                }
                self.require_next(ctx, "Optional chaining")?;
                self.next()?;
                if matches!(self.current, Token::NoSubstitutionTemplate(..) | Token::TemplateHead(..)) {
                    return Err(self.syntax("Invalid tagged template on optional chain"));
                }
            }
            match &self.current {
                Token::Dot | Token::PrivateName(_) | Token::Identifier(_) | Token::IdentifierWithEscape(_)
                | Token::Keyword(_) | Token::BooleanLiteral(_) | Token::NullLiteral
                    if optional || self.is(&Token::Dot) =>
                {
                    if !optional {
                        self.next()?; // .
                    }
                    let property = self.parse_member_property(ctx, &expr)?;
                    state = state.link(optional);
                    expr = Expression::Member(Box::new(MemberExpression {
                        span: self.span_from(start),
                        object: expr,
                        property,
                        computed: false,
                        optional,
                    }));
                }
                Token::LeftBracket => {
                    self.next()?;
                    let property = self.parse_expression(ctx.without(Context::DISALLOW_IN))?;
                    self.expect(&Token::RightBracket)?;
                    state = state.link(optional);
                    expr = Expression::Member(Box::new(MemberExpression {
                        span: self.span_from(start),
                        object: expr,
                        property,
                        computed: true,
                        optional,
                    }));
                }
                Token::LeftParen if !no_calls || optional => {
                    if maybe_async_arrow && !state.in_chain() && !optional {
                        return self.parse_async_call_or_arrow(ctx, start, expr);
                    }
                    let arguments = self.parse_arguments(ctx, None)?;
                    state = state.link(optional);
                    expr = Expression::Call(Box::new(CallExpression {
                        span: self.span_from(start),
                        callee: expr,
                        arguments,
                        optional,
                    }));
                }
                Token::NoSubstitutionTemplate(..) | Token::TemplateHead(..) => {
                    if state.in_chain() {
                        return Err(self.syntax("Invalid tagged template on optional chain"));
                    }
                    let quasi = self.parse_template(ctx, true)?;
                    expr = Expression::TaggedTemplate(Box::new(TaggedTemplateExpression {
                        span: self.span_from(start),
                        tag: expr,
                        quasi,
                    }));
                }
                _ if optional => return Err(self.unexpected()),
                _ => break,
            }
        }
        if state.in_chain() {
            return Ok(Expression::Chain(Box::new(ChainExpression {
                span: self.span_from(start),
                expression: expr,
            })));
        }
        Ok(expr)
    }

    /// The name after `.` or `?.`.
    fn parse_member_property(&mut self, ctx: Context, object: &Expression) -> Result<Expression> {
        let span = self.current_span();
        if let Token::PrivateName(name) = &self.current {
            let name = name.clone();
            if matches!(object, Expression::Super(_)) {
                return Err(self.unexpected());
            }
            self.require_next(ctx, "Private names")?;
            self.use_private_name(&name, span)?;
            self.next()?;
            return Ok(Expression::PrivateName(PrivateIdentifier { span, name }));
        }
        let Some(name) = self.current.identifier_name() else {
            return Err(self.unexpected());
        };
        self.next()?;
        Ok(Expression::Identifier(Identifier { span, name }))
    }

    /// `async(...)`: a call, or the parameter list of an async arrow.
    fn parse_async_call_or_arrow(&mut self, ctx: Context, start: Marker, callee: Expression) -> Result<Expression> {
        let saved = (self.yield_pos, self.await_pos, self.await_ident_pos);
        self.yield_pos = None;
        self.await_pos = None;
        self.await_ident_pos = None;

        let mut cover = CoverInfo::default();
        let arguments = self.parse_arguments(ctx, Some(&mut cover))?;

        if self.is(&Token::Arrow) && !self.info.newline_before {
            self.check_arrow_params_positions()?;
            let params = self.to_arrow_params(ctx, arguments)?;
            if let Some(pos) = self.await_ident_pos {
                return Err(self.early_at("Cannot use 'await' as an identifier inside an async function", pos));
            }
            (self.yield_pos, self.await_pos, self.await_ident_pos) = saved;
            return self.parse_arrow(ctx, start, params, true);
        }

        if let Some((pos, message)) = cover.first_error_since(0) {
            return Err(self.early_at(message, pos));
        }
        self.yield_pos = saved.0.or(self.yield_pos);
        self.await_pos = saved.1.or(self.await_pos);
        self.await_ident_pos = saved.2.or(self.await_ident_pos);

        let call = Expression::Call(Box::new(CallExpression {
            span: self.span_from(start),
            callee,
            arguments,
            optional: false,
        }));
        self.parse_subscripts(ctx, start, call, false)
    }

    /// `yield` and `await` expressions may not appear in arrow parameters.
    fn check_arrow_params_positions(&self) -> Result<()> {
        if let Some(pos) = self.yield_pos {
            return Err(self.early_at("Yield expression not allowed in formal parameter", pos));
        }
        if let Some(pos) = self.await_pos {
            return Err(self.early_at("Await expression not allowed in formal parameter", pos));
        }
        Ok(())
    }

    /// Call arguments or would-be arrow parameters.
    fn to_arrow_params(&mut self, ctx: Context, items: Vec<Expression>) -> Result<Vec<Pattern>> {
        let count = items.len();
        let mut params = Vec::with_capacity(count);
        for (i, item) in items.into_iter().enumerate() {
            let param = match item {
                Expression::Spread(spread) => {
                    if i + 1 != count || self.spread_trailing_comma.contains(&spread.span.start) {
                        return Err(self.early("Rest parameter must be last formal parameter", spread.span));
                    }
                    let spread = *spread;
                    if matches!(spread.argument, Expression::Assign(_)) {
                        return Err(self.early("Rest parameter may not have a default initializer", spread.span));
                    }
                    let argument = self.to_binding_param(ctx, spread.argument)?;
                    Pattern::Rest(Box::new(RestElement {
                        span: spread.span,
                        argument,
                    }))
                }
                other => self.to_binding_param(ctx, other)?,
            };
            params.push(param);
        }
        Ok(params)
    }

    fn parse_arguments(&mut self, ctx: Context, mut cover: Option<&mut CoverInfo>) -> Result<Vec<Expression>> {
        let ctx = ctx.without(Context::DISALLOW_IN);
        self.expect(&Token::LeftParen)?;
        let mut arguments = Vec::new();
        while !self.is(&Token::RightParen) {
            if self.is(&Token::Ellipsis) {
                let start = self.start();
                self.next()?;
                let argument = self.parse_assignment(ctx, cover.as_deref_mut())?;
                arguments.push(Expression::Spread(Box::new(SpreadElement {
                    span: self.span_from(start),
                    argument,
                })));
                if self.is(&Token::Comma) {
                    self.spread_trailing_comma.insert(start.start);
                }
            } else {
                arguments.push(self.parse_assignment(ctx, cover.as_deref_mut())?);
            }
            if !self.is(&Token::RightParen) {
                self.expect(&Token::Comma)?;
            }
        }
        self.next()?;
        Ok(arguments)
    }

    // -----------------------------------------------------------------------
    // Primary expressions
    // -----------------------------------------------------------------------

    fn parse_primary(&mut self, ctx: Context, cover: Option<&mut CoverInfo>) -> Result<Expression> {
        let start = self.start();
        match &self.current {
            Token::Keyword(Keyword::This) => {
                self.next()?;
                Ok(Expression::This(ThisExpression {
                    span: self.span_from(start),
                }))
            }
            Token::Keyword(Keyword::Super) => self.parse_super(ctx),
            Token::Keyword(Keyword::Function) => {
                let function = self.parse_function(ctx, start, false, FunctionForm::Expression)?;
                Ok(Expression::Function(Box::new(function)))
            }
            Token::Keyword(Keyword::Class) => {
                let class = self.parse_class(ctx, start, ClassForm::Expression)?;
                Ok(Expression::Class(Box::new(class)))
            }
            Token::Keyword(Keyword::New) => self.parse_new(ctx),
            Token::Keyword(Keyword::Import) => self.parse_import_expression(ctx),
            Token::NumericLiteral(_)
            | Token::LegacyOctalLiteral(_)
            | Token::NonOctalDecimalLiteral(_)
            | Token::BigIntLiteral(_)
            | Token::StringLiteral(_)
            | Token::BooleanLiteral(_)
            | Token::NullLiteral => Ok(Expression::Literal(self.parse_literal(ctx)?)),
            Token::Slash | Token::SlashAssign => self.parse_regex(),
            Token::NoSubstitutionTemplate(..) | Token::TemplateHead(..) => {
                Ok(Expression::Template(self.parse_template(ctx, false)?))
            }
            Token::LeftParen => self.parse_paren(ctx),
            Token::LeftBracket => self.parse_array_literal(ctx, cover),
            Token::LeftBrace => self.parse_object_literal(ctx, cover),
            Token::Identifier(_) | Token::IdentifierWithEscape(_) => self.parse_identifier_expression(ctx),
            _ => Err(self.unexpected()),
        }
    }

    fn parse_identifier_expression(&mut self, ctx: Context) -> Result<Expression> {
        let start = self.start();
        let can_be_arrow = self.potential_arrow_at == Some(start.start);
        if self.is_contextual("async") {
            let (next, newline) = self.peek()?;
            if !newline {
                if next == Token::Keyword(Keyword::Function) {
                    self.next()?;
                    let function = self.parse_function(ctx, start, true, FunctionForm::Expression)?;
                    return Ok(Expression::Function(Box::new(function)));
                }
                let for_await_of = self.for_await_init == Some(start.start) && next.is_identifier("of");
                if can_be_arrow
                    && !for_await_of
                    && matches!(next, Token::Identifier(_) | Token::IdentifierWithEscape(_))
                {
                    self.next()?; // async
                    let param = self.parse_binding_identifier(ctx.with(Context::IN_ASYNC))?;
                    if !self.is(&Token::Arrow) || self.info.newline_before {
                        return Err(self.unexpected());
                    }
                    return self.parse_arrow(ctx, start, vec![Pattern::Identifier(param)], true);
                }
            }
        }
        let escaped = matches!(self.current, Token::IdentifierWithEscape(_));
        let id = self.parse_identifier_reference(ctx)?;
        if can_be_arrow && self.is(&Token::Arrow) && !self.info.newline_before {
            self.check_binding_identifier(ctx, &id.name, id.span, escaped)?;
            return self.parse_arrow(ctx, start, vec![Pattern::Identifier(id)], false);
        }
        Ok(Expression::Identifier(id))
    }

    pub(super) fn parse_literal(&mut self, ctx: Context) -> Result<Literal> {
        let span = self.current_span();
        let raw = self.raw(self.info.start, self.info.end);
        let mut bigint = None;
        let value = match &self.current {
            Token::NumericLiteral(n) => LiteralValue::Number(*n),
            Token::LegacyOctalLiteral(n) => {
                if ctx.strict() {
                    return Err(self.early("Octal literals are not allowed in strict mode", span));
                }
                LiteralValue::Number(*n)
            }
            Token::NonOctalDecimalLiteral(n) => {
                if ctx.strict() {
                    return Err(self.early("Decimals with leading zeros are not allowed in strict mode", span));
                }
                LiteralValue::Number(*n)
            }
            Token::BigIntLiteral(digits) => {
                bigint = Some(digits.clone());
                LiteralValue::BigInt
            }
            Token::StringLiteral(value) => {
                if ctx.strict() {
                    if let Some(pos) = self.info.legacy_escape {
                        return Err(self.early_at("Octal escape sequences are not allowed in strict mode", pos));
                    }
                }
                LiteralValue::String(value.clone())
            }
            Token::BooleanLiteral(b) => LiteralValue::Boolean(*b),
            Token::NullLiteral => LiteralValue::Null,
            _ => return Err(self.unexpected()),
        };
        self.next()?;
        Ok(Literal {
            span,
            value,
            raw,
            regex: None,
            bigint,
        })
    }

    fn parse_regex(&mut self) -> Result<Expression> {
        let start = self.start();
        let token = self
            .lexer
            .rescan_regex(self.info.start, start.pos.line, start.pos.column)?;
        let newline = self.info.newline_before;
        self.set_current(token, newline);
        let Token::RegExpLiteral { pattern, flags } = &self.current else {
            return Err(self.unexpected());
        };
        let regex = RegExpValue {
            pattern: pattern.clone(),
            flags: flags.clone(),
        };
        let span = self.current_span();
        let raw = self.raw(self.info.start, self.info.end);
        self.next()?;
        Ok(Expression::Literal(Literal {
            span,
            value: LiteralValue::RegExp,
            raw,
            regex: Some(regex),
            bigint: None,
        }))
    }

    pub(super) fn parse_template(&mut self, ctx: Context, tagged: bool) -> Result<TemplateLiteral> {
        let start = self.start();
        let mut quasis = Vec::new();
        let mut expressions = Vec::new();
        loop {
            let (cooked, raw, tail) = match &self.current {
                Token::NoSubstitutionTemplate(cooked, raw) | Token::TemplateTail(cooked, raw) => {
                    (cooked.clone(), raw.clone(), true)
                }
                Token::TemplateHead(cooked, raw) | Token::TemplateMiddle(cooked, raw) => {
                    (cooked.clone(), raw.clone(), false)
                }
                _ => return Err(self.unexpected()),
            };
            if cooked.is_none() && !tagged {
                return Err(self.error_at(
                    ErrorKind::Lexical,
                    "Bad escape sequence in untagged template literal",
                    self.info.start,
                    self.info.end,
                ));
            }
            // The element excludes the opening `` ` ``/`}` and the closing `` ` ``/`${`.
            let closing = if tail { 1 } else { 2 };
            let span = Span {
                start: self.info.start + 1,
                end: self.info.end - closing,
                loc: self.current_span().loc.map(|loc| SourceLocation {
                    start: Position {
                        line: loc.start.line,
                        column: loc.start.column + 1,
                    },
                    end: Position {
                        line: loc.end.line,
                        column: loc.end.column.saturating_sub(closing as u32),
                    },
                }),
            };
            quasis.push(TemplateElement {
                span,
                value: TemplateValue { raw, cooked },
                tail,
            });
            self.next()?;
            if tail {
                break;
            }
            expressions.push(self.parse_expression(ctx.without(Context::DISALLOW_IN))?);
            if !self.is(&Token::RightBrace) {
                return Err(self.unexpected());
            }
            let token = self.lexer.read_template_continuation()?;
            self.set_current(token, false);
        }
        Ok(TemplateLiteral {
            span: self.span_from(start),
            expressions,
            quasis,
        })
    }

    /// A parenthesized expression, or the parameter list of an arrow.
    fn parse_paren(&mut self, ctx: Context) -> Result<Expression> {
        let start = self.start();
        let can_be_arrow = self.potential_arrow_at == Some(start.start);
        self.next()?; // (
        let saved = (self.yield_pos, self.await_pos);
        self.yield_pos = None;
        self.await_pos = None;

        let inner = ctx.without(Context::DISALLOW_IN);
        let mut cover = CoverInfo::default();
        let mut items = Vec::new();
        let mut rest = None;
        let mut trailing_comma = None;
        while !self.is(&Token::RightParen) {
            if !items.is_empty() {
                let comma = self.info.start;
                self.expect(&Token::Comma)?;
                if self.is(&Token::RightParen) {
                    trailing_comma = Some(comma);
                    break;
                }
            }
            if self.is(&Token::Ellipsis) {
                let rest_start = self.info.start;
                rest = Some((self.parse_binding_rest(inner, &Token::RightParen)?, rest_start));
                break;
            }
            items.push(self.parse_assignment(inner, Some(&mut cover))?);
        }
        let close = self.info.start;
        self.expect(&Token::RightParen)?;

        if can_be_arrow && self.is(&Token::Arrow) && !self.info.newline_before {
            self.check_arrow_params_positions()?;
            (self.yield_pos, self.await_pos) = saved;
            let mut params = Vec::with_capacity(items.len() + 1);
            for item in items {
                params.push(self.to_binding_param(ctx, item)?);
            }
            if let Some((rest, _)) = rest {
                params.push(rest);
            }
            trace!(start = start.start, params = params.len(), "parenthesized list reinterpreted as arrow parameters");
            return self.parse_arrow(ctx, start, params, false);
        }

        if let Some((_, pos)) = rest {
            return Err(self.syntax_at("Unexpected token '...'", pos));
        }
        if items.is_empty() || trailing_comma.is_some() {
            return Err(self.syntax_at("Unexpected token ')'", close));
        }
        if let Some((pos, message)) = cover.first_error_since(0) {
            return Err(self.early_at(message, pos));
        }
        self.yield_pos = saved.0.or(self.yield_pos);
        self.await_pos = saved.1.or(self.await_pos);

        let value = if items.len() == 1 {
            items.remove(0)
        } else {
            let span = self.join(items[0].span(), items[items.len() - 1].span());
            Expression::Sequence(SequenceExpression {
                span,
                expressions: items,
            })
        };
        let span = value.span();
        self.parenthesized.insert((span.start, span.end));
        Ok(value)
    }

    fn parse_array_literal(&mut self, ctx: Context, mut cover: Option<&mut CoverInfo>) -> Result<Expression> {
        let start = self.start();
        let inner = ctx.without(Context::DISALLOW_IN);
        self.next()?; // [
        let mut elements = Vec::new();
        while !self.is(&Token::RightBracket) {
            if self.eat(&Token::Comma)? {
                elements.push(None);
                continue;
            }
            let element = if self.is(&Token::Ellipsis) {
                let spread_start = self.start();
                self.next()?;
                let argument = self.parse_assignment(inner, cover.as_deref_mut())?;
                if self.is(&Token::Comma) {
                    self.spread_trailing_comma.insert(spread_start.start);
                }
                Expression::Spread(Box::new(SpreadElement {
                    span: self.span_from(spread_start),
                    argument,
                }))
            } else {
                self.parse_assignment(inner, cover.as_deref_mut())?
            };
            elements.push(Some(element));
            if !self.is(&Token::RightBracket) {
                self.expect(&Token::Comma)?;
            }
        }
        self.next()?; // ]
        Ok(Expression::Array(ArrayExpression {
            span: self.span_from(start),
            elements,
        }))
    }

    fn parse_object_literal(&mut self, ctx: Context, mut cover: Option<&mut CoverInfo>) -> Result<Expression> {
        let start = self.start();
        let inner = ctx.without(Context::DISALLOW_IN);
        self.next()?; // {
        let mut properties = Vec::new();
        let mut has_proto = false;
        while !self.is(&Token::RightBrace) {
            if self.is(&Token::Ellipsis) {
                let spread_start = self.start();
                self.next()?;
                let argument = self.parse_assignment(inner, cover.as_deref_mut())?;
                if self.is(&Token::Comma) {
                    self.spread_trailing_comma.insert(spread_start.start);
                }
                properties.push(ObjectMember::Spread(SpreadElement {
                    span: self.span_from(spread_start),
                    argument,
                }));
            } else {
                let property = self.parse_object_property(inner, cover.as_deref_mut(), &mut has_proto)?;
                properties.push(ObjectMember::Property(Box::new(property)));
            }
            if !self.is(&Token::RightBrace) {
                self.expect(&Token::Comma)?;
            }
        }
        self.next()?; // }
        Ok(Expression::Object(ObjectExpression {
            span: self.span_from(start),
            properties,
        }))
    }

    fn parse_object_property(
        &mut self,
        ctx: Context,
        mut cover: Option<&mut CoverInfo>,
        has_proto: &mut bool,
    ) -> Result<Property> {
        let start = self.start();
        let mut is_async = false;
        let mut generator = false;
        let mut kind = PropertyKind::Init;

        if self.is_contextual("async") {
            let (next, newline) = self.peek()?;
            if !newline && (starts_property_key(&next) || next == Token::Star) {
                self.next()?;
                is_async = true;
            }
        }
        if self.is(&Token::Star) {
            self.next()?;
            generator = true;
        }
        if !is_async && !generator && (self.is_contextual("get") || self.is_contextual("set")) {
            let (next, _) = self.peek()?;
            if starts_property_key(&next) {
                kind = if self.is_contextual("get") {
                    PropertyKind::Get
                } else {
                    PropertyKind::Set
                };
                self.next()?;
            }
        }

        let key_token = self.current.clone();
        if matches!(key_token, Token::PrivateName(_)) {
            return Err(self.unexpected());
        }
        let (key, computed) = self.parse_property_key(ctx)?;

        if is_async || generator || kind != PropertyKind::Init || self.is(&Token::LeftParen) {
            let method_kind = match kind {
                PropertyKind::Get => MethodKind::Get,
                PropertyKind::Set => MethodKind::Set,
                PropertyKind::Init => MethodKind::Method,
            };
            let value_start = self.start();
            let function = self.parse_method(ctx, value_start, is_async, generator, method_kind, false)?;
            return Ok(Property {
                span: self.span_from(start),
                method: kind == PropertyKind::Init,
                shorthand: false,
                computed,
                key,
                value: Expression::Function(Box::new(function)),
                kind,
            });
        }

        if self.eat(&Token::Colon)? {
            let is_proto = !computed
                && match &key {
                    Expression::Identifier(id) => id.name == "__proto__",
                    Expression::Literal(lit) => lit.string_value() == Some("__proto__"),
                    _ => false,
                };
            if is_proto {
                if *has_proto {
                    let pos = key.span().start;
                    match cover.as_deref_mut() {
                        Some(cover) => {
                            cover.double_proto.get_or_insert(pos);
                        }
                        None => return Err(self.early_at("Redefinition of __proto__ property", pos)),
                    }
                }
                *has_proto = true;
            }
            let value = self.parse_assignment(ctx, cover)?;
            return Ok(Property {
                span: self.span_from(start),
                method: false,
                shorthand: false,
                computed,
                key,
                value,
                kind,
            });
        }

        // Shorthand `{a}` or cover-initialized `{a = 1}`.
        let (name, escaped) = match key_token {
            Token::Identifier(name) if !computed => (name, false),
            Token::IdentifierWithEscape(name) if !computed => (name, true),
            _ => return Err(self.unexpected()),
        };
        let key_span = key.span();
        self.check_identifier_reference(ctx, &name, key_span, escaped)?;
        let id = Identifier { span: key_span, name };
        let value = if self.is(&Token::Assign) {
            let pos = self.info.start;
            match cover {
                Some(cover) => {
                    cover.shorthand_assign.get_or_insert(pos);
                }
                None => {
                    return Err(self.early_at(
                        "Shorthand property assignments are valid only in destructuring patterns",
                        pos,
                    ));
                }
            }
            self.next()?;
            let right = self.parse_assignment(ctx, None)?;
            Expression::Assign(Box::new(AssignmentExpression {
                span: self.span_from(start),
                operator: AssignOp::Assign,
                left: Pattern::Identifier(id.clone()),
                right,
            }))
        } else {
            Expression::Identifier(id.clone())
        };
        Ok(Property {
            span: self.span_from(start),
            method: false,
            shorthand: true,
            computed: false,
            key: Expression::Identifier(id),
            value,
            kind: PropertyKind::Init,
        })
    }

    /// A literal, identifier-name or computed property key. Returns the key
    /// and whether it is computed.
    pub(super) fn parse_property_key(&mut self, ctx: Context) -> Result<(Expression, bool)> {
        match &self.current {
            Token::LeftBracket => {
                self.next()?;
                let key = self.parse_assignment(ctx.without(Context::DISALLOW_IN), None)?;
                self.expect(&Token::RightBracket)?;
                Ok((key, true))
            }
            Token::StringLiteral(_)
            | Token::NumericLiteral(_)
            | Token::LegacyOctalLiteral(_)
            | Token::NonOctalDecimalLiteral(_)
            | Token::BigIntLiteral(_) => Ok((Expression::Literal(self.parse_literal(ctx)?), false)),
            token => {
                let Some(name) = token.identifier_name() else {
                    return Err(self.unexpected());
                };
                let span = self.current_span();
                self.next()?;
                Ok((Expression::Identifier(Identifier { span, name }), false))
            }
        }
    }

    fn parse_super(&mut self, ctx: Context) -> Result<Expression> {
        let span = self.current_span();
        self.next()?;
        let allowed = match self.current {
            Token::LeftParen => ctx.contains(Context::ALLOW_SUPER_CALL),
            Token::Dot | Token::LeftBracket => ctx.contains(Context::ALLOW_SUPER_PROPERTY),
            _ => return Err(self.unexpected()),
        };
        if !allowed {
            return Err(self.early("'super' keyword unexpected here", span));
        }
        Ok(Expression::Super(Super { span }))
    }

    fn parse_new(&mut self, ctx: Context) -> Result<Expression> {
        let start = self.start();
        let new_span = self.current_span();
        self.next()?;
        if self.eat(&Token::Dot)? {
            let property_span = self.current_span();
            match &self.current {
                Token::Identifier(name) if name == "target" => {}
                Token::IdentifierWithEscape(name) if name == "target" => {
                    return Err(self.early("'new.target' must not contain escaped characters", property_span));
                }
                _ => return Err(self.unexpected()),
            }
            self.next()?;
            let span = self.span_from(start);
            if !ctx.contains(Context::ALLOW_NEW_TARGET) {
                return Err(self.early("new.target expression is not allowed here", span));
            }
            return Ok(Expression::MetaProperty(MetaProperty {
                span,
                meta: Identifier {
                    span: new_span,
                    name: "new".to_string(),
                },
                property: Identifier {
                    span: property_span,
                    name: "target".to_string(),
                },
            }));
        }
        if self.is_keyword(Keyword::Import) {
            return Err(self.syntax("Cannot use new with import"));
        }
        let callee_start = self.start();
        let callee = self.parse_primary(ctx, None)?;
        if matches!(callee, Expression::Super(_)) {
            return Err(self.early("'super' keyword unexpected here", callee.span()));
        }
        let callee = self.parse_subscripts(ctx, callee_start, callee, true)?;
        let arguments = if self.is(&Token::LeftParen) {
            self.parse_arguments(ctx, None)?
        } else {
            Vec::new()
        };
        Ok(Expression::New(Box::new(NewExpression {
            span: self.span_from(start),
            callee,
            arguments,
        })))
    }

    /// `import(source)` or `import.meta`.
    fn parse_import_expression(&mut self, ctx: Context) -> Result<Expression> {
        let start = self.start();
        let import_span = self.current_span();
        self.next()?;
        if self.eat(&Token::Dot)? {
            let property_span = self.current_span();
            match &self.current {
                Token::Identifier(name) if name == "meta" => {}
                Token::IdentifierWithEscape(name) if name == "meta" => {
                    return Err(self.early("'import.meta' must not contain escaped characters", property_span));
                }
                _ => return Err(self.unexpected()),
            }
            self.require_next(ctx, "import.meta")?;
            if !ctx.module() {
                return Err(self.syntax("Cannot use 'import.meta' outside a module"));
            }
            self.next()?;
            return Ok(Expression::MetaProperty(MetaProperty {
                span: self.span_from(start),
                meta: Identifier {
                    span: import_span,
                    name: "import".to_string(),
                },
                property: Identifier {
                    span: property_span,
                    name: "meta".to_string(),
                },
            }));
        }
        if !self.is(&Token::LeftParen) {
            return Err(self.unexpected());
        }
        self.require_next(ctx, "Dynamic import")?;
        self.next()?;
        let source = self.parse_assignment(ctx.without(Context::DISALLOW_IN), None)?;
        if self.is(&Token::Comma) {
            return Err(self.syntax("Trailing comma is not allowed in import()"));
        }
        self.expect(&Token::RightParen)?;
        Ok(Expression::Import(Box::new(ImportExpression {
            span: self.span_from(start),
            source,
        })))
    }

    /// Syntax gated behind `allow_next_syntax_proposals`.
    pub(super) fn require_next(&self, ctx: Context, feature: &str) -> Result<()> {
        if ctx.next() {
            Ok(())
        } else {
            Err(self.syntax(format!("{feature} requires the allowNextSyntaxProposals option")))
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::*;
    use crate::error::{ErrorKind, ParseError};
    use crate::options::Options;
    use crate::parser::Parser;

    fn parse_with(src: &str, options: &Options) -> Result<Program, ParseError> {
        Parser::new(src, options)?.parse_program()
    }

    fn expr(src: &str) -> Expression {
        let prog = parse_with(src, &Options::script().with_next()).unwrap();
        match prog.body.into_iter().next() {
            Some(Statement::Expression(stmt)) => stmt.expression,
            other => panic!("not an expression statement: {other:?}"),
        }
    }

    fn parse_err(src: &str) -> ParseError {
        match parse_with(src, &Options::script().with_next()) {
            Ok(_) => panic!("expected {src:?} to fail"),
            Err(e) => e,
        }
    }

    #[test]
    fn binary_precedence() {
        let Expression::Binary(add) = expr("1 + 2 * 3") else { panic!() };
        assert_eq!(add.operator, BinaryOp::Add);
        assert!(matches!(&add.right, Expression::Binary(mul) if mul.operator == BinaryOp::Mul));

        let Expression::Binary(sub) = expr("a - b - c") else { panic!() };
        assert!(matches!(&sub.left, Expression::Binary(_)));
    }

    #[test]
    fn exponent_is_right_associative() {
        let Expression::Binary(exp) = expr("a ** b ** c") else { panic!() };
        assert!(matches!(&exp.right, Expression::Binary(inner) if inner.operator == BinaryOp::Exp));
        assert!(matches!(expr("(-a) ** b"), Expression::Binary(_)));
        assert!(matches!(expr("++a ** b"), Expression::Binary(_)));
        assert_eq!(parse_err("-a ** b").kind, ErrorKind::Syntax);
    }

    #[test]
    fn nullish_mixing() {
        assert!(matches!(expr("a ?? b ?? c"), Expression::Logical(_)));
        assert!(matches!(expr("(a || b) ?? c"), Expression::Logical(_)));
        assert_eq!(parse_err("a || b ?? c").kind, ErrorKind::Syntax);
        assert_eq!(parse_err("a ?? b && c").kind, ErrorKind::Syntax);
    }

    #[test]
    fn conditional_and_assignment() {
        assert!(matches!(expr("a ? b : c"), Expression::Conditional(_)));
        let Expression::Assign(assign) = expr("a = b = c") else { panic!() };
        assert!(matches!(assign.right, Expression::Assign(_)));
        assert!(matches!(expr("a ||= b"), Expression::Assign(a) if a.operator == AssignOp::LogicalOrAssign));
        assert!(parse_err("1 = 2").is_early());
        assert!(parse_err("a + b = c").is_early());
        assert!(parse_err("[a] += 1").is_early());
        assert!(parse_err("a++ = 1").is_early());
    }

    #[test]
    fn update_targets() {
        assert!(matches!(expr("a.b++"), Expression::Update(u) if !u.prefix));
        assert!(matches!(expr("--a[0]"), Expression::Update(u) if u.prefix));
        assert!(parse_err("++a()").is_early());
        assert!(parse_err("'use strict'; eval++").is_early());
        // A newline before `++` ends the statement.
        let prog = parse_with("a\n++b", &Options::script()).unwrap();
        assert_eq!(prog.body.len(), 2);
    }

    #[test]
    fn member_call_and_new() {
        assert!(matches!(expr("a.b.c"), Expression::Member(_)));
        assert!(matches!(expr("a[0](1, ...b)"), Expression::Call(c) if c.arguments.len() == 2));
        let Expression::New(new) = expr("new a.b(c)") else { panic!() };
        assert!(matches!(new.callee, Expression::Member(_)));
        let Expression::Member(member) = expr("new X().y") else { panic!() };
        assert!(matches!(member.object, Expression::New(_)));
        assert!(matches!(expr("new X"), Expression::New(n) if n.arguments.is_empty()));
        assert!(matches!(expr("a.if.null"), Expression::Member(_)));
    }

    #[test]
    fn optional_chains_are_wrapped_once() {
        let Expression::Chain(chain) = expr("a?.b.c()") else { panic!() };
        let Expression::Call(call) = &chain.expression else { panic!() };
        assert!(!call.optional);
        let Expression::Member(member) = &call.callee else { panic!() };
        assert!(!member.optional);
        assert!(matches!(&member.object, Expression::Member(m) if m.optional));
        assert!(matches!(expr("a?.[0]"), Expression::Chain(_)));
        assert!(matches!(expr("a?.()"), Expression::Chain(_)));
        assert_eq!(parse_err("a?.b`x`").kind, ErrorKind::Syntax);
        assert_eq!(parse_err("new a?.b()").kind, ErrorKind::Syntax);
        assert!(parse_with("a?.b", &Options::script()).is_err());
    }

    #[test]
    fn unary_operators() {
        assert!(matches!(expr("typeof a"), Expression::Unary(u) if u.operator == UnaryOp::Typeof));
        assert!(matches!(expr("delete a.b"), Expression::Unary(_)));
        assert!(parse_err("'use strict'; delete a").is_early());
        assert!(parse_err("'use strict'; delete (a)").is_early());
    }

    #[test]
    fn literals_keep_raw_text() {
        let Expression::Literal(lit) = expr("0x1F") else { panic!() };
        assert_eq!(lit.raw, "0x1F");
        assert_eq!(lit.value, LiteralValue::Number(31.0));
        let Expression::Literal(lit) = expr("10n") else { panic!() };
        assert_eq!(lit.bigint.as_deref(), Some("10"));
        let Expression::Literal(lit) = expr("/a[/]b/gi") else { panic!() };
        assert_eq!(lit.regex.as_ref().map(|r| r.flags.as_str()), Some("gi"));
        assert_eq!(lit.raw, "/a[/]b/gi");
        assert!(parse_err("'use strict'; 07").is_early());
        assert!(parse_err("'use strict'; 08").is_early());
        assert!(parse_err(r"'use strict'; '\01'").is_early());
    }

    #[test]
    fn division_after_expression() {
        assert!(matches!(expr("a / b / c"), Expression::Binary(_)));
        assert!(matches!(expr("(a) / 2"), Expression::Binary(_)));
    }

    #[test]
    fn templates() {
        let Expression::Template(tpl) = expr("`a${b}c${d}e`") else { panic!() };
        assert_eq!(tpl.quasis.len(), 3);
        assert_eq!(tpl.expressions.len(), 2);
        assert_eq!(tpl.quasis[0].span.start, 1);
        assert_eq!(tpl.quasis[0].span.end, 2);
        assert!(tpl.quasis[2].tail);
        let Expression::TaggedTemplate(tagged) = expr(r"tag`\unicode`") else { panic!() };
        assert_eq!(tagged.quasi.quasis[0].value.cooked, None);
        let err = parse_err(r"`\unicode`");
        assert_eq!(err.kind, ErrorKind::Lexical);
        assert!(matches!(expr("`${ {a: 1} }`"), Expression::Template(_)));
    }

    #[test]
    fn object_literals() {
        let Expression::Object(obj) = expr("({a, b: 1, [c]: 2, d() {}, get e() { return 1 }, set e(v) {}, async *f() {}, ...g})") else {
            panic!()
        };
        assert_eq!(obj.properties.len(), 8);
        assert!(matches!(&obj.properties[0], ObjectMember::Property(p) if p.shorthand));
        assert!(matches!(&obj.properties[5], ObjectMember::Property(p) if p.kind == PropertyKind::Set));
        assert!(matches!(expr("({get: 1, set() {}, async: 2, await: 3})"), Expression::Object(_)));
        assert!(parse_err("({get a(b) {}})").is_early());
        assert!(parse_err("({set a() {}})").is_early());
        assert!(parse_err("({set a(...b) {}})").is_early());
    }

    #[test]
    fn cover_initialized_names() {
        assert!(matches!(expr("({a = 1} = b)"), Expression::Assign(_)));
        assert!(matches!(expr("[{a = 1}] = b"), Expression::Assign(_)));
        assert!(parse_err("({a = 1})").is_early());
        assert!(parse_err("({a = 1}).b").is_early());
        assert!(parse_err("f({a = 1})").is_early());
        assert!(parse_err("({a = 1}) + 1").is_early());
    }

    #[test]
    fn duplicate_proto() {
        assert!(parse_err("({__proto__: 1, '__proto__': 2})").is_early());
        assert!(matches!(expr("({__proto__: a, __proto__: b} = c)"), Expression::Assign(_)));
        assert!(matches!(expr("({__proto__: 1, __proto__() {}, ['__proto__']: 2})"), Expression::Object(_)));
    }

    #[test]
    fn arrows() {
        let Expression::Arrow(arrow) = expr("(a, b) => a") else { panic!() };
        assert_eq!(arrow.params.len(), 2);
        assert!(arrow.expression);
        assert!(matches!(expr("(a, b)"), Expression::Sequence(_)));
        let Expression::Arrow(arrow) = expr("(a = b) => a") else { panic!() };
        assert!(matches!(arrow.params[0], Pattern::Assign(_)));
        assert!(matches!(expr("(a = b)"), Expression::Assign(_)));
        assert!(matches!(expr("({a}, [b], ...c) => {}"), Expression::Arrow(a) if a.params.len() == 3 && !a.expression));
        assert!(matches!(expr("() => {}"), Expression::Arrow(_)));
        assert!(parse_err("(a, a) => 1").is_early());
        assert!(parse_err("((a)) => 1").is_early());
        assert!(parse_err("(a.b) => 1").is_early());
        assert!(parse_err("(...a, b) => 1").kind == ErrorKind::Syntax);
        assert!(parse_err("()").kind == ErrorKind::Syntax);
        assert!(parse_err("(a,)").kind == ErrorKind::Syntax);
        assert!(parse_err("() => {}()").kind == ErrorKind::Syntax);
        assert!(parse_err("a\n=> 1").kind == ErrorKind::Syntax);
    }

    #[test]
    fn async_arrows_and_calls() {
        let Expression::Arrow(arrow) = expr("async x => x") else { panic!() };
        assert!(arrow.is_async && arrow.expression);
        assert!(matches!(expr("async (a, b) => a"), Expression::Arrow(a) if a.is_async));
        assert!(matches!(expr("async (a, b)"), Expression::Call(_)));
        assert!(matches!(expr("async\n(a)"), Expression::Call(_)));
        assert!(matches!(expr("async"), Expression::Identifier(_)));
        assert!(parse_err("async (a, a) => {}").is_early());
        assert!(parse_err("async (await) => 1").is_early());
        assert!(parse_err("async (x = await y) => 1").kind != ErrorKind::Lexical);
        assert!(parse_err("async await => 1").is_early());
    }

    #[test]
    fn yield_and_await() {
        let prog = parse_with("function* g() { yield; yield a; yield* b; }", &Options::script()).unwrap();
        let Statement::Function(g) = &prog.body[0] else { panic!() };
        assert_eq!(g.body.body.len(), 3);
        assert!(parse_err("function* g(a = yield) {}").is_early());
        assert!(parse_err("function* g() { (a = yield) => 1 }").is_early());
        assert!(parse_err("async function f(a = await 1) {}").is_early());
        assert!(parse_err("async function f() { -await a ** 2 }").kind == ErrorKind::Syntax);
        parse_with("var yield = 1; var await = 2;", &Options::script()).unwrap();
        parse_with("async function f() { await a; }", &Options::script()).unwrap();
    }

    #[test]
    fn super_and_new_target() {
        assert!(parse_err("super.x").is_early());
        assert!(parse_err("function f() { super.x }").is_early());
        assert!(parse_err("new.target").is_early());
        parse_with("function f() { new.target }", &Options::script()).unwrap();
        parse_with("function f() { () => new.target }", &Options::script()).unwrap();
        parse_with("({ m() { super.x } })", &Options::script()).unwrap();
        assert!(parse_err("({ m() { super() } })").is_early());
    }

    #[test]
    fn dynamic_import() {
        let Expression::Import(outer) = expr(r#"import(import(import("foo")))"#) else { panic!() };
        let Expression::Import(middle) = &outer.source else { panic!() };
        let Expression::Import(inner) = &middle.source else { panic!() };
        assert!(matches!(&inner.source, Expression::Literal(l) if l.string_value() == Some("foo")));
        assert_eq!(parse_err("import(a,)").kind, ErrorKind::Syntax);
        assert_eq!(parse_err("new import(a)").kind, ErrorKind::Syntax);
        assert!(parse_with("import('a')", &Options::script()).is_err());
        assert!(parse_err("import.meta").kind == ErrorKind::Syntax);
    }

    #[test]
    fn private_names_need_an_enclosing_class() {
        assert!(parse_err("a.#x").is_early());
        parse_with("class A { #x; m(o) { return #x in o && o.#x } }", &Options::script().with_next()).unwrap();
        assert!(parse_err("class A { #x; m() { #x } }").kind == ErrorKind::Syntax);
        assert!(parse_err("class A { m() { this.#y } }").is_early());
        assert!(parse_err("class A { #x; m() { delete this.#x } }").is_early());
    }

    #[test]
    fn in_operator_in_for_head_context() {
        let prog = parse_with("for (var a = (b in c); ;) break;", &Options::script()).unwrap();
        assert!(matches!(&prog.body[0], Statement::For(_)));
        parse_with("for (var a = [b in c]; ;) break;", &Options::script()).unwrap();
        parse_with("for (a ? b in c : d; ;) break;", &Options::script()).unwrap();
    }
}
