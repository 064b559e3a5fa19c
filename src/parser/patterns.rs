//! Binding patterns, and the conversion of object and array literals into
//! assignment targets once an `=` (or `=>`, or a for-in/of) reveals them.

use super::context::Context;
use super::{Marker, Parser, Result};
use crate::ast::*;
use crate::lexer::Token;

impl<'a> Parser<'a> {
    pub(super) fn parse_identifier_reference(&mut self, ctx: Context) -> Result<Identifier> {
        self.parse_checked_identifier(ctx, false)
    }

    pub(super) fn parse_binding_identifier(&mut self, ctx: Context) -> Result<Identifier> {
        self.parse_checked_identifier(ctx, true)
    }

    fn parse_checked_identifier(&mut self, ctx: Context, binding: bool) -> Result<Identifier> {
        let (name, escaped) = match &self.current {
            Token::Identifier(name) => (name.clone(), false),
            Token::IdentifierWithEscape(name) => (name.clone(), true),
            _ => return Err(self.unexpected()),
        };
        let span = self.current_span();
        if binding {
            self.check_binding_identifier(ctx, &name, span, escaped)?;
        } else {
            self.check_identifier_reference(ctx, &name, span, escaped)?;
        }
        self.next()?;
        Ok(Identifier { span, name })
    }

    /// BindingIdentifier or BindingPattern.
    pub(super) fn parse_binding_target(&mut self, ctx: Context) -> Result<Pattern> {
        match self.current {
            Token::LeftBracket => self.parse_array_binding(ctx),
            Token::LeftBrace => self.parse_object_binding(ctx),
            _ => Ok(Pattern::Identifier(self.parse_binding_identifier(ctx)?)),
        }
    }

    /// A binding target with an optional default value.
    pub(super) fn parse_binding_element(&mut self, ctx: Context) -> Result<Pattern> {
        let start = self.start();
        let target = self.parse_binding_target(ctx)?;
        self.parse_binding_default(ctx, start, target)
    }

    fn parse_binding_default(&mut self, ctx: Context, start: Marker, target: Pattern) -> Result<Pattern> {
        if !self.eat(&Token::Assign)? {
            return Ok(target);
        }
        let right = self.parse_assignment(ctx.without(Context::DISALLOW_IN), None)?;
        Ok(Pattern::Assign(Box::new(AssignmentPattern {
            span: self.span_from(start),
            left: target,
            right,
        })))
    }

    /// `...target` as the last element of a list closed by `close`.
    pub(super) fn parse_binding_rest(&mut self, ctx: Context, close: &Token) -> Result<Pattern> {
        let start = self.start();
        self.next()?; // ...
        let argument = self.parse_binding_target(ctx)?;
        let rest = Pattern::Rest(Box::new(RestElement {
            span: self.span_from(start),
            argument,
        }));
        if self.is(&Token::Comma) {
            return Err(self.syntax("Comma is not permitted after the rest element"));
        }
        if !self.is(close) {
            return Err(self.unexpected());
        }
        Ok(rest)
    }

    fn parse_array_binding(&mut self, ctx: Context) -> Result<Pattern> {
        let start = self.start();
        self.next()?; // [
        let mut elements = Vec::new();
        loop {
            match self.current {
                Token::RightBracket => break,
                Token::Comma => {
                    self.next()?;
                    elements.push(None);
                    continue;
                }
                Token::Ellipsis => {
                    elements.push(Some(self.parse_binding_rest(ctx, &Token::RightBracket)?));
                    break;
                }
                _ => elements.push(Some(self.parse_binding_element(ctx)?)),
            }
            if !self.is(&Token::RightBracket) {
                self.expect(&Token::Comma)?;
            }
        }
        self.next()?; // ]
        Ok(Pattern::Array(ArrayPattern {
            span: self.span_from(start),
            elements,
        }))
    }

    fn parse_object_binding(&mut self, ctx: Context) -> Result<Pattern> {
        let start = self.start();
        self.next()?; // {
        let mut properties = Vec::new();
        while !self.is(&Token::RightBrace) {
            if self.is(&Token::Ellipsis) {
                let rest_start = self.start();
                self.next()?;
                let argument = Pattern::Identifier(self.parse_binding_identifier(ctx)?);
                properties.push(ObjectPatternProperty::Rest(RestElement {
                    span: self.span_from(rest_start),
                    argument,
                }));
                if self.is(&Token::Comma) {
                    return Err(self.syntax("Comma is not permitted after the rest element"));
                }
                break;
            }

            let prop_start = self.start();
            let key_token = self.current.clone();
            let (key, computed) = self.parse_property_key(ctx)?;
            let (value, shorthand) = if self.eat(&Token::Colon)? {
                (self.parse_binding_element(ctx)?, false)
            } else {
                let (name, escaped) = match key_token {
                    Token::Identifier(name) if !computed => (name, false),
                    Token::IdentifierWithEscape(name) if !computed => (name, true),
                    _ => return Err(self.unexpected()),
                };
                let key_span = key.span();
                self.check_binding_identifier(ctx, &name, key_span, escaped)?;
                let target = Pattern::Identifier(Identifier { span: key_span, name });
                (self.parse_binding_default(ctx, prop_start, target)?, true)
            };
            properties.push(ObjectPatternProperty::Property(Box::new(AssignmentProperty {
                span: self.span_from(prop_start),
                method: false,
                shorthand,
                computed,
                key,
                value,
                kind: PropertyKind::Init,
            })));
            if !self.is(&Token::RightBrace) {
                self.expect(&Token::Comma)?;
            }
        }
        self.next()?; // }
        Ok(Pattern::Object(ObjectPattern {
            span: self.span_from(start),
            properties,
        }))
    }

    // -----------------------------------------------------------------------
    // Expression to pattern
    // -----------------------------------------------------------------------

    /// Reinterprets the left side of `=` (or a for-in/of head) as a pattern.
    pub(super) fn to_assignment_pattern(&mut self, ctx: Context, expr: Expression) -> Result<Pattern> {
        match expr {
            Expression::Identifier(id) => {
                if ctx.strict() && (id.name == "eval" || id.name == "arguments") {
                    return Err(self.early(format!("Assigning to '{}' in strict mode", id.name), id.span));
                }
                Ok(Pattern::Identifier(id))
            }
            Expression::Member(member) => Ok(Pattern::Member(member)),
            Expression::Object(obj) if !self.is_parenthesized(obj.span) => self.object_to_pattern(ctx, obj),
            Expression::Array(arr) if !self.is_parenthesized(arr.span) => self.array_to_pattern(ctx, arr),
            other => Err(self.early("Invalid left-hand side in assignment", other.span())),
        }
    }

    /// The left side of a for-in/of loop.
    pub(super) fn to_assignment_target(&mut self, ctx: Context, expr: Expression, loop_name: &str) -> Result<Pattern> {
        if let Expression::Assign(assign) = &expr {
            return Err(self.early(format!("Invalid left-hand side in {loop_name} loop"), assign.span));
        }
        self.to_assignment_pattern(ctx, expr)
    }

    /// A destructuring element, where `target = default` is allowed.
    fn to_assignment_element(&mut self, ctx: Context, expr: Expression) -> Result<Pattern> {
        match expr {
            Expression::Assign(assign) => {
                if assign.operator != AssignOp::Assign || self.is_parenthesized(assign.span) {
                    return Err(self.early("Invalid destructuring assignment target", assign.span));
                }
                let assign = *assign;
                Ok(Pattern::Assign(Box::new(AssignmentPattern {
                    span: assign.span,
                    left: assign.left,
                    right: assign.right,
                })))
            }
            Expression::Object(obj) if self.is_parenthesized(obj.span) => {
                Err(self.early("Invalid destructuring assignment target", obj.span))
            }
            Expression::Array(arr) if self.is_parenthesized(arr.span) => {
                Err(self.early("Invalid destructuring assignment target", arr.span))
            }
            expr @ (Expression::Identifier(_)
            | Expression::Member(_)
            | Expression::Object(_)
            | Expression::Array(_)) => self.to_assignment_pattern(ctx, expr),
            other => Err(self.early("Invalid destructuring assignment target", other.span())),
        }
    }

    fn object_to_pattern(&mut self, ctx: Context, obj: ObjectExpression) -> Result<Pattern> {
        let count = obj.properties.len();
        let mut properties = Vec::with_capacity(count);
        for (i, member) in obj.properties.into_iter().enumerate() {
            match member {
                ObjectMember::Property(prop) => {
                    let prop = *prop;
                    if prop.method || prop.kind != PropertyKind::Init {
                        return Err(self.early("Invalid destructuring assignment target", prop.span));
                    }
                    let value = self.to_assignment_element(ctx, prop.value)?;
                    properties.push(ObjectPatternProperty::Property(Box::new(AssignmentProperty {
                        span: prop.span,
                        method: false,
                        shorthand: prop.shorthand,
                        computed: prop.computed,
                        key: prop.key,
                        value,
                        kind: PropertyKind::Init,
                    })));
                }
                ObjectMember::Spread(spread) => {
                    if i + 1 != count || self.spread_trailing_comma.contains(&spread.span.start) {
                        return Err(self.early("Rest element must be last element", spread.span));
                    }
                    let argument = match spread.argument {
                        arg @ (Expression::Identifier(_) | Expression::Member(_)) => {
                            self.to_assignment_pattern(ctx, arg)?
                        }
                        other => {
                            return Err(self.early("Invalid rest element in object pattern", other.span()));
                        }
                    };
                    properties.push(ObjectPatternProperty::Rest(RestElement {
                        span: spread.span,
                        argument,
                    }));
                }
            }
        }
        Ok(Pattern::Object(ObjectPattern {
            span: obj.span,
            properties,
        }))
    }

    fn array_to_pattern(&mut self, ctx: Context, arr: ArrayExpression) -> Result<Pattern> {
        let count = arr.elements.len();
        let mut elements = Vec::with_capacity(count);
        for (i, element) in arr.elements.into_iter().enumerate() {
            let pattern = match element {
                None => None,
                Some(Expression::Spread(spread)) => {
                    if i + 1 != count || self.spread_trailing_comma.contains(&spread.span.start) {
                        return Err(self.early("Rest element must be last element", spread.span));
                    }
                    let spread = *spread;
                    if matches!(spread.argument, Expression::Assign(_)) {
                        return Err(self.early("Rest elements cannot have a default value", spread.argument.span()));
                    }
                    let argument = self.to_assignment_element(ctx, spread.argument)?;
                    Some(Pattern::Rest(Box::new(RestElement {
                        span: spread.span,
                        argument,
                    })))
                }
                Some(expr) => Some(self.to_assignment_element(ctx, expr)?),
            };
            elements.push(pattern);
        }
        Ok(Pattern::Array(ArrayPattern {
            span: arr.span,
            elements,
        }))
    }

    /// Reinterprets a parenthesized expression list item as an arrow parameter.
    pub(super) fn to_binding_param(&mut self, ctx: Context, expr: Expression) -> Result<Pattern> {
        if self.is_parenthesized(expr.span()) {
            return Err(self.early("Invalid destructuring assignment target", expr.span()));
        }
        let pattern = match expr {
            Expression::Identifier(id) => Pattern::Identifier(id),
            other => self.to_assignment_element(ctx, other)?,
        };
        self.check_binding_pattern(ctx, &pattern)?;
        Ok(pattern)
    }

    /// Rejects assignment-only targets in a pattern that must bind names.
    pub(super) fn check_binding_pattern(&mut self, ctx: Context, pattern: &Pattern) -> Result<()> {
        match pattern {
            Pattern::Identifier(id) => {
                if self.is_parenthesized(id.span) {
                    return Err(self.early("Invalid destructuring assignment target", id.span));
                }
                self.check_binding_identifier(ctx, &id.name, id.span, false)
            }
            Pattern::Member(member) => Err(self.early("Invalid destructuring assignment target", member.span)),
            Pattern::Object(obj) => {
                for prop in &obj.properties {
                    match prop {
                        ObjectPatternProperty::Property(p) => self.check_binding_pattern(ctx, &p.value)?,
                        ObjectPatternProperty::Rest(rest) => self.check_binding_pattern(ctx, &rest.argument)?,
                    }
                }
                Ok(())
            }
            Pattern::Array(arr) => {
                for element in arr.elements.iter().flatten() {
                    self.check_binding_pattern(ctx, element)?;
                }
                Ok(())
            }
            Pattern::Assign(assign) => self.check_binding_pattern(ctx, &assign.left),
            Pattern::Rest(rest) => self.check_binding_pattern(ctx, &rest.argument),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::*;
    use crate::error::ParseError;
    use crate::options::Options;
    use crate::parser::Parser;

    fn parse(src: &str) -> Program {
        Parser::new(src, &Options::script()).unwrap().parse_program().unwrap()
    }

    fn parse_err(src: &str) -> ParseError {
        match Parser::new(src, &Options::script().with_next()).and_then(|p| p.parse_program()) {
            Ok(_) => panic!("expected {src:?} to fail"),
            Err(e) => e,
        }
    }

    fn first_declarator(prog: &Program) -> &VariableDeclarator {
        match &prog.body[0] {
            Statement::Variable(decl) => &decl.declarations[0],
            other => panic!("not a declaration: {other:?}"),
        }
    }

    #[test]
    fn array_binding_with_holes_and_rest() {
        let prog = parse("var [a, , b = 1, ...c] = d;");
        let Pattern::Array(arr) = &first_declarator(&prog).id else { panic!() };
        assert_eq!(arr.elements.len(), 4);
        assert!(arr.elements[1].is_none());
        assert!(matches!(arr.elements[2], Some(Pattern::Assign(_))));
        assert!(matches!(arr.elements[3], Some(Pattern::Rest(_))));
    }

    #[test]
    fn object_binding_shorthand_and_rest() {
        let prog = parse("let {a, b: [c], d = 2, ...e} = f;");
        let Pattern::Object(obj) = &first_declarator(&prog).id else { panic!() };
        assert_eq!(obj.properties.len(), 4);
        assert!(matches!(&obj.properties[0], ObjectPatternProperty::Property(p) if p.shorthand));
        assert!(matches!(&obj.properties[2], ObjectPatternProperty::Property(p) if p.shorthand && matches!(p.value, Pattern::Assign(_))));
        assert!(matches!(&obj.properties[3], ObjectPatternProperty::Rest(_)));
    }

    #[test]
    fn rest_must_end_the_pattern() {
        assert_eq!(parse_err("var [...a,] = b;").message, "Comma is not permitted after the rest element");
        assert!(parse_err("var {...{a}} = b;").kind == crate::error::ErrorKind::Syntax);
        assert!(parse_err("var {if} = b;").kind == crate::error::ErrorKind::Syntax);
    }

    #[test]
    fn assignment_destructuring() {
        let prog = parse("[a.b, {c: d = 1}, ...e] = f;");
        let Statement::Expression(stmt) = &prog.body[0] else { panic!() };
        let Expression::Assign(assign) = &stmt.expression else { panic!() };
        let Pattern::Array(arr) = &assign.left else { panic!() };
        assert!(matches!(arr.elements[0], Some(Pattern::Member(_))));
        assert!(matches!(arr.elements[2], Some(Pattern::Rest(_))));
        parse("({a, b: c.d, ...e.f} = g);");
        parse("[(a)] = b; [(a.b)] = c;");
    }

    #[test]
    fn invalid_assignment_targets() {
        assert!(parse_err("[...a,] = b;").is_early());
        assert!(parse_err("[...a = 1] = b;").is_early());
        assert!(parse_err("({...{a}} = b);").is_early());
        assert!(parse_err("({a: 1} = b);").is_early());
        assert!(parse_err("([a]) = b;").is_early());
        assert!(parse_err("[({a})] = b;").is_early());
        assert_eq!(parse_err("[({a})] = b;").message, "Invalid destructuring assignment target");
        assert_eq!(parse_err("({ x: ([y]) } = b);").message, "Invalid destructuring assignment target");
        assert_eq!(parse_err("({a}) = b;").message, "Invalid left-hand side in assignment");
        parse("[(a), (b.c)] = d;");
        assert!(parse_err("({get a() {}} = b);").is_early());
        assert!(parse_err("a?.b = c;").is_early());
        assert!(parse_err("'use strict'; [eval] = a;").is_early());
    }
}
