use rustc_hash::FxHashSet;

use super::context::Context;
use super::scope::BindingKind;
use super::{Parser, Result};
use crate::ast::*;
use crate::lexer::Keyword;

/// Words that can never name a binding or reference.
pub(super) fn is_reserved_word(name: &str) -> bool {
    Keyword::from_str(name).is_some() || matches!(name, "true" | "false" | "null")
}

/// Words reserved only in strict mode code.
pub(super) fn is_strict_reserved_word(name: &str) -> bool {
    matches!(
        name,
        "implements" | "interface" | "let" | "package" | "private" | "protected" | "public" | "static" | "yield"
    )
}

/// Identifiers bound by a pattern, in source order.
pub(super) fn bound_identifiers(pattern: &Pattern) -> Vec<&Identifier> {
    let mut out = Vec::new();
    collect_bound(pattern, &mut out);
    out
}

fn collect_bound<'p>(pattern: &'p Pattern, out: &mut Vec<&'p Identifier>) {
    match pattern {
        Pattern::Identifier(id) => out.push(id),
        Pattern::Object(obj) => {
            for prop in &obj.properties {
                match prop {
                    ObjectPatternProperty::Property(p) => collect_bound(&p.value, out),
                    ObjectPatternProperty::Rest(rest) => collect_bound(&rest.argument, out),
                }
            }
        }
        Pattern::Array(arr) => {
            for element in arr.elements.iter().flatten() {
                collect_bound(element, out);
            }
        }
        Pattern::Assign(assign) => collect_bound(&assign.left, out),
        Pattern::Rest(rest) => collect_bound(&rest.argument, out),
        Pattern::Member(_) => {}
    }
}

pub(super) fn is_simple_parameter_list(params: &[Pattern]) -> bool {
    params.iter().all(|p| matches!(p, Pattern::Identifier(_)))
}

/// Whether a parsed directive prologue contains `"use strict"`.
pub(super) fn has_use_strict_directive(prologue: &[Statement]) -> bool {
    prologue.iter().any(|stmt| {
        matches!(stmt, Statement::Expression(expr) if expr.directive.as_deref() == Some("use strict"))
    })
}

impl<'a> Parser<'a> {
    /// Static rules for an identifier used as a reference or label.
    pub(super) fn check_identifier_reference(
        &mut self,
        ctx: Context,
        name: &str,
        span: Span,
        escaped: bool,
    ) -> Result<()> {
        if escaped && is_reserved_word(name) {
            return Err(self.early("Keyword must not contain escaped characters", span));
        }
        if ctx.strict() && is_strict_reserved_word(name) {
            return Err(self.early(format!("Unexpected strict mode reserved word '{name}'"), span));
        }
        match name {
            "yield" if ctx.contains(Context::IN_GENERATOR) => Err(self.early(
                "Cannot use 'yield' as an identifier inside a generator",
                span,
            )),
            "await" => {
                if ctx.intersects(Context::IN_ASYNC | Context::MODULE) {
                    return Err(self.early(
                        "Cannot use 'await' as an identifier inside an async function or module",
                        span,
                    ));
                }
                if ctx.contains(Context::IN_STATIC_BLOCK) {
                    return Err(self.early(
                        "Cannot use 'await' as an identifier inside a class static block",
                        span,
                    ));
                }
                self.await_ident_pos.get_or_insert(span.start);
                Ok(())
            }
            "arguments" if ctx.intersects(Context::IN_CLASS_FIELD_INIT | Context::IN_STATIC_BLOCK) => {
                Err(self.early(
                    "'arguments' is not allowed in class field initializer or static initialization block",
                    span,
                ))
            }
            _ => Ok(()),
        }
    }

    pub(super) fn check_binding_identifier(
        &mut self,
        ctx: Context,
        name: &str,
        span: Span,
        escaped: bool,
    ) -> Result<()> {
        self.check_identifier_reference(ctx, name, span, escaped)?;
        if ctx.strict() {
            self.check_strict_binding(name, span)?;
        }
        Ok(())
    }

    /// `eval` and `arguments` can't be bound or assigned in strict code.
    pub(super) fn check_strict_binding(&self, name: &str, span: Span) -> Result<()> {
        if name == "eval" || name == "arguments" {
            return Err(self.early(format!("Binding '{name}' in strict mode"), span));
        }
        if is_strict_reserved_word(name) {
            return Err(self.early(format!("Unexpected strict mode reserved word '{name}'"), span));
        }
        Ok(())
    }

    pub(super) fn check_lexical_pattern(&self, pattern: &Pattern) -> Result<()> {
        for id in bound_identifiers(pattern) {
            if id.name == "let" {
                return Err(self.early("let is disallowed as a lexically bound name", id.span));
            }
        }
        Ok(())
    }

    pub(super) fn declare_name(&mut self, id: &Identifier, kind: BindingKind) -> Result<()> {
        if self.scopes.declare(&id.name, kind) {
            Ok(())
        } else {
            Err(self.early(format!("Identifier '{}' has already been declared", id.name), id.span))
        }
    }

    pub(super) fn declare_pattern(&mut self, pattern: &Pattern, kind: BindingKind) -> Result<()> {
        for id in bound_identifiers(pattern) {
            self.declare_name(id, kind)?;
        }
        Ok(())
    }

    /// How a function declaration binds its name in the current scope.
    pub(super) fn function_binding_kind(&self, ctx: Context, plain: bool) -> BindingKind {
        if self.scopes.functions_as_var() || (plain && ctx.sloppy_web()) {
            BindingKind::Function
        } else {
            BindingKind::Lexical
        }
    }

    /// Parameter rules that depend on the finished function: strictness from
    /// its body, duplicate names and the shape of the list.
    pub(super) fn validate_params(&self, params: &[Pattern], strict: bool, allow_duplicates: bool) -> Result<()> {
        let mut seen = FxHashSet::default();
        for param in params {
            for id in bound_identifiers(param) {
                if strict {
                    self.check_strict_binding(&id.name, id.span)?;
                }
                if !seen.insert(id.name.as_str()) && !allow_duplicates {
                    return Err(self.early("Duplicate parameter name not allowed in this context", id.span));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str, start: usize) -> Pattern {
        Pattern::Identifier(Identifier {
            span: Span {
                start,
                end: start + name.len(),
                loc: None,
            },
            name: name.to_string(),
        })
    }

    #[test]
    fn reserved_words() {
        assert!(is_reserved_word("class"));
        assert!(is_reserved_word("null"));
        assert!(!is_reserved_word("let"));
        assert!(is_strict_reserved_word("let"));
        assert!(is_strict_reserved_word("yield"));
        assert!(!is_strict_reserved_word("await"));
    }

    #[test]
    fn bound_identifiers_walks_nested_patterns() {
        let pattern = Pattern::Array(ArrayPattern {
            span: Span::default(),
            elements: vec![
                Some(ident("a", 1)),
                None,
                Some(Pattern::Rest(Box::new(RestElement {
                    span: Span::default(),
                    argument: ident("b", 8),
                }))),
            ],
        });
        let names: Vec<_> = bound_identifiers(&pattern).iter().map(|id| id.name.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
        assert!(!is_simple_parameter_list(&[pattern]));
        assert!(is_simple_parameter_list(&[ident("x", 0)]));
    }
}
