use tracing::trace;

use super::context::Context;
use super::declarations::{ClassForm, FunctionForm};
use super::scope::BindingKind;
use super::statements::StatementPosition;
use super::validation::{bound_identifiers, is_reserved_word, is_strict_reserved_word};
use super::{Parser, Result};
use crate::ast::*;
use crate::lexer::{Keyword, Token};

impl<'a> Parser<'a> {
    /// A top-level module item: an import or export declaration, or a
    /// statement.
    pub(super) fn parse_module_item(&mut self, ctx: Context) -> Result<Statement> {
        match self.current {
            Token::Keyword(Keyword::Import) => {
                if matches!(self.peek()?.0, Token::LeftParen | Token::Dot) {
                    return self.parse_statement(ctx, StatementPosition::ListItem);
                }
                Ok(Statement::Import(self.parse_import(ctx)?))
            }
            Token::Keyword(Keyword::Export) => self.parse_export(ctx),
            _ => self.parse_statement(ctx, StatementPosition::ListItem),
        }
    }

    fn parse_import(&mut self, ctx: Context) -> Result<ImportDeclaration> {
        let start = self.start();
        self.next()?; // import
        if matches!(self.current, Token::StringLiteral(_)) {
            let source = self.parse_literal(ctx)?;
            self.consume_semicolon()?;
            return Ok(ImportDeclaration {
                span: self.span_from(start),
                specifiers: Vec::new(),
                source,
            });
        }

        let mut specifiers = Vec::new();
        let mut more = true;
        if matches!(self.current, Token::Identifier(_) | Token::IdentifierWithEscape(_)) {
            let spec_start = self.start();
            let local = self.parse_import_binding(ctx)?;
            specifiers.push(ImportSpecifierKind::Default(ImportDefaultSpecifier {
                span: self.span_from(spec_start),
                local,
            }));
            more = self.eat(&Token::Comma)?;
        }
        if more {
            match self.current {
                Token::Star => {
                    let spec_start = self.start();
                    self.next()?;
                    self.expect_contextual("as")?;
                    let local = self.parse_import_binding(ctx)?;
                    specifiers.push(ImportSpecifierKind::Namespace(ImportNamespaceSpecifier {
                        span: self.span_from(spec_start),
                        local,
                    }));
                }
                Token::LeftBrace => self.parse_named_imports(ctx, &mut specifiers)?,
                _ => return Err(self.unexpected()),
            }
        }
        self.expect_contextual("from")?;
        let source = self.parse_module_source(ctx)?;
        self.consume_semicolon()?;
        Ok(ImportDeclaration {
            span: self.span_from(start),
            specifiers,
            source,
        })
    }

    fn parse_named_imports(&mut self, ctx: Context, specifiers: &mut Vec<ImportSpecifierKind>) -> Result<()> {
        self.next()?; // {
        while !self.is(&Token::RightBrace) {
            let spec_start = self.start();
            let name_token = self.current.clone();
            let imported = self.parse_module_export_name(ctx)?;
            let local = if self.eat_contextual("as")? {
                self.parse_import_binding(ctx)?
            } else {
                let ModuleExportName::Identifier(id) = &imported else {
                    return Err(self.syntax("A string literal import name must be followed by 'as'"));
                };
                let escaped = match name_token {
                    Token::Identifier(_) => false,
                    Token::IdentifierWithEscape(_) => true,
                    _ => return Err(self.syntax_at(format!("Unexpected keyword '{}'", id.name), id.span.start)),
                };
                self.check_binding_identifier(ctx, &id.name, id.span, escaped)?;
                self.declare_name(id, BindingKind::Lexical)?;
                id.clone()
            };
            specifiers.push(ImportSpecifierKind::Named(ImportSpecifier {
                span: self.span_from(spec_start),
                imported,
                local,
            }));
            if !self.is(&Token::RightBrace) {
                self.expect(&Token::Comma)?;
            }
        }
        self.next()?; // }
        Ok(())
    }

    /// A local import binding, declared in the module scope.
    fn parse_import_binding(&mut self, ctx: Context) -> Result<Identifier> {
        let local = self.parse_binding_identifier(ctx)?;
        self.declare_name(&local, BindingKind::Lexical)?;
        Ok(local)
    }

    fn parse_module_source(&mut self, ctx: Context) -> Result<Literal> {
        if !matches!(self.current, Token::StringLiteral(_)) {
            return Err(self.unexpected());
        }
        self.parse_literal(ctx)
    }

    /// An IdentifierName or string literal naming an import or export.
    fn parse_module_export_name(&mut self, ctx: Context) -> Result<ModuleExportName> {
        if matches!(self.current, Token::StringLiteral(_)) {
            if let Some(pos) = self.info.lone_surrogate {
                return Err(self.early_at("An export name cannot include a lone surrogate", pos));
            }
            return Ok(ModuleExportName::Literal(self.parse_literal(ctx)?));
        }
        let Some(name) = self.current.identifier_name() else {
            return Err(self.unexpected());
        };
        let span = self.current_span();
        self.next()?;
        Ok(ModuleExportName::Identifier(Identifier { span, name }))
    }

    fn add_export(&mut self, name: &str, span: Span) -> Result<()> {
        trace!(name, "export");
        if !self.exports.insert(name.to_string()) {
            return Err(self.early(format!("Duplicate export '{name}'"), span));
        }
        Ok(())
    }

    fn parse_export(&mut self, ctx: Context) -> Result<Statement> {
        let start = self.start();
        self.next()?; // export
        match &self.current {
            Token::Star => {
                self.next()?;
                let exported = if self.eat_contextual("as")? {
                    let name = self.parse_module_export_name(ctx)?;
                    self.add_export(name.name(), name.span())?;
                    Some(name)
                } else {
                    None
                };
                self.expect_contextual("from")?;
                let source = self.parse_module_source(ctx)?;
                self.consume_semicolon()?;
                Ok(Statement::ExportAll(ExportAllDeclaration {
                    span: self.span_from(start),
                    exported,
                    source,
                }))
            }
            Token::Keyword(Keyword::Default) => {
                let default_span = self.current_span();
                self.next()?;
                self.add_export("default", default_span)?;
                let declaration = self.parse_export_default(ctx)?;
                Ok(Statement::ExportDefault(Box::new(ExportDefaultDeclaration {
                    span: self.span_from(start),
                    declaration,
                })))
            }
            Token::LeftBrace => self.parse_export_named(ctx, start),
            _ => {
                if !self.is_export_declaration_start()? {
                    return Err(self.unexpected());
                }
                let declaration = self.parse_statement(ctx, StatementPosition::ListItem)?;
                let names: Vec<(String, Span)> = match &declaration {
                    Statement::Variable(decl) => decl
                        .declarations
                        .iter()
                        .flat_map(|d| bound_identifiers(&d.id))
                        .map(|id| (id.name.clone(), id.span))
                        .collect(),
                    Statement::Function(f) => f.id.iter().map(|id| (id.name.clone(), id.span)).collect(),
                    Statement::Class(c) => c.id.iter().map(|id| (id.name.clone(), id.span)).collect(),
                    other => return Err(self.syntax_at("Unexpected token", other.span().start)),
                };
                for (name, span) in names {
                    self.add_export(&name, span)?;
                }
                Ok(Statement::ExportNamed(Box::new(ExportNamedDeclaration {
                    span: self.span_from(start),
                    declaration: Some(declaration),
                    specifiers: Vec::new(),
                    source: None,
                })))
            }
        }
    }

    fn is_export_declaration_start(&self) -> Result<bool> {
        Ok(match &self.current {
            Token::Keyword(Keyword::Var | Keyword::Const | Keyword::Function | Keyword::Class) => true,
            Token::Identifier(name) if name == "let" => matches!(
                self.peek()?.0,
                Token::Identifier(_) | Token::IdentifierWithEscape(_) | Token::LeftBracket | Token::LeftBrace
            ),
            Token::Identifier(name) if name == "async" => {
                let (next, newline) = self.peek()?;
                next == Token::Keyword(Keyword::Function) && !newline
            }
            _ => false,
        })
    }

    fn parse_export_default(&mut self, ctx: Context) -> Result<ExportDefaultKind> {
        let start = self.start();
        if self.is_keyword(Keyword::Function) {
            let function = self.parse_function(ctx, start, false, FunctionForm::DefaultExport)?;
            return Ok(ExportDefaultKind::Function(Box::new(function)));
        }
        if self.is_contextual("async") {
            let (next, newline) = self.peek()?;
            if next == Token::Keyword(Keyword::Function) && !newline {
                self.next()?;
                let function = self.parse_function(ctx, start, true, FunctionForm::DefaultExport)?;
                return Ok(ExportDefaultKind::Function(Box::new(function)));
            }
        }
        if self.is_keyword(Keyword::Class) {
            let class = self.parse_class(ctx, start, ClassForm::DefaultExport)?;
            return Ok(ExportDefaultKind::Class(Box::new(class)));
        }
        let expression = self.parse_assignment(ctx, None)?;
        self.consume_semicolon()?;
        Ok(ExportDefaultKind::Expression(expression))
    }

    fn parse_export_named(&mut self, ctx: Context, start: super::Marker) -> Result<Statement> {
        self.next()?; // {
        let mut specifiers = Vec::new();
        // Token of each local name, for the checks that apply without `from`.
        let mut local_tokens = Vec::new();
        while !self.is(&Token::RightBrace) {
            let spec_start = self.start();
            local_tokens.push(self.current.clone());
            let local = self.parse_module_export_name(ctx)?;
            let exported = if self.eat_contextual("as")? {
                self.parse_module_export_name(ctx)?
            } else {
                local.clone()
            };
            self.add_export(exported.name(), exported.span())?;
            specifiers.push(ExportSpecifier {
                span: self.span_from(spec_start),
                local,
                exported,
            });
            if !self.is(&Token::RightBrace) {
                self.expect(&Token::Comma)?;
            }
        }
        self.next()?; // }

        let source = if self.eat_contextual("from")? {
            Some(self.parse_module_source(ctx)?)
        } else {
            for (spec, token) in specifiers.iter().zip(&local_tokens) {
                let ModuleExportName::Identifier(id) = &spec.local else {
                    return Err(self.early(
                        "A string literal cannot be used as an exported binding without 'from'",
                        spec.local.span(),
                    ));
                };
                let reserved = is_reserved_word(&id.name)
                    || is_strict_reserved_word(&id.name)
                    || id.name == "await"
                    || matches!(token, Token::Keyword(_) | Token::BooleanLiteral(_) | Token::NullLiteral);
                if reserved {
                    return Err(self.early(format!("Unexpected reserved word '{}'", id.name), id.span));
                }
                self.local_exports.push((id.name.clone(), id.span.start, id.span.end));
            }
            None
        };
        self.consume_semicolon()?;
        Ok(Statement::ExportNamed(Box::new(ExportNamedDeclaration {
            span: self.span_from(start),
            declaration: None,
            specifiers,
            source,
        })))
    }

    /// Every `export { x }` without `from` must name a top-level binding.
    pub(super) fn check_local_exports(&self) -> Result<()> {
        for (name, start, end) in &self.local_exports {
            if !self.scopes.top_level_declares(name) {
                return Err(self.error_at(
                    crate::error::ErrorKind::Early,
                    format!("Export '{name}' is not defined"),
                    *start,
                    *end,
                ));
            }
        }
        Ok(())
    }
}
