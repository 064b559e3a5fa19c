use bitflags::bitflags;
use rustc_hash::FxHashSet;
use tracing::trace;

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub(crate) struct ScopeFlags: u8 {
        const TOP = 1 << 0;
        const FUNCTION = 1 << 1;
        const ARROW = 1 << 2;
        const SIMPLE_CATCH = 1 << 3;
        const STATIC_BLOCK = 1 << 4;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum BindingKind {
    Var,
    /// `var` binding of a for-of head, which may not redeclare a catch parameter.
    ForOfVar,
    Lexical,
    /// Sloppy-mode function declaration in a block.
    Function,
    SimpleCatch,
}

#[derive(Debug)]
struct Scope {
    flags: ScopeFlags,
    var: FxHashSet<String>,
    lexical: FxHashSet<String>,
    functions: FxHashSet<String>,
    /// Name of a simple catch parameter, which `var` may redeclare when the
    /// scope carries `SIMPLE_CATCH`.
    catch_param: Option<String>,
}

impl Scope {
    fn new(flags: ScopeFlags) -> Self {
        Scope {
            flags,
            var: FxHashSet::default(),
            lexical: FxHashSet::default(),
            functions: FxHashSet::default(),
            catch_param: None,
        }
    }

    fn is_var_scope(&self) -> bool {
        self.flags
            .intersects(ScopeFlags::TOP | ScopeFlags::FUNCTION | ScopeFlags::STATIC_BLOCK)
    }
}

/// Declared names per lexical scope, for redeclaration errors.
#[derive(Debug)]
pub(crate) struct ScopeStack {
    scopes: Vec<Scope>,
    in_module: bool,
}

impl ScopeStack {
    pub fn new(in_module: bool) -> Self {
        ScopeStack {
            scopes: Vec::new(),
            in_module,
        }
    }

    pub fn enter(&mut self, flags: ScopeFlags) {
        self.scopes.push(Scope::new(flags));
    }

    pub fn exit(&mut self) {
        if let Some(scope) = self.scopes.pop() {
            if !scope.is_var_scope() {
                for name in &scope.functions {
                    trace!(name = %name, "block-level function is a var hoisting candidate");
                }
            }
        }
    }

    fn treats_functions_as_var(&self, scope: &Scope) -> bool {
        scope.flags.contains(ScopeFlags::FUNCTION)
            || (!self.in_module && scope.flags.contains(ScopeFlags::TOP))
    }

    /// Whether function declarations in the current scope bind like `var`.
    pub fn functions_as_var(&self) -> bool {
        self.scopes
            .last()
            .is_some_and(|scope| self.treats_functions_as_var(scope))
    }

    /// Records `name`. Returns false when it collides with an existing binding.
    pub fn declare(&mut self, name: &str, kind: BindingKind) -> bool {
        let as_var = self.functions_as_var();
        let Some(scope) = self.scopes.last_mut() else {
            return true;
        };
        match kind {
            BindingKind::Lexical => {
                let redeclared = scope.lexical.contains(name)
                    || scope.functions.contains(name)
                    || scope.var.contains(name);
                scope.lexical.insert(name.to_string());
                !redeclared
            }
            BindingKind::SimpleCatch => {
                scope.lexical.insert(name.to_string());
                scope.catch_param = Some(name.to_string());
                true
            }
            BindingKind::Function => {
                let redeclared = if as_var {
                    scope.lexical.contains(name)
                } else {
                    scope.lexical.contains(name) || scope.var.contains(name)
                };
                scope.functions.insert(name.to_string());
                !redeclared
            }
            BindingKind::Var => self.declare_var(name, false),
            BindingKind::ForOfVar => self.declare_var(name, true),
        }
    }

    fn declare_var(&mut self, name: &str, for_of: bool) -> bool {
        for i in (0..self.scopes.len()).rev() {
            let functions_as_var = self.treats_functions_as_var(&self.scopes[i]);
            let scope = &mut self.scopes[i];
            let shadows_lexical = scope.lexical.contains(name)
                && !(!for_of
                    && scope.flags.contains(ScopeFlags::SIMPLE_CATCH)
                    && scope.catch_param.as_deref() == Some(name));
            if shadows_lexical || (!functions_as_var && scope.functions.contains(name)) {
                return false;
            }
            scope.var.insert(name.to_string());
            if scope.is_var_scope() {
                break;
            }
        }
        true
    }

    /// Whether the outermost scope binds `name`.
    pub fn top_level_declares(&self, name: &str) -> bool {
        self.scopes.first().is_some_and(|scope| {
            scope.var.contains(name) || scope.lexical.contains(name) || scope.functions.contains(name)
        })
    }
}
