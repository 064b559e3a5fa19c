use bitflags::bitflags;

use crate::ast::SourceType;
use crate::options::Options;

bitflags! {
    /// Grammar parameters in effect at a parse position. Copied by value into
    /// every production, so leaving a production restores the outer set.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub(crate) struct Context: u32 {
        const STRICT = 1 << 0;
        const MODULE = 1 << 1;
        const IN_FUNCTION = 1 << 2;
        const IN_ASYNC = 1 << 3;
        const IN_GENERATOR = 1 << 4;
        /// `[~In]`: the `in` operator is not allowed (for-statement heads).
        const DISALLOW_IN = 1 << 5;
        const IN_PARAMETERS = 1 << 6;
        const ALLOW_SUPER_PROPERTY = 1 << 7;
        const ALLOW_SUPER_CALL = 1 << 8;
        const ALLOW_NEW_TARGET = 1 << 9;
        const IN_CLASS_FIELD_INIT = 1 << 10;
        const IN_STATIC_BLOCK = 1 << 11;
        const WEB_COMPAT = 1 << 12;
        const NEXT = 1 << 13;
        const GLOBAL_RETURN = 1 << 14;
    }
}

/// Flags that survive every function boundary.
const INHERITED: Context = Context::STRICT
    .union(Context::MODULE)
    .union(Context::WEB_COMPAT)
    .union(Context::NEXT);

#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct FunctionFlags {
    pub is_async: bool,
    pub is_generator: bool,
    pub super_property: bool,
    pub super_call: bool,
}

impl Context {
    pub fn top_level(options: &Options) -> Context {
        let mut ctx = Context::empty();
        if options.source_type == SourceType::Module {
            ctx |= Context::STRICT | Context::MODULE;
            if options.allow_next_syntax_proposals {
                ctx |= Context::IN_ASYNC;
            }
        } else if options.force_strict_mode {
            ctx |= Context::STRICT;
        }
        if options.allow_next_syntax_proposals {
            ctx |= Context::NEXT;
        }
        if options.web_compat() {
            ctx |= Context::WEB_COMPAT;
        }
        if options.treat_top_level_return_as_valid {
            ctx |= Context::GLOBAL_RETURN;
        }
        ctx
    }

    pub fn strict(self) -> bool {
        self.contains(Context::STRICT)
    }

    pub fn module(self) -> bool {
        self.contains(Context::MODULE)
    }

    pub fn next(self) -> bool {
        self.contains(Context::NEXT)
    }

    /// Annex B extensions apply: sloppy script with web compatibility.
    pub fn sloppy_web(self) -> bool {
        self.contains(Context::WEB_COMPAT) && !self.strict()
    }

    pub fn with(self, flags: Context) -> Context {
        self | flags
    }

    pub fn without(self, flags: Context) -> Context {
        self - flags
    }

    pub fn function(self, flags: FunctionFlags) -> Context {
        let mut ctx = (self & INHERITED) | Context::IN_FUNCTION | Context::ALLOW_NEW_TARGET;
        ctx.set(Context::IN_ASYNC, flags.is_async);
        ctx.set(Context::IN_GENERATOR, flags.is_generator);
        ctx.set(Context::ALLOW_SUPER_PROPERTY, flags.super_property);
        ctx.set(Context::ALLOW_SUPER_CALL, flags.super_call);
        ctx
    }

    /// Arrows see the enclosing `super`, `new.target`, `arguments` rules.
    pub fn arrow(self, is_async: bool) -> Context {
        let kept = INHERITED
            | Context::ALLOW_SUPER_PROPERTY
            | Context::ALLOW_SUPER_CALL
            | Context::ALLOW_NEW_TARGET
            | Context::IN_CLASS_FIELD_INIT
            | Context::IN_STATIC_BLOCK
            | Context::DISALLOW_IN;
        let mut ctx = (self & kept) | Context::IN_FUNCTION;
        ctx.set(Context::IN_ASYNC, is_async);
        ctx
    }

    pub fn field_initializer(self) -> Context {
        (self & INHERITED)
            | Context::IN_CLASS_FIELD_INIT
            | Context::ALLOW_SUPER_PROPERTY
            | Context::ALLOW_NEW_TARGET
    }

    pub fn static_block(self) -> Context {
        (self & INHERITED)
            | Context::IN_STATIC_BLOCK
            | Context::ALLOW_SUPER_PROPERTY
            | Context::ALLOW_NEW_TARGET
    }

    pub fn can_return(self) -> bool {
        self.intersects(Context::IN_FUNCTION | Context::GLOBAL_RETURN)
    }
}
