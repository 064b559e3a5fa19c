use serde::Deserialize;

use crate::ast::SourceType;

/// Parser configuration.
///
/// The default is a sloppy-mode script with web compatibility enabled.
/// Field names deserialize from camelCase, so a JSON config such as
/// `{"sourceType": "module", "includeLocations": true}` maps directly.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Options {
    pub source_type: SourceType,
    /// Attach `loc` line/column records to every node.
    pub include_locations: bool,
    /// Enable dynamic `import()`, `import.meta`, optional chaining, class
    /// fields, private names, static blocks and top-level `await`.
    pub allow_next_syntax_proposals: bool,
    /// Disable Annex B grammar: HTML-like comments, function declarations
    /// in statement position, sloppy block-function duplicates and
    /// `for (var x = 1 in o)`.
    pub disable_legacy_web_compatibility: bool,
    pub treat_top_level_return_as_valid: bool,
    pub force_strict_mode: bool,
}

impl Options {
    pub fn script() -> Self {
        Options::default()
    }

    pub fn module() -> Self {
        Options {
            source_type: SourceType::Module,
            ..Options::default()
        }
    }

    pub fn with_next(mut self) -> Self {
        self.allow_next_syntax_proposals = true;
        self
    }

    pub fn with_locations(mut self) -> Self {
        self.include_locations = true;
        self
    }

    pub fn web_compat(&self) -> bool {
        !self.disable_legacy_web_compatibility && self.source_type == SourceType::Script
    }
}
