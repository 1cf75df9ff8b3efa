use serde::Deserialize;

use crate::document::LinkMergePolicy;

/// Per-file parse settings. Deserializable so tools can read them from a config file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParseOptions {
    /// Conditional-compilation symbols for `#if`.
    pub defines: Vec<String>,
    /// Compiler-style options, e.g. `--define:DEBUG`.
    pub compiler_options: Vec<String>,
    /// Precedence for link keys defined in more than one comment.
    pub link_merge: LinkMergePolicy,
}

impl ParseOptions {
    pub fn with_define(mut self, symbol: impl Into<String>) -> Self {
        self.defines.push(symbol.into());
        self
    }

    pub fn with_link_merge(mut self, policy: LinkMergePolicy) -> Self {
        self.link_merge = policy;
        self
    }
}
