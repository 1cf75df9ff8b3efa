//! Fatal pipeline errors.

use std::ops::Range;

use codespan_reporting::diagnostic::{Diagnostic, Label};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, LiterateError>;

/// Errors that abort parsing of a file. No partial document is produced.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LiterateError {
    /// The tokenizer must return exactly one unit for a single-file request.
    #[error("tokenizer returned {count} units for a single file, expected exactly one")]
    TokenizerShape { count: usize },

    /// A directive carries none of the recognized keys.
    #[error("unknown directive: {}", .pairs.join(", "))]
    UnknownDirective {
        /// Every `key:value` pair of the directive, sorted by key.
        pairs: Vec<String>,
        span: Range<usize>,
    },

    /// A `hide` or `define` directive with no code snippet after it.
    #[error("`{key}` directive is not followed by a code snippet: {}", .pairs.join(", "))]
    DanglingDirective {
        key: String,
        pairs: Vec<String>,
        span: Range<usize>,
    },
}

impl LiterateError {
    pub fn span(&self) -> Option<Range<usize>> {
        match self {
            LiterateError::TokenizerShape { .. } => None,
            LiterateError::UnknownDirective { span, .. }
            | LiterateError::DanglingDirective { span, .. } => Some(span.clone()),
        }
    }

    /// Convert to a codespan-reporting Diagnostic for display.
    pub fn to_diagnostic(&self, file_id: usize) -> Diagnostic<usize> {
        let diagnostic = Diagnostic::error().with_message(self.to_string());
        let diagnostic = match self.span() {
            Some(span) => diagnostic.with_labels(vec![Label::primary(file_id, span)]),
            None => diagnostic,
        };
        match self {
            LiterateError::UnknownDirective { .. } => diagnostic
                .with_notes(vec!["recognized directives are `include`, `hide` and `define`".into()]),
            LiterateError::DanglingDirective { .. } => diagnostic
                .with_notes(vec!["place the directive directly above the code it applies to".into()]),
            LiterateError::TokenizerShape { .. } => diagnostic,
        }
    }
}
