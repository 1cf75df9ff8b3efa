pub mod block;
pub mod document;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod token;

use std::collections::BTreeSet;

pub use crate::error::{LiterateError, Result};
pub use crate::parser::{ParseError, ParseOptions, Parser};

use crate::document::{InlineNode, LinkTable, ParagraphNode};
use crate::token::Line;

/// A parsed literate script.
#[derive(Debug, Clone)]
pub struct LiterateDocument {
    /// Paragraphs in reading order.
    pub paragraphs: Vec<ParagraphNode>,
    /// Link definitions merged from every documentation comment.
    pub links: LinkTable,
    /// Tokenizer diagnostics. None of these stopped the parse.
    pub diagnostics: Vec<ParseError>,
    /// The tokenized source lines.
    pub source: Vec<Line>,
    /// The source file ID (for error reporting with codespan-reporting).
    pub source_id: usize,
}

impl LiterateDocument {
    /// Names bound by `define` directives.
    pub fn defined_names(&self) -> BTreeSet<&str> {
        self.paragraphs
            .iter()
            .filter_map(|p| match p {
                ParagraphNode::HiddenCode {
                    name: Some(name), ..
                } => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    /// `include` names with no matching `define` anywhere in the file.
    /// These are left for the renderer to report.
    pub fn unresolved_references(&self) -> Vec<&str> {
        let defined = self.defined_names();
        self.paragraphs
            .iter()
            .filter_map(|p| match p {
                ParagraphNode::CodeReference(name) if !defined.contains(name.as_str()) => {
                    Some(name.as_str())
                }
                _ => None,
            })
            .collect()
    }

    /// Keys of link and image references that the merged link table does not define,
    /// in reading order and without repeats.
    pub fn unresolved_links(&self) -> Vec<&str> {
        let mut missing: Vec<&str> = Vec::new();
        for paragraph in &self.paragraphs {
            let ParagraphNode::Markdown(node) = paragraph else {
                continue;
            };
            node.walk_inlines(&mut |inline| {
                if let InlineNode::LinkReference { key, .. } | InlineNode::ImageReference { key, .. } =
                    inline
                {
                    if !self.links.contains(key) && !missing.contains(&key.as_str()) {
                        missing.push(key.as_str());
                    }
                }
            });
        }
        missing
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(ParseError::is_error)
    }
}
