pub mod directive;

use crate::token::Line;

pub use directive::Directive;

/// A classified region of the source, in source order.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// Text of one documentation comment, `(**` opener and `*)` closer stripped.
    Comment(String),
    /// A run of code lines with blank lines trimmed from both ends. Never empty.
    Snippet(Vec<Line>),
    /// A decoded `(*** ... ***)` directive.
    Command(Directive),
}

impl Block {
    /// Short label used by tooling output.
    pub fn kind(&self) -> &'static str {
        match self {
            Block::Comment(_) => "comment",
            Block::Snippet(_) => "snippet",
            Block::Command(_) => "command",
        }
    }
}
