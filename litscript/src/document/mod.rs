pub mod links;

use crate::token::Line;

pub use links::{LinkDefinition, LinkMergePolicy, LinkTable};

/// One paragraph of a literate document, in reading order.
#[derive(Debug, Clone, PartialEq)]
pub enum ParagraphNode {
    /// `include` placeholder for a snippet bound by name elsewhere.
    CodeReference(String),
    /// Code that is compiled with the script but not shown here.
    /// `define` binds it to a name for later `include`.
    HiddenCode {
        name: Option<String>,
        lines: Vec<Line>,
    },
    /// Ordinary visible code.
    FormattedCode(Vec<Line>),
    /// Prose from a documentation comment.
    Markdown(DocumentNode),
}

impl ParagraphNode {
    pub fn kind(&self) -> &'static str {
        match self {
            ParagraphNode::CodeReference(_) => "code-reference",
            ParagraphNode::HiddenCode { .. } => "hidden-code",
            ParagraphNode::FormattedCode(_) => "formatted-code",
            ParagraphNode::Markdown(_) => "markdown",
        }
    }
}

/// A block-level Markdown node from a documentation comment.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentNode {
    Paragraph(Vec<InlineNode>),
    Heading {
        level: u8,
        content: Vec<InlineNode>,
    },
    CodeBlock {
        language: Option<String>,
        content: String,
    },
    Blockquote(Vec<DocumentNode>),
    Table {
        alignments: Vec<ColumnAlignment>,
        headers: Vec<Vec<InlineNode>>,
        rows: Vec<Vec<Vec<InlineNode>>>,
    },
    OrderedList {
        start: u64,
        items: Vec<Vec<DocumentNode>>,
    },
    UnorderedList {
        items: Vec<Vec<DocumentNode>>,
    },
    Html(String),
    HorizontalRule,
}

impl DocumentNode {
    /// Visit every inline node in this block and the blocks nested in it.
    pub fn walk_inlines<'a>(&'a self, visit: &mut dyn FnMut(&'a InlineNode)) {
        match self {
            DocumentNode::Paragraph(inlines) | DocumentNode::Heading { content: inlines, .. } => {
                for inline in inlines {
                    inline.walk(visit);
                }
            }
            DocumentNode::Blockquote(blocks) => {
                for block in blocks {
                    block.walk_inlines(visit);
                }
            }
            DocumentNode::Table { headers, rows, .. } => {
                for cell in headers.iter().chain(rows.iter().flatten()) {
                    for inline in cell {
                        inline.walk(visit);
                    }
                }
            }
            DocumentNode::OrderedList { items, .. } | DocumentNode::UnorderedList { items } => {
                for block in items.iter().flatten() {
                    block.walk_inlines(visit);
                }
            }
            DocumentNode::CodeBlock { .. } | DocumentNode::Html(_) | DocumentNode::HorizontalRule => {}
        }
    }
}

/// Inline elements that appear within a line of text.
#[derive(Debug, Clone, PartialEq)]
pub enum InlineNode {
    Text(String),
    Strong(Vec<InlineNode>),
    Emphasis(Vec<InlineNode>),
    Strikethrough(Vec<InlineNode>),
    CodeSpan(String),
    Link {
        dest: String,
        title: String,
        content: Vec<InlineNode>,
    },
    Image {
        dest: String,
        title: String,
        alt: Vec<InlineNode>,
    },
    /// `[text][key]`, `[key][]` or `[key]` whose definition is not in the same
    /// comment. Resolved against the document's merged link table.
    LinkReference {
        /// Normalized link key.
        key: String,
        content: Vec<InlineNode>,
    },
    /// An image reference, like `LinkReference`.
    ImageReference {
        key: String,
        alt: Vec<InlineNode>,
    },
    Html(String),
    SoftBreak,
    HardBreak,
}

impl InlineNode {
    /// The plain text of this node and its children, markup dropped.
    pub fn plain_text(&self) -> String {
        match self {
            InlineNode::Text(s) | InlineNode::CodeSpan(s) => s.clone(),
            InlineNode::Strong(children)
            | InlineNode::Emphasis(children)
            | InlineNode::Strikethrough(children)
            | InlineNode::Link {
                content: children, ..
            }
            | InlineNode::Image { alt: children, .. }
            | InlineNode::LinkReference {
                content: children, ..
            }
            | InlineNode::ImageReference { alt: children, .. } => {
                children.iter().map(InlineNode::plain_text).collect()
            }
            InlineNode::Html(_) => String::new(),
            InlineNode::SoftBreak | InlineNode::HardBreak => " ".to_string(),
        }
    }

    fn children(&self) -> &[InlineNode] {
        match self {
            InlineNode::Strong(children)
            | InlineNode::Emphasis(children)
            | InlineNode::Strikethrough(children)
            | InlineNode::Link {
                content: children, ..
            }
            | InlineNode::Image { alt: children, .. }
            | InlineNode::LinkReference {
                content: children, ..
            }
            | InlineNode::ImageReference { alt: children, .. } => children,
            _ => &[],
        }
    }

    /// Visit this node and every node nested in it, depth first.
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a InlineNode)) {
        visit(self);
        for child in self.children() {
            child.walk(visit);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColumnAlignment {
    None,
    Left,
    Center,
    Right,
}
