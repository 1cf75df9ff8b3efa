use crate::block::{Block, Directive};
use crate::document::{LinkMergePolicy, LinkTable, ParagraphNode};
use crate::error::{LiterateError, Result};
use crate::parser::markdown::MarkdownParser;

pub const INCLUDE: &str = "include";
pub const HIDE: &str = "hide";
pub const DEFINE: &str = "define";

const KNOWN_KEYS: [&str; 3] = [INCLUDE, HIDE, DEFINE];

/// Resolve directives and expand comments, producing paragraphs in source order
/// and the link table merged from every comment.
pub fn transform_blocks(
    blocks: Vec<Block>,
    markdown: &dyn MarkdownParser,
    link_merge: LinkMergePolicy,
) -> Result<(Vec<ParagraphNode>, LinkTable)> {
    let mut paragraphs = Vec::new();
    let mut tables = Vec::new();
    let mut blocks = blocks.into_iter().peekable();

    while let Some(block) = blocks.next() {
        match block {
            Block::Command(directive) => {
                if directive.options.keys().any(|k| !KNOWN_KEYS.contains(&k.as_str())) {
                    return Err(unknown(&directive));
                }

                if let Some(name) = directive.get(INCLUDE) {
                    paragraphs.push(ParagraphNode::CodeReference(name.to_string()));
                    continue;
                }

                let key = if directive.contains(HIDE) {
                    HIDE
                } else if directive.contains(DEFINE) {
                    DEFINE
                } else {
                    return Err(unknown(&directive));
                };

                let Some(Block::Snippet(lines)) = blocks.next_if(|b| matches!(b, Block::Snippet(_)))
                else {
                    return Err(dangling(key, &directive));
                };

                if key == DEFINE {
                    let name = directive.get(DEFINE).map(str::to_string);
                    log::debug!("define {:?}: {} lines", name, lines.len());
                    paragraphs.push(ParagraphNode::HiddenCode { name, lines });
                } else {
                    log::debug!("hide: {} lines", lines.len());
                }
            }
            Block::Snippet(lines) if lines.is_empty() => {}
            Block::Snippet(lines) => paragraphs.push(ParagraphNode::FormattedCode(lines)),
            Block::Comment(text) => {
                let doc = markdown.parse(&text);
                paragraphs.extend(doc.paragraphs.into_iter().map(ParagraphNode::Markdown));
                tables.push(doc.links);
            }
        }
    }

    let links = LinkTable::merge(tables, link_merge);
    log::debug!(
        "transformed into {} paragraphs, {} links",
        paragraphs.len(),
        links.len()
    );
    Ok((paragraphs, links))
}

fn unknown(directive: &Directive) -> LiterateError {
    LiterateError::UnknownDirective {
        pairs: directive.pairs(),
        span: directive.span.clone(),
    }
}

fn dangling(key: &str, directive: &Directive) -> LiterateError {
    LiterateError::DanglingDirective {
        key: key.to_string(),
        pairs: directive.pairs(),
        span: directive.span.clone(),
    }
}
