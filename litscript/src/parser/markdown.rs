use pulldown_cmark::{
    Alignment, BrokenLink, CodeBlockKind, CowStr, Event, HeadingLevel, LinkType, Options,
    Parser as CmarkEvents, Tag, TagEnd,
};

use crate::document::links::normalize_key;
use crate::document::{ColumnAlignment, DocumentNode, InlineNode, LinkDefinition, LinkTable};

/// Result of parsing one documentation comment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkdownDocument {
    pub paragraphs: Vec<DocumentNode>,
    pub links: LinkTable,
}

/// Turns documentation-comment text into Markdown paragraphs and link definitions.
pub trait MarkdownParser: Send + Sync {
    fn parse(&self, text: &str) -> MarkdownDocument;
}

/// CommonMark parser (with tables and strikethrough) backed by pulldown-cmark.
#[derive(Debug, Clone, Copy)]
pub struct CmarkParser {
    options: Options,
}

impl Default for CmarkParser {
    fn default() -> Self {
        CmarkParser {
            options: Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TABLES,
        }
    }
}

impl CmarkParser {
    pub fn with_options(options: Options) -> Self {
        CmarkParser { options }
    }
}

impl MarkdownParser for CmarkParser {
    fn parse(&self, text: &str) -> MarkdownDocument {
        // References without a local definition may be defined in another comment,
        // so they are kept with their key instead of falling back to text.
        let parser =
            CmarkEvents::new_with_broken_link_callback(text, self.options, Some(keep_reference));
        let links: LinkTable = parser
            .reference_definitions()
            .iter()
            .map(|(label, def)| {
                (
                    label.to_string(),
                    LinkDefinition {
                        url: def.dest.to_string(),
                        title: def.title.as_ref().map(|t| t.to_string()),
                    },
                )
            })
            .collect();
        let events: Vec<Event<'_>> = parser.collect();

        let mut i = 0;
        let paragraphs = collect_blocks(&events, &mut i, &|_| false);
        MarkdownDocument { paragraphs, links }
    }
}

// ---------------------------------------------------------------------------
// Block-level collection
// ---------------------------------------------------------------------------

/// Collect block nodes until a matching End tag (consumed) or the end of input.
fn collect_blocks(
    events: &[Event<'_>],
    i: &mut usize,
    is_end: &dyn Fn(&TagEnd) -> bool,
) -> Vec<DocumentNode> {
    let mut nodes = Vec::new();

    while *i < events.len() {
        match &events[*i] {
            Event::End(tag_end) if is_end(tag_end) => {
                *i += 1;
                break;
            }
            Event::Start(Tag::Paragraph) => {
                *i += 1;
                let inlines = collect_inlines(events, i, &|e| matches!(e, TagEnd::Paragraph));
                nodes.push(DocumentNode::Paragraph(inlines));
            }
            Event::Start(Tag::Heading { level, .. }) => {
                let level = heading_level_to_u8(level);
                *i += 1;
                let content = collect_inlines(events, i, &|e| matches!(e, TagEnd::Heading(_)));
                nodes.push(DocumentNode::Heading { level, content });
            }
            Event::Start(Tag::CodeBlock(kind)) => {
                let language = match kind {
                    CodeBlockKind::Fenced(info) => {
                        info.split_whitespace().next().map(str::to_string)
                    }
                    CodeBlockKind::Indented => None,
                };
                *i += 1;
                let content = collect_text_until(events, i, |e| matches!(e, TagEnd::CodeBlock));
                nodes.push(DocumentNode::CodeBlock { language, content });
            }
            Event::Start(Tag::BlockQuote(_)) => {
                *i += 1;
                let inner = collect_blocks(events, i, &|e| matches!(e, TagEnd::BlockQuote(_)));
                nodes.push(DocumentNode::Blockquote(inner));
            }
            Event::Start(Tag::List(start)) => {
                let start = *start;
                *i += 1;
                let items = collect_list_items(events, i);
                nodes.push(match start {
                    Some(start) => DocumentNode::OrderedList { start, items },
                    None => DocumentNode::UnorderedList { items },
                });
            }
            Event::Start(Tag::Table(alignments)) => {
                let alignments = alignments.iter().map(convert_alignment).collect();
                *i += 1;
                let (headers, rows) = collect_table(events, i);
                nodes.push(DocumentNode::Table {
                    alignments,
                    headers,
                    rows,
                });
            }
            Event::Start(Tag::HtmlBlock) => {
                *i += 1;
                let html = collect_text_until(events, i, |e| matches!(e, TagEnd::HtmlBlock));
                nodes.push(DocumentNode::Html(html));
            }
            Event::Rule => {
                nodes.push(DocumentNode::HorizontalRule);
                *i += 1;
            }
            // Tight list items carry their text without a Paragraph wrapper.
            ev if is_inline_event(ev) => {
                let mut inlines = Vec::new();
                while *i < events.len() && is_inline_event(&events[*i]) {
                    if let Some(node) = collect_inline(events, i) {
                        inlines.push(node);
                    }
                }
                nodes.push(DocumentNode::Paragraph(inlines));
            }
            _ => {
                *i += 1;
            }
        }
    }

    nodes
}

fn collect_list_items(events: &[Event<'_>], i: &mut usize) -> Vec<Vec<DocumentNode>> {
    let mut items = Vec::new();

    while *i < events.len() {
        match &events[*i] {
            Event::End(TagEnd::List(_)) => {
                *i += 1;
                break;
            }
            Event::Start(Tag::Item) => {
                *i += 1;
                items.push(collect_blocks(events, i, &|e| matches!(e, TagEnd::Item)));
            }
            _ => {
                *i += 1;
            }
        }
    }

    items
}

/// Collect table headers and rows.
fn collect_table(
    events: &[Event<'_>],
    i: &mut usize,
) -> (Vec<Vec<InlineNode>>, Vec<Vec<Vec<InlineNode>>>) {
    let mut headers = Vec::new();
    let mut rows = Vec::new();
    let mut current_row = Vec::new();

    while *i < events.len() {
        match &events[*i] {
            Event::End(TagEnd::Table) => {
                *i += 1;
                break;
            }
            Event::End(TagEnd::TableHead) => {
                headers = std::mem::take(&mut current_row);
                *i += 1;
            }
            Event::End(TagEnd::TableRow) => {
                rows.push(std::mem::take(&mut current_row));
                *i += 1;
            }
            Event::Start(Tag::TableCell) => {
                *i += 1;
                current_row.push(collect_inlines(events, i, &|e| matches!(e, TagEnd::TableCell)));
            }
            _ => {
                *i += 1;
            }
        }
    }

    (headers, rows)
}

// ---------------------------------------------------------------------------
// Inline collection
// ---------------------------------------------------------------------------

fn is_inline_event(ev: &Event<'_>) -> bool {
    matches!(
        ev,
        Event::Text(_)
            | Event::Code(_)
            | Event::InlineHtml(_)
            | Event::SoftBreak
            | Event::HardBreak
            | Event::Start(
                Tag::Strong
                    | Tag::Emphasis
                    | Tag::Strikethrough
                    | Tag::Link { .. }
                    | Tag::Image { .. }
            )
    )
}

/// Collect inline nodes until a matching End tag (consumed).
fn collect_inlines(
    events: &[Event<'_>],
    i: &mut usize,
    is_end: &dyn Fn(&TagEnd) -> bool,
) -> Vec<InlineNode> {
    let mut inlines = Vec::new();

    while *i < events.len() {
        if let Event::End(tag_end) = &events[*i] {
            if is_end(tag_end) {
                *i += 1;
                break;
            }
        }
        if let Some(node) = collect_inline(events, i) {
            inlines.push(node);
        }
    }

    inlines
}

/// Collect one inline node starting at `events[*i]`; always advances.
fn collect_inline(events: &[Event<'_>], i: &mut usize) -> Option<InlineNode> {
    let ev = &events[*i];
    *i += 1;
    let node = match ev {
        Event::Text(s) => InlineNode::Text(s.to_string()),
        Event::Code(s) => InlineNode::CodeSpan(s.to_string()),
        Event::InlineHtml(s) | Event::Html(s) => InlineNode::Html(s.to_string()),
        Event::SoftBreak => InlineNode::SoftBreak,
        Event::HardBreak => InlineNode::HardBreak,
        Event::Start(Tag::Strong) => {
            InlineNode::Strong(collect_inlines(events, i, &|e| matches!(e, TagEnd::Strong)))
        }
        Event::Start(Tag::Emphasis) => {
            InlineNode::Emphasis(collect_inlines(events, i, &|e| matches!(e, TagEnd::Emphasis)))
        }
        Event::Start(Tag::Strikethrough) => InlineNode::Strikethrough(collect_inlines(
            events,
            i,
            &|e| matches!(e, TagEnd::Strikethrough),
        )),
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            ..
        }) if is_unresolved(*link_type) => InlineNode::LinkReference {
            key: normalize_key(dest_url),
            content: collect_inlines(events, i, &|e| matches!(e, TagEnd::Link)),
        },
        Event::Start(Tag::Image {
            link_type,
            dest_url,
            ..
        }) if is_unresolved(*link_type) => InlineNode::ImageReference {
            key: normalize_key(dest_url),
            alt: collect_inlines(events, i, &|e| matches!(e, TagEnd::Image)),
        },
        Event::Start(Tag::Link {
            dest_url, title, ..
        }) => InlineNode::Link {
            dest: dest_url.to_string(),
            title: title.to_string(),
            content: collect_inlines(events, i, &|e| matches!(e, TagEnd::Link)),
        },
        Event::Start(Tag::Image {
            dest_url, title, ..
        }) => InlineNode::Image {
            dest: dest_url.to_string(),
            title: title.to_string(),
            alt: collect_inlines(events, i, &|e| matches!(e, TagEnd::Image)),
        },
        _ => return None,
    };
    Some(node)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Broken-link callback: the reference label becomes the destination,
/// and `is_unresolved` later picks the link out by its type.
fn keep_reference<'a>(link: BrokenLink<'a>) -> Option<(CowStr<'a>, CowStr<'a>)> {
    Some((link.reference, CowStr::Borrowed("")))
}

fn is_unresolved(link_type: LinkType) -> bool {
    matches!(
        link_type,
        LinkType::ReferenceUnknown | LinkType::CollapsedUnknown | LinkType::ShortcutUnknown
    )
}

fn heading_level_to_u8(level: &HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

fn convert_alignment(alignment: &Alignment) -> ColumnAlignment {
    match alignment {
        Alignment::None => ColumnAlignment::None,
        Alignment::Left => ColumnAlignment::Left,
        Alignment::Center => ColumnAlignment::Center,
        Alignment::Right => ColumnAlignment::Right,
    }
}

/// Collect raw text (or HTML) content until a matching End tag.
fn collect_text_until(
    events: &[Event<'_>],
    i: &mut usize,
    is_end: impl Fn(&TagEnd) -> bool,
) -> String {
    let mut text = String::new();
    while *i < events.len() {
        match &events[*i] {
            Event::End(tag_end) if is_end(tag_end) => {
                *i += 1;
                break;
            }
            Event::Text(s) | Event::Html(s) => {
                text.push_str(s);
                *i += 1;
            }
            _ => {
                *i += 1;
            }
        }
    }
    text
}
