use std::collections::BTreeMap;

use pretty_assertions::assert_eq;

use litscript::LiterateError;
use litscript::block::{Block, Directive};
use litscript::document::{
    DocumentNode, InlineNode, LinkMergePolicy, LinkTable, ParagraphNode,
};
use litscript::lexer::{ScriptLexer, SourceRequest};
use litscript::parser::markdown::{CmarkParser, MarkdownDocument, MarkdownParser};
use litscript::parser::transform::transform_blocks;
use litscript::token::Line;

/// Wraps the whole comment text in one paragraph.
struct EchoMarkdown;

impl MarkdownParser for EchoMarkdown {
    fn parse(&self, text: &str) -> MarkdownDocument {
        MarkdownDocument {
            paragraphs: vec![DocumentNode::Paragraph(vec![InlineNode::Text(
                text.to_string(),
            )])],
            links: LinkTable::new(),
        }
    }
}

fn code(source: &str) -> Vec<Line> {
    let request = SourceRequest {
        file_id: 0,
        source,
        defines: &[],
        compiler_options: &[],
    };
    ScriptLexer.tokenize_source(&request).lines
}

fn command(pairs: &[(&str, &str)]) -> Block {
    let options: BTreeMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Block::Command(Directive { options, span: 5..20 })
}

fn transform(blocks: Vec<Block>) -> Result<Vec<ParagraphNode>, LiterateError> {
    transform_blocks(blocks, &EchoMarkdown, LinkMergePolicy::default()).map(|(p, _)| p)
}

#[test]
fn define_hide_and_plain_code() {
    let a = code("let a = 1");
    let b = code("let b = 2");
    let c = code("let c = 3");
    let blocks = vec![
        command(&[("define", "x")]),
        Block::Snippet(a.clone()),
        command(&[("hide", "")]),
        Block::Snippet(b),
        Block::Snippet(c.clone()),
    ];
    assert_eq!(
        transform(blocks).unwrap(),
        vec![
            ParagraphNode::HiddenCode {
                name: Some("x".to_string()),
                lines: a,
            },
            ParagraphNode::FormattedCode(c),
        ]
    );
}

#[test]
fn include_without_define_is_kept() {
    assert_eq!(
        transform(vec![command(&[("include", "foo")])]).unwrap(),
        vec![ParagraphNode::CodeReference("foo".to_string())]
    );
}

#[test]
fn include_does_not_consume_snippet() {
    let a = code("let a = 1");
    assert_eq!(
        transform(vec![command(&[("include", "foo")]), Block::Snippet(a.clone())]).unwrap(),
        vec![
            ParagraphNode::CodeReference("foo".to_string()),
            ParagraphNode::FormattedCode(a),
        ]
    );
}

#[test]
fn include_takes_priority_over_hide() {
    let a = code("let a = 1");
    assert_eq!(
        transform(vec![command(&[("include", "foo"), ("hide", "")]), Block::Snippet(a.clone())])
            .unwrap(),
        vec![
            ParagraphNode::CodeReference("foo".to_string()),
            ParagraphNode::FormattedCode(a),
        ]
    );
}

#[test]
fn unknown_key_beside_a_known_one_aborts() {
    for known in ["include", "hide", "define"] {
        let blocks = vec![
            command(&[(known, "x"), ("bogus", "1")]),
            Block::Snippet(code("let a = 1")),
        ];
        let err = transform(blocks).unwrap_err();
        let mut pairs = vec![format!("{known}:x"), "bogus:1".to_string()];
        pairs.sort();
        assert_eq!(
            err,
            LiterateError::UnknownDirective {
                pairs,
                span: 5..20,
            }
        );
    }
}

#[test]
fn directive_without_keys_is_unknown() {
    let err = transform(vec![command(&[]), Block::Snippet(code("let a = 1"))]).unwrap_err();
    assert_eq!(
        err,
        LiterateError::UnknownDirective {
            pairs: Vec::new(),
            span: 5..20,
        }
    );
}

#[test]
fn unknown_directive_reports_every_pair() {
    let blocks = vec![
        Block::Snippet(code("let a = 1")),
        command(&[("bogus", "1"), ("other", "two")]),
        Block::Snippet(code("let b = 2")),
    ];
    let err = transform(blocks).unwrap_err();
    assert_eq!(
        err,
        LiterateError::UnknownDirective {
            pairs: vec!["bogus:1".to_string(), "other:two".to_string()],
            span: 5..20,
        }
    );
    assert_eq!(err.to_string(), "unknown directive: bogus:1, other:two");
}

#[test]
fn hide_without_snippet_is_dangling() {
    let err = transform(vec![command(&[("hide", "")]), Block::Comment("text".into())]).unwrap_err();
    assert!(matches!(err, LiterateError::DanglingDirective { ref key, .. } if key == "hide"));

    let err = transform(vec![command(&[("define", "x")])]).unwrap_err();
    assert!(matches!(err, LiterateError::DanglingDirective { ref key, .. } if key == "define"));
}

#[test]
fn empty_snippet_is_skipped() {
    assert!(transform(vec![Block::Snippet(Vec::new())]).unwrap().is_empty());
}

#[test]
fn comments_become_markdown_in_order() {
    let a = code("let a = 1");
    let blocks = vec![
        Block::Comment("Hello".to_string()),
        Block::Snippet(a.clone()),
        Block::Comment("Bye".to_string()),
    ];
    let text = |s: &str| {
        ParagraphNode::Markdown(DocumentNode::Paragraph(vec![InlineNode::Text(s.to_string())]))
    };
    assert_eq!(
        transform(blocks).unwrap(),
        vec![text("Hello"), ParagraphNode::FormattedCode(a), text("Bye")]
    );
}

fn duplicate_link_blocks() -> Vec<Block> {
    vec![
        Block::Comment("[a]: http://one\n\nText".to_string()),
        Block::Comment("[a]: http://two\n[b]: http://b \"B\"".to_string()),
    ]
}

#[test]
fn later_link_definition_wins_by_default() {
    let (_, links) =
        transform_blocks(duplicate_link_blocks(), &CmarkParser::default(), LinkMergePolicy::LastWins)
            .unwrap();
    assert_eq!(links.len(), 2);
    assert_eq!(links.get("a").map(|d| d.url.as_str()), Some("http://two"));
    assert_eq!(links.get("b").and_then(|d| d.title.as_deref()), Some("B"));
}

#[test]
fn first_link_definition_wins_when_configured() {
    let (_, links) =
        transform_blocks(duplicate_link_blocks(), &CmarkParser::default(), LinkMergePolicy::FirstWins)
            .unwrap();
    assert_eq!(links.len(), 2);
    assert_eq!(links.get("a").map(|d| d.url.as_str()), Some("http://one"));
}
