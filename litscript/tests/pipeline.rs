use pretty_assertions::assert_eq;

use litscript::document::{DocumentNode, InlineNode, LinkMergePolicy, LinkTable, ParagraphNode};
use litscript::lexer::{ScriptLexer, SourceRequest, TokenizedUnit, Tokenizer};
use litscript::parser::markdown::{MarkdownDocument, MarkdownParser};
use litscript::{LiterateDocument, LiterateError, ParseOptions, Parser};

fn parse(source: &str) -> LiterateDocument {
    Parser::new(source.to_string(), 0)
        .parse()
        .expect("parse failed")
}

fn kinds(doc: &LiterateDocument) -> Vec<&'static str> {
    doc.paragraphs.iter().map(ParagraphNode::kind).collect()
}

fn snippet_text(paragraph: &ParagraphNode) -> Vec<String> {
    match paragraph {
        ParagraphNode::FormattedCode(lines) | ParagraphNode::HiddenCode { lines, .. } => {
            lines.iter().map(|l| l.text()).collect()
        }
        other => panic!("expected code, got {other:?}"),
    }
}

const SAMPLE: &str = "\
(**
# Sample

Intro with [link][home].

[home]: http://example.com
*)
let visible = 1

(*** define: helper ***)
let helper x = x + 1

(** Use the helper: *)
(*** include: helper ***)

(*** hide ***)
let secret = 42
";

#[test]
fn sample_script() {
    let doc = parse(SAMPLE);
    assert_eq!(
        kinds(&doc),
        vec![
            "markdown",
            "markdown",
            "formatted-code",
            "hidden-code",
            "markdown",
            "code-reference",
        ]
    );

    assert_eq!(
        doc.paragraphs[0],
        ParagraphNode::Markdown(DocumentNode::Heading {
            level: 1,
            content: vec![InlineNode::Text("Sample".to_string())],
        })
    );
    assert_eq!(snippet_text(&doc.paragraphs[2]), vec!["let visible = 1"]);
    assert!(matches!(
        &doc.paragraphs[3],
        ParagraphNode::HiddenCode { name: Some(name), .. } if name == "helper"
    ));
    assert_eq!(snippet_text(&doc.paragraphs[3]), vec!["let helper x = x + 1"]);
    assert_eq!(
        doc.paragraphs[5],
        ParagraphNode::CodeReference("helper".to_string())
    );

    assert_eq!(doc.links.len(), 1);
    assert_eq!(
        doc.links.get("home").map(|d| d.url.as_str()),
        Some("http://example.com")
    );
    assert!(doc.diagnostics.is_empty());
    assert_eq!(doc.source.len(), 17);
    assert!(doc.unresolved_references().is_empty());
    assert_eq!(doc.defined_names().into_iter().collect::<Vec<_>>(), vec!["helper"]);
}

#[test]
fn hidden_code_never_shows() {
    let doc = parse(SAMPLE);
    let shown: Vec<String> = doc
        .paragraphs
        .iter()
        .filter_map(|p| match p {
            ParagraphNode::FormattedCode(lines) => Some(lines.iter().map(|l| l.text())),
            _ => None,
        })
        .flatten()
        .collect();
    assert!(!shown.iter().any(|l| l.contains("secret")));
}

#[test]
fn unresolved_include_is_not_an_error() {
    let doc = parse("(*** include: missing ***)\nlet x = 1");
    assert_eq!(kinds(&doc), vec!["code-reference", "formatted-code"]);
    assert_eq!(doc.unresolved_references(), vec!["missing"]);
}

#[test]
fn unknown_directive_aborts_with_every_pair() {
    let source = "let a = 1\n(*** bogus:1, other:two ***)\nlet b = 2";
    let err = Parser::new(source.to_string(), 7).parse().unwrap_err();

    let start = source.find("(***").unwrap();
    let end = source.find("***)").unwrap() + 4;
    assert_eq!(
        err,
        LiterateError::UnknownDirective {
            pairs: vec!["bogus:1".to_string(), "other:two".to_string()],
            span: start..end,
        }
    );

    let diagnostic = err.to_diagnostic(7);
    assert!(diagnostic.message.contains("bogus:1"));
    assert!(diagnostic.message.contains("other:two"));
    assert_eq!(diagnostic.labels[0].file_id, 7);
    assert_eq!(diagnostic.labels[0].range, start..end);
}

#[test]
fn dangling_hide_aborts() {
    let err = Parser::new("(*** hide ***)\n(** Doc *)".to_string(), 0)
        .parse()
        .unwrap_err();
    assert!(matches!(err, LiterateError::DanglingDirective { .. }));
}

#[test]
fn defines_reach_the_tokenizer() {
    let source = "#if DOC\n(** Only with DOC *)\n#endif\nlet x = 1";

    let without = parse(source);
    assert_eq!(kinds(&without), vec!["formatted-code"]);

    let with = Parser::new(source.to_string(), 0)
        .with_options(ParseOptions::default().with_define("DOC"))
        .parse()
        .unwrap();
    assert!(kinds(&with).contains(&"markdown"));

    let via_option = Parser::new(source.to_string(), 0)
        .with_options(ParseOptions {
            compiler_options: vec!["-d:DOC".to_string()],
            ..ParseOptions::default()
        })
        .parse()
        .unwrap();
    assert_eq!(kinds(&via_option), kinds(&with));
}

#[test]
fn tokenizer_diagnostics_travel_with_the_document() {
    let doc = parse("let s = \"open\n");
    assert_eq!(doc.diagnostics.len(), 1);
    assert!(doc.has_errors());
    assert_eq!(kinds(&doc), vec!["formatted-code"]);
}

#[test]
fn link_merge_policy_from_options() {
    let source = "(** [k]: http://first *)\nlet a = 1\n(** [k]: http://second *)";

    let last = parse(source);
    assert_eq!(last.links.get("k").map(|d| d.url.as_str()), Some("http://second"));

    let first = Parser::new(source.to_string(), 0)
        .with_options(ParseOptions::default().with_link_merge(LinkMergePolicy::FirstWins))
        .parse()
        .unwrap();
    assert_eq!(first.links.get("k").map(|d| d.url.as_str()), Some("http://first"));
}

#[test]
fn classify_exposes_blocks() {
    let classified = Parser::new(SAMPLE.to_string(), 0).classify().unwrap();
    let kinds: Vec<_> = classified.blocks.iter().map(|b| b.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            "comment", "snippet", "command", "snippet", "comment", "command", "command", "snippet",
        ]
    );
    assert_eq!(classified.lines.len(), 17);
}

struct FixedUnits(usize);

impl Tokenizer for FixedUnits {
    fn tokenize(&self, request: &SourceRequest<'_>) -> Vec<TokenizedUnit> {
        (0..self.0)
            .map(|_| ScriptLexer.tokenize_source(request))
            .collect()
    }
}

#[test]
fn tokenizer_must_return_exactly_one_unit() {
    for count in [0, 2] {
        let err = Parser::new("let x = 1".to_string(), 0)
            .with_tokenizer(FixedUnits(count))
            .parse()
            .unwrap_err();
        assert_eq!(err, LiterateError::TokenizerShape { count });
    }
    assert!(
        Parser::new("let x = 1".to_string(), 0)
            .with_tokenizer(FixedUnits(1))
            .parse()
            .is_ok()
    );
}

/// Counts nothing; reports each comment as a single rule.
struct RuleMarkdown;

impl MarkdownParser for RuleMarkdown {
    fn parse(&self, _text: &str) -> MarkdownDocument {
        MarkdownDocument {
            paragraphs: vec![DocumentNode::HorizontalRule],
            links: LinkTable::new(),
        }
    }
}

#[test]
fn custom_markdown_parser() {
    let doc = Parser::new("(** anything *)\n(** again *)".to_string(), 0)
        .with_markdown(RuleMarkdown)
        .parse()
        .unwrap();
    assert_eq!(
        doc.paragraphs,
        vec![
            ParagraphNode::Markdown(DocumentNode::HorizontalRule),
            ParagraphNode::Markdown(DocumentNode::HorizontalRule),
        ]
    );
}

#[test]
fn options_deserialize_from_toml() {
    let options: ParseOptions = toml::from_str(
        "defines = [\"DEBUG\"]\ncompiler_options = [\"--define:TRACE\"]\nlink_merge = \"first-wins\"\n",
    )
    .unwrap();
    assert_eq!(
        options,
        ParseOptions {
            defines: vec!["DEBUG".to_string()],
            compiler_options: vec!["--define:TRACE".to_string()],
            link_merge: LinkMergePolicy::FirstWins,
        }
    );

    let defaults: ParseOptions = toml::from_str("").unwrap();
    assert_eq!(defaults, ParseOptions::default());
    assert!(toml::from_str::<ParseOptions>("unknown = 1").is_err());
}

#[test]
fn reference_resolves_against_a_later_comment() {
    let doc = parse("(** See [the docs][docs]. *)\nlet x = 1\n(** [docs]: http://example.com *)");
    assert_eq!(
        doc.paragraphs[0],
        ParagraphNode::Markdown(DocumentNode::Paragraph(vec![
            InlineNode::Text("See ".to_string()),
            InlineNode::LinkReference {
                key: "docs".to_string(),
                content: vec![InlineNode::Text("the docs".to_string())],
            },
            InlineNode::Text(".".to_string()),
        ]))
    );
    assert_eq!(
        doc.links.get("docs").map(|d| d.url.as_str()),
        Some("http://example.com")
    );
    assert!(doc.unresolved_links().is_empty());
}

#[test]
fn reference_with_no_definition_anywhere() {
    let doc = parse("(** [One][missing] and [two][missing], then [home]. *)\n(** [home]: http://h *)");
    assert_eq!(doc.unresolved_links(), vec!["missing"]);
}

#[test]
fn link_keys_merge_case_insensitively() {
    let source = "(** [Docs]: http://first *)\nlet a = 1\n(** [docs]: http://second *)";
    let doc = parse(source);
    assert_eq!(doc.links.len(), 1);
    assert_eq!(doc.links.get("DOCS").map(|d| d.url.as_str()), Some("http://second"));
}

#[test]
fn unknown_key_beside_include_aborts() {
    let err = Parser::new("(*** include:x, bogus:1 ***)\nlet a = 1".to_string(), 0)
        .parse()
        .unwrap_err();
    assert!(matches!(
        err,
        LiterateError::UnknownDirective { ref pairs, .. }
            if pairs == &vec!["bogus:1".to_string(), "include:x".to_string()]
    ));
}
