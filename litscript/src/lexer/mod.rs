pub mod conditional;

use std::collections::HashSet;
use std::ops::Range;

use crate::parser::error::ParseError;
use crate::token::{Line, Position, Token, TokenKind};

// ---------------------------------------------------------------------------
// Tokenizer contract
// ---------------------------------------------------------------------------

/// A single-file tokenization request.
#[derive(Debug, Clone, Copy)]
pub struct SourceRequest<'a> {
    pub file_id: usize,
    pub source: &'a str,
    /// Conditional-compilation symbols.
    pub defines: &'a [String],
    /// Compiler-style options; `--define:X` and `-d:X` add to the defines.
    pub compiler_options: &'a [String],
}

impl SourceRequest<'_> {
    /// All defined symbols, from `defines` and from define options.
    pub fn defined_symbols(&self) -> HashSet<String> {
        let from_options = self.compiler_options.iter().filter_map(|opt| {
            ["--define:", "--define=", "-d:", "-d="]
                .iter()
                .find_map(|prefix| opt.strip_prefix(prefix))
        });
        self.defines
            .iter()
            .map(String::as_str)
            .chain(from_options)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// The tokenized form of one file.
#[derive(Debug, Clone, Default)]
pub struct TokenizedUnit {
    pub lines: Vec<Line>,
    pub diagnostics: Vec<ParseError>,
}

/// Turns raw source text into lines of tokens.
/// A single-file request must yield exactly one unit; the pipeline rejects anything else.
pub trait Tokenizer: Send + Sync {
    fn tokenize(&self, request: &SourceRequest<'_>) -> Vec<TokenizedUnit>;
}

/// Tokenizer for F#-style scripts: `//` and nested `(* *)` comments, string
/// literals and `#if` conditional compilation.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptLexer;

impl ScriptLexer {
    pub fn tokenize_source(&self, request: &SourceRequest<'_>) -> TokenizedUnit {
        let mut state = LexState::new(request);
        let mut offset = 0;
        let source = request.source;
        for (index, raw) in source.split('\n').enumerate() {
            let text = raw.strip_suffix('\r').unwrap_or(raw);
            let line = state.lex_line(index + 1, offset, text);
            state.lines.push(line);
            offset += raw.len() + 1;
        }
        // `split` yields a trailing empty piece for a final newline; that is not a line.
        if source.ends_with('\n') {
            state.lines.pop();
        }
        state.finish(source.len())
    }
}

impl Tokenizer for ScriptLexer {
    fn tokenize(&self, request: &SourceRequest<'_>) -> Vec<TokenizedUnit> {
        vec![self.tokenize_source(request)]
    }
}

// ---------------------------------------------------------------------------
// Lexer state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
enum StringKind {
    Regular,
    Verbatim,
    Triple,
}

struct OpenString {
    kind: StringKind,
    start: usize,
}

/// One `#if` on the conditional stack.
struct Branch {
    parent_active: bool,
    taken: bool,
    active: bool,
    seen_else: bool,
    span: Range<usize>,
}

struct LexState {
    file_id: usize,
    defines: HashSet<String>,
    /// Nesting depth of the open block comment, 0 outside comments.
    comment_depth: usize,
    comment_start: usize,
    open_string: Option<OpenString>,
    branches: Vec<Branch>,
    lines: Vec<Line>,
    diagnostics: Vec<ParseError>,
}

/// Builds the tokens of a single line.
struct LineBuilder<'t> {
    text: &'t str,
    number: usize,
    offset: usize,
    tokens: Vec<Token>,
}

impl<'t> LineBuilder<'t> {
    fn push(&mut self, kind: TokenKind, start: usize, end: usize) {
        if start >= end {
            return;
        }
        let column = self.text[..start].chars().count() + 1;
        self.tokens.push(Token {
            kind,
            text: self.text[start..end].to_string(),
            position: Position {
                line: self.number,
                column,
            },
            span: self.offset + start..self.offset + end,
        });
    }

    /// Push leading whitespace, then `kind` for the rest of the line, then trailing whitespace.
    fn push_whole_line(&mut self, kind: TokenKind) {
        let body_start = self.text.len() - self.text.trim_start().len();
        let body_end = self.text.trim_end().len();
        self.push(TokenKind::Whitespace, 0, body_start);
        self.push(kind, body_start, body_end.max(body_start));
        self.push(TokenKind::Whitespace, body_end.max(body_start), self.text.len());
    }

    fn finish(self) -> Line {
        Line {
            tokens: self.tokens,
            number: self.number,
            span: self.offset..self.offset + self.text.len(),
        }
    }
}

impl LexState {
    fn new(request: &SourceRequest<'_>) -> Self {
        LexState {
            file_id: request.file_id,
            defines: request.defined_symbols(),
            comment_depth: 0,
            comment_start: 0,
            open_string: None,
            branches: Vec::new(),
            lines: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    fn is_active(&self) -> bool {
        self.branches.last().is_none_or(|b| b.active)
    }

    fn lex_line(&mut self, number: usize, offset: usize, text: &str) -> Line {
        let mut line = LineBuilder {
            text,
            number,
            offset,
            tokens: Vec::new(),
        };

        if self.comment_depth == 0 && self.open_string.is_none() {
            if let Some(directive) = preprocessor_keyword(text) {
                line.push_whole_line(TokenKind::Preprocessor);
                self.apply_preprocessor(directive, text, offset);
                return line.finish();
            }
            if !self.is_active() {
                line.push_whole_line(TokenKind::Inactive);
                return line.finish();
            }
        }

        let mut pos = 0;
        if self.comment_depth > 0 {
            let end = self.scan_comment(text, 0);
            line.push(TokenKind::Comment, 0, end);
            pos = end;
        } else if let Some(open) = self.open_string.take() {
            match scan_string(text, 0, open.kind) {
                Some(end) => {
                    line.push(TokenKind::String, 0, end);
                    pos = end;
                }
                None => {
                    line.push(TokenKind::String, 0, text.len());
                    self.open_string = Some(open);
                    return line.finish();
                }
            }
        }

        self.lex_code(&mut line, pos);
        line.finish()
    }

    fn lex_code(&mut self, line: &mut LineBuilder<'_>, mut pos: usize) {
        let text = line.text;
        let bytes = text.as_bytes();

        while pos < text.len() {
            let rest = &text[pos..];
            let c = bytes[pos];

            if c == b' ' || c == b'\t' {
                let end = pos + rest.len() - rest.trim_start_matches([' ', '\t']).len();
                line.push(TokenKind::Whitespace, pos, end);
                pos = end;
            } else if rest.starts_with("//") {
                line.push(TokenKind::Comment, pos, text.len());
                pos = text.len();
            } else if rest.starts_with("(*)") {
                line.push(TokenKind::Default, pos, pos + 3);
                pos += 3;
            } else if rest.starts_with("(*") {
                self.comment_depth = 1;
                self.comment_start = line.offset + pos;
                let end = self.scan_comment(text, pos + 2);
                line.push(TokenKind::Comment, pos, end);
                pos = end;
            } else if rest.starts_with("\"\"\"") {
                pos = self.lex_string(line, pos, 3, StringKind::Triple);
            } else if rest.starts_with("@\"") {
                pos = self.lex_string(line, pos, 2, StringKind::Verbatim);
            } else if c == b'"' {
                pos = self.lex_string(line, pos, 1, StringKind::Regular);
            } else if c == b'\'' {
                let end = char_literal_end(text, pos).unwrap_or(pos + 1);
                let kind = if end > pos + 1 {
                    TokenKind::String
                } else {
                    TokenKind::Default
                };
                line.push(kind, pos, end);
                pos = end;
            } else if rest.starts_with("``") {
                match rest[2..].find("``") {
                    Some(close) => {
                        let end = pos + 2 + close + 2;
                        line.push(TokenKind::Identifier, pos, end);
                        pos = end;
                    }
                    None => {
                        line.push(TokenKind::Default, pos, pos + 2);
                        pos += 2;
                    }
                }
            } else if c.is_ascii_digit() {
                let end = number_end(text, pos);
                line.push(TokenKind::Number, pos, end);
                pos = end;
            } else if let Some(ch) = rest.chars().next().filter(|ch| ch.is_alphabetic() || *ch == '_') {
                let mut end = pos + ch.len_utf8();
                for next in text[end..].chars() {
                    if next.is_alphanumeric() || next == '_' || next == '\'' {
                        end += next.len_utf8();
                    } else {
                        break;
                    }
                }
                line.push(TokenKind::Identifier, pos, end);
                pos = end;
            } else {
                let len = rest.chars().next().map_or(1, char::len_utf8);
                line.push(TokenKind::Default, pos, pos + len);
                pos += len;
            }
        }
    }

    /// Lex a string literal whose opening quote is `open_len` bytes long.
    fn lex_string(
        &mut self,
        line: &mut LineBuilder<'_>,
        pos: usize,
        open_len: usize,
        kind: StringKind,
    ) -> usize {
        match scan_string(line.text, pos + open_len, kind) {
            Some(end) => {
                line.push(TokenKind::String, pos, end);
                end
            }
            None => {
                line.push(TokenKind::String, pos, line.text.len());
                self.open_string = Some(OpenString {
                    kind,
                    start: line.offset + pos,
                });
                line.text.len()
            }
        }
    }

    /// Scan the body of an open block comment from `from`, tracking nesting.
    /// Returns the byte index just past the outermost `*)`, or the line length.
    fn scan_comment(&mut self, text: &str, from: usize) -> usize {
        scan_block_comment(text, from, &mut self.comment_depth).unwrap_or(text.len())
    }

    fn apply_preprocessor(&mut self, directive: Preprocessor, text: &str, offset: usize) {
        let start = text.len() - text.trim_start().len();
        let span = offset + start..offset + text.trim_end().len().max(start);

        match directive {
            Preprocessor::If(expr) => {
                let parent_active = self.is_active();
                let expr = expr.split("//").next().unwrap_or_default();
                let taken = if parent_active {
                    match conditional::evaluate(expr, &self.defines) {
                        Ok(value) => value,
                        Err(message) => {
                            self.diagnostics.push(
                                ParseError::error(message, span.clone(), self.file_id)
                                    .with_note("the branch is treated as inactive"),
                            );
                            false
                        }
                    }
                } else {
                    false
                };
                self.branches.push(Branch {
                    parent_active,
                    taken,
                    active: parent_active && taken,
                    seen_else: false,
                    span,
                });
            }
            Preprocessor::Else => match self.branches.last_mut() {
                None => self.diagnostics.push(ParseError::error(
                    "`#else` without matching `#if`",
                    span,
                    self.file_id,
                )),
                Some(branch) if branch.seen_else => self.diagnostics.push(ParseError::error(
                    "duplicate `#else` for the same `#if`",
                    span,
                    self.file_id,
                )),
                Some(branch) => {
                    branch.seen_else = true;
                    branch.active = branch.parent_active && !branch.taken;
                }
            },
            Preprocessor::EndIf => {
                if self.branches.pop().is_none() {
                    self.diagnostics.push(ParseError::error(
                        "`#endif` without matching `#if`",
                        span,
                        self.file_id,
                    ));
                }
            }
        }
    }

    fn finish(mut self, source_len: usize) -> TokenizedUnit {
        if self.comment_depth > 0 {
            let span = self.comment_start..(self.comment_start + 2).min(source_len);
            self.diagnostics.push(ParseError::warning(
                "unterminated block comment",
                span,
                self.file_id,
            ));
        }
        if let Some(open) = self.open_string.take() {
            let span = open.start..(open.start + 1).min(source_len);
            self.diagnostics.push(ParseError::error(
                "unterminated string literal",
                span,
                self.file_id,
            ));
        }
        for branch in std::mem::take(&mut self.branches) {
            self.diagnostics.push(ParseError::warning(
                "`#if` without matching `#endif`",
                branch.span,
                self.file_id,
            ));
        }
        log::debug!(
            "tokenized {} lines with {} diagnostics",
            self.lines.len(),
            self.diagnostics.len()
        );
        TokenizedUnit {
            lines: self.lines,
            diagnostics: self.diagnostics,
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

enum Preprocessor<'t> {
    If(&'t str),
    Else,
    EndIf,
}

/// Recognize `#if`, `#else` and `#endif` at the start of a line.
/// Scan block-comment text from `from`, tracking nesting in `depth`.
/// Returns the end of the `*)` that brings `depth` back to zero, if there is one.
pub(crate) fn scan_block_comment(text: &str, from: usize, depth: &mut usize) -> Option<usize> {
    let mut i = from;
    while i < text.len() {
        let rest = &text[i..];
        if rest.starts_with("(*)") {
            i += 3;
        } else if rest.starts_with("(*") {
            *depth += 1;
            i += 2;
        } else if rest.starts_with("*)") {
            *depth = depth.saturating_sub(1);
            i += 2;
            if *depth == 0 {
                return Some(i);
            }
        } else {
            i += rest.chars().next().map_or(1, char::len_utf8);
        }
    }
    None
}

fn preprocessor_keyword(text: &str) -> Option<Preprocessor<'_>> {
    fn keyword<'t>(line: &'t str, kw: &str) -> Option<&'t str> {
        line.strip_prefix(kw)
            .filter(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace))
    }

    let trimmed = text.trim_start();
    if let Some(rest) = keyword(trimmed, "#if") {
        Some(Preprocessor::If(rest.trim()))
    } else if keyword(trimmed, "#else").is_some() {
        Some(Preprocessor::Else)
    } else if keyword(trimmed, "#endif").is_some() {
        Some(Preprocessor::EndIf)
    } else {
        None
    }
}

/// Find the end of a string body starting at `from`. `None` if it runs past the line.
fn scan_string(text: &str, from: usize, kind: StringKind) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut i = from;
    while i < bytes.len() {
        match (kind, bytes[i]) {
            (StringKind::Triple, b'"') if text[i..].starts_with("\"\"\"") => return Some(i + 3),
            (StringKind::Triple, _) => i += 1,
            (StringKind::Regular, b'\\') => i += 2,
            (StringKind::Verbatim, b'"') if bytes.get(i + 1) == Some(&b'"') => i += 2,
            (_, b'"') => return Some(i + 1),
            _ => i += 1,
        }
    }
    None
}

/// `'a'`, `'\n'` and `'A'` are character literals; a lone `'` is not.
fn char_literal_end(text: &str, pos: usize) -> Option<usize> {
    let rest = &text[pos + 1..];
    let mut chars = rest.char_indices();
    let (_, first) = chars.next()?;
    if first == '\\' {
        let (esc_idx, esc) = chars.next()?;
        let after = esc_idx + esc.len_utf8();
        let close = rest[after..].find('\'')?;
        // Longest escape is `\U0010FFFF`.
        (close <= 8).then_some(pos + 1 + after + close + 1)
    } else if first == '\'' {
        None
    } else {
        let (idx, second) = chars.next()?;
        (second == '\'').then_some(pos + 1 + idx + 1)
    }
}

/// Numbers run over digits, letters (suffixes, hex) and `_`, plus a `.` followed by a digit.
fn number_end(text: &str, pos: usize) -> usize {
    let bytes = text.as_bytes();
    let mut end = pos;
    while end < bytes.len() {
        let b = bytes[end];
        if b.is_ascii_alphanumeric() || b == b'_' {
            end += 1;
        } else if b == b'.' && bytes.get(end + 1).is_some_and(u8::is_ascii_digit) {
            end += 1;
        } else {
            break;
        }
    }
    end
}
