use crate::block::{Block, Directive};
use crate::lexer::scan_block_comment;
use crate::token::Line;

/// Opens a documentation comment.
const DOC_OPEN: &str = "(**";
/// Closes a block comment.
const COMMENT_CLOSE: &str = "*)";

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Group tokenized lines into comment, snippet and command blocks, in source order.
/// Every line ends up in some block; classification does not fail.
pub fn classify_lines(lines: &[Line]) -> Vec<Block> {
    let mut classifier = Classifier {
        blocks: Vec::new(),
        state: State::Snippet(Vec::new()),
    };

    let mut idx = 0;
    while idx < lines.len() {
        match classifier.step(&lines[idx]) {
            Step::Consumed => idx += 1,
            Step::Retry => {}
        }
    }
    classifier.flush();

    log::debug!(
        "classified {} lines into {} blocks",
        lines.len(),
        classifier.blocks.len()
    );
    classifier.blocks
}

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

enum State {
    Comment(CommentBuffer),
    Snippet(Vec<Line>),
}

enum Step {
    Consumed,
    /// The open block was closed; examine the same line again.
    Retry,
}

/// Documentation comment text, kept as fragments and joined once on flush.
struct CommentBuffer {
    fragments: Vec<String>,
    /// Length of the fragments joined so far, separators included.
    len: usize,
    /// Nesting depth of the comment after the last fragment.
    depth: usize,
    /// Offset in the joined text of the `*)` that closed the comment.
    closer: Option<usize>,
}

impl CommentBuffer {
    /// Start a buffer from the opener token's text, `(**` included.
    fn open(text: &str) -> Self {
        let mut buffer = CommentBuffer {
            fragments: Vec::new(),
            len: 0,
            depth: 0,
            closer: None,
        };
        buffer.push(text.to_string());
        buffer
    }

    fn closed(&self) -> bool {
        self.closer.is_some()
    }

    fn push(&mut self, fragment: String) {
        let start = if self.fragments.is_empty() { 0 } else { self.len + 1 };
        if self.closer.is_none() {
            if let Some(end) = scan_block_comment(&fragment, 0, &mut self.depth) {
                self.closer = Some(start + end - COMMENT_CLOSE.len());
            }
        }
        self.len = start + fragment.len();
        self.fragments.push(fragment);
    }

    /// The text between the opener and the closer. Without a closer the text runs to the end.
    fn finish(self) -> String {
        let text = self.fragments.join("\n");
        let end = self.closer.unwrap_or(text.len());
        // In `(**)` the opener and the closer share a `*`.
        let start = DOC_OPEN.len().min(end);
        text[start..end].to_string()
    }
}

struct Classifier {
    blocks: Vec<Block>,
    state: State,
}

impl Classifier {
    fn step(&mut self, line: &Line) -> Step {
        let comment = line.comment_text();

        if let Some(directive) = comment
            .as_deref()
            .and_then(|text| Directive::parse(text, line.span.clone()))
        {
            log::trace!("line {}: directive {:?}", line.number, directive.pairs());
            self.flush();
            self.blocks.push(Block::Command(directive));
            return Step::Consumed;
        }

        let opener = doc_opener(line);
        match &mut self.state {
            State::Comment(buffer) => {
                if let Some(text) = opener {
                    log::trace!("line {}: new documentation comment", line.number);
                    self.flush();
                    self.state = State::Comment(CommentBuffer::open(text));
                } else if buffer.closed() {
                    // Whatever follows the closer, plain comments included, is code.
                    log::trace!("line {}: documentation comment already closed", line.number);
                    self.flush();
                    return Step::Retry;
                } else if let Some(text) = comment {
                    buffer.push(text);
                } else {
                    log::trace!("line {}: code ends documentation comment", line.number);
                    self.flush();
                    return Step::Retry;
                }
            }
            State::Snippet(lines) => {
                if let Some(text) = opener {
                    log::trace!("line {}: documentation comment", line.number);
                    self.flush();
                    self.state = State::Comment(CommentBuffer::open(text));
                } else {
                    lines.push(line.clone());
                }
            }
        }
        Step::Consumed
    }

    /// Emit the open block, if it has content, and reset to an empty snippet.
    fn flush(&mut self) {
        match std::mem::replace(&mut self.state, State::Snippet(Vec::new())) {
            State::Comment(buffer) => self.blocks.push(Block::Comment(buffer.finish())),
            State::Snippet(lines) => {
                let lines = trim_blank_lines(lines);
                if !lines.is_empty() {
                    self.blocks.push(Block::Snippet(lines));
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// The text of a line that starts a documentation comment: a single comment token beginning `(**`.
fn doc_opener(line: &Line) -> Option<&str> {
    line.sole_token()
        .filter(|token| token.is_comment() && token.text.starts_with(DOC_OPEN))
        .map(|token| token.text.as_str())
}

fn trim_blank_lines(mut lines: Vec<Line>) -> Vec<Line> {
    let Some(first) = lines.iter().position(|l| !l.is_blank()) else {
        return Vec::new();
    };
    // `first` exists, so `rposition` does too.
    let last = lines.iter().rposition(|l| !l.is_blank()).unwrap_or(first);
    lines.truncate(last + 1);
    lines.drain(..first);
    lines
}
