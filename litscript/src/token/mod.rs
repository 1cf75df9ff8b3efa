use std::ops::Range;

/// The lexical category of a token.
/// Classification only distinguishes comments and whitespace from everything else;
/// the finer kinds are kept for consumers that format snippets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// `// ...` line comments and `(* ... *)` block comments (one token per line segment).
    Comment,
    Whitespace,
    String,
    Number,
    Identifier,
    /// `#if`, `#else` and `#endif` lines.
    Preprocessor,
    /// A line inside a disabled `#if` branch.
    Inactive,
    Default,
}

/// 1-based line and column of a token's first character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub position: Position,
    /// Byte span in source for error reporting.
    pub span: Range<usize>,
}

impl Token {
    pub fn is_comment(&self) -> bool {
        self.kind == TokenKind::Comment
    }

    pub fn is_whitespace(&self) -> bool {
        self.kind == TokenKind::Whitespace
    }
}

/// One physical source line. An empty line has no tokens.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub tokens: Vec<Token>,
    /// 1-based line number.
    pub number: usize,
    /// Byte span of the line, excluding the line terminator.
    pub span: Range<usize>,
}

impl Line {
    /// Reconstruct the line's source text from its tokens.
    pub fn text(&self) -> String {
        self.tokens.iter().map(|t| t.text.as_str()).collect()
    }

    /// True for lines with no tokens or only whitespace tokens.
    pub fn is_blank(&self) -> bool {
        self.tokens.iter().all(Token::is_whitespace)
    }

    /// If the line holds nothing but comments and whitespace, return the
    /// concatenated text of its tokens. Blank lines qualify with their own text,
    /// so paragraph breaks inside a documentation comment do not end it.
    pub fn comment_text(&self) -> Option<String> {
        self.tokens
            .iter()
            .all(|t| t.is_comment() || t.is_whitespace())
            .then(|| self.text())
    }

    /// The single non-whitespace token of the line, if there is exactly one.
    pub fn sole_token(&self) -> Option<&Token> {
        let mut significant = self.tokens.iter().filter(|t| !t.is_whitespace());
        let first = significant.next()?;
        match significant.next() {
            Some(_) => None,
            None => Some(first),
        }
    }
}
