pub mod classify;
pub mod error;
pub mod markdown;
pub mod options;
pub mod transform;

pub use error::ParseError;
pub use options::ParseOptions;

use crate::LiterateDocument;
use crate::block::Block;
use crate::error::{LiterateError, Result};
use crate::lexer::{ScriptLexer, SourceRequest, TokenizedUnit, Tokenizer};
use crate::token::Line;
use markdown::{CmarkParser, MarkdownParser};

/// Classifier output together with the tokenized source it came from.
#[derive(Debug, Clone)]
pub struct ClassifiedSource {
    pub blocks: Vec<Block>,
    pub lines: Vec<Line>,
    pub diagnostics: Vec<ParseError>,
}

/// Parser entry point.
pub struct Parser {
    source: String,
    file_id: usize,
    options: ParseOptions,
    tokenizer: Box<dyn Tokenizer>,
    markdown: Box<dyn MarkdownParser>,
}

impl Parser {
    pub fn new(source: String, file_id: usize) -> Self {
        Parser {
            source,
            file_id,
            options: ParseOptions::default(),
            tokenizer: Box::new(ScriptLexer),
            markdown: Box::new(CmarkParser::default()),
        }
    }

    pub fn with_options(mut self, options: ParseOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_tokenizer(mut self, tokenizer: impl Tokenizer + 'static) -> Self {
        self.tokenizer = Box::new(tokenizer);
        self
    }

    pub fn with_markdown(mut self, markdown: impl MarkdownParser + 'static) -> Self {
        self.markdown = Box::new(markdown);
        self
    }

    /// Tokenize and classify the source without transforming it.
    pub fn classify(&self) -> Result<ClassifiedSource> {
        let unit = self.tokenize()?;
        let blocks = classify::classify_lines(&unit.lines);
        Ok(ClassifiedSource {
            blocks,
            lines: unit.lines,
            diagnostics: unit.diagnostics,
        })
    }

    /// Parse the script into a complete LiterateDocument.
    pub fn parse(&self) -> Result<LiterateDocument> {
        let classified = self.classify()?;
        let (paragraphs, links) = transform::transform_blocks(
            classified.blocks,
            self.markdown.as_ref(),
            self.options.link_merge,
        )?;
        Ok(LiterateDocument {
            paragraphs,
            links,
            diagnostics: classified.diagnostics,
            source: classified.lines,
            source_id: self.file_id,
        })
    }

    fn tokenize(&self) -> Result<TokenizedUnit> {
        let request = SourceRequest {
            file_id: self.file_id,
            source: &self.source,
            defines: &self.options.defines,
            compiler_options: &self.options.compiler_options,
        };
        let mut units = self.tokenizer.tokenize(&request);
        if units.len() != 1 {
            return Err(LiterateError::TokenizerShape { count: units.len() });
        }
        Ok(units.remove(0))
    }
}
