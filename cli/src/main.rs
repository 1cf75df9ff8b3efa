mod config;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use codespan_reporting::diagnostic::Diagnostic;
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};

use litscript::block::Block;
use litscript::document::LinkMergePolicy;
use litscript::{LiterateDocument, ParseOptions};

#[derive(Parser)]
#[command(name = "litscript", version, about = "Literate script parser")]
struct Cli {
    /// Disable colored error output
    #[arg(long, global = true)]
    no_color: bool,

    /// TOML config file (defaults to litscript.toml beside the script)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Conditional-compilation symbol. Repeatable.
    #[arg(short = 'D', long = "define", global = true)]
    defines: Vec<String>,

    /// Which definition wins when a link key is defined twice
    #[arg(long, global = true, value_enum)]
    link_merge: Option<MergeArg>,

    /// Log more (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse a script and report diagnostics
    Check(FileArgs),

    /// Dump the parsed document
    Ast(FileArgs),

    /// List the classified blocks
    Blocks(FileArgs),

    /// List the merged link table
    Links(FileArgs),
}

#[derive(clap::Args)]
struct FileArgs {
    /// Script file to parse
    file: PathBuf,
}

#[derive(Clone, Copy, ValueEnum)]
enum MergeArg {
    FirstWins,
    LastWins,
}

impl From<MergeArg> for LinkMergePolicy {
    fn from(arg: MergeArg) -> Self {
        match arg {
            MergeArg::FirstWins => LinkMergePolicy::FirstWins,
            MergeArg::LastWins => LinkMergePolicy::LastWins,
        }
    }
}

/// A loaded script registered with the codespan file database.
struct Session {
    files: SimpleFiles<String, String>,
    parser: litscript::Parser,
    file_id: usize,
    writer: StandardStream,
}

impl Session {
    fn emit(&self, diagnostic: &Diagnostic<usize>) {
        let config = term::Config::default();
        let _ = term::emit_to_write_style(&mut self.writer.lock(), &config, &self.files, diagnostic);
    }

    fn parse_or_exit(&self) -> LiterateDocument {
        match self.parser.parse() {
            Ok(doc) => doc,
            Err(error) => {
                self.emit(&error.to_diagnostic(self.file_id));
                process::exit(1);
            }
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let (Command::Check(args) | Command::Ast(args) | Command::Blocks(args) | Command::Links(args)) =
        &cli.command;
    let session = open_session(&cli, args);

    match cli.command {
        Command::Check(args) => do_check(&session, &args),
        Command::Ast(_) => {
            let doc = session.parse_or_exit();
            println!("{:#?}", doc.paragraphs);
        }
        Command::Blocks(_) => do_blocks(&session),
        Command::Links(_) => {
            let doc = session.parse_or_exit();
            for (key, def) in doc.links.iter() {
                match &def.title {
                    Some(title) => println!("[{}]: {} \"{}\"", key, def.url, title),
                    None => println!("[{}]: {}", key, def.url),
                }
            }
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn open_session(cli: &Cli, args: &FileArgs) -> Session {
    let color_choice = if cli.no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };

    let options = match config::load_options(cli.config.as_deref(), &args.file) {
        Ok(options) => apply_overrides(options, cli),
        Err(message) => {
            eprintln!("error: {}", message);
            process::exit(1);
        }
    };

    let source = match std::fs::read_to_string(&args.file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: cannot read '{}': {}", args.file.display(), e);
            process::exit(1);
        }
    };

    // Set up codespan file database
    let mut files = SimpleFiles::new();
    let file_id = files.add(args.file.display().to_string(), source.clone());
    let parser = litscript::Parser::new(source, file_id).with_options(options);

    Session {
        files,
        parser,
        file_id,
        writer: StandardStream::stderr(color_choice),
    }
}

fn apply_overrides(mut options: ParseOptions, cli: &Cli) -> ParseOptions {
    options.defines.extend(cli.defines.iter().cloned());
    if let Some(merge) = cli.link_merge {
        options.link_merge = merge.into();
    }
    options
}

fn do_check(session: &Session, args: &FileArgs) {
    let doc = session.parse_or_exit();
    for diagnostic in &doc.diagnostics {
        session.emit(&diagnostic.to_diagnostic());
    }
    for name in doc.unresolved_references() {
        log::warn!("`include` of `{}` has no matching `define`", name);
    }
    for key in doc.unresolved_links() {
        log::warn!("link [{}] is not defined in any documentation comment", key);
    }
    if doc.has_errors() {
        process::exit(1);
    }

    let count = |kind: &str| doc.paragraphs.iter().filter(|p| p.kind() == kind).count();
    eprintln!(
        "ok: {} parsed successfully ({} prose, {} code, {} hidden, {} references, {} links)",
        args.file.display(),
        count("markdown"),
        count("formatted-code"),
        count("hidden-code"),
        count("code-reference"),
        doc.links.len(),
    );
}

fn do_blocks(session: &Session) {
    let classified = match session.parser.classify() {
        Ok(c) => c,
        Err(error) => {
            session.emit(&error.to_diagnostic(session.file_id));
            process::exit(1);
        }
    };
    for diagnostic in &classified.diagnostics {
        session.emit(&diagnostic.to_diagnostic());
    }

    for block in &classified.blocks {
        match block {
            Block::Comment(text) => {
                let first = text.lines().map(str::trim).find(|l| !l.is_empty()).unwrap_or("");
                println!("{:<8} {}", block.kind(), first);
            }
            Block::Snippet(lines) => {
                let first = lines.first().map_or(0, |l| l.number);
                let last = lines.last().map_or(0, |l| l.number);
                println!("{:<8} lines {}-{}", block.kind(), first, last);
            }
            Block::Command(directive) => {
                println!("{:<8} {}", block.kind(), directive.pairs().join(", "));
            }
        }
    }
}
