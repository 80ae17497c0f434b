use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum, ValueHint, builder::BoolishValueParser};

/// Command-line arguments for the richdoc binary.
#[derive(Debug, Parser)]
#[command(
    name = "richdoc",
    version,
    about = "Inspect, render and convert stored rich-text documents"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "RICHDOC_CONFIG_FILE",
        value_name = "PATH",
        global = true
    )]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: Overrides,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Print the schema a document uses: block, node or unrecognized.
    Classify(InputArgs),
    /// Render a document to HTML or to its display tree as JSON.
    Render(RenderArgs),
    /// Convert a block document to the node schema.
    Convert(InputArgs),
    /// Print the table of contents.
    Toc(TocArgs),
    /// Print the estimated read time and reading statistics.
    #[command(name = "read-time")]
    ReadTime(InputArgs),
}

impl Command {
    pub fn input(&self) -> &InputArgs {
        match self {
            Command::Classify(input) | Command::Convert(input) | Command::ReadTime(input) => input,
            Command::Render(args) => &args.input,
            Command::Toc(args) => &args.input,
        }
    }
}

#[derive(Debug, Args, Clone, Default)]
pub struct InputArgs {
    /// Document JSON file; `-` or nothing reads stdin.
    #[arg(value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub file: Option<PathBuf>,
}

impl InputArgs {
    /// The file to read, or `None` for stdin.
    pub fn path(&self) -> Option<&PathBuf> {
        self.file.as_ref().filter(|path| path.as_os_str() != "-")
    }
}

#[derive(Debug, Args, Clone)]
pub struct RenderArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Output format.
    #[arg(long, value_enum, default_value_t = RenderFormat::Html)]
    pub format: RenderFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RenderFormat {
    Html,
    Json,
}

#[derive(Debug, Args, Clone)]
pub struct TocArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Nest entries by heading level.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub tree: bool,
}

/// Flags that override file and environment configuration.
#[derive(Debug, Args, Default, Clone)]
pub struct Overrides {
    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub log_json: Option<bool>,

    /// Override the syntax highlighting theme.
    #[arg(long = "theme", value_name = "NAME", global = true)]
    pub theme: Option<String>,

    /// Sanitise block-schema inline markup before rendering.
    #[arg(
        long = "sanitize-inline-html",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub sanitize_inline_html: Option<bool>,

    /// Anchor policy for repeated headings (verbatim|disambiguate).
    #[arg(long = "anchors", value_name = "POLICY", global = true)]
    pub anchors: Option<String>,

    /// Override the reading speed used for read-time estimates.
    #[arg(long = "words-per-minute", value_name = "COUNT", global = true)]
    pub words_per_minute: Option<u32>,
}
