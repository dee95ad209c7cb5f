use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::filter::LevelFilter;

/// Log level options for CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// No logging output
    Off,
    /// Error messages only
    Error,
    /// Warnings and errors
    Warn,
    /// Informational messages
    Info,
    /// Debug messages (default for verbose)
    Debug,
    /// Trace-level messages, including expanded query text
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

#[derive(Parser)]
#[command(name = "opl")]
#[command(about = "opl - render query templates and run them against a SPARQL endpoint")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Set log level (off, error, warn, info, debug, trace)
    /// If not specified, uses config file value or defaults to 'warn'
    #[arg(short = 'l', long, global = true, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Enable verbose logging (shortcut for --log-level=debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path (defaults to ~/.config/opl/config.toml)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// SPARQL endpoint URL (overrides config file)
    #[arg(short, long, global = true)]
    pub endpoint: Option<String>,
}

impl Cli {
    /// Log filter directive from the flags, falling back to the config value.
    pub fn log_directive(&self, configured: Option<&str>) -> String {
        if let Some(level) = self.log_level {
            return LevelFilter::from(level).to_string().to_lowercase();
        }
        if self.verbose {
            return LevelFilter::DEBUG.to_string().to_lowercase();
        }
        configured.unwrap_or("warn").to_string()
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the final query text produced from a template
    Render(TemplateArgs),

    /// Run a SELECT template and print the result rows
    Select {
        #[command(flatten)]
        template: TemplateArgs,

        /// Output format
        #[arg(short, long, value_enum, default_value = "json")]
        format: OutputFormat,

        /// Column labels for HTML output, as id=label (repeatable)
        #[arg(long = "label", value_parser = parse_key_value)]
        labels: Vec<(String, String)>,
    },

    /// Run a CONSTRUCT template and print the resulting Turtle
    Construct(TemplateArgs),

    /// Print normalised graph-pattern definitions
    Patterns {
        /// Pattern group to print
        #[arg(short, long, default_value = "basic")]
        group: String,
    },
}

/// Template source and substitution values shared by the query commands
#[derive(Args, Debug, Clone)]
pub struct TemplateArgs {
    /// Template file, or '-' to read from stdin
    pub template: PathBuf,

    /// IRI variable as name=iri, replacing <$name> (repeatable)
    #[arg(long = "var", value_parser = parse_key_value)]
    pub vars: Vec<(String, String)>,

    /// Injection as name=text, replacing '#@inject $name' lines (repeatable)
    #[arg(long = "inject", value_parser = parse_key_value)]
    pub injections: Vec<(String, String)>,

    /// Fail on undefined, unterminated or duplicate mixins
    #[arg(long)]
    pub strict: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// SPARQL JSON binding objects
    Json,
    /// HTML table
    Html,
}

/// Parse `key=value`, splitting on the first `=`.
pub fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected name=value, got '{s}'")),
    }
}
