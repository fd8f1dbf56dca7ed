//! Clap derive structures for the `brewdesk` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// brewdesk -- command-line client for the brewdesk admin API
#[derive(Debug, Parser)]
#[command(
    name = "brewdesk",
    version,
    about = "Administer the brewdesk coffee-shop platform from the command line",
    long_about = "Runs admin API operations (users, cafes, plans, bans, logs, ...) by name.\n\n\
        Queries are cached and deduplicated, mutations invalidate the cached\n\
        results they affect, and expired sessions are refreshed transparently.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Backend profile to use
    #[arg(long, short = 'p', env = "BREWDESK_PROFILE", global = true)]
    pub profile: Option<String>,

    /// API base URL (overrides profile)
    #[arg(long, env = "BREWDESK_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Operator email (overrides profile)
    #[arg(long, short = 'e', env = "BREWDESK_EMAIL", global = true)]
    pub email: Option<String>,

    /// Existing access token; skips the login call
    #[arg(long, env = "BREWDESK_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "BREWDESK_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept invalid TLS certificates
    #[arg(long, short = 'k', env = "BREWDESK_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "BREWDESK_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a query operation (e.g. users.list)
    #[command(alias = "q", alias = "get")]
    Query(OperationArgs),

    /// Run a mutation operation (e.g. logs.delete)
    #[command(alias = "m")]
    Mutate(OperationArgs),

    /// List operations and the tags they provide or invalidate
    #[command(alias = "ops")]
    Operations(OperationsArgs),

    /// Log in and show the decoded session identity
    Whoami,

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Operation invocation ─────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct OperationArgs {
    /// Operation name, `<resource>.<action>`
    pub operation: String,

    /// Argument as key=value (repeatable). Values that parse as JSON are
    /// sent as JSON, anything else as a string.
    #[arg(long = "arg", short = 'a', value_name = "KEY=VALUE")]
    pub args: Vec<String>,

    /// Arguments as a JSON object (merged under --arg)
    #[arg(long, value_name = "JSON", conflicts_with = "from_file")]
    pub args_json: Option<String>,

    /// Read arguments from a JSON file
    #[arg(long, short = 'F', value_name = "PATH")]
    pub from_file: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct OperationsArgs {
    /// Only operations touching this tag
    #[arg(long, short = 't')]
    pub tag: Option<String>,

    /// Only queries or only mutations
    #[arg(long, value_enum)]
    pub kind: Option<KindFilter>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindFilter {
    Query,
    Mutation,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Interactive configuration wizard
    Init,
    /// Show the current configuration (secrets masked)
    Show,
    /// Print the config file path
    Path,
    /// Set the default profile
    Use {
        /// Profile name
        name: String,
    },
    /// Store a profile's password in the system keyring
    SetPassword,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
