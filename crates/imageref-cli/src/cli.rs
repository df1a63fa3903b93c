use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "imageref",
    about = "Parse, normalize, and sort container image references",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Domain assumed for names without one (drops the legacy alias)
    #[arg(long, global = true)]
    pub default_domain: Option<String>,

    /// Tag attached to name-only references
    #[arg(long, global = true)]
    pub default_tag: Option<String>,

    /// TOML file with reference defaults
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Parse references exactly as written
    Parse(RefsArgs),
    /// Expand familiar names to fully qualified ones
    Normalize(RefsArgs),
    /// Normalize and tag name-only references with the default tag
    DockerRef(RefsArgs),
    /// Parse names or bare digests and identifiers
    Any(RefsArgs),
    /// Shorten references to their familiar form
    Familiar(RefsArgs),
    /// Test a reference against a glob pattern
    Match(MatchArgs),
    /// Order references from most to least specific
    Sort(SortArgs),
}

#[derive(Args)]
pub struct RefsArgs {
    #[arg(required = true)]
    pub references: Vec<String>,
}

#[derive(Args)]
pub struct MatchArgs {
    pub pattern: String,
    pub reference: String,
}

#[derive(Args)]
pub struct SortArgs {
    /// References to sort; read one per line from stdin when omitted
    pub references: Vec<String>,
}
