use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ssoplan")]
#[command(version)]
#[command(about = "Plan AWS IAM Identity Center users, groups and permission sets", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Build the resource graph and print or export it
    Plan(PlanArgs),

    /// Check the configuration without exporting anything
    Validate(SourceArgs),

    /// Show the apply waves the engine will follow
    Order(OrderArgs),

    /// Compare a new plan with a previously exported one
    Diff(DiffArgs),

    /// Add an existing identity-store user to an existing group
    AddMember(AddMemberArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Colored, grouped by resource type
    #[default]
    Text,
    /// Graph hand-off JSON
    Json,
}

// ============================================================================
// Shared arguments
// ============================================================================

#[derive(Parser)]
pub struct SourceArgs {
    /// Configuration file (.toml, .json, .yaml); defaults to config.toml in
    /// the config directory
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Target AWS account id (overrides account_id in the config)
    #[arg(long, env = "AWS_ACCOUNT_ID")]
    pub account_id: Option<String>,
}

// ============================================================================
// Plan / Order / Diff
// ============================================================================

#[derive(Parser)]
pub struct PlanArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Only show matching resources: type (users, groups, iam...) or type.name
    #[arg(short, long)]
    pub target: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Write the graph JSON to a file instead of stdout
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

#[derive(Parser)]
pub struct OrderArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Only show matching resources
    #[arg(short, long)]
    pub target: Option<String>,
}

#[derive(Parser)]
pub struct DiffArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Graph JSON from an earlier `ssoplan plan --format json`
    #[arg(long)]
    pub previous: PathBuf,

    /// Only compare matching resources
    #[arg(short, long)]
    pub target: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

// ============================================================================
// Add member
// ============================================================================

#[derive(Parser)]
pub struct AddMemberArgs {
    /// Identity-store user name
    #[arg(long)]
    pub user: String,

    /// Identity-store group display name
    #[arg(long)]
    pub group: String,

    /// Identity store id (looked up via sso-admin when omitted)
    #[arg(long)]
    pub identity_store_id: Option<String>,

    /// AWS CLI profile
    #[arg(long, env = "AWS_PROFILE")]
    pub profile: Option<String>,

    /// AWS region
    #[arg(long, env = "AWS_REGION")]
    pub region: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Write the graph JSON to a file instead of stdout
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}
