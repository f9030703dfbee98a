use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "stowage",
    about = "Stowage: content store and task ledger",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Store root directory (overrides the config file)
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Identifier scheme for new content (overrides the config file)
    #[arg(long, global = true, value_enum)]
    pub scheme: Option<SchemeArg>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum SchemeArg {
    Blake3,
    Random,
}

#[derive(Subcommand)]
pub enum Command {
    /// Add, read, list, and delete content
    Content(ContentArgs),
    /// Create, inspect, update, and list tasks
    Task(TaskArgs),
    /// Show content size and count
    Stats,
    /// Delete all content and tasks
    Clear(ClearArgs),
}

#[derive(Args)]
pub struct ContentArgs {
    #[command(subcommand)]
    pub action: ContentAction,
}

#[derive(Subcommand)]
pub enum ContentAction {
    /// Store text or a file and print its CID
    Add {
        #[arg(conflicts_with = "file", required_unless_present = "file")]
        text: Option<String>,
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Print the content behind a CID
    Get { cid: String },
    /// List stored CIDs
    List {
        #[arg(long)]
        prefix: Option<String>,
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Delete a CID
    Delete { cid: String },
    /// Check whether a CID is present
    Exists { cid: String },
}

#[derive(Args)]
pub struct TaskArgs {
    #[command(subcommand)]
    pub action: TaskAction,
}

#[derive(Subcommand)]
pub enum TaskAction {
    /// Store a new task (status defaults to "pending")
    Create {
        id: String,
        #[command(flatten)]
        fields: TaskFields,
    },
    /// Show one task
    Get { id: String },
    /// Merge fields into an existing task
    Update {
        id: String,
        #[command(flatten)]
        fields: TaskFields,
    },
    /// List tasks matching every given filter
    List {
        #[arg(long)]
        status: Option<String>,
        #[arg(long = "type")]
        kind: Option<String>,
        #[arg(long)]
        priority: Option<String>,
    },
}

#[derive(Args, Default)]
pub struct TaskFields {
    #[arg(long)]
    pub status: Option<String>,
    #[arg(long = "type")]
    pub kind: Option<String>,
    /// Integer level or label
    #[arg(long)]
    pub priority: Option<String>,
    /// Extra field; VALUE is parsed as JSON, falling back to a string
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub set: Vec<String>,
}

#[derive(Args)]
pub struct ClearArgs {
    /// Confirm deletion of everything in the store
    #[arg(long)]
    pub yes: bool,
}
