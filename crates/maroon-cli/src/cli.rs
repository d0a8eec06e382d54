use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "maroon",
    about = "maroon: automatic per-file version timelines",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Directory holding all repositories (overrides config and MAROON_REPOS)
    #[arg(long, global = true)]
    pub repos: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start tracking a file with its current content
    Init(FileArgs),
    /// Record the file's current content as a save
    Save(FileArgs),
    /// Open a file: track it, or reconcile it with its history
    Open(FileArgs),
    /// Show a file's timeline
    Log(LogArgs),
    /// Print a recorded version
    Show(VersionArgs),
    /// Restore a recorded version into the file and make it the head
    Checkout(VersionArgs),
    /// Copy a file's history to another path
    Cp(PairArgs),
    /// Move a file together with its history
    Mv(PairArgs),
    /// Delete a file's history
    Rm(FileArgs),
    /// Discard a file's history and start over from its current content
    Rebuild(FileArgs),
    /// Print the identity recorded in a file's repository
    Key(FileArgs),
    /// List tracked files
    List,
    /// Check a repository's index and objects
    Verify(FileArgs),
    /// Print the content hash of a file
    Hash(FileArgs),
}

#[derive(Args)]
pub struct FileArgs {
    pub file: PathBuf,
}

#[derive(Args)]
pub struct LogArgs {
    pub file: PathBuf,
    /// Print full hashes
    #[arg(long)]
    pub full: bool,
}

#[derive(Args)]
pub struct VersionArgs {
    pub file: PathBuf,
    /// Full hash or unique prefix
    pub version: String,
}

#[derive(Args)]
pub struct PairArgs {
    pub from: PathBuf,
    pub to: PathBuf,
}
