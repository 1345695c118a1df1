use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "linestore")]
#[command(about = "Inspect and maintain line-based history files", long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to $LINESTORE_CONFIG or config/linestore.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Override an integer setting before running, e.g. `completion.history_length=50`
    #[arg(long = "set", value_name = "SECTION.OPTION=VALUE", global = true)]
    pub overrides: Vec<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List configured files with their resolved path and limit
    Files,
    /// Print the stored lines of a file
    Show(ShowArgs),
    /// Append lines to a file and save it
    Append(AppendArgs),
    /// Remove every line from a file
    Clear(FileArgs),
    /// Rewrite a file, dropping lines beyond its retention limit
    Prune(FileArgs),
    /// Print the effective configuration as TOML
    Config,
}

#[derive(clap::Args, Debug)]
pub struct FileArgs {
    /// Name of the file under [files] in the configuration
    pub file: String,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Name of the file under [files] in the configuration
    pub file: String,

    /// Print lines as a JSON array
    #[arg(long)]
    pub json: bool,
}

#[derive(clap::Args, Debug)]
pub struct AppendArgs {
    /// Name of the file under [files] in the configuration
    pub file: String,

    /// Lines to append, oldest first
    #[arg(required = true)]
    pub lines: Vec<String>,
}
