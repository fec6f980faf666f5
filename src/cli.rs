use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "converge")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Converge nodes to the state declared in their bundles", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Inventory file (default: <config dir>/converge/inventory.toml)
    #[arg(short, long, global = true, env = "CONVERGE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Fix every incorrect item on the selected nodes
    Apply(ApplyArgs),

    /// Show which items are incorrect and what apply would change
    Verify(NodeSelection),

    /// Load the inventory and check every item and bundle
    Test(NodeSelection),

    /// List nodes and their bundles
    Nodes,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args)]
pub struct NodeSelection {
    /// Nodes to act on (default: all)
    pub nodes: Vec<String>,
}

#[derive(Args)]
pub struct ApplyArgs {
    /// Nodes to apply (default: all)
    pub nodes: Vec<String>,

    /// Ask before fixing each item
    #[arg(short, long)]
    pub interactive: bool,

    /// Number of nodes to apply in parallel
    #[arg(short, long, default_value = "4")]
    pub jobs: usize,

    /// Print the per-item results as JSON
    #[arg(long)]
    pub json: bool,
}
