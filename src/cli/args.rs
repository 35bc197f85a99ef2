//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueHint};

use crate::application::ReportFormat;
use crate::domain::DeleteMode;

/// Closure-table tree engine: build trees, query lineages, benchmark the closure table
#[derive(Parser, Debug)]
#[command(name = "closure-tree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug output (-d info, -dd debug, -ddd trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub debug: u8,

    /// Config file (default: ./.closure-tree.toml)
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build trees and time root/descendant/ancestor queries on every node
    Bench(BenchArgs),

    /// Build a tree and print it
    Tree(TreeArgs),

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Overrides for the `[benchmark]` and `[report]` settings.
#[derive(clap::Args, Debug, Default)]
pub struct BenchArgs {
    /// Children per node
    #[arg(short, long)]
    pub branching: Option<usize>,

    /// Depths to benchmark, one configuration each (e.g. -g 2,4,6)
    #[arg(short = 'g', long = "generations", value_delimiter = ',')]
    pub depths: Vec<usize>,

    /// Random branching in MIN..=MAX (e.g. --random 1,4)
    #[arg(long, value_delimiter = ',', value_name = "MIN,MAX")]
    pub random: Option<Vec<usize>>,

    /// Seed for random branching
    #[arg(long, requires = "random")]
    pub seed: Option<u64>,

    /// Deletion mode to time: cascade or promote_children
    #[arg(short = 'm', long)]
    pub delete_mode: Option<DeleteMode>,

    /// Skip timing deletion of the root
    #[arg(long)]
    pub no_delete: bool,

    /// Run configurations in parallel
    #[arg(short, long)]
    pub parallel: bool,

    /// Output format: text or csv
    #[arg(short, long)]
    pub format: Option<ReportFormat>,

    /// Print every per-node sample
    #[arg(long)]
    pub per_node: bool,

    /// Write the report to a file
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub output: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct TreeArgs {
    /// Children per node
    #[arg(short, long, default_value_t = 2)]
    pub branching: usize,

    /// Generations below the root
    #[arg(short = 'g', long = "generations", default_value_t = 2)]
    pub depth: usize,

    /// Delete this node before printing
    #[arg(long)]
    pub delete: Option<u64>,

    /// Deletion mode for --delete
    #[arg(short = 'm', long, default_value = "cascade")]
    pub mode: DeleteMode,

    /// Move a node: NODE,NEW_PARENT (NEW_PARENT 0 detaches as a root)
    #[arg(long = "move", value_delimiter = ',', value_name = "NODE,NEW_PARENT")]
    pub move_to: Option<Vec<u64>>,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Print config template
    Template,

    /// Show config paths
    Path,
}
