//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint};

/// Preference dungeon: play offers against hidden, context-dependent preferences
#[derive(Parser, Debug)]
#[command(name = "prefdungeon")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug output (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub debug: u8,

    /// Directory holding .prefdungeon.toml (default: cwd)
    #[arg(short = 'C', long, global = true, value_hint = ValueHint::DirPath)]
    pub config_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// World file selection shared by the commands that load one.
#[derive(Args, Debug, Clone, Default)]
pub struct WorldArgs {
    /// World file (TOML: templates, categories, preferences)
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub world: Option<PathBuf>,

    /// Separate preferences file; replaces the world's [preferences]
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub preferences: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Play rounds with uniformly drawn offers
    Simulate {
        #[command(flatten)]
        world: WorldArgs,
        /// Seed of the random stream
        #[arg(short, long)]
        seed: Option<u64>,
        /// Number of rounds
        #[arg(short = 'n', long)]
        iterations: Option<usize>,
        /// Print every round
        #[arg(short, long, conflicts_with = "seeds")]
        trace: bool,
        /// Skip the satisfiability check
        #[arg(long)]
        allow_unsatisfiable: bool,
        /// Run one simulation per seed in parallel (overrides --seed)
        #[arg(long, value_delimiter = ',')]
        seeds: Vec<u64>,
        /// Moving-average window for the acceptance curve
        #[arg(long, conflicts_with = "seeds")]
        window: Option<usize>,
    },

    /// Check that every context can satisfy some preference
    Validate {
        #[command(flatten)]
        world: WorldArgs,
    },

    /// Show the context combination tree
    Tree {
        #[command(flatten)]
        world: WorldArgs,
        /// Remove these context items before rendering
        #[arg(long, num_args = 1..)]
        prune: Vec<String>,
    },

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

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Print a config template
    Template,

    /// Show config paths
    Path,
}
