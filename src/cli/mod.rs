//! Command-line front end.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use flipdeck::stores::Migration;

pub use commands::run;

/// Browse and edit feature flags in a remote flag store
#[derive(Parser, Debug)]
#[command(name = "flipdeck")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Base URL of the flag API (overrides the config file)
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// API key sent with every request (overrides config and FLIPDECK_API_KEY)
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Channel to work in (default: first channel)
    #[arg(short, long, global = true)]
    pub channel: Option<String>,

    /// Feature set to work in (default: first set of the channel)
    #[arg(short, long, global = true)]
    pub set: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Save the endpoint to the config file
    Login {
        /// Also store the API key
        #[arg(long)]
        remember_key: bool,
    },

    /// List channels and their feature sets
    Channels,

    /// Show features and aliases of a feature set
    Show,

    /// Compare two feature sets of the channel
    Diff {
        /// Set for the left side (default: the selected set)
        #[arg(long)]
        a: Option<String>,
        /// Set for the right side (default: the first other set)
        #[arg(long)]
        b: Option<String>,
    },

    /// Copy or remove a feature between two feature sets
    Migrate {
        /// Feature name
        feature: String,
        #[arg(value_enum)]
        direction: Direction,
        #[arg(long)]
        a: Option<String>,
        #[arg(long)]
        b: Option<String>,
    },

    /// Add a feature to the set
    AddFeature { name: String },

    /// Remove a feature from the set
    RmFeature { name: String },

    /// Change a feature's description or rollout
    SetFeature {
        name: String,
        #[arg(long)]
        description: Option<String>,
        /// Fraction of users, between 0 and 1
        #[arg(long)]
        pct: Option<f64>,
    },

    /// Bind an alias to the set
    AddAlias { alias: String },

    /// Remove an alias
    RmAlias { alias: String },

    /// Create a channel with a default feature set
    NewChannel { name: String },

    /// Create a feature set in the channel
    NewSet { name: String },

    /// Delete the selected feature set
    DeleteSet {
        /// Do not ask for confirmation
        #[arg(long)]
        yes: bool,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Copy from A into B
    AToB,
    /// Copy from B into A
    BToA,
    /// Remove from A (must be in both)
    RemoveFromA,
    /// Remove from B (must be in both)
    RemoveFromB,
}

impl From<Direction> for Migration {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::AToB => Migration::MoveAToB,
            Direction::BToA => Migration::MoveBToA,
            Direction::RemoveFromA => Migration::RemoveFromA,
            Direction::RemoveFromB => Migration::RemoveFromB,
        }
    }
}
