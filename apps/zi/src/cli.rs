//! Command line interface definition

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use zi_types::NetworkUse;

/// zi - Zero Install dependency solver
#[derive(Parser)]
#[command(name = "zi")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Zero Install dependency solver")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Global arguments available for all commands
#[derive(Parser)]
pub struct GlobalArgs {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Use alternate config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Choose implementations for an interface and its dependencies
    Select {
        #[command(flatten)]
        solve: SolveArgs,

        /// Report what changed since an earlier saved selection
        #[arg(long, value_name = "FILE")]
        previous: Option<PathBuf>,

        /// Save the selections as JSON
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Show what would have to be downloaded to run an interface
    Fetch {
        #[command(flatten)]
        solve: SolveArgs,
    },

    /// Show or change settings
    Config {
        /// Setting name (network_use, freshness, help_with_testing)
        name: Option<String>,

        /// New value for the setting
        value: Option<String>,
    },
}

/// Arguments shared by commands that run the solver
#[derive(Args)]
pub struct SolveArgs {
    /// Interface URI to solve for
    pub uri: String,

    /// Catalog of feeds to solve against
    #[arg(long, value_name = "FILE")]
    pub catalog: Option<PathBuf>,

    /// Command the root implementation must provide
    #[arg(long, value_name = "NAME", default_value = "run")]
    pub command: String,

    /// Do not require any command on the root
    #[arg(long)]
    pub no_command: bool,

    /// How much network use is acceptable
    #[arg(long, value_enum, value_name = "MODE")]
    pub network_use: Option<NetworkUse>,

    /// Only select cached implementations (same as --network-use off-line)
    #[arg(long, conflicts_with = "network_use")]
    pub offline: bool,

    /// Rank cached implementations first even with full network use
    #[arg(long)]
    pub prefer_cached: bool,
}

impl SolveArgs {
    /// Command to require on the root, if any
    pub fn root_command(&self) -> Option<&str> {
        (!self.no_command).then_some(self.command.as_str())
    }

    /// Network use requested on the command line
    pub fn network_override(&self) -> Option<NetworkUse> {
        if self.offline {
            Some(NetworkUse::Offline)
        } else {
            self.network_use
        }
    }
}
