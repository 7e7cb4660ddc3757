//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

/// Multiplier/follower referral hierarchies: campaign forests, team summaries and positioned graphs
#[derive(Parser, Debug)]
#[command(name = "teamtree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Directory with campaign export files
    #[arg(short = 'D', long, global = true, env = "TEAMTREE_DATA_DIR", value_hint = ValueHint::DirPath)]
    pub data_dir: Option<PathBuf>,

    /// Participant id to leave out of every hierarchy
    #[arg(short = 'x', long, global = true)]
    pub exclude: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Campaign filter shared by the hierarchy commands.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct CampaignArgs {
    /// Campaign id to include (repeatable, default: all campaigns)
    #[arg(short, long = "campaign")]
    pub campaigns: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List campaigns in the data directory
    Campaigns,

    /// Show the multiplier hierarchy as a tree
    Tree {
        #[command(flatten)]
        selection: CampaignArgs,
    },

    /// Emit the positioned node/edge graph as JSON
    Graph {
        #[command(flatten)]
        selection: CampaignArgs,
        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,
    },

    /// Show every root-to-leaf multiplier chain
    Branches {
        #[command(flatten)]
        selection: CampaignArgs,
    },

    /// Show team figures for the selection
    Stats {
        #[command(flatten)]
        selection: CampaignArgs,
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
    /// Show effective configuration
    Show,
    /// Print a commented config template
    Template,
    /// Write the template to the global config location
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Show config file locations
    Path,
}
