// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "slotswap")]
#[command(about = "Blue/green deployments with approval gates for Docker and Podman")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print the final result
    #[arg(short, long, global = true, conflicts_with = "json")]
    pub quiet: bool,

    /// Emit JSON lines instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new slotswap.yml configuration file
    Init {
        /// Service name
        #[arg(long)]
        service: Option<String>,

        /// Image reference (registry/name:tag)
        #[arg(long)]
        image: Option<String>,

        /// Overwrite an existing configuration
        #[arg(long)]
        force: bool,
    },

    /// Deploy a new release into the inactive slot and promote it
    Deploy {
        /// Target destination (defined in config)
        #[arg(short, long)]
        destination: Option<String>,

        /// Deploy this image instead of the configured one
        #[arg(long, conflicts_with = "tag")]
        image: Option<String>,

        /// Deploy this tag of the configured image
        #[arg(long)]
        tag: Option<String>,

        /// Approve both gates without prompting
        #[arg(short, long)]
        yes: bool,

        /// Break an existing deploy lock
        #[arg(long)]
        force: bool,
    },

    /// Show which slot is live
    Status {
        /// Target destination (defined in config)
        #[arg(short, long)]
        destination: Option<String>,
    },
}
