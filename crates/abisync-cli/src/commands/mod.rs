//! CLI commands for abisync

use std::path::Path;

use clap::Subcommand;
use color_eyre::eyre::Result;

pub mod hash;
pub mod init;
pub mod push;
pub mod scan;

/// All available CLI commands
#[derive(Subcommand)]
pub enum Command {
    /// Create an abisync.toml in a Foundry project
    Init(init::InitCommand),

    /// Show what would be published from broadcast output, without loading artifacts
    Scan(scan::ScanCommand),

    /// Resolve deployments and push their ABIs to the registry
    Push(push::PushCommand),

    /// Print the content hash of a compiled contract's ABI
    Hash(hash::HashCommand),
}

impl Command {
    /// Execute the command
    pub async fn run(self, config_path: &Path) -> Result<()> {
        match self {
            Command::Init(cmd) => cmd.run(config_path).await,
            Command::Scan(cmd) => cmd.run(config_path).await,
            Command::Push(cmd) => cmd.run(config_path).await,
            Command::Hash(cmd) => cmd.run(config_path).await,
        }
    }
}
