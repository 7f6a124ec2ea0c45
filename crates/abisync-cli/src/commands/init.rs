//! Initialize abisync in a Foundry project

use std::path::Path;

use clap::Args;
use color_eyre::eyre::{eyre, Result};
use console::style;

use crate::config::{FoundryConfig, CONFIG_TEMPLATE};

/// Initialize abisync in a Foundry project
#[derive(Args)]
pub struct InitCommand;

impl InitCommand {
    pub async fn run(self, config_path: &Path) -> Result<()> {
        // Check if we're in a Foundry project
        if !FoundryConfig::exists() {
            return Err(eyre!(
                "Not a Foundry project. Please run this command in a directory with foundry.toml"
            ));
        }

        // Check if already initialized
        if config_path.exists() {
            return Err(eyre!(
                "abisync is already initialized in this project ({} exists)",
                config_path.display()
            ));
        }

        std::fs::write(config_path, CONFIG_TEMPLATE)?;
        println!(
            "{} Created {}",
            style("✓").green(),
            config_path.display()
        );

        println!();
        println!("Next steps:");
        println!(
            "  1. Set the registry URL under {}",
            style("[registry]").cyan()
        );
        println!(
            "  2. List your deployment scripts under {}",
            style("[[scripts]]").cyan()
        );
        println!(
            "  3. Run {} to preview, then {}",
            style("abisync scan").cyan(),
            style("abisync push").cyan()
        );

        Ok(())
    }
}
