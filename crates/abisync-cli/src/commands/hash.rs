//! Print the content hash of a compiled ABI

use std::path::Path;

use clap::Args;
use color_eyre::eyre::Result;

use crate::config::AbiSyncConfig;
use crate::forge::{ArtifactLoader, FileSystemArtifactLoader};

/// Print the content hash of a compiled contract's ABI
#[derive(Args)]
pub struct HashCommand {
    /// Contract name, as in out/<Name>.sol/<Name>.json
    pub contract: String,

    /// Interface facets to merge into the ABI, in order
    #[arg(long = "interface")]
    pub interfaces: Vec<String>,
}

impl HashCommand {
    pub async fn run(self, config_path: &Path) -> Result<()> {
        // Works without abisync.toml, using forge defaults
        let config = if config_path.exists() {
            AbiSyncConfig::load_from(config_path)?
        } else {
            AbiSyncConfig::default()
        };

        let paths = config.forge.paths()?;
        let loader = FileSystemArtifactLoader::with_out_dir(paths.out_dir);
        let abi = loader.load_merged(&self.contract, &self.interfaces)?;

        // Just print the hash for easy scripting
        println!("{}", abi.content_hash());
        Ok(())
    }
}
