//! Read-only discovery of what would be published

use std::path::Path;

use clap::Args;
use color_eyre::eyre::{eyre, Result};
use console::style;

use crate::config::AbiSyncConfig;
use crate::resolve::{Resolver, TraceInspection};

/// Show what would be published from broadcast output
#[derive(Args)]
pub struct ScanCommand {
    /// Only scan these scripts (defaults to all configured scripts)
    #[arg(long = "script")]
    pub scripts: Vec<String>,
}

impl ScanCommand {
    pub async fn run(self, config_path: &Path) -> Result<()> {
        let config = AbiSyncConfig::load_from(config_path)?;
        let scripts = config.select_scripts(&self.scripts);

        if scripts.is_empty() {
            return Err(eyre!(
                "No scripts configured. Add a [[scripts]] entry to {} or pass --script.",
                config_path.display()
            ));
        }

        let resolver = Resolver::from_settings(&config.forge)?;
        let mut total_candidates = 0;

        for script in &scripts {
            println!(
                "{} Scanning {}...",
                style("->").blue(),
                style(&script.name).cyan()
            );

            let reports = resolver.inspect_script(script)?;
            if reports.is_empty() {
                println!("   {} No trace files found", style("!").yellow());
                continue;
            }

            for report in &reports {
                let path = report.file.path.display();
                match &report.inspection {
                    TraceInspection::Excluded(chain_id) => {
                        println!(
                            "   {} {} skipped (excluded chain {})",
                            style("-").dim(),
                            style(path).dim(),
                            chain_id
                        );
                    }
                    TraceInspection::Unreadable(e) => {
                        println!("   {} Failed to parse {}: {}", style("!").yellow(), path, e);
                    }
                    TraceInspection::Planned { chain_id, plan } => {
                        println!(
                            "   {} {} (chain ID: {})",
                            style("*").dim(),
                            style(chain_id.network_name()).cyan(),
                            chain_id
                        );

                        for mapping in &plan.mappings {
                            println!(
                                "     {} proxy {} -> {} (tx #{})",
                                style("~").dim(),
                                style(&mapping.proxy_address).yellow(),
                                style(&mapping.implementation_name).cyan(),
                                mapping.deployment_index
                            );
                        }

                        if plan.candidates.is_empty() {
                            println!("     No contracts to publish");
                        }

                        for candidate in &plan.candidates {
                            let source = match &candidate.proxy {
                                Some(spec) if spec.interfaces.is_empty() => {
                                    format!(" (ABI from {})", spec.implementation)
                                }
                                Some(spec) => format!(
                                    " (ABI from {} + {})",
                                    spec.implementation,
                                    spec.interfaces.join(", ")
                                ),
                                None => String::new(),
                            };
                            println!(
                                "     {} {} at {}{}",
                                style("+").green(),
                                style(&candidate.name).cyan(),
                                style(&candidate.address).yellow(),
                                style(source).dim()
                            );
                        }
                        total_candidates += plan.candidates.len();
                    }
                }
            }
        }

        println!();
        println!(
            "{} {} contract(s) would be published",
            style("*").green().bold(),
            total_candidates
        );

        Ok(())
    }
}
