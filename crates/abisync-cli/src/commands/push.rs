//! Resolve deployments and push their ABIs to the registry

use std::path::Path;

use clap::Args;
use color_eyre::eyre::{eyre, Result};
use console::style;
use dialoguer::Confirm;

use abisync_core::PublishRecord;

use crate::config::AbiSyncConfig;
use crate::publish::publish_all;
use crate::registry::HttpRegistry;
use crate::resolve::{Resolution, Resolver};

/// Resolve deployments and push their ABIs to the registry
#[derive(Args)]
pub struct PushCommand {
    /// Only process these scripts (defaults to all configured scripts)
    #[arg(long = "script")]
    pub scripts: Vec<String>,

    /// Free-text label attached to every record
    #[arg(long)]
    pub label: Option<String>,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Resolve and print records without pushing
    #[arg(long)]
    pub dry_run: bool,

    /// Print resolved records as JSON
    #[arg(long)]
    pub json: bool,

    /// Exit with an error when there is nothing to publish
    #[arg(long)]
    pub fail_on_empty: bool,
}

impl PushCommand {
    pub async fn run(self, config_path: &Path) -> Result<()> {
        let config = AbiSyncConfig::load_from(config_path)?;
        let scripts = config.select_scripts(&self.scripts);

        if scripts.is_empty() {
            return Err(eyre!(
                "No scripts configured. Add a [[scripts]] entry to {} or pass --script.",
                config_path.display()
            ));
        }

        let resolver = Resolver::from_settings(&config.forge)?.with_label(self.label.clone());

        if !self.json {
            println!(
                "{} Resolving {} script(s)...",
                style("->").blue(),
                style(scripts.len()).cyan()
            );
        }

        let records = match resolver.resolve(&scripts)? {
            Resolution::Ready(records) => records,
            Resolution::NothingToPublish => {
                if self.fail_on_empty {
                    return Err(eyre!("Nothing to publish"));
                }
                if self.json {
                    // Keep stdout parseable
                    println!("{}", records_json(&[])?);
                    eprintln!("{} Nothing to publish", style("!").yellow());
                } else {
                    println!("{} Nothing to publish", style("!").yellow());
                }
                return Ok(());
            }
        };

        if self.json {
            println!("{}", records_json(&records)?);
        } else {
            print_records(&records);
        }

        if self.dry_run {
            if !self.json {
                println!();
                println!(
                    "{} Dry run complete. Run without {} to push.",
                    style("ℹ").blue(),
                    style("--dry-run").yellow()
                );
            }
            return Ok(());
        }

        let endpoint = config.registry()?;

        if !self.yes {
            let confirmed = Confirm::new()
                .with_prompt(format!(
                    "Push {} record(s) to {}?",
                    records.len(),
                    endpoint.url
                ))
                .default(false)
                .interact()?;

            if !confirmed {
                println!("{} Aborted, nothing pushed", style("!").yellow());
                return Ok(());
            }
        }

        let registry = HttpRegistry::new(&endpoint);
        let summary = publish_all(&registry, &records, |record, outcome| {
            if outcome.is_duplicate {
                println!(
                    "   {} {} on {} unchanged (id: {})",
                    style("-").dim(),
                    style(&record.contract_name).dim(),
                    record.network,
                    outcome.record_id
                );
            } else {
                println!(
                    "   {} {} on {} (id: {})",
                    style("+").green(),
                    style(&record.contract_name).cyan(),
                    style(&record.network).cyan(),
                    outcome.record_id
                );
            }
        })
        .await?;

        println!();
        if summary.created > 0 {
            println!(
                "{} Published {} new ABI version(s)",
                style("*").green().bold(),
                summary.created
            );
        }
        if summary.duplicates > 0 {
            println!(
                "{} Skipped {} unchanged ABI(s)",
                style("*").dim(),
                summary.duplicates
            );
        }

        Ok(())
    }
}

/// JSON document printed by `--json`
fn records_json(records: &[PublishRecord]) -> Result<String> {
    Ok(serde_json::to_string_pretty(records)?)
}

fn print_records(records: &[PublishRecord]) {
    println!();
    println!(
        "{:<24} {:<16} {:<44} {:<14}",
        "Contract", "Network", "Address", "ABI Hash"
    );
    println!("{}", "-".repeat(100));

    for record in records {
        println!(
            "{:<24} {:<16} {:<44} {:<14}",
            record.contract_name,
            record.network,
            record.address,
            &record.abi_hash[..14.min(record.abi_hash.len())]
        );
    }

    println!();
    println!("Total: {} record(s)", records.len());
}
