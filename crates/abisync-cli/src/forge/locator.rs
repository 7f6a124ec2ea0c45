//! Trace file discovery
//!
//! Forge writes broadcast files either flat (`broadcast/<script>/<file>`) or
//! one folder per chain (`broadcast/<script>/<chainId>/<file>`).

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use abisync_core::{ChainId, Error, Result};
use tracing::debug;

/// Trace file name forge writes for the most recent run
pub const DEFAULT_TRACE_FILE: &str = "run-latest.json";

/// A discovered trace file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceFile {
    pub path: PathBuf,
    /// Chain ID from the folder name, for the per-chain layout
    pub chain_dir: Option<ChainId>,
}

/// Finds every chain's trace file for a deployment script
#[derive(Debug, Clone)]
pub struct TraceLocator {
    /// Directory containing broadcast outputs (typically "broadcast")
    broadcast_dir: PathBuf,
    file_name: String,
    excluded_chains: Vec<ChainId>,
}

impl TraceLocator {
    /// Create a locator over `broadcast_dir` using the default file name and
    /// no excluded chains
    pub fn new(broadcast_dir: impl Into<PathBuf>) -> Self {
        Self {
            broadcast_dir: broadcast_dir.into(),
            file_name: DEFAULT_TRACE_FILE.to_string(),
            excluded_chains: Vec::new(),
        }
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }

    /// Never discover traces for these chains
    pub fn excluding(mut self, chains: impl IntoIterator<Item = ChainId>) -> Self {
        self.excluded_chains = chains.into_iter().collect();
        self
    }

    pub fn is_excluded(&self, chain_id: ChainId) -> bool {
        self.excluded_chains.contains(&chain_id)
    }

    /// Locate trace files for `script`.
    ///
    /// A flat trace file wins outright; per-chain folders are only searched
    /// when it is absent. Results follow directory listing order. A missing
    /// broadcast or script directory yields an empty list.
    pub fn locate(&self, script: &str) -> Result<Vec<TraceFile>> {
        let script_dir = self.broadcast_dir.join(script_dir_name(script));

        let flat = script_dir.join(&self.file_name);
        if flat.is_file() {
            debug!(path = %flat.display(), "found flat trace file");
            return Ok(vec![TraceFile {
                path: flat,
                chain_dir: None,
            }]);
        }

        let entries = match std::fs::read_dir(&script_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %script_dir.display(), "script directory not found");
                return Ok(Vec::new());
            }
            Err(e) => return Err(Error::io(script_dir.display().to_string(), e)),
        };

        let mut files = Vec::new();

        for entry in entries {
            let entry = entry.map_err(|e| Error::io(script_dir.display().to_string(), e))?;
            let path = entry.path();

            if !path.is_dir() {
                continue;
            }

            let chain_id = match path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(parse_chain_dir)
            {
                Some(id) => id,
                None => continue,
            };

            if self.is_excluded(chain_id) {
                debug!(chain_id = %chain_id, "skipping excluded chain");
                continue;
            }

            let trace = path.join(&self.file_name);
            if trace.is_file() {
                files.push(TraceFile {
                    path: trace,
                    chain_dir: Some(chain_id),
                });
            }
        }

        Ok(files)
    }
}

/// Broadcast folder name for a script reference.
///
/// Strips a `:ContractName` suffix and leading directories, e.g.
/// `script/Deploy.s.sol:Deploy` -> `Deploy.s.sol`.
pub fn script_dir_name(script: &str) -> &str {
    let script_file = script.split(':').next().unwrap_or(script);
    Path::new(script_file)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(script_file)
}

fn parse_chain_dir(name: &str) -> Option<ChainId> {
    if name.is_empty() || !name.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    name.parse::<u64>().ok().map(ChainId)
}
