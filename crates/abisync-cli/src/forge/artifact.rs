//! Artifact loading trait and filesystem implementation

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use abisync_core::{Abi, Error, Result};
use tracing::debug;

use super::types::ContractArtifact;

/// Compiler metadata folder inside the out directory, never an artifact source
const BUILD_INFO_DIR: &str = "build-info";

// =============================================================================
// Trait Definition
// =============================================================================

/// Trait for loading contract ABIs from compiled artifacts
pub trait ArtifactLoader: Send + Sync {
    /// Load the ABI of a single contract
    fn load_abi(&self, contract_name: &str) -> Result<Abi>;

    /// Load an implementation's ABI merged with its interface facets.
    ///
    /// The implementation is loaded first, then each interface in order.
    fn load_merged(&self, implementation: &str, interfaces: &[String]) -> Result<Abi> {
        let base = self.load_abi(implementation)?;
        if interfaces.is_empty() {
            return Ok(base);
        }

        let facets = interfaces
            .iter()
            .map(|name| self.load_abi(name))
            .collect::<Result<Vec<_>>>()?;

        Ok(base.merge(&facets))
    }
}

// =============================================================================
// Filesystem Implementation
// =============================================================================

/// Artifact loader that reads from the filesystem (forge build output)
#[derive(Debug, Clone)]
pub struct FileSystemArtifactLoader {
    /// Directory containing compiled artifacts (typically "out")
    out_dir: PathBuf,
}

impl FileSystemArtifactLoader {
    /// Create a new loader with default paths relative to current directory
    pub fn new() -> Self {
        Self::with_paths(Path::new("."))
    }

    /// Create a new loader with paths relative to the given project root
    pub fn with_paths(project_root: &Path) -> Self {
        Self::with_out_dir(project_root.join("out"))
    }

    /// Create a new loader with an explicit out directory
    pub fn with_out_dir(out_dir: PathBuf) -> Self {
        Self { out_dir }
    }

    /// Expected artifact path: `<out>/<Name>.sol/<Name>.json`
    pub fn artifact_path(&self, contract_name: &str) -> PathBuf {
        self.out_dir
            .join(format!("{}.sol", contract_name))
            .join(format!("{}.json", contract_name))
    }

    /// Fallback path used when the source file name has no extension
    fn fallback_path(&self, contract_name: &str) -> PathBuf {
        self.out_dir
            .join(contract_name)
            .join(format!("{}.json", contract_name))
    }

    /// Search every source folder in the out directory for `<Name>.json`.
    ///
    /// Covers non-Solidity sources (`Token.vy/Token.json`) and contracts
    /// declared in a file with another name. Folders are visited in name
    /// order; `build-info` is skipped.
    fn find_in_source_dirs(&self, contract_name: &str) -> Result<Option<PathBuf>> {
        let entries = match std::fs::read_dir(&self.out_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::io(self.out_dir.display().to_string(), e)),
        };

        let mut dirs = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|e| Error::io(self.out_dir.display().to_string(), e))?
                .path();
            if path.is_dir() && path.file_name().and_then(|n| n.to_str()) != Some(BUILD_INFO_DIR) {
                dirs.push(path);
            }
        }
        dirs.sort();

        let file_name = format!("{}.json", contract_name);
        Ok(dirs
            .into_iter()
            .map(|dir| dir.join(&file_name))
            .find(|path| path.is_file()))
    }

    fn read_artifact(&self, contract_name: &str) -> Result<(PathBuf, String)> {
        for path in [
            self.artifact_path(contract_name),
            self.fallback_path(contract_name),
        ] {
            match std::fs::read_to_string(&path) {
                Ok(content) => return Ok((path, content)),
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(Error::io(path.display().to_string(), e)),
            }
        }

        if let Some(path) = self.find_in_source_dirs(contract_name)? {
            debug!(contract = contract_name, path = %path.display(), "found artifact outside <Name>.sol");
            let content =
                std::fs::read_to_string(&path).map_err(|e| Error::io(path.display().to_string(), e))?;
            return Ok((path, content));
        }

        let cwd = std::env::current_dir()
            .map(|dir| dir.display().to_string())
            .unwrap_or_else(|_| ".".to_string());

        Err(Error::ArtifactNotFound {
            contract: contract_name.to_string(),
            path: self.artifact_path(contract_name).display().to_string(),
            cwd,
        })
    }
}

impl Default for FileSystemArtifactLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ArtifactLoader for FileSystemArtifactLoader {
    fn load_abi(&self, contract_name: &str) -> Result<Abi> {
        let (path, content) = self.read_artifact(contract_name)?;
        debug!(contract = contract_name, path = %path.display(), "loading artifact");

        let invalid = |reason: String| Error::InvalidArtifact {
            contract: contract_name.to_string(),
            path: path.display().to_string(),
            reason,
        };

        let artifact: ContractArtifact =
            serde_json::from_str(&content).map_err(|e| invalid(e.to_string()))?;

        let abi = artifact
            .abi
            .ok_or_else(|| invalid("missing 'abi' field".to_string()))?;

        if !abi.is_array() {
            return Err(invalid("'abi' is not an array".to_string()));
        }

        Abi::from_value(&abi).map_err(|e| invalid(e.to_string()))
    }
}
