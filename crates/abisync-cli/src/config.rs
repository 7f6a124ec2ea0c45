use std::collections::HashMap;
use std::path::{Path, PathBuf};

use abisync_core::{ChainId, ContractSelector, DEFAULT_MAX_PROXY_INIT_CODE_BYTES};
use color_eyre::eyre::{eyre, Result};
use serde::Deserialize;

use crate::forge::{script_dir_name, DEFAULT_TRACE_FILE};

pub const CONFIG_FILE: &str = "abisync.toml";
const FOUNDRY_CONFIG: &str = "foundry.toml";

/// Template written by `abisync init`
pub const CONFIG_TEMPLATE: &str = r#"# abisync configuration

[forge]
# Project root containing foundry.toml
root = "."
# Defaults to [profile.default] in foundry.toml, else "broadcast" / "out"
# broadcast = "broadcast"
# out = "out"
trace_file = "run-latest.json"
# Local development chains are never published
exclude_chains = [31337]

[registry]
url = "https://registry.example.com/api"
api_key = "${ABISYNC_API_KEY}"

[[scripts]]
name = "Deploy.s.sol"
# Optional allow-list. Items are names or explicit selectors:
# contracts = [
#   "Token",
#   { name = "DiamondProxy", proxy = { implementation = "Diamond", interfaces = ["IDiamondCut", "IDiamondLoupe"] } },
# ]
"#;

// =============================================================================
// abisync.toml
// =============================================================================

/// abisync configuration file structure (abisync.toml)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AbiSyncConfig {
    #[serde(default)]
    pub forge: ForgeSettings,
    #[serde(default)]
    pub registry: Option<RegistrySettings>,
    #[serde(default)]
    pub scripts: Vec<ScriptConfig>,
}

/// Where to find forge output and how to read it
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ForgeSettings {
    pub root: PathBuf,
    pub broadcast: Option<PathBuf>,
    pub out: Option<PathBuf>,
    pub trace_file: String,
    pub exclude_chains: Vec<u64>,
    pub proxy_init_code_max_bytes: usize,
}

impl Default for ForgeSettings {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            broadcast: None,
            out: None,
            trace_file: DEFAULT_TRACE_FILE.to_string(),
            exclude_chains: vec![ChainId::DEV.0],
            proxy_init_code_max_bytes: DEFAULT_MAX_PROXY_INIT_CODE_BYTES,
        }
    }
}

impl ForgeSettings {
    pub fn excluded_chains(&self) -> Vec<ChainId> {
        self.exclude_chains.iter().copied().map(ChainId).collect()
    }

    /// Resolve broadcast and out directories.
    ///
    /// Explicit settings win, then foundry.toml `[profile.default]`, then the
    /// forge defaults.
    pub fn paths(&self) -> Result<ForgePaths> {
        let foundry_path = self.root.join(FOUNDRY_CONFIG);
        let profile = if foundry_path.exists() {
            FoundryConfig::load_from(&foundry_path)?.default_profile()
        } else {
            FoundryProfile::default()
        };

        let broadcast = self
            .broadcast
            .clone()
            .or_else(|| profile.broadcast.map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("broadcast"));
        let out = self
            .out
            .clone()
            .or_else(|| profile.out.map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("out"));

        Ok(ForgePaths {
            broadcast_dir: self.root.join(broadcast),
            out_dir: self.root.join(out),
        })
    }
}

/// Resolved forge output directories
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForgePaths {
    pub broadcast_dir: PathBuf,
    pub out_dir: PathBuf,
}

/// Registry endpoint settings
#[derive(Debug, Clone, Deserialize)]
pub struct RegistrySettings {
    pub url: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

/// Registry endpoint with environment variables resolved
#[derive(Debug, Clone)]
pub struct RegistryEndpoint {
    pub url: String,
    pub api_key: Option<String>,
}

/// A deployment script and the contracts to publish from it
#[derive(Debug, Clone, Deserialize)]
pub struct ScriptConfig {
    pub name: String,
    #[serde(default)]
    pub contracts: Vec<ContractEntry>,
}

impl ScriptConfig {
    /// A script with no allow-list
    pub fn unfiltered(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            contracts: Vec::new(),
        }
    }

    pub fn selectors(&self) -> Vec<ContractSelector> {
        self.contracts.iter().map(ContractEntry::selector).collect()
    }
}

/// Contract entry can be a bare name or a full selector table
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ContractEntry {
    Name(String),
    Selector(ContractSelector),
}

impl ContractEntry {
    pub fn selector(&self) -> ContractSelector {
        match self {
            ContractEntry::Name(name) => ContractSelector::named(name.clone()),
            ContractEntry::Selector(selector) => selector.clone(),
        }
    }
}

impl AbiSyncConfig {
    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|_| {
            eyre!(
                "Could not find {}. Run `abisync init` to create one.",
                path.display()
            )
        })?;

        let config: AbiSyncConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Registry endpoint with `${VAR}` references resolved
    pub fn registry(&self) -> Result<RegistryEndpoint> {
        let registry = self
            .registry
            .as_ref()
            .ok_or_else(|| eyre!("No [registry] section in {}", CONFIG_FILE))?;

        Ok(RegistryEndpoint {
            url: resolve_env_var(&registry.url)?,
            api_key: registry
                .api_key
                .as_deref()
                .map(resolve_env_var)
                .transpose()?,
        })
    }

    /// Scripts to process, in configured order.
    ///
    /// When `names` is non-empty only those scripts are returned; names not
    /// present in the config are processed without an allow-list. Names match
    /// by broadcast folder, so `Deploy.s.sol` selects a script configured as
    /// `script/Deploy.s.sol:Deploy`.
    pub fn select_scripts(&self, names: &[String]) -> Vec<ScriptConfig> {
        if names.is_empty() {
            return self.scripts.clone();
        }

        names
            .iter()
            .map(|name| {
                self.scripts
                    .iter()
                    .find(|script| script_dir_name(&script.name) == script_dir_name(name))
                    .cloned()
                    .unwrap_or_else(|| ScriptConfig::unfiltered(name.clone()))
            })
            .collect()
    }
}

// =============================================================================
// foundry.toml
// =============================================================================

/// Foundry configuration file structure (foundry.toml)
/// We only parse the sections we need
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FoundryConfig {
    #[serde(default)]
    pub profile: HashMap<String, FoundryProfile>,
}

/// Output directories from a foundry profile
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FoundryProfile {
    #[serde(default)]
    pub out: Option<String>,
    #[serde(default)]
    pub broadcast: Option<String>,
}

impl FoundryConfig {
    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|_| eyre!("Could not find foundry.toml. Is this a Foundry project?"))?;

        let config: FoundryConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Check if foundry.toml exists in the current directory
    pub fn exists() -> bool {
        Path::new(FOUNDRY_CONFIG).exists()
    }

    pub fn default_profile(&self) -> FoundryProfile {
        self.profile.get("default").cloned().unwrap_or_default()
    }
}

/// Resolve environment variable references in a string
/// Supports ${VAR_NAME} syntax
fn resolve_env_var(value: &str) -> Result<String> {
    if value.starts_with("${") && value.ends_with('}') {
        let var_name = &value[2..value.len() - 1];
        std::env::var(var_name).map_err(|_| eyre!("Environment variable '{}' not set", var_name))
    } else {
        Ok(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use abisync_core::ProxySpec;
    use tempfile::TempDir;

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[forge]
root = "contracts"
exclude_chains = [31337, 1337]

[registry]
url = "https://registry.test.xyz"

[[scripts]]
name = "Deploy.s.sol"
contracts = [
    "TokenA",
    { name = "DiamondProxy", proxy = { implementation = "Diamond", interfaces = ["IFacet"] } },
]

[[scripts]]
name = "Upgrade.s.sol"
"#;

        let config: AbiSyncConfig = toml::from_str(toml_content).unwrap();

        assert_eq!(config.forge.root, PathBuf::from("contracts"));
        assert_eq!(
            config.forge.excluded_chains(),
            vec![ChainId(31337), ChainId(1337)]
        );
        assert_eq!(config.forge.trace_file, "run-latest.json");
        assert_eq!(config.scripts.len(), 2);

        let selectors = config.scripts[0].selectors();
        assert_eq!(selectors[0], ContractSelector::named("TokenA"));
        assert_eq!(
            selectors[1],
            ContractSelector::proxy(
                "DiamondProxy",
                ProxySpec::new("Diamond").with_interfaces(["IFacet"])
            )
        );
        assert!(config.scripts[1].contracts.is_empty());
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: AbiSyncConfig = toml::from_str("").unwrap();

        assert_eq!(config.forge.root, PathBuf::from("."));
        assert_eq!(config.forge.excluded_chains(), vec![ChainId::DEV]);
        assert_eq!(
            config.forge.proxy_init_code_max_bytes,
            DEFAULT_MAX_PROXY_INIT_CODE_BYTES
        );
        assert!(config.registry.is_none());
        assert!(config.scripts.is_empty());
    }

    #[test]
    fn test_template_parses() {
        let config: AbiSyncConfig = toml::from_str(CONFIG_TEMPLATE).unwrap();
        assert_eq!(config.scripts.len(), 1);
        assert!(config.registry.is_some());
    }

    #[test]
    fn test_paths_default() {
        let dir = TempDir::new().unwrap();
        let settings = ForgeSettings {
            root: dir.path().to_path_buf(),
            ..ForgeSettings::default()
        };

        let paths = settings.paths().unwrap();
        assert_eq!(paths.broadcast_dir, dir.path().join("broadcast"));
        assert_eq!(paths.out_dir, dir.path().join("out"));
    }

    #[test]
    fn test_paths_from_foundry_profile() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("foundry.toml"),
            r#"
[profile.default]
src = "src"
out = "artifacts"
broadcast = "deployments"
"#,
        )
        .unwrap();

        let settings = ForgeSettings {
            root: dir.path().to_path_buf(),
            ..ForgeSettings::default()
        };

        let paths = settings.paths().unwrap();
        assert_eq!(paths.broadcast_dir, dir.path().join("deployments"));
        assert_eq!(paths.out_dir, dir.path().join("artifacts"));
    }

    #[test]
    fn test_explicit_paths_override_foundry() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("foundry.toml"),
            "[profile.default]\nout = \"artifacts\"\n",
        )
        .unwrap();

        let settings = ForgeSettings {
            root: dir.path().to_path_buf(),
            out: Some(PathBuf::from("build")),
            ..ForgeSettings::default()
        };

        assert_eq!(settings.paths().unwrap().out_dir, dir.path().join("build"));
    }

    #[test]
    fn test_select_scripts() {
        let config: AbiSyncConfig = toml::from_str(
            r#"
[[scripts]]
name = "A.s.sol"
contracts = ["Token"]

[[scripts]]
name = "B.s.sol"
"#,
        )
        .unwrap();

        let all = config.select_scripts(&[]);
        assert_eq!(all.len(), 2);

        let picked = config.select_scripts(&["A.s.sol".to_string(), "C.s.sol".to_string()]);
        assert_eq!(picked.len(), 2);
        assert_eq!(picked[0].contracts.len(), 1);
        assert_eq!(picked[1].name, "C.s.sol");
        assert!(picked[1].contracts.is_empty());
    }

    #[test]
    fn test_select_scripts_matches_script_paths() {
        let config: AbiSyncConfig = toml::from_str(
            r#"
[[scripts]]
name = "script/Deploy.s.sol:Deploy"
contracts = ["TokenA"]
"#,
        )
        .unwrap();

        for name in ["Deploy.s.sol", "script/Deploy.s.sol", "script/Deploy.s.sol:Deploy"] {
            let picked = config.select_scripts(&[name.to_string()]);
            assert_eq!(picked.len(), 1);
            assert_eq!(picked[0].name, "script/Deploy.s.sol:Deploy", "selected by {}", name);
            assert_eq!(picked[0].contracts.len(), 1, "selected by {}", name);
        }
    }

    #[test]
    fn test_registry_env_resolution() {
        std::env::set_var("ABISYNC_TEST_API_KEY", "secret");

        let config: AbiSyncConfig = toml::from_str(
            r#"
[registry]
url = "https://registry.test.xyz"
api_key = "${ABISYNC_TEST_API_KEY}"
"#,
        )
        .unwrap();

        let endpoint = config.registry().unwrap();
        assert_eq!(endpoint.url, "https://registry.test.xyz");
        assert_eq!(endpoint.api_key.as_deref(), Some("secret"));

        std::env::remove_var("ABISYNC_TEST_API_KEY");
    }

    #[test]
    fn test_registry_missing() {
        let config: AbiSyncConfig = toml::from_str("").unwrap();
        assert!(config.registry().is_err());
    }

    #[test]
    fn test_resolve_env_var_literal() {
        let result = resolve_env_var("https://literal.url").unwrap();
        assert_eq!(result, "https://literal.url");
    }

    #[test]
    fn test_resolve_env_var_missing() {
        let result = resolve_env_var("${NONEXISTENT_VAR_99999}");
        assert!(result.is_err());
    }
}
