use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::abi::Abi;

// =============================================================================
// Chain
// =============================================================================

/// Chain ID wrapper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainId(pub u64);

impl ChainId {
    /// Chain ID of the local anvil / hardhat development node
    pub const DEV: ChainId = ChainId(31337);

    /// Human readable network label for this chain.
    ///
    /// Unknown chains are labelled `chain-<id>`.
    pub fn network_name(&self) -> String {
        let known = match self.0 {
            1 => "mainnet",
            10 => "optimism",
            56 => "bsc",
            100 => "gnosis",
            137 => "polygon",
            250 => "fantom",
            324 => "zksync",
            1101 => "polygon-zkevm",
            5000 => "mantle",
            8453 => "base",
            17000 => "holesky",
            31337 => "anvil",
            42161 => "arbitrum",
            42220 => "celo",
            43114 => "avalanche",
            59144 => "linea",
            80002 => "polygon-amoy",
            81457 => "blast",
            84532 => "base-sepolia",
            421614 => "arbitrum-sepolia",
            534352 => "scroll",
            11155111 => "sepolia",
            11155420 => "optimism-sepolia",
            _ => return format!("chain-{}", self.0),
        };
        known.to_string()
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ChainId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<ChainId> for u64 {
    fn from(value: ChainId) -> Self {
        value.0
    }
}

// =============================================================================
// Trace Model
// =============================================================================

/// Kind of a recorded transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionKind {
    Create,
    Call,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Create => "CREATE",
            TransactionKind::Call => "CALL",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A contract created as a side effect of a CALL (factory / initializer pattern)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NestedCreation {
    pub contract_name: Option<String>,
    pub address: String,
    pub init_code: String,
}

impl NestedCreation {
    /// Length of the init code in bytes, ignoring a `0x` prefix
    pub fn init_code_len(&self) -> usize {
        self.init_code.trim_start_matches("0x").len() / 2
    }
}

/// One on-chain operation recorded in a trace file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceTransaction {
    pub kind: TransactionKind,
    pub contract_name: Option<String>,
    pub address: Option<String>,
    pub called_function: Option<String>,
    pub nested_creations: Vec<NestedCreation>,
}

impl TraceTransaction {
    /// A CREATE transaction with a known contract name
    pub fn create(name: &str, address: &str) -> Self {
        Self {
            kind: TransactionKind::Create,
            contract_name: Some(name.to_string()),
            address: Some(address.to_string()),
            called_function: None,
            nested_creations: Vec::new(),
        }
    }

    /// A CALL transaction to `address` creating `nested` contracts
    pub fn call(address: &str, nested: Vec<NestedCreation>) -> Self {
        Self {
            kind: TransactionKind::Call,
            contract_name: None,
            address: Some(address.to_string()),
            called_function: None,
            nested_creations: nested,
        }
    }

    pub fn is_create(&self) -> bool {
        self.kind == TransactionKind::Create
    }

    pub fn is_call(&self) -> bool {
        self.kind == TransactionKind::Call
    }

    /// Name and address of a CREATE with known source
    pub fn named_deployment(&self) -> Option<(&str, &str)> {
        if !self.is_create() {
            return None;
        }
        Some((self.contract_name.as_deref()?, self.address.as_deref()?))
    }
}

/// One parsed trace (broadcast) file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trace {
    pub transactions: Vec<TraceTransaction>,
    pub chain_id: ChainId,
    /// Deployment time in epoch milliseconds
    pub timestamp: Option<u64>,
}

impl Trace {
    /// Resolve the deployment time, falling back to the current time
    pub fn deployed_at(&self) -> DateTime<Utc> {
        self.timestamp
            .and_then(|ms| i64::try_from(ms).ok())
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
            .unwrap_or_else(Utc::now)
    }
}

/// Inferred proxy -> implementation relationship
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyMapping {
    pub proxy_address: String,
    pub implementation_name: String,
    /// Index of the CALL transaction that created the proxy
    pub deployment_index: usize,
}

// =============================================================================
// Selection
// =============================================================================

/// Explicit proxy resolution for a selector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxySpec {
    pub implementation: String,
    #[serde(default)]
    pub interfaces: Vec<String>,
}

impl ProxySpec {
    pub fn new(implementation: impl Into<String>) -> Self {
        Self {
            implementation: implementation.into(),
            interfaces: Vec::new(),
        }
    }

    pub fn with_interfaces<I, S>(mut self, interfaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.interfaces = interfaces.into_iter().map(Into::into).collect();
        self
    }
}

/// Identifies a contract to publish and how its ABI is resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractSelector {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<ProxySpec>,
}

impl ContractSelector {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            proxy: None,
        }
    }

    pub fn proxy(name: impl Into<String>, spec: ProxySpec) -> Self {
        Self {
            name: name.into(),
            proxy: Some(spec),
        }
    }
}

// =============================================================================
// Publishing
// =============================================================================

/// A resolved deployment ready to be pushed to the registry
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishRecord {
    pub contract_name: String,
    pub address: String,
    pub chain_id: ChainId,
    pub network: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub deployed_at: DateTime<Utc>,
    pub abi_hash: String,
    pub abi: Abi,
}

impl PublishRecord {
    /// Build a record, computing the ABI hash and network label
    pub fn new(
        contract_name: impl Into<String>,
        address: impl Into<String>,
        chain_id: ChainId,
        label: Option<String>,
        deployed_at: DateTime<Utc>,
        abi: Abi,
    ) -> Self {
        Self {
            contract_name: contract_name.into(),
            address: address.into(),
            chain_id,
            network: chain_id.network_name(),
            label,
            deployed_at,
            abi_hash: abi.content_hash(),
            abi,
        }
    }
}

/// Registry response for a pushed record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushOutcome {
    pub is_duplicate: bool,
    #[serde(alias = "id")]
    pub record_id: String,
}
