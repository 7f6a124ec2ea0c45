//! Raw JSON shapes of forge broadcast and artifact files
//!
//! These mirror the on-disk format only. Validation into the typed trace
//! model happens in [`super::broadcast`].

use serde::Deserialize;

// =============================================================================
// Broadcast Types
// =============================================================================

/// A transaction from the broadcast output
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastTransaction {
    pub transaction_type: String,
    #[serde(default)]
    pub contract_name: Option<String>,
    #[serde(default)]
    pub contract_address: Option<String>,
    #[serde(default)]
    pub function: Option<String>,
    #[serde(default)]
    pub additional_contracts: Option<Vec<AdditionalContract>>,
}

impl BroadcastTransaction {
    /// Check if this is a contract creation (CREATE or CREATE2)
    pub fn is_create(&self) -> bool {
        matches!(self.transaction_type.as_str(), "CREATE" | "CREATE2")
    }

    pub fn is_call(&self) -> bool {
        self.transaction_type == "CALL"
    }
}

/// A contract created as a side effect of a broadcast transaction
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdditionalContract {
    #[serde(default)]
    #[allow(dead_code)]
    pub transaction_type: Option<String>,
    #[serde(default)]
    pub contract_name: Option<String>,
    pub address: String,
    #[serde(default)]
    pub init_code: Option<String>,
}

// =============================================================================
// Artifact Types
// =============================================================================

/// The part of a forge build artifact we read
#[derive(Debug, Deserialize)]
pub struct ContractArtifact {
    #[serde(default)]
    pub abi: Option<serde_json::Value>,
}
