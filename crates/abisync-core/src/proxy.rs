//! Proxy pattern detection over a deployment trace.
//!
//! Detects the "implementation CREATE, then factory CALL creating a small
//! unnamed contract" shape. This is a structural heuristic: it favors missing
//! a proxy over misclassifying a real contract, and never touches the chain.

use tracing::debug;

use crate::types::{NestedCreation, ProxyMapping, TraceTransaction};

/// Default upper bound (exclusive) on proxy init code size, in bytes
pub const DEFAULT_MAX_PROXY_INIT_CODE_BYTES: usize = 512;

/// Detects indirection proxies created as side effects of CALL transactions
#[derive(Debug, Clone, Copy)]
pub struct ProxyDetector {
    max_init_code_bytes: usize,
}

impl ProxyDetector {
    pub fn new() -> Self {
        Self::with_threshold(DEFAULT_MAX_PROXY_INIT_CODE_BYTES)
    }

    /// Create a detector treating nested creations smaller than
    /// `max_init_code_bytes` as proxy candidates
    pub fn with_threshold(max_init_code_bytes: usize) -> Self {
        Self {
            max_init_code_bytes,
        }
    }

    fn is_candidate(&self, nested: &NestedCreation) -> bool {
        nested.contract_name.is_none() && nested.init_code_len() < self.max_init_code_bytes
    }

    /// Scan `transactions` in order and emit one mapping per detected proxy.
    ///
    /// All candidates of a single CALL map to the nearest preceding CREATE
    /// with a known name. A CALL with no such CREATE before it yields nothing.
    pub fn detect(&self, transactions: &[TraceTransaction]) -> Vec<ProxyMapping> {
        let mut mappings = Vec::new();

        for (index, tx) in transactions.iter().enumerate() {
            if !tx.is_call() || tx.nested_creations.is_empty() {
                continue;
            }

            let candidates: Vec<&NestedCreation> = tx
                .nested_creations
                .iter()
                .filter(|nested| self.is_candidate(nested))
                .collect();

            if candidates.is_empty() {
                continue;
            }

            let implementation = transactions[..index]
                .iter()
                .rev()
                .filter(|prior| prior.is_create())
                .find_map(|prior| prior.contract_name.as_deref());

            let Some(implementation) = implementation else {
                debug!(
                    index,
                    candidates = candidates.len(),
                    "no named CREATE precedes proxy candidates"
                );
                continue;
            };

            for candidate in candidates {
                debug!(
                    index,
                    proxy = %candidate.address,
                    implementation,
                    "detected proxy"
                );
                mappings.push(ProxyMapping {
                    proxy_address: candidate.address.clone(),
                    implementation_name: implementation.to_string(),
                    deployment_index: index,
                });
            }
        }

        mappings
    }
}

impl Default for ProxyDetector {
    fn default() -> Self {
        Self::new()
    }
}
