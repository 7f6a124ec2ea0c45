//! Trace parsing trait and forge implementation

use std::path::Path;

use abisync_core::{
    ChainId, Error, NestedCreation, Result, Trace, TraceTransaction, TransactionKind,
};
use serde_json::Value;

use super::types::{AdditionalContract, BroadcastTransaction};

/// Trait for decoding trace files into the typed trace model
pub trait TraceParser: Send + Sync {
    /// Read and parse the trace file at `path`
    fn parse(&self, path: &Path) -> Result<Trace>;
}

/// Trace parser for forge script broadcast outputs
#[derive(Debug, Clone, Default)]
pub struct ForgeTraceParser;

impl ForgeTraceParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse broadcast JSON. `source` names the file in error messages.
    ///
    /// Only structure is validated here: `transactions` must be an array and
    /// `chain` a positive integer.
    pub fn parse_str(&self, content: &str, source: &str) -> Result<Trace> {
        let root: Value = serde_json::from_str(content)
            .map_err(|e| Error::malformed(source, "<root>", format!("is not valid JSON ({})", e)))?;

        let root = root
            .as_object()
            .ok_or_else(|| Error::malformed(source, "<root>", "is not a JSON object"))?;

        let raw_transactions = match root.get("transactions") {
            Some(Value::Array(items)) => items,
            Some(_) => return Err(Error::malformed(source, "transactions", "is not an array")),
            None => return Err(Error::malformed(source, "transactions", "is missing")),
        };

        let chain_id = match root.get("chain") {
            Some(value) => value
                .as_u64()
                .filter(|id| *id > 0)
                .map(ChainId)
                .ok_or_else(|| Error::malformed(source, "chain", "is not a positive integer"))?,
            None => return Err(Error::malformed(source, "chain", "is missing")),
        };

        let timestamp = match root.get("timestamp") {
            None | Some(Value::Null) => None,
            Some(value) => Some(value.as_u64().ok_or_else(|| {
                Error::malformed(source, "timestamp", "is not a non-negative integer")
            })?),
        };

        let transactions = raw_transactions
            .iter()
            .enumerate()
            .map(|(index, raw)| convert_transaction(index, raw, source))
            .collect::<Result<Vec<_>>>()?;

        Ok(Trace {
            transactions,
            chain_id,
            timestamp,
        })
    }
}

impl TraceParser for ForgeTraceParser {
    fn parse(&self, path: &Path) -> Result<Trace> {
        let source = path.display().to_string();
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(&source, e))?;
        self.parse_str(&content, &source)
    }
}

fn convert_transaction(index: usize, raw: &Value, source: &str) -> Result<TraceTransaction> {
    let field = format!("transactions[{}]", index);

    let tx: BroadcastTransaction = serde_json::from_value(raw.clone())
        .map_err(|e| Error::malformed(source, &field, e.to_string()))?;

    let kind = if tx.is_create() {
        TransactionKind::Create
    } else if tx.is_call() {
        TransactionKind::Call
    } else {
        return Err(Error::malformed(
            source,
            format!("{}.transactionType", field),
            format!("has unknown value '{}'", tx.transaction_type),
        ));
    };

    let nested_creations = match kind {
        TransactionKind::Call => tx
            .additional_contracts
            .unwrap_or_default()
            .into_iter()
            .map(convert_nested)
            .collect(),
        TransactionKind::Create => Vec::new(),
    };

    Ok(TraceTransaction {
        kind,
        contract_name: tx.contract_name,
        address: tx.contract_address,
        called_function: tx.function,
        nested_creations,
    })
}

fn convert_nested(raw: AdditionalContract) -> NestedCreation {
    NestedCreation {
        contract_name: raw.contract_name,
        address: raw.address,
        init_code: raw.init_code.unwrap_or_default(),
    }
}
