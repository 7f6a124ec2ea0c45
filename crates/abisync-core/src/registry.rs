//! Registry trait for publishing resolved ABIs
//!
//! The registry owns versioning and duplicate detection. The engine only
//! computes `abi_hash`; whether a record is a duplicate is the registry's call.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{PublishRecord, PushOutcome};

/// Remote ABI registry accepting one record at a time
#[async_trait]
pub trait AbiRegistry: Send + Sync {
    /// Push a single record, returning whether the registry already had it
    async fn push(&self, record: &PublishRecord) -> Result<PushOutcome>;
}
