//! Hands resolved records to the registry

use abisync_core::{AbiRegistry, PublishRecord, PushOutcome, Result};

/// Tally of a publish run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PublishSummary {
    pub created: usize,
    pub duplicates: usize,
}

/// Push records one at a time, in order.
///
/// The first failure stops the run; records already pushed stay pushed.
/// `on_pushed` is called after every accepted record.
pub async fn publish_all<F>(
    registry: &dyn AbiRegistry,
    records: &[PublishRecord],
    mut on_pushed: F,
) -> Result<PublishSummary>
where
    F: FnMut(&PublishRecord, &PushOutcome),
{
    let mut summary = PublishSummary::default();

    for record in records {
        let outcome = registry.push(record).await?;
        if outcome.is_duplicate {
            summary.duplicates += 1;
        } else {
            summary.created += 1;
        }
        on_pushed(record, &outcome);
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use abisync_core::{Abi, ChainId, Error};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// Registry that deduplicates on `abi_hash` and can fail on a given name
    #[derive(Default)]
    struct MemoryRegistry {
        hashes: Mutex<HashSet<String>>,
        pushed: Mutex<Vec<String>>,
        fail_on: Option<String>,
    }

    #[async_trait]
    impl AbiRegistry for MemoryRegistry {
        async fn push(&self, record: &PublishRecord) -> Result<PushOutcome> {
            if self.fail_on.as_deref() == Some(record.contract_name.as_str()) {
                return Err(Error::Registry("unavailable".to_string()));
            }
            self.pushed.lock().unwrap().push(record.contract_name.clone());
            let is_new = self.hashes.lock().unwrap().insert(record.abi_hash.clone());
            Ok(PushOutcome {
                is_duplicate: !is_new,
                record_id: format!("rec-{}", record.contract_name),
            })
        }
    }

    fn record(name: &str, abi_json: &str) -> PublishRecord {
        PublishRecord::new(
            name,
            "0x1",
            ChainId(1),
            None,
            Utc::now(),
            Abi::parse(abi_json).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_publish_counts_duplicates() {
        let registry = MemoryRegistry::default();
        let records = vec![
            record("A", r#"[{"type": "function", "name": "a"}]"#),
            record("B", r#"[{"type": "function", "name": "a"}]"#),
            record("C", r#"[{"type": "function", "name": "c"}]"#),
        ];

        let mut seen = Vec::new();
        let summary = publish_all(&registry, &records, |record, outcome| {
            seen.push((record.contract_name.clone(), outcome.is_duplicate));
        })
        .await
        .unwrap();

        assert_eq!(
            summary,
            PublishSummary {
                created: 2,
                duplicates: 1
            }
        );
        assert_eq!(
            seen,
            vec![
                ("A".to_string(), false),
                ("B".to_string(), true),
                ("C".to_string(), false)
            ]
        );
    }

    #[tokio::test]
    async fn test_publish_stops_on_error() {
        let registry = MemoryRegistry {
            fail_on: Some("B".to_string()),
            ..MemoryRegistry::default()
        };
        let records = vec![
            record("A", r#"[{"type": "function", "name": "a"}]"#),
            record("B", r#"[{"type": "function", "name": "b"}]"#),
            record("C", r#"[{"type": "function", "name": "c"}]"#),
        ];

        let result = publish_all(&registry, &records, |_, _| {}).await;

        assert!(matches!(result, Err(Error::Registry(_))));
        assert_eq!(*registry.pushed.lock().unwrap(), vec!["A".to_string()]);
    }

    #[tokio::test]
    async fn test_publish_nothing() {
        let registry = MemoryRegistry::default();
        let summary = publish_all(&registry, &[], |_, _| {}).await.unwrap();
        assert_eq!(summary, PublishSummary::default());
    }
}
