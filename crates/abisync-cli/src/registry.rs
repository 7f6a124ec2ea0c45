//! HTTP client for the ABI registry

use abisync_core::{AbiRegistry, Error, PublishRecord, PushOutcome, Result};
use async_trait::async_trait;

use crate::config::RegistryEndpoint;

/// Registry reached over HTTP. Records are posted to `<url>/abis`.
#[derive(Debug, Clone)]
pub struct HttpRegistry {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl HttpRegistry {
    pub fn new(endpoint: &RegistryEndpoint) -> Self {
        Self {
            base_url: endpoint.url.trim_end_matches('/').to_string(),
            api_key: endpoint.api_key.clone(),
            client: reqwest::Client::new(),
        }
    }

    pub fn push_url(&self) -> String {
        format!("{}/abis", self.base_url)
    }
}

#[async_trait]
impl AbiRegistry for HttpRegistry {
    async fn push(&self, record: &PublishRecord) -> Result<PushOutcome> {
        let mut request = self.client.post(self.push_url()).json(record);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Registry(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Registry(format!(
                "push of '{}' rejected with {}: {}",
                record.contract_name, status, body
            )));
        }

        response
            .json::<PushOutcome>()
            .await
            .map_err(|e| Error::Registry(format!("invalid response: {}", e)))
    }
}
