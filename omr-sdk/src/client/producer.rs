//! Producer-side client: POST signed event payloads to the ingestion
//! endpoint.

use url::Url;

use super::ClientError;
use crate::objects::IngestAccepted;
use crate::signature::{SIGNATURE_HEADER, sign_payload_timestamped};

/// A client for one provider identity.
///
/// Payloads are signed with the timestamped scheme
/// (`{ts}.{base64(HMAC-SHA256("{ts}." + body, secret))}`), which the relay
/// verifies for both integrity and freshness. An empty secret sends no
/// signature header at all (only valid against a relay running that
/// provider in unsecured mode).
pub struct ProducerClient {
    http: reqwest::Client,
    base_url: Url,
    provider: String,
    secret: Vec<u8>,
}

impl ProducerClient {
    /// Create a producer client for `provider` against `base_url`
    /// (e.g. `https://relay.example.com`).
    pub fn new(
        base_url: &str,
        provider: impl Into<String>,
        secret: impl Into<Vec<u8>>,
    ) -> Result<Self, ClientError> {
        Ok(Self {
            http: reqwest::Client::new(),
            base_url: Url::parse(base_url)?,
            provider: provider.into(),
            secret: secret.into(),
        })
    }

    /// Send a single event payload in the provider's native format.
    pub async fn send(&self, payload: &serde_json::Value) -> Result<IngestAccepted, ClientError> {
        self.post(serde_json::to_vec(payload)?).await
    }

    /// Send a batch of event payloads as a JSON array.
    pub async fn send_batch(
        &self,
        payloads: &[serde_json::Value],
    ) -> Result<IngestAccepted, ClientError> {
        self.post(serde_json::to_vec(payloads)?).await
    }

    async fn post(&self, body: Vec<u8>) -> Result<IngestAccepted, ClientError> {
        let mut url = self.base_url.join("/ingest")?;
        url.query_pairs_mut().append_pair("provider", &self.provider);

        let mut request = self
            .http
            .post(url)
            .header("Content-Type", "application/json");
        if !self.secret.is_empty() {
            request = request.header(SIGNATURE_HEADER, sign_payload_timestamped(&body, &self.secret));
        }

        let response = request.body(body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Api { status, body });
        }
        Ok(response.json::<IngestAccepted>().await?)
    }
}
