//! Custom Axum extractors for request authentication.
//!
//! Provides `ProviderPayload` — resolves the provider adapter from the
//! request, reads the raw body, and verifies the `Omr-Signature` header
//! against the provider's configured secret before any event semantics
//! are parsed.
//!
//! All cryptographic operations are delegated to [`omr_sdk::signature`].

use std::sync::Arc;

use axum::{
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use bytes::Bytes;

use omr_core::ingest::{ProviderAdapter, UnknownProvider};
use omr_sdk::signature::{PROVIDER_HEADER, SIGNATURE_HEADER, SignatureError, verify_payload};

use crate::state::AppState;

/// An authenticated, raw provider payload.
///
/// The provider identifier comes from the `provider` query parameter,
/// falling back to the `Omr-Provider` header. Signature verification runs
/// against the raw body bytes; adapters that opt out of signing, and
/// providers configured with `verify = false`, skip it.
pub struct ProviderPayload {
    /// Canonical (lowercase) provider name.
    pub provider: String,
    pub adapter: Arc<dyn ProviderAdapter>,
    pub body: Bytes,
}

/// Errors that can occur while extracting a provider payload.
#[derive(Debug, thiserror::Error)]
pub enum ProviderPayloadError {
    #[error("missing provider identifier (use ?provider= or the {PROVIDER_HEADER} header)")]
    MissingProvider,
    #[error(transparent)]
    UnknownProvider(#[from] UnknownProvider),
    #[error("invalid header encoding")]
    InvalidHeader,
    #[error("failed to read request body")]
    BodyReadError,
    #[error(transparent)]
    Signature(#[from] SignatureError),
}

impl IntoResponse for ProviderPayloadError {
    fn into_response(self) -> Response {
        let status = match &self {
            ProviderPayloadError::MissingProvider
            | ProviderPayloadError::UnknownProvider(_)
            | ProviderPayloadError::InvalidHeader
            | ProviderPayloadError::BodyReadError => StatusCode::BAD_REQUEST,
            ProviderPayloadError::Signature(_) => StatusCode::UNAUTHORIZED,
        };
        (status, self.to_string()).into_response()
    }
}

impl FromRequest<AppState> for ProviderPayload {
    type Rejection = ProviderPayloadError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let provider = provider_from_query(req.uri().query())
            .or_else(|| {
                req.headers()
                    .get(PROVIDER_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .map(str::to_owned)
            })
            .ok_or(ProviderPayloadError::MissingProvider)?;

        let adapter = state.registry.get(&provider)?;
        let provider = adapter.name().to_string();

        let signature_header = match req.headers().get(SIGNATURE_HEADER) {
            Some(value) => Some(
                value
                    .to_str()
                    .map_err(|_| ProviderPayloadError::InvalidHeader)?
                    .to_owned(),
            ),
            None => None,
        };

        let (secret, verify, max_body_bytes) = {
            let ingest = state.config.ingest.read().await;
            let resolved = ingest.resolve(&provider);
            (resolved.secret, resolved.verify, ingest.max_body_bytes)
        };

        let body = axum::body::to_bytes(req.into_body(), max_body_bytes)
            .await
            .map_err(|_| ProviderPayloadError::BodyReadError)?;

        if adapter.verifies_signature() && verify {
            verify_payload(&body, signature_header.as_deref(), secret.as_bytes())?;
        }

        Ok(ProviderPayload {
            provider,
            adapter,
            body,
        })
    }
}

/// Pull the `provider` parameter out of a raw query string. Provider
/// names are plain tokens, so no percent-decoding is attempted.
fn provider_from_query(query: Option<&str>) -> Option<String> {
    query?
        .split('&')
        .find_map(|pair| pair.strip_prefix("provider="))
        .filter(|name| !name.is_empty())
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_param_parsing() {
        assert_eq!(
            provider_from_query(Some("provider=opta")),
            Some("opta".to_string())
        );
        assert_eq!(
            provider_from_query(Some("a=1&provider=wyscout&b=2")),
            Some("wyscout".to_string())
        );
        assert_eq!(provider_from_query(Some("provider=")), None);
        assert_eq!(provider_from_query(Some("other=1")), None);
        assert_eq!(provider_from_query(None), None);
    }
}
