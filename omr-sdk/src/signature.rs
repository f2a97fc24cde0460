//! Signature algorithm and verification for the ingestion endpoint.
//!
//! Providers authenticate webhook deliveries with an HMAC-SHA256 digest of
//! the raw request body, carried in a header:
//!
//! ```text
//! Omr-Signature: {base64_signature}
//! ```
//!
//! Providers that include a timestamp in the signed data use the prefixed
//! form instead (the relay accepts either):
//!
//! ```text
//! Omr-Signature: {unix_timestamp}.{base64_signature}
//! ```
//!
//! where the digest is computed over `"{timestamp}." + body`. The prefixed
//! form is additionally checked for freshness against
//! [`MAX_SIGNATURE_AGE`].
//!
//! An **empty secret disables verification entirely**: every payload is
//! accepted. This is the unsecured/dev-mode escape hatch and must never be
//! configured for a production provider.

/// Header name for the HMAC signature.
pub const SIGNATURE_HEADER: &str = "Omr-Signature";

/// Header name carrying the provider identifier when it is not passed as a
/// query parameter.
pub const PROVIDER_HEADER: &str = "Omr-Provider";

/// Header name for admin API authentication.
pub const ADMIN_AUTH_HEADER: &str = "Omr-Admin-Authorization";

/// Maximum allowed age of a timestamped signature (in seconds).
pub const MAX_SIGNATURE_AGE: i64 = 5 * 60;

/// Errors produced by signature verification.
#[derive(Debug, thiserror::Error)]
pub enum SignatureError {
    #[error("missing {SIGNATURE_HEADER} header")]
    MissingSignature,
    #[error("invalid {SIGNATURE_HEADER} header format")]
    InvalidFormat,
    #[error("invalid base64 encoding")]
    InvalidBase64,
    #[error("invalid signature")]
    SignatureMismatch,
    #[error("signature expired")]
    Expired,
}

impl From<ring::error::Unspecified> for SignatureError {
    fn from(_: ring::error::Unspecified) -> Self {
        Self::SignatureMismatch
    }
}

/// Compute the plain signature header value for `payload`:
/// `base64(HMAC-SHA256(payload, key))`.
pub fn sign_payload(payload: &[u8], key: &[u8]) -> String {
    let sig = ring::hmac::sign(&ring::hmac::Key::new(ring::hmac::HMAC_SHA256, key), payload);
    fast32::base64::RFC4648_NOPAD.encode(sig.as_ref())
}

/// Compute a timestamped signature header value for `payload`:
/// `{now}.{base64(HMAC-SHA256("{now}." + payload, key))}`.
pub fn sign_payload_timestamped(payload: &[u8], key: &[u8]) -> String {
    let now = time::OffsetDateTime::now_utc().unix_timestamp();
    let mut data = format!("{now}.").into_bytes();
    data.extend_from_slice(payload);
    let sig = ring::hmac::sign(&ring::hmac::Key::new(ring::hmac::HMAC_SHA256, key), &data);
    format!(
        "{}.{}",
        now,
        fast32::base64::RFC4648_NOPAD.encode(sig.as_ref())
    )
}

/// Verify a signature header against the raw payload bytes.
///
/// * An empty `key` accepts anything (unsecured/dev mode).
/// * A non-empty `key` with no header fails with
///   [`SignatureError::MissingSignature`].
/// * The HMAC comparison is constant-time (`ring::hmac::verify`).
pub fn verify_payload(
    payload: &[u8],
    header: Option<&str>,
    key: &[u8],
) -> Result<(), SignatureError> {
    if key.is_empty() {
        return Ok(());
    }
    let header = header.ok_or(SignatureError::MissingSignature)?;
    let (timestamp, signature) = parse_signature_header(header)?;

    match timestamp {
        None => {
            ring::hmac::verify(
                &ring::hmac::Key::new(ring::hmac::HMAC_SHA256, key),
                payload,
                &signature,
            )?;
        }
        Some(ts) => {
            let mut data = format!("{ts}.").into_bytes();
            data.extend_from_slice(payload);
            ring::hmac::verify(
                &ring::hmac::Key::new(ring::hmac::HMAC_SHA256, key),
                &data,
                &signature,
            )?;
            check_timestamp(ts)?;
        }
    }
    Ok(())
}

/// Parse a signature header value into `(timestamp, raw_signature_bytes)`.
///
/// The base64 alphabet never contains `.`, so a dot unambiguously marks the
/// timestamped form.
pub fn parse_signature_header(value: &str) -> Result<(Option<i64>, Box<[u8]>), SignatureError> {
    let (timestamp, b64) = match value.find('.') {
        Some(dot_pos) => {
            let ts: i64 = value[..dot_pos]
                .parse()
                .map_err(|_| SignatureError::InvalidFormat)?;
            (Some(ts), &value[dot_pos + 1..])
        }
        None => (None, value),
    };
    let signature = fast32::base64::RFC4648_NOPAD
        .decode_str(b64)
        .map_err(|_| SignatureError::InvalidBase64)?
        .into_boxed_slice();
    Ok((timestamp, signature))
}

/// Check that a signature timestamp is within [`MAX_SIGNATURE_AGE`].
pub fn check_timestamp(timestamp: i64) -> Result<(), SignatureError> {
    let now = time::OffsetDateTime::now_utc().unix_timestamp();
    if now - timestamp > MAX_SIGNATURE_AGE {
        return Err(SignatureError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"provider-shared-secret";

    #[test]
    fn empty_secret_accepts_anything() {
        assert!(verify_payload(b"whatever", None, b"").is_ok());
        assert!(verify_payload(b"whatever", Some("not-even-base64!"), b"").is_ok());
    }

    #[test]
    fn missing_header_fails_with_secret() {
        let err = verify_payload(b"body", None, SECRET).unwrap_err();
        assert!(matches!(err, SignatureError::MissingSignature));
    }

    #[test]
    fn plain_roundtrip() {
        let body = br#"{"match_id":1,"event_type":"goal"}"#;
        let header = sign_payload(body, SECRET);
        assert!(verify_payload(body, Some(&header), SECRET).is_ok());
    }

    #[test]
    fn tampered_payload_fails() {
        let header = sign_payload(b"original", SECRET);
        let err = verify_payload(b"tampered", Some(&header), SECRET).unwrap_err();
        assert!(matches!(err, SignatureError::SignatureMismatch));
    }

    #[test]
    fn wrong_secret_fails() {
        let header = sign_payload(b"body", SECRET);
        let err = verify_payload(b"body", Some(&header), b"other-secret").unwrap_err();
        assert!(matches!(err, SignatureError::SignatureMismatch));
    }

    #[test]
    fn timestamped_roundtrip() {
        let body = b"[]";
        let header = sign_payload_timestamped(body, SECRET);
        assert!(verify_payload(body, Some(&header), SECRET).is_ok());
    }

    #[test]
    fn stale_timestamp_fails() {
        let ts = time::OffsetDateTime::now_utc().unix_timestamp() - MAX_SIGNATURE_AGE - 10;
        let mut data = format!("{ts}.").into_bytes();
        data.extend_from_slice(b"body");
        let sig = ring::hmac::sign(
            &ring::hmac::Key::new(ring::hmac::HMAC_SHA256, SECRET),
            &data,
        );
        let header = format!(
            "{}.{}",
            ts,
            fast32::base64::RFC4648_NOPAD.encode(sig.as_ref())
        );
        let err = verify_payload(b"body", Some(&header), SECRET).unwrap_err();
        assert!(matches!(err, SignatureError::Expired));
    }

    #[test]
    fn garbage_header_is_rejected() {
        let err = verify_payload(b"body", Some("!!not base64!!"), SECRET).unwrap_err();
        assert!(matches!(err, SignatureError::InvalidBase64));
        let err = verify_payload(b"body", Some("12x34.QUJD"), SECRET).unwrap_err();
        assert!(matches!(err, SignatureError::InvalidFormat));
    }
}
