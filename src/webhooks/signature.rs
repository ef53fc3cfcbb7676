//! Webhook signature verification.
//!
//! The tracker signs webhook payloads with an HMAC over the raw request body,
//! keyed by a shared secret. The signature header carries its own scheme
//! prefix (`sha1=<hex>` or `sha256=<hex>`); the prefix selects the hash
//! algorithm we verify against.
//!
//! Verification is the first step in webhook processing; invalid signatures
//! are rejected before the payload is parsed. The secret is passed in by the
//! caller; this module never reaches into process-wide configuration.

use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::Sha256;

type HmacSha1 = Hmac<Sha1>;
type HmacSha256 = Hmac<Sha256>;

/// Hash algorithm declared by a signature header's prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureScheme {
    Sha1,
    Sha256,
}

impl SignatureScheme {
    /// The header prefix for this scheme, including the `=` separator.
    pub fn prefix(self) -> &'static str {
        match self {
            SignatureScheme::Sha1 => "sha1=",
            SignatureScheme::Sha256 => "sha256=",
        }
    }
}

/// Parses a signature header (e.g., "sha1=abc123...") into its scheme and
/// raw signature bytes.
///
/// Returns `None` for malformed headers (missing prefix, unrecognized scheme,
/// invalid hex). Never panics.
///
/// # Examples
///
/// ```
/// use issue_ledger::webhooks::{SignatureScheme, parse_signature_header};
///
/// // Valid headers
/// assert_eq!(
///     parse_signature_header("sha1=abcd1234").map(|(scheme, _)| scheme),
///     Some(SignatureScheme::Sha1)
/// );
/// assert_eq!(
///     parse_signature_header("sha256=abcd1234").map(|(scheme, _)| scheme),
///     Some(SignatureScheme::Sha256)
/// );
///
/// // Invalid: missing prefix
/// assert!(parse_signature_header("abcd1234").is_none());
///
/// // Invalid: unrecognized scheme
/// assert!(parse_signature_header("md5=abcd1234").is_none());
///
/// // Invalid: bad hex
/// assert!(parse_signature_header("sha1=xyz").is_none());
/// ```
pub fn parse_signature_header(header: &str) -> Option<(SignatureScheme, Vec<u8>)> {
    let (scheme, hex_sig) = if let Some(rest) = header.strip_prefix("sha256=") {
        (SignatureScheme::Sha256, rest)
    } else if let Some(rest) = header.strip_prefix("sha1=") {
        (SignatureScheme::Sha1, rest)
    } else {
        return None;
    };

    hex::decode(hex_sig).ok().map(|sig| (scheme, sig))
}

/// Computes the HMAC signature of a payload under the given scheme.
///
/// This is useful for testing purposes (generating expected signatures).
pub fn compute_signature(scheme: SignatureScheme, payload: &[u8], secret: &[u8]) -> Vec<u8> {
    match scheme {
        SignatureScheme::Sha1 => {
            let mut mac = HmacSha1::new_from_slice(secret).expect("HMAC can take key of any size");
            mac.update(payload);
            mac.finalize().into_bytes().to_vec()
        }
        SignatureScheme::Sha256 => {
            let mut mac =
                HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
            mac.update(payload);
            mac.finalize().into_bytes().to_vec()
        }
    }
}

/// Formats a signature as a scheme-prefixed header value, e.g.
/// `sha1=<hex>`.
pub fn format_signature_header(scheme: SignatureScheme, signature: &[u8]) -> String {
    format!("{}{}", scheme.prefix(), hex::encode(signature))
}

/// Verifies a webhook signature against the payload and secret.
///
/// Returns `true` if the signature is valid under the scheme its header
/// declares, `false` otherwise. Fails closed: malformed headers and
/// unrecognized schemes verify as `false`, never as an error or panic.
/// Uses constant-time comparison to prevent timing attacks.
///
/// # Arguments
///
/// * `payload` - The raw webhook payload bytes
/// * `signature_header` - The signature header value (e.g., "sha1=...")
/// * `secret` - The shared secret configured with the tracker
///
/// # Examples
///
/// ```
/// use issue_ledger::webhooks::{
///     SignatureScheme, compute_signature, format_signature_header, verify_signature,
/// };
///
/// let payload = b"Hello, World!";
/// let secret = b"my-secret-key";
///
/// let sig = compute_signature(SignatureScheme::Sha1, payload, secret);
/// let header = format_signature_header(SignatureScheme::Sha1, &sig);
///
/// assert!(verify_signature(payload, &header, secret));
/// assert!(!verify_signature(payload, &header, b"wrong-secret"));
/// ```
pub fn verify_signature(payload: &[u8], signature_header: &str, secret: &[u8]) -> bool {
    let Some((scheme, expected_signature)) = parse_signature_header(signature_header) else {
        return false;
    };

    match scheme {
        SignatureScheme::Sha1 => {
            let Ok(mut mac) = HmacSha1::new_from_slice(secret) else {
                return false;
            };
            mac.update(payload);
            mac.verify_slice(&expected_signature).is_ok()
        }
        SignatureScheme::Sha256 => {
            let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
                return false;
            };
            mac.update(payload);
            mac.verify_slice(&expected_signature).is_ok()
        }
    }
}
