//! Three-segment token framing: `<signature_b64url>.<payload_b64url>.<nonce>`.

use base64::{engine::general_purpose, Engine as _};

use crate::VerifyError;

/// Upper bound on the raw token length accepted by [`TokenParts::split`].
///
/// QR payloads are small; anything past this is rejected before the string is scanned for
/// delimiters.
pub const MAX_TOKEN_LEN: usize = 8 * 1024;

/// Base64url without padding for a 32-byte HMAC-SHA256 tag.
pub const SIGNATURE_B64_LEN: usize = 43;

/// Borrowed view of the three token segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenParts<'a> {
    pub signature: &'a str,
    pub payload: &'a str,
    pub nonce: &'a str,
}

impl<'a> TokenParts<'a> {
    /// Splits a raw token on `.`. Anything other than exactly three segments is
    /// [`VerifyError::InvalidFormat`].
    pub fn split(token: &'a str) -> Result<Self, VerifyError> {
        if token.len() > MAX_TOKEN_LEN {
            return Err(VerifyError::InvalidFormat);
        }
        let mut parts = token.split('.');
        let (Some(signature), Some(payload), Some(nonce)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(VerifyError::InvalidFormat);
        };
        if parts.next().is_some() {
            return Err(VerifyError::InvalidFormat);
        }
        Ok(Self {
            signature,
            payload,
            nonce,
        })
    }

    /// Decodes the payload segment into the raw bytes the issuer encoded.
    pub fn decode_payload(&self) -> Result<Vec<u8>, VerifyError> {
        decode_segment(self.payload).ok_or(VerifyError::InvalidPayload)
    }

    pub fn join(&self) -> String {
        format!("{}.{}.{}", self.signature, self.payload, self.nonce)
    }
}

/// Encodes bytes as base64url without padding.
pub fn encode_segment(bytes: impl AsRef<[u8]>) -> String {
    general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Decodes an unpadded base64url segment.
///
/// Padding is restored to the next multiple of four before decoding. Only the canonical
/// spelling of a byte string is accepted, and an empty result is treated as a failure.
pub fn decode_segment(raw: &str) -> Option<Vec<u8>> {
    if raw.is_empty() || raw.len() > MAX_TOKEN_LEN {
        return None;
    }
    let mut padded = String::with_capacity(raw.len() + 3);
    padded.push_str(raw);
    while padded.len() % 4 != 0 {
        padded.push('=');
    }
    let decoded = general_purpose::URL_SAFE.decode(&padded).ok()?;
    // Stray padding or set trailing bits give a second spelling of the same bytes.
    (!decoded.is_empty() && encode_segment(&decoded) == raw).then_some(decoded)
}
