use hmac::{Hmac, Mac as _};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::codec::{encode_segment, SIGNATURE_B64_LEN};
use crate::VerifyError;

type HmacSha256 = Hmac<Sha256>;

/// Shared HMAC-SHA256 secret.
///
/// Never empty: an unset secret is modelled as `Option<SigningKey>::None` by callers.
#[derive(Clone)]
pub struct SigningKey {
    secret: Vec<u8>,
}

impl SigningKey {
    /// Returns `None` for an empty (or all-whitespace) secret.
    pub fn new(secret: impl AsRef<[u8]>) -> Option<Self> {
        let secret = secret.as_ref();
        if secret.iter().all(u8::is_ascii_whitespace) {
            return None;
        }
        Some(Self {
            secret: secret.to_vec(),
        })
    }

    fn mac(&self) -> HmacSha256 {
        // HMAC accepts keys of any length; `new_from_slice` only fails for fixed-size MACs.
        match HmacSha256::new_from_slice(&self.secret) {
            Ok(mac) => mac,
            Err(_) => unreachable!("HMAC-SHA256 accepts keys of any length"),
        }
    }

    /// `base64url_nopad(HMAC-SHA256(secret, canonical))`.
    pub fn sign(&self, canonical: &[u8]) -> String {
        let mut mac = self.mac();
        mac.update(canonical);
        encode_segment(mac.finalize().into_bytes())
    }

    /// Compares the encoded signature against the expected one in constant time.
    ///
    /// The comparison is over the base64url text, so any altered character fails, including
    /// changes confined to the unused bits of the final character.
    pub fn verify(&self, canonical: &[u8], signature_b64: &str) -> Result<(), VerifyError> {
        let expected = self.sign(canonical);
        debug_assert_eq!(expected.len(), SIGNATURE_B64_LEN);
        if constant_time_equal(expected.as_bytes(), signature_b64.as_bytes()) {
            Ok(())
        } else {
            Err(VerifyError::InvalidSignature)
        }
    }
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey").finish_non_exhaustive()
    }
}

fn constant_time_equal(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    bool::from(a.ct_eq(b))
}
