use rand::RngCore;
use serde_json::Value;

use crate::codec::{encode_segment, TokenParts};
use crate::expiry::unix_now;
use crate::signature::SigningKey;
use crate::{IssueError, Payload};

/// Random bytes per nonce (12 base64url characters).
pub const NONCE_LEN: usize = 9;

/// Mints deep-link tokens and the links that carry them.
#[derive(Debug, Clone)]
pub struct Issuer {
    key: Option<SigningKey>,
    link_base: String,
}

impl Issuer {
    /// `link_base` is the resolvable URL the token is appended to as `?t=<token>`.
    pub fn new(key: Option<SigningKey>, link_base: impl AsRef<str>) -> Self {
        Self {
            key,
            link_base: link_base.as_ref().trim_end_matches('/').to_owned(),
        }
    }

    pub fn link_base(&self) -> &str {
        &self.link_base
    }

    /// Signs `payload` as `<sig>.<payload>.<nonce>`.
    pub fn mint(key: &SigningKey, payload: &Payload, nonce: &str) -> String {
        let canonical = payload.canonical_bytes();
        TokenParts {
            signature: &key.sign(&canonical),
            payload: &encode_segment(&canonical),
            nonce,
        }
        .join()
    }

    /// Builds a signed link for `email` issued at `now_unix`.
    ///
    /// Extras whose value is `None` are dropped. Without a signing key there is nothing to
    /// sign, and the bare link base is returned.
    pub fn signed_link_at<'a, I, V>(
        &self,
        email: &str,
        extras: I,
        now_unix: i64,
    ) -> Result<String, IssueError>
    where
        I: IntoIterator<Item = (&'a str, Option<V>)>,
        V: Into<Value>,
    {
        let Some(key) = &self.key else {
            tracing::warn!("no signing secret configured; issuing unsigned link");
            return Ok(self.link_base.clone());
        };

        let mut payload = Payload::new(now_unix).with_email(email);
        for (name, value) in extras {
            if let Some(value) = value {
                payload = payload.with_extra(name, value)?;
            }
        }

        let token = Self::mint(key, &payload, &random_nonce());
        Ok(format!("{}?t={token}", self.link_base))
    }

    pub fn signed_link<'a, I, V>(&self, email: &str, extras: I) -> Result<String, IssueError>
    where
        I: IntoIterator<Item = (&'a str, Option<V>)>,
        V: Into<Value>,
    {
        let now = unix_now();
        if now <= 0 {
            return Err(IssueError::ClockBeforeEpoch);
        }
        self.signed_link_at(email, extras, now)
    }
}

/// base64url (no padding) of [`NONCE_LEN`] random bytes.
pub fn random_nonce() -> String {
    let mut bytes = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut bytes);
    encode_segment(bytes)
}
