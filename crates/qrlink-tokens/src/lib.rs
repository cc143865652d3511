//! Signed, time-bounded deep-link tokens for QR codes.
//!
//! A token is `<signature>.<payload>.<nonce>` where
//! - `payload` is base64url (no padding) of the payload object in canonical form v1
//!   (see [`canonical`]),
//! - `signature` is base64url (no padding) of `HMAC-SHA256(secret, canonical payload)`,
//! - `nonce` is opaque and never checked.
//!
//! The payload carries `ts` (issue time, Unix seconds, required) and `e` (recipient, optional)
//! plus any other signed context. [`Verifier`] checks a token and derives the redirect target;
//! [`Issuer`] mints tokens in the same form.

pub mod canonical;
pub mod codec;
mod error;
mod expiry;
mod issue;
mod payload;
mod redirect;
mod signature;
mod verify;

pub use error::{IssueError, VerifyError};
pub use expiry::{unix_now, Ttl, DEFAULT_TTL_SECS};
pub use issue::{random_nonce, Issuer, NONCE_LEN};
pub use payload::{Payload, EMAIL_FIELD, TIMESTAMP_FIELD};
pub use redirect::RedirectBase;
pub use signature::SigningKey;
pub use verify::{SignatureMode, VerifiedLink, Verifier};
