use serde_json::{Map, Value};

use crate::canonical::object_to_canonical_vec;
use crate::{IssueError, VerifyError};

pub const TIMESTAMP_FIELD: &str = "ts";
pub const EMAIL_FIELD: &str = "e";

/// Decoded token payload.
///
/// `ts` and `e` are validated and typed. Every other field is kept verbatim in `extra`: the
/// verifier never interprets those fields, but they were signed, so they take part in
/// [`Payload::canonical_bytes`].
#[derive(Debug, Clone, PartialEq)]
pub struct Payload {
    ts: i64,
    e: Option<String>,
    extra: Map<String, Value>,
}

impl Payload {
    pub fn new(ts: i64) -> Self {
        Self {
            ts,
            e: None,
            extra: Map::new(),
        }
    }

    pub fn with_email(mut self, e: impl Into<String>) -> Self {
        self.e = Some(e.into());
        self
    }

    /// Adds an extra signed field. `ts` and `e` are reserved.
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Result<Self, IssueError> {
        let key = key.into();
        if key == TIMESTAMP_FIELD || key == EMAIL_FIELD {
            return Err(IssueError::ReservedField(key));
        }
        self.extra.insert(key, value.into());
        Ok(self)
    }

    /// Parses payload bytes.
    ///
    /// Bytes that are not a JSON object, or an `e` that is not a string, are
    /// [`VerifyError::MalformedPayload`]. A `ts` that is absent, not an integer, or not
    /// positive is [`VerifyError::MissingTimestamp`].
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, VerifyError> {
        let value: Value = serde_json::from_slice(bytes).map_err(|_| VerifyError::MalformedPayload)?;
        let Value::Object(mut extra) = value else {
            return Err(VerifyError::MalformedPayload);
        };

        let e = match extra.remove(EMAIL_FIELD) {
            None => None,
            Some(Value::String(e)) => Some(e),
            Some(_) => return Err(VerifyError::MalformedPayload),
        };

        let ts = extra
            .remove(TIMESTAMP_FIELD)
            .and_then(|v| v.as_i64())
            .filter(|&ts| ts > 0)
            .ok_or(VerifyError::MissingTimestamp)?;

        Ok(Self { ts, e, extra })
    }

    /// Issue time, in Unix seconds.
    pub fn ts(&self) -> i64 {
        self.ts
    }

    pub fn email(&self) -> Option<&str> {
        self.e.as_deref()
    }

    /// Signed fields other than `ts` and `e`.
    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    /// The exact bytes covered by the signature (canonical form v1).
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let ts = Value::from(self.ts);
        let e = self.e.clone().map(Value::String);
        let known = std::iter::once((TIMESTAMP_FIELD, &ts))
            .chain(e.as_ref().map(|e| (EMAIL_FIELD, e)));
        object_to_canonical_vec(known.chain(self.extra.iter().map(|(k, v)| (k.as_str(), v))))
    }
}
