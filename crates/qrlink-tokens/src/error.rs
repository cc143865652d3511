/// Reasons a deep-link token is rejected.
///
/// Every variant is terminal for the request that produced it. Messages are
/// deliberately short and never include token material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum VerifyError {
    /// Wrong number of `.`-separated segments, or an oversized token.
    #[error("invalid token format")]
    InvalidFormat,
    /// The payload segment is not canonical base64url or decodes to nothing.
    #[error("invalid token payload")]
    InvalidPayload,
    /// The payload bytes are not a JSON object (or a known field has the wrong type).
    #[error("malformed token payload")]
    MalformedPayload,
    /// `ts` is absent, not an integer, or not positive.
    #[error("missing timestamp")]
    MissingTimestamp,
    #[error("token expired")]
    Expired,
    #[error("invalid signature")]
    InvalidSignature,
}

impl VerifyError {
    /// Stable snake_case name used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidFormat => "invalid_format",
            Self::InvalidPayload => "invalid_payload",
            Self::MalformedPayload => "malformed_payload",
            Self::MissingTimestamp => "missing_timestamp",
            Self::Expired => "expired",
            Self::InvalidSignature => "invalid_signature",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IssueError {
    #[error("extra field `{0}` collides with a reserved payload field")]
    ReservedField(String),
    #[error("system clock is before the unix epoch")]
    ClockBeforeEpoch,
}
