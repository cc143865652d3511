use std::time::{SystemTime, UNIX_EPOCH};

use crate::VerifyError;

/// One week.
pub const DEFAULT_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// Maximum token age.
///
/// `Ttl::UNLIMITED` (zero seconds) turns expiry checking off entirely; that mode exists for
/// compatibility with deployments that configured a TTL of `0` and is not a sensible default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ttl(u64);

impl Ttl {
    pub const UNLIMITED: Ttl = Ttl(0);

    pub const fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    pub const fn as_secs(self) -> u64 {
        self.0
    }

    pub const fn is_unlimited(self) -> bool {
        self.0 == 0
    }

    /// Rejects a token issued at `ts` when `now - ts > ttl`.
    ///
    /// There is no clock-skew leeway: a token issued in the future (negative age) is accepted,
    /// and a token exactly `ttl` seconds old is still valid.
    pub fn check(self, ts: i64, now_unix: i64) -> Result<(), VerifyError> {
        if self.is_unlimited() {
            return Ok(());
        }
        let age = i128::from(now_unix) - i128::from(ts);
        if age > i128::from(self.0) {
            return Err(VerifyError::Expired);
        }
        Ok(())
    }
}

impl Default for Ttl {
    fn default() -> Self {
        Self(DEFAULT_TTL_SECS)
    }
}

/// Current wall-clock time in Unix seconds. Clocks set before 1970 read as `0`.
pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
