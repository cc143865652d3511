use url::form_urlencoded;

use crate::Payload;

/// Base URL that verified scans are redirected to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectBase(String);

impl RedirectBase {
    /// Trailing slashes are dropped so `https://app/` and `https://app` redirect identically.
    pub fn new(base: impl AsRef<str>) -> Self {
        Self(base.as_ref().trim_end_matches('/').to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `<base>/?e=<urlencoded e or "">&ts=<ts>`.
    ///
    /// Only `e` and `ts` leave the verifier; the rest of the signed payload is never forwarded
    /// to the redirect target.
    pub fn location_for(&self, payload: &Payload) -> String {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("e", payload.email().unwrap_or(""))
            .append_pair("ts", &payload.ts().to_string())
            .finish();
        format!("{}/?{query}", self.0)
    }
}
