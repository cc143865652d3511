use std::sync::Arc;

use axum::extract::{RawQuery, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::error::ApiError;
use crate::AppState;

/// `GET /verify?t=<token>`: 302 to the application on success.
///
/// A missing `t` is treated as an empty token and fails format validation. When `t` repeats,
/// the first occurrence is used.
pub(crate) async fn verify_get(
    State(state): State<Arc<AppState>>,
    RawQuery(query): RawQuery,
) -> Result<Response, ApiError> {
    let token = query.as_deref().and_then(token_param).unwrap_or_default();
    let span = tracing::Span::current();

    let verified = state.verifier.verify(&token).map_err(|err| {
        span.record("outcome", err.kind());
        tracing::info!(reason = err.kind(), "token rejected");
        ApiError::from(err)
    })?;

    let location = HeaderValue::from_str(&verified.location).map_err(|_| {
        span.record("outcome", "server_misconfiguration");
        tracing::error!("redirect location is not a valid header value");
        ApiError::Misconfiguration
    })?;

    span.record("outcome", "redirected");
    tracing::debug!(ts = verified.payload.ts(), "token verified");

    Ok((
        StatusCode::FOUND,
        [
            (header::LOCATION, location),
            (header::CACHE_CONTROL, HeaderValue::from_static("no-store")),
        ],
    )
        .into_response())
}

fn token_param(query: &str) -> Option<String> {
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(name, _)| name == "t")
        .map(|(_, value)| value.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_param_takes_first_t() {
        assert_eq!(token_param("t=a.b.c&t=d.e.f").as_deref(), Some("a.b.c"));
        assert_eq!(token_param("x=1&t=a%2Eb.c").as_deref(), Some("a.b.c"));
        assert_eq!(token_param("x=1"), None);
        assert_eq!(token_param("t").as_deref(), Some(""));
    }
}
