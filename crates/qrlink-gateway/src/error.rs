use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use qrlink_tokens::VerifyError;

use crate::delivery::DeliveryError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Verify(#[from] VerifyError),
    /// A required downstream dependency is absent or the configuration cannot produce a
    /// valid response.
    #[error("server misconfiguration")]
    Misconfiguration,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Verify(
                VerifyError::InvalidFormat
                | VerifyError::InvalidPayload
                | VerifyError::MalformedPayload
                | VerifyError::MissingTimestamp,
            ) => StatusCode::BAD_REQUEST,
            Self::Verify(VerifyError::InvalidSignature) => StatusCode::UNAUTHORIZED,
            Self::Verify(VerifyError::Expired) => StatusCode::GONE,
            Self::Misconfiguration => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DeliveryError> for ApiError {
    fn from(err: DeliveryError) -> Self {
        tracing::error!(error = %err, "delivery path unavailable");
        Self::Misconfiguration
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut resp = (self.status(), self.to_string()).into_response();
        resp.headers_mut()
            .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
        resp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_error_policy() {
        let cases = [
            (VerifyError::InvalidFormat, StatusCode::BAD_REQUEST),
            (VerifyError::InvalidPayload, StatusCode::BAD_REQUEST),
            (VerifyError::MalformedPayload, StatusCode::BAD_REQUEST),
            (VerifyError::MissingTimestamp, StatusCode::BAD_REQUEST),
            (VerifyError::InvalidSignature, StatusCode::UNAUTHORIZED),
            (VerifyError::Expired, StatusCode::GONE),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status, "{err:?}");
        }
        assert_eq!(
            ApiError::from(DeliveryError::NotConfigured).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn responses_are_not_cacheable() {
        let resp = ApiError::from(VerifyError::Expired).into_response();
        assert_eq!(resp.status(), StatusCode::GONE);
        assert_eq!(resp.headers()[header::CACHE_CONTROL], "no-store");
    }
}
