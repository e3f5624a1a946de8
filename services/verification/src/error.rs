use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Verification service error variants surfaced over HTTP.
#[derive(Debug, thiserror::Error)]
pub enum VerificationServiceError {
    /// Covers unknown, expired, already-used, wrong-email and wrong-mode codes alike.
    #[error("invalid verification code")]
    InvalidCode,
    #[error("payload does not match code mode")]
    InvalidPayload,
    #[error("step-up verification required")]
    StepUpRequired,
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl VerificationServiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidCode => "INVALID_CODE",
            Self::InvalidPayload => "INVALID_PAYLOAD",
            Self::StepUpRequired => "STEP_UP_REQUIRED",
            Self::Internal(_) => "INTERNAL",
        }
    }
}

impl IntoResponse for VerificationServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::InvalidCode => StatusCode::UNAUTHORIZED,
            Self::InvalidPayload => StatusCode::BAD_REQUEST,
            Self::StepUpRequired => StatusCode::FORBIDDEN,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        // 4xx are expected outcomes; only internal errors carry a cause worth logging.
        if let Self::Internal(ref e) = self {
            tracing::error!(error = %e, kind = "INTERNAL", "internal error");
        }
        let body = serde_json::json!({
            "kind": self.kind(),
            "message": self.to_string(),
        });
        (status, axum::Json(body)).into_response()
    }
}

/// Failure talking to the users service.
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("users service request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("users service returned status {0}")]
    Status(u16),
    #[error("invalid users service url: {0}")]
    Url(String),
}

/// Failure of an expiry side effect. Logged by the sweep and never propagated.
#[derive(Debug, thiserror::Error)]
pub enum SweepError {
    #[error("expiry side effect timed out")]
    Timeout,
    #[error(transparent)]
    Account(#[from] AccountError),
}
