use axum::{Json, extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use welfare_core::serde::to_rfc3339_ms;
use welfare_domain::id::{FamilyId, UserId};

use crate::domain::types::{CodeMode, CodePayload};
use crate::error::VerificationServiceError;
use crate::state::AppState;

// ── POST /internal/codes ──────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreateCodeRequest {
    pub mode: CodeMode,
    pub email: String,
    pub user_id: Option<UserId>,
    pub family_id: Option<FamilyId>,
}

#[derive(Serialize)]
pub struct CreateCodeResponse {
    pub code: String,
    #[serde(serialize_with = "to_rfc3339_ms")]
    pub expires_at: DateTime<Utc>,
}

pub async fn create_code(
    State(state): State<AppState>,
    Json(body): Json<CreateCodeRequest>,
) -> Result<(StatusCode, Json<CreateCodeResponse>), VerificationServiceError> {
    let payload = CodePayload::for_mode(body.mode, body.user_id, body.family_id)
        .ok_or(VerificationServiceError::InvalidPayload)?;
    let issued = state.codes.generate_code(payload, body.email).await;
    Ok((
        StatusCode::CREATED,
        Json(CreateCodeResponse {
            code: issued.code,
            expires_at: issued.expires_at,
        }),
    ))
}

// ── POST /internal/codes/verify ───────────────────────────────────────────────

#[derive(Deserialize)]
pub struct VerifyCodeRequest {
    pub mode: CodeMode,
    pub code: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyCodeResponse {
    pub mode: CodeMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family_id: Option<FamilyId>,
}

impl From<CodePayload> for VerifyCodeResponse {
    fn from(payload: CodePayload) -> Self {
        Self {
            mode: payload.mode(),
            user_id: payload.user_id(),
            family_id: payload.family_id(),
        }
    }
}

pub async fn verify_code(
    State(state): State<AppState>,
    Json(body): Json<VerifyCodeRequest>,
) -> Result<Json<VerifyCodeResponse>, VerificationServiceError> {
    let payload = state
        .codes
        .verify_code_for(body.mode, &body.code, &body.email)
        .await
        .ok_or(VerificationServiceError::InvalidCode)?;
    Ok(Json(payload.into()))
}
