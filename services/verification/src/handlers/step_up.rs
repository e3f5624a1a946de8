use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use welfare_domain::id::UserId;

use crate::error::VerificationServiceError;
use crate::state::AppState;
use crate::usecase::step_up::{ConfirmStepUpInput, ConfirmStepUpUseCase, GatedActionUseCase};

// ── POST /internal/step-up/confirm ────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ConfirmStepUpRequest {
    pub code: String,
    pub email: String,
}

#[derive(Serialize)]
pub struct ConfirmStepUpResponse {
    pub user_id: UserId,
}

pub async fn confirm_step_up(
    State(state): State<AppState>,
    Json(body): Json<ConfirmStepUpRequest>,
) -> Result<Json<ConfirmStepUpResponse>, VerificationServiceError> {
    let usecase = ConfirmStepUpUseCase {
        codes: state.codes.clone(),
        gate: state.step_up.clone(),
    };
    let user_id = usecase
        .execute(ConfirmStepUpInput {
            code: body.code,
            email: body.email,
        })
        .await?;
    Ok(Json(ConfirmStepUpResponse { user_id }))
}

// ── PUT /internal/step-up/{user_id} ───────────────────────────────────────────

pub async fn set_step_up(State(state): State<AppState>, Path(user_id): Path<Uuid>) -> StatusCode {
    state.step_up.set_verified(UserId(user_id)).await;
    StatusCode::NO_CONTENT
}

// ── POST /internal/step-up/{user_id}/consume ──────────────────────────────────

pub async fn consume_step_up(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<StatusCode, VerificationServiceError> {
    let usecase = GatedActionUseCase {
        gate: state.step_up.clone(),
    };
    usecase.execute(UserId(user_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
