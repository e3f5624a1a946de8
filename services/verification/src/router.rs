use axum::{
    Router,
    routing::{get, post, put},
};
use tower::ServiceBuilder;
use tower_http::request_id::PropagateRequestIdLayer;
use tower_http::trace::TraceLayer;

use welfare_core::health::{healthz, readyz};
use welfare_core::middleware::request_id_layer;

use crate::handlers::{
    code::{create_code, verify_code},
    eligibility::evaluate_eligibility,
    step_up::{confirm_step_up, consume_step_up, set_step_up},
};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Verification codes
        .route("/internal/codes", post(create_code))
        .route("/internal/codes/verify", post(verify_code))
        // Step-up gate
        .route("/internal/step-up/confirm", post(confirm_step_up))
        .route("/internal/step-up/{user_id}", put(set_step_up))
        .route("/internal/step-up/{user_id}/consume", post(consume_step_up))
        // Eligibility
        .route("/internal/eligibility", post(evaluate_eligibility))
        .layer(
            ServiceBuilder::new()
                .layer(request_id_layer())
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
        .with_state(state)
}
