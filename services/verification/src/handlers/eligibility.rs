use axum::{Json, extract::State};
use chrono::NaiveDate;
use serde::Deserialize;

use welfare_domain::eligibility::{EligibilityReport, evaluate_detailed};
use welfare_domain::identity::IdentitySet;

use crate::state::AppState;

// ── POST /internal/eligibility ────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct EvaluateEligibilityRequest {
    /// Wider than the tag domain so out-of-range values are dropped, not rejected.
    #[serde(default)]
    pub person_tags: Vec<u64>,
    #[serde(default)]
    pub required_tags: Vec<u64>,
    /// When present and the person declared no age bracket, one is derived from it.
    pub birthday: Option<NaiveDate>,
}

pub async fn evaluate_eligibility(
    State(state): State<AppState>,
    Json(body): Json<EvaluateEligibilityRequest>,
) -> Json<EligibilityReport> {
    let today = state.clock.now().date_naive();
    let person = tag_set(body.person_tags).with_derived_age(body.birthday, today);
    let required = tag_set(body.required_tags);
    Json(evaluate_detailed(&person, &required))
}

fn tag_set(raw: Vec<u64>) -> IdentitySet {
    raw.into_iter().filter_map(|v| u8::try_from(v).ok()).collect()
}
