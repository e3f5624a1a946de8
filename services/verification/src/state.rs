use std::sync::Arc;

use axum::extract::FromRef;

use welfare_core::clock::Clock;
use welfare_core::health::Readiness;

use crate::config::VerificationConfig;
use crate::infra::account::HttpAccountRepository;
use crate::usecase::code::CodeStore;
use crate::usecase::step_up::StepUpGate;

/// Shared application state passed to every handler via axum `State`.
///
/// Owns the process-wide code and step-up stores; clones share them.
#[derive(Clone)]
pub struct AppState {
    pub codes: CodeStore<HttpAccountRepository>,
    pub step_up: StepUpGate,
    pub clock: Arc<dyn Clock>,
    pub readiness: Readiness,
}

impl AppState {
    pub fn new(
        config: &VerificationConfig,
        clock: Arc<dyn Clock>,
        accounts: HttpAccountRepository,
    ) -> Self {
        Self {
            codes: CodeStore::new(config.code_ttl(), clock.clone(), accounts),
            step_up: StepUpGate::new(config.step_up_ttl(), clock.clone()),
            clock,
            readiness: Readiness::default(),
        }
    }
}

impl FromRef<AppState> for Readiness {
    fn from_ref(state: &AppState) -> Self {
        state.readiness.clone()
    }
}
