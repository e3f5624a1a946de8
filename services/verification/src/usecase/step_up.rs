use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Duration;
use tracing::debug;

use welfare_core::clock::Clock;
use welfare_domain::id::UserId;

use crate::domain::repository::AccountRepository;
use crate::domain::types::{CodeMode, CodePayload, StepUpFlag};
use crate::error::VerificationServiceError;
use crate::infra::ttl_store::{NoopExpiry, SweeperHandle, TtlStore};
use crate::usecase::code::CodeStore;

/// Single-use "recently passed a second factor" flags keyed by user.
#[derive(Clone)]
pub struct StepUpGate {
    inner: Arc<TtlStore<UserId, StepUpFlag>>,
}

impl StepUpGate {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(TtlStore::new("step_up_flags", ttl, clock, NoopExpiry)),
        }
    }

    /// Open the gate for `user_id`, replacing any earlier flag.
    pub async fn set_verified(&self, user_id: UserId) {
        let set_at = self.inner.now();
        let expires_at = self.inner.insert(user_id, StepUpFlag { set_at }).await;
        debug!(%user_id, %expires_at, "step-up flag set");
    }

    /// Close the gate and report whether it was open.
    ///
    /// Exactly one caller can observe `true` per [`StepUpGate::set_verified`].
    pub async fn consume_if_verified(&self, user_id: UserId) -> bool {
        match self.inner.take(&user_id).await {
            Some(flag) => {
                let age_ms = (self.inner.now() - flag.set_at).num_milliseconds();
                debug!(%user_id, age_ms, "step-up flag consumed");
                true
            }
            None => false,
        }
    }

    pub async fn sweep(&self) -> usize {
        self.inner.sweep().await
    }

    pub fn spawn_sweeper(&self, period: StdDuration) -> SweeperHandle {
        self.inner.spawn_sweeper(period)
    }
}

pub struct ConfirmStepUpInput {
    pub code: String,
    pub email: String,
}

/// Trade a step-up OTP for an open gate.
pub struct ConfirmStepUpUseCase<R> {
    pub codes: CodeStore<R>,
    pub gate: StepUpGate,
}

impl<R: AccountRepository> ConfirmStepUpUseCase<R> {
    pub async fn execute(
        &self,
        input: ConfirmStepUpInput,
    ) -> Result<UserId, VerificationServiceError> {
        let payload = self
            .codes
            .verify_code_for(CodeMode::StepUpConfirmation, &input.code, &input.email)
            .await
            .ok_or(VerificationServiceError::InvalidCode)?;

        let CodePayload::StepUpConfirmation { user_id } = payload else {
            return Err(
                anyhow::anyhow!("step-up code carried {:?} payload", payload.mode()).into(),
            );
        };

        self.gate.set_verified(user_id).await;
        Ok(user_id)
    }
}

/// Run a sensitive action only if the user's step-up gate is open, closing it.
pub struct GatedActionUseCase {
    pub gate: StepUpGate,
}

impl GatedActionUseCase {
    pub async fn execute(&self, user_id: UserId) -> Result<(), VerificationServiceError> {
        if self.gate.consume_if_verified(user_id).await {
            Ok(())
        } else {
            Err(VerificationServiceError::StepUpRequired)
        }
    }
}
