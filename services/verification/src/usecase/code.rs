use std::sync::{Arc, Weak};
use std::time::Duration as StdDuration;

use chrono::Duration;
use rand::RngExt;
use tracing::{debug, info, warn};

use welfare_core::clock::Clock;
use welfare_domain::id::UserId;

use crate::domain::repository::AccountRepository;
use crate::domain::types::{
    CODE_CHARSET, CODE_LEN, CodeMode, CodePayload, CodeRecord, IssuedCode,
};
use crate::error::SweepError;
use crate::infra::ttl_store::{ExpiryHandler, SweeperHandle, Take, TtlStore};

/// Draw a code from the thread-local CSPRNG.
pub fn generate_code() -> String {
    let mut rng = rand::rng();
    (0..CODE_LEN)
        .map(|_| CODE_CHARSET[rng.random_range(0..CODE_CHARSET.len())] as char)
        .collect()
}

/// Codes are typed by hand; tolerate stray whitespace and lowercase input.
fn normalize(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

type CodeTable<R> = TtlStore<String, CodeRecord, ExpiredCodeHandler<R>>;

/// Expiry side effect for verification codes.
///
/// An unconfirmed registration whose activation code lapses is treated as abandoned
/// and its account is deleted, unless a resent activation code for the same user is
/// still live. Other modes only lose the code.
pub struct ExpiredCodeHandler<R> {
    accounts: R,
    codes: Weak<CodeTable<R>>,
}

impl<R: AccountRepository> ExpiredCodeHandler<R> {
    /// Whether another live activation code still points at `user_id`.
    async fn has_live_activation(&self, user_id: UserId) -> bool {
        let Some(codes) = self.codes.upgrade() else {
            return false;
        };
        codes
            .any_live(|record| {
                matches!(
                    record.payload,
                    CodePayload::AccountActivation { user_id: pending } if pending == user_id
                )
            })
            .await
    }

    async fn reclaim_registration(&self, user_id: UserId, email: &str) -> Result<(), SweepError> {
        let Some(account) = self.accounts.find_by_email(email).await? else {
            debug!(%user_id, "pending registration already removed");
            return Ok(());
        };
        if account.id != user_id {
            warn!(
                %user_id,
                found = %account.id,
                "email now belongs to another account, keeping it"
            );
            return Ok(());
        }
        if account.is_verified {
            debug!(%user_id, "account was activated by another code, keeping it");
            return Ok(());
        }
        if self.has_live_activation(user_id).await {
            debug!(%user_id, "activation code was resent, keeping registration");
            return Ok(());
        }
        let deleted = self.accounts.delete_by_id(account.id).await?;
        info!(%user_id, deleted, "reclaimed abandoned registration");
        Ok(())
    }
}

impl<R: AccountRepository> ExpiryHandler<String, CodeRecord> for ExpiredCodeHandler<R> {
    async fn on_expired(&self, _code: String, record: CodeRecord) -> Result<(), SweepError> {
        match record.payload {
            CodePayload::AccountActivation { user_id } => {
                self.reclaim_registration(user_id, &record.email).await
            }
            CodePayload::FamilyInvite { family_id } => {
                debug!(%family_id, "family invite code expired");
                Ok(())
            }
            CodePayload::StepUpConfirmation { user_id } => {
                debug!(%user_id, "step-up code expired");
                Ok(())
            }
        }
    }
}

/// Store of one-time verification codes keyed by the code string.
pub struct CodeStore<R> {
    inner: Arc<CodeTable<R>>,
}

impl<R> Clone for CodeStore<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: AccountRepository> CodeStore<R> {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>, accounts: R) -> Self {
        let inner = Arc::new_cyclic(|codes| {
            TtlStore::new(
                "verification_codes",
                ttl,
                clock,
                ExpiredCodeHandler {
                    accounts,
                    codes: Weak::clone(codes),
                },
            )
        });
        Self { inner }
    }

    /// Issue a fresh code bound to `payload` and `email`.
    ///
    /// Delivering the code to the user is the caller's job.
    pub async fn generate_code(
        &self,
        payload: CodePayload,
        email: impl Into<String>,
    ) -> IssuedCode {
        let record = CodeRecord {
            payload,
            email: email.into(),
        };
        let (code, expires_at) = self.inner.insert_unique(generate_code, record).await;
        debug!(mode = ?payload.mode(), %expires_at, "verification code issued");
        IssuedCode { code, expires_at }
    }

    /// Consume `code` if it is live and was issued to `email`.
    ///
    /// Every failure looks the same to the caller; only the debug log tells them apart.
    pub async fn verify_code(&self, code: &str, email: &str) -> Option<CodePayload> {
        self.consume(code, email, None).await
    }

    /// Like [`CodeStore::verify_code`], but a code issued for another mode is rejected
    /// and left unconsumed.
    pub async fn verify_code_for(
        &self,
        mode: CodeMode,
        code: &str,
        email: &str,
    ) -> Option<CodePayload> {
        self.consume(code, email, Some(mode)).await
    }

    async fn consume(
        &self,
        code: &str,
        email: &str,
        mode: Option<CodeMode>,
    ) -> Option<CodePayload> {
        let code = normalize(code);
        let mut reason = "email_mismatch";
        let outcome = self
            .inner
            .take_if(code.as_str(), |record| {
                if record.email != email {
                    return false;
                }
                if mode.is_some_and(|m| m != record.mode()) {
                    reason = "mode_mismatch";
                    return false;
                }
                true
            })
            .await;

        let reason = match outcome {
            Take::Taken(record) => {
                debug!(mode = ?record.mode(), "verification code consumed");
                return Some(record.payload);
            }
            Take::Missing => "not_found",
            Take::Expired => "expired",
            Take::Rejected => reason,
        };
        debug!(reason, "verification code rejected");
        None
    }

    pub async fn sweep(&self) -> usize {
        self.inner.sweep().await
    }

    pub fn spawn_sweeper(&self, period: StdDuration) -> SweeperHandle {
        self.inner.spawn_sweeper(period)
    }

    /// Number of stored codes, including expired ones not yet swept.
    pub async fn len(&self) -> usize {
        self.inner.len().await
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.is_empty().await
    }
}
