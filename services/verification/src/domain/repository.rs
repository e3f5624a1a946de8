use std::future::Future;

use welfare_domain::id::UserId;

use crate::domain::types::Account;
use crate::error::AccountError;

/// Port to the users service. Only the expiry sweep calls it.
///
/// Futures are `Send` because the sweeper drives them from a spawned task.
pub trait AccountRepository: Send + Sync + 'static {
    fn find_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Option<Account>, AccountError>> + Send;

    /// Delete an account. Returns `true` if deleted, `false` if not found.
    fn delete_by_id(&self, id: UserId) -> impl Future<Output = Result<bool, AccountError>> + Send;
}
