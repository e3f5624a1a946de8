use std::time::Duration;

use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use uuid::Uuid;

use welfare_domain::id::UserId;

use crate::domain::repository::AccountRepository;
use crate::domain::types::Account;
use crate::error::AccountError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(3);

/// [`AccountRepository`] backed by the users service's internal HTTP API.
#[derive(Clone)]
pub struct HttpAccountRepository {
    client: Client,
    base_url: String,
}

impl HttpAccountRepository {
    pub fn new(base_url: &str) -> Result<Self, AccountError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }

    fn users_url(&self) -> String {
        format!("{}/internal/users", self.base_url)
    }
}

#[derive(Deserialize)]
struct AccountBody {
    id: Uuid,
    email: String,
    /// Required: an account whose status is unknown must never look pending.
    is_verified: bool,
}

impl From<AccountBody> for Account {
    fn from(body: AccountBody) -> Self {
        Self {
            id: UserId(body.id),
            email: body.email,
            is_verified: body.is_verified,
        }
    }
}

impl AccountRepository for HttpAccountRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AccountError> {
        let url = Url::parse_with_params(&self.users_url(), &[("email", email)])
            .map_err(|e| AccountError::Url(e.to_string()))?;
        let resp = self.client.get(url).send().await?;
        match resp.status() {
            StatusCode::NOT_FOUND => Ok(None),
            s if s.is_success() => Ok(Some(resp.json::<AccountBody>().await?.into())),
            s => Err(AccountError::Status(s.as_u16())),
        }
    }

    async fn delete_by_id(&self, id: UserId) -> Result<bool, AccountError> {
        let resp = self
            .client
            .delete(format!("{}/{}", self.users_url(), id))
            .send()
            .await?;
        match resp.status() {
            StatusCode::NOT_FOUND => Ok(false),
            s if s.is_success() => Ok(true),
            s => Err(AccountError::Status(s.as_u16())),
        }
    }
}
