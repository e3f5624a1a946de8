use chrono::Duration;
use serde::Deserialize;

use welfare_core::config::Config;

/// Verification service configuration loaded from environment variables.
#[derive(Debug, Deserialize)]
pub struct VerificationConfig {
    /// TCP port to listen on (default 3114). Env var: `VERIFICATION_PORT`.
    #[serde(default = "default_port")]
    pub verification_port: u16,
    /// Verification code lifetime in minutes (default 5). Env var: `VERIFICATION_CODE_EXPIRES_IN`.
    #[serde(default = "default_ttl_minutes")]
    pub verification_code_expires_in: i64,
    /// Step-up flag lifetime in minutes (default 5). Env var: `STEP_UP_EXPIRES_IN`.
    #[serde(default = "default_ttl_minutes")]
    pub step_up_expires_in: i64,
    /// Users service internal HTTP base URL (e.g. "http://users:3113"). Env var: `ACCOUNTS_BASE_URL`.
    pub accounts_base_url: String,
}

fn default_port() -> u16 {
    3114
}

fn default_ttl_minutes() -> i64 {
    5
}

impl Config for VerificationConfig {}

impl VerificationConfig {
    /// Code lifetime; never shorter than one minute.
    pub fn code_ttl(&self) -> Duration {
        Duration::minutes(self.verification_code_expires_in.max(1))
    }

    /// Step-up flag lifetime; never shorter than one minute.
    pub fn step_up_ttl(&self) -> Duration {
        Duration::minutes(self.step_up_expires_in.max(1))
    }
}
