use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use welfare_domain::id::{FamilyId, UserId};

/// Verification code length in characters.
pub const CODE_LEN: usize = 6;

/// Charset for generating random verification codes (uppercase alphanumeric).
pub const CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// What a verification code is for, and what happens when it expires unconsumed.
///
/// Wire format: `u8` (1 = AccountActivation, 2 = FamilyInvite, 3 = StepUpConfirmation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum CodeMode {
    AccountActivation = 1,
    FamilyInvite = 2,
    StepUpConfirmation = 3,
}

impl CodeMode {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            1 => Some(Self::AccountActivation),
            2 => Some(Self::FamilyInvite),
            3 => Some(Self::StepUpConfirmation),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

#[derive(Debug, Error)]
#[error("unknown code mode: {0}")]
pub struct UnknownCodeMode(pub u8);

impl TryFrom<u8> for CodeMode {
    type Error = UnknownCodeMode;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        Self::from_u8(v).ok_or(UnknownCodeMode(v))
    }
}

impl From<CodeMode> for u8 {
    fn from(mode: CodeMode) -> Self {
        mode.as_u8()
    }
}

/// Mode-specific association carried by a code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodePayload {
    /// Pending registration; the account is reclaimed if the code expires.
    AccountActivation { user_id: UserId },
    FamilyInvite { family_id: FamilyId },
    /// Second-factor OTP; a successful verify opens the step-up gate for `user_id`.
    StepUpConfirmation { user_id: UserId },
}

impl CodePayload {
    pub fn mode(&self) -> CodeMode {
        match self {
            Self::AccountActivation { .. } => CodeMode::AccountActivation,
            Self::FamilyInvite { .. } => CodeMode::FamilyInvite,
            Self::StepUpConfirmation { .. } => CodeMode::StepUpConfirmation,
        }
    }

    /// Build the payload for `mode` from whichever ids the caller supplied.
    /// Returns `None` when the id the mode needs is missing.
    pub fn for_mode(
        mode: CodeMode,
        user_id: Option<UserId>,
        family_id: Option<FamilyId>,
    ) -> Option<Self> {
        match mode {
            CodeMode::AccountActivation => {
                user_id.map(|user_id| Self::AccountActivation { user_id })
            }
            CodeMode::FamilyInvite => family_id.map(|family_id| Self::FamilyInvite { family_id }),
            CodeMode::StepUpConfirmation => {
                user_id.map(|user_id| Self::StepUpConfirmation { user_id })
            }
        }
    }

    pub fn user_id(&self) -> Option<UserId> {
        match self {
            Self::AccountActivation { user_id } | Self::StepUpConfirmation { user_id } => {
                Some(*user_id)
            }
            Self::FamilyInvite { .. } => None,
        }
    }

    pub fn family_id(&self) -> Option<FamilyId> {
        match self {
            Self::FamilyInvite { family_id } => Some(*family_id),
            _ => None,
        }
    }
}

/// A live verification code's stored association. The code string itself is the store key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeRecord {
    pub payload: CodePayload,
    /// Address the code was delivered to; verification must present the same one.
    pub email: String,
}

impl CodeRecord {
    pub fn mode(&self) -> CodeMode {
        self.payload.mode()
    }
}

/// A freshly generated code, ready to hand to a notification sender.
#[derive(Debug, Clone)]
pub struct IssuedCode {
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

/// Proof that a user recently passed a second-factor check.
#[derive(Debug, Clone, Copy)]
pub struct StepUpFlag {
    pub set_at: DateTime<Utc>,
}

/// The slice of a user record the expiry sweep needs.
#[derive(Debug, Clone)]
pub struct Account {
    pub id: UserId,
    pub email: String,
    pub is_verified: bool,
}
