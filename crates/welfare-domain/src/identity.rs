//! Identity tags describing a person or a benefit's requirements.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One demographic attribute.
///
/// Wire format: `u8` (0 = Unset, 1..=3 age brackets, 4..=11 independent attributes).
/// Age brackets partition a single attribute, so a person holds at most one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum IdentityTag {
    Unset = 0,
    Under20 = 1,
    Age20To65 = 2,
    Over65 = 3,
    Male = 4,
    Female = 5,
    MiddleLowIncome = 6,
    LowIncome = 7,
    Veteran = 8,
    Disability = 9,
    Indigenous = 10,
    ForeignSpouseFamily = 11,
}

impl IdentityTag {
    pub const AGE_BRACKETS: [IdentityTag; 3] = [Self::Under20, Self::Age20To65, Self::Over65];

    pub const INDEPENDENT: [IdentityTag; 8] = [
        Self::Male,
        Self::Female,
        Self::MiddleLowIncome,
        Self::LowIncome,
        Self::Veteran,
        Self::Disability,
        Self::Indigenous,
        Self::ForeignSpouseFamily,
    ];

    /// Convert from `u8` wire value. Returns `None` for unknown values.
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::Unset),
            1 => Some(Self::Under20),
            2 => Some(Self::Age20To65),
            3 => Some(Self::Over65),
            4 => Some(Self::Male),
            5 => Some(Self::Female),
            6 => Some(Self::MiddleLowIncome),
            7 => Some(Self::LowIncome),
            8 => Some(Self::Veteran),
            9 => Some(Self::Disability),
            10 => Some(Self::Indigenous),
            11 => Some(Self::ForeignSpouseFamily),
            _ => None,
        }
    }

    /// Convert to `u8` wire value.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn is_age_bracket(self) -> bool {
        matches!(self, Self::Under20 | Self::Age20To65 | Self::Over65)
    }

    /// Age bracket for a person of the given age in whole years.
    pub fn age_bracket_for(years: u32) -> Self {
        match years {
            0..20 => Self::Under20,
            20..=65 => Self::Age20To65,
            _ => Self::Over65,
        }
    }
}

impl fmt::Display for IdentityTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unset => "unset",
            Self::Under20 => "under_20",
            Self::Age20To65 => "age_20_to_65",
            Self::Over65 => "over_65",
            Self::Male => "male",
            Self::Female => "female",
            Self::MiddleLowIncome => "middle_low_income",
            Self::LowIncome => "low_income",
            Self::Veteran => "veteran",
            Self::Disability => "disability",
            Self::Indigenous => "indigenous",
            Self::ForeignSpouseFamily => "foreign_spouse_family",
        };
        f.write_str(s)
    }
}

/// Error returned when a value cannot be interpreted as an [`IdentityTag`].
#[derive(Debug, Error)]
#[error("unknown identity tag: {0:?}")]
pub struct UnknownIdentityTag(pub String);

impl FromStr for IdentityTag {
    type Err = UnknownIdentityTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unset" => Ok(Self::Unset),
            "under_20" => Ok(Self::Under20),
            "age_20_to_65" => Ok(Self::Age20To65),
            "over_65" => Ok(Self::Over65),
            "male" => Ok(Self::Male),
            "female" => Ok(Self::Female),
            "middle_low_income" => Ok(Self::MiddleLowIncome),
            "low_income" => Ok(Self::LowIncome),
            "veteran" => Ok(Self::Veteran),
            "disability" => Ok(Self::Disability),
            "indigenous" => Ok(Self::Indigenous),
            "foreign_spouse_family" => Ok(Self::ForeignSpouseFamily),
            other => Err(UnknownIdentityTag(other.to_owned())),
        }
    }
}

impl TryFrom<u8> for IdentityTag {
    type Error = UnknownIdentityTag;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        Self::from_u8(v).ok_or_else(|| UnknownIdentityTag(v.to_string()))
    }
}

impl From<IdentityTag> for u8 {
    fn from(tag: IdentityTag) -> Self {
        tag.as_u8()
    }
}

/// Whole years between `birthday` and `today`. Zero for birthdays in the future.
pub fn age_in_years(birthday: NaiveDate, today: NaiveDate) -> u32 {
    today.years_since(birthday).unwrap_or(0)
}

/// A set of identity tags held by a person or required by a benefit.
///
/// Built from raw wire values; values outside the known tag domain are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentitySet(BTreeSet<IdentityTag>);

impl IdentitySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, tag: IdentityTag) -> bool {
        self.0.contains(&tag)
    }

    pub fn iter(&self) -> impl Iterator<Item = IdentityTag> + '_ {
        self.0.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether the person has declared any identity information.
    ///
    /// An empty set, or one holding only [`IdentityTag::Unset`], is undeclared.
    pub fn is_declared(&self) -> bool {
        self.0.iter().any(|t| *t != IdentityTag::Unset)
    }

    pub fn insert(&mut self, tag: IdentityTag) {
        if tag != IdentityTag::Unset {
            self.0.remove(&IdentityTag::Unset);
        }
        self.0.insert(tag);
    }

    /// Add the age bracket derived from `birthday` unless one is already present.
    pub fn with_derived_age(mut self, birthday: Option<NaiveDate>, today: NaiveDate) -> Self {
        if let Some(birthday) = birthday {
            if !self.0.iter().any(|t| t.is_age_bracket()) {
                self.insert(IdentityTag::age_bracket_for(age_in_years(birthday, today)));
            }
        }
        self
    }
}

impl FromIterator<u8> for IdentitySet {
    fn from_iter<I: IntoIterator<Item = u8>>(iter: I) -> Self {
        Self(iter.into_iter().filter_map(IdentityTag::from_u8).collect())
    }
}

impl FromIterator<IdentityTag> for IdentitySet {
    fn from_iter<I: IntoIterator<Item = IdentityTag>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
