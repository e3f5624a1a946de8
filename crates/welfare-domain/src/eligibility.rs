//! Matching a person's identity tags against a benefit's requirements.

use serde::{Deserialize, Serialize};

use crate::identity::{IdentitySet, IdentityTag};

/// Tri-state eligibility verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Eligibility {
    Eligible,
    NotEligible,
    /// The person has not declared identity information.
    Unknown,
}

/// Evaluate whether a benefit requiring `required` applies to a person holding `person`.
///
/// Age brackets form one either/or group: when the benefit names any bracket the person
/// must hold one of the named brackets. Every other required tag must be held outright.
/// [`IdentityTag::Unset`] in `required` is not a requirement.
pub fn evaluate(person: &IdentitySet, required: &IdentitySet) -> Eligibility {
    if !person.is_declared() {
        return Eligibility::Unknown;
    }

    let mut required_ages = required.iter().filter(|t| t.is_age_bracket()).peekable();
    if required_ages.peek().is_some() && !required_ages.any(|t| person.contains(t)) {
        return Eligibility::NotEligible;
    }

    let missing = IdentityTag::INDEPENDENT
        .into_iter()
        .find(|t| required.contains(*t) && !person.contains(*t));
    match missing {
        Some(_) => Eligibility::NotEligible,
        None => Eligibility::Eligible,
    }
}

/// One unmet requirement group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Mismatch {
    /// The benefit names these brackets and the person holds none of them.
    AgeBracket { required: Vec<IdentityTag> },
    /// A required independent tag the person does not hold.
    Missing { tag: IdentityTag },
}

/// Verdict plus every unmet requirement behind it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityReport {
    pub eligibility: Eligibility,
    pub mismatches: Vec<Mismatch>,
}

/// Like [`evaluate`], but keeps going after the first failure and lists each one.
///
/// `mismatches` is empty unless the verdict is [`Eligibility::NotEligible`].
pub fn evaluate_detailed(person: &IdentitySet, required: &IdentitySet) -> EligibilityReport {
    if !person.is_declared() {
        return EligibilityReport {
            eligibility: Eligibility::Unknown,
            mismatches: Vec::new(),
        };
    }

    let mut mismatches = Vec::new();

    let required_ages: Vec<IdentityTag> =
        required.iter().filter(|t| t.is_age_bracket()).collect();
    if !required_ages.is_empty() && !required_ages.iter().any(|t| person.contains(*t)) {
        mismatches.push(Mismatch::AgeBracket {
            required: required_ages,
        });
    }

    mismatches.extend(
        IdentityTag::INDEPENDENT
            .into_iter()
            .filter(|t| required.contains(*t) && !person.contains(*t))
            .map(|tag| Mismatch::Missing { tag }),
    );

    let eligibility = if mismatches.is_empty() {
        Eligibility::Eligible
    } else {
        Eligibility::NotEligible
    };
    EligibilityReport {
        eligibility,
        mismatches,
    }
}

/// Convenience wrapper over [`evaluate`] for raw wire values.
pub fn evaluate_tags<P, R>(person: P, required: R) -> Eligibility
where
    P: IntoIterator<Item = u8>,
    R: IntoIterator<Item = u8>,
{
    evaluate(&person.into_iter().collect(), &required.into_iter().collect())
}
