// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

mod household;
mod relationship;
mod requester;
mod resident;

pub use household::{
    Classification, ClassificationFlags, Household, HouseholdId, HouseholdMember, IncomeBracket,
    NewHousehold, NewMember, HOUSEHOLD_NUMBER_MAX_LEN,
};
pub use relationship::Relationship;
pub use requester::RequesterFields;
pub use resident::{NewResident, Resident, ResidentId, ID_MAX_LEN, NAME_MAX_LEN};

use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParseError {
    Empty(&'static str),
    Trimmed(&'static str),
    TooLong(&'static str, usize),
    InvalidFormat(&'static str, String),
}

impl ParseError {
    /// Field the error refers to, for caller-facing field reporting.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::Empty(name) | Self::Trimmed(name) | Self::TooLong(name, _) => name,
            Self::InvalidFormat(name, _) => name,
        }
    }
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty(name) => write!(f, "{name} must not be empty"),
            Self::Trimmed(name) => {
                write!(f, "{name} must not contain leading/trailing whitespace")
            }
            Self::TooLong(name, max) => write!(f, "{name} exceeds max length {max}"),
            Self::InvalidFormat(name, msg) => write!(f, "{name}: {msg}"),
        }
    }
}

impl std::error::Error for ParseError {}

pub(crate) fn parse_id_component(
    input: &str,
    name: &'static str,
    max_len: usize,
) -> Result<String, ParseError> {
    if input.is_empty() {
        return Err(ParseError::Empty(name));
    }
    if input.trim() != input {
        return Err(ParseError::Trimmed(name));
    }
    if input.len() > max_len {
        return Err(ParseError::TooLong(name, max_len));
    }
    Ok(input.to_string())
}

/// Shape check for `YYYY-MM-DD` dates. Calendar-exact day validation (leap
/// years, 30-day months) is left to the intake layer that owns resident
/// creation; this core only rejects values that cannot be a date at all.
pub(crate) fn validate_birth_date(input: &str, name: &'static str) -> Result<(), ParseError> {
    let parts: Vec<&str> = input.split('-').collect();
    let [year, month, day] = parts.as_slice() else {
        return Err(ParseError::InvalidFormat(
            name,
            "must be in YYYY-MM-DD format".to_string(),
        ));
    };
    if year.len() != 4 || month.len() != 2 || day.len() != 2 {
        return Err(ParseError::InvalidFormat(
            name,
            "must be in YYYY-MM-DD format".to_string(),
        ));
    }
    if !parts
        .iter()
        .all(|p| p.bytes().all(|b| b.is_ascii_digit()))
    {
        return Err(ParseError::InvalidFormat(
            name,
            "must contain only digits and dashes".to_string(),
        ));
    }
    let month_num: u32 = month.parse().unwrap_or(0);
    let day_num: u32 = day.parse().unwrap_or(0);
    if !(1..=12).contains(&month_num) || !(1..=31).contains(&day_num) {
        return Err(ParseError::InvalidFormat(
            name,
            "month must be 01-12 and day 01-31".to_string(),
        ));
    }
    Ok(())
}
