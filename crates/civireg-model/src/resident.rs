// SPDX-License-Identifier: Apache-2.0

use crate::{parse_id_component, validate_birth_date, ParseError};
use serde::{Deserialize, Serialize};

pub const ID_MAX_LEN: usize = 64;
pub const NAME_MAX_LEN: usize = 128;
pub const ADDRESS_MAX_LEN: usize = 512;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
#[non_exhaustive]
pub struct ResidentId(String);

impl ResidentId {
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        Ok(Self(parse_id_component(input, "resident_id", ID_MAX_LEN)?))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ResidentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A resident record as the registry core sees it. Read-only here except for
/// `is_household_head`, which only the household membership engine toggles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Resident {
    pub id: ResidentId,
    pub first_name: String,
    pub last_name: String,
    pub middle_name: Option<String>,
    pub birth_date: String,
    pub mobile_number: Option<String>,
    pub landline_number: Option<String>,
    pub email: Option<String>,
    pub complete_address: String,
    pub is_household_head: bool,
}

impl Resident {
    /// Display name used by household listings and the ticket binder:
    /// "First [Middle] Last".
    #[must_use]
    pub fn full_name(&self) -> String {
        match self.middle_name.as_deref().filter(|m| !m.is_empty()) {
            Some(middle) => format!("{} {} {}", self.first_name, middle, self.last_name),
            None => format!("{} {}", self.first_name, self.last_name),
        }
    }
}

/// Intake payload for creating or replacing a resident record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewResident {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub middle_name: Option<String>,
    pub birth_date: String,
    #[serde(default)]
    pub mobile_number: Option<String>,
    #[serde(default)]
    pub landline_number: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    pub complete_address: String,
}

impl NewResident {
    pub fn validate(&self) -> Result<(), ParseError> {
        require_name(&self.first_name, "first_name")?;
        require_name(&self.last_name, "last_name")?;
        if let Some(middle) = &self.middle_name {
            if middle.len() > NAME_MAX_LEN {
                return Err(ParseError::TooLong("middle_name", NAME_MAX_LEN));
            }
        }
        validate_birth_date(&self.birth_date, "birth_date")?;
        if self.complete_address.trim().is_empty() {
            return Err(ParseError::Empty("complete_address"));
        }
        if self.complete_address.len() > ADDRESS_MAX_LEN {
            return Err(ParseError::TooLong("complete_address", ADDRESS_MAX_LEN));
        }
        Ok(())
    }
}

fn require_name(value: &str, field: &'static str) -> Result<(), ParseError> {
    if value.trim().is_empty() {
        return Err(ParseError::Empty(field));
    }
    if value.len() > NAME_MAX_LEN {
        return Err(ParseError::TooLong(field, NAME_MAX_LEN));
    }
    Ok(())
}
