// SPDX-License-Identifier: Apache-2.0

use crate::{parse_id_component, ParseError, Relationship, ResidentId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const HOUSEHOLD_NUMBER_MAX_LEN: usize = 32;
const ID_MAX_LEN: usize = 64;
const ATTR_MAX_LEN: usize = 128;
const ADDRESS_MAX_LEN: usize = 512;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
#[non_exhaustive]
pub struct HouseholdId(String);

impl HouseholdId {
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        Ok(Self(parse_id_component(input, "household_id", ID_MAX_LEN)?))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for HouseholdId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum IncomeBracket {
    Below5k,
    From5kTo10k,
    From10kTo20k,
    From20kTo50k,
    Above50k,
}

impl IncomeBracket {
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        match raw {
            "below_5k" => Ok(Self::Below5k),
            "from_5k_to_10k" => Ok(Self::From5kTo10k),
            "from_10k_to_20k" => Ok(Self::From10kTo20k),
            "from_20k_to_50k" => Ok(Self::From20kTo50k),
            "above_50k" => Ok(Self::Above50k),
            _ => Err(ParseError::InvalidFormat(
                "monthly_income",
                format!("unknown bracket '{raw}'"),
            )),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Below5k => "below_5k",
            Self::From5kTo10k => "from_5k_to_10k",
            Self::From10kTo20k => "from_10k_to_20k",
            Self::From20kTo50k => "from_20k_to_50k",
            Self::Above50k => "above_50k",
        }
    }
}

/// Classification flags are independently caller-set; the engine never
/// derives them from member resident attributes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassificationFlags {
    #[serde(default)]
    pub four_ps_beneficiary: bool,
    #[serde(default)]
    pub indigent_family: bool,
    #[serde(default)]
    pub has_senior_citizen: bool,
    #[serde(default)]
    pub has_pwd_member: bool,
}

/// Tagged classification variants for callers whose forms reveal extra
/// detail per classification. Only the resolved flags reach the engine;
/// the detail strings are caller-facing annotations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[non_exhaustive]
pub enum Classification {
    FourPs {
        #[serde(default)]
        beneficiary_number: Option<String>,
    },
    Indigent {
        #[serde(default)]
        certificate_number: Option<String>,
    },
    SeniorCitizen {
        #[serde(default)]
        member_name: Option<String>,
    },
    Pwd {
        #[serde(default)]
        member_name: Option<String>,
    },
}

impl Classification {
    #[must_use]
    pub fn resolve(tags: &[Classification]) -> ClassificationFlags {
        let mut flags = ClassificationFlags::default();
        for tag in tags {
            match tag {
                Self::FourPs { .. } => flags.four_ps_beneficiary = true,
                Self::Indigent { .. } => flags.indigent_family = true,
                Self::SeniorCitizen { .. } => flags.has_senior_citizen = true,
                Self::Pwd { .. } => flags.has_pwd_member = true,
            }
        }
        flags
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HouseholdMember {
    pub resident_id: ResidentId,
    pub relationship: Relationship,
}

// No deny_unknown_fields here: serde does not support it alongside flatten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Household {
    pub id: HouseholdId,
    pub household_number: String,
    pub head_resident_id: Option<ResidentId>,
    pub members: Vec<HouseholdMember>,
    #[serde(flatten)]
    pub classification: ClassificationFlags,
    pub monthly_income: Option<IncomeBracket>,
    pub income_source: Option<String>,
    pub house_type: Option<String>,
    pub ownership_status: Option<String>,
    pub has_water_supply: bool,
    pub has_electricity: bool,
    pub has_sanitary_toilet: bool,
    pub complete_address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewMember {
    pub resident_id: ResidentId,
    pub relationship: Relationship,
}

/// Creation payload. `validate` covers shape plus the internal part of the
/// exclusivity invariant (head not listed as member, no duplicate members);
/// cross-household checks need storage and live in the membership engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewHousehold {
    pub household_number: String,
    #[serde(default)]
    pub head_resident_id: Option<ResidentId>,
    #[serde(default)]
    pub members: Vec<NewMember>,
    #[serde(default)]
    pub classification: ClassificationFlags,
    #[serde(default)]
    pub monthly_income: Option<IncomeBracket>,
    #[serde(default)]
    pub income_source: Option<String>,
    #[serde(default)]
    pub house_type: Option<String>,
    #[serde(default)]
    pub ownership_status: Option<String>,
    #[serde(default)]
    pub has_water_supply: bool,
    #[serde(default)]
    pub has_electricity: bool,
    #[serde(default)]
    pub has_sanitary_toilet: bool,
    pub complete_address: String,
}

impl NewHousehold {
    pub fn validate(&self) -> Result<(), ParseError> {
        let number = self.household_number.as_str();
        if number.trim().is_empty() {
            return Err(ParseError::Empty("household_number"));
        }
        if number.trim() != number {
            return Err(ParseError::Trimmed("household_number"));
        }
        if number.len() > HOUSEHOLD_NUMBER_MAX_LEN {
            return Err(ParseError::TooLong(
                "household_number",
                HOUSEHOLD_NUMBER_MAX_LEN,
            ));
        }
        if self.complete_address.trim().is_empty() {
            return Err(ParseError::Empty("complete_address"));
        }
        if self.complete_address.len() > ADDRESS_MAX_LEN {
            return Err(ParseError::TooLong("complete_address", ADDRESS_MAX_LEN));
        }
        for (field, value) in [
            ("income_source", &self.income_source),
            ("house_type", &self.house_type),
            ("ownership_status", &self.ownership_status),
        ] {
            if let Some(value) = value {
                if value.len() > ATTR_MAX_LEN {
                    return Err(ParseError::TooLong(field, ATTR_MAX_LEN));
                }
            }
        }

        let mut seen = BTreeSet::new();
        for member in &self.members {
            if !seen.insert(&member.resident_id) {
                return Err(ParseError::InvalidFormat(
                    "members",
                    format!("resident {} listed twice", member.resident_id),
                ));
            }
        }
        if let Some(head) = &self.head_resident_id {
            if seen.contains(head) {
                return Err(ParseError::InvalidFormat(
                    "head_resident_id",
                    format!("resident {head} cannot be both head and member"),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_household() -> NewHousehold {
        NewHousehold {
            household_number: "HH-0001".to_string(),
            head_resident_id: None,
            members: Vec::new(),
            classification: ClassificationFlags::default(),
            monthly_income: Some(IncomeBracket::From5kTo10k),
            income_source: Some("farming".to_string()),
            house_type: Some("concrete".to_string()),
            ownership_status: Some("owned".to_string()),
            has_water_supply: true,
            has_electricity: true,
            has_sanitary_toilet: true,
            complete_address: "Sitio Ilaya, Purok 3".to_string(),
        }
    }

    fn rid(raw: &str) -> ResidentId {
        ResidentId::parse(raw).expect("resident id")
    }

    #[test]
    fn creation_rejects_head_listed_as_member() {
        let mut payload = new_household();
        payload.head_resident_id = Some(rid("r-1"));
        payload.members = vec![NewMember {
            resident_id: rid("r-1"),
            relationship: Relationship::Son,
        }];
        let err = payload.validate().expect_err("head in member set");
        assert_eq!(err.field(), "head_resident_id");
    }

    #[test]
    fn creation_rejects_duplicate_members() {
        let mut payload = new_household();
        payload.members = vec![
            NewMember {
                resident_id: rid("r-2"),
                relationship: Relationship::Daughter,
            },
            NewMember {
                resident_id: rid("r-2"),
                relationship: Relationship::Cousin,
            },
        ];
        let err = payload.validate().expect_err("duplicate member");
        assert_eq!(err.field(), "members");
    }

    #[test]
    fn creation_rejects_blank_or_padded_number() {
        let mut blank = new_household();
        blank.household_number = "  ".to_string();
        assert!(blank.validate().is_err());

        let mut padded = new_household();
        padded.household_number = " HH-1".to_string();
        assert!(padded.validate().is_err());
    }

    #[test]
    fn classification_tags_resolve_to_flags() {
        let flags = Classification::resolve(&[
            Classification::FourPs {
                beneficiary_number: Some("4PS-123".to_string()),
            },
            Classification::Pwd { member_name: None },
        ]);
        assert!(flags.four_ps_beneficiary);
        assert!(flags.has_pwd_member);
        assert!(!flags.indigent_family);
        assert!(!flags.has_senior_citizen);
    }

    #[test]
    fn household_serializes_classification_flat() {
        let household = Household {
            id: HouseholdId::parse("h-1").expect("id"),
            household_number: "HH-0001".to_string(),
            head_resident_id: None,
            members: Vec::new(),
            classification: ClassificationFlags {
                four_ps_beneficiary: true,
                ..ClassificationFlags::default()
            },
            monthly_income: None,
            income_source: None,
            house_type: None,
            ownership_status: None,
            has_water_supply: false,
            has_electricity: false,
            has_sanitary_toilet: false,
            complete_address: "Purok 1".to_string(),
        };
        let value = serde_json::to_value(&household).expect("serialize");
        assert_eq!(value["four_ps_beneficiary"], serde_json::json!(true));
        assert!(value.get("classification").is_none());
    }
}
