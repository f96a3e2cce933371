// SPDX-License-Identifier: Apache-2.0

use crate::ParseError;
use serde::{Deserialize, Serialize};

/// Closed enumeration of member-to-head relationships. Unknown labels are a
/// validation error, never coerced to `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum Relationship {
    Spouse,
    Son,
    Daughter,
    Parent,
    Sibling,
    Grandparent,
    Grandchild,
    UncleAunt,
    NephewNiece,
    Cousin,
    InLaw,
    Other,
}

pub const RELATIONSHIP_LABELS: [&str; 12] = [
    "spouse",
    "son",
    "daughter",
    "parent",
    "sibling",
    "grandparent",
    "grandchild",
    "uncle_aunt",
    "nephew_niece",
    "cousin",
    "in_law",
    "other",
];

impl Relationship {
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        match raw {
            "spouse" => Ok(Self::Spouse),
            "son" => Ok(Self::Son),
            "daughter" => Ok(Self::Daughter),
            "parent" => Ok(Self::Parent),
            "sibling" => Ok(Self::Sibling),
            "grandparent" => Ok(Self::Grandparent),
            "grandchild" => Ok(Self::Grandchild),
            "uncle_aunt" => Ok(Self::UncleAunt),
            "nephew_niece" => Ok(Self::NephewNiece),
            "cousin" => Ok(Self::Cousin),
            "in_law" => Ok(Self::InLaw),
            "other" => Ok(Self::Other),
            _ => Err(ParseError::InvalidFormat(
                "relationship",
                format!("unknown label '{raw}'; allowed: {}", RELATIONSHIP_LABELS.join(", ")),
            )),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Spouse => "spouse",
            Self::Son => "son",
            Self::Daughter => "daughter",
            Self::Parent => "parent",
            Self::Sibling => "sibling",
            Self::Grandparent => "grandparent",
            Self::Grandchild => "grandchild",
            Self::UncleAunt => "uncle_aunt",
            Self::NephewNiece => "nephew_niece",
            Self::Cousin => "cousin",
            Self::InLaw => "in_law",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for Relationship {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
