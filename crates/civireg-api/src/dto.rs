// SPDX-License-Identifier: Apache-2.0

use crate::errors::ApiError;
use civireg_model::{
    Classification, ClassificationFlags, IncomeBracket, NewHousehold, NewMember, Relationship,
    ResidentId,
};
use serde::{Deserialize, Serialize};

/// Member entry as submitted: string-typed, parsed into model types by
/// `into_new_member`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MemberBody {
    pub resident_id: String,
    pub relationship: String,
}

impl MemberBody {
    pub fn into_new_member(self) -> Result<NewMember, ApiError> {
        Ok(NewMember {
            resident_id: ResidentId::parse(&self.resident_id)?,
            relationship: Relationship::parse(&self.relationship)?,
        })
    }
}

/// Household creation body. Classification arrives as tagged variants from
/// forms that collect per-classification detail; only the resolved flags
/// reach the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateHouseholdBody {
    pub household_number: String,
    #[serde(default)]
    pub head_resident_id: Option<String>,
    #[serde(default)]
    pub members: Vec<MemberBody>,
    #[serde(default)]
    pub classifications: Vec<Classification>,
    #[serde(default)]
    pub monthly_income: Option<String>,
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

impl CreateHouseholdBody {
    pub fn into_new_household(self) -> Result<NewHousehold, ApiError> {
        let head_resident_id = self
            .head_resident_id
            .as_deref()
            .map(ResidentId::parse)
            .transpose()?;
        let members = self
            .members
            .into_iter()
            .map(MemberBody::into_new_member)
            .collect::<Result<Vec<_>, _>>()?;
        let monthly_income = self
            .monthly_income
            .as_deref()
            .map(IncomeBracket::parse)
            .transpose()?;
        let classification: ClassificationFlags = Classification::resolve(&self.classifications);

        let payload = NewHousehold {
            household_number: self.household_number,
            head_resident_id,
            members,
            classification,
            monthly_income,
            income_source: self.income_source,
            house_type: self.house_type,
            ownership_status: self.ownership_status,
            has_water_supply: self.has_water_supply,
            has_electricity: self.has_electricity,
            has_sanitary_toilet: self.has_sanitary_toilet,
            complete_address: self.complete_address,
        };
        payload.validate()?;
        Ok(payload)
    }
}

/// `PATCH /v1/households/{id}/head` body. `resident_id: null` (or an
/// absent field) clears the head.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssignHeadBody {
    pub resident_id: Option<String>,
}

impl AssignHeadBody {
    pub fn parsed_resident_id(&self) -> Result<Option<ResidentId>, ApiError> {
        Ok(self
            .resident_id
            .as_deref()
            .map(ResidentId::parse)
            .transpose()?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddMemberBody {
    pub resident_id: String,
    pub relationship: String,
}

impl AddMemberBody {
    pub fn into_new_member(self) -> Result<NewMember, ApiError> {
        MemberBody {
            resident_id: self.resident_id,
            relationship: self.relationship,
        }
        .into_new_member()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateMemberBody {
    pub relationship: String,
}

impl UpdateMemberBody {
    pub fn parsed_relationship(&self) -> Result<Relationship, ApiError> {
        Ok(Relationship::parse(&self.relationship)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ApiErrorCode;
    use serde_json::json;

    fn minimal_body() -> CreateHouseholdBody {
        serde_json::from_value(json!({
            "household_number": "HH-0001",
            "complete_address": "Purok 3, Sitio Ilaya"
        }))
        .expect("minimal body")
    }

    #[test]
    fn minimal_body_resolves_to_unclassified_household() {
        let payload = minimal_body().into_new_household().expect("convert");
        assert_eq!(payload.household_number, "HH-0001");
        assert_eq!(payload.head_resident_id, None);
        assert!(payload.members.is_empty());
        assert_eq!(payload.classification, ClassificationFlags::default());
    }

    #[test]
    fn tagged_classifications_resolve_to_flags() {
        let body: CreateHouseholdBody = serde_json::from_value(json!({
            "household_number": "HH-0002",
            "complete_address": "Purok 1",
            "classifications": [
                {"kind": "four_ps", "beneficiary_number": "4PS-881"},
                {"kind": "senior_citizen"}
            ]
        }))
        .expect("body");
        let payload = body.into_new_household().expect("convert");
        assert!(payload.classification.four_ps_beneficiary);
        assert!(payload.classification.has_senior_citizen);
        assert!(!payload.classification.indigent_family);
    }

    #[test]
    fn unknown_relationship_label_is_a_validation_error() {
        let body: CreateHouseholdBody = serde_json::from_value(json!({
            "household_number": "HH-0003",
            "complete_address": "Purok 2",
            "members": [{"resident_id": "r-1", "relationship": "barkada"}]
        }))
        .expect("body");
        let err = body.into_new_household().expect_err("unknown label");
        assert_eq!(err.code, ApiErrorCode::ValidationFailed);
        assert!(err.message.contains("barkada"));
    }

    #[test]
    fn head_listed_as_member_is_rejected_at_conversion() {
        let body: CreateHouseholdBody = serde_json::from_value(json!({
            "household_number": "HH-0004",
            "complete_address": "Purok 4",
            "head_resident_id": "r-7",
            "members": [{"resident_id": "r-7", "relationship": "son"}]
        }))
        .expect("body");
        let err = body.into_new_household().expect_err("head in member set");
        assert_eq!(err.code, ApiErrorCode::ValidationFailed);
    }

    #[test]
    fn assign_head_body_null_clears_the_head() {
        let clear: AssignHeadBody =
            serde_json::from_value(json!({"resident_id": null})).expect("explicit null");
        assert_eq!(clear.parsed_resident_id().expect("parse"), None);

        let set: AssignHeadBody =
            serde_json::from_value(json!({"resident_id": "r-3"})).expect("set");
        assert!(set.parsed_resident_id().expect("parse").is_some());
    }

    #[test]
    fn income_bracket_labels_are_closed() {
        let body: CreateHouseholdBody = serde_json::from_value(json!({
            "household_number": "HH-0005",
            "complete_address": "Purok 5",
            "monthly_income": "about_a_lot"
        }))
        .expect("body");
        assert!(body.into_new_household().is_err());
    }
}
