// SPDX-License-Identifier: Apache-2.0

use crate::Resident;
use serde::{Deserialize, Serialize};

/// The four ticket requester fields every help-desk ticket type carries.
/// While a ticket is bound to a resident these are system-populated; empty
/// strings mean "not provided", both for manual entry and for copies from
/// a resident record whose optional fields are unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RequesterFields {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub contact_number: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub complete_address: String,
}

impl RequesterFields {
    /// Verbatim copy from a resident record. Fields the record leaves empty
    /// are copied as empty, not defaulted.
    #[must_use]
    pub fn from_resident(resident: &Resident) -> Self {
        Self {
            full_name: resident.full_name(),
            contact_number: resident.mobile_number.clone().unwrap_or_default(),
            email: resident.email.clone().unwrap_or_default(),
            complete_address: resident.complete_address.clone(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.full_name.is_empty()
            && self.contact_number.is_empty()
            && self.email.is_empty()
            && self.complete_address.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ResidentId;

    #[test]
    fn copy_from_resident_leaves_missing_fields_empty() {
        let resident = Resident {
            id: ResidentId::parse("r-9").expect("id"),
            first_name: "Ana".to_string(),
            last_name: "Lim".to_string(),
            middle_name: None,
            birth_date: "2000-12-01".to_string(),
            mobile_number: None,
            landline_number: Some("123-4567".to_string()),
            email: None,
            complete_address: "Blk 5 Lot 2".to_string(),
            is_household_head: false,
        };
        let fields = RequesterFields::from_resident(&resident);
        assert_eq!(fields.full_name, "Ana Lim");
        assert_eq!(fields.contact_number, "");
        assert_eq!(fields.email, "");
        assert_eq!(fields.complete_address, "Blk 5 Lot 2");
        assert!(!fields.is_empty());
    }
}
