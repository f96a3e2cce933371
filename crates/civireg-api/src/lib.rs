// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

mod dto;
mod errors;
mod params;

pub use dto::{
    AddMemberBody, AssignHeadBody, CreateHouseholdBody, MemberBody, UpdateMemberBody,
};
pub use errors::{map_status, ApiError, ApiErrorCode};
pub use params::{
    parse_duplicate_probe_params, parse_list_households_params, parse_search_params,
    DuplicateProbeParams, SearchParams,
};

pub const CRATE_NAME: &str = "civireg-api";
pub const API_VERSION: &str = "v1";
