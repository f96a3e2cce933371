// SPDX-License-Identifier: Apache-2.0

use civireg_core::RegistryError;
use civireg_model::ParseError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ApiErrorCode {
    ValidationFailed,
    InvalidQueryParameter,
    NotFound,
    Conflict,
    NotReady,
    Internal,
}

/// The one error envelope every non-2xx response carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
    pub details: Value,
    pub request_id: String,
}

impl ApiError {
    #[must_use]
    pub fn new(code: ApiErrorCode, message: impl Into<String>, details: Value) -> Self {
        Self {
            code,
            message: message.into(),
            details,
            request_id: "req-unknown".to_string(),
        }
    }

    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = request_id.into();
        self
    }

    #[must_use]
    pub fn invalid_param(name: &str, value: &str) -> Self {
        Self::new(
            ApiErrorCode::InvalidQueryParameter,
            format!("invalid query parameter: {name}"),
            json!({"parameter": name, "value": value}),
        )
    }

    #[must_use]
    pub fn invalid_field(field: &str, reason: impl Into<String>) -> Self {
        Self::new(
            ApiErrorCode::ValidationFailed,
            reason.into(),
            json!({"field": field}),
        )
    }

    #[must_use]
    pub fn invalid_body(reason: impl Into<String>) -> Self {
        Self::new(ApiErrorCode::ValidationFailed, reason.into(), json!({}))
    }

    #[must_use]
    pub fn not_ready() -> Self {
        Self::new(ApiErrorCode::NotReady, "service not ready", json!({}))
    }

    #[must_use]
    pub fn from_registry(err: &RegistryError) -> Self {
        match err {
            RegistryError::Validation { message, field } => Self::new(
                ApiErrorCode::ValidationFailed,
                message.clone(),
                match field {
                    Some(field) => json!({"field": field}),
                    None => json!({}),
                },
            ),
            RegistryError::NotFound { entity, id } => Self::new(
                ApiErrorCode::NotFound,
                format!("{entity} not found: {id}"),
                json!({"entity": entity, "id": id}),
            ),
            RegistryError::Conflict { message, details } => Self::new(
                ApiErrorCode::Conflict,
                message.clone(),
                json!(details),
            ),
            // Storage details stay in the logs, not on the wire.
            RegistryError::Storage(_) => Self::new(
                ApiErrorCode::Internal,
                "internal storage error",
                json!({}),
            ),
        }
    }
}

impl From<ParseError> for ApiError {
    fn from(err: ParseError) -> Self {
        Self::invalid_field(err.field(), err.to_string())
    }
}

/// HTTP status for an error envelope.
#[must_use]
pub const fn map_status(code: ApiErrorCode) -> u16 {
    match code {
        ApiErrorCode::ValidationFailed | ApiErrorCode::InvalidQueryParameter => 400,
        ApiErrorCode::NotFound => 404,
        ApiErrorCode::Conflict => 409,
        ApiErrorCode::NotReady => 503,
        ApiErrorCode::Internal => 500,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_conflict_maps_to_409_with_details() {
        let err = RegistryError::conflict_with(
            "resident r-1 already heads household HH-2",
            "resident_id",
            "r-1",
        );
        let api = ApiError::from_registry(&err);
        assert_eq!(api.code, ApiErrorCode::Conflict);
        assert_eq!(map_status(api.code), 409);
        assert_eq!(api.details["resident_id"], json!("r-1"));
    }

    #[test]
    fn storage_errors_are_opaque_on_the_wire() {
        let err = RegistryError::storage("disk I/O error at page 41");
        let api = ApiError::from_registry(&err);
        assert_eq!(api.code, ApiErrorCode::Internal);
        assert_eq!(map_status(api.code), 500);
        assert!(!api.message.contains("page 41"));
    }

    #[test]
    fn validation_carries_the_offending_field() {
        let err =
            RegistryError::validation_field("household_number", "household_number must not be blank");
        let api = ApiError::from_registry(&err);
        assert_eq!(api.code, ApiErrorCode::ValidationFailed);
        assert_eq!(api.details["field"], json!("household_number"));
    }

    #[test]
    fn envelope_serializes_stably() {
        let api = ApiError::invalid_param("per_page", "9000").with_request_id("req-42");
        let value = serde_json::to_value(&api).expect("serialize");
        assert_eq!(value["code"], json!("InvalidQueryParameter"));
        assert_eq!(value["request_id"], json!("req-42"));
        assert_eq!(value["details"]["parameter"], json!("per_page"));
    }
}
