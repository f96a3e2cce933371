// SPDX-License-Identifier: Apache-2.0

use crate::AppState;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use civireg_api::{map_status, ApiError};
use civireg_model::{HouseholdId, ResidentId};
use serde_json::json;
use std::sync::atomic::Ordering;
use std::time::Duration;

pub(crate) fn make_request_id(state: &AppState) -> String {
    let id = state.request_id_seed.fetch_add(1, Ordering::Relaxed);
    format!("req-{id:016x}")
}

pub(crate) fn propagated_request_id(headers: &HeaderMap, state: &AppState) -> String {
    if let Some(raw) = headers.get("x-request-id").and_then(|v| v.to_str().ok()) {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    make_request_id(state)
}

pub(crate) fn with_request_id(mut response: Response, request_id: &str) -> Response {
    if let Ok(v) = HeaderValue::from_str(request_id) {
        response.headers_mut().insert("x-request-id", v);
    }
    response
}

pub(crate) fn api_error_response(err: ApiError, request_id: &str) -> Response {
    let status = StatusCode::from_u16(map_status(err.code))
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let err = err.with_request_id(request_id);
    let response = (status, Json(json!({"error": err}))).into_response();
    with_request_id(response, request_id)
}

pub(crate) fn ok_json(payload: impl serde::Serialize, request_id: &str) -> Response {
    let response = (StatusCode::OK, Json(payload)).into_response();
    with_request_id(response, request_id)
}

pub(crate) fn parse_household_path(raw: &str) -> Result<HouseholdId, ApiError> {
    Ok(HouseholdId::parse(raw)?)
}

pub(crate) fn parse_resident_path(raw: &str) -> Result<ResidentId, ApiError> {
    Ok(ResidentId::parse(raw)?)
}

pub(crate) fn if_none_match(headers: &HeaderMap) -> Option<String> {
    headers
        .get("if-none-match")
        .and_then(|v| v.to_str().ok())
        .map(std::string::ToString::to_string)
}

pub(crate) fn put_cache_headers(headers: &mut HeaderMap, ttl: Duration, etag: &str) {
    if let Ok(value) = HeaderValue::from_str(&format!("public, max-age={}", ttl.as_secs())) {
        headers.insert("cache-control", value);
    }
    if let Ok(value) = HeaderValue::from_str(etag) {
        headers.insert("etag", value);
    }
}

pub(crate) async fn healthz_handler(State(state): State<AppState>) -> impl IntoResponse {
    let request_id = make_request_id(&state);
    with_request_id((StatusCode::OK, "ok").into_response(), &request_id)
}

pub(crate) async fn readyz_handler(State(state): State<AppState>) -> impl IntoResponse {
    let request_id = make_request_id(&state);
    let db_ready = if state.api.readiness_requires_db {
        state.registry.household_statistics().is_ok()
    } else {
        true
    };
    let accepting = state.accepting_requests.load(Ordering::Relaxed);
    if state.ready.load(Ordering::Relaxed) && db_ready && accepting {
        with_request_id((StatusCode::OK, "ready").into_response(), &request_id)
    } else {
        with_request_id(
            (StatusCode::SERVICE_UNAVAILABLE, "not-ready").into_response(),
            &request_id,
        )
    }
}

pub(crate) async fn version_handler(State(state): State<AppState>) -> impl IntoResponse {
    let request_id = make_request_id(&state);
    let payload = json!({
        "server": {
            "crate": crate::CRATE_NAME,
            "version": env!("CARGO_PKG_VERSION"),
            "config_schema_version": crate::config::CONFIG_SCHEMA_VERSION,
        },
        "api_version": civireg_api::API_VERSION,
    });
    let mut response = Json(payload).into_response();
    if let Ok(value) = HeaderValue::from_str("public, max-age=30") {
        response.headers_mut().insert("cache-control", value);
    }
    with_request_id(response, &request_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use civireg_api::ApiErrorCode;
    use civireg_registry::Registry;
    use std::sync::Arc;

    fn state() -> AppState {
        AppState::new(Arc::new(Registry::open_in_memory().expect("registry")))
    }

    #[test]
    fn request_ids_are_unique_and_prefixed() {
        let state = state();
        let first = make_request_id(&state);
        let second = make_request_id(&state);
        assert!(first.starts_with("req-"));
        assert_ne!(first, second);
    }

    #[test]
    fn propagation_prefers_the_inbound_header() {
        let state = state();
        let mut headers = HeaderMap::new();
        headers.insert("x-request-id", HeaderValue::from_static("req-upstream-7"));
        assert_eq!(propagated_request_id(&headers, &state), "req-upstream-7");

        headers.insert("x-request-id", HeaderValue::from_static("   "));
        assert!(propagated_request_id(&headers, &state).starts_with("req-"));
    }

    #[test]
    fn error_responses_carry_status_and_header() {
        let response = api_error_response(
            ApiError::new(ApiErrorCode::Conflict, "household not empty", json!({})),
            "req-9",
        );
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(
            response.headers().get("x-request-id").and_then(|v| v.to_str().ok()),
            Some("req-9")
        );
    }

    #[test]
    fn cache_headers_include_ttl_and_etag() {
        let mut headers = HeaderMap::new();
        put_cache_headers(&mut headers, Duration::from_secs(30), "\"abc\"");
        assert_eq!(
            headers.get("cache-control").and_then(|v| v.to_str().ok()),
            Some("public, max-age=30")
        );
        assert_eq!(
            headers.get("etag").and_then(|v| v.to_str().ok()),
            Some("\"abc\"")
        );
    }

    #[test]
    fn malformed_path_ids_become_validation_errors() {
        let err = parse_household_path(" h-1").expect_err("padded id");
        assert_eq!(err.code, ApiErrorCode::ValidationFailed);
        assert!(parse_resident_path("r-1").is_ok());
    }
}
