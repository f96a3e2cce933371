// SPDX-License-Identifier: Apache-2.0

use super::handlers::{
    api_error_response, ok_json, parse_resident_path, propagated_request_id, with_request_id,
};
use crate::AppState;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use civireg_api::{parse_duplicate_probe_params, parse_search_params, ApiError};
use civireg_core::RegistryError;
use civireg_model::NewResident;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use tracing::info;

fn decode_body<T: serde::de::DeserializeOwned>(body: Value) -> Result<T, ApiError> {
    serde_json::from_value(body).map_err(|err| ApiError::invalid_body(err.to_string()))
}

fn registry_error(err: &RegistryError, request_id: &str) -> Response {
    api_error_response(ApiError::from_registry(err), request_id)
}

pub(crate) async fn create_resident_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let request_id = propagated_request_id(&headers, &state);
    let intake: NewResident = match decode_body(body) {
        Ok(intake) => intake,
        Err(err) => return api_error_response(err, &request_id),
    };
    match state.registry.create_resident(&intake) {
        Ok(resident) => {
            info!(resident = %resident.id, "resident created");
            let response = (StatusCode::CREATED, Json(resident)).into_response();
            with_request_id(response, &request_id)
        }
        Err(err) => registry_error(&err, &request_id),
    }
}

pub(crate) async fn update_resident_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let request_id = propagated_request_id(&headers, &state);
    let resident_id = match parse_resident_path(&id) {
        Ok(id) => id,
        Err(err) => return api_error_response(err, &request_id),
    };
    let intake: NewResident = match decode_body(body) {
        Ok(intake) => intake,
        Err(err) => return api_error_response(err, &request_id),
    };
    match state.registry.update_resident(&resident_id, &intake) {
        Ok(resident) => ok_json(resident, &request_id),
        Err(err) => registry_error(&err, &request_id),
    }
}

pub(crate) async fn get_resident_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let request_id = propagated_request_id(&headers, &state);
    let resident_id = match parse_resident_path(&id) {
        Ok(id) => id,
        Err(err) => return api_error_response(err, &request_id),
    };
    match state.registry.get_resident(&resident_id) {
        Ok(resident) => ok_json(resident, &request_id),
        Err(err) => registry_error(&err, &request_id),
    }
}

pub(crate) async fn search_residents_handler(
    State(state): State<AppState>,
    Query(query): Query<BTreeMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let request_id = propagated_request_id(&headers, &state);
    let params = parse_search_params(&query);
    match state.registry.search_residents(&params.term) {
        Ok(results) => ok_json(json!({"items": results}), &request_id),
        Err(err) => registry_error(&err, &request_id),
    }
}

pub(crate) async fn duplicate_probe_handler(
    State(state): State<AppState>,
    Query(query): Query<BTreeMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let request_id = propagated_request_id(&headers, &state);
    let params = match parse_duplicate_probe_params(&query) {
        Ok(params) => params,
        Err(err) => return api_error_response(err, &request_id),
    };
    match state.registry.find_potential_duplicates(
        &params.first_name,
        &params.last_name,
        &params.birth_date,
    ) {
        Ok(matches) => ok_json(json!({"items": matches}), &request_id),
        Err(err) => registry_error(&err, &request_id),
    }
}
