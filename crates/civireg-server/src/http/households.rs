// SPDX-License-Identifier: Apache-2.0

use super::handlers::{
    api_error_response, if_none_match, ok_json, parse_household_path, parse_resident_path,
    propagated_request_id, put_cache_headers, with_request_id,
};
use crate::AppState;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use civireg_api::{
    parse_list_households_params, AddMemberBody, ApiError, AssignHeadBody, CreateHouseholdBody,
    UpdateMemberBody,
};
use civireg_core::{sha256_hex, RegistryError};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::info;

fn decode_body<T: serde::de::DeserializeOwned>(body: Value) -> Result<T, ApiError> {
    serde_json::from_value(body).map_err(|err| ApiError::invalid_body(err.to_string()))
}

fn registry_error(err: &RegistryError, request_id: &str) -> Response {
    api_error_response(ApiError::from_registry(err), request_id)
}

pub(crate) async fn create_household_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let request_id = propagated_request_id(&headers, &state);
    let body: CreateHouseholdBody = match decode_body(body) {
        Ok(body) => body,
        Err(err) => return api_error_response(err, &request_id),
    };
    let payload = match body.into_new_household() {
        Ok(payload) => payload,
        Err(err) => return api_error_response(err, &request_id),
    };
    match state.registry.create_household(&payload) {
        Ok(household) => {
            info!(household = %household.id, number = %household.household_number, "household created");
            let response = (StatusCode::CREATED, Json(household)).into_response();
            with_request_id(response, &request_id)
        }
        Err(err) => registry_error(&err, &request_id),
    }
}

pub(crate) async fn assign_head_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let request_id = propagated_request_id(&headers, &state);
    let household_id = match parse_household_path(&id) {
        Ok(id) => id,
        Err(err) => return api_error_response(err, &request_id),
    };
    let body: AssignHeadBody = match decode_body(body) {
        Ok(body) => body,
        Err(err) => return api_error_response(err, &request_id),
    };
    let resident_id = match body.parsed_resident_id() {
        Ok(id) => id,
        Err(err) => return api_error_response(err, &request_id),
    };
    let outcome = match resident_id {
        Some(resident_id) => state.registry.assign_head(&household_id, &resident_id),
        None => state.registry.remove_head(&household_id),
    };
    match outcome {
        Ok(household) => {
            info!(household = %household.id, head = ?household.head_resident_id, "head updated");
            ok_json(household, &request_id)
        }
        Err(err) => registry_error(&err, &request_id),
    }
}

pub(crate) async fn add_member_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let request_id = propagated_request_id(&headers, &state);
    let household_id = match parse_household_path(&id) {
        Ok(id) => id,
        Err(err) => return api_error_response(err, &request_id),
    };
    let body: AddMemberBody = match decode_body(body) {
        Ok(body) => body,
        Err(err) => return api_error_response(err, &request_id),
    };
    let member = match body.into_new_member() {
        Ok(member) => member,
        Err(err) => return api_error_response(err, &request_id),
    };
    match state
        .registry
        .add_member(&household_id, &member.resident_id, member.relationship)
    {
        Ok(household) => {
            info!(household = %household.id, member = %member.resident_id, "member added");
            let response = (StatusCode::CREATED, Json(household)).into_response();
            with_request_id(response, &request_id)
        }
        Err(err) => registry_error(&err, &request_id),
    }
}

pub(crate) async fn update_member_handler(
    State(state): State<AppState>,
    Path((id, resident_id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let request_id = propagated_request_id(&headers, &state);
    let (household_id, resident_id) =
        match parse_household_path(&id).and_then(|h| Ok((h, parse_resident_path(&resident_id)?))) {
            Ok(ids) => ids,
            Err(err) => return api_error_response(err, &request_id),
        };
    let body: UpdateMemberBody = match decode_body(body) {
        Ok(body) => body,
        Err(err) => return api_error_response(err, &request_id),
    };
    let relationship = match body.parsed_relationship() {
        Ok(relationship) => relationship,
        Err(err) => return api_error_response(err, &request_id),
    };
    match state
        .registry
        .update_member_relationship(&household_id, &resident_id, relationship)
    {
        Ok(household) => ok_json(household, &request_id),
        Err(err) => registry_error(&err, &request_id),
    }
}

pub(crate) async fn remove_member_handler(
    State(state): State<AppState>,
    Path((id, resident_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    let request_id = propagated_request_id(&headers, &state);
    let (household_id, resident_id) =
        match parse_household_path(&id).and_then(|h| Ok((h, parse_resident_path(&resident_id)?))) {
            Ok(ids) => ids,
            Err(err) => return api_error_response(err, &request_id),
        };
    match state.registry.remove_member(&household_id, &resident_id) {
        Ok(household) => {
            info!(household = %household.id, member = %resident_id, "member removed");
            ok_json(household, &request_id)
        }
        Err(err) => registry_error(&err, &request_id),
    }
}

pub(crate) async fn delete_household_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let request_id = propagated_request_id(&headers, &state);
    let household_id = match parse_household_path(&id) {
        Ok(id) => id,
        Err(err) => return api_error_response(err, &request_id),
    };
    match state.registry.delete_household(&household_id) {
        Ok(()) => {
            info!(household = %household_id, "household deleted");
            with_request_id(StatusCode::NO_CONTENT.into_response(), &request_id)
        }
        Err(err) => registry_error(&err, &request_id),
    }
}

pub(crate) async fn get_household_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let request_id = propagated_request_id(&headers, &state);
    let household_id = match parse_household_path(&id) {
        Ok(id) => id,
        Err(err) => return api_error_response(err, &request_id),
    };
    match state.registry.get_household(&household_id) {
        Ok(household) => ok_json(household, &request_id),
        Err(err) => registry_error(&err, &request_id),
    }
}

pub(crate) async fn list_households_handler(
    State(state): State<AppState>,
    Query(query): Query<BTreeMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let request_id = propagated_request_id(&headers, &state);
    let params = match parse_list_households_params(&query) {
        Ok(params) => params,
        Err(err) => return api_error_response(err, &request_id),
    };
    match state.registry.list_households(&params) {
        Ok(page) => ok_json(page, &request_id),
        Err(err) => registry_error(&err, &request_id),
    }
}

pub(crate) async fn statistics_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Response {
    let request_id = propagated_request_id(&headers, &state);
    let stats = match state.registry.household_statistics() {
        Ok(stats) => stats,
        Err(err) => return registry_error(&err, &request_id),
    };
    let payload = match serde_json::to_vec(&stats) {
        Ok(payload) => payload,
        Err(err) => {
            return api_error_response(
                ApiError::from_registry(&RegistryError::storage(err.to_string())),
                &request_id,
            )
        }
    };
    let etag = format!("\"{}\"", sha256_hex(&payload));
    if if_none_match(&headers).as_deref() == Some(etag.as_str()) {
        let mut response = StatusCode::NOT_MODIFIED.into_response();
        put_cache_headers(response.headers_mut(), state.api.statistics_ttl, &etag);
        return with_request_id(response, &request_id);
    }
    let mut response = ok_json(stats, &request_id);
    put_cache_headers(response.headers_mut(), state.api.statistics_ttl, &etag);
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use civireg_model::NewResident;
    use serde_json::json;
    use std::sync::Arc;

    fn app_state() -> AppState {
        AppState::new(Arc::new(
            civireg_registry::Registry::open_in_memory().expect("registry"),
        ))
    }

    fn seed_resident(state: &AppState, first: &str) -> String {
        let intake = NewResident {
            first_name: first.to_string(),
            last_name: "Reyes".to_string(),
            middle_name: None,
            birth_date: "1980-05-05".to_string(),
            mobile_number: None,
            landline_number: None,
            email: None,
            complete_address: "Purok 6".to_string(),
        };
        state
            .registry
            .create_resident(&intake)
            .expect("seed resident")
            .id
            .to_string()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn create_then_delete_round_trip() {
        let state = app_state();
        let response = create_household_handler(
            State(state.clone()),
            HeaderMap::new(),
            Json(json!({
                "household_number": "HH-0100",
                "complete_address": "Purok 1"
            })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = body_json(response).await;
        let id = created["id"].as_str().expect("id").to_string();

        let response = delete_household_handler(
            State(state.clone()),
            Path(id.clone()),
            HeaderMap::new(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response =
            get_household_handler(State(state), Path(id), HeaderMap::new()).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn head_then_member_conflict_is_409_with_envelope() {
        let state = app_state();
        let head = seed_resident(&state, "Elena");
        let response = create_household_handler(
            State(state.clone()),
            HeaderMap::new(),
            Json(json!({
                "household_number": "HH-0200",
                "complete_address": "Purok 2",
                "head_resident_id": head.clone(),
            })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let id = body_json(response).await["id"]
            .as_str()
            .expect("id")
            .to_string();

        let response = add_member_handler(
            State(state),
            Path(id),
            HeaderMap::new(),
            Json(json!({"resident_id": head, "relationship": "son"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let envelope = body_json(response).await;
        assert_eq!(envelope["error"]["code"], json!("Conflict"));
        assert!(envelope["error"]["request_id"].as_str().is_some());
    }

    #[tokio::test]
    async fn statistics_round_trip_honors_etag() {
        let state = app_state();
        let first = statistics_handler(State(state.clone()), HeaderMap::new()).await;
        assert_eq!(first.status(), StatusCode::OK);
        let etag = first
            .headers()
            .get("etag")
            .and_then(|v| v.to_str().ok())
            .expect("etag")
            .to_string();

        let mut headers = HeaderMap::new();
        headers.insert("if-none-match", HeaderValue::from_str(&etag).expect("etag"));
        let second = statistics_handler(State(state), headers).await;
        assert_eq!(second.status(), StatusCode::NOT_MODIFIED);
    }

    #[tokio::test]
    async fn listing_rejects_oversized_per_page() {
        let state = app_state();
        let mut query = BTreeMap::new();
        query.insert("per_page".to_string(), "9000".to_string());
        let response =
            list_households_handler(State(state), Query(query), HeaderMap::new()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn clearing_an_absent_head_is_a_no_op() {
        let state = app_state();
        let response = create_household_handler(
            State(state.clone()),
            HeaderMap::new(),
            Json(json!({
                "household_number": "HH-0300",
                "complete_address": "Purok 3"
            })),
        )
        .await;
        let id = body_json(response).await["id"]
            .as_str()
            .expect("id")
            .to_string();

        let response = assign_head_handler(
            State(state),
            Path(id),
            HeaderMap::new(),
            Json(json!({"resident_id": null})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let household = body_json(response).await;
        assert_eq!(household["head_resident_id"], json!(null));
    }
}
