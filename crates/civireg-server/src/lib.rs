// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, patch, post};
use axum::Router;
use civireg_registry::Registry;
use std::sync::atomic::{AtomicBool, AtomicU64};
use std::sync::Arc;

mod binder_adapter;
pub mod config;
mod http;

pub use binder_adapter::RegistryDirectory;
pub use config::ApiConfig;

pub const CRATE_NAME: &str = "civireg-server";

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Registry>,
    pub api: ApiConfig,
    pub ready: Arc<AtomicBool>,
    pub accepting_requests: Arc<AtomicBool>,
    pub(crate) request_id_seed: Arc<AtomicU64>,
}

impl AppState {
    #[must_use]
    pub fn new(registry: Arc<Registry>) -> Self {
        Self::with_config(registry, ApiConfig::default())
    }

    #[must_use]
    pub fn with_config(registry: Arc<Registry>, api: ApiConfig) -> Self {
        Self {
            registry,
            api,
            ready: Arc::new(AtomicBool::new(true)),
            accepting_requests: Arc::new(AtomicBool::new(true)),
            request_id_seed: Arc::new(AtomicU64::new(1)),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(http::handlers::healthz_handler))
        .route("/readyz", get(http::handlers::readyz_handler))
        .route("/v1/version", get(http::handlers::version_handler))
        .route(
            "/v1/households",
            get(http::households::list_households_handler)
                .post(http::households::create_household_handler),
        )
        .route(
            "/v1/households/statistics",
            get(http::households::statistics_handler),
        )
        .route(
            "/v1/households/:id",
            get(http::households::get_household_handler)
                .delete(http::households::delete_household_handler),
        )
        .route(
            "/v1/households/:id/head",
            patch(http::households::assign_head_handler),
        )
        .route(
            "/v1/households/:id/members",
            post(http::households::add_member_handler),
        )
        .route(
            "/v1/households/:id/members/:resident_id",
            patch(http::households::update_member_handler)
                .delete(http::households::remove_member_handler),
        )
        .route(
            "/v1/residents",
            post(http::residents::create_resident_handler),
        )
        .route(
            "/v1/residents/search",
            get(http::residents::search_residents_handler),
        )
        .route(
            "/v1/residents/duplicates",
            get(http::residents::duplicate_probe_handler),
        )
        .route(
            "/v1/residents/:id",
            get(http::residents::get_resident_handler)
                .put(http::residents::update_resident_handler),
        )
        .layer(DefaultBodyLimit::max(state.api.max_body_bytes))
        .with_state(state)
}
