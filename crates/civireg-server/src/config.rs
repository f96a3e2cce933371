// SPDX-License-Identifier: Apache-2.0

use serde::Serialize;
use std::time::Duration;

pub const CONFIG_SCHEMA_VERSION: &str = "1";

#[derive(Debug, Clone, Serialize)]
pub struct ApiConfig {
    pub max_body_bytes: usize,
    pub statistics_ttl: Duration,
    pub shutdown_drain: Duration,
    pub readiness_requires_db: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 64 * 1024,
            statistics_ttl: Duration::from_secs(30),
            shutdown_drain: Duration::from_secs(5),
            readiness_requires_db: true,
        }
    }
}
