// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

use civireg_registry::Registry;
use civireg_server::{build_router, ApiConfig, AppState};
use std::env;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn env_bool(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .and_then(|v| match v.as_str() {
            "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
            "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_usize(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(default)
}

fn env_duration_ms(name: &str, default_ms: u64) -> Duration {
    Duration::from_millis(env_u64(name, default_ms))
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).expect("register SIGTERM");
        let mut sigint = signal(SignalKind::interrupt()).expect("register SIGINT");
        tokio::select! {
            _ = sigterm.recv() => {}
            _ = sigint.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if env_bool("CIVIREG_LOG_JSON", true) {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), String> {
    init_tracing();

    let bind_addr = env::var("CIVIREG_BIND").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let db_path = env::var("CIVIREG_DB_PATH").unwrap_or_else(|_| "civireg.db".to_string());

    let registry = if db_path == ":memory:" {
        Registry::open_in_memory()
    } else {
        Registry::open(&PathBuf::from(&db_path))
    }
    .map_err(|e| format!("open registry at {db_path}: {e}"))?;

    let api = ApiConfig {
        max_body_bytes: env_usize("CIVIREG_MAX_BODY_BYTES", 64 * 1024),
        statistics_ttl: env_duration_ms("CIVIREG_STATISTICS_TTL_MS", 30_000),
        shutdown_drain: env_duration_ms("CIVIREG_SHUTDOWN_DRAIN_MS", 5000),
        readiness_requires_db: env_bool("CIVIREG_READINESS_REQUIRES_DB", true),
    };

    let state = AppState::with_config(Arc::new(registry), api);
    let app = build_router(state.clone());

    let listener = TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| format!("bind {bind_addr}: {e}"))?;
    info!(bind = %bind_addr, db = %db_path, "civireg-server listening");

    let accepting = state.accepting_requests.clone();
    let drain = state.api.shutdown_drain;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            wait_for_shutdown_signal().await;
            // Fail readiness first so load balancers stop routing here,
            // then drain in-flight requests.
            accepting.store(false, Ordering::Relaxed);
            tokio::time::sleep(drain).await;
        })
        .await
        .map_err(|e| format!("server failed: {e}"))
}
