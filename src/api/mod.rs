//! API module for the firehose router
//!
//! This module contains the operational HTTP endpoints and server setup:
//! liveness, readiness, build information and routing counters.

pub mod health;
pub mod server;

use axum::extract::FromRef;
use std::sync::Arc;

pub use health::{build_info, health_check, ready_check, router_stats, HealthState};
pub use server::{create_router, create_server, shutdown_signal};

use crate::routing::{RouterStats, RouterStatsSnapshot, SelectionSet};

/// Component name the router reports its health under
pub const ROUTER_COMPONENT: &str = "router";

/// Component name the envelope source reports its health under
pub const SOURCE_COMPONENT: &str = "envelope_source";

/// Build information populated at compile time
pub const BUILD_INFO: BuildInfo = BuildInfo {
    version: env!("CARGO_PKG_VERSION"),
    commit: match option_env!("GIT_COMMIT") {
        Some(commit) => commit,
        None => "unknown",
    },
    build_time: match option_env!("BUILD_TIME") {
        Some(time) => time,
        None => "unknown",
    },
    rust_version: match option_env!("RUSTC_VERSION") {
        Some(version) => version,
        None => "unknown",
    },
};

/// Build information structure
#[derive(Debug, Clone, serde::Serialize)]
pub struct BuildInfo {
    /// Application version from Cargo.toml
    pub version: &'static str,
    /// Git commit hash
    pub commit: &'static str,
    /// Build timestamp
    pub build_time: &'static str,
    /// Rust version used for compilation
    pub rust_version: &'static str,
}

/// Shared state behind the operational API
#[derive(Clone)]
pub struct ApiState {
    pub health: Arc<HealthState>,
    pub stats: Arc<RouterStats>,
    pub selection: Arc<SelectionSet>,
}

impl ApiState {
    pub fn new(health: Arc<HealthState>, stats: Arc<RouterStats>, selection: SelectionSet) -> Self {
        Self {
            health,
            stats,
            selection: Arc::new(selection),
        }
    }
}

impl FromRef<ApiState> for Arc<HealthState> {
    fn from_ref(state: &ApiState) -> Self {
        state.health.clone()
    }
}

/// Health check response
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: HealthStatus,
    /// Optional message
    pub message: Option<String>,
    /// Current timestamp
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Ready check response
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct ReadyResponse {
    /// Overall readiness status
    pub status: HealthStatus,
    /// Individual component checks
    pub checks: std::collections::HashMap<String, ComponentHealth>,
    /// Current timestamp
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Routing counters and the active selection
#[derive(Debug, serde::Serialize)]
pub struct StatsResponse {
    /// Kinds currently forwarded, in registry order
    pub selected: Vec<&'static str>,
    /// Every kind the router knows, comma separated
    pub authorized: String,
    /// Counters since startup
    #[serde(flatten)]
    pub counters: RouterStatsSnapshot,
    /// Current timestamp
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Component health status
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ComponentHealth {
    /// Component status
    pub status: HealthStatus,
    /// Optional error message
    pub message: Option<String>,
    /// Last check timestamp
    pub last_check: chrono::DateTime<chrono::Utc>,
}

/// Health status enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Component is healthy
    Healthy,
    /// Component is degraded but operational
    Degraded,
    /// Component is unhealthy
    Unhealthy,
}

impl HealthStatus {
    /// Check if the status is healthy
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Healthy)
    }

    /// Convert to HTTP status code
    pub fn to_status_code(&self) -> axum::http::StatusCode {
        match self {
            HealthStatus::Healthy => axum::http::StatusCode::OK,
            HealthStatus::Degraded => axum::http::StatusCode::OK,
            HealthStatus::Unhealthy => axum::http::StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_status() {
        assert!(HealthStatus::Healthy.is_healthy());
        assert!(!HealthStatus::Degraded.is_healthy());

        assert_eq!(
            HealthStatus::Degraded.to_status_code(),
            axum::http::StatusCode::OK
        );
        assert_eq!(
            HealthStatus::Unhealthy.to_status_code(),
            axum::http::StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_build_info() {
        assert_eq!(BUILD_INFO.version, env!("CARGO_PKG_VERSION"));
        assert!(!BUILD_INFO.commit.is_empty());
    }

    #[test]
    fn test_stats_response_is_flat() {
        let response = StatsResponse {
            selected: vec!["LogMessage"],
            authorized: "LogMessage".to_string(),
            counters: RouterStatsSnapshot::default(),
            timestamp: chrono::Utc::now(),
        };

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["selected"], serde_json::json!(["LogMessage"]));
        assert_eq!(value["received"], 0);
        assert_eq!(value["emitted"], 0);
    }
}
