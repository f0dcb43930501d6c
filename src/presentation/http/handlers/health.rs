//! Health Check Handlers
//!
//! - `GET /health` - process is up
//! - `GET /health/live` - liveness probe
//! - `GET /health/ready` - readiness probe: database, mail and gateway

use std::time::Instant;

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::Serialize;

use crate::startup::AppState;

static STARTED: Lazy<(Instant, DateTime<Utc>)> = Lazy::new(|| (Instant::now(), Utc::now()));

/// Database round trips slower than this report as degraded.
const SLOW_DATABASE_MS: u64 = 100;

/// Record the process start so uptime counts from boot rather than the
/// first probe.
pub fn init_server_start() {
    Lazy::force(&STARTED);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Healthy,
    Degraded,
    Unhealthy,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<&'static str>,
}

/// Result of probing one dependency
#[derive(Debug, Serialize)]
pub struct Check {
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl Check {
    fn healthy() -> Self {
        Self {
            status: Status::Healthy,
            latency_ms: None,
            detail: None,
        }
    }

    fn with_detail(status: Status, detail: impl Into<String>) -> Self {
        Self {
            status,
            latency_ms: None,
            detail: Some(detail.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GatewayStats {
    pub connections: usize,
    pub rooms: usize,
}

#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub status: Status,
    pub version: &'static str,
    pub started_at: DateTime<Utc>,
    pub uptime_seconds: u64,
    pub database: Check,
    pub mail: Check,
    pub gateway: GatewayStats,
}

pub async fn health_check() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "healthy",
        version: Some(env!("CARGO_PKG_VERSION")),
    })
}

pub async fn liveness() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "alive",
        version: None,
    })
}

/// 503 only when the database is unreachable; a missing mailer degrades.
pub async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<ReadinessResponse>) {
    let database = probe_database(&state).await;
    let mail = mail_check(state.mail_enabled);
    let status = overall(&[&database, &mail]);

    let code = if status == Status::Unhealthy {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };

    let (started, started_at) = *STARTED;
    let body = ReadinessResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        started_at,
        uptime_seconds: started.elapsed().as_secs(),
        database,
        mail,
        gateway: GatewayStats {
            connections: state.gateway.connection_count(),
            rooms: state.gateway.room_count(),
        },
    };

    (code, Json(body))
}

async fn probe_database(state: &AppState) -> Check {
    let start = Instant::now();
    if let Err(e) = sqlx::query("SELECT 1").execute(&state.db).await {
        tracing::warn!(error = %e, "Readiness: database unreachable");
        return Check::with_detail(Status::Unhealthy, "Database unreachable");
    }

    let latency = start.elapsed().as_millis() as u64;
    Check {
        status: if latency < SLOW_DATABASE_MS {
            Status::Healthy
        } else {
            Status::Degraded
        },
        latency_ms: Some(latency),
        detail: None,
    }
}

fn mail_check(enabled: bool) -> Check {
    if enabled {
        Check::healthy()
    } else {
        Check::with_detail(Status::Degraded, "SMTP not configured; OTPs are only logged")
    }
}

/// Worst status among the checks
fn overall(checks: &[&Check]) -> Status {
    checks
        .iter()
        .map(|c| c.status)
        .max()
        .unwrap_or(Status::Healthy)
}
