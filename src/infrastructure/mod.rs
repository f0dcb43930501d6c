//! Infrastructure Layer
//!
//! Contains implementations for external services including:
//! - Database pool, migrations and repositories (PostgreSQL)
//! - SMTP mail delivery
//! - Prometheus metrics

pub mod database;
pub mod email;
pub mod metrics;
pub mod repositories;
