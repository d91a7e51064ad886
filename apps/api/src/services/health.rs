//! Health check service for verifying external dependencies
//!
//! This service provides health checks for all critical infrastructure:
//! - PostgreSQL database
//! - Redis (realtime fan-out)
//! - Object storage bucket

use raindrops_storage_client::StorageClient;
use serde::Serialize;
use sqlx::PgPool;
use std::time::{Duration, Instant};

/// Status of an individual service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    /// Service is healthy and responding
    Healthy,
    /// Service is unhealthy or unreachable
    Unhealthy,
    /// Service check was skipped (e.g., optional service not configured)
    Skipped,
}

/// Result of a single service health check
#[derive(Debug, Clone, Serialize)]
pub struct ServiceHealth {
    /// Name of the service
    pub name: &'static str,
    /// Current status
    pub status: ServiceStatus,
    /// Response time in milliseconds (if available)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<u64>,
    /// Error message if unhealthy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ServiceHealth {
    /// Create a healthy service result
    pub fn healthy(name: &'static str, response_time: Duration) -> Self {
        Self {
            name,
            status: ServiceStatus::Healthy,
            response_time_ms: Some(response_time.as_millis() as u64),
            error: None,
        }
    }

    /// Create an unhealthy service result
    pub fn unhealthy(name: &'static str, error: impl Into<String>) -> Self {
        Self {
            name,
            status: ServiceStatus::Unhealthy,
            response_time_ms: None,
            error: Some(error.into()),
        }
    }

    /// Create a skipped service result (for optional services not configured)
    pub fn skipped(name: &'static str) -> Self {
        Self {
            name,
            status: ServiceStatus::Skipped,
            response_time_ms: None,
            error: None,
        }
    }
}

/// Aggregated health check response
#[derive(Debug, Clone, Serialize)]
pub struct HealthCheckResponse {
    /// Overall status (healthy only if all required services are healthy)
    pub status: ServiceStatus,
    /// Individual service health results
    pub services: Vec<ServiceHealth>,
    /// Total time to complete all health checks
    pub total_time_ms: u64,
    /// API version
    pub version: &'static str,
}

impl HealthCheckResponse {
    /// Create a new health check response from individual service results
    pub fn new(services: Vec<ServiceHealth>, total_time: Duration) -> Self {
        let status = if services
            .iter()
            .all(|s| s.status == ServiceStatus::Healthy || s.status == ServiceStatus::Skipped)
        {
            ServiceStatus::Healthy
        } else {
            ServiceStatus::Unhealthy
        };

        Self {
            status,
            services,
            total_time_ms: total_time.as_millis() as u64,
            version: env!("CARGO_PKG_VERSION"),
        }
    }

    /// Whether all required services passed
    pub fn is_healthy(&self) -> bool {
        self.status == ServiceStatus::Healthy
    }
}

/// Health check service probing each dependency
#[derive(Clone)]
pub struct HealthService {
    pool: PgPool,
    redis_url: Option<String>,
    storage: StorageClient,
}

impl HealthService {
    /// Create a new HealthService instance
    pub fn new(pool: PgPool, redis_url: Option<String>, storage: StorageClient) -> Self {
        Self {
            pool,
            redis_url,
            storage,
        }
    }

    /// Probe every dependency and aggregate the results
    pub async fn check_all(&self) -> HealthCheckResponse {
        let started = Instant::now();

        let services = vec![
            self.check_database().await,
            self.check_redis().await,
            self.check_storage().await,
        ];

        HealthCheckResponse::new(services, started.elapsed())
    }

    async fn check_database(&self) -> ServiceHealth {
        let started = Instant::now();
        match sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
        {
            Ok(_) => ServiceHealth::healthy("database", started.elapsed()),
            Err(e) => ServiceHealth::unhealthy("database", e.to_string()),
        }
    }

    async fn check_redis(&self) -> ServiceHealth {
        let Some(url) = &self.redis_url else {
            return ServiceHealth::skipped("redis");
        };

        let started = Instant::now();
        let client = match redis::Client::open(url.as_str()) {
            Ok(client) => client,
            Err(e) => return ServiceHealth::unhealthy("redis", e.to_string()),
        };

        match client.get_multiplexed_async_connection().await {
            Ok(mut conn) => {
                let pong: Result<String, _> = redis::cmd("PING").query_async(&mut conn).await;
                match pong {
                    Ok(_) => ServiceHealth::healthy("redis", started.elapsed()),
                    Err(e) => ServiceHealth::unhealthy("redis", e.to_string()),
                }
            }
            Err(e) => ServiceHealth::unhealthy("redis", e.to_string()),
        }
    }

    async fn check_storage(&self) -> ServiceHealth {
        let started = Instant::now();
        match self.storage.head_bucket().await {
            Ok(()) => ServiceHealth::healthy("storage", started.elapsed()),
            Err(e) => ServiceHealth::unhealthy("storage", e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_is_healthy_when_all_pass() {
        let response = HealthCheckResponse::new(
            vec![
                ServiceHealth::healthy("database", Duration::from_millis(3)),
                ServiceHealth::skipped("redis"),
            ],
            Duration::from_millis(5),
        );
        assert!(response.is_healthy());
    }

    #[test]
    fn response_is_unhealthy_when_any_fail() {
        let response = HealthCheckResponse::new(
            vec![
                ServiceHealth::healthy("database", Duration::from_millis(3)),
                ServiceHealth::unhealthy("storage", "bucket unreachable"),
            ],
            Duration::from_millis(5),
        );
        assert!(!response.is_healthy());
    }
}
