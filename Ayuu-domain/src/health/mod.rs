//! Domain layer health check functionality
//! This module provides health check services for the application

use std::collections::HashMap;
use async_trait::async_trait;
use tracing::warn;

use ayuu_data::database::{self, DatabasePool};

/// System health status
#[derive(Debug, Clone, PartialEq)]
pub enum SystemStatus {
    /// All components are healthy
    Healthy,
    /// Some components are degraded but the system is functional
    Degraded,
    /// System is not functioning properly
    Unhealthy,
}

/// Component health status
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Represents a health component with status and optional details
#[derive(Debug, Clone)]
pub struct HealthComponent {
    pub status: ComponentStatus,
    pub details: Option<String>,
}

/// Represents the overall health of the system
#[derive(Debug, Clone)]
pub struct SystemHealth {
    pub status: SystemStatus,
    /// Map of component names to their health status
    pub components: HashMap<String, HealthComponent>,
}

/// Trait for health services
#[async_trait]
pub trait HealthServiceTrait: Send + Sync + std::fmt::Debug {
    /// Get the overall system health
    async fn get_system_health(&self) -> SystemHealth;

    /// Check the status of the database
    ///
    /// Ok(true) when reachable, Ok(false) when running without a database,
    /// Err when the pool cannot hand out a connection.
    async fn check_database_status(&self) -> Result<bool, String>;
}

/// Health checks over the configured storage backend
#[derive(Debug, Clone, Default)]
pub struct HealthService {
    pool: Option<DatabasePool>,
}

impl HealthService {
    pub fn new(pool: Option<DatabasePool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HealthServiceTrait for HealthService {
    async fn get_system_health(&self) -> SystemHealth {
        let db_component = match self.check_database_status().await {
            Ok(true) => HealthComponent {
                status: ComponentStatus::Healthy,
                details: self.pool.as_ref().and_then(|pool| database::get_connection_info(pool).ok()),
            },
            Ok(false) => HealthComponent {
                status: ComponentStatus::Degraded,
                details: Some("Running on in-memory storage; data is not persisted".to_string()),
            },
            Err(e) => HealthComponent {
                status: ComponentStatus::Unhealthy,
                details: Some(e),
            },
        };

        let overall_status = match db_component.status {
            ComponentStatus::Unhealthy => SystemStatus::Unhealthy,
            ComponentStatus::Degraded => SystemStatus::Degraded,
            ComponentStatus::Healthy => SystemStatus::Healthy,
        };

        SystemHealth {
            status: overall_status,
            components: vec![("database".to_string(), db_component)].into_iter().collect(),
        }
    }

    async fn check_database_status(&self) -> Result<bool, String> {
        match &self.pool {
            None => Ok(false),
            Some(pool) => database::get_connection_info(pool).map(|_| true).map_err(|e| {
                warn!("Database health check failed: {}", e);
                format!("Database connection error: {}", e)
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ayuu_data::database::{initialize_database_pool, DatabaseConfig};

    #[tokio::test]
    async fn test_memory_backend_is_degraded() {
        let health = HealthService::new(None).get_system_health().await;
        assert_eq!(health.status, SystemStatus::Degraded);
        assert!(health.components.contains_key("database"));
    }

    #[tokio::test]
    async fn test_sqlite_backend_is_healthy() {
        let pool = initialize_database_pool(&DatabaseConfig::sqlite_in_memory()).unwrap();
        assert!(pool.is_some());

        let service = HealthService::new(pool);
        assert_eq!(service.check_database_status().await, Ok(true));
        assert_eq!(service.get_system_health().await.status, SystemStatus::Healthy);
    }
}
