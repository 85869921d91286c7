//! Redis connection pool for the alert store

use crate::error::{AlertStoreError, ScanError};
use crate::ScannerConfig;
use deadpool_redis::{Config, Pool, Runtime};
use tracing::info;

/// Redis connection manager with pooling
pub struct RedisManager {
    pool: Pool,
}

impl RedisManager {
    /// Create new Redis manager with connection pool
    pub async fn new(config: &ScannerConfig) -> crate::Result<Self> {
        let mut redis_config = Config::from_url(&config.redis_url);
        redis_config.pool = Some(deadpool_redis::PoolConfig::new(config.redis_pool_size));
        let pool = redis_config
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| ScanError::Configuration(format!("Failed to create pool: {}", e)))?;

        let manager = Self { pool };

        // Ping to verify connection
        let mut conn = manager
            .get_connection()
            .await
            .map_err(|e| ScanError::Configuration(format!("Redis unreachable: {}", e)))?;
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| ScanError::Configuration(format!("Redis PING failed: {}", e)))?;

        info!(
            "Redis connection pool initialized with {} connections",
            config.redis_pool_size
        );

        Ok(manager)
    }

    /// Get connection from pool
    pub async fn get_connection(
        &self,
    ) -> Result<deadpool_redis::Connection, AlertStoreError> {
        self.pool
            .get()
            .await
            .map_err(|e| AlertStoreError::Pool(e.to_string()))
    }
}
