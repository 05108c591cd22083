//! Redis connection used for rate limiting and health checks.

use redis::{aio::ConnectionManager, AsyncCommands, Client, RedisError};

use crate::config::{Config, CACHE_PREFIX_RATE_LIMIT};
use crate::errors::{AppError, AppResult};

/// Redis handle with a shared, auto-reconnecting connection.
#[derive(Clone)]
pub struct Cache {
    connection: ConnectionManager,
}

impl Cache {
    pub async fn connect(config: &Config) -> Result<Self, RedisError> {
        let client = Client::open(config.redis_url.as_str())?;
        let connection = ConnectionManager::new(client).await?;

        tracing::info!("Redis cache connected");
        Ok(Self { connection })
    }

    /// Count one request against a fixed window.
    /// Returns `(count_in_window, allowed)`.
    pub async fn check_rate_limit(
        &self,
        identifier: &str,
        max_requests: u64,
        window_seconds: u64,
    ) -> AppResult<(u64, bool)> {
        let key = format!("{}{}", CACHE_PREFIX_RATE_LIMIT, identifier);
        let mut conn = self.connection.clone();

        let count: u64 = conn.incr(&key, 1u64).await.map_err(cache_error)?;
        if count == 1 {
            // First hit opens the window.
            let _: () = conn
                .expire(&key, window_seconds as i64)
                .await
                .map_err(cache_error)?;
        }

        Ok((count, count <= max_requests))
    }

    pub async fn ping(&self) -> bool {
        let mut conn = self.connection.clone();
        let pong: Result<String, RedisError> = redis::cmd("PING").query_async(&mut conn).await;
        pong.is_ok()
    }
}

fn cache_error(e: RedisError) -> AppError {
    tracing::error!("Redis error: {}", e);
    AppError::internal(format!("Cache error: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_prefix() {
        assert_eq!(CACHE_PREFIX_RATE_LIMIT, "rate_limit:");
    }

    #[test]
    fn test_cache_error_hides_detail_from_clients() {
        let err = cache_error(RedisError::from((redis::ErrorKind::IoError, "socket closed")));
        assert_eq!(err.to_string(), "Internal server error");
    }
}
