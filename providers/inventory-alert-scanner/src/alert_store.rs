use crate::error::AlertStoreError;
use crate::models::{Alert, AlertCategory};
use crate::redis_ops::RedisManager;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::debug;

const ALERTS_HASH: &str = "inventory:alerts";
const ALERTS_BY_TIME_ZSET: &str = "inventory:alerts:by_time";
const DEDUP_PREFIX: &str = "inventory:alerts:dedup:";

/// Writes the alert only if the per-day key did not exist yet. The three
/// writes happen inside one script so a crash cannot leave a dedup key
/// without its alert record.
const INSERT_IF_ABSENT_LUA: &str = r#"
if redis.call('SET', KEYS[1], ARGV[1], 'NX', 'EX', ARGV[3]) then
    redis.call('HSET', KEYS[2], ARGV[1], ARGV[2])
    redis.call('ZADD', KEYS[3], ARGV[4], ARGV[1])
    return 1
end
return 0
"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Created,
    AlreadyExists,
}

/// Alert persistence with a uniqueness constraint on
/// (product, category, calendar day)
#[async_trait]
pub trait AlertStore: Send + Sync {
    async fn insert_if_absent(
        &self,
        alert: &Alert,
        day: NaiveDate,
    ) -> Result<InsertOutcome, AlertStoreError>;
}

pub fn dedup_key(category: AlertCategory, product_id: &str, day: NaiveDate) -> String {
    format!(
        "{}{}:{}:{}",
        DEDUP_PREFIX,
        category.as_str(),
        product_id,
        day.format("%Y-%m-%d")
    )
}

pub struct RedisAlertStore {
    redis: Arc<RedisManager>,
    script: redis::Script,
    dedup_ttl_secs: u64,
}

impl RedisAlertStore {
    pub fn new(redis: Arc<RedisManager>, dedup_ttl_secs: u64) -> Self {
        Self {
            redis,
            script: redis::Script::new(INSERT_IF_ABSENT_LUA),
            dedup_ttl_secs,
        }
    }
}

#[async_trait]
impl AlertStore for RedisAlertStore {
    async fn insert_if_absent(
        &self,
        alert: &Alert,
        day: NaiveDate,
    ) -> Result<InsertOutcome, AlertStoreError> {
        let key = dedup_key(alert.category, &alert.product_id, day);
        let alert_id = alert.id.to_string();
        let payload = serde_json::to_string(alert)?;

        let mut conn = self.redis.get_connection().await?;
        let created: i64 = self
            .script
            .key(&key)
            .key(ALERTS_HASH)
            .key(ALERTS_BY_TIME_ZSET)
            .arg(&alert_id)
            .arg(payload)
            .arg(self.dedup_ttl_secs)
            .arg(alert.created_at.timestamp())
            .invoke_async(&mut conn)
            .await?;

        match created {
            1 => {
                debug!("Recorded alert {} under {}", alert_id, key);
                Ok(InsertOutcome::Created)
            }
            0 => Ok(InsertOutcome::AlreadyExists),
            other => Err(AlertStoreError::UnexpectedResponse(format!(
                "insert script returned {}",
                other
            ))),
        }
    }
}
