// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Key-value backend for the user cache: in-process maps or Redis.
//!
//! Only the handful of commands the cache needs are exposed: sorted-set
//! upsert and cardinality, hash upsert and full read.

use dashmap::DashMap;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Cache backend failures.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Cache store unavailable")]
    Unavailable,

    #[error("Invalid cached field {field}: {reason}")]
    Corrupt { field: &'static str, reason: String },
}

/// Storage behind the user cache.
#[derive(Clone)]
pub enum CacheBackend {
    /// Single-instance: local maps only
    Local(Arc<LocalStore>),

    /// Multi-instance: shared Redis, connected on first use
    Redis(Arc<RedisStore>),
}

impl CacheBackend {
    pub fn new_local() -> Self {
        CacheBackend::Local(Arc::new(LocalStore::default()))
    }

    /// Create a Redis backend. No connection is made until the first command.
    pub fn new_redis(url: &str) -> Result<Self, CacheError> {
        Ok(CacheBackend::Redis(Arc::new(RedisStore::new(url)?)))
    }

    /// Add or update `member` in the sorted set `key`.
    pub async fn zadd(&self, key: &str, member: &str, score: f64) -> Result<(), CacheError> {
        match self {
            CacheBackend::Local(store) => {
                store.check_available()?;
                store
                    .sorted
                    .entry(key.to_string())
                    .or_default()
                    .insert(member.to_string(), score);
                Ok(())
            }
            CacheBackend::Redis(store) => {
                let mut conn = store.connection().await?;
                conn.zadd::<_, _, _, ()>(key, member, score).await?;
                Ok(())
            }
        }
    }

    /// Number of members in the sorted set `key`.
    pub async fn zcard(&self, key: &str) -> Result<u64, CacheError> {
        match self {
            CacheBackend::Local(store) => {
                store.check_available()?;
                Ok(store
                    .sorted
                    .get(key)
                    .map(|set| set.len() as u64)
                    .unwrap_or(0))
            }
            CacheBackend::Redis(store) => {
                let mut conn = store.connection().await?;
                Ok(conn.zcard::<_, u64>(key).await?)
            }
        }
    }

    /// Upsert fields into the hash `key`. Existing fields not listed are kept.
    pub async fn hset(
        &self,
        key: &str,
        fields: &[(&'static str, String)],
    ) -> Result<(), CacheError> {
        match self {
            CacheBackend::Local(store) => {
                store.check_available()?;
                let mut hash = store.hashes.entry(key.to_string()).or_default();
                for (field, value) in fields {
                    hash.insert((*field).to_string(), value.clone());
                }
                Ok(())
            }
            CacheBackend::Redis(store) => {
                let mut conn = store.connection().await?;
                conn.hset_multiple::<_, _, _, ()>(key, fields).await?;
                Ok(())
            }
        }
    }

    /// All fields of the hash `key`; empty when the key does not exist.
    pub async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>, CacheError> {
        match self {
            CacheBackend::Local(store) => {
                store.check_available()?;
                Ok(store
                    .hashes
                    .get(key)
                    .map(|hash| hash.clone())
                    .unwrap_or_default())
            }
            CacheBackend::Redis(store) => {
                let mut conn = store.connection().await?;
                Ok(conn.hgetall::<_, HashMap<String, String>>(key).await?)
            }
        }
    }
}

/// In-process hashes and sorted sets.
#[derive(Default)]
pub struct LocalStore {
    hashes: DashMap<String, HashMap<String, String>>,
    sorted: DashMap<String, HashMap<String, f64>>,
    unavailable: AtomicBool,
}

impl LocalStore {
    /// Make every subsequent command fail, as a lost connection would.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Score of `member` in the sorted set `key`.
    pub fn score(&self, key: &str, member: &str) -> Option<f64> {
        self.sorted.get(key)?.get(member).copied()
    }

    fn check_available(&self) -> Result<(), CacheError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(CacheError::Unavailable);
        }
        Ok(())
    }
}

/// Redis connection that is opened by the first command and reused after.
pub struct RedisStore {
    client: redis::Client,
    conn: OnceCell<ConnectionManager>,
}

impl RedisStore {
    fn new(url: &str) -> Result<Self, CacheError> {
        Ok(Self {
            client: redis::Client::open(url)?,
            conn: OnceCell::new(),
        })
    }

    async fn connection(&self) -> Result<ConnectionManager, CacheError> {
        let conn = self
            .conn
            .get_or_try_init(|| async {
                let manager = self.client.get_connection_manager().await?;
                tracing::info!("Connected to Redis");
                Ok::<_, CacheError>(manager)
            })
            .await?;
        Ok(conn.clone())
    }
}
