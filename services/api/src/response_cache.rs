use std::future::Future;

use serde::Serialize;
use serde_json::Value;

use velo_cache::TtlCache;
use velo_common::error::{VeloError, VeloResult};

/// TTL cache over the outward-facing query functions. A fresh hit returns
/// the stored payload byte-identical without recompute; stale fallback is
/// the upstream clients' concern, not this layer's.
pub struct ResponseCache {
    inner: TtlCache<Value>,
}

impl ResponseCache {
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            inner: TtlCache::with_system_clock(ttl_secs),
        }
    }

    pub async fn get_or_compute<F, Fut>(&self, key: &str, compute: F) -> VeloResult<Value>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = VeloResult<Value>>,
    {
        if let Some(hit) = self.inner.get_fresh(key) {
            tracing::debug!(key, "response cache hit");
            return Ok(hit);
        }
        let value = compute().await?;
        self.inner.insert(key, value.clone());
        Ok(value)
    }
}

pub fn to_value<T: Serialize>(payload: T) -> VeloResult<Value> {
    serde_json::to_value(payload)
        .map_err(|e| VeloError::Unknown(format!("response serialization failed: {e}")))
}
