use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use tokio::sync::RwLock;
use tokio::task;
use tokio::time::{sleep, Duration};

use crate::ScheduleResponse;

/// Rendered schedules memoized on input identity. Identical text posted
/// twice within the TTL is parsed and laid out once.
pub struct ResponseCache {
    ttl: Option<Duration>,
    inner: RwLock<HashMap<u64, Arc<ScheduleResponse>>>,
}

pub fn key_of(text: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    hasher.finish()
}

impl ResponseCache {
    pub fn new(ttl: Option<Duration>) -> Arc<ResponseCache> {
        Arc::new(ResponseCache {
            ttl,
            inner: RwLock::new(HashMap::new()),
        })
    }

    /// Stores the response and schedules its eviction. With caching
    /// disabled this only wraps the value for the caller.
    pub async fn insert(
        self: Arc<Self>,
        key: u64,
        response: ScheduleResponse,
    ) -> Arc<ScheduleResponse> {
        let response = Arc::new(response);

        let Some(ttl) = self.ttl else {
            return response;
        };

        self.inner
            .write()
            .await
            .insert(key, Arc::clone(&response));

        task::spawn(async move {
            sleep(ttl).await;
            self.inner.write().await.remove(&key);
        });

        response
    }

    pub async fn get(&self, key: u64) -> Option<Arc<ScheduleResponse>> {
        if self.ttl.is_none() {
            return None;
        }

        self.inner.read().await.get(&key).map(Arc::clone)
    }
}
