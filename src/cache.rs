//! Response cache in front of the renderer

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use tokio::sync::RwLock;

/// Key → PNG body store consulted before rendering.
///
/// Eviction is the implementation's business; a miss only costs a render.
pub trait ResponseCache: Send + Sync + 'static {
    fn get(&self, key: &str) -> impl Future<Output = Option<Vec<u8>>> + Send;
    fn put(&self, key: String, body: Vec<u8>) -> impl Future<Output = ()> + Send;
}

/// A cache that never holds anything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCache;

impl ResponseCache for NoCache {
    async fn get(&self, _key: &str) -> Option<Vec<u8>> {
        None
    }

    async fn put(&self, _key: String, _body: Vec<u8>) {}
}

#[derive(Default)]
struct Entries {
    bodies: HashMap<String, Vec<u8>>,
    order: VecDeque<String>,
}

/// In-process cache, evicting the oldest insert once `capacity` is reached
pub struct MemoryCache {
    capacity: usize,
    entries: RwLock<Entries>,
}

impl MemoryCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: RwLock::new(Entries::default()),
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.bodies.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl ResponseCache for MemoryCache {
    async fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.entries.read().await.bodies.get(key).cloned()
    }

    async fn put(&self, key: String, body: Vec<u8>) {
        if self.capacity == 0 {
            return;
        }
        let mut entries = self.entries.write().await;
        if entries.bodies.insert(key.clone(), body).is_some() {
            // replaced in place, keep its age
            return;
        }
        entries.order.push_back(key);
        while entries.order.len() > self.capacity {
            if let Some(oldest) = entries.order.pop_front() {
                entries.bodies.remove(&oldest);
                log::debug!("cache evicted {}", oldest);
            }
        }
    }
}
