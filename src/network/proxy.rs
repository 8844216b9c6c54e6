// * Proxy Pool
// * Round-robin rotation over externally supplied proxy identifiers. The
// * client consumes one identifier per run; validation and replenishment
// * belong to the external pool provider.

use std::sync::Arc;
use tokio::sync::RwLock;

pub struct ProxyPool {
    proxies: Vec<String>,
    idx: Arc<RwLock<usize>>,
}

impl ProxyPool {
    pub fn new(proxies: Vec<String>) -> Self {
        Self {
            proxies,
            idx: Arc::new(RwLock::new(0)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.proxies.is_empty()
    }

    // * Hands out the next proxy identifier, wrapping around the pool
    pub async fn acquire(&self) -> Option<String> {
        if self.proxies.is_empty() {
            return None;
        }
        let mut idx = self.idx.write().await;
        let proxy = self.proxies[*idx].clone();
        *idx = (*idx + 1) % self.proxies.len();
        Some(proxy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_pool_yields_none() {
        let pool = ProxyPool::new(Vec::new());
        assert!(pool.acquire().await.is_none());
    }

    #[tokio::test]
    async fn test_round_robin_rotation() {
        let pool = ProxyPool::new(vec![
            "http://proxy-a:8080".to_string(),
            "http://proxy-b:8080".to_string(),
        ]);
        assert_eq!(pool.acquire().await.unwrap(), "http://proxy-a:8080");
        assert_eq!(pool.acquire().await.unwrap(), "http://proxy-b:8080");
        assert_eq!(pool.acquire().await.unwrap(), "http://proxy-a:8080");
    }
}
