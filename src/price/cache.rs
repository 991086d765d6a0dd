use dashmap::DashMap;
use ethers::types::Address;
use std::time::{Duration, Instant};

use super::PriceData;

#[derive(Debug, Clone)]
struct CachedPrice {
    data: PriceData,
    fetched_at: Instant,
}

/// Per-token price cache. Entries older than `ttl` are not served.
#[derive(Debug)]
pub struct PriceCache {
    entries: DashMap<Address, CachedPrice>,
    ttl: Duration,
}

impl PriceCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn get(&self, token: &Address) -> Option<PriceData> {
        self.get_at(token, Instant::now())
    }

    pub fn get_at(&self, token: &Address, now: Instant) -> Option<PriceData> {
        let entry = self.entries.get(token)?;
        if now.saturating_duration_since(entry.fetched_at) < self.ttl {
            Some(entry.data.clone())
        } else {
            None
        }
    }

    pub fn insert(&self, token: Address, data: PriceData) {
        self.insert_at(token, data, Instant::now());
    }

    pub fn insert_at(&self, token: Address, data: PriceData, fetched_at: Instant) {
        self.entries.insert(token, CachedPrice { data, fetched_at });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}
