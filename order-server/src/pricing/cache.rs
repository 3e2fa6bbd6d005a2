//! Resolved price cache
//!
//! Keyed by `(product, category, customer, base_price)`. An entry lives for
//! the TTL, or until the next rule validity boundary if that comes first.
//! Every rule mutation clears the cache and bumps its generation; a result
//! computed from rules read before the bump is never stored.

use dashmap::DashMap;
use shared::models::price_rule::PriceResolution;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::Instant;

/// Expired entries are swept once the map grows past this
const SWEEP_THRESHOLD: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    product_id: String,
    category_id: Option<String>,
    customer_id: Option<String>,
    base_price_bits: u64,
}

#[derive(Debug)]
pub struct PriceCache {
    entries: DashMap<CacheKey, (PriceResolution, Instant)>,
    generation: AtomicU64,
    ttl: Duration,
}

impl PriceCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            generation: AtomicU64::new(0),
            ttl,
        }
    }

    fn key(product_id: &str, category_id: Option<&str>, customer_id: Option<&str>, base_price: f64) -> CacheKey {
        CacheKey {
            product_id: product_id.to_string(),
            category_id: category_id.map(String::from),
            customer_id: customer_id.map(String::from),
            base_price_bits: base_price.to_bits(),
        }
    }

    /// Read before loading rules; pass to [`PriceCache::insert`]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub fn get(
        &self,
        product_id: &str,
        category_id: Option<&str>,
        customer_id: Option<&str>,
        base_price: f64,
    ) -> Option<PriceResolution> {
        if self.ttl.is_zero() {
            return None;
        }
        let key = Self::key(product_id, category_id, customer_id, base_price);
        let entry = self.entries.get(&key)?;
        let (resolution, expires_at) = entry.value();
        (Instant::now() < *expires_at).then(|| resolution.clone())
    }

    /// Store a result computed from rules read at `generation`
    ///
    /// `valid_for` caps the entry's lifetime below the TTL (time until the
    /// next rule starts or stops applying).
    pub fn insert(
        &self,
        category_id: Option<&str>,
        customer_id: Option<&str>,
        resolution: &PriceResolution,
        generation: u64,
        valid_for: Option<Duration>,
    ) {
        if self.ttl.is_zero() || self.generation() != generation {
            return;
        }
        let lifetime = valid_for.map_or(self.ttl, |cap| cap.min(self.ttl));
        if lifetime.is_zero() {
            return;
        }

        let now = Instant::now();
        if self.entries.len() >= SWEEP_THRESHOLD {
            self.entries.retain(|_, (_, expires_at)| now < *expires_at);
        }
        let key = Self::key(&resolution.product_id, category_id, customer_id, resolution.base_price);
        self.entries.insert(key.clone(), (resolution.clone(), now + lifetime));

        // A clear may have slipped in between the check and the insert
        if self.generation() != generation {
            self.entries.remove(&key);
        }
    }

    pub fn clear(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
