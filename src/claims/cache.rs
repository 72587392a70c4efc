// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Claims cache keyed by the SHA-256 hash of the access token.
//!
//! Each entry lives until the earlier of the token's expiry and a configured
//! ceiling. Expired entries are dropped passively on lookup and actively by
//! [`ClaimsCache::purge_expired`], which `main.rs` runs on an interval.

use std::num::NonZeroUsize;
use std::sync::Mutex;

use chrono::Utc;
use lru::LruCache;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::principal::{TokenClaims, UserInfoClaims};

/// Everything needed to rebuild a principal without revalidating the token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedClaims {
    pub token: TokenClaims,
    #[serde(default)]
    pub user_info: Option<UserInfoClaims>,
    /// Extra claims in the provider's serialized form.
    pub extra: Vec<u8>,
}

struct CacheEntry {
    claims: CachedClaims,
    expires_at_ms: i64,
}

/// In-process LRU cache of validated claims.
pub struct ClaimsCache {
    cache: Mutex<LruCache<String, CacheEntry>>,
    ceiling_ms: i64,
}

impl ClaimsCache {
    /// - `capacity`: maximum number of tokens cached.
    /// - `ceiling_minutes`: upper bound on any entry's lifetime.
    pub fn new(capacity: usize, ceiling_minutes: u64) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Mutex::new(LruCache::new(capacity)),
            ceiling_ms: i64::try_from(ceiling_minutes.saturating_mul(60_000)).unwrap_or(i64::MAX),
        }
    }

    /// Look up claims for a token hash.
    ///
    /// Returns `None` if not cached or expired.
    pub fn get(&self, token_hash: &str) -> Option<CachedClaims> {
        self.get_at(token_hash, Utc::now().timestamp_millis())
    }

    pub(crate) fn get_at(&self, token_hash: &str, now_ms: i64) -> Option<CachedClaims> {
        let mut cache = self.cache.lock().ok()?;
        if let Some(entry) = cache.get(token_hash) {
            if entry.expires_at_ms > now_ms {
                debug!(token_hash, "Found existing token claims in cache");
                return Some(entry.claims.clone());
            }
            cache.pop(token_hash);
            debug!(token_hash, "Expired token claims removed from cache");
        }
        None
    }

    /// Store claims until `min(token expiry, now + ceiling)`.
    ///
    /// Claims for a token that has already expired are not stored. Returns
    /// the absolute expiry in epoch milliseconds when an entry was written.
    pub fn put(&self, token_hash: &str, claims: CachedClaims, token_expiry_secs: i64) -> Option<i64> {
        self.put_at(token_hash, claims, token_expiry_secs, Utc::now().timestamp_millis())
    }

    pub(crate) fn put_at(
        &self,
        token_hash: &str,
        claims: CachedClaims,
        token_expiry_secs: i64,
        now_ms: i64,
    ) -> Option<i64> {
        let ms_to_live = token_expiry_secs.saturating_mul(1000).saturating_sub(now_ms);
        if ms_to_live <= 0 {
            debug!(token_hash, "Token already expired, claims not cached");
            return None;
        }

        let expires_at_ms = now_ms + ms_to_live.min(self.ceiling_ms);
        let mut cache = self.cache.lock().ok()?;
        cache.put(
            token_hash.to_string(),
            CacheEntry {
                claims,
                expires_at_ms,
            },
        );
        debug!(token_hash, expires_at_ms, "Added token claims to cache");
        Some(expires_at_ms)
    }

    /// Remove every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Utc::now().timestamp_millis())
    }

    pub(crate) fn purge_expired_at(&self, now_ms: i64) -> usize {
        let Ok(mut cache) = self.cache.lock() else {
            return 0;
        };

        let expired: Vec<String> = cache
            .iter()
            .filter(|(_, entry)| entry.expires_at_ms <= now_ms)
            .map(|(hash, _)| hash.clone())
            .collect();

        for hash in &expired {
            cache.pop(hash);
            debug!(token_hash = %hash, "Purged expired token claims from cache");
        }
        expired.len()
    }

    pub fn len(&self) -> usize {
        self.cache.lock().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
