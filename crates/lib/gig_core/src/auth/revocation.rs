//! In-memory revocation list for access tokens.
//!
//! Tokens are self-contained, so logout needs a deny-list. Entries are keyed
//! by the token's `jti` claim and hold the token's own expiry; once that
//! passes the token is rejected on expiry anyway and the entry can go.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Default interval between background sweeps: 5 minutes.
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 300;

/// Concurrent `jti -> exp` map of revoked tokens.
#[derive(Debug, Default)]
pub struct RevocationList {
    entries: DashMap<String, i64>,
}

impl RevocationList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a token id as revoked until `exp` (unix seconds). Idempotent.
    pub fn revoke(&self, jti: &str, exp: i64) {
        self.entries.entry(jti.to_string()).or_insert(exp);
    }

    /// Whether the token id is currently revoked.
    ///
    /// An entry whose expiry has passed is dropped and reported as not revoked.
    pub fn is_revoked(&self, jti: &str) -> bool {
        let now = Utc::now().timestamp();
        match self.entries.get(jti).map(|e| *e.value()) {
            Some(exp) if exp >= now => true,
            Some(_) => {
                self.entries.remove_if(jti, |_, exp| *exp < now);
                false
            }
            None => false,
        }
    }

    /// Drop every entry whose token has expired. Returns the number removed.
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now().timestamp();
        let before = self.entries.len();
        self.entries.retain(|_, exp| *exp >= now);
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Spawn a task that purges expired entries every `interval` until
    /// `cancel` fires.
    pub fn spawn_sweeper(
        self: Arc<Self>,
        interval: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // First tick completes immediately.
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        let removed = self.purge_expired();
                        debug!(removed, remaining = self.len(), "revocation sweep");
                    }
                }
            }
        })
    }
}
