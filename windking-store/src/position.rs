//! Durable Position Cache
//!
//! The single source of truth for "what direction are we holding?".
//! State lives in memory behind one async mutex and is mirrored to a
//! small JSON file on every mutation, so a restarted daemon resumes with
//! the position it had.
//!
//! Durability is best-effort: a failed write is warned and swallowed.
//! The daemon keeps trading from memory; what it must never do is stall
//! the decision loop on a disk hiccup.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use windking_domain::Signal;

use crate::error::StoreError;

/// Persisted position state: held direction plus when it last changed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PositionRecord {
    /// Held direction; `None` means flat
    pub direction: Option<Signal>,
    /// When `direction` was last written
    pub updated_at: DateTime<Utc>,
}

impl PositionRecord {
    fn flat(now: DateTime<Utc>) -> Self {
        Self {
            direction: None,
            updated_at: now,
        }
    }
}

/// File-backed store of the single open direction for one instrument.
///
/// # Invariants
///
/// - At most one non-null direction at a time (the type makes more
///   impossible).
/// - A non-null direction older than `expire` reads as flat; expiry is
///   checked lazily under the same lock that guards mutation, so a
///   reader can never observe a stale direction that a concurrent
///   writer is about to replace.
#[derive(Debug)]
pub struct PositionStore {
    path: PathBuf,
    expire: Duration,
    state: Mutex<PositionRecord>,
}

impl PositionStore {
    /// Open the store, loading any persisted state.
    ///
    /// An absent file starts flat; a corrupt file is warned about and
    /// also starts flat. Neither is fatal.
    pub async fn open(path: impl AsRef<Path>, expire: Duration) -> Self {
        let path = path.as_ref().to_path_buf();
        let state = Self::load(&path).await;
        Self {
            path,
            expire,
            state: Mutex::new(state),
        }
    }

    async fn load(path: &Path) -> PositionRecord {
        match tokio::fs::read(path).await {
            Ok(bytes) => match serde_json::from_slice::<PositionRecord>(&bytes) {
                Ok(record) => record,
                Err(error) => {
                    tracing::warn!(
                        path = %path.display(),
                        %error,
                        "Corrupt position cache, starting flat"
                    );
                    PositionRecord::flat(Utc::now())
                }
            },
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No position cache, starting flat");
                PositionRecord::flat(Utc::now())
            }
            Err(error) => {
                tracing::warn!(
                    path = %path.display(),
                    %error,
                    "Unreadable position cache, starting flat"
                );
                PositionRecord::flat(Utc::now())
            }
        }
    }

    /// Current direction, after lazy expiry.
    pub async fn get(&self) -> Option<Signal> {
        self.get_at(Utc::now()).await
    }

    /// Current direction at an explicit instant (for tests).
    pub async fn get_at(&self, now: DateTime<Utc>) -> Option<Signal> {
        let mut state = self.state.lock().await;

        if state.direction.is_some() && now - state.updated_at > self.expire {
            tracing::warn!(
                direction = %state.direction.map(|d| d.to_string()).unwrap_or_default(),
                age_secs = (now - state.updated_at).num_seconds(),
                "Cached position expired, forcing flat"
            );
            *state = PositionRecord::flat(now);
            self.save(&state).await;
        }

        state.direction
    }

    /// Record a newly opened direction.
    pub async fn update(&self, direction: Signal) {
        self.update_at(direction, Utc::now()).await
    }

    /// Record a newly opened direction at an explicit instant.
    pub async fn update_at(&self, direction: Signal, now: DateTime<Utc>) {
        let mut state = self.state.lock().await;
        *state = PositionRecord {
            direction: Some(direction),
            updated_at: now,
        };
        self.save(&state).await;
    }

    /// Force flat (position closed or stopped out).
    pub async fn reset(&self) {
        let mut state = self.state.lock().await;
        *state = PositionRecord::flat(Utc::now());
        self.save(&state).await;
    }

    /// Mirror the in-memory state to disk; failures are warned, never
    /// propagated.
    async fn save(&self, record: &PositionRecord) {
        if let Err(error) = self.try_save(record).await {
            tracing::warn!(
                path = %self.path.display(),
                %error,
                "Could not persist position cache"
            );
        }
    }

    async fn try_save(&self, record: &PositionRecord) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(record)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn expire() -> Duration {
        Duration::seconds(3600)
    }

    #[tokio::test]
    async fn test_starts_flat_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = PositionStore::open(dir.path().join("position.json"), expire()).await;
        assert_eq!(store.get().await, None);
    }

    #[tokio::test]
    async fn test_update_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let store = PositionStore::open(dir.path().join("position.json"), expire()).await;

        store.update(Signal::Buy).await;
        assert_eq!(store.get().await, Some(Signal::Buy));

        store.update(Signal::Sell).await;
        assert_eq!(store.get().await, Some(Signal::Sell));
    }

    #[tokio::test]
    async fn test_reset_forces_flat() {
        let dir = tempfile::tempdir().unwrap();
        let store = PositionStore::open(dir.path().join("position.json"), expire()).await;

        store.update(Signal::Buy).await;
        store.reset().await;
        assert_eq!(store.get().await, None);
    }

    #[tokio::test]
    async fn test_state_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("position.json");

        {
            let store = PositionStore::open(&path, expire()).await;
            store.update(Signal::Sell).await;
        }

        let reopened = PositionStore::open(&path, expire()).await;
        assert_eq!(reopened.get().await, Some(Signal::Sell));
    }

    #[tokio::test]
    async fn test_stale_direction_expires_on_read() {
        let dir = tempfile::tempdir().unwrap();
        let store = PositionStore::open(dir.path().join("position.json"), expire()).await;

        store.update_at(Signal::Buy, at(0)).await;

        // At the TTL boundary exactly: still held
        assert_eq!(store.get_at(at(3600)).await, Some(Signal::Buy));
        // Older than the TTL: forced flat
        assert_eq!(store.get_at(at(3601)).await, None);
        // And it stays flat
        assert_eq!(store.get_at(at(3602)).await, None);
    }

    #[tokio::test]
    async fn test_expiry_is_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("position.json");

        {
            let store = PositionStore::open(&path, expire()).await;
            store.update_at(Signal::Buy, at(0)).await;
            assert_eq!(store.get_at(at(4000)).await, None);
        }

        let reopened = PositionStore::open(&path, expire()).await;
        assert_eq!(reopened.get().await, None);
    }

    #[tokio::test]
    async fn test_corrupt_file_starts_flat() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("position.json");
        tokio::fs::write(&path, b"not json{{").await.unwrap();

        let store = PositionStore::open(&path, expire()).await;
        assert_eq!(store.get().await, None);

        // And the store still works after recovery
        store.update(Signal::Buy).await;
        assert_eq!(store.get().await, Some(Signal::Buy));
    }

    #[tokio::test]
    async fn test_unwritable_path_is_not_fatal() {
        let store =
            PositionStore::open("/nonexistent-dir/position.json", expire()).await;

        // Saves fail silently; memory state still serves reads
        store.update(Signal::Sell).await;
        assert_eq!(store.get().await, Some(Signal::Sell));
    }
}
