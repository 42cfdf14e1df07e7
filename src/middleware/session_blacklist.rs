/*!
 * Session Blacklist
 *
 * An in-memory key→expiry map keyed by session id: presence of a session id here means every token
 * minted under that session is revoked, regardless of its own `exp`.
 * Logout and refresh both insert into this store; a periodic sweeper
 * drops entries once they would have expired naturally anyway, so the
 * map never grows past the number of sessions revoked within one
 * token lifetime.
 */

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Session revocation store, guarded by a reader-writer lock.
#[derive(Clone, Default)]
pub struct SessionBlacklist {
    entries: Arc<RwLock<HashMap<String, DateTime<Utc>>>>,
}

impl SessionBlacklist {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Revoke a session id until `ttl` elapses. Callers pass the
    /// session's remaining token lifetime so the entry self-expires
    /// at the same moment the token would have anyway.
    pub fn blacklist(&self, session_id: &str, ttl: Duration) {
        let expires_at = Utc::now() + ttl;
        let mut entries = self.entries.write().unwrap();
        entries.insert(session_id.to_string(), expires_at);
    }

    /// True if the session id is currently revoked.
    pub fn is_blacklisted(&self, session_id: &str) -> bool {
        let entries = self.entries.read().unwrap();
        match entries.get(session_id) {
            Some(expires_at) => *expires_at > Utc::now(),
            None => false,
        }
    }

    /// Drop entries whose revocation window has lapsed. Safe to call
    /// frequently; intended to run on a ticker from the background
    /// sweeper task.
    pub fn sweep(&self) {
        let now = Utc::now();
        let mut entries = self.entries.write().unwrap();
        entries.retain(|_, expires_at| *expires_at > now);
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration as StdDuration;

    #[test]
    fn test_not_blacklisted_by_default() {
        let store = SessionBlacklist::new();
        assert!(!store.is_blacklisted("session-1"));
    }

    #[test]
    fn test_blacklist_and_check() {
        let store = SessionBlacklist::new();
        store.blacklist("session-1", Duration::hours(1));
        assert!(store.is_blacklisted("session-1"));
        assert!(!store.is_blacklisted("session-2"));
    }

    #[test]
    fn test_blacklist_entry_expires() {
        let store = SessionBlacklist::new();
        store.blacklist("session-1", Duration::seconds(1));
        assert!(store.is_blacklisted("session-1"));

        sleep(StdDuration::from_secs(2));
        assert!(!store.is_blacklisted("session-1"));
    }

    #[test]
    fn test_sweep_drops_expired_entries() {
        let store = SessionBlacklist::new();
        store.blacklist("short", Duration::seconds(1));
        store.blacklist("long", Duration::hours(1));
        assert_eq!(store.len(), 2);

        sleep(StdDuration::from_secs(2));
        store.sweep();

        assert_eq!(store.len(), 1);
        assert!(!store.is_blacklisted("short"));
        assert!(store.is_blacklisted("long"));
    }
}
