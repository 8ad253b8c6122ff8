//! Launch data storage: pending OIDC logins, issued nonces, validated launches.
//!
//! Every map is a moka cache with a TTL. Consuming an entry is a `remove`,
//! so a state or nonce can be taken by at most one request.

use std::time::Duration;

use moka::future::Cache;

use super::launch::MessageLaunch;

const MAX_ENTRIES: u64 = 100_000;

/// A login started by `/login` and awaiting its launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingLogin {
    pub nonce: String,
    pub issuer: String,
    pub client_id: String,
}

/// Shared launch storage.
#[derive(Clone)]
pub struct LaunchStore {
    pending: Cache<String, PendingLogin>,
    nonces: Cache<String, ()>,
    launches: Cache<String, MessageLaunch>,
}

impl LaunchStore {
    /// Create a store. Logins and nonces live for `login_ttl`, validated
    /// launches for `launch_ttl`.
    #[must_use]
    pub fn new(login_ttl: Duration, launch_ttl: Duration) -> Self {
        Self {
            pending: Cache::builder().max_capacity(MAX_ENTRIES).time_to_live(login_ttl).build(),
            nonces: Cache::builder().max_capacity(MAX_ENTRIES).time_to_live(login_ttl).build(),
            launches: Cache::builder().max_capacity(MAX_ENTRIES).time_to_live(launch_ttl).build(),
        }
    }

    /// Record a pending login and its nonce.
    pub async fn save_login(&self, state: &str, login: PendingLogin) {
        self.nonces.insert(login.nonce.clone(), ()).await;
        self.pending.insert(state.to_string(), login).await;
    }

    /// Take the pending login for `state`; a second call returns `None`.
    pub async fn take_login(&self, state: &str) -> Option<PendingLogin> {
        self.pending.remove(state).await
    }

    /// Consume an issued nonce. Returns false if unknown, expired or used.
    pub async fn consume_nonce(&self, nonce: &str) -> bool {
        self.nonces.remove(nonce).await.is_some()
    }

    /// Store a validated launch under its id.
    pub async fn save_launch(&self, launch: MessageLaunch) {
        self.launches.insert(launch.launch_id.clone(), launch).await;
    }

    /// Look up a validated launch.
    pub async fn get_launch(&self, launch_id: &str) -> Option<MessageLaunch> {
        self.launches.get(launch_id).await
    }
}

impl std::fmt::Debug for LaunchStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LaunchStore")
            .field("pending", &self.pending.entry_count())
            .field("launches", &self.launches.entry_count())
            .finish()
    }
}
