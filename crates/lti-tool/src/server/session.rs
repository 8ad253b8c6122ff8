//! Server-side HTTP sessions referenced by a signed cookie.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum_extra::extract::cookie::{Cookie, SameSite, SignedCookieJar};
use moka::future::Cache;
use serde::{Deserialize, Serialize};

use crate::config::{Config, SessionBackend};
use crate::error::SessionError;

/// What the tool remembers about a browser between requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub course_id: Option<String>,
    #[serde(default)]
    pub is_instructor: bool,
    #[serde(default)]
    pub launch_id: Option<String>,
}

impl SessionRecord {
    /// Check that the session belongs to a launched user in a course.
    ///
    /// # Errors
    ///
    /// Returns a message for the user when either id is missing.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.user_id.is_none() {
            return Err("No user session found. Please launch from your LMS.");
        }
        if self.course_id.is_none() {
            return Err("No course context found. Please launch from a course.");
        }
        Ok(())
    }
}

/// Session persistence.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load a live session.
    async fn load(&self, id: &str) -> Result<Option<SessionRecord>, SessionError>;

    /// Create or replace a session, restarting its idle timer.
    async fn save(&self, id: &str, record: &SessionRecord) -> Result<(), SessionError>;

    /// Remove a session.
    async fn clear(&self, id: &str) -> Result<(), SessionError>;
}

/// Build the store selected by `config`.
///
/// # Errors
///
/// Returns error if the session directory cannot be created.
pub fn build_store(config: &Config) -> Result<Box<dyn SessionStore>, SessionError> {
    match &config.session_backend {
        SessionBackend::Memory => Ok(Box::new(MemorySessionStore::new(config.session_lifetime))),
        SessionBackend::Filesystem(dir) => {
            std::fs::create_dir_all(dir)?;
            Ok(Box::new(FileSessionStore::new(dir.clone(), config.session_lifetime)))
        }
    }
}

/// In-process sessions that expire after a period of inactivity.
pub struct MemorySessionStore {
    sessions: Cache<String, SessionRecord>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new(lifetime: Duration) -> Self {
        Self { sessions: Cache::builder().max_capacity(100_000).time_to_idle(lifetime).build() }
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, id: &str) -> Result<Option<SessionRecord>, SessionError> {
        Ok(self.sessions.get(id).await)
    }

    async fn save(&self, id: &str, record: &SessionRecord) -> Result<(), SessionError> {
        self.sessions.insert(id.to_string(), record.clone()).await;
        Ok(())
    }

    async fn clear(&self, id: &str) -> Result<(), SessionError> {
        self.sessions.invalidate(id).await;
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredSession {
    expires_at: i64,
    record: SessionRecord,
}

/// Expired session files are swept at most this often.
const SWEEP_INTERVAL_SECS: i64 = 60;

/// Sessions stored as one JSON file each.
///
/// Each load pushes the expiry forward, so a session lives until it has
/// been idle for `lifetime`.
pub struct FileSessionStore {
    dir: PathBuf,
    lifetime: Duration,
    last_sweep: AtomicI64,
}

impl FileSessionStore {
    #[must_use]
    pub fn new(dir: PathBuf, lifetime: Duration) -> Self {
        Self { dir, lifetime, last_sweep: AtomicI64::new(0) }
    }

    fn path(&self, id: &str) -> Result<PathBuf, SessionError> {
        let valid = !id.is_empty() && id.len() <= 128 && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
        if !valid {
            return Err(SessionError::InvalidId);
        }
        Ok(self.dir.join(format!("{id}.json")))
    }

    async fn write(&self, path: &Path, record: SessionRecord) -> Result<(), SessionError> {
        let stored = StoredSession {
            expires_at: chrono::Utc::now().timestamp() + self.lifetime.as_secs() as i64,
            record,
        };
        tokio::fs::write(path, serde_json::to_vec(&stored)?).await?;
        Ok(())
    }

    /// Delete every expired session file.
    async fn sweep(&self) -> Result<usize, SessionError> {
        let now = chrono::Utc::now().timestamp();
        let mut removed = 0;
        let mut entries = tokio::fs::read_dir(&self.dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }
            let Ok(bytes) = tokio::fs::read(&path).await else { continue };
            let Ok(stored) = serde_json::from_slice::<StoredSession>(&bytes) else { continue };
            if stored.expires_at <= now {
                match tokio::fs::remove_file(&path).await {
                    Ok(()) => removed += 1,
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(e) => return Err(e.into()),
                }
            }
        }

        Ok(removed)
    }

    async fn sweep_if_due(&self) {
        let now = chrono::Utc::now().timestamp();
        let last = self.last_sweep.load(Ordering::Relaxed);
        if now - last < SWEEP_INTERVAL_SECS {
            return;
        }
        if self.last_sweep.compare_exchange(last, now, Ordering::Relaxed, Ordering::Relaxed).is_err() {
            return;
        }

        match self.sweep().await {
            Ok(0) => {}
            Ok(removed) => tracing::debug!(removed, dir = %self.dir.display(), "Swept expired sessions"),
            Err(e) => tracing::warn!(error = %e, dir = %self.dir.display(), "Session sweep failed"),
        }
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn load(&self, id: &str) -> Result<Option<SessionRecord>, SessionError> {
        let path = self.path(id)?;
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let stored: StoredSession = serde_json::from_slice(&bytes)?;
        if stored.expires_at <= chrono::Utc::now().timestamp() {
            tracing::debug!(path = %path.display(), "Removing expired session");
            self.clear(id).await?;
            return Ok(None);
        }

        self.write(&path, stored.record.clone()).await?;
        Ok(Some(stored.record))
    }

    async fn save(&self, id: &str, record: &SessionRecord) -> Result<(), SessionError> {
        let path = self.path(id)?;
        self.sweep_if_due().await;
        self.write(&path, record.clone()).await
    }

    async fn clear(&self, id: &str) -> Result<(), SessionError> {
        match tokio::fs::remove_file(self.path(id)?).await {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// New random session id.
#[must_use]
pub fn new_session_id() -> String {
    format!("{}{}", uuid::Uuid::new_v4().simple(), uuid::Uuid::new_v4().simple())
}

/// Session id from the signed session cookie.
#[must_use]
pub fn session_id(config: &Config, jar: &SignedCookieJar) -> Option<String> {
    jar.get(&config.session_cookie_name).map(|c| c.value().to_string())
}

/// The session cookie carrying `id`.
#[must_use]
pub fn session_cookie(config: &Config, id: String) -> Cookie<'static> {
    cookie(config, config.session_cookie_name.clone(), id)
}

/// The cookie binding OIDC `state` to the browser that started the login.
#[must_use]
pub fn state_cookie(config: &Config, state: &str) -> Cookie<'static> {
    cookie(config, Config::state_cookie_name(state), state.to_string())
}

/// Cross-site cookie: the launch arrives as a POST from the platform's origin.
fn cookie(config: &Config, name: String, value: String) -> Cookie<'static> {
    let mut builder = Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::None)
        .secure(config.session_cookie_secure);
    if let Some(domain) = &config.session_cookie_domain {
        builder = builder.domain(domain.clone());
    }
    builder.build()
}
