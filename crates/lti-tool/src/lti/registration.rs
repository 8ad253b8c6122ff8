//! Tool configuration: platform registrations keyed by issuer.
//!
//! The file maps each issuer to one registration object or a list of them.
//! Key file paths are resolved against the directory holding the file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use jsonwebtoken::jwk::JwkSet;
use serde::Deserialize;

use super::keys::{PublicKeySet, ToolKey};
use crate::error::{ConfigError, LtiError, LtiResult};

#[derive(Debug, Deserialize)]
struct RegistrationEntry {
    #[serde(default)]
    default: bool,
    client_id: String,
    auth_login_url: String,
    auth_token_url: String,
    #[serde(default)]
    auth_audience: Option<String>,
    #[serde(default)]
    key_set_url: Option<String>,
    #[serde(default)]
    key_set: Option<JwkSet>,
    private_key_file: PathBuf,
    #[serde(default)]
    public_key_file: Option<PathBuf>,
    #[serde(default)]
    deployment_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(RegistrationEntry),
    Many(Vec<RegistrationEntry>),
}

/// A platform registration for one (issuer, client id) pair.
#[derive(Debug, Clone)]
pub struct Registration {
    pub issuer: String,
    pub client_id: String,
    pub is_default: bool,
    pub auth_login_url: String,
    pub auth_token_url: String,
    pub auth_audience: Option<String>,
    pub key_set_url: Option<String>,
    pub key_set: Option<JwkSet>,
    pub deployment_ids: Vec<String>,
    pub tool_key: Arc<ToolKey>,
}

impl Registration {
    /// Whether `deployment_id` belongs to this registration.
    #[must_use]
    pub fn has_deployment(&self, deployment_id: &str) -> bool {
        self.deployment_ids.iter().any(|d| d == deployment_id)
    }

    /// Audience for client assertions sent to the token endpoint.
    #[must_use]
    pub fn token_audience(&self) -> &str {
        self.auth_audience.as_deref().unwrap_or(&self.auth_token_url)
    }
}

/// All registrations, loaded once and never mutated.
#[derive(Debug, Clone, Default)]
pub struct ToolConfig {
    issuers: HashMap<String, Vec<Arc<Registration>>>,
}

impl ToolConfig {
    /// Load the configuration file at `path`.
    ///
    /// # Errors
    ///
    /// Returns error if the file or a referenced key cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = read(path)?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_json(&json, base_dir)
    }

    /// Parse configuration JSON, resolving key paths against `base_dir`.
    ///
    /// # Errors
    ///
    /// Returns error on invalid JSON or unusable key material.
    pub fn from_json(json: &str, base_dir: &Path) -> Result<Self, ConfigError> {
        let raw: HashMap<String, OneOrMany> = serde_json::from_str(json)?;
        let mut issuers = HashMap::with_capacity(raw.len());

        for (issuer, entries) in raw {
            let entries = match entries {
                OneOrMany::One(entry) => vec![entry],
                OneOrMany::Many(entries) => entries,
            };

            let mut registrations = Vec::with_capacity(entries.len());
            for entry in entries {
                registrations.push(Arc::new(build_registration(&issuer, entry, base_dir)?));
            }
            issuers.insert(issuer, registrations);
        }

        Ok(Self { issuers })
    }

    /// Find the registration for `issuer`.
    ///
    /// With a client id the matching registration is returned; without one
    /// the registration flagged `default` wins, else the first listed.
    ///
    /// # Errors
    ///
    /// Returns error if the issuer or client id is not registered.
    pub fn find_registration(&self, issuer: &str, client_id: Option<&str>) -> LtiResult<Arc<Registration>> {
        let registrations = self
            .issuers
            .get(issuer)
            .filter(|r| !r.is_empty())
            .ok_or_else(|| LtiError::UnknownIssuer(issuer.to_string()))?;

        let found = match client_id {
            Some(client_id) => registrations.iter().find(|r| r.client_id == client_id),
            None => registrations.iter().find(|r| r.is_default).or_else(|| registrations.first()),
        };

        found.cloned().ok_or_else(|| LtiError::UnknownClient {
            issuer: issuer.to_string(),
            client_id: client_id.unwrap_or_default().to_string(),
        })
    }

    /// Every registration across all issuers.
    pub fn registrations(&self) -> impl Iterator<Item = &Arc<Registration>> {
        self.issuers.values().flatten()
    }

    /// Number of registrations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.issuers.values().map(Vec::len).sum()
    }

    /// Whether no platform is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Public keys of every registration, one entry per kid.
    #[must_use]
    pub fn jwks(&self) -> PublicKeySet {
        let mut set = PublicKeySet::default();
        let mut registrations: Vec<_> = self.registrations().collect();
        registrations.sort_by(|a, b| (&a.issuer, &a.client_id).cmp(&(&b.issuer, &b.client_id)));
        for registration in registrations {
            set.push_unique(registration.tool_key.public_jwk());
        }
        set
    }
}

fn build_registration(issuer: &str, entry: RegistrationEntry, base_dir: &Path) -> Result<Registration, ConfigError> {
    let private_path = base_dir.join(&entry.private_key_file);
    let private_pem = read(&private_path)?;
    let public_pem = entry
        .public_key_file
        .as_ref()
        .map(|p| read(&base_dir.join(p)))
        .transpose()?;

    let tool_key = ToolKey::from_pem(&private_pem, public_pem.as_deref())
        .map_err(|e| ConfigError::key(&private_path, e))?;

    if entry.key_set.is_none() && entry.key_set_url.is_none() {
        tracing::warn!(issuer, client_id = %entry.client_id, "Registration has no platform key set");
    }

    Ok(Registration {
        issuer: issuer.to_string(),
        client_id: entry.client_id,
        is_default: entry.default,
        auth_login_url: entry.auth_login_url,
        auth_token_url: entry.auth_token_url,
        auth_audience: entry.auth_audience,
        key_set_url: entry.key_set_url,
        key_set: entry.key_set,
        deployment_ids: entry.deployment_ids,
        tool_key: Arc::new(tool_key),
    })
}

fn read(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })
}
