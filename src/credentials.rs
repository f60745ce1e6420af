use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SpeechError;

/// A stored API credential.
///
/// Identity is the raw key string; labels are only for display. `Debug` and
/// `Display` print a masked form.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKey {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Unix time of the last successful balance check.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_validated: Option<u64>,
}

impl ApiKey {
    pub fn new(key: impl Into<String>, label: Option<String>) -> Self {
        Self {
            key: key.into(),
            label,
            last_validated: None,
        }
    }

    /// The key with everything but its last four characters hidden.
    pub fn masked(&self) -> String {
        mask(&self.key)
    }

    fn matches(&self, key_or_label: &str) -> bool {
        self.key == key_or_label || self.label.as_deref() == Some(key_or_label)
    }
}

/// Hide all but the last four characters of a secret.
pub fn mask(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("…{tail}")
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKey")
            .field("key", &self.masked())
            .field("label", &self.label)
            .field("last_validated", &self.last_validated)
            .finish()
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.label {
            Some(label) => write!(f, "{label} ({})", self.masked()),
            None => f.write_str(&self.masked()),
        }
    }
}

/// In-memory set of API keys in insertion order, plus the current key.
///
/// Persistence goes through [`crate::config::Settings`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialStore {
    #[serde(default)]
    keys: Vec<ApiKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    current: Option<String>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a key. Returns `false` without changing anything if the exact key
    /// string is already stored.
    pub fn add(&mut self, key: &str, label: Option<&str>) -> Result<bool, SpeechError> {
        let key = key.trim();
        if key.is_empty() {
            return Err(SpeechError::InvalidParameter("API key is empty".to_string()));
        }
        if self.keys.iter().any(|k| k.key == key) {
            log::debug!("Key {} already stored", mask(key));
            return Ok(false);
        }

        let label = label.map(str::trim).filter(|l| !l.is_empty()).map(String::from);
        self.keys.push(ApiKey::new(key, label));
        if self.current.is_none() {
            self.current = Some(key.to_string());
        }
        Ok(true)
    }

    /// Remove a key by its value or label. Returns the removed key.
    pub fn remove(&mut self, key_or_label: &str) -> Option<ApiKey> {
        let pos = self.keys.iter().position(|k| k.matches(key_or_label))?;
        let removed = self.keys.remove(pos);
        if self.current.as_deref() == Some(removed.key.as_str()) {
            self.current = self.keys.first().map(|k| k.key.clone());
        }
        Some(removed)
    }

    pub fn list(&self) -> &[ApiKey] {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn get(&self, key_or_label: &str) -> Option<&ApiKey> {
        self.keys.iter().find(|k| k.matches(key_or_label))
    }

    /// The key used for conversions.
    pub fn current(&self) -> Option<&ApiKey> {
        let current = self.current.as_deref()?;
        self.keys.iter().find(|k| k.key == current)
    }

    pub fn set_current(&mut self, key_or_label: &str) -> bool {
        match self.get(key_or_label) {
            Some(k) => {
                self.current = Some(k.key.clone());
                true
            }
            None => false,
        }
    }

    /// Record a successful balance check for `key`.
    pub fn mark_validated(&mut self, key: &str, unix_time: u64) {
        if let Some(k) = self.keys.iter_mut().find(|k| k.key == key) {
            k.last_validated = Some(unix_time);
        }
    }
}
