pub mod string;

pub use string::SecretString;

use keyring::Entry;
use regex::Regex;
use sdk::errors::EngineError;
use std::sync::OnceLock;

/// SecretManager resolves provider API keys.
///
/// Lookup order for a key such as `openai_api_key`:
/// 1. The environment variable with the upper-cased name (`OPENAI_API_KEY`)
/// 2. The OS keychain entry under the manager's service name
///
/// Nothing is prompted interactively; a run must be able to start unattended.
pub struct SecretManager {
    service_name: String,
}

/// Regex patterns for detecting common secret formats.
/// These are compiled once and reused for performance.
static SECRET_PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();

/// Initializes and returns the secret detection patterns.
///
/// Patterns match:
/// - OpenAI API keys: sk-[a-zA-Z0-9]{20,}
/// - Anthropic API keys: sk-ant-...
/// - Bearer tokens: Bearer\s+[^\s]{20,}
fn get_secret_patterns() -> &'static Vec<Regex> {
    SECRET_PATTERNS.get_or_init(|| {
        [
            // Also covers sk-proj- and sk-ant- prefixed keys
            r"sk-[a-zA-Z0-9\-_]{20,}",
            r"Bearer\s+[^\s]{20,}",
            r"x-api-key:\s*[^\s]{20,}",
        ]
        .iter()
        .filter_map(|pattern| Regex::new(pattern).ok())
        .collect()
    })
}

impl SecretManager {
    /// Creates a new SecretManager with the given keychain service name.
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }

    /// Environment variable consulted for `key`
    pub fn env_var_name(key: &str) -> String {
        key.to_ascii_uppercase()
    }

    /// Retrieves a secret from the environment or the OS keychain.
    ///
    /// # Errors
    /// Returns `EngineError::Secret` if neither source has a non-empty value
    pub fn get_secret(&self, key: &str) -> Result<SecretString, EngineError> {
        if let Ok(value) = std::env::var(Self::env_var_name(key)) {
            if !value.trim().is_empty() {
                tracing::debug!("Using secret '{}' from environment", key);
                return Ok(SecretString::new(value.trim()));
            }
        }

        let entry = Entry::new(&self.service_name, key).map_err(|e| {
            EngineError::Secret(format!("Failed to create keyring entry: {}", e))
        })?;

        match entry.get_password() {
            Ok(secret) if !secret.trim().is_empty() => {
                tracing::debug!("Retrieved secret '{}' from keychain", key);
                Ok(SecretString::new(secret))
            }
            Ok(_) | Err(keyring::Error::NoEntry) => Err(EngineError::Secret(format!(
                "'{}' is not set in the environment or keychain",
                key
            ))),
            Err(e) => Err(EngineError::Secret(format!(
                "Failed to retrieve secret '{}': {}",
                key, e
            ))),
        }
    }

    /// Scrubs secrets from text by replacing them with [REDACTED].
    ///
    /// Backend error bodies can echo request headers; they pass through
    /// here before being logged.
    ///
    /// # Examples
    /// ```
    /// use regent_engine::secrets::SecretManager;
    ///
    /// let scrubbed = SecretManager::scrub("My API key is sk-1234567890abcdefghij");
    /// assert_eq!(scrubbed, "My API key is [REDACTED]");
    /// ```
    pub fn scrub(text: &str) -> String {
        let mut result = text.to_string();

        for pattern in get_secret_patterns() {
            result = pattern.replace_all(&result, "[REDACTED]").to_string();
        }

        result
    }
}
