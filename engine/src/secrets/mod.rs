//! API key storage
//!
//! Keys are looked up in the process environment first and then in the OS
//! keychain under the `slidewright` service. They never live in the config file.

pub mod cache;
pub mod string;

pub use cache::SecretCache;
pub use string::SecretString;

use keyring::Entry;
use regex::Regex;
use sdk::errors::PipelineError;
use std::io::{self, Write};
use std::sync::OnceLock;

/// Keychain service name
pub const SERVICE_NAME: &str = "slidewright";

/// Secret keys known to the provider adapters
pub const KNOWN_KEYS: &[&str] = &[
    "openai_api_key",
    "openai_compatible_api_key",
    "anthropic_api_key",
    "gemini_api_key",
];

/// SecretManager handles storage and retrieval of API keys using the OS keychain.
///
/// Secrets are stored in:
/// - macOS: Keychain
/// - Windows: Credential Manager
/// - Linux: Secret Service (libsecret)
pub struct SecretManager {
    service_name: String,
}

static SECRET_PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();

/// Patterns for key formats that may show up in provider error bodies
fn secret_patterns() -> &'static [Regex] {
    SECRET_PATTERNS.get_or_init(|| {
        [
            // OpenAI and Anthropic keys (sk-, sk-proj-, sk-ant-...)
            r"sk-[a-zA-Z0-9\-_]{20,}",
            r"AIza[0-9A-Za-z\-_]{35}",
            r"Bearer\s+[^\s]{20,}",
            r"key=[0-9A-Za-z\-_]{20,}",
        ]
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect()
    })
}

/// Environment variable consulted before the keychain for `key`
///
/// `openai_api_key` maps to `OPENAI_API_KEY`.
pub fn env_var_for(key: &str) -> String {
    key.to_ascii_uppercase()
}

impl SecretManager {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }

    /// Retrieves a secret from the OS keychain.
    ///
    /// Returns `Ok(None)` when no entry exists. Pipeline runs never prompt;
    /// a missing key surfaces as an authentication failure from the provider.
    pub fn get_secret(&self, key: &str) -> Result<Option<String>, PipelineError> {
        let entry = self.entry(key)?;

        match entry.get_password() {
            Ok(secret) => {
                tracing::debug!("Retrieved secret '{}' from keychain", key);
                Ok(Some(secret))
            }
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(PipelineError::Keyring(format!(
                "Failed to retrieve secret '{}': {}",
                key, e
            ))),
        }
    }

    /// Stores a secret in the OS keychain.
    pub fn set_secret(&self, key: &str, value: &str) -> Result<(), PipelineError> {
        if value.trim().is_empty() {
            return Err(PipelineError::Keyring("Secret cannot be empty".to_string()));
        }

        self.entry(key)?.set_password(value).map_err(|e| {
            PipelineError::Keyring(format!("Failed to store secret '{}': {}", key, e))
        })?;

        tracing::info!("Stored secret '{}' in keychain", key);
        Ok(())
    }

    /// Deletes a secret from the OS keychain.
    pub fn delete_secret(&self, key: &str) -> Result<(), PipelineError> {
        self.entry(key)?.delete_password().map_err(|e| {
            PipelineError::Keyring(format!("Failed to delete secret '{}': {}", key, e))
        })?;

        tracing::info!("Deleted secret '{}' from keychain", key);
        Ok(())
    }

    /// Checks if a secret exists in the OS keychain.
    pub fn has_secret(&self, key: &str) -> bool {
        match Entry::new(&self.service_name, key) {
            Ok(entry) => entry.get_password().is_ok(),
            Err(_) => false,
        }
    }

    /// Prompts on stderr and reads one line from stdin.
    pub fn prompt_for_secret(&self, key: &str) -> Result<String, PipelineError> {
        eprint!("Enter value for '{}': ", key);
        io::stderr()
            .flush()
            .map_err(|e| PipelineError::Keyring(format!("Failed to flush stderr: {}", e)))?;

        let mut input = String::new();
        io::stdin()
            .read_line(&mut input)
            .map_err(|e| PipelineError::Keyring(format!("Failed to read input: {}", e)))?;

        let secret = input.trim().to_string();
        if secret.is_empty() {
            return Err(PipelineError::Keyring("Secret cannot be empty".to_string()));
        }

        Ok(secret)
    }

    /// Replaces anything that looks like an API key with `[REDACTED]`.
    ///
    /// Applied to provider error bodies before they reach logs or errors.
    ///
    /// ```
    /// use slidewright_engine::secrets::SecretManager;
    ///
    /// let scrubbed = SecretManager::scrub("bad key sk-1234567890abcdefghij");
    /// assert_eq!(scrubbed, "bad key [REDACTED]");
    /// ```
    pub fn scrub(text: &str) -> String {
        let mut result = text.to_string();
        for pattern in secret_patterns() {
            result = pattern.replace_all(&result, "[REDACTED]").to_string();
        }
        result
    }

    fn entry(&self, key: &str) -> Result<Entry, PipelineError> {
        Entry::new(&self.service_name, key).map_err(|e| {
            PipelineError::Keyring(format!("Failed to create keyring entry: {}", e))
        })
    }
}

impl Default for SecretManager {
    fn default() -> Self {
        Self::new(SERVICE_NAME)
    }
}
