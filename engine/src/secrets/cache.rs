use crate::secrets::string::SecretString;
use crate::secrets::{env_var_for, SecretManager};
use sdk::errors::PipelineError;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// An in-memory cache in front of the environment and the OS keychain.
///
/// Lookup order: cache, then `env_var_for(key)`, then the keychain.
/// Misses are not cached, so a key stored mid-session is picked up.
#[derive(Clone)]
pub struct SecretCache {
    manager: Arc<SecretManager>,
    cache: Arc<RwLock<HashMap<String, SecretString>>>,
    /// Seeded caches answer from their values only
    sealed: bool,
}

impl SecretCache {
    pub fn new(manager: Arc<SecretManager>) -> Self {
        Self {
            manager,
            cache: Arc::new(RwLock::new(HashMap::new())),
            sealed: false,
        }
    }

    /// A cache seeded with fixed values that never consults the
    /// environment or the keychain.
    pub fn with_values<I, K, V>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<SecretString>,
    {
        let cache = values
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            manager: Arc::new(SecretManager::default()),
            cache: Arc::new(RwLock::new(cache)),
            sealed: true,
        }
    }

    pub fn get_secret(&self, key: &str) -> Result<Option<SecretString>, PipelineError> {
        {
            let cache = self.cache.read().unwrap_or_else(|e| e.into_inner());
            if let Some(secret) = cache.get(key) {
                return Ok(Some(secret.clone()));
            }
        }
        if self.sealed {
            return Ok(None);
        }

        let found = match std::env::var(env_var_for(key)) {
            Ok(value) if !value.trim().is_empty() => {
                tracing::debug!("Using secret '{}' from environment", key);
                Some(value)
            }
            _ => self.manager.get_secret(key)?,
        };

        let Some(raw) = found else {
            return Ok(None);
        };

        let secret = SecretString::new(raw);
        self.cache
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), secret.clone());

        Ok(Some(secret))
    }
}
