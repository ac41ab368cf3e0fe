//! Test doubles shared by unit and integration tests.

use crate::coordinator::BrowserOpener;
use crate::error::AuthError;
use crate::token_store::SecretStore;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

/// In-memory [`SecretStore`] with optional per-key write failures.
#[derive(Clone, Default)]
pub struct MemorySecretStore {
    values: Arc<Mutex<HashMap<String, String>>>,
    failing_keys: Arc<Mutex<HashSet<String>>>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `store` of `key` fail.
    pub fn fail_writes_of(&self, key: &str) {
        self.failing_keys
            .lock()
            .unwrap()
            .insert(key.to_string());
    }
}

#[async_trait]
impl SecretStore for MemorySecretStore {
    async fn get(&self, key: &str) -> Result<Option<String>, AuthError> {
        Ok(self.values.lock().unwrap().get(key).cloned())
    }

    async fn store(&self, key: &str, value: &str) -> Result<(), AuthError> {
        if self.failing_keys.lock().unwrap().contains(key) {
            return Err(AuthError::Storage(format!("injected failure for {key}")));
        }
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), AuthError> {
        self.values.lock().unwrap().remove(key);
        Ok(())
    }
}

/// Records the URLs it is asked to open instead of launching a browser.
#[derive(Clone, Default)]
pub struct MockBrowser {
    opened: Arc<Mutex<Vec<String>>>,
    fail: Arc<Mutex<bool>>,
}

impl MockBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next(&self) {
        *self.fail.lock().unwrap() = true;
    }

    pub fn opened_urls(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }

    pub fn last_opened(&self) -> Option<String> {
        self.opened.lock().unwrap().last().cloned()
    }
}

impl BrowserOpener for MockBrowser {
    fn open(&self, url: &str) -> Result<(), AuthError> {
        if std::mem::take(&mut *self.fail.lock().unwrap()) {
            return Err(AuthError::BrowserLaunch("injected failure".to_string()));
        }
        self.opened.lock().unwrap().push(url.to_string());
        Ok(())
    }
}
