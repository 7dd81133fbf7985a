//! Registry of exclusively claimed devices.
//!
//! The host USB stack does not reliably refuse a second open of the same HID
//! device from within one process, so claims are tracked here. A [`Claim`]
//! holds its key until dropped.

use std::collections::HashSet;
use std::sync::{Arc, LazyLock, Mutex, MutexGuard};

use crate::device::{DeviceError, Result};

static GLOBAL: LazyLock<ClaimRegistry> = LazyLock::new(ClaimRegistry::default);

/// Set of device keys currently held by a live session.
#[derive(Debug, Clone, Default)]
pub struct ClaimRegistry {
    held: Arc<Mutex<HashSet<String>>>,
}

impl ClaimRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide registry used by the real backends.
    pub fn global() -> &'static ClaimRegistry {
        &GLOBAL
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        // A panic while holding the lock cannot leave the set half-updated.
        self.held.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Claim `key`, failing with [`DeviceError::InUse`] if it is already held.
    pub fn claim(&self, key: &str) -> Result<Claim> {
        if !self.lock().insert(key.to_string()) {
            return Err(DeviceError::InUse(key.to_string()));
        }
        log::debug!("claimed {key}");
        Ok(Claim {
            key: key.to_string(),
            registry: self.clone(),
        })
    }

    pub fn is_claimed(&self, key: &str) -> bool {
        self.lock().contains(key)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// Exclusive hold on one device key. Released on drop.
#[derive(Debug)]
pub struct Claim {
    key: String,
    registry: ClaimRegistry,
}

impl Claim {
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for Claim {
    fn drop(&mut self) {
        self.registry.lock().remove(&self.key);
        log::debug!("released {}", self.key);
    }
}
