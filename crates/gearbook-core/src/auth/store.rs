//! Persistent storage for the access/refresh token pair.
//!
//! Storage is two string-valued slots addressed by [`TokenSlot`]. The trait
//! is deliberately infallible: a broken backing store must never panic or
//! abort the auth path, so implementations log the failure and behave as if
//! the slot were absent.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use keyring::Entry;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Token file name in the config directory
const TOKEN_FILE: &str = "tokens.json";

/// Keychain service name
const SERVICE_NAME: &str = "gearbook";

/// The two persisted credential slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenSlot {
    Access,
    Refresh,
}

impl TokenSlot {
    pub fn as_str(self) -> &'static str {
        match self {
            TokenSlot::Access => "access",
            TokenSlot::Refresh => "refresh",
        }
    }
}

/// A persistent key-value store for bearer tokens.
///
/// Writes are last-write-wins; no transactional guarantee is needed because
/// each write only ever stores a token the session itself just obtained.
pub trait TokenStore: Send + Sync {
    fn get(&self, slot: TokenSlot) -> Option<String>;
    fn set(&self, slot: TokenSlot, value: &str);
    fn remove(&self, slot: TokenSlot);
}

// ===== File-backed store =====

#[derive(Debug, Default, Serialize, Deserialize)]
struct TokenFile {
    #[serde(skip_serializing_if = "Option::is_none")]
    access: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    refresh: Option<String>,
}

impl TokenFile {
    fn slot_mut(&mut self, slot: TokenSlot) -> &mut Option<String> {
        match slot {
            TokenSlot::Access => &mut self.access,
            TokenSlot::Refresh => &mut self.refresh,
        }
    }
}

/// Token store persisted as a JSON file under the application directory.
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            path: dir.join(TOKEN_FILE),
        }
    }

    fn load(&self) -> TokenFile {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                warn!(error = %e, "Failed to parse token file, treating as empty");
                TokenFile::default()
            }),
            Err(_) => TokenFile::default(),
        }
    }

    fn save(&self, file: &TokenFile) {
        if let Some(parent) = self.path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                warn!(error = %e, "Failed to create token directory");
                return;
            }
        }
        match serde_json::to_string_pretty(file) {
            Ok(contents) => {
                if let Err(e) = std::fs::write(&self.path, contents) {
                    warn!(error = %e, "Failed to write token file");
                }
            }
            Err(e) => warn!(error = %e, "Failed to serialize token file"),
        }
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self, slot: TokenSlot) -> Option<String> {
        let mut file = self.load();
        file.slot_mut(slot).take()
    }

    fn set(&self, slot: TokenSlot, value: &str) {
        let mut file = self.load();
        *file.slot_mut(slot) = Some(value.to_string());
        self.save(&file);
    }

    fn remove(&self, slot: TokenSlot) {
        let mut file = self.load();
        if file.slot_mut(slot).take().is_some() {
            self.save(&file);
        }
    }
}

// ===== OS keychain store =====

/// Token store backed by the OS keychain.
pub struct KeyringTokenStore;

impl KeyringTokenStore {
    fn entry(slot: TokenSlot) -> Option<Entry> {
        match Entry::new(SERVICE_NAME, slot.as_str()) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(slot = slot.as_str(), error = %e, "Failed to open keyring entry");
                None
            }
        }
    }
}

impl TokenStore for KeyringTokenStore {
    fn get(&self, slot: TokenSlot) -> Option<String> {
        Self::entry(slot)?.get_password().ok()
    }

    fn set(&self, slot: TokenSlot, value: &str) {
        if let Some(entry) = Self::entry(slot) {
            if let Err(e) = entry.set_password(value) {
                warn!(slot = slot.as_str(), error = %e, "Failed to store token in keychain");
            }
        }
    }

    fn remove(&self, slot: TokenSlot) {
        if let Some(entry) = Self::entry(slot) {
            match entry.delete_credential() {
                Ok(()) | Err(keyring::Error::NoEntry) => {}
                Err(e) => {
                    warn!(slot = slot.as_str(), error = %e, "Failed to delete token from keychain")
                }
            }
        }
    }
}

// ===== In-memory store =====

/// Ephemeral token store for tests and one-shot sessions.
#[derive(Default)]
pub struct MemoryTokenStore {
    slots: Mutex<HashMap<TokenSlot, String>>,
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, slot: TokenSlot) -> Option<String> {
        self.slots.lock().unwrap().get(&slot).cloned()
    }

    fn set(&self, slot: TokenSlot, value: &str) {
        self.slots.lock().unwrap().insert(slot, value.to_string());
    }

    fn remove(&self, slot: TokenSlot) {
        self.slots.lock().unwrap().remove(&slot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_round_trips_slots_independently() {
        let store = MemoryTokenStore::default();
        store.set(TokenSlot::Access, "a.b.c");
        store.set(TokenSlot::Refresh, "r1");

        assert_eq!(store.get(TokenSlot::Access).as_deref(), Some("a.b.c"));
        assert_eq!(store.get(TokenSlot::Refresh).as_deref(), Some("r1"));

        store.remove(TokenSlot::Access);
        assert_eq!(store.get(TokenSlot::Access), None);
        assert_eq!(store.get(TokenSlot::Refresh).as_deref(), Some("r1"));
    }

    #[test]
    fn memory_store_remove_is_idempotent() {
        let store = MemoryTokenStore::default();
        store.set(TokenSlot::Access, "a.b.c");
        store.remove(TokenSlot::Access);
        store.remove(TokenSlot::Access);
        assert_eq!(store.get(TokenSlot::Access), None);
    }

    #[test]
    fn file_store_persists_and_clears() {
        let dir = std::env::temp_dir().join(format!(
            "gearbook-store-test-{}-{:?}",
            std::process::id(),
            std::thread::current().id()
        ));
        let store = FileTokenStore::new(dir.clone());

        assert_eq!(store.get(TokenSlot::Access), None);

        store.set(TokenSlot::Access, "x.y");
        store.set(TokenSlot::Refresh, "r2");
        assert_eq!(store.get(TokenSlot::Access).as_deref(), Some("x.y"));

        store.set(TokenSlot::Access, "x.z");
        assert_eq!(store.get(TokenSlot::Access).as_deref(), Some("x.z"));
        assert_eq!(store.get(TokenSlot::Refresh).as_deref(), Some("r2"));

        store.remove(TokenSlot::Access);
        store.remove(TokenSlot::Refresh);
        assert_eq!(store.get(TokenSlot::Access), None);
        assert_eq!(store.get(TokenSlot::Refresh), None);

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn file_store_survives_corrupt_contents() {
        let dir = std::env::temp_dir().join(format!(
            "gearbook-store-corrupt-{}-{:?}",
            std::process::id(),
            std::thread::current().id()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("tokens.json"), "{not json").unwrap();

        let store = FileTokenStore::new(dir.clone());
        assert_eq!(store.get(TokenSlot::Access), None);

        store.set(TokenSlot::Access, "a.b");
        assert_eq!(store.get(TokenSlot::Access).as_deref(), Some("a.b"));

        let _ = std::fs::remove_dir_all(dir);
    }
}
