use std::collections::HashMap;
use std::sync::Mutex;

/// Session-scoped key/value storage for auto-deploy markers.
///
/// Outlives a single dashboard mount but not the process. Best effort only:
/// the backend's "cannot be started" response is authoritative.
pub trait SessionStore: Send + Sync + 'static {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn delete(&self, key: &str);
}

#[derive(Debug, Default)]
pub struct MemorySessionStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // a poisoned map still holds valid markers
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries().insert(key.to_string(), value.to_string());
    }

    fn delete(&self, key: &str) {
        self.entries().remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_delete() {
        let store = MemorySessionStore::new();
        assert_eq!(store.get("autoDeploy.d1"), None);

        store.set("autoDeploy.d1", "1");
        assert_eq!(store.get("autoDeploy.d1").as_deref(), Some("1"));

        store.delete("autoDeploy.d1");
        assert_eq!(store.get("autoDeploy.d1"), None);

        // deleting a missing key is a no-op
        store.delete("autoDeploy.d1");
    }
}
