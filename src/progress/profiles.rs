//! Child profiles and their star balance.
//!
//! The engine only needs to read and credit stars, so it depends on the
//! [`ChildProfiles`] trait. [`StoredChildProfiles`] is the local roster kept
//! under the `children` key.

use std::sync::atomic::{AtomicU32, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{MathError, Result};
use crate::storage::{keys, JsonStorage, KeyValueStore};

pub const MAX_CHILDREN: usize = 5;
pub const MAX_NAME_LEN: usize = 20;

static CHILD_COUNTER: AtomicU32 = AtomicU32::new(0);

/// Star balance access, as the engine sees it.
pub trait ChildProfiles {
    /// Current balance; 0 for an unknown child.
    fn stars(&self, child_id: &str) -> u32;

    /// Credit stars. Returns the new balance, or `None` for an unknown child.
    fn add_stars(&self, child_id: &str, amount: u32) -> Option<u32>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildProfile {
    pub id: String,
    pub name: String,
    pub stars: u32,
    pub created_at: DateTime<Utc>,
}

pub struct StoredChildProfiles<S: KeyValueStore> {
    storage: JsonStorage<S>,
}

impl<S: KeyValueStore> StoredChildProfiles<S> {
    pub fn new(store: S) -> Self {
        Self {
            storage: JsonStorage::new(store),
        }
    }

    pub fn list(&self) -> Vec<ChildProfile> {
        self.storage.get(keys::CHILDREN, Vec::new())
    }

    pub fn get(&self, child_id: &str) -> Option<ChildProfile> {
        self.list().into_iter().find(|c| c.id == child_id)
    }

    /// Add a child with a generated id.
    pub fn create(&self, name: &str) -> Result<ChildProfile> {
        let counter = CHILD_COUNTER.fetch_add(1, Ordering::SeqCst);
        let id = format!("child_{}_{:04}", Utc::now().timestamp_millis(), counter % 10_000);
        self.register(&id, name)
    }

    /// Add a child under a caller-chosen id.
    pub fn register(&self, child_id: &str, name: &str) -> Result<ChildProfile> {
        let name = name.trim();
        if name.is_empty() {
            return Err(MathError::invalid_input("child name is empty"));
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(MathError::invalid_input(format!(
                "child name longer than {} characters",
                MAX_NAME_LEN
            )));
        }

        let mut children = self.list();
        if children.iter().any(|c| c.id == child_id) {
            return Err(MathError::invalid_input(format!(
                "child '{}' already exists",
                child_id
            )));
        }
        if children.len() >= MAX_CHILDREN {
            return Err(MathError::invalid_input(format!(
                "at most {} children",
                MAX_CHILDREN
            )));
        }

        let child = ChildProfile {
            id: child_id.to_string(),
            name: name.to_string(),
            stars: 0,
            created_at: Utc::now(),
        };
        children.push(child.clone());
        self.storage.try_set(keys::CHILDREN, &children)?;
        tracing::debug!(child_id, "child profile created");
        Ok(child)
    }

    /// The profile for `child_id`, registering it (named after the id) if new.
    pub fn get_or_register(&self, child_id: &str) -> Result<ChildProfile> {
        match self.get(child_id) {
            Some(child) => Ok(child),
            None => self.register(child_id, child_id),
        }
    }

    pub fn remove(&self, child_id: &str) -> bool {
        let mut children = self.list();
        let before = children.len();
        children.retain(|c| c.id != child_id);
        children.len() != before && self.storage.set(keys::CHILDREN, &children)
    }
}

impl<S: KeyValueStore> ChildProfiles for StoredChildProfiles<S> {
    fn stars(&self, child_id: &str) -> u32 {
        self.get(child_id).map(|c| c.stars).unwrap_or(0)
    }

    fn add_stars(&self, child_id: &str, amount: u32) -> Option<u32> {
        let mut children = self.list();
        let Some(child) = children.iter_mut().find(|c| c.id == child_id) else {
            tracing::warn!(child_id, "stars credited to unknown child");
            return None;
        };
        child.stars = child.stars.saturating_add(amount);
        let balance = child.stars;
        self.storage.set(keys::CHILDREN, &children);
        Some(balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn profiles() -> StoredChildProfiles<MemoryStore> {
        StoredChildProfiles::new(MemoryStore::new())
    }

    #[test]
    fn test_create_generates_ids() {
        let profiles = profiles();
        let a = profiles.create("Léa").unwrap();
        let b = profiles.create("Tom").unwrap();
        assert!(a.id.starts_with("child_"));
        assert_ne!(a.id, b.id);
        assert_eq!(profiles.list().len(), 2);
    }

    #[test]
    fn test_name_validation() {
        let profiles = profiles();
        assert!(profiles.register("a", "   ").is_err());
        assert!(profiles.register("b", "Maximilienne-Éléonore").is_err());
        // Accented letters count as one character each
        assert!(profiles.register("c", "Éléonore Marguerite").is_ok());
    }

    #[test]
    fn test_roster_limit() {
        let profiles = profiles();
        for i in 0..MAX_CHILDREN {
            profiles.register(&format!("c{}", i), "Enfant").unwrap();
        }
        let err = profiles.register("extra", "Enfant").unwrap_err();
        assert!(matches!(err, MathError::InvalidInput { .. }));
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let profiles = profiles();
        profiles.register("lea", "Léa").unwrap();
        assert!(profiles.register("lea", "Léa").is_err());
    }

    #[test]
    fn test_stars() {
        let profiles = profiles();
        profiles.register("lea", "Léa").unwrap();
        assert_eq!(profiles.stars("lea"), 0);
        assert_eq!(profiles.add_stars("lea", 3), Some(3));
        assert_eq!(profiles.add_stars("lea", 4), Some(7));
        assert_eq!(profiles.stars("lea"), 7);

        assert_eq!(profiles.stars("ghost"), 0);
        assert_eq!(profiles.add_stars("ghost", 1), None);
    }

    #[test]
    fn test_get_or_register() {
        let profiles = profiles();
        let first = profiles.get_or_register("lea").unwrap();
        profiles.add_stars("lea", 2);
        let again = profiles.get_or_register("lea").unwrap();
        assert_eq!(first.id, again.id);
        assert_eq!(again.stars, 2);
    }

    #[test]
    fn test_remove() {
        let profiles = profiles();
        profiles.register("lea", "Léa").unwrap();
        assert!(profiles.remove("lea"));
        assert!(!profiles.remove("lea"));
        assert!(profiles.get("lea").is_none());
    }
}
