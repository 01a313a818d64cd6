use crate::models::Bookmark;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// In-memory bookmark store, shared by handle across sessions
///
/// Bookmarks are kept per user in save order. Every operation is total and
/// idempotent; the store lives as long as the process.
#[derive(Debug, Default)]
pub struct SavedSet {
    entries: RwLock<HashMap<String, Vec<Bookmark>>>,
}

impl SavedSet {
    pub fn new() -> Self {
        Self::default()
    }

    // No write leaves the map half-updated, so poisoning is ignored.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Vec<Bookmark>>> {
        self.entries.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Vec<Bookmark>>> {
        self.entries.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Save a restaurant. Returns `false` when it was already saved (timestamp kept).
    pub fn save(&self, user_id: &str, restaurant_id: &str) -> bool {
        let mut entries = self.write();
        let bookmarks = entries.entry(user_id.to_string()).or_default();

        if bookmarks.iter().any(|b| b.restaurant_id == restaurant_id) {
            return false;
        }

        bookmarks.push(Bookmark {
            user_id: user_id.to_string(),
            restaurant_id: restaurant_id.to_string(),
            saved_at: chrono::Utc::now(),
        });
        tracing::debug!("Saved {} for {}", restaurant_id, user_id);
        true
    }

    /// Remove a bookmark. Returns `false` when there was nothing to remove.
    pub fn unsave(&self, user_id: &str, restaurant_id: &str) -> bool {
        let mut entries = self.write();
        let Some(bookmarks) = entries.get_mut(user_id) else {
            return false;
        };

        let before = bookmarks.len();
        bookmarks.retain(|b| b.restaurant_id != restaurant_id);
        let removed = bookmarks.len() < before;

        if bookmarks.is_empty() {
            entries.remove(user_id);
        }
        if removed {
            tracing::debug!("Removed {} for {}", restaurant_id, user_id);
        }
        removed
    }

    pub fn is_saved(&self, user_id: &str, restaurant_id: &str) -> bool {
        self.read()
            .get(user_id)
            .is_some_and(|bookmarks| bookmarks.iter().any(|b| b.restaurant_id == restaurant_id))
    }

    /// Bookmarks for a user, oldest first
    pub fn list_saved(&self, user_id: &str) -> Vec<Bookmark> {
        self.read().get(user_id).cloned().unwrap_or_default()
    }
}
