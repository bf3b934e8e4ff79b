//! Per-owner document held by the remote store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ListKind;

/// The authoritative per-owner document: both recipe lists plus version
/// bookkeeping.
///
/// `version` increases by one on every accepted write and is never reset
/// except by recreating the document. Field names match the remote wire
/// format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteDocument {
    pub user_id: String,
    #[serde(default)]
    pub recipe_ids: Vec<String>,
    #[serde(default)]
    pub cooking_recipe_ids: Vec<String>,
    #[serde(default)]
    pub version: i64,
    pub updated_at: DateTime<Utc>,
    pub last_synced_at: DateTime<Utc>,
}

impl RemoteDocument {
    /// Creates an empty version-0 document for an owner.
    ///
    /// Version 0 is the state a reader observes for an owner that has no
    /// document yet; the first accepted write stores it with version 1.
    pub fn empty(owner_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            user_id: owner_id.into(),
            recipe_ids: Vec::new(),
            cooking_recipe_ids: Vec::new(),
            version: 0,
            updated_at: now,
            last_synced_at: now,
        }
    }

    /// Returns the id list for a kind.
    pub fn list(&self, kind: ListKind) -> &[String] {
        match kind {
            ListKind::Saved => &self.recipe_ids,
            ListKind::Cooking => &self.cooking_recipe_ids,
        }
    }

    /// Replaces the id list for a kind. The other kind's field is left
    /// untouched.
    pub fn set_list(&mut self, kind: ListKind, ids: Vec<String>) {
        match kind {
            ListKind::Saved => self.recipe_ids = ids,
            ListKind::Cooking => self.cooking_recipe_ids = ids,
        }
    }
}
