//! List kind enumeration for owner-scoped recipe lists.

use serde::{Deserialize, Serialize};

/// Which of the two tracked lists an operation concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListKind {
    /// Recipes the user has saved for later.
    Saved,
    /// Recipes the user is actively cooking.
    Cooking,
}

impl ListKind {
    /// Returns the storage key for this list kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ListKind::Saved => "saved",
            ListKind::Cooking => "cooking",
        }
    }
}
