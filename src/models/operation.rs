//! Pending mutations waiting for a queue drain.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SyncError;

use super::ListKind;

/// Mutation types that can wait in the pending queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    UpsertSavedList,
    UpsertCookingList,
    RemoveFromCooking,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::UpsertSavedList => "upsert_saved_list",
            OperationKind::UpsertCookingList => "upsert_cooking_list",
            OperationKind::RemoveFromCooking => "remove_from_cooking",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, SyncError> {
        match s {
            "upsert_saved_list" => Ok(OperationKind::UpsertSavedList),
            "upsert_cooking_list" => Ok(OperationKind::UpsertCookingList),
            "remove_from_cooking" => Ok(OperationKind::RemoveFromCooking),
            _ => Err(SyncError::QueueCorruption(format!(
                "unknown operation kind: {}",
                s
            ))),
        }
    }

    /// The list kind this operation mutates.
    pub fn list_kind(&self) -> ListKind {
        match self {
            OperationKind::UpsertSavedList => ListKind::Saved,
            OperationKind::UpsertCookingList | OperationKind::RemoveFromCooking => {
                ListKind::Cooking
            }
        }
    }
}

/// A mutation that could not be applied remotely and waits in the durable
/// queue until a drain replays it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueItem {
    pub id: Uuid,
    pub kind: OperationKind,
    pub owner_id: String,
    pub payload: serde_json::Value,
    pub enqueued_at: DateTime<Utc>,
}

impl QueueItem {
    /// A whole-list upsert for `(owner, kind)`.
    pub fn upsert(owner_id: impl Into<String>, kind: ListKind, ids: Vec<String>) -> Self {
        let op = match kind {
            ListKind::Saved => OperationKind::UpsertSavedList,
            ListKind::Cooking => OperationKind::UpsertCookingList,
        };
        Self {
            id: Uuid::new_v4(),
            kind: op,
            owner_id: owner_id.into(),
            payload: serde_json::json!(ids),
            enqueued_at: Utc::now(),
        }
    }

    /// A targeted removal of one id from the owner's cooking list.
    pub fn remove_cooking(owner_id: impl Into<String>, recipe_id: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: OperationKind::RemoveFromCooking,
            owner_id: owner_id.into(),
            payload: serde_json::json!({ "recipeId": recipe_id }),
            enqueued_at: Utc::now(),
        }
    }

    /// Decodes the id-list payload of an upsert operation.
    pub fn id_list(&self) -> Result<Vec<String>, SyncError> {
        serde_json::from_value(self.payload.clone()).map_err(|e| {
            SyncError::QueueCorruption(format!("bad id list payload for {}: {}", self.id, e))
        })
    }

    /// Decodes the single-id payload of a removal operation.
    pub fn recipe_id(&self) -> Result<String, SyncError> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct RemovePayload {
            recipe_id: String,
        }

        serde_json::from_value::<RemovePayload>(self.payload.clone())
            .map(|p| p.recipe_id)
            .map_err(|e| {
                SyncError::QueueCorruption(format!("bad removal payload for {}: {}", self.id, e))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_kind_roundtrip() {
        for kind in [
            OperationKind::UpsertSavedList,
            OperationKind::UpsertCookingList,
            OperationKind::RemoveFromCooking,
        ] {
            assert_eq!(OperationKind::from_str(kind.as_str()).unwrap(), kind);
        }
    }

    #[test]
    fn test_operation_kind_unknown() {
        let err = OperationKind::from_str("truncate_everything").unwrap_err();
        assert!(matches!(err, SyncError::QueueCorruption(_)));
    }

    #[test]
    fn test_operation_list_kind() {
        assert_eq!(
            OperationKind::UpsertSavedList.list_kind(),
            ListKind::Saved
        );
        assert_eq!(
            OperationKind::UpsertCookingList.list_kind(),
            ListKind::Cooking
        );
        assert_eq!(
            OperationKind::RemoveFromCooking.list_kind(),
            ListKind::Cooking
        );
    }

    #[test]
    fn test_upsert_item_payload() {
        let item = QueueItem::upsert("user-1", ListKind::Saved, vec!["a".to_string()]);
        assert_eq!(item.kind, OperationKind::UpsertSavedList);
        assert_eq!(item.owner_id, "user-1");
        assert_eq!(item.id_list().unwrap(), ["a"]);
    }

    #[test]
    fn test_remove_item_payload() {
        let item = QueueItem::remove_cooking("user-1", "54_01");
        assert_eq!(item.kind, OperationKind::RemoveFromCooking);
        assert_eq!(item.recipe_id().unwrap(), "54_01");
    }

    #[test]
    fn test_mismatched_payload_is_corruption() {
        let item = QueueItem::remove_cooking("user-1", "54_01");
        // An upsert accessor on a removal payload must not panic.
        let err = item.id_list().unwrap_err();
        assert!(matches!(err, SyncError::QueueCorruption(_)));
    }
}
