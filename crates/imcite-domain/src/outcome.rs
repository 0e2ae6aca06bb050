//! Per-item results of a batch run

use serde::{Deserialize, Serialize};

use crate::manifest::ManifestEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Enum))]
pub enum ItemStatus {
    /// A new graph item was created
    Created,
    /// The work could not be described well enough to create an item
    Skipped,
    /// The entry was invalid or the graph write failed
    Failed,
    /// The run was cancelled before this entry was reached
    NotAttempted,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Created => "created",
            ItemStatus::Skipped => "skipped",
            ItemStatus::Failed => "failed",
            ItemStatus::NotAttempted => "not_attempted",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ItemCreationOutcome<X = serde_json::Value> {
    /// The manifest entry exactly as supplied
    pub entry: ManifestEntry<X>,
    pub status: ItemStatus,
    /// Identifier of the created graph item
    pub entity_id: Option<String>,
    /// Why the item was not created
    pub reason: Option<String>,
}

impl<X> ItemCreationOutcome<X> {
    pub fn created(entry: ManifestEntry<X>, entity_id: impl Into<String>) -> Self {
        Self {
            entry,
            status: ItemStatus::Created,
            entity_id: Some(entity_id.into()),
            reason: None,
        }
    }

    pub fn skipped(entry: ManifestEntry<X>, reason: impl Into<String>) -> Self {
        Self {
            entry,
            status: ItemStatus::Skipped,
            entity_id: None,
            reason: Some(reason.into()),
        }
    }

    pub fn failed(entry: ManifestEntry<X>, reason: impl Into<String>) -> Self {
        Self {
            entry,
            status: ItemStatus::Failed,
            entity_id: None,
            reason: Some(reason.into()),
        }
    }

    pub fn not_attempted(entry: ManifestEntry<X>) -> Self {
        Self {
            entry,
            status: ItemStatus::NotAttempted,
            entity_id: None,
            reason: Some("not attempted: run cancelled".to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub created: usize,
    pub skipped: usize,
    pub failed: usize,
    pub not_attempted: usize,
}

/// Ordered outcomes of one batch run, one per manifest entry
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BatchReport<X = serde_json::Value> {
    pub outcomes: Vec<ItemCreationOutcome<X>>,
}

impl<X> BatchReport<X> {
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn counts(&self) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for outcome in &self.outcomes {
            match outcome.status {
                ItemStatus::Created => counts.created += 1,
                ItemStatus::Skipped => counts.skipped += 1,
                ItemStatus::Failed => counts.failed += 1,
                ItemStatus::NotAttempted => counts.not_attempted += 1,
            }
        }
        counts
    }

    pub fn entity_ids(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter_map(|o| o.entity_id.as_deref())
            .collect()
    }
}
