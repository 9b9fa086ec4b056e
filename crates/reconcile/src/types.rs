//! Core types for reconciliation results

use crate::diff::ChangeSet;
use serde::{Deserialize, Serialize};

/// Result of a reconciler operation that did not fail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// No remote change was needed
    NoChange,
    /// Remote entity was created
    Created { remote_id: String },
    /// Mutable attributes were updated in place
    Updated { changed: Vec<String> },
    /// Remote entity was deleted and re-created
    Replaced {
        previous_id: String,
        remote_id: String,
    },
    /// Remote entity was deleted
    Deleted,
    /// Observed snapshot was refreshed
    Refreshed,
    /// Remote entity disappeared; identity was cleared
    Vanished { remote_id: String },
}

impl Outcome {
    /// Check if the outcome represents a remote change
    pub fn is_change(&self) -> bool {
        matches!(
            self,
            Self::Created { .. } | Self::Updated { .. } | Self::Replaced { .. } | Self::Deleted
        )
    }
}

/// What the next reconcile would do, computed without remote calls
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Already converged
    NoOp,
    /// No remote identity tracked
    Create,
    /// Mutable attributes differ
    Update(ChangeSet),
    /// Immutable attributes differ; needs explicit replacement
    Replace { attributes: Vec<String> },
    /// Identity tracked but no snapshot; a read comes first
    Refresh,
    /// Tracked but no longer configured
    Delete,
}

impl Action {
    /// Check if the action changes the remote
    pub fn is_change(&self) -> bool {
        !matches!(self, Self::NoOp | Self::Refresh)
    }

    /// Short symbol for display
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::NoOp => "=",
            Self::Create => "+",
            Self::Update(_) => "~",
            Self::Replace { .. } => "-/+",
            Self::Refresh => "?",
            Self::Delete => "-",
        }
    }
}

/// Summary of a pass over many resources
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Summary {
    pub created: usize,
    pub updated: usize,
    pub replaced: usize,
    pub deleted: usize,
    pub vanished: usize,
    pub no_change: usize,
    pub failed: usize,
}

impl Summary {
    /// Total number of actual changes made
    pub fn total_changes(&self) -> usize {
        self.created + self.updated + self.replaced + self.deleted
    }

    /// Check if the pass was fully successful (no failures)
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Total number of resources processed
    pub fn total(&self) -> usize {
        self.total_changes() + self.vanished + self.no_change + self.failed
    }

    /// Merge another summary into this one
    pub fn merge(&mut self, other: &Summary) {
        self.created += other.created;
        self.updated += other.updated;
        self.replaced += other.replaced;
        self.deleted += other.deleted;
        self.vanished += other.vanished;
        self.no_change += other.no_change;
        self.failed += other.failed;
    }

    /// Add an operation result to the summary
    pub fn add_result<E>(&mut self, result: &Result<Outcome, E>) {
        match result {
            Ok(Outcome::NoChange | Outcome::Refreshed) => self.no_change += 1,
            Ok(Outcome::Created { .. }) => self.created += 1,
            Ok(Outcome::Updated { .. }) => self.updated += 1,
            Ok(Outcome::Replaced { .. }) => self.replaced += 1,
            Ok(Outcome::Deleted) => self.deleted += 1,
            Ok(Outcome::Vanished { .. }) => self.vanished += 1,
            Err(_) => self.failed += 1,
        }
    }
}
