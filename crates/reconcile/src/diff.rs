//! Diff computation between desired and observed state

use crate::attributes::{AttributeSet, values_equal};
use crate::error::{Error, Result};
use crate::schema::ResourceKind;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Attributes that must be sent in an update to converge a resource.
///
/// Only ever holds mutable, non-computed attributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeSet {
    changes: AttributeSet,
}

impl ChangeSet {
    /// Check if no remote call is needed
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Names of the changed attributes
    pub fn names(&self) -> Vec<String> {
        self.changes.names().map(str::to_string).collect()
    }

    /// The attributes to send
    pub fn attributes(&self) -> &AttributeSet {
        &self.changes
    }

    pub fn into_attributes(self) -> AttributeSet {
        self.changes
    }
}

/// Compute the minimal change-set turning `observed` into `desired`.
///
/// Attributes the caller leaves unset are not managed. A differing mutable
/// attribute lands in the change-set; a differing non-mutable attribute makes
/// the whole diff fail with [`Error::RequiresReplacement`]. Non-mutable
/// attributes the remote does not report cannot be compared and are skipped.
/// Attributes the kind does not declare are ignored on both sides.
pub fn diff(
    kind: &ResourceKind,
    desired: &AttributeSet,
    observed: &AttributeSet,
) -> Result<ChangeSet> {
    let mut changes = AttributeSet::new();
    let mut replace = Vec::new();

    for attr in kind.attributes.iter().filter(|a| !a.computed) {
        let want = match desired.get(attr.name) {
            None | Some(Value::Null) => continue,
            Some(value) => value,
        };
        let have = observed.get(attr.name);

        if attr.mutable {
            if !have.is_some_and(|v| values_equal(v, want)) {
                changes.insert(attr.name, want.clone());
            }
        } else if let Some(v) = have
            && !values_equal(v, want)
        {
            replace.push(attr.name.to_string());
        }
    }

    if !replace.is_empty() {
        log::debug!(
            "{}: immutable attributes differ: {}",
            kind.name,
            replace.join(", ")
        );
        return Err(Error::RequiresReplacement {
            kind: kind.name.to_string(),
            remote_id: None,
            attributes: replace,
        });
    }

    Ok(ChangeSet { changes })
}
