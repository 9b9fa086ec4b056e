//! Remote resource client trait and an in-memory implementation
//!
//! The reconciler talks to the remote API only through [`RemoteClient`].
//! Implementations perform exactly one round trip per call and never retry.
//!
//! # Testing
//!
//! Use [`MockClient`] for testing without network access:
//!
//! ```
//! use reconcile::{attrs, Attribute, MockClient, Operation, RemoteClient, ResourceKind};
//!
//! static KEY: ResourceKind = ResourceKind {
//!     name: "ssh_key",
//!     id_attribute: "id",
//!     attributes: &[Attribute::computed("id"), Attribute::required("public_key")],
//! };
//!
//! let mock = MockClient::new();
//! let created = mock.create(&KEY, &attrs! { "public_key" => "ssh-ed25519 AAAA" }).unwrap();
//! assert_eq!(created.identifier("id").as_deref(), Some("1"));
//! assert_eq!(mock.count(Operation::Create), 1);
//! ```

use crate::attributes::AttributeSet;
use crate::error::{Error, Result};
use crate::schema::ResourceKind;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Client for CRUD calls against a remote management API.
///
/// Implementations hold no per-call mutable state so one client can be
/// shared by reconciliations of different resources running concurrently.
pub trait RemoteClient: Send + Sync {
    /// Create a new remote entity.
    ///
    /// `attributes` never contains computed attributes. Returns the full
    /// remote representation, which should include the new identifier.
    fn create(&self, kind: &ResourceKind, attributes: &AttributeSet) -> Result<AttributeSet>;

    /// Fetch the current representation.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if the entity does not exist.
    fn read(&self, kind: &ResourceKind, remote_id: &str) -> Result<AttributeSet>;

    /// Apply a change-set and return the refreshed representation.
    fn update(
        &self,
        kind: &ResourceKind,
        remote_id: &str,
        changes: &AttributeSet,
    ) -> Result<AttributeSet>;

    /// Delete the entity.
    ///
    /// May return `Error::NotFound` for an entity that is already gone.
    fn delete(&self, kind: &ResourceKind, remote_id: &str) -> Result<()>;
}

/// CRUD operation kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// A call recorded by [`MockClient`]
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Create {
        kind: String,
        attributes: AttributeSet,
    },
    Read {
        kind: String,
        remote_id: String,
    },
    Update {
        kind: String,
        remote_id: String,
        changes: AttributeSet,
    },
    Delete {
        kind: String,
        remote_id: String,
    },
}

impl Call {
    pub fn operation(&self) -> Operation {
        match self {
            Self::Create { .. } => Operation::Create,
            Self::Read { .. } => Operation::Read,
            Self::Update { .. } => Operation::Update,
            Self::Delete { .. } => Operation::Delete,
        }
    }
}

/// In-memory remote API for testing without network access.
///
/// Entities are stored per kind and identifier; identifiers are assigned
/// sequentially. Every call is recorded, and failures can be queued per
/// operation. Clones share the same store.
#[derive(Debug, Clone, Default)]
pub struct MockClient {
    inner: Arc<Mutex<MockState>>,
}

#[derive(Debug, Default)]
struct MockState {
    entities: HashMap<(String, String), AttributeSet>,
    next_id: u64,
    calls: Vec<Call>,
    failures: HashMap<Operation, VecDeque<Error>>,
    omit_identifier: bool,
}

impl MockClient {
    /// Create an empty mock whose first assigned identifier is "1".
    #[must_use]
    pub fn new() -> Self {
        Self::with_next_id(1)
    }

    /// Create an empty mock that assigns identifiers starting at `id`.
    #[must_use]
    pub fn with_next_id(id: u64) -> Self {
        let mock = Self::default();
        mock.state().next_id = id;
        mock
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seed an existing remote entity.
    pub fn insert(&self, kind: &ResourceKind, remote_id: &str, attributes: AttributeSet) {
        let mut attributes = attributes;
        attributes.insert(kind.id_attribute, remote_id);
        self.state()
            .entities
            .insert((kind.name.to_string(), remote_id.to_string()), attributes);
    }

    /// Remove an entity out of band, as if deleted by someone else.
    pub fn remove(&self, kind: &ResourceKind, remote_id: &str) -> Option<AttributeSet> {
        self.state()
            .entities
            .remove(&(kind.name.to_string(), remote_id.to_string()))
    }

    /// Current stored representation of an entity.
    pub fn get(&self, kind: &ResourceKind, remote_id: &str) -> Option<AttributeSet> {
        self.state()
            .entities
            .get(&(kind.name.to_string(), remote_id.to_string()))
            .cloned()
    }

    /// Make the next call of `operation` fail with `error`.
    pub fn fail_next(&self, operation: Operation, error: Error) {
        self.state()
            .failures
            .entry(operation)
            .or_default()
            .push_back(error);
    }

    /// Leave the identifier out of create responses.
    pub fn omit_identifier(&self, omit: bool) {
        self.state().omit_identifier = omit;
    }

    /// All calls made so far, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    /// Number of calls of one operation made so far.
    pub fn count(&self, operation: Operation) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|c| c.operation() == operation)
            .count()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    /// Record a call and pop a queued failure for it, if any.
    fn begin(state: &mut MockState, call: Call) -> Result<()> {
        let operation = call.operation();
        state.calls.push(call);
        match state.failures.get_mut(&operation).and_then(VecDeque::pop_front) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl RemoteClient for MockClient {
    fn create(&self, kind: &ResourceKind, attributes: &AttributeSet) -> Result<AttributeSet> {
        let mut state = self.state();
        Self::begin(
            &mut state,
            Call::Create {
                kind: kind.name.to_string(),
                attributes: attributes.clone(),
            },
        )?;

        let remote_id = state.next_id.to_string();
        state.next_id += 1;

        let mut stored = attributes.clone();
        stored.insert(kind.id_attribute, remote_id.as_str());
        state
            .entities
            .insert((kind.name.to_string(), remote_id), stored.clone());

        if state.omit_identifier {
            stored.remove(kind.id_attribute);
        }
        Ok(stored)
    }

    fn read(&self, kind: &ResourceKind, remote_id: &str) -> Result<AttributeSet> {
        let mut state = self.state();
        Self::begin(
            &mut state,
            Call::Read {
                kind: kind.name.to_string(),
                remote_id: remote_id.to_string(),
            },
        )?;

        state
            .entities
            .get(&(kind.name.to_string(), remote_id.to_string()))
            .cloned()
            .ok_or_else(|| Error::not_found(kind.name, remote_id))
    }

    fn update(
        &self,
        kind: &ResourceKind,
        remote_id: &str,
        changes: &AttributeSet,
    ) -> Result<AttributeSet> {
        let mut state = self.state();
        Self::begin(
            &mut state,
            Call::Update {
                kind: kind.name.to_string(),
                remote_id: remote_id.to_string(),
                changes: changes.clone(),
            },
        )?;

        let entity = state
            .entities
            .get_mut(&(kind.name.to_string(), remote_id.to_string()))
            .ok_or_else(|| Error::not_found(kind.name, remote_id))?;
        for (name, value) in changes.iter() {
            entity.insert(name, value.clone());
        }
        Ok(entity.clone())
    }

    fn delete(&self, kind: &ResourceKind, remote_id: &str) -> Result<()> {
        let mut state = self.state();
        Self::begin(
            &mut state,
            Call::Delete {
                kind: kind.name.to_string(),
                remote_id: remote_id.to_string(),
            },
        )?;

        state
            .entities
            .remove(&(kind.name.to_string(), remote_id.to_string()))
            .map(|_| ())
            .ok_or_else(|| Error::not_found(kind.name, remote_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attrs;
    use crate::schema::Attribute;

    static SITE: ResourceKind = ResourceKind {
        name: "site",
        id_attribute: "id",
        attributes: &[Attribute::computed("id"), Attribute::required("name").mutable()],
    };

    #[test]
    fn test_mock_create_assigns_sequential_ids() {
        let mock = MockClient::with_next_id(42);
        let a = mock.create(&SITE, &attrs! { "name" => "a" }).unwrap();
        let b = mock.create(&SITE, &attrs! { "name" => "b" }).unwrap();
        assert_eq!(a.identifier("id").as_deref(), Some("42"));
        assert_eq!(b.identifier("id").as_deref(), Some("43"));
        assert!(mock.get(&SITE, "42").is_some());
    }

    #[test]
    fn test_mock_read_not_found() {
        let mock = MockClient::new();
        let err = mock.read(&SITE, "nope").unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(mock.count(Operation::Read), 1);
    }

    #[test]
    fn test_mock_update_merges() {
        let mock = MockClient::new();
        mock.insert(&SITE, "7", attrs! { "name" => "old", "status" => "active" });

        let updated = mock.update(&SITE, "7", &attrs! { "name" => "new" }).unwrap();
        assert_eq!(updated.get("name"), Some(&serde_json::json!("new")));
        assert_eq!(updated.get("status"), Some(&serde_json::json!("active")));
    }

    #[test]
    fn test_mock_delete_twice() {
        let mock = MockClient::new();
        mock.insert(&SITE, "7", attrs! { "name" => "x" });

        assert!(mock.delete(&SITE, "7").is_ok());
        assert!(mock.delete(&SITE, "7").unwrap_err().is_not_found());
    }

    #[test]
    fn test_mock_queued_failure_is_consumed() {
        let mock = MockClient::new();
        mock.fail_next(Operation::Create, Error::transport("site", "timed out"));

        assert!(mock.create(&SITE, &attrs! { "name" => "a" }).is_err());
        assert!(mock.create(&SITE, &attrs! { "name" => "a" }).is_ok());
        assert_eq!(mock.count(Operation::Create), 2);
    }

    #[test]
    fn test_mock_omit_identifier() {
        let mock = MockClient::new();
        mock.omit_identifier(true);
        let created = mock.create(&SITE, &attrs! { "name" => "a" }).unwrap();
        assert!(!created.contains("id"));
    }

    #[test]
    fn test_mock_calls_recorded_in_order() {
        let mock = MockClient::new();
        let _ = mock.read(&SITE, "1");
        let _ = mock.delete(&SITE, "1");
        let ops: Vec<_> = mock.calls().iter().map(Call::operation).collect();
        assert_eq!(ops, vec![Operation::Read, Operation::Delete]);

        mock.clear_calls();
        assert!(mock.calls().is_empty());
    }
}
