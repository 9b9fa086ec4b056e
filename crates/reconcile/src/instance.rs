//! The unit of reconciliation

use crate::attributes::AttributeSet;
use crate::schema::ResourceKind;

/// Lifecycle phase of a resource instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No remote counterpart is tracked
    Absent,
    /// A remote identifier is tracked
    Present,
}

/// One resource as seen by the reconciler: its kind, the tracked remote
/// identifier, the desired attributes and the last observed snapshot.
///
/// The identifier is assigned only by a successful create and only cleared
/// when the remote entity is known to be gone; callers restore it from
/// persisted state with [`ResourceInstance::existing`].
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceInstance {
    kind: &'static ResourceKind,
    remote_id: Option<String>,
    desired: AttributeSet,
    observed: Option<AttributeSet>,
}

impl ResourceInstance {
    /// A resource with no remote counterpart yet.
    pub fn new(kind: &'static ResourceKind, desired: AttributeSet) -> Self {
        Self {
            kind,
            remote_id: None,
            desired,
            observed: None,
        }
    }

    /// A resource restored from persisted state.
    ///
    /// Pass `observed: None` to force a read before the next diff.
    pub fn existing(
        kind: &'static ResourceKind,
        remote_id: impl Into<String>,
        desired: AttributeSet,
        observed: Option<AttributeSet>,
    ) -> Self {
        Self {
            kind,
            remote_id: Some(remote_id.into()),
            desired,
            observed,
        }
    }

    pub fn kind(&self) -> &'static ResourceKind {
        self.kind
    }

    pub fn remote_id(&self) -> Option<&str> {
        self.remote_id.as_deref()
    }

    pub fn desired(&self) -> &AttributeSet {
        &self.desired
    }

    pub fn observed(&self) -> Option<&AttributeSet> {
        self.observed.as_ref()
    }

    pub fn phase(&self) -> Phase {
        if self.remote_id.is_some() {
            Phase::Present
        } else {
            Phase::Absent
        }
    }

    /// Replace the desired attributes, keeping identity and snapshot.
    pub fn set_desired(&mut self, desired: AttributeSet) {
        self.desired = desired;
    }

    /// Split into `(remote_id, observed)` for persistence.
    pub fn into_state(self) -> (Option<String>, Option<AttributeSet>) {
        (self.remote_id, self.observed)
    }

    pub(crate) fn record_created(&mut self, remote_id: String, observed: AttributeSet) {
        debug_assert!(self.remote_id.is_none(), "identifier already assigned");
        self.remote_id = Some(remote_id);
        self.observed = Some(observed);
    }

    pub(crate) fn record_observed(&mut self, observed: AttributeSet) {
        self.observed = Some(observed);
    }

    /// Drop identity and snapshot; the remote entity is gone.
    pub(crate) fn forget(&mut self) {
        self.remote_id = None;
        self.observed = None;
    }
}
