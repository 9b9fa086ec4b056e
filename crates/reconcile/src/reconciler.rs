//! Reconciler - drives a remote client through the CRUD sequence that
//! converges one resource instance
//!
//! Every operation takes the instance by `&mut` and leaves it in its
//! post-call state even when an error is returned, so the caller can always
//! persist what it gets back. No operation retries.

use crate::attributes::AttributeSet;
use crate::client::RemoteClient;
use crate::diff::{ChangeSet, diff};
use crate::error::{Error, Result};
use crate::instance::{Phase, ResourceInstance};
use crate::types::{Action, Outcome};

/// Decide what [`Reconciler::reconcile`] would do, without remote calls.
pub fn plan(instance: &ResourceInstance) -> Result<Action> {
    let kind = instance.kind();
    kind.validate(instance.desired())?;

    let (remote_id, observed) = match (instance.remote_id(), instance.observed()) {
        (None, _) => return Ok(Action::Create),
        (Some(_), None) => return Ok(Action::Refresh),
        (Some(id), Some(observed)) => (id, observed),
    };

    match diff(kind, instance.desired(), observed) {
        Ok(changes) if changes.is_empty() => Ok(Action::NoOp),
        Ok(changes) => Ok(Action::Update(changes)),
        Err(Error::RequiresReplacement { attributes, .. }) => Ok(Action::Replace { attributes }),
        Err(e) => Err(e.with_remote_id(remote_id)),
    }
}

/// Generic reconciler over a shared remote client.
///
/// Holds no state between calls; cheap to construct per pass.
#[derive(Clone, Copy)]
pub struct Reconciler<'c> {
    client: &'c dyn RemoteClient,
}

impl<'c> Reconciler<'c> {
    pub fn new(client: &'c dyn RemoteClient) -> Self {
        Self { client }
    }

    /// Decide what [`Reconciler::reconcile`] would do; see [`plan`].
    pub fn plan(&self, instance: &ResourceInstance) -> Result<Action> {
        plan(instance)
    }

    /// Converge the remote entity towards the desired attributes.
    ///
    /// Absent instances are created. Present instances without a snapshot
    /// are read first; if the read finds nothing the instance is re-created
    /// in the same call. Otherwise the diff decides between a no-op and an
    /// update. A differing immutable attribute fails with
    /// [`Error::RequiresReplacement`] and leaves the instance untouched.
    pub fn reconcile(&self, instance: &mut ResourceInstance) -> Result<Outcome> {
        let kind = instance.kind();
        kind.validate(instance.desired())?;

        if instance.phase() == Phase::Present
            && instance.observed().is_none()
            && let Outcome::Vanished { remote_id } = self.refresh(instance)?
        {
            log::info!("{kind} {remote_id} no longer exists, re-creating");
        }

        let (remote_id, changes) = match (instance.remote_id(), instance.observed()) {
            (Some(id), Some(observed)) => {
                let changes =
                    diff(kind, instance.desired(), observed).map_err(|e| e.with_remote_id(id))?;
                (id.to_string(), changes)
            }
            _ => return self.create(instance),
        };

        if changes.is_empty() {
            log::debug!("{kind} {remote_id} is up to date");
            return Ok(Outcome::NoChange);
        }

        self.update(instance, &remote_id, &changes)
    }

    /// Re-read the remote entity into the observed snapshot.
    ///
    /// A missing entity is drift, not failure: the identity is cleared and
    /// [`Outcome::Vanished`] returned, so the next reconcile creates it.
    pub fn refresh(&self, instance: &mut ResourceInstance) -> Result<Outcome> {
        let kind = instance.kind();
        let Some(remote_id) = instance.remote_id().map(str::to_string) else {
            return Ok(Outcome::NoChange);
        };

        match self.client.read(kind, &remote_id) {
            Ok(observed) => {
                log::debug!("{kind} {remote_id} refreshed");
                instance.record_observed(observed);
                Ok(Outcome::Refreshed)
            }
            Err(e) if e.is_not_found() => {
                log::warn!("{kind} {remote_id} was deleted outside of reconciliation");
                instance.forget();
                Ok(Outcome::Vanished { remote_id })
            }
            Err(e) => Err(e.with_remote_id(&remote_id)),
        }
    }

    /// Delete the remote entity.
    ///
    /// Deleting something that is already gone succeeds.
    pub fn destroy(&self, instance: &mut ResourceInstance) -> Result<Outcome> {
        let kind = instance.kind();
        let Some(remote_id) = instance.remote_id().map(str::to_string) else {
            return Ok(Outcome::NoChange);
        };

        if instance.observed().is_none()
            && let vanished @ Outcome::Vanished { .. } = self.refresh(instance)?
        {
            return Ok(vanished);
        }

        self.delete_remote(instance, &remote_id)?;
        instance.forget();
        log::info!("{kind} {remote_id} deleted");
        Ok(Outcome::Deleted)
    }

    /// Delete and re-create the remote entity.
    ///
    /// Only invoked when the caller chooses to resolve
    /// [`Error::RequiresReplacement`]. If the delete fails the instance is
    /// unchanged; if the create fails after a successful delete the instance
    /// is left absent.
    pub fn replace(&self, instance: &mut ResourceInstance) -> Result<Outcome> {
        let kind = instance.kind();
        kind.validate(instance.desired())?;

        if instance.phase() == Phase::Present && instance.observed().is_none() {
            self.refresh(instance)?;
        }
        let Some(previous_id) = instance.remote_id().map(str::to_string) else {
            return self.create(instance);
        };

        self.delete_remote(instance, &previous_id)?;
        instance.forget();
        log::info!("{kind} {previous_id} deleted for replacement");

        match self.create(instance) {
            Ok(Outcome::Created { remote_id }) => Ok(Outcome::Replaced {
                previous_id,
                remote_id,
            }),
            Ok(other) => Ok(other),
            Err(e) => {
                log::error!("{kind} {previous_id} was deleted but could not be re-created: {e}");
                Err(e)
            }
        }
    }

    fn create(&self, instance: &mut ResourceInstance) -> Result<Outcome> {
        let kind = instance.kind();
        let payload = kind.payload(instance.desired());

        log::info!("creating {kind}");
        let response = self.client.create(kind, &payload)?;

        // Clients that see the raw body report this themselves; this is the
        // decoded response re-serialized.
        let Some(remote_id) = response.identifier(kind.id_attribute) else {
            return Err(Error::protocol(
                kind.name,
                format!("create response has no '{}'", kind.id_attribute),
                AttributeSet::into_value(response).to_string(),
            ));
        };

        log::info!("{kind} {remote_id} created");
        instance.record_created(remote_id.clone(), response);
        Ok(Outcome::Created { remote_id })
    }

    fn update(
        &self,
        instance: &mut ResourceInstance,
        remote_id: &str,
        changes: &ChangeSet,
    ) -> Result<Outcome> {
        let kind = instance.kind();
        let changed = changes.names();

        log::info!("updating {kind} {remote_id}: {}", changed.join(", "));
        match self.client.update(kind, remote_id, changes.attributes()) {
            Ok(observed) => {
                instance.record_observed(observed);
                Ok(Outcome::Updated { changed })
            }
            Err(e) if e.is_not_found() => {
                log::warn!("{kind} {remote_id} vanished before it could be updated");
                instance.forget();
                Err(e)
            }
            Err(e) => Err(e.with_remote_id(remote_id)),
        }
    }

    fn delete_remote(&self, instance: &ResourceInstance, remote_id: &str) -> Result<()> {
        let kind = instance.kind();
        match self.client.delete(kind, remote_id) {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => {
                log::debug!("{kind} {remote_id} was already deleted");
                Ok(())
            }
            Err(e) => Err(e.with_remote_id(remote_id)),
        }
    }
}
