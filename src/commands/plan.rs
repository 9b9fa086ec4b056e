//! `wpe plan` - show what apply would change

use anyhow::{Result, bail};
use reconcile::{Action, Reconciler};

use crate::Context;
use crate::commands::{DEFAULT_JOBS, Session, Work, execute};
use crate::retry::with_retry;
use crate::ui;

/// Planned action per resource
pub struct Planned {
    pub address: String,
    pub action: reconcile::Result<Action>,
}

/// Count of planned changes by action
#[derive(Debug, Default, PartialEq, Eq)]
pub struct PlanCounts {
    pub create: usize,
    pub update: usize,
    pub replace: usize,
    pub delete: usize,
    pub failed: usize,
}

impl PlanCounts {
    pub fn from_plan(planned: &[Planned]) -> Self {
        let mut counts = Self::default();
        for p in planned {
            match &p.action {
                Ok(Action::Create) => counts.create += 1,
                Ok(Action::Update(_)) => counts.update += 1,
                Ok(Action::Replace { .. }) => counts.replace += 1,
                Ok(Action::Delete) => counts.delete += 1,
                Ok(Action::NoOp | Action::Refresh) => {}
                Err(_) => counts.failed += 1,
            }
        }
        counts
    }

    pub fn total_changes(&self) -> usize {
        self.create + self.update + self.replace + self.delete
    }
}

pub fn run(ctx: &Context, target: Option<&str>, no_refresh: bool) -> Result<()> {
    let session = Session::open(ctx, target)?;

    let mut instances = session.instances();
    if !no_refresh {
        let client = session.client(ctx)?;
        let reconciler = Reconciler::new(&client);
        let retry = session.retry();

        let done = execute(instances, DEFAULT_JOBS, |instance| {
            with_retry(retry, "refresh", || reconciler.refresh(instance))
        })?;
        instances = Vec::with_capacity(done.len());
        for item in done {
            if let Err(e) = &item.result {
                ui::warn(&format!("{}: could not refresh: {e}", item.address));
            }
            instances.push(Work {
                address: item.address,
                instance: item.instance,
            });
        }
    }

    let planned = compute(&instances, &session.orphans()?);
    let counts = PlanCounts::from_plan(&planned);

    if !ctx.quiet {
        ui::header("Plan");
        print(&planned);
        println!();
    }

    if counts.total_changes() == 0 && counts.failed == 0 {
        ui::success("No changes. Remote resources match the config.");
    } else {
        ui::info(&format!(
            "Plan: {} to create, {} to update, {} to replace, {} to delete",
            counts.create, counts.update, counts.replace, counts.delete
        ));
    }

    if counts.failed > 0 {
        bail!("{} resource(s) could not be planned", counts.failed);
    }
    Ok(())
}

/// Plan declared instances, then deletions for orphaned state entries.
///
/// No remote calls: snapshots must already be refreshed.
pub fn compute(instances: &[Work], orphans: &[Work]) -> Vec<Planned> {
    let mut planned: Vec<Planned> = instances
        .iter()
        .map(|w| Planned {
            address: w.address.to_string(),
            action: reconcile::plan(&w.instance),
        })
        .collect();

    planned.extend(orphans.iter().map(|w| Planned {
        address: w.address.to_string(),
        action: Ok(Action::Delete),
    }));
    planned
}

pub fn print(planned: &[Planned]) {
    for p in planned {
        match &p.action {
            Ok(action) => ui::action(&p.address, action),
            Err(e) => ui::error(&format!("{}: {e}", p.address)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Address;
    use reconcile::{ResourceInstance, attrs};
    use wpengine::kinds::{INSTALL, SSH_KEY};

    fn work(kind: &'static reconcile::ResourceKind, name: &str, instance: ResourceInstance) -> Work {
        Work {
            address: Address::new(kind.name, name),
            instance,
        }
    }

    #[test]
    fn test_compute_plan() {
        let observed = attrs! { "id" => "i1", "name" => "blog1", "account_id" => "a", "environment" => "staging" };
        let instances = vec![
            work(&SSH_KEY, "new", ResourceInstance::new(&SSH_KEY, attrs! { "public_key" => "k" })),
            work(
                &INSTALL,
                "same",
                ResourceInstance::existing(
                    &INSTALL,
                    "i1",
                    attrs! { "name" => "blog1", "account_id" => "a", "environment" => "staging" },
                    Some(observed.clone()),
                ),
            ),
            work(
                &INSTALL,
                "moved",
                ResourceInstance::existing(
                    &INSTALL,
                    "i1",
                    attrs! { "name" => "blog1", "account_id" => "a", "environment" => "production" },
                    Some(observed.clone()),
                ),
            ),
            work(
                &INSTALL,
                "renamed",
                ResourceInstance::existing(
                    &INSTALL,
                    "i1",
                    attrs! { "name" => "blog2", "account_id" => "a" },
                    Some(observed),
                ),
            ),
        ];
        let orphans = vec![work(
            &SSH_KEY,
            "old",
            ResourceInstance::existing(&SSH_KEY, "k9", attrs! {}, None),
        )];

        let planned = compute(&instances, &orphans);
        let counts = PlanCounts::from_plan(&planned);

        assert_eq!(
            counts,
            PlanCounts {
                create: 1,
                update: 1,
                replace: 1,
                delete: 1,
                failed: 0
            }
        );
        assert_eq!(planned[4].address, "ssh_key.old");
        assert_eq!(counts.total_changes(), 4);
    }

    #[test]
    fn test_invalid_resource_fails_alone() {
        let instances = vec![
            work(&SSH_KEY, "broken", ResourceInstance::new(&SSH_KEY, attrs! {})),
            work(&SSH_KEY, "laptop", ResourceInstance::new(&SSH_KEY, attrs! { "public_key" => "k" })),
        ];

        let planned = compute(&instances, &[]);
        let counts = PlanCounts::from_plan(&planned);

        assert!(planned[0].action.is_err());
        assert!(matches!(planned[1].action, Ok(Action::Create)));
        assert_eq!(counts.failed, 1);
        assert_eq!(counts.create, 1);
    }
}
