//! `wpe apply` - make remote resources match the config

use anyhow::{Result, bail};
use reconcile::{ErrorCategory, Outcome, Reconciler, ResourceInstance, Summary};

use crate::Context;
use crate::cli::ApplyArgs;
use crate::commands::{Done, Session, Work, confirm, execute, plan};
use crate::retry::{RetryConfig, with_retry};
use crate::ui;

pub fn run(ctx: &Context, args: &ApplyArgs) -> Result<()> {
    let mut session = Session::open(ctx, args.target.target.as_deref())?;
    let client = session.client(ctx)?;
    let reconciler = Reconciler::new(&client);
    let retry = session.retry().clone();
    let jobs = usize::from(args.jobs.max(1));

    // Refresh tracked snapshots so the plan reflects the remote
    let refreshed = execute(session.instances(), jobs, |instance| {
        with_retry(&retry, "refresh", || reconciler.refresh(instance))
    })?;
    let (instances, mut done) = split_refreshed(refreshed);
    let orphans = session.orphans()?;

    let planned = plan::compute(&instances, &orphans);
    let counts = plan::PlanCounts::from_plan(&planned);

    if !ctx.quiet {
        ui::header("Plan");
        plan::print(&planned);
        println!();
    }

    if counts.total_changes() == 0 && done.is_empty() {
        ui::success("No changes. Remote resources match the config.");
        session.save(into_done(instances))?;
        return Ok(());
    }

    if args.dry_run {
        ui::info(&format!(
            "Dry run: {} change(s) would be made",
            counts.total_changes()
        ));
        return Ok(());
    }

    if counts.replace > 0 && !args.replace {
        ui::warn("Some resources need replacement; pass --replace to delete and re-create them");
    }

    if counts.total_changes() > 0
        && !args.yes
        && !confirm(&format!("Apply {} change(s)?", counts.total_changes()))?
    {
        ui::info("Aborted");
        return Ok(());
    }

    let applied = execute(instances, jobs, |instance| {
        converge(&reconciler, &retry, args.replace, instance)
    })?;
    let destroyed = execute(orphans, jobs, |instance| {
        with_retry(&retry, "destroy", || reconciler.destroy(instance))
    })?;
    done.extend(applied);
    done.extend(destroyed);

    let summary = report(&done, ctx.quiet);
    session.save(done)?;
    ui::summary(&summary);

    if !summary.is_success() {
        bail!("{} resource(s) failed", summary.failed);
    }
    Ok(())
}

/// Reconcile one instance, replacing it when allowed and required.
pub fn converge(
    reconciler: &Reconciler<'_>,
    retry: &RetryConfig,
    replace: bool,
    instance: &mut ResourceInstance,
) -> reconcile::Result<Outcome> {
    match with_retry(retry, "reconcile", || reconciler.reconcile(instance)) {
        Err(e) if replace && e.category() == ErrorCategory::RequiresReplacement => {
            log::info!("{e}; replacing");
            with_retry(retry, "replace", || reconciler.replace(instance))
        }
        other => other,
    }
}

/// Separate instances that refreshed from those that failed to.
fn split_refreshed(refreshed: Vec<Done>) -> (Vec<Work>, Vec<Done>) {
    let mut ok = Vec::with_capacity(refreshed.len());
    let mut failed = Vec::new();
    for item in refreshed {
        if item.result.is_ok() {
            ok.push(Work {
                address: item.address,
                instance: item.instance,
            });
        } else {
            failed.push(item);
        }
    }
    (ok, failed)
}

fn into_done(work: Vec<Work>) -> Vec<Done> {
    work.into_iter()
        .map(|w| Done {
            address: w.address,
            instance: w.instance,
            result: Ok(Outcome::Refreshed),
        })
        .collect()
}

/// Print each result and tally them.
pub fn report(done: &[Done], quiet: bool) -> Summary {
    let mut summary = Summary::default();
    if !quiet {
        ui::header("Results");
    }

    for item in done {
        summary.add_result(&item.result);
        let address = item.address.to_string();
        match &item.result {
            Ok(outcome) if !quiet => ui::outcome(&address, outcome),
            Ok(_) => {}
            Err(e) => {
                ui::error(&format!("{address}: {e}"));
                match e.category() {
                    ErrorCategory::RequiresReplacement => {
                        ui::dim("re-run with --replace to delete and re-create it");
                    }
                    category => ui::dim(category.advice()),
                }
            }
        }
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Address;
    use reconcile::{Error, MockClient, Operation, attrs};
    use wpengine::kinds::{ACCOUNT_USER, INSTALL};

    fn fast() -> RetryConfig {
        RetryConfig {
            max_attempts: 3,
            base_delay_ms: 1,
            backoff_factor: 1.0,
            max_delay_ms: 1,
        }
    }

    fn install(name: &str) -> ResourceInstance {
        ResourceInstance::new(&INSTALL, attrs! { "name" => name, "account_id" => "a" })
    }

    #[test]
    fn test_converge_without_replace_reports() {
        let mock = MockClient::new();
        let reconciler = Reconciler::new(&mock);
        let mut instance = install("blog1");
        reconciler.reconcile(&mut instance).unwrap();

        instance.set_desired(attrs! { "name" => "blog2", "account_id" => "a" });
        let err = converge(&reconciler, &fast(), false, &mut instance).unwrap_err();

        assert_eq!(err.category(), ErrorCategory::RequiresReplacement);
        assert_eq!(mock.count(Operation::Delete), 0);
    }

    #[test]
    fn test_converge_with_replace() {
        let mock = MockClient::new();
        let reconciler = Reconciler::new(&mock);
        let mut instance = install("blog1");
        reconciler.reconcile(&mut instance).unwrap();

        instance.set_desired(attrs! { "name" => "blog2", "account_id" => "a" });
        let outcome = converge(&reconciler, &fast(), true, &mut instance).unwrap();

        assert!(matches!(outcome, Outcome::Replaced { .. }));
        assert_eq!(instance.remote_id(), Some("2"));
    }

    #[test]
    fn test_converge_retries_transport_errors() {
        let mock = MockClient::with_next_id(42);
        mock.fail_next(Operation::Create, Error::transport("account_user", "reset"));
        let reconciler = Reconciler::new(&mock);
        let mut user = ResourceInstance::new(
            &ACCOUNT_USER,
            attrs! {
                "account_id" => "acct-1",
                "first_name" => "Ann",
                "last_name" => "Lee",
                "email" => "a@x.com",
            },
        );

        let outcome = converge(&reconciler, &fast(), false, &mut user).unwrap();

        assert_eq!(mock.count(Operation::Create), 2);
        assert_eq!(
            outcome,
            Outcome::Created {
                remote_id: "42".into()
            }
        );
    }

    #[test]
    fn test_converge_does_not_retry_conflicts() {
        let mock = MockClient::new();
        mock.fail_next(
            Operation::Create,
            Error::Conflict {
                kind: "install".into(),
                remote_id: None,
                status: 400,
                body: "name taken".into(),
            },
        );
        let reconciler = Reconciler::new(&mock);
        let mut instance = install("blog1");

        assert!(converge(&reconciler, &fast(), false, &mut instance).is_err());
        assert_eq!(mock.count(Operation::Create), 1);
    }

    #[test]
    fn test_split_refreshed() {
        let done = vec![
            Done {
                address: Address::new("install", "a"),
                instance: install("aaa"),
                result: Ok(Outcome::Refreshed),
            },
            Done {
                address: Address::new("install", "b"),
                instance: install("bbb"),
                result: Err(Error::transport("install", "down")),
            },
        ];

        let (ok, failed) = split_refreshed(done);
        assert_eq!(ok.len(), 1);
        assert_eq!(ok[0].address.name, "a");
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].address.name, "b");
    }

    #[test]
    fn test_report_counts() {
        let done = vec![
            Done {
                address: Address::new("install", "a"),
                instance: install("aaa"),
                result: Ok(Outcome::Created {
                    remote_id: "1".into(),
                }),
            },
            Done {
                address: Address::new("install", "b"),
                instance: install("bbb"),
                result: Err(Error::transport("install", "down")),
            },
        ];

        let summary = report(&done, true);
        assert_eq!(summary.created, 1);
        assert_eq!(summary.failed, 1);
    }
}
