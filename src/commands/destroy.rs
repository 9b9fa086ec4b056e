//! `wpe destroy` - delete tracked remote resources

use anyhow::{Result, bail};
use reconcile::Reconciler;

use crate::Context;
use crate::cli::DestroyArgs;
use crate::commands::apply::report;
use crate::commands::{Session, confirm, execute};
use crate::retry::with_retry;
use crate::ui;

pub fn run(ctx: &Context, args: &DestroyArgs) -> Result<()> {
    let mut session = Session::open(ctx, args.target.target.as_deref())?;
    let tracked = session.tracked_all()?;

    if tracked.is_empty() {
        ui::info("Nothing to destroy");
        return Ok(());
    }

    if !ctx.quiet {
        ui::header("Destroy");
        for work in &tracked {
            ui::action(&work.address.to_string(), &reconcile::Action::Delete);
        }
        println!();
    }

    if !args.yes && !confirm(&format!("Delete {} remote resource(s)?", tracked.len()))? {
        ui::info("Aborted");
        return Ok(());
    }

    let client = session.client(ctx)?;
    let reconciler = Reconciler::new(&client);
    let retry = session.retry().clone();
    let jobs = usize::from(args.jobs.max(1));

    let done = execute(tracked, jobs, |instance| {
        with_retry(&retry, "destroy", || reconciler.destroy(instance))
    })?;

    let summary = report(&done, ctx.quiet);
    session.save(done)?;
    ui::summary(&summary);

    if !summary.is_success() {
        bail!("{} resource(s) could not be deleted", summary.failed);
    }
    Ok(())
}
