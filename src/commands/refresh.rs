//! `wpe refresh` - re-read tracked resources into the state file

use anyhow::{Result, bail};
use reconcile::Reconciler;

use crate::Context;
use crate::commands::apply::report;
use crate::commands::{DEFAULT_JOBS, Session, execute};
use crate::retry::with_retry;
use crate::ui;

pub fn run(ctx: &Context, target: Option<&str>) -> Result<()> {
    let mut session = Session::open(ctx, target)?;
    let tracked = session.tracked_all()?;

    if tracked.is_empty() {
        ui::info("Nothing tracked");
        return Ok(());
    }

    let client = session.client(ctx)?;
    let reconciler = Reconciler::new(&client);
    let retry = session.retry().clone();

    let done = execute(tracked, DEFAULT_JOBS, |instance| {
        with_retry(&retry, "refresh", || reconciler.refresh(instance))
    })?;

    // Vanished resources lose their identity and drop out of state on save
    let summary = report(&done, ctx.quiet);
    session.save(done)?;

    if summary.vanished > 0 {
        ui::warn(&format!(
            "{} resource(s) no longer exist and are no longer tracked",
            summary.vanished
        ));
    }

    if !summary.is_success() {
        bail!("{} resource(s) could not be refreshed", summary.failed);
    }
    ui::success(&format!("Refreshed {} resource(s)", summary.total()));
    Ok(())
}
