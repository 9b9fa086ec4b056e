use colored::Colorize;
use reconcile::{Action, Outcome, Summary};

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

// ============================================================================
// Plan and Outcome Lines
// ============================================================================

/// Print one planned action
pub fn action(address: &str, action: &Action) {
    let symbol = match action {
        Action::Create => action.symbol().green(),
        Action::Update(_) => action.symbol().yellow(),
        Action::Replace { .. } | Action::Delete => action.symbol().red(),
        Action::NoOp | Action::Refresh => action.symbol().dimmed(),
    };

    let detail = match action {
        Action::Update(changes) => changes.names().join(", "),
        Action::Replace { attributes } => format!("forced by {}", attributes.join(", ")),
        Action::Create => "create".to_string(),
        Action::Delete => "delete".to_string(),
        Action::Refresh => "read first".to_string(),
        Action::NoOp => "up to date".to_string(),
    };

    println!("  {symbol:>3} {address} {}", detail.dimmed());
}

/// Print the outcome of one reconciler call
pub fn outcome(address: &str, outcome: &Outcome) {
    match outcome {
        Outcome::NoChange | Outcome::Refreshed => {
            println!("  {} {address}", "=".dimmed());
        }
        Outcome::Created { remote_id } => {
            println!("  {} {address} {}", "+".green(), format!("({remote_id})").dimmed());
        }
        Outcome::Updated { changed } => {
            println!("  {} {address} {}", "~".yellow(), changed.join(", ").dimmed());
        }
        Outcome::Replaced {
            previous_id,
            remote_id,
        } => {
            println!(
                "  {} {address} {}",
                "-/+".red(),
                format!("({previous_id} -> {remote_id})").dimmed()
            );
        }
        Outcome::Deleted => println!("  {} {address}", "-".red()),
        Outcome::Vanished { remote_id } => {
            println!(
                "  {} {address} {}",
                "!".yellow(),
                format!("({remote_id} no longer exists)").dimmed()
            );
        }
    }
}

/// Print a pass summary
pub fn summary(summary: &Summary) {
    println!();
    let line = format!(
        "{} created, {} updated, {} replaced, {} deleted, {} unchanged",
        summary.created, summary.updated, summary.replaced, summary.deleted, summary.no_change
    );
    if summary.is_success() {
        success(&line);
    } else {
        error(&format!("{line}, {} failed", summary.failed));
    }
    if summary.vanished > 0 {
        dim(&format!(
            "{} resource(s) had been deleted outside of wpe",
            summary.vanished
        ));
    }
}
