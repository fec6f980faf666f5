use colored::Colorize;
use itemkit::{ApplyOutcome, ApplySummary, ItemReport};

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

/// Symbol for an apply outcome
pub fn outcome_symbol(outcome: ApplyOutcome) -> String {
    match outcome {
        ApplyOutcome::Ok => "✓".dimmed().to_string(),
        ApplyOutcome::Fixed => "✓".green().to_string(),
        ApplyOutcome::Skipped => "⊘".yellow().to_string(),
        ApplyOutcome::Failed => "✗".red().to_string(),
    }
}

/// One line describing an applied item
pub fn report_line(node: &str, report: &ItemReport) -> String {
    let mut line = format!(
        "{} {}: {} {}",
        outcome_symbol(report.outcome),
        node,
        report.id,
        report.outcome.to_string().dimmed()
    );
    if let Some(error) = &report.error {
        line.push_str(&format!(" ({})", error.red()));
    }
    line
}

/// Print final summary
pub fn summary(summary: &ApplySummary) {
    println!();
    if summary.is_success() {
        success(&format!("{} items converged", summary.total()));
    } else {
        warn(&format!("{} of {} items failed", summary.failed, summary.total()));
    }

    if summary.fixed > 0 {
        println!("    • {} fixed", summary.fixed);
    }
    if summary.ok > 0 {
        println!("    • {} already correct", summary.ok);
    }
    if summary.skipped > 0 {
        println!("    • {} skipped", summary.skipped);
    }
    if summary.failed > 0 {
        println!("    • {} {}", summary.failed, "failed".red());
    }
}
