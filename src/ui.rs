use crate::domain::RefKind;
use crate::publisher::PublishOutcome;
use console::style;

pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red(), message);
}

pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

pub fn display_status(message: &str) {
    println!("{} {}", style("→").yellow(), message);
}

/// Describe the result of publishing one ref
pub fn outcome_message(kind: RefKind, name: &str, outcome: PublishOutcome, dry_run: bool) -> String {
    match (outcome, dry_run) {
        (PublishOutcome::AlreadyPresent, _) => {
            format!("{} {} already exists on the remote, nothing to do", kind, name)
        }
        (PublishOutcome::Pushed, true) => format!("Would push {} {} (dry run)", kind, name),
        (PublishOutcome::Pushed, false) => format!("Pushed {} {}", kind, name),
    }
}

pub fn display_outcome(kind: RefKind, name: &str, outcome: PublishOutcome, dry_run: bool) {
    let message = outcome_message(kind, name, outcome, dry_run);
    match outcome {
        PublishOutcome::Pushed => display_success(&message),
        PublishOutcome::AlreadyPresent => display_status(&message),
    }
}
