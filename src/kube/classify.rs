/// Classification of captured kubectl output
use crate::kube::ResourceKind;

/// Outcome of a reconciliation command, derived from captured output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    /// The tool ran and reported nothing on stderr
    Success,
    /// The tool ran and reported an error, or could not be invoked at all
    SoftFailure,
    /// The tool reported the deletion target missing
    NotFound,
}

/// Classify a create/update invocation.
///
/// `stderr` is `None` when the tool could not be invoked; that case and every
/// non-empty stderr are soft failures.
pub fn classify_apply(stderr: Option<&str>) -> CommandStatus {
    match stderr {
        Some(err) if err.is_empty() => CommandStatus::Success,
        _ => CommandStatus::SoftFailure,
    }
}

/// Classify a delete invocation, recognizing the control plane's not-found
/// error text.
///
/// Both the singular and plural spelling of the kind are matched because
/// control-plane versions pluralize the kind name inconsistently. The match
/// is an exact, case-sensitive substring check.
pub fn classify_delete(kind: ResourceKind, name: &str, stderr: Option<&str>) -> CommandStatus {
    let err = match stderr {
        Some(err) => err,
        None => return CommandStatus::SoftFailure,
    };

    if err.is_empty() {
        return CommandStatus::Success;
    }

    let singular = format!("{} \"{}\" not found", kind.cli_name(), name);
    let plural = format!("{}s \"{}\" not found", kind.cli_name(), name);
    if err.contains(&singular) || err.contains(&plural) {
        CommandStatus::NotFound
    } else {
        CommandStatus::SoftFailure
    }
}
