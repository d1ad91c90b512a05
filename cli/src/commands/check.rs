//! `operator check`

use std::path::Path;

use crate::commands::cli::CheckArgs;
use operator_core::api::{AppContext, PolicyDecision};

/// Process exit code for a denied command.
pub const EXIT_DENIED: i32 = 2;

/// Prints the decision and returns the process exit code.
pub fn handle_check(args: CheckArgs, ctx: &AppContext) -> i32 {
    let policy = ctx.policy();
    let cwd = policy
        .resolve_cwd(args.cwd.as_deref())
        .unwrap_or_else(|| policy.sandbox_root().to_path_buf());
    let decision = policy.check_all(&args.command, Some(&cwd));
    println!("{}", render(&args.command, &cwd, &decision));
    match decision {
        PolicyDecision::Allowed { .. } => 0,
        PolicyDecision::Denied { .. } => EXIT_DENIED,
    }
}

fn render(command: &str, cwd: &Path, decision: &PolicyDecision) -> String {
    let verdict = if decision.is_allowed() { "allowed" } else { "denied" };
    format!(
        "{verdict}: {}\n  command: {command}\n  cwd: {}",
        decision.reason(),
        cwd.display()
    )
}
