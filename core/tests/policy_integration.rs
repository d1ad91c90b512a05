//! Integration tests for the policy engine
//!
//! Each test builds an engine over a fresh temporary sandbox.
use std::path::PathBuf;

use operator_core::api::{PolicyConfig, PolicyDecision, PolicyEngine, PolicyMode};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

struct Fixture {
    _dir: TempDir,
    engine: PolicyEngine,
}

impl Fixture {
    fn root(&self) -> PathBuf {
        self.engine.sandbox_root().to_path_buf()
    }
}

fn fixture_with(configure: impl FnOnce(&mut PolicyConfig)) -> Fixture {
    let dir = TempDir::new().unwrap();
    let sandbox = dir.path().join("sandbox");
    std::fs::create_dir(&sandbox).unwrap();
    let mut cfg = PolicyConfig::with_sandbox_root(&sandbox);
    configure(&mut cfg);
    let engine = PolicyEngine::new(&cfg).unwrap();
    Fixture { _dir: dir, engine }
}

fn fixture() -> Fixture {
    fixture_with(|_| {})
}

fn denied_reason(decision: PolicyDecision) -> String {
    assert!(!decision.is_allowed(), "expected denial, got {decision:?}");
    decision.reason().to_string()
}

#[test]
fn allowed_command() {
    let f = fixture();
    assert!(f.engine.check_all("git status", Some(&f.root())).is_allowed());
}

#[test]
fn disallowed_command() {
    let f = fixture();
    let reason = denied_reason(f.engine.check_all("rm -rf /", Some(&f.root())));
    assert!(reason.contains("not in the allowed list"));
}

#[test]
fn path_in_sandbox() {
    let f = fixture();
    let project_a = f.root().join("projectA");
    std::fs::create_dir(&project_a).unwrap();
    assert!(f.engine.check_all("dir", Some(&project_a)).is_allowed());
}

#[test]
fn nonexistent_subdirectory_still_in_sandbox() {
    let f = fixture();
    let later = f.root().join("not").join("yet");
    assert!(f.engine.check_all("ls", Some(&later)).is_allowed());
}

#[test]
fn path_outside_sandbox() {
    let f = fixture();
    let outside = f.root().parent().unwrap().join("outside");
    std::fs::create_dir_all(&outside).unwrap();
    let reason = denied_reason(f.engine.check_all("dir", Some(&outside)));
    assert!(reason.contains("outside the security sandbox"));
    assert!(reason.contains(&f.root().display().to_string()));
}

#[test]
fn path_traversal_attack() {
    let f = fixture();
    let malicious = f.root().join("..").join("some_other_dir");
    let reason = denied_reason(f.engine.check_all("dir", Some(&malicious)));
    assert!(reason.contains("outside the security sandbox"));
}

#[cfg(unix)]
#[test]
fn symlink_escape_is_outside() {
    let f = fixture();
    let outside = f.root().parent().unwrap().join("target");
    std::fs::create_dir_all(&outside).unwrap();
    let link = f.root().join("link");
    std::os::unix::fs::symlink(&outside, &link).unwrap();
    let reason = denied_reason(f.engine.check_all("ls", Some(&link)));
    assert!(reason.contains("outside the security sandbox"));
}

#[test]
fn command_with_extra_spaces_and_case() {
    let f = fixture();
    assert!(f.engine.check_all("  git status  ", Some(&f.root())).is_allowed());
    assert!(f.engine.check_all("GIT STATUS", Some(&f.root())).is_allowed());
}

#[test]
fn no_cwd_provided() {
    let f = fixture();
    let reason = denied_reason(f.engine.check_all("git status", None));
    assert_eq!(reason, "Execution path (cwd) must be provided.");
}

#[test]
fn allow_file_write_command_in_sandbox() {
    let f = fixture();
    let decision = f.engine.check_all("echo hello > greeting.txt", Some(&f.root()));
    assert_eq!(decision, PolicyDecision::allow("Command is allowed."));
}

#[test]
fn block_drive_letter_path_in_command() {
    let f = fixture();
    let reason = denied_reason(f.engine.check_all(
        r"echo hello > C:\Users\someone\Desktop\greeting.txt",
        Some(&f.root()),
    ));
    assert!(reason.contains("disallowed path pattern"));
}

#[test]
fn block_parent_traversal_in_command() {
    let f = fixture();
    let reason = denied_reason(f.engine.check_all(r"echo hello > ..\outside.txt", Some(&f.root())));
    assert!(reason.contains("disallowed path pattern"));
}

#[test]
fn block_unc_path_in_command() {
    let f = fixture();
    let reason = denied_reason(f.engine.check_all(r"dir \\server\share", Some(&f.root())));
    assert!(reason.contains("disallowed path pattern"));
}

#[test]
fn block_posix_absolute_path_in_command() {
    let f = fixture();
    let reason = denied_reason(f.engine.check_all("ls /etc", Some(&f.root())));
    assert!(reason.contains("disallowed path pattern"));
    // relative paths with slashes stay allowed
    assert!(f.engine.check_all("ls src/bin", Some(&f.root())).is_allowed());
}

fn assert_pattern_denied(f: &Fixture, command: &str) {
    let reason = denied_reason(f.engine.check_all(command, Some(&f.root())));
    assert!(
        reason.contains("disallowed path pattern"),
        "{command}: {reason}"
    );
}

#[test]
fn block_backslash_escaped_root() {
    let f = fixture();
    assert_pattern_denied(&f, r"ls \/etc");
    assert_pattern_denied(&f, r"echo hi; cat \/etc/passwd");
}

#[test]
fn block_home_directory_tilde() {
    let f = fixture();
    assert_pattern_denied(&f, "ls ~");
    assert_pattern_denied(&f, "ls ~/.ssh");
    // revision suffixes are not paths
    assert!(f.engine.check_all("git diff HEAD~1", Some(&f.root())).is_allowed());
}

#[test]
fn block_unresolved_variable_prefix() {
    let f = fixture();
    assert_pattern_denied(&f, "ls $IFS/etc");
    assert_pattern_denied(&f, "ls $OPERATOR_POLICY_TEST_UNSET/etc");
}

#[test]
fn block_command_substitution_prefix() {
    let f = fixture();
    assert_pattern_denied(&f, "ls $(echo)/etc");
    assert_pattern_denied(&f, "ls `echo`/etc");
    assert_pattern_denied(&f, "ls ${OPERATOR_POLICY_TEST_UNSET}/etc");
}

#[test]
fn escape_smuggled_through_environment_variable() {
    let f = fixture();
    std::env::set_var("OPERATOR_POLICY_TEST_ESCAPE", r"C:\Windows\System32");
    let reason = denied_reason(
        f.engine
            .check_all("echo hi > %OPERATOR_POLICY_TEST_ESCAPE%\\x.txt", Some(&f.root())),
    );
    assert!(reason.contains("disallowed path pattern"));
}

#[test]
fn whitelist_checked_before_pattern_scan() {
    let f = fixture();
    let reason = denied_reason(f.engine.check_all("cat ../secret", Some(&f.root())));
    assert_eq!(reason, "Command is not in the allowed list.");
}

#[test]
fn dev_mode_bypasses_checks() {
    let f = fixture_with(|cfg| cfg.mode = PolicyMode::Dev);
    let outside = f.root().parent().unwrap().to_path_buf();
    let decision = f.engine.check_all("rm -rf /", Some(&outside));
    assert_eq!(
        decision,
        PolicyDecision::allow("Policy is in dev mode; checks are bypassed.")
    );
    // cwd is still required
    assert!(!f.engine.check_all("ls", None).is_allowed());
}

#[test]
fn custom_prefixes_replace_defaults() {
    let f = fixture_with(|cfg| cfg.allowed_prefixes = vec!["Cargo Test".into()]);
    assert!(f.engine.check_all("cargo test -p core", Some(&f.root())).is_allowed());
    assert!(!f.engine.check_all("git status", Some(&f.root())).is_allowed());
}
