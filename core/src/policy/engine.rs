use std::path::{Path, PathBuf};

use regex::{Match, Regex};
use tracing::{error, info, warn};

use super::decision::PolicyDecision;
use super::path::resolve_path;
use crate::config::{PathPatternRule, PolicyConfig, PolicyMode};
use crate::error::PolicyError;
use crate::executor::expand_env_vars;

pub const REASON_CWD_REQUIRED: &str = "Execution path (cwd) must be provided.";
pub const REASON_DEV_MODE: &str = "Policy is in dev mode; checks are bypassed.";
pub const REASON_NOT_ALLOWED: &str = "Command is not in the allowed list.";
pub const REASON_DISALLOWED_PATTERN: &str =
    "Command contains a disallowed path pattern (outside-sandbox risk).";
pub const REASON_ALLOWED: &str = "Command is allowed.";

#[derive(Debug)]
struct CompiledPattern {
    regex: Regex,
    rule: PathPatternRule,
}

/// Decides whether a proposed command may run, and where.
#[derive(Debug)]
pub struct PolicyEngine {
    sandbox_root: PathBuf,
    mode: PolicyMode,
    allowed_prefixes: Vec<String>,
    patterns: Vec<CompiledPattern>,
    allow_in_sandbox_absolute_paths: bool,
}

impl PolicyEngine {
    /// Canonicalizes the sandbox root (creating it when missing) and compiles
    /// the disallowed patterns.
    pub fn new(cfg: &PolicyConfig) -> Result<Self, PolicyError> {
        let root = &cfg.sandbox_root;
        if !root.exists() {
            warn!(sandbox_root = %root.display(), "sandbox root does not exist, creating it");
            std::fs::create_dir_all(root).map_err(|source| PolicyError::SandboxRoot {
                path: root.display().to_string(),
                source,
            })?;
        }
        let sandbox_root = std::fs::canonicalize(root).map_err(|source| PolicyError::SandboxRoot {
            path: root.display().to_string(),
            source,
        })?;
        if !sandbox_root.is_dir() {
            return Err(PolicyError::InvalidConfig(format!(
                "sandbox root is not a directory: {}",
                sandbox_root.display()
            )));
        }

        let patterns = cfg
            .disallowed_patterns
            .iter()
            .map(|rule| {
                Regex::new(&rule.pattern)
                    .map(|regex| CompiledPattern {
                        regex,
                        rule: rule.clone(),
                    })
                    .map_err(|source| PolicyError::Pattern {
                        pattern: rule.pattern.clone(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let allowed_prefixes: Vec<String> = cfg
            .allowed_prefixes
            .iter()
            .map(|p| p.to_lowercase())
            .collect();

        info!(
            sandbox_root = %sandbox_root.display(),
            mode = %cfg.mode,
            allowed_prefixes = ?allowed_prefixes,
            "policy engine initialized"
        );

        Ok(Self {
            sandbox_root,
            mode: cfg.mode,
            allowed_prefixes,
            patterns,
            allow_in_sandbox_absolute_paths: cfg.allow_in_sandbox_absolute_paths,
        })
    }

    pub fn sandbox_root(&self) -> &Path {
        &self.sandbox_root
    }

    pub fn mode(&self) -> PolicyMode {
        self.mode
    }

    /// Maps a requested working directory onto the sandbox: relative paths
    /// are joined to the sandbox root, absolute ones are kept as given.
    pub fn resolve_cwd(&self, requested: Option<&str>) -> Option<PathBuf> {
        let requested = requested.map(str::trim).filter(|s| !s.is_empty())?;
        let path = Path::new(requested);
        if path.is_absolute() {
            Some(path.to_path_buf())
        } else {
            Some(self.sandbox_root.join(path))
        }
    }

    /// Runs every check in order; the first failing one decides.
    pub fn check_all(&self, command: &str, target_cwd: Option<&Path>) -> PolicyDecision {
        let Some(cwd) = target_cwd else {
            return PolicyDecision::deny(REASON_CWD_REQUIRED);
        };

        if self.mode == PolicyMode::Dev {
            return PolicyDecision::allow(REASON_DEV_MODE);
        }

        if !self.is_path_in_sandbox(cwd) {
            return PolicyDecision::deny(format!(
                "Execution path is outside the security sandbox. Allowed root: {}",
                self.sandbox_root.display()
            ));
        }

        if !self.is_command_allowed(command) {
            return PolicyDecision::deny(REASON_NOT_ALLOWED);
        }

        if self.find_disallowed_pattern(command).is_some() {
            return PolicyDecision::deny(REASON_DISALLOWED_PATTERN);
        }

        PolicyDecision::allow(REASON_ALLOWED)
    }

    pub fn is_path_in_sandbox(&self, cwd: &Path) -> bool {
        match resolve_path(cwd) {
            Ok(target) => {
                let inside = target.starts_with(&self.sandbox_root);
                if !inside {
                    warn!(
                        target = %target.display(),
                        sandbox_root = %self.sandbox_root.display(),
                        "path check failed, target is not in sandbox"
                    );
                }
                inside
            }
            Err(e) => {
                error!(cwd = %cwd.display(), error = %e, "path validation error");
                false
            }
        }
    }

    pub fn is_command_allowed(&self, command: &str) -> bool {
        let normalized = command.trim().to_lowercase();
        let allowed = self
            .allowed_prefixes
            .iter()
            .any(|prefix| normalized.starts_with(prefix.as_str()));
        if !allowed {
            warn!(command = %command, "command denied by policy (not in whitelist)");
        }
        allowed
    }

    /// Scans the environment-expanded command for sandbox-escape patterns.
    pub fn find_disallowed_pattern(&self, command: &str) -> Option<&PathPatternRule> {
        let expanded = expand_env_vars(command);
        let normalized = expanded.trim();

        for compiled in &self.patterns {
            for m in compiled.regex.find_iter(normalized) {
                if compiled.rule.absolute
                    && self.allow_in_sandbox_absolute_paths
                    && self.is_path_in_sandbox_quiet(path_token_at(normalized, m))
                {
                    continue;
                }
                warn!(
                    pattern = %compiled.rule.pattern,
                    reason = compiled.rule.reason.as_deref().unwrap_or("disallowed path pattern"),
                    command = %command,
                    "command denied by policy (disallowed path pattern)"
                );
                return Some(&compiled.rule);
            }
        }
        None
    }

    fn is_path_in_sandbox_quiet(&self, token: &str) -> bool {
        !token.is_empty()
            && resolve_path(Path::new(token))
                .map(|p| p.starts_with(&self.sandbox_root))
                .unwrap_or(false)
    }
}

fn is_delimiter(c: char) -> bool {
    c.is_whitespace() || matches!(c, '=' | '<' | '>' | '|' | ';' | '&' | '\'' | '"')
}

/// The path argument a pattern match points into, without surrounding
/// quotes, redirections or separators.
fn path_token_at<'a>(text: &'a str, m: Match<'_>) -> &'a str {
    let offset = text[m.start()..]
        .find(|c: char| !is_delimiter(c))
        .unwrap_or(0);
    let start = m.start() + offset;
    let rest = &text[start..];
    let quote = text[..start]
        .chars()
        .next_back()
        .filter(|c| *c == '"' || *c == '\'');
    let end = match quote {
        Some(q) => rest.find(q).unwrap_or(rest.len()),
        None => rest.find(is_delimiter).unwrap_or(rest.len()),
    };
    &rest[..end]
}
