//! Sandbox policy: cwd containment, command whitelist and escape-pattern scan.

mod decision;
mod engine;
mod path;

pub use decision::PolicyDecision;
pub use engine::{
    PolicyEngine, REASON_ALLOWED, REASON_CWD_REQUIRED, REASON_DEV_MODE,
    REASON_DISALLOWED_PATTERN, REASON_NOT_ALLOWED,
};
pub use path::resolve_path;
