use std::borrow::Cow;
use std::sync::OnceLock;

use regex::{Captures, Regex};

fn percent_var_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"%([A-Za-z_][A-Za-z0-9_]*)%").expect("static regex"))
}

/// Expands `%VAR%`, `$VAR` and `${VAR}` against the process environment.
/// Unknown variables are left untouched.
pub fn expand_env_vars(command: &str) -> String {
    expand_with(command, |name| std::env::var(name).ok())
}

pub fn expand_with<F>(command: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let percent: Cow<'_, str> = percent_var_regex().replace_all(command, |caps: &Captures<'_>| {
        lookup(&caps[1]).unwrap_or_else(|| caps[0].to_string())
    });
    shellexpand::env_with_context_no_errors(percent.as_ref(), |name: &str| lookup(name)).into_owned()
}
