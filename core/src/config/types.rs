use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub policy: PolicyConfig,

    #[serde(default)]
    pub executor: ExecutorConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub memory: MemoryConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            policy: PolicyConfig::default(),
            executor: ExecutorConfig::default(),
            llm: LlmConfig::default(),
            memory: MemoryConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// `enforced` runs every check; `dev` bypasses whitelist and sandbox checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PolicyMode {
    #[default]
    Enforced,
    Dev,
}

impl PolicyMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyMode::Enforced => "enforced",
            PolicyMode::Dev => "dev",
        }
    }
}

impl fmt::Display for PolicyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PolicyMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "enforced" => Ok(PolicyMode::Enforced),
            "dev" => Ok(PolicyMode::Dev),
            other => Err(format!("unknown policy mode '{other}' (expected 'enforced' or 'dev')")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    #[serde(default = "default_sandbox_root")]
    pub sandbox_root: PathBuf,

    #[serde(default)]
    pub mode: PolicyMode,

    #[serde(default = "default_allowed_prefixes")]
    pub allowed_prefixes: Vec<String>,

    #[serde(default = "default_disallowed_patterns")]
    pub disallowed_patterns: Vec<PathPatternRule>,

    /// Exempt absolute-path arguments that resolve inside the sandbox root
    /// from the escape-pattern scan.
    #[serde(default)]
    pub allow_in_sandbox_absolute_paths: bool,
}

/// A regex that flags sandbox-escape attempts in command arguments.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PathPatternRule {
    pub pattern: String,
    #[serde(default)]
    pub reason: Option<String>,
    /// Matches denote an absolute path (eligible for the in-sandbox exemption).
    #[serde(default)]
    pub absolute: bool,
}

fn default_sandbox_root() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join("ai-sandbox"))
        .unwrap_or_else(|| PathBuf::from("ai-sandbox"))
}

fn default_allowed_prefixes() -> Vec<String> {
    [
        "git status",
        "git diff",
        "pytest",
        "python -m pytest",
        "docker ps",
        "dir",
        "ls",
        // file creation is only safe because of the sandbox + pattern checks
        "echo ",
        "set-content ",
        "out-file ",
        "new-item ",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_disallowed_patterns() -> Vec<PathPatternRule> {
    vec![
        PathPatternRule {
            pattern: r"[a-zA-Z]:\\".into(),
            reason: Some("drive-letter absolute path".into()),
            absolute: true,
        },
        PathPatternRule {
            pattern: r"\\\\".into(),
            reason: Some("UNC path".into()),
            absolute: false,
        },
        PathPatternRule {
            pattern: r"\.\.".into(),
            reason: Some("parent directory traversal".into()),
            absolute: false,
        },
        PathPatternRule {
            pattern: r#"(^|[\s=<>|;&'"])/"#.into(),
            reason: Some("POSIX absolute path".into()),
            absolute: true,
        },
        PathPatternRule {
            pattern: r#"(^|[\s=<>|;&'"(:])~"#.into(),
            reason: Some("home directory expansion".into()),
            absolute: false,
        },
        PathPatternRule {
            pattern: r"[\\)`}]/".into(),
            reason: Some("absolute path behind shell quoting or substitution".into()),
            absolute: false,
        },
        PathPatternRule {
            pattern: r"\$([A-Za-z_][A-Za-z0-9_]*|[0-9@*#?$!-])/".into(),
            reason: Some("unresolved variable used as a path prefix".into()),
            absolute: false,
        },
    ]
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            sandbox_root: default_sandbox_root(),
            mode: PolicyMode::default(),
            allowed_prefixes: default_allowed_prefixes(),
            disallowed_patterns: default_disallowed_patterns(),
            allow_in_sandbox_absolute_paths: false,
        }
    }
}

impl PolicyConfig {
    /// Default rules rooted at `sandbox_root`.
    pub fn with_sandbox_root(sandbox_root: impl Into<PathBuf>) -> Self {
        Self {
            sandbox_root: sandbox_root.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    #[serde(default = "default_command_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_max_output_chars")]
    pub max_output_chars: usize,
}

fn default_command_timeout_secs() -> u64 {
    120
}

fn default_max_output_chars() -> usize {
    8000
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_command_timeout_secs(),
            max_output_chars: default_max_output_chars(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,

    #[serde(default = "default_llm_model")]
    pub model: Option<String>,

    #[serde(default = "default_llm_fallback_model")]
    pub fallback_model: String,

    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_llm_temperature")]
    pub temperature: f32,
}

pub const DEFAULT_LLM_MODEL: &str = "gpt-oss:20b";

fn default_llm_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_llm_model() -> Option<String> {
    Some(DEFAULT_LLM_MODEL.to_string())
}

fn default_llm_fallback_model() -> String {
    "llama3.1:8b".to_string()
}

fn default_llm_timeout_secs() -> u64 {
    120
}

fn default_llm_temperature() -> f32 {
    0.2
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            model: default_llm_model(),
            fallback_model: default_llm_fallback_model(),
            timeout_secs: default_llm_timeout_secs(),
            temperature: default_llm_temperature(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    #[serde(default = "default_max_messages")]
    pub max_messages: usize,
    /// Least recently used sessions are evicted beyond this count.
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

fn default_max_messages() -> usize {
    20
}

fn default_max_sessions() -> usize {
    256
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_messages: default_max_messages(),
            max_sessions: default_max_sessions(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// When set, logs are also written to a daily rolling file here.
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: None,
        }
    }
}
