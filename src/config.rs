//! Options shared by the CLI, the HTTP front end and library callers.

use serde::{Deserialize, Serialize};

use crate::output::OutputFormat;
use crate::tokens::Encoding;

/// Files larger than this many bytes are skipped unless configured otherwise.
pub const DEFAULT_MAX_SIZE: u64 = 1_048_576;

/// Per-project ignore file, read from the root in addition to `.gitignore`.
pub const IGNORE_FILE_NAME: &str = ".repoflatignore";

/// Environment variable holding the token for private remote repositories.
pub const TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Everything that controls one dump.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DumpOptions {
    /// Glob patterns a file's relative path must match (any of).
    pub include: Vec<String>,
    /// Glob patterns that reject a file (any of).
    pub exclude: Vec<String>,
    /// Skip files larger than this many bytes.
    pub max_size: u64,
    /// Drop the largest files until the dump fits this many tokens.
    pub max_tokens: Option<usize>,
    pub format: OutputFormat,
    /// Also reject files whose sample is mostly non-printable.
    pub binary_strict: bool,
    /// Strip comments from recognised source files.
    pub exclude_comments: bool,
    pub respect_gitignore: bool,
    /// Token for private remote repositories.
    #[serde(skip_serializing)]
    pub private_token: Option<String>,
    pub encoding: Encoding,
}

impl Default for DumpOptions {
    fn default() -> Self {
        Self {
            include: vec!["*".to_string()],
            exclude: Vec::new(),
            max_size: DEFAULT_MAX_SIZE,
            max_tokens: None,
            format: OutputFormat::default(),
            binary_strict: true,
            exclude_comments: false,
            respect_gitignore: true,
            private_token: None,
            encoding: Encoding::default(),
        }
    }
}
