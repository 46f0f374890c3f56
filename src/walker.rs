//! Directory traversal with glob and gitignore filtering.
//!
//! Uses the `ignore` crate to walk the tree while respecting `.gitignore`
//! and `.repoflatignore`, then applies include/exclude globs, the binary
//! filter and the size cap to every file.

use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};
use ignore::WalkBuilder;
use log::{debug, warn};
use thiserror::Error;

use crate::config::{DEFAULT_MAX_SIZE, IGNORE_FILE_NAME};
use crate::filter::{should_process, FilterResult};

/// Errors that can occur during directory walking.
#[derive(Debug, Error)]
pub enum WalkError {
    #[error("path not found: {path}")]
    NotFound { path: PathBuf },

    #[error("not a directory: {path}")]
    NotADirectory { path: PathBuf },

    #[error("permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Options for collecting files.
#[derive(Debug, Clone)]
pub struct WalkOptions {
    /// Glob patterns to include (default `*`).
    pub include: Vec<String>,
    /// Glob patterns to exclude.
    pub exclude: Vec<String>,
    /// Skip files larger than this many bytes.
    pub max_size: u64,
    /// Strict binary detection.
    pub binary_strict: bool,
    /// Respect .gitignore patterns.
    pub respect_gitignore: bool,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            include: vec!["*".to_string()],
            exclude: Vec::new(),
            max_size: DEFAULT_MAX_SIZE,
            binary_strict: true,
            respect_gitignore: true,
        }
    }
}

impl WalkOptions {
    /// Replace the include patterns.
    pub fn include<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the exclude patterns.
    pub fn exclude<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// Set the size cap.
    pub fn max_size(mut self, bytes: u64) -> Self {
        self.max_size = bytes;
        self
    }
}

/// A file that passed every filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    /// Path relative to the walk root.
    pub path: PathBuf,
    /// Size in bytes.
    pub size: u64,
}

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    // `*` crosses directory separators, like shell fnmatch.
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Normalize a user pattern and expand directory names to `dir/**`.
fn expand_pattern(root: &Path, pattern: &str) -> String {
    let mut pat = pattern.replace('\\', "/");
    while let Some(rest) = pat.strip_prefix("./") {
        pat = rest.to_string();
    }
    let pat = pat.trim_end_matches('/');

    if pat == "*" || pat == "**" {
        return pat.to_string();
    }
    if !pat.is_empty() && root.join(pat).is_dir() {
        return format!("{}/**", pat);
    }
    pat.to_string()
}

fn compile_patterns(root: &Path, patterns: &[String]) -> Vec<Pattern> {
    patterns
        .iter()
        .map(|p| expand_pattern(root, p))
        .filter_map(|p| match Pattern::new(&p) {
            Ok(pattern) => Some(pattern),
            Err(e) => {
                warn!("ignoring invalid glob {:?}: {}", p, e);
                None
            }
        })
        .collect()
}

fn matches_any(patterns: &[Pattern], rel: &str) -> bool {
    patterns.iter().any(|p| p.matches_with(rel, MATCH_OPTIONS))
}

/// `/`-separated form of a relative path, used for glob matching.
fn slash_path(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Collect readable, non-binary files under `root`, sorted by relative path.
///
/// # Examples
///
/// ```no_run
/// use repoflat::walker::{collect_files, WalkOptions};
/// use std::path::Path;
///
/// let files = collect_files(Path::new("."), &WalkOptions::default()).unwrap();
/// for file in files {
///     println!("{} ({} bytes)", file.path.display(), file.size);
/// }
/// ```
pub fn collect_files(root: &Path, options: &WalkOptions) -> Result<Vec<FileInfo>, WalkError> {
    if !root.exists() {
        return Err(WalkError::NotFound {
            path: root.to_path_buf(),
        });
    }
    if !root.is_dir() {
        return Err(WalkError::NotADirectory {
            path: root.to_path_buf(),
        });
    }
    if let Err(e) = std::fs::read_dir(root) {
        let path = root.to_path_buf();
        return Err(match e.kind() {
            std::io::ErrorKind::PermissionDenied => WalkError::PermissionDenied { path },
            _ => WalkError::Io { path, source: e },
        });
    }

    let include = compile_patterns(root, &options.include);
    let mut exclude = compile_patterns(root, &options.exclude);

    if root.join(".git").is_dir() {
        let git_included = options
            .include
            .iter()
            .any(|p| expand_pattern(root, p).starts_with(".git"));
        if !git_included {
            exclude.extend(Pattern::new(".git/**").ok());
        }
    }

    let mut builder = WalkBuilder::new(root);
    builder
        .hidden(false)
        .parents(false)
        .require_git(false)
        .git_ignore(options.respect_gitignore)
        .git_global(false)
        .git_exclude(options.respect_gitignore);

    let custom_ignore = root.join(IGNORE_FILE_NAME);
    if custom_ignore.exists() {
        if let Some(e) = builder.add_ignore(&custom_ignore) {
            warn!("failed to parse {}: {}", custom_ignore.display(), e);
        }
    }

    let mut files = Vec::new();

    for result in builder.build() {
        let entry = match result {
            Ok(entry) => entry,
            Err(ignore::Error::Io(e)) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                debug!("skipping unreadable entry: {}", e);
                continue;
            }
            Err(e) => {
                debug!("walk error: {}", e);
                continue;
            }
        };

        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }

        let path = entry.path();
        let rel = path.strip_prefix(root).unwrap_or(path);
        let rel_str = slash_path(rel);

        if !matches_any(&include, &rel_str) {
            continue;
        }
        if matches_any(&exclude, &rel_str) {
            debug!("excluded by pattern: {}", rel_str);
            continue;
        }

        let size = match entry.metadata() {
            Ok(meta) => meta.len(),
            Err(e) => {
                debug!("no metadata for {}: {}", rel_str, e);
                continue;
            }
        };
        if size > options.max_size {
            debug!("skipping {} ({} bytes > {})", rel_str, size, options.max_size);
            continue;
        }

        if let FilterResult::Reject(reason) = should_process(path, options.binary_strict) {
            debug!("skipping {}: {}", rel_str, reason);
            continue;
        }

        files.push(FileInfo {
            path: rel.to_path_buf(),
            size,
        });
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(files)
}
