//! Fluent builder API for repoflat.
//!
//! Collects files, loads them in parallel, counts tokens and applies the
//! token budget. Rendering lives in [`crate::output`].

use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use rayon::prelude::*;

use crate::config::DumpOptions;
use crate::errors::RepoflatError;
use crate::loader::load_source;
use crate::output::{self, OutputFormat};
use crate::remote::download_repo;
use crate::tokens::{Encoding, TokenCounter};
use crate::walker::{collect_files, FileInfo, WalkOptions};

/// One file of a dump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDump {
    /// Path relative to the dump root.
    pub path: PathBuf,
    /// Size on disk in bytes.
    pub size: u64,
    /// Loaded text, with comments removed if requested.
    pub content: String,
    pub tokens: usize,
    pub lines: usize,
}

impl FileDump {
    /// Relative path with `/` separators.
    pub fn display_path(&self) -> String {
        self.path
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// The files of a repository, ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dump {
    pub repo_name: String,
    /// Sorted by relative path.
    pub files: Vec<FileDump>,
    pub total_tokens: usize,
}

impl Dump {
    pub fn new(repo_name: impl Into<String>, files: Vec<FileDump>) -> Self {
        let total_tokens = files.iter().map(|f| f.tokens).sum();
        Self {
            repo_name: repo_name.into(),
            files,
            total_tokens,
        }
    }

    /// Drop the largest files until the total fits `limit`.
    ///
    /// Ties go to the lexicographically greatest path. Remaining files keep
    /// their order. Returns the dropped files.
    pub fn truncate(&mut self, limit: usize) -> Vec<FileDump> {
        let mut dropped = Vec::new();
        while self.total_tokens > limit {
            let Some(index) = self
                .files
                .iter()
                .enumerate()
                .max_by(|(_, a), (_, b)| a.tokens.cmp(&b.tokens).then_with(|| a.path.cmp(&b.path)))
                .map(|(i, _)| i)
            else {
                break;
            };
            let file = self.files.remove(index);
            self.total_tokens -= file.tokens;
            debug!("dropped {} ({} tokens) to fit budget", file.display_path(), file.tokens);
            dropped.push(file);
        }
        dropped
    }

    /// Render the whole dump in `format`.
    pub fn render(&self, format: OutputFormat) -> Result<String, RepoflatError> {
        Ok(output::render(self, format)?)
    }

    /// Render the dump as several documents of at most `split_tokens` tokens.
    pub fn render_split(
        &self,
        split_tokens: usize,
        format: OutputFormat,
    ) -> Result<Vec<(String, String)>, RepoflatError> {
        Ok(output::render_split(self, split_tokens, format)?)
    }
}

/// Builder for dumping a repository.
///
/// # Examples
///
/// ```no_run
/// use repoflat::dump::Repoflat;
///
/// let dump = Repoflat::new("./project")
///     .include(["*.rs"])
///     .exclude_comments(true)
///     .max_tokens(50_000)
///     .build()
///     .unwrap();
/// println!("{} files, {} tokens", dump.files.len(), dump.total_tokens);
/// ```
pub struct Repoflat {
    root: PathBuf,
    options: DumpOptions,
}

impl Repoflat {
    /// Create a new builder for the given root path.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            options: DumpOptions::default(),
        }
    }

    /// Replace all options at once.
    pub fn options(mut self, options: DumpOptions) -> Self {
        self.options = options;
        self
    }

    pub fn include<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.include = patterns.into_iter().map(Into::into).collect();
        self
    }

    pub fn exclude<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.exclude = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// Skip files larger than `bytes`.
    pub fn max_size(mut self, bytes: u64) -> Self {
        self.options.max_size = bytes;
        self
    }

    /// Drop the largest files until the dump fits `tokens`.
    pub fn max_tokens(mut self, tokens: usize) -> Self {
        self.options.max_tokens = Some(tokens);
        self
    }

    pub fn binary_strict(mut self, strict: bool) -> Self {
        self.options.binary_strict = strict;
        self
    }

    /// Strip comments from recognised source files.
    pub fn exclude_comments(mut self, exclude: bool) -> Self {
        self.options.exclude_comments = exclude;
        self
    }

    pub fn respect_gitignore(mut self, respect: bool) -> Self {
        self.options.respect_gitignore = respect;
        self
    }

    /// Tokenizer used for counting.
    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.options.encoding = encoding;
        self
    }

    /// Walk, load and count. Applies the token budget if one is set.
    pub fn build(self) -> Result<Dump, RepoflatError> {
        let walk_options = WalkOptions {
            include: self.options.include.clone(),
            exclude: self.options.exclude.clone(),
            max_size: self.options.max_size,
            binary_strict: self.options.binary_strict,
            respect_gitignore: self.options.respect_gitignore,
        };
        let files = collect_files(&self.root, &walk_options)?;
        info!("collected {} files from {}", files.len(), self.root.display());

        let counter = TokenCounter::new(self.options.encoding);
        let loaded = load_files_parallel(&self.root, files, self.options.exclude_comments, counter);

        let mut dump = Dump::new(repo_name(&self.root), loaded);
        if let Some(limit) = self.options.max_tokens {
            let dropped = dump.truncate(limit);
            if !dropped.is_empty() {
                info!(
                    "dropped {} files to fit {} tokens ({} remain)",
                    dropped.len(),
                    limit,
                    dump.total_tokens
                );
            }
        }
        Ok(dump)
    }
}

/// Last component of the canonicalised root.
fn repo_name(root: &Path) -> String {
    let resolved = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
    resolved
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "repo".to_string())
}

/// Load and count files in parallel, returning them sorted by path.
fn load_files_parallel(
    root: &Path,
    files: Vec<FileInfo>,
    exclude_comments: bool,
    counter: TokenCounter,
) -> Vec<FileDump> {
    let mut loaded: Vec<FileDump> = files
        .into_par_iter()
        .map(|info| {
            let content = match load_source(&root.join(&info.path), exclude_comments) {
                Ok(content) => content,
                Err(e) => {
                    warn!("could not read {}: {}", info.path.display(), e);
                    String::new()
                }
            };
            FileDump {
                tokens: counter.count(&content),
                lines: count_lines(&content),
                path: info.path,
                size: info.size,
                content,
            }
        })
        .collect();

    loaded.sort_by(|a, b| a.path.cmp(&b.path));
    loaded
}

fn count_lines(content: &str) -> usize {
    if content.is_empty() {
        return 0;
    }
    let newlines = bytecount::count(content.as_bytes(), b'\n');
    if content.ends_with('\n') {
        newlines
    } else {
        newlines + 1
    }
}

// ============================================================================
// Functional API
// ============================================================================

/// Dump a local directory or remote repository URL as one document.
///
/// `source` is treated as a local path if it exists, otherwise as a URL.
///
/// # Examples
///
/// ```no_run
/// use repoflat::config::DumpOptions;
/// use repoflat::dump::dump_repo;
///
/// let text = dump_repo("./project", &DumpOptions::default()).unwrap();
/// println!("{}", text);
/// ```
pub fn dump_repo(source: &str, options: &DumpOptions) -> Result<String, RepoflatError> {
    let dump = build_dump(source, options)?;
    dump.render(options.format)
}

/// Dump a local directory or remote repository URL as several documents of
/// at most `split_tokens` tokens, returned as `(file_name, content)` pairs.
pub fn dump_repo_split(
    source: &str,
    split_tokens: usize,
    options: &DumpOptions,
) -> Result<Vec<(String, String)>, RepoflatError> {
    let dump = build_dump(source, options)?;
    dump.render_split(split_tokens, options.format)
}

fn build_dump(source: &str, options: &DumpOptions) -> Result<Dump, RepoflatError> {
    let path = Path::new(source);
    if path.exists() {
        return Repoflat::new(path).options(options.clone()).build();
    }

    let checkout = download_repo(source, options.private_token.as_deref())?;
    Repoflat::new(checkout.root())
        .options(options.clone())
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_project() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(
            dir.path().join("src/main.py"),
            "# entry point\nprint('hi')  # greet\n",
        )
        .unwrap();
        fs::write(dir.path().join("README.md"), "# Demo\n\nSome text.\n").unwrap();
        fs::write(dir.path().join("data.bin"), b"\0\x01\x02").unwrap();
        dir
    }

    fn file(path: &str, tokens: usize) -> FileDump {
        FileDump {
            path: PathBuf::from(path),
            size: 0,
            content: String::new(),
            tokens,
            lines: 0,
        }
    }

    fn paths(dump: &Dump) -> Vec<String> {
        dump.files.iter().map(|f| f.display_path()).collect()
    }

    #[test]
    fn test_builder_collects_sorted_text_files() {
        let dir = create_test_project();
        let dump = Repoflat::new(dir.path()).build().unwrap();

        assert_eq!(paths(&dump), vec!["README.md", "src/main.py"]);
        assert_eq!(dump.total_tokens, dump.files.iter().map(|f| f.tokens).sum::<usize>());
        assert!(dump.files.iter().all(|f| f.tokens > 0));
        assert_eq!(dump.files[1].lines, 2);
    }

    #[test]
    fn test_repo_name_is_root_basename() {
        let dir = create_test_project();
        let dump = Repoflat::new(dir.path()).build().unwrap();
        let expected = dir.path().canonicalize().unwrap();
        assert_eq!(
            dump.repo_name,
            expected.file_name().unwrap().to_string_lossy()
        );
    }

    #[test]
    fn test_exclude_comments() {
        let dir = create_test_project();
        let dump = Repoflat::new(dir.path())
            .include(["*.py"])
            .exclude_comments(true)
            .build()
            .unwrap();
        assert_eq!(dump.files.len(), 1);
        assert_eq!(dump.files[0].content, "\nprint('hi')\n");
    }

    #[test]
    fn test_truncate_drops_largest_first() {
        let mut dump = Dump::new(
            "demo",
            vec![file("a", 10), file("b", 50), file("c", 20), file("d", 50)],
        );
        let dropped = dump.truncate(40);
        let dropped: Vec<String> = dropped.iter().map(|f| f.display_path()).collect();
        assert_eq!(dropped, vec!["d", "b"]);
        assert_eq!(paths(&dump), vec!["a", "c"]);
        assert_eq!(dump.total_tokens, 30);
    }

    #[test]
    fn test_truncate_within_budget_is_noop() {
        let mut dump = Dump::new("demo", vec![file("a", 10), file("b", 5)]);
        assert!(dump.truncate(15).is_empty());
        assert_eq!(dump.files.len(), 2);
    }

    #[test]
    fn test_truncate_to_zero_empties_dump() {
        let mut dump = Dump::new("demo", vec![file("a", 1), file("b", 1)]);
        dump.truncate(0);
        assert!(dump.files.is_empty());
        assert_eq!(dump.total_tokens, 0);
    }

    #[test]
    fn test_max_tokens_applied_by_builder() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("small.txt"), "tiny").unwrap();
        fs::write(dir.path().join("large.txt"), "word ".repeat(500)).unwrap();

        let dump = Repoflat::new(dir.path()).max_tokens(50).build().unwrap();
        assert_eq!(paths(&dump), vec!["small.txt"]);
        assert!(dump.total_tokens <= 50);
    }

    #[test]
    fn test_count_lines() {
        assert_eq!(count_lines(""), 0);
        assert_eq!(count_lines("a"), 1);
        assert_eq!(count_lines("a\n"), 1);
        assert_eq!(count_lines("a\nb"), 2);
    }

    #[test]
    fn test_functional_api_local() {
        let dir = create_test_project();
        let source = dir.path().to_string_lossy().into_owned();

        let text = dump_repo(&source, &DumpOptions::default()).unwrap();
        assert!(text.contains("### src/main.py"));
        assert!(!text.contains("data.bin"));

        let parts = dump_repo_split(&source, 1, &DumpOptions::default()).unwrap();
        assert_eq!(parts.len(), 2);
        assert!(parts[0].0.ends_with("_1.txt"));
    }

    #[test]
    fn test_unknown_source_is_treated_as_remote() {
        let result = dump_repo("https://example.com/owner/repo", &DumpOptions::default());
        assert!(matches!(result, Err(RepoflatError::Remote(_))));
    }
}
