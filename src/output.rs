//! Output rendering for dumps.
//!
//! Renders a [`Dump`] as plain text, JSON or a standalone HTML page, either
//! as one document or split into several documents under a token budget.

use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dump::{Dump, FileDump};

/// Errors that can occur during output formatting.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Output format selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown-ish text with `###` file headers (default).
    #[default]
    Text,
    /// JSON for programmatic access.
    Json,
    /// Standalone HTML page with collapsible files.
    Html,
}

impl OutputFormat {
    /// File extension for documents in this format.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Text => "txt",
            OutputFormat::Json => "json",
            OutputFormat::Html => "html",
        }
    }

    /// HTTP media type for documents in this format.
    pub fn media_type(&self) -> &'static str {
        match self {
            OutputFormat::Text => "text/plain; charset=utf-8",
            OutputFormat::Json => "application/json",
            OutputFormat::Html => "text/html; charset=utf-8",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Html => write!(f, "html"),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "html" => Ok(OutputFormat::Html),
            _ => Err(format!("unknown format: {}", s)),
        }
    }
}

/// The files of one output document.
struct Page<'a> {
    repo: &'a str,
    files: Vec<&'a FileDump>,
    total_tokens: usize,
}

impl<'a> Page<'a> {
    fn new(repo: &'a str, files: Vec<&'a FileDump>) -> Self {
        let total_tokens = files.iter().map(|f| f.tokens).sum();
        Self {
            repo,
            files,
            total_tokens,
        }
    }
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Render a whole dump as one document.
pub fn render(dump: &Dump, format: OutputFormat) -> Result<String, OutputError> {
    let page = Page::new(&dump.repo_name, dump.files.iter().collect());
    render_page(&page, format, &timestamp())
}

/// Render a dump as several documents of at most `split_tokens` tokens each.
///
/// Files are packed in order; a file larger than the budget gets a document
/// of its own. Returns `(file_name, content)` pairs named
/// `<repo>_<n>.<ext>` with `n` starting at 1.
pub fn render_split(
    dump: &Dump,
    split_tokens: usize,
    format: OutputFormat,
) -> Result<Vec<(String, String)>, OutputError> {
    let stamp = timestamp();
    chunk_files(&dump.files, split_tokens)
        .into_iter()
        .enumerate()
        .map(|(i, files)| {
            let page = Page::new(&dump.repo_name, files);
            let name = format!("{}_{}.{}", dump.repo_name, i + 1, format.extension());
            Ok((name, render_page(&page, format, &stamp)?))
        })
        .collect()
}

fn chunk_files(files: &[FileDump], split_tokens: usize) -> Vec<Vec<&FileDump>> {
    let mut chunks: Vec<Vec<&FileDump>> = Vec::new();
    let mut current: Vec<&FileDump> = Vec::new();
    let mut current_tokens = 0;

    for file in files {
        if !current.is_empty() && current_tokens + file.tokens > split_tokens {
            chunks.push(std::mem::take(&mut current));
            current_tokens = 0;
        }
        current_tokens += file.tokens;
        current.push(file);
    }

    if !current.is_empty() || chunks.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Write split documents into `dir`, returning the written paths.
pub fn write_split(dir: &Path, parts: &[(String, String)]) -> Result<Vec<PathBuf>, OutputError> {
    parts
        .iter()
        .map(|(name, content)| {
            let path = dir.join(name);
            std::fs::write(&path, content).map_err(|source| OutputError::Write {
                path: path.clone(),
                source,
            })?;
            Ok(path)
        })
        .collect()
}

fn render_page(page: &Page<'_>, format: OutputFormat, stamp: &str) -> Result<String, OutputError> {
    match format {
        OutputFormat::Text => Ok(render_text(page, stamp)),
        OutputFormat::Json => render_json(page, stamp),
        OutputFormat::Html => Ok(render_html(page, stamp)),
    }
}

// ============================================================================
// Text
// ============================================================================

fn render_text(page: &Page<'_>, stamp: &str) -> String {
    let capacity = page.files.iter().map(|f| f.content.len() + 64).sum::<usize>() + 128;
    let mut output = String::with_capacity(capacity);

    output.push_str(&format!("# Repoflat dump – {} – {}\n", page.repo, stamp));
    output.push_str(&format!("# ≈ {} tokens\n", page.total_tokens));
    for file in &page.files {
        output.push_str(&format!("\n### {}\n", file.display_path()));
        output.push_str(&file.content);
        output.push('\n');
    }
    output
}

// ============================================================================
// JSON
// ============================================================================

#[derive(Serialize)]
struct JsonDump<'a> {
    repo: &'a str,
    timestamp: &'a str,
    total_tokens: usize,
    files: Vec<JsonFile<'a>>,
}

#[derive(Serialize)]
struct JsonFile<'a> {
    path: String,
    contents: &'a str,
    tokens: usize,
    lines: usize,
}

fn render_json(page: &Page<'_>, stamp: &str) -> Result<String, OutputError> {
    let output = JsonDump {
        repo: page.repo,
        timestamp: stamp,
        total_tokens: page.total_tokens,
        files: page
            .files
            .iter()
            .map(|f| JsonFile {
                path: f.display_path(),
                contents: &f.content,
                tokens: f.tokens,
                lines: f.lines,
            })
            .collect(),
    };
    Ok(serde_json::to_string_pretty(&output)?)
}

// ============================================================================
// HTML
// ============================================================================

const HTML_STYLE: &str = r#"<style>
html { font-size:14px; font-family:ui-monospace, SFMono-Regular, Menlo, monospace; }
body { margin:0; background:#0d1117; color:#c9d1d9; }
.container { max-width:1100px; padding:2rem; margin:0 auto; display:flex; flex-direction:column; gap:1rem; }
.header-card, details.file-card { border:1px solid #30363d; border-radius:6px; box-shadow:0 2px 4px rgba(0,0,0,.6); background:#161b22; }
.header-card { padding:1rem 1.25rem; }
.header-card h1 { margin:0 0 .5rem; font-size:1.25rem; }
.header-card p { margin:0; color:#8b949e; font-size:.9rem; }
details.file-card summary { display:flex; align-items:center; gap:.75rem; padding:.8rem 1rem; cursor:pointer; list-style:none; }
details.file-card summary:hover { background:#21262d; }
details.file-card summary::-webkit-details-marker { display:none; }
.chevron { fill:#58a6ff; transition:transform .15s; flex:none; }
@media (prefers-reduced-motion: reduce) { .chevron { transition:none; } }
details.file-card[open] > summary .chevron { transform:rotate(90deg); }
summary:focus-visible { outline:2px solid #58a6ff; outline-offset:2px; }
.path { font-weight:bold; flex:1; overflow:hidden; text-overflow:ellipsis; white-space:nowrap; direction:rtl; }
.badge { font-size:.7rem; background:#238636; color:#fff; padding:.15rem .45rem; border-radius:9999px; }
details.file-card pre { background:#0d1117; padding:1rem 1.25rem; margin:0; overflow:auto; line-height:1.45; white-space:pre; border-top:1px solid #30363d; border-radius:0 0 6px 6px; }
@media (max-width:600px) { .container { padding:1rem; } }
</style>"#;

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn render_html(page: &Page<'_>, stamp: &str) -> String {
    let repo = escape_html(page.repo);
    let mut lines = vec![
        "<!DOCTYPE html>".to_string(),
        "<html lang=\"en\">".to_string(),
        "<head>".to_string(),
        "<meta charset=\"UTF-8\">".to_string(),
        "<meta name=\"viewport\" content=\"width=device-width,initial-scale=1\">".to_string(),
        format!("<title>{} dump</title>", repo),
        HTML_STYLE.to_string(),
        "</head>".to_string(),
        "<body>".to_string(),
        "<div class='container'>".to_string(),
        "<div class='header-card'>".to_string(),
        format!("<h1>Repoflat dump – {}</h1>", repo),
        format!("<p>{} · ≈ {} tokens</p>", stamp, page.total_tokens),
        "</div>".to_string(),
    ];

    for file in &page.files {
        lines.push("<details class='file-card'>".to_string());
        lines.push(format!(
            "<summary><svg class='chevron' width='10' height='10' viewBox='0 0 8 8' aria-hidden='true'><path d='M0 0 L6 4 L0 8z'/></svg><span class='path'>{}</span><span class='badge'>{} tokens</span></summary>",
            escape_html(&file.display_path()),
            file.tokens
        ));
        lines.push("<pre><code>".to_string());
        lines.push(escape_html(&file.content));
        lines.push("</code></pre>".to_string());
        lines.push("</details>".to_string());
    }
    lines.push("</div></body></html>".to_string());
    lines.join("\n")
}
