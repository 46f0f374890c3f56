//! Remote repository download.
//!
//! Maps a repository URL to a zip archive URL, downloads it with retries and
//! extracts it into a temporary directory that lives as long as the returned
//! [`RemoteCheckout`].

use std::fs::{self, File};
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use log::{debug, info, warn};
use reqwest::header::{AUTHORIZATION, USER_AGENT};
use tempfile::TempDir;
use thiserror::Error;
use zip::ZipArchive;

const MAX_ATTEMPTS: u32 = 3;
const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that can occur while fetching a remote repository.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("unsupported host: {0}")]
    UnsupportedHost(String),

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to download {url} (HTTP {status})")]
    HttpStatus { url: String, status: u16 },

    #[error("invalid archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("subtree path '{0}' not found in repository")]
    SubtreeNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// An extracted repository. The files are removed when this is dropped.
#[derive(Debug)]
pub struct RemoteCheckout {
    _dir: TempDir,
    root: PathBuf,
}

impl RemoteCheckout {
    /// Directory to dump: the archive root, or the requested subtree.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Resolve a repository URL to an archive URL and an optional subtree.
///
/// # Examples
///
/// ```
/// use repoflat::remote::archive_url;
///
/// let (url, subtree) = archive_url("https://github.com/rust-lang/log").unwrap();
/// assert_eq!(url, "https://api.github.com/repos/rust-lang/log/zipball");
/// assert!(subtree.is_none());
/// ```
pub fn archive_url(url: &str) -> Result<(String, Option<String>), RemoteError> {
    if url.ends_with(".zip") {
        return Ok((url.to_string(), None));
    }

    let (host, path) = split_host(url);
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let path = path.strip_suffix(".git").unwrap_or(path);
    let slug = path.trim_matches('/');
    if slug.is_empty() {
        return Err(RemoteError::UnsupportedHost(url.to_string()));
    }

    if host.ends_with("github.com") {
        let parts: Vec<&str> = slug.split('/').collect();
        if parts.len() > 3 && parts[2] == "tree" {
            let (owner, repo, branch) = (parts[0], parts[1], parts[3]);
            let subtree = (parts.len() > 4).then(|| parts[4..].join("/"));
            return Ok((
                format!("https://api.github.com/repos/{owner}/{repo}/zipball/{branch}"),
                subtree,
            ));
        }
        return Ok((format!("https://api.github.com/repos/{slug}/zipball"), None));
    }

    if host.ends_with("gitlab.com") {
        let repo = slug.rsplit('/').next().unwrap_or(slug);
        return Ok((
            format!("https://gitlab.com/{slug}/-/archive/master/{repo}-master.zip"),
            None,
        ));
    }

    if host.ends_with("bitbucket.org") {
        return Ok((format!("https://bitbucket.org/{slug}/get/master.zip"), None));
    }

    Err(RemoteError::UnsupportedHost(host.to_string()))
}

/// Split a URL into host and path. Bare `owner/repo` slugs default to GitHub.
fn split_host(url: &str) -> (&str, &str) {
    if let Some((_, rest)) = url.split_once("://") {
        let (authority, path) = rest.split_at(rest.find('/').unwrap_or(rest.len()));
        let host = authority.rsplit('@').next().unwrap_or(authority);
        let host = host.split(':').next().unwrap_or(host);
        return (host, path);
    }

    // scp-like: git@github.com:owner/repo.git
    if url.contains('@') {
        if let Some((user_host, path)) = url.split_once(':') {
            let host = user_host.rsplit('@').next().unwrap_or(user_host);
            return (host, path);
        }
    }

    let path = url.strip_prefix("github.com/").unwrap_or(url);
    ("github.com", path)
}

fn authorization(archive_url: &str, token: &str) -> String {
    if archive_url.contains("github.com") {
        format!("token {token}")
    } else {
        format!("Bearer {token}")
    }
}

/// Download and extract a remote repository.
pub fn download_repo(url: &str, token: Option<&str>) -> Result<RemoteCheckout, RemoteError> {
    let (archive, subtree) = archive_url(url)?;
    info!("downloading {}", archive);
    let bytes = fetch(&archive, token)?;
    debug!("downloaded {} bytes from {}", bytes.len(), archive);
    extract(&bytes, subtree.as_deref())
}

/// GET with up to [`MAX_ATTEMPTS`] tries; only 5xx responses and transport
/// errors are retried.
fn fetch(url: &str, token: Option<&str>) -> Result<Vec<u8>, RemoteError> {
    let transport = |source| RemoteError::Transport {
        url: url.to_string(),
        source,
    };

    let client = reqwest::blocking::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(transport)?;

    let mut attempt = 1;
    let mut backoff = INITIAL_BACKOFF;
    loop {
        let mut request = client
            .get(url)
            .header(USER_AGENT, concat!("repoflat/", env!("CARGO_PKG_VERSION")));
        if let Some(token) = token {
            request = request.header(AUTHORIZATION, authorization(url, token));
        }

        let result = request.send();
        let retryable = match &result {
            Ok(response) => response.status().is_server_error(),
            Err(_) => true,
        };
        if retryable && attempt < MAX_ATTEMPTS {
            match &result {
                Ok(response) => debug!("attempt {} got HTTP {}, retrying", attempt, response.status()),
                Err(e) => debug!("attempt {} failed: {}, retrying", attempt, e),
            }
            thread::sleep(backoff);
            backoff *= 2;
            attempt += 1;
            continue;
        }

        let response = result.map_err(transport)?;
        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            return Err(RemoteError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        return response.bytes().map(|b| b.to_vec()).map_err(transport);
    }
}

/// Extract a zip archive into a fresh temporary directory.
fn extract(bytes: &[u8], subtree: Option<&str>) -> Result<RemoteCheckout, RemoteError> {
    let dir = TempDir::new()?;
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let Some(rel) = entry.enclosed_name() else {
            warn!("skipping archive entry outside the extraction directory: {}", entry.name());
            continue;
        };
        let out = dir.path().join(&rel);

        if entry.is_dir() {
            fs::create_dir_all(&out)?;
            continue;
        }
        if let Some(parent) = out.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = File::create(&out)?;
        io::copy(&mut entry, &mut file)?;
    }

    let entries = fs::read_dir(dir.path())?.collect::<Result<Vec<_>, _>>()?;
    let mut root = match entries.as_slice() {
        [only] if only.path().is_dir() => only.path(),
        _ => dir.path().to_path_buf(),
    };

    if let Some(sub) = subtree {
        root = root.join(sub);
        if !root.exists() {
            return Err(RemoteError::SubtreeNotFound(sub.to_string()));
        }
    }

    Ok(RemoteCheckout { _dir: dir, root })
}
