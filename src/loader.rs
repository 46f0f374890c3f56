//! File loading with lossy UTF-8 fallback.

use std::io;
use std::path::Path;

use log::debug;

use crate::comments::strip_comments_for_path;

/// Read a file as text, replacing invalid UTF-8 sequences with U+FFFD.
pub fn load_text(path: &Path) -> io::Result<String> {
    let bytes = std::fs::read(path)?;
    match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        Err(e) => {
            debug!("{} is not valid UTF-8, decoding lossily", path.display());
            Ok(String::from_utf8_lossy(e.as_bytes()).into_owned())
        }
    }
}

/// Read a file as text, optionally removing comments based on its extension.
pub fn load_source(path: &Path, exclude_comments: bool) -> io::Result<String> {
    let text = load_text(path)?;
    if exclude_comments {
        Ok(strip_comments_for_path(&text, path))
    } else {
        Ok(text)
    }
}
