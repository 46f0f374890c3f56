//! Binary file detection.
//!
//! A file is rejected when its extension names a known binary format, or
//! when a sample of its first bytes contains a NUL byte or (in strict mode)
//! too many non-printable bytes.

use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Number of leading bytes inspected.
pub const SAMPLE_SIZE: usize = 8192;

/// Strict mode rejects samples with more than this share of non-text bytes.
const NON_TEXT_RATIO: f64 = 0.30;

/// Extensions that are never text.
const BINARY_EXTENSIONS: &[&str] = &[
    // images
    "png", "jpg", "jpeg", "gif", "bmp", "ico", "webp", "tif", "tiff", "psd", "heic",
    // archives
    "zip", "gz", "tgz", "bz2", "xz", "zst", "7z", "rar", "tar", "jar", "war",
    // executables and objects
    "exe", "dll", "so", "dylib", "o", "a", "lib", "obj", "class", "pyc", "pyo", "wasm", "bin",
    // documents
    "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "odt",
    // fonts
    "ttf", "otf", "woff", "woff2", "eot",
    // media
    "mp3", "mp4", "wav", "ogg", "flac", "avi", "mov", "mkv", "webm",
    // databases
    "sqlite", "db",
];

/// Why a file was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    BinaryExtension,
    NulByte,
    NonText,
    Unreadable,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::BinaryExtension => write!(f, "binary extension"),
            RejectReason::NulByte => write!(f, "contains NUL byte"),
            RejectReason::NonText => write!(f, "mostly non-text bytes"),
            RejectReason::Unreadable => write!(f, "unreadable"),
        }
    }
}

/// Outcome of filtering a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterResult {
    Accept,
    Reject(RejectReason),
}

impl FilterResult {
    pub fn is_accept(&self) -> bool {
        matches!(self, FilterResult::Accept)
    }
}

fn has_binary_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| BINARY_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

/// Classify a byte sample taken from the start of a file.
pub fn classify_sample(sample: &[u8], strict: bool) -> FilterResult {
    if sample.contains(&0) {
        return FilterResult::Reject(RejectReason::NulByte);
    }

    if strict && !sample.is_empty() {
        let non_text = sample
            .iter()
            .filter(|&&b| !((32..=126).contains(&b) || matches!(b, b'\t' | b'\n' | b'\r')))
            .count();
        if non_text as f64 / sample.len() as f64 > NON_TEXT_RATIO {
            return FilterResult::Reject(RejectReason::NonText);
        }
    }

    FilterResult::Accept
}

/// Decide whether a file should be read as text.
pub fn should_process(path: &Path, strict: bool) -> FilterResult {
    if has_binary_extension(path) {
        return FilterResult::Reject(RejectReason::BinaryExtension);
    }

    let mut sample = Vec::with_capacity(SAMPLE_SIZE);
    let read = File::open(path).and_then(|file| file.take(SAMPLE_SIZE as u64).read_to_end(&mut sample));
    if read.is_err() {
        return FilterResult::Reject(RejectReason::Unreadable);
    }

    classify_sample(&sample, strict)
}

/// Return true if the file looks binary.
pub fn is_binary_path(path: &Path, strict: bool) -> bool {
    !should_process(path, strict).is_accept()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_text_and_nul() {
        let dir = TempDir::new().unwrap();
        let text = dir.path().join("a.txt");
        fs::write(&text, "hello").unwrap();
        let binary = dir.path().join("b.dat");
        fs::write(&binary, b"\0\x01").unwrap();

        assert!(!is_binary_path(&text, true));
        assert!(is_binary_path(&binary, true));
        assert!(is_binary_path(&binary, false));
    }

    #[test]
    fn test_high_bytes_only_rejected_when_strict() {
        let dir = TempDir::new().unwrap();
        let noisy = dir.path().join("noise.txt");
        let mut bytes = vec![0x80u8; 40];
        bytes.extend_from_slice(&[b'a'; 10]);
        fs::write(&noisy, bytes).unwrap();

        assert_eq!(
            should_process(&noisy, true),
            FilterResult::Reject(RejectReason::NonText)
        );
        assert!(!is_binary_path(&noisy, false));
    }

    #[test]
    fn test_code_files_are_text() {
        let dir = TempDir::new().unwrap();
        let cases = [
            ("main.rs", "fn main() {}"),
            ("lib.py", "def hello(): pass"),
            ("app.js", "console.log('hi');"),
            ("script.sh", "#!/bin/bash\necho hi"),
            ("config.toml", "[section]\nkey = \"value\""),
        ];
        for (name, content) in cases {
            let path = dir.path().join(name);
            fs::write(&path, content).unwrap();
            assert!(!is_binary_path(&path, true), "{name}");

            let nul = dir.path().join(format!("nul_{name}"));
            fs::write(&nul, b"\0null byte makes it binary").unwrap();
            assert!(is_binary_path(&nul, false), "nul_{name}");
        }
    }

    #[test]
    fn test_binary_extension_rejected_without_reading() {
        let dir = TempDir::new().unwrap();
        let png = dir.path().join("logo.PNG");
        fs::write(&png, "looks like text").unwrap();
        assert_eq!(
            should_process(&png, false),
            FilterResult::Reject(RejectReason::BinaryExtension)
        );
    }

    #[test]
    fn test_missing_file_is_unreadable() {
        assert_eq!(
            should_process(Path::new("/nonexistent/file.txt"), true),
            FilterResult::Reject(RejectReason::Unreadable)
        );
    }

    #[test]
    fn test_utf8_text_with_few_high_bytes_accepted() {
        assert!(classify_sample("mostly ascii with é".as_bytes(), true).is_accept());
        assert!(classify_sample(b"", true).is_accept());
    }
}
