//! Approximate token counting for output size budgets.
//!
//! Counts with a tiktoken BPE when one can be built, otherwise with a
//! ~4 characters per token estimate. Counting never fails.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use tiktoken_rs::CoreBPE;

/// BPE vocabulary used for counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Encoding {
    /// cl100k_base: GPT-4, GPT-3.5-turbo
    #[default]
    #[serde(alias = "cl100k")]
    Cl100kBase,
    /// o200k_base: GPT-4o
    #[serde(alias = "o200k")]
    O200kBase,
}

impl std::fmt::Display for Encoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Encoding::Cl100kBase => write!(f, "cl100k_base"),
            Encoding::O200kBase => write!(f, "o200k_base"),
        }
    }
}

impl std::str::FromStr for Encoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cl100k" | "cl100k_base" => Ok(Encoding::Cl100kBase),
            "o200k" | "o200k_base" => Ok(Encoding::O200kBase),
            _ => Err(format!("unknown encoding: {}", s)),
        }
    }
}

static CL100K: OnceLock<Option<CoreBPE>> = OnceLock::new();
static O200K: OnceLock<Option<CoreBPE>> = OnceLock::new();

fn bpe(encoding: Encoding) -> Option<&'static CoreBPE> {
    match encoding {
        Encoding::Cl100kBase => CL100K
            .get_or_init(|| tiktoken_rs::cl100k_base().ok())
            .as_ref(),
        Encoding::O200kBase => O200K
            .get_or_init(|| tiktoken_rs::o200k_base().ok())
            .as_ref(),
    }
}

/// Character-based estimate: ~4 bytes per token, rounded up.
pub fn approximate_tokens(text: &str) -> usize {
    text.len().div_ceil(4)
}

/// Count tokens with the default encoding.
///
/// # Examples
///
/// ```
/// use repoflat::tokens::count_tokens;
///
/// assert!(count_tokens("Hello, world!") > 0);
/// assert_eq!(count_tokens(""), 0);
/// ```
pub fn count_tokens(text: &str) -> usize {
    count_tokens_with_encoding(text, Encoding::default())
}

/// Count tokens with the given encoding, falling back to [`approximate_tokens`].
pub fn count_tokens_with_encoding(text: &str, encoding: Encoding) -> usize {
    TokenCounter::new(encoding).count(text)
}

/// Token counter bound to one encoding.
///
/// Cheap to copy into parallel workers; the BPE tables are shared.
#[derive(Clone, Copy)]
pub struct TokenCounter {
    encoding: Encoding,
    bpe: Option<&'static CoreBPE>,
}

impl TokenCounter {
    pub fn new(encoding: Encoding) -> Self {
        Self {
            encoding,
            bpe: bpe(encoding),
        }
    }

    /// Count tokens in `text`.
    pub fn count(&self, text: &str) -> usize {
        match self.bpe {
            Some(bpe) => bpe.encode_ordinary(text).len(),
            None => approximate_tokens(text),
        }
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }
}

impl Default for TokenCounter {
    fn default() -> Self {
        Self::new(Encoding::default())
    }
}

impl std::fmt::Debug for TokenCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCounter")
            .field("encoding", &self.encoding)
            .field("bpe", &self.bpe.is_some())
            .finish()
    }
}
