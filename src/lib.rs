//! Repoflat - Flatten a repository into a single LLM-ready document.
//!
//! Repoflat walks a local directory (or a downloaded remote archive), keeps
//! the text files that pass the include/exclude globs, ignore files and the
//! binary filter, optionally strips comments, counts tokens and renders the
//! result as text, JSON or HTML.
//!
//! # Quick Start
//!
//! ```no_run
//! use repoflat::dump::Repoflat;
//! use repoflat::output::OutputFormat;
//!
//! let dump = Repoflat::new("./my-project")
//!     .exclude(["target", "*.lock"])
//!     .exclude_comments(true)
//!     .max_tokens(100_000)
//!     .build()
//!     .unwrap();
//!
//! println!("{}", dump.render(OutputFormat::Text).unwrap());
//! ```
//!
//! # Modules
//!
//! - [`comments`] - Comment stripping per syntax family
//! - [`tokens`] - Token counting for LLM context budgets
//! - [`filter`] - Binary file detection
//! - [`walker`] - Directory traversal with gitignore support
//! - [`loader`] - Text loading with lossy UTF-8 fallback
//! - [`dump`] - Fluent API for building dumps
//! - [`output`] - Text, JSON and HTML rendering
//! - [`remote`] - Remote repository download
//! - [`server`] - HTTP front end

pub mod comments;
pub mod config;
pub mod tokens;
pub mod filter;
pub mod errors;
pub mod walker;
pub mod loader;
pub mod dump;
pub mod output;
pub mod remote;
pub mod server;

// Re-export key types at crate root for convenience
pub use comments::{strip_comments, strip_comments_for_path, syntax_family_of, SyntaxFamily};
pub use config::DumpOptions;
pub use dump::{dump_repo, dump_repo_split, Dump, FileDump, Repoflat};
pub use errors::RepoflatError;
pub use output::{OutputError, OutputFormat};
pub use remote::RemoteError;
pub use tokens::{count_tokens, Encoding, TokenCounter};
pub use walker::WalkError;
