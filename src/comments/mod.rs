//! Comment stripping for source files.
//!
//! Each file is mapped to a [`SyntaxFamily`] by its extension, and each
//! family to one single-pass scanner that removes comments while tracking
//! enough literal state to leave comment-like text inside strings alone.
//! No scanner parses the language or validates syntax; malformed input such
//! as an unterminated block comment is handled by consuming to the end.
//!
//! | Family | Line comment | Block comment | Literal tracking |
//! |---|---|---|---|
//! | `HashLine` | `#` | - | `'` `"` with backslash escapes, per line |
//! | `CStyle` | `//` | `/* */` | `'` `"` with backslash escapes, whole text |
//! | `HtmlBlock` | - | `<!-- -->` | none |
//! | `CssBlock` | - | `/* */` | `'` `"` with backslash escapes |
//! | `SqlMixed` | `--` | `/* */` | `'` `"` with doubled-quote escapes, line pass only |
//! | `LuaMixed` | `--` | `--[[ ]]` | line pass only |
//! | `HaskellMixed` | `--` | `{- -}` | line pass only |
//! | `LispLine` | `;` | - | `"` with backslash escapes, per line |
//!
//! # Examples
//!
//! ```
//! use repoflat::comments::{strip_comments, SyntaxFamily};
//!
//! let code = "let s = \"// kept\"; // dropped";
//! assert_eq!(strip_comments(code, SyntaxFamily::CStyle), "let s = \"// kept\"; ");
//! ```

mod block;
mod line;
mod literal;
mod sql;

use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

/// A group of languages sharing one comment syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyntaxFamily {
    /// `#` line comments: Python, Ruby, shell, YAML, TOML, INI, R, Perl, Tcl.
    HashLine,
    /// `//` and `/* */`: C, C++, Java, JS/TS, Go, Rust, C#, Swift, Kotlin, Scala, Obj-C, PHP, Dart.
    CStyle,
    /// `<!-- -->`: HTML, XML, SVG.
    HtmlBlock,
    /// `/* */` only: CSS, SCSS, Sass, Less.
    CssBlock,
    /// `--` and `/* */`.
    SqlMixed,
    /// `--` and `--[[ ]]`.
    LuaMixed,
    /// `--` and `{- -}`.
    HaskellMixed,
    /// `;` line comments: Common Lisp, Emacs Lisp, Scheme, Clojure.
    LispLine,
    /// No known comment syntax; text passes through unchanged.
    Plain,
}

impl SyntaxFamily {
    /// All families that strip something, in table order.
    pub fn all() -> &'static [SyntaxFamily] {
        &[
            SyntaxFamily::HashLine,
            SyntaxFamily::CStyle,
            SyntaxFamily::HtmlBlock,
            SyntaxFamily::CssBlock,
            SyntaxFamily::SqlMixed,
            SyntaxFamily::LuaMixed,
            SyntaxFamily::HaskellMixed,
            SyntaxFamily::LispLine,
        ]
    }

    /// File extensions (lowercase, without the dot) mapped to this family.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            SyntaxFamily::HashLine => &[
                "py", "pyw", "rb", "sh", "bash", "zsh", "yml", "yaml", "toml", "conf", "ini", "r",
                "pl", "tcl",
            ],
            SyntaxFamily::CStyle => &[
                "c", "h", "cpp", "hpp", "cc", "cxx", "java", "js", "jsx", "ts", "tsx", "go", "rs",
                "cs", "swift", "kt", "kts", "scala", "m", "mm", "php", "dart",
            ],
            SyntaxFamily::HtmlBlock => &["html", "htm", "xml", "svg", "xhtml"],
            SyntaxFamily::CssBlock => &["css", "scss", "sass", "less"],
            SyntaxFamily::SqlMixed => &["sql"],
            SyntaxFamily::LuaMixed => &["lua"],
            SyntaxFamily::HaskellMixed => &["hs", "lhs"],
            SyntaxFamily::LispLine => &["lisp", "cl", "el", "scm", "clj", "cljs"],
            SyntaxFamily::Plain => &[],
        }
    }

    /// Look up a family by extension (case-insensitive, no leading dot).
    pub fn from_extension(ext: &str) -> SyntaxFamily {
        extension_table()
            .get(ext.to_ascii_lowercase().as_str())
            .copied()
            .unwrap_or(SyntaxFamily::Plain)
    }
}

impl std::fmt::Display for SyntaxFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SyntaxFamily::HashLine => "hash",
            SyntaxFamily::CStyle => "c-style",
            SyntaxFamily::HtmlBlock => "html",
            SyntaxFamily::CssBlock => "css",
            SyntaxFamily::SqlMixed => "sql",
            SyntaxFamily::LuaMixed => "lua",
            SyntaxFamily::HaskellMixed => "haskell",
            SyntaxFamily::LispLine => "lisp",
            SyntaxFamily::Plain => "plain",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for SyntaxFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "hash" | "hash-line" => Ok(SyntaxFamily::HashLine),
            "c" | "c-style" | "cstyle" => Ok(SyntaxFamily::CStyle),
            "html" | "xml" => Ok(SyntaxFamily::HtmlBlock),
            "css" => Ok(SyntaxFamily::CssBlock),
            "sql" => Ok(SyntaxFamily::SqlMixed),
            "lua" => Ok(SyntaxFamily::LuaMixed),
            "haskell" => Ok(SyntaxFamily::HaskellMixed),
            "lisp" => Ok(SyntaxFamily::LispLine),
            "plain" | "none" => Ok(SyntaxFamily::Plain),
            _ => Err(format!("unknown syntax family: {}", s)),
        }
    }
}

// Built on first use, read-only afterwards.
static EXTENSIONS: OnceLock<HashMap<&'static str, SyntaxFamily>> = OnceLock::new();

fn extension_table() -> &'static HashMap<&'static str, SyntaxFamily> {
    EXTENSIONS.get_or_init(|| {
        SyntaxFamily::all()
            .iter()
            .flat_map(|family| family.extensions().iter().map(move |ext| (*ext, *family)))
            .collect()
    })
}

/// Determine the syntax family of a file from its extension.
///
/// Files without an extension, or with an unknown one, are [`SyntaxFamily::Plain`].
pub fn syntax_family_of(path: &Path) -> SyntaxFamily {
    path.extension()
        .and_then(|e| e.to_str())
        .map_or(SyntaxFamily::Plain, SyntaxFamily::from_extension)
}

/// Remove comments from `text` according to `family`.
///
/// Never fails. [`SyntaxFamily::Plain`] returns the text unchanged.
pub fn strip_comments(text: &str, family: SyntaxFamily) -> String {
    match family {
        SyntaxFamily::HashLine => line::strip_hash(text),
        SyntaxFamily::CStyle => block::strip_c_style(text),
        SyntaxFamily::HtmlBlock => block::strip_html(text),
        SyntaxFamily::CssBlock => block::strip_css(text),
        SyntaxFamily::SqlMixed => sql::strip_sql(text),
        SyntaxFamily::LuaMixed => {
            line::strip_double_dash(&block::remove_delimited(text, "--[[", "]]"))
        }
        SyntaxFamily::HaskellMixed => {
            line::strip_double_dash(&block::remove_delimited(text, "{-", "-}"))
        }
        SyntaxFamily::LispLine => line::strip_lisp(text),
        SyntaxFamily::Plain => text.to_string(),
    }
}

/// Remove comments from `text`, choosing the family from `path`.
pub fn strip_comments_for_path(text: &str, path: &Path) -> String {
    strip_comments(text, syntax_family_of(path))
}
