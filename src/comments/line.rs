//! Line-oriented scanners: hash (`#`), Lisp (`;`) and the `--` line pass
//! used by Lua and Haskell.
//!
//! Each physical line is scanned on its own with fresh literal state, so a
//! literal never continues onto the next line. Lines are never removed, only
//! cut short and right-trimmed.

use super::literal::{find_outside_string, LiteralState};

/// Strip `#` comments (Python, Ruby, shell, YAML, TOML, ...).
pub(crate) fn strip_hash(text: &str) -> String {
    strip_lines(text, "#", LiteralState::new)
}

/// Strip `;` comments. Only `"..."` strings are literals in Lisp.
pub(crate) fn strip_lisp(text: &str) -> String {
    strip_lines(text, ";", LiteralState::double_only)
}

/// Strip `--` line comments with single and double quote tracking.
pub(crate) fn strip_double_dash(text: &str) -> String {
    strip_lines(text, "--", LiteralState::new)
}

fn strip_lines(text: &str, marker: &str, fresh: fn() -> LiteralState) -> String {
    let mut out = String::with_capacity(text.len());
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let code = match find_outside_string(line, marker, fresh()) {
            // Markers are ASCII, so the offset is a char boundary.
            Some(pos) => &line[..pos],
            None => line,
        };
        out.push_str(code.trim_end());
    }
    out
}
