//! SQL: `/* */` block comments, then `--` line comments.
//!
//! Strings (`'...'`) and quoted identifiers (`"..."`) escape their delimiter
//! by doubling it, so `'it''s'` is one literal. Backslash has no meaning.

use super::block::remove_delimited;

pub(crate) fn strip_sql(text: &str) -> String {
    // Block comments go first and without literal tracking: a `/*` inside a
    // string literal is still treated as a comment opener.
    let text = remove_delimited(text, "/*", "*/");

    let mut out = String::with_capacity(text.len());
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(strip_line(line));
    }
    out
}

fn strip_line(line: &str) -> &str {
    match find_outside_string_sql(line, "--") {
        Some(pos) => line[..pos].trim_end(),
        None => line,
    }
}

/// Like `literal::find_outside_string`, but with SQL's doubled-quote escapes.
fn find_outside_string_sql(line: &str, pattern: &str) -> Option<usize> {
    let bytes = line.as_bytes();
    let pattern = pattern.as_bytes();
    let mut in_single = false;
    let mut in_double = false;
    let mut i = 0;

    while i < bytes.len() {
        let next = bytes.get(i + 1).copied();
        match bytes[i] {
            b'\'' if !in_double => {
                if in_single && next == Some(b'\'') {
                    i += 2;
                    continue;
                }
                in_single = !in_single;
            }
            b'"' if !in_single => {
                if in_double && next == Some(b'"') {
                    i += 2;
                    continue;
                }
                in_double = !in_double;
            }
            _ if !in_single && !in_double && bytes[i..].starts_with(pattern) => return Some(i),
            _ => {}
        }
        i += 1;
    }

    None
}
