//! Whole-text scanners for languages with block comments.
//!
//! Unlike the line scanners these run once over the entire input, so a block
//! comment can span lines. A block comment that is never closed swallows the
//! rest of the input.

use memchr::{memchr, memmem};

use super::literal::{LiteralState, Step};

/// Strip `//` and `/* */` comments from C-family source.
///
/// `//` comments keep their terminating newline. Newlines inside `/* */` are
/// removed together with the comment. String and character literals are
/// copied through byte-for-byte, comment markers included.
pub(crate) fn strip_c_style(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut state = LiteralState::new();
    // Start of the run of bytes not yet copied to `out`.
    let mut kept_from = 0;
    let mut i = 0;

    while i < bytes.len() {
        if state.advance(bytes[i]) == Step::Literal || bytes[i] != b'/' {
            i += 1;
            continue;
        }

        match bytes.get(i + 1) {
            Some(b'/') => {
                out.push_str(&text[kept_from..i]);
                // Resume at the newline so it is kept.
                i = find_byte(bytes, i + 2, b'\n').unwrap_or(bytes.len());
                kept_from = i;
            }
            Some(b'*') => {
                out.push_str(&text[kept_from..i]);
                i = find(bytes, i + 2, b"*/").map_or(bytes.len(), |end| end + 2);
                kept_from = i;
            }
            _ => i += 1,
        }
    }

    out.push_str(&text[kept_from..]);
    out
}

/// Strip `/* */` comments from stylesheets while respecting quoted strings.
///
/// There is no `//` comment form in CSS, so `//` is always kept.
pub(crate) fn strip_css(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut in_single = false;
    let mut in_double = false;
    let mut kept_from = 0;
    let mut i = 0;

    while i < bytes.len() {
        let in_string = in_single || in_double;
        match bytes[i] {
            b'/' if !in_string && bytes.get(i + 1) == Some(&b'*') => {
                out.push_str(&text[kept_from..i]);
                i = find(bytes, i + 2, b"*/").map_or(bytes.len(), |end| end + 2);
                kept_from = i;
            }
            // Escape inside a string: keep the backslash and whatever follows.
            b'\\' if in_string && i + 1 < bytes.len() => i += 2,
            b'\'' if !in_double => {
                in_single = !in_single;
                i += 1;
            }
            b'"' if !in_single => {
                in_double = !in_double;
                i += 1;
            }
            _ => i += 1,
        }
    }

    out.push_str(&text[kept_from..]);
    out
}

/// Strip `<!-- -->` comments from markup.
pub(crate) fn strip_html(text: &str) -> String {
    remove_delimited(text, "<!--", "-->")
}

/// Remove every non-overlapping `open ... close` span, closing at the first
/// `close` after each `open`. Literals are not tracked. An unclosed span
/// runs to the end of the input.
pub(crate) fn remove_delimited(text: &str, open: &str, close: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut pos = 0;

    while let Some(start) = find(bytes, pos, open.as_bytes()) {
        out.push_str(&text[pos..start]);
        match find(bytes, start + open.len(), close.as_bytes()) {
            Some(end) => pos = end + close.len(),
            None => return out,
        }
    }

    out.push_str(&text[pos..]);
    out
}

/// Index of the first occurrence of `needle` at or after `from`.
fn find(haystack: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return None;
    }
    memmem::find(haystack.get(from..)?, needle).map(|offset| from + offset)
}

fn find_byte(haystack: &[u8], from: usize, needle: u8) -> Option<usize> {
    memchr(needle, haystack.get(from..)?).map(|offset| from + offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_c_line_comment_keeps_newline() {
        let input = "// header\nint x = 5; // inline\nreturn x;";
        assert_eq!(strip_c_style(input), "\nint x = 5; \nreturn x;");
    }

    #[test]
    fn test_c_block_comment_removes_newlines() {
        let input = "a;\n/* Multi-line\n   comment */\nb;";
        assert_eq!(strip_c_style(input), "a;\n\nb;");
    }

    #[test]
    fn test_c_string_literal_preserved() {
        let input = "x = \"// not a comment\"; // real";
        assert_eq!(strip_c_style(input), "x = \"// not a comment\"; ");
    }

    #[test]
    fn test_c_char_literal_preserved() {
        let input = "const z = '/* also not */';";
        assert_eq!(strip_c_style(input), input);
    }

    #[test]
    fn test_c_escaped_quote_in_string() {
        let input = r#"s = "a \" // still string"; /* gone */"#;
        assert_eq!(strip_c_style(input), r#"s = "a \" // still string"; "#);
    }

    #[test]
    fn test_c_escaped_backslash_closes_string() {
        let input = r#"s = "\\"; // gone"#;
        assert_eq!(strip_c_style(input), r#"s = "\\"; "#);
    }

    #[test]
    fn test_c_unterminated_block_comment() {
        let input = "const x=5;\n/* never closed\nmore text";
        assert_eq!(strip_c_style(input), "const x=5;\n");
    }

    #[test]
    fn test_c_comment_at_end_without_newline() {
        assert_eq!(strip_c_style("x; // tail"), "x; ");
    }

    #[test]
    fn test_c_slash_star_slash_is_not_closed() {
        assert_eq!(strip_c_style("a /*/ b"), "a ");
    }

    #[test]
    fn test_c_division_kept() {
        assert_eq!(strip_c_style("let r = a / b;"), "let r = a / b;");
    }

    #[test]
    fn test_c_trailing_slash() {
        assert_eq!(strip_c_style("a /"), "a /");
    }

    #[test]
    fn test_css_comments_and_strings() {
        let input = ".class { content: \"/* not a comment */\"; } /* real comment */\n.other { color: red; }";
        assert_eq!(
            strip_css(input),
            ".class { content: \"/* not a comment */\"; } \n.other { color: red; }"
        );
    }

    #[test]
    fn test_css_double_slash_is_not_a_comment() {
        let input = "a { background: url(//cdn.example.com/x.png); }";
        assert_eq!(strip_css(input), input);
    }

    #[test]
    fn test_css_escaped_quote() {
        let input = ".class { content: \"test\\\"quote\"; } /* comment */";
        assert_eq!(strip_css(input), ".class { content: \"test\\\"quote\"; } ");
    }

    #[test]
    fn test_css_unterminated_comment() {
        assert_eq!(strip_css("a {}\n/* open\nb {}"), "a {}\n");
    }

    #[test]
    fn test_html_comments() {
        let input = "<html>\n<!-- This is a comment -->\n<body>\n<!-- Multi-line\n     comment -->\n<p>Text</p>";
        assert_eq!(strip_html(input), "<html>\n\n<body>\n\n<p>Text</p>");
    }

    #[test]
    fn test_html_unterminated_comment() {
        assert_eq!(strip_html("<p>a</p><!-- open"), "<p>a</p>");
    }

    #[test]
    fn test_html_closes_at_first_terminator() {
        assert_eq!(strip_html("a<!-- x -->b<!-- y -->c"), "abc");
    }

    #[test]
    fn test_remove_delimited_no_overlap_between_markers() {
        // "{-}" opens a comment but does not close it.
        assert_eq!(remove_delimited("x {-} y -} z", "{-", "-}"), "x  z");
    }

    #[test]
    fn test_c_crlf_kept() {
        assert_eq!(strip_c_style("a; // c\r\nb;\r\n"), "a; \nb;\r\n");
        assert_eq!(strip_css("a {}\r\nb {}\r\n"), "a {}\r\nb {}\r\n");
        assert_eq!(strip_html("<p>\r\n<!-- c -->\r\n"), "<p>\r\n\r\n");
    }

    #[test]
    fn test_css_removed_comment_can_form_new_opener() {
        // The kept `/` and the `*` after the comment join into a fresh `/*`,
        // which only a second pass removes.
        let once = strip_css("a //*c*/* b */");
        assert_eq!(once, "a /* b */");
        assert_eq!(strip_css(&once), "a ");
    }

    #[test]
    fn test_remove_delimited_can_form_new_opener() {
        let once = strip_html("<!<!--x-->-- y -->");
        assert_eq!(once, "<!-- y -->");
        assert_eq!(strip_html(&once), "");
    }

    #[test]
    fn test_find_byte() {
        assert_eq!(find_byte(b"ab\ncd\n", 3, b'\n'), Some(5));
        assert_eq!(find_byte(b"ab", 3, b'\n'), None);
    }

    #[test]
    fn test_find() {
        assert_eq!(find(b"abc*/", 0, b"*/"), Some(3));
        assert_eq!(find(b"abc", 5, b"*/"), None);
        assert_eq!(find(b"*/", 1, b"*/"), None);
    }
}
