//! Quote and escape tracking shared by the literal-aware scanners.

/// What a single byte turned out to be after feeding it to [`LiteralState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    /// Part of a literal: an opening/closing quote, an escape, or literal body.
    Literal,
    /// Plain code outside any literal. Only these bytes may start a comment.
    Code,
}

/// Scan state for string and character literals.
///
/// Lives for exactly one scan (one line for line-oriented families, the
/// whole text for C-style) and is never shared between calls.
#[derive(Debug, Clone, Copy)]
pub(crate) struct LiteralState {
    in_single: bool,
    in_double: bool,
    pending_escape: bool,
    track_single: bool,
}

impl LiteralState {
    /// Track both `'...'` and `"..."` literals.
    pub(crate) fn new() -> Self {
        Self {
            in_single: false,
            in_double: false,
            pending_escape: false,
            track_single: true,
        }
    }

    /// Track only `"..."` literals; `'` is ordinary code (Lisp quote syntax).
    pub(crate) fn double_only() -> Self {
        Self {
            track_single: false,
            ..Self::new()
        }
    }

    /// Whether the cursor is inside a literal.
    pub(crate) fn in_literal(&self) -> bool {
        self.in_single || self.in_double
    }

    /// Feed one byte, updating quote and escape state.
    ///
    /// Rules, in priority order:
    /// 1. a pending escape consumes this byte verbatim;
    /// 2. `\` inside a literal arms the escape;
    /// 3. `'` toggles the single-quote state unless inside `"..."`;
    /// 4. `"` toggles the double-quote state unless inside `'...'`;
    /// 5. anything else is code outside literals, or literal body inside them.
    pub(crate) fn advance(&mut self, byte: u8) -> Step {
        if self.pending_escape {
            self.pending_escape = false;
            return Step::Literal;
        }

        match byte {
            b'\\' if self.in_literal() => {
                self.pending_escape = true;
                Step::Literal
            }
            b'\'' if self.track_single && !self.in_double => {
                self.in_single = !self.in_single;
                Step::Literal
            }
            b'"' if !self.in_single => {
                self.in_double = !self.in_double;
                Step::Literal
            }
            _ if self.in_literal() => Step::Literal,
            _ => Step::Code,
        }
    }
}

impl Default for LiteralState {
    fn default() -> Self {
        Self::new()
    }
}

/// Byte offset of the first `pattern` in `line` that starts outside a literal.
///
/// `state` decides which quotes open literals; it is consumed by the scan.
pub(crate) fn find_outside_string(
    line: &str,
    pattern: &str,
    mut state: LiteralState,
) -> Option<usize> {
    let bytes = line.as_bytes();
    let pattern = pattern.as_bytes();
    if pattern.is_empty() {
        return None;
    }

    bytes
        .iter()
        .enumerate()
        .find(|&(i, &byte)| state.advance(byte) == Step::Code && bytes[i..].starts_with(pattern))
        .map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(state: &mut LiteralState, input: &str) -> Vec<Step> {
        input.bytes().map(|b| state.advance(b)).collect()
    }

    #[test]
    fn test_plain_code_is_code() {
        let mut state = LiteralState::new();
        assert!(feed(&mut state, "abc").iter().all(|s| *s == Step::Code));
        assert!(!state.in_literal());
    }

    #[test]
    fn test_double_quote_toggles() {
        let mut state = LiteralState::new();
        feed(&mut state, "\"abc");
        assert!(state.in_literal());
        feed(&mut state, "\"");
        assert!(!state.in_literal());
    }

    #[test]
    fn test_escaped_quote_stays_in_literal() {
        let mut state = LiteralState::new();
        feed(&mut state, r#""a\"b"#);
        assert!(state.in_literal());
    }

    #[test]
    fn test_escaped_backslash_then_quote_closes() {
        let mut state = LiteralState::new();
        feed(&mut state, r#""\\""#);
        assert!(!state.in_literal());
    }

    #[test]
    fn test_backslash_outside_literal_is_code() {
        let mut state = LiteralState::new();
        assert_eq!(state.advance(b'\\'), Step::Code);
        // No escape armed: the quote still opens a literal.
        state.advance(b'"');
        assert!(state.in_literal());
    }

    #[test]
    fn test_quotes_are_mutually_exclusive() {
        let mut state = LiteralState::new();
        feed(&mut state, "\"it's");
        // The apostrophe did not open a single-quoted literal.
        feed(&mut state, "\"");
        assert!(!state.in_literal());
    }

    #[test]
    fn test_find_outside_string_skips_literals() {
        let line = "a = \"#\" + '#' # c";
        assert_eq!(find_outside_string(line, "#", LiteralState::new()), Some(14));
        assert_eq!(find_outside_string("x = 1", "#", LiteralState::new()), None);
    }

    #[test]
    fn test_find_outside_string_double_only() {
        assert_eq!(find_outside_string("'a ; b", ";", LiteralState::double_only()), Some(3));
        assert_eq!(find_outside_string("'a ; b", ";", LiteralState::new()), None);
    }

    #[test]
    fn test_double_only_ignores_single_quote() {
        let mut state = LiteralState::double_only();
        assert_eq!(state.advance(b'\''), Step::Code);
        assert!(!state.in_literal());
    }
}
