use proptest::prelude::*;
use repoflat::comments::{strip_comments, SyntaxFamily};

const ALL_FAMILIES: [SyntaxFamily; 9] = [
    SyntaxFamily::HashLine,
    SyntaxFamily::CStyle,
    SyntaxFamily::HtmlBlock,
    SyntaxFamily::CssBlock,
    SyntaxFamily::SqlMixed,
    SyntaxFamily::LuaMixed,
    SyntaxFamily::HaskellMixed,
    SyntaxFamily::LispLine,
    SyntaxFamily::Plain,
];

/// Text dense in comment markers, quotes, escapes and line endings.
fn noisy_text() -> impl Strategy<Value = String> {
    let piece = prop_oneof![
        prop::sample::select(vec![
            "/", "*", "#", ";", "-", "\"", "'", "\\", "\n", "\r", "<!--", "-->", "{-", "-}",
            "--[[", "]]",
        ])
        .prop_map(str::to_string),
        "[a-z é説]{1,3}",
    ];
    prop::collection::vec(piece, 0..48).prop_map(|pieces| pieces.concat())
}

fn word() -> impl Strategy<Value = String> {
    prop_oneof!["[a-z0-9_=+(),.é]{1,6}", "\"[a-z ]{0,6}\""]
}

/// Lines of words and strings with no comment markers and no trailing whitespace.
fn marker_free_text() -> impl Strategy<Value = String> {
    let line = prop::collection::vec(word(), 0..6).prop_map(|words| words.join(" "));
    prop::collection::vec(line, 0..8).prop_map(|lines| lines.join("\n"))
}

fn line_marker(family: SyntaxFamily) -> Option<&'static str> {
    match family {
        SyntaxFamily::HashLine => Some("#"),
        SyntaxFamily::CStyle => Some("//"),
        SyntaxFamily::SqlMixed | SyntaxFamily::LuaMixed | SyntaxFamily::HaskellMixed => Some("--"),
        SyntaxFamily::LispLine => Some(";"),
        SyntaxFamily::HtmlBlock | SyntaxFamily::CssBlock | SyntaxFamily::Plain => None,
    }
}

fn block_markers(family: SyntaxFamily) -> Option<(&'static str, &'static str)> {
    match family {
        SyntaxFamily::CStyle | SyntaxFamily::CssBlock | SyntaxFamily::SqlMixed => {
            Some(("/*", "*/"))
        }
        SyntaxFamily::HtmlBlock => Some(("<!--", "-->")),
        SyntaxFamily::LuaMixed => Some(("--[[", "]]")),
        SyntaxFamily::HaskellMixed => Some(("{-", "-}")),
        SyntaxFamily::HashLine | SyntaxFamily::LispLine | SyntaxFamily::Plain => None,
    }
}

/// Source where every comment is well formed and set off by whitespace, so
/// removing one can never splice a new marker together.
fn commented_source(family: SyntaxFamily) -> impl Strategy<Value = String> {
    let token = match block_markers(family) {
        Some((open, close)) => prop_oneof![
            3 => word(),
            1 => "[a-z \n]{0,8}".prop_map(move |body| format!("{open} {body} {close}")),
        ]
        .boxed(),
        None => word().boxed(),
    };
    let trailer = match line_marker(family) {
        Some(marker) => prop::option::of("[a-z ]{0,8}".prop_map(move |c| format!(" {marker} {c}")))
            .prop_map(Option::unwrap_or_default)
            .boxed(),
        None => Just(String::new()).boxed(),
    };
    let line = (prop::collection::vec(token, 0..6), trailer)
        .prop_map(|(tokens, trailer)| tokens.join(" ") + &trailer);
    prop::collection::vec(line, 0..8).prop_map(|lines| lines.join("\n"))
}

fn family_with_source() -> impl Strategy<Value = (SyntaxFamily, String)> {
    prop::sample::select(ALL_FAMILIES.to_vec())
        .prop_flat_map(|family| commented_source(family).prop_map(move |text| (family, text)))
}

fn is_subsequence(needle: &str, haystack: &str) -> bool {
    let mut rest = haystack.chars();
    needle.chars().all(|c| rest.any(|h| h == c))
}

proptest! {
    #[test]
    fn test_strip_never_panics_on_arbitrary_text(text in "\\PC{0,200}") {
        for family in ALL_FAMILIES {
            let _ = strip_comments(&text, family);
        }
    }

    #[test]
    fn test_strip_never_panics_on_marker_soup(text in noisy_text()) {
        for family in ALL_FAMILIES {
            let _ = strip_comments(&text, family);
        }
    }

    #[test]
    fn test_retained_text_is_subsequence_of_input(text in noisy_text()) {
        for family in ALL_FAMILIES {
            let out = strip_comments(&text, family);
            prop_assert!(is_subsequence(&out, &text), "family {}: {:?} -> {:?}", family, text, out);
        }
    }

    #[test]
    fn test_idempotent_on_arbitrary_text(text in noisy_text()) {
        // Block removal in the other families can splice a new opener
        // together (`a //*c*/* b */`), so only these hold on any input.
        for family in [SyntaxFamily::HashLine, SyntaxFamily::LispLine, SyntaxFamily::CStyle] {
            let once = strip_comments(&text, family);
            prop_assert_eq!(strip_comments(&once, family), once, "family {}", family);
        }
    }

    #[test]
    fn test_idempotent_on_well_formed_source((family, text) in family_with_source()) {
        let once = strip_comments(&text, family);
        prop_assert_eq!(strip_comments(&once, family), once, "family {}", family);
    }

    #[test]
    fn test_marker_free_text_unchanged(text in marker_free_text()) {
        for family in ALL_FAMILIES {
            prop_assert_eq!(strip_comments(&text, family), text.clone(), "family {}", family);
        }
    }

    #[test]
    fn test_line_families_preserve_line_count(text in noisy_text()) {
        for family in [SyntaxFamily::HashLine, SyntaxFamily::LispLine] {
            let out = strip_comments(&text, family);
            prop_assert_eq!(out.split('\n').count(), text.split('\n').count());
        }
    }
}
