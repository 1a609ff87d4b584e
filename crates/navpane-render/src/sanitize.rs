//! Character-level sanitizing run before the markup is parsed.
//!
//! Both passes are plain linear scans over the literal tag strings with no
//! knowledge of markup structure. Tag matching is ASCII case-insensitive.

/// Strip scripts, then metadata.
pub fn sanitize(raw: &str) -> String {
    strip_meta(&strip_scripts(raw))
}

/// `true` if `pat` occurs at `start` (ASCII case-insensitive).
fn matches_at(chars: &[char], start: usize, pat: &str) -> bool {
    let len = pat.chars().count();
    start + len <= chars.len()
        && chars[start..start + len]
            .iter()
            .zip(pat.chars())
            .all(|(a, b)| a.eq_ignore_ascii_case(&b))
}

/// `true` if `pat` ends right before index `end`.
fn ends_at(chars: &[char], end: usize, pat: &str) -> bool {
    let len = pat.chars().count();
    end >= len && matches_at(chars, end - len, pat)
}

// -------------------------------------------------------------------
// Scripts
// -------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScriptState {
    Normal,
    InScript,
}

/// Drop every `<script ...> ... </script>` span.
///
/// At each index the script state is left first if the preceding nine
/// characters are `</script>`, then entered if `<script>` or `<script `
/// starts here with at least one character after it. Characters are kept
/// only in the normal state.
pub fn strip_scripts(raw: &str) -> String {
    let chars: Vec<char> = raw.chars().collect();
    let n = chars.len();
    let mut out = String::with_capacity(raw.len());
    let mut state = ScriptState::Normal;

    for i in 0..n {
        if state == ScriptState::InScript && ends_at(&chars, i, "</script>") {
            state = ScriptState::Normal;
        }
        if i + 8 < n && (matches_at(&chars, i, "<script>") || matches_at(&chars, i, "<script ")) {
            state = ScriptState::InScript;
        }
        if state == ScriptState::Normal {
            out.push(chars[i]);
        }
    }
    out
}

// -------------------------------------------------------------------
// Metadata
// -------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HeadState {
    Outside,
    InHead,
    InHeadMeta,
    /// The head closed while a meta span was still open. Characters stay
    /// dropped until a head reopens and the span can close.
    MetaPastHead,
}

impl HeadState {
    fn in_head(self) -> bool {
        matches!(self, Self::InHead | Self::InHeadMeta)
    }

    fn in_meta(self) -> bool {
        matches!(self, Self::InHeadMeta | Self::MetaPastHead)
    }

    fn leave_head(self) -> Self {
        match self {
            Self::InHeadMeta => Self::MetaPastHead,
            _ => Self::Outside,
        }
    }

    fn enter_head(self) -> Self {
        if self.in_meta() {
            Self::InHeadMeta
        } else {
            Self::InHead
        }
    }
}

/// Drop every `<meta ...>` element inside a `<head>` region, up to and
/// including its next `>`.
pub fn strip_meta(raw: &str) -> String {
    let chars: Vec<char> = raw.chars().collect();
    let n = chars.len();
    let mut out = String::with_capacity(raw.len());
    let mut state = HeadState::Outside;

    for i in 0..n {
        if state.in_head() && ends_at(&chars, i, "</head>") {
            state = state.leave_head();
        }
        if i + 6 < n && (matches_at(&chars, i, "<head>") || matches_at(&chars, i, "<head ")) {
            state = state.enter_head();
        }
        if state == HeadState::InHeadMeta && i > 0 && chars[i - 1] == '>' {
            state = HeadState::InHead;
        }
        if state == HeadState::InHead && i + 6 < n && matches_at(&chars, i, "<meta ") {
            state = HeadState::InHeadMeta;
        }
        if !state.in_meta() {
            out.push(chars[i]);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_uppercase_script() {
        assert_eq!(
            strip_scripts("<SCRIPT>alert(1)</SCRIPT><p>ok</p>"),
            "<p>ok</p>"
        );
    }

    #[test]
    fn strips_script_with_attributes() {
        assert_eq!(
            strip_scripts("a<script type=\"x\">var s = '<b>';</script>b"),
            "ab"
        );
    }

    #[test]
    fn unterminated_script_drops_rest() {
        assert_eq!(strip_scripts("keep<script>lost forever"), "keep");
    }

    #[test]
    fn script_tag_at_very_end_is_kept() {
        // No character follows the opening tag.
        assert_eq!(strip_scripts("x<script>"), "x<script>");
    }

    #[test]
    fn scripts_tag_name_is_not_a_script() {
        assert_eq!(strip_scripts("<scripts>ok</scripts>"), "<scripts>ok</scripts>");
    }

    #[test]
    fn multiple_scripts() {
        assert_eq!(
            strip_scripts("1<script>a</script>2<Script >b</sCrIpT>3"),
            "123"
        );
    }

    #[test]
    fn strips_meta_inside_head() {
        assert_eq!(
            strip_meta("<html><head><meta charset=\"utf-8\"><title>T</title></head></html>"),
            "<html><head><title>T</title></head></html>"
        );
    }

    #[test]
    fn keeps_meta_outside_head() {
        let input = "<body><meta name=\"x\"></body>";
        assert_eq!(strip_meta(input), input);
    }

    #[test]
    fn case_insensitive_head_and_meta() {
        assert_eq!(
            strip_meta("<HEAD lang=en><META name=a><Meta content=b></HEAD>x"),
            "<HEAD lang=en></HEAD>x"
        );
    }

    #[test]
    fn meta_left_open_past_head_drops_until_next_head() {
        assert_eq!(strip_meta("<head><meta </head><p>gone</p>"), "<head>");
    }

    #[test]
    fn sanitize_runs_both_passes() {
        let raw = "<head><meta x=1><script>s()</script></head><p>ok</p>";
        assert_eq!(sanitize(raw), "<head></head><p>ok</p>");
    }

    #[test]
    fn non_ascii_text_survives() {
        assert_eq!(sanitize("<p>héllo ✓</p>"), "<p>héllo ✓</p>");
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn text_without_tags_is_unchanged(s in "[^<]{0,80}") {
                prop_assert_eq!(sanitize(&s), s);
            }

            #[test]
            fn output_never_longer(s in "(<script>|</script>|<head>|</head>|<meta |>|[a-z ]){0,30}") {
                prop_assert!(sanitize(&s).chars().count() <= s.chars().count());
            }
        }
    }
}
