//! Display-name sanitisation.
//!
//! Display names are client-supplied and untrusted. Before one reaches a log
//! line it is stripped of control and format characters, whitespace runs are
//! collapsed, and it is cut to a fixed length.

use regex::Regex;
use std::sync::LazyLock;

static CONTROL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\p{Cc}\p{Cf}]").unwrap());
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Longest sanitised name written to the logs, in chars.
pub const MAX_LOGGED_NAME_CHARS: usize = 64;

/// Make an untrusted name safe to embed in a log line.
pub fn sanitize_display_name(input: &str) -> String {
    let stripped = CONTROL_RE.replace_all(input, " ");
    let collapsed = WHITESPACE_RE.replace_all(stripped.trim(), " ");

    let mut chars = collapsed.chars();
    let mut clean: String = chars.by_ref().take(MAX_LOGGED_NAME_CHARS).collect();
    if chars.next().is_some() {
        clean.push('…');
    }
    clean
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_control_characters() {
        let clean = sanitize_display_name("ada\n[ERROR] forged line\u{1b}[31m");
        assert!(!clean.contains('\n'));
        assert!(!clean.contains('\u{1b}'));
        assert!(clean.starts_with("ada [ERROR] forged line"));
    }

    #[test]
    fn strips_bidi_overrides() {
        let clean = sanitize_display_name("abc\u{202e}fed");
        assert!(!clean.contains('\u{202e}'));
    }

    #[test]
    fn long_names_are_marked_as_cut() {
        let clean = sanitize_display_name(&"x".repeat(200));
        assert_eq!(clean.chars().count(), MAX_LOGGED_NAME_CHARS + 1);
        assert!(clean.ends_with('…'));
    }

    #[test]
    fn ordinary_names_pass_through() {
        assert_eq!(sanitize_display_name("Grace Hopper"), "Grace Hopper");
    }
}
