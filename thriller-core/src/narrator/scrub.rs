//! Removal of tool bookkeeping that leaks into narration.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref META_LINES: Vec<Regex> = [
        // Functions.update_game_log - {...}
        r"(?mi)^[ \t]*Functions?\.[\w.]+[ \t]*-.*$",
        r"(?mi)^[ \t]*(?:Tool|Function)[ \t]*(?:Call|Result):.*$",
        r#"(?mi)^[ \t]*\{[ \t]*"(?:tool|function)".*?\}[ \t]*$"#,
        r"(?mi)^[ \t]*args[ \t]*:[ \t]*\{.*?\}[ \t]*$",
        // [Assistant has added the keycard]
        r"(?mi)^[ \t]*\[.*?(?:added|saved|update).*?\][ \t]*$",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("meta line pattern"))
    .collect();
    static ref BLANK_RUN: Regex = Regex::new(r"\n{3,}").expect("blank run pattern");
}

/// Strip whole lines that echo tool calls or announce state updates.
///
/// Runs of three or more newlines left behind are collapsed to a single
/// blank line and the result is trimmed. Empty input comes back unchanged.
pub fn scrub_tool_meta(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let mut cleaned = text.to_string();
    for pattern in META_LINES.iter() {
        cleaned = pattern.replace_all(&cleaned, "").into_owned();
    }

    BLANK_RUN.replace_all(&cleaned, "\n\n").trim().to_string()
}
