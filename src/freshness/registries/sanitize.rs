//! Plain-text sanitization of registry values

use std::sync::LazyLock;

use regex::Regex;

static SCRIPT_OR_STYLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script[^>]*>.*?</script\s*>|<style[^>]*>.*?</style\s*>")
        .expect("script/style pattern is valid")
});

static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"));

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// Reduce a registry-supplied value to safe plain text.
///
/// Script and style elements are dropped with their contents, remaining markup
/// is stripped, whitespace runs (line breaks and tabs included) become a
/// single space, and the remaining HTML-significant characters are escaped.
pub fn sanitize_text_field(value: &str) -> String {
    let without_scripts = SCRIPT_OR_STYLE.replace_all(value, "");
    let without_tags = TAG.replace_all(&without_scripts, "");
    let collapsed = WHITESPACE.replace_all(&without_tags, " ");
    escape_html(collapsed.trim())
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
