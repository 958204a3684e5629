use std::borrow::Cow;

use scraper::Html;

/// Placeholder used when a description is empty after sanitization.
pub const EMPTY_DESCRIPTION: &str = "No description available.";

/// Reduces an HTML fragment to plain, single-line text.
///
/// The fragment is parsed with a real HTML parser, so nested, unclosed, or
/// otherwise malformed markup is handled the way a browser would handle it.
/// Only text nodes survive: tags and comments are dropped, character
/// references are decoded by the parser, and whitespace runs are collapsed
/// to a single space with the ends trimmed.
///
/// A `<` with no `>` anywhere after it is not the start of a tag and is
/// kept as literal text, so a trailing `C++ <templates` survives intact.
///
/// Returns an empty string when nothing but markup or whitespace remains;
/// callers decide the fallback.
///
/// # Examples
///
/// ```
/// use oreilly_feed::util::sanitize_html;
///
/// assert_eq!(sanitize_html("<p>Learn &amp; grow</p>"), "Learn & grow");
/// assert_eq!(sanitize_html("  <br/>\n\t "), "");
/// ```
pub fn sanitize_html(raw: &str) -> String {
    if raw.trim().is_empty() {
        return String::new();
    }

    // Fast path: no markup and no entities means the parser has nothing to do
    if !raw.contains(['<', '&']) {
        return collapse_whitespace(raw);
    }

    let fragment = Html::parse_fragment(&escape_unterminated_tags(raw));
    let text: String = fragment.root_element().text().collect();
    collapse_whitespace(&text)
}

/// Escapes every `<` that follows the last `>` in `raw`.
///
/// The HTML tokenizer would otherwise treat `<word` up to the end of input as
/// an unfinished tag and drop it.
fn escape_unterminated_tags(raw: &str) -> Cow<'_, str> {
    let tail_start = raw.rfind('>').map_or(0, |i| i + 1);
    let tail = &raw[tail_start..];
    if !tail.contains('<') {
        return Cow::Borrowed(raw);
    }
    let mut escaped = String::with_capacity(raw.len() + 8);
    escaped.push_str(&raw[..tail_start]);
    escaped.push_str(&tail.replace('<', "&lt;"));
    Cow::Owned(escaped)
}

/// Collapses every run of whitespace into a single ASCII space and trims
/// both ends.
pub fn collapse_whitespace(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut last_was_space = false;
    for ch in input.chars() {
        if ch.is_whitespace() {
            if !last_was_space {
                out.push(' ');
                last_was_space = true;
            }
        } else {
            out.push(ch);
            last_was_space = false;
        }
    }
    out.trim().to_string()
}

/// Returns true for characters that XML 1.0 forbids anywhere in a document.
///
/// Allowed: tab, newline, carriage return, U+0020..=U+D7FF,
/// U+E000..=U+FFFD, and U+10000 and above. Surrogates cannot occur in a
/// Rust `str`.
fn is_xml_forbidden(c: char) -> bool {
    match c {
        '\t' | '\n' | '\r' => false,
        '\u{0}'..='\u{1f}' => true,
        '\u{fffe}' | '\u{ffff}' => true,
        _ => false,
    }
}

/// Removes characters that would make the emitted XML ill-formed.
///
/// Upstream catalog text occasionally carries stray C0 control bytes. The
/// XML writer escapes markup but passes these through, so they have to be
/// dropped before serialization.
///
/// Returns `Cow::Borrowed` when the input is already clean (common case).
pub fn strip_xml_invalid_chars(s: &str) -> Cow<'_, str> {
    if !s.chars().any(is_xml_forbidden) {
        return Cow::Borrowed(s);
    }
    Cow::Owned(s.chars().filter(|&c| !is_xml_forbidden(c)).collect())
}
