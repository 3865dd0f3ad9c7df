//! MarkdownV2 escaping for Telegram.
//!
//! Telegram's MarkdownV2 mode reserves a fixed set of characters; any of them
//! appearing literally in a message must be backslash-escaped or the API
//! rejects the send.

/// Characters reserved by Telegram MarkdownV2 outside code spans.
const RESERVED: &[char] = &[
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
];

/// Escape all MarkdownV2-reserved characters (and backslash) in `text`.
pub fn escape_markdown_v2(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c == '\\' || RESERVED.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Wrap `text` in an inline code span so embedded punctuation renders
/// literally.
///
/// Inside code spans only `` ` `` and `\` are special.
pub fn code_span(text: &str) -> String {
    let mut inner = String::with_capacity(text.len());
    for c in text.chars() {
        if c == '`' || c == '\\' {
            inner.push('\\');
        }
        inner.push(c);
    }
    format!("`{inner}`")
}
