//! Minimal tag scanning for the engine's XML documents.
//!
//! Dinver documents are flat and machine-written: no comments, no CDATA, and
//! no element nests inside another element of the same name. That lets us
//! pull values out with plain string scanning instead of a full XML parser.

/// Inner text of every `<tag ...>...</tag>` element, in document order.
pub fn elements<'a>(text: &'a str, tag: &str) -> Vec<&'a str> {
    let close = format!("</{tag}>");
    let mut out = Vec::new();
    let mut rest = text;

    while let Some(inner_start) = find_open(rest, tag) {
        let body = &rest[inner_start..];
        let Some(end) = body.find(&close) else {
            break;
        };
        out.push(&body[..end]);
        rest = &body[end + close.len()..];
    }
    out
}

/// Inner text of the first `<tag>` element, trimmed.
pub fn first<'a>(text: &'a str, tag: &str) -> Option<&'a str> {
    elements(text, tag).into_iter().next().map(str::trim)
}

/// Find the next opening tag named exactly `tag`.
///
/// Returns the index of the element's inner text.
fn find_open(text: &str, tag: &str) -> Option<usize> {
    let open = format!("<{tag}");
    let mut offset = 0;
    while let Some(pos) = text[offset..].find(&open) {
        let name_end = offset + pos + open.len();
        let next = text[name_end..].chars().next()?;
        if next == '>' || next.is_whitespace() {
            let close = name_end + text[name_end..].find('>')?;
            return Some(close + 1);
        }
        offset = name_end;
    }
    None
}

/// Escape text for an element body; `&` goes first so entities are not doubled.
pub fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
