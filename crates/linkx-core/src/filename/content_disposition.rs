//! `Content-Disposition` filename parameters (`filename`, `filename*`).

use percent_encoding::percent_decode_str;

/// Filename announced by a `Content-Disposition` header value.
///
/// `filename*` (RFC 5987, `UTF-8` or `ISO-8859-1`) wins over `filename`.
/// Quoted values may contain `;` and backslash escapes.
pub fn parse_content_disposition_filename(header_value: &str) -> Option<String> {
    let mut plain = None;
    let mut extended = None;

    for (name, value) in params(header_value) {
        if name.eq_ignore_ascii_case("filename*") {
            extended = extended.or_else(|| decode_ext_value(&value));
        } else if name.eq_ignore_ascii_case("filename") && !value.is_empty() {
            plain = plain.or(Some(value));
        }
    }

    extended.filter(|s| !s.is_empty()).or(plain)
}

/// `name=value` pairs after the disposition type, with quotes removed.
fn params(header_value: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    let mut rest = match header_value.split_once(';') {
        Some((_, r)) => r,
        None => return out,
    };

    loop {
        rest = rest.trim_start_matches(|c: char| c == ';' || c.is_whitespace());
        if rest.is_empty() {
            break;
        }
        let (name, after) = match rest.split_once('=') {
            Some((n, a)) => (n.trim().to_string(), a.trim_start()),
            None => break,
        };
        let (value, remaining) = if let Some(quoted) = after.strip_prefix('"') {
            unquote(quoted)
        } else {
            let end = after.find(';').unwrap_or(after.len());
            (after[..end].trim().to_string(), &after[end..])
        };
        out.push((name, value));
        rest = remaining;
    }
    out
}

/// Reads a quoted-string body up to the closing quote. Returns the unescaped
/// value and whatever follows the quote.
fn unquote(s: &str) -> (String, &str) {
    let mut value = String::new();
    let mut escaped = false;
    for (i, c) in s.char_indices() {
        if escaped {
            value.push(c);
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '"' {
            return (value, &s[i + 1..]);
        } else {
            value.push(c);
        }
    }
    // unterminated
    (value, "")
}

/// `charset'lang'pct-encoded`.
fn decode_ext_value(value: &str) -> Option<String> {
    let mut parts = value.splitn(3, '\'');
    let charset = parts.next()?;
    let _lang = parts.next()?;
    let encoded = parts.next()?;

    let bytes: Vec<u8> = percent_decode_str(encoded).collect();
    if charset.eq_ignore_ascii_case("utf-8") {
        String::from_utf8(bytes).ok()
    } else if charset.eq_ignore_ascii_case("iso-8859-1") {
        Some(bytes.iter().map(|&b| b as char).collect())
    } else {
        None
    }
}
