//! Link resolver: captured href → absolute download URL plus filename.

use percent_encoding::percent_decode_str;
use url::Url;

/// Resolves `href` against the page it was captured from.
///
/// Relative references (`/d/abc/name.png`, `../x`, `//cdn/x`) follow standard
/// URL resolution; absolute hrefs are returned normalized.
pub fn resolve_href(page_url: &Url, href: &str) -> Result<Url, url::ParseError> {
    page_url.join(href.trim())
}

/// Characters whose escapes `decodeURI` leaves encoded.
const URI_RESERVED: &[u8] = b";/?:@&=+$,#";

/// Last path segment of `url`, decoded like `decodeURI`: escapes of reserved
/// characters (`%2F`, `%3F`, `%23`, ...) stay as they are.
///
/// `None` when the segment is empty (e.g. a trailing `/`), contains a malformed
/// escape, or does not decode to UTF-8.
pub fn filename_from_url(url: &Url) -> Option<String> {
    let segment = url.path().rsplit('/').next().unwrap_or("");
    if segment.is_empty() || has_malformed_escape(segment) {
        return None;
    }
    let decoded = decode_uri(segment)?;
    if decoded.is_empty() {
        None
    } else {
        Some(decoded)
    }
}

/// Percent-decodes everything except reserved escapes. Expects well-formed
/// escapes, so every `%` starts a three-byte escape.
fn decode_uri(s: &str) -> Option<String> {
    let mut out = Vec::with_capacity(s.len());
    let mut rest = s;
    while let Some(at) = find_reserved_escape(rest) {
        out.extend(percent_decode_str(&rest[..at]));
        out.extend_from_slice(&rest.as_bytes()[at..at + 3]);
        rest = &rest[at + 3..];
    }
    out.extend(percent_decode_str(rest));
    String::from_utf8(out).ok()
}

fn find_reserved_escape(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut i = 0;
    while i + 2 < bytes.len() {
        if bytes[i] != b'%' {
            i += 1;
            continue;
        }
        let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok()?;
        let byte = u8::from_str_radix(hex, 16).ok()?;
        if URI_RESERVED.contains(&byte) {
            return Some(i);
        }
        i += 3;
    }
    None
}

/// A `%` that is not followed by two hex digits.
fn has_malformed_escape(s: &str) -> bool {
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let ok = bytes.len() > i + 2
                && bytes[i + 1].is_ascii_hexdigit()
                && bytes[i + 2].is_ascii_hexdigit();
            if !ok {
                return true;
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    false
}
