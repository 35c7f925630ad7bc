//! Parse raw HTTP response header lines into a lowercase header map.

use std::collections::HashMap;

/// Parse collected header lines into a map keyed by lowercase name.
///
/// Status lines and blank separators are skipped. A new status line (as seen
/// after a followed redirect) resets the map so only the final response's
/// headers survive. Repeated headers are joined with `", "`.
pub fn parse_header_lines(lines: &[String]) -> HashMap<String, String> {
    let mut headers: HashMap<String, String> = HashMap::new();

    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with("HTTP/") {
            headers.clear();
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            let name = name.trim().to_ascii_lowercase();
            let value = value.trim();
            headers
                .entry(name)
                .and_modify(|existing| {
                    existing.push_str(", ");
                    existing.push_str(value);
                })
                .or_insert_with(|| value.to_string());
        }
    }

    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn names_are_lowercased() {
        let h = parse_header_lines(&lines(&[
            "HTTP/1.1 200 OK",
            "Content-Type: text/html; charset=utf-8",
            "Content-Length: 12345",
        ]));
        assert_eq!(h.get("content-type").map(String::as_str), Some("text/html; charset=utf-8"));
        assert_eq!(h.get("content-length").map(String::as_str), Some("12345"));
    }

    #[test]
    fn repeated_headers_are_joined() {
        let h = parse_header_lines(&lines(&["Set-Cookie: a=1", "Set-Cookie: b=2"]));
        assert_eq!(h.get("set-cookie").map(String::as_str), Some("a=1, b=2"));
    }

    #[test]
    fn redirect_headers_are_dropped() {
        let h = parse_header_lines(&lines(&[
            "HTTP/1.1 302 Found",
            "Location: https://cdn.example.com/file.html",
            "",
            "HTTP/1.1 200 OK",
            "Content-Type: text/html",
        ]));
        assert!(h.get("location").is_none());
        assert_eq!(h.get("content-type").map(String::as_str), Some("text/html"));
    }
}
