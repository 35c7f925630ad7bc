//! Inline script enumeration and the marker filter.
//!
//! External scripts (`src=`) are never fetched. The filter is a cheap noise
//! cut, not a security boundary: everything it keeps still runs sandboxed.

use scraper::{ElementRef, Html};

/// `type` values browsers execute as classic or module scripts.
const SCRIPT_TYPES: &[&str] = &[
    "",
    "module",
    "text/javascript",
    "application/javascript",
    "application/x-javascript",
    "application/ecmascript",
    "text/ecmascript",
    "text/jscript",
];

/// Inline script bodies of `html` in document order.
///
/// Skips external scripts, empty bodies, and non-script payloads such as
/// `application/ld+json` or template blocks.
pub fn locate_scripts(html: &str) -> Vec<String> {
    let doc = Html::parse_document(html);
    doc.root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "script")
        .filter(|el| el.value().attr("src").is_none())
        .filter(|el| is_executable_type(el.value().attr("type")))
        .map(|el| el.text().collect::<String>())
        .filter(|body| !body.trim().is_empty())
        .collect()
}

fn is_executable_type(ty: Option<&str>) -> bool {
    let ty = match ty {
        None => return true,
        Some(t) => t.trim(),
    };
    let essence = ty.split(';').next().unwrap_or("").trim();
    SCRIPT_TYPES.iter().any(|t| t.eq_ignore_ascii_case(essence))
}

/// Keeps only scripts whose source contains `marker`, preserving order.
pub fn filter_scripts<'a>(scripts: &'a [String], marker: &str) -> Vec<&'a str> {
    scripts
        .iter()
        .map(String::as_str)
        .filter(|s| s.contains(marker))
        .collect()
}
