//! Document emulation: just enough `window`/`document` for link scripts.
//!
//! The page is parsed on the host into a plain element tree, serialized, and
//! rebuilt inside the realm by a small installer script. No host function is
//! ever exposed to the realm; the document is ordinary realm-owned objects.

mod tree;

pub use tree::{parse_document, DomNode, ElementNode, MAX_DEPTH};

use std::time::Duration;

use crate::sandbox::{SandboxError, SandboxRealm};

/// Installer evaluated inside the realm: `(window, treeJson) => void`.
const DOCUMENT_INSTALLER: &str = include_str!("prelude.js");

/// Aliases `window`/`self`/`top`/`parent` to the realm's global and installs
/// `document` built from `body`.
pub fn install_document(
    realm: &SandboxRealm,
    body: &str,
    timeout: Duration,
) -> Result<(), SandboxError> {
    install_payload(realm, &document_payload(body)?, timeout)
}

/// Parses `body` into the JSON tree the installer consumes. Runs on the host,
/// outside any realm deadline.
pub fn document_payload(body: &str) -> Result<String, SandboxError> {
    let root = parse_document(body);
    serde_json::to_string(&root)
        .map_err(|e| SandboxError::Boot(format!("serialize document: {}", e)))
}

/// Installs a tree produced by [`document_payload`].
pub fn install_payload(
    realm: &SandboxRealm,
    payload: &str,
    timeout: Duration,
) -> Result<(), SandboxError> {
    realm.install(DOCUMENT_INSTALLER, payload, timeout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sandbox::RealmLimits;

    const T: Duration = Duration::from_millis(500);

    const PAGE: &str = r#"<!DOCTYPE html>
<html><head><title>file</title></head>
<body>
  <div class="right">
    <a id="dlbutton" href="/static/placeholder">Download Now</a>
    <img id="fimage" src="/i/x.png">
  </div>
</body></html>"#;

    fn booted(body: &str) -> SandboxRealm {
        let realm = SandboxRealm::create(RealmLimits::default()).unwrap();
        install_document(&realm, body, T).unwrap();
        realm
    }

    fn read(realm: &SandboxRealm, expr: &str) -> Option<String> {
        realm.read(&[("v", expr)], T).unwrap().get("v").cloned()
    }

    #[test]
    fn window_aliases_point_at_global() {
        let r = booted(PAGE);
        assert_eq!(
            read(&r, "String(window === globalThis && self === window && top === window && parent === window)")
                .as_deref(),
            Some("true")
        );
        assert_eq!(read(&r, "String(window.document === document)").as_deref(), Some("true"));
    }

    #[test]
    fn get_element_by_id_finds_nested_elements() {
        let r = booted(PAGE);
        assert_eq!(read(&r, "document.getElementById('dlbutton').tagName").as_deref(), Some("A"));
        assert_eq!(read(&r, "document.getElementById('fimage').getAttribute('src')").as_deref(), Some("/i/x.png"));
        assert_eq!(read(&r, "String(document.getElementById('missing'))").as_deref(), Some("null"));
        assert_eq!(
            read(&r, "String(document.getElementById('dlbutton') === document.getElementById('dlbutton'))").as_deref(),
            Some("true")
        );
    }

    #[test]
    fn href_reports_only_assigned_links() {
        let r = booted(PAGE);
        assert_eq!(read(&r, "typeof document.getElementById('dlbutton').href").as_deref(), Some("undefined"));
        assert_eq!(
            read(&r, "document.getElementById('dlbutton').getAttribute('href')").as_deref(),
            Some("/static/placeholder")
        );

        r.run("document.getElementById('dlbutton').href = '/d/abc/name.png';", T).unwrap();
        assert_eq!(read(&r, "document.getElementById('dlbutton').href").as_deref(), Some("/d/abc/name.png"));
        assert_eq!(
            read(&r, "document.getElementById('dlbutton').getAttribute('HREF')").as_deref(),
            Some("/d/abc/name.png")
        );
    }

    #[test]
    fn set_attribute_href_is_visible_as_property() {
        let r = booted(PAGE);
        r.run("document.getElementById('dlbutton').setAttribute('href', '/via/attr');", T).unwrap();
        assert_eq!(read(&r, "document.getElementById('dlbutton').href").as_deref(), Some("/via/attr"));
        r.run("document.getElementById('dlbutton').removeAttribute('href');", T).unwrap();
        assert_eq!(read(&r, "typeof document.getElementById('dlbutton').href").as_deref(), Some("undefined"));
    }

    #[test]
    fn id_changes_are_respected_by_lookup() {
        let r = booted(PAGE);
        r.run("document.getElementById('fimage').id = 'renamed';", T).unwrap();
        assert_eq!(read(&r, "String(document.getElementById('fimage'))").as_deref(), Some("null"));
        assert_eq!(read(&r, "document.getElementById('renamed').localName").as_deref(), Some("img"));
    }

    #[test]
    fn created_elements_become_reachable_once_appended() {
        let r = booted("<html><body></body></html>");
        r.run(
            "var a = document.createElement('a'); a.id = 'dlbutton'; a.href = '/made'; document.body.appendChild(a);",
            T,
        )
        .unwrap();
        assert_eq!(read(&r, "document.getElementById('dlbutton').href").as_deref(), Some("/made"));
        assert_eq!(read(&r, "String(document.getElementsByTagName('a').length)").as_deref(), Some("1"));
    }

    #[test]
    fn text_content_and_style_are_available() {
        let r = booted(PAGE);
        assert_eq!(read(&r, "document.getElementById('dlbutton').textContent").as_deref(), Some("Download Now"));
        r.run("document.getElementById('dlbutton').style.display = 'none';", T).unwrap();
        assert_eq!(read(&r, "document.getElementById('dlbutton').style.display").as_deref(), Some("none"));
        assert_eq!(read(&r, "document.head.firstChild.textContent").as_deref(), Some("file"));
    }

    #[test]
    fn private_state_is_not_reachable_from_page() {
        let r = booted(PAGE);
        assert_eq!(read(&r, "typeof attributes").as_deref(), Some("undefined"));
        assert_eq!(read(&r, "typeof links").as_deref(), Some("undefined"));
        assert!(matches!(
            r.run("document.getElementById('dlbutton').getAttribute.call({}, 'id')", T),
            Err(SandboxError::Script)
        ));
    }

    #[test]
    fn garbage_body_still_boots() {
        let r = booted("\u{0}<<<>>></div><script>never closed");
        assert_eq!(read(&r, "document.documentElement.tagName").as_deref(), Some("HTML"));
    }
}
