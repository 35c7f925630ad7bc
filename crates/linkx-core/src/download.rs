//! Fetching and saving the resolved binary.
//!
//! The body is held in memory, verified, then written to `<name>.part` and
//! renamed into place.

use anyhow::{bail, Context, Result};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::checksum;
use crate::extract::ExtractionResult;
use crate::filename;
use crate::transport::{ResponseBody, Transport, TransportRequest};

/// Temporary file suffix used before the rename.
pub const TEMP_SUFFIX: &str = ".part";

/// Non-200 answer to a binary request. Kept as a type so retry
/// classification can find it in an `anyhow` chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Invalid status code: {0}")]
pub struct UnexpectedStatus(pub u32);

/// Raw body plus the one header that names it.
#[derive(Debug, Clone)]
pub struct Binary {
    pub bytes: Vec<u8>,
    pub content_disposition: Option<String>,
}

/// Requests `url` as raw bytes. Status 200 is required.
pub fn fetch(transport: &dyn Transport, url: &str) -> Result<Binary> {
    let response = transport
        .request(&TransportRequest::binary(url))
        .with_context(|| format!("GET {}", url))?;
    if response.status_code != 200 {
        return Err(UnexpectedStatus(response.status_code)).with_context(|| format!("GET {}", url));
    }
    let content_disposition = response.header("content-disposition").map(str::to_string);
    let bytes = match response.body {
        ResponseBody::Bytes(b) => b,
        other => bail!("Invalid body type: {}", other.kind()),
    };
    tracing::debug!("fetched {} bytes from {}", bytes.len(), url);
    Ok(Binary {
        bytes,
        content_disposition,
    })
}

/// Body of `url` as bytes.
pub fn fetch_binary(transport: &dyn Transport, url: &str) -> Result<Vec<u8>> {
    Ok(fetch(transport, url)?.bytes)
}

/// Where and how to save a fetched binary.
#[derive(Debug, Clone, Default)]
pub struct SaveOptions {
    pub output_dir: PathBuf,
    /// Expected SHA-256 (hex).
    pub sha256: Option<String>,
    pub expect_size: Option<u64>,
    /// Overwrite an existing file.
    pub force: bool,
}

/// Path for the temp file: appends `.part` to the final path.
pub fn temp_path(final_path: &Path) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    PathBuf::from(o)
}

/// Verifies `binary` and writes it into `options.output_dir`. Returns the
/// final path.
pub fn save(result: &ExtractionResult, binary: &Binary, options: &SaveOptions) -> Result<PathBuf> {
    if let Some(expected) = options.expect_size {
        let actual = binary.bytes.len() as u64;
        if actual != expected {
            bail!("size mismatch: expected {} bytes, got {}", expected, actual);
        }
    }
    if let Some(expected) = options.sha256.as_deref() {
        checksum::verify_sha256(&binary.bytes, expected)?;
    }

    let name = filename::local_filename(result, binary.content_disposition.as_deref());
    let final_path = options.output_dir.join(&name);
    if final_path.exists() && !options.force {
        bail!(
            "{} already exists (use --force to overwrite)",
            final_path.display()
        );
    }

    fs::create_dir_all(&options.output_dir)
        .with_context(|| format!("create {}", options.output_dir.display()))?;
    let part = temp_path(&final_path);
    {
        let mut f = File::create(&part).with_context(|| format!("create {}", part.display()))?;
        f.write_all(&binary.bytes)
            .with_context(|| format!("write {}", part.display()))?;
        f.sync_all().context("storage sync failed")?;
    }
    fs::rename(&part, &final_path).with_context(|| {
        format!(
            "failed to rename {} to {}",
            part.display(),
            final_path.display()
        )
    })?;

    tracing::info!("saved {} ({} bytes)", final_path.display(), binary.bytes.len());
    Ok(final_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{TransportError, TransportResponse};
    use std::collections::HashMap;

    fn serve(
        status: u32,
        body: ResponseBody,
        headers: &[(&str, &str)],
    ) -> impl Fn(&TransportRequest) -> Result<TransportResponse, TransportError> {
        let headers: HashMap<String, String> = headers
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |req: &TransportRequest| {
            assert!(req.response_encoding.is_none(), "binary must be requested as bytes");
            Ok(TransportResponse {
                status_code: status,
                headers: headers.clone(),
                body: body.clone(),
            })
        }
    }

    fn link() -> ExtractionResult {
        ExtractionResult {
            download: "https://host/f/1/x/avatar.png".to_string(),
            filename: Some("avatar.png".to_string()),
        }
    }

    #[test]
    fn temp_path_appends_part() {
        assert_eq!(
            temp_path(Path::new("/tmp/avatar.png")),
            PathBuf::from("/tmp/avatar.png.part")
        );
    }

    #[test]
    fn fetch_binary_returns_bytes() {
        let t = serve(200, ResponseBody::Bytes(vec![1, 2, 3]), &[]);
        assert_eq!(fetch_binary(&t, "https://host/f").unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn fetch_requires_200() {
        let t = serve(404, ResponseBody::Bytes(vec![]), &[]);
        let err = fetch_binary(&t, "https://host/f").unwrap_err();
        assert_eq!(err.downcast_ref::<UnexpectedStatus>(), Some(&UnexpectedStatus(404)));
    }

    #[test]
    fn fetch_rejects_text_body() {
        let t = serve(200, ResponseBody::Text("x".into()), &[]);
        let err = fetch_binary(&t, "https://host/f").unwrap_err();
        assert!(err.to_string().contains("Invalid body type"));
    }

    #[test]
    fn fetch_keeps_content_disposition() {
        let t = serve(
            200,
            ResponseBody::Bytes(vec![0]),
            &[("content-disposition", "attachment; filename=\"x.bin\"")],
        );
        let b = fetch(&t, "https://host/f").unwrap();
        assert_eq!(b.content_disposition.as_deref(), Some("attachment; filename=\"x.bin\""));
    }

    #[test]
    fn save_writes_and_renames() {
        let dir = tempfile::tempdir().unwrap();
        let binary = Binary {
            bytes: b"hello\n".to_vec(),
            content_disposition: None,
        };
        let opts = SaveOptions {
            output_dir: dir.path().join("out"),
            sha256: Some(
                "5891b5b522d5df086d0ff0b110fbd9d21bb4fc7163af34d08286a2e846f6be03".to_string(),
            ),
            expect_size: Some(6),
            force: false,
        };
        let path = save(&link(), &binary, &opts).unwrap();
        assert_eq!(path, dir.path().join("out").join("avatar.png"));
        assert_eq!(fs::read(&path).unwrap(), b"hello\n");
        assert!(!temp_path(&path).exists());
    }

    #[test]
    fn save_refuses_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("avatar.png"), b"old").unwrap();
        let binary = Binary {
            bytes: b"new".to_vec(),
            content_disposition: None,
        };
        let mut opts = SaveOptions {
            output_dir: dir.path().to_path_buf(),
            ..SaveOptions::default()
        };
        assert!(save(&link(), &binary, &opts).is_err());
        assert_eq!(fs::read(dir.path().join("avatar.png")).unwrap(), b"old");

        opts.force = true;
        save(&link(), &binary, &opts).unwrap();
        assert_eq!(fs::read(dir.path().join("avatar.png")).unwrap(), b"new");
    }

    #[test]
    fn save_checks_size_and_digest_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        let binary = Binary {
            bytes: b"hello\n".to_vec(),
            content_disposition: None,
        };
        let opts = SaveOptions {
            output_dir: dir.path().to_path_buf(),
            expect_size: Some(7),
            ..SaveOptions::default()
        };
        assert!(save(&link(), &binary, &opts).unwrap_err().to_string().contains("size mismatch"));

        let opts = SaveOptions {
            output_dir: dir.path().to_path_buf(),
            sha256: Some("e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855".into()),
            ..SaveOptions::default()
        };
        assert!(save(&link(), &binary, &opts).is_err());
        assert!(!dir.path().join("avatar.png").exists());
    }
}
