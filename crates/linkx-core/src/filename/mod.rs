//! Local filename selection for a downloaded binary.

mod content_disposition;
mod sanitize;

pub use content_disposition::parse_content_disposition_filename;
pub use sanitize::sanitize_filename;

use crate::extract::ExtractionResult;

/// Used when neither the response nor the link names the file.
pub const DEFAULT_FILENAME: &str = "download.bin";

/// Picks the name to save `result` under.
///
/// Order: `Content-Disposition` of the binary response, then the filename
/// decoded from the download URL, then [`DEFAULT_FILENAME`]. Every candidate
/// goes through [`sanitize_filename`].
pub fn local_filename(result: &ExtractionResult, content_disposition: Option<&str>) -> String {
    content_disposition
        .and_then(parse_content_disposition_filename)
        .and_then(|name| sanitize_filename(&name))
        .or_else(|| result.filename.as_deref().and_then(sanitize_filename))
        .unwrap_or_else(|| DEFAULT_FILENAME.to_string())
}
