//! Terminal failures of one extraction call.

use crate::sandbox::SandboxError;
use crate::transport::TransportError;

/// One distinguishable failure per call; partial results are never returned.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// The page URL itself does not parse.
    #[error("invalid page URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The transport could not produce a response.
    #[error("request failed: {0}")]
    Transport(#[from] TransportError),
    /// The page answered with something other than 200.
    #[error("Invalid status code: {0}")]
    BadStatus(u32),
    /// The page body came back as raw bytes instead of text.
    #[error("Invalid body type: {0}")]
    BodyType(&'static str),
    /// The realm could not assert a clean global. Fatal, never retried.
    #[error("sandbox isolation failure: {0}")]
    Isolation(String),
    /// The emulated document could not be installed into the realm.
    #[error("document boot failure: {0}")]
    Boot(String),
    /// No candidate script produced a usable link.
    #[error("Failed to extract info")]
    ExtractionFailed,
}

impl From<SandboxError> for ExtractError {
    fn from(e: SandboxError) -> Self {
        match e {
            SandboxError::Isolation(msg) => ExtractError::Isolation(msg),
            SandboxError::Boot(msg) => ExtractError::Boot(msg),
            SandboxError::Script | SandboxError::Read | SandboxError::Stalled => {
                ExtractError::ExtractionFailed
            }
        }
    }
}
