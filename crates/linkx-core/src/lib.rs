//! Resolve file-host share pages to direct download URLs.
//!
//! A share page computes its real link in inline script. [`extract`] fetches
//! the page, runs the relevant scripts in a fresh QuickJS realm against a
//! minimal emulated document, and reads back only the target element's
//! `href` as a plain string.

pub mod checksum;
pub mod config;
pub mod dom;
pub mod download;
pub mod extract;
pub mod filename;
pub mod logging;
pub mod resolve;
pub mod retry;
pub mod sandbox;
pub mod scripts;
pub mod transport;

pub use extract::{extract, ExtractError, ExtractOptions, ExtractionResult, Extractor};
pub use transport::{CurlTransport, Transport, TransportError, TransportRequest, TransportResponse};
