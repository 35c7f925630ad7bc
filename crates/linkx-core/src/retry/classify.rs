//! Classify extraction, transport and HTTP failures into retry kinds.

use crate::download::UnexpectedStatus;
use crate::extract::ExtractError;
use crate::retry::policy::ErrorKind;
use crate::transport::TransportError;

/// Classify an HTTP status code for retry decisions.
pub fn classify_http_status(code: u32) -> ErrorKind {
    match code {
        429 | 503 => ErrorKind::Throttled,
        500..=599 => ErrorKind::Http5xx(code as u16),
        _ => ErrorKind::Other,
    }
}

/// Classify a curl error for retry decisions.
pub fn classify_curl_error(e: &curl::Error) -> ErrorKind {
    if e.is_operation_timedout() {
        return ErrorKind::Timeout;
    }
    if e.is_couldnt_connect()
        || e.is_couldnt_resolve_host()
        || e.is_couldnt_resolve_proxy()
        || e.is_read_error()
        || e.is_recv_error()
        || e.is_send_error()
        || e.is_got_nothing()
    {
        return ErrorKind::Connection;
    }
    ErrorKind::Other
}

pub fn classify_transport_error(e: &TransportError) -> ErrorKind {
    match e {
        TransportError::Curl(ce) => classify_curl_error(ce),
        TransportError::UnsupportedEncoding(_)
        | TransportError::UnsupportedMethod(_)
        | TransportError::Other(_) => ErrorKind::Other,
    }
}

/// Classify a terminal extraction error.
///
/// Only network trouble and server-side status codes are worth another
/// attempt; a page that yields no link will yield none again.
pub fn classify(e: &ExtractError) -> ErrorKind {
    match e {
        ExtractError::Transport(te) => classify_transport_error(te),
        ExtractError::BadStatus(code) => classify_http_status(*code),
        ExtractError::InvalidUrl(_)
        | ExtractError::BodyType(_)
        | ExtractError::Isolation(_)
        | ExtractError::Boot(_)
        | ExtractError::ExtractionFailed => ErrorKind::Other,
    }
}

/// Classify an `anyhow` error from the download path by looking through its
/// chain for a known cause.
pub fn classify_anyhow(e: &anyhow::Error) -> ErrorKind {
    for cause in e.chain() {
        if let Some(ee) = cause.downcast_ref::<ExtractError>() {
            return classify(ee);
        }
        if let Some(te) = cause.downcast_ref::<TransportError>() {
            return classify_transport_error(te);
        }
        if let Some(UnexpectedStatus(code)) = cause.downcast_ref::<UnexpectedStatus>() {
            return classify_http_status(*code);
        }
    }
    ErrorKind::Other
}
