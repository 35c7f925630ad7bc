//! Default transport backed by the curl crate (libcurl).

use std::collections::HashMap;
use std::str;
use std::time::Duration;

use super::parse::parse_header_lines;
use super::{ResponseBody, Transport, TransportError, TransportRequest, TransportResponse};

/// Blocking libcurl transport. One `Easy` handle per request.
#[derive(Debug, Clone)]
pub struct CurlTransport {
    /// Sent unless the request carries its own `User-Agent`.
    pub user_agent: String,
    pub connect_timeout: Duration,
    pub timeout: Duration,
    pub max_redirections: u32,
}

impl Default for CurlTransport {
    fn default() -> Self {
        Self {
            user_agent: "-".to_string(),
            connect_timeout: Duration::from_secs(15),
            timeout: Duration::from_secs(60),
            max_redirections: 10,
        }
    }
}

impl CurlTransport {
    pub fn from_config(cfg: &crate::config::LinkxConfig) -> Self {
        Self {
            user_agent: cfg.user_agent.clone(),
            connect_timeout: Duration::from_secs(cfg.connect_timeout_secs),
            timeout: Duration::from_secs(cfg.request_timeout_secs),
            ..Self::default()
        }
    }

    fn header_list(&self, custom: &HashMap<String, String>) -> Result<curl::easy::List, curl::Error> {
        let mut list = curl::easy::List::new();
        let has_agent = custom.keys().any(|k| k.trim().eq_ignore_ascii_case("user-agent"));
        if !has_agent {
            list.append(&format!("User-Agent: {}", self.user_agent))?;
        }
        for (k, v) in custom {
            list.append(&format!("{}: {}", k.trim(), v.trim()))?;
        }
        Ok(list)
    }
}

impl Transport for CurlTransport {
    fn request(&self, request: &TransportRequest) -> Result<TransportResponse, TransportError> {
        let text = match request.response_encoding.as_deref() {
            None => false,
            Some(enc) if enc.eq_ignore_ascii_case("utf-8") || enc.eq_ignore_ascii_case("utf8") => {
                true
            }
            Some(other) => return Err(TransportError::UnsupportedEncoding(other.to_string())),
        };

        let mut header_lines: Vec<String> = Vec::new();
        let mut data: Vec<u8> = Vec::new();

        let mut easy = curl::easy::Easy::new();
        easy.url(&request.url)?;
        match request.method.to_ascii_uppercase().as_str() {
            "GET" => easy.get(true)?,
            "HEAD" => easy.nobody(true)?,
            other => return Err(TransportError::UnsupportedMethod(other.to_string())),
        }
        easy.follow_location(true)?;
        easy.max_redirections(self.max_redirections)?;
        easy.connect_timeout(self.connect_timeout)?;
        easy.timeout(self.timeout)?;
        if request.accept_encoding {
            // Empty string: let libcurl advertise every encoding it was built with.
            easy.accept_encoding("")?;
        }
        easy.http_headers(self.header_list(&request.headers)?)?;

        {
            let mut transfer = easy.transfer();
            transfer.header_function(|line| {
                if let Ok(s) = str::from_utf8(line) {
                    header_lines.push(s.trim_end().to_string());
                }
                true
            })?;
            transfer.write_function(|chunk| {
                data.extend_from_slice(chunk);
                Ok(chunk.len())
            })?;
            transfer.perform()?;
        }

        let status_code = easy.response_code()?;
        tracing::debug!(
            "{} {} -> HTTP {} ({} bytes)",
            request.method,
            request.url,
            status_code,
            data.len()
        );

        let body = if text {
            ResponseBody::Text(String::from_utf8_lossy(&data).into_owned())
        } else {
            ResponseBody::Bytes(data)
        };

        Ok(TransportResponse {
            status_code,
            headers: parse_header_lines(&header_lines),
            body,
        })
    }
}
