#![allow(dead_code)]

pub mod page_server;

use linkx_core::transport::{ResponseBody, TransportError, TransportRequest, TransportResponse};
use std::collections::HashMap;

/// Stub transport answering every request with `status` and a text body.
pub fn text_page(
    status: u32,
    body: &str,
) -> impl Fn(&TransportRequest) -> Result<TransportResponse, TransportError> {
    let body = body.to_string();
    move |_req: &TransportRequest| {
        Ok(TransportResponse {
            status_code: status,
            headers: HashMap::new(),
            body: ResponseBody::Text(body.clone()),
        })
    }
}

/// Share page whose inline scripts are `scripts`, with a `dlbutton` anchor.
pub fn share_page(scripts: &[&str]) -> String {
    let mut html = String::from(
        "<!DOCTYPE html><html><head><title>share</title></head><body>\n\
         <div class=\"download\"><a id=\"dlbutton\" href=\"#\">Download</a></div>\n",
    );
    for s in scripts {
        html.push_str("<script type=\"text/javascript\">");
        html.push_str(s);
        html.push_str("</script>\n");
    }
    html.push_str("</body></html>\n");
    html
}
