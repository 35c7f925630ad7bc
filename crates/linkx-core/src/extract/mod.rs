//! Extraction orchestrator: share page URL → direct download URL.
//!
//! fetch → validate → boot realm and document → locate/filter scripts →
//! run every candidate → read the target href once → resolve.
//!
//! Every call builds its own realm and document and drops both before
//! returning. The realm lives on a [`RealmWorker`] thread so a script stuck in
//! native code cannot hold the caller past its deadline. There are no internal
//! retries; see [`crate::retry`] for the caller-side policy.

mod error;
mod stage;

pub use error::ExtractError;

use std::time::Duration;

use serde::Serialize;
use url::Url;

use crate::dom;
use crate::resolve;
use crate::sandbox::{ExtractedValues, RealmLimits, RealmWorker, SandboxError, DEFAULT_GRACE};
use crate::scripts;
use crate::transport::{CurlTransport, ResponseBody, Transport, TransportRequest};
use stage::Stage;

/// Label under which the target href is read out of the realm.
const HREF_LABEL: &str = "href";

/// Fresh realms built after stalled scripts before the call gives up.
const MAX_REBUILDS: usize = 2;

/// Knobs for one extraction call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Element id whose `href` the page scripts compute.
    pub target_id: String,
    /// Substring a script must contain to be executed.
    pub marker: String,
    /// Wall-clock budget per script and for the document boot.
    pub script_timeout: Duration,
    /// Wall-clock budget for the final read.
    pub read_timeout: Duration,
    /// Extra wait past a deadline before a realm call counts as stalled.
    pub watchdog_grace: Duration,
    pub limits: RealmLimits,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            target_id: "dlbutton".to_string(),
            marker: "dlbutton".to_string(),
            script_timeout: Duration::from_millis(1000),
            read_timeout: Duration::from_millis(1000),
            watchdog_grace: DEFAULT_GRACE,
            limits: RealmLimits::default(),
        }
    }
}

/// Direct link recovered from a share page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionResult {
    /// Absolute URL of the binary.
    pub download: String,
    /// Percent-decoded last path segment of `download`, if any.
    pub filename: Option<String>,
}

/// Transport plus options; cheap to share across threads when `T` is.
#[derive(Debug, Clone)]
pub struct Extractor<T: Transport = CurlTransport> {
    transport: T,
    options: ExtractOptions,
}

impl Default for Extractor<CurlTransport> {
    fn default() -> Self {
        Self::new(CurlTransport::default(), ExtractOptions::default())
    }
}

impl<T: Transport> Extractor<T> {
    pub fn new(transport: T, options: ExtractOptions) -> Self {
        Self { transport, options }
    }

    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Runs the full pipeline for `page_url`. Blocks the current thread; call
    /// from `spawn_blocking` if used from async code.
    pub fn extract(&self, page_url: &str) -> Result<ExtractionResult, ExtractError> {
        extract_with(&self.transport, page_url, &self.options)
    }
}

/// Extracts with default options, using `transport` or a default
/// [`CurlTransport`] when none is given.
pub fn extract(
    page_url: &str,
    transport: Option<&dyn Transport>,
) -> Result<ExtractionResult, ExtractError> {
    let options = ExtractOptions::default();
    match transport {
        Some(t) => extract_with(t, page_url, &options),
        None => extract_with(&CurlTransport::default(), page_url, &options),
    }
}

/// The pipeline itself.
pub fn extract_with(
    transport: &dyn Transport,
    page_url: &str,
    options: &ExtractOptions,
) -> Result<ExtractionResult, ExtractError> {
    let page = Url::parse(page_url)?;

    tracing::debug!("[{}] {}", Stage::Fetching, page);
    let response = transport.request(&TransportRequest::page(page.as_str()))?;

    tracing::debug!("[{}] HTTP {}", Stage::Validating, response.status_code);
    if response.status_code != 200 {
        return Err(ExtractError::BadStatus(response.status_code));
    }
    let body = match response.body {
        ResponseBody::Text(text) => text,
        other => return Err(ExtractError::BodyType(other.kind())),
    };

    tracing::debug!("[{}] {} byte page", Stage::Booting, body.len());
    let payload = dom::document_payload(&body)?;
    let mut worker = boot_realm(&payload, options)?;

    let all_scripts = scripts::locate_scripts(&body);
    let candidates = scripts::filter_scripts(&all_scripts, &options.marker);
    tracing::debug!(
        "[{}] {} inline scripts, {} contain {:?}",
        Stage::Locating,
        all_scripts.len(),
        candidates.len(),
        options.marker
    );

    // Scripts that returned, with or without an error. A stalled script leaves
    // its realm unusable, so these are replayed into a fresh one without it.
    let mut finished: Vec<&str> = Vec::with_capacity(candidates.len());
    let mut rebuilds = 0;
    for (index, script) in candidates.iter().copied().enumerate() {
        match run_script(&mut worker, script, options.script_timeout) {
            Ok(()) => {
                tracing::debug!("[{}] script {} ran", Stage::Executing, index);
                finished.push(script);
            }
            Err(SandboxError::Stalled) => {
                rebuilds += 1;
                if rebuilds > MAX_REBUILDS {
                    tracing::warn!(
                        "[{}] script {} stalled; {} realms already abandoned",
                        Stage::Executing,
                        index,
                        MAX_REBUILDS
                    );
                    return Err(ExtractError::ExtractionFailed);
                }
                tracing::warn!(
                    "[{}] script {} stalled; replaying {} earlier scripts in a fresh realm",
                    Stage::Executing,
                    index,
                    finished.len()
                );
                worker = rebuild_realm(&payload, &finished, options)?;
            }
            Err(_) => {
                tracing::debug!("[{}] script {} failed; continuing", Stage::Executing, index);
                finished.push(script);
            }
        }
    }

    let expression = target_href_expression(&options.target_id);
    let read_timeout = options.read_timeout;
    let read = worker
        .call(read_timeout, move |realm| {
            realm.read(&[(HREF_LABEL, expression.as_str())], read_timeout)
        })
        .and_then(|values| values);
    let values = match read {
        Ok(values) => values,
        Err(e) if e.is_fatal() => return Err(e.into()),
        Err(_) => ExtractedValues::new(),
    };
    drop(worker);

    let href = values
        .get(HREF_LABEL)
        .map(String::as_str)
        .filter(|s| !s.is_empty())
        .ok_or(ExtractError::ExtractionFailed)?;
    tracing::debug!("[{}] captured href {:?}", Stage::Reading, href);

    let download = resolve::resolve_href(&page, href).map_err(|e| {
        tracing::debug!("[{}] unresolvable href {:?}: {}", Stage::Resolving, href, e);
        ExtractError::ExtractionFailed
    })?;
    let filename = resolve::filename_from_url(&download);

    tracing::info!("extracted {} from {}", download, page);
    Ok(ExtractionResult {
        download: download.to_string(),
        filename,
    })
}

/// Spawns a realm thread and installs the document into it.
fn boot_realm(payload: &str, options: &ExtractOptions) -> Result<RealmWorker, ExtractError> {
    let mut worker = RealmWorker::spawn(options.limits, options.watchdog_grace)?;
    let payload = payload.to_string();
    let timeout = options.script_timeout;
    worker.call(timeout, move |realm| dom::install_payload(realm, &payload, timeout))??;
    Ok(worker)
}

/// Fresh realm with `replay` run in order. A replayed script that stalls
/// again fails the call.
fn rebuild_realm(
    payload: &str,
    replay: &[&str],
    options: &ExtractOptions,
) -> Result<RealmWorker, ExtractError> {
    let mut worker = boot_realm(payload, options)?;
    for script in replay {
        if let Err(SandboxError::Stalled) = run_script(&mut worker, script, options.script_timeout) {
            tracing::warn!("[{}] replayed script stalled", Stage::Executing);
            return Err(ExtractError::ExtractionFailed);
        }
    }
    Ok(worker)
}

fn run_script(worker: &mut RealmWorker, script: &str, timeout: Duration) -> Result<(), SandboxError> {
    let code = script.to_string();
    worker
        .call(timeout, move |realm| realm.run(&code, timeout))
        .and_then(|ran| ran)
}

/// `document.getElementById("<id>").href` with the id as a JS string literal.
fn target_href_expression(target_id: &str) -> String {
    let literal = serde_json::Value::String(target_id.to_string()).to_string();
    format!("document.getElementById({}).href", literal)
}
