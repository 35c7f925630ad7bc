//! Sandbox controller: one isolated script realm per extraction call.
//!
//! The realm is a QuickJS context whose global object has no prototype and no
//! host-provided functions. Every call into it is bounded by a wall-clock
//! deadline, and the only thing that ever leaves it is a primitive string
//! produced by [`SandboxRealm::read`].

mod deadline;
mod error;
mod worker;

pub use error::SandboxError;
pub use worker::{RealmWorker, DEFAULT_GRACE};

use std::collections::BTreeMap;
use std::time::Duration;

use rquickjs::context::{intrinsic, EvalOptions};
use rquickjs::{CatchResultExt, CaughtError, Context, Ctx, FromJs, Function, Runtime, Value};

use deadline::DeadlineGuard;

/// Label → primitive string, as serialized inside the realm.
pub type ExtractedValues = BTreeMap<String, String>;

/// Standard built-ins available to page scripts. `Performance` is left out:
/// it installs an enumerable `performance` member on the global object.
type PageIntrinsics = (
    intrinsic::Date,
    intrinsic::Eval,
    intrinsic::RegExpCompiler,
    intrinsic::RegExp,
    intrinsic::Json,
    intrinsic::Proxy,
    intrinsic::MapSet,
    intrinsic::TypedArrays,
    intrinsic::Promise,
    intrinsic::BigInt,
    intrinsic::WeakRef,
);

/// Resource caps applied to a realm's runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RealmLimits {
    pub memory_limit_bytes: usize,
    pub max_stack_bytes: usize,
}

impl Default for RealmLimits {
    fn default() -> Self {
        Self {
            memory_limit_bytes: 64 * 1024 * 1024,
            max_stack_bytes: 1024 * 1024,
        }
    }
}

/// An isolated execution realm. Not shared, not reused: create one per call.
pub struct SandboxRealm {
    runtime: Runtime,
    context: Context,
}

impl SandboxRealm {
    /// Allocates a fresh realm and asserts its global is isolated.
    ///
    /// Any failure here is fatal for the caller: without a prototype-free
    /// global the rest of the pipeline has no isolation guarantee.
    pub fn create(limits: RealmLimits) -> Result<Self, SandboxError> {
        let runtime = Runtime::new()
            .map_err(|e| SandboxError::Isolation(format!("runtime allocation failed: {}", e)))?;
        runtime.set_memory_limit(limits.memory_limit_bytes);
        runtime.set_max_stack_size(limits.max_stack_bytes);
        let context = Context::custom::<PageIntrinsics>(&runtime)
            .map_err(|e| SandboxError::Isolation(format!("context allocation failed: {}", e)))?;

        context.with(|ctx| {
            ctx.globals()
                .set_prototype(None)
                .map_err(|e| SandboxError::Isolation(format!("detach global prototype: {}", e)))?;
            assert_isolated(&ctx)
        })?;

        tracing::debug!(
            "sandbox realm created (memory limit {} bytes, stack {} bytes)",
            limits.memory_limit_bytes,
            limits.max_stack_bytes
        );
        Ok(Self { runtime, context })
    }

    /// Evaluates `installer` (a function expression) and calls it with the
    /// realm's global object and `payload`. Used to boot per-call bindings
    /// such as the emulated document.
    pub fn install(
        &self,
        installer: &str,
        payload: &str,
        timeout: Duration,
    ) -> Result<(), SandboxError> {
        let guard = DeadlineGuard::arm(&self.runtime, timeout);
        let result = self.context.with(|ctx| {
            let function: Function = eval_sloppy(&ctx, installer).map_err(|e| e.to_string())?;
            function
                .call::<_, ()>((ctx.globals(), payload.to_string()))
                .catch(&ctx)
                .map_err(|e| e.to_string())
        });
        result.map_err(|msg| {
            if guard.fired() {
                SandboxError::Boot(format!("timed out after {:?}", guard.elapsed()))
            } else {
                SandboxError::Boot(msg)
            }
        })
    }

    /// Runs untrusted `code` against the realm. Every failure, including a
    /// blown deadline, collapses to [`SandboxError::Script`].
    pub fn run(&self, code: &str, timeout: Duration) -> Result<(), SandboxError> {
        let guard = DeadlineGuard::arm(&self.runtime, timeout);
        let result = self
            .context
            .with(|ctx| eval_sloppy::<()>(&ctx, code).map_err(|e| e.to_string()));
        result.map_err(|msg| {
            if guard.fired() {
                tracing::debug!("script interrupted after {:?}", guard.elapsed());
            } else {
                tracing::debug!("script failed: {}", msg);
            }
            SandboxError::Script
        })
    }

    /// Serializes each `(label, expression)` inside the realm and returns the
    /// string-valued results.
    ///
    /// The wrapper forces the serialized object to a primitive with `'' + …`
    /// before it leaves the realm; anything other than a string coming back is
    /// a read error. Labels whose value is not a string are absent from the map.
    pub fn read(
        &self,
        expressions: &[(&str, &str)],
        timeout: Duration,
    ) -> Result<ExtractedValues, SandboxError> {
        let wrapper = read_wrapper(expressions)?;
        let guard = DeadlineGuard::arm(&self.runtime, timeout);
        let raw = self.context.with(|ctx| -> Result<String, String> {
            let value: Value = eval_sloppy(&ctx, &wrapper).map_err(|e| e.to_string())?;
            match value.as_string() {
                Some(s) => s.to_string().map_err(|e| e.to_string()),
                None => Err(format!("read produced {:?}", value.type_of())),
            }
        });
        let raw = raw.map_err(|msg| {
            if guard.fired() {
                tracing::debug!("read interrupted after {:?}", guard.elapsed());
            } else {
                tracing::debug!("read failed: {}", msg);
            }
            SandboxError::Read
        })?;
        drop(guard);
        parse_read_result(&raw)
    }
}

/// Checks the global object of a fresh context: no prototype, no enumerable
/// own members, no inherited string conversion.
fn assert_isolated(ctx: &Ctx<'_>) -> Result<(), SandboxError> {
    let global = ctx.globals();
    if global.get_prototype().is_some() {
        return Err(SandboxError::Isolation(
            "global object still has a prototype".to_string(),
        ));
    }
    if let Some(key) = global.keys::<String>().next() {
        let key = key.map_err(|e| SandboxError::Isolation(format!("enumerate globals: {}", e)))?;
        return Err(SandboxError::Isolation(format!(
            "global object exposes enumerable member `{}`",
            key
        )));
    }
    let to_string: Value = global
        .get("toString")
        .map_err(|e| SandboxError::Isolation(format!("read global toString: {}", e)))?;
    if !to_string.is_undefined() {
        return Err(SandboxError::Isolation(
            "global object inherits toString".to_string(),
        ));
    }
    Ok(())
}

/// Page scripts are classic scripts: global scope, sloppy mode.
fn eval_sloppy<'js, V: FromJs<'js>>(ctx: &Ctx<'js>, code: &str) -> Result<V, CaughtError<'js>> {
    let mut options = EvalOptions::default();
    options.global = true;
    options.strict = false;
    ctx.eval_with_options(code, options).catch(ctx)
}

fn read_wrapper(expressions: &[(&str, &str)]) -> Result<String, SandboxError> {
    let mut members = Vec::with_capacity(expressions.len());
    for (label, expression) in expressions {
        let key = serde_json::to_string(label).map_err(|_| SandboxError::Read)?;
        members.push(format!(
            "{}: (function () {{ return ({}); }})()",
            key, expression
        ));
    }
    Ok(format!("'' + JSON.stringify({{\n{}\n}})", members.join(",\n")))
}

fn parse_read_result(raw: &str) -> Result<ExtractedValues, SandboxError> {
    let parsed: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(raw).map_err(|e| {
            tracing::debug!("read result is not a JSON object: {}", e);
            SandboxError::Read
        })?;
    Ok(parsed
        .into_iter()
        .filter_map(|(label, value)| match value {
            serde_json::Value::String(s) => Some((label, s)),
            _ => None,
        })
        .collect())
}
