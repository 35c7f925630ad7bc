//! Error type for sandbox realm operations.

/// Outcome of a failed realm operation.
///
/// `Script` and `Read` are routine: page scripts are adversarial, buggy or
/// irrelevant, so their specific cause is logged at debug level and dropped.
/// `Isolation` and `Boot` mean the realm itself is unusable.
#[derive(Debug, thiserror::Error)]
pub enum SandboxError {
    /// The realm cannot guarantee a clean, prototype-free global. Never retried.
    #[error("sandbox isolation failure: {0}")]
    Isolation(String),
    /// Installing host-authored bindings (the emulated document) failed.
    #[error("sandbox boot failure: {0}")]
    Boot(String),
    /// A script threw, failed to parse, or ran past its deadline.
    #[error("script error")]
    Script,
    /// Requested values could not be serialized out of the realm.
    #[error("read error")]
    Read,
    /// A call did not return by its deadline plus grace, most likely stuck in
    /// native code the interrupt handler never reaches. The realm is abandoned.
    #[error("realm stalled")]
    Stalled,
}

impl SandboxError {
    /// True for failures that make the whole extraction call fail.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SandboxError::Isolation(_) | SandboxError::Boot(_))
    }
}
