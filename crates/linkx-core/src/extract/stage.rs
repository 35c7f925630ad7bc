//! Pipeline stages, used to label log lines.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Stage {
    Fetching,
    Validating,
    Booting,
    Locating,
    Executing,
    Reading,
    Resolving,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Fetching => "fetching",
            Stage::Validating => "validating",
            Stage::Booting => "booting",
            Stage::Locating => "locating",
            Stage::Executing => "executing",
            Stage::Reading => "reading",
            Stage::Resolving => "resolving",
        };
        f.write_str(name)
    }
}
