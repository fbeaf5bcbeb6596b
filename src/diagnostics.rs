//! Non-fatal diagnostics collected while interpreting a Gerber file.
//!
//! This is the "succeeded, but..." channel described for the interpreter:
//! an undefined aperture reference, an out-of-range macro parameter, a
//! division by zero, or an unsupported extended command do not abort the
//! parse. They are recorded here and the interpreter carries on with the
//! best approximation it can make (usually: skip the offending item, or
//! treat the missing value as zero).

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Info,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
}

impl Diagnostic {
    pub fn warning(message: impl Into<String>) -> Self {
        Diagnostic { severity: Severity::Warning, message: message.into() }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Diagnostic { severity: Severity::Info, message: message.into() }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            Severity::Warning => "warning",
            Severity::Info => "info",
        };
        write!(f, "{}: {}", tag, self.message)
    }
}
