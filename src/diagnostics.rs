//! Reporting of non-fatal build problems.
//!
//! The emitter never stops on an authoring error. Unresolved references, failing
//! expressions and failing type-specific hooks are written to a [`DiagnosticSink`] and the
//! build carries on with a placeholder, so one pass shows every problem.

use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Output section a diagnostic belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Section {
    /// Problems found while emitting the blob.
    Output,
    /// Problems found while resolving project-level tables (variables, types).
    Checks,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// One reported problem, attributed to the object it concerns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub section: Section,
    pub severity: Severity,
    pub message: String,
    /// Path of the offending object, e.g. `flows/main/components/log1/properties/value`.
    pub object: String,
}

impl Diagnostic {
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.severity, self.message, self.object)
    }
}

/// Receiver for non-fatal build problems.
pub trait DiagnosticSink {
    fn write(&mut self, section: Section, severity: Severity, message: &str, object: &str);
}

/// Keeps every diagnostic and mirrors it to the `log` facade.
#[derive(Debug, Default)]
pub struct CollectingSink {
    entries: Vec<Diagnostic>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn error_count(&self) -> usize {
        self.entries.iter().filter(|d| d.is_error()).count()
    }

    pub fn into_entries(self) -> Vec<Diagnostic> {
        self.entries
    }
}

impl DiagnosticSink for CollectingSink {
    fn write(&mut self, section: Section, severity: Severity, message: &str, object: &str) {
        match severity {
            Severity::Error => error!("{}: {}", object, message),
            Severity::Warning => warn!("{}: {}", object, message),
            Severity::Info => info!("{}: {}", object, message),
        }
        self.entries.push(Diagnostic {
            section,
            severity,
            message: message.to_string(),
            object: object.to_string(),
        });
    }
}
