//! Test helpers shared by unit tests.

use std::sync::{Arc, Mutex};

use crate::diagnostics::{Diagnose, Diagnostic, DiagnosticKind};

/// Sink recording every diagnostic it receives.
#[derive(Default)]
pub(crate) struct Recorder {
    seen: Mutex<Vec<Diagnostic>>,
}

impl Recorder {
    pub(crate) fn arc() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn kinds(&self) -> Vec<DiagnosticKind> {
        self.seen.lock().unwrap().iter().map(|d| d.kind).collect()
    }

    pub(crate) fn reasons(&self, kind: DiagnosticKind) -> Vec<String> {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.kind == kind)
            .map(|d| d.reason.as_deref().unwrap_or_default().to_string())
            .collect()
    }
}

impl Diagnose for Recorder {
    fn on_diagnostic(&self, d: &Diagnostic) {
        self.seen.lock().unwrap().push(d.clone());
    }

    fn name(&self) -> &'static str {
        "recorder"
    }
}

/// Shared, ordered log of strings appended by test callbacks.
#[derive(Clone, Default)]
pub(crate) struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub(crate) fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub(crate) fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}
