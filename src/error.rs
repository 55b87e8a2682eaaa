//! Typed errors for failures callers match on
//!
//! Everything else travels as `anyhow::Error` with context attached at the
//! boundary where it happened.

use std::io::Error as IoError;
use std::path::PathBuf;

use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Shell-level failures
#[derive(Debug, Error)]
pub enum ShellError {
    /// No application with this name is installed
    #[error("Unknown application: {0}")]
    UnknownApp(String),

    /// A manifest names a module the registry does not provide
    #[error("Unknown module '{module}' for application '{app}'")]
    UnknownModule { app: String, module: String },

    /// The module does not recognise the manifest's entry point
    #[error("Module '{module}' has no entry point '{entry}'")]
    UnknownEntry { module: String, entry: String },

    /// Re-entrant use of an application's module
    #[error("Module of '{0}' is busy")]
    ModuleBusy(String),

    /// Error recovery itself failed; the process must exit
    #[error("Fatal: {0}")]
    Fatal(String),
}

impl ShellError {
    /// Failures that end the process rather than being recovered from
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }
}

/// Persisted key-value store failures
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Data store I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: IoError,
    },

    #[error("Data store at {} is not valid JSON: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: SerdeJsonError,
    },

    #[error("Data store at {} is not a JSON object", path.display())]
    NotAnObject { path: PathBuf },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = ShellError::UnknownModule {
            app: "clock".to_owned(),
            module: "clocks".to_owned(),
        };
        assert_eq!(error.to_string(), "Unknown module 'clocks' for application 'clock'");
        assert!(!error.is_fatal());
        assert!(ShellError::Fatal("report".to_owned()).is_fatal());

        let store = StoreError::NotAnObject {
            path: PathBuf::from("/tmp/a.ds"),
        };
        assert_eq!(store.to_string(), "Data store at /tmp/a.ds is not a JSON object");
    }
}
