//! CLI error handling

use std::fmt;

use serde_json::json;
use zi_errors::UserFacingError;
use zi_solver::SolveFailure;

/// CLI-specific error type
#[derive(Debug)]
pub enum CliError {
    /// Configuration, catalog or storage error
    Zi(zi_errors::Error),
    /// The solver found no usable selection
    Solve(SolveFailure),
    /// Invalid command arguments
    InvalidArguments(String),
    /// I/O error
    Io(std::io::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Zi(e) => write_user_facing(f, e),
            CliError::Solve(failure) => {
                write!(f, "{failure}")?;
                let e = zi_errors::Error::from(failure.clone());
                if let Some(code) = e.user_code() {
                    write!(f, "\n  Code: {code}")?;
                }
                if let Some(hint) = e.user_hint() {
                    write!(f, "\n  Hint: {hint}")?;
                }
                Ok(())
            }
            CliError::InvalidArguments(msg) => write!(f, "Invalid arguments: {msg}"),
            CliError::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl CliError {
    /// Structured form printed in `--json` mode
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            CliError::Zi(e) => json!({
                "error": e.user_message(),
                "code": e.user_code(),
                "hint": e.user_hint(),
                "detail": e,
            }),
            CliError::Solve(failure) => {
                let e = zi_errors::Error::from(failure.clone());
                json!({
                    "error": failure.to_string(),
                    "code": e.user_code(),
                    "hint": e.user_hint(),
                    "detail": failure,
                })
            }
            CliError::InvalidArguments(_) | CliError::Io(_) => json!({ "error": self.to_string() }),
        }
    }
}

fn write_user_facing(f: &mut fmt::Formatter<'_>, e: &zi_errors::Error) -> fmt::Result {
    write!(f, "{}", e.user_message())?;
    if let Some(code) = e.user_code() {
        write!(f, "\n  Code: {code}")?;
    }
    if let Some(hint) = e.user_hint() {
        write!(f, "\n  Hint: {hint}")?;
    }
    if e.is_retryable() {
        write!(f, "\n  Retry: safe to retry this operation.")?;
    }
    Ok(())
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Zi(e) => Some(e),
            CliError::Solve(e) => Some(e),
            CliError::Io(e) => Some(e),
            CliError::InvalidArguments(_) => None,
        }
    }
}

impl From<zi_errors::Error> for CliError {
    fn from(e: zi_errors::Error) -> Self {
        CliError::Zi(e)
    }
}

impl From<SolveFailure> for CliError {
    fn from(e: SolveFailure) -> Self {
        CliError::Solve(e)
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e)
    }
}
