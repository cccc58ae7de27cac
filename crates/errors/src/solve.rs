//! Solver error types
//!
//! These are the flattened, cross-crate forms of the solver's structured
//! diagnostics. The solver crate keeps the full structure and converts into
//! these at its boundary.

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum SolveError {
    #[error("no usable selection exists: {message}")]
    Unsatisfiable {
        interfaces: Vec<String>,
        message: String,
    },

    #[error("no implementations known for: {}", interfaces.join(", "))]
    MissingInterface { interfaces: Vec<String> },
}

impl UserFacingError for SolveError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::Unsatisfiable { .. } => Some(
                "Relax the stability policy (help_with_testing), allow network use, or refresh the feeds.",
            ),
            Self::MissingInterface { .. } => {
                Some("Check the interface URI and that its feeds are in the catalog.")
            }
        }
    }

    fn is_retryable(&self) -> bool {
        false
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::Unsatisfiable { .. } => "solve.unsatisfiable",
            Self::MissingInterface { .. } => "solve.missing_interface",
        };
        Some(code)
    }
}
