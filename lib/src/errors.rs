use thiserror::Error;

use crate::re::parser::SyntaxError;
use crate::replace::TemplateError;

/// Errors returned by this crate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// The pattern is not a valid regexp.
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    /// The replacement template is not valid for the regexp.
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// The compiled program would have more instructions than allowed.
    #[error("regexp too large, it exceeds {limit} instructions")]
    TooLarge {
        /// The configured maximum program size.
        limit: usize,
    },

    /// The search executed more instructions than allowed.
    #[error("search aborted after executing {limit} instructions")]
    StepLimitExceeded {
        /// The configured step limit.
        limit: u64,
    },
}
