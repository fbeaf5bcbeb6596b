//! Fatal error types returned from the public parsing entry points.
//!
//! Non-fatal conditions (an undefined aperture reference, a division by
//! zero inside a macro expression, an unknown extended command) never
//! reach this type — they are collected as [`crate::diagnostics::Diagnostic`]
//! on the parse outcome instead. Only conditions that make a file
//! unreadable end up here.

use thiserror::Error;

use crate::Rule;

/// Errors that can occur when parsing a Gerber file.
#[derive(Error, Debug)]
pub enum GerberError {
    #[error("failed to read gerber file")]
    Io(#[from] std::io::Error),

    #[error("syntax error")]
    Syntax(#[from] Box<pest::error::Error<Rule>>),

    #[error("{message}")]
    Semantic { message: String },

    #[error("include depth exceeded (max {max})")]
    IncludeDepthExceeded { max: usize },

    #[error("included file not found: {path}")]
    IncludeNotFound { path: String },
}

impl GerberError {
    pub fn semantic(message: impl Into<String>) -> Self {
        GerberError::Semantic { message: message.into() }
    }
}

impl From<pest::error::Error<Rule>> for GerberError {
    fn from(err: pest::error::Error<Rule>) -> Self {
        GerberError::Syntax(Box::new(err))
    }
}
