//! Error types.
//!
//! Most misuse in Trellis is reported through `tracing` and degrades to a
//! no-op (see the crate docs). The errors here cover the cases where a caller
//! can meaningfully react: template compilation, application mounting, and
//! typed extraction from dynamic values.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, TrellisError>;

/// Any error produced by the crate.
#[derive(Debug, Error)]
pub enum TrellisError {
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    App(#[from] AppError),

    #[error(transparent)]
    Value(#[from] ValueError),
}

/// Template compilation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("interpolation at offset {offset} is missing closing delimiter `{delimiter}`")]
    UnterminatedInterpolation { offset: usize, delimiter: String },

    #[error("attribute value at offset {offset} is missing its closing quote")]
    UnterminatedAttributeValue { offset: usize },

    #[error("invalid attribute name at offset {offset}")]
    InvalidAttributeName { offset: usize },

    #[error("mismatched end tag at offset {offset}: expected </{expected}>, found </{found}>")]
    MismatchedEndTag {
        expected: String,
        found: String,
        offset: usize,
    },

    #[error("end tag </{tag}> at offset {offset} is missing `>`")]
    UnclosedEndTag { tag: String, offset: usize },

    #[error("invalid expression `{expression}`: {message}")]
    InvalidExpression { expression: String, message: String },
}

/// Application lifecycle failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    #[error("mount target not found: {0}")]
    ContainerNotFound(String),

    #[error("app is already mounted")]
    AlreadyMounted,

    #[error("app is not mounted")]
    NotMounted,
}

/// Typed extraction from a dynamic [`Value`](crate::Value) failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
}
