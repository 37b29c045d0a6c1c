//! The crate's single failure type.
//!
//! Every public, fallible operation in this crate returns `Result<T, Error>`. Unlike a pipeline
//! with genuinely separate stages (parse/compile/run), the operations here can fail with any of
//! these kinds from a single call site (`apply`, for instance, can surface `TypeMismatch`,
//! `UnknownName`, `ModeError`, or `NoneAsFunArg` depending on what is selected), so one flat enum
//! keeps call-site matches exhaustive without a layer that would only ever have one variant live.

use std::fmt;

use crate::types::Type;

/// Every failure kind the engine can produce.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Unification could not find a solution for a pair of terms.
    NoSolution { left: Type, right: Type },
    /// A type outside the supported fragment survived unification (list of list, list of function).
    UnsupportedType { ty: Type },
    /// Argument types failed to unify with a function's declared input signature.
    TypeMismatch { expected: Type, found: Type },
    /// The unknown sentinel was passed where a function argument was required.
    NoneAsFunArg,
    /// A runtime failure inside `compute` (divide by zero, head of empty list, recursion too deep, ...).
    RuntimeError { message: String },
    /// A name was looked up in a registry it does not belong to.
    UnknownName { name: String },
    /// An operation was attempted in a mode that forbids it.
    ModeError { message: String },
    /// A newly produced instruction differs from the one already recorded at the cursor position.
    InvariantMismatch { expected: String, found: String },
    /// A list index, or a branch-tree child, was missing.
    IndexOutOfRange { index: usize, len: usize },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSolution { left, right } => write!(f, "no solution unifying {left} = {right}"),
            Self::UnsupportedType { ty } => write!(f, "unsupported type: {ty}"),
            Self::TypeMismatch { expected, found } => {
                write!(f, "type mismatch: expected {expected}, found {found}")
            }
            Self::NoneAsFunArg => write!(f, "unknown value passed as a function argument"),
            Self::RuntimeError { message } => write!(f, "runtime error: {message}"),
            Self::UnknownName { name } => write!(f, "unknown name: {name}"),
            Self::ModeError { message } => write!(f, "mode error: {message}"),
            Self::InvariantMismatch { expected, found } => {
                write!(f, "expected instruction {expected}, received {found}")
            }
            Self::IndexOutOfRange { index, len } => {
                write!(f, "index {index} out of range (len {len})")
            }
        }
    }
}

impl std::error::Error for Error {}

impl Error {
    pub(crate) fn unknown_name(name: impl Into<String>) -> Self {
        Self::UnknownName { name: name.into() }
    }

    pub(crate) fn runtime(message: impl Into<String>) -> Self {
        Self::RuntimeError { message: message.into() }
    }

    pub(crate) fn mode(message: impl Into<String>) -> Self {
        Self::ModeError { message: message.into() }
    }
}
