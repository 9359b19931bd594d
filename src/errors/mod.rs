use std::fmt;

use thiserror::Error;

use crate::typing::Ty;

pub type GenusResult<T = ()> = Result<T, GenusError>;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum GenusErrorKind {
    UnresolvedReference,
    UnresolvedName,
    Unreifiable,
    NoMatchingHandler,
    Definition,
}

impl fmt::Display for GenusErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                GenusErrorKind::UnresolvedReference => "unresolved reference",
                GenusErrorKind::UnresolvedName => "name error",
                GenusErrorKind::Unreifiable => "reification error",
                GenusErrorKind::NoMatchingHandler => "dispatch error",
                GenusErrorKind::Definition => "definition error",
            }
        )
    }
}

/// Errors raised by the descriptor model, the subtype relation and dispatch.
///
/// All of these signal a programming or configuration mistake; none are retried.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GenusError {
    #[error("reference `{0}` must be resolved before it can be compared")]
    UnresolvedReference(String),

    #[error("name `{name}` is not defined")]
    UnresolvedName { name: String },

    #[error("cannot reify `{expr}`: {reason}")]
    Unreifiable { expr: String, reason: String },

    #[error("no handler registered in `{registry}` matches `{query}`")]
    NoMatchingHandler { registry: String, query: Ty },

    #[error("cannot define class `{class}`: {reason}")]
    Definition { class: String, reason: String },
}

impl GenusError {
    pub fn unresolved_name<S: Into<String>>(name: S) -> Self {
        GenusError::UnresolvedName { name: name.into() }
    }

    pub fn unreifiable<E: fmt::Display, R: Into<String>>(expr: E, reason: R) -> Self {
        GenusError::Unreifiable {
            expr: expr.to_string(),
            reason: reason.into(),
        }
    }

    pub fn definition<C: Into<String>, R: Into<String>>(class: C, reason: R) -> Self {
        GenusError::Definition {
            class: class.into(),
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> GenusErrorKind {
        match self {
            GenusError::UnresolvedReference(_) => GenusErrorKind::UnresolvedReference,
            GenusError::UnresolvedName { .. } => GenusErrorKind::UnresolvedName,
            GenusError::Unreifiable { .. } => GenusErrorKind::Unreifiable,
            GenusError::NoMatchingHandler { .. } => GenusErrorKind::NoMatchingHandler,
            GenusError::Definition { .. } => GenusErrorKind::Definition,
        }
    }
}
