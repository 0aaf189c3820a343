//! Error taxonomy shared by every operation in the crate.
//!
//! Construction errors are raised while a handle is being built and never
//! deferred to invocation. Invocation errors are raised only by a concrete
//! call. Every variant corresponds to a host throwable class so that
//! `catch_exception` handlers observe runtime-raised errors and
//! target-thrown throwables uniformly.

use std::sync::Arc;

use thiserror::Error;

use crate::host::{
    builtins,
    class::ClassRef,
    object::{Instance, ObjectRef},
};

pub type InvokeResult<T> = Result<T, InvokeError>;

#[derive(Debug, Clone, Error)]
pub enum InvokeError {
    #[error("illegal argument: {0}")]
    IllegalArgument(String),
    #[error("illegal access: {0}")]
    IllegalAccess(String),
    #[error("no such method: {0}")]
    NoSuchMethod(String),
    #[error("no such field: {0}")]
    NoSuchField(String),
    #[error("null reference: {0}")]
    NullPointer(String),
    #[error("class cast: {0}")]
    ClassCast(String),
    #[error("wrong method type: {0}")]
    WrongMethodType(String),
    #[error("wrong number of arguments: expected {expected}, got {actual}")]
    ArityMismatch { expected: usize, actual: usize },
    #[error("illegal state: {0}")]
    IllegalState(String),
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),
    #[error("index {index} out of bounds for length {length}")]
    IndexOutOfBounds { index: i64, length: usize },
    #[error("negative array size: {0}")]
    NegativeArraySize(i64),
    #[error("arithmetic: {0}")]
    Arithmetic(String),
    #[error("linkage error: {0}")]
    Linkage(String),
    #[error("bootstrap method error: {0}")]
    Bootstrap(String),
    #[error("{}", describe_thrown(.0))]
    Thrown(ObjectRef),
}

fn describe_thrown(object: &ObjectRef) -> String {
    match object.message() {
        Some(message) => format!("{}: {}", object.class().name(), message),
        None => object.class().name().to_string(),
    }
}

impl InvokeError {
    /// Host class of the throwable this error stands for.
    pub fn exception_class(&self) -> ClassRef {
        let core = builtins::core();
        match self {
            InvokeError::IllegalArgument(_) => core.illegal_argument.clone(),
            InvokeError::IllegalAccess(_) => core.illegal_access.clone(),
            InvokeError::NoSuchMethod(_) => core.no_such_method.clone(),
            InvokeError::NoSuchField(_) => core.no_such_field.clone(),
            InvokeError::NullPointer(_) => core.null_pointer.clone(),
            InvokeError::ClassCast(_) => core.class_cast.clone(),
            InvokeError::WrongMethodType(_) => core.wrong_method_type.clone(),
            InvokeError::ArityMismatch { .. } => core.arity_mismatch.clone(),
            InvokeError::IllegalState(_) => core.illegal_state.clone(),
            InvokeError::UnsupportedOperation(_) => core.unsupported_operation.clone(),
            InvokeError::IndexOutOfBounds { .. } => core.array_index_out_of_bounds.clone(),
            InvokeError::NegativeArraySize(_) => core.negative_array_size.clone(),
            InvokeError::Arithmetic(_) => core.arithmetic.clone(),
            InvokeError::Linkage(_) => core.linkage_error.clone(),
            InvokeError::Bootstrap(_) => core.bootstrap_error.clone(),
            InvokeError::Thrown(object) => object.class().clone(),
        }
    }

    /// Materializes the throwable handed to exception handlers.
    ///
    /// A thrown object is returned as-is so handlers can rethrow the
    /// identical instance.
    pub fn to_throwable(&self) -> ObjectRef {
        match self {
            InvokeError::Thrown(object) => object.clone(),
            other => {
                let message: Arc<str> = other.message().into();
                Instance::throwable(&other.exception_class(), Some(message))
            }
        }
    }

    /// Rebuilds an error from a throwable value raised by a target.
    pub fn from_throwable(object: ObjectRef) -> InvokeError {
        InvokeError::Thrown(object)
    }

    /// Message text without the category prefix.
    pub fn message(&self) -> String {
        match self {
            InvokeError::IllegalArgument(m)
            | InvokeError::IllegalAccess(m)
            | InvokeError::NoSuchMethod(m)
            | InvokeError::NoSuchField(m)
            | InvokeError::NullPointer(m)
            | InvokeError::ClassCast(m)
            | InvokeError::WrongMethodType(m)
            | InvokeError::IllegalState(m)
            | InvokeError::UnsupportedOperation(m)
            | InvokeError::Arithmetic(m)
            | InvokeError::Linkage(m)
            | InvokeError::Bootstrap(m) => m.clone(),
            InvokeError::Thrown(object) => object
                .message()
                .map(|m| m.to_string())
                .unwrap_or_default(),
            other => other.to_string(),
        }
    }

    /// Whether the error is a link-time failure (a `LinkageError` subclass).
    pub fn is_linkage(&self) -> bool {
        self.exception_class()
            .is_subclass_of(&builtins::core().linkage_error)
    }
}

pub(crate) fn illegal_argument(message: impl Into<String>) -> InvokeError {
    InvokeError::IllegalArgument(message.into())
}

pub(crate) fn arity_mismatch(expected: usize, actual: usize) -> InvokeError {
    InvokeError::ArityMismatch { expected, actual }
}

/// Builds the "types do not match" message used by the combinators.
pub(crate) fn mismatched_types(what: &str, left: impl std::fmt::Display, right: impl std::fmt::Display) -> InvokeError {
    InvokeError::IllegalArgument(format!("{what} do not match: {left} != {right}"))
}
