// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for funcy-core.
//!
//! Every failure of an invocation is terminal for that call and surfaces as a
//! single [`InvokeError`]. Only [`InvokeError::Business`] carries values: the
//! output the callable produced next to its own error.

use serde_json::Value;
use thiserror::Error;

/// Result type using InvokeError
pub type Result<T> = std::result::Result<T, InvokeError>;

/// Errors produced while resolving, coercing or invoking a registered function.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum InvokeError {
    /// No function is registered under the requested name.
    #[error("function {name} not found")]
    FunctionNotFound {
        /// The name that was looked up.
        name: String,
    },

    /// No record type is registered under the requested name.
    #[error("type {name} not found")]
    TypeNotFound {
        /// The name that was looked up.
        name: String,
    },

    /// Supplied argument count differs from the declared parameter count.
    #[error("function {function} expects {expected} argument(s), got {actual}")]
    ArityMismatch {
        /// The function being invoked.
        function: String,
        /// Declared parameter count.
        expected: usize,
        /// Supplied argument count.
        actual: usize,
    },

    /// A record parameter received something other than a map, or
    /// reconstruction nested deeper than allowed.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// What was wrong with the argument.
        message: String,
    },

    /// The input map names a field the record does not declare.
    #[error("no such field: {field} in struct {record}")]
    UnknownField {
        /// Record being reconstructed.
        record: String,
        /// Offending key.
        field: String,
    },

    /// The field exists but cannot be written from input.
    #[error("cannot set field {field} in struct {record}")]
    ImmutableField {
        /// Record being reconstructed.
        record: String,
        /// Offending field.
        field: String,
    },

    /// A field value has no conversion to the field's declared type.
    #[error("cannot convert field {field} of struct {record} from {from} to {to}")]
    FieldTypeConversion {
        /// Record being reconstructed.
        record: String,
        /// Offending field.
        field: String,
        /// Runtime type of the supplied value.
        from: String,
        /// Declared field type.
        to: String,
    },

    /// A positional argument has no conversion to its parameter type.
    #[error("cannot convert parameter {position} from {from} to {to}")]
    TypeConversion {
        /// 1-based argument position.
        position: usize,
        /// Runtime type of the supplied value.
        from: String,
        /// Declared parameter type.
        to: String,
    },

    /// The call mechanism rejected the prepared argument list or could not
    /// encode the returned values.
    #[error("failed to invoke {function}: {reason}")]
    Invocation {
        /// The function being invoked.
        function: String,
        /// Why the call mechanism failed.
        reason: String,
    },

    /// The callable reported its own error through its trailing error return.
    #[error("{message}")]
    Business {
        /// The function that failed.
        function: String,
        /// The callable's error message, verbatim.
        message: String,
        /// Values returned before the trailing error.
        partial: Vec<Value>,
    },

    /// The request is not a function invocation.
    #[error("unsupported request type: {kind}")]
    UnsupportedRequest {
        /// The request type that was received.
        kind: String,
    },
}

impl InvokeError {
    /// Get the error code string for this error type.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::FunctionNotFound { .. } => "FUNCTION_NOT_FOUND",
            Self::TypeNotFound { .. } => "TYPE_NOT_FOUND",
            Self::ArityMismatch { .. } => "ARITY_MISMATCH",
            Self::InvalidArgument { .. } => "INVALID_ARGUMENT",
            Self::UnknownField { .. } => "UNKNOWN_FIELD",
            Self::ImmutableField { .. } => "IMMUTABLE_FIELD",
            Self::FieldTypeConversion { .. } => "FIELD_TYPE_CONVERSION",
            Self::TypeConversion { .. } => "TYPE_CONVERSION",
            Self::Invocation { .. } => "INVOCATION_ERROR",
            Self::Business { .. } => "BUSINESS_ERROR",
            Self::UnsupportedRequest { .. } => "UNSUPPORTED_REQUEST",
        }
    }

    /// Whether a registry lookup failed.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::FunctionNotFound { .. } | Self::TypeNotFound { .. }
        )
    }

    /// Whether the error came from the callable rather than the engine.
    pub fn is_business(&self) -> bool {
        matches!(self, Self::Business { .. })
    }
}
