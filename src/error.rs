//! Error types for the DOCX MCP server.

use schemars::JsonSchema;
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur in the DOCX MCP server.
#[derive(Debug, Error)]
pub enum DocxServerError {
    /// Document handle is unknown or was already closed.
    #[error("Invalid document handle: {0}")]
    InvalidHandle(String),

    /// The file to open does not exist.
    #[error("File not found: {0}")]
    NotFound(String),

    /// The codec rejected the file content.
    #[error("Invalid document format: {0}")]
    Format(String),

    /// Position out of range, or a block of the wrong kind.
    #[error("Invalid index: {0}")]
    InvalidIndex(String),

    /// Style name does not resolve against the document's style sheet.
    #[error("Invalid style: {0}")]
    InvalidStyle(String),

    /// Command name is not in the command table.
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    /// Bad argument shape, type or range.
    #[error("Invalid arguments: {0}")]
    Validation(String),

    /// Save requested without a path on a document that never had one.
    #[error("No save path for document {0}; pass a path to save_document")]
    NoPath(String),

    /// Too many documents are open.
    #[error("Too many open documents (limit: {0})")]
    ResourceExhausted(usize),

    /// Base64 decoding error.
    #[error("Base64 decode error: {0}")]
    Base64Error(#[from] base64::DecodeError),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Internal error (unexpected state).
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Closed set of error kinds reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
pub enum ErrorKind {
    #[serde(rename = "InvalidHandleError")]
    InvalidHandle,
    #[serde(rename = "NotFoundError")]
    NotFound,
    #[serde(rename = "FormatError")]
    Format,
    #[serde(rename = "IOError")]
    Io,
    #[serde(rename = "InvalidIndexError")]
    InvalidIndex,
    #[serde(rename = "InvalidStyleError")]
    InvalidStyle,
    #[serde(rename = "UnknownCommandError")]
    UnknownCommand,
    #[serde(rename = "ValidationError")]
    Validation,
    #[serde(rename = "NoPathError")]
    NoPath,
    #[serde(rename = "ResourceExhaustedError")]
    ResourceExhausted,
    #[serde(rename = "InternalError")]
    Internal,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::InvalidHandle => "InvalidHandleError",
            ErrorKind::NotFound => "NotFoundError",
            ErrorKind::Format => "FormatError",
            ErrorKind::Io => "IOError",
            ErrorKind::InvalidIndex => "InvalidIndexError",
            ErrorKind::InvalidStyle => "InvalidStyleError",
            ErrorKind::UnknownCommand => "UnknownCommandError",
            ErrorKind::Validation => "ValidationError",
            ErrorKind::NoPath => "NoPathError",
            ErrorKind::ResourceExhausted => "ResourceExhaustedError",
            ErrorKind::Internal => "InternalError",
        }
    }
}

/// Structured error returned across the transport boundary.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ErrorPayload {
    /// Error kind.
    pub kind: ErrorKind,
    /// Human-readable message.
    pub message: String,
}

impl DocxServerError {
    /// Create an internal error with a message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Create a validation error with a message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create an invalid-index error with a message.
    pub fn invalid_index(msg: impl Into<String>) -> Self {
        Self::InvalidIndex(msg.into())
    }

    /// Create a format error from any displayable codec failure.
    pub fn format(err: impl std::fmt::Display) -> Self {
        Self::Format(err.to_string())
    }

    /// The caller-visible kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidHandle(_) => ErrorKind::InvalidHandle,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Format(_) => ErrorKind::Format,
            Self::InvalidIndex(_) => ErrorKind::InvalidIndex,
            Self::InvalidStyle(_) => ErrorKind::InvalidStyle,
            Self::UnknownCommand(_) => ErrorKind::UnknownCommand,
            Self::Validation(_) | Self::Base64Error(_) | Self::JsonError(_) => {
                ErrorKind::Validation
            }
            Self::NoPath(_) => ErrorKind::NoPath,
            Self::ResourceExhausted(_) => ErrorKind::ResourceExhausted,
            Self::IoError(_) => ErrorKind::Io,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Convert into the structured payload sent to callers.
    pub fn to_payload(&self) -> ErrorPayload {
        ErrorPayload {
            kind: self.kind(),
            message: self.to_string(),
        }
    }
}

/// Result type for DOCX MCP server operations.
pub type Result<T> = std::result::Result<T, DocxServerError>;
