// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for document parsing

use thiserror::Error;

/// Result type alias for document operations
pub type Result<T> = std::result::Result<T, ParseError>;

/// Errors that can occur while turning JSON into a typed document
#[derive(Error, Debug)]
pub enum ParseError {
    /// Document structure does not match the expected format
    #[error("Invalid document format: {0}")]
    InvalidFormat(String),

    /// The root `type` member names a format we do not handle
    #[error("Unsupported document type: {0}")]
    UnsupportedDocument(String),

    /// JSON syntax or shape error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ParseError {
    /// Create a new format error
    pub fn format(msg: impl Into<String>) -> Self {
        ParseError::InvalidFormat(msg.into())
    }

    /// Create an unsupported document error
    pub fn unsupported(doc_type: impl Into<String>) -> Self {
        ParseError::UnsupportedDocument(doc_type.into())
    }
}
