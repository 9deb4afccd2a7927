// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for geometry validation

use thiserror::Error;

/// Geometry validation result type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that prevent a document from being validated at all
///
/// Defects in the geometry itself are not errors; they end up in the
/// validation report.
#[derive(Error, Debug)]
pub enum Error {
    /// A boundary refers to a vertex that does not exist
    #[error("Vertex #{index} referenced by {owner} does not exist ({count} vertices)")]
    VertexIndex {
        owner: String,
        index: u32,
        count: usize,
    },

    /// A geometry instance refers to a template that does not exist
    #[error("Geometry template #{index} referenced by {owner} does not exist ({count} templates)")]
    TemplateIndex {
        owner: String,
        index: usize,
        count: usize,
    },

    /// Triangulation error
    #[error("Triangulation error: {0}")]
    Triangulation(String),

    /// Document could not be read as the expected format
    #[error(transparent)]
    Document(#[from] kf_model::ParseError),

    /// Text is not JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a triangulation error
    pub fn triangulation(msg: impl Into<String>) -> Self {
        Error::Triangulation(msg.into())
    }

    /// Create a vertex index error
    pub fn vertex_index(owner: impl Into<String>, index: u32, count: usize) -> Self {
        Error::VertexIndex {
            owner: owner.into(),
            index,
            count,
        }
    }

    /// Create a template index error
    pub fn template_index(owner: impl Into<String>, index: usize, count: usize) -> Self {
        Error::TemplateIndex {
            owner: owner.into(),
            index,
            count,
        }
    }
}
