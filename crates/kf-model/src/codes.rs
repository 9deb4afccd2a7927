// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Validation error codes
//!
//! Codes are grouped by the level they apply to: 1xx rings, 2xx polygons,
//! 3xx shells, 4xx solids, 5xx solid aggregates and 9xx whole datasets.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A validation error code
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ========================================================================
    // Rings
    // ========================================================================
    TooFewPoints = 101,
    ConsecutivePointsSame = 102,
    RingSelfIntersection = 104,

    // ========================================================================
    // Polygons
    // ========================================================================
    IntersectionRings = 201,
    DuplicatedRings = 202,
    NonPlanarPolygonDistancePlane = 203,
    NonPlanarPolygonNormalsDeviation = 204,
    InnerRingOutside = 206,
    InnerRingsNested = 207,
    OrientationRingsSame = 208,

    // ========================================================================
    // Shells
    // ========================================================================
    TooFewPolygons = 301,
    ShellNotClosed = 302,
    NonManifoldCase = 303,
    MultipleConnectedComponents = 305,
    PolygonWronglyOriented = 307,

    // ========================================================================
    // Solids and aggregates
    // ========================================================================
    DuplicatedShells = 402,
    InnerShellOutside = 403,
    WrongOrientationShell = 405,
    DuplicatedSolids = 502,

    // ========================================================================
    // Dataset
    // ========================================================================
    InvalidInputFile = 901,
    EmptyPrimitive = 902,
    WrongInputParameters = 903,
}

impl ErrorCode {
    /// Every code, in ascending numeric order
    pub const ALL: [ErrorCode; 22] = [
        ErrorCode::TooFewPoints,
        ErrorCode::ConsecutivePointsSame,
        ErrorCode::RingSelfIntersection,
        ErrorCode::IntersectionRings,
        ErrorCode::DuplicatedRings,
        ErrorCode::NonPlanarPolygonDistancePlane,
        ErrorCode::NonPlanarPolygonNormalsDeviation,
        ErrorCode::InnerRingOutside,
        ErrorCode::InnerRingsNested,
        ErrorCode::OrientationRingsSame,
        ErrorCode::TooFewPolygons,
        ErrorCode::ShellNotClosed,
        ErrorCode::NonManifoldCase,
        ErrorCode::MultipleConnectedComponents,
        ErrorCode::PolygonWronglyOriented,
        ErrorCode::DuplicatedShells,
        ErrorCode::InnerShellOutside,
        ErrorCode::WrongOrientationShell,
        ErrorCode::DuplicatedSolids,
        ErrorCode::InvalidInputFile,
        ErrorCode::EmptyPrimitive,
        ErrorCode::WrongInputParameters,
    ];

    /// Numeric value of the code
    #[inline]
    pub fn code(self) -> u16 {
        self as u16
    }

    /// Look up a code by its numeric value
    pub fn from_code(code: u16) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.code() == code)
    }

    /// Canonical upper-case name
    pub fn name(self) -> &'static str {
        match self {
            ErrorCode::TooFewPoints => "TOO_FEW_POINTS",
            ErrorCode::ConsecutivePointsSame => "CONSECUTIVE_POINTS_SAME",
            ErrorCode::RingSelfIntersection => "RING_SELF_INTERSECTION",
            ErrorCode::IntersectionRings => "INTERSECTION_RINGS",
            ErrorCode::DuplicatedRings => "DUPLICATED_RINGS",
            ErrorCode::NonPlanarPolygonDistancePlane => "NON_PLANAR_POLYGON_DISTANCE_PLANE",
            ErrorCode::NonPlanarPolygonNormalsDeviation => "NON_PLANAR_POLYGON_NORMALS_DEVIATION",
            ErrorCode::InnerRingOutside => "INNER_RING_OUTSIDE",
            ErrorCode::InnerRingsNested => "INNER_RINGS_NESTED",
            ErrorCode::OrientationRingsSame => "ORIENTATION_RINGS_SAME",
            ErrorCode::TooFewPolygons => "TOO_FEW_POLYGONS",
            ErrorCode::ShellNotClosed => "SHELL_NOT_CLOSED",
            ErrorCode::NonManifoldCase => "NON_MANIFOLD_CASE",
            ErrorCode::MultipleConnectedComponents => "MULTIPLE_CONNECTED_COMPONENTS",
            ErrorCode::PolygonWronglyOriented => "POLYGON_WRONGLY_ORIENTED",
            ErrorCode::DuplicatedShells => "DUPLICATED_SHELLS",
            ErrorCode::InnerShellOutside => "INNER_SHELL_OUTSIDE",
            ErrorCode::WrongOrientationShell => "WRONG_ORIENTATION_SHELL",
            ErrorCode::DuplicatedSolids => "DUPLICATED_SOLIDS",
            ErrorCode::InvalidInputFile => "INVALID_INPUT_FILE",
            ErrorCode::EmptyPrimitive => "EMPTY_PRIMITIVE",
            ErrorCode::WrongInputParameters => "WRONG_INPUT_PARAMETERS",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -- {}", self.code(), self.name())
    }
}

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

impl TryFrom<u16> for ErrorCode {
    type Error = String;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        ErrorCode::from_code(value).ok_or_else(|| format!("unknown error code {}", value))
    }
}
