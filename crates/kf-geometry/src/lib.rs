// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # kf-lite Geometry Validation
//!
//! Geometric validation of CityJSON and tu3djson documents, reporting
//! problems with the numeric codes used by val3dity.
//!
//! ## Overview
//!
//! Validation runs bottom-up; a level is only checked once everything below
//! it is clean:
//!
//! - **Rings** (1xx): too few points, consecutive duplicates, self-intersection
//! - **Polygons** (2xx): planarity, ring intersections, hole placement and orientation
//! - **Shells** (3xx): closedness, manifoldness, connectivity, orientation
//! - **Solids** (4xx): duplicated shells, cavities outside or wrongly oriented
//! - **Multi/composite solids** (5xx): duplicated solids
//!
//! Problems with the document as a whole (9xx) are reported as dataset errors.
//! Features are validated in parallel with rayon.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use kf_geometry::validate_str;
//! use kf_model::ValidationOptions;
//!
//! let text = std::fs::read_to_string("cube.json")?;
//! let report = validate_str(&text, &ValidationOptions::default())?;
//! println!("valid: {}", report.validity);
//! ```

pub mod builder;
pub mod error;
pub mod polygon;
pub mod primitive;
pub mod shell;
pub mod surface;
pub mod triangulation;
pub mod validator;

// Re-export nalgebra types for convenience
pub use nalgebra::{Point2, Point3, Vector2, Vector3};

// Re-export main types
pub use builder::{PrimitiveBuilder, VertexSource, GENERIC_FEATURE_TYPE};
pub use error::{Error, Result};
pub use polygon::validate_polygon;
pub use primitive::{Body, Feature, Primitive, Solid};
pub use shell::{edge_stats, point_in_shell, signed_volume, validate_shell, EdgeStats};
pub use surface::Surface;
pub use triangulation::{
    calculate_polygon_normal, newell_normal, project_to_2d_with_basis,
    triangulate_polygon_with_holes,
};
pub use validator::{
    validate_cityjson, validate_features, validate_json, validate_one_geom, validate_str,
    validate_tu3djson,
};
