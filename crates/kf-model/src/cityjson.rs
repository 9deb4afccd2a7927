// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Typed views over CityJSON and tu3djson documents
//!
//! Only the members needed for geometry validation are modelled. Unknown
//! members (attributes, metadata, semantics, ...) are ignored.

use crate::{ParseError, Result};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Vertex indices of one ring
pub type Ring = Vec<u32>;
/// Outer ring followed by inner rings
pub type PolygonRings = Vec<Ring>;
/// Polygons of one shell or surface
pub type ShellRings = Vec<PolygonRings>;
/// Outer shell followed by inner shells
pub type SolidShells = Vec<ShellRings>;

/// Document kind, read from the root `type` member
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DocumentKind {
    CityJson,
    Tu3dJson,
}

impl DocumentKind {
    /// Classify a parsed JSON value
    pub fn detect(value: &Value) -> Result<Self> {
        match value.get("type").and_then(Value::as_str) {
            Some("CityJSON") => Ok(DocumentKind::CityJson),
            Some("tu3djson") => Ok(DocumentKind::Tu3dJson),
            Some(other) => Err(ParseError::unsupported(other)),
            None => Err(ParseError::format("missing root \"type\" member")),
        }
    }

    /// Name as written in the `type` member
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::CityJson => "CityJSON",
            DocumentKind::Tu3dJson => "tu3djson",
        }
    }
}

/// Compressed-coordinates transform
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Transform {
    pub scale: [f64; 3],
    pub translate: [f64; 3],
}

impl Transform {
    /// Apply to one stored vertex
    #[inline]
    pub fn apply(&self, v: &[f64; 3]) -> [f64; 3] {
        [
            v[0] * self.scale[0] + self.translate[0],
            v[1] * self.scale[1] + self.translate[1],
            v[2] * self.scale[2] + self.translate[2],
        ]
    }
}

/// One geometry of a city object
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Geometry {
    Solid {
        boundaries: SolidShells,
    },
    MultiSurface {
        boundaries: ShellRings,
    },
    CompositeSurface {
        boundaries: ShellRings,
    },
    MultiSolid {
        boundaries: Vec<SolidShells>,
    },
    CompositeSolid {
        boundaries: Vec<SolidShells>,
    },
    GeometryInstance {
        template: usize,
        #[serde(default)]
        boundaries: Vec<u32>,
        #[serde(rename = "transformationMatrix", default)]
        transformation_matrix: Option<Vec<f64>>,
    },
    /// Points, lines and anything else that has no volume or area to validate
    #[serde(other)]
    Other,
}

impl Geometry {
    /// Name of the geometry type
    pub fn type_name(&self) -> &'static str {
        match self {
            Geometry::Solid { .. } => "Solid",
            Geometry::MultiSurface { .. } => "MultiSurface",
            Geometry::CompositeSurface { .. } => "CompositeSurface",
            Geometry::MultiSolid { .. } => "MultiSolid",
            Geometry::CompositeSolid { .. } => "CompositeSolid",
            Geometry::GeometryInstance { .. } => "GeometryInstance",
            Geometry::Other => "Other",
        }
    }
}

/// A city object
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct CityObject {
    #[serde(rename = "type")]
    pub object_type: String,
    #[serde(default)]
    pub geometry: Vec<Geometry>,
    #[serde(default)]
    pub children: Vec<String>,
    #[serde(default)]
    pub parents: Vec<String>,
}

impl CityObject {
    /// Building parts are validated together with their parent building
    pub fn is_building_part(&self) -> bool {
        self.object_type == "BuildingPart"
    }
}

/// Shared geometry templates
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct GeometryTemplates {
    #[serde(default)]
    pub templates: Vec<Geometry>,
    #[serde(rename = "vertices-templates", default)]
    pub vertices_templates: Vec<[f64; 3]>,
}

/// A CityJSON document
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct CityJson {
    #[serde(rename = "type")]
    pub doc_type: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(rename = "CityObjects", default)]
    pub city_objects: BTreeMap<String, CityObject>,
    #[serde(default)]
    pub vertices: Vec<[f64; 3]>,
    #[serde(default)]
    pub transform: Option<Transform>,
    #[serde(rename = "geometry-templates", default)]
    pub geometry_templates: Option<GeometryTemplates>,
}

impl CityJson {
    /// Build from a parsed JSON value
    pub fn from_value(value: &Value) -> Result<Self> {
        Ok(Self::deserialize(value)?)
    }

    /// Smallest x and y over all vertices, in real-world coordinates
    pub fn min_xy(&self) -> (f64, f64) {
        if self.vertices.is_empty() {
            return (0.0, 0.0);
        }
        let mut min_x = f64::INFINITY;
        let mut min_y = f64::INFINITY;
        for v in &self.vertices {
            min_x = min_x.min(v[0]);
            min_y = min_y.min(v[1]);
        }
        match &self.transform {
            // scale is positive in practice, so the minimum survives the transform
            Some(t) => (
                min_x * t.scale[0] + t.translate[0],
                min_y * t.scale[1] + t.translate[1],
            ),
            None => (min_x, min_y),
        }
    }
}

/// A tu3djson geometry with its own vertex list
#[derive(Clone, Debug, PartialEq)]
pub struct Tu3dGeometry {
    pub geometry: Geometry,
    pub vertices: Vec<[f64; 3]>,
}

#[derive(Deserialize)]
struct VertexList {
    #[serde(default)]
    vertices: Vec<[f64; 3]>,
}

impl Tu3dGeometry {
    /// Build from a bare geometry object (`{"type": "Solid", "boundaries": .., "vertices": ..}`)
    pub fn from_value(value: &Value) -> Result<Self> {
        let geometry = Geometry::deserialize(value)?;
        let VertexList { vertices } = VertexList::deserialize(value)?;
        Ok(Self { geometry, vertices })
    }
}

/// A tu3djson document
#[derive(Clone, Debug, PartialEq)]
pub struct Tu3dJson {
    pub features: Vec<Tu3dGeometry>,
}

#[derive(Deserialize)]
struct RawTu3dJson {
    #[serde(default)]
    features: Vec<RawTu3dFeature>,
}

#[derive(Deserialize)]
struct RawTu3dFeature {
    geometry: Value,
}

impl Tu3dJson {
    /// Build from a parsed JSON value
    pub fn from_value(value: &Value) -> Result<Self> {
        let raw = RawTu3dJson::deserialize(value)?;
        let features = raw
            .features
            .iter()
            .map(|f| Tu3dGeometry::from_value(&f.geometry))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { features })
    }
}
