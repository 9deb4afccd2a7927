// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Builds features and primitives from parsed documents
//!
//! Vertex indices in boundaries are resolved to coordinates here, and every
//! shell/surface gets its own snapped vertex pool. Geometry templates are
//! built once; instances only carry the template's validation result.

use crate::primitive::{Body, Feature, Primitive, Solid};
use crate::surface::Surface;
use crate::{Error, Point3, Result};
use kf_model::{
    CityJson, Geometry, PrimitiveReport, ShellRings, SolidShells, Transform, Tu3dGeometry,
};
use std::sync::Arc;

/// Feature type given to tu3djson features and bare geometries
pub const GENERIC_FEATURE_TYPE: &str = "GenericObject";

/// Resolves boundary indices to coordinates
#[derive(Clone, Copy, Debug)]
pub struct VertexSource<'a> {
    coords: &'a [[f64; 3]],
    transform: Option<&'a Transform>,
    offset: (f64, f64),
}

impl<'a> VertexSource<'a> {
    /// Plain vertex list, used as is
    pub fn new(coords: &'a [[f64; 3]]) -> Self {
        Self {
            coords,
            transform: None,
            offset: (0.0, 0.0),
        }
    }

    /// Vertex list of a CityJSON document, moved so that its minimum x and y are at the origin
    pub fn cityjson(doc: &'a CityJson) -> Self {
        let (min_x, min_y) = doc.min_xy();
        Self {
            coords: &doc.vertices,
            transform: doc.transform.as_ref(),
            offset: (min_x, min_y),
        }
    }

    pub fn len(&self) -> usize {
        self.coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    pub fn offset(&self) -> (f64, f64) {
        self.offset
    }

    /// Coordinates of vertex `index`, if it exists
    pub fn get(&self, index: u32) -> Option<Point3<f64>> {
        let v = self.coords.get(index as usize)?;
        let v = match self.transform {
            Some(t) => t.apply(v),
            None => *v,
        };
        Some(Point3::new(v[0] - self.offset.0, v[1] - self.offset.1, v[2]))
    }

    fn resolve(&self, index: u32, owner: &str) -> Result<Point3<f64>> {
        self.get(index)
            .ok_or_else(|| Error::vertex_index(owner, index, self.coords.len()))
    }
}

/// Turns document geometries into primitives
pub struct PrimitiveBuilder {
    tol_snap: f64,
    /// Validation results of the geometry templates, by template index;
    /// `None` for templates that are not validated (points, lines)
    templates: Vec<Option<Arc<PrimitiveReport>>>,
}

impl PrimitiveBuilder {
    pub fn new(tol_snap: f64) -> Self {
        Self {
            tol_snap,
            templates: Vec::new(),
        }
    }

    /// Builder that resolves geometry instances against `templates`
    pub fn with_templates(tol_snap: f64, templates: Vec<Option<Arc<PrimitiveReport>>>) -> Self {
        Self {
            tol_snap,
            templates,
        }
    }

    fn surface(
        &self,
        rings: &ShellRings,
        shell: Option<usize>,
        vertices: &VertexSource<'_>,
        owner: &str,
    ) -> Result<Surface> {
        let mut surface = Surface::new(shell, self.tol_snap);
        for polygon in rings {
            let mut face = Vec::with_capacity(polygon.len());
            for ring in polygon {
                let ids = ring
                    .iter()
                    .map(|&i| vertices.resolve(i, owner).map(|p| surface.add_point(p)))
                    .collect::<Result<Vec<usize>>>()?;
                face.push(ids);
            }
            surface.add_face(face);
        }
        Ok(surface)
    }

    fn solid(&self, shells: &SolidShells, vertices: &VertexSource<'_>, owner: &str) -> Result<Solid> {
        let surfaces = shells
            .iter()
            .enumerate()
            .map(|(k, rings)| self.surface(rings, Some(k), vertices, owner))
            .collect::<Result<Vec<_>>>()?;
        // a solid without shells validates as an empty primitive
        Ok(Solid::from_shells(surfaces).unwrap_or_else(|| Solid::new(Surface::new(Some(0), self.tol_snap))))
    }

    fn solids(
        &self,
        solids: &[SolidShells],
        vertices: &VertexSource<'_>,
        owner: &str,
    ) -> Result<Vec<Solid>> {
        solids
            .iter()
            .map(|shells| self.solid(shells, vertices, owner))
            .collect()
    }

    /// Build the primitive for one geometry
    ///
    /// Returns `Ok(None)` for geometry types that are not validated (points, lines).
    pub fn build(
        &self,
        id: &str,
        geometry: &Geometry,
        vertices: &VertexSource<'_>,
    ) -> Result<Option<Primitive>> {
        let body = match geometry {
            Geometry::Solid { boundaries } => Body::Solid(self.solid(boundaries, vertices, id)?),
            Geometry::MultiSurface { boundaries } => {
                Body::MultiSurface(self.surface(boundaries, None, vertices, id)?)
            }
            Geometry::CompositeSurface { boundaries } => {
                Body::CompositeSurface(self.surface(boundaries, None, vertices, id)?)
            }
            Geometry::MultiSolid { boundaries } => {
                Body::MultiSolid(self.solids(boundaries, vertices, id)?)
            }
            Geometry::CompositeSolid { boundaries } => {
                Body::CompositeSolid(self.solids(boundaries, vertices, id)?)
            }
            Geometry::GeometryInstance { template, .. } => {
                let slot = self
                    .templates
                    .get(*template)
                    .ok_or_else(|| Error::template_index(id, *template, self.templates.len()))?;
                let Some(result) = slot else {
                    log::trace!("{}: template {} is not validated", id, template);
                    return Ok(None);
                };
                Body::Template {
                    index: *template,
                    result: Arc::clone(result),
                }
            }
            Geometry::Other => {
                log::trace!("{}: geometry type not validated", id);
                return Ok(None);
            }
        };
        Ok(Some(Primitive::new(id, body)))
    }
}

/// Build the geometry templates of a CityJSON document
///
/// Template vertices are used without translation. Templates are identified
/// by their index; templates of types that are not validated are `None`.
pub fn build_templates(doc: &CityJson, tol_snap: f64) -> Result<Vec<Option<Primitive>>> {
    let Some(gt) = &doc.geometry_templates else {
        return Ok(Vec::new());
    };
    let vertices = VertexSource::new(&gt.vertices_templates);
    // templates cannot refer to other templates
    let builder = PrimitiveBuilder::new(tol_snap);

    gt.templates
        .iter()
        .enumerate()
        .map(|(i, geometry)| builder.build(&i.to_string(), geometry, &vertices))
        .collect()
}

/// Build one feature per top-level city object
///
/// Building parts are not features of their own: the geometries of a
/// building's children are appended to the building's primitives.
pub fn build_cityjson_features(doc: &CityJson, builder: &PrimitiveBuilder) -> Result<Vec<Feature>> {
    let vertices = VertexSource::cityjson(doc);
    log::debug!(
        "{} city objects, {} vertices, offset ({}, {})",
        doc.city_objects.len(),
        vertices.len(),
        vertices.offset().0,
        vertices.offset().1
    );

    let mut features = Vec::new();
    for (coid, object) in &doc.city_objects {
        if object.is_building_part() {
            continue;
        }
        let mut feature = Feature::new(coid.as_str(), object.object_type.as_str());

        let mut geometries: Vec<&Geometry> = object.geometry.iter().collect();
        if object.object_type == "Building" {
            for child in &object.children {
                match doc.city_objects.get(child) {
                    Some(part) => geometries.extend(part.geometry.iter()),
                    None => log::warn!("{}: child {} is not in the document, skipped", coid, child),
                }
            }
        }

        for (n, geometry) in geometries.into_iter().enumerate() {
            let id = format!("{}({})", coid, n);
            if let Some(primitive) = builder.build(&id, geometry, &vertices)? {
                feature.add_primitive(primitive);
            }
        }
        features.push(feature);
    }
    Ok(features)
}

/// Build one feature per tu3djson geometry, identified by its position
pub fn build_tu3djson_features(
    geometries: &[Tu3dGeometry],
    builder: &PrimitiveBuilder,
) -> Result<Vec<Feature>> {
    geometries
        .iter()
        .enumerate()
        .map(|(i, g)| build_geometry_feature(&i.to_string(), g, builder))
        .collect()
}

/// Build a feature holding a single bare geometry
pub fn build_geometry_feature(
    id: &str,
    geometry: &Tu3dGeometry,
    builder: &PrimitiveBuilder,
) -> Result<Feature> {
    let vertices = VertexSource::new(&geometry.vertices);
    let mut feature = Feature::new(id, GENERIC_FEATURE_TYPE);
    if let Some(p) = builder.build(&format!("{}(0)", id), &geometry.geometry, &vertices)? {
        feature.add_primitive(p);
    }
    Ok(feature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kf_model::PrimitiveKind;
    use serde_json::json;

    fn doc(value: serde_json::Value) -> CityJson {
        CityJson::from_value(&value).unwrap()
    }

    #[test]
    fn test_vertices_are_moved_to_origin() {
        let d = doc(json!({
            "type": "CityJSON",
            "CityObjects": {},
            "vertices": [[100, 200, 5], [300, 250, 7]],
            "transform": {"scale": [0.01, 0.01, 0.01], "translate": [1000.0, 2000.0, 0.0]}
        }));
        let v = VertexSource::cityjson(&d);
        let p = v.get(1).unwrap();
        assert!((p.x - 2.0).abs() < 1e-9);
        assert!((p.y - 0.5).abs() < 1e-9);
        assert!((p.z - 0.07).abs() < 1e-9);
        assert!(v.get(2).is_none());
    }

    #[test]
    fn test_building_parts_join_their_building() {
        let d = doc(json!({
            "type": "CityJSON",
            "CityObjects": {
                "b1": {"type": "Building", "children": ["p1"], "geometry": [
                    {"type": "MultiSurface", "boundaries": [[[0, 1, 2]]]}
                ]},
                "p1": {"type": "BuildingPart", "parents": ["b1"], "geometry": [
                    {"type": "MultiSurface", "boundaries": [[[0, 2, 3]]]},
                    {"type": "MultiPoint", "boundaries": [0]}
                ]}
            },
            "vertices": [[0, 0, 0], [1, 0, 0], [1, 1, 0], [0, 1, 0]]
        }));
        let features = build_cityjson_features(&d, &PrimitiveBuilder::new(0.001)).unwrap();
        assert_eq!(features.len(), 1);
        let ids: Vec<&str> = features[0].primitives.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["b1(0)", "b1(1)"]);
    }

    #[test]
    fn test_missing_child_is_skipped() {
        let d = doc(json!({
            "type": "CityJSON",
            "CityObjects": {"b1": {"type": "Building", "children": ["nope", "p1"], "geometry": [
                {"type": "MultiSurface", "boundaries": [[[0, 1, 2]]]}
            ]},
            "p1": {"type": "BuildingPart", "parents": ["b1"], "geometry": [
                {"type": "MultiSurface", "boundaries": [[[0, 2, 3]]]}
            ]}},
            "vertices": [[0, 0, 0], [1, 0, 0], [1, 1, 0], [0, 1, 0]]
        }));
        let features = build_cityjson_features(&d, &PrimitiveBuilder::new(0.001)).unwrap();
        assert_eq!(features.len(), 1);
        assert_eq!(features[0].primitives.len(), 2);
    }

    #[test]
    fn test_vertex_out_of_range() {
        let d = doc(json!({
            "type": "CityJSON",
            "CityObjects": {"o": {"type": "Road", "geometry": [
                {"type": "MultiSurface", "boundaries": [[[0, 1, 7]]]}
            ]}},
            "vertices": [[0, 0, 0], [1, 0, 0]]
        }));
        let err = build_cityjson_features(&d, &PrimitiveBuilder::new(0.001)).unwrap_err();
        match err {
            Error::VertexIndex { owner, index, count } => {
                assert_eq!(owner, "o(0)");
                assert_eq!(index, 7);
                assert_eq!(count, 2);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_geometry_instance() {
        let report = Arc::new(PrimitiveReport::new("0", PrimitiveKind::Solid, Vec::new()));
        let builder = PrimitiveBuilder::with_templates(0.001, vec![Some(report), None]);
        let vertices = VertexSource::new(&[]);

        let ok = Geometry::GeometryInstance {
            template: 0,
            boundaries: vec![0],
            transformation_matrix: None,
        };
        let p = builder.build("t(0)", &ok, &vertices).unwrap().unwrap();
        assert_eq!(p.kind(), PrimitiveKind::GeometryTemplate);

        // an instance of a point or line template is skipped like the template
        let points = Geometry::GeometryInstance {
            template: 1,
            boundaries: vec![0],
            transformation_matrix: None,
        };
        assert!(builder.build("t(1)", &points, &vertices).unwrap().is_none());

        let bad = Geometry::GeometryInstance {
            template: 3,
            boundaries: vec![0],
            transformation_matrix: None,
        };
        assert!(matches!(
            builder.build("t(1)", &bad, &vertices),
            Err(Error::TemplateIndex { index: 3, count: 2, .. })
        ));
    }

    #[test]
    fn test_snapping_shares_vertices() {
        let builder = PrimitiveBuilder::new(0.01);
        let coords = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [1.005, 0.0, 0.0]];
        let vertices = VertexSource::new(&coords);
        let geometry = Geometry::MultiSurface {
            boundaries: vec![vec![vec![0, 1, 2]], vec![vec![0, 3, 2]]],
        };
        let p = builder.build("m(0)", &geometry, &vertices).unwrap().unwrap();
        match p.body {
            Body::MultiSurface(s) => assert_eq!(s.points().len(), 3),
            other => panic!("unexpected body {other:?}"),
        }
    }
}
