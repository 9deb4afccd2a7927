// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Snapped vertex pool with polygon faces
//!
//! A `Surface` is the unit every check works on: one shell of a solid, or the
//! whole set of polygons of a multi/composite surface. Points added to it are
//! snapped: a point within the snap tolerance of an existing point reuses that
//! point's index, so the topology checks see shared vertices.

use crate::Point3;
use rustc_hash::FxHashMap;

/// Vertex indices of one ring, into the surface's point pool
pub type RingIds = Vec<usize>;

/// Largest `|coordinate / tol_snap|` that still gets a grid cell; well inside `i64`
const GRID_LIMIT: f64 = 4.0e18;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
enum CellKey {
    /// Grid cell of size `tol_snap`
    Grid(i64, i64, i64),
    /// Exact coordinates, used when there is no usable grid
    Exact(u64, u64, u64),
}

/// Polygons sharing a snapped point pool
#[derive(Clone, Debug)]
pub struct Surface {
    shell: Option<usize>,
    tol_snap: f64,
    points: Vec<Point3<f64>>,
    grid: FxHashMap<CellKey, Vec<usize>>,
    faces: Vec<Vec<RingIds>>,
}

impl Surface {
    /// Create an empty surface; `shell` is the shell number inside a solid
    pub fn new(shell: Option<usize>, tol_snap: f64) -> Self {
        Self {
            shell,
            tol_snap,
            points: Vec::new(),
            grid: FxHashMap::default(),
            faces: Vec::new(),
        }
    }

    #[inline]
    fn cell_key(&self, p: &Point3<f64>) -> CellKey {
        if self.tol_snap > 0.0 {
            let scaled = p.coords / self.tol_snap;
            // beyond the limit the tolerance is below the coordinate precision,
            // so only identical points can snap
            if scaled.iter().all(|c| c.abs() < GRID_LIMIT) {
                return CellKey::Grid(
                    scaled.x.floor() as i64,
                    scaled.y.floor() as i64,
                    scaled.z.floor() as i64,
                );
            }
        }
        // -0.0 and 0.0 must land in the same cell
        CellKey::Exact(
            (p.x + 0.0).to_bits(),
            (p.y + 0.0).to_bits(),
            (p.z + 0.0).to_bits(),
        )
    }

    fn find_snapped(&self, p: &Point3<f64>, key: CellKey) -> Option<usize> {
        let (x, y, z) = match key {
            CellKey::Grid(x, y, z) => (x, y, z),
            CellKey::Exact(..) => {
                return self
                    .grid
                    .get(&key)?
                    .iter()
                    .copied()
                    .find(|&i| self.points[i] == *p);
            }
        };

        // the earliest pooled point within tolerance wins
        let mut first: Option<usize> = None;
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let Some(bucket) = self.grid.get(&CellKey::Grid(x + dx, y + dy, z + dz)) else {
                        continue;
                    };
                    for &i in bucket {
                        if first.map_or(true, |f| i < f) && (self.points[i] - p).norm() <= self.tol_snap {
                            first = Some(i);
                        }
                    }
                }
            }
        }
        first
    }

    /// Add a point and return its index, reusing a snapped neighbour if any
    pub fn add_point(&mut self, p: Point3<f64>) -> usize {
        let key = self.cell_key(&p);
        if let Some(existing) = self.find_snapped(&p, key) {
            return existing;
        }
        let id = self.points.len();
        self.points.push(p);
        self.grid.entry(key).or_default().push(id);
        id
    }

    /// Add a polygon: outer ring followed by inner rings
    pub fn add_face(&mut self, rings: Vec<RingIds>) {
        self.faces.push(rings);
    }

    /// Add a polygon given by coordinates
    pub fn add_face_points(&mut self, rings: &[Vec<Point3<f64>>]) {
        let ids: Vec<RingIds> = rings
            .iter()
            .map(|ring| ring.iter().map(|p| self.add_point(*p)).collect::<RingIds>())
            .collect();
        self.add_face(ids);
    }

    /// Shell number inside its solid, if any
    pub fn shell(&self) -> Option<usize> {
        self.shell
    }

    pub fn points(&self) -> &[Point3<f64>] {
        &self.points
    }

    pub fn point(&self, id: usize) -> &Point3<f64> {
        &self.points[id]
    }

    pub fn faces(&self) -> &[Vec<RingIds>] {
        &self.faces
    }

    pub fn number_of_faces(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Coordinates of one ring
    pub fn ring_points(&self, ring: &[usize]) -> Vec<Point3<f64>> {
        ring.iter().map(|&i| self.points[i]).collect()
    }

    /// Sorted coordinates of every vertex used by a face
    ///
    /// Two surfaces with equal keys cover the same vertices.
    pub fn vertex_key(&self) -> Vec<[u64; 3]> {
        let mut used: Vec<usize> = self
            .faces
            .iter()
            .flat_map(|f| f.iter().flat_map(|r| r.iter().copied()))
            .collect();
        used.sort_unstable();
        used.dedup();
        let mut key: Vec<[u64; 3]> = used
            .into_iter()
            .map(|i| {
                let p = &self.points[i];
                [
                    (p.x + 0.0).to_bits(),
                    (p.y + 0.0).to_bits(),
                    (p.z + 0.0).to_bits(),
                ]
            })
            .collect();
        key.sort_unstable();
        key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapping_merges_close_points() {
        let mut s = Surface::new(None, 0.001);
        let a = s.add_point(Point3::new(1.0, 1.0, 1.0));
        let b = s.add_point(Point3::new(1.0005, 1.0, 1.0));
        let c = s.add_point(Point3::new(1.01, 1.0, 1.0));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(s.points().len(), 2);
    }

    #[test]
    fn test_snapping_across_cell_boundary() {
        let mut s = Surface::new(None, 0.01);
        // 0.0099 and 0.0101 fall in different grid cells
        let a = s.add_point(Point3::new(0.0099, 0.0, 0.0));
        let b = s.add_point(Point3::new(0.0101, 0.0, 0.0));
        assert_eq!(a, b);
    }

    #[test]
    fn test_zero_tolerance_is_exact() {
        let mut s = Surface::new(None, 0.0);
        let a = s.add_point(Point3::new(0.0, 0.0, 0.0));
        let b = s.add_point(Point3::new(-0.0, 0.0, 0.0));
        let c = s.add_point(Point3::new(1e-12, 0.0, 0.0));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_tiny_tolerance_on_large_coordinates() {
        let mut s = Surface::new(None, 1e-20);
        let a = s.add_point(Point3::new(1000.0, 1000.5, 1000.25));
        let b = s.add_point(Point3::new(1000.0, 1000.5, 1000.25));
        let c = s.add_point(Point3::new(1000.0, 1000.5, 1000.125));
        assert_eq!(a, b);
        assert_ne!(a, c);

        // small coordinates still use the grid
        let d = s.add_point(Point3::new(0.0, 0.0, 0.0));
        let e = s.add_point(Point3::new(0.0, 0.0, 5e-21));
        assert_eq!(d, e);
    }

    #[test]
    fn test_vertex_key_ignores_order() {
        let tri = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let mut a = Surface::new(None, 0.001);
        a.add_face_points(&[tri.to_vec()]);
        let mut b = Surface::new(None, 0.001);
        b.add_face_points(&[tri.iter().rev().copied().collect()]);
        assert_eq!(a.vertex_key(), b.vertex_key());
    }
}
