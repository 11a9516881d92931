//! Silhouette-edge structure of a static triangle mesh.
//!
//! An [`EdgeSet`] is built once per mesh geometry. It records the plane
//! equation of every triangle and classifies every undirected edge as either
//! a boundary edge (one adjacent triangle) or an interior edge (two adjacent
//! triangles, traversing the edge in opposite directions). Anything else is
//! non-manifold and is dropped with a warning; the mesh still draws but that
//! edge never contributes to a shadow.
//!
//! The edge set also owns the per-light [`Volume`] cache for its mesh.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use glam::{Mat4, Vec3, Vec4};

use crate::error::{Result, UmbraError};
use crate::light::Light;
use crate::registry::LightId;
use crate::structure::{ShadowOccluder, Winding};
use crate::volume::Volume;

/// Bitwise identity of a point. Negative zero is folded into positive zero.
type PointKey = [u32; 3];

/// A directed edge between two points.
type EdgeKey = (PointKey, PointKey);

fn point_key(p: Vec3) -> PointKey {
    [
        (p.x + 0.0).to_bits(),
        (p.y + 0.0).to_bits(),
        (p.z + 0.0).to_bits(),
    ]
}

/// An edge with exactly one adjacent triangle.
///
/// The endpoints are stored reversed with respect to the triangle's winding,
/// which is the order the extruded side face needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundaryEdge {
    /// Second endpoint in triangle winding order.
    pub start: Vec3,
    /// First endpoint in triangle winding order.
    pub end: Vec3,
    /// Index of the adjacent triangle.
    pub triangle: usize,
}

/// An edge shared by exactly two triangles.
///
/// `a -> b` follows the winding of `triangles[0]`; `triangles[1]` traverses
/// the edge as `b -> a`. `triangles[0]` is always the lower index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InteriorEdge {
    /// First endpoint.
    pub a: Vec3,
    /// Second endpoint.
    pub b: Vec3,
    /// Indices of the two adjacent triangles.
    pub triangles: [usize; 2],
}

/// Edge-connectivity information for one triangle soup.
#[derive(Debug)]
pub struct EdgeSet {
    points: Vec<Vec3>,
    winding: Winding,
    planes: Vec<Vec4>,
    boundary: Vec<BoundaryEdge>,
    interior: Vec<InteriorEdge>,
    dropped_edges: usize,
    degenerate_triangles: usize,
    volumes: HashMap<LightId, Arc<Volume>>,
    volume_builds: usize,
}

impl EdgeSet {
    /// Builds the edge set of a triangle soup.
    ///
    /// Fails if `points.len()` is not a multiple of three.
    pub fn new(points: Vec<Vec3>, winding: Winding) -> Result<Self> {
        if points.len() % 3 != 0 {
            return Err(UmbraError::InvalidTriangleSoup { len: points.len() });
        }

        let mut planes = Vec::with_capacity(points.len() / 3);
        let mut degenerate_triangles = 0;
        let mut directed: HashMap<EdgeKey, Vec<usize>> = HashMap::with_capacity(points.len());

        for (triangle, tri) in points.chunks_exact(3).enumerate() {
            let (a, b, c) = (tri[0], tri[1], tri[2]);
            let normal = winding.face_normal(a, b, c).normalize_or_zero();
            if normal == Vec3::ZERO {
                degenerate_triangles += 1;
            }
            planes.push(normal.extend(-normal.dot(a)));
            for (p, q) in [(a, b), (b, c), (c, a)] {
                directed
                    .entry((point_key(p), point_key(q)))
                    .or_default()
                    .push(triangle);
            }
        }

        // Second pass: pair every directed edge with its reverse.
        let mut boundary = Vec::new();
        let mut interior = Vec::new();
        let mut dropped_edges = 0;
        let mut visited: HashSet<EdgeKey> = HashSet::with_capacity(directed.len());

        for tri in points.chunks_exact(3) {
            let (a, b, c) = (tri[0], tri[1], tri[2]);
            for (p, q) in [(a, b), (b, c), (c, a)] {
                let key = (point_key(p), point_key(q));
                let reverse = (key.1, key.0);
                if !visited.insert(key) {
                    continue;
                }
                visited.insert(reverse);

                let Some(forward) = directed.get(&key) else {
                    continue;
                };
                let backward = directed.get(&reverse).map_or(&[][..], Vec::as_slice);

                match (forward.as_slice(), backward) {
                    (&[only], []) => boundary.push(BoundaryEdge {
                        start: q,
                        end: p,
                        triangle: only,
                    }),
                    (&[first], &[second]) if first != second => interior.push(InteriorEdge {
                        a: p,
                        b: q,
                        triangles: [first, second],
                    }),
                    (&[first], &[_]) => {
                        log::debug!("dropping degenerate edge {p} -> {q} of triangle {first}");
                        dropped_edges += 1;
                    }
                    _ => {
                        log::warn!(
                            "un-shadowable edge {p} -> {q}: {} triangle(s) one way, {} the other",
                            forward.len(),
                            backward.len()
                        );
                        dropped_edges += 1;
                    }
                }
            }
        }

        if degenerate_triangles > 0 {
            log::warn!("edge set has {degenerate_triangles} degenerate triangle(s)");
        }
        log::debug!(
            "built edge set: {} triangles, {} boundary edges, {} interior edges, {} dropped",
            planes.len(),
            boundary.len(),
            interior.len(),
            dropped_edges
        );

        Ok(Self {
            points,
            winding,
            planes,
            boundary,
            interior,
            dropped_edges,
            degenerate_triangles,
            volumes: HashMap::new(),
            volume_builds: 0,
        })
    }

    /// Builds the edge set of an occluder's current geometry.
    pub fn from_occluder(occluder: &dyn ShadowOccluder) -> Result<Self> {
        Self::new(occluder.triangles().to_vec(), occluder.winding())
    }

    /// The triangle soup.
    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    /// Front-face winding of the triangle soup.
    pub fn winding(&self) -> Winding {
        self.winding
    }

    /// One plane equation `(n, d)` per triangle, with `n . p = -d` on the
    /// triangle.
    pub fn plane_equations(&self) -> &[Vec4] {
        &self.planes
    }

    /// Edges with a single adjacent triangle.
    pub fn boundary_edges(&self) -> &[BoundaryEdge] {
        &self.boundary
    }

    /// Edges shared by two triangles.
    pub fn interior_edges(&self) -> &[InteriorEdge] {
        &self.interior
    }

    /// Number of triangles.
    pub fn num_triangles(&self) -> usize {
        self.planes.len()
    }

    /// Number of edges dropped as non-manifold or zero-length.
    pub fn dropped_edges(&self) -> usize {
        self.dropped_edges
    }

    /// Number of triangles with zero area.
    pub fn degenerate_triangles(&self) -> usize {
        self.degenerate_triangles
    }

    /// Whether every edge is shared by exactly two triangles.
    pub fn is_closed(&self) -> bool {
        self.boundary.is_empty() && self.dropped_edges == 0
    }

    /// Returns the shadow volume for `light` at homogeneous position
    /// `source` (in this mesh's local frame).
    ///
    /// The cached volume is returned as long as `source` compares exactly
    /// equal to the vector it was built for; any change rebuilds it.
    pub fn volume(&mut self, light: LightId, source: Vec4) -> Arc<Volume> {
        if let Some(volume) = self.volumes.get(&light) {
            if volume.source_vector() == source {
                return Arc::clone(volume);
            }
        }
        let volume = Arc::new(Volume::calculate(self, source));
        self.volume_builds += 1;
        self.volumes.insert(light, Arc::clone(&volume));
        volume
    }

    /// Projects `light` into this mesh's frame and returns its volume.
    ///
    /// `mesh_to_world` is the model transform of the mesh.
    pub fn volume_for_light(
        &mut self,
        id: LightId,
        light: &Light,
        mesh_to_world: Mat4,
    ) -> Arc<Volume> {
        let source = light.source_vector(mesh_to_world.inverse());
        self.volume(id, source)
    }

    /// The cached volume for `light`, if any.
    pub fn cached_volume(&self, light: LightId) -> Option<&Arc<Volume>> {
        self.volumes.get(&light)
    }

    /// Drops the cached volume for `light`. Returns true if one existed.
    pub fn forget_light(&mut self, light: LightId) -> bool {
        self.volumes.remove(&light).is_some()
    }

    /// Drops every cached volume.
    pub fn forget_volumes(&mut self) {
        self.volumes.clear();
    }

    /// How many volumes this edge set has built so far.
    pub fn volume_builds(&self) -> usize {
        self.volume_builds
    }
}

#[cfg(test)]
mod tests {
    use glam::UVec3;
    use proptest::prelude::*;

    use super::*;
    use crate::mesh::cube;

    fn soup(vertices: &[Vec3], faces: &[UVec3]) -> Vec<Vec3> {
        faces
            .iter()
            .flat_map(|f| f.to_array().map(|i| vertices[i as usize]))
            .collect()
    }

    fn unit_cube() -> Vec<Vec3> {
        let (vertices, faces) = cube(Vec3::ZERO, Vec3::ONE);
        soup(&vertices, &faces)
    }

    #[test]
    fn test_rejects_partial_triangle() {
        assert!(matches!(
            EdgeSet::new(vec![Vec3::ZERO; 4], Winding::CounterClockwise),
            Err(UmbraError::InvalidTriangleSoup { len: 4 })
        ));
    }

    #[test]
    fn test_single_triangle_is_all_boundary() {
        let set = EdgeSet::new(vec![Vec3::ZERO, Vec3::X, Vec3::Y], Winding::CounterClockwise)
            .unwrap();
        assert_eq!(set.boundary_edges().len(), 3);
        assert!(set.interior_edges().is_empty());
        assert!(!set.is_closed());
        // Stored reversed: the first winding edge is 0 -> X.
        assert_eq!(set.boundary_edges()[0].start, Vec3::X);
        assert_eq!(set.boundary_edges()[0].end, Vec3::ZERO);
        assert_eq!(set.plane_equations()[0], Vec4::new(0.0, 0.0, 1.0, 0.0));
    }

    #[test]
    fn test_closed_cube_has_only_interior_edges() {
        let set = EdgeSet::new(unit_cube(), Winding::CounterClockwise).unwrap();
        assert_eq!(set.num_triangles(), 12);
        assert!(set.boundary_edges().is_empty());
        // 12 cube edges plus one diagonal per face.
        assert_eq!(set.interior_edges().len(), 18);
        assert_eq!(set.dropped_edges(), 0);
        assert!(set.is_closed());
    }

    #[test]
    fn test_hole_boundary_matches_perimeter() {
        // Remove the two triangles of the +Y face: the hole is a square.
        let (vertices, mut faces) = cube(Vec3::ZERO, Vec3::ONE);
        faces.drain(6..8);
        let set = EdgeSet::new(soup(&vertices, &faces), Winding::CounterClockwise).unwrap();
        assert_eq!(set.boundary_edges().len(), 4);
        assert_eq!(set.interior_edges().len(), 18 - 4 - 1);
    }

    #[test]
    fn test_interior_edges_are_canonical() {
        let set = EdgeSet::new(unit_cube(), Winding::CounterClockwise).unwrap();
        for edge in set.interior_edges() {
            assert!(edge.triangles[0] < edge.triangles[1]);
        }
    }

    #[test]
    fn test_fin_is_dropped() {
        // Three triangles sharing the edge 0 -> X.
        let points = vec![
            Vec3::ZERO,
            Vec3::X,
            Vec3::Y,
            Vec3::X,
            Vec3::ZERO,
            Vec3::NEG_Y,
            Vec3::ZERO,
            Vec3::X,
            Vec3::Z,
        ];
        let set = EdgeSet::new(points, Winding::CounterClockwise).unwrap();
        assert_eq!(set.dropped_edges(), 1);
        assert!(!set.is_closed());
    }

    #[test]
    fn test_degenerate_triangle_counted() {
        let points = vec![Vec3::ZERO, Vec3::X, Vec3::X];
        let set = EdgeSet::new(points, Winding::CounterClockwise).unwrap();
        assert_eq!(set.degenerate_triangles(), 1);
        assert_eq!(set.plane_equations()[0], Vec4::ZERO);
        // Both 0 -> X and X -> X fold back onto the same triangle.
        assert_eq!(set.dropped_edges(), 2);
    }

    #[test]
    fn test_negative_zero_matches_positive_zero() {
        let points = vec![
            Vec3::ZERO,
            Vec3::X,
            Vec3::Y,
            Vec3::new(1.0, -0.0, 0.0),
            Vec3::new(-0.0, 0.0, 0.0),
            Vec3::NEG_Y,
        ];
        let set = EdgeSet::new(points, Winding::CounterClockwise).unwrap();
        assert_eq!(set.interior_edges().len(), 1);
    }

    #[test]
    fn test_clockwise_planes_flip() {
        let tri = vec![Vec3::ZERO, Vec3::X, Vec3::Y];
        let ccw = EdgeSet::new(tri.clone(), Winding::CounterClockwise).unwrap();
        let cw = EdgeSet::new(tri, Winding::Clockwise).unwrap();
        assert_eq!(ccw.plane_equations()[0].z, 1.0);
        assert_eq!(cw.plane_equations()[0].z, -1.0);
    }

    #[test]
    fn test_facing_sign_for_light_above_and_below() {
        let set = EdgeSet::new(vec![Vec3::ZERO, Vec3::X, Vec3::Y], Winding::CounterClockwise)
            .unwrap();
        let plane = set.plane_equations()[0];
        assert!(plane.dot(Vec4::new(0.3, 0.3, 5.0, 1.0)) > 0.0);
        assert!(plane.dot(Vec4::new(0.3, 0.3, -5.0, 1.0)) < 0.0);
        assert!(plane.dot(Vec4::new(0.0, 0.0, 1.0, 0.0)) > 0.0);
        assert!(plane.dot(Vec4::new(0.0, 0.0, -1.0, 0.0)) < 0.0);
    }

    #[test]
    fn test_volume_cache_identity() {
        let mut set = EdgeSet::new(unit_cube(), Winding::CounterClockwise).unwrap();
        let mut registry = crate::registry::Registry::new();
        let light = registry.register_light("lamp", Light::point(Vec3::splat(3.0)));

        let source = Vec4::new(3.0, 3.0, 3.0, 1.0);
        let first = set.volume(light, source);
        let second = set.volume(light, source);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(set.volume_builds(), 1);

        let moved = set.volume(light, Vec4::new(3.0, 3.0, 3.0001, 1.0));
        assert!(!Arc::ptr_eq(&first, &moved));
        assert_eq!(set.volume_builds(), 2);

        assert!(set.forget_light(light));
        assert!(set.cached_volume(light).is_none());
    }

    proptest! {
        #[test]
        fn prop_closed_under_rigid_motion(
            angle in -3.0f32..3.0,
            axis in prop::array::uniform3(-1.0f32..1.0),
            offset in prop::array::uniform3(-10.0f32..10.0),
        ) {
            let axis = Vec3::from(axis).normalize_or(Vec3::Y);
            let transform = Mat4::from_translation(Vec3::from(offset))
                * Mat4::from_axis_angle(axis, angle);
            let points: Vec<Vec3> = unit_cube()
                .into_iter()
                .map(|p| transform.transform_point3(p))
                .collect();
            let set = EdgeSet::new(points, Winding::CounterClockwise).unwrap();
            prop_assert!(set.boundary_edges().is_empty());
            prop_assert_eq!(set.interior_edges().len(), 18);
        }

        #[test]
        fn prop_plane_contains_vertices(
            a in prop::array::uniform3(-5.0f32..5.0),
            b in prop::array::uniform3(-5.0f32..5.0),
            c in prop::array::uniform3(-5.0f32..5.0),
        ) {
            let (a, b, c) = (Vec3::from(a), Vec3::from(b), Vec3::from(c));
            prop_assume!((b - a).cross(c - a).length() > 1e-2);
            let set = EdgeSet::new(vec![a, b, c], Winding::CounterClockwise).unwrap();
            let plane = set.plane_equations()[0];
            for p in [a, b, c] {
                prop_assert!(plane.dot(p.extend(1.0)).abs() < 1e-3);
            }
        }
    }
}
