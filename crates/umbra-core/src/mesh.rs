//! Triangle mesh structure.
//!
//! [`TriangleMesh`] is the mesh provider of the shadow pipeline: it owns a
//! triangle soup, draws as a flat-shaded surface, and can cast shadows.

use std::any::Any;

use glam::{Mat4, UVec3, Vec3, Vec4};

use crate::error::{Result, UmbraError};
use crate::structure::{ShadowOccluder, Structure, SurfaceData, Winding};

/// A triangle-soup mesh.
pub struct TriangleMesh {
    name: String,
    points: Vec<Vec3>,
    normals: Vec<Vec3>,
    winding: Winding,
    transform: Mat4,
    color: Vec4,
    enabled: bool,
    casts_shadows: bool,
    generation: u64,
}

impl TriangleMesh {
    /// Creates a mesh from a triangle soup.
    ///
    /// Fails if `points.len()` is not a multiple of three.
    pub fn new(name: impl Into<String>, points: Vec<Vec3>) -> Result<Self> {
        check_soup(&points)?;
        let mut mesh = Self {
            name: name.into(),
            points,
            normals: Vec::new(),
            winding: Winding::CounterClockwise,
            transform: Mat4::IDENTITY,
            color: Vec4::new(0.8, 0.8, 0.8, 1.0),
            enabled: true,
            casts_shadows: true,
            generation: 0,
        };
        mesh.compute_normals();
        Ok(mesh)
    }

    /// Creates a mesh from indexed triangles.
    pub fn from_indexed(
        name: impl Into<String>,
        vertices: &[Vec3],
        faces: &[UVec3],
    ) -> Result<Self> {
        let polygons: Vec<Vec<u32>> = faces.iter().map(|f| f.to_array().to_vec()).collect();
        Self::from_polygons(name, vertices, &polygons)
    }

    /// Creates a mesh from indexed polygons, fan-triangulating faces with
    /// more than three vertices.
    ///
    /// Polygons with fewer than three vertices are skipped.
    pub fn from_polygons(
        name: impl Into<String>,
        vertices: &[Vec3],
        faces: &[Vec<u32>],
    ) -> Result<Self> {
        let mut points = Vec::with_capacity(faces.len() * 3);
        for face in faces {
            for &index in face {
                if index as usize >= vertices.len() {
                    return Err(UmbraError::FaceIndexOutOfRange {
                        index: index as usize,
                        vertex_count: vertices.len(),
                    });
                }
            }
            if face.len() < 3 {
                continue;
            }
            let v0 = vertices[face[0] as usize];
            for i in 1..(face.len() - 1) {
                points.push(v0);
                points.push(vertices[face[i] as usize]);
                points.push(vertices[face[i + 1] as usize]);
            }
        }
        Self::new(name, points)
    }

    /// Replaces the triangle soup. Cached edge sets become stale.
    pub fn set_triangles(&mut self, points: Vec<Vec3>) -> Result<()> {
        check_soup(&points)?;
        self.points = points;
        self.compute_normals();
        self.generation += 1;
        Ok(())
    }

    /// Sets the front-face winding. Cached edge sets become stale.
    pub fn set_winding(&mut self, winding: Winding) {
        if self.winding != winding {
            self.winding = winding;
            self.compute_normals();
            self.generation += 1;
        }
    }

    /// Builder-style winding setter.
    #[must_use]
    pub fn with_winding(mut self, winding: Winding) -> Self {
        self.set_winding(winding);
        self
    }

    /// Sets the base color; alpha below one makes the mesh transparent.
    pub fn set_color(&mut self, color: Vec4) {
        self.color = color;
    }

    /// Builder-style color setter.
    #[must_use]
    pub fn with_color(mut self, color: Vec4) -> Self {
        self.color = color;
        self
    }

    /// Returns the base color.
    pub fn color(&self) -> Vec4 {
        self.color
    }

    /// Enables or disables shadow casting.
    pub fn set_casts_shadows(&mut self, casts_shadows: bool) {
        self.casts_shadows = casts_shadows;
    }

    /// Returns whether this mesh casts shadows.
    pub fn casts_shadows(&self) -> bool {
        self.casts_shadows
    }

    /// Returns the number of triangles.
    pub fn num_triangles(&self) -> usize {
        self.points.len() / 3
    }

    /// Returns the object-space bounding box.
    pub fn local_bounding_box(&self) -> Option<(Vec3, Vec3)> {
        let first = *self.points.first()?;
        Some(
            self.points
                .iter()
                .fold((first, first), |(min, max), &p| (min.min(p), max.max(p))),
        )
    }

    fn compute_normals(&mut self) {
        self.normals.clear();
        self.normals.reserve(self.points.len());
        for tri in self.points.chunks_exact(3) {
            let normal = self
                .winding
                .face_normal(tri[0], tri[1], tri[2])
                .normalize_or_zero();
            self.normals.extend_from_slice(&[normal; 3]);
        }
    }
}

fn check_soup(points: &[Vec3]) -> Result<()> {
    if points.len() % 3 == 0 {
        Ok(())
    } else {
        Err(UmbraError::InvalidTriangleSoup { len: points.len() })
    }
}

impl ShadowOccluder for TriangleMesh {
    fn triangles(&self) -> &[Vec3] {
        &self.points
    }

    fn winding(&self) -> Winding {
        self.winding
    }

    fn geometry_generation(&self) -> u64 {
        self.generation
    }
}

impl Structure for TriangleMesh {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn type_name(&self) -> &'static str {
        "TriangleMesh"
    }

    fn bounding_box(&self) -> Option<(Vec3, Vec3)> {
        let (min, max) = self.local_bounding_box()?;
        // Transform all eight corners, the box may rotate.
        let corners = (0..8).map(|i| {
            Vec3::new(
                if i & 1 == 0 { min.x } else { max.x },
                if i & 2 == 0 { min.y } else { max.y },
                if i & 4 == 0 { min.z } else { max.z },
            )
        });
        let mut world_min = Vec3::splat(f32::MAX);
        let mut world_max = Vec3::splat(f32::MIN);
        for corner in corners {
            let p = self.transform.transform_point3(corner);
            world_min = world_min.min(p);
            world_max = world_max.max(p);
        }
        Some((world_min, world_max))
    }

    fn transform(&self) -> Mat4 {
        self.transform
    }

    fn set_transform(&mut self, transform: Mat4) {
        self.transform = transform;
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn is_transparent(&self) -> bool {
        self.color.w < 1.0
    }

    fn surface(&self) -> SurfaceData<'_> {
        SurfaceData {
            positions: &self.points,
            normals: &self.normals,
            color: self.color,
            winding: self.winding,
        }
    }

    fn as_occluder(&self) -> Option<&dyn ShadowOccluder> {
        if self.casts_shadows {
            Some(self)
        } else {
            None
        }
    }
}

/// Vertices and faces of an axis-aligned cube from `min` to `max`, wound
/// counter-clockwise when seen from outside.
#[must_use]
pub fn cube(min: Vec3, max: Vec3) -> (Vec<Vec3>, Vec<UVec3>) {
    let vertices = (0..8)
        .map(|i| {
            Vec3::new(
                if i & 1 == 0 { min.x } else { max.x },
                if i & 2 == 0 { min.y } else { max.y },
                if i & 4 == 0 { min.z } else { max.z },
            )
        })
        .collect();
    let faces = vec![
        // -Z
        UVec3::new(0, 2, 3),
        UVec3::new(0, 3, 1),
        // +Z
        UVec3::new(4, 5, 7),
        UVec3::new(4, 7, 6),
        // -Y
        UVec3::new(0, 1, 5),
        UVec3::new(0, 5, 4),
        // +Y
        UVec3::new(2, 6, 7),
        UVec3::new(2, 7, 3),
        // -X
        UVec3::new(0, 4, 6),
        UVec3::new(0, 6, 2),
        // +X
        UVec3::new(1, 3, 7),
        UVec3::new(1, 7, 5),
    ];
    (vertices, faces)
}
