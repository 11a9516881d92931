//! Draw submission for shadow volumes.
//!
//! A volume is passive geometry: these functions only submit its cap, sides
//! and boot. Stencil, cull and blend state belong to the calling pass.

use glam::{Vec3, Vec4};
use umbra_core::{ShadowDebugOptions, Volume};

use crate::device::GraphicsDevice;
use crate::error::RenderResult;
use crate::state::Primitive;

/// Color of volume geometry when it is made visible for debugging.
pub const VOLUME_DEBUG_COLOR: Vec4 = Vec4::new(0.25, 0.05, 0.05, 1.0);

/// Color of debug silhouette lines.
pub const SILHOUETTE_DEBUG_COLOR: Vec4 = Vec4::new(1.0, 1.0, 0.0, 1.0);

/// One draw call of a volume.
#[derive(Debug, Clone, Copy)]
pub(crate) enum VolumePart<'v> {
    /// Near cap, indexing into the occluder's triangle soup.
    Cap(&'v [u32]),
    /// Side faces or boot.
    Homogeneous(&'v [Vec4], Primitive),
}

/// The draw calls of `volume` in submission order.
pub(crate) fn volume_parts<'v>(
    volume: &'v Volume,
    debug: &ShadowDebugOptions,
) -> Vec<VolumePart<'v>> {
    let mut parts = Vec::with_capacity(3);
    if !debug.no_caps && !volume.forward_indices().is_empty() {
        parts.push(VolumePart::Cap(volume.forward_indices()));
    }
    if !debug.no_edges && !volume.edges().is_empty() {
        parts.push(VolumePart::Homogeneous(volume.edges(), volume.side_kind().into()));
    }
    if !debug.no_boots {
        if let Some(boot) = volume.backward_points().filter(|boot| !boot.is_empty()) {
            parts.push(VolumePart::Homogeneous(boot, Primitive::Triangles));
        }
    }
    parts
}

pub(crate) fn submit_part<D: GraphicsDevice + ?Sized>(
    device: &mut D,
    points: &[Vec3],
    part: VolumePart<'_>,
) -> RenderResult<()> {
    match part {
        VolumePart::Cap(indices) => device.draw_indexed(points, indices, VOLUME_DEBUG_COLOR),
        VolumePart::Homogeneous(vertices, primitive) => {
            device.draw_homogeneous(vertices, primitive, VOLUME_DEBUG_COLOR)
        }
    }
}

/// Submits the cap, side faces and boot of `volume`.
///
/// `points` is the triangle soup the volume was built from; the cap indexes
/// into it.
pub fn render_volume<D: GraphicsDevice + ?Sized>(
    device: &mut D,
    volume: &Volume,
    points: &[Vec3],
    debug: &ShadowDebugOptions,
) -> RenderResult<()> {
    volume_parts(volume, debug)
        .into_iter()
        .try_for_each(|part| submit_part(device, points, part))
}

/// Submits the silhouette edges of `volume` as lines.
pub fn render_silhouette<D: GraphicsDevice + ?Sized>(
    device: &mut D,
    volume: &Volume,
) -> RenderResult<()> {
    if volume.silhouette().is_empty() {
        return Ok(());
    }
    let lines: Vec<Vec4> = volume
        .silhouette()
        .iter()
        .flat_map(|&(start, end)| [start.extend(1.0), end.extend(1.0)])
        .collect();
    device.draw_homogeneous(&lines, Primitive::Lines, SILHOUETTE_DEBUG_COLOR)
}
