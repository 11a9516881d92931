//! Renders a box casting shadows onto a floor under two lights and saves
//! the result.
//!
//! Run with `cargo run --example shadow_demo -- [output.png]`.

use umbra::*;

fn main() -> Result<()> {
    init()?;

    let floor_vertices = [
        Vec3::new(-6.0, -1.0, -6.0),
        Vec3::new(-6.0, -1.0, 6.0),
        Vec3::new(6.0, -1.0, 6.0),
        Vec3::new(6.0, -1.0, -6.0),
    ];
    let floor_faces = [UVec3::new(0, 1, 2), UVec3::new(0, 2, 3)];
    register_mesh(TriangleMesh::from_indexed("floor", &floor_vertices, &floor_faces)?)?;

    let (vertices, faces) = cube(Vec3::splat(-0.5), Vec3::splat(0.5));
    let mesh = TriangleMesh::from_indexed("box", &vertices, &faces)?
        .with_color(Vec4::new(0.9, 0.4, 0.2, 1.0));
    let box_id = register_mesh(mesh)?;
    set_structure_transform(
        box_id,
        Mat4::from_rotation_y(0.6) * Mat4::from_translation(Vec3::new(0.0, 0.2, 0.0)),
    )?;

    let mut lamp = Light::point(Vec3::new(-2.0, 3.0, 1.0));
    lamp.color = Vec3::new(1.0, 0.9, 0.7);
    lamp.ambient_intensity = 0.1;
    register_light("lamp", lamp)?;

    let mut sun = Light::directional(Vec3::new(1.0, -2.0, -0.5));
    sun.intensity = 0.6;
    register_light("sun", sun)?;

    // Look down at the whole scene from the front.
    let (bounds, scale) = with_context(|ctx| (ctx.bounding_box(), ctx.length_scale()))?;
    let mut camera = Camera::new(1.0);
    camera.target = bounds.map_or(Vec3::ZERO, |(min, max)| (min + max) * 0.5);
    camera.position = camera.target + Vec3::new(0.0, 0.6, 0.8) * scale;

    let filename = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "shadow_demo.png".to_string());
    render_to_file(&filename, 800, 600, &camera)?;

    let stats = with_context(|ctx| ctx.cache.stats())?;
    log::info!(
        "{} edge sets, {} volumes built",
        stats.edge_set_builds,
        stats.volume_builds
    );

    shutdown();
    Ok(())
}
