//! Headless rendering integration tests.
//!
//! These tests need a GPU adapter (real or software fallback). Without one
//! they print a note and return early.

use umbra::*;

const WIDTH: u32 = 160;
const HEIGHT: u32 = 120;

fn camera() -> Camera {
    let mut camera = Camera::new(WIDTH as f32 / HEIGHT as f32);
    camera.position = Vec3::new(0.0, 9.0, 9.0);
    camera.target = Vec3::new(0.0, -1.0, 0.0);
    camera.near = 0.1;
    camera
}

fn brightness(pixels: &[u8]) -> u64 {
    pixels
        .chunks(4)
        .map(|px| u64::from(px[0]) + u64::from(px[1]) + u64::from(px[2]))
        .sum()
}

/// Combined into one test because the scene lives in global state.
#[test]
fn headless_render_tests() {
    let _ = init();
    remove_all().expect("clear scene");

    // Empty scene: only the clear color.
    let mut device = match pollster::block_on(WgpuDevice::new_headless(WIDTH, HEIGHT)) {
        Ok(device) => device,
        Err(e) => {
            eprintln!("Skipping headless tests: no GPU adapter available ({e})");
            return;
        }
    };
    let camera = camera();
    let pixels = render_with_device(&mut device, &camera).expect("empty render");
    assert_eq!(pixels.len(), (WIDTH * HEIGHT * 4) as usize);
    assert_eq!(brightness(&pixels), 0);

    // Floor and box under a slanted sun.
    let floor_vertices = [
        Vec3::new(-5.0, -1.0, -5.0),
        Vec3::new(-5.0, -1.0, 5.0),
        Vec3::new(5.0, -1.0, 5.0),
        Vec3::new(5.0, -1.0, -5.0),
    ];
    let floor_faces = [UVec3::new(0, 1, 2), UVec3::new(0, 2, 3)];
    register_mesh(
        TriangleMesh::from_indexed("floor", &floor_vertices, &floor_faces).expect("floor"),
    )
    .expect("register floor");
    let (vertices, faces) = cube(Vec3::splat(-0.5), Vec3::splat(0.5));
    let box_id = register_mesh(TriangleMesh::from_indexed("box", &vertices, &faces).expect("box"))
        .expect("register box");

    let mut sun = Light::directional(Vec3::new(1.0, -1.0, 0.3));
    sun.ambient_intensity = 0.1;
    register_light("sun", sun).expect("register sun");

    let shadowed = render_with_device(&mut device, &camera).expect("shadowed render");
    assert!(brightness(&shadowed) > 0);

    // Without the box casting, the floor receives more light.
    set_casts_shadows(box_id, false).expect("box stops casting");
    let unshadowed = render_with_device(&mut device, &camera).expect("unshadowed render");
    assert!(brightness(&unshadowed) > brightness(&shadowed));

    // Aimed at the box center, the middle pixel lands inside its front face.
    set_casts_shadows(box_id, true).expect("box casts again");
    let mut pick_camera = camera.clone();
    pick_camera.position = Vec3::new(0.0, 2.0, 4.0);
    pick_camera.target = Vec3::ZERO;
    let mut renderer = ShadowRenderer::new(&device).expect("renderer");
    device.begin_frame(Vec4::ZERO);
    let report = renderer
        .render_frame(&mut device, &pick_camera, true)
        .expect("select frame");
    device.end_frame().expect("end frame");
    let table = report.pick_table.expect("pick table");
    let picked = device
        .read_pick(WIDTH / 2, HEIGHT / 2)
        .expect("pick readback");
    assert_eq!(table.resolve(picked), Some(box_id));

    // The bottom edge of the image passes under the box onto the floor.
    let floor_id = structure_id("floor").expect("lookup").expect("floor id");
    let below = device.read_pick(WIDTH / 2, HEIGHT - 2).expect("pick readback");
    assert_eq!(table.resolve(below), Some(floor_id));

    remove_all().expect("clear scene");
    shutdown();
}
