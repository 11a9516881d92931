//! Basic integration tests for umbra.
//!
//! Note: umbra keeps its scene in global state, so all tests are combined
//! into a single test function that runs them in sequence.

use umbra::*;

fn floor() -> TriangleMesh {
    let vertices = [
        Vec3::new(-5.0, -1.0, -5.0),
        Vec3::new(-5.0, -1.0, 5.0),
        Vec3::new(5.0, -1.0, 5.0),
        Vec3::new(5.0, -1.0, -5.0),
    ];
    let faces = [UVec3::new(0, 1, 2), UVec3::new(0, 2, 3)];
    TriangleMesh::from_indexed("floor", &vertices, &faces).expect("valid floor")
}

fn crate_box(name: &str) -> TriangleMesh {
    let (vertices, faces) = cube(Vec3::splat(-0.5), Vec3::splat(0.5));
    TriangleMesh::from_indexed(name, &vertices, &faces).expect("valid cube")
}

fn camera() -> Camera {
    let mut camera = Camera::new(1.0);
    camera.look_at_box(Vec3::new(-5.0, -1.0, -5.0), Vec3::new(5.0, 1.0, 5.0));
    camera
}

fn stats() -> CacheStats {
    with_context(|ctx| ctx.cache.stats()).expect("initialized")
}

/// Main integration test that runs all basic tests in sequence.
#[test]
fn test_basics() {
    // Nothing works before init.
    assert!(!is_initialized());
    assert!(matches!(
        register_mesh(crate_box("early")),
        Err(UmbraError::NotInitialized)
    ));

    init().expect("init failed");
    assert!(is_initialized());
    assert!(matches!(init(), Err(UmbraError::AlreadyInitialized)));

    // Registration
    let box_id = register_mesh(crate_box("box")).expect("register box");
    let floor_id = register_mesh(floor()).expect("register floor");
    assert!(matches!(
        register_mesh(crate_box("box")),
        Err(UmbraError::StructureExists(_))
    ));
    assert_eq!(structure_id("box").unwrap(), Some(box_id));
    assert_eq!(structure_id("nonexistent").unwrap(), None);
    assert_eq!(num_structures().unwrap(), 2);

    let mut sun = Light::point(Vec3::new(1.0, 4.0, 0.5));
    sun.ambient_intensity = 0.2;
    let sun_id = register_light("sun", sun).expect("register light");
    assert_eq!(num_lights().unwrap(), 1);
    assert_eq!(get_light(sun_id).unwrap(), Some(sun));

    let camera = camera();
    let mut device = RecordingDevice::default();
    let mut renderer = ShadowRenderer::new(&device).expect("renderer");
    assert!(renderer.shadows_enabled());

    // First frame builds one edge set and one volume per occluder.
    {
        let report = renderer
            .render_frame(&mut device, &camera, false)
            .expect("frame");
        assert_eq!(report.active_lights, 1);
        assert!(!report.stencil_fallback);
        assert_eq!(report.volumes_drawn, 2);
        assert!(report.failures.is_empty());
        assert!(report.pick_table.is_none());

        let stats = stats();
        assert_eq!(stats.edge_set_builds, 2);
        assert_eq!(stats.volume_builds, 2);
    }

    // An unchanged scene reuses every cached volume.
    {
        renderer
            .render_frame(&mut device, &camera, false)
            .expect("frame");
        let stats = stats();
        assert_eq!(stats.edge_set_builds, 2);
        assert_eq!(stats.volume_builds, 2);
        assert_eq!(stats.volume_requests, 4);
    }

    // Moving the light rebuilds volumes, not edge sets.
    {
        set_light_transform(sun_id, Mat4::from_translation(Vec3::new(0.0, 1.0, 0.0)))
            .expect("move light");
        renderer
            .render_frame(&mut device, &camera, false)
            .expect("frame");
        let stats = stats();
        assert_eq!(stats.edge_set_builds, 2);
        assert_eq!(stats.volume_builds, 4);
    }

    // Moving a mesh rebuilds only its own volume.
    {
        set_structure_transform(box_id, Mat4::from_translation(Vec3::new(0.0, 0.5, 0.0)))
            .expect("move box");
        renderer
            .render_frame(&mut device, &camera, false)
            .expect("frame");
        let stats = stats();
        assert_eq!(stats.edge_set_builds, 2);
        assert_eq!(stats.volume_builds, 5);
    }

    // New geometry rebuilds the edge set.
    {
        let (vertices, faces) = cube(Vec3::splat(-0.25), Vec3::splat(0.25));
        let points: Vec<Vec3> = faces
            .iter()
            .flat_map(|f| f.to_array())
            .map(|i| vertices[i as usize])
            .collect();
        set_structure_triangles(box_id, points).expect("new triangles");
        assert!(set_structure_triangles(box_id, vec![Vec3::ZERO; 4]).is_err());
        renderer
            .render_frame(&mut device, &camera, false)
            .expect("frame");
        let stats = stats();
        assert_eq!(stats.edge_set_builds, 3);
        assert_eq!(stats.volume_builds, 6);
    }

    // Shadow casting can be switched off per mesh.
    {
        set_casts_shadows(floor_id, false).expect("floor stops casting");
        let report = renderer
            .render_frame(&mut device, &camera, false)
            .expect("frame");
        assert_eq!(report.volumes_drawn, 1);
        set_casts_shadows(floor_id, true).expect("floor casts again");
    }

    // Selection
    {
        let report = renderer
            .render_frame(&mut device, &camera, true)
            .expect("frame");
        let table = report.pick_table.expect("pick table");
        assert_eq!(table.len(), 2);
        let picked: Vec<StructureId> = (1..=2)
            .filter_map(|i| table.resolve(index_to_color(i)))
            .collect();
        assert!(picked.contains(&box_id));
        assert!(picked.contains(&floor_id));
    }

    // Options reach the renderer on the next frame.
    {
        let mut opts = options().expect("options");
        assert!(!opts.debug.show_volume);
        opts.debug.show_volume = true;
        set_options(opts.clone()).expect("set options");
        assert_eq!(options().unwrap(), opts);

        device.clear_commands();
        renderer
            .render_frame(&mut device, &camera, false)
            .expect("frame");
        assert!(device.draws().any(|d| d.state.color_write
            && matches!(d.kind, DrawKind::Homogeneous(_))));
        set_options(ShadowOptions::default()).expect("reset options");
    }

    // A device without stencil bits renders lights unshadowed.
    {
        let mut flat = RecordingDevice::new(0);
        let mut flat_renderer = ShadowRenderer::new(&flat).expect("renderer");
        assert!(!flat_renderer.shadows_enabled());
        let report = flat_renderer
            .render_frame(&mut flat, &camera, false)
            .expect("frame");
        assert!(report.stencil_fallback);
        assert_eq!(report.active_lights, 1);
        assert_eq!(report.volumes_drawn, 0);
    }

    // Disabled lights and structures drop out.
    {
        update_light(sun_id, |light| light.on = false).expect("switch off");
        let report = renderer
            .render_frame(&mut device, &camera, false)
            .expect("frame");
        assert_eq!(report.active_lights, 0);
        update_light(sun_id, |light| light.on = true).expect("switch on");

        set_structure_enabled(floor_id, false).expect("hide floor");
        let report = renderer
            .render_frame(&mut device, &camera, false)
            .expect("frame");
        assert_eq!(report.volumes_drawn, 1);
        set_structure_enabled(floor_id, true).expect("show floor");
    }

    // Removal
    {
        remove_light(sun_id).expect("remove light");
        assert!(matches!(
            remove_light(sun_id),
            Err(UmbraError::LightNotFound(_))
        ));
        remove_structure(box_id).expect("remove box");
        assert!(matches!(
            remove_structure(box_id),
            Err(UmbraError::StructureNotFound(_))
        ));
        assert!(set_structure_transform(box_id, Mat4::IDENTITY).is_err());
        assert_eq!(num_structures().unwrap(), 1);

        remove_all().expect("remove all");
        assert_eq!(num_structures().unwrap(), 0);
        assert_eq!(num_lights().unwrap(), 0);
    }

    // Shutdown, then start over with an empty scene.
    shutdown();
    assert!(!is_initialized());
    assert!(num_structures().is_err());

    init().expect("re-init failed");
    assert_eq!(num_structures().unwrap(), 0);
    shutdown();
}
