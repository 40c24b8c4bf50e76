//! Integration tests for the per-view lighting stage

use glam::Vec3;
use umbra_headless::*;
use umbra_render::prelude::*;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn scene() -> SceneCulling {
    SceneCulling::with_settings(Camera::default(), &ShadowSettings::default())
        .with_light(
            VisibleLight::new(LightKind::Point { range: 8.0 }, Vec3::ONE, glam::Mat4::IDENTITY)
                .with_shadows(ShadowMode::Hard, 1.0),
            None,
        )
        .with_light(
            VisibleLight::directional(Vec3::new(1.0, 0.9, 0.8), Vec3::new(0.0, -1.0, -1.0))
                .with_shadows(ShadowMode::Hard, 0.75),
            Some(CasterBounds::from_center_extents(Vec3::new(0.0, 0.0, -10.0), Vec3::splat(5.0))),
        )
}

#[test]
fn test_settings_from_json() {
    init_logging();
    let json = r#"{
        "max_distance": 60.0,
        "distance_fade": 0.2,
        "directional": {
            "atlas_size": "_2048",
            "cascade_count": 2,
            "cascade_ratio_1": 0.3,
            "cascade_ratio_2": 0.6,
            "cascade_ratio_3": 0.9,
            "cascade_fade": 0.05
        }
    }"#;

    let mut settings: ShadowSettings = serde_json::from_str(json).unwrap();
    settings.validate();

    let mut backend = RecordingBackend::new();
    let mut lighting = Lighting::new();
    lighting.setup(&mut backend, &scene(), &settings).unwrap();

    assert_eq!(backend.allocations(), &[AtlasDesc::shadow_map(2048)]);
    assert_eq!(backend.draw_count(), 2);
    assert_eq!(lighting.shadows().grid().map(|g| g.tile_size), Some(1024));
    lighting.cleanup(&mut backend).unwrap();
}

#[test]
fn test_frame_command_order() {
    init_logging();
    let mut backend = RecordingBackend::new();
    let mut lighting = Lighting::new();
    let mut settings = ShadowSettings::default();
    settings.directional.cascade_count = 1;

    lighting.setup(&mut backend, &scene(), &settings).unwrap();
    lighting.cleanup(&mut backend).unwrap();

    let shadows: Vec<_> = backend.commands_from("Shadows").cloned().collect();
    assert_eq!(shadows[0], RenderCommand::GetTemporaryAtlas(AtlasDesc::shadow_map(1024)));
    assert_eq!(
        shadows[1],
        RenderCommand::SetAtlasRenderTarget {
            load: LoadAction::DontCare,
            store: StoreAction::Store,
        }
    );
    assert_eq!(shadows[2], RenderCommand::ClearDepth);
    assert_eq!(shadows[3], RenderCommand::BeginSample("Shadows"));
    assert_eq!(shadows[4], RenderCommand::SetViewport(Viewport::new(0, 0, 1024, 1024)));
    assert!(matches!(shadows[5], RenderCommand::SetViewProjection { .. }));
    assert!(matches!(
        &shadows[6],
        RenderCommand::DrawShadows(draw) if draw.visible_light_index == 1
    ));
    assert!(matches!(shadows[7], RenderCommand::SetDirectionalShadows(_)));
    assert_eq!(shadows[8], RenderCommand::EndSample("Shadows"));
    assert_eq!(shadows[9], RenderCommand::ReleaseTemporaryAtlas);
    assert_eq!(shadows.len(), 10);

    let lighting_commands: Vec<_> = backend.commands_from("Lighting").collect();
    assert_eq!(lighting_commands.len(), 3);
    assert_eq!(lighting_commands[0], &RenderCommand::BeginSample("Lighting"));
    assert_eq!(lighting_commands[2], &RenderCommand::EndSample("Lighting"));
}

#[test]
fn test_published_lights() {
    init_logging();
    let mut backend = RecordingBackend::new();
    let mut lighting = Lighting::new();

    lighting.setup(&mut backend, &scene(), &ShadowSettings::default()).unwrap();

    let lights = backend.published_lights().unwrap();
    assert_eq!(lights.count, 1);
    assert_eq!(lights.colors[0], [1.0, 0.9, 0.8, 0.0]);

    // Direction points back toward the light
    let direction = Vec3::new(lights.directions[0][0], lights.directions[0][1], lights.directions[0][2]);
    assert!((direction - Vec3::new(0.0, 1.0, 1.0).normalize()).length() < 1e-5);

    assert_eq!(lights.shadow_data[0], [0.75, 0.0, 0.0, 0.0]);
    assert_eq!(lights.as_bytes().len(), GpuDirectionalLights::SIZE);
    assert_eq!(lighting.collector().skipped(), 1);

    lighting.cleanup(&mut backend).unwrap();
}

#[test]
fn test_many_frames_reuse_one_view() {
    init_logging();
    let scene = scene();
    let mut backend = RecordingBackend::new();
    let mut lighting = Lighting::new();

    for quality in [ShadowQuality::Low, ShadowQuality::Medium, ShadowQuality::High] {
        lighting.setup(&mut backend, &scene, &quality.to_settings()).unwrap();
        assert!(backend.live_atlas().is_some());
        lighting.cleanup(&mut backend).unwrap();
        assert!(backend.live_atlas().is_none());
    }

    let sizes: Vec<u32> = backend.allocations().iter().map(|a| a.width).collect();
    assert_eq!(sizes, vec![512, 1024, 4096]);
}
