use std::fs;

use lensing::BlackHoleParams;
use renderer::{ExportFormat, RenderMode, RenderPolicy, Renderer, RendererConfig};
use tempfile::TempDir;

fn config(policy: RenderPolicy, mode: RenderMode) -> RendererConfig {
    RendererConfig {
        surface_size: (32, 24),
        params: BlackHoleParams::default().with_inclination_degrees(10.0),
        mode,
        policy,
        threads: Some(2),
    }
}

#[test]
fn export_policy_writes_decodable_png() {
    let root = TempDir::new().unwrap();
    let path = root.path().join("shots/still.png");
    let mut renderer = Renderer::new(config(
        RenderPolicy::Export {
            time: Some(1.5),
            path: path.clone(),
            format: ExportFormat::Png,
        },
        RenderMode::Terminal,
    ));

    let stats = renderer.run().unwrap();
    assert_eq!(stats.frames, 1);

    let image = image::open(&path).unwrap().to_rgb8();
    assert_eq!(image.dimensions(), (32, 24));
    let centre = image.get_pixel(16, 12).0;
    assert!(
        centre.iter().all(|channel| *channel < 8),
        "centre {centre:?}"
    );
}

#[test]
fn sequence_mode_writes_numbered_frames() {
    let root = TempDir::new().unwrap();
    let directory = root.path().join("frames");
    let mut renderer = Renderer::new(config(
        RenderPolicy::Animate {
            target_fps: Some(12.0),
            frame_limit: Some(3),
        },
        RenderMode::Sequence {
            directory: directory.clone(),
        },
    ));

    let stats = renderer.run().unwrap();
    assert_eq!(stats.frames, 3);

    let mut names: Vec<String> = fs::read_dir(&directory)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(
        names,
        ["frame_00000.png", "frame_00001.png", "frame_00002.png"]
    );
}

#[test]
fn unbounded_sequence_is_rejected() {
    let root = TempDir::new().unwrap();
    let mut renderer = Renderer::new(config(
        RenderPolicy::Animate {
            target_fps: None,
            frame_limit: None,
        },
        RenderMode::Sequence {
            directory: root.path().join("frames"),
        },
    ));
    assert!(renderer.run().is_err());
}

#[test]
fn still_render_shades_every_pixel_with_shadow_in_the_middle() {
    let renderer = Renderer::new(RendererConfig {
        surface_size: (40, 30),
        ..config(
            RenderPolicy::Still { time: Some(0.0) },
            RenderMode::Terminal,
        )
    });
    let surface = renderer.render_still().unwrap();

    assert_eq!(surface.size(), (40, 30));
    assert!(surface
        .pixels()
        .iter()
        .all(|p| p.is_finite() && p.min_element() >= 0.0 && p.max_element() < 1.0));
    assert!(surface.pixel(20, 15).unwrap().max_element() < 0.02);
    let brightest = surface
        .pixels()
        .iter()
        .map(|p| p.max_element())
        .fold(0.0_f32, f32::max);
    assert!(brightest > 0.05, "frame is unexpectedly dark");
}
