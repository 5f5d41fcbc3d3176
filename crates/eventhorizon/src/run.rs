use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use lensing::BlackHoleParams;
use renderer::export::format_for_path;
use renderer::{
    ExportFormat, RenderMode, RenderPolicy, Renderer, RendererConfig, DEFAULT_SEQUENCE_FPS,
};
use sceneconfig::{frames_for, params_warnings, validate_params, SceneConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::RunArgs;
use crate::paths::AppPaths;

pub fn run(args: RunArgs) -> Result<()> {
    let scene = load_scene(&args)?;
    let config = build_renderer_config(&args, scene.as_ref(), Local::now())?;

    info!(
        width = config.surface_size.0,
        height = config.surface_size.1,
        rs = config.params.schwarzschild_radius,
        distance = config.params.camera_distance,
        inclination = config.params.camera_inclination.to_degrees(),
        "starting renderer"
    );

    let mut renderer = Renderer::new(config);
    let stats = renderer.run()?;
    let seconds = stats.elapsed.as_secs_f64();
    let fps = if seconds > 0.0 {
        stats.frames as f64 / seconds
    } else {
        0.0
    };
    info!(
        frames = stats.frames,
        elapsed = %humantime::format_duration(stats.elapsed),
        fps = %format!("{fps:.1}"),
        "renderer finished"
    );
    Ok(())
}

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Loads `--scene`, or the config-dir scene when one exists.
fn load_scene(args: &RunArgs) -> Result<Option<SceneConfig>> {
    if let Some(path) = &args.scene {
        let scene = SceneConfig::load(path)
            .with_context(|| format!("failed to load scene {}", path.display()))?;
        return Ok(Some(scene));
    }

    let paths = match AppPaths::discover() {
        Ok(paths) => paths,
        Err(err) => {
            tracing::debug!("no config directory: {err:#}");
            return Ok(None);
        }
    };
    let path = paths.scene_file();
    if !path.is_file() {
        return Ok(None);
    }
    let scene = SceneConfig::load(&path)
        .with_context(|| format!("failed to load scene {}", path.display()))?;
    info!(path = %path.display(), "using scene file");
    Ok(Some(scene))
}

/// Merges CLI flags over the scene file over built-in defaults.
pub fn build_renderer_config(
    args: &RunArgs,
    scene: Option<&SceneConfig>,
    now: DateTime<Local>,
) -> Result<RendererConfig> {
    let params = merge_params(args, scene);
    validate_params(&params).context("invalid black hole parameters")?;
    for warning in params_warnings(&params) {
        warn!("{warning}");
    }

    let output = scene.map(|scene| &scene.output);
    let surface_size = args
        .size
        .or_else(|| output.and_then(|output| output.size))
        .unwrap_or(RendererConfig::default().surface_size);
    let fps = args
        .fps
        .or_else(|| output.and_then(|output| output.fps))
        .unwrap_or(DEFAULT_SEQUENCE_FPS);
    let target_fps = (fps > 0.0).then_some(fps);

    let mode = match &args.sequence {
        Some(directory) => RenderMode::Sequence {
            directory: directory.clone(),
        },
        None => RenderMode::Terminal,
    };

    let policy = if let Some(export) = &args.export {
        let path = export.clone().unwrap_or_else(|| default_export_path(now));
        let format = format_for_path(&path, Some(ExportFormat::Png))?;
        RenderPolicy::Export {
            time: args.time,
            path,
            format,
        }
    } else if args.still {
        RenderPolicy::Still { time: args.time }
    } else {
        if args.time.is_some() {
            warn!("--time only applies to --still and --export; ignoring");
        }
        // Scene durations describe recordings, so they never cap a live preview.
        let duration = args.duration.or_else(|| match mode {
            RenderMode::Sequence { .. } => output.and_then(|output| output.duration),
            RenderMode::Terminal => None,
        });
        let step_fps = target_fps.unwrap_or(DEFAULT_SEQUENCE_FPS);
        let frame_limit = args
            .frames
            .or_else(|| duration.map(|duration| frames_for(duration, step_fps)));
        RenderPolicy::Animate {
            target_fps,
            frame_limit,
        }
    };

    Ok(RendererConfig {
        surface_size,
        params,
        mode,
        policy,
        threads: args.threads.map(usize::from),
    })
}

fn merge_params(args: &RunArgs, scene: Option<&SceneConfig>) -> BlackHoleParams {
    let mut params = scene.map(SceneConfig::params).unwrap_or_default();
    if let Some(rs) = args.schwarzschild_radius {
        params.schwarzschild_radius = rs;
    }
    if let Some(distance) = args.camera_distance {
        params.camera_distance = distance;
    }
    if let Some(inner) = args.disk_inner {
        params.disk_inner = inner;
    }
    if let Some(outer) = args.disk_outer {
        params.disk_outer = outer;
    }
    if let Some(degrees) = args.inclination {
        params = params.with_inclination_degrees(degrees);
    }
    params
}

fn default_export_path(now: DateTime<Local>) -> PathBuf {
    PathBuf::from(format!("eventhorizon-{}.png", now.format("%Y%m%d-%H%M%S")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::time::Duration;

    fn fixed_now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap()
    }

    fn scene() -> SceneConfig {
        SceneConfig::from_toml_str(
            r#"
version = 1

[black_hole]
schwarzschild_radius = 0.5

[camera]
distance = 12.0
inclination = 15.0

[disk]
inner = 1.0
outer = 6.0

[output]
size = "320x180"
fps = 24
duration = "2s"
"#,
        )
        .unwrap()
    }

    #[test]
    fn defaults_preview_in_the_terminal() {
        let args = RunArgs::default();
        let config = build_renderer_config(&args, None, fixed_now()).unwrap();
        assert_eq!(config.mode, RenderMode::Terminal);
        assert_eq!(config.surface_size, (800, 600));
        assert_eq!(config.params, BlackHoleParams::default());
        assert_eq!(
            config.policy,
            RenderPolicy::Animate {
                target_fps: Some(DEFAULT_SEQUENCE_FPS),
                frame_limit: None,
            }
        );
        assert_eq!(config.threads, None);
    }

    #[test]
    fn cli_flags_override_scene_values() {
        let scene = scene();
        let args = RunArgs {
            camera_distance: Some(30.0),
            inclination: Some(-5.0),
            size: Some((64, 48)),
            threads: Some(3),
            ..RunArgs::default()
        };
        let config = build_renderer_config(&args, Some(&scene), fixed_now()).unwrap();
        assert_eq!(config.params.schwarzschild_radius, 0.5);
        assert_eq!(config.params.camera_distance, 30.0);
        assert_eq!(config.params.disk_outer, 6.0);
        let inclination = config.params.camera_inclination;
        assert!((inclination + 5.0_f32.to_radians()).abs() < 1e-6);
        assert_eq!(config.surface_size, (64, 48));
        assert_eq!(config.threads, Some(3));
    }

    #[test]
    fn scene_duration_bounds_sequences_only() {
        let scene = scene();
        let args = RunArgs::default();
        let preview = build_renderer_config(&args, Some(&scene), fixed_now()).unwrap();
        assert_eq!(
            preview.policy,
            RenderPolicy::Animate {
                target_fps: Some(24.0),
                frame_limit: None,
            }
        );

        let args = RunArgs {
            sequence: Some(PathBuf::from("frames")),
            ..RunArgs::default()
        };
        let sequence = build_renderer_config(&args, Some(&scene), fixed_now()).unwrap();
        assert_eq!(
            sequence.policy,
            RenderPolicy::Animate {
                target_fps: Some(24.0),
                frame_limit: Some(48),
            }
        );
        assert_eq!(sequence.surface_size, (320, 180));
    }

    #[test]
    fn explicit_frames_beat_duration() {
        let args = RunArgs {
            frames: Some(5),
            duration: Some(Duration::from_secs(60)),
            fps: Some(0.0),
            ..RunArgs::default()
        };
        let config = build_renderer_config(&args, None, fixed_now()).unwrap();
        assert_eq!(
            config.policy,
            RenderPolicy::Animate {
                target_fps: None,
                frame_limit: Some(5),
            }
        );
    }

    #[test]
    fn export_without_path_is_timestamped_png() {
        let args = RunArgs {
            export: Some(None),
            time: Some(2.0),
            ..RunArgs::default()
        };
        let config = build_renderer_config(&args, None, fixed_now()).unwrap();
        assert_eq!(
            config.policy,
            RenderPolicy::Export {
                time: Some(2.0),
                path: PathBuf::from("eventhorizon-20240309-140507.png"),
                format: ExportFormat::Png,
            }
        );
    }

    #[test]
    fn export_format_follows_extension() {
        let args = RunArgs {
            export: Some(Some(PathBuf::from("out/frame.bmp"))),
            ..RunArgs::default()
        };
        let config = build_renderer_config(&args, None, fixed_now()).unwrap();
        assert!(matches!(
            config.policy,
            RenderPolicy::Export {
                format: ExportFormat::Bmp,
                ..
            }
        ));
    }

    #[test]
    fn still_keeps_requested_time() {
        let args = RunArgs {
            still: true,
            time: Some(4.5),
            ..RunArgs::default()
        };
        let config = build_renderer_config(&args, None, fixed_now()).unwrap();
        assert_eq!(config.policy, RenderPolicy::Still { time: Some(4.5) });
    }

    #[test]
    fn merged_geometry_is_validated() {
        let args = RunArgs {
            disk_inner: Some(0.5),
            ..RunArgs::default()
        };
        let err = build_renderer_config(&args, None, fixed_now()).unwrap_err();
        assert!(format!("{err:#}").contains("disk.inner"));

        let args = RunArgs {
            disk_outer: Some(1.0),
            ..RunArgs::default()
        };
        assert!(build_renderer_config(&args, None, fixed_now()).is_err());
    }
}
