use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "eventhorizon",
    author,
    version,
    about = "Renders a lensed Schwarzschild black hole",
    arg_required_else_help = false
)]
pub struct Cli {
    #[command(flatten)]
    pub run: RunArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Parser, Debug, Default)]
pub struct RunArgs {
    /// Scene TOML file; defaults to `scene.toml` in the config directory when present.
    #[arg(long, value_name = "FILE", env = "EVENTHORIZON_SCENE")]
    pub scene: Option<PathBuf>,

    /// Output resolution for sequences and exports (e.g. `1280x720`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_size)]
    pub size: Option<(u32, u32)>,

    /// Schwarzschild radius of the hole.
    #[arg(long = "rs", value_name = "RADIUS", value_parser = parse_positive)]
    pub schwarzschild_radius: Option<f32>,

    /// Distance from the hole to the camera.
    #[arg(long, value_name = "DISTANCE", value_parser = parse_positive)]
    pub camera_distance: Option<f32>,

    /// Inner radius of the accretion disk.
    #[arg(long, value_name = "RADIUS", value_parser = parse_positive)]
    pub disk_inner: Option<f32>,

    /// Outer radius of the accretion disk.
    #[arg(long, value_name = "RADIUS", value_parser = parse_positive)]
    pub disk_outer: Option<f32>,

    /// Camera elevation above the disk plane in degrees.
    #[arg(
        long,
        value_name = "DEGREES",
        allow_negative_numbers = true,
        value_parser = parse_inclination
    )]
    pub inclination: Option<f32>,

    /// Frame rate cap for the preview, or time step for sequences (0=uncapped).
    #[arg(long, value_name = "FPS", value_parser = parse_fps)]
    pub fps: Option<f32>,

    /// Stop after rendering this many frames.
    #[arg(long, value_name = "N")]
    pub frames: Option<u64>,

    /// Stop after this much animation time (e.g. `10s`, `1m 30s`).
    #[arg(long, value_name = "DURATION", value_parser = parse_duration)]
    pub duration: Option<Duration>,

    /// Render a single still frame instead of animating.
    #[arg(long)]
    pub still: bool,

    /// Timestamp in seconds to evaluate for still and export modes.
    #[arg(long, value_name = "SECONDS", value_parser = parse_time)]
    pub time: Option<f32>,

    /// Export one still frame (PNG or BMP) and exit; the path defaults to a timestamped PNG.
    #[arg(long, value_name = "PATH", num_args = 0..=1, conflicts_with = "sequence")]
    pub export: Option<Option<PathBuf>>,

    /// Write an animated PNG sequence into this directory instead of previewing.
    #[arg(long, value_name = "DIR")]
    pub sequence: Option<PathBuf>,

    /// Limit pixel shading to this many worker threads.
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u16).range(1..))]
    pub threads: Option<u16>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Inspect or create the scene file.
    Scene(SceneCommand),
}

#[derive(Parser, Debug)]
pub struct SceneCommand {
    #[command(subcommand)]
    pub action: SceneAction,
}

#[derive(Subcommand, Debug)]
pub enum SceneAction {
    /// Print the config directory and the scene file that would be loaded.
    Where,
    /// Write a starter scene file into the config directory.
    Init {
        /// Replace an existing scene file.
        #[arg(long)]
        force: bool,
    },
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_size(value: &str) -> Result<(u32, u32), String> {
    sceneconfig::parse_size(value)
}

pub fn parse_positive(value: &str) -> Result<f32, String> {
    let parsed: f32 = value
        .trim()
        .parse()
        .map_err(|_| format!("'{value}' is not a number"))?;
    if !parsed.is_finite() || parsed <= 0.0 {
        return Err(format!("'{value}' must be a positive number"));
    }
    Ok(parsed)
}

pub fn parse_inclination(value: &str) -> Result<f32, String> {
    let parsed: f32 = value
        .trim()
        .parse()
        .map_err(|_| format!("'{value}' is not a number"))?;
    if !parsed.is_finite() || parsed.abs() >= 90.0 {
        return Err("inclination must lie strictly between -90 and 90 degrees".to_string());
    }
    Ok(parsed)
}

pub fn parse_fps(value: &str) -> Result<f32, String> {
    let parsed: f32 = value
        .trim()
        .parse()
        .map_err(|_| format!("'{value}' is not a number"))?;
    if !parsed.is_finite() || parsed < 0.0 {
        return Err("fps must be zero or positive".to_string());
    }
    Ok(parsed)
}

pub fn parse_time(value: &str) -> Result<f32, String> {
    let parsed: f32 = value
        .trim()
        .parse()
        .map_err(|_| format!("'{value}' is not a number of seconds"))?;
    if !parsed.is_finite() || parsed < 0.0 {
        return Err("time must be zero or positive".to_string());
    }
    Ok(parsed)
}

pub fn parse_duration(value: &str) -> Result<Duration, String> {
    let trimmed = value.trim();
    if let Ok(seconds) = trimmed.parse::<f64>() {
        if seconds.is_finite() && seconds > 0.0 {
            return Ok(Duration::from_secs_f64(seconds));
        }
        return Err("duration must be positive".to_string());
    }
    let duration = humantime::parse_duration(trimmed)
        .map_err(|err| format!("invalid duration '{trimmed}': {err}"))?;
    if duration.is_zero() {
        return Err("duration must be positive".to_string());
    }
    Ok(duration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_scene_overrides() {
        let cli = Cli::try_parse_from([
            "eventhorizon",
            "--rs",
            "2",
            "--camera-distance",
            "20",
            "--inclination",
            "-12.5",
            "--size",
            "320x200",
            "--fps",
            "24",
        ])
        .expect("parse");
        assert_eq!(cli.run.schwarzschild_radius, Some(2.0));
        assert_eq!(cli.run.camera_distance, Some(20.0));
        assert_eq!(cli.run.inclination, Some(-12.5));
        assert_eq!(cli.run.size, Some((320, 200)));
        assert_eq!(cli.run.fps, Some(24.0));
        assert!(cli.command.is_none());
    }

    #[test]
    fn export_path_is_optional() {
        let bare = Cli::try_parse_from(["eventhorizon", "--export"]).expect("parse");
        assert_eq!(bare.run.export, Some(None));
        let named = Cli::try_parse_from(["eventhorizon", "--export", "shot.bmp"]).expect("parse");
        assert_eq!(named.run.export, Some(Some(PathBuf::from("shot.bmp"))));
    }

    #[test]
    fn export_conflicts_with_sequence() {
        let parsed =
            Cli::try_parse_from(["eventhorizon", "--export", "a.png", "--sequence", "out"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn scene_subcommands() {
        let cli = Cli::try_parse_from(["eventhorizon", "scene", "init", "--force"]).expect("parse");
        assert!(matches!(
            cli.command,
            Some(Command::Scene(SceneCommand {
                action: SceneAction::Init { force: true }
            }))
        ));
    }

    #[test]
    fn rejects_non_physical_values() {
        assert!(parse_positive("0").is_err());
        assert!(parse_positive("-3").is_err());
        assert!(parse_positive("inf").is_err());
        assert!(parse_inclination("90").is_err());
        assert!(parse_fps("-1").is_err());
        assert!(parse_time("nan").is_err());
        let zero_threads = Cli::try_parse_from(["eventhorizon", "--threads", "0"]);
        assert!(zero_threads.is_err());
    }

    #[test]
    fn durations_accept_seconds_and_humantime() {
        assert_eq!(parse_duration("2.5"), Ok(Duration::from_millis(2500)));
        assert_eq!(parse_duration("1m 30s"), Ok(Duration::from_secs(90)));
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("later").is_err());
    }
}
