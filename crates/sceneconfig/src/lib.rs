//! Scene files describing a black hole, its disk, the camera and output
//! settings. Every section is optional; missing values fall back to the
//! reference scene.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use lensing::BlackHoleParams;
use serde::de::{self, Deserializer};
use serde::Deserialize;

/// Conventional file name inside the config directory.
pub const SCENE_FILE_NAME: &str = "scene.toml";

/// Scene written by `scene init`: the reference black hole and disk, with the
/// camera pulled back outside the disk and tilted so the disk is visible.
pub const DEFAULT_SCENE_TOML: &str = r#"version = 1

[black_hole]
schwarzschild_radius = 1.0

[camera]
distance = 10.0
# Degrees above the disk plane. 0 looks at the disk exactly edge-on.
inclination = 8.0

[disk]
inner = 1.2
outer = 8.0

[output]
size = "800x600"
fps = 30
duration = "10s"
"#;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse scene: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to read scene {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid scene: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SceneConfig {
    pub version: u32,
    #[serde(default)]
    pub black_hole: BlackHoleSection,
    #[serde(default)]
    pub camera: CameraSection,
    #[serde(default)]
    pub disk: DiskSection,
    #[serde(default)]
    pub output: OutputSection,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BlackHoleSection {
    #[serde(default = "default_schwarzschild_radius")]
    pub schwarzschild_radius: f32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CameraSection {
    #[serde(default = "default_camera_distance")]
    pub distance: f32,
    /// Degrees above the disk plane.
    #[serde(default)]
    pub inclination: f32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DiskSection {
    #[serde(default = "default_disk_inner")]
    pub inner: f32,
    #[serde(default = "default_disk_outer")]
    pub outer: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputSection {
    #[serde(default, deserialize_with = "deserialize_size_opt")]
    pub size: Option<(u32, u32)>,
    #[serde(default)]
    pub fps: Option<f32>,
    #[serde(default, deserialize_with = "deserialize_duration_opt")]
    pub duration: Option<Duration>,
}

impl Default for BlackHoleSection {
    fn default() -> Self {
        Self {
            schwarzschild_radius: default_schwarzschild_radius(),
        }
    }
}

impl Default for CameraSection {
    fn default() -> Self {
        Self {
            distance: default_camera_distance(),
            inclination: 0.0,
        }
    }
}

impl Default for DiskSection {
    fn default() -> Self {
        Self {
            inner: default_disk_inner(),
            outer: default_disk_outer(),
        }
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            version: 1,
            black_hole: BlackHoleSection::default(),
            camera: CameraSection::default(),
            disk: DiskSection::default(),
            output: OutputSection::default(),
        }
    }
}

fn default_schwarzschild_radius() -> f32 {
    BlackHoleParams::default().schwarzschild_radius
}

fn default_camera_distance() -> f32 {
    BlackHoleParams::default().camera_distance
}

fn default_disk_inner() -> f32 {
    BlackHoleParams::default().disk_inner
}

fn default_disk_outer() -> f32 {
    BlackHoleParams::default().disk_outer
}

/// Parses `WIDTHxHEIGHT` (also accepts `X` and `*`), rejecting zero sizes.
pub fn parse_size(raw: &str) -> Result<(u32, u32), String> {
    let trimmed = raw.trim();
    let (width, height) = trimmed
        .split_once(['x', 'X', '*'])
        .ok_or_else(|| format!("invalid size '{trimmed}'; expected WIDTHxHEIGHT"))?;
    let width: u32 = width
        .trim()
        .parse()
        .map_err(|err| format!("invalid width in '{trimmed}': {err}"))?;
    let height: u32 = height
        .trim()
        .parse()
        .map_err(|err| format!("invalid height in '{trimmed}': {err}"))?;
    if width == 0 || height == 0 {
        return Err(format!("size '{trimmed}' must be non-zero in both dimensions"));
    }
    Ok((width, height))
}

fn deserialize_size_opt<'de, D>(deserializer: D) -> Result<Option<(u32, u32)>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Helper {
        Str(String),
        Pair([u32; 2]),
    }

    match Option::<Helper>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Helper::Str(raw)) => parse_size(&raw).map(Some).map_err(de::Error::custom),
        Some(Helper::Pair([width, height])) => Ok(Some((width, height))),
    }
}

fn deserialize_duration_opt<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Option<Duration>;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a duration as number of seconds or human-readable string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            humantime::parse_duration(v)
                .map(Some)
                .map_err(|err| E::custom(format!("invalid duration '{v}': {err}")))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(Duration::from_secs(v)))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v < 0 {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Some(Duration::from_secs(v as u64)))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if !v.is_finite() || v.is_sign_negative() {
                return Err(E::custom("duration must be a non-negative number of seconds"));
            }
            Ok(Some(Duration::from_secs_f64(v)))
        }
    }

    deserializer.deserialize_any(Visitor)
}

impl SceneConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: SceneConfig = toml::from_str(input)?;
        raw.validate()?;
        for warning in raw.warnings() {
            tracing::warn!("{warning}");
        }
        Ok(raw)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let scene = Self::from_toml_str(&contents)?;
        tracing::debug!(path = %path.display(), "loaded scene");
        Ok(scene)
    }

    /// Kernel parameters described by this scene.
    pub fn params(&self) -> BlackHoleParams {
        BlackHoleParams::new(
            self.black_hole.schwarzschild_radius,
            self.camera.distance,
            self.disk.inner,
            self.disk.outer,
        )
        .with_inclination_degrees(self.camera.inclination)
    }

    /// Total frame count implied by `output.duration` at `output.fps`.
    pub fn frame_count(&self) -> Option<u64> {
        let duration = self.output.duration?;
        let fps = self.output.fps?;
        Some(frames_for(duration, fps))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != 1 {
            return Err(ConfigError::Invalid(format!(
                "unsupported scene version {}; expected 1",
                self.version
            )));
        }

        validate_params(&self.params())?;

        if !self.camera.inclination.is_finite() || self.camera.inclination.abs() >= 90.0 {
            return Err(ConfigError::Invalid(format!(
                "camera.inclination must lie strictly between -90 and 90 degrees, got {}",
                self.camera.inclination
            )));
        }

        if let Some((width, height)) = self.output.size {
            if width == 0 || height == 0 {
                return Err(ConfigError::Invalid(
                    "output.size must be non-zero in both dimensions".into(),
                ));
            }
        }

        if let Some(fps) = self.output.fps {
            if !fps.is_finite() || fps < 0.0 {
                return Err(ConfigError::Invalid("output.fps must be >= 0".into()));
            }
        }

        if let Some(duration) = self.output.duration {
            if duration.is_zero() {
                return Err(ConfigError::Invalid(
                    "output.duration must be greater than zero".into(),
                ));
            }
        }

        Ok(())
    }

    /// Legal but probably unintended settings.
    pub fn warnings(&self) -> Vec<String> {
        params_warnings(&self.params())
    }
}

/// Number of frames covering `duration` at `fps`, rounded up.
pub fn frames_for(duration: Duration, fps: f32) -> u64 {
    if !(fps.is_finite() && fps > 0.0) {
        return 0;
    }
    (duration.as_secs_f64() * f64::from(fps)).ceil() as u64
}

/// Rejects geometry the kernel would shade into nonsense.
///
/// Hosts call this on the final parameters, after CLI overrides are merged.
pub fn validate_params(params: &BlackHoleParams) -> Result<(), ConfigError> {
    let fields = [
        ("black_hole.schwarzschild_radius", params.schwarzschild_radius),
        ("camera.distance", params.camera_distance),
        ("disk.inner", params.disk_inner),
        ("disk.outer", params.disk_outer),
        ("camera.inclination", params.camera_inclination),
    ];
    for (name, value) in fields {
        if !value.is_finite() {
            return Err(ConfigError::Invalid(format!("{name} must be finite")));
        }
    }

    if params.schwarzschild_radius <= 0.0 {
        return Err(ConfigError::Invalid(
            "black_hole.schwarzschild_radius must be greater than zero".into(),
        ));
    }
    if params.camera_distance <= 0.0 {
        return Err(ConfigError::Invalid(
            "camera.distance must be greater than zero".into(),
        ));
    }
    if params.disk_inner <= params.schwarzschild_radius {
        return Err(ConfigError::Invalid(format!(
            "disk.inner ({}) must be larger than the Schwarzschild radius ({})",
            params.disk_inner, params.schwarzschild_radius
        )));
    }
    if params.disk_outer <= params.disk_inner {
        return Err(ConfigError::Invalid(format!(
            "disk.outer ({}) must be larger than disk.inner ({})",
            params.disk_outer, params.disk_inner
        )));
    }
    if params.camera_inclination.abs() >= std::f32::consts::FRAC_PI_2 {
        return Err(ConfigError::Invalid(
            "camera.inclination must lie strictly between -90 and 90 degrees".into(),
        ));
    }
    Ok(())
}

/// Non-fatal observations about otherwise valid geometry.
pub fn params_warnings(params: &BlackHoleParams) -> Vec<String> {
    let mut warnings = Vec::new();
    if params.camera_distance < params.disk_outer {
        warnings.push(format!(
            "camera.distance ({}) is inside the disk (outer radius {}); the view will look odd",
            params.camera_distance, params.disk_outer
        ));
    }
    warnings
}
