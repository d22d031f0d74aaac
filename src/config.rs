use crate::render::{
    color::{Color, GradientStop},
    surface::BlendMode,
};
use serde::{Deserialize, Serialize};
use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

const CONFIG_FILE_NAME: &str = "config.yaml";

/// The landing animation configuration.
///
/// Every field has a default so configuration files only need to list what they change.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[cfg_attr(feature = "json-schema", derive(schemars::JsonSchema))]
#[serde(default, deny_unknown_fields)]
pub(crate) struct Config {
    pub(crate) canvas: CanvasConfig,
    pub(crate) stars: StarfieldConfig,
    pub(crate) horizon: HorizonConfig,
    pub(crate) timeline: TimelineConfig,
    pub(crate) title: TitleConfig,
    pub(crate) cursor: CursorConfig,
}

impl Config {
    /// Loads the configuration from a YAML file.
    pub(crate) fn load(path: &Path) -> Result<Self, ConfigLoadError> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ConfigLoadError::NotFound(path.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        };
        Self::parse(&contents)
    }

    pub(crate) fn parse(contents: &str) -> Result<Self, ConfigLoadError> {
        // An empty document deserializes as null rather than an empty mapping
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Config = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the configuration at `explicit` if given, otherwise the one in the user's configuration
    /// directory if it exists, otherwise the defaults.
    pub(crate) fn discover(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>), ConfigLoadError> {
        if let Some(path) = explicit {
            return Ok((Self::load(path)?, Some(path.to_path_buf())));
        }
        match default_config_path() {
            Some(path) if path.exists() => Ok((Self::load(&path)?, Some(path))),
            _ => Ok((Self::default(), None)),
        }
    }

    pub(crate) fn validate(&self) -> Result<(), InvalidConfig> {
        if self.canvas.min_width == 0 {
            return Err(InvalidConfig("canvas.min_width must be positive".into()));
        }
        if self.stars.max_attempts == 0 {
            return Err(InvalidConfig("stars.max_attempts must be positive".into()));
        }
        if self.stars.max_radius < 0.0 || self.stars.min_speed < 0.0 || self.stars.speed_range < 0.0 {
            return Err(InvalidConfig("star radius and speeds must not be negative".into()));
        }
        if self.horizon.stride <= 0.0 {
            return Err(InvalidConfig("horizon.stride must be positive".into()));
        }
        if self.horizon.layers.is_empty() {
            return Err(InvalidConfig("horizon.layers must not be empty".into()));
        }
        if let Some(layer) = self.horizon.layers.iter().find(|layer| layer.width <= 0.0) {
            return Err(InvalidConfig(format!("horizon layer {} has a non positive width", layer.color)));
        }
        if self.horizon.gradient.iter().any(|stop| !(0.0..=1.0).contains(&stop.offset)) {
            return Err(InvalidConfig("horizon.gradient offsets must be within [0, 1]".into()));
        }
        let timeline = &self.timeline;
        if timeline.horizon_duration_ms == 0 || timeline.stars_fade_ms == 0 {
            return Err(InvalidConfig("timeline durations must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.cursor.easing) {
            return Err(InvalidConfig("cursor.easing must be within [0, 1]".into()));
        }
        Ok(())
    }
}

/// The path of the configuration file in the user's configuration directory.
pub(crate) fn default_config_path() -> Option<PathBuf> {
    let dirs = directories::ProjectDirs::from("", "", "horizon")?;
    Some(dirs.config_dir().join(CONFIG_FILE_NAME))
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[cfg_attr(feature = "json-schema", derive(schemars::JsonSchema))]
#[serde(default, deny_unknown_fields)]
pub(crate) struct CanvasConfig {
    /// Canvases are never narrower than this, whatever the window width.
    pub(crate) min_width: u32,

    /// The color behind both layers when they are presented.
    pub(crate) background: Color,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self { min_width: 1920, background: Color::BLACK }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[cfg_attr(feature = "json-schema", derive(schemars::JsonSchema))]
#[serde(default, deny_unknown_fields)]
pub(crate) struct StarfieldConfig {
    /// How many stars to try to place.
    pub(crate) count: usize,

    /// Placement attempts per star before it is dropped.
    pub(crate) max_attempts: u32,

    pub(crate) max_radius: f32,
    pub(crate) min_speed: f32,

    /// Speeds are drawn from `[min_speed, min_speed + speed_range)`.
    pub(crate) speed_range: f32,

    /// Opacity change per frame, per unit of speed.
    pub(crate) oscillation_step: f32,

    pub(crate) color: Color,
    pub(crate) exclusion: ExclusionConfig,
}

impl Default for StarfieldConfig {
    fn default() -> Self {
        Self {
            count: 200,
            max_attempts: 50,
            max_radius: 1.5,
            min_speed: 0.1,
            speed_range: 0.5,
            oscillation_step: 0.02,
            color: Color::WHITE,
            exclusion: ExclusionConfig::default(),
        }
    }
}

/// The band above the horizon where no star may spawn.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[cfg_attr(feature = "json-schema", derive(schemars::JsonSchema))]
#[serde(default, deny_unknown_fields)]
pub(crate) struct ExclusionConfig {
    /// Height of the band's curve at the edges, as a fraction of the canvas height.
    pub(crate) baseline: f32,
    pub(crate) curve_height: f32,

    /// Extra clearance above the curve.
    pub(crate) threshold: f32,
}

impl Default for ExclusionConfig {
    fn default() -> Self {
        Self { baseline: 0.85, curve_height: 120.0, threshold: 80.0 }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[cfg_attr(feature = "json-schema", derive(schemars::JsonSchema))]
#[serde(default, deny_unknown_fields)]
pub(crate) struct HorizonConfig {
    /// Height of the curve at the edges, as a fraction of the canvas height.
    pub(crate) baseline: f32,
    pub(crate) curve_height: f32,

    /// Horizontal distance between curve points.
    pub(crate) stride: f32,

    /// Peak halo alpha relative to each stroke.
    pub(crate) glow_strength: f32,

    pub(crate) gradient: Vec<GradientStop>,
    pub(crate) layers: Vec<GlowLayer>,
}

impl Default for HorizonConfig {
    fn default() -> Self {
        const MAIN: Color = Color::new(168, 85, 247);
        const MID: Color = Color::new(192, 132, 252);
        const LIGHT: Color = Color::new(224, 168, 255);
        let stop = |offset, alpha| GradientStop { offset, alpha };
        let layer = |color, width, glow, offset_y, blend| GlowLayer { color, width, glow, offset_y, blend };
        Self {
            baseline: 0.97,
            curve_height: 200.0,
            stride: 2.0,
            glow_strength: 0.35,
            gradient: vec![stop(0.0, 0.0), stop(0.2, 0.9), stop(0.5, 1.0), stop(0.8, 0.9), stop(1.0, 0.0)],
            layers: vec![
                layer(MAIN, 8.0, 40.0, -3.0, BlendMode::SourceOver),
                layer(MID, 5.0, 30.0, -2.0, BlendMode::SourceOver),
                layer(LIGHT, 3.0, 20.0, -1.0, BlendMode::SourceOver),
                layer(Color::WHITE, 5.0, 15.0, 0.0, BlendMode::SourceOver),
                layer(MAIN, 10.0, 50.0, -3.0, BlendMode::Screen),
                layer(LIGHT, 6.0, 35.0, -1.0, BlendMode::Screen),
            ],
        }
    }
}

/// One stroke of the horizon.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[cfg_attr(feature = "json-schema", derive(schemars::JsonSchema))]
#[serde(deny_unknown_fields)]
pub(crate) struct GlowLayer {
    pub(crate) color: Color,
    pub(crate) width: f32,
    pub(crate) glow: f32,

    #[serde(default)]
    pub(crate) offset_y: f32,

    #[serde(default)]
    pub(crate) blend: BlendMode,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[cfg_attr(feature = "json-schema", derive(schemars::JsonSchema))]
#[serde(default, deny_unknown_fields)]
pub(crate) struct TimelineConfig {
    /// Time between activation and the start of the reveal.
    pub(crate) initial_delay_ms: u64,

    /// Time for the horizon to fully unfurl and fade in.
    pub(crate) horizon_duration_ms: u64,

    /// Time after the reveal starts before stars begin fading in.
    pub(crate) stars_delay_ms: u64,

    pub(crate) stars_fade_ms: u64,
}

impl TimelineConfig {
    pub(crate) fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self { initial_delay_ms: 1000, horizon_duration_ms: 1200, stars_delay_ms: 800, stars_fade_ms: 800 }
    }
}

/// The title and call to action shown once the stars appear.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[cfg_attr(feature = "json-schema", derive(schemars::JsonSchema))]
#[serde(default, deny_unknown_fields)]
pub(crate) struct TitleConfig {
    pub(crate) title: String,
    pub(crate) subtitle: String,
    pub(crate) button: String,

    /// Where the call to action leads.
    pub(crate) route: String,

    pub(crate) title_delay_ms: u64,
    pub(crate) title_duration_ms: u64,

    /// How far above its resting place the title starts, in virtual pixels.
    pub(crate) title_rise: f32,

    pub(crate) button_delay_ms: u64,
    pub(crate) button_duration_ms: u64,
    pub(crate) button_initial_scale: f32,
    pub(crate) color: Color,
    pub(crate) accent: Color,
}

impl Default for TitleConfig {
    fn default() -> Self {
        Self {
            title: "MovieVerse".into(),
            subtitle: "Unfolding the universe of movies".into(),
            button: "Getting Started".into(),
            route: "/home".into(),
            title_delay_ms: 500,
            title_duration_ms: 1000,
            title_rise: 50.0,
            button_delay_ms: 800,
            button_duration_ms: 800,
            button_initial_scale: 0.8,
            color: Color::WHITE,
            accent: Color::new(192, 132, 252),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[cfg_attr(feature = "json-schema", derive(schemars::JsonSchema))]
#[serde(default, deny_unknown_fields)]
pub(crate) struct CursorConfig {
    /// Fraction of the remaining distance covered every frame.
    pub(crate) easing: f32,
    pub(crate) color: Color,
    pub(crate) hover_color: Color,
}

impl Default for CursorConfig {
    fn default() -> Self {
        Self { easing: 0.2, color: Color::new(224, 168, 255), hover_color: Color::WHITE }
    }
}

/// Errors that can occur when loading the configuration
#[derive(thiserror::Error, Debug)]
pub enum ConfigLoadError {
    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    #[error("io: {0}")]
    Io(#[from] io::Error),

    #[error("invalid configuration: {0}")]
    Invalid(#[from] serde_yaml::Error),

    #[error(transparent)]
    Validation(#[from] InvalidConfig),
}

#[derive(thiserror::Error, Debug)]
#[error("{0}")]
pub struct InvalidConfig(String);

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_landing_page() {
        let config = Config::default();
        assert_eq!(config.canvas.min_width, 1920);
        assert_eq!(config.stars.count, 200);
        assert_eq!(config.stars.max_attempts, 50);
        assert_eq!(config.timeline.initial_delay_ms, 1000);
        assert_eq!(config.horizon.layers.len(), 6);
        assert_eq!(config.horizon.layers.iter().filter(|l| l.blend == BlendMode::Screen).count(), 2);
        config.validate().expect("defaults are valid");
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let config = Config::parse(
            r#"
stars:
  count: 10
timeline:
  stars_delay_ms: 400
"#,
        )
        .expect("parse failed");
        assert_eq!(config.stars.count, 10);
        assert_eq!(config.stars.max_attempts, 50);
        assert_eq!(config.timeline.stars_delay_ms, 400);
        assert_eq!(config.timeline.horizon_duration_ms, 1200);
    }

    #[test]
    fn empty_file_is_default() {
        assert_eq!(Config::parse("").unwrap(), Config::default());
    }

    #[test]
    fn layers_parse_with_colors() {
        let config = Config::parse(
            r##"
horizon:
  layers:
    - color: "#ff0000"
      width: 4
      glow: 10
      blend: screen
"##,
        )
        .expect("parse failed");
        let layer = &config.horizon.layers[0];
        assert_eq!(layer.color, Color::new(255, 0, 0));
        assert_eq!(layer.blend, BlendMode::Screen);
        assert_eq!(layer.offset_y, 0.0);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let result = Config::parse("timeline:\n  horizon_duration_ms: 0\n");
        assert!(matches!(result, Err(ConfigLoadError::Validation(_))));

        let result = Config::parse("horizon:\n  layers: []\n");
        assert!(matches!(result, Err(ConfigLoadError::Validation(_))));

        let result = Config::parse("stars:\n  unknown: 1\n");
        assert!(matches!(result, Err(ConfigLoadError::Invalid(_))));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "cursor:\n  easing: 0.5").expect("write");
        let config = Config::load(file.path()).expect("load failed");
        assert_eq!(config.cursor.easing, 0.5);
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let result = Config::discover(Some(Path::new("/definitely/not/here.yaml")));
        assert!(matches!(result, Err(ConfigLoadError::NotFound(_))));
    }
}
