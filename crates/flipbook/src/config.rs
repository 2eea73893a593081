//! Layered configuration for the Flipbook binary and orchestrator.

use config::{Config, Environment, File, FileFormat};
use flipbook_core::VideoSpec;
use flipbook_error::{ConfigError, FlipbookError, FlipbookResult};
use flipbook_models::ImageSettings;
use flipbook_pipeline::PipelineConfig;
use flipbook_retry::RetryConfig;
use flipbook_video::{DEFAULT_FRAME_PATTERN, FfmpegConfig, FramePattern};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

/// Bundled default configuration.
const DEFAULT_CONFIG: &str = include_str!("../../../flipbook.toml");

/// Prefix for environment overrides, e.g. `FLIPBOOK_RETRY__MAX_RETRIES=5`.
pub const ENV_PREFIX: &str = "FLIPBOOK";

/// Where generation runs are archived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Archive root directory
    pub root: PathBuf,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("archive"),
        }
    }
}

/// Where rendered frames are written and how they are matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FramesConfig {
    /// Frames directory
    pub directory: PathBuf,
    /// Glob selecting frame files inside `directory`
    pub pattern: String,
}

impl Default for FramesConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("outputs"),
            pattern: DEFAULT_FRAME_PATTERN.to_string(),
        }
    }
}

/// Playback and encoder settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    /// Nominal frames per second
    pub fps: u32,
    /// Slowdown factor (>= 1)
    pub slowdown: u32,
    /// Output width; requires `height`
    pub width: Option<u32>,
    /// Output height; requires `width`
    pub height: Option<u32>,
    /// Output file; defaults to `output.mp4` inside the frames directory
    pub output: Option<PathBuf>,
    /// ffmpeg settings
    pub ffmpeg: FfmpegConfig,
}

impl Default for VideoConfig {
    fn default() -> Self {
        let spec = VideoSpec::default();
        Self {
            fps: *spec.fps(),
            slowdown: *spec.slowdown(),
            width: None,
            height: None,
            output: None,
            ffmpeg: FfmpegConfig::default(),
        }
    }
}

impl VideoConfig {
    /// Playback parameters for the assembler.
    pub fn spec(&self) -> VideoSpec {
        VideoSpec::new(self.fps)
            .with_slowdown(self.slowdown)
            .with_optional_size(self.width, self.height)
    }
}

/// Remote model selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    /// Gemini model used for prompt generation
    pub prompt_model: String,
    /// Image model and rendering parameters
    pub image: ImageSettings,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            prompt_model: "gemini-1.5-pro".to_string(),
            image: ImageSettings::default(),
        }
    }
}

/// Complete Flipbook configuration.
///
/// ```toml
/// [retry]
/// max_retries = 3
///
/// [pipeline]
/// inter_call_delay_ms = 500
///
/// [frames]
/// directory = "outputs"
/// pattern = "frame_*.png"
///
/// [video]
/// fps = 24
/// slowdown = 1
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FlipbookConfig {
    /// Backoff for remote calls
    pub retry: RetryConfig,
    /// Prompt pipeline pacing
    pub pipeline: PipelineConfig,
    /// Prompt archive location
    pub archive: ArchiveConfig,
    /// Frame output and discovery
    pub frames: FramesConfig,
    /// Video assembly
    pub video: VideoConfig,
    /// Remote models
    pub models: ModelsConfig,
}

impl FlipbookConfig {
    /// Load configuration from a specific file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> FlipbookResult<Self> {
        debug!("Loading configuration from file");

        Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .map_err(|e| {
                FlipbookError::from(ConfigError::new(format!(
                    "Failed to read configuration from {}: {}",
                    path.as_ref().display(),
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                FlipbookError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })
    }

    /// Load configuration with precedence (later sources override earlier):
    ///
    /// 1. Bundled defaults (`flipbook.toml` shipped with the crate)
    /// 2. `~/.config/flipbook/flipbook.toml`
    /// 3. `./flipbook.toml`
    /// 4. `FLIPBOOK_<SECTION>__<KEY>` environment variables
    ///
    /// User files are optional and silently skipped when absent.
    ///
    /// ```no_run
    /// use flipbook::FlipbookConfig;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let config = FlipbookConfig::load()?;
    /// println!("{} fps", config.video.fps);
    /// # Ok(())
    /// # }
    /// ```
    #[instrument]
    pub fn load() -> FlipbookResult<Self> {
        debug!("Loading configuration with precedence: env > current dir > config dir > bundled defaults");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("flipbook").join("flipbook.toml");
            builder = builder.add_source(File::from(user_config).required(false));
        }

        builder = builder
            .add_source(File::with_name("flipbook").required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let config: Self = builder
            .build()
            .map_err(|e| {
                FlipbookError::from(ConfigError::new(format!(
                    "Failed to build configuration: {}",
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                FlipbookError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Apply command-line overrides and re-validate.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the result is inconsistent, for example
    /// a width without a height.
    pub fn with_overrides(mut self, overrides: &ConfigOverrides) -> Result<Self, ConfigError> {
        let size = resolve_size(overrides.width, overrides.height)?;

        if let Some(steps) = overrides.steps {
            self.models.image.steps = steps;
        }
        if let Some(model) = &overrides.prompt_model {
            self.models.prompt_model = model.clone();
        }
        if let Some(model) = &overrides.image_model {
            self.models.image.model = model.clone();
        }
        if let Some(fps) = overrides.fps {
            self.video.fps = fps;
        }
        if let Some(slowdown) = overrides.slowdown {
            self.video.slowdown = slowdown;
        }
        if let Some((width, height)) = size {
            self.video.width = Some(width);
            self.video.height = Some(height);
        }
        if let Some(output) = &overrides.output {
            self.video.output = Some(output.clone());
        }
        if let Some(pattern) = &overrides.pattern {
            self.frames.pattern = pattern.clone();
        }
        if let Some(directory) = &overrides.frames_dir {
            self.frames.directory = directory.clone();
        }
        if let Some(root) = &overrides.archive_root {
            self.archive.root = root.clone();
        }

        self.validate()?;
        Ok(self)
    }

    /// Check parameter combinations that no stage can recover from.
    ///
    /// # Errors
    ///
    /// Zero fps, slowdown below 1, a lone or zero width/height, zero
    /// diffusion steps, or an unusable frame pattern.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.video.fps == 0 {
            return Err(ConfigError::new("fps must be positive"));
        }
        if self.video.slowdown < 1 {
            return Err(ConfigError::new(format!(
                "slowdown must be at least 1, got {}",
                self.video.slowdown
            )));
        }
        if let Some((width, height)) = resolve_size(self.video.width, self.video.height)? {
            if width == 0 || height == 0 {
                return Err(ConfigError::new(format!(
                    "output size must be non-zero, got {}x{}",
                    width, height
                )));
            }
        }
        if self.models.image.steps == 0 {
            return Err(ConfigError::new("steps must be positive"));
        }
        FramePattern::parse(&self.frames.pattern)
            .map_err(|e| ConfigError::new(e.kind.to_string()))?;
        Ok(())
    }
}

/// Values supplied on the command line, each overriding its config key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    /// Diffusion steps
    pub steps: Option<u32>,
    /// Prompt model identifier
    pub prompt_model: Option<String>,
    /// Image model identifier
    pub image_model: Option<String>,
    /// Frames per second
    pub fps: Option<u32>,
    /// Slowdown factor
    pub slowdown: Option<u32>,
    /// Output width
    pub width: Option<u32>,
    /// Output height
    pub height: Option<u32>,
    /// Output video path
    pub output: Option<PathBuf>,
    /// Frame file pattern
    pub pattern: Option<String>,
    /// Frames directory
    pub frames_dir: Option<PathBuf>,
    /// Archive root
    pub archive_root: Option<PathBuf>,
}

/// Width and height must be given together or not at all.
///
/// # Examples
///
/// ```
/// use flipbook::resolve_size;
///
/// assert_eq!(resolve_size(Some(640), Some(480)).unwrap(), Some((640, 480)));
/// assert_eq!(resolve_size(None, None).unwrap(), None);
/// assert!(resolve_size(Some(640), None).is_err());
/// ```
pub fn resolve_size(width: Option<u32>, height: Option<u32>) -> Result<Option<(u32, u32)>, ConfigError> {
    match (width, height) {
        (Some(w), Some(h)) => Ok(Some((w, h))),
        (None, None) => Ok(None),
        (Some(_), None) => Err(ConfigError::new("--width requires --height")),
        (None, Some(_)) => Err(ConfigError::new("--height requires --width")),
    }
}
