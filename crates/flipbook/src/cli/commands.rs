//! CLI command definitions.

use clap::{Args, Parser, Subcommand};
use flipbook::ConfigOverrides;
use std::num::NonZeroUsize;
use std::path::PathBuf;

/// Flipbook - Turn a scene description into an animated video
#[derive(Parser, Debug)]
#[command(name = "flipbook")]
#[command(about = "Turn a scene description into an animated video", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Read configuration from this file instead of the default lookup
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate prompts, render frames and assemble the video
    Generate {
        /// Scene to animate
        scene: String,

        /// Number of frames to generate
        #[arg(long, default_value = "10")]
        frames: NonZeroUsize,

        #[command(flatten)]
        models: ModelArgs,

        #[command(flatten)]
        video: VideoArgs,

        #[command(flatten)]
        paths: PathArgs,
    },

    /// Generate and archive frame prompts only
    Prompts {
        /// Scene to animate
        scene: String,

        /// Number of frames to generate
        #[arg(long, default_value = "10")]
        frames: NonZeroUsize,

        #[command(flatten)]
        models: ModelArgs,

        #[command(flatten)]
        paths: PathArgs,
    },

    /// Render images for an archived run
    Render {
        /// Archive record to render (defaults to the latest)
        #[arg(long)]
        archive: Option<PathBuf>,

        #[command(flatten)]
        models: ModelArgs,

        #[command(flatten)]
        paths: PathArgs,
    },

    /// Assemble the frames in a directory into a video
    Assemble {
        #[command(flatten)]
        video: VideoArgs,

        #[command(flatten)]
        paths: PathArgs,
    },

    /// Print the path of the most recent archive record
    Latest {
        /// Also print the record itself
        #[arg(long)]
        show: bool,

        #[command(flatten)]
        paths: PathArgs,
    },
}

/// Model selection flags
#[derive(Args, Debug, Clone, Default)]
pub struct ModelArgs {
    /// Diffusion steps for image generation (FLUX schnell models accept at most 4)
    #[arg(long)]
    pub steps: Option<u32>,

    /// Image generation model
    #[arg(long)]
    pub model: Option<String>,

    /// Prompt generation model
    #[arg(long)]
    pub prompt_model: Option<String>,
}

/// Playback flags
#[derive(Args, Debug, Clone, Default)]
pub struct VideoArgs {
    /// Frames per second
    #[arg(long)]
    pub fps: Option<u32>,

    /// Show each frame this many times longer
    #[arg(long)]
    pub slowdown: Option<u32>,

    /// Output width (requires --height)
    #[arg(long)]
    pub width: Option<u32>,

    /// Output height (requires --width)
    #[arg(long)]
    pub height: Option<u32>,

    /// Output video path
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Location flags
#[derive(Args, Debug, Clone, Default)]
pub struct PathArgs {
    /// Frames directory
    #[arg(long)]
    pub frames_dir: Option<PathBuf>,

    /// Frame file pattern, e.g. "frame_*.png"
    #[arg(long)]
    pub pattern: Option<String>,

    /// Prompt archive directory
    #[arg(long)]
    pub archive_root: Option<PathBuf>,
}

impl Commands {
    /// Collect every flag that overrides a configuration value.
    pub fn overrides(&self) -> ConfigOverrides {
        let mut overrides = ConfigOverrides::default();
        match self {
            Commands::Generate {
                models,
                video,
                paths,
                ..
            } => {
                models.apply(&mut overrides);
                video.apply(&mut overrides);
                paths.apply(&mut overrides);
            }
            Commands::Prompts { models, paths, .. } | Commands::Render { models, paths, .. } => {
                models.apply(&mut overrides);
                paths.apply(&mut overrides);
            }
            Commands::Assemble { video, paths } => {
                video.apply(&mut overrides);
                paths.apply(&mut overrides);
            }
            Commands::Latest { paths, .. } => paths.apply(&mut overrides),
        }
        overrides
    }
}

impl ModelArgs {
    fn apply(&self, overrides: &mut ConfigOverrides) {
        overrides.steps = self.steps;
        overrides.image_model = self.model.clone();
        overrides.prompt_model = self.prompt_model.clone();
    }
}

impl VideoArgs {
    fn apply(&self, overrides: &mut ConfigOverrides) {
        overrides.fps = self.fps;
        overrides.slowdown = self.slowdown;
        overrides.width = self.width;
        overrides.height = self.height;
        overrides.output = self.output.clone();
    }
}

impl PathArgs {
    fn apply(&self, overrides: &mut ConfigOverrides) {
        overrides.frames_dir = self.frames_dir.clone();
        overrides.pattern = self.pattern.clone();
        overrides.archive_root = self.archive_root.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_defaults_to_ten_frames() {
        let cli = Cli::parse_from(["flipbook", "generate", "a kite over dunes"]);
        match cli.command {
            Commands::Generate { scene, frames, .. } => {
                assert_eq!(scene, "a kite over dunes");
                assert_eq!(frames.get(), 10);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_zero_frames_rejected() {
        assert!(Cli::try_parse_from(["flipbook", "prompts", "x", "--frames", "0"]).is_err());
    }

    #[test]
    fn test_overrides_collect_flags() {
        let cli = Cli::parse_from([
            "flipbook",
            "generate",
            "rain",
            "--fps",
            "12",
            "--slowdown",
            "2",
            "--width",
            "640",
            "--height",
            "480",
            "--steps",
            "3",
            "--frames-dir",
            "frames",
            "-v",
        ]);
        assert!(cli.verbose);
        let overrides = cli.command.overrides();
        assert_eq!(overrides.fps, Some(12));
        assert_eq!(overrides.slowdown, Some(2));
        assert_eq!(overrides.width, Some(640));
        assert_eq!(overrides.height, Some(480));
        assert_eq!(overrides.steps, Some(3));
        assert_eq!(overrides.frames_dir, Some(PathBuf::from("frames")));
    }

    #[test]
    fn test_render_accepts_archive_path() {
        let cli = Cli::parse_from(["flipbook", "render", "--archive", "a.json"]);
        match cli.command {
            Commands::Render { archive, .. } => assert_eq!(archive, Some(PathBuf::from("a.json"))),
            other => panic!("unexpected {other:?}"),
        }
    }
}
