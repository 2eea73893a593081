use flipbook::{ConfigOverrides, FlipbookConfig, FlipbookErrorKind, Stage};
use std::path::PathBuf;
use strum::IntoEnumIterator;
use tempfile::TempDir;

#[test]
fn test_bundled_defaults_match_code_defaults() {
    let bundled = concat!(env!("CARGO_MANIFEST_DIR"), "/../../flipbook.toml");
    let config = FlipbookConfig::from_file(bundled).unwrap();
    assert_eq!(config, FlipbookConfig::default());
    assert!(config.validate().is_ok());
}

#[test]
fn test_partial_file_keeps_other_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("flipbook.toml");
    std::fs::write(
        &path,
        r#"
[retry]
max_retries = 7

[video]
fps = 30
width = 640
height = 360
"#,
    )
    .unwrap();

    let config = FlipbookConfig::from_file(&path).unwrap();

    assert_eq!(config.retry.max_retries, 7);
    assert_eq!(config.retry.base_delay_ms, 1000);
    assert_eq!(config.video.fps, 30);
    assert_eq!(config.video.spec().target_size().map(|d| d.width), Some(640));
    assert_eq!(config.frames.pattern, "frame_*.png");
    assert_eq!(config.pipeline.inter_call_delay_ms, 500);
}

#[test]
fn test_unreadable_file_is_a_config_error() {
    let dir = TempDir::new().unwrap();
    let err = FlipbookConfig::from_file(dir.path().join("missing.toml")).unwrap_err();
    assert!(matches!(err.kind(), FlipbookErrorKind::Config(_)));
}

#[test]
fn test_overrides_replace_config_values() {
    let overrides = ConfigOverrides {
        steps: Some(2),
        image_model: Some("flux-dev".into()),
        fps: Some(12),
        slowdown: Some(3),
        width: Some(320),
        height: Some(240),
        output: Some(PathBuf::from("out/movie.mp4")),
        frames_dir: Some(PathBuf::from("frames")),
        ..ConfigOverrides::default()
    };

    let config = FlipbookConfig::default().with_overrides(&overrides).unwrap();

    assert_eq!(config.models.image.steps, 2);
    assert_eq!(config.models.image.model, "flux-dev");
    let spec = config.video.spec();
    assert_eq!(spec.effective_fps(), Some(4.0));
    assert_eq!(spec.target_size().map(|d| (d.width, d.height)), Some((320, 240)));
    assert_eq!(config.video.output, Some(PathBuf::from("out/movie.mp4")));
    assert_eq!(config.frames.directory, PathBuf::from("frames"));
    assert_eq!(config.archive.root, PathBuf::from("archive"));
}

#[test]
fn test_width_without_height_is_rejected() {
    let overrides = ConfigOverrides {
        width: Some(640),
        ..ConfigOverrides::default()
    };
    let err = FlipbookConfig::default().with_overrides(&overrides).unwrap_err();
    assert!(err.message.contains("--height"));
}

#[test]
fn test_slowdown_below_one_is_rejected() {
    let overrides = ConfigOverrides {
        slowdown: Some(0),
        ..ConfigOverrides::default()
    };
    assert!(FlipbookConfig::default().with_overrides(&overrides).is_err());
}

#[test]
fn test_zero_sized_output_is_rejected() {
    let mut config = FlipbookConfig::default();
    config.video.width = Some(0);
    config.video.height = Some(480);
    assert!(config.validate().is_err());
}

#[test]
fn test_pattern_with_directory_is_rejected() {
    let overrides = ConfigOverrides {
        pattern: Some("frames/*.png".into()),
        ..ConfigOverrides::default()
    };
    let err = FlipbookConfig::default().with_overrides(&overrides).unwrap_err();
    assert!(err.message.contains("frames/*.png"));
}

#[test]
fn test_stages_are_named_in_order() {
    let names: Vec<String> = Stage::iter().map(|s| s.to_string()).collect();
    assert_eq!(
        names,
        vec!["prompts", "archive", "rendering", "catalog", "assembly"]
    );
}
