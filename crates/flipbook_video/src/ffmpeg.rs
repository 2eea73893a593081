//! ffmpeg-backed [`VideoEncoder`].

use async_trait::async_trait;
use flipbook_core::EncodeRequest;
use flipbook_error::{AssemblyError, AssemblyErrorKind};
use flipbook_interface::VideoEncoder;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::io::Write;
use std::path::Path;
use tracing::{debug, instrument};

/// Codec settings for [`FfmpegEncoder`].
///
/// The preset is fixed per configuration, never derived from content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FfmpegConfig {
    /// ffmpeg executable name or path
    pub binary: String,
    /// libx264 preset
    pub preset: String,
    /// Encoder thread count
    pub threads: u32,
}

impl Default for FfmpegConfig {
    fn default() -> Self {
        Self {
            binary: "ffmpeg".to_string(),
            preset: "medium".to_string(),
            threads: 4,
        }
    }
}

/// Encodes frames to H.264 in MP4 with no audio track by shelling out to ffmpeg.
///
/// Frames are fed through an `ffconcat` list so their order is exactly the
/// request's order, independent of file names. The video is encoded into a
/// hidden sibling of the output path and renamed over it only on success,
/// so a failed encode leaves any earlier video untouched.
#[derive(Debug, Clone, Default)]
pub struct FfmpegEncoder {
    config: FfmpegConfig,
}

impl FfmpegEncoder {
    /// Encoder with the given settings.
    pub fn new(config: FfmpegConfig) -> Self {
        Self { config }
    }

    /// The encoder settings.
    pub fn config(&self) -> &FfmpegConfig {
        &self.config
    }

    /// Contents of the concat list for `request`.
    ///
    /// The last frame is listed twice so the demuxer honors its duration.
    pub fn concat_list(request: &EncodeRequest) -> String {
        let duration = request.frame_duration_secs();
        let mut list = String::from("ffconcat version 1.0\n");
        for frame in request.frames() {
            list.push_str(&format!("file {}\n", quote(&absolute(frame.path()))));
            list.push_str(&format!("duration {:.6}\n", duration));
        }
        if let Some(last) = request.frames().last() {
            list.push_str(&format!("file {}\n", quote(&absolute(last.path()))));
        }
        list
    }

    /// Command-line arguments for encoding `request` from the list at
    /// `list_path` into `destination`.
    pub fn arguments(
        &self,
        request: &EncodeRequest,
        list_path: &Path,
        destination: &Path,
    ) -> Vec<OsString> {
        let mut args: Vec<OsString> = ["-y", "-f", "concat", "-safe", "0", "-i"]
            .into_iter()
            .map(OsString::from)
            .collect();
        args.push(list_path.as_os_str().to_owned());
        args.push("-r".into());
        args.push(format!("{}", request.effective_fps()).into());
        if let Some(size) = request.resize() {
            args.push("-vf".into());
            args.push(format!("scale={}:{}", size.width, size.height).into());
        }
        args.extend(
            [
                "-c:v",
                "libx264",
                "-preset",
                self.config.preset.as_str(),
                "-threads",
            ]
            .into_iter()
            .map(OsString::from),
        );
        args.push(self.config.threads.to_string().into());
        args.extend(["-pix_fmt", "yuv420p", "-an"].into_iter().map(OsString::from));
        args.push(destination.as_os_str().to_owned());
        args
    }
}

#[async_trait]
impl VideoEncoder for FfmpegEncoder {
    #[instrument(skip_all, fields(frames = request.frames().len(), output = %request.output_path().display()))]
    async fn encode(&self, request: &EncodeRequest) -> Result<(), AssemblyError> {
        let workdir = request
            .output_path()
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let mut list = tempfile::Builder::new()
            .prefix(".flipbook_frames_")
            .suffix(".ffconcat")
            .tempfile_in(workdir)
            .map_err(|e| encoding_failed(format!("failed to create frame list: {}", e)))?;
        list.write_all(Self::concat_list(request).as_bytes())
            .and_then(|_| list.flush())
            .map_err(|e| encoding_failed(format!("failed to write frame list: {}", e)))?;

        let extension = request
            .output_path()
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_else(|| ".mp4".to_string());
        let staged = tempfile::Builder::new()
            .prefix(".flipbook_video_")
            .suffix(&extension)
            .tempfile_in(workdir)
            .map_err(|e| encoding_failed(format!("failed to stage output: {}", e)))?;

        let args = self.arguments(request, list.path(), staged.path());
        debug!(binary = %self.config.binary, ?args, "Running ffmpeg");

        let output = tokio::process::Command::new(&self.config.binary)
            .args(&args)
            .output()
            .await
            .map_err(|e| encoding_failed(format!("failed to launch {}: {}", self.config.binary, e)))?;

        if !output.status.success() {
            return Err(encoding_failed(format!(
                "{} exited with code {:?}: {}",
                self.config.binary,
                output.status.code(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        staged.persist(request.output_path()).map_err(|e| {
            encoding_failed(format!(
                "failed to move video into {}: {}",
                request.output_path().display(),
                e.error
            ))
        })?;
        Ok(())
    }
}

fn encoding_failed(message: String) -> AssemblyError {
    AssemblyError::new(AssemblyErrorKind::EncodingFailed(message))
}

fn absolute(path: &Path) -> String {
    std::path::absolute(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}

/// Single-quote for the concat demuxer; `'` becomes `'\''`.
fn quote(path: &str) -> String {
    format!("'{}'", path.replace('\'', r"'\''"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use flipbook_core::{Dimensions, FrameFile};
    use std::path::PathBuf;

    fn request(resize: Option<Dimensions>) -> EncodeRequest {
        let frames = vec![
            FrameFile::new("/frames/frame_1.png", Dimensions::new(64, 64)),
            FrameFile::new("/frames/frame_2.png", Dimensions::new(64, 64)),
        ];
        EncodeRequest::new(frames, 12.0, resize, "/out/video.mp4")
    }

    fn strings(args: Vec<OsString>) -> Vec<String> {
        args.into_iter().map(|a| a.to_string_lossy().into_owned()).collect()
    }

    #[test]
    fn test_arguments_without_resize() {
        let encoder = FfmpegEncoder::default();
        let args = strings(encoder.arguments(
            &request(None),
            &PathBuf::from("/tmp/list.ffconcat"),
            &PathBuf::from("/out/video.mp4"),
        ));
        assert_eq!(
            args,
            vec![
                "-y", "-f", "concat", "-safe", "0", "-i", "/tmp/list.ffconcat", "-r", "12", "-c:v",
                "libx264", "-preset", "medium", "-threads", "4", "-pix_fmt", "yuv420p", "-an",
                "/out/video.mp4",
            ]
        );
    }

    #[test]
    fn test_arguments_with_resize() {
        let encoder = FfmpegEncoder::default();
        let args = strings(encoder.arguments(
            &request(Some(Dimensions::new(320, 240))),
            &PathBuf::from("list"),
            &PathBuf::from("out.mp4"),
        ));
        let vf = args.iter().position(|a| a == "-vf").unwrap();
        assert_eq!(args[vf + 1], "scale=320:240");
        assert!(args.contains(&"-an".to_string()));
    }

    #[test]
    fn test_concat_list_orders_and_times_frames() {
        let list = FfmpegEncoder::concat_list(&request(None));
        let lines: Vec<&str> = list.lines().collect();
        assert_eq!(
            lines,
            vec![
                "ffconcat version 1.0",
                "file '/frames/frame_1.png'",
                "duration 0.083333",
                "file '/frames/frame_2.png'",
                "duration 0.083333",
                "file '/frames/frame_2.png'",
            ]
        );
    }

    #[test]
    fn test_quote_escapes_single_quotes() {
        assert_eq!(quote("/a/it's.png"), r"'/a/it'\''s.png'");
    }

    #[cfg(unix)]
    fn script(dir: &Path, body: &str) -> String {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join("fake_ffmpeg.sh");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.display().to_string()
    }

    #[cfg(unix)]
    fn encoder_at(dir: &Path, binary: String) -> (FfmpegEncoder, EncodeRequest) {
        let encoder = FfmpegEncoder::new(FfmpegConfig {
            binary,
            ..FfmpegConfig::default()
        });
        let frames = vec![FrameFile::new(dir.join("frame_1.png"), Dimensions::new(8, 8))];
        let request = EncodeRequest::new(frames, 24.0, None, dir.join("video.mp4"));
        (encoder, request)
    }

    #[cfg(unix)]
    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_encode_keeps_previous_video() {
        let dir = tempfile::TempDir::new().unwrap();
        let tools = tempfile::TempDir::new().unwrap();
        let binary = script(
            tools.path(),
            r#"for last; do :; done; printf partial > "$last"; echo boom >&2; exit 1"#,
        );
        std::fs::write(dir.path().join("video.mp4"), "previous").unwrap();
        let (encoder, request) = encoder_at(dir.path(), binary);

        let err = encoder.encode(&request).await.unwrap_err();

        assert!(format!("{}", err).contains("boom"));
        assert_eq!(
            std::fs::read_to_string(dir.path().join("video.mp4")).unwrap(),
            "previous"
        );
        assert_eq!(entries(dir.path()), vec!["video.mp4"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_successful_encode_replaces_output() {
        let dir = tempfile::TempDir::new().unwrap();
        let tools = tempfile::TempDir::new().unwrap();
        let binary = script(tools.path(), r#"for last; do :; done; printf encoded > "$last""#);
        std::fs::write(dir.path().join("video.mp4"), "previous").unwrap();
        let (encoder, request) = encoder_at(dir.path(), binary);

        encoder.encode(&request).await.unwrap();

        assert_eq!(
            std::fs::read_to_string(dir.path().join("video.mp4")).unwrap(),
            "encoded"
        );
        assert_eq!(entries(dir.path()), vec!["video.mp4"]);
    }
}
