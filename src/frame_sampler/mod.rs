//! FrameSampler - Frame Extraction from Video Clips via ffmpeg
//!
//! ## Responsibilities
//!
//! - Decode requested 1-indexed frames from a bounded-duration clip
//! - Skip frames that fail to decode (callers must handle fewer images)
//! - Fail with `ClipUnreadable` only when the source cannot be opened

use crate::error::{Error, Result};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Fixed sampling policy for 12-second clips: frames 3, 4, 5.
pub const DEFAULT_TARGET_FRAMES: [u32; 3] = [3, 4, 5];

/// Per-frame ffmpeg timeout in seconds.
const FRAME_TIMEOUT_SECS: u64 = 10;

/// FrameSampler instance
pub struct FrameSampler {
    /// ffmpeg timeout per extracted frame in seconds
    frame_timeout_secs: u64,
}

impl FrameSampler {
    /// Create new FrameSampler with the default per-frame timeout
    pub fn new() -> Self {
        Self {
            frame_timeout_secs: FRAME_TIMEOUT_SECS,
        }
    }

    /// Decode the requested 1-indexed frames as JPEG bytes, in order.
    ///
    /// Frames that fail to decode are skipped, so the output may be shorter
    /// than `frame_numbers`. Returns `ClipUnreadable` when the clip itself
    /// cannot be opened.
    pub async fn sample(&self, clip: &Path, frame_numbers: &[u32]) -> Result<Vec<Vec<u8>>> {
        if !clip.is_file() {
            return Err(Error::ClipUnreadable(format!(
                "clip not found: {}",
                clip.display()
            )));
        }

        self.probe(clip).await?;

        let mut frames = Vec::with_capacity(frame_numbers.len());

        for &frame_number in frame_numbers {
            if frame_number == 0 {
                tracing::warn!(frame_number, "Frame numbers are 1-indexed, skipping 0");
                continue;
            }

            match self.extract_frame(clip, frame_number).await {
                Ok(data) => {
                    tracing::debug!(
                        clip = %clip.display(),
                        frame_number,
                        size = data.len(),
                        "Extracted frame"
                    );
                    frames.push(data);
                }
                Err(e) => {
                    tracing::warn!(
                        clip = %clip.display(),
                        frame_number,
                        error = %e,
                        "Failed to extract frame, skipping"
                    );
                }
            }
        }

        Ok(frames)
    }

    /// Verify the clip has a decodable video stream
    async fn probe(&self, clip: &Path) -> Result<()> {
        let output = Command::new("ffprobe")
            .args([
                "-v",
                "error",
                "-select_streams",
                "v:0",
                "-show_entries",
                "stream=index",
                "-of",
                "csv=p=0",
            ])
            .arg(clip)
            .output()
            .await
            .map_err(|e| Error::Internal(format!("ffprobe spawn failed: {}", e)))?;

        if !output.status.success() || output.stdout.is_empty() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::ClipUnreadable(format!(
                "cannot open {}: {}",
                clip.display(),
                stderr.trim()
            )));
        }

        Ok(())
    }

    /// Extract a single frame as MJPEG bytes.
    ///
    /// Uses kill_on_drop so a timeout cancels the ffmpeg process instead of
    /// leaving it behind when a clip stalls the decoder.
    async fn extract_frame(&self, clip: &Path, frame_number: u32) -> Result<Vec<u8>> {
        // 1-indexed frame number -> 0-indexed select position
        let select = format!("select=eq(n\\,{})", frame_number - 1);

        let child = Command::new("ffmpeg")
            .arg("-i")
            .arg(clip)
            .args([
                "-vf",
                select.as_str(),
                "-frames:v",
                "1",
                "-f",
                "image2pipe",
                "-vcodec",
                "mjpeg",
                "-loglevel",
                "error",
                "-y",
                "-",
            ])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::Internal(format!("ffmpeg spawn failed: {}", e)))?;

        let timeout = Duration::from_secs(self.frame_timeout_secs);

        match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => {
                if !output.status.success() {
                    let stderr = String::from_utf8_lossy(&output.stderr);
                    return Err(Error::Internal(format!("ffmpeg failed: {}", stderr.trim())));
                }

                if output.stdout.is_empty() {
                    return Err(Error::Internal(format!(
                        "no data decoded for frame {}",
                        frame_number
                    )));
                }

                Ok(output.stdout)
            }
            Ok(Err(e)) => Err(Error::Internal(format!("ffmpeg execution failed: {}", e))),
            Err(_) => {
                tracing::warn!(
                    timeout_sec = self.frame_timeout_secs,
                    frame_number,
                    "ffmpeg timeout, process killed via kill_on_drop"
                );
                Err(Error::Internal(format!(
                    "ffmpeg timeout ({}s)",
                    self.frame_timeout_secs
                )))
            }
        }
    }
}

impl Default for FrameSampler {
    fn default() -> Self {
        Self::new()
    }
}
