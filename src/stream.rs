use crate::decoder::VideoDecoder;
use crate::{mapper, resizer, Result, CLEAR_SCREEN, FALLBACK_FPS, MAX_WIDTH, MIN_WIDTH};
use log::{debug, info, warn};
use std::path::Path;
use std::time::Duration;
use tokio::time::{sleep_until, Instant};

/// Rendering options attached to one stream request.
///
/// Width is validated and clamped to `[MIN_WIDTH, MAX_WIDTH]` by the caller
/// before construction; the core only asserts it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Target width in characters
    pub width: u32,
    /// True-color output; false selects the gamma-corrected grayscale ramp
    pub color: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: 100,
            color: true,
        }
    }
}

/// Lifecycle of one stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// Opened, no frame produced yet
    Ready,
    /// At least one frame produced
    Streaming,
    /// End of source reached (or a mid-stream fault); absorbing state
    Exhausted,
}

/// A lazy, paced sequence of ASCII text frames decoded from one video file.
///
/// Each pull decodes exactly one frame, resizes it, renders it and returns it
/// prefixed with a screen-clear sequence. Pacing to the source frame rate is
/// enforced between pulls, never before the first frame. The stream is finite
/// and not restartable; dropping it releases the decoder.
pub struct AsciiStream {
    decoder: VideoDecoder,
    options: RenderOptions,
    interval: Duration,
    deadline: Option<Instant>,
    state: StreamState,
    frames_emitted: u64,
}

/// Inter-frame delay for a reported frame rate, falling back to
/// [`FALLBACK_FPS`] when the source reports zero or a negative rate.
pub fn frame_interval(fps: f64) -> Duration {
    let fps = if fps > 0.0 { fps } else { FALLBACK_FPS };
    Duration::from_secs_f64(1.0 / fps)
}

impl AsciiStream {
    /// Open a video source for streaming.
    ///
    /// Fails with [`crate::StreamError::SourceUnavailable`] before any frame
    /// is produced if the source cannot be opened.
    pub fn open(path: &Path, options: RenderOptions) -> Result<Self> {
        debug_assert!(
            (MIN_WIDTH..=MAX_WIDTH).contains(&options.width),
            "width {} outside [{}, {}], caller must clamp",
            options.width,
            MIN_WIDTH,
            MAX_WIDTH
        );

        let decoder = VideoDecoder::open(path)?;
        let interval = frame_interval(decoder.fps());

        info!(
            "Stream opened: {} (width={}, color={}, interval={:?})",
            path.display(),
            options.width,
            options.color,
            interval
        );

        Ok(Self {
            decoder,
            options,
            interval,
            deadline: None,
            state: StreamState::Ready,
            frames_emitted: 0,
        })
    }

    /// Current lifecycle state
    pub fn state(&self) -> StreamState {
        self.state
    }

    /// Inter-frame delay this stream paces to
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Number of text frames produced so far
    pub fn frames_emitted(&self) -> u64 {
        self.frames_emitted
    }

    /// Produce the next text frame, or `None` once the source is exhausted.
    ///
    /// Awaits the pacing deadline left by the previous frame first, so a call
    /// arriving late (slow consumer) proceeds immediately. The await only
    /// suspends this task; sibling streams keep running.
    pub async fn next_chunk(&mut self) -> Option<String> {
        if self.state == StreamState::Exhausted {
            return None;
        }

        if let Some(deadline) = self.deadline {
            sleep_until(deadline).await;
        }

        let frame = match self.decoder.next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                info!("Stream exhausted after {} frames", self.frames_emitted);
                self.state = StreamState::Exhausted;
                return None;
            }
            Err(e) => {
                // Output may already be in flight; terminate instead of
                // surfacing a fault the consumer cannot act on.
                warn!(
                    "Decode fault after {} frames, ending stream: {}",
                    self.frames_emitted, e
                );
                self.state = StreamState::Exhausted;
                return None;
            }
        };

        let resized = resizer::resize_frame(&frame, self.options.width);
        let text = mapper::render_frame(&resized, self.options.color);

        let mut chunk = String::with_capacity(CLEAR_SCREEN.len() + text.len());
        chunk.push_str(CLEAR_SCREEN);
        chunk.push_str(&text);

        self.state = StreamState::Streaming;
        self.frames_emitted += 1;
        self.deadline = Some(Instant::now() + self.interval);

        Some(chunk)
    }
}

impl Drop for AsciiStream {
    fn drop(&mut self) {
        // The decoder (and its ffmpeg contexts) is released with us; just
        // record how the stream ended.
        if self.state == StreamState::Exhausted {
            debug!("Stream closed after {} frames", self.frames_emitted);
        } else {
            debug!(
                "Stream abandoned by consumer after {} frames",
                self.frames_emitted
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StreamError;
    use std::path::PathBuf;

    #[test]
    fn test_frame_interval_from_fps() {
        assert_eq!(frame_interval(10.0), Duration::from_millis(100));
        assert_eq!(frame_interval(25.0), Duration::from_millis(40));
    }

    #[test]
    fn test_frame_interval_fallback() {
        // 0 fps and negative fps both fall back to 30 fps pacing.
        let expected = Duration::from_secs_f64(1.0 / 30.0);
        assert_eq!(frame_interval(0.0), expected);
        assert_eq!(frame_interval(-5.0), expected);
    }

    #[test]
    fn test_default_options() {
        let options = RenderOptions::default();
        assert_eq!(options.width, 100);
        assert!(options.color);
    }

    #[tokio::test]
    async fn test_open_nonexistent_fails_before_streaming() {
        let result = AsciiStream::open(
            &PathBuf::from("no_such_video.mp4"),
            RenderOptions::default(),
        );
        assert!(matches!(
            result,
            Err(StreamError::SourceUnavailable { .. })
        ));
    }
}
