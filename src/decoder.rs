use crate::{Result, StreamError, FALLBACK_FPS};
use ffmpeg_next as ffmpeg;
use log::{debug, info};
use std::path::Path;

/// Video decoder that extracts RGB frames from a video file, one per call.
///
/// Each decoder owns its input context and decode cursor exclusively; there is
/// no sharing between concurrent streams.
pub struct VideoDecoder {
    input_context: ffmpeg::format::context::Input,
    stream_index: usize,
    decoder: ffmpeg::codec::decoder::Video,
    scaler: Option<ffmpeg::software::scaling::Context>,
    sent_eof: bool,
    frame_count: u64,
    fps: f64,
}

// The scaler's raw SwsContext pointer keeps the compiler from deriving Send,
// but every ffmpeg context here is exclusively owned and only ever used from
// one task at a time, so moving the decoder across threads is sound (ffmpeg-next
// itself marks Input, codec contexts and frames as Send for the same reason).
unsafe impl Send for VideoDecoder {}

/// A decoded video frame as tightly-packed RGB24 data
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// Raw RGB data, `width * height * 3` bytes, no stride padding
    pub data: Vec<u8>,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Frame number within the source, starting at 1
    pub frame_number: u64,
}

impl VideoDecoder {
    /// Open a video file for decoding.
    ///
    /// Any failure here (missing file, no video stream, unsupported codec)
    /// surfaces as [`StreamError::SourceUnavailable`] so callers can report
    /// it before producing any output.
    pub fn open(path: &Path) -> Result<Self> {
        if let Err(e) = ffmpeg::init() {
            // Repeated init calls are harmless; a real failure shows up again
            // when opening the input.
            debug!("FFmpeg init error: {:?}", e);
        }

        let unavailable = |reason: String| StreamError::SourceUnavailable {
            path: path.display().to_string(),
            reason,
        };

        debug!("Opening video file: {}", path.display());
        let input_context =
            ffmpeg::format::input(&path).map_err(|e| unavailable(e.to_string()))?;

        let stream = input_context
            .streams()
            .best(ffmpeg::media::Type::Video)
            .ok_or_else(|| unavailable("no video stream found".to_string()))?;
        let stream_index = stream.index();

        let context_decoder =
            ffmpeg::codec::context::Context::from_parameters(stream.parameters())
                .map_err(|e| unavailable(format!("failed to create codec context: {}", e)))?;
        let decoder = context_decoder
            .decoder()
            .video()
            .map_err(|e| unavailable(format!("failed to create video decoder: {}", e)))?;

        let rate = stream.avg_frame_rate();
        let fps = if rate.denominator() != 0 {
            rate.numerator() as f64 / rate.denominator() as f64
        } else {
            0.0
        };
        let fps = if fps > 0.0 { fps } else { FALLBACK_FPS };

        info!(
            "Opened '{}': stream {}, {}x{}, {:.2} FPS",
            path.display(),
            stream_index,
            decoder.width(),
            decoder.height(),
            fps
        );

        Ok(Self {
            input_context,
            stream_index,
            decoder,
            scaler: None,
            sent_eof: false,
            frame_count: 0,
            fps,
        })
    }

    /// Source frame rate (already adjusted to the fallback if unreported)
    pub fn fps(&self) -> f64 {
        self.fps
    }

    /// Source dimensions in pixels
    pub fn dimensions(&self) -> (u32, u32) {
        (self.decoder.width(), self.decoder.height())
    }

    /// Number of frames decoded so far
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Decode the next frame. Returns `Ok(None)` on natural end of stream.
    pub fn next_frame(&mut self) -> Result<Option<VideoFrame>> {
        let mut decoded = ffmpeg::frame::Video::empty();

        if !self.sent_eof {
            for (stream, packet) in self.input_context.packets() {
                if stream.index() != self.stream_index {
                    continue;
                }
                self.decoder.send_packet(&packet)?;

                match self.decoder.receive_frame(&mut decoded) {
                    Ok(()) => {
                        self.frame_count += 1;
                        return self.convert_frame(&decoded).map(Some);
                    }
                    Err(ffmpeg::Error::Other { errno }) if errno == ffmpeg::ffi::EAGAIN => {
                        // Decoder needs more input
                        continue;
                    }
                    Err(e) => return Err(e.into()),
                }
            }

            // Demuxer exhausted; flush delayed frames out of the decoder.
            self.decoder.send_eof()?;
            self.sent_eof = true;
        }

        match self.decoder.receive_frame(&mut decoded) {
            Ok(()) => {
                self.frame_count += 1;
                self.convert_frame(&decoded).map(Some)
            }
            Err(ffmpeg::Error::Eof) => Ok(None),
            Err(ffmpeg::Error::Other { errno }) if errno == ffmpeg::ffi::EAGAIN => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Convert a decoded frame to tightly-packed RGB24
    fn convert_frame(&mut self, frame: &ffmpeg::frame::Video) -> Result<VideoFrame> {
        let width = frame.width();
        let height = frame.height();

        if self.scaler.is_none() {
            self.scaler = Some(ffmpeg::software::scaling::Context::get(
                frame.format(),
                width,
                height,
                ffmpeg::format::Pixel::RGB24,
                width,
                height,
                ffmpeg::software::scaling::Flags::BILINEAR,
            )?);
        }

        let mut rgb_frame = ffmpeg::frame::Video::empty();
        if let Some(ref mut scaler) = self.scaler {
            scaler.run(frame, &mut rgb_frame)?;
        }

        // swscale output rows may carry stride padding; copy them out tight.
        let stride = rgb_frame.stride(0);
        let row_len = width as usize * 3;
        let raw = rgb_frame.data(0);
        let mut data = Vec::with_capacity(row_len * height as usize);
        for row in 0..height as usize {
            let start = row * stride;
            data.extend_from_slice(&raw[start..start + row_len]);
        }

        debug!(
            "Decoded frame {}: {}x{} ({} bytes)",
            self.frame_count,
            width,
            height,
            data.len()
        );

        Ok(VideoFrame {
            data,
            width,
            height,
            frame_number: self.frame_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_open_nonexistent_file() {
        let result = VideoDecoder::open(&PathBuf::from("nonexistent.mp4"));
        match result {
            Err(StreamError::SourceUnavailable { path, .. }) => {
                assert!(path.contains("nonexistent.mp4"));
            }
            other => panic!("Expected SourceUnavailable, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_open_non_video_file() {
        // A file that exists but is not a decodable container must still be
        // reported as unavailable at open time, not mid-stream.
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("not_a_video.mp4");
        std::fs::write(&path, b"this is not a video").unwrap();

        let result = VideoDecoder::open(&path);
        assert!(matches!(
            result,
            Err(StreamError::SourceUnavailable { .. })
        ));
    }
}
