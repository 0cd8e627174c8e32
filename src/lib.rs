//! ASCII Streamer - stream videos as ASCII art over HTTP
//!
//! This crate decodes video files frame-by-frame and renders each frame as a
//! block of ASCII text (true-color or gamma-corrected grayscale), paced to the
//! source frame rate and streamed to terminal clients such as curl.

pub mod catalog;
pub mod decoder;
pub mod mapper;
pub mod resizer;
pub mod server;
pub mod stream;

pub use catalog::VideoCatalog;
pub use decoder::{VideoDecoder, VideoFrame};
pub use mapper::render_frame;
pub use resizer::{resize_frame, target_height};
pub use server::Server;
pub use stream::{AsciiStream, RenderOptions, StreamState};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Package name
pub const PACKAGE_NAME: &str = env!("CARGO_PKG_NAME");

/// Character ramp for color mode, darkest to lightest. 70 glyphs, all ASCII,
/// so byte indexing is safe. Must match clients byte-for-byte.
pub const COLOR_RAMP: &[u8] =
    b"$@B%8&WM#*oahkbdpqwmZO0QLCJUYXzcvunxrjft/\\|()1{}[]?-_+~<>i!lI;:,\"^`'. ";

/// Character ramp for grayscale mode, darkest to lightest.
pub const GRAY_RAMP: &[u8] = b"@%#*+=-:. ";

/// Gamma exponent applied to normalized intensity before grayscale ramp
/// lookup. Color mode never applies gamma.
pub const GRAY_GAMMA: f64 = 0.6;

/// Vertical compression factor compensating for terminal character cells
/// being taller than wide.
pub const CELL_ASPECT: f64 = 0.55;

/// Control sequence prefixed to every emitted frame: clear screen, home cursor.
pub const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// Frame rate assumed when the source reports none (or a non-positive value).
pub const FALLBACK_FPS: f64 = 30.0;

/// Inclusive bounds for the target character width accepted from clients.
pub const MIN_WIDTH: u32 = 10;
pub const MAX_WIDTH: u32 = 300;

/// Error types used throughout the crate
#[derive(thiserror::Error, Debug)]
pub enum StreamError {
    #[error("Cannot open video: {path}: {reason}")]
    SourceUnavailable { path: String, reason: String },

    #[error("Video decoding error: {0}")]
    Decode(#[from] ffmpeg_next::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for this crate
pub type Result<T> = std::result::Result<T, StreamError>;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        catalog::VideoCatalog,
        decoder::{VideoDecoder, VideoFrame},
        mapper::render_frame,
        resizer::{resize_frame, target_height},
        server::Server,
        stream::{AsciiStream, RenderOptions, StreamState},
        StreamError, CELL_ASPECT, CLEAR_SCREEN, COLOR_RAMP, FALLBACK_FPS, GRAY_GAMMA, GRAY_RAMP,
        MAX_WIDTH, MIN_WIDTH,
    };
}
