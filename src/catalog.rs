use log::{info, warn};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Static name → file path catalog of streamable videos.
///
/// Loaded once at startup from a JSON object like
/// `{"bad_apple": "/videos/bad_apple.mp4"}`. A missing or malformed file
/// degrades to an empty catalog with a logged warning; the server still runs
/// and serves an empty listing.
#[derive(Debug, Clone, Default)]
pub struct VideoCatalog {
    videos: HashMap<String, PathBuf>,
}

impl VideoCatalog {
    /// Load the catalog from a JSON file.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            warn!(
                "Catalog file {} not found, no videos available",
                path.display()
            );
            return Self::default();
        }

        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!("Failed to read catalog {}: {}", path.display(), e);
                return Self::default();
            }
        };

        match serde_json::from_str::<HashMap<String, PathBuf>>(&contents) {
            Ok(videos) => {
                info!("Loaded {} videos from {}", videos.len(), path.display());
                Self { videos }
            }
            Err(e) => {
                warn!("Catalog {} is not valid JSON: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Look up a video path by name
    pub fn get(&self, name: &str) -> Option<&Path> {
        self.videos.get(name).map(PathBuf::as_path)
    }

    /// Video names, sorted for stable listing output
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.videos.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.videos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.videos.is_empty()
    }
}
