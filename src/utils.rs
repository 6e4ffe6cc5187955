//! Utility functions and constants
//!
//! **Used by**: loader, app (file dialogs, drag-and-drop)

/// Media file type detection
pub mod media {
    use std::path::Path;

    /// Image extensions accepted by the carousel
    pub const IMAGE_EXTS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "bmp", "tif", "tiff", "tga"];

    /// Extensions the video export understands
    pub const VIDEO_EXTS: &[&str] = &["mp4", "mov", "mkv"];

    fn has_ext(path: &Path, exts: &[&str]) -> bool {
        path.extension()
            .and_then(|s| s.to_str())
            .map(|s| exts.contains(&s.to_lowercase().as_str()))
            .unwrap_or(false)
    }

    /// Check if file is an image format
    pub fn is_image(path: &Path) -> bool {
        has_ext(path, IMAGE_EXTS)
    }

    /// Check if file is a video container
    pub fn is_video(path: &Path) -> bool {
        has_ext(path, VIDEO_EXTS)
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_extensions() {
            assert!(is_image(Path::new("a/B.PNG")));
            assert!(is_image(Path::new("photo.jpeg")));
            assert!(!is_image(Path::new("notes.txt")));
            assert!(!is_image(Path::new("no_ext")));
            assert!(is_video(Path::new("out.mp4")));
            assert!(!is_video(Path::new("frames")));
        }
    }
}
