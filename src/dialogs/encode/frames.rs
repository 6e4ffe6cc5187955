//! PNG sequence writer: the export target for directories and `.png` paths.

use std::path::PathBuf;

use image::RgbaImage;
use log::{debug, info};

use crate::core::capture::{CaptureConfig, CaptureError};

/// Writes `frame_00000.png`, `frame_00001.png`, ... into one directory
pub struct FrameSequence {
    dir: PathBuf,
    next: u32,
}

impl FrameSequence {
    /// `config.output` is the target directory; a `.png` path uses its stem
    /// as the directory name next to it
    pub fn start(config: &CaptureConfig) -> Result<Self, CaptureError> {
        let dir = match config.output.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("png") => config.output.with_extension(""),
            _ => config.output.clone(),
        };
        std::fs::create_dir_all(&dir)
            .map_err(|e| CaptureError::StartFailed(format!("{}: {}", dir.display(), e)))?;
        info!("Writing PNG sequence to {}", dir.display());
        Ok(Self { dir, next: 0 })
    }

    pub fn frame_path(&self, index: u32) -> PathBuf {
        self.dir.join(format!("frame_{:05}.png", index))
    }

    pub fn push(&mut self, frame: &RgbaImage) -> Result<(), CaptureError> {
        let path = self.frame_path(self.next);
        frame
            .save(&path)
            .map_err(|e| CaptureError::FrameFailed(format!("{}: {}", path.display(), e)))?;
        debug!("Wrote {}", path.display());
        self.next += 1;
        Ok(())
    }

    pub fn finish(self) -> PathBuf {
        info!("PNG sequence complete: {} frames in {}", self.next, self.dir.display());
        self.dir
    }
}
