//! Video encoding module
//!
//! Encodes captured RGBA frames to H.264 through FFmpeg, one frame at a
//! time as the capture driver hands them over. Falls back from libx264 to
//! any H.264 encoder, then MPEG-4 Part 2.

use log::{debug, info};
use std::path::{Path, PathBuf};

use crate::core::capture::{CaptureConfig, CaptureError};
use image::RgbaImage;
use playa_ffmpeg as ffmpeg;

/// Encoding errors
#[derive(Debug)]
pub enum EncodeError {
    EncoderNotFound,
    OutputCreateFailed(String),
    EncodeFrameFailed(String),
    FinalizeFailed(String),
}

impl std::fmt::Display for EncodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EncodeError::EncoderNotFound => write!(f, "No H.264 or MPEG-4 encoder available"),
            EncodeError::OutputCreateFailed(msg) => write!(f, "Failed to create output file: {}", msg),
            EncodeError::EncodeFrameFailed(msg) => write!(f, "Frame encoding failed: {}", msg),
            EncodeError::FinalizeFailed(msg) => write!(f, "Failed to finish video: {}", msg),
        }
    }
}

impl std::error::Error for EncodeError {}

impl From<EncodeError> for CaptureError {
    fn from(e: EncodeError) -> Self {
        match e {
            EncodeError::EncoderNotFound | EncodeError::OutputCreateFailed(_) => CaptureError::StartFailed(e.to_string()),
            EncodeError::EncodeFrameFailed(_) => CaptureError::FrameFailed(e.to_string()),
            EncodeError::FinalizeFailed(_) => CaptureError::FinalizeFailed(e.to_string()),
        }
    }
}

/// Initialize FFmpeg (suppress its own logging). Blocking; run off the UI thread.
pub fn init_ffmpeg() -> Result<(), String> {
    ffmpeg::init().map_err(|e| e.to_string())?;
    unsafe {
        ffmpeg::ffi::av_log_set_level(ffmpeg::ffi::AV_LOG_QUIET);
    }
    Ok(())
}

/// YUV 4:2:0 needs even dimensions
fn even(v: u32) -> u32 {
    (v & !1).max(2)
}

/// One open video file
pub struct VideoEncoder {
    octx: ffmpeg::format::context::Output,
    encoder: ffmpeg::encoder::video::Encoder,
    scaler: ffmpeg::software::scaling::Context,
    encoder_tb: ffmpeg::util::rational::Rational,
    stream_tb: ffmpeg::util::rational::Rational,
    src_width: u32,
    src_height: u32,
    pts: i64,
    output: PathBuf,
}

impl VideoEncoder {
    /// Create the container, open the encoder and write the header
    pub fn start(config: &CaptureConfig) -> Result<Self, EncodeError> {
        let width = even(config.width);
        let height = even(config.height);
        let fps = config.fps.max(1) as i32;

        if let Some(parent) = config.output.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| EncodeError::OutputCreateFailed(e.to_string()))?;
        }

        let mut octx =
            ffmpeg::format::output(&config.output).map_err(|e| EncodeError::OutputCreateFailed(e.to_string()))?;

        // libx264, then any H.264 encoder, then MPEG-4 Part 2
        let (codec, encoder_name) = ffmpeg::encoder::find_by_name("libx264")
            .map(|c| (c, "libx264"))
            .or_else(|| ffmpeg::encoder::find(ffmpeg::codec::Id::H264).map(|c| (c, "h264")))
            .or_else(|| ffmpeg::encoder::find(ffmpeg::codec::Id::MPEG4).map(|c| (c, "mpeg4")))
            .ok_or(EncodeError::EncoderNotFound)?;
        info!("Using encoder '{}' for {}", encoder_name, config.output.display());

        let mut encoder = ffmpeg::codec::context::Context::new_with_codec(codec)
            .encoder()
            .video()
            .map_err(|e| EncodeError::OutputCreateFailed(format!("Failed to create encoder: {}", e)))?;

        encoder.set_width(width);
        encoder.set_height(height);
        encoder.set_format(ffmpeg::format::Pixel::YUV420P);
        encoder.set_frame_rate(Some(ffmpeg::util::rational::Rational::new(fps, 1)));
        encoder.set_time_base(ffmpeg::util::rational::Rational::new(1, fps));
        // Keyframe every second
        encoder.set_gop(fps as u32);

        let mut opts = ffmpeg::Dictionary::new();
        if encoder_name == "libx264" {
            opts.set("crf", "18");
            opts.set("preset", "medium");
        }

        let encoder = encoder.open_with(opts).map_err(|e| {
            EncodeError::OutputCreateFailed(format!("Failed to open encoder '{}': {}", encoder_name, e))
        })?;

        let mut ost = octx
            .add_stream(codec)
            .map_err(|e| EncodeError::OutputCreateFailed(format!("Failed to add stream: {}", e)))?;
        ost.set_parameters(&encoder);
        ost.set_time_base(encoder.time_base());

        let mut container_opts = ffmpeg::Dictionary::new();
        if is_mp4(&config.output) {
            container_opts.set("movflags", "faststart");
        }
        octx.write_header_with(container_opts)
            .map_err(|e| EncodeError::OutputCreateFailed(format!("Failed to write header: {}", e)))?;

        // Stream time base is only final after the header is written
        let stream_tb = octx
            .stream(0)
            .map(|s| s.time_base())
            .ok_or_else(|| EncodeError::OutputCreateFailed("Output has no video stream".into()))?;
        let encoder_tb = encoder.time_base();

        let scaler = ffmpeg::software::scaling::Context::get(
            ffmpeg::format::Pixel::RGBA,
            config.width,
            config.height,
            ffmpeg::format::Pixel::YUV420P,
            width,
            height,
            ffmpeg::software::scaling::Flags::BILINEAR,
        )
        .map_err(|e| EncodeError::OutputCreateFailed(format!("Failed to create swscale context: {}", e)))?;

        info!(
            "Encoder initialized: {}x{} @ {} fps, time_base: encoder={:?} stream={:?}",
            width, height, fps, encoder_tb, stream_tb
        );

        Ok(Self {
            octx,
            encoder,
            scaler,
            encoder_tb,
            stream_tb,
            src_width: config.width,
            src_height: config.height,
            pts: 0,
            output: config.output.clone(),
        })
    }

    pub fn frames_written(&self) -> i64 {
        self.pts
    }

    /// Convert and encode one RGBA frame
    pub fn push(&mut self, frame: &RgbaImage) -> Result<(), EncodeError> {
        if frame.width() != self.src_width || frame.height() != self.src_height {
            return Err(EncodeError::EncodeFrameFailed(format!(
                "Frame {} is {}x{}, session is {}x{}",
                self.pts,
                frame.width(),
                frame.height(),
                self.src_width,
                self.src_height
            )));
        }

        let mut src = ffmpeg::util::frame::video::Video::new(ffmpeg::format::Pixel::RGBA, self.src_width, self.src_height);
        let dst_stride = src.stride(0);
        let row_bytes = (self.src_width * 4) as usize;
        {
            let data = src.data_mut(0);
            for (y, row) in frame.as_raw().chunks_exact(row_bytes).enumerate() {
                let offset = y * dst_stride;
                data[offset..offset + row_bytes].copy_from_slice(row);
            }
        }

        let mut yuv = ffmpeg::util::frame::video::Video::empty();
        self.scaler
            .run(&src, &mut yuv)
            .map_err(|e| EncodeError::EncodeFrameFailed(format!("swscale conversion failed: {}", e)))?;

        yuv.set_pts(Some(self.pts));
        self.pts += 1;

        self.encoder
            .send_frame(&yuv)
            .map_err(|e| EncodeError::EncodeFrameFailed(format!("Failed to send frame {}: {}", self.pts - 1, e)))?;
        self.drain_packets()
            .map_err(EncodeError::EncodeFrameFailed)
    }

    fn drain_packets(&mut self) -> Result<(), String> {
        let mut encoded = ffmpeg::Packet::empty();
        while self.encoder.receive_packet(&mut encoded).is_ok() {
            // Encoder time base -> stream time base, required for a valid MP4 timeline
            encoded.rescale_ts(self.encoder_tb, self.stream_tb);
            encoded.set_stream(0);
            if encoded.dts().is_none() {
                encoded.set_dts(encoded.pts());
            }
            encoded
                .write_interleaved(&mut self.octx)
                .map_err(|e| format!("Failed to write packet: {}", e))?;
        }
        Ok(())
    }

    /// Flush the encoder and write the trailer
    pub fn finish(mut self) -> Result<PathBuf, EncodeError> {
        debug!("Flushing encoder after {} frames", self.pts);
        self.encoder
            .send_eof()
            .map_err(|e| EncodeError::FinalizeFailed(format!("Failed to flush encoder: {}", e)))?;
        self.drain_packets().map_err(EncodeError::FinalizeFailed)?;

        // Without the trailer there is no moov atom and the file won't play
        self.octx
            .write_trailer()
            .map_err(|e| EncodeError::FinalizeFailed(format!("Failed to write trailer: {}", e)))?;

        info!("Encoding complete: {} frames written to {}", self.pts, self.output.display());
        Ok(self.output)
    }
}

fn is_mp4(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("mp4") || e.eq_ignore_ascii_case("mov"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_even_dimensions() {
        assert_eq!(even(1920), 1920);
        assert_eq!(even(1081), 1080);
        assert_eq!(even(1), 2);
    }

    #[test]
    fn test_error_mapping() {
        let e: CaptureError = EncodeError::EncoderNotFound.into();
        assert!(matches!(e, CaptureError::StartFailed(_)));
        let e: CaptureError = EncodeError::EncodeFrameFailed("x".into()).into();
        assert!(matches!(e, CaptureError::FrameFailed(_)));
        let e: CaptureError = EncodeError::FinalizeFailed("x".into()).into();
        assert!(matches!(e, CaptureError::FinalizeFailed(_)));
    }

    #[test]
    fn test_mp4_detection() {
        assert!(is_mp4(Path::new("a/out.MP4")));
        assert!(!is_mp4(Path::new("out.mkv")));
    }
}
