//! Entities - source images, decoding, label text

pub mod loader;
pub mod source_image;
pub mod text;

pub use loader::{ImageStore, LoadError, Loader};
pub use source_image::SourceImage;
pub use text::{FixedMetrics, LabelFont, TextMeasure, TextRenderer};
