//! Image intake for shelfcount: type checks, EXIF orientation, bounding-box
//! resize and JPEG re-encoding.

pub mod mime_detect;
pub mod orientation;
pub mod preprocess;

pub use mime_detect::{is_allowed_filename, sniff_mime, ALLOWED_EXTENSIONS};
pub use preprocess::{fit_within, ImagePreprocessor, PreprocessConfig};
