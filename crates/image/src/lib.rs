//! Pixel format descriptions for captured frames.
//!
//! Frames are never decoded here; this crate only knows how large a frame of
//! a given format is and how the capture platforms name each format.

mod pixelformat;
pub use pixelformat::*;
