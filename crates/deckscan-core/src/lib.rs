//! Core types and utilities for deck scanning.
//!
//! This crate is intentionally small and purely geometric. It does *not*
//! depend on any concrete mark detector or symbology description, and it
//! performs no I/O of its own.

mod geom;
mod image;
mod sample_line;

pub use geom::{angle_unit_vector, clip_segment, perpendicular, Rect};
pub use image::{sample_bilinear, sample_bilinear_u8, FrameError, LumaImage, LumaImageView};
pub use sample_line::SampleLine;
