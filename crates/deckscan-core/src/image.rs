//! Borrowed and owned luma (grayscale) frame buffers.

/// Errors raised when adopting an external luma buffer.
#[derive(thiserror::Error, Debug)]
pub enum FrameError {
    #[error("invalid luma buffer length (expected {expected} bytes, got {got})")]
    InvalidBufferLength { expected: usize, got: usize },
    #[error("invalid luma dimensions (width={width}, height={height})")]
    InvalidDimensions { width: usize, height: usize },
}

/// Borrowed view over a row-major luma buffer, `len = width * height`.
#[derive(Clone, Copy, Debug)]
pub struct LumaImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8],
}

impl<'a> LumaImageView<'a> {
    /// Wrap a raw buffer, validating its length against the dimensions.
    pub fn from_raw(width: usize, height: usize, data: &'a [u8]) -> Result<Self, FrameError> {
        let Some(expected) = width.checked_mul(height) else {
            return Err(FrameError::InvalidDimensions { width, height });
        };
        if expected == 0 {
            return Err(FrameError::InvalidDimensions { width, height });
        }
        if data.len() != expected {
            return Err(FrameError::InvalidBufferLength {
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }
}

/// Owned luma frame.
#[derive(Clone, Debug)]
pub struct LumaImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl LumaImage {
    /// Allocate a frame filled with `fill`.
    pub fn new_filled(width: usize, height: usize, fill: u8) -> Self {
        Self {
            width,
            height,
            data: vec![fill; width * height],
        }
    }

    #[inline]
    pub fn view(&self) -> LumaImageView<'_> {
        LumaImageView {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, v: u8) {
        self.data[y * self.width + x] = v;
    }
}

#[inline]
fn get_luma(src: &LumaImageView<'_>, x: i32, y: i32) -> u8 {
    if x < 0 || y < 0 || x >= src.width as i32 || y >= src.height as i32 {
        return 0;
    }
    src.data[y as usize * src.width + x as usize]
}

#[inline]
pub fn sample_bilinear(src: &LumaImageView<'_>, x: f32, y: f32) -> f32 {
    let x0 = x.floor() as i32;
    let y0 = y.floor() as i32;
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let p00 = get_luma(src, x0, y0) as f32;
    let p10 = get_luma(src, x0 + 1, y0) as f32;
    let p01 = get_luma(src, x0, y0 + 1) as f32;
    let p11 = get_luma(src, x0 + 1, y0 + 1) as f32;

    let a = p00 + fx * (p10 - p00);
    let b = p01 + fx * (p11 - p01);
    a + fy * (b - a)
}

#[inline]
pub fn sample_bilinear_u8(src: &LumaImageView<'_>, x: f32, y: f32) -> u8 {
    sample_bilinear(src, x, y).clamp(0.0, 255.0) as u8
}
