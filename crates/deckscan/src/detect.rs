//! `image` crate adapters for feeding frames into the scanner.

use deckscan_core::{FrameError, LumaImageView};
use deckscan_format::DeckFormat;

use crate::manager::{AnalysisResult, ScanManager};

/// Borrow an `image::GrayImage` as the scanner's luma view type.
pub fn luma_view(img: &::image::GrayImage) -> LumaImageView<'_> {
    LumaImageView {
        width: img.width() as usize,
        height: img.height() as usize,
        data: img.as_raw(),
    }
}

/// Wrap a raw luma buffer, validating dimensions against its length.
pub fn luma_view_from_slice(
    width: usize,
    height: usize,
    pixels: &[u8],
) -> Result<LumaImageView<'_>, FrameError> {
    LumaImageView::from_raw(width, height, pixels)
}

/// Run one grayscale image through a manager's full pipeline.
pub fn process_gray_image(
    manager: &ScanManager,
    img: &::image::GrayImage,
    format: &DeckFormat,
) -> AnalysisResult {
    manager.process_frame(&luma_view(img), format)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gray_image_borrows_without_copying() {
        let img = ::image::GrayImage::from_pixel(8, 4, ::image::Luma([77u8]));
        let view = luma_view(&img);
        assert_eq!(view.width, 8);
        assert_eq!(view.height, 4);
        assert!(view.data.iter().all(|&v| v == 77));
    }

    #[test]
    fn slice_adapter_validates_length() {
        let buf = vec![0u8; 30];
        assert!(luma_view_from_slice(6, 5, &buf).is_ok());
        assert!(luma_view_from_slice(6, 6, &buf).is_err());
    }
}
