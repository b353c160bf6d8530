//! OCR pixel space → page coordinate space.
//!
//! Tesseract reports boxes in pixels of the rasterised page, with the same
//! top-left origin the clustering core uses. Mapping them into page units is
//! an independent scale per axis; rotation and skew are not corrected.

use crate::error::LayoutError;

use super::types::{BBox, Token};

/// Per-axis scale from a rendered image to its source page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateNormalizer {
    scale_x: f64,
    scale_y: f64,
}

impl CoordinateNormalizer {
    /// Build the mapping for an `image_width × image_height` render of a
    /// `page_width × page_height` page.
    ///
    /// # Errors
    /// [`LayoutError::InvalidDimensions`] when any dimension is zero,
    /// negative or non-finite.
    pub fn new(
        image_width: u32,
        image_height: u32,
        page_width: f64,
        page_height: f64,
    ) -> Result<Self, LayoutError> {
        if image_width == 0 || image_height == 0 {
            return Err(LayoutError::InvalidDimensions(format!(
                "image is {image_width}x{image_height} px"
            )));
        }
        if !(page_width.is_finite() && page_width > 0.0)
            || !(page_height.is_finite() && page_height > 0.0)
        {
            return Err(LayoutError::InvalidDimensions(format!(
                "page is {page_width}x{page_height} units"
            )));
        }
        Ok(Self {
            scale_x: page_width / image_width as f64,
            scale_y: page_height / image_height as f64,
        })
    }

    pub fn scale_x(&self) -> f64 {
        self.scale_x
    }

    pub fn scale_y(&self) -> f64 {
        self.scale_y
    }

    pub fn normalize_bbox(&self, bbox: BBox) -> BBox {
        bbox.scale(self.scale_x, self.scale_y)
    }

    /// Rescale every token's box; text, id and page are untouched.
    pub fn normalize(&self, tokens: Vec<Token>) -> Vec<Token> {
        tokens
            .into_iter()
            .map(|t| Token {
                bbox: self.normalize_bbox(t.bbox),
                ..t
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scales_each_axis_independently() {
        // Letter page (612x792 pt) rendered at 1275x1650 px.
        let n = CoordinateNormalizer::new(1275, 1650, 612.0, 792.0).unwrap();
        let b = n.normalize_bbox(BBox::new(0.0, 0.0, 1275.0, 1650.0));
        assert!((b.right - 612.0).abs() < 1e-9);
        assert!((b.bottom - 792.0).abs() < 1e-9);
    }

    #[test]
    fn keeps_origin_and_ordering() {
        let n = CoordinateNormalizer::new(200, 100, 100.0, 100.0).unwrap();
        let b = n.normalize_bbox(BBox::new(20.0, 10.0, 60.0, 30.0));
        assert_eq!(b, BBox::new(10.0, 10.0, 30.0, 30.0));
    }

    #[test]
    fn normalizes_tokens_in_place() {
        let n = CoordinateNormalizer::new(2, 2, 1.0, 1.0).unwrap();
        let out = n.normalize(vec![Token::new("w0", "hi", BBox::new(0.0, 0.0, 2.0, 2.0), 5)]);
        assert_eq!(out[0].bbox, BBox::new(0.0, 0.0, 1.0, 1.0));
        assert_eq!(out[0].page, 5);
        assert_eq!(out[0].text, "hi");
    }

    #[test]
    fn rejects_degenerate_dimensions() {
        assert!(CoordinateNormalizer::new(0, 100, 10.0, 10.0).is_err());
        assert!(CoordinateNormalizer::new(100, 100, 0.0, 10.0).is_err());
        assert!(CoordinateNormalizer::new(100, 100, 10.0, f64::NAN).is_err());
    }
}
