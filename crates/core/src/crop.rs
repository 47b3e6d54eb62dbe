//! Crop rectangle geometry.
//!
//! The admin crop widget reports a rectangle in on-screen pixels relative to
//! the zoomed, displayed image. [`CropRequest::to_natural`] maps it onto the
//! natural-resolution image so the server can cut the region at full
//! quality.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Smallest zoom factor the widget allows.
pub const MIN_ZOOM: f64 = 1.0;
/// Largest zoom factor the widget allows.
pub const MAX_ZOOM: f64 = 3.0;

/// JPEG quality used for every cropped upload.
pub const JPEG_QUALITY: u8 = 90;

/// Relative slack allowed between a rectangle's shape and its aspect preset.
const ASPECT_TOLERANCE: f64 = 0.01;

/// Errors raised while interpreting crop input.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CropError {
    #[error("unknown aspect ratio: {0}")]
    UnknownAspect(String),
    #[error("crop area must have a positive size")]
    EmptyRect,
    #[error("displayed image size must be positive")]
    InvalidDisplaySize,
    #[error("zoom must be between {MIN_ZOOM} and {MAX_ZOOM}")]
    InvalidZoom,
    #[error("crop area lies outside the image")]
    OutsideImage,
    #[error("crop area does not match the {0} aspect ratio")]
    AspectMismatch(AspectRatio),
}

/// Aspect ratio presets offered by the crop widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    #[serde(rename = "1:1")]
    Square,
    #[default]
    #[serde(rename = "4:3")]
    FourThree,
    #[serde(rename = "16:9")]
    SixteenNine,
}

impl AspectRatio {
    /// All presets in the order the widget shows them.
    pub const ALL: [Self; 3] = [Self::Square, Self::FourThree, Self::SixteenNine];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Square => "1:1",
            Self::FourThree => "4:3",
            Self::SixteenNine => "16:9",
        }
    }

    /// Width divided by height.
    #[must_use]
    pub fn value(self) -> f64 {
        match self {
            Self::Square => 1.0,
            Self::FourThree => 4.0 / 3.0,
            Self::SixteenNine => 16.0 / 9.0,
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AspectRatio {
    type Err = CropError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|preset| preset.label() == s.trim())
            .ok_or_else(|| CropError::UnknownAspect(s.to_string()))
    }
}

/// A rectangle in displayed (on-screen) pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl CropRect {
    /// Whether `width / height` is within [`ASPECT_TOLERANCE`] of the preset.
    #[must_use]
    pub fn matches_aspect(&self, aspect: AspectRatio) -> bool {
        let ratio = aspect.value();
        ((self.width / self.height) - ratio).abs() <= ratio * ASPECT_TOLERANCE
    }
}

/// A region of the natural-resolution image in whole pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PixelRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Everything the crop widget submits alongside the file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropRequest {
    pub rect: CropRect,
    pub displayed_width: f64,
    pub displayed_height: f64,
    pub zoom: f64,
    /// Preset the widget framed the rectangle with. `None` leaves the
    /// shape unconstrained.
    pub aspect: Option<AspectRatio>,
}

impl CropRequest {
    /// Check the widget input before any pixel work.
    ///
    /// # Errors
    ///
    /// Returns an error for a non-positive rectangle or display size, a
    /// zoom outside `1.0..=3.0`, or a rectangle whose shape disagrees with
    /// its aspect preset.
    pub fn validate(&self) -> Result<(), CropError> {
        let finite = [
            self.rect.x,
            self.rect.y,
            self.rect.width,
            self.rect.height,
            self.displayed_width,
            self.displayed_height,
            self.zoom,
        ]
        .iter()
        .all(|v| v.is_finite());
        if !finite || self.rect.width <= 0.0 || self.rect.height <= 0.0 {
            return Err(CropError::EmptyRect);
        }
        if self.displayed_width <= 0.0 || self.displayed_height <= 0.0 {
            return Err(CropError::InvalidDisplaySize);
        }
        if !(MIN_ZOOM..=MAX_ZOOM).contains(&self.zoom) {
            return Err(CropError::InvalidZoom);
        }
        match self.aspect {
            Some(aspect) if !self.rect.matches_aspect(aspect) => {
                Err(CropError::AspectMismatch(aspect))
            }
            _ => Ok(()),
        }
    }

    /// Scale factors from displayed to natural pixels, per axis.
    ///
    /// `natural / (displayed * zoom)`.
    #[must_use]
    pub fn scale(&self, natural_width: u32, natural_height: u32) -> (f64, f64) {
        (
            f64::from(natural_width) / (self.displayed_width * self.zoom),
            f64::from(natural_height) / (self.displayed_height * self.zoom),
        )
    }

    /// Map the rectangle onto the natural image, clamped to its bounds.
    ///
    /// The rectangle keeps the shape the widget drew.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is invalid or the clamped region is
    /// empty.
    pub fn to_natural(
        &self,
        natural_width: u32,
        natural_height: u32,
    ) -> Result<PixelRegion, CropError> {
        self.validate()?;
        let rect = self.rect;
        let (scale_x, scale_y) = self.scale(natural_width, natural_height);

        let x = clamp_px(rect.x * scale_x, natural_width);
        let y = clamp_px(rect.y * scale_y, natural_height);
        let width = clamp_px(rect.width * scale_x, natural_width - x);
        let height = clamp_px(rect.height * scale_y, natural_height - y);

        if width == 0 || height == 0 {
            return Err(CropError::OutsideImage);
        }
        Ok(PixelRegion {
            x,
            y,
            width,
            height,
        })
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // clamped to 0..=max
fn clamp_px(value: f64, max: u32) -> u32 {
    value.round().clamp(0.0, f64::from(max)) as u32
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn request(rect: CropRect, zoom: f64, aspect: Option<AspectRatio>) -> CropRequest {
        CropRequest {
            rect,
            displayed_width: 500.0,
            displayed_height: 250.0,
            zoom,
            aspect,
        }
    }

    #[test]
    fn test_region_scales_by_natural_over_displayed() {
        let rect = CropRect {
            x: 100.0,
            y: 50.0,
            width: 160.0,
            height: 120.0,
        };
        let region = request(rect, 1.0, Some(AspectRatio::FourThree))
            .to_natural(2000, 1000)
            .unwrap();
        assert_eq!(
            region,
            PixelRegion {
                x: 400,
                y: 200,
                width: 640,
                height: 480,
            }
        );
    }

    #[test]
    fn test_zoom_divides_scale() {
        let rect = CropRect {
            x: 0.0,
            y: 0.0,
            width: 200.0,
            height: 200.0,
        };
        let region = request(rect, 2.0, Some(AspectRatio::Square))
            .to_natural(1000, 500)
            .unwrap();
        assert_eq!((region.width, region.height), (200, 200));
    }

    #[test]
    fn test_region_clamped_to_image() {
        let rect = CropRect {
            x: 400.0,
            y: 200.0,
            width: 200.0,
            height: 200.0,
        };
        let region = request(rect, 1.0, Some(AspectRatio::Square))
            .to_natural(500, 250)
            .unwrap();
        assert_eq!(region.x + region.width, 500);
        assert_eq!(region.y + region.height, 250);
    }

    #[test]
    fn test_free_rect_keeps_its_shape() {
        let rect = CropRect {
            x: 200.0,
            y: 100.0,
            width: 200.0,
            height: 100.0,
        };
        let region = request(rect, 1.0, None).to_natural(1000, 500).unwrap();
        assert_eq!(
            region,
            PixelRegion {
                x: 400,
                y: 200,
                width: 400,
                height: 200,
            }
        );
    }

    #[test]
    fn test_rect_must_match_its_aspect() {
        let wide = CropRect {
            x: 0.0,
            y: 0.0,
            width: 300.0,
            height: 90.0,
        };
        assert_eq!(
            request(wide, 1.0, Some(AspectRatio::SixteenNine)).to_natural(1000, 500),
            Err(CropError::AspectMismatch(AspectRatio::SixteenNine))
        );

        let nearly = CropRect {
            width: 160.4,
            ..wide
        };
        assert!(
            request(nearly, 1.0, Some(AspectRatio::SixteenNine))
                .validate()
                .is_ok()
        );
    }

    #[test]
    fn test_rejects_bad_input() {
        let empty = CropRect {
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 10.0,
        };
        assert_eq!(
            request(empty, 1.0, None).validate(),
            Err(CropError::EmptyRect)
        );

        let rect = CropRect {
            x: 0.0,
            y: 0.0,
            width: 10.0,
            height: 10.0,
        };
        assert_eq!(
            request(rect, 3.5, None).validate(),
            Err(CropError::InvalidZoom)
        );

        let outside = CropRect {
            x: 900.0,
            y: 0.0,
            width: 10.0,
            height: 10.0,
        };
        assert_eq!(
            request(outside, 1.0, None).to_natural(500, 250),
            Err(CropError::OutsideImage)
        );
    }

    #[test]
    fn test_aspect_parse() {
        assert_eq!("16:9".parse::<AspectRatio>(), Ok(AspectRatio::SixteenNine));
        assert_eq!(AspectRatio::Square.to_string(), "1:1");
        assert!("3:2".parse::<AspectRatio>().is_err());
    }
}
