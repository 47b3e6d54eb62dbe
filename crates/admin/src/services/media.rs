//! Server-side crop and JPEG encoding.

use image::codecs::jpeg::JpegEncoder;
use thiserror::Error;

use micrart_core::crop::{CropError, CropRequest, JPEG_QUALITY};

/// Content type of every cropped upload.
pub const JPEG_CONTENT_TYPE: &str = "image/jpeg";

/// Errors from the crop pipeline. `Display` is shown to the admin.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Please choose an image to upload.")]
    MissingFile,

    #[error("The selected file is not a supported image.")]
    Decode(#[source] image::ImageError),

    #[error("Invalid crop: {0}")]
    Crop(#[from] CropError),

    #[error("The cropped image could not be encoded.")]
    Encode(#[source] image::ImageError),
}

/// A cropped image ready for upload.
#[derive(Debug, Clone)]
pub struct CroppedImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Decode `source`, cut the requested region at natural resolution, and
/// encode it as JPEG.
///
/// CPU-bound; call it from `spawn_blocking`.
///
/// # Errors
///
/// Returns `MediaError` if the file does not decode, the crop is invalid, or
/// encoding fails.
pub fn crop_to_jpeg(source: &[u8], request: &CropRequest) -> Result<CroppedImage, MediaError> {
    if source.is_empty() {
        return Err(MediaError::MissingFile);
    }
    let image = image::load_from_memory(source).map_err(MediaError::Decode)?;
    let region = request.to_natural(image.width(), image.height())?;

    let cropped = image
        .crop_imm(region.x, region.y, region.width, region.height)
        .to_rgb8();

    let mut bytes = Vec::new();
    cropped
        .write_with_encoder(JpegEncoder::new_with_quality(&mut bytes, JPEG_QUALITY))
        .map_err(MediaError::Encode)?;

    Ok(CroppedImage {
        bytes,
        width: cropped.width(),
        height: cropped.height(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Cursor;

    use image::{ImageFormat, RgbImage};
    use micrart_core::crop::{AspectRatio, CropRect};

    use super::*;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let image = RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_output_is_crop_scaled_to_natural_size() {
        // 1000x500 image shown at 500x250: every displayed pixel is 2x2.
        let request = CropRequest {
            rect: CropRect {
                x: 50.0,
                y: 20.0,
                width: 120.0,
                height: 90.0,
            },
            displayed_width: 500.0,
            displayed_height: 250.0,
            zoom: 1.0,
            aspect: Some(AspectRatio::FourThree),
        };

        let cropped = crop_to_jpeg(&png(1000, 500), &request).unwrap();

        assert_eq!((cropped.width, cropped.height), (240, 180));
        let decoded = image::load_from_memory(&cropped.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (240, 180));
        assert_eq!(
            image::guess_format(&cropped.bytes).unwrap(),
            ImageFormat::Jpeg
        );
    }

    #[test]
    fn test_free_crop_keeps_its_shape() {
        let request = CropRequest {
            rect: CropRect {
                x: 200.0,
                y: 100.0,
                width: 200.0,
                height: 100.0,
            },
            displayed_width: 500.0,
            displayed_height: 250.0,
            zoom: 1.0,
            aspect: None,
        };

        let cropped = crop_to_jpeg(&png(1000, 500), &request).unwrap();
        assert_eq!((cropped.width, cropped.height), (400, 200));
    }

    #[test]
    fn test_zoom_shrinks_the_natural_region() {
        let request = CropRequest {
            rect: CropRect {
                x: 0.0,
                y: 0.0,
                width: 100.0,
                height: 100.0,
            },
            displayed_width: 200.0,
            displayed_height: 200.0,
            zoom: 2.0,
            aspect: Some(AspectRatio::Square),
        };

        let cropped = crop_to_jpeg(&png(400, 400), &request).unwrap();
        assert_eq!((cropped.width, cropped.height), (100, 100));
    }

    #[test]
    fn test_rejects_non_image_bytes() {
        let request = CropRequest {
            rect: CropRect {
                x: 0.0,
                y: 0.0,
                width: 10.0,
                height: 10.0,
            },
            displayed_width: 10.0,
            displayed_height: 10.0,
            zoom: 1.0,
            aspect: Some(AspectRatio::Square),
        };
        assert!(matches!(
            crop_to_jpeg(b"not an image", &request),
            Err(MediaError::Decode(_))
        ));
        assert!(matches!(
            crop_to_jpeg(&[], &request),
            Err(MediaError::MissingFile)
        ));
    }

    #[test]
    fn test_rejects_zoom_out_of_range() {
        let request = CropRequest {
            rect: CropRect {
                x: 0.0,
                y: 0.0,
                width: 10.0,
                height: 10.0,
            },
            displayed_width: 10.0,
            displayed_height: 10.0,
            zoom: 5.0,
            aspect: Some(AspectRatio::Square),
        };
        assert!(matches!(
            crop_to_jpeg(&png(20, 20), &request),
            Err(MediaError::Crop(CropError::InvalidZoom))
        ));
    }
}
