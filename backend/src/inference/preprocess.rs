use image::{DynamicImage, ImageFormat, ImageReader};
use ndarray::Array4;
use std::io::Cursor;

use crate::config::{InputConfig, ResizeMethod, TensorLayout};
use crate::error::ClassifierError;

/// Turns uploaded bytes into the batch-of-one tensor the model expects.
#[derive(Debug, Clone)]
pub struct Preprocessor {
    width: u32,
    height: u32,
    resize_method: ResizeMethod,
    layout: TensorLayout,
}

impl Preprocessor {
    pub fn new(input: &InputConfig) -> Self {
        Self {
            width: input.width,
            height: input.height,
            resize_method: input.resize_method,
            layout: input.layout,
        }
    }

    pub fn input_shape(&self) -> [usize; 4] {
        let (h, w) = (self.height as usize, self.width as usize);
        match self.layout {
            TensorLayout::Nhwc => [1, h, w, 3],
            TensorLayout::Nchw => [1, 3, h, w],
        }
    }

    pub fn preprocess(&self, image_data: &[u8]) -> Result<Array4<f32>, ClassifierError> {
        let image = decode(image_data)?;
        Ok(self.to_tensor(&image))
    }

    fn to_tensor(&self, image: &DynamicImage) -> Array4<f32> {
        let resized = image
            .resize_exact(self.width, self.height, self.resize_method.filter())
            .to_rgb8();

        let shape = self.input_shape();
        let layout = self.layout;
        Array4::from_shape_fn(shape, |(_, a, b, c)| {
            let (x, y, channel) = match layout {
                TensorLayout::Nhwc => (b, a, c),
                TensorLayout::Nchw => (c, b, a),
            };
            resized.get_pixel(x as u32, y as u32)[channel] as f32 / 255.0
        })
    }
}

/// Decodes JPEG or PNG bytes; anything else is a decode failure.
pub fn decode(image_data: &[u8]) -> Result<DynamicImage, ClassifierError> {
    if image_data.is_empty() {
        return Err(ClassifierError::ImageDecode("empty upload".into()));
    }

    let reader = ImageReader::new(Cursor::new(image_data))
        .with_guessed_format()
        .map_err(|e| ClassifierError::ImageDecode(e.to_string()))?;

    match reader.format() {
        Some(ImageFormat::Jpeg) | Some(ImageFormat::Png) => {}
        Some(other) => {
            return Err(ClassifierError::ImageDecode(format!(
                "unsupported image format {:?}, expected JPEG or PNG",
                other
            )));
        }
        None => {
            return Err(ClassifierError::ImageDecode(
                "unrecognised image data, expected JPEG or PNG".into(),
            ));
        }
    }

    Ok(reader.decode()?)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb, RgbImage};

    pub(crate) fn encoded(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
        let img: RgbImage = ImageBuffer::from_fn(width, height, |x, y| {
            Rgb([(x * 7 % 256) as u8, (y * 13 % 256) as u8, ((x + y) % 256) as u8])
        });
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut bytes), format)
            .unwrap();
        bytes
    }

    fn input(width: u32, height: u32, layout: TensorLayout) -> InputConfig {
        InputConfig {
            width,
            height,
            resize_method: ResizeMethod::Nearest,
            layout,
        }
    }

    #[test]
    fn output_shape_matches_config_for_any_source_size() {
        let processor = Preprocessor::new(&input(128, 128, TensorLayout::Nhwc));
        for (w, h) in [(1, 1), (64, 48), (128, 128), (300, 97)] {
            for format in [ImageFormat::Png, ImageFormat::Jpeg] {
                let tensor = processor.preprocess(&encoded(w, h, format)).unwrap();
                assert_eq!(tensor.shape(), &[1, 128, 128, 3]);
                assert!(tensor.iter().all(|v| (0.0..=1.0).contains(v)));
            }
        }
    }

    #[test]
    fn non_square_targets_keep_height_before_width() {
        let processor = Preprocessor::new(&input(224, 64, TensorLayout::Nhwc));
        let tensor = processor.preprocess(&encoded(10, 10, ImageFormat::Png)).unwrap();
        assert_eq!(tensor.shape(), &[1, 64, 224, 3]);
    }

    #[test]
    fn nchw_layout_moves_channels_forward() {
        let processor = Preprocessor::new(&input(4, 4, TensorLayout::Nchw));
        let bytes = encoded(4, 4, ImageFormat::Png);
        let tensor = processor.preprocess(&bytes).unwrap();
        assert_eq!(tensor.shape(), &[1, 3, 4, 4]);

        // Same size, nearest filter: pixel values survive untouched.
        let original = decode(&bytes).unwrap().to_rgb8();
        let pixel = original.get_pixel(3, 1);
        assert_eq!(tensor[[0, 0, 1, 3]], pixel[0] as f32 / 255.0);
        assert_eq!(tensor[[0, 2, 1, 3]], pixel[2] as f32 / 255.0);
    }

    #[test]
    fn nhwc_values_are_scaled_pixels() {
        let processor = Preprocessor::new(&input(4, 4, TensorLayout::Nhwc));
        let bytes = encoded(4, 4, ImageFormat::Png);
        let tensor = processor.preprocess(&bytes).unwrap();
        let original = decode(&bytes).unwrap().to_rgb8();
        let pixel = original.get_pixel(2, 3);
        assert_eq!(tensor[[0, 3, 2, 1]], pixel[1] as f32 / 255.0);
    }

    #[test]
    fn rejects_non_image_bytes() {
        let err = decode(b"this is a text file, not a photo").unwrap_err();
        assert!(matches!(err, ClassifierError::ImageDecode(_)));
    }

    #[test]
    fn rejects_empty_upload() {
        assert!(matches!(decode(&[]), Err(ClassifierError::ImageDecode(_))));
    }

    #[test]
    fn rejects_truncated_png() {
        let bytes = encoded(32, 32, ImageFormat::Png);
        let err = decode(&bytes[..bytes.len() / 2]).unwrap_err();
        assert!(matches!(err, ClassifierError::ImageDecode(_)));
    }

    #[test]
    fn rejects_formats_outside_jpeg_and_png() {
        let bytes = encoded(8, 8, ImageFormat::Bmp);
        let err = decode(&bytes).unwrap_err();
        assert!(err.to_string().contains("expected JPEG or PNG"));
    }
}
