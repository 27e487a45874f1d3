use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, RgbImage};
use ndarray::{Array4, ArrayView4};

use crate::error::{PipelineError, Result};
use crate::inference::config::InputLayout;

#[derive(Debug, Clone, PartialEq)]
pub struct PreprocessedTensor {
    data: Array4<f32>,
}

impl PreprocessedTensor {
    pub fn zeros(width: u32, height: u32) -> Self {
        Self {
            data: Array4::zeros((1, height as usize, width as usize, 3)),
        }
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    pub fn width(&self) -> usize {
        self.data.shape()[2]
    }

    pub fn height(&self) -> usize {
        self.data.shape()[1]
    }

    pub fn view(&self) -> ArrayView4<'_, f32> {
        self.data.view()
    }

    pub fn to_layout_vec(&self, layout: InputLayout) -> Vec<f32> {
        match layout {
            InputLayout::Nhwc => self.data.iter().copied().collect(),
            InputLayout::Nchw => self
                .data
                .view()
                .permuted_axes([0, 3, 1, 2])
                .iter()
                .copied()
                .collect(),
        }
    }
}

pub fn decode(bytes: &[u8]) -> Result<DynamicImage> {
    if bytes.is_empty() {
        return Err(PipelineError::InvalidImage("empty upload".to_string()));
    }

    let format = image::guess_format(bytes)?;
    match format {
        ImageFormat::Png | ImageFormat::Jpeg => {}
        other => {
            return Err(PipelineError::InvalidImage(format!(
                "unsupported image format: {:?}",
                other
            )));
        }
    }

    Ok(image::load_from_memory_with_format(bytes, format)?)
}

/// Checks that `image` is 8-bit RGB. Alpha, grayscale and other bit depths
/// are rejected rather than converted.
pub fn require_rgb8(image: &DynamicImage) -> Result<&RgbImage> {
    let rgb = match image {
        DynamicImage::ImageRgb8(rgb) => rgb,
        other => {
            return Err(PipelineError::InvalidImage(format!(
                "expected a 3-channel 8-bit colour image, got {:?}",
                other.color()
            )));
        }
    };

    if rgb.width() == 0 || rgb.height() == 0 {
        return Err(PipelineError::InvalidImage("image has no pixels".to_string()));
    }

    Ok(rgb)
}

pub fn preprocess(image: &DynamicImage, width: u32, height: u32) -> Result<PreprocessedTensor> {
    let rgb = require_rgb8(image)?;

    let resized;
    let source = if rgb.dimensions() == (width, height) {
        rgb
    } else {
        resized = imageops::resize(rgb, width, height, FilterType::Triangle);
        &resized
    };

    let data = Array4::from_shape_fn(
        (1, height as usize, width as usize, 3),
        |(_, y, x, c)| source.get_pixel(x as u32, y as u32)[c] as f32 / 255.0,
    );

    Ok(PreprocessedTensor { data })
}
