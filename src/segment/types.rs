//! Common types for the segmentation module

use image::GrayImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Segmentation error types
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SegmentError {
    #[error("Invalid input: image dimensions must be non-zero (got {width}x{height})")]
    InvalidInput { width: u32, height: u32 },

    #[error("Corrupt buffer: expected {width}x{height} samples, got {actual}")]
    CorruptBuffer { width: u32, height: u32, actual: usize },
}

pub type Result<T> = std::result::Result<T, SegmentError>;

// ============================================================
// Raster
// ============================================================

/// Borrowed single-channel raster, row-major, one byte per sample
#[derive(Debug, Clone, Copy)]
pub struct GrayRaster<'a> {
    width: u32,
    height: u32,
    samples: &'a [u8],
}

impl<'a> GrayRaster<'a> {
    /// Wrap a sample buffer, validating its shape
    pub fn new(width: u32, height: u32, samples: &'a [u8]) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(SegmentError::InvalidInput { width, height });
        }

        let expected = (width as usize).checked_mul(height as usize);
        if expected != Some(samples.len()) {
            return Err(SegmentError::CorruptBuffer {
                width,
                height,
                actual: samples.len(),
            });
        }

        Ok(Self {
            width,
            height,
            samples,
        })
    }

    /// Wrap a decoded grayscale image
    pub fn from_image(gray: &'a GrayImage) -> Result<Self> {
        let (width, height) = gray.dimensions();
        Self::new(width, height, gray.as_raw())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn samples(&self) -> &'a [u8] {
        self.samples
    }

    /// Sample at `(x, y)`; caller guarantees the coordinate is in bounds
    pub fn sample(&self, x: u32, y: u32) -> u8 {
        self.samples[y as usize * self.width as usize + x as usize]
    }
}

// ============================================================
// Bounding box
// ============================================================

/// Axis-aligned bounding box with inclusive pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl BoundingBox {
    /// Create a box from its corners (normalized so that x1 <= x2, y1 <= y2)
    pub fn new(x1: u32, y1: u32, x2: u32, y2: u32) -> Self {
        Self {
            x1: x1.min(x2),
            y1: y1.min(y2),
            x2: x1.max(x2),
            y2: y1.max(y2),
        }
    }

    /// Single-pixel box
    pub fn point(x: u32, y: u32) -> Self {
        Self {
            x1: x,
            y1: y,
            x2: x,
            y2: y,
        }
    }

    /// Grow the box to include `(x, y)`
    pub fn expand(&mut self, x: u32, y: u32) {
        self.x1 = self.x1.min(x);
        self.y1 = self.y1.min(y);
        self.x2 = self.x2.max(x);
        self.y2 = self.y2.max(y);
    }

    /// Coordinate-wise union of two boxes
    #[must_use]
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            x1: self.x1.min(other.x1),
            y1: self.y1.min(other.y1),
            x2: self.x2.max(other.x2),
            y2: self.y2.max(other.y2),
        }
    }

    /// Expand by `margin` on every side, clamped to a `width` x `height` image
    #[must_use]
    pub fn dilate(&self, margin: u32, width: u32, height: u32) -> BoundingBox {
        BoundingBox {
            x1: self.x1.saturating_sub(margin),
            y1: self.y1.saturating_sub(margin),
            x2: self.x2.saturating_add(margin).min(width.saturating_sub(1)),
            y2: self.y2.saturating_add(margin).min(height.saturating_sub(1)),
        }
    }

    /// Inclusive overlap test
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        !(other.x1 > self.x2 || other.x2 < self.x1 || other.y1 > self.y2 || other.y2 < self.y1)
    }

    /// Horizontal extent `x2 - x1`
    pub fn span_x(&self) -> u32 {
        self.x2 - self.x1
    }

    /// Vertical extent `y2 - y1`
    pub fn span_y(&self) -> u32 {
        self.y2 - self.y1
    }

    /// Width in pixels (inclusive)
    pub fn width(&self) -> u32 {
        self.span_x() + 1
    }

    /// Height in pixels (inclusive)
    pub fn height(&self) -> u32 {
        self.span_y() + 1
    }

    /// Check the box lies entirely inside a `width` x `height` image
    pub fn is_within(&self, width: u32, height: u32) -> bool {
        self.x1 <= self.x2 && self.y1 <= self.y2 && self.x2 < width && self.y2 < height
    }
}
