//! Foreground/background classification of luminance samples

/// Classifies samples against a white paper background.
///
/// With tolerance `t`, `threshold = floor(255 * t)` and a sample `v` is
/// background iff `v >= 255 - threshold`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binarizer {
    threshold: u8,
}

impl Binarizer {
    /// Create a binarizer from a tolerance in `[0, 1]` (clamped)
    pub fn new(tolerance_percentage: f64) -> Self {
        let tolerance = if tolerance_percentage.is_nan() {
            0.0
        } else {
            tolerance_percentage.clamp(0.0, 1.0)
        };
        Self {
            threshold: (255.0 * tolerance).floor() as u8,
        }
    }

    /// Tolerance threshold in sample units
    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    /// Lowest sample value classified as background
    pub fn background_cutoff(&self) -> u8 {
        u8::MAX - self.threshold
    }

    #[inline]
    pub fn is_background(&self, value: u8) -> bool {
        value >= self.background_cutoff()
    }
}

impl Default for Binarizer {
    fn default() -> Self {
        Self::new(super::DEFAULT_TOLERANCE_PERCENTAGE)
    }
}
