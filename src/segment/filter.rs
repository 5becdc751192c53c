//! Minimum-size filter for consolidated regions

use super::types::BoundingBox;

/// Drops regions whose extent does not exceed the minimum on both axes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeFilter {
    pub min_width: u32,
    pub min_height: u32,
}

impl SizeFilter {
    pub fn new(min_width: u32, min_height: u32) -> Self {
        Self {
            min_width,
            min_height,
        }
    }

    /// Kept iff `x2 - x1 > min_width` and `y2 - y1 > min_height`
    pub fn accepts(&self, region: &BoundingBox) -> bool {
        region.span_x() > self.min_width && region.span_y() > self.min_height
    }

    pub fn apply(&self, regions: Vec<BoundingBox>) -> Vec<BoundingBox> {
        regions.into_iter().filter(|r| self.accepts(r)).collect()
    }
}

impl Default for SizeFilter {
    fn default() -> Self {
        Self::new(super::DEFAULT_MIN_REGION_SIZE, super::DEFAULT_MIN_REGION_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thresholds_are_strict() {
        let filter = SizeFilter::default();
        assert!(!filter.accepts(&BoundingBox::new(0, 0, 50, 100)));
        assert!(!filter.accepts(&BoundingBox::new(0, 0, 100, 50)));
        assert!(filter.accepts(&BoundingBox::new(0, 0, 51, 51)));
    }

    #[test]
    fn test_apply_preserves_order() {
        let filter = SizeFilter::new(10, 20);
        let regions = vec![
            BoundingBox::new(0, 0, 30, 30),
            BoundingBox::new(0, 0, 30, 5),
            BoundingBox::new(40, 40, 51, 61),
        ];
        assert_eq!(
            filter.apply(regions),
            vec![BoundingBox::new(0, 0, 30, 30), BoundingBox::new(40, 40, 51, 61)]
        );
    }

    #[test]
    fn test_zero_minimum_still_drops_single_pixels() {
        let filter = SizeFilter::new(0, 0);
        assert!(!filter.accepts(&BoundingBox::point(3, 3)));
        assert!(filter.accepts(&BoundingBox::new(3, 3, 4, 4)));
    }
}
