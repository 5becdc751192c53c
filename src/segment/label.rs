//! Region labeling
//!
//! Assigns integer labels to foreground pixels in a single raster-order pass
//! and accumulates a bounding box per label while doing so.
//!
//! Two labelers are provided:
//!
//! - [`ApproximateLabeler`] looks back a bounded distance along the row, the
//!   column and the diagonal and adopts the smallest label it finds. Regions
//!   separated by gaps wider than the search radius receive distinct labels;
//!   the merge stage reconnects them.
//! - [`UnionFindLabeler`] is exact 8-connected labeling with a disjoint-set
//!   forest over provisional labels.

use super::binarize::Binarizer;
use super::types::{BoundingBox, GrayRaster};
use super::union_find::UnionFind;

// ============================================================
// Label grid
// ============================================================

/// Per-pixel labels, `0` for background
#[derive(Debug, Clone)]
pub struct LabelGrid {
    width: u32,
    height: u32,
    cells: Vec<u32>,
}

impl LabelGrid {
    fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            cells: vec![0; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn get(&self, x: u32, y: u32) -> u32 {
        self.cells[y as usize * self.width as usize + x as usize]
    }

    pub fn cells(&self) -> &[u32] {
        &self.cells
    }
}

// ============================================================
// Bounding box aggregation
// ============================================================

/// Dense label -> bounding box table, entry `i` holds label `i + 1`
#[derive(Debug, Clone, Default)]
pub struct BoxTable {
    boxes: Vec<BoundingBox>,
}

impl BoxTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a new label whose box starts at `(x, y)`
    pub fn allocate(&mut self, x: u32, y: u32) -> u32 {
        self.push(BoundingBox::point(x, y))
    }

    /// Allocate a new label with an existing box
    pub fn push(&mut self, bbox: BoundingBox) -> u32 {
        self.boxes.push(bbox);
        self.boxes.len() as u32
    }

    /// Expand `label`'s box to include `(x, y)`
    pub fn record(&mut self, label: u32, x: u32, y: u32) {
        self.boxes[label as usize - 1].expand(x, y);
    }

    /// Grow `label`'s box to cover `other`
    pub fn absorb(&mut self, label: u32, other: &BoundingBox) {
        let slot = &mut self.boxes[label as usize - 1];
        *slot = slot.union(other);
    }

    pub fn get(&self, label: u32) -> Option<&BoundingBox> {
        label
            .checked_sub(1)
            .and_then(|i| self.boxes.get(i as usize))
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    pub fn into_boxes(self) -> Vec<BoundingBox> {
        self.boxes
    }
}

/// Output of a labeling pass
#[derive(Debug, Clone)]
pub struct Labeling {
    pub grid: LabelGrid,
    pub table: BoxTable,
}

impl Labeling {
    pub fn label_count(&self) -> usize {
        self.table.len()
    }

    /// Per-label boxes in label order; the grid is dropped
    pub fn into_boxes(self) -> Vec<BoundingBox> {
        self.table.into_boxes()
    }
}

/// Labels the foreground of a raster
pub trait RegionLabeler {
    fn label(&self, raster: &GrayRaster<'_>, binarizer: &Binarizer) -> Labeling;
}

// ============================================================
// Approximate labeler
// ============================================================

/// Backward search radius: `ceil(min(width, height) * factor)`, at least 1
pub fn search_radius(width: u32, height: u32, factor: f64) -> u32 {
    let radius = (width.min(height) as f64 * factor).ceil();
    if radius.is_nan() || radius < 1.0 {
        1
    } else {
        radius.min(u32::MAX as f64) as u32
    }
}

/// Bounded-radius labeler with min-label propagation
#[derive(Debug, Clone, Copy)]
pub struct ApproximateLabeler {
    search_margin_factor: f64,
}

impl ApproximateLabeler {
    pub fn new(search_margin_factor: f64) -> Self {
        Self {
            search_margin_factor,
        }
    }

    /// Smallest non-zero label among the row, column and diagonal probes,
    /// searching outward up to `max_margin - 1` pixels
    fn probe(grid: &LabelGrid, x: u32, y: u32, max_margin: u32) -> Option<u32> {
        for dist in 1..max_margin {
            let px = x.saturating_sub(dist);
            let py = y.saturating_sub(dist);

            let found = [grid.get(px, y), grid.get(x, py), grid.get(px, py)]
                .into_iter()
                .filter(|&label| label > 0)
                .min();
            if found.is_some() {
                return found;
            }

            if px == 0 && py == 0 {
                break;
            }
        }

        None
    }
}

impl Default for ApproximateLabeler {
    fn default() -> Self {
        Self::new(super::DEFAULT_SEARCH_MARGIN_FACTOR)
    }
}

impl RegionLabeler for ApproximateLabeler {
    fn label(&self, raster: &GrayRaster<'_>, binarizer: &Binarizer) -> Labeling {
        let (width, height) = (raster.width(), raster.height());
        let max_margin = search_radius(width, height, self.search_margin_factor);

        let mut grid = LabelGrid::new(width, height);
        let mut table = BoxTable::new();

        for y in 0..height {
            for x in 0..width {
                let offset = y as usize * width as usize + x as usize;
                if binarizer.is_background(raster.sample(x, y)) {
                    continue;
                }

                let label = match Self::probe(&grid, x, y, max_margin) {
                    Some(label) => {
                        table.record(label, x, y);
                        label
                    }
                    None => table.allocate(x, y),
                };
                grid.cells[offset] = label;
            }
        }

        Labeling { grid, table }
    }
}

// ============================================================
// Union-find labeler
// ============================================================

/// Exact 8-connected labeling
#[derive(Debug, Clone, Copy, Default)]
pub struct UnionFindLabeler;

impl RegionLabeler for UnionFindLabeler {
    fn label(&self, raster: &GrayRaster<'_>, binarizer: &Binarizer) -> Labeling {
        let (width, height) = (raster.width(), raster.height());
        let mut grid = LabelGrid::new(width, height);
        let mut provisional = BoxTable::new();
        // id 0 stands for background
        let mut sets = UnionFind::new(1);

        for y in 0..height {
            for x in 0..width {
                let offset = y as usize * width as usize + x as usize;
                if binarizer.is_background(raster.sample(x, y)) {
                    continue;
                }

                let mut neighbors = [0u32; 4];
                if x > 0 {
                    neighbors[0] = grid.get(x - 1, y);
                }
                if y > 0 {
                    neighbors[1] = grid.get(x, y - 1);
                    if x > 0 {
                        neighbors[2] = grid.get(x - 1, y - 1);
                    }
                    if x + 1 < width {
                        neighbors[3] = grid.get(x + 1, y - 1);
                    }
                }

                let label = match neighbors.iter().copied().filter(|&l| l > 0).min() {
                    Some(min) => {
                        for &n in neighbors.iter().filter(|&&l| l > 0 && l != min) {
                            sets.union(min, n);
                        }
                        provisional.record(min, x, y);
                        min
                    }
                    None => {
                        let id = sets.make_set();
                        let label = provisional.allocate(x, y);
                        debug_assert_eq!(id, label);
                        label
                    }
                };
                grid.cells[offset] = label;
            }
        }

        // Resolve provisional labels; roots are the smallest label of each
        // set, so they are always assigned before their members.
        let mut remap = vec![0u32; provisional.len() + 1];
        let mut table = BoxTable::new();
        for label in 1..=provisional.len() as u32 {
            let Some(&bbox) = provisional.get(label) else {
                continue;
            };
            let root = sets.find(label);
            if root == label {
                remap[label as usize] = table.push(bbox);
            } else {
                let target = remap[root as usize];
                table.absorb(target, &bbox);
                remap[label as usize] = target;
            }
        }

        for cell in grid.cells.iter_mut().filter(|c| **c > 0) {
            *cell = remap[*cell as usize];
        }

        Labeling { grid, table }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a white raster with the listed pixels set to black
    fn raster_with(width: u32, height: u32, black: &[(u32, u32)]) -> Vec<u8> {
        let mut samples = vec![255u8; (width * height) as usize];
        for &(x, y) in black {
            samples[(y * width + x) as usize] = 0;
        }
        samples
    }

    fn block(x0: u32, y0: u32, x1: u32, y1: u32) -> Vec<(u32, u32)> {
        (y0..=y1)
            .flat_map(|y| (x0..=x1).map(move |x| (x, y)))
            .collect()
    }

    #[test]
    fn test_search_radius() {
        assert_eq!(search_radius(100, 100, 0.002), 1);
        assert_eq!(search_radius(1000, 3000, 0.002), 2);
        assert_eq!(search_radius(4000, 5000, 0.002), 8);
        assert_eq!(search_radius(100, 100, 0.0), 1);
        assert_eq!(search_radius(100, 100, -1.0), 1);
        assert_eq!(search_radius(10, 10, 0.25), 3);
    }

    #[test]
    fn test_box_table() {
        let mut table = BoxTable::new();
        assert!(table.is_empty());
        assert_eq!(table.allocate(4, 4), 1);
        assert_eq!(table.allocate(9, 9), 2);
        table.record(1, 2, 6);
        assert_eq!(table.get(1), Some(&BoundingBox::new(2, 4, 4, 6)));
        assert_eq!(table.get(0), None);
        assert_eq!(table.get(2), None);
    }

    #[test]
    fn test_all_background_has_no_labels() {
        let samples = raster_with(20, 20, &[]);
        let raster = GrayRaster::new(20, 20, &samples).unwrap();
        let labeling = ApproximateLabeler::default().label(&raster, &Binarizer::default());

        assert_eq!(labeling.label_count(), 0);
        assert!(labeling.grid.cells().iter().all(|&c| c == 0));
    }

    #[test]
    fn test_radius_one_labels_every_pixel() {
        let samples = raster_with(10, 10, &block(2, 2, 4, 4));
        let raster = GrayRaster::new(10, 10, &samples).unwrap();
        let labeling = ApproximateLabeler::default().label(&raster, &Binarizer::default());

        assert_eq!(labeling.label_count(), 9);
        assert_eq!(labeling.grid.get(2, 2), 1);
        assert_eq!(labeling.grid.get(4, 2), 3);
        assert_eq!(labeling.grid.get(2, 3), 4);
        let boxes = labeling.into_boxes();
        assert_eq!(boxes[0], BoundingBox::point(2, 2));
        assert_eq!(boxes[8], BoundingBox::point(4, 4));
    }

    #[test]
    fn test_solid_block_gets_one_label() {
        let samples = raster_with(10, 10, &block(2, 2, 5, 5));
        let raster = GrayRaster::new(10, 10, &samples).unwrap();
        let labeling = ApproximateLabeler::new(0.5).label(&raster, &Binarizer::default());

        assert_eq!(labeling.label_count(), 1);
        assert_eq!(labeling.table.get(1), Some(&BoundingBox::new(2, 2, 5, 5)));
    }

    #[test]
    fn test_gap_bridged_within_radius() {
        let mut black = block(1, 1, 3, 3);
        black.extend(block(5, 1, 7, 3));
        let samples = raster_with(10, 10, &black);
        let raster = GrayRaster::new(10, 10, &samples).unwrap();

        // radius 3 probes up to 2 pixels back: the 1-pixel gap is bridged
        let wide = ApproximateLabeler::new(0.25).label(&raster, &Binarizer::default());
        assert_eq!(wide.label_count(), 1);
        assert_eq!(wide.table.get(1), Some(&BoundingBox::new(1, 1, 7, 3)));

        // radius 2 probes only adjacent pixels: two labels
        let narrow = ApproximateLabeler::new(0.15).label(&raster, &Binarizer::default());
        assert_eq!(narrow.label_count(), 2);
        assert_eq!(narrow.table.get(1), Some(&BoundingBox::new(1, 1, 3, 3)));
        assert_eq!(narrow.table.get(2), Some(&BoundingBox::new(5, 1, 7, 3)));
    }

    #[test]
    fn test_min_label_propagation() {
        let black = [(1, 0), (3, 0), (1, 1), (2, 1), (3, 1)];
        let samples = raster_with(5, 2, &black);
        let raster = GrayRaster::new(5, 2, &samples).unwrap();
        let labeling = ApproximateLabeler::new(1.0).label(&raster, &Binarizer::default());

        assert_eq!(labeling.grid.get(1, 0), 1);
        assert_eq!(labeling.grid.get(3, 0), 2);
        // (3,1) sees label 1 on its left and label 2 above, and adopts 1
        assert_eq!(labeling.grid.get(3, 1), 1);
        assert_eq!(labeling.table.get(1), Some(&BoundingBox::new(1, 0, 3, 1)));
        // label 2 is never relabeled
        assert_eq!(labeling.table.get(2), Some(&BoundingBox::point(3, 0)));
    }

    #[test]
    fn test_every_cell_maps_to_table_entry() {
        let mut black = block(0, 0, 3, 2);
        black.extend(block(6, 4, 9, 9));
        black.push((5, 0));
        let samples = raster_with(10, 10, &black);
        let raster = GrayRaster::new(10, 10, &samples).unwrap();
        let labeling = ApproximateLabeler::new(0.3).label(&raster, &Binarizer::default());

        for y in 0..10 {
            for x in 0..10 {
                let label = labeling.grid.get(x, y);
                if label == 0 {
                    continue;
                }
                let bbox = labeling.table.get(label).expect("label has a box");
                assert!(x >= bbox.x1 && x <= bbox.x2 && y >= bbox.y1 && y <= bbox.y2);
            }
        }
    }

    #[test]
    fn test_union_find_joins_u_shape() {
        // Two arms joined only at the bottom row
        let mut black = block(1, 0, 1, 5);
        black.extend(block(6, 0, 6, 5));
        black.extend(block(1, 5, 6, 5));
        let samples = raster_with(8, 8, &black);
        let raster = GrayRaster::new(8, 8, &samples).unwrap();

        let exact = UnionFindLabeler.label(&raster, &Binarizer::default());
        assert_eq!(exact.label_count(), 1);
        assert_eq!(exact.table.get(1), Some(&BoundingBox::new(1, 0, 6, 5)));
        assert!(exact.grid.cells().iter().all(|&c| c == 0 || c == 1));
    }

    #[test]
    fn test_union_find_diagonal_connectivity() {
        let black = [(0, 0), (1, 1), (2, 2), (4, 0)];
        let samples = raster_with(5, 3, &black);
        let raster = GrayRaster::new(5, 3, &samples).unwrap();

        let exact = UnionFindLabeler.label(&raster, &Binarizer::default());
        assert_eq!(exact.label_count(), 2);
        assert_eq!(exact.table.get(1), Some(&BoundingBox::new(0, 0, 2, 2)));
        assert_eq!(exact.table.get(2), Some(&BoundingBox::point(4, 0)));
        assert_eq!(exact.grid.get(2, 2), 1);
        assert_eq!(exact.grid.get(4, 0), 2);
    }

    #[test]
    fn test_union_find_separates_distant_blocks() {
        let mut black = block(0, 0, 2, 2);
        black.extend(block(5, 5, 7, 7));
        let samples = raster_with(8, 8, &black);
        let raster = GrayRaster::new(8, 8, &samples).unwrap();

        let exact = UnionFindLabeler.label(&raster, &Binarizer::default());
        let boxes = exact.into_boxes();
        assert_eq!(
            boxes,
            vec![BoundingBox::new(0, 0, 2, 2), BoundingBox::new(5, 5, 7, 7)]
        );
    }
}
