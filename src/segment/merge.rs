//! Region consolidation
//!
//! Boxes whose dilated forms overlap are replaced by their union, pass after
//! pass, until a pass leaves the region count unchanged. At that fixpoint no
//! two dilated boxes intersect.

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::types::BoundingBox;
use super::union_find::UnionFind;

/// How a single merge pass groups overlapping boxes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MergeStrategy {
    /// Fold each box into the first accumulated box it touches
    #[default]
    FirstMatch,
    /// Union every pair of touching boxes within a pass
    Transitive,
}

/// Merges per-label boxes into consolidated regions
#[derive(Debug, Clone, Copy)]
pub struct RegionMerger {
    dilation_margin: u32,
    width: u32,
    height: u32,
    strategy: MergeStrategy,
}

/// Merge output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    pub regions: Vec<BoundingBox>,
    /// Number of passes run, including the final unchanged one
    pub passes: usize,
}

impl RegionMerger {
    /// Merger for a `width` x `height` image
    pub fn new(dilation_margin: u32, width: u32, height: u32) -> Self {
        Self {
            dilation_margin,
            width,
            height,
            strategy: MergeStrategy::FirstMatch,
        }
    }

    #[must_use]
    pub fn with_strategy(mut self, strategy: MergeStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn strategy(&self) -> MergeStrategy {
        self.strategy
    }

    /// Dilated form of a box, clamped to the image
    pub fn dilate(&self, bbox: &BoundingBox) -> BoundingBox {
        bbox.dilate(self.dilation_margin, self.width, self.height)
    }

    /// Overlap test on the dilated forms of two boxes
    pub fn touches(&self, a: &BoundingBox, b: &BoundingBox) -> bool {
        self.dilate(a).intersects(&self.dilate(b))
    }

    /// Run passes until the region count stops changing
    pub fn merge_all(&self, boxes: Vec<BoundingBox>) -> MergeOutcome {
        let mut regions = boxes;
        let mut passes = 0;

        loop {
            passes += 1;
            let merged = self.merge_pass(&regions);
            trace!(
                pass = passes,
                before = regions.len(),
                after = merged.len(),
                "merge pass"
            );

            if merged.len() == regions.len() {
                debug_assert!(self.is_fixpoint(&merged));
                return MergeOutcome {
                    regions: merged,
                    passes,
                };
            }
            regions = merged;
        }
    }

    /// A single pass, producing a new list
    pub fn merge_pass(&self, regions: &[BoundingBox]) -> Vec<BoundingBox> {
        match self.strategy {
            MergeStrategy::FirstMatch => self.first_match_pass(regions),
            MergeStrategy::Transitive => self.transitive_pass(regions),
        }
    }

    /// True when no two boxes touch after dilation
    pub fn is_fixpoint(&self, regions: &[BoundingBox]) -> bool {
        let dilated: Vec<BoundingBox> = regions.iter().map(|b| self.dilate(b)).collect();
        dilated.iter().enumerate().all(|(i, a)| {
            dilated[i + 1..].iter().all(|b| !a.intersects(b))
        })
    }

    fn first_match_pass(&self, regions: &[BoundingBox]) -> Vec<BoundingBox> {
        regions.iter().fold(Vec::new(), |mut acc: Vec<BoundingBox>, candidate| {
            let grown = self.dilate(candidate);
            match acc.iter().position(|a| self.dilate(a).intersects(&grown)) {
                Some(index) => acc[index] = acc[index].union(candidate),
                None => acc.push(*candidate),
            }
            acc
        })
    }

    fn transitive_pass(&self, regions: &[BoundingBox]) -> Vec<BoundingBox> {
        let dilated: Vec<BoundingBox> = regions.iter().map(|b| self.dilate(b)).collect();
        let mut sets = UnionFind::new(regions.len());

        for i in 0..dilated.len() {
            for j in (i + 1)..dilated.len() {
                if dilated[i].intersects(&dilated[j]) {
                    sets.union(i as u32, j as u32);
                }
            }
        }

        // Roots are the lowest index of each group, so groups come out in
        // order of their first member.
        let mut slot = vec![usize::MAX; regions.len()];
        let mut merged: Vec<BoundingBox> = Vec::new();
        for (i, bbox) in regions.iter().enumerate() {
            let root = sets.find(i as u32) as usize;
            if slot[root] == usize::MAX {
                slot[root] = merged.len();
                merged.push(*bbox);
            } else {
                let target = slot[root];
                merged[target] = merged[target].union(bbox);
            }
        }

        merged
    }
}
