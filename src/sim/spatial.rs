//! Uniform grid spatial partition
//!
//! Purely a pruning structure: collision passes ask it for candidate
//! indices instead of testing every pair. Results are sorted so the resolver
//! visits candidates in the same order brute force would - the grid must
//! never change outcomes, only skip work.

use std::collections::HashMap;

use super::entity::Hitbox;
use crate::consts::GRID_CELL;

/// Entity-group population above which the resolver bothers building a grid
pub const GRID_THRESHOLD: usize = 32;

#[derive(Debug, Default)]
pub struct UniformGrid {
    buckets: HashMap<(i32, i32), Vec<usize>>,
}

impl UniformGrid {
    /// Build a grid over one entity group's hitboxes
    pub fn build(boxes: impl Iterator<Item = (usize, Hitbox)>) -> Self {
        let mut grid = Self::default();
        for (index, hitbox) in boxes {
            let (x0, y0) = cell_of(hitbox.min().x, hitbox.min().y);
            let (x1, y1) = cell_of(hitbox.max().x, hitbox.max().y);
            for cy in y0..=y1 {
                for cx in x0..=x1 {
                    grid.buckets.entry((cx, cy)).or_default().push(index);
                }
            }
        }
        grid
    }

    /// Indices whose cells overlap `hitbox`, sorted and deduplicated
    pub fn candidates(&self, hitbox: &Hitbox) -> Vec<usize> {
        let (x0, y0) = cell_of(hitbox.min().x, hitbox.min().y);
        let (x1, y1) = cell_of(hitbox.max().x, hitbox.max().y);
        let mut out = Vec::new();
        for cy in y0..=y1 {
            for cx in x0..=x1 {
                if let Some(bucket) = self.buckets.get(&(cx, cy)) {
                    out.extend_from_slice(bucket);
                }
            }
        }
        out.sort_unstable();
        out.dedup();
        out
    }
}

#[inline]
fn cell_of(x: f32, y: f32) -> (i32, i32) {
    ((x / GRID_CELL).floor() as i32, (y / GRID_CELL).floor() as i32)
}
