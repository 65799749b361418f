//! The bounded (pairs, singletons) grid.
//!
//! Points are laid out p-major: `(0,0), (0,1), …, (0,s_max), (1,0), …`.
//! Every table and reduction in the engine walks this order.

use serde::{Deserialize, Serialize};
use socks_config::GridConfig;

/// Inclusive bounds `0 ≤ p ≤ p_max`, `0 ≤ s ≤ s_max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridBounds {
    pub p_max: u64,
    pub s_max: u64,
}

/// A candidate drum: `p` pairs and `s` singletons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridPoint {
    pub p: u64,
    pub s: u64,
}

impl GridPoint {
    /// Total sock count `2p + s`.
    pub fn n(&self) -> u64 {
        self.p.saturating_mul(2).saturating_add(self.s)
    }
}

impl GridBounds {
    pub fn new(p_max: u64, s_max: u64) -> Self {
        Self { p_max, s_max }
    }

    /// Number of points, or None if it does not fit in memory addressing.
    pub fn point_count(&self) -> Option<usize> {
        let rows = usize::try_from(self.p_max).ok()?.checked_add(1)?;
        let cols = usize::try_from(self.s_max).ok()?.checked_add(1)?;
        rows.checked_mul(cols)
    }

    /// All points in p-major order.
    pub fn points(&self) -> impl Iterator<Item = GridPoint> + '_ {
        (0..=self.p_max).flat_map(move |p| (0..=self.s_max).map(move |s| GridPoint { p, s }))
    }

    pub fn contains(&self, p: u64, s: u64) -> bool {
        p <= self.p_max && s <= self.s_max
    }

    /// Position of `(p, s)` in the p-major layout.
    pub fn index_of(&self, p: u64, s: u64) -> Option<usize> {
        if !self.contains(p, s) {
            return None;
        }
        let row = usize::try_from(p).ok()?;
        let cols = usize::try_from(self.s_max).ok()?.checked_add(1)?;
        row.checked_mul(cols)?
            .checked_add(usize::try_from(s).ok()?)
    }

    /// True on the outer edges `p = p_max` or `s = s_max`.
    pub fn is_boundary(&self, p: u64, s: u64) -> bool {
        p == self.p_max || s == self.s_max
    }

    /// Largest `k` any point on the grid can explain.
    pub fn max_distinct(&self) -> u64 {
        self.p_max.saturating_add(self.s_max)
    }
}

impl From<GridConfig> for GridBounds {
    fn from(config: GridConfig) -> Self {
        Self::new(config.p_max, config.s_max)
    }
}
