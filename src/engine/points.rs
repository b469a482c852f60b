use serde::{Deserialize, Serialize};

use crate::format::{FormatSpec, PointsTable};

/// League points for one team's week, split into table and tier bonus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyPoints {
    pub base: u32,
    pub bonus: u32,
}

impl WeeklyPoints {
    pub fn total(&self) -> u32 {
        self.base + self.bonus
    }
}

/// Distance of `tier` from the bottom tier, 0 for the bottom tier itself.
///
/// Tiers are numbered from 1 at the top.
pub fn tier_offset(tier: u32, bottom_tier: u32) -> i64 {
    bottom_tier as i64 - tier as i64
}

/// `base[rank] + bonus × max(0, tier_offset)`.
///
/// `rank` is 1-based. Set-win tables ignore the rank and use `set_wins`
/// instead. A rank outside the table earns no base points.
pub fn league_points(spec: &FormatSpec, rank: usize, set_wins: u32, tier_offset: i64) -> WeeklyPoints {
    let base = match spec.points {
        PointsTable::ByRank(table) => rank
            .checked_sub(1)
            .and_then(|i| table.get(i))
            .copied()
            .unwrap_or(0),
        PointsTable::SetWins { base, cap } => base + set_wins.min(cap),
    };
    let offset = tier_offset.max(0) as u32;
    WeeklyPoints {
        base,
        bonus: spec.tier_bonus * offset,
    }
}
