use std::cmp::Ordering;
use std::fmt;

use super::aggregate::TierTally;
use crate::format::{FormatSpec, Position, RankCriterion};

/// The cascade step that put a team above the one ranked directly below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecidedBy {
    SetWins,
    MatchWins,
    Differential,
    HeadToHead,
    Position,
}

impl fmt::Display for DecidedBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            DecidedBy::SetWins => "set wins",
            DecidedBy::MatchWins => "match wins",
            DecidedBy::Differential => "point differential",
            DecidedBy::HeadToHead => "head-to-head",
            DecidedBy::Position => "schedule position",
        };
        f.write_str(text)
    }
}

/// A tier's teams, best first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierRanking {
    pub order: Vec<Position>,
    /// `separators[i]` explains why `order[i]` finished above `order[i + 1]`.
    pub separators: Vec<DecidedBy>,
}

impl TierRanking {
    /// 1-based rank of `position`.
    pub fn rank_of(&self, position: Position) -> Option<usize> {
        self.order.iter().position(|&p| p == position).map(|i| i + 1)
    }
}

fn primary(spec: &FormatSpec, tally: &TierTally, position: Position) -> u32 {
    let stat = tally.stat(position);
    match spec.primary {
        RankCriterion::SetWins => stat.set_wins,
        RankCriterion::MatchWins => stat.match_wins,
    }
}

/// Totally order a tier's teams.
///
/// Cascade: primary wins, then point differential, then head-to-head
/// differential when exactly two teams are still level, then label order.
pub fn rank_tier(spec: &FormatSpec, tally: &TierTally) -> TierRanking {
    let key = |p: Position| (primary(spec, tally, p), tally.stat(p).differential());

    let mut order: Vec<Position> = spec.labels.to_vec();
    order.sort_by(|&a, &b| compare_stats(spec, tally, a, b).then(a.cmp(&b)));

    // Groups still level after wins and differential are already in label
    // order; a pair is swapped only if the lower label won their meetings.
    let mut two_way = Vec::new();
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && key(order[end]) == key(order[start]) {
            end += 1;
        }
        if end - start == 2 {
            if tally.head_to_head(order[start + 1], order[start]) > 0 {
                order.swap(start, start + 1);
            }
            two_way.push(start);
        }
        start = end;
    }

    let separators = order
        .windows(2)
        .enumerate()
        .map(|(i, pair)| {
            let (upper, lower) = (pair[0], pair[1]);
            let (wins_u, diff_u) = key(upper);
            let (wins_l, diff_l) = key(lower);
            if wins_u != wins_l {
                match spec.primary {
                    RankCriterion::SetWins => DecidedBy::SetWins,
                    RankCriterion::MatchWins => DecidedBy::MatchWins,
                }
            } else if diff_u != diff_l {
                DecidedBy::Differential
            } else if two_way.contains(&i) && tally.head_to_head(upper, lower) != 0 {
                DecidedBy::HeadToHead
            } else {
                DecidedBy::Position
            }
        })
        .collect();

    TierRanking { order, separators }
}

/// Compare two teams by the first two cascade steps only.
pub fn compare_stats(spec: &FormatSpec, tally: &TierTally, a: Position, b: Position) -> Ordering {
    primary(spec, tally, b)
        .cmp(&primary(spec, tally, a))
        .then(tally.stat(b).differential().cmp(&tally.stat(a).differential()))
}
