use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::outcome::{evaluate_set, Side, Undecided};
use crate::format::{FormatId, FormatSpec, Position, Seat, Topology};

/// One set's raw scores as entered, in play order within its pairing.
///
/// Head-to-head formats number Game 1 courts first, then Game 2 courts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetScore {
    pub pairing: usize,
    #[serde(default)]
    pub side1: Option<u32>,
    #[serde(default)]
    pub side2: Option<u32>,
}

impl SetScore {
    pub fn new(pairing: usize, side1: u32, side2: u32) -> Self {
        Self {
            pairing,
            side1: Some(side1),
            side2: Some(side2),
        }
    }

    pub fn blank(pairing: usize) -> Self {
        Self {
            pairing,
            side1: None,
            side2: None,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.side1.is_none() && self.side2.is_none()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMatchStat {
    pub set_wins: u32,
    pub set_losses: u32,
    pub match_wins: u32,
    pub match_losses: u32,
    pub points_for: u32,
    pub points_against: u32,
}

impl TeamMatchStat {
    pub fn differential(&self) -> i64 {
        self.points_for as i64 - self.points_against as i64
    }
}

/// Result of one pairing (or one head-to-head court game).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairingResult {
    pub index: usize,
    /// 1 for round-robin pairings and Game 1 courts, 2 for Game 2 courts.
    pub game: u8,
    pub court: usize,
    pub side1: Position,
    pub side2: Position,
    pub set_wins: (u32, u32),
    pub points: (u32, u32),
    pub complete: bool,
    /// `None` while incomplete, or for a fixed-length split level on points.
    pub winner: Option<Position>,
}

impl PairingResult {
    pub fn loser(&self) -> Option<Position> {
        self.winner
            .map(|w| if w == self.side1 { self.side2 } else { self.side1 })
    }

    pub fn involves(&self, a: Position, b: Position) -> bool {
        (self.side1 == a && self.side2 == b) || (self.side1 == b && self.side2 == a)
    }

    /// Point differential from `team`'s point of view.
    pub fn differential_for(&self, team: Position) -> i64 {
        let diff = self.points.0 as i64 - self.points.1 as i64;
        if team == self.side1 {
            diff
        } else if team == self.side2 {
            -diff
        } else {
            0
        }
    }
}

/// Everything the aggregator learned about a tier's submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierTally {
    pub format: FormatId,
    pub stats: BTreeMap<Position, TeamMatchStat>,
    pub pairings: Vec<PairingResult>,
    /// Reasons the submission cannot be accepted.
    pub problems: Vec<String>,
    /// Sets entered after their series was already decided.
    pub ignored: Vec<String>,
}

impl TierTally {
    fn new(spec: &FormatSpec) -> Self {
        Self {
            format: spec.id,
            stats: spec
                .labels
                .iter()
                .map(|&p| (p, TeamMatchStat::default()))
                .collect(),
            pairings: Vec::new(),
            problems: Vec::new(),
            ignored: Vec::new(),
        }
    }

    pub fn stat(&self, position: Position) -> TeamMatchStat {
        self.stats.get(&position).copied().unwrap_or_default()
    }

    pub fn is_complete(&self) -> bool {
        self.problems.is_empty()
    }

    /// Summed point differential of `a` over `b` in the pairings they shared.
    pub fn head_to_head(&self, a: Position, b: Position) -> i64 {
        self.pairings
            .iter()
            .filter(|p| p.involves(a, b))
            .map(|p| p.differential_for(a))
            .sum()
    }

    /// Game 2 courts in court order.
    pub fn final_courts(&self) -> Vec<&PairingResult> {
        self.pairings.iter().filter(|p| p.game == 2).collect()
    }

    fn record(&mut self, result: PairingResult) {
        let winner = result.winner;
        for (team, (won, lost), (scored, conceded)) in [
            (result.side1, result.set_wins, result.points),
            (
                result.side2,
                (result.set_wins.1, result.set_wins.0),
                (result.points.1, result.points.0),
            ),
        ] {
            let stat = self.stats.entry(team).or_default();
            stat.set_wins += won;
            stat.set_losses += lost;
            stat.points_for += scored;
            stat.points_against += conceded;
            match winner {
                Some(w) if w == team => stat.match_wins += 1,
                Some(_) => stat.match_losses += 1,
                None => {}
            }
        }
        self.pairings.push(result);
    }

    fn play_pairing(
        &mut self,
        spec: &FormatSpec,
        slot: PairingSlot,
        sets: &[SetScore],
    ) -> PairingResult {
        let label = slot.describe(spec);
        let played: Vec<&SetScore> = sets.iter().filter(|s| s.pairing == slot.index).collect();
        let max_sets = spec.series.max_sets();
        let needed = spec.series.wins_needed();
        let problems_before = self.problems.len();

        let mut result = PairingResult {
            index: slot.index,
            game: slot.game,
            court: slot.court,
            side1: slot.side1,
            side2: slot.side2,
            set_wins: (0, 0),
            points: (0, 0),
            complete: false,
            winner: None,
        };

        if played.len() > max_sets {
            self.problems.push(format!(
                "{}: {} sets entered, at most {} allowed",
                label,
                played.len(),
                max_sets
            ));
        }

        for k in 0..max_sets {
            let (s1, s2) = played
                .get(k)
                .map(|s| (s.side1, s.side2))
                .unwrap_or((None, None));

            if let Some(n) = needed {
                if result.set_wins.0 >= n || result.set_wins.1 >= n {
                    if s1.is_some() || s2.is_some() {
                        self.ignored
                            .push(format!("{} set {}: ignored, series already decided", label, k + 1));
                    }
                    continue;
                }
            }

            let outcome = evaluate_set(s1, s2, spec.set_role(k), &spec.set_rule);
            match (outcome.decided, outcome.winner, s1, s2) {
                (true, Some(side), Some(p1), Some(p2)) => {
                    match side {
                        Side::One => result.set_wins.0 += 1,
                        Side::Two => result.set_wins.1 += 1,
                    }
                    result.points.0 += p1;
                    result.points.1 += p2;
                }
                _ => {
                    let reason = outcome.undecided.unwrap_or(Undecided::Unfinished);
                    let scores = match (s1, s2) {
                        (Some(p1), Some(p2)) => format!(" ({}-{})", p1, p2),
                        _ => String::new(),
                    };
                    self.problems
                        .push(format!("{} set {}: {}{}", label, k + 1, reason, scores));
                }
            }
        }

        result.complete = self.problems.len() == problems_before;
        if result.complete {
            let (w1, w2) = result.set_wins;
            let (p1, p2) = result.points;
            result.winner = if w1 != w2 {
                Some(if w1 > w2 { result.side1 } else { result.side2 })
            } else if p1 != p2 {
                Some(if p1 > p2 { result.side1 } else { result.side2 })
            } else {
                None
            };
        }
        result
    }
}

#[derive(Debug, Clone, Copy)]
struct PairingSlot {
    index: usize,
    game: u8,
    court: usize,
    side1: Position,
    side2: Position,
}

impl PairingSlot {
    fn describe(&self, spec: &FormatSpec) -> String {
        if spec.is_head_to_head() {
            format!(
                "game {} court {} ({} vs {})",
                self.game,
                self.court + 1,
                self.side1,
                self.side2
            )
        } else {
            format!("pairing {} ({} vs {})", self.index + 1, self.side1, self.side2)
        }
    }
}

/// Fold a tier's set scores into per-team statistics.
///
/// Problems (blank, tied, unfinished or surplus sets, unknown pairings) are
/// collected on the tally rather than returned early, so a caller sees all
/// of them at once.
pub fn aggregate(spec: &FormatSpec, sets: &[SetScore]) -> TierTally {
    let mut tally = TierTally::new(spec);
    let pairing_count = spec.topology.pairing_count();

    for set in sets.iter().filter(|s| s.pairing >= pairing_count) {
        tally.problems.push(format!(
            "set entered for pairing {}, but {} has {} pairings",
            set.pairing + 1,
            spec.id,
            pairing_count
        ));
    }

    match spec.topology {
        Topology::RoundRobin { pairings } => {
            for (index, &(side1, side2)) in pairings.iter().enumerate() {
                let slot = PairingSlot {
                    index,
                    game: 1,
                    court: index,
                    side1,
                    side2,
                };
                let result = tally.play_pairing(spec, slot, sets);
                tally.record(result);
            }
        }
        Topology::HeadToHead { courts, game_two } => {
            let mut game_one = Vec::with_capacity(courts.len());
            for (court, &(side1, side2)) in courts.iter().enumerate() {
                let slot = PairingSlot {
                    index: court,
                    game: 1,
                    court,
                    side1,
                    side2,
                };
                let result = tally.play_pairing(spec, slot, sets);
                game_one.push(result.clone());
                tally.record(result);
            }

            match game_two_sides(game_two, &game_one) {
                Some(sides) => {
                    for (court, (side1, side2)) in sides.into_iter().enumerate() {
                        let slot = PairingSlot {
                            index: courts.len() + court,
                            game: 2,
                            court,
                            side1,
                            side2,
                        };
                        let result = tally.play_pairing(spec, slot, sets);
                        tally.record(result);
                    }
                }
                None => tally.problems.push(
                    "game 2 cannot be evaluated until every game 1 court is decided".to_string(),
                ),
            }
        }
    }

    tally
}

/// Labels meeting in Game 2, or `None` while any Game 1 court is undecided.
pub fn game_two_sides(
    game_two: &[(Seat, Seat)],
    game_one: &[PairingResult],
) -> Option<Vec<(Position, Position)>> {
    let seat = |seat: Seat| match seat {
        Seat::Winner(court) => game_one.get(court).and_then(|r| r.winner),
        Seat::Loser(court) => game_one.get(court).and_then(|r| r.loser()),
    };
    game_two
        .iter()
        .map(|&(a, b)| Some((seat(a)?, seat(b)?)))
        .collect()
}

/// Who meets on each pairing given the scores so far.
///
/// Round-robin pairings are always known; Game 2 courts become known once
/// every Game 1 court is decided.
pub fn resolve_pairings(spec: &FormatSpec, sets: &[SetScore]) -> Vec<Option<(Position, Position)>> {
    let tally = aggregate(spec, sets);
    (0..spec.topology.pairing_count())
        .map(|index| {
            tally
                .pairings
                .iter()
                .find(|p| p.index == index)
                .map(|p| (p.side1, p.side2))
        })
        .collect()
}
