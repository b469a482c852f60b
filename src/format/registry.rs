use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::position::Position;
use crate::error::LadderError;

use Position::{A, B, C, D, E, F};

/// Identifier of one of the fixed tier formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FormatId {
    TwoTeamsFourSets,
    TwoTeamsBestOfFive,
    TwoTeamsElite,
    ThreeTeamsSixSets,
    ThreeTeamsEliteSixSets,
    ThreeTeamsEliteNineSets,
    FourTeamsHeadToHead,
    SixTeamsHeadToHead,
}

impl FormatId {
    pub const ALL: [FormatId; 8] = [
        FormatId::TwoTeamsFourSets,
        FormatId::TwoTeamsBestOfFive,
        FormatId::TwoTeamsElite,
        FormatId::ThreeTeamsSixSets,
        FormatId::ThreeTeamsEliteSixSets,
        FormatId::ThreeTeamsEliteNineSets,
        FormatId::FourTeamsHeadToHead,
        FormatId::SixTeamsHeadToHead,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FormatId::TwoTeamsFourSets => "2-teams-4-sets",
            FormatId::TwoTeamsBestOfFive => "2-teams-best-of-5",
            FormatId::TwoTeamsElite => "2-teams-elite",
            FormatId::ThreeTeamsSixSets => "3-teams-6-sets",
            FormatId::ThreeTeamsEliteSixSets => "3-teams-elite-6-sets",
            FormatId::ThreeTeamsEliteNineSets => "3-teams-elite-9-sets",
            FormatId::FourTeamsHeadToHead => "4-teams-head-to-head",
            FormatId::SixTeamsHeadToHead => "6-teams-head-to-head",
        }
    }

    /// The static rules for this format.
    pub fn spec(self) -> &'static FormatSpec {
        match self {
            FormatId::TwoTeamsFourSets => &TWO_TEAMS_FOUR_SETS,
            FormatId::TwoTeamsBestOfFive => &TWO_TEAMS_BEST_OF_FIVE,
            FormatId::TwoTeamsElite => &TWO_TEAMS_ELITE,
            FormatId::ThreeTeamsSixSets => &THREE_TEAMS_SIX_SETS,
            FormatId::ThreeTeamsEliteSixSets => &THREE_TEAMS_ELITE_SIX_SETS,
            FormatId::ThreeTeamsEliteNineSets => &THREE_TEAMS_ELITE_NINE_SETS,
            FormatId::FourTeamsHeadToHead => &FOUR_TEAMS_HEAD_TO_HEAD,
            FormatId::SixTeamsHeadToHead => &SIX_TEAMS_HEAD_TO_HEAD,
        }
    }
}

impl fmt::Display for FormatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormatId {
    type Err = LadderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        FormatId::ALL
            .iter()
            .copied()
            .find(|id| id.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| LadderError::UnknownFormat(s.to_string()))
    }
}

impl TryFrom<String> for FormatId {
    type Error = LadderError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FormatId> for String {
    fn from(value: FormatId) -> Self {
        value.as_str().to_string()
    }
}

/// Resolve a format id string to its rules.
pub fn resolve(format_id: &str) -> Result<&'static FormatSpec, LadderError> {
    format_id.parse::<FormatId>().map(FormatId::spec)
}

/// How a single set's raw scores become a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetRule {
    /// Rally scoring: first to `target` (or `decider_target` in a deciding
    /// set) with a lead of at least `min_margin`.
    Rally {
        target: u32,
        decider_target: u32,
        min_margin: u32,
        max_score: u32,
    },
    /// Casual scoring: any two distinct scores in `0..=cap`.
    Casual { cap: u32 },
}

impl SetRule {
    pub fn max_score(&self) -> u32 {
        match *self {
            SetRule::Rally { max_score, .. } => max_score,
            SetRule::Casual { cap } => cap,
        }
    }
}

/// How many sets each pairing plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Series {
    /// Every set is played.
    Fixed(u8),
    /// Play stops once one side has won a majority.
    BestOf(u8),
}

impl Series {
    pub fn max_sets(self) -> usize {
        match self {
            Series::Fixed(n) | Series::BestOf(n) => n as usize,
        }
    }

    pub fn wins_needed(self) -> Option<u32> {
        match self {
            Series::Fixed(_) => None,
            Series::BestOf(n) => Some(n as u32 / 2 + 1),
        }
    }
}

/// A Game 2 participant, named by its Game 1 court result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seat {
    Winner(usize),
    Loser(usize),
}

impl fmt::Display for Seat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Seat::Winner(court) => write!(f, "W{}", court + 1),
            Seat::Loser(court) => write!(f, "L{}", court + 1),
        }
    }
}

/// Who plays whom within a tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    /// Static pairings, all known before play starts.
    RoundRobin { pairings: &'static [(Position, Position)] },
    /// Game 1 on fixed courts, Game 2 courts filled from Game 1 results.
    HeadToHead {
        courts: &'static [(Position, Position)],
        game_two: &'static [(Seat, Seat)],
    },
}

impl Topology {
    pub fn pairing_count(&self) -> usize {
        match self {
            Topology::RoundRobin { pairings } => pairings.len(),
            Topology::HeadToHead { courts, game_two } => courts.len() + game_two.len(),
        }
    }
}

/// Primary ranking criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankCriterion {
    SetWins,
    /// Pairings won, used where each pairing is its own best-of series.
    MatchWins,
}

/// Base league points for a finishing rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointsTable {
    /// Indexed by rank, best first.
    ByRank(&'static [u32]),
    /// `base + min(set_wins, cap)`, independent of rank.
    SetWins { base: u32, cap: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDir {
    Up,
    Stay,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Move {
    pub dir: MoveDir,
    pub slot: Position,
}

const fn mv(dir: MoveDir, slot: Position) -> Move {
    Move { dir, slot }
}

/// Which ordering of the tier drives movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovementOrder {
    /// The resolved rank order.
    Rank,
    /// Game 2 courts in order, winner before loser.
    FinalCourts,
}

/// Next-week placement rules.
///
/// A team arriving from the tier below lands in `promotion_slot`; one arriving
/// from above lands in `relegation_slot`. A team that would leave the top tier
/// stays and takes the relegation slot, and one that would leave the bottom
/// tier takes the promotion slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovementTopology {
    pub order: MovementOrder,
    pub moves: &'static [Move],
    pub promotion_slot: Position,
    pub relegation_slot: Position,
    /// Within-tier slots by order, used by elite formats outside movement weeks.
    pub hold: Option<&'static [Position]>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetRole {
    Regular,
    Decider,
}

/// Static rules for one format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatSpec {
    pub id: FormatId,
    pub labels: &'static [Position],
    pub topology: Topology,
    pub series: Series,
    pub set_rule: SetRule,
    pub primary: RankCriterion,
    pub points: PointsTable,
    pub tier_bonus: u32,
    pub movement: MovementTopology,
    pub elite: bool,
}

impl FormatSpec {
    pub fn team_count(&self) -> usize {
        self.labels.len()
    }

    pub fn has_label(&self, position: Position) -> bool {
        self.labels.contains(&position)
    }

    /// Role of the set at `index` (0-based) within a pairing.
    ///
    /// Only the last possible set of an odd best-of series under rally scoring
    /// is a decider.
    pub fn set_role(&self, index: usize) -> SetRole {
        match (self.series, self.set_rule) {
            (Series::BestOf(n), SetRule::Rally { .. }) if n % 2 == 1 && index + 1 == n as usize => {
                SetRole::Decider
            }
            _ => SetRole::Regular,
        }
    }

    pub fn is_head_to_head(&self) -> bool {
        matches!(self.topology, Topology::HeadToHead { .. })
    }
}

const RALLY: SetRule = SetRule::Rally {
    target: 25,
    decider_target: 15,
    min_margin: 2,
    max_score: 99,
};

const TWO_TEAM_LABELS: &[Position] = &[A, B];
const THREE_TEAM_LABELS: &[Position] = &[A, B, C];
const FOUR_TEAM_LABELS: &[Position] = &[A, B, C, D];
const SIX_TEAM_LABELS: &[Position] = &[A, B, C, D, E, F];

const SINGLE_PAIRING: Topology = Topology::RoundRobin { pairings: &[(A, B)] };
const TRIANGLE: Topology = Topology::RoundRobin {
    pairings: &[(A, B), (A, C), (B, C)],
};

const TWO_TEAM_POINTS: PointsTable = PointsTable::ByRank(&[5, 3]);
const THREE_TEAM_POINTS: PointsTable = PointsTable::ByRank(&[5, 4, 3]);

const TWO_TEAM_LADDER: MovementTopology = MovementTopology {
    order: MovementOrder::Rank,
    moves: &[mv(MoveDir::Up, B), mv(MoveDir::Down, A)],
    promotion_slot: B,
    relegation_slot: A,
    hold: None,
};

// Elite pairs keep the winner on side A whether or not the tier changes.
const TWO_TEAM_ELITE_LADDER: MovementTopology = MovementTopology {
    order: MovementOrder::Rank,
    moves: &[mv(MoveDir::Up, A), mv(MoveDir::Down, B)],
    promotion_slot: A,
    relegation_slot: B,
    hold: Some(&[A, B]),
};

const THREE_TEAM_LADDER: MovementTopology = MovementTopology {
    order: MovementOrder::Rank,
    moves: &[mv(MoveDir::Up, C), mv(MoveDir::Stay, B), mv(MoveDir::Down, A)],
    promotion_slot: C,
    relegation_slot: A,
    hold: None,
};

const THREE_TEAM_ELITE_LADDER: MovementTopology = MovementTopology {
    hold: Some(&[A, B, C]),
    ..THREE_TEAM_LADDER
};

static TWO_TEAMS_FOUR_SETS: FormatSpec = FormatSpec {
    id: FormatId::TwoTeamsFourSets,
    labels: TWO_TEAM_LABELS,
    topology: SINGLE_PAIRING,
    series: Series::Fixed(4),
    set_rule: SetRule::Casual { cap: 40 },
    primary: RankCriterion::SetWins,
    points: TWO_TEAM_POINTS,
    tier_bonus: 2,
    movement: TWO_TEAM_LADDER,
    elite: false,
};

static TWO_TEAMS_BEST_OF_FIVE: FormatSpec = FormatSpec {
    id: FormatId::TwoTeamsBestOfFive,
    labels: TWO_TEAM_LABELS,
    topology: SINGLE_PAIRING,
    series: Series::BestOf(5),
    set_rule: RALLY,
    primary: RankCriterion::SetWins,
    points: PointsTable::SetWins { base: 2, cap: 3 },
    tier_bonus: 1,
    movement: TWO_TEAM_LADDER,
    elite: false,
};

static TWO_TEAMS_ELITE: FormatSpec = FormatSpec {
    id: FormatId::TwoTeamsElite,
    labels: TWO_TEAM_LABELS,
    topology: SINGLE_PAIRING,
    series: Series::BestOf(5),
    set_rule: RALLY,
    primary: RankCriterion::SetWins,
    points: TWO_TEAM_POINTS,
    tier_bonus: 2,
    movement: TWO_TEAM_ELITE_LADDER,
    elite: true,
};

static THREE_TEAMS_SIX_SETS: FormatSpec = FormatSpec {
    id: FormatId::ThreeTeamsSixSets,
    labels: THREE_TEAM_LABELS,
    topology: TRIANGLE,
    series: Series::Fixed(2),
    set_rule: SetRule::Casual { cap: 21 },
    primary: RankCriterion::SetWins,
    points: THREE_TEAM_POINTS,
    tier_bonus: 2,
    movement: THREE_TEAM_LADDER,
    elite: false,
};

static THREE_TEAMS_ELITE_SIX_SETS: FormatSpec = FormatSpec {
    id: FormatId::ThreeTeamsEliteSixSets,
    labels: THREE_TEAM_LABELS,
    topology: TRIANGLE,
    series: Series::Fixed(2),
    set_rule: RALLY,
    primary: RankCriterion::SetWins,
    points: THREE_TEAM_POINTS,
    tier_bonus: 2,
    movement: THREE_TEAM_ELITE_LADDER,
    elite: true,
};

static THREE_TEAMS_ELITE_NINE_SETS: FormatSpec = FormatSpec {
    id: FormatId::ThreeTeamsEliteNineSets,
    labels: THREE_TEAM_LABELS,
    topology: TRIANGLE,
    series: Series::BestOf(3),
    set_rule: RALLY,
    primary: RankCriterion::MatchWins,
    points: THREE_TEAM_POINTS,
    tier_bonus: 2,
    movement: THREE_TEAM_ELITE_LADDER,
    elite: true,
};

static FOUR_TEAMS_HEAD_TO_HEAD: FormatSpec = FormatSpec {
    id: FormatId::FourTeamsHeadToHead,
    labels: FOUR_TEAM_LABELS,
    topology: Topology::HeadToHead {
        courts: &[(A, B), (C, D)],
        game_two: &[
            (Seat::Winner(0), Seat::Winner(1)),
            (Seat::Loser(0), Seat::Loser(1)),
        ],
    },
    series: Series::Fixed(1),
    set_rule: SetRule::Casual { cap: 21 },
    primary: RankCriterion::SetWins,
    points: PointsTable::ByRank(&[6, 5, 4, 3]),
    tier_bonus: 3,
    movement: MovementTopology {
        order: MovementOrder::FinalCourts,
        moves: &[
            mv(MoveDir::Up, D),
            mv(MoveDir::Stay, C),
            mv(MoveDir::Stay, B),
            mv(MoveDir::Down, A),
        ],
        promotion_slot: D,
        relegation_slot: A,
        hold: None,
    },
    elite: false,
};

static SIX_TEAMS_HEAD_TO_HEAD: FormatSpec = FormatSpec {
    id: FormatId::SixTeamsHeadToHead,
    labels: SIX_TEAM_LABELS,
    topology: Topology::HeadToHead {
        courts: &[(A, B), (C, D), (E, F)],
        game_two: &[
            (Seat::Winner(0), Seat::Winner(1)),
            (Seat::Loser(0), Seat::Winner(2)),
            (Seat::Loser(1), Seat::Loser(2)),
        ],
    },
    series: Series::Fixed(1),
    set_rule: SetRule::Casual { cap: 21 },
    primary: RankCriterion::SetWins,
    points: PointsTable::ByRank(&[8, 7, 6, 5, 4, 3]),
    tier_bonus: 5,
    movement: MovementTopology {
        order: MovementOrder::Rank,
        moves: &[
            mv(MoveDir::Up, F),
            mv(MoveDir::Stay, B),
            mv(MoveDir::Stay, C),
            mv(MoveDir::Stay, D),
            mv(MoveDir::Stay, E),
            mv(MoveDir::Down, A),
        ],
        promotion_slot: F,
        relegation_slot: A,
        hold: None,
    },
    elite: false,
};
