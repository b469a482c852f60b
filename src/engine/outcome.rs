use std::fmt;

use crate::format::{SetRole, SetRule};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    One,
    Two,
}

/// Why a set has no result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Undecided {
    Blank,
    /// Only one side has a score.
    Partial,
    Tied,
    OutOfRange,
    /// Rally set where nobody reached the target with the required lead.
    Unfinished,
}

impl fmt::Display for Undecided {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Undecided::Blank => "blank",
            Undecided::Partial => "only one score entered",
            Undecided::Tied => "tied",
            Undecided::OutOfRange => "score out of range",
            Undecided::Unfinished => "not a finished set",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetOutcome {
    pub decided: bool,
    pub winner: Option<Side>,
    pub margin: Option<u32>,
    pub undecided: Option<Undecided>,
}

impl SetOutcome {
    fn won(winner: Side, margin: u32) -> Self {
        Self {
            decided: true,
            winner: Some(winner),
            margin: Some(margin),
            undecided: None,
        }
    }

    fn open(reason: Undecided) -> Self {
        Self {
            decided: false,
            winner: None,
            margin: None,
            undecided: Some(reason),
        }
    }
}

/// Decide whether one set's raw scores form a completed result.
pub fn evaluate_set(
    side1: Option<u32>,
    side2: Option<u32>,
    role: SetRole,
    rule: &SetRule,
) -> SetOutcome {
    let (s1, s2) = match (side1, side2) {
        (None, None) => return SetOutcome::open(Undecided::Blank),
        (Some(s1), Some(s2)) => (s1, s2),
        _ => return SetOutcome::open(Undecided::Partial),
    };

    if s1 > rule.max_score() || s2 > rule.max_score() {
        return SetOutcome::open(Undecided::OutOfRange);
    }
    if s1 == s2 {
        return SetOutcome::open(Undecided::Tied);
    }

    let (winner, high, low) = if s1 > s2 {
        (Side::One, s1, s2)
    } else {
        (Side::Two, s2, s1)
    };
    let margin = high - low;

    match *rule {
        SetRule::Casual { .. } => SetOutcome::won(winner, margin),
        SetRule::Rally {
            target,
            decider_target,
            min_margin,
            ..
        } => {
            let needed = match role {
                SetRole::Regular => target,
                SetRole::Decider => decider_target,
            };
            if high >= needed && margin >= min_margin {
                SetOutcome::won(winner, margin)
            } else {
                SetOutcome::open(Undecided::Unfinished)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RALLY: SetRule = SetRule::Rally {
        target: 25,
        decider_target: 15,
        min_margin: 2,
        max_score: 99,
    };
    const CASUAL: SetRule = SetRule::Casual { cap: 21 };

    #[test]
    fn test_rally_regular_set() {
        let outcome = evaluate_set(Some(25), Some(20), SetRole::Regular, &RALLY);
        assert!(outcome.decided);
        assert_eq!(outcome.winner, Some(Side::One));
        assert_eq!(outcome.margin, Some(5));
    }

    #[test]
    fn test_rally_extended_set() {
        let outcome = evaluate_set(Some(26), Some(28), SetRole::Regular, &RALLY);
        assert!(outcome.decided);
        assert_eq!(outcome.winner, Some(Side::Two));
        assert_eq!(outcome.margin, Some(2));
    }

    #[test]
    fn test_rally_needs_two_point_lead() {
        let outcome = evaluate_set(Some(25), Some(24), SetRole::Regular, &RALLY);
        assert!(!outcome.decided);
        assert_eq!(outcome.undecided, Some(Undecided::Unfinished));
    }

    #[test]
    fn test_rally_needs_target() {
        let outcome = evaluate_set(Some(20), Some(10), SetRole::Regular, &RALLY);
        assert_eq!(outcome.undecided, Some(Undecided::Unfinished));
    }

    #[test]
    fn test_decider_plays_to_fifteen() {
        let outcome = evaluate_set(Some(9), Some(15), SetRole::Decider, &RALLY);
        assert!(outcome.decided);
        assert_eq!(outcome.winner, Some(Side::Two));

        let regular = evaluate_set(Some(9), Some(15), SetRole::Regular, &RALLY);
        assert!(!regular.decided);
    }

    #[test]
    fn test_tie_is_never_decided() {
        assert_eq!(
            evaluate_set(Some(21), Some(21), SetRole::Regular, &CASUAL).undecided,
            Some(Undecided::Tied)
        );
        assert_eq!(
            evaluate_set(Some(25), Some(25), SetRole::Regular, &RALLY).undecided,
            Some(Undecided::Tied)
        );
    }

    #[test]
    fn test_casual_any_distinct_scores() {
        let outcome = evaluate_set(Some(3), Some(4), SetRole::Regular, &CASUAL);
        assert!(outcome.decided);
        assert_eq!(outcome.winner, Some(Side::Two));
        assert_eq!(outcome.margin, Some(1));
    }

    #[test]
    fn test_casual_cap() {
        let outcome = evaluate_set(Some(22), Some(10), SetRole::Regular, &CASUAL);
        assert_eq!(outcome.undecided, Some(Undecided::OutOfRange));
    }

    #[test]
    fn test_blank_and_partial() {
        assert_eq!(
            evaluate_set(None, None, SetRole::Regular, &CASUAL).undecided,
            Some(Undecided::Blank)
        );
        assert_eq!(
            evaluate_set(Some(21), None, SetRole::Regular, &CASUAL).undecided,
            Some(Undecided::Partial)
        );
    }
}
