use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::aggregate::TierTally;
use super::ranking::TierRanking;
use crate::format::{FormatSpec, MoveDir, MovementOrder, Position};

/// Where the tier being scored sits in the ladder, and whether this is a
/// movement week for elite formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovementContext {
    pub week: u32,
    pub tier: u32,
    pub is_top: bool,
    pub is_bottom: bool,
    pub movement_week: bool,
}

/// Next-week placement for one team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementAssignment {
    pub team_name: String,
    pub from: Position,
    pub target_week: u32,
    pub target_tier: u32,
    pub target_position: Position,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MovementPlan {
    pub assignments: Vec<MovementAssignment>,
    /// Teams that could not be placed, with the reason.
    pub skipped: Vec<String>,
}

/// The tier's teams in the order the movement table is written for.
///
/// Returns `None` when a head-to-head format's final courts are missing.
fn movement_order(spec: &FormatSpec, ranking: &TierRanking, tally: &TierTally) -> Option<Vec<Position>> {
    match spec.movement.order {
        MovementOrder::Rank => Some(ranking.order.clone()),
        MovementOrder::FinalCourts => {
            let mut order = Vec::with_capacity(spec.team_count());
            for court in tally.final_courts() {
                order.push(court.winner?);
                order.push(court.loser()?);
            }
            (order.len() == spec.team_count()).then_some(order)
        }
    }
}

/// Map a resolved tier to next week's (tier, position) for every team.
///
/// `teams` maps this week's labels to team names; a label without a team is
/// skipped and reported rather than failing the plan.
pub fn plan_movement(
    spec: &FormatSpec,
    ranking: &TierRanking,
    tally: &TierTally,
    teams: &BTreeMap<Position, String>,
    ctx: MovementContext,
) -> MovementPlan {
    let mut plan = MovementPlan::default();
    let topology = &spec.movement;

    let Some(order) = movement_order(spec, ranking, tally) else {
        let reason = format!(
            "tier {}: final courts are not decided, no movement planned",
            ctx.tier
        );
        crate::buffered_eprintln!("Warning: {}", reason);
        plan.skipped.push(reason);
        return plan;
    };

    let gated = spec.elite && !ctx.movement_week;

    for (index, (&from, mv)) in order.iter().zip(topology.moves).enumerate() {
        let (target_tier, target_position) = match (gated, topology.hold) {
            (true, Some(hold)) => (ctx.tier, hold[index]),
            _ => match mv.dir {
                MoveDir::Up if ctx.is_top => (ctx.tier, topology.relegation_slot),
                MoveDir::Up => (ctx.tier - 1, mv.slot),
                MoveDir::Down if ctx.is_bottom => (ctx.tier, topology.promotion_slot),
                MoveDir::Down => (ctx.tier + 1, mv.slot),
                MoveDir::Stay => (ctx.tier, mv.slot),
            },
        };

        match teams.get(&from).filter(|name| !name.trim().is_empty()) {
            Some(name) => plan.assignments.push(MovementAssignment {
                team_name: name.clone(),
                from,
                target_week: ctx.week + 1,
                target_tier,
                target_position,
            }),
            None => {
                let reason = format!(
                    "week {} tier {} position {}: no team recorded, not moved",
                    ctx.week, ctx.tier, from
                );
                crate::buffered_eprintln!("Warning: {}", reason);
                plan.skipped.push(reason);
            }
        }
    }

    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::aggregate::{aggregate, SetScore};
    use crate::engine::ranking::rank_tier;
    use crate::format::{FormatId, FormatSpec};
    use Position::{A, B, C, D, E, F};

    fn names(spec: &FormatSpec) -> BTreeMap<Position, String> {
        spec.labels
            .iter()
            .map(|&p| (p, format!("Team {}", p)))
            .collect()
    }

    fn ctx(tier: u32, is_top: bool, is_bottom: bool, movement_week: bool) -> MovementContext {
        MovementContext {
            week: 3,
            tier,
            is_top,
            is_bottom,
            movement_week,
        }
    }

    fn plan(id: FormatId, sets: &[SetScore], ctx: MovementContext) -> MovementPlan {
        let spec = id.spec();
        let tally = aggregate(spec, sets);
        assert!(tally.is_complete(), "{:?}", tally.problems);
        let ranking = rank_tier(spec, &tally);
        plan_movement(spec, &ranking, &tally, &names(spec), ctx)
    }

    fn target(plan: &MovementPlan, from: Position) -> (u32, Position) {
        let a = plan
            .assignments
            .iter()
            .find(|a| a.from == from)
            .expect("assignment for position");
        (a.target_tier, a.target_position)
    }

    fn b_sweeps_elite() -> Vec<SetScore> {
        vec![
            SetScore::new(0, 20, 25),
            SetScore::new(0, 20, 25),
            SetScore::new(0, 20, 25),
        ]
    }

    fn winning_sets(id: FormatId) -> Vec<SetScore> {
        // Side 1 wins every set of every pairing.
        let spec = id.spec();
        let (score, lose) = match spec.set_rule {
            crate::format::SetRule::Rally { target, .. } => (target, target - 10),
            crate::format::SetRule::Casual { cap } => (cap.min(21), 10),
        };
        let per_pairing = spec.series.wins_needed().unwrap_or(spec.series.max_sets() as u32);
        (0..spec.topology.pairing_count())
            .flat_map(|p| (0..per_pairing).map(move |_| SetScore::new(p, score, lose)))
            .collect()
    }

    #[test]
    fn test_two_team_middle_tier() {
        let plan = plan(FormatId::TwoTeamsBestOfFive, &b_sweeps_elite(), ctx(2, false, false, false));
        assert_eq!(target(&plan, B), (1, B));
        assert_eq!(target(&plan, A), (3, A));
        assert!(plan.assignments.iter().all(|a| a.target_week == 4));
        assert_eq!(plan.assignments[0].team_name, "Team B");
    }

    #[test]
    fn test_three_team_topology() {
        let sets = vec![
            SetScore::new(0, 21, 10),
            SetScore::new(0, 21, 12),
            SetScore::new(1, 10, 21),
            SetScore::new(1, 12, 21),
            SetScore::new(2, 21, 15),
            SetScore::new(2, 15, 21),
        ];
        let plan = plan(FormatId::ThreeTeamsSixSets, &sets, ctx(2, false, false, false));
        // C winner, A neutral, B loser
        assert_eq!(target(&plan, C), (1, C));
        assert_eq!(target(&plan, A), (2, B));
        assert_eq!(target(&plan, B), (3, A));
    }

    #[test]
    fn test_four_team_uses_final_courts() {
        let sets = vec![
            SetScore::new(0, 21, 15), // A beats B
            SetScore::new(1, 21, 19), // C beats D
            SetScore::new(2, 17, 21), // C beats A
            SetScore::new(3, 21, 11), // B beats D
        ];
        let plan = plan(FormatId::FourTeamsHeadToHead, &sets, ctx(2, false, false, false));
        assert_eq!(target(&plan, C), (1, D));
        assert_eq!(target(&plan, A), (2, C));
        assert_eq!(target(&plan, B), (2, B));
        assert_eq!(target(&plan, D), (3, A));
    }

    #[test]
    fn test_six_team_topology() {
        let sets = vec![
            SetScore::new(0, 21, 11), // A beats B
            SetScore::new(1, 16, 21), // D beats C
            SetScore::new(2, 21, 16), // E beats F
            SetScore::new(3, 21, 16), // A beats D
            SetScore::new(4, 21, 16), // B beats E
            SetScore::new(5, 21, 11), // C beats F
        ];
        // Order: A, C, D, E, B, F
        let plan = plan(FormatId::SixTeamsHeadToHead, &sets, ctx(3, false, false, false));
        assert_eq!(target(&plan, A), (2, F));
        assert_eq!(target(&plan, C), (3, B));
        assert_eq!(target(&plan, D), (3, C));
        assert_eq!(target(&plan, E), (3, D));
        assert_eq!(target(&plan, B), (3, E));
        assert_eq!(target(&plan, F), (4, A));
    }

    #[test]
    fn test_saturation_for_every_format() {
        for id in FormatId::ALL {
            let spec = id.spec();
            let sets = winning_sets(id);
            let tally = aggregate(spec, &sets);
            assert!(tally.is_complete(), "{}: {:?}", id, tally.problems);
            let ranking = rank_tier(spec, &tally);
            let first = ranking.order[0];
            let last = ranking.order[spec.team_count() - 1];

            let top = plan_movement(spec, &ranking, &tally, &names(spec), ctx(1, true, false, true));
            let bottom =
                plan_movement(spec, &ranking, &tally, &names(spec), ctx(5, false, true, true));

            let top_first = top.assignments.iter().find(|a| a.from == first).unwrap();
            assert_eq!(top_first.target_tier, 1, "{}", id);
            let bottom_last = bottom.assignments.iter().find(|a| a.from == last).unwrap();
            assert_eq!(bottom_last.target_tier, 5, "{}", id);

            // Next-week labels within the tier stay distinct.
            let mut stays: Vec<Position> = top
                .assignments
                .iter()
                .filter(|a| a.target_tier == 1)
                .map(|a| a.target_position)
                .collect();
            stays.sort();
            stays.dedup();
            assert_eq!(
                stays.len(),
                top.assignments.iter().filter(|a| a.target_tier == 1).count(),
                "{}",
                id
            );
        }
    }

    #[test]
    fn test_single_tier_everyone_stays() {
        let sets = winning_sets(FormatId::ThreeTeamsSixSets);
        let plan = plan(FormatId::ThreeTeamsSixSets, &sets, ctx(1, true, true, false));
        assert!(plan.assignments.iter().all(|a| a.target_tier == 1));
        let mut slots: Vec<Position> = plan.assignments.iter().map(|a| a.target_position).collect();
        slots.sort();
        assert_eq!(slots, vec![A, B, C]);
    }

    #[test]
    fn test_movement_week_gate_changes_only_tier() {
        let off = plan(FormatId::TwoTeamsElite, &b_sweeps_elite(), ctx(2, false, false, false));
        let on = plan(FormatId::TwoTeamsElite, &b_sweeps_elite(), ctx(2, false, false, true));

        assert_eq!(target(&off, B), (2, A));
        assert_eq!(target(&on, B), (1, A));
        assert_eq!(target(&off, A), (2, B));
        assert_eq!(target(&on, A), (3, B));

        for (a, b) in off.assignments.iter().zip(&on.assignments) {
            assert_eq!(a.from, b.from);
            assert_eq!(a.team_name, b.team_name);
            assert_eq!(a.target_position, b.target_position);
        }
        assert_ne!(target(&off, B).0, target(&on, B).0);
    }

    #[test]
    fn test_gate_ignored_for_non_elite() {
        let plan = plan(FormatId::TwoTeamsBestOfFive, &b_sweeps_elite(), ctx(2, false, false, false));
        assert_eq!(target(&plan, B).0, 1);
    }

    #[test]
    fn test_missing_team_name_is_skipped() {
        let spec = FormatId::TwoTeamsElite.spec();
        let tally = aggregate(spec, &b_sweeps_elite());
        let ranking = rank_tier(spec, &tally);
        let mut teams = names(spec);
        teams.remove(&A);
        let plan = plan_movement(spec, &ranking, &tally, &teams, ctx(2, false, false, true));
        assert_eq!(plan.assignments.len(), 1);
        assert_eq!(plan.assignments[0].from, B);
        assert_eq!(plan.skipped.len(), 1);
        assert!(plan.skipped[0].contains("position A"));
    }
}
