use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, PoisonError};

use crate::engine::{
    league_points, plan_movement, rank_tier, tier_offset, validate_submission, MovementAssignment,
    MovementContext, MovementPlan, SetScore, TeamMatchStat, TierRanking, TierTally, WeeklyPoints,
};
use crate::error::{LadderError, Result};
use crate::format::{FormatSpec, Position};
use crate::standings::{update_standings, StandingsUpdate};
use crate::store::{LadderStore, TierKey, TierSlot, WeeklyResultRow};

/// One tier's scores as submitted by a scorekeeper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Submission {
    pub league: String,
    pub week: u32,
    pub tier: u32,
    pub sets: Vec<SetScore>,
    /// Spare players per position, recorded for audit only.
    #[serde(default)]
    pub spares: BTreeMap<Position, Vec<String>>,
}

impl Submission {
    pub fn key(&self) -> TierKey {
        TierKey::new(self.league.clone(), self.week, self.tier)
    }
}

/// A team's scored week within its tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamResult {
    pub position: Position,
    pub team_name: String,
    pub rank: usize,
    pub stat: TeamMatchStat,
    pub points: WeeklyPoints,
}

/// Everything computed for a submission, before any write.
#[derive(Debug, Clone)]
pub struct TierEvaluation {
    pub slot: TierSlot,
    pub spec: &'static FormatSpec,
    pub tally: TierTally,
    pub ranking: TierRanking,
    pub results: Vec<TeamResult>,
    pub plan: MovementPlan,
    pub tier_offset: i64,
}

#[derive(Debug, Clone)]
pub struct SubmissionOutcome {
    pub evaluation: TierEvaluation,
    /// Movement assignments written to next week's slots.
    pub written: Vec<MovementAssignment>,
    /// Next-week labels emptied because an earlier submission put one of
    /// this tier's teams there.
    pub cleared: Vec<(TierKey, Position)>,
    pub standings: StandingsUpdate,
    /// Every item skipped along the way, with the reason.
    pub skipped: Vec<String>,
}

/// One mutex per (league, week, tier).
#[derive(Debug, Default)]
pub struct SubmissionLocks {
    locks: Mutex<HashMap<TierKey, Arc<Mutex<()>>>>,
}

impl SubmissionLocks {
    pub fn lock_for(&self, key: &TierKey) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.entry(key.clone()).or_default().clone()
    }
}

/// The per-submission pipeline over a store.
#[derive(Debug)]
pub struct Ladder<S> {
    store: S,
    locks: SubmissionLocks,
}

impl<S: LadderStore> Ladder<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            locks: SubmissionLocks::default(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Validate, rank, score and plan movement without writing anything.
    pub fn evaluate(&self, submission: &Submission, movement_week: bool) -> Result<TierEvaluation> {
        let key = submission.key();
        let slot = self
            .store
            .tier_slot(&key)?
            .ok_or_else(|| LadderError::UnknownTier {
                league: key.league.clone(),
                week: key.week,
                tier: key.tier,
            })?;
        let spec = slot.format.spec();

        let tally = validate_submission(spec, &slot.teams, &submission.sets)
            .map_err(LadderError::Validation)?;
        let ranking = rank_tier(spec, &tally);

        let week_slots = self.store.tier_slots(&key.league, key.week)?;
        let top = week_slots.iter().map(|s| s.tier).min().unwrap_or(key.tier);
        let bottom = week_slots.iter().map(|s| s.tier).max().unwrap_or(key.tier);
        let offset = tier_offset(key.tier, bottom);

        let results = ranking
            .order
            .iter()
            .enumerate()
            .map(|(i, &position)| {
                let stat = tally.stat(position);
                TeamResult {
                    position,
                    team_name: slot.team_at(position).unwrap_or_default().to_string(),
                    rank: i + 1,
                    stat,
                    points: league_points(spec, i + 1, stat.set_wins, offset),
                }
            })
            .collect();

        let plan = plan_movement(
            spec,
            &ranking,
            &tally,
            &slot.teams,
            MovementContext {
                week: key.week,
                tier: key.tier,
                is_top: key.tier == top,
                is_bottom: key.tier == bottom,
                movement_week,
            },
        );

        Ok(TierEvaluation {
            slot,
            spec,
            tally,
            ranking,
            results,
            plan,
            tier_offset: offset,
        })
    }

    /// Run the full pipeline for one tier.
    ///
    /// Validation failures return before any write. Submissions for the same
    /// tier are serialized; resubmitting identical scores leaves standings
    /// unchanged.
    pub fn submit(&self, submission: &Submission, movement_week: bool) -> Result<SubmissionOutcome> {
        let key = submission.key();
        let lock = self.locks.lock_for(&key);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let evaluation = self.evaluate(submission, movement_week)?;
        let mut skipped = evaluation.plan.skipped.clone();

        for ignored in &evaluation.tally.ignored {
            crate::buffered_eprintln!("Warning: {}: {}", key, ignored);
        }

        let cleared = self.clear_stale_placements(&key, &evaluation)?;

        let mut written = Vec::new();
        for assignment in &evaluation.plan.assignments {
            match self.write_assignment(&key, assignment)? {
                None => written.push(assignment.clone()),
                Some(reason) => {
                    crate::buffered_eprintln!("Warning: {}", reason);
                    skipped.push(reason);
                }
            }
        }

        let rows = self.result_rows(submission, &evaluation);
        let standings = update_standings(&self.store, &key, rows)?;
        skipped.extend(standings.skipped.iter().cloned());

        self.store.set_completed(&key, true)?;

        Ok(SubmissionOutcome {
            evaluation,
            written,
            cleared,
            standings,
            skipped,
        })
    }

    fn clear_stale_placements(
        &self,
        key: &TierKey,
        evaluation: &TierEvaluation,
    ) -> Result<Vec<(TierKey, Position)>> {
        let ours: Vec<String> = evaluation
            .slot
            .teams
            .values()
            .map(|name| name.trim().to_lowercase())
            .filter(|name| !name.is_empty())
            .collect();
        let mut cleared = Vec::new();

        for slot in self.store.tier_slots(&key.league, key.week + 1)? {
            for (&position, name) in &slot.teams {
                if !ours.contains(&name.trim().to_lowercase()) {
                    continue;
                }
                let planned = evaluation.plan.assignments.iter().any(|a| {
                    a.target_tier == slot.tier
                        && a.target_position == position
                        && a.team_name.trim().eq_ignore_ascii_case(name.trim())
                });
                if !planned && self.store.clear_position(&slot.key(), position)? {
                    cleared.push((slot.key(), position));
                }
            }
        }
        Ok(cleared)
    }

    /// Returns the reason when the assignment cannot be placed.
    fn write_assignment(&self, from: &TierKey, assignment: &MovementAssignment) -> Result<Option<String>> {
        let target = TierKey::new(
            from.league.clone(),
            assignment.target_week,
            assignment.target_tier,
        );
        let Some(slot) = self.store.tier_slot(&target)? else {
            return Ok(Some(format!(
                "{}: no slot scheduled for {}, '{}' not placed",
                from, target, assignment.team_name
            )));
        };
        if !slot.format.spec().has_label(assignment.target_position) {
            return Ok(Some(format!(
                "{}: {} ({}) has no position {}, '{}' not placed",
                from, target, slot.format, assignment.target_position, assignment.team_name
            )));
        }
        if !self
            .store
            .assign_position(&target, assignment.target_position, &assignment.team_name)?
        {
            return Ok(Some(format!(
                "{}: slot {} disappeared, '{}' not placed",
                from, target, assignment.team_name
            )));
        }
        Ok(None)
    }

    fn result_rows(&self, submission: &Submission, evaluation: &TierEvaluation) -> Vec<WeeklyResultRow> {
        let submitted_at = Utc::now();
        let separators: Vec<String> = evaluation
            .ranking
            .separators
            .iter()
            .map(ToString::to_string)
            .collect();

        evaluation
            .results
            .iter()
            .map(|result| WeeklyResultRow {
                league: submission.league.clone(),
                week: submission.week,
                tier: submission.tier,
                team_name: result.team_name.clone(),
                rank: result.rank as u32,
                league_points: result.points.total(),
                wins: result.stat.set_wins,
                losses: result.stat.set_losses,
                differential: result.stat.differential(),
                audit: serde_json::json!({
                    "format": evaluation.spec.id,
                    "position": result.position,
                    "sets": submission.sets,
                    "spares": submission.spares.get(&result.position).cloned().unwrap_or_default(),
                    "decided_by": separators,
                    "ignored_sets": evaluation.tally.ignored,
                }),
                submitted_at,
            })
            .collect()
    }
}
