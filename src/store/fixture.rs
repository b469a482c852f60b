use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

use super::types::{Team, TierSlot};
use super::LadderStore;
use crate::format::{FormatId, Position};

/// Pre-generated schedule for one league: the roster and its tier slots.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Fixture {
    pub league: String,
    #[serde(default)]
    pub roster: Vec<Team>,
    #[serde(default)]
    pub slots: Vec<FixtureSlot>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FixtureSlot {
    pub week: u32,
    pub tier: u32,
    pub format: FormatId,
    #[serde(default)]
    pub teams: BTreeMap<Position, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub teams: usize,
    pub slots: usize,
    pub warnings: Vec<String>,
}

/// Load a fixture from a YAML file
pub fn load_fixture(path: &Path) -> Result<Fixture> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read fixture file at {}", path.display()))?;

    serde_saphyr::from_str(&content)
        .with_context(|| format!("Failed to parse fixture: invalid YAML in {}", path.display()))
}

/// Check a fixture before anything is written.
/// Returns all validation errors at once (not just the first).
pub fn validate_fixture(fixture: &Fixture) -> std::result::Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if fixture.league.trim().is_empty() {
        errors.push("league: must not be empty".to_string());
    }

    let mut ids = HashSet::new();
    let mut names = HashSet::new();
    for (i, team) in fixture.roster.iter().enumerate() {
        if team.id.trim().is_empty() || team.name.trim().is_empty() {
            errors.push(format!("roster[{}]: id and name are required", i));
        }
        if !ids.insert(team.id.trim()) {
            errors.push(format!("roster[{}]: duplicate team id '{}'", i, team.id));
        }
        if !names.insert(team.name.trim().to_lowercase()) {
            errors.push(format!("roster[{}]: duplicate team name '{}'", i, team.name));
        }
    }

    let mut keys = HashSet::new();
    for (i, slot) in fixture.slots.iter().enumerate() {
        if slot.week == 0 || slot.tier == 0 {
            errors.push(format!("slots[{}]: week and tier are numbered from 1", i));
        }
        if !keys.insert((slot.week, slot.tier)) {
            errors.push(format!(
                "slots[{}]: week {} tier {} is defined twice",
                i, slot.week, slot.tier
            ));
        }
        let spec = slot.format.spec();
        for label in slot.teams.keys() {
            if !spec.has_label(*label) {
                errors.push(format!(
                    "slots[{}].teams.{}: not a position in format {}",
                    i, label, slot.format
                ));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Write a fixture's roster and slots into `store`.
///
/// Slot teams missing from the roster are imported anyway and reported as
/// warnings; their results will not reach the standings.
pub fn import_fixture<S: LadderStore + ?Sized>(store: &S, fixture: &Fixture) -> Result<ImportSummary> {
    if let Err(errors) = validate_fixture(fixture) {
        anyhow::bail!("Invalid fixture:\n  - {}", errors.join("\n  - "));
    }

    let league = fixture.league.trim();
    let mut summary = ImportSummary::default();

    for team in &fixture.roster {
        store
            .upsert_team(league, team.clone())
            .with_context(|| format!("Failed to import team '{}'", team.name))?;
        summary.teams += 1;
    }

    let roster: HashSet<String> = store
        .roster(league)?
        .into_iter()
        .map(|t| t.name.trim().to_lowercase())
        .collect();

    for slot in &fixture.slots {
        for (position, name) in &slot.teams {
            if !roster.contains(&name.trim().to_lowercase()) {
                let warning = format!(
                    "week {} tier {} position {}: '{}' is not on the {} roster",
                    slot.week, slot.tier, position, name, league
                );
                crate::buffered_eprintln!("Warning: {}", warning);
                summary.warnings.push(warning);
            }
        }

        let mut tier_slot = TierSlot::new(league, slot.week, slot.tier, slot.format);
        tier_slot.teams = slot.teams.clone();
        store
            .upsert_tier_slot(tier_slot)
            .with_context(|| format!("Failed to import week {} tier {}", slot.week, slot.tier))?;
        summary.slots += 1;
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, TierKey};

    const FIXTURE: &str = r#"
league: spring
roster:
  - id: t1
    name: Spikers
  - id: t2
    name: Diggers
  - id: t3
    name: Blockers
slots:
  - week: 1
    tier: 1
    format: 2-teams-elite
    teams:
      A: Spikers
      B: Diggers
  - week: 1
    tier: 2
    format: 2-teams-elite
    teams:
      A: Blockers
      B: Ghosts
  - week: 2
    tier: 1
    format: 2-teams-elite
"#;

    #[test]
    fn test_parse_fixture_yaml() {
        let fixture: Fixture = serde_saphyr::from_str(FIXTURE).unwrap();
        assert_eq!(fixture.league, "spring");
        assert_eq!(fixture.roster.len(), 3);
        assert_eq!(fixture.slots[0].format, FormatId::TwoTeamsElite);
        assert_eq!(fixture.slots[0].teams.get(&Position::B).unwrap(), "Diggers");
        assert!(fixture.slots[2].teams.is_empty());
    }

    #[test]
    fn test_import_writes_roster_and_slots() {
        let fixture: Fixture = serde_saphyr::from_str(FIXTURE).unwrap();
        let store = MemoryStore::new();
        let summary = import_fixture(&store, &fixture).unwrap();

        assert_eq!(summary.teams, 3);
        assert_eq!(summary.slots, 3);
        assert_eq!(summary.warnings.len(), 1);
        assert!(summary.warnings[0].contains("'Ghosts'"));

        let slot = store.tier_slot(&TierKey::new("spring", 1, 2)).unwrap().unwrap();
        assert_eq!(slot.team_at(Position::A), Some("Blockers"));
        assert!(!slot.completed);
        assert_eq!(store.tier_slots("spring", 2).unwrap().len(), 1);
    }

    #[test]
    fn test_invalid_fixture_lists_every_problem() {
        let yaml = r#"
league: spring
roster:
  - id: t1
    name: Spikers
  - id: t1
    name: spikers
slots:
  - week: 0
    tier: 1
    format: 2-teams-4-sets
    teams:
      C: Spikers
"#;
        let fixture: Fixture = serde_saphyr::from_str(yaml).unwrap();
        let errors = validate_fixture(&fixture).unwrap_err();
        assert_eq!(errors.len(), 4, "{:?}", errors);

        let store = MemoryStore::new();
        assert!(import_fixture(&store, &fixture).is_err());
        assert!(store.roster("spring").unwrap().is_empty());
    }

    #[test]
    fn test_unknown_format_rejected_at_parse() {
        let yaml = r#"
league: spring
slots:
  - week: 1
    tier: 1
    format: 5-teams-chaos
"#;
        assert!(serde_saphyr::from_str::<Fixture>(yaml).is_err());
    }
}
