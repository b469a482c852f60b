use std::collections::{BTreeMap, HashSet};

use super::aggregate::{aggregate, SetScore, TierTally};
use crate::format::{FormatSpec, Position};

/// Validate a tier submission before anything is ranked or written.
/// Returns all validation errors at once (not just the first).
pub fn validate_submission(
    spec: &FormatSpec,
    teams: &BTreeMap<Position, String>,
    sets: &[SetScore],
) -> Result<TierTally, Vec<String>> {
    let mut errors = Vec::new();

    // Every label must carry a team
    for label in spec.labels {
        match teams.get(label) {
            Some(name) if !name.trim().is_empty() => {}
            _ => errors.push(format!("position {}: no team assigned", label)),
        }
    }

    for label in teams.keys() {
        if !spec.has_label(*label) {
            errors.push(format!(
                "position {}: not a position in format {}",
                label, spec.id
            ));
        }
    }

    let mut seen = HashSet::new();
    for (label, name) in teams {
        let key = name.trim().to_lowercase();
        if !key.is_empty() && !seen.insert(key) {
            errors.push(format!("position {}: team '{}' appears twice", label, name));
        }
    }

    let tally = aggregate(spec, sets);
    errors.extend(tally.problems.iter().cloned());

    if errors.is_empty() {
        Ok(tally)
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::FormatId;
    use Position::{A, B, C};

    fn teams(pairs: &[(Position, &str)]) -> BTreeMap<Position, String> {
        pairs.iter().map(|(p, n)| (*p, n.to_string())).collect()
    }

    #[test]
    fn test_valid_submission() {
        let spec = FormatId::TwoTeamsElite.spec();
        let sets = vec![
            SetScore::new(0, 25, 20),
            SetScore::new(0, 25, 22),
            SetScore::new(0, 25, 23),
        ];
        let tally = validate_submission(spec, &teams(&[(A, "Spikers"), (B, "Diggers")]), &sets).unwrap();
        assert_eq!(tally.stat(A).set_wins, 3);
    }

    #[test]
    fn test_collects_every_problem() {
        let spec = FormatId::ThreeTeamsSixSets.spec();
        let sets = vec![
            SetScore::new(0, 21, 21),
            SetScore::new(0, 21, 10),
            SetScore::new(1, 30, 10),
            SetScore::new(1, 21, 10),
            SetScore::new(2, 21, 10),
        ];
        let errors = validate_submission(spec, &teams(&[(A, "Spikers"), (B, "Diggers")]), &sets)
            .unwrap_err();
        assert_eq!(errors.len(), 4, "{:?}", errors);
        assert!(errors[0].contains("position C: no team assigned"));
        assert!(errors.iter().any(|e| e.contains("tied (21-21)")));
        assert!(errors.iter().any(|e| e.contains("score out of range (30-10)")));
        assert!(errors.iter().any(|e| e.contains("pairing 3 (B vs C) set 2: blank")));
    }

    #[test]
    fn test_foreign_label_and_duplicate_team() {
        let spec = FormatId::TwoTeamsFourSets.spec();
        let sets: Vec<SetScore> = (0..4).map(|_| SetScore::new(0, 21, 10)).collect();
        let errors = validate_submission(
            spec,
            &teams(&[(A, "Spikers"), (B, "spikers"), (C, "Diggers")]),
            &sets,
        )
        .unwrap_err();
        assert_eq!(errors.len(), 2, "{:?}", errors);
        assert!(errors[0].contains("not a position in format 2-teams-4-sets"));
        assert!(errors[1].contains("appears twice"));
    }

    #[test]
    fn test_blank_team_name_is_missing() {
        let spec = FormatId::TwoTeamsFourSets.spec();
        let sets: Vec<SetScore> = (0..4).map(|_| SetScore::new(0, 21, 10)).collect();
        let errors =
            validate_submission(spec, &teams(&[(A, "Spikers"), (B, "  ")]), &sets).unwrap_err();
        assert_eq!(errors, vec!["position B: no team assigned"]);
    }
}
