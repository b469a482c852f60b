use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Data file path; defaults to ~/.config/tierladder/ladder.json
    #[serde(default)]
    pub data_file: Option<String>,
    #[serde(default)]
    pub leagues: Vec<LeagueConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LeagueConfig {
    pub id: String,
    pub name: Option<String>,
    /// Elite formats move teams across tiers only in movement weeks.
    #[serde(default)]
    pub movement_week: bool,
}

impl Config {
    pub fn league(&self, id: &str) -> Option<&LeagueConfig> {
        self.leagues.iter().find(|l| l.id == id)
    }

    /// Movement-week flag for a league; leagues not listed default to off.
    pub fn movement_week(&self, id: &str) -> bool {
        self.league(id).map(|l| l.movement_week).unwrap_or(false)
    }
}

/// Validate configuration at startup.
/// Returns all validation errors at once (not just the first).
pub fn validate_config(config: &Config) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if let Some(ref data_file) = config.data_file {
        if data_file.trim().is_empty() {
            errors.push("data_file: must not be empty".to_string());
        }
    }

    let mut seen = HashSet::new();
    for (i, league) in config.leagues.iter().enumerate() {
        if league.id.trim().is_empty() {
            errors.push(format!("leagues[{}].id: must not be empty", i));
        } else if !seen.insert(league.id.as_str()) {
            errors.push(format!("leagues[{}].id: duplicate league '{}'", i, league.id));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
