use super::types::{LadderData, StandingsRow, Team, TierKey, TierSlot, WeeklyResultRow, DATA_VERSION};
use super::LadderStore;
use crate::error::{LadderError, Result};
use crate::format::Position;
use atomic_write_file::AtomicWriteFile;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Get the default data file path (~/.config/tierladder/ladder.json)
pub fn default_data_path() -> anyhow::Result<PathBuf> {
    Ok(crate::config::get_config_dir()?.join("ladder.json"))
}

/// Load ladder data from a JSON file
///
/// If the file doesn't exist, returns an empty document.
/// If the file exists but has an unsupported version, returns an error.
pub fn load_ladder_data(path: &Path) -> anyhow::Result<LadderData> {
    use anyhow::Context;

    if !path.exists() {
        return Ok(LadderData::new());
    }

    let file = File::open(path)
        .with_context(|| format!("Failed to open ladder data file at {}", path.display()))?;

    let data: LadderData = serde_json::from_reader(file)
        .with_context(|| format!("Failed to load ladder data from {}", path.display()))?;

    if data.version != DATA_VERSION {
        anyhow::bail!("Unsupported ladder data version: {}", data.version);
    }

    Ok(data)
}

/// Save ladder data to a JSON file atomically
///
/// Creates the parent directory if it doesn't exist.
pub fn save_ladder_data(path: &Path, data: &LadderData) -> anyhow::Result<()> {
    use anyhow::Context;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.exists() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create data directory at {}", parent.display()))?;
        }
    }

    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;

    serde_json::to_writer_pretty(&mut file, data).context("Failed to serialize ladder data")?;

    file.commit().context("Failed to save ladder data")?;

    Ok(())
}

/// Store backed by a single JSON document.
///
/// Every call reloads the file; writes hold the lock across the whole
/// load, modify, save cycle.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read<T>(&self, f: impl FnOnce(&LadderData) -> T) -> Result<T> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| LadderError::Persistence("data file lock poisoned".to_string()))?;
        let data = load_ladder_data(&self.path).map_err(persistence)?;
        Ok(f(&data))
    }

    fn write<T>(&self, f: impl FnOnce(&mut LadderData) -> T) -> Result<T> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| LadderError::Persistence("data file lock poisoned".to_string()))?;
        let mut data = load_ladder_data(&self.path).map_err(persistence)?;
        let value = f(&mut data);
        save_ladder_data(&self.path, &data).map_err(persistence)?;
        Ok(value)
    }
}

fn persistence(err: anyhow::Error) -> LadderError {
    LadderError::Persistence(format!("{:#}", err))
}

impl LadderStore for FileStore {
    fn roster(&self, league: &str) -> Result<Vec<Team>> {
        self.read(|d| d.roster(league))
    }

    fn upsert_team(&self, league: &str, team: Team) -> Result<()> {
        self.write(|d| d.upsert_team(league, team))
    }

    fn tier_slot(&self, key: &TierKey) -> Result<Option<TierSlot>> {
        self.read(|d| d.tier_slot(key))
    }

    fn tier_slots(&self, league: &str, week: u32) -> Result<Vec<TierSlot>> {
        self.read(|d| d.tier_slots(league, week))
    }

    fn upsert_tier_slot(&self, slot: TierSlot) -> Result<()> {
        self.write(|d| d.upsert_tier_slot(slot))
    }

    fn assign_position(&self, key: &TierKey, position: Position, team_name: &str) -> Result<bool> {
        self.write(|d| d.assign_position(key, position, team_name))
    }

    fn clear_position(&self, key: &TierKey, position: Position) -> Result<bool> {
        self.write(|d| d.clear_position(key, position))
    }

    fn set_rank_override(&self, key: &TierKey, position: Position, rank: Option<u32>) -> Result<bool> {
        self.write(|d| d.set_rank_override(key, position, rank))
    }

    fn set_completed(&self, key: &TierKey, completed: bool) -> Result<bool> {
        self.write(|d| d.set_completed(key, completed))
    }

    fn weekly_results(&self, key: &TierKey) -> Result<Vec<WeeklyResultRow>> {
        self.read(|d| d.weekly_results(key))
    }

    fn league_results(&self, league: &str) -> Result<Vec<WeeklyResultRow>> {
        self.read(|d| d.league_results(league))
    }

    fn upsert_weekly_result(&self, row: WeeklyResultRow) -> Result<()> {
        self.write(|d| d.upsert_weekly_result(row))
    }

    fn delete_weekly_result(&self, key: &TierKey, team_name: &str) -> Result<()> {
        self.write(|d| d.delete_weekly_result(key, team_name))
    }

    fn standings(&self, league: &str) -> Result<Vec<StandingsRow>> {
        self.read(|d| d.standings(league))
    }

    fn standing(&self, league: &str, team_id: &str) -> Result<Option<StandingsRow>> {
        self.read(|d| d.standing(league, team_id))
    }

    fn upsert_standing(&self, row: StandingsRow) -> Result<()> {
        self.write(|d| d.upsert_standing(row))
    }

    fn recompute_current_positions(&self, league: &str) -> Result<()> {
        self.write(|d| d.recompute_current_positions(league))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::FormatId;
    use std::env;

    #[test]
    fn test_load_missing_file_returns_empty() {
        let temp_path = env::temp_dir().join("tierladder_test_missing.json");
        let _ = fs::remove_file(&temp_path);

        let data = load_ladder_data(&temp_path).unwrap();
        assert_eq!(data.version, 1);
        assert!(data.leagues.is_empty());
    }

    #[test]
    fn test_rejects_unknown_version() {
        let temp_path = env::temp_dir().join("tierladder_test_version.json");
        fs::write(&temp_path, r#"{"version": 7, "leagues": {}}"#).unwrap();

        let err = load_ladder_data(&temp_path).unwrap_err();
        assert!(err.to_string().contains("Unsupported ladder data version: 7"));

        let _ = fs::remove_file(&temp_path);
    }

    #[test]
    fn test_store_persists_between_instances() {
        let temp_path = env::temp_dir().join("tierladder_test_store.json");
        let _ = fs::remove_file(&temp_path);

        let store = FileStore::new(&temp_path);
        let mut slot = TierSlot::new("spring", 1, 1, FormatId::TwoTeamsElite);
        slot.teams.insert(Position::A, "Spikers".to_string());
        store.upsert_tier_slot(slot).unwrap();
        store
            .assign_position(&TierKey::new("spring", 1, 1), Position::B, "Diggers")
            .unwrap();

        let reopened = FileStore::new(&temp_path);
        let slot = reopened
            .tier_slot(&TierKey::new("spring", 1, 1))
            .unwrap()
            .unwrap();
        assert_eq!(slot.team_at(Position::A), Some("Spikers"));
        assert_eq!(slot.team_at(Position::B), Some("Diggers"));
        assert_eq!(slot.format, FormatId::TwoTeamsElite);

        let _ = fs::remove_file(&temp_path);
    }

    #[test]
    fn test_corrupt_file_is_a_persistence_error() {
        let temp_path = env::temp_dir().join("tierladder_test_corrupt.json");
        fs::write(&temp_path, "{ not json").unwrap();

        let store = FileStore::new(&temp_path);
        match store.roster("spring") {
            Err(LadderError::Persistence(msg)) => assert!(msg.contains("Failed to load ladder data")),
            other => panic!("expected persistence error, got {:?}", other),
        }

        let _ = fs::remove_file(&temp_path);
    }
}
