use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Instant;

use tierladder::store::{FileStore, LadderStore};
use tierladder::{LadderError, Submission};

const EXIT_SUCCESS: i32 = 0;
const EXIT_VALIDATION: i32 = 1;
const EXIT_DATA: i32 = 2;
const EXIT_CONFIG: i32 = 4;

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the registered tier formats
    Formats,
    /// Load a league roster and its tier slots from a YAML fixture
    Import {
        /// Path to the fixture file
        fixture: PathBuf,
    },
    /// Score one tier: rank, award points, move teams, update standings
    Submit {
        /// Path to the submission file (YAML)
        submission: PathBuf,
        /// Validate and show the result without writing anything
        #[arg(long)]
        dry_run: bool,
        /// Treat this as a movement week even if the config says otherwise
        #[arg(long, conflicts_with = "no_movement_week")]
        movement_week: bool,
        /// Keep teams in their tiers this run even if the config enables movement
        #[arg(long)]
        no_movement_week: bool,
    },
    /// Show season standings for a league
    Standings {
        #[arg(long)]
        league: String,
    },
    /// Show elite weekly rank history for a league
    Ranks {
        #[arg(long)]
        league: String,
        #[arg(long)]
        through_week: u32,
    },
    /// Add a manual adjustment to a team's standings
    Adjust {
        #[arg(long)]
        league: String,
        /// Team id or name
        #[arg(long)]
        team: String,
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        wins: i64,
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        losses: i64,
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        points: i64,
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        diff: i64,
    },
}

#[derive(Parser, Debug)]
#[command(name = "tierladder")]
#[command(about = "Promotion/relegation ladder for tiered team leagues", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/tierladder/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Path to the ladder data file (defaults to ~/.config/tierladder/ladder.json)
    #[arg(short, long, global = true)]
    data: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

fn exit_code(err: &LadderError) -> i32 {
    match err {
        LadderError::Validation(_) | LadderError::UnknownFormat(_) => EXIT_VALIDATION,
        LadderError::UnknownTier { .. }
        | LadderError::UnknownTeam { .. }
        | LadderError::Persistence(_) => EXIT_DATA,
    }
}

fn fail(err: LadderError) -> ! {
    eprintln!("Error: {}", err);
    if err.is_retryable() {
        eprintln!("No partial totals were kept. Run the same command again to retry.");
    }
    std::process::exit(exit_code(&err));
}

fn main() {
    let cli = Cli::parse();
    let start_time = Instant::now();
    let use_colors = tierladder::output::should_use_colors();

    if let Commands::Formats = cli.command {
        println!("{}", tierladder::output::format_formats(use_colors));
        std::process::exit(EXIT_SUCCESS);
    }

    // Load config
    let config_path = cli.config.map(PathBuf::from);
    let config = match tierladder::config::load_config(config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    if let Err(errors) = tierladder::config::validate_config(&config) {
        eprintln!("Config errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        std::process::exit(EXIT_CONFIG);
    }

    if cli.verbose {
        eprintln!("Loaded {} leagues from config", config.leagues.len());
        for league in &config.leagues {
            eprintln!(
                "  {}: {} (movement week: {})",
                league.id,
                league.name.as_deref().unwrap_or("(unnamed)"),
                league.movement_week
            );
        }
    }

    let data_path = match cli.data.or_else(|| config.data_file.clone()) {
        Some(p) => PathBuf::from(p),
        None => match tierladder::store::default_data_path() {
            Ok(p) => p,
            Err(e) => {
                eprintln!("Config error: {:#}", e);
                std::process::exit(EXIT_CONFIG);
            }
        },
    };

    if cli.verbose {
        eprintln!("Using data file {}", data_path.display());
    }

    let store = FileStore::new(data_path);

    match cli.command {
        Commands::Formats => {}
        Commands::Import { fixture } => {
            let fixture = match tierladder::store::load_fixture(&fixture) {
                Ok(f) => f,
                Err(e) => {
                    eprintln!("Fixture error: {:#}", e);
                    std::process::exit(EXIT_VALIDATION);
                }
            };
            if let Err(errors) = tierladder::store::fixture::validate_fixture(&fixture) {
                eprintln!("Fixture errors:");
                for error in errors {
                    eprintln!("  - {}", error);
                }
                std::process::exit(EXIT_VALIDATION);
            }
            match tierladder::store::import_fixture(&store, &fixture) {
                Ok(summary) => {
                    println!(
                        "Imported {} teams and {} tier slots into league {}",
                        summary.teams, summary.slots, fixture.league
                    );
                }
                Err(e) => {
                    eprintln!("Import failed: {:#}", e);
                    std::process::exit(EXIT_DATA);
                }
            }
        }
        Commands::Submit {
            submission,
            dry_run,
            movement_week,
            no_movement_week,
        } => {
            let submission = match load_submission(&submission) {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("Submission error: {:#}", e);
                    std::process::exit(EXIT_VALIDATION);
                }
            };
            let movement_week = resolve_movement_week(
                movement_week,
                no_movement_week,
                config.movement_week(&submission.league),
            );
            if cli.verbose {
                eprintln!(
                    "Scoring {} week {} tier {} ({} sets, movement week: {})",
                    submission.league,
                    submission.week,
                    submission.tier,
                    submission.sets.len(),
                    movement_week
                );
            }

            let ladder = tierladder::Ladder::new(store);
            if dry_run {
                match ladder.evaluate(&submission, movement_week) {
                    Ok(evaluation) => {
                        println!("{}", tierladder::output::format_tier_result(&evaluation, use_colors));
                        println!("\n(dry run: nothing written)");
                    }
                    Err(e) => fail(e),
                }
            } else {
                tierladder::stderr_buffer::activate();
                let result = ladder.submit(&submission, movement_week);
                let warnings = tierladder::stderr_buffer::drain();
                match result {
                    Ok(outcome) => {
                        println!(
                            "{}",
                            tierladder::output::format_tier_result(&outcome.evaluation, use_colors)
                        );
                        if cli.verbose {
                            eprintln!(
                                "Wrote {} placements, updated {} standings rows",
                                outcome.written.len(),
                                outcome.standings.applied.len()
                            );
                        }
                    }
                    Err(e) => {
                        for warning in &warnings {
                            eprintln!("{}", warning);
                        }
                        fail(e);
                    }
                }
                for warning in warnings {
                    eprintln!("{}", warning);
                }
            }
        }
        Commands::Standings { league } => match store.standings(&league) {
            Ok(rows) => println!("{}", tierladder::output::format_standings(&rows, use_colors)),
            Err(e) => fail(e),
        },
        Commands::Ranks {
            league,
            through_week,
        } => match tierladder::history::rank_history(&store, &league, through_week) {
            Ok(history) => println!("{}", tierladder::output::format_rank_history(&history, use_colors)),
            Err(e) => fail(e),
        },
        Commands::Adjust {
            league,
            team,
            wins,
            losses,
            points,
            diff,
        } => {
            let team_id = match resolve_team_id(&store, &league, &team) {
                Ok(id) => id,
                Err(e) => fail(e),
            };
            let adjustment = tierladder::standings::Adjustment {
                wins,
                losses,
                points,
                differential: diff,
            };
            match tierladder::standings::adjust(&store, &league, &team_id, adjustment) {
                Ok(row) => println!(
                    "{}: {} pts ({} manual), position {}",
                    row.team_name,
                    row.total_points(),
                    row.manual_points_adj,
                    row.current_position
                        .map(|p| p.to_string())
                        .unwrap_or_else(|| "-".to_string())
                ),
                Err(e) => fail(e),
            }
        }
    }

    if cli.verbose {
        eprintln!("Done in {:?}", start_time.elapsed());
    }

    std::process::exit(EXIT_SUCCESS);
}

/// Command-line flags win over the league's configured gate.
fn resolve_movement_week(force_on: bool, force_off: bool, configured: bool) -> bool {
    if force_off {
        false
    } else {
        force_on || configured
    }
}

fn load_submission(path: &std::path::Path) -> anyhow::Result<Submission> {
    use anyhow::Context;

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read submission file at {}", path.display()))?;
    serde_saphyr::from_str(&content)
        .with_context(|| format!("Failed to parse submission: invalid YAML in {}", path.display()))
}

/// Accept either a roster id or a team name.
fn resolve_team_id(store: &FileStore, league: &str, team: &str) -> tierladder::Result<String> {
    if store.roster(league)?.iter().any(|t| t.id == team) {
        return Ok(team.to_string());
    }
    store
        .find_team(league, team)?
        .map(|t| t.id)
        .ok_or_else(|| LadderError::UnknownTeam {
            league: league.to_string(),
            team: team.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movement_week_flags_override_config() {
        assert!(resolve_movement_week(false, false, true));
        assert!(!resolve_movement_week(false, false, false));
        assert!(resolve_movement_week(true, false, false));
        assert!(!resolve_movement_week(false, true, true));
    }

    #[test]
    fn test_movement_week_flags_conflict() {
        let cli = Cli::try_parse_from(["tierladder", "submit", "tier.yaml", "--no-movement-week"]).unwrap();
        match cli.command {
            Commands::Submit {
                movement_week,
                no_movement_week,
                ..
            } => assert!(!movement_week && no_movement_week),
            other => panic!("expected submit, got {:?}", other),
        }

        let both = Cli::try_parse_from([
            "tierladder",
            "submit",
            "tier.yaml",
            "--movement-week",
            "--no-movement-week",
        ]);
        assert!(both.is_err());
    }
}
