use std::io::IsTerminal;
use owo_colors::OwoColorize;
use terminal_size::{Width, terminal_size};

use crate::format::{FormatId, PointsTable, Series, SetRule};
use crate::history::RankHistory;
use crate::pipeline::TierEvaluation;
use crate::store::StandingsRow;

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Get terminal width, defaulting to None for pipes (unlimited)
fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Truncate a team name to fit available width, accounting for Unicode
fn truncate_name(name: &str, max_width: usize) -> String {
    let chars: Vec<char> = name.chars().collect();
    if chars.len() <= max_width {
        name.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

/// Width of the name column: the longest name, shrunk to fit the terminal
/// next to `fixed_width` characters of other columns.
fn name_column_width<'a>(names: impl Iterator<Item = &'a str>, fixed_width: usize) -> usize {
    let longest = names.map(|n| n.chars().count()).max().unwrap_or(0).max(4);
    match get_terminal_width() {
        Some(width) if width > fixed_width + 10 => longest.min(width - fixed_width),
        Some(_) => longest.min(20),
        None => longest,
    }
}

fn pad(text: &str, width: usize) -> String {
    let text = truncate_name(text, width);
    let fill = width.saturating_sub(text.chars().count());
    format!("{}{}", text, " ".repeat(fill))
}

/// Signed differential: "+5", "-3", "0"
pub fn format_diff(diff: i64) -> String {
    if diff > 0 {
        format!("+{}", diff)
    } else {
        diff.to_string()
    }
}

/// One line per registered format.
pub fn format_formats(use_colors: bool) -> String {
    FormatId::ALL
        .iter()
        .map(|id| {
            let spec = id.spec();
            let series = match spec.series {
                Series::Fixed(n) => format!("{} set(s) per pairing", n),
                Series::BestOf(n) => format!("best of {}", n),
            };
            let scoring = match spec.set_rule {
                SetRule::Rally { target, decider_target, .. } => {
                    format!("rally to {} ({} in a decider)", target, decider_target)
                }
                SetRule::Casual { cap } => format!("casual, max {}", cap),
            };
            let points = match spec.points {
                PointsTable::ByRank(table) => table
                    .iter()
                    .map(u32::to_string)
                    .collect::<Vec<_>>()
                    .join("/"),
                PointsTable::SetWins { base, cap } => format!("{} + set wins (max {})", base, cap),
            };
            let name = format!("{:<22}", id.as_str());
            let detail = format!(
                "{} teams, {}, {}, points {}, +{} per tier{}",
                spec.team_count(),
                series,
                scoring,
                points,
                spec.tier_bonus,
                if spec.elite { ", elite" } else { "" }
            );
            if use_colors {
                format!("{}{}", name.bold(), detail)
            } else {
                format!("{}{}", name, detail)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Ranked results of one tier followed by the planned movement.
pub fn format_tier_result(evaluation: &TierEvaluation, use_colors: bool) -> String {
    let slot = &evaluation.slot;
    let mut lines = Vec::new();

    let header = format!(
        "Week {} tier {} ({})",
        slot.week, slot.tier, evaluation.spec.id
    );
    lines.push(if use_colors {
        header.bold().to_string()
    } else {
        header
    });

    // rank 3 + pos 4 + W-L 7 + diff 6 + pts 5 + separators
    let fixed_width = 3 + 4 + 7 + 6 + 5 + 12;
    let name_width = name_column_width(
        evaluation.results.iter().map(|r| r.team_name.as_str()),
        fixed_width,
    );

    for (i, result) in evaluation.results.iter().enumerate() {
        let record = format!("{}-{}", result.stat.set_wins, result.stat.set_losses);
        let decided = evaluation
            .ranking
            .separators
            .get(i)
            .map(|d| format!("  (over next: {})", d))
            .unwrap_or_default();
        let line = format!(
            "{:>2}. {}  {}  {:>5}  {:>4}  {:>3} pts{}",
            result.rank,
            result.position,
            pad(&result.team_name, name_width),
            record,
            format_diff(result.stat.differential()),
            result.points.total(),
            decided
        );
        lines.push(if use_colors && result.rank == 1 {
            line.green().to_string()
        } else {
            line
        });
    }

    if !evaluation.plan.assignments.is_empty() {
        lines.push(String::new());
        lines.push("Next week:".to_string());
        for assignment in &evaluation.plan.assignments {
            let arrow = match assignment.target_tier.cmp(&slot.tier) {
                std::cmp::Ordering::Less => "up",
                std::cmp::Ordering::Equal => "stays",
                std::cmp::Ordering::Greater => "down",
            };
            let line = format!(
                "  {} {:<5} tier {} position {}",
                pad(&assignment.team_name, name_width),
                arrow,
                assignment.target_tier,
                assignment.target_position
            );
            lines.push(if use_colors {
                match arrow {
                    "up" => line.green().to_string(),
                    "down" => line.red().to_string(),
                    _ => line,
                }
            } else {
                line
            });
        }
    }

    lines.join("\n")
}

/// Season standings; totals include manual adjustments, marked with `*`.
pub fn format_standings(rows: &[StandingsRow], use_colors: bool) -> String {
    if rows.is_empty() {
        return "No standings yet.".to_string();
    }

    let fixed_width = 4 + 5 * 4 + 8;
    let name_width = name_column_width(rows.iter().map(|r| r.team_name.as_str()), fixed_width);
    let mark = |manual: i64| if manual != 0 { "*" } else { " " };

    let header = format!(
        "{:>3}  {}  {:>4}  {:>4}  {:>5}  {:>6}",
        "#",
        pad("Team", name_width),
        "W",
        "L",
        "Pts",
        "Diff"
    );

    let mut lines = vec![if use_colors {
        header.dimmed().to_string()
    } else {
        header
    }];

    for row in rows {
        let position = row
            .current_position
            .map(|p| format!("{:>2}.", p))
            .unwrap_or_else(|| " -.".to_string());
        let points = format!("{}{}", row.total_points(), mark(row.manual_points_adj));
        let line = format!(
            "{}  {}  {:>4}  {:>4}  {:>5}  {:>6}",
            position,
            pad(&row.team_name, name_width),
            format!("{}{}", row.total_wins(), mark(row.manual_wins_adj)),
            format!("{}{}", row.total_losses(), mark(row.manual_losses_adj)),
            points,
            format!(
                "{}{}",
                format_diff(row.total_differential()),
                mark(row.manual_diff_adj)
            )
        );
        lines.push(if use_colors && row.current_position == Some(1) {
            line.bold().to_string()
        } else {
            line
        });
    }

    lines.join("\n")
}

/// One row per team, one column per week; `-` where no rank exists.
pub fn format_rank_history(history: &RankHistory, use_colors: bool) -> String {
    if history.teams.is_empty() {
        return "No elite rank history.".to_string();
    }

    let weeks = history.through_week as usize;
    let fixed_width = weeks * 5;
    let ordered = history.ordered();
    let name_width = name_column_width(ordered.iter().map(|(name, _)| *name), fixed_width);

    let week_headers: String = (1..=weeks).map(|w| format!("{:>5}", format!("W{}", w))).collect();
    let header = format!("{}{}", pad("Team", name_width), week_headers);
    let mut lines = vec![if use_colors {
        header.dimmed().to_string()
    } else {
        header
    }];

    for (name, ranks) in ordered {
        let cells: String = ranks
            .iter()
            .map(|r| match r {
                Some(rank) => format!("{:>5}", rank),
                None => format!("{:>5}", "-"),
            })
            .collect();
        lines.push(format!("{}{}", pad(name, name_width), cells));
    }

    lines.join("\n")
}
