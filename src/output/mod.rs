pub mod formatter;

pub use formatter::{
    format_diff, format_formats, format_rank_history, format_standings, format_tier_result,
    should_use_colors,
};
