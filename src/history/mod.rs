pub mod seed;
pub mod tracker;

pub use seed::seed_order;
pub use tracker::{rank_history, week_ranks, RankHistory, RankSource, WeeklyRank};
