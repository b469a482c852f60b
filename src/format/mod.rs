pub mod position;
pub mod registry;

pub use position::Position;
pub use registry::{
    resolve, FormatId, FormatSpec, Move, MoveDir, MovementOrder, MovementTopology, PointsTable,
    RankCriterion, Seat, Series, SetRole, SetRule, Topology,
};
