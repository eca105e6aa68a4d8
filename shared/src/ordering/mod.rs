//! Ordering rules
//!
//! - [`index`]: dense `0..n-1` order within a container, renumbering primitive
//! - [`planner`]: pure drag-and-drop move planning (column moves, card moves
//!   within and across columns)

pub mod index;
pub mod planner;

pub use index::{
    OrderAssignment, Ordered, append_order, changed_assignments, is_dense, renumber,
    renumber_in_place, sort_by_order,
};
pub use planner::{
    CardMovePlan, ColumnMovePlan, EntityKind, MoveRequest, PlanError, ReorderPlan, Slot,
    plan_card_move, plan_column_move,
};
