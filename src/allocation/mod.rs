//! Allocation: how many entities each role receives

mod role;
mod planner;

pub use role::Role;
pub use planner::{AllocationPlanner, PlannerConfig};
