//! Rank arithmetic for note ordering.
//!
//! Everything here is pure: the store reads the current ranks, asks this module
//! what to write, and applies the answer inside one transaction.

mod batch;
mod range_shift;

pub use batch::{plan_batch, RankAssignment};
pub use range_shift::{clamp_target, plan_move, MovePlan, RangeShift};
