//! Work-unit and unit-state types
//!
//! This module defines:
//! - Work units (pages or ID batches) that the scheduler dispatches
//! - Unit outcomes and the states they map to in the run report

mod unit_state;
mod work_unit;

pub use unit_state::{UnitOutcome, UnitState};
pub use work_unit::WorkUnit;
