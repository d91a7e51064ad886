//! Background job definitions and handlers
//!
//! This module contains scheduled tasks:
//! - Orphaned tile-object sweep (reclaims storage left behind by upload
//!   flows that never finalized)

pub mod orphan_sweep;

pub use orphan_sweep::{SweepConfig, SweepSummary};
