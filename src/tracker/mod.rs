//! In-memory trackers for components and milestones.
//!
//! The trackers hold the only authoritative copy of the records during a
//! session and are the sole mutators. Every mutation is expressed as a tagged
//! update command so that clamping and timestamp refresh happen in one place.
//! Trackers never touch storage or the activity log; the command layer persists
//! and records after a successful update.

pub mod components;
pub mod milestones;

pub use components::{ComponentTracker, ComponentUpdate, FollowUp, UpdateOutcome};
pub use milestones::{MilestoneOutcome, MilestoneTracker, MilestoneUpdate, NewMilestone};
