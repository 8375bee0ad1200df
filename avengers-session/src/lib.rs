//! avengers-session library
//!
//! Mission coordination for multi-agent work: phase scheduling, durable
//! mission state, artifact tracking and final consolidation.

pub mod config;
pub mod consolidate;
pub mod error;
pub mod plan;
pub mod roles;
pub mod state;
pub mod watch;
