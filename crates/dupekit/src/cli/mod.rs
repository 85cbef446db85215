//! Command implementations.

pub mod config;
pub mod hash;
pub mod matches;
pub mod scan;
