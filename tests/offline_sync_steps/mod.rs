//! Step definitions for offline sync scenarios.

mod given;
mod then;
mod when;
pub mod world;
