//! Step definitions for the wall split scenarios

pub mod given;
pub mod then;
pub mod when;
