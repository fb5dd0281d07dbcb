//! Utility types and functions

pub mod logger;
pub mod paths;
