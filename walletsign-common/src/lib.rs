//! Common components and data for walletsign crates.

pub mod logging;
pub mod paths;
