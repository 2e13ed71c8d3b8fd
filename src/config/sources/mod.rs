//! Configuration sources

pub mod defaults;
pub mod environment;
