//! Operations module
//!
//! Coordinates chart discovery, per-chart synthesis, dependency ordering,
//! schema composition and values annotation

pub mod annotate;
pub mod compose;
pub mod discovery;
pub mod generate;
pub mod toposort;
pub mod worker;
