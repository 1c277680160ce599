//! Pipeline construction and execution.
//!
//! This module provides:
//! - The immutable [`Pipeline`] and its execution engine
//! - The fluent [`PipelineBuilder`] / [`SourcedPipelineBuilder`] pair
//! - The per-invocation [`RunReport`] summary

mod builder;
mod runner;


pub use builder::{PipelineBuilder, SourcedPipelineBuilder};
pub use runner::{Pipeline, RunReport};
