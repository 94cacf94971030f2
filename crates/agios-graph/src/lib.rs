//! Per-request orchestration for Agios threads.
//!
//! A [`Pipeline`] classifies the query, runs the chosen tool (falling back to
//! general search when a specialized tool fails), persists the outcome on the
//! message and streams [`agios_types::StreamEvent`]s to the caller.

pub mod builder;
pub mod config;
pub mod error;
pub mod pipeline;

pub use builder::PipelineBuilder;
pub use config::PipelineConfig;
pub use error::{PipelineError, Result};
pub use pipeline::{Pipeline, RunInput};
