//! Analysis engine: the IR model, the single-block analyses and the pipeline
//! that runs them.

pub mod analysis;
pub mod config;
pub mod error;
pub mod ir;
pub mod pipeline;
