//! Single-block abstract interpretation over lifted IR.
//!
//! Given one lifted basic block, `blockscan-core` recovers the data references
//! it makes, constant values of its temporaries, its default exit target, its
//! instruction boundaries and whether it is a no-op block.
//!
//! # Modules
//! - [`engine`]: IR model, analyses, configuration and the [`BlockAnalyzer`] pipeline
//! - [`runtime`]: read-only regions and initial register values shared across calls
//! - [`target`]: guest architecture quirks
//!
//! [`BlockAnalyzer`]: engine::pipeline::BlockAnalyzer

pub mod engine;
pub mod runtime;
pub mod target;
