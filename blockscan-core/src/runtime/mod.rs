//! Runtime state shared across analysis calls: the read-only region store,
//! initial register values and object-file import.

pub mod context;
pub mod regions;
pub mod sections;
