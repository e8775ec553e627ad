//! Analysis Error Handling
//!
//! This module provides the error types for the analysis engine using `thiserror`.
//!
//! # Error Categories
//! - **Contract violations**: the lifter handed over a malformed block (e.g. a
//!   statement that needs an instruction address appears before any mark).
//!   The analysis call is aborted; no partial result is produced.
//! - **Configuration errors**: an `AnalysisConfig` that cannot be used.
//!
//! Unsupported IR shapes are *not* errors: passes give up locally and leave the
//! affected result field at its default.

use thiserror::Error;

/// Analysis error types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    /// A statement that must be attributed to an instruction appeared before
    /// the first instruction mark of the block.
    #[error("Statement {statement_index} ({statement}) appears before any instruction mark\nSuggestion: {suggestion}")]
    MissingInstructionMark {
        statement_index: usize,
        statement: String,
        suggestion: String,
    },

    /// Unusable analysis configuration.
    #[error("Invalid analysis configuration: {message}\nSuggestion: {suggestion}")]
    InvalidConfig { message: String, suggestion: String },
}

impl AnalysisError {
    /// Create a missing-instruction-mark error for the statement at `statement_index`.
    #[cold]
    pub fn missing_mark(statement_index: usize, statement: impl ToString) -> Self {
        Self::MissingInstructionMark {
            statement_index,
            statement: statement.to_string(),
            suggestion: "The lifter must emit an IMark before the first statement of every instruction.".to_string(),
        }
    }

    /// Create a configuration error.
    #[cold]
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
            suggestion: "Capacities must be non-zero. Check the configuration file.".to_string(),
        }
    }
}
