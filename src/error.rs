//! Error types for the speaker simulator.
//!
//! This module provides a unified error type [`SpeakerSimError`] that covers
//! all error conditions that can occur while parsing project descriptions and
//! measurement data, compiling an element tree, and resolving enclosure
//! alignments.
//!
//! Evaluation of a compiled tree never fails: every error is raised when the
//! tree is built.

use thiserror::Error;

/// Result type alias using [`SpeakerSimError`].
pub type Result<T> = std::result::Result<T, SpeakerSimError>;

/// Unified error type for all speaker simulator operations.
#[derive(Error, Debug)]
pub enum SpeakerSimError {
    // ============ Project Description Errors ============
    /// Error during lexical analysis
    #[error("Lexer error at line {line}, column {column}: {message}")]
    LexerError {
        line: usize,
        column: usize,
        message: String,
    },

    /// Error during parsing
    #[error("Parse error at line {line}: {message}")]
    ParseError { line: usize, message: String },

    /// Unknown element kind tag
    #[error("Unknown element kind '{kind}' at line {line}")]
    UnknownElementKind { kind: String, line: usize },

    /// Element references a driver or enclosure that was never defined
    #[error("Element '{element}' references undefined {what} '{name}'")]
    UndefinedReference {
        element: String,
        what: &'static str,
        name: String,
    },

    /// Duplicate element, driver or enclosure name
    #[error("Duplicate name '{name}'")]
    DuplicateName { name: String },

    // ============ Parameter Errors ============
    /// Invalid parameter value
    #[error("Invalid parameter '{param}' for '{owner}': {message}")]
    InvalidParameter {
        owner: String,
        param: String,
        message: String,
    },

    /// Driver Q outside the range supported by an alignment formula
    #[error("Alignment {alignment} does not support Qts = {qts:.3} (supported {min:.2}..{max:.2})")]
    AlignmentOutOfRange {
        alignment: String,
        qts: f64,
        min: f64,
        max: f64,
    },

    /// Operation not implemented by this element kind
    #[error("Operation '{operation}' is not supported by {kind}")]
    Unsupported {
        operation: &'static str,
        kind: String,
    },

    /// Invalid tree topology
    #[error("Invalid topology: {message}")]
    InvalidTopology { message: String },

    // ============ Measurement Errors ============
    /// Malformed line in a frequency/impedance response text
    #[error("Malformed measurement line {line}: {message}")]
    MalformedMeasurement { line: usize, message: String },

    /// Measurement without any usable sample
    #[error("Measurement '{name}' contains no samples")]
    EmptyMeasurement { name: String },

    // ============ I/O Errors ============
    /// Error reading a project or measurement file (binary only)
    #[error("Failed to read file '{path}': {source}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl SpeakerSimError {
    /// Create a lexer error
    pub fn lexer(line: usize, column: usize, message: impl Into<String>) -> Self {
        Self::LexerError {
            line,
            column,
            message: message.into(),
        }
    }

    /// Create a parse error
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::ParseError {
            line,
            message: message.into(),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter(
        owner: impl Into<String>,
        param: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidParameter {
            owner: owner.into(),
            param: param.into(),
            message: message.into(),
        }
    }

    /// Create an alignment range error
    pub fn alignment_out_of_range(alignment: impl Into<String>, qts: f64, min: f64, max: f64) -> Self {
        Self::AlignmentOutOfRange {
            alignment: alignment.into(),
            qts,
            min,
            max,
        }
    }

    /// Create a malformed measurement error
    pub fn malformed(line: usize, message: impl Into<String>) -> Self {
        Self::MalformedMeasurement {
            line,
            message: message.into(),
        }
    }
}

/// Check that a parameter is finite and strictly positive.
pub(crate) fn require_positive(owner: &str, param: &str, value: f64) -> Result<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(SpeakerSimError::invalid_parameter(
            owner,
            param,
            format!("must be positive, got {}", value),
        ))
    }
}
