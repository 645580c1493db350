// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Spurwerk.

use thiserror::Error;

/// Top-level error type for all Spurwerk operations.
#[derive(Debug, Error)]
pub enum SpurwerkError {
    // -- Pipeline contract violations --
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("dimension mismatch: expected {expected:?}, got {actual:?}")]
    DimensionMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },

    /// Recovered inside the lane aggregator; never returned from a pipeline call.
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // -- Collaborators --
    #[error("image processing failed: {0}")]
    ImageError(String),

    #[error("frame capture failed: {0}")]
    Capture(String),

    #[error("frame display failed: {0}")]
    Display(String),

    // -- Storage / serialization --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, SpurwerkError>;
