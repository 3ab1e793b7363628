// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Error types for the session layer.
//!
//! Malformed chord text never produces an error; only the document
//! transport and mutators called without a session can fail.

use thiserror::Error;

use crate::session::BandId;

/// Failures of the shared document transport
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The store could not be reached (offline, disconnected)
    #[error("session store unavailable: {0}")]
    Unavailable(String),
    /// A field-level update targeted a document that does not exist
    #[error("no session document for band {0}")]
    NotFound(BandId),
}

/// Failures of leader-side session operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error(transparent)]
    Store(#[from] StoreError),
    /// A mutator was called while this controller holds no active session
    #[error("no active session for band {0}")]
    NotActive(BandId),
}

pub type Result<T> = std::result::Result<T, SessionError>;
