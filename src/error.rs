// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `circuit_sync` library.
//!
//! Hardware faults are deliberately absent from this hierarchy: a bound unit
//! that fails its status check is reported through
//! [`CommStatus::Fault`](crate::types::CommStatus::Fault), not through an
//! error.

use thiserror::Error;

use crate::types::EquipmentId;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// No equipment with the given id exists in the collection.
    #[error("{kind} {id} not found (desired state: {desired})")]
    EquipmentNotFound {
        /// Kind of equipment that was looked up.
        kind: &'static str,
        /// The id that was looked up.
        id: EquipmentId,
        /// The state the caller asked for.
        desired: bool,
    },

    /// The device could not be reached or the exchange failed in transit.
    #[error("device communication error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Error occurred while (de)serializing a body or a configuration.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// A raw value is outside its valid domain.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// Anything else, such as a panicked background task.
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

/// Errors related to value validation and constraints.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// Communication status codes are 0 (ok) and 1 (fault).
    #[error("invalid communication status code: {0}")]
    InvalidCommStatus(u8),

    /// A flag was neither a boolean nor 0/1.
    #[error("invalid flag value: {0}")]
    InvalidFlag(String),
}

/// Errors related to device communication.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// HTTP request failed.
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// No endpoint is configured for the connection id.
    #[error("unknown connection: {0}")]
    UnknownConnection(String),

    /// Connection to the device failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Request timed out.
    #[error("request timed out after {0} ms")]
    Timeout(u64),

    /// Invalid URL or address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

/// Errors related to parsing bodies and configuration documents.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Failed to parse a specific value.
    #[error("failed to parse {field}: {message}")]
    InvalidValue {
        /// The field that failed to parse.
        field: String,
        /// Description of the parsing failure.
        message: String,
    },
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
