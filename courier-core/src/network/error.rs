//! Errors raised while building or loading a road network.

use std::error::Error as StdError;

use thiserror::Error;

use crate::geodesy::InvalidLocation;

/// Boxed failure reported by a [`NetworkSource`](super::NetworkSource).
pub type SourceError = Box<dyn StdError + Send + Sync + 'static>;

/// Validation failure while freezing a [`RoadNetworkBuilder`](super::RoadNetworkBuilder).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NetworkBuildError {
    /// Two nodes share an identifier.
    #[error("node {id} appears more than once")]
    DuplicateNode {
        /// Repeated identifier.
        id: u64,
    },
    /// A node position is not a valid coordinate.
    #[error("node {id} has an invalid location")]
    InvalidNodeLocation {
        /// Node identifier.
        id: u64,
        /// Underlying coordinate failure.
        source: InvalidLocation,
    },
    /// An edge references a node that was never added.
    #[error("edge {from} -> {to} references unknown node {id}")]
    UnknownNode {
        /// Identifier that could not be resolved.
        id: u64,
        /// Edge tail.
        from: u64,
        /// Edge head.
        to: u64,
    },
    /// An edge length is negative or non-finite.
    #[error("edge {from} -> {to} has invalid length {length_m}")]
    InvalidLength {
        /// Edge tail.
        from: u64,
        /// Edge head.
        to: u64,
        /// Rejected length in metres.
        length_m: f64,
    },
}

/// Both the primary and the fallback network source failed.
#[derive(Debug, Error)]
#[error(
    "failed to load road network: primary source {primary_source} failed ({primary}); \
     fallback source {fallback_source} failed ({fallback})"
)]
pub struct NetworkLoadError {
    /// Description of the primary source.
    pub primary_source: String,
    /// Failure reported by the primary source.
    pub primary: SourceError,
    /// Description of the fallback source.
    pub fallback_source: String,
    /// Failure reported by the fallback source.
    #[source]
    pub fallback: SourceError,
}
