//! Core algorithm trait definitions for the isolabel engine
//!
//! This module establishes the vocabulary shared by the node model, the
//! refinement engine, the labelling enumerator and the isomorphism
//! comparator: a type-safe arena index for nodes, the error taxonomy, and
//! the string-typed parameter interface algorithms expose to callers.
//!
//! # Key Design Principles
//! - Node identity is arena-index identity, never name equality
//! - Every failure is local, synchronous and non-retryable
//! - Parameters are validated before they are stored

use std::fmt;

use serde::{Deserialize, Serialize};

/// Node identifier ensuring type safety and preventing mixing with other numeric types
///
/// A `NodeId` addresses a node inside the arena of the graph that created
/// it. Two structurally identical nodes (say, two vertices named `"L2"`)
/// always carry different ids.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

impl NodeId {
    #[inline]
    pub fn as_usize(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Comprehensive error types for graph construction and labelling
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("A vertex with id '{id}' exists already")]
    DuplicateVertex { id: String },

    #[error("No vertex with id '{id}' exists")]
    MissingVertex { id: String },

    #[error("No more labellings available")]
    Exhausted,

    #[error("Invalid parameter: {name} - {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result alias used throughout the crate
pub type GraphResult<T> = Result<T, GraphError>;

/// Algorithm parameter with strongly typed values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmParameter {
    pub name: String,
    pub value: String,
    pub value_type: ParameterType,
}

/// Parameter type enumeration for type-safe parameter handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParameterType {
    Integer,
    OptionalInteger,
}

/// Parameterised algorithm interface
///
/// # Invariants
/// - `set_parameter` never stores a value that failed validation
/// - `get_parameter` reflects every successful `set_parameter`
pub trait Algorithm {
    /// Returns the algorithm's descriptive name
    fn name(&self) -> &'static str;

    /// Returns the algorithm's category (e.g. isomorphism, pathfinding)
    fn category(&self) -> &'static str;

    /// Returns supported parameters with their current values
    fn parameters(&self) -> Vec<AlgorithmParameter>;

    /// Sets algorithm parameter with type validation
    fn set_parameter(&mut self, name: &str, value: &str) -> GraphResult<()>;

    /// Gets algorithm parameter value
    fn get_parameter(&self, name: &str) -> Option<String>;
}
