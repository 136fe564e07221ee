//! Isomorphism testing for labelled graphs
//!
//! A [`Graph`] holds named vertices joined by directed or undirected,
//! optionally named, edges. Two graphs are compared by computing discrete
//! labellings of both: colour refinement separates nodes by name and
//! neighbourhood, and a backtracking enumerator individualizes the nodes
//! refinement cannot tell apart.
//!
//! ```
//! use isolabel_core::Graph;
//!
//! let mut first: Graph<&str, &str> = Graph::new();
//! first.add_vertex("1", "L1")?;
//! first.add_vertex("2", "L2")?;
//! first.add_named_directed_edge("1", "2", "E")?;
//!
//! let mut second: Graph<&str, &str> = Graph::new();
//! second.add_vertex("b", "L2")?;
//! second.add_vertex("a", "L1")?;
//! second.add_named_directed_edge("a", "b", "E")?;
//!
//! assert!(first.is_isomorphic(&second));
//! # Ok::<(), isolabel_core::GraphError>(())
//! ```
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

pub mod algorithm;
pub mod config;
pub mod data_structures;

pub use algorithm::graph::{GraphIsomorphism, GraphLabeller, IsomorphismMapping, IsomorphismResult};
pub use algorithm::traits::{Algorithm, GraphError, GraphResult, NodeId};
pub use config::LabellerConfig;
pub use data_structures::graph::{Graph, Node, NodeKind};
pub use data_structures::label::{Label, Labelling, Provenance};
