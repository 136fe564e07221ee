//! Graph Isomorphism Detection by Canonical Labelling
//!
//! This module decides whether two labelled graphs are isomorphic by
//! comparing their discrete labellings. Both graphs are labelled by the same
//! colour refinement engine; whenever refinement leaves ties, the
//! backtracking enumerator produces one labelling per individualization
//! path. Two graphs are isomorphic iff some labelling of the first and some
//! labelling of the second describe the same structure.
//!
//! # Matching Rule
//!
//! Labellings `a` and `b` match iff they use the same labels and, for every
//! label `l`, the nodes `a⁻¹(l)` and `b⁻¹(l)`:
//! - have the same kind (vertex or edge node) and equal names,
//! - reach the same set of labels over their out-arcs,
//! - are reached from the same set of labels over their in-arcs.
//!
//! A match *is* an isomorphism: `a⁻¹(l) ↦ b⁻¹(l)` preserves names, kinds
//! and arcs.
//!
//! # Performance Characteristics
//!
//! - Cheap rejections: absent graph, differing node counts
//! - Labellings of the second graph are cached as they are produced, so the
//!   full cross product is searched while both sides stay lazy
//! - Worst case is combinatorial in the size of the symmetry groups; the
//!   engine targets small to moderate graphs

use std::collections::HashMap;
use std::hash::Hash;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::algorithm::graph::labeller::GraphLabeller;
use crate::algorithm::traits::{
    Algorithm, AlgorithmParameter, GraphError, GraphResult, NodeId, ParameterType,
};
use crate::config::LabellerConfig;
use crate::data_structures::graph::{Graph, Node};
use crate::data_structures::label::{Label, Labelling};

/// Graph isomorphism detector
#[derive(Debug, Clone, Default)]
pub struct GraphIsomorphism {
    config: LabellerConfig,
}

/// What settled the comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    /// Both sides are the same graph instance
    SameInstance,
    /// One side is absent
    AbsentGraph,
    /// Both graphs have no nodes
    BothEmpty,
    /// Node counts differ
    NodeCountMismatch,
    /// A pair of matching labellings was found
    LabellingMatch,
    /// Every pair of labellings was compared without a match
    Exhausted,
}

/// Node correspondence of an isomorphism
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IsomorphismMapping {
    /// Image in the second graph of each node of the first, indexed by
    /// `NodeId`
    images: Vec<NodeId>,
}

/// Computational statistics of one comparison
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IsomorphismStatistics {
    /// Labellings produced for the first graph
    pub first_labellings: usize,
    /// Labellings produced for the second graph
    pub second_labellings: usize,
    /// Labelling pairs compared
    pub pairs_compared: usize,
}

/// Isomorphism detection result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IsomorphismResult {
    /// Whether graphs are isomorphic
    pub is_isomorphic: bool,
    /// Isomorphism mapping if it exists
    pub mapping: Option<IsomorphismMapping>,
    pub decision: Decision,
    pub statistics: IsomorphismStatistics,
}

impl IsomorphismResult {
    fn decided(decision: Decision, mapping: Option<IsomorphismMapping>) -> Self {
        Self {
            is_isomorphic: mapping.is_some(),
            mapping,
            decision,
            statistics: IsomorphismStatistics::default(),
        }
    }
}

impl IsomorphismMapping {
    fn identity(node_count: usize) -> Self {
        Self {
            images: (0..node_count).map(NodeId).collect(),
        }
    }

    /// Pairs nodes carrying the same label. `None` if a label of `first`
    /// is missing from `second`.
    fn from_labellings(first: &Labelling, second: &Labelling) -> Option<Self> {
        let images = first
            .labels()
            .map(|label| second.node_with(&label))
            .collect::<Option<Vec<NodeId>>>()?;
        Some(Self { images })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.images.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Image of a node of the first graph
    pub fn get(&self, node: NodeId) -> Option<NodeId> {
        self.images.get(node.as_usize()).copied()
    }

    /// `(first, second)` node pairs in the first graph's node order
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.images
            .iter()
            .enumerate()
            .map(|(index, &image)| (NodeId(index), image))
    }

    /// Vertex-id view of the mapping: each vertex id of `first` paired with
    /// the id of its image in `second`.
    pub fn vertex_pairs<'a, 'b, I, J, V, E>(
        &self,
        first: &'a Graph<I, V, E>,
        second: &'b Graph<J, V, E>,
    ) -> Vec<(&'a I, &'b J)> {
        let second_ids: HashMap<NodeId, &'b J> =
            second.vertex_ids().map(|(id, node)| (node, id)).collect();

        first
            .vertex_ids()
            .filter_map(|(id, node)| {
                let image = self.get(node)?;
                second_ids.get(&image).map(|&other| (id, other))
            })
            .collect()
    }
}

impl GraphIsomorphism {
    /// Create a new graph isomorphism detector with default refinement
    /// settings
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: LabellerConfig) -> GraphResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    #[inline]
    pub fn config(&self) -> &LabellerConfig {
        &self.config
    }

    /// Decides whether two graphs are isomorphic.
    ///
    /// An absent graph is never isomorphic to anything, including another
    /// absent graph.
    pub fn detect_isomorphism<I, J, V, E>(
        &self,
        first: Option<&Graph<I, V, E>>,
        second: Option<&Graph<J, V, E>>,
    ) -> IsomorphismResult
    where
        V: Hash + PartialEq,
        E: Hash + PartialEq,
    {
        let (first, second) = match (first, second) {
            (Some(first), Some(second)) => (first, second),
            _ => return IsomorphismResult::decided(Decision::AbsentGraph, None),
        };

        if std::ptr::eq(
            first as *const Graph<I, V, E> as *const u8,
            second as *const Graph<J, V, E> as *const u8,
        ) {
            return IsomorphismResult::decided(
                Decision::SameInstance,
                Some(IsomorphismMapping::identity(first.node_count())),
            );
        }
        if first.is_empty() && second.is_empty() {
            return IsomorphismResult::decided(
                Decision::BothEmpty,
                Some(IsomorphismMapping::identity(0)),
            );
        }
        if first.node_count() != second.node_count() {
            debug!(
                "Node counts differ ({} vs {}); not isomorphic",
                first.node_count(),
                second.node_count()
            );
            return IsomorphismResult::decided(Decision::NodeCountMismatch, None);
        }

        self.search_labellings(first.nodes(), second.nodes())
    }

    /// Searches the cross product of both graphs' labellings for a match.
    fn search_labellings<V, E>(
        &self,
        first_nodes: &[Node<V, E>],
        second_nodes: &[Node<V, E>],
    ) -> IsomorphismResult
    where
        V: Hash + PartialEq,
        E: Hash + PartialEq,
    {
        let first_labeller = GraphLabeller::new(first_nodes, &self.config);
        let mut second_labeller = GraphLabeller::new(second_nodes, &self.config);
        let mut second_seen: Vec<Labelling> = Vec::new();
        let mut statistics = IsomorphismStatistics::default();

        for first in first_labeller {
            statistics.first_labellings += 1;

            let cached = second_seen.iter().position(|second| {
                statistics.pairs_compared += 1;
                labellings_match(first_nodes, &first, second_nodes, second)
            });
            if let Some(index) = cached {
                return found(&first, &second_seen[index], statistics);
            }

            for second in second_labeller.by_ref() {
                statistics.second_labellings += 1;
                statistics.pairs_compared += 1;
                if labellings_match(first_nodes, &first, second_nodes, &second) {
                    return found(&first, &second, statistics);
                }
                second_seen.push(second);
            }
        }

        debug!(
            "No matching labellings among {} x {}; not isomorphic",
            statistics.first_labellings, statistics.second_labellings
        );
        IsomorphismResult {
            is_isomorphic: false,
            mapping: None,
            decision: Decision::Exhausted,
            statistics,
        }
    }
}

fn found(
    first: &Labelling,
    second: &Labelling,
    statistics: IsomorphismStatistics,
) -> IsomorphismResult {
    debug!(
        "Isomorphism found after {} labelling pair(s)",
        statistics.pairs_compared
    );
    let mapping = IsomorphismMapping::from_labellings(first, second);
    IsomorphismResult {
        is_isomorphic: mapping.is_some(),
        mapping,
        decision: Decision::LabellingMatch,
        statistics,
    }
}

/// Checks whether two discrete labellings describe the same structure.
pub fn labellings_match<V, E>(
    first_nodes: &[Node<V, E>],
    first: &Labelling,
    second_nodes: &[Node<V, E>],
    second: &Labelling,
) -> bool
where
    V: PartialEq,
    E: PartialEq,
{
    if first.len() != second.len()
        || first.len() != first_nodes.len()
        || second.len() != second_nodes.len()
    {
        return false;
    }

    first.iter().all(|(first_id, label)| {
        let Some(second_id) = second.node_with(&label) else {
            return false;
        };
        let first_node = &first_nodes[first_id.as_usize()];
        let second_node = &second_nodes[second_id.as_usize()];

        first_node.is_equivalent(second_node)
            && neighbour_labels(first_node.out_arcs(), first)
                == neighbour_labels(second_node.out_arcs(), second)
            && neighbour_labels(first_node.in_arcs(), first)
                == neighbour_labels(second_node.in_arcs(), second)
    })
}

/// Sorted labels of `arcs`, comparable across graphs. Arcs hold no
/// repetitions, so equal vectors mean equal label sets.
fn neighbour_labels(arcs: &[NodeId], labelling: &Labelling) -> Vec<Label> {
    let mut labels: Vec<Label> = arcs
        .iter()
        .filter_map(|&node| labelling.label_of(node))
        .collect();
    labels.sort_unstable();
    labels
}

impl Algorithm for GraphIsomorphism {
    fn name(&self) -> &'static str {
        "Graph Isomorphism (Colour Refinement + Individualization)"
    }

    fn category(&self) -> &'static str {
        "graph_analysis"
    }

    fn parameters(&self) -> Vec<AlgorithmParameter> {
        let parameter = |name: &str, value_type| AlgorithmParameter {
            name: name.to_string(),
            value: self.get_parameter(name).unwrap_or_default(),
            value_type,
        };
        vec![
            parameter("out_multiplier", ParameterType::Integer),
            parameter("in_multiplier", ParameterType::Integer),
            parameter("max_rounds", ParameterType::OptionalInteger),
        ]
    }

    fn set_parameter(&mut self, name: &str, value: &str) -> GraphResult<()> {
        let invalid = |reason: &str| GraphError::InvalidParameter {
            name: name.to_string(),
            reason: reason.to_string(),
        };

        let mut config = self.config;
        match name {
            "out_multiplier" | "in_multiplier" => {
                let multiplier = value
                    .parse::<u64>()
                    .map_err(|_| invalid("must be a positive integer"))?;
                if name == "out_multiplier" {
                    config.out_multiplier = multiplier;
                } else {
                    config.in_multiplier = multiplier;
                }
            }
            "max_rounds" => {
                config.max_rounds = match value {
                    "auto" => None,
                    _ => Some(
                        value
                            .parse::<usize>()
                            .map_err(|_| invalid("must be a positive integer or 'auto'"))?,
                    ),
                };
            }
            _ => return Err(invalid("unknown parameter")),
        }

        config.validate().map_err(|e| invalid(&e.to_string()))?;
        self.config = config;
        Ok(())
    }

    fn get_parameter(&self, name: &str) -> Option<String> {
        match name {
            "out_multiplier" => Some(self.config.out_multiplier.to_string()),
            "in_multiplier" => Some(self.config.in_multiplier.to_string()),
            "max_rounds" => Some(
                self.config
                    .max_rounds
                    .map_or_else(|| "auto".to_string(), |rounds| rounds.to_string()),
            ),
            _ => None,
        }
    }
}
