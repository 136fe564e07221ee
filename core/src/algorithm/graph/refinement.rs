//! Colour Refinement Engine
//!
//! This module computes the coarsest partition of a graph's nodes that is
//! consistent with their names and their neighbourhood structure.
//!
//! # Theoretical Foundation
//!
//! Every node starts in the group keyed by the hash of its name. A
//! refinement pass then recomputes, for every node that still shares its
//! group with another node, the composite
//!
//! ```text
//! key(v) = hash(name(v)) + C_out * Σ sig(label(w)), w ∈ out(v)
//!                        + C_in  * Σ sig(label(u)), u ∈ in(v)
//! ```
//!
//! from a snapshot of the labels taken at the start of the pass, and moves
//! the node to the group `Label::fixed(key)`. Refinement stops once a pass
//! neither splits nor merges a group. Information travels one arc per
//! pass, so `n` passes always suffice to cross the longest possible
//! shortest path of an `n`-node graph; that is the round bound.
//!
//! ## Invariants
//!
//! 1. **Equivariance**: the partition depends only on names and arcs,
//!    never on node indices, so isomorphic graphs refine identically
//! 2. **Singleton Stability**: a node alone in its group is never
//!    relabelled; individualized nodes keep their generated labels
//! 3. **Termination**: at most `round_bound` passes run

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

use log::trace;

use crate::algorithm::traits::NodeId;
use crate::config::LabellerConfig;
use crate::data_structures::graph::Node;
use crate::data_structures::label::{Label, Labelling};

/// Partition of a graph's nodes into label groups
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    /// Groups keyed by label; members in insertion order, never empty
    groups: BTreeMap<Label, Vec<NodeId>>,
    /// Current label of each node
    labels: Vec<Label>,
    /// Individualizations applied on the path that produced this partition
    individualized: u64,
}

impl Partition {
    /// Seeds the partition by name hash.
    pub fn seed<V: Hash, E: Hash>(nodes: &[Node<V, E>]) -> Self {
        let mut groups: BTreeMap<Label, Vec<NodeId>> = BTreeMap::new();
        let mut labels = Vec::with_capacity(nodes.len());

        for (index, node) in nodes.iter().enumerate() {
            let label = Label::fixed(node.name_hash());
            groups.entry(label).or_default().push(NodeId(index));
            labels.push(label);
        }

        Self {
            groups,
            labels,
            individualized: 0,
        }
    }

    /// Number of partitioned nodes
    #[inline]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    #[inline]
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    #[inline]
    pub fn label_of(&self, node: NodeId) -> Label {
        self.labels[node.as_usize()]
    }

    /// Members of the group keyed by `label`
    pub fn group(&self, label: &Label) -> &[NodeId] {
        self.groups.get(label).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether every group has exactly one member
    #[inline]
    pub fn is_discrete(&self) -> bool {
        self.groups.len() == self.labels.len()
    }

    #[inline]
    pub fn individualized(&self) -> u64 {
        self.individualized
    }

    /// Nodes sharing their group with at least one other node, group by
    /// group in label order, each group in insertion order.
    pub fn ambiguous_nodes(&self) -> Vec<NodeId> {
        self.groups
            .values()
            .filter(|members| members.len() > 1)
            .flat_map(|members| members.iter().copied())
            .collect()
    }

    /// Gives `node` a fresh generated label, splitting it off its group.
    pub fn individualize(&mut self, node: NodeId) -> Label {
        self.individualized += 1;
        let label = Label::generated(self.individualized);
        self.relabel(node, label);
        label
    }

    /// Freezes the partition into a labelling; `None` unless discrete.
    pub fn to_labelling(&self) -> Option<Labelling> {
        if !self.is_discrete() {
            return None;
        }
        Labelling::from_labels(self.labels.clone())
    }

    fn relabel(&mut self, node: NodeId, label: Label) {
        let old = self.labels[node.as_usize()];
        if old == label {
            return;
        }

        if let Some(members) = self.groups.get_mut(&old) {
            members.retain(|&member| member != node);
            if members.is_empty() {
                self.groups.remove(&old);
            }
        }
        self.groups.entry(label).or_default().push(node);
        self.labels[node.as_usize()] = label;
    }
}

/// Summary of one refinement run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefinementOutcome {
    /// Passes executed, including the final pass that left the groups alone
    pub rounds: usize,
    /// Whether a fixpoint was reached before the round bound
    pub stable: bool,
}

/// Iterative partition refinement over one graph's nodes
#[derive(Debug, Clone)]
pub struct ColourRefiner<'g, V, E> {
    nodes: &'g [Node<V, E>],
    out_multiplier: u64,
    in_multiplier: u64,
    round_bound: usize,
}

impl<'g, V: Hash, E: Hash> ColourRefiner<'g, V, E> {
    pub fn new(nodes: &'g [Node<V, E>], config: &LabellerConfig) -> Self {
        Self {
            nodes,
            out_multiplier: config.out_multiplier,
            in_multiplier: config.in_multiplier,
            round_bound: config.round_bound(nodes.len()),
        }
    }

    /// Seeds a partition for this refiner's nodes.
    pub fn seed(&self) -> Partition {
        Partition::seed(self.nodes)
    }

    /// Refines `partition` in place until a pass changes nothing or the
    /// round bound is reached.
    pub fn refine(&self, partition: &mut Partition) -> RefinementOutcome {
        let mut outcome = RefinementOutcome {
            rounds: 0,
            stable: false,
        };

        while outcome.rounds < self.round_bound {
            outcome.rounds += 1;
            if !self.relabel_ambiguous(partition) {
                outcome.stable = true;
                break;
            }
        }

        trace!(
            "Refinement finished after {} round(s): {} group(s) over {} node(s), stable={}",
            outcome.rounds,
            partition.group_count(),
            partition.len(),
            outcome.stable
        );
        outcome
    }

    /// One synchronous pass; returns whether the group structure changed.
    ///
    /// Renaming a whole group does not count as a change: the next pass
    /// would see the same partition and compute the same structure again.
    fn relabel_ambiguous(&self, partition: &mut Partition) -> bool {
        let groups_before = partition.group_count();
        let updates: Vec<(NodeId, Label)> = partition
            .ambiguous_nodes()
            .into_iter()
            .map(|node| (node, self.composite_label(node, partition)))
            .collect();

        let mut renaming: HashMap<Label, Label> = HashMap::with_capacity(updates.len());
        let mut split = false;
        for &(node, label) in &updates {
            let target = renaming.entry(partition.label_of(node)).or_insert(label);
            split |= *target != label;
        }

        for &(node, label) in &updates {
            partition.relabel(node, label);
        }
        split || partition.group_count() != groups_before
    }

    fn composite_label(&self, node: NodeId, partition: &Partition) -> Label {
        let node = &self.nodes[node.as_usize()];
        let signature_sum = |arcs: &[NodeId]| {
            arcs.iter().fold(0u64, |sum, &neighbour| {
                sum.wrapping_add(partition.label_of(neighbour).signature())
            })
        };

        let value = node
            .name_hash()
            .wrapping_add(self.out_multiplier.wrapping_mul(signature_sum(node.out_arcs())))
            .wrapping_add(self.in_multiplier.wrapping_mul(signature_sum(node.in_arcs())));
        Label::fixed(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_structures::graph::Graph;

    type TestGraph = Graph<String, &'static str>;

    fn refine(graph: &TestGraph) -> (Partition, RefinementOutcome) {
        let refiner = ColourRefiner::new(graph.nodes(), &LabellerConfig::default());
        let mut partition = refiner.seed();
        let outcome = refiner.refine(&mut partition);
        (partition, outcome)
    }

    fn sorted(mut nodes: Vec<NodeId>) -> Vec<NodeId> {
        nodes.sort();
        nodes
    }

    #[test]
    fn test_seed_groups_by_name() {
        let mut graph = TestGraph::new();
        graph.add_vertex("1", "L1").unwrap();
        graph.add_vertex("2", "L2").unwrap();
        graph.add_vertex("3", "L2").unwrap();
        graph.add_named_directed_edge("1", "2", "L2").unwrap();

        let partition = Partition::seed(graph.nodes());
        assert_eq!(partition.len(), 4);
        assert_eq!(partition.group_count(), 2);
        assert_eq!(
            partition.group(&partition.label_of(NodeId(1))),
            &[NodeId(1), NodeId(2), NodeId(3)]
        );
        assert!(!partition.is_discrete());
    }

    #[test]
    fn test_uniquely_named_graph_is_discrete_immediately() {
        let mut graph = TestGraph::new();
        graph.add_vertex("1", "L1").unwrap();
        graph.add_vertex("2", "L2").unwrap();
        graph.add_named_directed_edge("1", "2", "L3").unwrap();

        let (partition, outcome) = refine(&graph);
        assert!(partition.is_discrete());
        assert_eq!(outcome, RefinementOutcome { rounds: 1, stable: true });
        assert!(partition.to_labelling().is_some());
    }

    #[test]
    fn test_neighbourhood_resolves_ambiguity() {
        let mut graph = TestGraph::new();
        graph.add_vertex("1", "L1").unwrap();
        graph.add_vertex("2", "L2").unwrap();
        graph.add_vertex("3", "L2").unwrap();
        graph.add_named_directed_edge("1", "2", "L3").unwrap();
        graph.add_named_directed_edge("1", "3", "L4").unwrap();

        let (partition, outcome) = refine(&graph);
        assert!(partition.is_discrete());
        assert!(outcome.stable);
        assert!(partition.ambiguous_nodes().is_empty());
    }

    #[test]
    fn test_symmetric_graph_stays_ambiguous() {
        let mut graph = TestGraph::new();
        graph.add_vertex("1", "L1").unwrap();
        let c1 = graph.add_vertex("2", "L2").unwrap();
        let c2 = graph.add_vertex("3", "L2").unwrap();
        let e1 = graph.add_named_directed_edge("1", "2", "L3").unwrap();
        let e2 = graph.add_named_directed_edge("1", "3", "L3").unwrap();

        let (partition, outcome) = refine(&graph);
        assert!(outcome.stable);
        assert!(!partition.is_discrete());
        assert_eq!(partition.group_count(), 3);
        assert_eq!(sorted(partition.ambiguous_nodes()), vec![c1, c2, e1, e2]);
        assert_eq!(partition.group(&partition.label_of(c1)), &[c1, c2]);
        assert!(partition.to_labelling().is_none());
    }

    #[test]
    fn test_individualization_breaks_symmetry() {
        let mut graph = TestGraph::new();
        graph.add_vertex("1", "L1").unwrap();
        let c1 = graph.add_vertex("2", "L2").unwrap();
        graph.add_vertex("3", "L2").unwrap();
        graph.add_named_directed_edge("1", "2", "L3").unwrap();
        graph.add_named_directed_edge("1", "3", "L3").unwrap();

        let refiner = ColourRefiner::new(graph.nodes(), &LabellerConfig::default());
        let mut partition = refiner.seed();
        refiner.refine(&mut partition);

        let label = partition.individualize(c1);
        assert_eq!(label, Label::generated(1));
        assert_eq!(partition.individualized(), 1);
        assert_eq!(partition.group(&label), &[c1]);

        refiner.refine(&mut partition);
        assert!(partition.is_discrete());
        assert_eq!(partition.label_of(c1), label);
    }

    #[test]
    fn test_cycle_refines_synchronously() {
        // directed triangle with a tail; the tail breaks the rotation
        let mut graph = TestGraph::new();
        for id in ["1", "2", "3"] {
            graph.add_vertex(id, "L1").unwrap();
        }
        graph.add_vertex("4", "L2").unwrap();
        graph.add_named_directed_edge("1", "2", "L3").unwrap();
        graph.add_named_directed_edge("2", "3", "L3").unwrap();
        graph.add_named_directed_edge("3", "1", "L3").unwrap();
        graph.add_named_directed_edge("1", "4", "L3").unwrap();

        let (partition, _) = refine(&graph);
        assert!(partition.is_discrete());
    }

    #[test]
    fn test_round_bound_limits_passes() {
        let mut graph = TestGraph::new();
        for id in ["1", "2", "3", "4"] {
            graph.add_vertex(id, "L1").unwrap();
        }
        graph.add_named_directed_edge("1", "2", "E").unwrap();
        graph.add_named_directed_edge("2", "3", "E").unwrap();
        graph.add_named_directed_edge("3", "4", "E").unwrap();

        let config = LabellerConfig {
            max_rounds: Some(1),
            ..LabellerConfig::default()
        };
        let refiner = ColourRefiner::new(graph.nodes(), &config);
        let mut partition = refiner.seed();
        let outcome = refiner.refine(&mut partition);

        assert_eq!(outcome, RefinementOutcome { rounds: 1, stable: false });
        assert!(!partition.is_discrete());

        let outcome = ColourRefiner::new(graph.nodes(), &LabellerConfig::default())
            .refine(&mut partition);
        assert!(outcome.stable);
        assert!(partition.is_discrete());
    }

    #[test]
    fn test_empty_partition() {
        let graph = TestGraph::new();
        let (partition, outcome) = refine(&graph);
        assert!(partition.is_empty());
        assert!(partition.is_discrete());
        assert_eq!(outcome.rounds, 0);
    }
}
