//! Backtracking enumeration of discrete labellings
//!
//! Colour refinement alone cannot tell apart nodes that are swapped by a
//! symmetry of the graph. [`GraphLabeller`] resolves such ties by
//! depth-first individualization: it picks one ambiguous node, gives it a
//! fresh generated label, refines again, and on reaching a discrete
//! partition emits the labelling. Later requests backtrack to the most
//! recent branching point and try its next alternative.
//!
//! # State Machine
//!
//! ```text
//! Init ──seed──▶ Refining ──discrete──▶ emit ──▶ Branching | Done
//!                   ▲   └─not discrete─▶ push frame ─┐
//!                   └────── individualize next ◀─────┘
//! ```
//!
//! Each [`BranchFrame`] holds the partition it was created from and the
//! alternatives still to try there, so backtracking is a pop instead of a
//! scan for marker entries.
//!
//! # Generated Labels
//!
//! The value of a generated label is the number of individualizations on
//! the current root-to-leaf path. Values therefore increase strictly along
//! every path and are restored on backtrack, which keeps labellings of two
//! isomorphic graphs comparable however their branches are ordered.

use std::hash::Hash;

use log::{debug, trace};

use crate::algorithm::graph::refinement::{ColourRefiner, Partition};
use crate::algorithm::traits::{GraphError, GraphResult, NodeId};
use crate::config::LabellerConfig;
use crate::data_structures::graph::Node;
use crate::data_structures::label::Labelling;

/// Enumeration progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabellerState {
    /// Nothing computed yet
    Init,
    /// Refining the current partition
    Refining,
    /// A labelling was emitted; the next request backtracks
    Branching,
    /// Every branch has been explored
    Done,
}

/// One branching point of the individualization tree
#[derive(Debug, Clone)]
struct BranchFrame {
    partition: Partition,
    /// Alternatives not yet tried, next one last
    alternatives: Vec<NodeId>,
}

impl BranchFrame {
    fn new(partition: Partition) -> Self {
        let mut alternatives = partition.ambiguous_nodes();
        alternatives.reverse();
        Self {
            partition,
            alternatives,
        }
    }
}

/// Lazy, finite, non-restartable sequence of the discrete labellings of a
/// graph.
#[derive(Debug, Clone)]
pub struct GraphLabeller<'g, V, E> {
    refiner: ColourRefiner<'g, V, E>,
    node_count: usize,
    state: LabellerState,
    partition: Option<Partition>,
    frames: Vec<BranchFrame>,
    emitted: usize,
}

impl<'g, V: Hash, E: Hash> GraphLabeller<'g, V, E> {
    pub fn new(nodes: &'g [Node<V, E>], config: &LabellerConfig) -> Self {
        Self {
            refiner: ColourRefiner::new(nodes, config),
            node_count: nodes.len(),
            state: LabellerState::Init,
            partition: None,
            frames: Vec::new(),
            emitted: 0,
        }
    }

    #[inline]
    pub fn state(&self) -> LabellerState {
        self.state
    }

    /// Labellings produced so far
    #[inline]
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    /// Whether another call to [`next_labelling`](Self::next_labelling)
    /// will succeed.
    pub fn has_more(&self) -> bool {
        match self.state {
            LabellerState::Init => self.node_count > 0,
            LabellerState::Done => false,
            LabellerState::Refining | LabellerState::Branching => self
                .frames
                .iter()
                .any(|frame| !frame.alternatives.is_empty()),
        }
    }

    /// Produces the next discrete labelling.
    ///
    /// Fails with [`GraphError::Exhausted`] once every branch has been
    /// explored, and for a graph without nodes.
    pub fn next_labelling(&mut self) -> GraphResult<Labelling> {
        let mut partition = match self.state {
            LabellerState::Init => {
                if self.node_count == 0 {
                    self.state = LabellerState::Done;
                    return Err(GraphError::Exhausted);
                }
                self.refiner.seed()
            }
            LabellerState::Refining | LabellerState::Branching => self.select_next_alternative()?,
            LabellerState::Done => return Err(GraphError::Exhausted),
        };

        self.state = LabellerState::Refining;
        loop {
            let outcome = self.refiner.refine(&mut partition);
            if partition.is_discrete() {
                break;
            }

            trace!(
                "Branching at depth {} after {} refinement round(s)",
                partition.individualized(),
                outcome.rounds
            );
            self.frames.push(BranchFrame::new(partition));
            partition = self.select_next_alternative()?;
        }

        let labelling = partition.to_labelling().ok_or(GraphError::Exhausted)?;
        self.partition = Some(partition);
        self.emitted += 1;
        self.state = if self.has_more() {
            LabellerState::Branching
        } else {
            LabellerState::Done
        };

        debug!(
            "Emitted labelling #{} of {} node(s); state {:?}",
            self.emitted, self.node_count, self.state
        );
        Ok(labelling)
    }

    /// Partition behind the most recently emitted labelling
    pub fn current_partition(&self) -> Option<&Partition> {
        self.partition.as_ref()
    }

    /// Pops exhausted frames and individualizes the next alternative of the
    /// innermost remaining one.
    fn select_next_alternative(&mut self) -> GraphResult<Partition> {
        while let Some(frame) = self.frames.last_mut() {
            if let Some(node) = frame.alternatives.pop() {
                let mut partition = frame.partition.clone();
                let label = partition.individualize(node);
                trace!("Individualized node {} as {}", node, label);
                return Ok(partition);
            }
            self.frames.pop();
        }

        self.state = LabellerState::Done;
        Err(GraphError::Exhausted)
    }
}

impl<'g, V: Hash, E: Hash> Iterator for GraphLabeller<'g, V, E> {
    type Item = Labelling;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_labelling().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_structures::graph::Graph;
    use crate::data_structures::label::Label;
    use std::collections::HashSet;

    type TestGraph = Graph<String, &'static str>;

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    /// Drains the labeller and checks that every labelling is a bijection
    /// over all nodes of the graph.
    fn verify_labellings(graph: &TestGraph, variants: usize) {
        init_logging();
        let mut labeller = graph.labeller();

        for variant in 0..variants {
            assert!(
                labeller.has_more(),
                "expected {} labellings, found {}",
                variants,
                variant
            );
            let labelling = labeller.next_labelling().unwrap();
            verify_labelling(graph, &labelling);
        }
        assert!(!labeller.has_more(), "more than {} labellings found", variants);
        assert_eq!(labeller.next_labelling(), Err(GraphError::Exhausted));
        assert_eq!(labeller.state(), LabellerState::Done);
        assert_eq!(labeller.emitted(), variants);
    }

    fn verify_labelling(graph: &TestGraph, labelling: &Labelling) {
        assert_eq!(labelling.len(), graph.node_count());

        let mut seen = HashSet::new();
        for (index, node) in graph.nodes().iter().enumerate() {
            let label = labelling
                .label_of(NodeId(index))
                .unwrap_or_else(|| panic!("node {} has not been labelled", node));
            assert!(seen.insert(label), "label {} is not unique", label);
            assert_eq!(labelling.node_with(&label), Some(NodeId(index)));
        }
    }

    #[test]
    fn test_empty_graph_has_no_labelling() {
        let graph = TestGraph::new();
        let mut labeller = graph.labeller();

        assert!(!labeller.has_more());
        assert_eq!(labeller.next_labelling(), Err(GraphError::Exhausted));
        assert_eq!(labeller.state(), LabellerState::Done);
    }

    #[test]
    fn test_fails_after_last_labelling() {
        let mut graph = TestGraph::new();
        graph.add_vertex("1", "L1").unwrap();

        let mut labeller = graph.labeller();
        assert_eq!(labeller.state(), LabellerState::Init);
        assert!(labeller.has_more());
        assert!(labeller.next_labelling().is_ok());
        assert!(!labeller.has_more());
        assert_eq!(labeller.next_labelling(), Err(GraphError::Exhausted));
        assert!(labeller.next().is_none());
    }

    #[test]
    fn test_uniquely_named_nodes() {
        let mut graph = TestGraph::new();
        graph.add_vertex("1", "L1").unwrap();
        graph.add_vertex("2", "L2").unwrap();
        graph.add_vertex("3", "L3").unwrap();
        graph.add_named_directed_edge("1", "2", "L4").unwrap();
        graph.add_named_directed_edge("1", "3", "L5").unwrap();

        verify_labellings(&graph, 1);
    }

    #[test]
    fn test_ambiguous_nodes_with_unique_neighbours() {
        let mut graph = TestGraph::new();
        graph.add_vertex("1", "L1").unwrap();
        graph.add_vertex("2", "L2").unwrap();
        graph.add_vertex("3", "L2").unwrap();
        graph.add_named_directed_edge("1", "2", "L3").unwrap();
        graph.add_named_directed_edge("1", "3", "L4").unwrap();

        verify_labellings(&graph, 1);
    }

    #[test]
    fn test_ambiguous_nodes_with_distinct_neighbourhood() {
        let mut graph = TestGraph::new();
        graph.add_vertex("1", "L1").unwrap();
        graph.add_vertex("2", "L1").unwrap();
        graph.add_vertex("3", "L2").unwrap();
        graph.add_vertex("4", "L3").unwrap();
        graph.add_vertex("5", "L3").unwrap();
        graph.add_named_directed_edge("1", "2", "L4").unwrap();
        graph.add_named_directed_edge("1", "3", "L5").unwrap();
        graph.add_named_directed_edge("1", "4", "L5").unwrap();
        graph.add_named_directed_edge("2", "5", "L5").unwrap();

        verify_labellings(&graph, 1);
    }

    #[test]
    fn test_ambiguous_nodes_in_a_loop() {
        let mut graph = TestGraph::new();
        graph.add_vertex("1", "L1").unwrap();
        graph.add_vertex("2", "L1").unwrap();
        graph.add_vertex("3", "L1").unwrap();
        graph.add_vertex("4", "L2").unwrap();
        graph.add_named_directed_edge("1", "2", "L3").unwrap();
        graph.add_named_directed_edge("2", "3", "L3").unwrap();
        graph.add_named_directed_edge("3", "1", "L3").unwrap();
        graph.add_named_directed_edge("1", "4", "L3").unwrap();

        verify_labellings(&graph, 1);
    }

    #[test]
    fn test_non_resolvable_ambiguity() {
        let mut graph = TestGraph::new();
        graph.add_vertex("1", "L1").unwrap();
        graph.add_vertex("2", "L2").unwrap();
        graph.add_vertex("3", "L2").unwrap();
        graph.add_named_directed_edge("1", "2", "L3").unwrap();
        graph.add_named_directed_edge("1", "3", "L3").unwrap();

        // two children and two edges, each of the four can be picked first
        verify_labellings(&graph, 4);
    }

    #[test]
    fn test_two_non_resolvable_ambiguities() {
        let mut graph = TestGraph::new();
        graph.add_vertex("1", "L1").unwrap();
        graph.add_vertex("2", "L2").unwrap();
        graph.add_vertex("3", "L2").unwrap();
        graph.add_vertex("4", "L2").unwrap();
        graph.add_named_directed_edge("1", "2", "L3").unwrap();
        graph.add_named_directed_edge("1", "3", "L3").unwrap();
        graph.add_named_directed_edge("1", "4", "L3").unwrap();

        // 6 first picks, then 4 second picks among the remaining pairs
        verify_labellings(&graph, 24);
    }

    #[test]
    fn test_non_resolvable_ambiguity_in_a_loop() {
        let mut graph = TestGraph::new();
        graph.add_vertex("1", "L1").unwrap();
        graph.add_vertex("2", "L1").unwrap();
        graph.add_vertex("3", "L1").unwrap();
        graph.add_named_directed_edge("1", "2", "L2").unwrap();
        graph.add_named_directed_edge("2", "3", "L2").unwrap();
        graph.add_named_directed_edge("3", "1", "L2").unwrap();

        verify_labellings(&graph, 6);
    }

    #[test]
    fn test_multiple_components_with_non_resolvable_ambiguity() {
        let mut graph = TestGraph::new();
        graph.add_vertex("1", "L1").unwrap();
        graph.add_vertex("2", "L1").unwrap();
        graph.add_vertex("3", "L2").unwrap();
        graph.add_vertex("4", "L1").unwrap();
        graph.add_vertex("5", "L1").unwrap();
        graph.add_vertex("6", "L2").unwrap();
        graph.add_named_directed_edge("1", "2", "L3").unwrap();
        graph.add_named_directed_edge("1", "3", "L3").unwrap();
        graph.add_named_directed_edge("4", "5", "L3").unwrap();
        graph.add_named_directed_edge("4", "6", "L3").unwrap();

        verify_labellings(&graph, 10);
    }

    #[test]
    fn test_absent_names() {
        let mut graph = TestGraph::new();
        graph.add_vertex("1", None).unwrap();
        graph.add_vertex("2", "L1").unwrap();
        graph.add_named_directed_edge("1", "2", None).unwrap();

        verify_labellings(&graph, 1);
    }

    #[test]
    fn test_generated_labels_follow_path_depth() {
        let mut graph = TestGraph::new();
        graph.add_vertex("1", "L1").unwrap();
        graph.add_vertex("2", "L2").unwrap();
        graph.add_vertex("3", "L2").unwrap();
        graph.add_vertex("4", "L2").unwrap();
        graph.add_named_directed_edge("1", "2", "L3").unwrap();
        graph.add_named_directed_edge("1", "3", "L3").unwrap();
        graph.add_named_directed_edge("1", "4", "L3").unwrap();

        for labelling in graph.labeller() {
            let mut generated: Vec<u64> = labelling
                .labels()
                .filter(|label| label.is_generated())
                .map(|label| label.value())
                .collect();
            generated.sort_unstable();
            assert_eq!(generated, vec![1, 2]);
        }
    }

    #[test]
    fn test_first_branch_follows_insertion_order() {
        let mut graph = TestGraph::new();
        let a = graph.add_vertex("a", "L1").unwrap();
        let b = graph.add_vertex("b", "L1").unwrap();
        let c = graph.add_vertex("c", "L1").unwrap();

        let mut labeller = graph.labeller();
        let labelling = labeller.next_labelling().unwrap();
        let partition = labeller.current_partition().unwrap();

        assert_eq!(partition.individualized(), 2);
        assert_eq!(labelling.label_of(a), Some(Label::generated(1)));
        assert_eq!(labelling.label_of(b), Some(Label::generated(2)));
        assert!(!labelling.label_of(c).unwrap().is_generated());

        // 3 * 2 orderings of three interchangeable vertices
        assert_eq!(labeller.by_ref().count(), 5);
    }
}
