//! Labels and labellings
//!
//! A [`Label`] is the colour a node carries during refinement. Its
//! provenance records where the value came from: *fixed* labels are derived
//! deterministically from names and neighbourhoods, *generated* labels are
//! handed out to break ties between symmetric nodes. Equality, hashing and
//! ordering all take provenance into account, so a fixed and a generated
//! label with the same value are different labels.
//!
//! A [`Labelling`] is a frozen snapshot of a discrete partition: every node
//! of one graph mapped to a distinct label. Labellings are immutable once
//! produced.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::algorithm::traits::NodeId;

/// Origin of a label value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Provenance {
    /// Derived from a name hash or a refinement composite
    Fixed,
    /// Assigned while individualizing a tied node
    Generated,
}

impl Provenance {
    #[inline]
    fn code(self) -> u64 {
        match self {
            Provenance::Fixed => 1,
            Provenance::Generated => 2,
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provenance::Fixed => f.write_str("FIXED"),
            Provenance::Generated => f.write_str("GENERATED"),
        }
    }
}

/// Opaque, comparable, hashable node colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Label {
    provenance: Provenance,
    value: u64,
}

impl Label {
    const PRIME: u64 = 31;

    /// Label derived from a name hash or refinement composite
    #[inline]
    pub fn fixed(value: u64) -> Self {
        Self { provenance: Provenance::Fixed, value }
    }

    /// Label used to individualize a single node
    #[inline]
    pub fn generated(value: u64) -> Self {
        Self { provenance: Provenance::Generated, value }
    }

    #[inline]
    pub fn provenance(&self) -> Provenance {
        self.provenance
    }

    #[inline]
    pub fn value(&self) -> u64 {
        self.value
    }

    #[inline]
    pub fn is_generated(&self) -> bool {
        self.provenance == Provenance::Generated
    }

    /// Deterministic hash of the label, the quantity summed over
    /// neighbours when a refinement composite is computed.
    #[inline]
    pub fn signature(&self) -> u64 {
        Self::PRIME
            .wrapping_add(self.provenance.code())
            .wrapping_mul(Self::PRIME)
            .wrapping_add(self.value)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.value, self.provenance)
    }
}

/// Discrete bijection between the nodes of one graph and their labels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Labelling {
    /// Label of each node, indexed by `NodeId`
    labels: Vec<Label>,
    /// Inverse view for label lookups
    nodes: HashMap<Label, NodeId>,
}

impl Labelling {
    /// Builds a labelling from per-node labels.
    ///
    /// Returns `None` if two nodes share a label, i.e. the input does not
    /// describe a bijection.
    pub(crate) fn from_labels(labels: Vec<Label>) -> Option<Self> {
        let mut nodes = HashMap::with_capacity(labels.len());
        for (index, &label) in labels.iter().enumerate() {
            if nodes.insert(label, NodeId(index)).is_some() {
                return None;
            }
        }
        Some(Self { labels, nodes })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Label carried by `node`, if the node belongs to the labelled graph
    #[inline]
    pub fn label_of(&self, node: NodeId) -> Option<Label> {
        self.labels.get(node.as_usize()).copied()
    }

    /// Node carrying `label`
    #[inline]
    pub fn node_with(&self, label: &Label) -> Option<NodeId> {
        self.nodes.get(label).copied()
    }

    #[inline]
    pub fn contains_label(&self, label: &Label) -> bool {
        self.nodes.contains_key(label)
    }

    /// Labels in node order
    pub fn labels(&self) -> impl Iterator<Item = Label> + '_ {
        self.labels.iter().copied()
    }

    /// `(node, label)` pairs in node order
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, Label)> + '_ {
        self.labels
            .iter()
            .enumerate()
            .map(|(index, &label)| (NodeId(index), label))
    }
}
