//! Labelled graph with a uniform node arena
//!
//! From the caller's perspective a graph consists of named vertices joined
//! by directed or undirected, optionally named, edges. Internally every
//! vertex and every named edge is a [`Node`] in one arena, and nodes are
//! joined by unnamed arcs. A named edge becomes an intermediate edge node:
//!
//! ```text
//! directed   A -e-> B   :  A -> X -> B
//! undirected A -e-  B   :  A -> X -> B  and  B -> X -> A
//! ```
//!
//! Unnamed edges connect the endpoint nodes directly. Arcs form a set:
//! adding an arc that exists already changes nothing. Nodes never own each
//! other; arcs are [`NodeId`] indices into the arena owned by the graph.

use std::borrow::Borrow;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::fmt::{self, Debug, Display};
use std::hash::{Hash, Hasher};

use log::trace;
use serde::{Deserialize, Serialize};

use crate::algorithm::graph::isomorphism::{GraphIsomorphism, IsomorphismMapping};
use crate::algorithm::graph::labeller::GraphLabeller;
use crate::algorithm::traits::{GraphError, GraphResult, NodeId};
use crate::config::LabellerConfig;

/// Hash shared by every node without a name.
pub const ABSENT_NAME_HASH: u64 = 0x9e37_79b9_7f4a_7c15;

/// Whether a node stands for a vertex or for a named edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Vertex,
    Edge,
}

/// Name of a node, tagged with the kind of node it belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeName<V, E> {
    Vertex(Option<V>),
    Edge(Option<E>),
}

/// Node of the internal graph representation
#[derive(Debug, Clone)]
pub struct Node<V, E> {
    /// Diagnostic identifier, never compared
    id: String,
    name: NodeName<V, E>,
    out_arcs: Vec<NodeId>,
    in_arcs: Vec<NodeId>,
}

impl<V, E> Node<V, E> {
    fn new(id: String, name: NodeName<V, E>) -> Self {
        Self {
            id,
            name,
            out_arcs: Vec::new(),
            in_arcs: Vec::new(),
        }
    }

    #[inline]
    pub fn kind(&self) -> NodeKind {
        match self.name {
            NodeName::Vertex(_) => NodeKind::Vertex,
            NodeName::Edge(_) => NodeKind::Edge,
        }
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[inline]
    pub fn name(&self) -> &NodeName<V, E> {
        &self.name
    }

    pub fn has_name(&self) -> bool {
        match &self.name {
            NodeName::Vertex(name) => name.is_some(),
            NodeName::Edge(name) => name.is_some(),
        }
    }

    /// Nodes this node has an arc to, without repetitions
    #[inline]
    pub fn out_arcs(&self) -> &[NodeId] {
        &self.out_arcs
    }

    /// Nodes that have an arc to this node
    #[inline]
    pub fn in_arcs(&self) -> &[NodeId] {
        &self.in_arcs
    }
}

impl<V: PartialEq, E: PartialEq> Node<V, E> {
    /// Checks whether two nodes are logically corresponding: same kind and
    /// equal names, where two absent names are equal. Unlike identity, this
    /// holds across graphs.
    pub fn is_equivalent(&self, other: &Node<V, E>) -> bool {
        self.name == other.name
    }
}

impl<V: Hash, E: Hash> Node<V, E> {
    /// Deterministic hash of the node's name, the seed of refinement.
    pub fn name_hash(&self) -> u64 {
        match &self.name {
            NodeName::Vertex(Some(name)) => hash_one(name),
            NodeName::Edge(Some(name)) => hash_one(name),
            NodeName::Vertex(None) | NodeName::Edge(None) => ABSENT_NAME_HASH,
        }
    }
}

fn hash_one<T: Hash + ?Sized>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

impl<V: Debug, E: Debug> Display for Node<V, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            NodeName::Vertex(Some(name)) => write!(f, "({}, {:?})", self.id, name),
            NodeName::Edge(Some(name)) => write!(f, "({}, {:?})", self.id, name),
            NodeName::Vertex(None) | NodeName::Edge(None) => write!(f, "({}, \"\")", self.id),
        }
    }
}

/// A generic labelled graph.
///
/// `I` is the type of vertex identifiers, `V` the type of vertex names and
/// `E` the type of edge names.
#[derive(Debug, Clone)]
pub struct Graph<I, V, E = V> {
    vertices: HashMap<I, NodeId>,
    nodes: Vec<Node<V, E>>,
}

impl<I, V, E> Default for Graph<I, V, E> {
    fn default() -> Self {
        Self {
            vertices: HashMap::new(),
            nodes: Vec::new(),
        }
    }
}

impl<I, V, E> Graph<I, V, E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes: vertices plus edge nodes
    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn edge_node_count(&self) -> usize {
        self.nodes.len() - self.vertices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> Option<&Node<V, E>> {
        self.nodes.get(id.as_usize())
    }

    /// All nodes of the graph, indexed by `NodeId`
    #[inline]
    pub fn nodes(&self) -> &[Node<V, E>] {
        &self.nodes
    }

    /// Vertex identifiers and the nodes they address, in no particular order
    pub fn vertex_ids(&self) -> impl Iterator<Item = (&I, NodeId)> + '_ {
        self.vertices.iter().map(|(id, &node)| (id, node))
    }

    /// Enumerates the discrete labellings of this graph with the default
    /// configuration.
    pub fn labeller(&self) -> GraphLabeller<'_, V, E>
    where
        V: Hash,
        E: Hash,
    {
        GraphLabeller::new(&self.nodes, &LabellerConfig::default())
    }

    fn push_node(&mut self, id: String, name: NodeName<V, E>) -> NodeId {
        let node_id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(id, name));
        node_id
    }

    /// Adds the arc `from -> to` unless it exists already; arcs form a set.
    fn connect(&mut self, from: NodeId, to: NodeId) {
        if self.nodes[from.as_usize()].out_arcs.contains(&to) {
            return;
        }
        self.nodes[from.as_usize()].out_arcs.push(to);
        self.nodes[to.as_usize()].in_arcs.push(from);
    }
}

impl<I: Eq + Hash + Display, V, E> Graph<I, V, E> {
    /// Adds a vertex to the graph.
    ///
    /// Fails with [`GraphError::DuplicateVertex`] if `id` exists already.
    pub fn add_vertex(
        &mut self,
        id: impl Into<I>,
        name: impl Into<Option<V>>,
    ) -> GraphResult<NodeId> {
        let id = id.into();
        if self.vertices.contains_key(&id) {
            return Err(GraphError::DuplicateVertex { id: id.to_string() });
        }

        let node = self.push_node(id.to_string(), NodeName::Vertex(name.into()));
        trace!("Added vertex '{}' as node {}", id, node);
        self.vertices.insert(id, node);
        Ok(node)
    }

    /// Adds a directed unnamed edge: a single arc between the endpoints.
    pub fn add_directed_edge<Q>(&mut self, from: &Q, to: &Q) -> GraphResult<()>
    where
        I: Borrow<Q>,
        Q: Eq + Hash + Display + ?Sized,
    {
        let from_node = self.vertex_node(from)?;
        let to_node = self.vertex_node(to)?;

        self.connect(from_node, to_node);
        Ok(())
    }

    /// Adds a directed edge node between the endpoints and returns it.
    ///
    /// A `None` name still creates the intermediate edge node; use
    /// [`Graph::add_directed_edge`] for a plain arc.
    pub fn add_named_directed_edge<Q>(
        &mut self,
        from: &Q,
        to: &Q,
        name: impl Into<Option<E>>,
    ) -> GraphResult<NodeId>
    where
        I: Borrow<Q>,
        Q: Eq + Hash + Display + ?Sized,
    {
        let from_node = self.vertex_node(from)?;
        let to_node = self.vertex_node(to)?;

        let edge_node = self.push_node(format!("{}->{}", from, to), NodeName::Edge(name.into()));
        self.connect(from_node, edge_node);
        self.connect(edge_node, to_node);
        Ok(edge_node)
    }

    /// Adds an undirected unnamed edge: one arc in each direction.
    pub fn add_undirected_edge<Q>(&mut self, vertex1: &Q, vertex2: &Q) -> GraphResult<()>
    where
        I: Borrow<Q>,
        Q: Eq + Hash + Display + ?Sized,
    {
        let node1 = self.vertex_node(vertex1)?;
        let node2 = self.vertex_node(vertex2)?;

        self.connect(node1, node2);
        self.connect(node2, node1);
        Ok(())
    }

    /// Adds an undirected edge node between the endpoints and returns it.
    ///
    /// The edge node ends up with both endpoints among its in-arcs and its
    /// out-arcs, so it looks the same from either side.
    pub fn add_named_undirected_edge<Q>(
        &mut self,
        vertex1: &Q,
        vertex2: &Q,
        name: impl Into<Option<E>>,
    ) -> GraphResult<NodeId>
    where
        I: Borrow<Q>,
        Q: Eq + Hash + Display + ?Sized,
    {
        let node1 = self.vertex_node(vertex1)?;
        let node2 = self.vertex_node(vertex2)?;

        let edge_node = self.push_node(
            format!("{}--{}", vertex1, vertex2),
            NodeName::Edge(name.into()),
        );
        self.connect(node1, edge_node);
        self.connect(edge_node, node2);
        self.connect(node2, edge_node);
        self.connect(edge_node, node1);
        Ok(edge_node)
    }

    /// Node addressed by a vertex id
    pub fn vertex<Q>(&self, id: &Q) -> Option<NodeId>
    where
        I: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.vertices.get(id).copied()
    }

    pub fn contains_vertex<Q>(&self, id: &Q) -> bool
    where
        I: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.vertices.contains_key(id)
    }

    fn vertex_node<Q>(&self, id: &Q) -> GraphResult<NodeId>
    where
        I: Borrow<Q>,
        Q: Eq + Hash + Display + ?Sized,
    {
        self.vertex(id).ok_or_else(|| GraphError::MissingVertex { id: id.to_string() })
    }
}

impl<I, V, E> Graph<I, V, E>
where
    V: Hash + PartialEq,
    E: Hash + PartialEq,
{
    /// Returns true if `other` is isomorphic to this graph.
    pub fn is_isomorphic<J>(&self, other: &Graph<J, V, E>) -> bool {
        GraphIsomorphism::new()
            .detect_isomorphism(Some(self), Some(other))
            .is_isomorphic
    }

    /// Returns the node correspondence of an isomorphism onto `other`, if
    /// one exists.
    pub fn find_isomorphism<J>(&self, other: &Graph<J, V, E>) -> Option<IsomorphismMapping> {
        GraphIsomorphism::new()
            .detect_isomorphism(Some(self), Some(other))
            .mapping
    }
}
