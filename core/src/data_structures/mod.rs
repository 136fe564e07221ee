//! Labelled graphs and their labellings
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

pub mod graph;
pub mod label;

pub use self::graph::{Graph, Node, NodeKind, NodeName, ABSENT_NAME_HASH};
pub use self::label::{Label, Labelling, Provenance};
