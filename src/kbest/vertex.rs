use std::collections::{BinaryHeap, HashSet};
use std::rc::Rc;

use crate::forest::NodeId;

use super::derivation::{Candidate, Derivation};

/// Index of a vertex in the extractor's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct VertexId(pub u32);

impl VertexId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// What a vertex stands for: a forest node, or the virtual root joining
/// the top-level hypotheses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum VertexSource {
    Node(NodeId),
    Root,
}

/// Search state for one hypothesis.
#[derive(Debug)]
pub(crate) struct Vertex {
    pub source: VertexSource,
    /// Confirmed derivations, rank 0 = best.
    pub k_best: Vec<Rc<Derivation>>,
    /// Proposed derivations not yet confirmed at a rank.
    pub candidates: BinaryHeap<Candidate>,
    /// Every derivation ever proposed for this vertex.
    pub seen: HashSet<Rc<Derivation>>,
    pub visited: bool,
    /// Number of leading `k_best` entries whose neighbours have been proposed.
    pub advanced: usize,
}

impl Vertex {
    pub fn new(source: VertexSource) -> Self {
        Self {
            source,
            k_best: Vec::new(),
            candidates: BinaryHeap::new(),
            seen: HashSet::new(),
            visited: false,
            advanced: 0,
        }
    }

    pub fn node(&self) -> Option<NodeId> {
        match self.source {
            VertexSource::Node(n) => Some(n),
            VertexSource::Root => None,
        }
    }
}
