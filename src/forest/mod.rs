//! Read-only view of a decoder's search hypergraph.
//!
//! Each `Hypothesis` is a scored partial translation covering a source span.
//! Its `alternatives` are the incoming hyperarcs: the different ways the
//! decoder could have built it. An alternative binds each of its slots to
//! either fixed target text or a child hypothesis, and carries only the
//! local score contribution of that decision.

mod builder;
mod io;
mod score;
mod validate;

pub use builder::ForestBuilder;
pub use score::ScoreBreakdown;

use std::fmt;
use std::io as std_io;

use serde::{Deserialize, Serialize};

/// Unified error type for loading, saving and validating forests.
#[derive(Debug, thiserror::Error)]
pub enum ForestError {
    #[error("IO error: {0}")]
    Io(#[from] std_io::Error),

    #[error("invalid header (too short)")]
    InvalidHeader,

    #[error("invalid magic bytes (expected CKFB)")]
    InvalidMagic,

    #[error("unsupported version: {0}")]
    UnsupportedVersion(u8),

    #[error("checksum mismatch (expected {expected:08x}, found {found:08x})")]
    Checksum { expected: u32, found: u32 },

    #[error("serialization error: {0}")]
    Serialize(bincode::Error),

    #[error("deserialization error: {0}")]
    Deserialize(bincode::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("node {node} alternative {alternative} slot {slot} references missing node {target}")]
    DanglingSlot {
        node: NodeId,
        alternative: usize,
        slot: usize,
        target: NodeId,
    },

    #[error("top-level entry {index} references missing node {target}")]
    DanglingTop { index: usize, target: NodeId },

    #[error("cycle detected through node {0}")]
    Cycle(NodeId),

    #[error("node {0} has no alternatives")]
    EmptyNode(NodeId),
}

/// Dense handle of a hypothesis within its forest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Source span covered by a hypothesis (word positions, end exclusive).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}..{})", self.start, self.end)
    }
}

/// One slot of an alternative, in target-side order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    /// Fixed output text contributed by the rule itself.
    Terminal(String),
    /// A non-terminal bound to a child hypothesis covering `span`.
    NonTerminal { node: NodeId, span: Span },
}

/// One incoming hyperarc of a hypothesis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alternative {
    /// Rule name or left-hand side, used only for display.
    #[serde(default)]
    pub rule: Option<String>,
    /// Local score of this decision, excluding child contributions.
    pub score: f32,
    #[serde(default)]
    pub breakdown: ScoreBreakdown,
    pub slots: Vec<Slot>,
}

impl Alternative {
    /// Child hypotheses in slot order. This is the hyperarc's tail.
    pub fn tail(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.slots.iter().filter_map(|slot| match slot {
            Slot::NonTerminal { node, .. } => Some(*node),
            Slot::Terminal(_) => None,
        })
    }

    pub fn arity(&self) -> usize {
        self.tail().count()
    }
}

/// A scored partial translation covering a source span.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hypothesis {
    pub label: String,
    pub span: Span,
    /// Total score of the hypothesis' best derivation, as reported by the decoder.
    pub score: f32,
    #[serde(default)]
    pub breakdown: ScoreBreakdown,
    pub alternatives: Vec<Alternative>,
}

/// The hypergraph produced by chart decoding one sentence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Forest {
    /// The source sentence, if the producer recorded it.
    #[serde(default)]
    pub source: Option<String>,
    pub nodes: Vec<Hypothesis>,
    /// Competing sentence-level hypotheses, best first.
    pub tops: Vec<NodeId>,
}

impl Forest {
    /// Look up a node. Panics on a handle from another forest.
    #[inline]
    pub fn node(&self, id: NodeId) -> &Hypothesis {
        &self.nodes[id.index()]
    }

    pub fn get(&self, id: NodeId) -> Option<&Hypothesis> {
        self.nodes.get(id.index())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Total number of alternatives across all nodes.
    pub fn alternative_count(&self) -> usize {
        self.nodes.iter().map(|n| n.alternatives.len()).sum()
    }
}
