//! k-best derivation extraction from a decoder forest.
//!
//! The forest's top-level hypotheses become the alternatives of a virtual
//! root vertex. Each vertex keeps a priority queue of proposed derivations
//! and a rank-ordered list of confirmed ones; ranks are materialized only
//! when a parent asks for them, so the work grows with `k` rather than with
//! the (exponential) number of derivations in the forest.

mod derivation;
mod extractor;
mod output;
mod vertex;

#[cfg(test)]
mod tests;

use std::collections::HashSet;

use tracing::{debug, debug_span};

use crate::forest::{Forest, NodeId, ScoreBreakdown};
use crate::settings::settings;

pub use derivation::Derivation;

use extractor::Extractor;
use vertex::VertexId;

/// Knobs for a single extraction run.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractOptions {
    /// Number of derivations to return.
    pub k: usize,
    /// Keep only the best derivation of each distinct output string.
    pub distinct: bool,
    /// With `distinct`, search `k * oversample_factor` derivations.
    pub oversample_factor: usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        let s = &settings().kbest;
        Self {
            k: s.k,
            distinct: s.distinct,
            oversample_factor: s.oversample_factor,
        }
    }
}

impl ExtractOptions {
    pub fn with_k(k: usize) -> Self {
        Self {
            k,
            ..Self::default()
        }
    }
}

/// Extract the `k` best derivations reachable from the forest's tops.
pub fn extract(forest: &Forest, k: usize) -> KBestList<'_> {
    extract_from(forest, &forest.tops, k)
}

/// Extract the `k` best derivations rooted at any of `tops`.
///
/// Fewer than `k` entries are returned when the forest holds fewer distinct
/// derivations. Tops that cannot be built contribute nothing.
pub fn extract_from<'f>(forest: &'f Forest, tops: &[NodeId], k: usize) -> KBestList<'f> {
    let _span = debug_span!("kbest_extract", k, top_count = tops.len()).entered();
    let mut ex = Extractor::new(forest);
    let mut entries = Vec::new();

    if k > 0 && !tops.is_empty() {
        let root = ex.create_root(tops);
        ex.lazy_kth_best(root, k);
        // Strip the virtual root: each of its derivations is a unary hyperarc
        // selecting one ranked derivation of a top-level hypothesis.
        entries = ex
            .vertex(root)
            .k_best
            .iter()
            .map(|d| (d.edge.tail[0], d.back_pointers[0]))
            .collect();
    }

    let list = KBestList { ex, entries };
    debug!(
        vertex_count = list.vertex_count(),
        result_count = list.len(),
        best_score = list.get(0).map(|e| e.score())
    );
    list
}

/// Extract according to `options`, optionally collapsing derivations that
/// render to the same output.
pub fn extract_with<'f>(forest: &'f Forest, options: &ExtractOptions) -> KBestList<'f> {
    if !options.distinct {
        return extract(forest, options.k);
    }
    let search_k = options.k.saturating_mul(options.oversample_factor.max(1));
    let mut list = extract(forest, search_k);
    let mut seen = HashSet::new();
    let keep: Vec<(VertexId, usize)> = list
        .iter()
        .filter(|e| seen.insert(e.output()))
        .take(options.k)
        .map(|e| (e.vertex, e.rank))
        .collect();
    list.entries = keep;
    list
}

/// Result of one extraction, rank 0 = best.
///
/// Owns the search state, so entries can be projected and their
/// sub-derivations walked after the search.
pub struct KBestList<'f> {
    ex: Extractor<'f>,
    entries: Vec<(VertexId, usize)>,
}

impl<'f> KBestList<'f> {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, rank: usize) -> Option<KBestEntry<'_, 'f>> {
        self.entries
            .get(rank)
            .map(|&(vertex, rank)| KBestEntry::new(self, vertex, rank))
    }

    pub fn iter(&self) -> impl Iterator<Item = KBestEntry<'_, 'f>> + '_ {
        self.entries
            .iter()
            .map(move |&(vertex, rank)| KBestEntry::new(self, vertex, rank))
    }

    /// Number of vertices the search touched.
    pub fn vertex_count(&self) -> usize {
        self.ex.vertices.len()
    }

    pub fn forest(&self) -> &'f Forest {
        self.ex.forest()
    }

    /// Derivations confirmed so far for `node`, best first. Empty if the
    /// search never reached it.
    pub fn discovered(&self, node: NodeId) -> Vec<KBestEntry<'_, 'f>> {
        match self.ex.vertex_of(node) {
            Some(v) => (0..self.ex.vertex(v).k_best.len())
                .map(|rank| KBestEntry::new(self, v, rank))
                .collect(),
            None => Vec::new(),
        }
    }
}

/// One ranked derivation of one hypothesis.
#[derive(Clone, Copy)]
pub struct KBestEntry<'a, 'f> {
    list: &'a KBestList<'f>,
    vertex: VertexId,
    rank: usize,
}

impl<'a, 'f> KBestEntry<'a, 'f> {
    fn new(list: &'a KBestList<'f>, vertex: VertexId, rank: usize) -> Self {
        Self { list, vertex, rank }
    }

    pub fn derivation(&self) -> &'a Derivation {
        &self.list.ex.vertex(self.vertex).k_best[self.rank]
    }

    pub fn score(&self) -> f32 {
        self.derivation().score()
    }

    pub fn breakdown(&self) -> &'a ScoreBreakdown {
        self.derivation().breakdown()
    }

    /// Rank of this derivation among its hypothesis' derivations.
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// The hypothesis this derivation builds.
    pub fn node(&self) -> NodeId {
        self.list
            .ex
            .vertex(self.vertex)
            .node()
            .expect("entries never refer to the virtual root")
    }

    /// Sub-derivations in tail order.
    pub fn children(&self) -> Vec<KBestEntry<'a, 'f>> {
        let d = self.derivation();
        d.edge
            .tail
            .iter()
            .zip(&d.back_pointers)
            .map(|(&child, &rank)| KBestEntry::new(self.list, child, rank))
            .collect()
    }
}

impl std::fmt::Debug for KBestEntry<'_, '_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KBestEntry")
            .field("node", &self.node())
            .field("rank", &self.rank)
            .field("score", &self.score())
            .field("back_pointers", &self.derivation().back_pointers())
            .finish()
    }
}
