//! k-best derivation extraction for chart-based machine translation.
//!
//! A decoder's search forest shares sub-hypotheses between many sentence
//! translations. `kbest` enumerates the best derivations of that forest
//! lazily, `nbest` writes them out, and `forest` holds the input model and
//! its on-disk formats.

pub mod forest;
pub mod kbest;
pub mod nbest;
pub mod settings;
pub(crate) mod testutil;
pub mod trace_init;

pub use forest::{Forest, ForestBuilder, ForestError, NodeId};
pub use kbest::{extract, extract_from, extract_with, ExtractOptions, KBestEntry, KBestList};
