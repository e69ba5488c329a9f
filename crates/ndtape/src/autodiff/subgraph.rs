//! Selection of the recorded operations that connect sources to a target.
//!
//! Two linear scans over the tape:
//!
//! ```text
//! forward:  mark nodes with an input descending from a source
//! backward: keep marked nodes whose output feeds the target
//! ```
//!
//! The result excludes side branches that never see a source and dead
//! ends that never reach the target, so the backward pass neither visits
//! them nor needs gradient functions for them.

use super::tape::TapeNode;
use super::tensor::TensorId;
use crate::scalar::Scalar;
use std::collections::HashSet;

/// Nodes lying on some path from a source to the target.
#[derive(Debug, Clone, Default)]
pub struct FilteredSubgraph {
    /// Indices into the scanned node slice, in forward order.
    nodes: Vec<usize>,
    /// Tensors on some source-to-target path (target and reached sources included).
    on_path: HashSet<TensorId>,
}

impl FilteredSubgraph {
    /// Indices of the relevant nodes, in execution order.
    pub fn node_indices(&self) -> &[usize] {
        &self.nodes
    }

    /// Whether a gradient for `id` is needed by the backward pass.
    pub fn is_on_path(&self, id: TensorId) -> bool {
        self.on_path.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Filter `nodes` down to those on a path from any of `sources` to `target`.
///
/// `nodes` must be in execution order. An unknown or unreachable target
/// yields an empty subgraph.
pub fn filter_nodes<T: Scalar>(
    nodes: &[TapeNode<T>],
    sources: &[TensorId],
    target: TensorId,
) -> FilteredSubgraph {
    // Forward: which outputs descend from a source.
    let mut from_sources: HashSet<TensorId> = sources.iter().copied().collect();
    let mut node_from_sources = vec![false; nodes.len()];
    for (i, node) in nodes.iter().enumerate() {
        if node
            .inputs()
            .iter()
            .any(|(_, input)| from_sources.contains(input))
        {
            from_sources.insert(node.output_id());
            node_from_sources[i] = true;
        }
    }

    // Backward: which of those feed the target.
    let mut on_path: HashSet<TensorId> = HashSet::new();
    on_path.insert(target);
    let mut relevant = Vec::new();
    for (i, node) in nodes.iter().enumerate().rev() {
        if !node_from_sources[i] || !on_path.contains(&node.output_id()) {
            continue;
        }
        for &(_, input) in node.inputs() {
            if from_sources.contains(&input) {
                on_path.insert(input);
            }
        }
        relevant.push(i);
    }
    relevant.reverse();

    FilteredSubgraph {
        nodes: relevant,
        on_path,
    }
}
