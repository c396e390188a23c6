//! Row-stochastic and symmetric edge-weight normalization.
//!
//! Both variants derive the per-node degree vector from the SpMM kernel
//! (adjacency times an all-ones column) rather than a per-node loop, and
//! both clamp the inverse of a zero degree to 0 so isolated nodes
//! produce zero normalized weight instead of Inf/NaN.

use log::{debug, trace};
use smartcore::linalg::basic::arrays::Array;

use crate::edges::EdgeList;
use crate::error::Result;
use crate::graph::SparseGraph;
use crate::spmm::{dense_from_rows, spmm_scatter};

/// Weighted row sums (`rowsum = A · 1`) via the scatter kernel.
fn row_sums(edges: &EdgeList) -> Result<Vec<f64>> {
    let n = edges.num_nodes();
    let ones = dense_from_rows(&vec![1.0; n], n, 1);
    let values = edges.weights_or_ones();
    let out = spmm_scatter(edges.row(), edges.col(), &values, &ones)?;
    Ok((0..n).map(|i| *out.get((i, 0))).collect())
}

/// Row-stochastic normalization: `w'[e] = w[e] / rowsum[row[e]]`.
///
/// Rows with zero sum keep zero outgoing weight (inverse clamped to 0).
pub fn row_normalization(edges: &EdgeList) -> Result<Vec<f64>> {
    let rowsum = row_sums(edges)?;
    let inv: Vec<f64> = rowsum
        .iter()
        .map(|&s| if s == 0.0 { 0.0 } else { 1.0 / s })
        .collect();

    let weights = edges.weights_or_ones();
    let normalized = (0..edges.num_edges())
        .map(|e| weights[e] * inv[edges.row()[e]])
        .collect();
    trace!(
        "row_normalization over {} edges, {} nodes",
        edges.num_edges(),
        edges.num_nodes()
    );
    Ok(normalized)
}

/// Symmetric normalization:
/// `w'[e] = rowsum[col[e]]^-1/2 * w[e] * rowsum[row[e]]^-1/2`.
///
/// Zero-degree inverse square roots are clamped to 0, same rule as the
/// row variant.
pub fn symmetric_normalization(edges: &EdgeList) -> Result<Vec<f64>> {
    let rowsum = row_sums(edges)?;
    let inv_sqrt: Vec<f64> = rowsum
        .iter()
        .map(|&s| if s <= 0.0 { 0.0 } else { 1.0 / s.sqrt() })
        .collect();

    let weights = edges.weights_or_ones();
    let normalized = (0..edges.num_edges())
        .map(|e| inv_sqrt[edges.col()[e]] * weights[e] * inv_sqrt[edges.row()[e]])
        .collect();
    trace!(
        "symmetric_normalization over {} edges, {} nodes",
        edges.num_edges(),
        edges.num_nodes()
    );
    Ok(normalized)
}

impl SparseGraph {
    /// Replace edge weights with their row-stochastic normalization
    /// (in-place by convention; the structure and its caches survive).
    pub fn normalize_row(&mut self) -> Result<()> {
        let w = row_normalization(self.edges())?;
        debug!("normalize_row applied to {} edges", w.len());
        self.set_edge_weights(Some(w))
    }

    /// Replace edge weights with their symmetric normalization
    /// (in-place by convention; the structure and its caches survive).
    pub fn normalize_symmetric(&mut self) -> Result<()> {
        let w = symmetric_normalization(self.edges())?;
        debug!("normalize_symmetric applied to {} edges", w.len());
        self.set_edge_weights(Some(w))
    }
}
