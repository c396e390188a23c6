//! Softmax over the edges sharing a common source node.
//!
//! For each edge `e` with source `row[e]`:
//!
//! ```text
//! softmax[e] = exp(v[e]) / Σ_{e': row[e'] = row[e]} exp(v[e'])
//! ```
//!
//! Stabilization subtracts the per-source maximum before exponentiating
//! (the standard trick), so values like 100 stay finite. The per-node
//! denominator is one SpMM of `exp(v)` against an all-ones column, not a
//! per-node loop. A node whose group is empty would divide by zero; the
//! denominator carries a small epsilon and any residual NaN is replaced
//! by 0.

use log::trace;
use smartcore::linalg::basic::arrays::Array;
use smartcore::linalg::basic::matrix::DenseMatrix;

use crate::error::{GraphError, Result};
use crate::graph::SparseGraph;
use crate::spmm::{dense_from_rows, SpmmMode};

const SOFTMAX_EPS: f64 = 1e-8;

/// Per-source-node softmax of one edge value per edge.
pub fn edge_softmax(graph: &SparseGraph, edge_values: &[f64]) -> Result<Vec<f64>> {
    let e = graph.num_edges();
    if edge_values.len() != e {
        return Err(GraphError::LengthMismatch {
            name: "edge_values",
            got: edge_values.len(),
            expected: e,
        });
    }
    let n = graph.num_nodes();
    let row = graph.edges().row();

    // per-source max, then shift before exponentiating
    let mut group_max = vec![f64::NEG_INFINITY; n];
    for i in 0..e {
        if edge_values[i] > group_max[row[i]] {
            group_max[row[i]] = edge_values[i];
        }
    }
    let exp_values: Vec<f64> = (0..e)
        .map(|i| (edge_values[i] - group_max[row[i]]).exp())
        .collect();

    // denominator per source node: SpMM of exp(v) against ones
    let ones = dense_from_rows(&vec![1.0; n], n, 1);
    let node_sum = crate::spmm::spmm_with_values(graph, &exp_values, &ones, SpmmMode::ForwardOnly)?;

    let softmax: Vec<f64> = (0..e)
        .map(|i| {
            let v = exp_values[i] / (*node_sum.get((row[i], 0)) + SOFTMAX_EPS);
            if v.is_nan() { 0.0 } else { v }
        })
        .collect();
    trace!("edge_softmax over {} edges, {} nodes", e, n);
    Ok(softmax)
}

/// Multi-dimensional edge softmax: the 1-D routine applied independently
/// to each column of an `[E × d]` value matrix, producing `[E × d]`.
pub fn mul_edge_softmax(
    graph: &SparseGraph,
    edge_values: &DenseMatrix<f64>,
) -> Result<DenseMatrix<f64>> {
    let (e, d) = edge_values.shape();
    if e != graph.num_edges() {
        return Err(GraphError::LengthMismatch {
            name: "edge_values rows",
            got: e,
            expected: graph.num_edges(),
        });
    }

    let mut out = vec![0.0; e * d];
    for k in 0..d {
        let column: Vec<f64> = (0..e).map(|i| *edge_values.get((i, k))).collect();
        let softmax = edge_softmax(graph, &column)?;
        for (i, v) in softmax.into_iter().enumerate() {
            out[i * d + k] = v;
        }
    }
    Ok(dense_from_rows(&out, e, d))
}
