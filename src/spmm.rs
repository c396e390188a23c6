//! Sparse-matrix × dense-matrix multiplication kernels.
//!
//! Three interchangeable algorithms compute
//! `out[i] = Σ_{e: row[e]=i} values[e] * dense[col[e]]`, identical up to
//! floating-point summation order:
//!
//! - **Scatter path** ([`spmm_scatter`]): gather rows of the dense
//!   operand at `col[e]`, scale by `values[e]`, scatter-add into
//!   `out[row[e]]`. The portable reference; the path a gradient-tracking
//!   caller must use.
//! - **Direct path** ([`spmm_direct`]): materialize a `sprs::CsMat` from
//!   the triplets (duplicates merge by summation) and multiply row-wise
//!   via `outer_iterator`.
//! - **Accelerated path** ([`spmm_csr_parallel`]): row-parallel loop over
//!   a prebuilt CSR with rayon. A structure-symmetry hint is accepted;
//!   it does not change the result.
//!
//! Backend selection is explicit at [`SparseGraph`] construction
//! (`SpmmBackend`) and differentiability is an explicit per-call flag
//! (`SpmmMode`); there is no process-global toggle. When the accelerated
//! path cannot run it falls back to the scatter path with a one-time
//! warning.

use std::sync::Once;

use log::{trace, warn};
use rayon::prelude::*;
use smartcore::linalg::basic::arrays::{Array, Array2};
use smartcore::linalg::basic::matrix::DenseMatrix;
use sprs::{CsMat, TriMat};

use crate::edges::EdgeList;
use crate::error::{GraphError, Result};
use crate::graph::SparseGraph;

/// Which kernel a [`SparseGraph`] uses for forward-only SpMM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpmmBackend {
    /// Portable gather/scatter-add loop.
    Scatter,
    /// sprs CSR materialization + row-wise multiply.
    #[default]
    Direct,
    /// Row-parallel CSR kernel over the cached structure.
    Accelerated,
}

/// Whether the caller needs the multiplication to stay on the
/// scatter path (the only one an autodiff context could replay).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpmmMode {
    Differentiable,
    ForwardOnly,
}

static FALLBACK_WARN: Once = Once::new();

fn warn_fallback(reason: &str) {
    FALLBACK_WARN.call_once(|| {
        warn!(
            "accelerated SpMM unavailable ({}), falling back to scatter path",
            reason
        );
    });
}

fn check_edges(row: &[usize], col: &[usize], values: &[f64], n: usize) -> Result<()> {
    if col.len() != row.len() {
        return Err(GraphError::LengthMismatch {
            name: "col",
            got: col.len(),
            expected: row.len(),
        });
    }
    if values.len() != row.len() {
        return Err(GraphError::LengthMismatch {
            name: "values",
            got: values.len(),
            expected: row.len(),
        });
    }
    for &i in row.iter().chain(col.iter()) {
        if i >= n {
            return Err(GraphError::IndexOutOfRange {
                index: i,
                num_nodes: n,
            });
        }
    }
    Ok(())
}

/// Row-major buffer → DenseMatrix, same call shape as the rest of the
/// crate's dense construction.
pub(crate) fn dense_from_rows(buf: &[f64], rows: usize, cols: usize) -> DenseMatrix<f64> {
    DenseMatrix::<f64>::from_iterator(buf.iter().copied(), rows, cols, 0)
}

/// Scatter-based SpMM: safe everywhere, no auxiliary structures.
///
/// `dense` is `[N × F]`; the output has the same shape. Node count is
/// taken from the dense operand.
pub fn spmm_scatter(
    row: &[usize],
    col: &[usize],
    values: &[f64],
    dense: &DenseMatrix<f64>,
) -> Result<DenseMatrix<f64>> {
    let (n, f) = dense.shape();
    check_edges(row, col, values, n)?;

    let mut out = vec![0.0; n * f];
    for e in 0..row.len() {
        let (i, j, w) = (row[e], col[e], values[e]);
        for k in 0..f {
            out[i * f + k] += w * *dense.get((j, k));
        }
    }
    trace!(
        "spmm_scatter: {} edges into ({}, {}) output",
        row.len(),
        n,
        f
    );
    Ok(dense_from_rows(&out, n, f))
}

/// Direct sparse path: build a `CsMat` from the triplets and multiply.
///
/// `TriMat::to_csr` merges duplicate coordinates by summation, so a
/// multigraph edge list behaves as its coalesced equivalent, matching
/// the scatter path exactly.
pub fn spmm_direct(
    row: &[usize],
    col: &[usize],
    values: &[f64],
    dense: &DenseMatrix<f64>,
) -> Result<DenseMatrix<f64>> {
    let (n, f) = dense.shape();
    check_edges(row, col, values, n)?;

    let mut trimat = TriMat::with_capacity((n, n), row.len());
    for e in 0..row.len() {
        trimat.add_triplet(row[e], col[e], values[e]);
    }
    let adj: CsMat<f64> = trimat.to_csr();

    let mut out = vec![0.0; n * f];
    for (i, adj_row) in adj.outer_iterator().enumerate() {
        let out_row = &mut out[i * f..(i + 1) * f];
        for (j, &w) in adj_row.iter() {
            for (k, slot) in out_row.iter_mut().enumerate() {
                *slot += w * *dense.get((j, k));
            }
        }
    }
    trace!("spmm_direct: {}x{} CsMat with {} nnz", n, n, adj.nnz());
    Ok(dense_from_rows(&out, n, f))
}

/// Accelerated CSR SpMM: independent output rows, parallelized with
/// rayon. `symmetric` is a structure hint from the caller; the kernel
/// result does not depend on it.
pub fn spmm_csr_parallel(
    indptr: &[usize],
    indices: &[usize],
    data: &[f64],
    dense: &DenseMatrix<f64>,
    symmetric: bool,
) -> Result<DenseMatrix<f64>> {
    let (n, f) = dense.shape();
    if indptr.len() != n + 1 {
        return Err(GraphError::LengthMismatch {
            name: "indptr",
            got: indptr.len(),
            expected: n + 1,
        });
    }
    if data.len() != indices.len() {
        return Err(GraphError::LengthMismatch {
            name: "data",
            got: data.len(),
            expected: indices.len(),
        });
    }
    trace!(
        "spmm_csr_parallel: {} rows, {} nnz, symmetric={}",
        n,
        indices.len(),
        symmetric
    );

    let mut out = vec![0.0; n * f];
    out.par_chunks_mut(f).enumerate().for_each(|(i, out_row)| {
        for e in indptr[i]..indptr[i + 1] {
            let (j, w) = (indices[e], data[e]);
            for (k, slot) in out_row.iter_mut().enumerate() {
                *slot += w * *dense.get((j, k));
            }
        }
    });
    Ok(dense_from_rows(&out, n, f))
}

/// Per-node row scaling: `out[i, :] = scale[i] * x[i, :]`.
fn scale_rows(x: &DenseMatrix<f64>, scale: &[f64]) -> DenseMatrix<f64> {
    let (n, f) = x.shape();
    let mut buf = vec![0.0; n * f];
    for i in 0..n {
        for k in 0..f {
            buf[i * f + k] = scale[i] * *x.get((i, k));
        }
    }
    dense_from_rows(&buf, n, f)
}

/// Full-graph SpMM: `in_norm * SpMM(A, out_norm * x)`.
///
/// Applies the graph's optional pre/post node-wise scaling vectors
/// around the raw kernel, dispatching on the graph's backend and the
/// caller's mode. `Differentiable` always takes the scatter path.
pub fn spmm(graph: &SparseGraph, x: &DenseMatrix<f64>, mode: SpmmMode) -> Result<DenseMatrix<f64>> {
    let (n, _) = x.shape();
    if n != graph.num_nodes() {
        return Err(GraphError::LengthMismatch {
            name: "dense rows",
            got: n,
            expected: graph.num_nodes(),
        });
    }

    let scaled;
    let input = match graph.out_norm() {
        Some(s) => {
            scaled = scale_rows(x, s);
            &scaled
        }
        None => x,
    };

    let values = graph.edge_weights();
    let raw = run_kernel(graph, &values, input, mode)?;

    Ok(match graph.in_norm() {
        Some(s) => scale_rows(&raw, s),
        None => raw,
    })
}

/// Raw SpMM over the graph's structure with caller-supplied edge values
/// (no `out_norm`/`in_norm` scaling). This is how edge softmax runs its
/// per-node sums without mutating the graph's weights.
pub fn spmm_with_values(
    graph: &SparseGraph,
    values: &[f64],
    x: &DenseMatrix<f64>,
    mode: SpmmMode,
) -> Result<DenseMatrix<f64>> {
    if values.len() != graph.num_edges() {
        return Err(GraphError::LengthMismatch {
            name: "values",
            got: values.len(),
            expected: graph.num_edges(),
        });
    }
    run_kernel(graph, values, x, mode)
}

fn run_kernel(
    graph: &SparseGraph,
    values: &[f64],
    x: &DenseMatrix<f64>,
    mode: SpmmMode,
) -> Result<DenseMatrix<f64>> {
    let edges = graph.edges();
    if mode == SpmmMode::Differentiable {
        return spmm_scatter(edges.row(), edges.col(), values, x);
    }
    match graph.backend() {
        SpmmBackend::Scatter => spmm_scatter(edges.row(), edges.col(), values, x),
        SpmmBackend::Direct => spmm_direct(edges.row(), edges.col(), values, x),
        SpmmBackend::Accelerated => {
            if edges.num_edges() == 0 {
                warn_fallback("empty edge set");
                return spmm_scatter(edges.row(), edges.col(), values, x);
            }
            let csr = graph.csr_with_weights(values)?;
            spmm_csr_parallel(&csr.indptr, &csr.indices, &csr.data, x, graph.is_symmetric())
        }
    }
}

/// Out-degrees as row sums: SpMM of the adjacency against an all-ones
/// column vector.
pub fn degrees(edges: &EdgeList) -> Result<Vec<f64>> {
    let n = edges.num_nodes();
    let ones = dense_from_rows(&vec![1.0; n], n, 1);
    let values = edges.weights_or_ones();
    let out = spmm_scatter(edges.row(), edges.col(), &values, &ones)?;
    Ok((0..n).map(|i| *out.get((i, 0))).collect())
}
