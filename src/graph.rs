//! Sparse graph handle: one edge list plus derived compressed caches.
//!
//! [`SparseGraph`] owns a COO [`EdgeList`] and lazily derives CSR/CSC
//! representations through a content-keyed [`ConversionCache`]. The
//! cache memoizes the structural half of the conversion (indptr arrays
//! and sort permutations); weights are re-applied through the stored
//! permutation, so reusing one structural graph with many weight arrays
//! never re-sorts. Structural edits (self loops, coalescing, undirected
//! closure) invalidate the cache; weight-only updates do not.
//!
//! The handle also carries the configuration the kernels read:
//! - `out_norm`/`in_norm`: optional per-node scaling vectors applied
//!   around SpMM (`in_norm * SpMM(A, out_norm * x)`)
//! - `symmetric`: caller-asserted structure flag, forwarded to the
//!   accelerated kernel as a hint
//! - `backend`: the SpMM strategy, fixed at construction

use log::{debug, info, trace};
use smartcore::linalg::basic::matrix::DenseMatrix;
use sprs::{CsMat, TriMat};

use crate::convert::{ConversionCache, CscMatrix, CsrCscEntry, CsrMatrix};
use crate::edges::EdgeList;
use crate::error::{GraphError, Result};
use crate::spmm::{self, SpmmBackend, SpmmMode};

#[derive(Debug)]
pub struct SparseGraph {
    edges: EdgeList,
    out_norm: Option<Vec<f64>>,
    in_norm: Option<Vec<f64>>,
    symmetric: bool,
    backend: SpmmBackend,
    cache: ConversionCache,
}

impl SparseGraph {
    /// Wrap an edge list with the default (direct) SpMM backend.
    pub fn from_edges(edges: EdgeList) -> Self {
        info!(
            "SparseGraph: {} nodes, {} edges",
            edges.num_nodes(),
            edges.num_edges()
        );
        Self {
            edges,
            out_norm: None,
            in_norm: None,
            symmetric: false,
            backend: SpmmBackend::default(),
            cache: ConversionCache::new(),
        }
    }

    /// Choose the SpMM strategy at construction time.
    pub fn with_backend(mut self, backend: SpmmBackend) -> Self {
        debug!("SparseGraph backend: {:?}", backend);
        self.backend = backend;
        self
    }

    /// Assert that the adjacency structure is symmetric. Forwarded to
    /// the accelerated kernel; never inferred.
    pub fn with_symmetric(mut self, symmetric: bool) -> Self {
        self.symmetric = symmetric;
        self
    }

    pub fn num_nodes(&self) -> usize {
        self.edges.num_nodes()
    }

    pub fn num_edges(&self) -> usize {
        self.edges.num_edges()
    }

    pub fn edges(&self) -> &EdgeList {
        &self.edges
    }

    pub fn backend(&self) -> SpmmBackend {
        self.backend
    }

    pub fn is_symmetric(&self) -> bool {
        self.symmetric
    }

    pub fn out_norm(&self) -> Option<&[f64]> {
        self.out_norm.as_deref()
    }

    pub fn in_norm(&self) -> Option<&[f64]> {
        self.in_norm.as_deref()
    }

    /// Set the pre-SpMM node scaling vector (length `num_nodes`).
    pub fn set_out_norm(&mut self, norm: Option<Vec<f64>>) -> Result<()> {
        if let Some(v) = &norm {
            self.check_node_len("out_norm", v.len())?;
        }
        self.out_norm = norm;
        Ok(())
    }

    /// Set the post-SpMM node scaling vector (length `num_nodes`).
    pub fn set_in_norm(&mut self, norm: Option<Vec<f64>>) -> Result<()> {
        if let Some(v) = &norm {
            self.check_node_len("in_norm", v.len())?;
        }
        self.in_norm = norm;
        Ok(())
    }

    fn check_node_len(&self, name: &'static str, got: usize) -> Result<()> {
        if got != self.num_nodes() {
            return Err(GraphError::LengthMismatch {
                name,
                got,
                expected: self.num_nodes(),
            });
        }
        Ok(())
    }

    /// Current edge weights, materialized as ones when unweighted.
    pub fn edge_weights(&self) -> Vec<f64> {
        self.edges.weights_or_ones()
    }

    /// Replace edge weights without touching the structure. Cached
    /// CSR/CSC permutations stay valid and are re-applied on demand.
    pub fn set_edge_weights(&mut self, weight: Option<Vec<f64>>) -> Result<()> {
        self.edges.set_weight(weight)
    }

    fn structure(&self) -> std::sync::Arc<CsrCscEntry> {
        self.cache
            .get_or_build(self.edges.row(), self.edges.col(), self.num_nodes())
    }

    /// CSR view of the current adjacency (structure memoized, weights
    /// re-permuted per call).
    pub fn csr(&self) -> CsrMatrix {
        let entry = self.structure();
        let weights = self.edge_weights();
        CsrMatrix {
            indptr: entry.row_ptr.clone(),
            indices: entry.csr_indices(self.edges.col()),
            data: CsrCscEntry::permute(&entry.csr_perm, &weights),
        }
    }

    /// CSR view with caller-supplied edge values in COO edge order; the
    /// memoized permutation aligns them with the compressed layout.
    pub fn csr_with_weights(&self, weights: &[f64]) -> Result<CsrMatrix> {
        if weights.len() != self.num_edges() {
            return Err(GraphError::LengthMismatch {
                name: "weights",
                got: weights.len(),
                expected: self.num_edges(),
            });
        }
        let entry = self.structure();
        Ok(CsrMatrix {
            indptr: entry.row_ptr.clone(),
            indices: entry.csr_indices(self.edges.col()),
            data: CsrCscEntry::permute(&entry.csr_perm, weights),
        })
    }

    /// CSC view of the current adjacency.
    pub fn csc(&self) -> CscMatrix {
        let entry = self.structure();
        let weights = self.edge_weights();
        CscMatrix {
            indptr: entry.col_ptr.clone(),
            indices: entry.csc_indices(self.edges.row()),
            data: CsrCscEntry::permute(&entry.csc_perm, &weights),
        }
    }

    /// Materialize the adjacency as a `sprs::CsMat` (duplicates merge by
    /// summation, like the direct SpMM path).
    pub fn to_csmat(&self) -> CsMat<f64> {
        let n = self.num_nodes();
        let weights = self.edge_weights();
        let mut trimat = TriMat::with_capacity((n, n), self.num_edges());
        for e in 0..self.num_edges() {
            trimat.add_triplet(self.edges.row()[e], self.edges.col()[e], weights[e]);
        }
        trimat.to_csr()
    }

    /// Full-graph SpMM: `in_norm * SpMM(A, out_norm * x)`.
    pub fn spmm(&self, x: &DenseMatrix<f64>, mode: SpmmMode) -> Result<DenseMatrix<f64>> {
        spmm::spmm(self, x, mode)
    }

    /// Out-degrees (weighted row sums).
    pub fn degrees(&self) -> Result<Vec<f64>> {
        spmm::degrees(&self.edges)
    }

    fn replace_edges(&mut self, edges: EdgeList) {
        trace!(
            "structural edit: {} -> {} edges, cache invalidated",
            self.num_edges(),
            edges.num_edges()
        );
        self.edges = edges;
        self.cache.invalidate();
    }

    /// Merge parallel edges by summation (structural edit).
    pub fn coalesce(&mut self) {
        let merged = self.edges.coalesce();
        self.replace_edges(merged);
    }

    /// Append a self loop per node (structural edit).
    pub fn add_self_loops(&mut self, fill: f64) {
        let with_loops = self.edges.add_self_loops(fill);
        self.replace_edges(with_loops);
    }

    /// One self loop per node, preserving existing loop weights
    /// (structural edit).
    pub fn add_remaining_self_loops(&mut self, fill: f64) {
        let with_loops = self.edges.add_remaining_self_loops(fill);
        self.replace_edges(with_loops);
    }

    /// Drop all self loops (structural edit).
    pub fn remove_self_loops(&mut self) {
        let without = self.edges.remove_self_loops();
        self.replace_edges(without);
    }

    /// Replace the edge set with its undirected closure (structural
    /// edit; weights are dropped).
    pub fn to_undirected(&mut self) {
        let undirected = self.edges.to_undirected();
        self.replace_edges(undirected);
    }

    /// Number of memoized structural conversions (diagnostics).
    pub fn cached_structures(&self) -> usize {
        self.cache.len()
    }
}
