//! adjspace: sparse adjacency kernels for graph pipelines.
//!
//! A library of independent numeric transforms over coordinate-format
//! edge lists, built on the `sprs` sparse-matrix and `smartcore` dense
//! substrates:
//!
//! - **Format conversion** ([`convert`]): COO → CSR/CSC with and without
//!   pre-sorted input, CSR ↔ CSC, CSR → COO, plus a content-hashed
//!   structural cache so one graph structure can serve many weight
//!   arrays without re-sorting.
//! - **Coalescing** ([`edges`]): merge parallel edges by summation into
//!   a canonical sorted, unique edge set; self-loop add/remove,
//!   undirected closure, edge dropout.
//! - **Normalization** ([`normalize`]): row-stochastic and symmetric
//!   (`D^-1/2 A D^-1/2`) edge weights, with zero-degree clamping.
//! - **SpMM** ([`spmm`]): sparse × dense multiplication via a portable
//!   scatter path, a direct `sprs` path, or a rayon row-parallel CSR
//!   path, selected per graph and per call.
//! - **Edge softmax** ([`softmax`]): per-source-node softmax of edge
//!   values, denominators computed through the SpMM primitive.
//! - **Sampling** ([`sampling`]): alias tables, negative edge sampling.
//! - **Pooling** ([`pooling`]): batch sum/mean pooling of node features.
//!
//! The [`graph::SparseGraph`] handle ties these together: it owns an
//! edge list, memoizes its compressed forms, and carries the SpMM
//! strategy and optional pre/post normalization vectors.
//!
//! # Example
//!
//! ```
//! use adjspace::edges::EdgeList;
//! use adjspace::graph::SparseGraph;
//! use adjspace::spmm::SpmmMode;
//! use smartcore::linalg::basic::matrix::DenseMatrix;
//!
//! // path graph 0 -> 1 -> 2
//! let edges = EdgeList::unweighted(vec![0, 1], vec![1, 2], Some(3)).unwrap();
//! let mut graph = SparseGraph::from_edges(edges);
//! graph.normalize_row().unwrap();
//!
//! let x = DenseMatrix::from_2d_vec(&vec![
//!     vec![1.0, 0.0],
//!     vec![0.0, 1.0],
//!     vec![1.0, 1.0],
//! ]).unwrap();
//! let out = graph.spmm(&x, SpmmMode::ForwardOnly).unwrap();
//! ```
//!
//! # Errors and edge cases
//!
//! Precondition violations (mismatched lengths, out-of-range indices,
//! probabilities outside `[0, 1]`) return [`error::GraphError`]
//! immediately. Numerical edge cases (zero degrees, empty softmax
//! groups) resolve to zeros, never NaN/Inf. There is no I/O and no
//! retry behavior anywhere in this crate.

pub mod convert;
pub mod edges;
pub mod error;
pub mod graph;
pub mod normalize;
pub mod pooling;
pub mod sampling;
pub mod softmax;
pub mod spmm;

#[cfg(test)]
mod tests;

pub use convert::{coo_to_csc, coo_to_csr, coo_to_csr_index, csr_to_coo, csr_to_csc};
pub use convert::{ConversionCache, CscMatrix, CsrMatrix};
pub use edges::EdgeList;
pub use error::{GraphError, Result};
pub use graph::SparseGraph;
pub use normalize::{row_normalization, symmetric_normalization};
pub use pooling::{batch_mean_pooling, batch_sum_pooling};
pub use sampling::{negative_edge_sampling, AliasTable};
pub use softmax::{edge_softmax, mul_edge_softmax};
pub use spmm::{degrees, spmm_direct, spmm_scatter, SpmmBackend, SpmmMode};
