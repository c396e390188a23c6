//! Coordinate to compressed sparse format conversion.
//!
//! Implements the COO→CSR bucket-count/prefix-sum build, both for
//! pre-sorted input (histogram only, `indices`/`data` pass through) and
//! for arbitrary input (stable argsort by `row`, ties keeping original
//! order so `data` alignment is exact). CSC is always the transpose
//! trick: CSR of `(col, row, data)` is CSC of `(row, col, data)`.
//!
//! # Complexity
//!
//! - ordered path: O(E + N) (running histogram + prefix sum)
//! - unordered path: O(E log E + N) (stable sort dominates)
//! - CSR→CSC: O(E log E + N) via expansion back to COO
//!
//! # Conversion cache
//!
//! [`ConversionCache`] memoizes the structural half of a conversion (the
//! `indptr` arrays and the sort permutations) keyed by a hash of the full
//! `(row, col, num_nodes)` content, so reusing one structural graph with
//! many different weight arrays never re-sorts. The cache is advisory:
//! entries are invalidated by the owning [`crate::graph::SparseGraph`]
//! whenever the structural edge set changes. Keying on content rather
//! than array shapes means two different graphs of equal size can never
//! collide.

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use dashmap::DashMap;
use log::{debug, trace};

use crate::error::{GraphError, Result};

/// Compressed sparse row matrix pieces.
///
/// `indptr` has length `num_nodes + 1`, is non-decreasing with
/// `indptr[0] == 0` and `indptr[num_nodes] == E`; row `i` owns the
/// contiguous slice `indices[indptr[i]..indptr[i+1]]`, with `data`
/// following the same permutation as `indices`.
#[derive(Debug, Clone, PartialEq)]
pub struct CsrMatrix {
    pub indptr: Vec<usize>,
    pub indices: Vec<usize>,
    pub data: Vec<f64>,
}

/// Compressed sparse column matrix pieces: the symmetric definition with
/// rows and columns swapped (`indptr` indexed by column, `indices`
/// holding row ids).
pub type CscMatrix = CsrMatrix;

impl CsrMatrix {
    pub fn num_rows(&self) -> usize {
        self.indptr.len() - 1
    }

    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    /// Column ids of row `i`'s slice; empty for out-of-range rows.
    pub fn row_slice(&self, i: usize) -> &[usize] {
        if i + 1 >= self.indptr.len() {
            return &[];
        }
        &self.indices[self.indptr[i]..self.indptr[i + 1]]
    }

    /// Values aligned with [`CsrMatrix::row_slice`].
    pub fn data_slice(&self, i: usize) -> &[f64] {
        if i + 1 >= self.indptr.len() {
            return &[];
        }
        &self.data[self.indptr[i]..self.indptr[i + 1]]
    }
}

fn check_coo(row: &[usize], col: &[usize], data: Option<&[f64]>, num_nodes: usize) -> Result<()> {
    if col.len() != row.len() {
        return Err(GraphError::LengthMismatch {
            name: "col",
            got: col.len(),
            expected: row.len(),
        });
    }
    if let Some(d) = data {
        if d.len() != row.len() {
            return Err(GraphError::LengthMismatch {
                name: "data",
                got: d.len(),
                expected: row.len(),
            });
        }
    }
    for &i in row.iter().chain(col.iter()) {
        if i >= num_nodes {
            return Err(GraphError::IndexOutOfRange {
                index: i,
                num_nodes,
            });
        }
    }
    Ok(())
}

/// Running histogram + exclusive prefix sum over a (sorted or permuted)
/// row array: `indptr[i]` = number of entries with row < i.
fn build_indptr(row_of: impl Iterator<Item = usize>, num_nodes: usize) -> Vec<usize> {
    let mut indptr = vec![0usize; num_nodes + 1];
    for r in row_of {
        indptr[r + 1] += 1;
    }
    for i in 1..=num_nodes {
        indptr[i] += indptr[i - 1];
    }
    indptr
}

/// Convert a COO edge list to CSR.
///
/// With `ordered` the caller guarantees `row` is non-decreasing and the
/// converter only bucket-counts; `indices`/`data` pass through unchanged.
/// Otherwise edges are stably sorted by `row` first (ties broken by
/// original position) and `col`/`data` are permuted accordingly.
///
/// Malformed input (mismatched lengths, index ≥ `num_nodes`) is a
/// contract violation and fails fast.
pub fn coo_to_csr(
    row: &[usize],
    col: &[usize],
    data: Option<&[f64]>,
    num_nodes: usize,
    ordered: bool,
) -> Result<(Vec<usize>, Vec<usize>, Option<Vec<f64>>)> {
    check_coo(row, col, data, num_nodes)?;

    if ordered {
        debug_assert!(
            row.windows(2).all(|w| w[0] <= w[1]),
            "ordered=true requires non-decreasing row array"
        );
        let indptr = build_indptr(row.iter().copied(), num_nodes);
        trace!(
            "coo_to_csr (ordered): {} edges, {} nodes",
            row.len(),
            num_nodes
        );
        return Ok((indptr, col.to_vec(), data.map(|d| d.to_vec())));
    }

    let (indptr, perm) = csr_structure(row, num_nodes);
    let indices: Vec<usize> = perm.iter().map(|&e| col[e]).collect();
    let out_data = data.map(|d| perm.iter().map(|&e| d[e]).collect());
    trace!(
        "coo_to_csr (unordered): {} edges sorted over {} nodes",
        row.len(),
        num_nodes
    );
    Ok((indptr, indices, out_data))
}

/// Variant of [`coo_to_csr`] producing only `(indptr, permutation)`,
/// for callers applying the same permutation to several weight arrays.
pub fn coo_to_csr_index(
    row: &[usize],
    col: &[usize],
    num_nodes: usize,
) -> Result<(Vec<usize>, Vec<usize>)> {
    check_coo(row, col, None, num_nodes)?;
    Ok(csr_structure(row, num_nodes))
}

/// Stable sort permutation by row + indptr; no input validation.
fn csr_structure(row: &[usize], num_nodes: usize) -> (Vec<usize>, Vec<usize>) {
    let mut perm: Vec<usize> = (0..row.len()).collect();
    // stable: ties keep original edge order so data stays aligned
    perm.sort_by_key(|&e| row[e]);
    let indptr = build_indptr(perm.iter().map(|&e| row[e]), num_nodes);
    (indptr, perm)
}

/// Convert a COO edge list to CSC: CSR of the transposed coordinates.
pub fn coo_to_csc(
    row: &[usize],
    col: &[usize],
    data: Option<&[f64]>,
    num_nodes: usize,
    ordered: bool,
) -> Result<(Vec<usize>, Vec<usize>, Option<Vec<f64>>)> {
    coo_to_csr(col, row, data, num_nodes, ordered)
}

/// Expand CSR back to coordinate form by repeating each row id over its
/// slice length.
pub fn csr_to_coo(
    indptr: &[usize],
    indices: &[usize],
    data: &[f64],
) -> (Vec<usize>, Vec<usize>, Vec<f64>) {
    let num_nodes = indptr.len().saturating_sub(1);
    let mut row = Vec::with_capacity(indices.len());
    for i in 0..num_nodes {
        row.extend(std::iter::repeat(i).take(indptr[i + 1] - indptr[i]));
    }
    (row, indices.to_vec(), data.to_vec())
}

/// Transpose a CSR matrix into CSC (or vice versa).
///
/// Expands back to COO, swaps coordinates and rebuilds; the expanded row
/// array of the transpose is the original `indices`, which is unsorted,
/// so the unordered path applies.
pub fn csr_to_csc(indptr: &[usize], indices: &[usize], data: &[f64]) -> Result<CscMatrix> {
    let num_nodes = indptr.len().saturating_sub(1);
    let (row, col, vals) = csr_to_coo(indptr, indices, data);
    let (col_ptr, row_indices, csc_data) =
        coo_to_csr(&col, &row, Some(vals.as_slice()), num_nodes, false)?;
    Ok(CscMatrix {
        indptr: col_ptr,
        indices: row_indices,
        data: csc_data.unwrap_or_default(),
    })
}

/// Structural half of a CSR + CSC conversion: the indptr arrays and the
/// sort permutations mapping compressed position → original edge index.
/// Weights are re-derived per use by applying the permutation, so one
/// entry serves any number of weight arrays over the same structure.
#[derive(Debug)]
pub struct CsrCscEntry {
    pub row_ptr: Vec<usize>,
    pub csr_perm: Vec<usize>,
    pub col_ptr: Vec<usize>,
    pub csc_perm: Vec<usize>,
}

impl CsrCscEntry {
    fn build(row: &[usize], col: &[usize], num_nodes: usize) -> Self {
        let (row_ptr, csr_perm) = csr_structure(row, num_nodes);
        let (col_ptr, csc_perm) = csr_structure(col, num_nodes);
        Self {
            row_ptr,
            csr_perm,
            col_ptr,
            csc_perm,
        }
    }

    /// CSR column indices for the given structural COO arrays.
    pub fn csr_indices(&self, col: &[usize]) -> Vec<usize> {
        self.csr_perm.iter().map(|&e| col[e]).collect()
    }

    /// CSC row indices for the given structural COO arrays.
    pub fn csc_indices(&self, row: &[usize]) -> Vec<usize> {
        self.csc_perm.iter().map(|&e| row[e]).collect()
    }

    /// Apply a stored permutation to a weight array.
    pub fn permute(perm: &[usize], weight: &[f64]) -> Vec<f64> {
        perm.iter().map(|&e| weight[e]).collect()
    }
}

/// Memo for structural conversions, keyed by a strong content hash.
///
/// Thread safety comes from the concurrent map; two callers racing on
/// the same key at worst build the entry twice, and different graphs
/// hash to different keys regardless of shape.
#[derive(Debug, Default)]
pub struct ConversionCache {
    entries: DashMap<u64, Arc<CsrCscEntry>>,
}

/// Content hash over the structural edge set. Weight values do not
/// participate: weight-only updates must hit the same entry.
pub fn structural_hash(row: &[usize], col: &[usize], num_nodes: usize) -> u64 {
    let mut h = std::collections::hash_map::DefaultHasher::new();
    num_nodes.hash(&mut h);
    row.hash(&mut h);
    col.hash(&mut h);
    h.finish()
}

impl ConversionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch or build the structural entry for `(row, col, num_nodes)`.
    pub fn get_or_build(&self, row: &[usize], col: &[usize], num_nodes: usize) -> Arc<CsrCscEntry> {
        let key = structural_hash(row, col, num_nodes);
        if let Some(entry) = self.entries.get(&key) {
            trace!("conversion cache hit for key {:#x}", key);
            return entry.clone();
        }
        debug!(
            "conversion cache miss for key {:#x}: building CSR/CSC structure ({} edges, {} nodes)",
            key,
            row.len(),
            num_nodes
        );
        let entry = Arc::new(CsrCscEntry::build(row, col, num_nodes));
        self.entries.insert(key, entry.clone());
        entry
    }

    /// Drop all memoized structures. Called on structural edits.
    pub fn invalidate(&self) {
        let n = self.entries.len();
        self.entries.clear();
        if n > 0 {
            debug!("conversion cache invalidated ({} entries dropped)", n);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
