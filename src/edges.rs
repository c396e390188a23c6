//! Coordinate-format edge lists and structural edits.
//!
//! The COO edge list is the canonical input format of this crate: two
//! parallel index arrays `row`/`col` (0-indexed node ids) plus an optional
//! parallel weight array. No uniqueness or ordering invariant is assumed;
//! a pair appearing twice is a multigraph with two parallel edges until
//! [`EdgeList::coalesce`] merges them by summation.
//!
//! Structural edits provided here:
//! - `coalesce`: lexicographic sort + duplicate merge (idempotent)
//! - `add_self_loops` / `add_remaining_self_loops` / `remove_self_loops`
//! - `to_undirected`: mirror every edge, then coalesce
//! - `dropout_edges`: Bernoulli edge masking with optional renormalization
//!
//! All of these return a new `EdgeList`; the [`crate::graph::SparseGraph`]
//! handle wraps them with cache invalidation.

use log::{debug, trace};
use rand::distributions::{Bernoulli, Distribution};
use rand::Rng;

use crate::error::{GraphError, Result};

/// An edge set in coordinate (COO) form.
///
/// `row[e]` is the source and `col[e]` the destination of edge `e`;
/// `weight[e]`, when present, is its real-valued weight. Unweighted edge
/// lists behave as all-ones wherever a kernel needs values.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeList {
    row: Vec<usize>,
    col: Vec<usize>,
    weight: Option<Vec<f64>>,
    num_nodes: usize,
}

impl EdgeList {
    /// Build an edge list, validating lengths and index ranges.
    ///
    /// When `num_nodes` is `None` it is inferred as `max(row, col) + 1`
    /// (0 for an empty edge set). When supplied, every index must be
    /// strictly below it.
    pub fn new(
        row: Vec<usize>,
        col: Vec<usize>,
        weight: Option<Vec<f64>>,
        num_nodes: Option<usize>,
    ) -> Result<Self> {
        if col.len() != row.len() {
            return Err(GraphError::LengthMismatch {
                name: "col",
                got: col.len(),
                expected: row.len(),
            });
        }
        if let Some(w) = &weight {
            if w.len() != row.len() {
                return Err(GraphError::LengthMismatch {
                    name: "weight",
                    got: w.len(),
                    expected: row.len(),
                });
            }
        }

        let inferred = row
            .iter()
            .chain(col.iter())
            .max()
            .map(|&m| m + 1)
            .unwrap_or(0);
        let num_nodes = match num_nodes {
            Some(n) => {
                if inferred > n {
                    return Err(GraphError::IndexOutOfRange {
                        index: inferred - 1,
                        num_nodes: n,
                    });
                }
                n
            }
            None => inferred,
        };

        trace!(
            "EdgeList built: {} edges over {} nodes (weighted: {})",
            row.len(),
            num_nodes,
            weight.is_some()
        );
        Ok(Self {
            row,
            col,
            weight,
            num_nodes,
        })
    }

    /// Unweighted convenience constructor.
    pub fn unweighted(row: Vec<usize>, col: Vec<usize>, num_nodes: Option<usize>) -> Result<Self> {
        Self::new(row, col, None, num_nodes)
    }

    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    pub fn num_edges(&self) -> usize {
        self.row.len()
    }

    pub fn row(&self) -> &[usize] {
        &self.row
    }

    pub fn col(&self) -> &[usize] {
        &self.col
    }

    pub fn weight(&self) -> Option<&[f64]> {
        self.weight.as_deref()
    }

    /// Edge weights as an owned vector, materializing ones when absent.
    pub fn weights_or_ones(&self) -> Vec<f64> {
        match &self.weight {
            Some(w) => w.clone(),
            None => vec![1.0; self.row.len()],
        }
    }

    /// Replace the weight array, keeping the structural edge set.
    ///
    /// This is the weight-only update path: CSR/CSC caches keyed on the
    /// structure stay valid (their permutations are re-applied to the new
    /// weights by the graph handle).
    pub fn set_weight(&mut self, weight: Option<Vec<f64>>) -> Result<()> {
        if let Some(w) = &weight {
            if w.len() != self.row.len() {
                return Err(GraphError::LengthMismatch {
                    name: "weight",
                    got: w.len(),
                    expected: self.row.len(),
                });
            }
        }
        self.weight = weight;
        Ok(())
    }

    /// Decompose into `(row, col, weight, num_nodes)`.
    pub fn into_parts(self) -> (Vec<usize>, Vec<usize>, Option<Vec<f64>>, usize) {
        (self.row, self.col, self.weight, self.num_nodes)
    }

    /// Merge parallel edges by summing their weights.
    ///
    /// The result is sorted lexicographically by `(row, col)` with no
    /// duplicate pairs; for each distinct pair the output weight is the
    /// sum of all input weights sharing it (`None` passes through when
    /// the input is unweighted). Idempotent: coalescing an already
    /// coalesced edge list is the identity.
    pub fn coalesce(&self) -> EdgeList {
        let e = self.num_edges();
        let mut perm: Vec<usize> = (0..e).collect();
        // stable lexicographic sort so duplicate runs keep input order
        perm.sort_by_key(|&i| (self.row[i], self.col[i]));

        let mut out_row = Vec::with_capacity(e);
        let mut out_col = Vec::with_capacity(e);
        // run index per sorted edge: scatter-add target for weights
        let mut run_of = vec![0usize; e];
        let mut last: Option<(usize, usize)> = None;
        for (pos, &i) in perm.iter().enumerate() {
            let pair = (self.row[i], self.col[i]);
            if last != Some(pair) {
                out_row.push(pair.0);
                out_col.push(pair.1);
                last = Some(pair);
            }
            run_of[pos] = out_row.len() - 1;
        }

        let out_weight = self.weight.as_ref().map(|w| {
            let mut sums = vec![0.0; out_row.len()];
            for (pos, &i) in perm.iter().enumerate() {
                sums[run_of[pos]] += w[i];
            }
            sums
        });

        debug!(
            "coalesce: {} edges -> {} unique pairs",
            e,
            out_row.len()
        );
        EdgeList {
            row: out_row,
            col: out_col,
            weight: out_weight,
            num_nodes: self.num_nodes,
        }
    }

    /// Append one self loop `(i, i)` with weight `fill` for every node.
    ///
    /// Existing self loops are kept; use [`add_remaining_self_loops`]
    /// (`EdgeList::add_remaining_self_loops`) for the deduplicating
    /// variant. An unweighted input is materialized as all-ones so the
    /// fill value can differ from the edge weights.
    pub fn add_self_loops(&self, fill: f64) -> EdgeList {
        let n = self.num_nodes;
        let mut row = self.row.clone();
        let mut col = self.col.clone();
        let mut weight = self.weights_or_ones();
        row.extend(0..n);
        col.extend(0..n);
        weight.extend(std::iter::repeat(fill).take(n));
        trace!("add_self_loops: appended {} loops (fill={})", n, fill);
        EdgeList {
            row,
            col,
            weight: Some(weight),
            num_nodes: n,
        }
    }

    /// Drop existing self loops, then add exactly one `(i, i)` per node.
    ///
    /// A node that already had a self loop keeps its original loop weight
    /// instead of `fill`.
    pub fn add_remaining_self_loops(&self, fill: f64) -> EdgeList {
        let n = self.num_nodes;
        let weight = self.weights_or_ones();

        let mut row = Vec::with_capacity(self.num_edges() + n);
        let mut col = Vec::with_capacity(self.num_edges() + n);
        let mut out_weight = Vec::with_capacity(self.num_edges() + n);
        let mut loop_weight = vec![fill; n];
        for e in 0..self.num_edges() {
            if self.row[e] != self.col[e] {
                row.push(self.row[e]);
                col.push(self.col[e]);
                out_weight.push(weight[e]);
            } else {
                loop_weight[self.row[e]] = weight[e];
            }
        }
        row.extend(0..n);
        col.extend(0..n);
        out_weight.extend(loop_weight);

        EdgeList {
            row,
            col,
            weight: Some(out_weight),
            num_nodes: n,
        }
    }

    /// Remove all edges with `row == col`.
    pub fn remove_self_loops(&self) -> EdgeList {
        let keep: Vec<usize> = (0..self.num_edges())
            .filter(|&e| self.row[e] != self.col[e])
            .collect();
        trace!(
            "remove_self_loops: {} of {} edges kept",
            keep.len(),
            self.num_edges()
        );
        self.filter(&keep)
    }

    /// Mirror every edge `(i, j)` as `(j, i)` and coalesce the result.
    ///
    /// Weights are dropped (the undirected closure is structural), which
    /// matches merging by summation being meaningless across mirrored
    /// duplicates of differing weight.
    pub fn to_undirected(&self) -> EdgeList {
        let mut row = self.row.clone();
        let mut col = self.col.clone();
        row.extend(self.col.iter().copied());
        col.extend(self.row.iter().copied());
        let doubled = EdgeList {
            row,
            col,
            weight: None,
            num_nodes: self.num_nodes,
        };
        doubled.coalesce()
    }

    /// Keep only the edges at the given positions (in order).
    fn filter(&self, keep: &[usize]) -> EdgeList {
        EdgeList {
            row: keep.iter().map(|&e| self.row[e]).collect(),
            col: keep.iter().map(|&e| self.col[e]).collect(),
            weight: self
                .weight
                .as_ref()
                .map(|w| keep.iter().map(|&e| w[e]).collect()),
            num_nodes: self.num_nodes,
        }
    }

    /// Randomly drop edges with probability `drop_rate`.
    ///
    /// With `renorm`, the surviving edges get fresh symmetric-normalized
    /// weights (computed from an all-ones adjacency over the survivors);
    /// otherwise surviving weights pass through unchanged.
    pub fn dropout_edges<R: Rng>(
        &self,
        drop_rate: f64,
        renorm: bool,
        rng: &mut R,
    ) -> Result<EdgeList> {
        if !(0.0..=1.0).contains(&drop_rate) {
            return Err(GraphError::InvalidProbability { value: drop_rate });
        }
        let keep_dist = Bernoulli::new(1.0 - drop_rate)
            .map_err(|e| GraphError::InvalidParameter(e.to_string()))?;
        let keep: Vec<usize> = (0..self.num_edges())
            .filter(|_| keep_dist.sample(rng))
            .collect();
        debug!(
            "dropout_edges: kept {} of {} edges (drop_rate={})",
            keep.len(),
            self.num_edges(),
            drop_rate
        );

        let mut kept = self.filter(&keep);
        if renorm {
            kept.weight = None;
            let w = crate::normalize::symmetric_normalization(&kept)?;
            kept.weight = Some(w);
        }
        Ok(kept)
    }
}
