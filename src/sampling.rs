//! Discrete sampling helpers: alias tables and negative edge sampling.
//!
//! The alias method turns an arbitrary discrete distribution over K
//! outcomes into a pair of length-K arrays supporting O(1) draws; this
//! crate uses the Vose construction (small/large worklists). Negative
//! edge sampling draws node pairs uniformly from the full `n × n` space
//! and rejects pairs present in the positive edge set.

use std::collections::HashSet;

use log::{debug, trace};
use rand::Rng;

use crate::edges::EdgeList;
use crate::error::{GraphError, Result};

/// O(1)-draw approximation of a discrete distribution.
///
/// `alias[k]` is the donor outcome for cell `k` and `prob[k]` the
/// probability of keeping `k` over its donor.
#[derive(Debug, Clone)]
pub struct AliasTable {
    alias: Vec<usize>,
    prob: Vec<f64>,
}

impl AliasTable {
    /// Build the table from outcome probabilities.
    ///
    /// Probabilities must be finite, non-negative and sum to ≈ 1.
    pub fn new(probs: &[f64]) -> Result<Self> {
        if probs.is_empty() {
            return Err(GraphError::InvalidParameter(
                "alias table needs at least one outcome".into(),
            ));
        }
        for &p in probs {
            if !p.is_finite() || p < 0.0 {
                return Err(GraphError::InvalidProbability { value: p });
            }
        }
        let total: f64 = probs.iter().sum();
        if (total - 1.0).abs() > 1e-6 {
            return Err(GraphError::InvalidParameter(format!(
                "alias table probabilities sum to {total}, expected 1"
            )));
        }

        let k = probs.len();
        let mut prob: Vec<f64> = probs.iter().map(|&p| p * k as f64).collect();
        let mut alias = vec![0usize; k];

        let mut smaller: Vec<usize> = Vec::new();
        let mut larger: Vec<usize> = Vec::new();
        for (i, &q) in prob.iter().enumerate() {
            if q < 1.0 {
                smaller.push(i);
            } else {
                larger.push(i);
            }
        }

        while let (Some(small), Some(large)) = (smaller.pop(), larger.pop()) {
            alias[small] = large;
            prob[large] += prob[small] - 1.0;
            if prob[large] < 1.0 {
                smaller.push(large);
            } else {
                larger.push(large);
            }
        }

        trace!("AliasTable built over {} outcomes", k);
        Ok(Self { alias, prob })
    }

    pub fn len(&self) -> usize {
        self.alias.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alias.is_empty()
    }

    /// Draw one outcome in O(1): pick a cell uniformly, then keep it or
    /// take its alias.
    pub fn draw<R: Rng>(&self, rng: &mut R) -> usize {
        let k = rng.gen_range(0..self.alias.len());
        if rng.gen::<f64>() < self.prob[k] {
            k
        } else {
            self.alias[k]
        }
    }
}

/// Sample node pairs absent from the positive edge set.
///
/// Draws uniformly from the linearized `n × n` pair space, rejects
/// positives, and returns up to `num_samples` negatives (default: as
/// many as there are positive edges, capped by the number of available
/// non-edges). Oversampling compensates for the expected rejection rate.
pub fn negative_edge_sampling<R: Rng>(
    edges: &EdgeList,
    num_samples: Option<usize>,
    rng: &mut R,
) -> Result<(Vec<usize>, Vec<usize>)> {
    let n = edges.num_nodes();
    let e = edges.num_edges();
    let size = n * n;
    if size == 0 {
        return Err(GraphError::InvalidParameter(
            "cannot sample negatives from an empty graph".into(),
        ));
    }

    let requested = num_samples.unwrap_or(e).min(size.saturating_sub(e));
    let positive: HashSet<usize> = (0..e)
        .map(|i| edges.row()[i] * n + edges.col()[i])
        .collect();

    // oversample to cover the expected rejections against the positives
    let density = 1.1 * e as f64 / size as f64;
    let factor = if density < 1.0 {
        1.0 / (1.0 - density)
    } else {
        2.0
    };
    let draw_count = ((requested as f64 * factor) as usize).min(size);

    let candidates = rand::seq::index::sample(rng, size, draw_count);
    let mut out_row = Vec::with_capacity(requested);
    let mut out_col = Vec::with_capacity(requested);
    for pair in candidates {
        if positive.contains(&pair) {
            continue;
        }
        out_row.push(pair / n);
        out_col.push(pair % n);
        if out_row.len() == requested {
            break;
        }
    }

    debug!(
        "negative_edge_sampling: {} of {} requested negatives drawn ({} positives)",
        out_row.len(),
        requested,
        e
    );
    Ok((out_row, out_col))
}
