//! Batch-wise pooling of node features.
//!
//! `batch[i]` assigns row `i` of a stacked feature matrix to a graph id;
//! pooling scatter-adds rows into one output row per graph. Mean pooling
//! divides the sums by the per-graph row counts.

use log::trace;
use smartcore::linalg::basic::arrays::Array;
use smartcore::linalg::basic::matrix::DenseMatrix;

use crate::error::{GraphError, Result};
use crate::spmm::dense_from_rows;

fn check_batch(x: &DenseMatrix<f64>, batch: &[usize]) -> Result<usize> {
    let (rows, _) = x.shape();
    if batch.len() != rows {
        return Err(GraphError::LengthMismatch {
            name: "batch",
            got: batch.len(),
            expected: rows,
        });
    }
    Ok(batch.iter().max().map(|&b| b + 1).unwrap_or(0))
}

/// Sum rows of `x` grouped by batch id: output `[B × F]` with
/// `B = max(batch) + 1`.
pub fn batch_sum_pooling(x: &DenseMatrix<f64>, batch: &[usize]) -> Result<DenseMatrix<f64>> {
    let num_batches = check_batch(x, batch)?;
    let (rows, f) = x.shape();

    let mut out = vec![0.0; num_batches * f];
    for i in 0..rows {
        let b = batch[i];
        for k in 0..f {
            out[b * f + k] += *x.get((i, k));
        }
    }
    trace!(
        "batch_sum_pooling: {} rows into {} batches",
        rows,
        num_batches
    );
    Ok(dense_from_rows(&out, num_batches, f))
}

/// Mean-pool rows of `x` grouped by batch id. An id with no rows keeps a
/// zero output row.
pub fn batch_mean_pooling(x: &DenseMatrix<f64>, batch: &[usize]) -> Result<DenseMatrix<f64>> {
    let num_batches = check_batch(x, batch)?;
    let (_, f) = x.shape();

    let summed = batch_sum_pooling(x, batch)?;
    let mut counts = vec![0usize; num_batches];
    for &b in batch {
        counts[b] += 1;
    }

    let mut out = vec![0.0; num_batches * f];
    for b in 0..num_batches {
        if counts[b] == 0 {
            continue;
        }
        for k in 0..f {
            out[b * f + k] = *summed.get((b, k)) / counts[b] as f64;
        }
    }
    Ok(dense_from_rows(&out, num_batches, f))
}
