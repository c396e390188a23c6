use approx::relative_eq;
use smartcore::linalg::basic::arrays::{Array, Array2};
use smartcore::linalg::basic::matrix::DenseMatrix;

use crate::pooling::{batch_mean_pooling, batch_sum_pooling};
use crate::tests::init;

fn stacked_features() -> DenseMatrix<f64> {
    // rows 0-1 belong to graph 0, rows 2-4 to graph 1
    DenseMatrix::from_2d_vec(&vec![
        vec![1.0, 2.0],
        vec![3.0, 4.0],
        vec![10.0, 0.0],
        vec![20.0, 0.0],
        vec![30.0, 3.0],
    ])
    .unwrap()
}

#[test]
fn sum_pooling_scatter_adds_per_batch() {
    init();
    let x = stacked_features();
    let out = batch_sum_pooling(&x, &[0, 0, 1, 1, 1]).unwrap();
    assert_eq!(out.shape(), (2, 2));
    assert!(relative_eq!(*out.get((0, 0)), 4.0));
    assert!(relative_eq!(*out.get((0, 1)), 6.0));
    assert!(relative_eq!(*out.get((1, 0)), 60.0));
    assert!(relative_eq!(*out.get((1, 1)), 3.0));
}

#[test]
fn mean_pooling_divides_by_counts() {
    let x = stacked_features();
    let out = batch_mean_pooling(&x, &[0, 0, 1, 1, 1]).unwrap();
    assert!(relative_eq!(*out.get((0, 0)), 2.0));
    assert!(relative_eq!(*out.get((0, 1)), 3.0));
    assert!(relative_eq!(*out.get((1, 0)), 20.0));
    assert!(relative_eq!(*out.get((1, 1)), 1.0));
}

#[test]
fn empty_batch_id_keeps_zero_row() {
    // batch ids {0, 2}: id 1 has no members and must stay zero
    let x = DenseMatrix::from_2d_vec(&vec![vec![1.0], vec![2.0]]).unwrap();
    let sum = batch_sum_pooling(&x, &[0, 2]).unwrap();
    assert_eq!(sum.shape(), (3, 1));
    assert!(relative_eq!(*sum.get((1, 0)), 0.0));

    let mean = batch_mean_pooling(&x, &[0, 2]).unwrap();
    assert!(relative_eq!(*mean.get((1, 0)), 0.0));
    assert!(relative_eq!(*mean.get((2, 0)), 2.0));
}

#[test]
fn batch_length_mismatch_is_rejected() {
    let x = stacked_features();
    assert!(batch_sum_pooling(&x, &[0, 0, 1]).is_err());
    assert!(batch_mean_pooling(&x, &[0; 9]).is_err());
}
