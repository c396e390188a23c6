use approx::relative_eq;
use smartcore::linalg::basic::arrays::{Array, Array2};
use smartcore::linalg::basic::matrix::DenseMatrix;

use crate::edges::EdgeList;
use crate::graph::SparseGraph;
use crate::softmax::{edge_softmax, mul_edge_softmax};
use crate::spmm::SpmmBackend;
use crate::tests::{init, test_data};

fn fan_out(num_targets: usize) -> SparseGraph {
    // one source node with edges to `num_targets` distinct nodes
    let row = vec![0; num_targets];
    let col = (1..=num_targets).collect();
    SparseGraph::from_edges(EdgeList::unweighted(row, col, Some(num_targets + 1)).unwrap())
}

#[test]
fn equal_values_split_evenly() {
    init();
    let graph = fan_out(2);
    let softmax = edge_softmax(&graph, &[0.0, 0.0]).unwrap();
    assert!(relative_eq!(softmax[0], 0.5, max_relative = 1e-6));
    assert!(relative_eq!(softmax[1], 0.5, max_relative = 1e-6));
}

#[test]
fn extreme_values_stay_finite() {
    let graph = fan_out(2);
    let softmax = edge_softmax(&graph, &[100.0, 0.0]).unwrap();
    assert!(softmax.iter().all(|v| v.is_finite()));
    assert!(
        softmax[0] > softmax[1],
        "larger input must keep larger weight: {softmax:?}"
    );
    let total: f64 = softmax.iter().sum();
    assert!(relative_eq!(total, 1.0, max_relative = 1e-6));
}

#[test]
fn groups_normalize_independently_per_source() {
    // node 0 fans out to {1, 2}, node 1 to {2}
    let edges = EdgeList::unweighted(vec![0, 0, 1], vec![1, 2, 2], Some(3)).unwrap();
    let graph = SparseGraph::from_edges(edges);
    let softmax = edge_softmax(&graph, &[1.0, 1.0, 5.0]).unwrap();

    assert!(relative_eq!(softmax[0], 0.5, max_relative = 1e-6));
    assert!(relative_eq!(softmax[1], 0.5, max_relative = 1e-6));
    // a single-edge group takes all the mass
    assert!(relative_eq!(softmax[2], 1.0, max_relative = 1e-6));
}

#[test]
fn value_length_mismatch_is_rejected() {
    let graph = fan_out(2);
    assert!(edge_softmax(&graph, &[0.0]).is_err());
}

#[test]
fn softmax_agrees_across_backends() {
    let edges = test_data::random_graph(30, 200, 77).coalesce();
    let values: Vec<f64> = (0..edges.num_edges()).map(|e| (e % 7) as f64 - 3.0).collect();

    let direct = SparseGraph::from_edges(edges.clone()).with_backend(SpmmBackend::Direct);
    let accel = SparseGraph::from_edges(edges).with_backend(SpmmBackend::Accelerated);
    let a = edge_softmax(&direct, &values).unwrap();
    let b = edge_softmax(&accel, &values).unwrap();
    for (x, y) in a.iter().zip(b.iter()) {
        assert!(relative_eq!(*x, *y, max_relative = 1e-9));
    }
}

#[test]
fn multi_dimensional_softmax_is_column_independent() {
    let graph = fan_out(3);
    // column 0 uniform, column 1 peaked on the first edge
    let values = DenseMatrix::from_2d_vec(&vec![
        vec![0.0, 10.0],
        vec![0.0, 0.0],
        vec![0.0, 0.0],
    ])
    .unwrap();
    let out = mul_edge_softmax(&graph, &values).unwrap();
    assert_eq!(out.shape(), (3, 2));

    for i in 0..3 {
        assert!(relative_eq!(*out.get((i, 0)), 1.0 / 3.0, max_relative = 1e-6));
    }
    assert!(*out.get((0, 1)) > 0.99);

    // each column matches the 1-D routine applied alone
    let col1: Vec<f64> = vec![10.0, 0.0, 0.0];
    let alone = edge_softmax(&graph, &col1).unwrap();
    for i in 0..3 {
        assert!(relative_eq!(*out.get((i, 1)), alone[i], max_relative = 1e-12));
    }
}
