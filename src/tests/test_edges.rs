use approx::relative_eq;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::edges::EdgeList;
use crate::error::GraphError;
use crate::tests::init;

#[test]
fn new_validates_lengths_and_range() {
    init();
    let err = EdgeList::new(vec![0, 1], vec![1], None, None).unwrap_err();
    assert!(matches!(err, GraphError::LengthMismatch { .. }));

    let err = EdgeList::new(vec![0, 1], vec![1, 5], None, Some(3)).unwrap_err();
    assert!(matches!(
        err,
        GraphError::IndexOutOfRange {
            index: 5,
            num_nodes: 3
        }
    ));

    let err = EdgeList::new(vec![0, 1], vec![1, 0], Some(vec![1.0]), None).unwrap_err();
    assert!(matches!(err, GraphError::LengthMismatch { .. }));
}

#[test]
fn num_nodes_inferred_from_max_index() {
    let edges = EdgeList::unweighted(vec![0, 4], vec![2, 1], None).unwrap();
    assert_eq!(edges.num_nodes(), 5);

    let empty = EdgeList::unweighted(vec![], vec![], None).unwrap();
    assert_eq!(empty.num_nodes(), 0);
    assert_eq!(empty.num_edges(), 0);
}

#[test]
fn coalesce_sums_duplicate_weights() {
    // two edges (0,1) with w=2 and w=3 merge to (0,1,5)
    let edges = EdgeList::new(
        vec![0, 2, 0],
        vec![1, 0, 1],
        Some(vec![2.0, 1.0, 3.0]),
        None,
    )
    .unwrap();
    let merged = edges.coalesce();

    assert_eq!(merged.row(), &[0, 2]);
    assert_eq!(merged.col(), &[1, 0]);
    let w = merged.weight().unwrap();
    assert!(relative_eq!(w[0], 5.0));
    assert!(relative_eq!(w[1], 1.0));
}

#[test]
fn coalesce_is_idempotent_and_sorted() {
    let edges = EdgeList::new(
        vec![3, 0, 3, 1, 0],
        vec![1, 2, 1, 1, 2],
        Some(vec![1.0, 1.0, 1.0, 1.0, 1.0]),
        None,
    )
    .unwrap();
    let once = edges.coalesce();
    let twice = once.coalesce();
    assert_eq!(once, twice);

    // sorted lexicographically, no duplicate pairs
    let pairs: Vec<(usize, usize)> = once
        .row()
        .iter()
        .zip(once.col().iter())
        .map(|(&r, &c)| (r, c))
        .collect();
    let mut sorted = pairs.clone();
    sorted.sort_unstable();
    sorted.dedup();
    assert_eq!(pairs, sorted);
}

#[test]
fn coalesce_unweighted_passes_none_through() {
    let edges = EdgeList::unweighted(vec![1, 1, 0], vec![0, 0, 1], None).unwrap();
    let merged = edges.coalesce();
    assert!(merged.weight().is_none());
    assert_eq!(merged.num_edges(), 2);
}

#[test]
fn self_loop_round_trip_restores_edge_set() {
    // no pre-existing self loops: add then remove is identity on pairs
    let edges = EdgeList::unweighted(vec![0, 1, 2], vec![1, 2, 0], Some(4)).unwrap();
    let with_loops = edges.add_self_loops(1.0);
    assert_eq!(with_loops.num_edges(), 3 + 4);

    let restored = with_loops.remove_self_loops();
    assert_eq!(restored.row(), edges.row());
    assert_eq!(restored.col(), edges.col());
}

#[test]
fn add_remaining_self_loops_preserves_existing_loop_weight() {
    let edges = EdgeList::new(
        vec![0, 1, 1],
        vec![0, 2, 1],
        Some(vec![7.0, 1.0, 9.0]),
        Some(3),
    )
    .unwrap();
    let with_loops = edges.add_remaining_self_loops(1.0);

    // exactly one loop per node, non-loop edges untouched
    assert_eq!(with_loops.num_edges(), 1 + 3);
    let w = with_loops.weight().unwrap();
    let mut loop_weights = vec![0.0; 3];
    for e in 0..with_loops.num_edges() {
        if with_loops.row()[e] == with_loops.col()[e] {
            loop_weights[with_loops.row()[e]] = w[e];
        }
    }
    assert!(relative_eq!(loop_weights[0], 7.0));
    assert!(relative_eq!(loop_weights[1], 9.0));
    assert!(relative_eq!(loop_weights[2], 1.0));
}

#[test]
fn to_undirected_mirrors_and_dedups() {
    let edges = EdgeList::unweighted(vec![0, 1], vec![1, 0], Some(2)).unwrap();
    let undirected = edges.to_undirected();
    // (0,1) and (1,0) each mirrored then coalesced back to two pairs
    assert_eq!(undirected.row(), &[0, 1]);
    assert_eq!(undirected.col(), &[1, 0]);
}

#[test]
fn dropout_rejects_bad_rate() {
    let edges = EdgeList::unweighted(vec![0], vec![1], None).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let err = edges.dropout_edges(1.5, false, &mut rng).unwrap_err();
    assert!(matches!(err, GraphError::InvalidProbability { .. }));
    let err = edges.dropout_edges(-0.1, false, &mut rng).unwrap_err();
    assert!(matches!(err, GraphError::InvalidProbability { .. }));
}

#[test]
fn dropout_zero_rate_keeps_everything() {
    let edges = EdgeList::new(vec![0, 1], vec![1, 0], Some(vec![0.5, 0.25]), None).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let kept = edges.dropout_edges(0.0, false, &mut rng).unwrap();
    assert_eq!(kept, edges);
}

#[test]
fn dropout_full_rate_drops_everything() {
    let edges = EdgeList::unweighted(vec![0, 1, 2], vec![1, 2, 0], None).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let kept = edges.dropout_edges(1.0, false, &mut rng).unwrap();
    assert_eq!(kept.num_edges(), 0);
}

#[test]
fn dropout_renorm_yields_symmetric_weights() {
    // undirected triangle; nothing dropped, so renorm is deterministic
    let edges = EdgeList::unweighted(
        vec![0, 1, 1, 2, 2, 0],
        vec![1, 0, 2, 1, 0, 2],
        Some(3),
    )
    .unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let kept = edges.dropout_edges(0.0, true, &mut rng).unwrap();
    let w = kept.weight().unwrap();
    // every node has degree 2: each weight is 1/sqrt(2*2)
    for &v in w {
        assert!(relative_eq!(v, 0.5, max_relative = 1e-12));
    }
}
