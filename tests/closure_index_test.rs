//! Integration tests for ClosureIndex: construction, queries, deletion and moves.
//!
//! Reference tree (uniform, branching 2, depth 3), ids assigned breadth-first:
//!
//! ```text
//!                 1
//!         2               3
//!     4       5       6       7
//!    8 9    10 11   12 13   14 15
//! ```

use std::collections::BTreeMap;

use rstest::rstest;

use closure_tree::application::services::ClosureIndex;
use closure_tree::domain::{ClosureEdge, DeleteMode, DomainError, NodeId};

fn id(n: u64) -> NodeId {
    NodeId::new(n)
}

fn ids(ns: &[u64]) -> Vec<NodeId> {
    ns.iter().copied().map(NodeId::new).collect()
}

/// Parent pointers of the reference tree.
fn reference_parents() -> BTreeMap<NodeId, Option<NodeId>> {
    (1..=15u64)
        .map(|n| (id(n), (n > 1).then(|| id(n / 2))))
        .collect()
}

fn build(parents: &BTreeMap<NodeId, Option<NodeId>>) -> ClosureIndex {
    let mut index = ClosureIndex::in_memory();
    for (&node, &parent) in parents {
        index.insert(node, parent).expect("insert");
    }
    index
}

fn domain_err<T: std::fmt::Debug>(result: closure_tree::ApplicationResult<T>) -> DomainError {
    result
        .expect_err("operation should fail")
        .as_domain()
        .cloned()
        .expect("domain error")
}

// ============================================================
// Construction and queries
// ============================================================

#[test]
fn given_reference_tree_when_built_then_closure_table_has_49_edges() {
    let index = build(&reference_parents());

    // sum over depths of nodes * (depth + 1): 1*1 + 2*2 + 4*3 + 8*4
    assert_eq!(index.len(), 49);
    assert_eq!(index.self_and_descendants(id(1)).unwrap().len(), 15);
    index.verify(&reference_parents()).expect("closure matches parents");
}

#[rstest]
#[case(1)]
#[case(3)]
#[case(5)]
#[case(15)]
fn given_any_node_when_root_then_returns_tree_root(#[case] node: u64) {
    let index = build(&reference_parents());
    assert_eq!(index.root(id(node)).unwrap(), id(1));
}

#[test]
fn given_inner_node_when_self_and_descendants_then_ordered_by_distance() {
    let index = build(&reference_parents());

    assert_eq!(
        index.self_and_descendants(id(2)).unwrap(),
        ids(&[2, 4, 5, 8, 9, 10, 11])
    );
    assert_eq!(index.self_and_descendants(id(9)).unwrap(), ids(&[9]));
}

#[test]
fn given_leaf_when_self_and_ancestors_then_ordered_up_to_root() {
    let index = build(&reference_parents());

    assert_eq!(index.self_and_ancestors(id(9)).unwrap(), ids(&[9, 4, 2, 1]));
    assert_eq!(index.self_and_ancestors(id(1)).unwrap(), ids(&[1]));
}

#[rstest]
#[case(1, None, 0)]
#[case(3, Some(1), 1)]
#[case(11, Some(5), 3)]
fn given_node_when_parent_and_depth_then_derived_from_edges(
    #[case] node: u64,
    #[case] parent: Option<u64>,
    #[case] depth: usize,
) {
    let index = build(&reference_parents());
    assert_eq!(index.parent(id(node)).unwrap(), parent.map(NodeId::new));
    assert_eq!(index.depth(id(node)).unwrap(), depth);
}

#[test]
fn given_unknown_parent_when_insert_then_unknown_parent_and_unchanged() {
    let mut index = build(&reference_parents());
    let before = index.edges();

    let err = domain_err(index.insert(id(99), Some(id(42))));

    assert_eq!(err, DomainError::UnknownParent(id(42)));
    assert_eq!(index.edges(), before);
}

#[test]
fn given_unknown_node_when_queried_then_not_found() {
    let index = build(&reference_parents());

    assert_eq!(domain_err(index.root(id(77))), DomainError::NotFound(id(77)));
    assert_eq!(
        domain_err(index.self_and_descendants(id(77))),
        DomainError::NotFound(id(77))
    );
    assert_eq!(
        domain_err(index.self_and_ancestors(id(77))),
        DomainError::NotFound(id(77))
    );
}

// ============================================================
// Deletion
// ============================================================

#[test]
fn given_added_subtree_when_cascade_deleted_then_edge_set_restored() {
    let mut index = build(&reference_parents());
    let before = index.edges();

    index.insert(id(100), Some(id(5))).unwrap();
    index.insert(id(101), Some(id(100))).unwrap();
    index.insert(id(102), Some(id(100))).unwrap();
    let removed = index.delete(id(100), DeleteMode::Cascade).unwrap();

    assert_eq!(removed, ids(&[100, 101, 102]));
    assert_eq!(index.edges(), before);
}

#[test]
fn given_inner_node_when_cascade_deleted_then_subtree_gone() {
    let mut index = build(&reference_parents());

    let removed = index.delete(id(2), DeleteMode::Cascade).unwrap();

    assert_eq!(removed, ids(&[2, 4, 5, 8, 9, 10, 11]));
    for node in removed {
        assert!(!index.contains(node));
    }
    assert_eq!(index.self_and_descendants(id(1)).unwrap(), ids(&[1, 3, 6, 7, 12, 13, 14, 15]));
}

#[test]
fn given_chain_when_middle_promoted_then_paths_shorten_by_one() {
    // 1 - 2 - 3 - 4
    let parents: BTreeMap<_, _> = [(1, None), (2, Some(1)), (3, Some(2)), (4, Some(3))]
        .into_iter()
        .map(|(n, p)| (id(n), p.map(NodeId::new)))
        .collect();
    let mut index = build(&parents);
    assert_eq!(index.len(), 10);

    let removed = index.delete(id(2), DeleteMode::PromoteChildren).unwrap();

    assert_eq!(removed, ids(&[2]));
    assert_eq!(index.len(), 6);
    assert_eq!(index.self_and_ancestors(id(4)).unwrap(), ids(&[4, 3, 1]));
    assert_eq!(index.depth(id(4)).unwrap(), 2);
    assert_eq!(index.parent(id(3)).unwrap(), Some(id(1)));
    assert!(index.edges().contains(&ClosureEdge::new(id(1), id(4), 2)));
}

#[test]
fn given_reference_tree_when_root_promoted_then_children_become_roots() {
    let mut index = build(&reference_parents());

    index.delete(id(1), DeleteMode::PromoteChildren).unwrap();

    let mut expected = reference_parents();
    expected.remove(&id(1));
    expected.insert(id(2), None);
    expected.insert(id(3), None);
    index.verify(&expected).expect("promoted closure matches parents");
    assert_eq!(index.root(id(15)).unwrap(), id(3));
}

#[test]
fn given_unknown_node_when_deleted_then_not_found() {
    let mut index = build(&reference_parents());
    for mode in [DeleteMode::Cascade, DeleteMode::PromoteChildren] {
        assert_eq!(domain_err(index.delete(id(50), mode)), DomainError::NotFound(id(50)));
    }
}

// ============================================================
// Moves
// ============================================================

#[test]
fn given_subtree_when_moved_then_descendants_preserved_and_depths_shift() {
    let mut index = build(&reference_parents());
    let descendants = index.self_and_descendants(id(2)).unwrap();

    index.move_subtree(id(2), Some(id(7))).unwrap();

    assert_eq!(index.self_and_descendants(id(2)).unwrap(), descendants);
    assert_eq!(index.self_and_ancestors(id(8)).unwrap(), ids(&[8, 4, 2, 7, 3, 1]));
    assert_eq!(index.depth(id(8)).unwrap(), 5);

    let mut expected = reference_parents();
    expected.insert(id(2), Some(id(7)));
    index.verify(&expected).expect("moved closure matches parents");
}

#[test]
fn given_subtree_when_detached_then_becomes_root() {
    let mut index = build(&reference_parents());

    index.move_subtree(id(3), None).unwrap();

    assert_eq!(index.root(id(14)).unwrap(), id(3));
    assert_eq!(index.parent(id(3)).unwrap(), None);
    assert_eq!(index.self_and_descendants(id(1)).unwrap(), ids(&[1, 2, 4, 5, 8, 9, 10, 11]));
}

#[rstest]
#[case(2, 2)]
#[case(2, 9)]
#[case(1, 15)]
fn given_target_inside_subtree_when_moved_then_cycle_detected(
    #[case] node: u64,
    #[case] target: u64,
) {
    let mut index = build(&reference_parents());
    let before = index.edges();

    let err = domain_err(index.move_subtree(id(node), Some(id(target))));

    assert_eq!(
        err,
        DomainError::CycleDetected {
            node: id(node),
            new_parent: id(target)
        }
    );
    assert_eq!(index.edges(), before);
}

#[test]
fn given_unknown_target_when_moved_then_unknown_parent() {
    let mut index = build(&reference_parents());
    assert_eq!(
        domain_err(index.move_subtree(id(2), Some(id(40)))),
        DomainError::UnknownParent(id(40))
    );
}
